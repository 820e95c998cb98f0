//! In-memory drawing surface.
//!
//! A [`Scene`] stores the intents it receives and answers "what does cell
//! X look like at time T" by evaluating them.  It holds cells of a single
//! grid generation: [`clear`](DrawingSurface::clear) empties it, and
//! intents for ids it does not hold (stale generations included) are
//! ignored.

use crate::color::Color;
use crate::easing::progress;
use crate::geometry::{centroid, Point};
use crate::grid::HexId;
use crate::traits::{DrawingSurface, FillAnimation, Repeat, RotationAnimation};
use log::trace;
use std::collections::BTreeMap;
use std::convert::Infallible;

/// One cell as stored by the scene.
#[derive(Debug, Clone)]
pub struct SceneCell {
    pub vertices: [Point; 6],
    /// Rotation pivot.
    pub center: Point,
    fill: Color,
    fill_animation: Option<FillAnimation>,
    /// Angle the current rotation starts from.
    rest_angle: f64,
    rotation: Option<RotationAnimation>,
}

impl SceneCell {
    fn new(vertices: [Point; 6], fill: Color) -> Self {
        Self {
            center: centroid(&vertices).unwrap_or_default(),
            vertices,
            fill,
            fill_animation: None,
            rest_angle: 0.0,
            rotation: None,
        }
    }

    /// Fill colour at clock time `now`.
    pub fn fill_at(&self, now: u64) -> Color {
        match &self.fill_animation {
            Some(a) => {
                let t = progress(a.started_at, a.duration_ms, now, a.auto_reverse);
                a.from.lerp(a.to, a.easing.apply(t))
            }
            None => self.fill,
        }
    }

    /// Rotation about `center` at clock time `now`, in degrees `[0, 360)`.
    pub fn angle_at(&self, now: u64) -> f64 {
        let swept = match &self.rotation {
            None => 0.0,
            Some(r) if r.duration_ms == 0 => match r.repeat {
                Repeat::Once => r.degrees,
                Repeat::Forever => 0.0,
            },
            Some(r) => {
                let elapsed = now.saturating_sub(r.started_at);
                let u = match r.repeat {
                    Repeat::Once => (elapsed as f64 / r.duration_ms as f64).min(1.0),
                    Repeat::Forever => (elapsed % r.duration_ms) as f64 / r.duration_ms as f64,
                };
                r.easing.scalar(0.0, r.degrees, u)
            }
        };
        (self.rest_angle + swept).rem_euclid(360.0)
    }

    /// `true` while a fill or rotation animation is still changing.
    pub fn is_animating(&self, now: u64) -> bool {
        let filling = self.fill_animation.is_some_and(|a| {
            let total = if a.auto_reverse { a.duration_ms.saturating_mul(2) } else { a.duration_ms };
            now < a.started_at.saturating_add(total)
        });
        let rotating = self.rotation.is_some_and(|r| match r.repeat {
            Repeat::Forever => true,
            Repeat::Once => now < r.started_at.saturating_add(r.duration_ms),
        });
        filling || rotating
    }
}

/// In-memory [`DrawingSurface`].  See the [module docs](self).
#[derive(Debug, Default)]
pub struct Scene {
    cells: BTreeMap<HexId, SceneCell>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, id: HexId) -> bool {
        self.cells.contains_key(&id)
    }

    pub fn cell(&self, id: HexId) -> Option<&SceneCell> {
        self.cells.get(&id)
    }

    /// Every cell, in id order.
    pub fn cells(&self) -> impl Iterator<Item = (HexId, &SceneCell)> + '_ {
        self.cells.iter().map(|(id, c)| (*id, c))
    }

    pub fn fill_at(&self, id: HexId, now: u64) -> Option<Color> {
        self.cells.get(&id).map(|c| c.fill_at(now))
    }

    pub fn angle_at(&self, id: HexId, now: u64) -> Option<f64> {
        self.cells.get(&id).map(|c| c.angle_at(now))
    }

    /// `true` if any cell would look different at a later time.
    pub fn is_animating(&self, now: u64) -> bool {
        self.cells.values().any(|c| c.is_animating(now))
    }

    fn cell_mut(&mut self, id: HexId) -> Option<&mut SceneCell> {
        let cell = self.cells.get_mut(&id);
        if cell.is_none() {
            trace!("scene has no cell {:?}, ignoring", id);
        }
        cell
    }
}

impl DrawingSurface for Scene {
    type Error = Infallible;

    fn clear(&mut self) -> Result<(), Infallible> {
        self.cells.clear();
        Ok(())
    }

    fn add_cell(&mut self, id: HexId, vertices: &[Point; 6], fill: Color) -> Result<(), Infallible> {
        if self.cells.keys().next().is_some_and(|k| k.generation() != id.generation()) {
            self.cells.clear();
        }
        self.cells.insert(id, SceneCell::new(*vertices, fill));
        Ok(())
    }

    fn set_fill(&mut self, id: HexId, color: Color) -> Result<(), Infallible> {
        if let Some(cell) = self.cell_mut(id) {
            cell.fill = color;
            cell.fill_animation = None;
        }
        Ok(())
    }

    fn animate_fill(&mut self, id: HexId, animation: FillAnimation) -> Result<(), Infallible> {
        if let Some(cell) = self.cell_mut(id) {
            // The colour a replaced animation would settle on.
            cell.fill = if animation.auto_reverse { animation.from } else { animation.to };
            cell.fill_animation = Some(animation);
        }
        Ok(())
    }

    fn animate_rotation(&mut self, id: HexId, animation: RotationAnimation) -> Result<(), Infallible> {
        if let Some(cell) = self.cell_mut(id) {
            cell.rest_angle = cell.angle_at(animation.started_at);
            cell.rotation = Some(animation);
        }
        Ok(())
    }

    fn cancel_rotation(&mut self, id: HexId) -> Result<(), Infallible> {
        if let Some(cell) = self.cell_mut(id) {
            cell.rotation = None;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::Easing;
    use crate::geometry::Rect;
    use crate::grid::{GridBuilder, HexGrid};

    const PASSIVE: Color = Color::argb(0, 0, 150, 255);
    const GLOW: Color = Color::argb(180, 100, 200, 255);

    fn scene_for(grid: &HexGrid) -> Scene {
        let mut scene = Scene::new();
        for h in grid.hexagons() {
            scene.add_cell(h.id, &h.vertices, PASSIVE).unwrap();
        }
        scene
    }

    fn pulse(started_at: u64) -> FillAnimation {
        FillAnimation {
            from: PASSIVE,
            to: GLOW,
            duration_ms: 100,
            easing: Easing::Linear,
            auto_reverse: true,
            started_at,
        }
    }

    #[test]
    fn pulse_rises_and_falls_back() {
        let grid = GridBuilder::new(50.0).build(Rect::new(0.0, 0.0, 300.0, 300.0), 1);
        let id = grid.hexagons()[0].id;
        let mut scene = scene_for(&grid);

        scene.animate_fill(id, pulse(1_000)).unwrap();
        assert_eq!(scene.fill_at(id, 1_000), Some(PASSIVE));
        assert_eq!(scene.fill_at(id, 1_100), Some(GLOW));
        assert_eq!(scene.fill_at(id, 1_200), Some(PASSIVE));
        assert_eq!(scene.fill_at(id, 5_000), Some(PASSIVE));
        assert!(scene.is_animating(1_150));
        assert!(!scene.is_animating(1_200));
    }

    #[test]
    fn endless_pulse_does_not_overflow() {
        let grid = GridBuilder::new(50.0).build(Rect::new(0.0, 0.0, 300.0, 300.0), 1);
        let id = grid.hexagons()[0].id;
        let mut scene = scene_for(&grid);

        scene
            .animate_fill(
                id,
                FillAnimation {
                    duration_ms: u64::MAX,
                    ..pulse(10)
                },
            )
            .unwrap();
        assert!(scene.is_animating(1_000_000));
        assert_eq!(scene.fill_at(id, 10), Some(PASSIVE));
    }

    #[test]
    fn set_fill_cancels_animation() {
        let grid = GridBuilder::new(50.0).build(Rect::new(0.0, 0.0, 300.0, 300.0), 1);
        let id = grid.hexagons()[0].id;
        let mut scene = scene_for(&grid);

        scene.animate_fill(id, pulse(0)).unwrap();
        scene.set_fill(id, Color::TRANSPARENT).unwrap();
        assert_eq!(scene.fill_at(id, 50), Some(Color::TRANSPARENT));
    }

    #[test]
    fn one_shot_rotation_ends_where_it_started() {
        let grid = GridBuilder::new(50.0).build(Rect::new(0.0, 0.0, 300.0, 300.0), 1);
        let id = grid.hexagons()[0].id;
        let mut scene = scene_for(&grid);

        scene
            .animate_rotation(
                id,
                RotationAnimation {
                    degrees: 360.0,
                    duration_ms: 400,
                    easing: Easing::Linear,
                    repeat: Repeat::Once,
                    started_at: 0,
                },
            )
            .unwrap();
        assert!((scene.angle_at(id, 100).unwrap() - 90.0).abs() < 1e-9);
        assert!(scene.angle_at(id, 400).unwrap().abs() < 1e-9);
        assert!(scene.angle_at(id, 9_000).unwrap().abs() < 1e-9);
    }

    #[test]
    fn continuous_rotation_wraps_and_cancels() {
        let grid = GridBuilder::new(50.0).build(Rect::new(0.0, 0.0, 300.0, 300.0), 1);
        let id = grid.hexagons()[0].id;
        let mut scene = scene_for(&grid);

        scene
            .animate_rotation(
                id,
                RotationAnimation {
                    degrees: 360.0,
                    duration_ms: 1_000,
                    easing: Easing::Linear,
                    repeat: Repeat::Forever,
                    started_at: 0,
                },
            )
            .unwrap();
        assert!((scene.angle_at(id, 2_250).unwrap() - 90.0).abs() < 1e-9);
        assert!(scene.is_animating(1_000_000));

        scene.cancel_rotation(id).unwrap();
        assert_eq!(scene.angle_at(id, 2_250), Some(0.0));
        assert!(!scene.is_animating(2_250));
    }

    #[test]
    fn stale_ids_are_ignored() {
        let builder = GridBuilder::new(50.0);
        let bounds = Rect::new(0.0, 0.0, 300.0, 300.0);
        let old = builder.build(bounds, 1);
        let new = builder.build(bounds, 2);
        let mut scene = scene_for(&old);
        scene.clear().unwrap();
        for h in new.hexagons() {
            scene.add_cell(h.id, &h.vertices, PASSIVE).unwrap();
        }

        let stale = old.hexagons()[0].id;
        scene.animate_fill(stale, pulse(0)).unwrap();
        assert!(!scene.contains(stale));
        assert_eq!(scene.fill_at(stale, 50), None);
        assert_eq!(scene.len(), new.len());
    }

    #[test]
    fn new_generation_replaces_old_cells() {
        let builder = GridBuilder::new(50.0);
        let bounds = Rect::new(0.0, 0.0, 300.0, 300.0);
        let mut scene = scene_for(&builder.build(bounds, 1));
        let new = builder.build(bounds, 2);
        for h in new.hexagons() {
            scene.add_cell(h.id, &h.vertices, PASSIVE).unwrap();
        }
        assert!(scene.cells().all(|(id, _)| id.generation() == 2));
    }
}
