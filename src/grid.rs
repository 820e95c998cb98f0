//! Hexagon grid layout.
//!
//! [`GridBuilder`] tiles a rectangular region (normally the union of all
//! monitors) with hexagons laid out in brick-offset rows, and returns a
//! [`HexGrid`]: a flat list of [`Hexagon`]s plus a column partition used to
//! sequence the wave animation.
//!
//! A grid is never patched in place.  Each rebuild produces a new
//! `HexGrid` with a fresh *generation*, and every [`HexId`] carries the
//! generation it was minted in, so ids held across a rebuild simply stop
//! resolving instead of pointing at the wrong cell.

use crate::geometry::{centroid, hexagon_vertices, Point, Rect};
use log::{debug, info, warn};

/// Stable handle to one hexagon of one grid generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HexId {
    generation: u32,
    index: u32,
}

impl HexId {
    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn index(&self) -> usize {
        self.index as usize
    }
}

/// One cell of the overlay.
///
/// Coordinates are grid-local: relative to the top-left corner of the
/// bounds the grid was built for.
#[derive(Debug, Clone, PartialEq)]
pub struct Hexagon {
    pub id: HexId,
    pub center: Point,
    pub vertices: [Point; 6],
    /// Index of the column bucket this hexagon belongs to.
    pub column: usize,
}

impl Hexagon {
    /// Mean of the six vertices.
    pub fn centroid(&self) -> Point {
        centroid(&self.vertices).unwrap_or(self.center)
    }
}

/// Distance between neighbouring cell centres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spacing {
    pub horizontal: f64,
    pub vertical: f64,
}

/// Computes hexagon tilings for a fixed radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridBuilder {
    radius: f64,
}

impl GridBuilder {
    pub fn new(radius: f64) -> Self {
        Self { radius }
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// `radius · √3`.
    pub fn height(&self) -> f64 {
        self.radius * 3f64.sqrt()
    }

    pub fn spacing(&self) -> Spacing {
        Spacing {
            horizontal: self.radius * 1.5,
            vertical: self.height() * 0.75,
        }
    }

    /// Margin added on every side of the bounds so no gaps show at edges.
    pub fn padding(&self) -> f64 {
        self.radius * 2.0
    }

    /// Number of column buckets allocated up front for a region of the
    /// given width: `⌈(width + 4r) / spacing⌉ + 2`.  More are added on
    /// demand if a cell lands beyond them.
    pub fn column_capacity(&self, width: f64) -> usize {
        let h = self.spacing().horizontal;
        if h <= 0.0 || width < 0.0 {
            return 0;
        }
        ((width + 4.0 * self.radius) / h).ceil() as usize + 2
    }

    /// Tile `bounds` and return a new grid tagged with `generation`.
    ///
    /// A non-positive radius or empty bounds produce an empty grid.
    pub fn build(&self, bounds: Rect, generation: u32) -> HexGrid {
        let mut grid = HexGrid::empty(generation);
        grid.bounds = bounds;
        grid.radius = self.radius;

        if !(self.radius.is_finite() && self.radius > 0.0) {
            warn!("refusing to build grid with radius {}", self.radius);
            return grid;
        }
        if bounds.is_empty() {
            warn!("bounds {:?} have no area, grid left empty", bounds);
            return grid;
        }

        let spacing = self.spacing();
        let padding = self.padding();
        let r = self.radius;

        let start_x = bounds.left - padding;
        let end_x = bounds.right() + padding;
        let start_y = bounds.top - padding;
        let end_y = bounds.bottom() + padding;
        debug!(
            "tiling x {:.1}..{:.1}, y {:.1}..{:.1} (spacing {:.2} x {:.2})",
            start_x, end_x, start_y, end_y, spacing.horizontal, spacing.vertical
        );

        grid.columns = vec![Vec::new(); self.column_capacity(bounds.width)];

        let mut row = 0usize;
        loop {
            let y = start_y + row as f64 * spacing.vertical;
            if y >= end_y {
                break;
            }
            let row_offset = if row % 2 == 1 {
                spacing.horizontal * 0.5
            } else {
                0.0
            };

            let mut step = 0usize;
            loop {
                let x = start_x + step as f64 * spacing.horizontal;
                if x >= end_x {
                    break;
                }
                step += 1;

                let abs_x = x + row_offset;
                let local = bounds.to_local(Point::new(abs_x, y));

                // Cells more than one radius outside the surface are never seen.
                if local.x < -r
                    || local.x > bounds.width + r
                    || local.y < -r
                    || local.y > bounds.height + r
                {
                    continue;
                }

                let column = ((abs_x - bounds.left + r) / spacing.horizontal).floor();
                if column < 0.0 {
                    continue;
                }
                grid.push(local, r, column as usize);
            }
            row += 1;
        }

        info!(
            "built grid gen {}: {} hexagons in {} columns (radius {})",
            generation,
            grid.hexagons.len(),
            grid.columns.len(),
            r
        );
        grid
    }
}

/// The live set of hexagons and their column partition.
///
/// Owns every [`Hexagon`]; column buckets only hold [`HexId`]s.
#[derive(Debug, Clone)]
pub struct HexGrid {
    generation: u32,
    bounds: Rect,
    radius: f64,
    hexagons: Vec<Hexagon>,
    columns: Vec<Vec<HexId>>,
}

impl HexGrid {
    /// A grid with no cells.
    pub fn empty(generation: u32) -> Self {
        Self {
            generation,
            bounds: Rect::default(),
            radius: 0.0,
            hexagons: Vec::new(),
            columns: Vec::new(),
        }
    }

    //  Accessors

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Screen-space region this grid was built for.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn hexagons(&self) -> &[Hexagon] {
        &self.hexagons
    }

    /// Column buckets in ascending x order.  Some may be empty.
    pub fn columns(&self) -> &[Vec<HexId>] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.hexagons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hexagons.is_empty()
    }

    /// Resolve an id.  Ids from another generation never resolve.
    pub fn get(&self, id: HexId) -> Option<&Hexagon> {
        if id.generation != self.generation {
            return None;
        }
        self.hexagons.get(id.index())
    }

    pub fn ids(&self) -> impl Iterator<Item = HexId> + '_ {
        self.hexagons.iter().map(|h| h.id)
    }

    //  Internal

    fn push(&mut self, center: Point, radius: f64, column: usize) {
        let id = HexId {
            generation: self.generation,
            index: self.hexagons.len() as u32,
        };
        if self.columns.len() <= column {
            self.columns.resize_with(column + 1, Vec::new);
        }
        self.columns[column].push(id);
        self.hexagons.push(Hexagon {
            id,
            center,
            vertices: hexagon_vertices(center, radius),
            column,
        });
    }
}

//  Tests
