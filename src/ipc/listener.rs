//! Unix-socket [`CommandSource`] implementation.
//!
//! Binds a Unix stream socket and serves one connection at a time.  Each
//! line received is parsed as a JSON-encoded [`Command`].
//!
//! # Wire format
//!
//! Every message is a single line of JSON followed by `\n`:
//!
//! ```json
//! {"PointerDown":{"x":640,"y":360}}
//! {"PointerMove":{"x":652.5,"y":371}}
//! {"PointerUp":{"x":660,"y":380}}
//! {"KeyDown":{"key":"W","modifiers":{"ctrl":true,"alt":true,"shift":true}}}
//! {"KeyDown":{"key":"CapsLock"}}
//! {"Ripple":{"x":100,"y":200}}
//! "Wave"
//! "StopAll"
//! ```

use crate::command::Command;
use crate::traits::CommandSource;
use log::{debug, error, info, warn};
use std::io::{BufRead, BufReader};
use std::os::unix::net::UnixListener;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

/// A [`CommandSource`] that listens on a Unix stream socket for
/// JSON-encoded commands.
///
/// A client may send any number of commands before disconnecting; the
/// listener then waits for the next client.
pub struct UnixSocketListener {
    path: PathBuf,
}

/// Errors produced by the Unix socket listener.
#[derive(Debug, thiserror::Error)]
pub enum UnixSocketError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parse one line of the wire format.  Blank lines yield `None`.
pub fn parse_line(line: &str) -> Result<Option<Command>, UnixSocketError> {
    let text = line.trim();
    if text.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(text)?))
}

/// Whether the listener should keep serving after a connection ends.
#[derive(Debug, PartialEq, Eq)]
enum Served {
    NextClient,
    SinkClosed,
}

/// Forward every command read from `reader` into `sink`.
///
/// Malformed lines are logged and skipped.
fn forward_lines<R: BufRead>(reader: R, sink: &mpsc::Sender<Command>) -> Served {
    for line in reader.lines() {
        let text = match line {
            Ok(text) => text,
            Err(e) => {
                warn!("read error: {}", e);
                break;
            }
        };
        match parse_line(&text) {
            Ok(Some(cmd)) => {
                debug!("received {:?}", cmd);
                if sink.send(cmd).is_err() {
                    return Served::SinkClosed;
                }
            }
            Ok(None) => {}
            Err(e) => warn!("bad command {:?}: {}", text, e),
        }
    }
    Served::NextClient
}

impl UnixSocketListener {
    /// Create a listener for `path`.
    ///
    /// The socket file is created when [`run`](CommandSource::run) is called
    /// and removed once the overlay stops consuming commands.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// The filesystem path of the socket.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CommandSource for UnixSocketListener {
    type Error = UnixSocketError;

    /// Bind the socket and start accepting connections.
    ///
    /// This method **blocks** until the command sink is dropped.  Run it on
    /// a dedicated thread.
    fn run(&mut self, sink: mpsc::Sender<Command>) -> Result<(), Self::Error> {
        // A socket file left behind by a crashed instance blocks bind().
        let _ = std::fs::remove_file(&self.path);

        let listener = UnixListener::bind(&self.path)?;
        info!("listening on {}", self.path.display());

        for stream in listener.incoming() {
            let stream = match stream {
                Ok(s) => s,
                Err(e) => {
                    error!("accept error: {}", e);
                    continue;
                }
            };
            debug!("client connected");
            if forward_lines(BufReader::new(stream), &sink) == Served::SinkClosed {
                info!("overlay gone, closing {}", self.path.display());
                let _ = std::fs::remove_file(&self.path);
                return Ok(());
            }
            debug!("client disconnected");
        }
        Ok(())
    }
}

//  Tests
