//! Command transport over a Unix socket.
//!
//! Key-bind helpers, input hooks and scripts connect to the socket and
//! send newline-delimited JSON [`Command`](crate::command::Command)s:
//! pointer and key events as well as direct animation requests.

pub mod listener;
