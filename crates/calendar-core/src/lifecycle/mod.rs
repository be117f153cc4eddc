//! Process lifecycle: bind, serve, wait for a signal, shut down once.
//!
//! ## Structure
//!
//! - [`group`] - [`Group`], a set of (run, interrupt) pairs where the first
//!   task to return interrupts all the others.
//! - [`listener`] - [`GrpcListener`], the transport's
//!   Created -> Listening -> Serving -> Closed state machine.
//! - [`signal`] - [`SignalWatcher`], which turns SIGINT/SIGTERM into a task
//!   result.
//!
//! A service process adds exactly two tasks to a group: the serve loop
//! (interrupted by closing the listener) and the signal watcher (interrupted
//! by cancelling its token). Whichever returns first decides the exit value.

pub mod group;
pub mod listener;
pub mod signal;

mod error;

pub use error::{RunError, StartupError};
pub use group::Group;
pub use listener::{GrpcListener, ServerState};
pub use signal::SignalWatcher;
