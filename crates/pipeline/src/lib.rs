//! Job submission, watching and result assembly.
//!
//! The centre of the crate is the [`watcher::JobWatcher`]: a single bounded
//! polling loop parameterised by a [`protocol::JobProtocol`] strategy, so
//! project-style jobs and long-running operations share one state machine.
//! Everything that talks to the outside world is a trait here and is
//! implemented elsewhere (HTTP adapters, chat front end).

pub mod cache;
pub mod hosting;
pub mod media;
pub mod narration;
pub mod progress;
pub mod protocol;
pub mod runner;
pub mod submitter;
pub mod transport;
pub mod watcher;
