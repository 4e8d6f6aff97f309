//! Single-threaded readiness loop
//!
//! The listener and every client socket share one `mio::Poll`. All work
//! happens between two waits and runs to completion.

pub mod dispatch;
pub mod listener;
pub mod poller;
pub mod registry;

pub use listener::Server;
