//! Cookiejar - cookie sessions over a single-threaded HTTP server
//!
//! Every client is tied to an append-only session log on disk through a
//! numeric `id` cookie. GET reads the log back, any other verb appends the
//! request body to it first.

pub mod config;
pub mod http;
pub mod server;
pub mod session;
