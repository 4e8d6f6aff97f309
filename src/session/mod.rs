//! Durable cookie sessions
//!
//! Each session is an append-only log on disk, named by its decimal
//! identifier. Clients carry the identifier in a `Cookie: id=<n>` header.

pub mod store;

pub use store::{SessionId, SessionLog, SessionStore};
