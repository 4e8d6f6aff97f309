//! HTTP protocol implementation.
//!
//! A deliberately small HTTP/1.x subset: one request per connection, every
//! response closes the socket.
//!
//! # Architecture
//!
//! - **`connection`**: Per-client socket, receive buffer and state machine
//! - **`parser`**: Parses a request out of the bytes received so far
//! - **`request`**: HTTP request representation
//! - **`response`**: The 200 / 400 / 404 response shapes
//! - **`writer`**: Serializes and writes responses to non-blocking sockets
//! - **`mime`**: MIME type detection based on file extensions
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │  Receiving  │ ← bytes appended on every readable event
//!        └──────┬──────┘
//!               │ header block (+ declared body) complete,
//!               │ or receive cap hit (400)
//!               ▼
//!        ┌──────────────────┐
//!        │     Writing      │ ← resumes on writable events
//!        └──────┬───────────┘
//!               │ response sent
//!               ├──────────────────────┐
//!               │                      │ 400: write side shut
//!               │                      ▼
//!               │             ┌──────────────────┐
//!               │             │     Draining     │ ← discards unread input
//!               │             └──────┬───────────┘
//!               │                    │ peer closed
//!               ▼                    ▼
//!        ┌──────────────────┐
//!        │      Closed      │ ← socket dropped, removed from registry
//!        └──────────────────┘
//! ```
//!
//! A peer that disconnects or errors while Receiving goes straight to Closed
//! without a response.

pub mod request;
pub mod response;
pub mod parser;
pub mod connection;
pub mod writer;
pub mod mime;
