use std::collections::HashMap;
use std::net::SocketAddr;

use anyhow::Context;
use mio::net::TcpStream;
use mio::{Interest, Registry, Token};

use crate::http::connection::Connection;

/// Open client connections keyed by their poll token.
///
/// Tokens start after the listener's and are never reused.
pub struct ConnectionRegistry {
    connections: HashMap<Token, Connection>,
    next_token: usize,
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: HashMap::new(),
            next_token: 1,
        }
    }

    /// Registers a freshly accepted socket for readable events.
    pub fn insert(
        &mut self,
        registry: &Registry,
        mut stream: TcpStream,
        peer: SocketAddr,
        limit: usize,
    ) -> anyhow::Result<Token> {
        let token = Token(self.next_token);
        self.next_token += 1;

        registry
            .register(&mut stream, token, Interest::READABLE)
            .with_context(|| format!("failed to register connection from {}", peer))?;
        self.connections
            .insert(token, Connection::new(stream, peer, limit));

        Ok(token)
    }

    pub fn get_mut(&mut self, token: Token) -> Option<&mut Connection> {
        self.connections.get_mut(&token)
    }

    /// Changes which readiness a connection waits for.
    pub fn set_interest(
        &mut self,
        registry: &Registry,
        token: Token,
        interest: Interest,
    ) -> anyhow::Result<()> {
        let conn = self
            .connections
            .get_mut(&token)
            .context("unknown connection token")?;
        registry
            .reregister(conn.stream_mut(), token, interest)
            .context("failed to reregister connection")?;
        Ok(())
    }

    /// Deregisters and drops a connection, closing its socket.
    pub fn remove(&mut self, registry: &Registry, token: Token) -> Option<Connection> {
        let mut conn = self.connections.remove(&token)?;
        if let Err(e) = registry.deregister(conn.stream_mut()) {
            tracing::debug!(peer = %conn.peer(), error = %e, "Deregister failed");
        }
        Some(conn)
    }
}
