use std::io;
use std::net::{SocketAddr, ToSocketAddrs};

use anyhow::Context;
use mio::net::TcpListener;
use mio::{Interest, Token};
use tracing::info;

use crate::config::Config;
use crate::http::connection::{ConnectionState, Progress};
use crate::http::parser::{ParseError, parse_http_request};
use crate::http::response::{Response, StatusCode};
use crate::server::dispatch::dispatch;
use crate::server::poller::{LISTENER, Multiplexer, Readiness, client_order};
use crate::server::registry::ConnectionRegistry;
use crate::session::SessionStore;

/// What to do with a connection after servicing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Next {
    Wait,
    Close,
}

/// The listening socket, every open connection and the session store,
/// driven by one readiness loop.
pub struct Server {
    listener: TcpListener,
    poller: Multiplexer,
    connections: ConnectionRegistry,
    sessions: SessionStore,
    max_header_bytes: usize,
    max_body_bytes: usize,
}

/// Binds per `cfg` and serves until a fatal error.
pub fn run(cfg: &Config) -> anyhow::Result<()> {
    let mut server = Server::bind(cfg)?;
    server.run()
}

impl Server {
    pub fn bind(cfg: &Config) -> anyhow::Result<Self> {
        let addr = cfg
            .listen_addr
            .to_socket_addrs()
            .with_context(|| format!("invalid listen address {}", cfg.listen_addr))?
            .next()
            .with_context(|| format!("listen address {} resolved to nothing", cfg.listen_addr))?;

        let mut listener =
            TcpListener::bind(addr).with_context(|| format!("failed to bind {}", addr))?;

        let poller = Multiplexer::new(cfg.event_capacity)?;
        poller
            .registry()
            .register(&mut listener, LISTENER, Interest::READABLE)
            .context("failed to register listener")?;

        let sessions = SessionStore::open(&cfg.session_dir)?;

        info!("Listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            poller,
            connections: ConnectionRegistry::new(),
            sessions,
            max_header_bytes: cfg.max_header_bytes,
            max_body_bytes: cfg.max_body_bytes,
        })
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Runs the loop forever. Only fatal errors return.
    pub fn run(&mut self) -> anyhow::Result<()> {
        loop {
            self.run_once()?;
        }
    }

    /// One wait followed by servicing everything it reported ready.
    pub fn run_once(&mut self) -> anyhow::Result<()> {
        let ready = self.poller.wait()?;

        if ready.iter().any(|r| r.token == LISTENER) {
            self.accept_pending()?;
        }

        for readiness in client_order(&ready) {
            let next = self.service(readiness);
            if next == Next::Close {
                self.close(readiness.token);
            }
        }

        Ok(())
    }

    /// Accepts every queued connection. Any failure other than an empty
    /// queue is fatal.
    fn accept_pending(&mut self) -> anyhow::Result<()> {
        loop {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    let token = self.connections.insert(
                        self.poller.registry(),
                        stream,
                        peer,
                        self.max_header_bytes,
                    )?;
                    info!(%peer, token = token.0, "Accepted connection");
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e).context("accept failed"),
            }
        }
    }

    fn service(&mut self, readiness: Readiness) -> Next {
        let token = readiness.token;
        let Some(conn) = self.connections.get_mut(token) else {
            return Next::Wait;
        };

        match conn.state() {
            ConnectionState::Writing { .. } if readiness.writable => {
                return self.continue_writing(token);
            }
            ConnectionState::Draining { .. } if readiness.readable => {
                return self.continue_draining(token);
            }
            ConnectionState::Receiving if readiness.readable => {}
            _ => return Next::Wait,
        }

        loop {
            let fill = match conn.fill() {
                Ok(fill) => fill,
                Err(e) => {
                    tracing::warn!(peer = %conn.peer(), error = %e, "Receive failed");
                    return Next::Close;
                }
            };

            let response = match parse_http_request(conn.buffer()) {
                Ok((request, _)) => {
                    tracing::debug!(
                        peer = %conn.peer(),
                        method = request.method.as_str(),
                        path = %request.path,
                        "Request complete"
                    );
                    Some(dispatch(&request, &mut self.sessions))
                }
                Err(ParseError::Incomplete) if conn.is_full() => {
                    tracing::warn!(
                        peer = %conn.peer(),
                        limit = conn.limit(),
                        "Header block exceeds receive buffer"
                    );
                    Some(Response::bad_request())
                }
                Err(ParseError::Incomplete) => None,
                Err(ParseError::PartialBody {
                    header_len,
                    content_length,
                }) => {
                    if content_length > self.max_body_bytes {
                        tracing::warn!(
                            peer = %conn.peer(),
                            content_length,
                            "Declared body too large"
                        );
                        Some(Response::bad_request())
                    } else {
                        conn.grow_to(header_len + content_length);
                        None
                    }
                }
                Err(e) => {
                    tracing::warn!(peer = %conn.peer(), error = ?e, "Malformed request");
                    Some(Response::bad_request())
                }
            };

            if let Some(response) = response {
                return self.send(token, response);
            }

            if fill.eof {
                info!(peer = %conn.peer(), "Peer disconnected before completing a request");
                return Next::Close;
            }
            if fill.drained {
                return Next::Wait;
            }
            // Cap was raised for a declared body; keep reading.
        }
    }

    fn send(&mut self, token: Token, response: Response) -> Next {
        let Some(conn) = self.connections.get_mut(token) else {
            return Next::Close;
        };

        // Rejected requests may still have bytes in flight.
        let linger = response.status == StatusCode::BadRequest;
        info!(peer = %conn.peer(), status = response.status.as_u16(), "Responding");
        match conn.respond(response, linger) {
            Ok(progress) => self.advance(token, progress),
            Err(e) => {
                tracing::warn!(peer = %conn.peer(), error = %e, "Send failed");
                Next::Close
            }
        }
    }

    fn continue_writing(&mut self, token: Token) -> Next {
        let Some(conn) = self.connections.get_mut(token) else {
            return Next::Close;
        };

        match conn.flush() {
            Ok(progress) => self.advance(token, progress),
            Err(e) => {
                tracing::warn!(peer = %conn.peer(), error = %e, "Send failed");
                Next::Close
            }
        }
    }

    fn continue_draining(&mut self, token: Token) -> Next {
        let Some(conn) = self.connections.get_mut(token) else {
            return Next::Close;
        };

        match conn.drain() {
            Ok(true) => Next::Close,
            Ok(false) => Next::Wait,
            Err(e) => {
                tracing::debug!(peer = %conn.peer(), error = %e, "Drain failed");
                Next::Close
            }
        }
    }

    /// Re-arms the socket for whatever the connection waits on next.
    fn advance(&mut self, token: Token, progress: Progress) -> Next {
        let interest = match progress {
            Progress::Done => return Next::Close,
            Progress::Pending => Interest::WRITABLE,
            Progress::Draining => Interest::READABLE,
        };

        if let Err(e) = self
            .connections
            .set_interest(self.poller.registry(), token, interest)
        {
            tracing::warn!(error = %e, "Cannot re-arm connection");
            return Next::Close;
        }

        // Input may already be queued; edge-triggered polling won't repeat it.
        if progress == Progress::Draining {
            return self.continue_draining(token);
        }
        Next::Wait
    }

    fn close(&mut self, token: Token) {
        if let Some(conn) = self.connections.remove(self.poller.registry(), token) {
            tracing::debug!(peer = %conn.peer(), token = token.0, "Connection closed");
        }
    }
}
