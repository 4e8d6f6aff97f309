use std::io::{self, Read};
use std::net::{Shutdown, SocketAddr};

use bytes::BytesMut;
use mio::net::TcpStream;

use crate::http::response::Response;
use crate::http::writer::ResponseWriter;

const READ_CHUNK: usize = 4096;

/// Most unread request bytes discarded after a rejection before giving up
/// on a clean close.
const DRAIN_LIMIT: usize = 1024 * 1024;

/// One accepted client socket and the request bytes received so far.
pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    buffer: BytesMut,
    limit: usize,
    state: ConnectionState,
}

pub enum ConnectionState {
    /// Accumulating the request.
    Receiving,
    /// Response queued; waiting for the socket to take the rest of it.
    /// With `linger`, unread input is drained before closing.
    Writing { writer: ResponseWriter, linger: bool },
    /// Response sent and write side shut; discarding input until the peer
    /// closes so the socket is not reset under the response.
    Draining { discarded: usize },
    /// Response sent or connection abandoned.
    Closed,
}

/// Where a connection stands after pushing its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// The socket is full; resume on writability.
    Pending,
    /// Response sent; now draining input.
    Draining,
    /// Nothing left to do but close.
    Done,
}

/// What a call to [`Connection::fill`] observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fill {
    /// Bytes appended during this call.
    pub read: usize,
    /// The peer shut down its write side.
    pub eof: bool,
    /// The socket had nothing more to give.
    pub drained: bool,
}

impl Connection {
    pub fn new(stream: TcpStream, peer: SocketAddr, limit: usize) -> Self {
        Self {
            stream,
            peer,
            buffer: BytesMut::with_capacity(limit),
            limit,
            state: ConnectionState::Receiving,
        }
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn stream_mut(&mut self) -> &mut TcpStream {
        &mut self.stream
    }

    /// Bytes received so far.
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Raises the receive cap, e.g. once a declared body length is known.
    pub fn grow_to(&mut self, limit: usize) {
        if limit > self.limit {
            self.buffer.reserve(limit - self.buffer.len());
            self.limit = limit;
        }
    }

    pub fn is_full(&self) -> bool {
        self.buffer.len() >= self.limit
    }

    /// Reads until the socket would block, the peer closes, or the receive
    /// cap is reached.
    pub fn fill(&mut self) -> io::Result<Fill> {
        let mut fill = Fill {
            read: 0,
            eof: false,
            drained: false,
        };
        let mut chunk = [0u8; READ_CHUNK];

        while !self.is_full() {
            let want = (self.limit - self.buffer.len()).min(READ_CHUNK);
            match self.stream.read(&mut chunk[..want]) {
                Ok(0) => {
                    fill.eof = true;
                    break;
                }
                Ok(n) => {
                    self.buffer.extend_from_slice(&chunk[..n]);
                    fill.read += n;
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    fill.drained = true;
                    break;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        tracing::debug!(
            peer = %self.peer,
            bytes = fill.read,
            buffered = self.buffer.len(),
            "Received request bytes"
        );

        Ok(fill)
    }

    /// Queues a response and writes as much of it as possible.
    pub fn respond(&mut self, response: Response, linger: bool) -> anyhow::Result<Progress> {
        self.state = ConnectionState::Writing {
            writer: ResponseWriter::new(response),
            linger,
        };
        self.flush()
    }

    /// Continues a pending response.
    pub fn flush(&mut self) -> anyhow::Result<Progress> {
        let linger = match &mut self.state {
            ConnectionState::Writing { writer, linger } => {
                if !writer.write_to_stream(&mut self.stream)? {
                    tracing::debug!(
                        peer = %self.peer,
                        remaining = writer.remaining(),
                        "Response write would block"
                    );
                    return Ok(Progress::Pending);
                }
                *linger
            }
            ConnectionState::Draining { .. } => return Ok(Progress::Draining),
            ConnectionState::Closed => return Ok(Progress::Done),
            ConnectionState::Receiving => return Ok(Progress::Pending),
        };

        if linger && self.stream.shutdown(Shutdown::Write).is_ok() {
            self.state = ConnectionState::Draining { discarded: 0 };
            Ok(Progress::Draining)
        } else {
            self.state = ConnectionState::Closed;
            Ok(Progress::Done)
        }
    }

    /// Discards input after a lingering response.
    ///
    /// Returns `Ok(true)` once the peer has closed (or sent too much) and the
    /// socket can be dropped.
    pub fn drain(&mut self) -> io::Result<bool> {
        let ConnectionState::Draining { discarded } = &mut self.state else {
            return Ok(true);
        };
        let mut chunk = [0u8; READ_CHUNK];

        loop {
            match self.stream.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => {
                    *discarded += n;
                    if *discarded > DRAIN_LIMIT {
                        tracing::debug!(peer = %self.peer, "Gave up draining");
                        break;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(false),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        self.state = ConnectionState::Closed;
        Ok(true)
    }
}
