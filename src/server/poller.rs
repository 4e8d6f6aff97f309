use std::io;

use anyhow::Context;
use mio::{Events, Poll, Registry, Token};

/// Token reserved for the listening socket.
pub const LISTENER: Token = Token(0);

/// Readiness reported for one registered socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Readiness {
    pub token: Token,
    pub readable: bool,
    pub writable: bool,
}

/// Blocks until at least one registered socket is ready.
pub struct Multiplexer {
    poll: Poll,
    events: Events,
}

impl Multiplexer {
    pub fn new(capacity: usize) -> anyhow::Result<Self> {
        let poll = Poll::new().context("failed to create poller")?;
        Ok(Self {
            poll,
            events: Events::with_capacity(capacity.max(1)),
        })
    }

    pub fn registry(&self) -> &Registry {
        self.poll.registry()
    }

    /// Waits with no timeout and returns the ready subset.
    ///
    /// Errors are fatal to the server; only signal interruption is retried.
    pub fn wait(&mut self) -> anyhow::Result<Vec<Readiness>> {
        loop {
            match self.poll.poll(&mut self.events, None) {
                Ok(()) => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e).context("readiness wait failed"),
            }
        }

        Ok(self
            .events
            .iter()
            .map(|event| Readiness {
                token: event.token(),
                // Hang-ups and errors surface through the next read.
                readable: event.is_readable() || event.is_read_closed() || event.is_error(),
                writable: event.is_writable() || event.is_write_closed() || event.is_error(),
            })
            .collect())
    }
}

/// Client readiness in servicing order: most recently accepted first.
///
/// Tokens grow with every accept, so a descending sort gives that order.
pub fn client_order(ready: &[Readiness]) -> Vec<Readiness> {
    let mut clients: Vec<Readiness> = ready
        .iter()
        .copied()
        .filter(|r| r.token != LISTENER)
        .collect();
    clients.sort_by(|a, b| b.token.cmp(&a.token));
    clients
}
