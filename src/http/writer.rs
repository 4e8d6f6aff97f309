use std::fs::File;
use std::io::{self, Read, Write};

use crate::http::response::{Body, Response};

const HTTP_VERSION: &str = "HTTP/1.1";

/// Largest slice of a session log held in memory at once.
const CHUNK_SIZE: usize = 8192;

/// Status line, headers and the blank separator line.
pub fn serialize_head(resp: &Response) -> Vec<u8> {
    let mut buf = Vec::new();

    // Status line
    let status_line = format!(
        "{} {} {}\r\n",
        HTTP_VERSION,
        resp.status.as_u16(),
        resp.status.reason_phrase()
    );
    buf.extend_from_slice(status_line.as_bytes());

    // Headers
    for (k, v) in &resp.headers {
        buf.extend_from_slice(k.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(v.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    buf
}

/// A response on its way to the socket.
///
/// Holds the unsent part of the current chunk; a session log body is read
/// from disk one chunk at a time as the socket drains.
#[derive(Debug)]
pub struct ResponseWriter {
    buffer: Vec<u8>,
    written: usize,
    source: Option<File>,
    body_left: u64,
}

impl ResponseWriter {
    pub fn new(response: Response) -> Self {
        let mut buffer = serialize_head(&response);
        let (source, body_left) = match response.body {
            Body::Bytes(bytes) => {
                buffer.extend_from_slice(&bytes);
                (None, 0)
            }
            Body::Log(log) => (Some(log.file), log.len),
        };

        Self {
            buffer,
            written: 0,
            source,
            body_left,
        }
    }

    /// Bytes not yet handed to the socket.
    pub fn remaining(&self) -> u64 {
        (self.buffer.len() - self.written) as u64 + self.body_left
    }

    /// Writes as much as the stream accepts.
    ///
    /// Returns `Ok(true)` once everything is written and `Ok(false)` if the
    /// stream would block; call again when it becomes writable.
    pub fn write_to_stream<W: Write>(&mut self, stream: &mut W) -> anyhow::Result<bool> {
        loop {
            while self.written < self.buffer.len() {
                match stream.write(&self.buffer[self.written..]) {
                    Ok(0) => {
                        return Err(anyhow::anyhow!("connection closed while writing"));
                    }
                    Ok(n) => self.written += n,
                    Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(false),
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e.into()),
                }
            }

            if !self.refill()? {
                return Ok(true);
            }
        }
    }

    /// Loads the next chunk of the body. Returns `Ok(false)` when none is left.
    fn refill(&mut self) -> anyhow::Result<bool> {
        let Some(source) = self.source.as_mut() else {
            return Ok(false);
        };
        if self.body_left == 0 {
            self.source = None;
            return Ok(false);
        }

        let want = self.body_left.min(CHUNK_SIZE as u64) as usize;
        self.buffer.resize(want, 0);
        let n = loop {
            match source.read(&mut self.buffer) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        };
        if n == 0 {
            // Content-Length is already on the wire; the log must not shrink.
            return Err(anyhow::anyhow!(
                "session log ended {} bytes early",
                self.body_left
            ));
        }

        self.buffer.truncate(n);
        self.written = 0;
        self.body_left -= n as u64;
        Ok(true)
    }
}
