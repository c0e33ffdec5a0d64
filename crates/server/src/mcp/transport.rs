//! Newline-delimited JSON over a reader/writer pair.

use serde::Serialize;
use std::io::{self, BufRead, StdinLock, StdoutLock, Write};

use crate::mcp::protocol::{JsonRpcError, JsonRpcResponse};

/// One JSON message per line in each direction.
pub struct Transport<R, W> {
    reader: R,
    writer: W,
}

/// The process's own stdin/stdout.
pub type StdioTransport = Transport<StdinLock<'static>, StdoutLock<'static>>;

impl StdioTransport {
    pub fn stdio() -> Self {
        Transport::new(io::stdin().lock(), io::stdout().lock())
    }
}

impl<R: BufRead, W: Write> Transport<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Next line without its terminator, or `None` at end of input.
    pub fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(&['\r', '\n'][..]).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    fn write_message<T: Serialize>(&mut self, message: &T) -> io::Result<()> {
        let encoded = serde_json::to_string(message).map_err(io::Error::other)?;
        log::trace!("-> {}", encoded);
        self.writer.write_all(encoded.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }

    pub fn write_response(&mut self, response: &JsonRpcResponse) -> io::Result<()> {
        self.write_message(response)
    }

    pub fn write_error(&mut self, error: &JsonRpcError) -> io::Result<()> {
        log::debug!("JSON-RPC error {}: {}", error.error.code, error.error.message);
        self.write_message(error)
    }

    pub fn into_parts(self) -> (R, W) {
        (self.reader, self.writer)
    }
}
