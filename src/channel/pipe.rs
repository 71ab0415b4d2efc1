//! Write side of the modem link as seen by request closures

use std::io::Write;

use crate::constants::LINE_TERMINATOR;
use crate::error::{ModemError, Result};
use crate::logging::{self, Direction};

/// Sends requests over the write half of the current link
///
/// Only the request worker holds one, so requests never interleave on the
/// wire.
pub struct RequestPipe<'a> {
    writer: &'a mut (dyn Write + Send),
}

impl<'a> RequestPipe<'a> {
    pub(crate) fn new(writer: &'a mut (dyn Write + Send)) -> Self {
        Self { writer }
    }

    /// Send one command line; the line terminator is appended here
    pub fn send(&mut self, request: &str) -> Result<()> {
        let mut line = Vec::with_capacity(request.len() + 1);
        line.extend_from_slice(request.as_bytes());
        line.push(LINE_TERMINATOR);

        self.write(request, &line)
    }

    /// Send bytes as they are, e.g. a PDU ended by Ctrl-Z after a `> ` prompt
    pub fn send_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.write(&logging::escape(bytes), bytes)
    }

    fn write(&mut self, request: &str, bytes: &[u8]) -> Result<()> {
        logging::traffic(Direction::Out, bytes);

        self.writer
            .write_all(bytes)
            .and_then(|_| self.writer.flush())
            .map_err(|e| ModemError::Write {
                request: request.to_string(),
                source: e,
            })
    }
}
