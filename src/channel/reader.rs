//! Reader worker
//!
//! Owns the read half of one link. Bytes are accumulated in a `BytesMut`
//! and framed with [`at::parse`]; every complete response is dispatched
//! before more input is read. The worker ends when asked to stop, when the
//! link is lost, or after a desync has been reported.

use std::io::{ErrorKind, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::{Buf, BytesMut};
use tracing::{debug, warn};

use super::{FatalHandler, Shared};
use crate::at::{self, ParseOutcome};
use crate::constants::{DESYNC_EXCERPT_LEN, READ_CHUNK_SIZE, ZERO_READ_DISCONNECT_THRESHOLD};
use crate::error::FatalError;
use crate::logging::{self, Direction};
use crate::transport::is_timeout;

pub(super) struct ReaderWorker {
    pub reader: Box<dyn Read + Send>,
    pub shared: Arc<Shared>,
    /// Set by the request worker to end this reader
    pub stop: Arc<AtomicBool>,
    /// Set here when the link is gone
    pub lost: Arc<AtomicBool>,
    pub fatal: FatalHandler,
}

impl ReaderWorker {
    pub fn run(mut self) {
        let mut pending = BytesMut::with_capacity(READ_CHUNK_SIZE);
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        let mut zero_reads = 0u32;

        while !self.stop.load(Ordering::Relaxed) {
            match self.reader.read(&mut chunk) {
                Ok(n) if n > 0 => {
                    zero_reads = 0;
                    logging::traffic(Direction::In, &chunk[..n]);
                    pending.extend_from_slice(&chunk[..n]);

                    if !self.drain(&mut pending) {
                        self.lost.store(true, Ordering::SeqCst);
                        break;
                    }
                }
                Ok(_) => {
                    // Zero bytes read - idle serial port or closed peer
                    zero_reads += 1;
                    if zero_reads > ZERO_READ_DISCONNECT_THRESHOLD {
                        warn!("Modem link closed by peer");
                        self.lost.store(true, Ordering::SeqCst);
                        break;
                    }
                }
                Err(ref e) if is_timeout(e) => {
                    zero_reads = 0;
                }
                Err(ref e) if e.kind() == ErrorKind::UnexpectedEof => {
                    warn!("Modem link closed by peer");
                    self.lost.store(true, Ordering::SeqCst);
                    break;
                }
                Err(e) => {
                    warn!("Modem read failed: {}", e);
                    self.lost.store(true, Ordering::SeqCst);
                    break;
                }
            }
        }

        if !pending.is_empty() {
            debug!("Dropping {} unparsed bytes", pending.len());
        }
    }

    /// Dispatch every complete response in `pending`
    ///
    /// Returns false after reporting a desync.
    fn drain(&self, pending: &mut BytesMut) -> bool {
        while !pending.is_empty() {
            match at::parse(pending) {
                ParseOutcome::Skip(n) => pending.advance(n),
                ParseOutcome::Parsed { consumed, response } => {
                    pending.advance(consumed);
                    self.shared.dispatch(&response);
                }
                ParseOutcome::Incomplete => break,
                ParseOutcome::Desync => {
                    let end = pending.len().min(DESYNC_EXCERPT_LEN);
                    let input = logging::escape(&pending[..end]);
                    pending.clear();
                    (self.fatal)(FatalError::Desync { input });
                    return false;
                }
            }
        }
        true
    }
}
