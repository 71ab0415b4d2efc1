//! AT channel
//!
//! Owns the modem link and two kinds of worker threads:
//! - **request worker**: runs queued request closures one at a time, in
//!   order. It opens the link lazily, runs the init sequence on every new
//!   link, and closes the link when a closure fails.
//! - **reader worker**: one per open link. Frames inbound bytes into
//!   responses and delivers each one either to the waiting request (via the
//!   [`Conversation`]) or, when unclaimed, to every subscriber.
//!
//! Link lifecycle: `Closed -> Opening -> Open -> Closed`. The old reader is
//! stopped and joined before a new link is opened.

mod conversation;
mod pipe;
mod reader;

pub use conversation::{Conversation, Filter};
pub use pipe::RequestPipe;

use std::collections::VecDeque;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, info, warn};

use crate::at::Response;
use crate::config::ChannelConfig;
use crate::constants::{
    DEFAULT_INIT_SEQUENCE, DEFAULT_REQUEST_TIMEOUT_MS, MAX_OPEN_ATTEMPTS, RECONNECT_DELAY_MS,
};
use crate::error::{FatalError, ModemError, Result};
use crate::services::ResponseSink;
use crate::transport::{Device, Link};
use reader::ReaderWorker;

/// Receives conditions the channel cannot recover from
pub type FatalHandler = Arc<dyn Fn(FatalError) + Send + Sync>;

type Request = Box<dyn FnOnce(&mut RequestPipe<'_>, &Conversation) -> Result<()> + Send>;
type Sink = Box<dyn FnMut(&Arc<Response>) -> bool + Send>;

/// Default fatal handler: log and abort the process
pub fn abort_on_fatal() -> FatalHandler {
    Arc::new(|e: FatalError| {
        error!("{}", e);
        std::process::abort();
    })
}

// =============================================================================
// Options
// =============================================================================

/// Channel tuning
#[derive(Clone)]
pub struct ChannelOptions {
    /// Commands run on every new link; each must be answered OK
    pub init_sequence: Vec<String>,
    pub request_timeout: Duration,
    pub open_attempts: u32,
    pub reconnect_delay: Duration,
    pub fatal: FatalHandler,
}

impl Default for ChannelOptions {
    fn default() -> Self {
        Self {
            init_sequence: DEFAULT_INIT_SEQUENCE.iter().map(|s| s.to_string()).collect(),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            open_attempts: MAX_OPEN_ATTEMPTS,
            reconnect_delay: Duration::from_millis(RECONNECT_DELAY_MS),
            fatal: abort_on_fatal(),
        }
    }
}

impl ChannelOptions {
    pub fn from_config(config: &ChannelConfig) -> Self {
        Self {
            init_sequence: config.init_sequence.clone(),
            request_timeout: config.request_timeout(),
            open_attempts: config.open_attempts.max(1),
            reconnect_delay: config.reconnect_delay(),
            fatal: abort_on_fatal(),
        }
    }

    /// Replace the fatal handler
    pub fn with_fatal_handler(mut self, fatal: FatalHandler) -> Self {
        self.fatal = fatal;
        self
    }
}

impl std::fmt::Debug for ChannelOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelOptions")
            .field("init_sequence", &self.init_sequence)
            .field("request_timeout", &self.request_timeout)
            .field("open_attempts", &self.open_attempts)
            .field("reconnect_delay", &self.reconnect_delay)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Shared state
// =============================================================================

/// State shared by the channel handle and its workers
pub(crate) struct Shared {
    /// `None` is the shutdown sentinel
    queue: Mutex<VecDeque<Option<Request>>>,
    ready: Condvar,
    sinks: Mutex<Vec<Sink>>,
    conversation: Conversation,
}

impl Shared {
    fn push(&self, request: Option<Request>) {
        self.queue.lock().push_back(request);
        self.ready.notify_one();
    }

    fn next_request(&self) -> Option<Request> {
        let mut queue = self.queue.lock();
        loop {
            if let Some(request) = queue.pop_front() {
                return request;
            }
            self.ready.wait(&mut queue);
        }
    }

    /// Deliver to the waiting request, or broadcast when unclaimed
    fn dispatch(&self, response: &Arc<Response>) {
        if self.conversation.deliver(response) {
            return;
        }
        self.broadcast(response);
    }

    fn broadcast(&self, response: &Arc<Response>) {
        // Run sinks outside the lock so a sink may subscribe others
        let mut sinks = std::mem::take(&mut *self.sinks.lock());
        if sinks.is_empty() {
            debug!("Unsolicited {} dropped, no subscribers", response.what());
        }

        let before = sinks.len();
        sinks.retain_mut(|sink| sink(response));
        if sinks.len() < before {
            debug!("Pruned {} subscribers", before - sinks.len());
        }

        let mut guard = self.sinks.lock();
        let added = std::mem::replace(&mut *guard, sinks);
        guard.extend(added);
    }
}

// =============================================================================
// Channel
// =============================================================================

/// Handle to a running AT channel
///
/// Dropping it stops the request worker after the already queued requests
/// have run, then closes the link.
pub struct Channel {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl Channel {
    /// Start the request worker; the link is opened with the first request
    pub fn spawn(device: impl Device, options: ChannelOptions) -> Result<Self> {
        let shared = Arc::new(Shared {
            queue: Mutex::new(VecDeque::new()),
            ready: Condvar::new(),
            sinks: Mutex::new(Vec::new()),
            conversation: Conversation::new(options.request_timeout),
        });

        let worker = RequestWorker {
            shared: Arc::clone(&shared),
            device,
            options,
            link: None,
        };
        let handle = thread::Builder::new()
            .name("at-request".into())
            .spawn(move || worker.run())
            .map_err(|e| ModemError::Runtime { source: e })?;

        Ok(Self {
            shared,
            worker: Some(handle),
        })
    }

    /// Queue a request closure
    ///
    /// Closures run one at a time on the request worker, in queue order.
    /// Returning `Err` closes the link; the next request reopens it.
    pub fn queue_request<F>(&self, request: F)
    where
        F: FnOnce(&mut RequestPipe<'_>, &Conversation) -> Result<()> + Send + 'static,
    {
        self.shared.push(Some(Box::new(request)));
    }

    /// Queue a request closure and wait for its result
    ///
    /// Timeouts and write failures close the link as they would for
    /// [`Channel::queue_request`]. Must not be called from a request closure.
    ///
    /// # Errors
    ///
    /// Returns the closure's error, or `ModemError::LinkClosed` if the
    /// request was dropped because no link could be established.
    pub fn call<T, F>(&self, request: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut RequestPipe<'_>, &Conversation) -> Result<T> + Send + 'static,
    {
        let (tx, rx) = mpsc::sync_channel(1);
        self.queue_request(move |pipe, conversation| {
            let result = request(pipe, conversation);
            let verdict = match &result {
                Err(e) => link_failure(e).map_or(Ok(()), Err),
                Ok(_) => Ok(()),
            };
            let _ = tx.send(result);
            verdict
        });

        rx.recv().map_err(|_| ModemError::LinkClosed)?
    }

    /// Receive every unclaimed response; returning false unsubscribes
    pub fn subscribe<F>(&self, sink: F)
    where
        F: FnMut(&Arc<Response>) -> bool + Send + 'static,
    {
        self.shared.sinks.lock().push(Box::new(sink));
    }

    /// Subscribe a handler without keeping it alive
    ///
    /// The subscription ends once the last strong reference is dropped.
    pub fn attach<H: ResponseSink>(&self, handler: &Arc<H>) {
        let handler = Arc::downgrade(handler);
        self.subscribe(move |response| match handler.upgrade() {
            Some(handler) => {
                handler.on_response(response);
                true
            }
            None => false,
        });
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.sinks.lock().len()
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        self.shared.push(None);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("Request worker panicked");
            }
        }
    }
}

/// Copy of `e` when it means the link is unusable
fn link_failure(e: &ModemError) -> Option<ModemError> {
    match e {
        ModemError::Timeout { request } => Some(ModemError::Timeout {
            request: request.clone(),
        }),
        ModemError::Write { request, source } => Some(ModemError::Write {
            request: request.clone(),
            source: std::io::Error::new(source.kind(), source.to_string()),
        }),
        ModemError::LinkClosed => Some(ModemError::LinkClosed),
        _ => None,
    }
}

// =============================================================================
// Request worker
// =============================================================================

/// An open link as seen by the request worker
struct OpenLink {
    writer: Box<dyn Write + Send>,
    name: String,
    stop: Arc<AtomicBool>,
    lost: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
}

impl OpenLink {
    fn is_lost(&self) -> bool {
        self.lost.load(Ordering::SeqCst)
    }

    fn close(mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(reader) = self.reader.take() {
            if reader.join().is_err() {
                error!("Reader worker panicked");
            }
        }
        info!("Closed {}", self.name);
    }
}

struct RequestWorker<D> {
    shared: Arc<Shared>,
    device: D,
    options: ChannelOptions,
    link: Option<OpenLink>,
}

impl<D: Device> RequestWorker<D> {
    fn run(mut self) {
        let shared = Arc::clone(&self.shared);

        while let Some(request) = shared.next_request() {
            let Some(link) = self.ensure_link() else {
                warn!("No modem link, request dropped");
                continue;
            };

            let result = {
                let mut pipe = RequestPipe::new(link.writer.as_mut());
                request(&mut pipe, &shared.conversation)
            };

            if let Err(e) = result {
                warn!("Request failed: {}", e);
                self.close_link();
            }
        }

        self.close_link();
        debug!("Request worker stopped");
    }

    fn close_link(&mut self) {
        if let Some(link) = self.link.take() {
            link.close();
        }
    }

    /// Current link, reopened if it was closed or lost
    fn ensure_link(&mut self) -> Option<&mut OpenLink> {
        if self.link.as_ref().is_some_and(OpenLink::is_lost) {
            warn!("Modem link lost, reconnecting");
            self.close_link();
        }

        if self.link.is_none() {
            self.link = self.open_link();
        }
        self.link.as_mut()
    }

    fn open_link(&mut self) -> Option<OpenLink> {
        let link = self.open_device()?;
        let mut open = match self.start_reader(link) {
            Ok(open) => open,
            Err(e) => {
                (self.options.fatal)(FatalError::DeviceUnavailable { source: e });
                return None;
            }
        };

        if let Err(e) = self.initialize(&mut open) {
            (self.options.fatal)(e);
            open.close();
            return None;
        }

        info!("Modem channel ready on {}", open.name);
        Some(open)
    }

    fn open_device(&mut self) -> Option<Link> {
        let attempts = self.options.open_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            match self.device.open() {
                Ok(link) => {
                    info!("Opened {}", link.name);
                    return Some(link);
                }
                Err(e) => {
                    warn!("Open attempt {}/{} failed: {}", attempt, attempts, e);
                    last_error = Some(e);
                    if attempt < attempts {
                        thread::sleep(self.options.reconnect_delay);
                    }
                }
            }
        }

        let source = last_error.unwrap_or(ModemError::LinkClosed);
        (self.options.fatal)(FatalError::DeviceUnavailable { source });
        None
    }

    fn start_reader(&self, link: Link) -> Result<OpenLink> {
        let stop = Arc::new(AtomicBool::new(false));
        let lost = Arc::new(AtomicBool::new(false));

        let worker = ReaderWorker {
            reader: link.reader,
            shared: Arc::clone(&self.shared),
            stop: Arc::clone(&stop),
            lost: Arc::clone(&lost),
            fatal: Arc::clone(&self.options.fatal),
        };
        let reader = thread::Builder::new()
            .name("at-reader".into())
            .spawn(move || worker.run())
            .map_err(|e| ModemError::Runtime { source: e })?;

        Ok(OpenLink {
            writer: link.writer,
            name: link.name,
            stop,
            lost,
            reader: Some(reader),
        })
    }

    fn initialize(&self, link: &mut OpenLink) -> std::result::Result<(), FatalError> {
        let mut pipe = RequestPipe::new(link.writer.as_mut());

        for command in &self.options.init_sequence {
            self.shared
                .conversation
                .command(&mut pipe, command)
                .map_err(|e| FatalError::InitFailed {
                    command: command.clone(),
                    reason: e.to_string(),
                })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::at::payload::SignalStrength;
    use crate::at::Tag;

    fn shared() -> Shared {
        Shared {
            queue: Mutex::new(VecDeque::new()),
            ready: Condvar::new(),
            sinks: Mutex::new(Vec::new()),
            conversation: Conversation::new(Duration::from_millis(50)),
        }
    }

    #[test]
    fn test_queue_is_fifo_until_sentinel() {
        let shared = shared();
        shared.push(Some(Box::new(|_, _| Ok(()))));
        shared.push(None);

        assert!(shared.next_request().is_some());
        assert!(shared.next_request().is_none());
    }

    #[test]
    fn test_broadcast_prunes_declining_sinks() {
        let shared = shared();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&seen);
        shared.sinks.lock().push(Box::new(move |r: &Arc<Response>| {
            log.lock().push(r.what());
            true
        }));
        shared.sinks.lock().push(Box::new(|_: &Arc<Response>| false));

        shared.dispatch(&Arc::new(Response::Ring));
        shared.dispatch(&Arc::new(Response::Csq(SignalStrength::default())));

        assert_eq!(*seen.lock(), vec!["RING", "CSQ"]);
        assert_eq!(shared.sinks.lock().len(), 1);
    }

    #[test]
    fn test_sink_may_subscribe_during_broadcast() {
        let shared = Arc::new(shared());
        let inner = Arc::clone(&shared);
        shared.sinks.lock().push(Box::new(move |_: &Arc<Response>| {
            inner.sinks.lock().push(Box::new(|_: &Arc<Response>| true));
            false
        }));

        shared.dispatch(&Arc::new(Response::Ring));

        assert_eq!(shared.sinks.lock().len(), 1);
    }

    #[test]
    fn test_link_failure_classification() {
        let timeout = ModemError::Timeout {
            request: "AT".into(),
        };
        assert!(link_failure(&timeout).is_some());
        assert!(link_failure(&ModemError::Rejected { tag: Tag::Csq }).is_none());
        assert!(link_failure(&ModemError::Unexpected {
            request: "AT".into(),
            response: "ERROR",
        })
        .is_none());
    }

    #[test]
    fn test_options_from_config() {
        let config = ChannelConfig {
            request_timeout_ms: 250,
            open_attempts: 0,
            ..ChannelConfig::default()
        };
        let options = ChannelOptions::from_config(&config);

        assert_eq!(options.request_timeout, Duration::from_millis(250));
        assert_eq!(options.open_attempts, 1);
        assert_eq!(options.init_sequence.len(), DEFAULT_INIT_SEQUENCE.len());
    }
}
