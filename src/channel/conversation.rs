//! Request/reply correlation
//!
//! A `Conversation` has a single slot. A request closure arms it with a
//! predicate right before sending, then blocks until the reader worker
//! hands over the first response the predicate accepts, or the timeout
//! expires. The lock is only held to arm, to check and fulfil, and to
//! disarm; never while waiting.
//!
//! A query answered by a single tagged line is followed on the wire by its
//! own final result. The slot stays armed after the tagged line and claims
//! that final result too, so it can never be mistaken for the reply to the
//! next request.

use std::sync::mpsc::{self, SyncSender};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, warn};

use super::pipe::RequestPipe;
use crate::at::{registry, Response, Tag};
use crate::error::{ModemError, Result};

/// Predicate selecting the reply a request waits for
pub type Filter = Box<dyn Fn(&Response) -> bool + Send>;

struct Armed {
    filter: Filter,
    reply: SyncSender<Arc<Response>>,
    /// An accepted non-final response waits here for the final result
    until_final: bool,
    held: Option<Arc<Response>>,
}

impl Armed {
    fn fulfil(self, response: Arc<Response>) {
        let _ = self.reply.try_send(response);
    }
}

/// Single-slot correlation between one outstanding request and its reply
pub struct Conversation {
    slot: Mutex<Option<Armed>>,
    timeout: Duration,
}

impl Conversation {
    pub fn new(timeout: Duration) -> Self {
        Self {
            slot: Mutex::new(None),
            timeout,
        }
    }

    /// Timeout used by [`Conversation::exchange`]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send `request` and wait for the first response `filter` accepts
    pub fn exchange<F>(&self, pipe: &mut RequestPipe<'_>, request: &str, filter: F) -> Result<Arc<Response>>
    where
        F: Fn(&Response) -> bool + Send + 'static,
    {
        self.exchange_with_timeout(pipe, request, filter, self.timeout)
    }

    /// [`Conversation::exchange`] with an explicit timeout
    ///
    /// # Errors
    ///
    /// - `ModemError::Write` if the request could not be sent
    /// - `ModemError::Timeout` if no accepted response arrived in time
    pub fn exchange_with_timeout<F>(
        &self,
        pipe: &mut RequestPipe<'_>,
        request: &str,
        filter: F,
        timeout: Duration,
    ) -> Result<Arc<Response>>
    where
        F: Fn(&Response) -> bool + Send + 'static,
    {
        self.transact(pipe, request, Box::new(filter), false, timeout)
    }

    fn transact(
        &self,
        pipe: &mut RequestPipe<'_>,
        request: &str,
        filter: Filter,
        until_final: bool,
        timeout: Duration,
    ) -> Result<Arc<Response>> {
        let (reply, rx) = mpsc::sync_channel(1);
        *self.slot.lock() = Some(Armed {
            filter,
            reply,
            until_final,
            held: None,
        });

        if let Err(e) = pipe.send(request) {
            self.disarm();
            return Err(e);
        }

        match rx.recv_timeout(timeout) {
            Ok(response) => {
                debug!("'{}' answered with {}", request, response.what());
                Ok(response)
            }
            Err(_) => {
                let armed = self.disarm();
                // Fulfilled between the timeout and the disarm
                if let Ok(response) = rx.try_recv() {
                    return Ok(response);
                }
                if let Some(held) = armed.and_then(|armed| armed.held) {
                    warn!("No final result for '{}'", request);
                    return Ok(held);
                }
                warn!("Timeout for '{}'", request);
                Err(ModemError::Timeout {
                    request: request.to_string(),
                })
            }
        }
    }

    /// Send a command whose only reply is a final result; OK is success
    pub fn command(&self, pipe: &mut RequestPipe<'_>, request: &str) -> Result<()> {
        let response = self.exchange(pipe, request, Response::is_final)?;
        if response.is_ok() {
            Ok(())
        } else {
            Err(ModemError::Unexpected {
                request: request.to_string(),
                response: response.what(),
            })
        }
    }

    /// Send a query and wait for its `tag` reply
    ///
    /// An error report ends the wait early. A single-line reply is returned
    /// once the final result behind it has arrived. A list query answered
    /// with a bare OK yields the empty list.
    pub fn query(&self, pipe: &mut RequestPipe<'_>, request: &str, tag: Tag) -> Result<Arc<Response>> {
        let empty = Response::empty_list(tag);
        let accepts_ok = empty.is_some();
        // multi-line tokens already include their OK
        let until_final = !registry::lookup(tag).is_some_and(|spec| spec.multiline);

        let filter: Filter = Box::new(move |r| r.holds(tag) || r.is_error() || (accepts_ok && r.is_ok()));
        let response = self.transact(pipe, request, filter, until_final, self.timeout)?;

        if response.is_parse_error() {
            Err(ModemError::Rejected { tag })
        } else if response.is_error() {
            Err(ModemError::Unexpected {
                request: request.to_string(),
                response: response.what(),
            })
        } else if response.is_ok() {
            match empty {
                Some(empty) => Ok(Arc::new(empty)),
                None => Err(ModemError::Unexpected {
                    request: request.to_string(),
                    response: response.what(),
                }),
            }
        } else {
            Ok(response)
        }
    }

    /// Hand `response` to the armed request if it is the one it waits for
    ///
    /// Returns true when the response was claimed. The slot is disarmed
    /// before the waiter is woken, so a response is claimed at most once.
    pub fn deliver(&self, response: &Arc<Response>) -> bool {
        let mut slot = self.slot.lock();
        let Some(armed) = slot.as_mut() else {
            return false;
        };

        if armed.held.is_some() {
            if !response.is_final() {
                return false;
            }
            if let Some(mut armed) = slot.take() {
                if let Some(held) = armed.held.take() {
                    armed.fulfil(held);
                }
            }
            return true;
        }

        if !(armed.filter)(response) {
            return false;
        }
        if armed.until_final && !response.is_final() {
            armed.held = Some(Arc::clone(response));
            return true;
        }
        if let Some(armed) = slot.take() {
            armed.fulfil(Arc::clone(response));
        }
        true
    }

    /// True while a request is waiting for its reply
    pub fn is_armed(&self) -> bool {
        self.slot.lock().is_some()
    }

    fn disarm(&self) -> Option<Armed> {
        self.slot.lock().take()
    }
}

impl std::fmt::Debug for Conversation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Conversation")
            .field("armed", &self.is_armed())
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::at::payload::SignalStrength;
    use std::thread;

    fn csq() -> Arc<Response> {
        Arc::new(Response::Csq(SignalStrength::default()))
    }

    /// Deliver `response` from another thread once the slot is armed
    fn answer_later(conversation: &Arc<Conversation>, response: Arc<Response>) -> thread::JoinHandle<bool> {
        let responder = answer_all(conversation, vec![response]);
        thread::spawn(move || responder.join().unwrap()[0])
    }

    /// Deliver `responses` in order, each once the slot is armed
    fn answer_all(conversation: &Arc<Conversation>, responses: Vec<Arc<Response>>) -> thread::JoinHandle<Vec<bool>> {
        let conversation = Arc::clone(conversation);
        thread::spawn(move || {
            responses
                .iter()
                .map(|response| {
                    for _ in 0..200 {
                        if conversation.is_armed() {
                            return conversation.deliver(response);
                        }
                        thread::sleep(Duration::from_millis(5));
                    }
                    false
                })
                .collect()
        })
    }

    #[test]
    fn test_deliver_when_idle_is_not_claimed() {
        let conversation = Conversation::new(Duration::from_millis(50));
        assert!(!conversation.deliver(&Arc::new(Response::Ok)));
    }

    #[test]
    fn test_exchange_receives_matching_response() {
        let conversation = Arc::new(Conversation::new(Duration::from_secs(2)));
        let mut out: Vec<u8> = Vec::new();
        let responder = answer_later(&conversation, csq());

        let mut pipe = RequestPipe::new(&mut out);
        let response = conversation
            .exchange(&mut pipe, "AT+CSQ", |r| r.holds(Tag::Csq))
            .unwrap();

        assert!(responder.join().unwrap());
        assert!(response.holds(Tag::Csq));
        assert!(!conversation.is_armed());
        assert_eq!(out, b"AT+CSQ\r");
    }

    #[test]
    fn test_non_matching_response_is_not_claimed() {
        let conversation = Arc::new(Conversation::new(Duration::from_millis(100)));
        let responder = answer_later(&conversation, Arc::new(Response::Ring));

        let mut out: Vec<u8> = Vec::new();
        let mut pipe = RequestPipe::new(&mut out);
        let err = conversation
            .exchange(&mut pipe, "AT+CSQ", |r| r.holds(Tag::Csq))
            .unwrap_err();

        assert!(!responder.join().unwrap());
        assert!(matches!(err, ModemError::Timeout { ref request } if request == "AT+CSQ"));
    }

    #[test]
    fn test_timeout_disarms() {
        let conversation = Conversation::new(Duration::from_millis(20));
        let mut out: Vec<u8> = Vec::new();
        let mut pipe = RequestPipe::new(&mut out);

        let err = conversation.exchange(&mut pipe, "AT", Response::is_ok).unwrap_err();

        assert!(matches!(err, ModemError::Timeout { .. }));
        assert!(!conversation.is_armed());
        // A late reply is no longer claimed
        assert!(!conversation.deliver(&Arc::new(Response::Ok)));
    }

    #[test]
    fn test_write_failure_disarms() {
        struct Closed;
        impl std::io::Write for Closed {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::ErrorKind::BrokenPipe.into())
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let conversation = Conversation::new(Duration::from_secs(5));
        let mut writer = Closed;
        let mut pipe = RequestPipe::new(&mut writer);

        let err = conversation.exchange(&mut pipe, "AT", Response::is_ok).unwrap_err();

        assert!(matches!(err, ModemError::Write { .. }));
        assert!(!conversation.is_armed());
    }

    #[test]
    fn test_claimed_at_most_once() {
        let conversation = Arc::new(Conversation::new(Duration::from_secs(2)));
        let first = answer_later(&conversation, Arc::new(Response::Ok));

        let mut out: Vec<u8> = Vec::new();
        let mut pipe = RequestPipe::new(&mut out);
        conversation.exchange(&mut pipe, "AT", Response::is_ok).unwrap();

        assert!(first.join().unwrap());
        assert!(!conversation.deliver(&Arc::new(Response::Ok)));
    }

    #[test]
    fn test_command_maps_error_to_unexpected() {
        let conversation = Arc::new(Conversation::new(Duration::from_secs(2)));
        let responder = answer_later(&conversation, Arc::new(Response::Error));

        let mut out: Vec<u8> = Vec::new();
        let mut pipe = RequestPipe::new(&mut out);
        let err = conversation.command(&mut pipe, "AT+CFUN=1").unwrap_err();

        assert!(responder.join().unwrap());
        assert!(matches!(err, ModemError::Unexpected { response: "ERROR", .. }));
    }

    #[test]
    fn test_query_maps_parse_error_to_rejected() {
        let conversation = Arc::new(Conversation::new(Duration::from_secs(2)));
        let responder = answer_all(
            &conversation,
            vec![Arc::new(Response::ParseError { tag: Tag::Creg }), Arc::new(Response::Ok)],
        );

        let mut out: Vec<u8> = Vec::new();
        let mut pipe = RequestPipe::new(&mut out);
        let err = conversation.query(&mut pipe, "AT+CREG?", Tag::Creg).unwrap_err();

        assert_eq!(responder.join().unwrap(), vec![true, true]);
        assert!(matches!(err, ModemError::Rejected { tag: Tag::Creg }));
    }

    #[test]
    fn test_query_claims_final_result_after_tagged_line() {
        let conversation = Arc::new(Conversation::new(Duration::from_secs(2)));
        let responder = answer_all(
            &conversation,
            vec![csq(), Arc::new(Response::Ring), Arc::new(Response::Ok)],
        );

        let mut out: Vec<u8> = Vec::new();
        let mut pipe = RequestPipe::new(&mut out);
        let response = conversation.query(&mut pipe, "AT+CSQ", Tag::Csq).unwrap();

        // RING in between is unsolicited, the OK belongs to the query
        assert_eq!(responder.join().unwrap(), vec![true, false, true]);
        assert!(response.holds(Tag::Csq));
        assert!(!conversation.is_armed());
        assert!(!conversation.deliver(&Arc::new(Response::Ok)));
    }

    #[test]
    fn test_next_command_gets_its_own_result() {
        let conversation = Arc::new(Conversation::new(Duration::from_secs(2)));
        let mut out: Vec<u8> = Vec::new();
        let mut pipe = RequestPipe::new(&mut out);

        let responder = answer_all(&conversation, vec![csq(), Arc::new(Response::Ok)]);
        conversation.query(&mut pipe, "AT+CSQ", Tag::Csq).unwrap();
        responder.join().unwrap();

        let responder = answer_later(&conversation, Arc::new(Response::Error));
        let err = conversation.command(&mut pipe, "AT+CFUN=0").unwrap_err();

        assert!(responder.join().unwrap());
        assert!(matches!(err, ModemError::Unexpected { response: "ERROR", .. }));
    }

    #[test]
    fn test_query_without_final_result_returns_tagged_line() {
        let conversation = Arc::new(Conversation::new(Duration::from_millis(100)));
        let responder = answer_later(&conversation, csq());

        let mut out: Vec<u8> = Vec::new();
        let mut pipe = RequestPipe::new(&mut out);
        let response = conversation.query(&mut pipe, "AT+CSQ", Tag::Csq).unwrap();

        assert!(responder.join().unwrap());
        assert!(response.holds(Tag::Csq));
        assert!(!conversation.is_armed());
    }

    #[test]
    fn test_list_query_answered_by_bare_ok_is_empty() {
        let conversation = Arc::new(Conversation::new(Duration::from_secs(2)));
        let responder = answer_later(&conversation, Arc::new(Response::Ok));

        let mut out: Vec<u8> = Vec::new();
        let mut pipe = RequestPipe::new(&mut out);
        let response = conversation.query(&mut pipe, "AT+CLCC", Tag::Clcc).unwrap();

        assert!(responder.join().unwrap());
        assert!(matches!(*response, Response::Clcc(ref list) if list.calls.is_empty()));
    }

    #[test]
    fn test_single_line_query_ignores_bare_ok() {
        let conversation = Arc::new(Conversation::new(Duration::from_millis(50)));
        let responder = answer_later(&conversation, Arc::new(Response::Ok));

        let mut out: Vec<u8> = Vec::new();
        let mut pipe = RequestPipe::new(&mut out);
        let err = conversation.query(&mut pipe, "AT+CSQ", Tag::Csq).unwrap_err();

        assert!(!responder.join().unwrap());
        assert!(matches!(err, ModemError::Timeout { .. }));
    }
}
