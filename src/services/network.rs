//! Network state handler
//!
//! Caches what the modem last reported about registration, radio power,
//! signal strength and network time. The cache has two writers: request
//! closures on the request worker ([`NetworkState::refresh`]) and the
//! reader worker through [`ResponseSink`]. Both go through one mutex, and
//! the last report wins.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::ResponseSink;
use crate::at::payload::{NetworkTime, Registration, SignalStrength};
use crate::at::{Response, Tag};
use crate::channel::{Channel, Conversation, RequestPipe};
use crate::error::{ModemError, Result};

/// Queries run by [`NetworkState::refresh`], with the tag each one answers
const REFRESH_QUERIES: &[(&str, Tag)] = &[
    ("AT+CFUN?", Tag::Cfun),
    ("AT+CREG?", Tag::Creg),
    ("AT+CGREG?", Tag::Cgreg),
    ("AT+CEREG?", Tag::Cereg),
    ("AT+CSQ", Tag::Csq),
];

/// Point-in-time copy of the cache
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NetworkSnapshot {
    /// Circuit-switched registration (`+CREG`)
    pub voice: Option<Registration>,
    /// GPRS registration (`+CGREG`)
    pub data: Option<Registration>,
    /// EPS registration (`+CEREG`)
    pub eps: Option<Registration>,
    pub radio_on: Option<bool>,
    pub signal: Option<SignalStrength>,
    pub time: Option<NetworkTime>,
}

impl NetworkSnapshot {
    /// Registered on any domain, home or roaming
    pub fn is_registered(&self) -> bool {
        [&self.voice, &self.data, &self.eps]
            .into_iter()
            .flatten()
            .any(|r| r.state.is_registered())
    }

    /// Signal strength to report: nothing useful while the radio is off
    pub fn reported_signal(&self) -> SignalStrength {
        match (self.radio_on, &self.signal) {
            (Some(true), Some(signal)) => *signal,
            _ => SignalStrength::default(),
        }
    }
}

/// Shared network state cache
#[derive(Debug, Default)]
pub struct NetworkState {
    state: Mutex<NetworkSnapshot>,
}

impl NetworkState {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn snapshot(&self) -> NetworkSnapshot {
        self.state.lock().clone()
    }

    /// Query the modem and store the replies
    ///
    /// Runs inside a request closure. A query the modem rejects is skipped;
    /// timeouts and write failures end the refresh.
    pub fn refresh(&self, pipe: &mut RequestPipe<'_>, conversation: &Conversation) -> Result<()> {
        for &(request, tag) in REFRESH_QUERIES {
            match conversation.query(pipe, request, tag) {
                Ok(response) => {
                    self.record(&response);
                }
                Err(e @ (ModemError::Unexpected { .. } | ModemError::Rejected { .. })) => {
                    warn!("{}", e);
                }
                Err(e) => return Err(e),
            }
        }
        debug!("Network state refreshed");
        Ok(())
    }

    /// Queue [`NetworkState::refresh`] on `channel`
    pub fn queue_refresh(self: &Arc<Self>, channel: &Channel) {
        let this = Arc::clone(self);
        channel.queue_request(move |pipe, conversation| this.refresh(pipe, conversation));
    }

    /// Store a response if it is one the cache tracks
    ///
    /// Returns true when the response was stored.
    pub fn record(&self, response: &Response) -> bool {
        let mut state = self.state.lock();
        match response {
            Response::Creg(r) => update_registration(&mut state.voice, Tag::Creg, r),
            Response::Cgreg(r) => update_registration(&mut state.data, Tag::Cgreg, r),
            Response::Cereg(r) => update_registration(&mut state.eps, Tag::Cereg, r),
            Response::Cfun(on) => {
                if state.radio_on != Some(*on) {
                    info!("Radio power {}", if *on { "on" } else { "off" });
                }
                state.radio_on = Some(*on);
            }
            Response::Csq(signal) => state.signal = Some(*signal),
            Response::Ctzv(time) => state.time = Some(time.clone()),
            _ => return false,
        }
        true
    }
}

fn update_registration(slot: &mut Option<Registration>, tag: Tag, registration: &Registration) {
    if slot.as_ref().map(|r| r.state) != Some(registration.state) {
        info!("{} registration: {:?}", tag, registration.state);
    }
    *slot = Some(registration.clone());
}

impl ResponseSink for NetworkState {
    fn on_registration(&self, tag: Tag, registration: &Registration) {
        let mut state = self.state.lock();
        let slot = match tag {
            Tag::Cgreg => &mut state.data,
            Tag::Cereg => &mut state.eps,
            _ => &mut state.voice,
        };
        update_registration(slot, tag, registration);
    }

    fn on_radio_power(&self, on: bool) {
        self.record(&Response::Cfun(on));
    }

    fn on_signal_strength(&self, signal: &SignalStrength) {
        self.state.lock().signal = Some(*signal);
    }

    fn on_network_time(&self, time: &NetworkTime) {
        debug!("Network time {}", time.nitz_string());
        self.state.lock().time = Some(time.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::at::payload::RegState;

    #[test]
    fn test_record_registration_by_domain() {
        let state = NetworkState::default();

        assert!(state.record(&Response::Creg(Registration::parse("2,1,\"00C3\",\"0000a2b1\",7").unwrap())));
        assert!(state.record(&Response::Cereg(Registration::parse("5").unwrap())));
        assert!(!state.record(&Response::Ring));

        let snapshot = state.snapshot();
        let voice = snapshot.voice.unwrap();
        assert_eq!(voice.state, RegState::Home);
        assert_eq!(voice.area_code, Some(0xC3));
        assert_eq!(snapshot.eps.unwrap().state, RegState::Roaming);
        assert!(snapshot.data.is_none());
    }

    #[test]
    fn test_sink_updates_cache() {
        let state = NetworkState::shared();

        state.on_response(&Response::Cgreg(Registration::parse("1").unwrap()));
        state.on_response(&Response::Cfun(true));

        let snapshot = state.snapshot();
        assert!(snapshot.is_registered());
        assert_eq!(snapshot.radio_on, Some(true));
    }

    #[test]
    fn test_reported_signal_requires_radio_on() {
        let state = NetworkState::default();
        let signal = SignalStrength::parse("22,0,-1,-1,-1,-1,-1,-1,-1,-1,-1,-1").unwrap();
        state.record(&Response::Csq(signal));

        assert_eq!(state.snapshot().reported_signal(), SignalStrength::default());

        state.record(&Response::Cfun(true));
        assert_eq!(state.snapshot().reported_signal(), signal);
    }

    #[test]
    fn test_not_registered_by_default() {
        assert!(!NetworkSnapshot::default().is_registered());
    }
}
