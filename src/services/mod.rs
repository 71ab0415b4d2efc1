//! Service handlers built on the channel
//!
//! Handlers receive unsolicited responses through [`ResponseSink`], a
//! visitor over [`Response`]: override the methods for the responses you
//! care about, everything else lands in [`ResponseSink::on_other`].

pub mod id_allocator;
pub mod network;

pub use id_allocator::IdAllocator;
pub use network::{NetworkSnapshot, NetworkState};

use crate::at::payload::{
    CallList, IncomingSms, NetworkTime, PhysicalChannelConfig, Registration, SignalStrength,
    StatusReport,
};
use crate::at::{Response, Tag};

/// Receiver of unsolicited responses
///
/// Attached with [`crate::channel::Channel::attach`]; the channel only
/// keeps a weak reference.
pub trait ResponseSink: Send + Sync + 'static {
    /// Entry point; routes to the per-kind methods
    fn on_response(&self, response: &Response) {
        visit(self, response);
    }

    /// `+CREG`, `+CGREG` or `+CEREG`
    fn on_registration(&self, _tag: Tag, _registration: &Registration) {}

    fn on_radio_power(&self, _on: bool) {}

    fn on_signal_strength(&self, _signal: &SignalStrength) {}

    fn on_network_time(&self, _time: &NetworkTime) {}

    fn on_physical_channel(&self, _config: &PhysicalChannelConfig) {}

    fn on_ring(&self) {}

    fn on_call_list(&self, _calls: &CallList) {}

    fn on_incoming_sms(&self, _sms: &IncomingSms) {}

    fn on_status_report(&self, _report: &StatusReport) {}

    /// `+CUSATP` proactive command, hex encoded
    fn on_stk_proactive(&self, _command: &str) {}

    fn on_stk_session_end(&self) {}

    /// Anything without a dedicated method
    fn on_other(&self, _response: &Response) {}
}

/// Call the method of `sink` matching `response`
pub fn visit<S: ResponseSink + ?Sized>(sink: &S, response: &Response) {
    match response {
        Response::Creg(r) => sink.on_registration(Tag::Creg, r),
        Response::Cgreg(r) => sink.on_registration(Tag::Cgreg, r),
        Response::Cereg(r) => sink.on_registration(Tag::Cereg, r),
        Response::Cfun(on) => sink.on_radio_power(*on),
        Response::Csq(signal) => sink.on_signal_strength(signal),
        Response::Ctzv(time) => sink.on_network_time(time),
        Response::Cgfpccfg(config) => sink.on_physical_channel(config),
        Response::Ring => sink.on_ring(),
        Response::Clcc(calls) => sink.on_call_list(calls),
        Response::Cmt(sms) => sink.on_incoming_sms(sms),
        Response::Cds(report) => sink.on_status_report(report),
        Response::Cusatp(command) => sink.on_stk_proactive(command),
        Response::Cusatend => sink.on_stk_session_end(),
        other => sink.on_other(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<String>>,
    }

    impl ResponseSink for Recorder {
        fn on_registration(&self, tag: Tag, registration: &Registration) {
            self.seen
                .lock()
                .push(format!("{} {:?}", tag, registration.state));
        }

        fn on_ring(&self) {
            self.seen.lock().push("ring".into());
        }

        fn on_other(&self, response: &Response) {
            self.seen.lock().push(format!("other {}", response.what()));
        }
    }

    #[test]
    fn test_visit_routes_by_kind() {
        let recorder = Recorder::default();
        let registration = Registration::parse("1").unwrap();

        recorder.on_response(&Response::Cgreg(registration));
        recorder.on_response(&Response::Ring);
        recorder.on_response(&Response::Ok);

        assert_eq!(
            *recorder.seen.lock(),
            vec!["CGREG Home", "ring", "other OK"]
        );
    }

    #[test]
    fn test_unhandled_kinds_are_ignored_by_default() {
        struct Silent;
        impl ResponseSink for Silent {}

        Silent.on_response(&Response::Csq(SignalStrength::default()));
        Silent.on_response(&Response::Cusatend);
    }
}
