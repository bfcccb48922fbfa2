//! Bookkeeping shared by the BLE and serial receive loops.

use tracing::debug;

use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::protocol::Decoder;

/// Why a session stopped receiving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionEnd {
    /// The receive window elapsed.
    #[default]
    WindowElapsed,
    /// A shutdown was requested.
    Shutdown,
    /// The transport stopped delivering payloads.
    StreamClosed,
}

/// Counters for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionSummary {
    /// Payloads delivered by the transport.
    pub received: u64,
    /// Payloads decoded and dispatched.
    pub decoded: u64,
    /// Payloads dropped because they did not decode.
    pub dropped: u64,
    /// Why the session ended.
    pub end: SessionEnd,
}

impl SessionSummary {
    /// Decode one payload and dispatch the reading.
    ///
    /// Payloads that fail to decode are counted as dropped and their text is
    /// handed to the sinks as received. Only a sink error is returned.
    pub fn handle_payload(
        &mut self,
        decoder: &Decoder,
        dispatcher: &mut Dispatcher,
        payload: &[u8],
    ) -> Result<()> {
        self.received += 1;

        match decoder.decode_bytes(payload) {
            Ok(reading) => {
                debug!("Decoded: {}", reading);
                dispatcher.dispatch(&reading)?;
                self.decoded += 1;
            }
            Err(e) => {
                debug!("Not decoded: {}", e);
                let text = String::from_utf8_lossy(payload);
                dispatcher.dispatch_undecoded(text.trim())?;
                self.dropped += 1;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SensorKind;
    use crate::dispatch::{Effect, MockSink};
    use crate::error::Error;

    #[test]
    fn test_counts_decoded_and_dropped() {
        let mut summary = SessionSummary::default();
        let mut dispatcher = Dispatcher::new();
        let decoder = Decoder::default();

        summary
            .handle_payload(&decoder, &mut dispatcher, "温度: 23.5°C".as_bytes())
            .unwrap();
        summary
            .handle_payload(&decoder, &mut dispatcher, b"hello")
            .unwrap();

        assert_eq!(summary.received, 2);
        assert_eq!(summary.decoded, 1);
        assert_eq!(summary.dropped, 1);
    }

    #[test]
    fn test_reading_reaches_sink() {
        let mut sink = MockSink::new();
        sink.expect_name().return_const("mock");
        sink.expect_accept()
            .withf(|r| r.kind() == SensorKind::GasResistance && r.value() == 120.5)
            .times(1)
            .returning(|_| Ok(Effect::Echo));

        let mut summary = SessionSummary::default();
        let mut dispatcher = Dispatcher::new().with_sink(sink);

        summary
            .handle_payload(
                &Decoder::default(),
                &mut dispatcher,
                "ガス抵抗値: 120.5kOhms".as_bytes(),
            )
            .unwrap();
        assert_eq!(summary.decoded, 1);
    }

    #[test]
    fn test_undecoded_payload_is_still_reported() {
        let mut sink = MockSink::new();
        sink.expect_name().return_const("mock");
        sink.expect_accept().never();
        sink.expect_accept_undecoded()
            .withf(|raw| raw == "Hello from SPR-PERIPHERAL")
            .times(1)
            .returning(|_| Ok(Effect::Echo));

        let mut summary = SessionSummary::default();
        let mut dispatcher = Dispatcher::new().with_sink(sink);

        summary
            .handle_payload(
                &Decoder::default(),
                &mut dispatcher,
                b"  Hello from SPR-PERIPHERAL\r\n",
            )
            .unwrap();

        assert_eq!(summary.received, 1);
        assert_eq!(summary.dropped, 1);
        assert_eq!(summary.decoded, 0);
    }

    #[test]
    fn test_sink_error_propagates() {
        let mut sink = MockSink::new();
        sink.expect_name().return_const("mock");
        sink.expect_accept()
            .returning(|_| Err(Error::Internal("boom".to_string())));

        let mut summary = SessionSummary::default();
        let mut dispatcher = Dispatcher::new().with_sink(sink);

        let result = summary.handle_payload(&Decoder::default(), &mut dispatcher, b"Gas:1kOhm");
        assert!(result.is_err());
        assert_eq!(summary.decoded, 0);
        assert_eq!(summary.received, 1);
    }
}
