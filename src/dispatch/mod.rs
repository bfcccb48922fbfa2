//! Routing decoded readings to presentation sinks.
//!
//! A [`Dispatcher`] owns the sinks wired for one flow and hands every reading
//! to each of them in turn.

pub mod console;
pub mod csv;
pub mod ui;

pub use self::console::ConsoleSink;
pub use self::csv::{CsvSink, CSV_HEADER, CSV_TIMESTAMP_FORMAT};
pub use self::ui::{warning_for, UiSink, UiState, UiUpdate, WARNING_TEXT, WARNING_THRESHOLD};

use tracing::trace;

use crate::data::Reading;
use crate::error::Result;

/// What a sink did with a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Effect {
    /// The reading was printed.
    Echo,
    /// A complete CSV row was written.
    CsvRowEmitted,
    /// An update was handed to the UI.
    UiUpdated,
    /// Nothing observable happened.
    Noop,
}

/// A destination for decoded readings.
#[cfg_attr(test, mockall::automock)]
pub trait Sink: Send {
    /// Short name used in log messages.
    fn name(&self) -> &'static str;

    /// Consume one reading.
    fn accept(&mut self, reading: &Reading) -> Result<Effect>;

    /// Consume a payload that did not decode. Ignored unless the sink echoes.
    fn accept_undecoded(&mut self, _raw: &str) -> Result<Effect> {
        Ok(Effect::Noop)
    }
}

/// Hands readings to every wired sink.
#[derive(Default)]
pub struct Dispatcher {
    sinks: Vec<Box<dyn Sink>>,
}

impl Dispatcher {
    /// Create a dispatcher with no sinks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wire a sink.
    pub fn with_sink(mut self, sink: impl Sink + 'static) -> Self {
        self.add_sink(sink);
        self
    }

    /// Wire a sink.
    pub fn add_sink(&mut self, sink: impl Sink + 'static) {
        self.sinks.push(Box::new(sink));
    }

    /// Number of wired sinks.
    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Dispatch one reading.
    ///
    /// Returns one effect per sink in wiring order, or `[Noop]` when no sink
    /// is wired. The first sink error stops dispatch and is returned.
    pub fn dispatch(&mut self, reading: &Reading) -> Result<Vec<Effect>> {
        if self.sinks.is_empty() {
            return Ok(vec![Effect::Noop]);
        }

        let mut effects = Vec::with_capacity(self.sinks.len());
        for sink in &mut self.sinks {
            let effect = sink.accept(reading)?;
            trace!("{} sink: {:?}", sink.name(), effect);
            effects.push(effect);
        }

        Ok(effects)
    }

    /// Hand payload text that did not decode to every sink.
    ///
    /// Same effect and error rules as [`Dispatcher::dispatch`].
    pub fn dispatch_undecoded(&mut self, raw: &str) -> Result<Vec<Effect>> {
        if self.sinks.is_empty() {
            return Ok(vec![Effect::Noop]);
        }

        let mut effects = Vec::with_capacity(self.sinks.len());
        for sink in &mut self.sinks {
            let effect = sink.accept_undecoded(raw)?;
            trace!("{} sink (undecoded): {:?}", sink.name(), effect);
            effects.push(effect);
        }

        Ok(effects)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field(
                "sinks",
                &self.sinks.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SensorKind;
    use crate::error::Error;

    fn reading(value: f64) -> Reading {
        Reading::new(SensorKind::GasResistance, value, "kOhm", "Gas:1kOhm")
    }

    #[test]
    fn test_no_sinks_is_noop() {
        let mut dispatcher = Dispatcher::new();
        assert_eq!(dispatcher.dispatch(&reading(1.0)).unwrap(), vec![Effect::Noop]);
    }

    #[test]
    fn test_every_sink_sees_the_reading() {
        let mut first = MockSink::new();
        first.expect_name().return_const("first");
        first
            .expect_accept()
            .withf(|r| r.value() == 42.0)
            .times(1)
            .returning(|_| Ok(Effect::Echo));

        let mut second = MockSink::new();
        second.expect_name().return_const("second");
        second
            .expect_accept()
            .times(1)
            .returning(|_| Ok(Effect::UiUpdated));

        let mut dispatcher = Dispatcher::new().with_sink(first).with_sink(second);
        assert_eq!(dispatcher.sink_count(), 2);

        let effects = dispatcher.dispatch(&reading(42.0)).unwrap();
        assert_eq!(effects, vec![Effect::Echo, Effect::UiUpdated]);
    }

    #[test]
    fn test_sink_error_stops_dispatch() {
        let mut failing = MockSink::new();
        failing.expect_name().return_const("failing");
        failing.expect_accept().times(1).returning(|_| {
            Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk full",
            )))
        });

        let mut never = MockSink::new();
        never.expect_name().return_const("never");
        never.expect_accept().never();

        let mut dispatcher = Dispatcher::new().with_sink(failing).with_sink(never);
        assert!(dispatcher.dispatch(&reading(1.0)).is_err());
    }

    #[test]
    fn test_undecoded_text_reaches_every_sink() {
        let mut echo = MockSink::new();
        echo.expect_name().return_const("echo");
        echo.expect_accept().never();
        echo.expect_accept_undecoded()
            .withf(|raw| raw == "Hello from SPR-PERIPHERAL")
            .times(1)
            .returning(|_| Ok(Effect::Echo));

        let mut quiet = MockSink::new();
        quiet.expect_name().return_const("quiet");
        quiet
            .expect_accept_undecoded()
            .times(1)
            .returning(|_| Ok(Effect::Noop));

        let mut dispatcher = Dispatcher::new().with_sink(echo).with_sink(quiet);
        let effects = dispatcher
            .dispatch_undecoded("Hello from SPR-PERIPHERAL")
            .unwrap();
        assert_eq!(effects, vec![Effect::Echo, Effect::Noop]);
    }

    #[test]
    fn test_debug_lists_sink_names() {
        let mut sink = MockSink::new();
        sink.expect_name().return_const("console");
        let dispatcher = Dispatcher::new().with_sink(sink);
        assert!(format!("{:?}", dispatcher).contains("console"));
    }
}
