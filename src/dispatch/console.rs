//! Console echo sink.
//!
//! Decoded readings are printed with their source text. Payloads that do not
//! decode are still printed as received.

use chrono::Local;
use std::io::{self, Stdout, Write};

use crate::data::Reading;
use crate::dispatch::{Effect, Sink};
use crate::error::Result;

/// Prints every reading on its own line.
pub struct ConsoleSink<W = Stdout> {
    out: W,
}

impl ConsoleSink<Stdout> {
    /// Echo to standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> ConsoleSink<W> {
    /// Echo to any writer.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> Sink for ConsoleSink<W> {
    fn name(&self) -> &'static str {
        "console"
    }

    fn accept(&mut self, reading: &Reading) -> Result<Effect> {
        writeln!(
            self.out,
            "[{}] {} ({})",
            reading.timestamp().format("%H:%M:%S"),
            reading,
            reading.raw()
        )?;
        self.out.flush()?;
        Ok(Effect::Echo)
    }

    fn accept_undecoded(&mut self, raw: &str) -> Result<Effect> {
        writeln!(
            self.out,
            "[{}] Received: {}",
            Local::now().format("%H:%M:%S"),
            raw
        )?;
        self.out.flush()?;
        Ok(Effect::Echo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SensorKind;

    #[test]
    fn test_echo_includes_kind_value_and_raw() {
        let mut sink = ConsoleSink::new(Vec::new());
        let reading = Reading::new(SensorKind::Temperature, 23.5, "°C", "温度: 23.5°C");

        assert_eq!(sink.accept(&reading).unwrap(), Effect::Echo);

        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert!(output.contains("Temperature: 23.5 °C"));
        assert!(output.contains("(温度: 23.5°C)"));
        assert!(output.ends_with('\n'));
    }

    #[test]
    fn test_undecoded_payload_is_echoed_as_received() {
        let mut sink = ConsoleSink::new(Vec::new());

        let effect = sink.accept_undecoded("Hello from SPR-PERIPHERAL").unwrap();
        assert_eq!(effect, Effect::Echo);

        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert!(output.contains("Received: Hello from SPR-PERIPHERAL"));
        assert_eq!(output.lines().count(), 1);
    }

    #[test]
    fn test_every_reading_is_echoed() {
        let mut sink = ConsoleSink::new(Vec::new());
        for value in [1.0, 2.0, 3.0] {
            let reading = Reading::new(SensorKind::GasResistance, value, "kOhm", "Gas");
            sink.accept(&reading).unwrap();
        }
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(output.lines().count(), 3);
    }
}
