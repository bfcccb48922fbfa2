//! CSV logging sink for the serial flow.
//!
//! Readings arrive one kind at a time. They are collected in a [`SampleSet`]
//! and a row is written only once all four kinds have a value.

use chrono::Local;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

use crate::config::CsvConfig;
use crate::data::{CompleteSample, Reading, SampleSet, SensorKind};
use crate::dispatch::{Effect, Sink};
use crate::error::Result;

/// Header row of the CSV file.
pub const CSV_HEADER: &str =
    "Timestamp,Temperature (°C),Humidity (%),Pressure (hPa),Gas Resistance (kOhms)";

/// Format of the timestamp column.
pub const CSV_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Writes one CSV row per complete [`SampleSet`] cycle.
pub struct CsvSink<W: Write> {
    out: W,
    samples: SampleSet,
    rows_written: u64,
}

impl CsvSink<BufWriter<File>> {
    /// Create (or truncate) the configured file and write the header.
    pub fn create(config: &CsvConfig) -> Result<Self> {
        Self::create_path(&config.path)
    }

    /// Create (or truncate) a file and write the header.
    pub fn create_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)?;
        info!("Writing CSV to {}", path.display());
        Self::new(BufWriter::new(file))
    }
}

impl<W: Write> CsvSink<W> {
    /// Wrap a writer and write the header row.
    pub fn new(mut out: W) -> Result<Self> {
        writeln!(out, "{}", CSV_HEADER)?;
        out.flush()?;

        Ok(Self {
            out,
            samples: SampleSet::new(),
            rows_written: 0,
        })
    }

    /// Values waiting for the rest of their cycle.
    pub fn pending(&self) -> &SampleSet {
        &self.samples
    }

    /// Number of data rows written so far.
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_row(&mut self, sample: &CompleteSample) -> Result<()> {
        let timestamp = Local::now().format(CSV_TIMESTAMP_FORMAT);
        let mut row = timestamp.to_string();
        for value in sample.values() {
            row.push_str(&format!(",{:?}", value));
        }

        writeln!(self.out, "{}", row)?;
        self.out.flush()?;
        self.rows_written += 1;

        info!("CSV row written: {}", row);
        Ok(())
    }
}

impl<W: Write + Send> Sink for CsvSink<W> {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn accept(&mut self, reading: &Reading) -> Result<Effect> {
        if reading.kind() == SensorKind::Unknown {
            return Ok(Effect::Noop);
        }

        self.samples.record(reading.kind(), reading.value());

        match self.samples.take_complete() {
            Some(sample) => {
                self.write_row(&sample)?;
                Ok(Effect::CsvRowEmitted)
            }
            None => Ok(Effect::Noop),
        }
    }
}
