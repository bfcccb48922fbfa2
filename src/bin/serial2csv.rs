//! Log BME680 readings from a Spresense serial port to CSV.
//!
//! Run with: cargo run --bin serial2csv
//!
//! Reads labelled lines from the board, echoes every decoded reading, and
//! writes one CSV row each time temperature, humidity, pressure and gas
//! resistance have all been received. Press Ctrl+C to stop; the port is
//! closed on the way out.

use spresense_link::serial::{SerialLink, SerialSession};
use spresense_link::{
    init_logging, ConsoleSink, CsvConfig, CsvSink, Decoder, Dispatcher, Error, Grammar, Result,
    SerialConfig,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging("info");

    let serial_config = SerialConfig::default();
    let csv_config = CsvConfig::default();

    let link = SerialLink::open(&serial_config).map_err(|e| {
        error!("Serial port error: {}", e);
        e
    })?;

    let dispatcher = Dispatcher::new()
        .with_sink(ConsoleSink::stdout())
        .with_sink(CsvSink::create(&csv_config)?);

    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, finishing the current read");
            flag.store(false, Ordering::SeqCst);
        }
    });

    let session = SerialSession::new(link, Decoder::new(Grammar::Serial), dispatcher);
    let result = tokio::task::spawn_blocking(move || session.run(&running))
        .await
        .map_err(|e| Error::Internal(format!("Serial task failed: {}", e)))?;

    match result {
        Ok(summary) => {
            info!(
                "{} line(s) received, {} decoded, {} dropped",
                summary.received, summary.decoded, summary.dropped
            );
            Ok(())
        }
        Err(e) => {
            error!("Serial port error: {}", e);
            Err(e)
        }
    }
}
