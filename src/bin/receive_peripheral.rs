//! Receive notifications from the Spresense BLE1507 peripheral sketch.
//!
//! Run with: cargo run --bin receive_peripheral
//!
//! Connects only to a device advertising `SPR-PERIPHERAL`, prints every
//! decoded reading for 60 seconds, then disconnects. Ctrl+C stops early.

use spresense_link::ble::{self, shutdown_channel};
use spresense_link::{init_logging, BleConfig, ConsoleSink, Decoder, Dispatcher, Result};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging("info");

    let config = BleConfig::peripheral();
    let (stop_tx, shutdown) = shutdown_channel();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = stop_tx.send(true);
        }
    });

    let mut dispatcher = Dispatcher::new().with_sink(ConsoleSink::stdout());

    match ble::receive(&config, &Decoder::default(), &mut dispatcher, shutdown).await {
        Ok(summary) => {
            info!("Received {} notification(s)", summary.received);
            Ok(())
        }
        Err(e) => {
            error!("BLE Error: {}", e);
            Err(e)
        }
    }
}
