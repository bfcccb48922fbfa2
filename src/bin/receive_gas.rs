//! Receive gas resistance readings from the Spresense gas sensor sketch.
//!
//! Run with: cargo run --bin receive_gas
//!
//! Looks for `SPR-GAS-SENSOR` and, for debugging, falls back to the first
//! device found. Every discovered device and every service and characteristic
//! of the connected one is logged. Readings are printed for 60 seconds.

use spresense_link::ble::{self, shutdown_channel};
use spresense_link::{
    init_logging, BleConfig, ConsoleSink, Decoder, Dispatcher, Grammar, Result,
};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging("info");

    let config = BleConfig::gas_sensor();
    let (stop_tx, shutdown) = shutdown_channel();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = stop_tx.send(true);
        }
    });

    let decoder = Decoder::new(Grammar::Ble);
    let mut dispatcher = Dispatcher::new().with_sink(ConsoleSink::stdout());

    match ble::receive(&config, &decoder, &mut dispatcher, shutdown).await {
        Ok(summary) => {
            info!(
                "Received {} notification(s), {} decoded, {} dropped",
                summary.received, summary.decoded, summary.dropped
            );
            Ok(())
        }
        Err(e) if e.is_discovery_failure() => {
            error!("{}. Ensure the Spresense is advertising.", e);
            Err(e)
        }
        Err(e) => {
            error!("BLE Error: {}", e);
            Err(e)
        }
    }
}
