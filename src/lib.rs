//! # spresense-link
//!
//! Receive readings from a Sony Spresense sensor board over Bluetooth Low
//! Energy or a serial line, decode them, and print them, log them to CSV, or
//! show the latest value in a terminal window.
//!
//! The core is the decode-and-dispatch path:
//!
//! - [`protocol::Decoder`] turns a text payload into a [`Reading`].
//! - [`Dispatcher`] hands the reading to the sinks wired for a flow:
//!   [`ConsoleSink`], [`CsvSink`] or [`UiSink`].
//!
//! Transports deliver the payloads: [`ble`] subscribes to a notifying
//! characteristic, [`serial`] reads newline-terminated lines.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use spresense_link::ble::{self, run_session, shutdown_channel};
//! use spresense_link::{BleConfig, ConsoleSink, Decoder, Dispatcher, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = BleConfig::gas_sensor();
//!     let mut link = ble::connect(&config).await?;
//!
//!     let mut dispatcher = Dispatcher::new().with_sink(ConsoleSink::stdout());
//!     let (_stop, shutdown) = shutdown_channel();
//!
//!     let summary = run_session(
//!         &mut link,
//!         &Decoder::default(),
//!         &mut dispatcher,
//!         config.receive_window,
//!         shutdown,
//!     )
//!     .await?;
//!     println!("{} readings", summary.decoded);
//!
//!     link.disconnect().await
//! }
//! ```
//!
//! ## Platform Notes
//!
//! ### Linux
//! Requires BlueZ. User may need to be in the `bluetooth` and `dialout` groups.
//!
//! ### macOS
//! Requires Bluetooth permission for the terminal application.
//!
//! ### Windows
//! Requires Windows 10 or later with Bluetooth LE support.
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization for data types

// Public modules
pub mod ble;
pub mod config;
pub mod data;
pub mod dispatch;
pub mod error;
pub mod protocol;
pub mod serial;
pub mod session;

// Re-exports for convenience
pub use config::{BleConfig, CsvConfig, SerialConfig, TargetSelector};
pub use data::{Reading, SampleSet, SensorKind};
pub use dispatch::{ConsoleSink, CsvSink, Dispatcher, Effect, Sink, UiSink, UiState, UiUpdate};
pub use error::{Error, Result};
pub use protocol::{DecodeError, Decoder, Grammar};
pub use session::{SessionEnd, SessionSummary};

/// Install the `tracing` subscriber used by the binaries.
///
/// Honours `RUST_LOG`, falling back to `default_filter`.
pub fn init_logging(default_filter: &str) {
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
