//! BLE communication module.
//!
//! This module provides the Bluetooth Low Energy transport: discovering the
//! sensor peripheral, connecting to it and receiving its notifications.

pub mod characteristics;
pub mod connection;
pub mod scanner;
pub mod session;
pub mod transport;
pub mod uuids;

pub use characteristics::CharacteristicHandler;
pub use connection::{BleLink, ConnectionState};
pub use scanner::{select_target, BleScanner, ConnectionTarget, DiscoveredDevice};
pub use session::{run_session, shutdown_channel, shutdown_requested};
pub use transport::{NotificationTransport, PayloadStream};
pub use uuids::*;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::BleConfig;
use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::protocol::Decoder;
use crate::session::{SessionEnd, SessionSummary};

/// Scan for the configured device and connect to it.
///
/// Discovery and connection are attempted once. Any failure ends here.
pub async fn connect(config: &BleConfig) -> Result<BleLink> {
    let scanner = BleScanner::new().await?;
    let device = scanner.find_target(config).await?;
    BleLink::connect(device, config.characteristic_uuid).await
}

/// Connect, receive for the configured window, then disconnect.
///
/// A shutdown signalled while scanning or connecting abandons the attempt and
/// skips the session.
pub async fn receive(
    config: &BleConfig,
    decoder: &Decoder,
    dispatcher: &mut Dispatcher,
    shutdown: watch::Receiver<bool>,
) -> Result<SessionSummary> {
    let stopped = SessionSummary {
        end: SessionEnd::Shutdown,
        ..Default::default()
    };

    let mut link = tokio::select! {
        link = connect(config) => link?,
        _ = shutdown_requested(shutdown.clone()) => {
            info!("Shutdown requested while connecting");
            return Ok(stopped);
        }
    };

    if *shutdown.borrow() {
        info!("Shutdown requested, not starting session");
        let _ = link.disconnect().await;
        return Ok(stopped);
    }

    let result = run_session(
        &mut link,
        decoder,
        dispatcher,
        config.receive_window,
        shutdown,
    )
    .await;

    if let Err(e) = link.disconnect().await {
        warn!("Disconnect failed: {}", e);
    }

    result
}
