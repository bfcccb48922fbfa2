//! BLE connection management.
//!
//! A [`BleLink`] is one connection to the sensor peripheral. It connects
//! exactly once; there is no reconnection.

use async_trait::async_trait;
use btleplug::api::Peripheral as _;
use btleplug::platform::Peripheral;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::ble::characteristics::CharacteristicHandler;
use crate::ble::scanner::{ConnectionTarget, DiscoveredDevice};
use crate::ble::transport::{NotificationTransport, PayloadStream};
use crate::error::{Error, Result};

/// Connection state for a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    /// Not connected to the peripheral.
    #[default]
    Disconnected,
    /// Currently attempting to connect.
    Connecting,
    /// Connected to the peripheral.
    Connected,
    /// Connected and receiving notifications.
    Subscribed,
}

impl ConnectionState {
    /// Check if connected.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected | Self::Subscribed)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected => write!(f, "Connected"),
            Self::Subscribed => write!(f, "Subscribed"),
        }
    }
}

/// A connection to one peripheral and its sensor characteristic.
pub struct BleLink {
    /// Who we are connected to.
    target: ConnectionTarget,
    /// The peripheral handle.
    peripheral: Peripheral,
    /// Characteristic cache.
    characteristics: CharacteristicHandler,
    /// Characteristic carrying the readings.
    characteristic_uuid: Uuid,
    /// Current connection state.
    state: Arc<RwLock<ConnectionState>>,
}

impl BleLink {
    /// Connect to a discovered device and check it exposes the characteristic.
    ///
    /// # Errors
    ///
    /// `ConnectionFailed` if the connection cannot be made, and
    /// `CharacteristicNotFound` if the device lacks the characteristic. The
    /// peripheral is disconnected again in the latter case.
    pub async fn connect(device: DiscoveredDevice, characteristic_uuid: Uuid) -> Result<Self> {
        let DiscoveredDevice {
            target, peripheral, ..
        } = device;

        let link = Self {
            target,
            characteristics: CharacteristicHandler::new(peripheral.clone()),
            peripheral,
            characteristic_uuid,
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
        };

        info!("Attempting to connect to device: {}...", link.target);
        link.set_state(ConnectionState::Connecting);

        if let Err(e) = link.peripheral.connect().await {
            link.set_state(ConnectionState::Disconnected);
            return Err(Error::ConnectionFailed {
                reason: e.to_string(),
            });
        }

        if !link.peripheral.is_connected().await.unwrap_or(false) {
            link.set_state(ConnectionState::Disconnected);
            return Err(Error::ConnectionFailed {
                reason: format!("{} did not report a connection", link.target),
            });
        }

        info!("Connected to device: {}", link.target);
        link.set_state(ConnectionState::Connected);

        if let Err(e) = link.peripheral.discover_services().await {
            let _ = link.disconnect().await;
            return Err(Error::Bluetooth(e));
        }

        link.characteristics.discover_characteristics();

        if !link.characteristics.has_characteristic(&characteristic_uuid) {
            error!(
                "Characteristic UUID {} not found on this device",
                characteristic_uuid
            );
            let _ = link.disconnect().await;
            return Err(Error::CharacteristicNotFound {
                uuid: characteristic_uuid.to_string(),
            });
        }

        Ok(link)
    }

    /// The connected device.
    pub fn target(&self) -> &ConnectionTarget {
        &self.target
    }

    /// Get the current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Disconnect from the peripheral.
    pub async fn disconnect(&self) -> Result<()> {
        if self.state() == ConnectionState::Disconnected {
            return Ok(());
        }

        let result = self.peripheral.disconnect().await;
        self.set_state(ConnectionState::Disconnected);

        match result {
            Ok(()) => {
                info!("Disconnected from {}", self.target);
                Ok(())
            }
            Err(e) => {
                error!("Failed to disconnect: {}", e);
                Err(Error::Bluetooth(e))
            }
        }
    }

    fn set_state(&self, new_state: ConnectionState) {
        let old_state = std::mem::replace(&mut *self.state.write(), new_state);

        if old_state != new_state {
            debug!("Connection state changed: {} -> {}", old_state, new_state);
        }
    }
}

#[async_trait]
impl NotificationTransport for BleLink {
    async fn subscribe(&mut self) -> Result<PayloadStream> {
        if !self.state().is_connected() {
            return Err(Error::ConnectionFailed {
                reason: format!("{} is not connected", self.target),
            });
        }

        let stream = self.characteristics.subscribe(&self.characteristic_uuid).await?;
        self.set_state(ConnectionState::Subscribed);
        Ok(stream)
    }

    async fn unsubscribe(&mut self) -> Result<()> {
        if self.state() != ConnectionState::Subscribed {
            return Ok(());
        }

        self.characteristics
            .unsubscribe(&self.characteristic_uuid)
            .await?;
        self.set_state(ConnectionState::Connected);
        Ok(())
    }
}
