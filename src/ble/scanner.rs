//! BLE scanning functionality.
//!
//! Provides the scanner for discovering the Spresense peripheral and the
//! rules for picking which discovered device to connect to.

use btleplug::api::{Central, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, Peripheral};
use std::time::Duration;
use tracing::{debug, info, trace, warn};

use crate::config::{BleConfig, TargetSelector};
use crate::error::{Error, Result};

/// A discovered peripheral, identified by advertised name and address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConnectionTarget {
    /// Advertised local name. Empty when the device does not advertise one.
    pub name: String,
    /// Platform address of the device.
    pub address: String,
}

impl ConnectionTarget {
    /// Create a target.
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }

    /// Name for display, `Unknown` when none was advertised.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            "Unknown"
        } else {
            &self.name
        }
    }
}

impl std::fmt::Display for ConnectionTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.display_name(), self.address)
    }
}

/// A device seen during a scan.
#[derive(Debug, Clone)]
pub struct DiscoveredDevice {
    /// Name and address.
    pub target: ConnectionTarget,
    /// Signal strength in dBm.
    pub rssi: Option<i16>,
    /// The peripheral handle.
    pub peripheral: Peripheral,
}

/// Pick a target among discovered devices.
///
/// Returns the index of the first device whose advertised name equals the
/// selector's name. A [`TargetSelector::NamedOrFirst`] selector falls back to
/// the first device.
pub fn select_target(targets: &[ConnectionTarget], selector: &TargetSelector) -> Result<usize> {
    if targets.is_empty() {
        return Err(Error::NoDevicesFound);
    }

    if let Some(index) = targets.iter().position(|t| t.name == selector.name()) {
        return Ok(index);
    }

    if selector.falls_back_to_first() {
        warn!(
            "Device with name '{}' not found, using first available device {} for debugging",
            selector.name(),
            targets[0]
        );
        return Ok(0);
    }

    Err(Error::DeviceNotFound {
        name: selector.name().to_string(),
    })
}

/// BLE scanner for discovering peripherals.
pub struct BleScanner {
    /// The BLE adapter to use for scanning.
    adapter: Adapter,
}

impl BleScanner {
    /// Create a new BLE scanner on the first available adapter.
    ///
    /// # Errors
    ///
    /// Returns an error if Bluetooth is not available.
    pub async fn new() -> Result<Self> {
        let manager = Manager::new()
            .await
            .map_err(|_e| Error::BluetoothUnavailable)?;

        let adapters = manager.adapters().await.map_err(Error::Bluetooth)?;

        let adapter = adapters
            .into_iter()
            .next()
            .ok_or(Error::BluetoothUnavailable)?;

        info!(
            "Using Bluetooth adapter: {:?}",
            adapter.adapter_info().await.ok()
        );

        Ok(Self { adapter })
    }

    /// Scan for a fixed time and return every device seen.
    pub async fn discover(&self, duration: Duration) -> Result<Vec<DiscoveredDevice>> {
        info!("Scanning for BLE devices for {:?}...", duration);

        self.adapter
            .start_scan(ScanFilter::default())
            .await
            .map_err(Error::Bluetooth)?;

        tokio::time::sleep(duration).await;

        let peripherals = self.adapter.peripherals().await;

        if let Err(e) = self.adapter.stop_scan().await {
            debug!("Failed to stop scan: {}", e);
        }

        let mut devices = Vec::new();
        for peripheral in peripherals.map_err(Error::Bluetooth)? {
            let properties = match peripheral.properties().await {
                Ok(Some(p)) => p,
                Ok(None) => {
                    trace!("No properties for {:?}", peripheral.id());
                    continue;
                }
                Err(e) => {
                    trace!("Failed to read properties: {}", e);
                    continue;
                }
            };

            let target = ConnectionTarget::new(
                properties.local_name.clone().unwrap_or_default(),
                properties.address.to_string(),
            );

            info!(
                "Found device: {}, RSSI: {:?}, services: {:?}",
                target, properties.rssi, properties.services
            );

            devices.push(DiscoveredDevice {
                target,
                rssi: properties.rssi,
                peripheral,
            });
        }

        info!("Scan finished, {} device(s) found", devices.len());

        Ok(devices)
    }

    /// Scan and pick the device the configuration asks for.
    pub async fn find_target(&self, config: &BleConfig) -> Result<DiscoveredDevice> {
        let mut devices = self.discover(config.scan_duration).await?;

        let targets: Vec<ConnectionTarget> = devices.iter().map(|d| d.target.clone()).collect();
        let index = select_target(&targets, &config.target)?;

        Ok(devices.swap_remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn targets() -> Vec<ConnectionTarget> {
        vec![
            ConnectionTarget::new("", "AA:BB:CC:DD:EE:01"),
            ConnectionTarget::new("Headphones", "AA:BB:CC:DD:EE:02"),
            ConnectionTarget::new("SPR-GAS-SENSOR", "AA:BB:CC:DD:EE:03"),
        ]
    }

    #[test]
    fn test_select_by_exact_name() {
        let selector = TargetSelector::Named("SPR-GAS-SENSOR".to_string());
        assert_eq!(select_target(&targets(), &selector).unwrap(), 2);

        let selector = TargetSelector::NamedOrFirst("SPR-GAS-SENSOR".to_string());
        assert_eq!(select_target(&targets(), &selector).unwrap(), 2);
    }

    #[test]
    fn test_select_falls_back_to_first() {
        let selector = TargetSelector::NamedOrFirst("SPR-PERIPHERAL".to_string());
        assert_eq!(select_target(&targets(), &selector).unwrap(), 0);
    }

    #[test]
    fn test_select_not_found() {
        let selector = TargetSelector::Named("SPR-PERIPHERAL".to_string());
        let err = select_target(&targets(), &selector).unwrap_err();
        assert!(matches!(err, Error::DeviceNotFound { ref name } if name == "SPR-PERIPHERAL"));
        assert!(err.is_discovery_failure());
    }

    #[test]
    fn test_select_empty_scan() {
        let selector = TargetSelector::NamedOrFirst("SPR-GAS-SENSOR".to_string());
        assert!(matches!(
            select_target(&[], &selector),
            Err(Error::NoDevicesFound)
        ));
    }

    #[test]
    fn test_partial_name_does_not_match() {
        let selector = TargetSelector::Named("SPR".to_string());
        assert!(select_target(&targets(), &selector).is_err());
    }

    #[test]
    fn test_target_display() {
        assert_eq!(
            ConnectionTarget::new("", "00:11").to_string(),
            "Unknown (00:11)"
        );
        assert_eq!(
            ConnectionTarget::new("SPR-PERIPHERAL", "00:11").to_string(),
            "SPR-PERIPHERAL (00:11)"
        );
    }

    #[test]
    fn test_discovered_device_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<DiscoveredDevice>();
    }
}
