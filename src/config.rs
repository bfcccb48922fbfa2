//! Session configuration.
//!
//! Every transport takes an explicit configuration struct at construction.
//! The presets mirror the boards this crate was written for.

use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

use crate::ble::uuids::SENSOR_CHARACTERISTIC_UUID;

/// Advertised name of the Spresense BLE1507 peripheral sketch.
pub const SPR_PERIPHERAL_NAME: &str = "SPR-PERIPHERAL";

/// Advertised name of the Spresense gas sensor sketch.
pub const SPR_GAS_SENSOR_NAME: &str = "SPR-GAS-SENSOR";

/// How long to scan before picking a target.
pub const DEFAULT_SCAN_DURATION: Duration = Duration::from_secs(5);

/// How long to receive notifications before ending the session.
pub const DEFAULT_RECEIVE_WINDOW: Duration = Duration::from_secs(60);

/// Baud rate used by the BME680 sketch.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Read timeout for one serial line.
pub const DEFAULT_SERIAL_TIMEOUT: Duration = Duration::from_secs(1);

/// Serial port the board usually enumerates as.
#[cfg(windows)]
pub const DEFAULT_SERIAL_PORT: &str = "COM4";
/// Serial port the board usually enumerates as.
#[cfg(not(windows))]
pub const DEFAULT_SERIAL_PORT: &str = "/dev/ttyUSB0";

/// CSV file written by the serial flow.
pub const DEFAULT_CSV_PATH: &str = "sensor_data.csv";

/// How to pick the peripheral to connect to among discovered devices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSelector {
    /// Connect only to a device advertising exactly this name.
    Named(String),
    /// Prefer a device advertising this name, otherwise take the first one seen.
    NamedOrFirst(String),
}

impl TargetSelector {
    /// The advertised name this selector looks for.
    pub fn name(&self) -> &str {
        match self {
            Self::Named(name) | Self::NamedOrFirst(name) => name,
        }
    }

    /// Whether the first discovered device is accepted when no name matches.
    pub fn falls_back_to_first(&self) -> bool {
        matches!(self, Self::NamedOrFirst(_))
    }
}

/// Configuration for a BLE receive session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BleConfig {
    /// Which device to connect to.
    pub target: TargetSelector,
    /// Characteristic carrying the sensor notifications.
    pub characteristic_uuid: Uuid,
    /// How long to scan for devices.
    pub scan_duration: Duration,
    /// How long to receive notifications.
    pub receive_window: Duration,
}

impl BleConfig {
    /// Create a configuration for the given target with default timings.
    pub fn new(target: TargetSelector) -> Self {
        Self {
            target,
            characteristic_uuid: SENSOR_CHARACTERISTIC_UUID,
            scan_duration: DEFAULT_SCAN_DURATION,
            receive_window: DEFAULT_RECEIVE_WINDOW,
        }
    }

    /// The BLE1507 peripheral sketch. Only an exact name match is accepted.
    pub fn peripheral() -> Self {
        Self::new(TargetSelector::Named(SPR_PERIPHERAL_NAME.to_string()))
    }

    /// The gas sensor sketch. Falls back to the first device for debugging.
    pub fn gas_sensor() -> Self {
        Self::new(TargetSelector::NamedOrFirst(SPR_GAS_SENSOR_NAME.to_string()))
    }

    /// Set the receive window.
    pub fn with_receive_window(mut self, window: Duration) -> Self {
        self.receive_window = window;
        self
    }

    /// Set the scan duration.
    pub fn with_scan_duration(mut self, duration: Duration) -> Self {
        self.scan_duration = duration;
        self
    }

    /// Set the characteristic to subscribe to.
    pub fn with_characteristic(mut self, uuid: Uuid) -> Self {
        self.characteristic_uuid = uuid;
        self
    }
}

impl Default for BleConfig {
    fn default() -> Self {
        Self::gas_sensor()
    }
}

/// Configuration for the serial line reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Port identifier, e.g. `/dev/ttyUSB0` or `COM4`.
    pub port: String,
    /// Line speed.
    pub baud_rate: u32,
    /// Read timeout for a single line.
    pub timeout: Duration,
}

impl SerialConfig {
    /// Create a configuration for a port at the default baud rate.
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout: DEFAULT_SERIAL_TIMEOUT,
        }
    }

    /// Set the baud rate.
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Set the read timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SERIAL_PORT)
    }
}

/// Where the CSV sink writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvConfig {
    /// Output file. Truncated when the sink is created.
    pub path: PathBuf,
}

impl CsvConfig {
    /// Create a configuration for the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CSV_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ble_presets() {
        let config = BleConfig::peripheral();
        assert_eq!(config.target.name(), "SPR-PERIPHERAL");
        assert!(!config.target.falls_back_to_first());
        assert_eq!(config.receive_window, Duration::from_secs(60));

        let config = BleConfig::gas_sensor();
        assert_eq!(config.target.name(), "SPR-GAS-SENSOR");
        assert!(config.target.falls_back_to_first());
        assert_eq!(
            config.characteristic_uuid.to_string(),
            "00004a02-0000-1000-8000-00805f9b34fb"
        );
    }

    #[test]
    fn test_ble_builders() {
        let config = BleConfig::peripheral()
            .with_receive_window(Duration::from_secs(5))
            .with_scan_duration(Duration::from_secs(2));
        assert_eq!(config.receive_window, Duration::from_secs(5));
        assert_eq!(config.scan_duration, Duration::from_secs(2));
    }

    #[test]
    fn test_serial_defaults() {
        let config = SerialConfig::default();
        assert_eq!(config.port, DEFAULT_SERIAL_PORT);
        assert_eq!(config.baud_rate, 115_200);
        assert_eq!(config.timeout, Duration::from_secs(1));

        let config = SerialConfig::new("COM7").with_baud_rate(9600);
        assert_eq!(config.port, "COM7");
        assert_eq!(config.baud_rate, 9600);
    }

    #[test]
    fn test_csv_default_path() {
        assert_eq!(CsvConfig::default().path, PathBuf::from("sensor_data.csv"));
    }
}
