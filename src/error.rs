//! Error types for the spresense-link crate.

use thiserror::Error;

/// The main error type for this crate.
///
/// Every variant is terminal for the session that produced it. Payload decode
/// failures are reported separately through [`DecodeError`](crate::protocol::DecodeError)
/// and never surface here.
#[derive(Error, Debug)]
pub enum Error {
    /// Bluetooth-related error from the underlying BLE library.
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),

    /// Bluetooth is not available or is disabled on this system.
    #[error("Bluetooth not available or disabled")]
    BluetoothUnavailable,

    /// The scan finished without seeing any device at all.
    #[error("No BLE devices found")]
    NoDevicesFound,

    /// The configured device was not among the discovered devices.
    #[error("Device not found: {name}")]
    DeviceNotFound {
        /// The advertised name that was searched for.
        name: String,
    },

    /// Failed to establish a connection to the peripheral.
    #[error("Connection failed: {reason}")]
    ConnectionFailed {
        /// Description of why the connection failed.
        reason: String,
    },

    /// Characteristic not found on the device.
    #[error("Characteristic not found: {uuid}")]
    CharacteristicNotFound {
        /// The UUID of the characteristic that was not found.
        uuid: String,
    },

    /// The serial port could not be opened or configured.
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// Reading from a transport or writing to a sink failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Check if this error came from discovering the target device.
    pub fn is_discovery_failure(&self) -> bool {
        matches!(
            self,
            Self::BluetoothUnavailable | Self::NoDevicesFound | Self::DeviceNotFound { .. }
        )
    }

    /// Check if this error came from connecting to or talking with a peripheral.
    pub fn is_connection_failure(&self) -> bool {
        matches!(
            self,
            Self::Bluetooth(_) | Self::ConnectionFailed { .. } | Self::CharacteristicNotFound { .. }
        )
    }

    /// Check if this error came from the serial line or a sink write.
    pub fn is_transport_failure(&self) -> bool {
        matches!(self, Self::Serial(_) | Self::Io(_))
    }
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
