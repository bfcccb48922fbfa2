//! Text payload decoding.
//!
//! The Spresense sketches send one human-readable value per line. Two shapes
//! are understood:
//!
//! - serial (BME680): `温度: 23.5°C`, `湿度: 41.0%`, `気圧: 1013.2hPa`,
//!   `ガス抵抗値: 120.5kOhms`
//! - BLE (gas sensor): `Gas:12.34kOhm`

use thiserror::Error;

use crate::data::{Reading, SensorKind};

/// Prefix of a BLE gas sensor notification.
pub const BLE_GAS_PREFIX: &str = "Gas:";

/// Unit suffix of a BLE gas sensor notification.
pub const BLE_GAS_UNIT: &str = "kOhm";

/// Why a payload could not be turned into a [`Reading`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The payload bytes are not valid UTF-8.
    #[error("payload is not valid UTF-8")]
    InvalidUtf8,

    /// No known sensor label appears in the line.
    #[error("no known sensor label in {line:?}")]
    UnknownLabel {
        /// The offending line.
        line: String,
    },

    /// The line has a label but no `:` separator.
    #[error("missing ':' separator in {line:?}")]
    MissingSeparator {
        /// The offending line.
        line: String,
    },

    /// A BLE payload does not start with the expected prefix.
    #[error("missing {prefix:?} prefix in {line:?}")]
    MissingPrefix {
        /// The prefix that was expected.
        prefix: &'static str,
        /// The offending line.
        line: String,
    },

    /// The value text is not a finite number.
    #[error("invalid number {text:?}")]
    InvalidNumber {
        /// The text left after stripping label and unit.
        text: String,
    },
}

/// Which payload shape to expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Grammar {
    /// Labelled BME680 lines from the serial port.
    Serial,
    /// `Gas:<value>kOhm` notifications.
    Ble,
    /// BLE shape when the payload starts with `Gas:`, serial shape otherwise.
    #[default]
    Auto,
}

/// Turns payload text into readings.
#[derive(Debug, Clone, Copy, Default)]
pub struct Decoder {
    grammar: Grammar,
}

impl Decoder {
    /// Create a decoder for one grammar.
    pub fn new(grammar: Grammar) -> Self {
        Self { grammar }
    }

    /// The grammar this decoder expects.
    pub fn grammar(&self) -> Grammar {
        self.grammar
    }

    /// Decode a raw notification or line.
    pub fn decode_bytes(&self, raw: &[u8]) -> Result<Reading, DecodeError> {
        let text = std::str::from_utf8(raw).map_err(|_| DecodeError::InvalidUtf8)?;
        self.decode(text)
    }

    /// Decode one line of text.
    pub fn decode(&self, raw: &str) -> Result<Reading, DecodeError> {
        let line = raw.trim();
        match self.grammar {
            Grammar::Serial => decode_serial_line(line),
            Grammar::Ble => decode_ble_payload(line),
            Grammar::Auto if line.starts_with(BLE_GAS_PREFIX) => decode_ble_payload(line),
            Grammar::Auto => decode_serial_line(line),
        }
    }
}

/// Decode a payload with the [`Grammar::Auto`] rules.
pub fn decode(raw: &str) -> Result<Reading, DecodeError> {
    Decoder::default().decode(raw)
}

/// Decode a labelled BME680 line such as `温度: 23.5°C`.
pub fn decode_serial_line(raw: &str) -> Result<Reading, DecodeError> {
    let line = raw.trim();

    let kind = SensorKind::TRACKED
        .into_iter()
        .find(|kind| kind.serial_label().is_some_and(|label| line.contains(label)))
        .ok_or_else(|| DecodeError::UnknownLabel {
            line: line.to_string(),
        })?;

    let mut fields = line.split(':');
    fields.next();
    let field = fields.next().ok_or_else(|| DecodeError::MissingSeparator {
        line: line.to_string(),
    })?;

    let unit = kind.serial_unit().unwrap_or_default();
    let value = parse_value(strip_unit(field, unit))?;

    Ok(Reading::new(kind, value, unit, line))
}

/// Decode a gas sensor notification such as `Gas:12.34kOhm`.
pub fn decode_ble_payload(raw: &str) -> Result<Reading, DecodeError> {
    let line = raw.trim();

    let rest = line
        .strip_prefix(BLE_GAS_PREFIX)
        .ok_or_else(|| DecodeError::MissingPrefix {
            prefix: BLE_GAS_PREFIX,
            line: line.to_string(),
        })?;

    let value = parse_value(strip_unit(rest, BLE_GAS_UNIT))?;

    Ok(Reading::new(SensorKind::GasResistance, value, BLE_GAS_UNIT, line))
}

fn strip_unit<'a>(field: &'a str, unit: &str) -> &'a str {
    let field = field.trim();
    field.strip_suffix(unit).unwrap_or(field).trim()
}

fn parse_value(text: &str) -> Result<f64, DecodeError> {
    text.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| DecodeError::InvalidNumber {
            text: text.to_string(),
        })
}
