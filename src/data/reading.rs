//! Sensor readings.
//!
//! A [`Reading`] is one decoded payload: the kind of quantity, its value and
//! the unit it was reported in.

use chrono::{DateTime, Local};

/// The quantity a reading measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SensorKind {
    /// Air temperature in degrees Celsius.
    Temperature,
    /// Relative humidity in percent.
    Humidity,
    /// Barometric pressure in hectopascals.
    Pressure,
    /// Gas sensor resistance in kilo-ohms.
    GasResistance,
    /// Anything else.
    #[default]
    Unknown,
}

impl SensorKind {
    /// Kinds collected into one CSV row, in column order.
    pub const TRACKED: [SensorKind; 4] = [
        SensorKind::Temperature,
        SensorKind::Humidity,
        SensorKind::Pressure,
        SensorKind::GasResistance,
    ];

    /// Label the BME680 sketch prints in front of this value.
    pub fn serial_label(&self) -> Option<&'static str> {
        match self {
            Self::Temperature => Some("温度"),
            Self::Humidity => Some("湿度"),
            Self::Pressure => Some("気圧"),
            Self::GasResistance => Some("ガス抵抗値"),
            Self::Unknown => None,
        }
    }

    /// Unit suffix the BME680 sketch prints after this value.
    pub fn serial_unit(&self) -> Option<&'static str> {
        match self {
            Self::Temperature => Some("°C"),
            Self::Humidity => Some("%"),
            Self::Pressure => Some("hPa"),
            Self::GasResistance => Some("kOhms"),
            Self::Unknown => None,
        }
    }

    /// CSV column header for this kind.
    pub fn column_header(&self) -> &'static str {
        match self {
            Self::Temperature => "Temperature (°C)",
            Self::Humidity => "Humidity (%)",
            Self::Pressure => "Pressure (hPa)",
            Self::GasResistance => "Gas Resistance (kOhms)",
            Self::Unknown => "Unknown",
        }
    }

    /// Position of this kind in [`SensorKind::TRACKED`].
    pub fn tracked_index(&self) -> Option<usize> {
        Self::TRACKED.iter().position(|k| k == self)
    }
}

impl std::fmt::Display for SensorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Temperature => write!(f, "Temperature"),
            Self::Humidity => write!(f, "Humidity"),
            Self::Pressure => write!(f, "Pressure"),
            Self::GasResistance => write!(f, "Gas Resistance"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// One decoded sensor value.
///
/// Readings are immutable once built; fields are exposed through accessors.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reading {
    kind: SensorKind,
    value: f64,
    unit: String,
    raw: String,
    timestamp: DateTime<Local>,
}

impl Reading {
    /// Create a reading stamped with the current local time.
    pub fn new(
        kind: SensorKind,
        value: f64,
        unit: impl Into<String>,
        raw: impl Into<String>,
    ) -> Self {
        Self::with_timestamp(kind, value, unit, raw, Local::now())
    }

    /// Create a reading with an explicit timestamp.
    pub fn with_timestamp(
        kind: SensorKind,
        value: f64,
        unit: impl Into<String>,
        raw: impl Into<String>,
        timestamp: DateTime<Local>,
    ) -> Self {
        Self {
            kind,
            value,
            unit: unit.into(),
            raw: raw.into(),
            timestamp,
        }
    }

    /// What the reading measures.
    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    /// The decoded value.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Unit suffix as it appeared in the payload.
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// The trimmed payload text the reading was decoded from.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// When the payload was decoded.
    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }
}

impl std::fmt::Display for Reading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} {}", self.kind, self.value, self.unit)
    }
}
