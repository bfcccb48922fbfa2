//! Accumulates one value per tracked sensor kind until a CSV row is complete.

use crate::data::reading::SensorKind;

/// The four values of one complete cycle, in [`SensorKind::TRACKED`] order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompleteSample {
    /// Temperature in °C.
    pub temperature: f64,
    /// Relative humidity in %.
    pub humidity: f64,
    /// Pressure in hPa.
    pub pressure: f64,
    /// Gas resistance in kOhms.
    pub gas_resistance: f64,
}

impl CompleteSample {
    /// Values in CSV column order.
    pub fn values(&self) -> [f64; 4] {
        [
            self.temperature,
            self.humidity,
            self.pressure,
            self.gas_resistance,
        ]
    }
}

/// Most recent unflushed value per tracked kind.
///
/// A later value for the same kind overwrites the earlier one. The set is only
/// drained once every slot holds a value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleSet {
    slots: [Option<f64>; 4],
}

impl SampleSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value for a kind. Returns `false` for kinds that are not tracked.
    pub fn record(&mut self, kind: SensorKind, value: f64) -> bool {
        match kind.tracked_index() {
            Some(index) => {
                self.slots[index] = Some(value);
                true
            }
            None => false,
        }
    }

    /// Current value for a kind, if one is pending.
    pub fn get(&self, kind: SensorKind) -> Option<f64> {
        kind.tracked_index().and_then(|index| self.slots[index])
    }

    /// Check if every tracked kind has a value.
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Check if no kind has a value.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Take the values and reset if the set is complete.
    ///
    /// Leaves the set untouched and returns `None` while any slot is absent.
    pub fn take_complete(&mut self) -> Option<CompleteSample> {
        let [Some(temperature), Some(humidity), Some(pressure), Some(gas_resistance)] = self.slots
        else {
            return None;
        };

        self.clear();

        Some(CompleteSample {
            temperature,
            humidity,
            pressure,
            gas_resistance,
        })
    }

    /// Drop all pending values.
    pub fn clear(&mut self) {
        self.slots = [None; 4];
    }
}
