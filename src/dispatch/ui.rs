//! UI sink and the state it feeds.
//!
//! The sink runs wherever the BLE session runs. It never touches UI state
//! directly: each reading becomes a [`UiUpdate`] sent over a channel, and the
//! UI loop drains that channel into its own [`UiState`] on its own turn.

use tokio::sync::mpsc;
use tracing::debug;

use crate::data::Reading;
use crate::dispatch::{Effect, Sink};
use crate::error::Result;

/// Readings at or below this value raise the warning.
pub const WARNING_THRESHOLD: f64 = 90.0;

/// Text shown while the warning is raised.
pub const WARNING_TEXT: &str = "WARNING: gas resistance at or below 90";

/// Warning text for a displayed value, if any.
pub fn warning_for(value: f64) -> Option<&'static str> {
    (value <= WARNING_THRESHOLD).then_some(WARNING_TEXT)
}

/// One change to apply to the displayed state.
#[derive(Debug, Clone, PartialEq)]
pub struct UiUpdate {
    /// The value to display.
    pub value: f64,
    /// Unit shown next to the value.
    pub unit: String,
    /// Warning text, or `None` to clear it.
    pub warning: Option<String>,
}

impl UiUpdate {
    /// Build the update for a reading.
    pub fn from_reading(reading: &Reading) -> Self {
        Self {
            value: reading.value(),
            unit: reading.unit().to_string(),
            warning: warning_for(reading.value()).map(str::to_string),
        }
    }
}

/// Sends an update to the UI for every reading.
pub struct UiSink {
    tx: mpsc::UnboundedSender<UiUpdate>,
}

impl UiSink {
    /// Create a sink and the receiver the UI loop drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<UiUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Sink for UiSink {
    fn name(&self) -> &'static str {
        "ui"
    }

    fn accept(&mut self, reading: &Reading) -> Result<Effect> {
        match self.tx.send(UiUpdate::from_reading(reading)) {
            Ok(()) => Ok(Effect::UiUpdated),
            Err(_) => {
                debug!("UI receiver closed, dropping update");
                Ok(Effect::Noop)
            }
        }
    }
}

/// What the window currently shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UiState {
    value: Option<f64>,
    unit: String,
    warning: String,
    updates: u64,
}

impl UiState {
    /// Create an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one update.
    pub fn apply(&mut self, update: UiUpdate) {
        self.value = Some(update.value);
        self.unit = update.unit;
        self.warning = update.warning.unwrap_or_default();
        self.updates += 1;
    }

    /// Apply every pending update without blocking. Returns how many were applied.
    pub fn drain(&mut self, rx: &mut mpsc::UnboundedReceiver<UiUpdate>) -> usize {
        let mut applied = 0;
        while let Ok(update) = rx.try_recv() {
            self.apply(update);
            applied += 1;
        }
        applied
    }

    /// Latest displayed value.
    pub fn value(&self) -> Option<f64> {
        self.value
    }

    /// Unit of the displayed value.
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Warning label text. Empty when cleared.
    pub fn warning(&self) -> &str {
        &self.warning
    }

    /// Check if the warning is raised.
    pub fn is_warning(&self) -> bool {
        !self.warning.is_empty()
    }

    /// Total updates applied.
    pub fn update_count(&self) -> u64 {
        self.updates
    }
}
