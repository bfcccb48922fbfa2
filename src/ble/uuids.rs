//! BLE Service and Characteristic UUIDs.
//!
//! The Spresense sketches expose their readings on one characteristic built
//! from the 16-bit assigned number `0x4A02`.

use uuid::Uuid;

/// Characteristic carrying sensor notifications (Notify).
pub const SENSOR_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0x0000_4a02_0000_1000_8000_00805f9b34fb);
