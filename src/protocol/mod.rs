//! Protocol module for decoding sensor payloads.
//!
//! The sensor boards speak plain text, one value per line or notification.

pub mod decoder;

pub use decoder::{
    decode, decode_ble_payload, decode_serial_line, DecodeError, Decoder, Grammar,
};
