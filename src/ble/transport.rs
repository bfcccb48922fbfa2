//! The seam between a receive session and whatever delivers notifications.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;

use crate::error::Result;

/// Raw notification payloads in arrival order.
pub type PayloadStream = Pin<Box<dyn Stream<Item = Bytes> + Send>>;

/// Something that can deliver raw notification payloads.
///
/// Implemented by [`BleLink`](crate::ble::BleLink) for real peripherals.
#[async_trait]
pub trait NotificationTransport: Send {
    /// Start notifications and return the payload stream.
    async fn subscribe(&mut self) -> Result<PayloadStream>;

    /// Stop notifications.
    async fn unsubscribe(&mut self) -> Result<()>;
}
