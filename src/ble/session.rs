//! The notification receive loop.
//!
//! A session subscribes to a transport and, for a fixed window, decodes each
//! payload and hands the reading to the dispatcher. Payloads that do not decode
//! are dropped and the session keeps listening.

use futures::StreamExt;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::ble::transport::NotificationTransport;
use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::protocol::Decoder;
use crate::session::{SessionEnd, SessionSummary};

/// Create a shutdown signal pair for [`run_session`].
///
/// Sending `true` asks the session to stop at its next wake-up.
pub fn shutdown_channel() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}

/// Resolve once `true` is sent on the shutdown channel.
///
/// Never resolves if the sender is dropped without asking to stop.
pub async fn shutdown_requested(mut shutdown: watch::Receiver<bool>) {
    if shutdown.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Receive, decode and dispatch notifications until the window elapses or a
/// shutdown is signalled.
///
/// The transport is unsubscribed on every exit path. A sink error ends the
/// session and is returned after unsubscribing.
pub async fn run_session<T>(
    transport: &mut T,
    decoder: &Decoder,
    dispatcher: &mut Dispatcher,
    window: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> Result<SessionSummary>
where
    T: NotificationTransport + ?Sized,
{
    let mut summary = SessionSummary::default();

    if *shutdown.borrow_and_update() {
        info!("Shutdown requested before subscribing");
        summary.end = SessionEnd::Shutdown;
        return Ok(summary);
    }

    let mut payloads = transport.subscribe().await?;
    info!("Started receiving notifications for {:?}", window);

    let deadline = tokio::time::sleep(window);
    tokio::pin!(deadline);

    let mut shutdown_open = true;

    let result = loop {
        tokio::select! {
            _ = &mut deadline => {
                summary.end = SessionEnd::WindowElapsed;
                break Ok(());
            }
            changed = shutdown.changed(), if shutdown_open => {
                match changed {
                    Ok(()) if *shutdown.borrow_and_update() => {
                        info!("Stopped by user");
                        summary.end = SessionEnd::Shutdown;
                        break Ok(());
                    }
                    Ok(()) => {}
                    Err(_) => {
                        debug!("Shutdown sender dropped, running until the window elapses");
                        shutdown_open = false;
                    }
                }
            }
            payload = payloads.next() => {
                let Some(payload) = payload else {
                    warn!("Notification stream ended");
                    summary.end = SessionEnd::StreamClosed;
                    break Ok(());
                };

                debug!("Raw notification: {:02X?}", &payload[..]);

                if let Err(e) = summary.handle_payload(decoder, dispatcher, &payload) {
                    break Err(e);
                }
            }
        }
    };

    drop(payloads);

    match transport.unsubscribe().await {
        Ok(()) => info!("Stopped receiving notifications"),
        Err(e) => warn!("Failed to unsubscribe: {}", e),
    }

    info!(
        "Session ended ({:?}): {} received, {} decoded, {} dropped",
        summary.end, summary.received, summary.decoded, summary.dropped
    );

    result.map(|()| summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ble::transport::PayloadStream;
    use crate::data::Reading;
    use crate::dispatch::{ConsoleSink, Effect, Sink, UiSink, UiState};
    use crate::error::Error;
    use async_trait::async_trait;
    use bytes::Bytes;
    use futures::stream;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tokio_test::{assert_err, assert_ok};

    /// Delivers canned payloads, then either stays silent or ends the stream.
    struct FakeTransport {
        payloads: Vec<Bytes>,
        close_after: bool,
        unsubscribed: Arc<AtomicBool>,
    }

    impl FakeTransport {
        fn new(payloads: &[&'static [u8]]) -> Self {
            Self {
                payloads: payloads.iter().copied().map(Bytes::from_static).collect(),
                close_after: false,
                unsubscribed: Arc::new(AtomicBool::new(false)),
            }
        }
    }

    #[async_trait]
    impl NotificationTransport for FakeTransport {
        async fn subscribe(&mut self) -> Result<PayloadStream> {
            let items = stream::iter(std::mem::take(&mut self.payloads));
            let payloads: PayloadStream = if self.close_after {
                Box::pin(items)
            } else {
                Box::pin(items.chain(stream::pending()))
            };
            Ok(payloads)
        }

        async fn unsubscribe(&mut self) -> Result<()> {
            self.unsubscribed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingSink;

    impl Sink for FailingSink {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn accept(&mut self, _reading: &Reading) -> Result<Effect> {
            Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "closed",
            )))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_elapses_and_unsubscribes() {
        let mut transport = FakeTransport::new(&[
            b"Gas:120.5kOhm",
            b"garbage",
            b"Gas:85.0kOhm",
            &[0xff, 0x00],
        ]);
        let unsubscribed = transport.unsubscribed.clone();

        let (ui_sink, mut rx) = UiSink::channel();
        let mut dispatcher = Dispatcher::new().with_sink(ui_sink);
        let (_tx, shutdown) = shutdown_channel();

        let start = tokio::time::Instant::now();
        let summary = run_session(
            &mut transport,
            &Decoder::default(),
            &mut dispatcher,
            Duration::from_secs(60),
            shutdown,
        )
        .await
        .unwrap();

        assert!(start.elapsed() >= Duration::from_secs(60));
        assert_eq!(
            summary,
            SessionSummary {
                received: 4,
                decoded: 2,
                dropped: 2,
                end: SessionEnd::WindowElapsed,
            }
        );
        assert!(unsubscribed.load(Ordering::SeqCst));

        let mut state = UiState::new();
        assert_eq!(state.drain(&mut rx), 2);
        assert_eq!(state.value(), Some(85.0));
        assert!(state.is_warning());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_ends_session_early() {
        let mut transport = FakeTransport::new(&[b"Gas:100kOhm"]);
        let unsubscribed = transport.unsubscribed.clone();
        let mut dispatcher = Dispatcher::new().with_sink(ConsoleSink::new(Vec::new()));
        let (tx, shutdown) = shutdown_channel();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            let _ = tx.send(true);
        });

        let start = tokio::time::Instant::now();
        let summary = run_session(
            &mut transport,
            &Decoder::default(),
            &mut dispatcher,
            Duration::from_secs(60),
            shutdown,
        )
        .await
        .unwrap();

        assert!(start.elapsed() < Duration::from_secs(60));
        assert_eq!(summary.end, SessionEnd::Shutdown);
        assert_eq!(summary.decoded, 1);
        assert!(unsubscribed.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_shutdown_sender_keeps_running() {
        let mut transport = FakeTransport::new(&[]);
        let mut dispatcher = Dispatcher::new();
        let (tx, shutdown) = shutdown_channel();
        drop(tx);

        let summary = run_session(
            &mut transport,
            &Decoder::default(),
            &mut dispatcher,
            Duration::from_secs(5),
            shutdown,
        )
        .await
        .unwrap();

        assert_eq!(summary.end, SessionEnd::WindowElapsed);
    }

    #[tokio::test]
    async fn test_stream_end_finishes_session() {
        let mut transport = FakeTransport::new(&[b"Gas:1kOhm"]);
        transport.close_after = true;
        let mut dispatcher = Dispatcher::new();
        let (_tx, shutdown) = shutdown_channel();

        let summary = assert_ok!(
            run_session(
                &mut transport,
                &Decoder::default(),
                &mut dispatcher,
                Duration::from_secs(60),
                shutdown,
            )
            .await
        );

        assert_eq!(summary.end, SessionEnd::StreamClosed);
        assert_eq!(summary.received, 1);
    }

    #[tokio::test]
    async fn test_sink_error_is_returned_after_unsubscribe() {
        let mut transport = FakeTransport::new(&[b"Gas:1kOhm"]);
        let unsubscribed = transport.unsubscribed.clone();
        let mut dispatcher = Dispatcher::new().with_sink(FailingSink);
        let (_tx, shutdown) = shutdown_channel();

        let result = run_session(
            &mut transport,
            &Decoder::default(),
            &mut dispatcher,
            Duration::from_secs(60),
            shutdown,
        )
        .await;

        let err = assert_err!(result);
        assert!(matches!(err, Error::Io(_)));
        assert!(unsubscribed.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_requested_resolves_on_stop() {
        let (tx, shutdown) = shutdown_channel();
        let waiter = tokio::spawn(shutdown_requested(shutdown));

        tx.send(false).unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(!waiter.is_finished());

        tx.send(true).unwrap();
        assert_ok!(waiter.await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_requested_pending_without_sender() {
        let (tx, shutdown) = shutdown_channel();
        drop(tx);

        let waited = tokio::time::timeout(Duration::from_secs(10), shutdown_requested(shutdown));
        assert_err!(waited.await);
    }

    #[tokio::test]
    async fn test_shutdown_before_start_skips_subscribe() {
        let mut transport = FakeTransport::new(&[b"Gas:1kOhm"]);
        let unsubscribed = transport.unsubscribed.clone();
        let mut dispatcher = Dispatcher::new();
        let (tx, shutdown) = shutdown_channel();
        tx.send(true).unwrap();

        let summary = run_session(
            &mut transport,
            &Decoder::default(),
            &mut dispatcher,
            Duration::from_secs(60),
            shutdown,
        )
        .await
        .unwrap();

        assert_eq!(summary.end, SessionEnd::Shutdown);
        assert_eq!(summary.received, 0);
        assert!(!unsubscribed.load(Ordering::SeqCst));
    }
}
