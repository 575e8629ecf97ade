//! First-error-wins join for the two upload tasks.
//!
//! An upload runs exactly two concurrent tasks: the encoder feeding the pipe
//! and the transport consuming it as the request body. Each reports through
//! its own single-producer channel; channel closure is the completion signal.
//! The join waits both sides out regardless of which fails first, so the
//! caller never observes a result while a task is still running.

use tokio::sync::mpsc;

use crate::error::ClientError;

/// Waits for both the encoder and the transport to fully terminate, then
/// returns the transport's payload or the first error observed from either
/// side.
///
/// State machine: two done flags, both initially false, flipped when the
/// corresponding channel closes. A received error is recorded only if no
/// error has been recorded yet; later errors are discarded by design (the
/// single-error contract). The loop exits exactly when both flags are true.
pub(crate) async fn join_first_error<T>(
    mut encoder_errors: mpsc::Receiver<ClientError>,
    mut transport_results: mpsc::Receiver<Result<T, ClientError>>,
) -> Result<T, ClientError> {
    let mut first_error: Option<ClientError> = None;
    let mut payload: Option<T> = None;
    let mut encoder_done = false;
    let mut transport_done = false;

    while !(encoder_done && transport_done) {
        tokio::select! {
            event = encoder_errors.recv(), if !encoder_done => match event {
                Some(error) => {
                    if first_error.is_none() {
                        first_error = Some(error);
                    }
                }
                None => encoder_done = true,
            },
            event = transport_results.recv(), if !transport_done => match event {
                Some(Ok(decoded)) => payload = Some(decoded),
                Some(Err(error)) => {
                    if first_error.is_none() {
                        first_error = Some(error);
                    }
                }
                None => transport_done = true,
            },
        }
    }

    match first_error {
        Some(error) => Err(error),
        None => payload.ok_or(ClientError::UploadInterrupted),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use tokio::time::{sleep, timeout};

    use super::*;

    const TEST_TIMEOUT: Duration = Duration::from_secs(5);

    fn channels<T>() -> (
        mpsc::Sender<ClientError>,
        mpsc::Receiver<ClientError>,
        mpsc::Sender<Result<T, ClientError>>,
        mpsc::Receiver<Result<T, ClientError>>,
    ) {
        let (encoder_tx, encoder_rx) = mpsc::channel(1);
        let (transport_tx, transport_rx) = mpsc::channel(1);
        (encoder_tx, encoder_rx, transport_tx, transport_rx)
    }

    #[tokio::test]
    async fn test_join_returns_transport_payload_on_success() {
        let (encoder_tx, encoder_rx, transport_tx, transport_rx) = channels::<u32>();

        tokio::spawn(async move {
            drop(encoder_tx);
            transport_tx.send(Ok(42)).await.unwrap();
        });

        let result = timeout(TEST_TIMEOUT, join_first_error(encoder_rx, transport_rx))
            .await
            .unwrap();
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_join_reports_first_error_only() {
        let (encoder_tx, encoder_rx, transport_tx, transport_rx) = channels::<u32>();

        tokio::spawn(async move {
            encoder_tx
                .send(ClientError::stream(std::io::Error::other("encode failed")))
                .await
                .unwrap();
            drop(encoder_tx);
            // Transport fails afterwards; its error must be discarded.
            sleep(Duration::from_millis(50)).await;
            transport_tx
                .send(Err(ClientError::http("http://api", 500, vec![])))
                .await
                .unwrap();
        });

        let result = timeout(TEST_TIMEOUT, join_first_error(encoder_rx, transport_rx))
            .await
            .unwrap();
        match result {
            Err(ClientError::Stream { .. }) => {}
            other => panic!("Expected the encoder's error first, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_join_waits_for_both_sides() {
        let (encoder_tx, encoder_rx, transport_tx, transport_rx) = channels::<u32>();
        let (finished_tx, finished_rx) = tokio::sync::oneshot::channel();

        tokio::spawn(async move {
            // Transport fails immediately; the encoder lingers.
            transport_tx
                .send(Err(ClientError::http("http://api", 502, vec![])))
                .await
                .unwrap();
            drop(transport_tx);
            sleep(Duration::from_millis(100)).await;
            drop(encoder_tx);
            let _ = finished_tx.send(());
        });

        let result = timeout(TEST_TIMEOUT, join_first_error(encoder_rx, transport_rx))
            .await
            .unwrap();

        // The join must not have returned before the encoder side closed.
        assert!(
            finished_rx.await.is_ok(),
            "join returned while a task was still running"
        );
        assert!(matches!(result, Err(ClientError::Http { status: 502, .. })));
    }

    #[tokio::test]
    async fn test_join_with_no_payload_and_no_error_is_interrupted() {
        let (encoder_tx, encoder_rx, transport_tx, transport_rx) = channels::<u32>();
        drop(encoder_tx);
        drop(transport_tx);

        let result = timeout(TEST_TIMEOUT, join_first_error(encoder_rx, transport_rx))
            .await
            .unwrap();
        assert!(matches!(result, Err(ClientError::UploadInterrupted)));
    }
}
