//! Streaming multipart encoder task.
//!
//! The encoder runs as its own tokio task, writing the real multipart
//! envelope (header block, artifact bytes, trailer) into the write end of a
//! bounded in-memory pipe while the transport reads the other end as the
//! request body. The pipe's capacity provides backpressure: writes suspend
//! until the transport drains, so memory stays bounded regardless of
//! artifact size.

use tokio::io::{AsyncRead, AsyncWriteExt, DuplexStream};
use tokio::sync::mpsc;
use tracing::debug;

use super::envelope::MultipartEnvelope;
use crate::error::ClientError;

/// Spawns the encoder task and returns its completion channel.
///
/// The channel carries at most one error; its closure (the sender dropping on
/// task exit) is the completion signal, distinct from a carried error. The
/// write end of the pipe is shut down on every exit path, so the read end
/// always observes EOF rather than hanging.
pub(crate) fn spawn_encoder<R>(
    envelope: MultipartEnvelope,
    artifact: R,
    pipe: DuplexStream,
) -> mpsc::Receiver<ClientError>
where
    R: AsyncRead + Send + Unpin + 'static,
{
    let (errors, completion) = mpsc::channel(1);

    tokio::spawn(async move {
        let mut pipe = pipe;
        let outcome = encode(&envelope, artifact, &mut pipe).await;

        // EOF for the transport, success or failure. Without this the
        // transmitting side waits forever for more body bytes.
        let _ = pipe.shutdown().await;
        drop(pipe);

        if let Err(error) = outcome {
            debug!(%error, "multipart encoding aborted");
            let _ = errors.send(error).await;
        }
        // `errors` drops here, closing the completion channel.
    });

    completion
}

/// Writes the full envelope into the pipe: header block, artifact bytes,
/// trailer. Any read or write error aborts immediately.
async fn encode<R>(
    envelope: &MultipartEnvelope,
    mut artifact: R,
    pipe: &mut DuplexStream,
) -> Result<(), ClientError>
where
    R: AsyncRead + Send + Unpin,
{
    pipe.write_all(&envelope.header_block())
        .await
        .map_err(ClientError::stream)?;

    let copied = tokio::io::copy(&mut artifact, pipe)
        .await
        .map_err(ClientError::stream)?;
    debug!(bytes = copied, "artifact bytes copied into multipart body");

    pipe.write_all(&envelope.trailer())
        .await
        .map_err(ClientError::stream)?;

    Ok(())
}
