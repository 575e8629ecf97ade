//! Buildpack resource and its API operations.
//!
//! The wire contract is asymmetric and must stay that way: buildpacks are
//! written as flat JSON (`{"name", "enabled", ...}`) but read back inside a
//! two-level envelope (`metadata.guid`, `entity.{name,position,enabled}`).
//! Serialization is derived on the flat shape; deserialization is a custom
//! impl over the nested one.

use std::path::Path;

use reqwest::Method;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use serde::{Deserialize, Deserializer, Serialize};
use tokio::io::AsyncRead;
use tokio::sync::mpsc;
use tokio_util::io::ReaderStream;
use tracing::{info, instrument};

use crate::client::{Client, Warnings};
use crate::error::ClientError;
use crate::list::{Filter, ListError};
use crate::upload::{
    MultipartEnvelope, PIPE_CAPACITY, estimate_request_size, join_first_error, spawn_encoder,
};

/// A Cloud Controller buildpack.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Buildpack {
    /// Whether the buildpack is available for staging.
    pub enabled: bool,
    /// Server-assigned identifier; empty until created.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub guid: String,
    /// Display name.
    pub name: String,
    /// Detection priority; lower positions are tried first. Zero means unset
    /// and is omitted on writes.
    #[serde(skip_serializing_if = "position_is_unset")]
    pub position: i32,
}

fn position_is_unset(position: &i32) -> bool {
    *position == 0
}

impl<'de> Deserialize<'de> for Buildpack {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize, Default)]
        #[serde(default)]
        struct Metadata {
            guid: String,
        }

        #[derive(Deserialize, Default)]
        #[serde(default)]
        struct Entity {
            name: String,
            position: i32,
            enabled: bool,
        }

        #[derive(Deserialize)]
        struct Envelope {
            #[serde(default)]
            metadata: Metadata,
            #[serde(default)]
            entity: Entity,
        }

        let envelope = Envelope::deserialize(deserializer)?;
        Ok(Buildpack {
            enabled: envelope.entity.enabled,
            guid: envelope.metadata.guid,
            name: envelope.entity.name,
            position: envelope.entity.position,
        })
    }
}

impl Client {
    /// Creates a new buildpack.
    ///
    /// Returns the created buildpack (with its server-assigned GUID) and any
    /// warnings the server attached.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on encode, transport, HTTP status, or decode
    /// failure. HTTP status errors carry the response's warnings.
    #[instrument(skip(self), fields(name = %buildpack.name))]
    pub async fn create_buildpack(
        &self,
        buildpack: &Buildpack,
    ) -> Result<(Buildpack, Warnings), ClientError> {
        let url = self.endpoint("/v2/buildpacks")?;
        let request = self.request_json(Method::POST, url.clone(), buildpack)?;
        self.execute(request, url).await
    }

    /// Updates the buildpack with the given GUID and returns the updated
    /// record plus warnings.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`create_buildpack`](Self::create_buildpack).
    #[instrument(skip(self), fields(guid = %buildpack.guid))]
    pub async fn update_buildpack(
        &self,
        buildpack: &Buildpack,
    ) -> Result<(Buildpack, Warnings), ClientError> {
        let url = self.endpoint(&format!("/v2/buildpacks/{}", buildpack.guid))?;
        let request = self.request_json(Method::PUT, url.clone(), buildpack)?;
        self.execute(request, url).await
    }

    /// Lists buildpacks matching the given filters, walking all pages.
    ///
    /// Items are returned in page order; warnings accumulate across pages in
    /// arrival order. A page item that does not decode as a buildpack fails
    /// the call with `ClientError::UnexpectedListItem`.
    ///
    /// # Errors
    ///
    /// Returns a [`ListError`] on transport, HTTP status, decode, or
    /// item-shape failure. The error carries the buildpacks and warnings
    /// consumed before the walk aborted, so a failure on page N still yields
    /// the earlier pages' items.
    #[instrument(skip(self))]
    pub async fn get_buildpacks(
        &self,
        filters: &[Filter],
    ) -> Result<(Vec<Buildpack>, Warnings), ListError<Buildpack>> {
        let mut buildpacks = Vec::new();
        let mut warnings = Warnings::new();

        let walk = async {
            let mut url = self.endpoint("/v2/buildpacks")?;
            for filter in filters {
                url.query_pairs_mut().append_pair("q", &filter.query_value());
            }

            self.paginate(url, &mut warnings, |item| {
                let buildpack = serde_json::from_value::<Buildpack>(item)
                    .map_err(ClientError::unexpected_list_item)?;
                buildpacks.push(buildpack);
                Ok(())
            })
            .await
        }
        .await;

        match walk {
            Ok(()) => Ok((buildpacks, warnings)),
            Err(source) => Err(ListError {
                partial: buildpacks,
                warnings,
                source,
            }),
        }
    }

    /// Uploads buildpack bits for the given GUID, streaming `artifact`
    /// through a bounded pipe as a `multipart/form-data` body with an exact
    /// `Content-Length`.
    ///
    /// `artifact_path` only supplies the field's display filename; the
    /// content comes from `artifact`, whose total length must be
    /// `artifact_len`. The encoder and the transport run concurrently; the
    /// call returns only after both have terminated, surfacing the first
    /// error observed from either side.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Stream` for artifact read or pipe failures, and
    /// transport/HTTP/decode errors like the other operations. HTTP status
    /// errors carry the response's warnings.
    #[instrument(skip(self, artifact), fields(guid = %buildpack_guid, len = artifact_len))]
    pub async fn upload_buildpack<R>(
        &self,
        buildpack_guid: &str,
        artifact_path: &Path,
        artifact: R,
        artifact_len: u64,
    ) -> Result<(Buildpack, Warnings), ClientError>
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let file_name = display_file_name(artifact_path);
        let content_length = estimate_request_size(artifact_len, &file_name, self.boundaries());

        let url = self.endpoint(&format!("/v2/buildpacks/{buildpack_guid}/bits"))?;

        let envelope = MultipartEnvelope::new(&file_name, self.boundaries());
        let content_type = envelope.content_type();

        let (pipe_reader, pipe_writer) = tokio::io::duplex(PIPE_CAPACITY);
        let encoder_completion = spawn_encoder(envelope, artifact, pipe_writer);

        let request = self
            .put_stream(
                url.clone(),
                reqwest::Body::wrap_stream(ReaderStream::new(pipe_reader)),
            )
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, content_length);

        let (transport_tx, transport_completion) = mpsc::channel(1);
        let transport = self.clone();
        tokio::spawn(async move {
            let outcome = transport.execute::<Buildpack>(request, url).await;
            let _ = transport_tx.send(outcome).await;
            // `transport_tx` drops here, closing the completion channel.
        });

        let (uploaded, warnings) =
            join_first_error(encoder_completion, transport_completion).await?;
        info!(bytes = content_length, "buildpack bits uploaded");
        Ok((uploaded, warnings))
    }
}

/// Derives the multipart field's display filename from the artifact path.
fn display_file_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.to_string_lossy().into_owned(),
        |name| name.to_string_lossy().into_owned(),
    )
}
