//! Streaming multipart upload core.
//!
//! Uploading buildpack bits requires an exact `Content-Length` before the
//! request is sent, while never buffering the whole artifact in memory. This
//! module provides the three pieces that make that possible:
//!
//! - [`envelope`] computes the multipart framing overhead without reading the
//!   artifact, and produces the real framing bytes for streaming
//! - [`encoder`] writes the real envelope into a bounded in-memory pipe from
//!   its own task
//! - [`coordinator`] joins the encoder and the transport, surfacing the first
//!   error only after both have fully terminated

mod coordinator;
mod encoder;
mod envelope;

pub use envelope::{
    BoundarySource, MultipartEnvelope, RandomBoundary, UPLOAD_FIELD_NAME, estimate_request_size,
};

pub(crate) use coordinator::join_first_error;
pub(crate) use encoder::spawn_encoder;

/// Capacity of the in-memory pipe between the encoder and the transport.
/// Bounds upload memory to one buffer regardless of artifact size.
pub(crate) const PIPE_CAPACITY: usize = 8 * 1024;
