//! Multipart envelope framing and request-size estimation.
//!
//! A buildpack upload body is a `multipart/form-data` envelope wrapping a
//! single file field. The transport needs an exact `Content-Length` up front,
//! so this module can compute the envelope's framing overhead (boundary
//! markers, part headers, trailer) without ever reading the artifact: the
//! boundary is random per envelope but of fixed length, so the framing of a
//! zero-content envelope is byte-for-byte the same size as the real one.

use std::fmt::Write as _;

use rand::RngCore;

/// Form field name the Cloud Controller expects for buildpack bits.
pub const UPLOAD_FIELD_NAME: &str = "buildpack";

/// Boundary length in random bytes; hex-encoded to twice this many characters.
const BOUNDARY_RANDOM_BYTES: usize = 30;

/// Source of multipart boundary strings.
///
/// Injectable so tests can pin the boundary for reproducible framing. Every
/// implementation must return boundaries of a fixed length; the size
/// estimator's overhead equality depends on it.
pub trait BoundarySource: Send + Sync + std::fmt::Debug {
    /// Returns a fresh boundary string.
    fn boundary(&self) -> String;
}

/// Default boundary source: 60 random lowercase hex characters per envelope.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomBoundary;

impl BoundarySource for RandomBoundary {
    fn boundary(&self) -> String {
        let mut bytes = [0u8; BOUNDARY_RANDOM_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        bytes.iter().fold(
            String::with_capacity(BOUNDARY_RANDOM_BYTES * 2),
            |mut hex, byte| {
                // Infallible for String.
                let _ = write!(hex, "{byte:02x}");
                hex
            },
        )
    }
}

/// Write-once description of a multipart envelope with a single file field.
///
/// Instances are created per upload call (or per size estimate) and discarded
/// with it. The envelope never holds payload bytes; it only produces the
/// framing that surrounds them.
#[derive(Debug, Clone)]
pub struct MultipartEnvelope {
    boundary: String,
    file_name: String,
}

impl MultipartEnvelope {
    /// Creates an envelope for a file field with the given display filename,
    /// drawing a fresh boundary from `boundaries`.
    pub fn new(file_name: impl Into<String>, boundaries: &dyn BoundarySource) -> Self {
        Self {
            boundary: boundaries.boundary(),
            file_name: file_name.into(),
        }
    }

    /// Creates an envelope with an explicit boundary. Intended for tests that
    /// need deterministic framing.
    pub fn with_boundary(file_name: impl Into<String>, boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            file_name: file_name.into(),
        }
    }

    /// Returns the `Content-Type` header value carrying this envelope's boundary.
    #[must_use]
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Returns the opening boundary marker and part header block, up to and
    /// including the blank line that precedes the payload bytes.
    #[must_use]
    pub fn header_block(&self) -> Vec<u8> {
        format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/octet-stream\r\n\
             \r\n",
            boundary = self.boundary,
            field = UPLOAD_FIELD_NAME,
            file_name = escape_quotes(&self.file_name),
        )
        .into_bytes()
    }

    /// Returns the closing boundary marker written after the payload bytes.
    #[must_use]
    pub fn trailer(&self) -> Vec<u8> {
        format!("\r\n--{}--\r\n", self.boundary).into_bytes()
    }

    /// Returns the total framing byte count: everything the envelope adds
    /// around the payload. Computed by materializing the zero-content
    /// envelope into a throwaway buffer.
    #[must_use]
    pub fn framing_overhead(&self) -> u64 {
        let mut frame = self.header_block();
        frame.extend_from_slice(&self.trailer());
        frame.len() as u64
    }
}

/// Computes the exact request-body length for an artifact of `artifact_len`
/// bytes uploaded under `file_name`, without reading the artifact.
///
/// The estimate envelope draws its own boundary; the result still matches the
/// real envelope's encoded length because boundaries have a fixed length.
#[must_use]
pub fn estimate_request_size(
    artifact_len: u64,
    file_name: &str,
    boundaries: &dyn BoundarySource,
) -> u64 {
    MultipartEnvelope::new(file_name, boundaries).framing_overhead() + artifact_len
}

/// Escapes `\` and `"` in a `Content-Disposition` parameter value.
fn escape_quotes(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
