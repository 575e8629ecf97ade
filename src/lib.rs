//! Cloud Controller V2 API Client
//!
//! This library provides an async client for a Cloud Controller V2-style
//! control-plane API, centered on streaming buildpack-bits uploads with an
//! exact precomputed `Content-Length`.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`client`] - HTTP transport, warnings extraction, response decoding
//! - [`buildpack`] - the buildpack resource and its API operations
//! - [`upload`] - streaming multipart core: envelope framing, size
//!   estimation, the encoder task, and the first-error-wins join
//! - [`list`] - paginated list walking and query filters
//! - [`error`] - structured error types

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod buildpack;
pub mod client;
pub mod error;
pub mod list;
pub mod upload;

// Re-export commonly used types
pub use buildpack::Buildpack;
pub use client::{CONNECT_TIMEOUT_SECS, Client, ClientBuilder, READ_TIMEOUT_SECS, Warnings};
pub use error::ClientError;
pub use list::{Filter, ListError};
pub use upload::{BoundarySource, MultipartEnvelope, RandomBoundary, estimate_request_size};
