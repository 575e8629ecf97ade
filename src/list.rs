//! Paginated list walking and query filters.
//!
//! V2 list endpoints return pages shaped as
//! `{"next_url": "/v2/...", "resources": [...]}`. The paginator walks the
//! chain from an initial endpoint, hands each raw resource to a callback, and
//! accumulates warnings across pages in arrival order. Resource modules layer
//! typed decoding on top (see [`crate::buildpack`]); when a walk aborts
//! mid-chain, everything consumed so far is returned to the caller inside a
//! [`ListError`].

use std::fmt;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::client::{Client, Warnings};
use crate::error::ClientError;

/// A V2 query filter, rendered as a `q` query parameter (`field:value`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    /// The filtered field, e.g. `name`.
    pub field: String,
    /// The comparison operator, e.g. `:` for equality or ` IN `.
    pub operator: String,
    /// The values to match; multiple values are comma-joined.
    pub values: Vec<String>,
}

impl Filter {
    /// Creates an equality filter (`field:value`).
    pub fn equal(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator: ":".to_string(),
            values: vec![value.into()],
        }
    }

    /// Renders the filter as a `q` parameter value.
    #[must_use]
    pub fn query_value(&self) -> String {
        format!("{}{}{}", self.field, self.operator, self.values.join(","))
    }
}

/// Failure during a paginated list call.
///
/// Carries the items and warnings consumed before the walk aborted, so a
/// failure on page N still yields pages 1..N-1 to the caller.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct ListError<T: fmt::Debug> {
    /// Items decoded before the failure, in page order.
    pub partial: Vec<T>,
    /// Warnings accumulated from fully received responses, in arrival order.
    pub warnings: Warnings,
    /// The underlying failure.
    #[source]
    pub source: ClientError,
}

/// One page of a V2 list response. Items stay raw; typed decoding is the
/// caller's concern.
#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    next_url: Option<String>,
    #[serde(default)]
    resources: Vec<serde_json::Value>,
}

impl Client {
    /// Walks all pages starting at `first`, invoking `each` for every raw
    /// resource in page order.
    ///
    /// Warnings accumulate into the caller-owned `warnings` buffer in arrival
    /// order, so they survive a mid-walk failure. A transport error or a
    /// callback error aborts the walk and is returned as-is.
    pub(crate) async fn paginate<F>(
        &self,
        first: Url,
        warnings: &mut Warnings,
        mut each: F,
    ) -> Result<(), ClientError>
    where
        F: FnMut(serde_json::Value) -> Result<(), ClientError>,
    {
        let mut next = Some(first);
        let mut pages = 0u32;

        while let Some(url) = next.take() {
            let request = self.get(url.clone());
            let (page, mut page_warnings): (Page, Warnings) = self.execute(request, url).await?;
            warnings.append(&mut page_warnings);
            pages += 1;

            for item in page.resources {
                each(item)?;
            }

            next = match page.next_url {
                Some(path) => Some(self.endpoint(&path)?),
                None => None,
            };
        }

        debug!(pages, "paginated list walk complete");
        Ok(())
    }
}
