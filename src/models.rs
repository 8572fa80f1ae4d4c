//! Result types handed to the presentation layer.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::listing::OrderingPolicy;

/// Outcome of resolving a URL path. Exactly one variant per request.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageResult {
    Directory(Listing),
    Document(RenderedDocument),
    NotFound { url_path: String },
}

/// Ordered item names of one directory.
#[derive(Debug, Clone, Serialize)]
pub struct Listing {
    pub title: String,
    pub url_path: String,
    pub policy: OrderingPolicy,
    pub entries: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderedDocument {
    pub title: String,
    pub url_path: String,
    /// Trusted HTML produced by the markdown transform.
    pub body_html: String,
    pub last_modified: Option<DateTime<Utc>>,
    pub source_url: Option<String>,
}

/// Matched item paths in tree-walk order.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub pattern: String,
    pub path_only: bool,
    pub paths: Vec<String>,
}
