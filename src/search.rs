//! Regular-expression search over the whole content tree.
//!
//! Every entry below the content root is visited in file-name order,
//! directories included. An entry matches when its URL path matches the
//! pattern, or, unless the search is path-only, when the rendered HTML of
//! any file's contents matches, whatever its suffix. Patterns are always
//! case-insensitive.
//!
//! A query string starting with `path:` requests a path-only search; the
//! prefix is removed before the pattern is compiled.

use regex::{Regex, RegexBuilder};
use std::sync::Arc;

use crate::error::Result;
use crate::models::SearchResult;
use crate::render::markdown_to_html;
use crate::store::ContentStore;

const PATH_ONLY_PREFIX: &str = "path:";

/// A parsed search query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub pattern: String,
    pub path_only: bool,
}

impl SearchQuery {
    /// Parse a raw query. `path_only` forces path-only mode even without
    /// the `path:` prefix.
    pub fn parse(raw: &str, path_only: bool) -> Self {
        match raw.strip_prefix(PATH_ONLY_PREFIX) {
            Some(pattern) => Self {
                pattern: pattern.to_string(),
                path_only: true,
            },
            None => Self {
                pattern: raw.to_string(),
                path_only,
            },
        }
    }

    pub fn compile(&self) -> Result<Regex> {
        Ok(RegexBuilder::new(&self.pattern)
            .case_insensitive(true)
            .build()?)
    }
}

pub struct SearchEngine {
    store: Arc<ContentStore>,
}

impl SearchEngine {
    pub fn new(store: Arc<ContentStore>) -> Self {
        Self { store }
    }

    /// Search the tree.
    ///
    /// A malformed pattern fails before anything is read. Any I/O error
    /// during the walk aborts the whole search.
    pub fn search(&self, raw_query: &str, path_only: bool) -> Result<SearchResult> {
        let query = SearchQuery::parse(raw_query, path_only);
        let rx = query.compile()?;

        let mut paths = Vec::new();
        for entry in self.store.walk() {
            let entry = entry?;
            let path = entry.path();
            let Some(url_path) = self.store.url_path(path) else {
                continue;
            };

            let path_match = rx.is_match(&url_path);
            let content_match = !path_match
                && !query.path_only
                && !entry.file_type().is_dir()
                && !self.store.is_dir(path)
                && {
                    let markdown = self.store.read(path)?;
                    rx.is_match(&markdown_to_html(&markdown))
                };

            if path_match || content_match {
                paths.push(url_path);
            }
        }

        Ok(SearchResult {
            pattern: query.pattern,
            path_only: query.path_only,
            paths,
        })
    }
}
