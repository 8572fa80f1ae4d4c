//! URL path resolution.
//!
//! `notes/foo` resolves to the directory `<content>/notes/foo` if there is
//! one, else to the document `<content>/notes/foo.md`, else to
//! [`PageResult::NotFound`]. Classification and reading are separate
//! filesystem calls, so a pull landing in between can turn a document
//! classified as present into an I/O error. That is reported, never
//! papered over.

use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use crate::listing::ListingBuilder;
use crate::models::PageResult;
use crate::render::DocumentRenderer;
use crate::store::ContentStore;

pub struct PathResolver {
    store: Arc<ContentStore>,
    listing: ListingBuilder,
    renderer: DocumentRenderer,
}

impl PathResolver {
    pub fn new(
        store: Arc<ContentStore>,
        listing: ListingBuilder,
        renderer: DocumentRenderer,
    ) -> Self {
        Self {
            store,
            listing,
            renderer,
        }
    }

    pub fn resolve(&self, url_path: &str) -> Result<PageResult> {
        let url_path = url_path.trim_matches('/');

        let Some(path) = self.store.locate(url_path) else {
            debug!(url_path, "rejected path");
            return Ok(not_found(url_path));
        };

        if self.store.is_dir(&path) {
            let listing = self.listing.list(url_path, &path)?;
            return Ok(PageResult::Directory(listing));
        }

        let file = self.store.document_file(&path);
        if self.store.is_file(&file) {
            let doc = self.renderer.render(url_path, &file)?;
            return Ok(PageResult::Document(doc));
        }

        debug!(url_path, "no directory or document");
        Ok(not_found(url_path))
    }
}

fn not_found(url_path: &str) -> PageResult {
    PageResult::NotFound {
        url_path: url_path.to_string(),
    }
}
