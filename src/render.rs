//! Markdown rendering with last-modified provenance.

use pulldown_cmark::{html, Options, Parser};
use std::path::Path;
use std::sync::Arc;

use crate::error::Result;
use crate::models::RenderedDocument;
use crate::store::ContentStore;

/// Convert markdown bytes into HTML.
///
/// Invalid UTF-8 is replaced rather than rejected. The output is embedded
/// verbatim by the presentation layer.
pub fn markdown_to_html(markdown: &[u8]) -> String {
    let text = String::from_utf8_lossy(markdown);

    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_HEADING_ATTRIBUTES);

    let parser = Parser::new_ext(&text, options);
    let mut out = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

pub struct DocumentRenderer {
    store: Arc<ContentStore>,
}

impl DocumentRenderer {
    pub fn new(store: Arc<ContentStore>) -> Self {
        Self { store }
    }

    /// Read `file` now and render it. No caching: a concurrent pull may
    /// change what two successive calls return.
    pub fn render(&self, url_path: &str, file: &Path) -> Result<RenderedDocument> {
        let markdown = self.store.read(file)?;
        let body_html = markdown_to_html(&markdown);

        let title = url_path
            .rsplit('/')
            .find(|s| !s.is_empty())
            .unwrap_or(url_path)
            .to_string();

        Ok(RenderedDocument {
            title,
            url_path: url_path.trim_matches('/').to_string(),
            body_html,
            last_modified: self.store.last_modified(file),
            source_url: self.store.source_url(file),
        })
    }
}
