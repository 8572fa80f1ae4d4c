//! Minimal HTML presentation of results.
//!
//! Names, titles and paths are escaped. Document bodies come from the
//! markdown transform and are embedded as-is.

use std::fmt::Write;

use crate::models::{Listing, PageResult, RenderedDocument, SearchResult};

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n\
         <meta charset=\"UTF-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
         <title>{title}</title>\n\
         <link rel=\"stylesheet\" type=\"text/css\" href=\"/static/css/style.css\">\n\
         </head>\n<body>\n\
         <nav><a href=\"/\">home</a> | <a href=\"/search\">search</a></nav>\n\
         {body}\n</body>\n</html>\n",
        title = escape(title),
        body = body,
    )
}

fn link_list(out: &mut String, links: impl Iterator<Item = (String, String)>) {
    out.push_str("<ul>\n");
    for (href, label) in links {
        let _ = writeln!(
            out,
            "<li><a href=\"{}\">{}</a></li>",
            escape(&href),
            escape(&label)
        );
    }
    out.push_str("</ul>");
}

pub fn render_listing(listing: &Listing) -> String {
    let mut body = format!("<h1>{}</h1>\n", escape(&listing.url_path));
    let base = listing.url_path.trim_end_matches('/');
    link_list(
        &mut body,
        listing.entries.iter().map(|name| {
            let href = if base.is_empty() {
                format!("/{}", name)
            } else {
                format!("/{}/{}", base, name)
            };
            (href, name.clone())
        }),
    );
    layout(&listing.title, &body)
}

pub fn render_document(doc: &RenderedDocument) -> String {
    let mut body = format!("<h1>{}</h1>\n", escape(&doc.url_path));
    body.push_str(&doc.body_html);
    body.push('\n');
    if let Some(ts) = doc.last_modified {
        let _ = writeln!(
            body,
            "<p class=\"last-modified\">last modified {}</p>",
            ts.format("%Y-%m-%d")
        );
    }
    if let Some(url) = &doc.source_url {
        let _ = write!(body, "<a href=\"{}\">source</a>", escape(url));
    }
    layout(&doc.title, &body)
}

pub fn render_search(result: &SearchResult) -> String {
    let query = if result.path_only {
        format!("path:{}", result.pattern)
    } else {
        result.pattern.clone()
    };
    let mut body = format!(
        "<form action=\"/search\"><input name=\"regexp\" value=\"{}\"></form>\n",
        escape(&query)
    );
    link_list(
        &mut body,
        result
            .paths
            .iter()
            .map(|p| (format!("/{}", p), p.clone())),
    );
    layout("search", &body)
}

pub fn render_not_found(url_path: &str) -> String {
    let body = format!(
        "<h1>{}</h1>\n<p class=\"not-found\"><a href=\"/search\">search</a> and you will find</p>",
        escape(url_path)
    );
    layout("not found", &body)
}

pub fn render_error(message: &str) -> String {
    let body = format!("<p class=\"error\">{}</p>", escape(message));
    layout("error", &body)
}

pub fn render(result: &PageResult) -> String {
    match result {
        PageResult::Directory(listing) => render_listing(listing),
        PageResult::Document(doc) => render_document(doc),
        PageResult::NotFound { url_path } => render_not_found(url_path),
    }
}
