//! HTML parsing for maildraft.
//!
//! Parses markup (the code pane's contents, a stored template, an AI
//! response) into a [`maildraft_dom::CanvasDocument`] via html5ever's
//! tree builder. XHTML-flavoured documents are sniffed and routed through
//! xml5ever instead.

mod html_sink;

pub use html_sink::DocumentHtmlParser;

use maildraft_dom::CanvasDocument;

/// Parse markup into a fresh document. The previous arena (and every node
/// id handed out against it) is gone; callers re-resolve anything they
/// were pointing at.
pub fn parse_document(html: &str) -> CanvasDocument {
    let mut doc = CanvasDocument::new();
    DocumentHtmlParser::parse_into_doc(&mut doc, html);
    doc
}
