//! The frame sandbox: an isolated document the template is rendered into.
//!
//! The sandbox owns the live DOM tree. Loading is always wholesale: the
//! previous arena is discarded and the incoming markup reparsed from
//! scratch, which guarantees any scripts embedded in the template would
//! re-run deterministically in a rendering shell. Canvas edits mutate the
//! live tree in place and never trigger a reload.

use maildraft_dom::{
    Attribute, CanvasDocument, EDITOR_STYLE_MARKER, qual_name, serialize_document,
};
use maildraft_html::parse_document;
use maildraft_traits::geometry::FrameMetrics;

/// CSS for the editor-only affordances, injected after every load and
/// stripped from every serialization.
const EDITOR_STYLES: &str = "\
.hover-outline { outline: 2px dashed #7c9cf4; outline-offset: 2px; cursor: pointer; }\n\
.selected-outline { outline: 2px solid #2563eb; outline-offset: 2px; }\n\
[contenteditable=\"true\"] { outline: 2px solid #16a34a; outline-offset: 2px; }";

pub struct FrameSandbox {
    doc: CanvasDocument,
    reload_count: u64,
}

impl FrameSandbox {
    pub fn new() -> Self {
        let mut doc = CanvasDocument::new();
        doc.ensure_email_scaffold();
        Self {
            doc,
            reload_count: 0,
        }
    }

    pub fn document(&self) -> &CanvasDocument {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut CanvasDocument {
        &mut self.doc
    }

    /// Number of full reloads performed so far. Echo-suppression tests
    /// assert on this.
    pub fn reload_count(&self) -> u64 {
        self.reload_count
    }

    /// Replace the sandbox's entire content with the given document.
    ///
    /// All node ids handed out against the previous tree are invalid after
    /// this returns. Frame metrics survive the reload; element layout does
    /// not, and must be re-reported by the shell.
    pub fn load(&mut self, document_string: &str) {
        let metrics = self.doc.metrics();
        let mut doc = parse_document(document_string);
        doc.ensure_email_scaffold();
        doc.set_metrics(metrics);
        self.doc = doc;
        self.inject_editor_styles();
        self.reload_count += 1;
        #[cfg(feature = "tracing")]
        tracing::debug!(reload = self.reload_count, "sandbox loaded");
    }

    /// Serialize the live tree as exportable markup.
    ///
    /// Every editor artifact is stripped tree-wide first, not just from the
    /// current selection: rapid interactions can leave stale markers on
    /// elements no longer selected. The editor style block is re-injected
    /// afterwards so the live document keeps its affordances.
    pub fn read_current_markup(&mut self, outline_classes: &[&str]) -> String {
        self.doc.strip_editor_artifacts(outline_classes);
        let markup = serialize_document(&self.doc);
        self.inject_editor_styles();
        markup
    }

    pub fn set_metrics(&mut self, metrics: FrameMetrics) {
        self.doc.set_metrics(metrics);
    }

    fn inject_editor_styles(&mut self) {
        let Some(head) = self.doc.head() else {
            return;
        };
        let mut mutr = self.doc.mutate();
        let style = mutr.create_element(
            qual_name!("style", html),
            vec![Attribute {
                name: maildraft_dom::QualName {
                    prefix: None,
                    ns: maildraft_dom::ns!(),
                    local: maildraft_dom::LocalName::from(EDITOR_STYLE_MARKER),
                },
                value: "true".to_string(),
            }],
        );
        let css = mutr.create_text_node(EDITOR_STYLES);
        mutr.append_children(style, &[css]);
        mutr.append_children(head, &[style]);
    }
}

impl Default for FrameSandbox {
    fn default() -> Self {
        Self::new()
    }
}
