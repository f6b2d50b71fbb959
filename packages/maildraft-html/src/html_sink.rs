//! An implementation for Html5ever's sink trait, allowing us to parse HTML into a DOM.

use html5ever::ParseOpts;
use html5ever::tokenizer::TokenizerOpts;
use html5ever::tree_builder::TreeBuilderOpts;
use std::borrow::Cow;
use std::cell::{Cell, Ref, RefCell, RefMut};

use html5ever::{
    QualName,
    tendril::{StrTendril, TendrilSink},
    tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink},
};
use maildraft_dom::{Attribute, CanvasDocument, DocumentMutator};

/// Convert an html5ever Attribute which uses tendril for its value to a maildraft Attribute
/// which uses String.
fn html5ever_to_maildraft_attr(attr: html5ever::Attribute) -> Attribute {
    Attribute {
        name: attr.name,
        value: attr.value.to_string(),
    }
}

pub struct DocumentHtmlParser<'doc> {
    document_mutator: RefCell<DocumentMutator<'doc>>,

    /// Errors that occurred during parsing.
    pub errors: RefCell<Vec<Cow<'static, str>>>,

    /// The document's quirks mode.
    pub quirks_mode: Cell<QuirksMode>,
    pub is_xml: bool,
}

impl<'doc> DocumentHtmlParser<'doc> {
    #[track_caller]
    /// Get a mutable borrow of the DocumentMutator
    fn mutr(&self) -> RefMut<'_, DocumentMutator<'doc>> {
        self.document_mutator.borrow_mut()
    }
}

impl DocumentHtmlParser<'_> {
    pub fn new(doc: &mut CanvasDocument) -> DocumentHtmlParser<'_> {
        DocumentHtmlParser {
            document_mutator: RefCell::new(doc.mutate()),
            errors: RefCell::new(Vec::new()),
            quirks_mode: Cell::new(QuirksMode::NoQuirks),
            is_xml: false,
        }
    }

    pub fn parse_into_doc<'d>(doc: &'d mut CanvasDocument, html: &str) -> &'d mut CanvasDocument {
        let mut sink = Self::new(doc);

        let is_xhtml_doc = html.starts_with("<?xml")
            || html.starts_with("<!DOCTYPE") && {
                let first_line = html.lines().next().unwrap();
                first_line.contains("XHTML") || first_line.contains("xhtml")
            };

        if is_xhtml_doc {
            // Parse as XHTML
            sink.is_xml = true;
            xml5ever::driver::parse_document(sink, Default::default())
                .from_utf8()
                .read_from(&mut html.as_bytes())
                .unwrap();
        } else {
            // Parse as HTML
            sink.is_xml = false;
            let opts = ParseOpts {
                tokenizer: TokenizerOpts::default(),
                tree_builder: TreeBuilderOpts {
                    exact_errors: false,
                    scripting_enabled: false, // Enables parsing of <noscript> tags
                    iframe_srcdoc: false,
                    drop_doctype: true,
                    quirks_mode: QuirksMode::NoQuirks,
                },
            };
            html5ever::parse_document(sink, opts)
                .from_utf8()
                .read_from(&mut html.as_bytes())
                .unwrap();
        }

        doc
    }
}

impl<'b> TreeSink for DocumentHtmlParser<'b> {
    type Output = ();

    // we use the ID of the nodes in the tree as the handle
    type Handle = usize;

    type ElemName<'a>
        = Ref<'a, QualName>
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        drop(self.document_mutator.into_inner());
        #[cfg(feature = "tracing")]
        for error in self.errors.borrow().iter() {
            tracing::warn!("parse error: {error}");
        }
    }

    fn parse_error(&self, msg: Cow<'static, str>) {
        self.errors.borrow_mut().push(msg);
    }

    fn get_document(&self) -> Self::Handle {
        0
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> Self::ElemName<'a> {
        Ref::map(self.document_mutator.borrow(), |docm| {
            docm.element_name(*target)
                .expect("TreeSink::elem_name called on a node which is not an element!")
        })
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<html5ever::Attribute>,
        _flags: ElementFlags,
    ) -> Self::Handle {
        let attrs = attrs.into_iter().map(html5ever_to_maildraft_attr).collect();
        self.mutr().create_element(name, attrs)
    }

    // Comment content is kept: Outlook conditional comments are load-bearing
    // in email markup.
    fn create_comment(&self, text: StrTendril) -> Self::Handle {
        self.mutr().create_comment_node(&text)
    }

    fn create_pi(&self, _target: StrTendril, data: StrTendril) -> Self::Handle {
        self.mutr().create_comment_node(&data)
    }

    fn append(&self, parent_id: &Self::Handle, child: NodeOrText<Self::Handle>) {
        match child {
            NodeOrText::AppendNode(id) => self.mutr().append_children(*parent_id, &[id]),
            // If content to append is text, first attempt to append it to the last child of parent.
            // Else create a new text node and append it to the parent
            NodeOrText::AppendText(text) => {
                let last_child_id = self.mutr().last_child_id(*parent_id);
                let has_appended = if let Some(id) = last_child_id {
                    self.mutr().append_text_to_node(id, &text).is_ok()
                } else {
                    false
                };
                if !has_appended {
                    let new_child_id = self.mutr().create_text_node(&text);
                    self.mutr().append_children(*parent_id, &[new_child_id]);
                }
            }
        }
    }

    // Note: The tree builder promises we won't have a text node after the insertion point.
    fn append_before_sibling(&self, sibling_id: &Self::Handle, new_node: NodeOrText<Self::Handle>) {
        match new_node {
            NodeOrText::AppendNode(id) => self.mutr().insert_nodes_before(*sibling_id, &[id]),
            // If content to append is text, first attempt to append it to the node before sibling_node
            // Else create a new text node and insert it before sibling_node
            NodeOrText::AppendText(text) => {
                let previous_sibling_id = self.mutr().previous_sibling_id(*sibling_id);
                let has_appended = if let Some(id) = previous_sibling_id {
                    self.mutr().append_text_to_node(id, &text).is_ok()
                } else {
                    false
                };
                if !has_appended {
                    let new_child_id = self.mutr().create_text_node(&text);
                    self.mutr()
                        .insert_nodes_before(*sibling_id, &[new_child_id]);
                }
            }
        };
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        if self.mutr().node_has_parent(*element) {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        _name: StrTendril,
        _public_id: StrTendril,
        _system_id: StrTendril,
    ) {
        // Ignore. Serialization always emits a standards-mode doctype.
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        *target
    }

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        x == y
    }

    fn set_quirks_mode(&self, mode: QuirksMode) {
        self.quirks_mode.set(mode);
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<html5ever::Attribute>) {
        let attrs = attrs.into_iter().map(html5ever_to_maildraft_attr).collect();
        self.mutr().add_attrs_if_missing(*target, attrs);
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        self.mutr().remove_node(*target);
    }

    fn reparent_children(&self, old_parent_id: &Self::Handle, new_parent_id: &Self::Handle) {
        self.mutr()
            .reparent_children(*old_parent_id, *new_parent_id);
    }
}

#[cfg(test)]
mod tests {
    use crate::parse_document;
    use maildraft_dom::{SelectionKind, local_name, serialize_document};

    #[test]
    fn parses_some_html() {
        let html = "<!DOCTYPE html><html><body><h1>hello world</h1></body></html>";
        let doc = parse_document(html);

        let body = doc.body().unwrap();
        let h1 = doc.get_node(body).unwrap().children[0];
        assert!(
            doc.get_node(h1)
                .unwrap()
                .data
                .is_element_with_tag_name(&local_name!("h1"))
        );
        assert_eq!(doc.text_content(h1), "hello world");
        assert_eq!(SelectionKind::classify(&doc, h1), SelectionKind::Text);
    }

    #[test]
    fn fragments_gain_scaffold_elements() {
        // html5ever synthesizes html/head/body around bare fragments
        let doc = parse_document("<p>loose paragraph</p>");
        assert!(doc.html_element().is_some());
        assert!(doc.head().is_some());
        let body = doc.body().unwrap();
        assert_eq!(doc.text_content(body), "loose paragraph");
    }

    #[test]
    fn conditional_comments_round_trip() {
        let html = "<!DOCTYPE html><html><head></head><body>\
            <!--[if mso]><table role=\"presentation\"><![endif]-->\
            <p>hi</p></body></html>";
        let mut doc = parse_document(html);
        doc.ensure_email_scaffold();
        let out = serialize_document(&doc);
        assert!(out.contains("<!--[if mso]><table role=\"presentation\"><![endif]-->"));
    }

    #[test]
    fn serialize_then_parse_is_stable() {
        let html = "<!DOCTYPE html><html><head><meta charset=\"utf-8\">\
            <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\
            </head><body><div style=\"padding: 16px\"><h1>Title</h1>\
            <p>Body copy</p></div></body></html>";
        let mut doc = parse_document(html);
        doc.ensure_email_scaffold();
        let first = serialize_document(&doc);

        let mut reparsed = parse_document(&first);
        reparsed.ensure_email_scaffold();
        let second = serialize_document(&reparsed);
        assert_eq!(first, second);
    }

    #[test]
    fn malformed_markup_still_produces_a_tree() {
        let doc = parse_document("<div><p>unclosed<div>sibling");
        let body = doc.body().unwrap();
        assert!(!doc.get_node(body).unwrap().children.is_empty());
    }
}
