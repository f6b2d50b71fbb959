//! In-place text editing of a selected element.
//!
//! An edit session marks one element contenteditable, accepts keystrokes
//! against its text content, and on commit inlines the typography styles
//! the element was actually rendered with. Emailed markup has no access to
//! a stylesheet cascade, so anything that looked styled during editing
//! must leave with explicit inline values.

use std::fmt;

use maildraft_dom::{
    CanvasDocument, SelectionKind, TYPOGRAPHY_PROPERTIES, qual_name, resolved_style,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditError {
    /// The selection cannot enter text-edit mode. Image selections are
    /// redirected to file selection by the caller; an empty selection has
    /// nothing to edit.
    NotEditable,
}

impl fmt::Display for EditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotEditable => f.write_str("selection is not text-editable"),
        }
    }
}

impl std::error::Error for EditError {}

#[derive(Default)]
pub struct EditSession {
    editing: Option<usize>,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.editing.is_some()
    }

    pub fn node(&self) -> Option<usize> {
        self.editing
    }

    /// Enter text-edit mode on the selected element.
    pub fn begin(
        &mut self,
        doc: &mut CanvasDocument,
        selection: Option<usize>,
        kind: SelectionKind,
    ) -> Result<(), EditError> {
        let node_id = selection.ok_or(EditError::NotEditable)?;
        if kind == SelectionKind::Image {
            return Err(EditError::NotEditable);
        }
        if doc.get_node(node_id).is_none_or(|n| !n.is_element()) {
            return Err(EditError::NotEditable);
        }

        doc.mutate()
            .set_attribute(node_id, qual_name!("contenteditable"), "true");
        self.editing = Some(node_id);
        #[cfg(feature = "tracing")]
        tracing::debug!(node_id, "edit session started");
        Ok(())
    }

    /// Append typed text to the edited element: onto its last text child,
    /// or into a fresh text node after a line break.
    pub fn insert_text(&self, doc: &mut CanvasDocument, text: &str) {
        let Some(node_id) = self.editing else { return };
        let mut mutr = doc.mutate();
        let last_child = mutr.last_child_id(node_id);
        let appended =
            last_child.is_some_and(|id| mutr.append_text_to_node(id, text).is_ok());
        if !appended {
            let text_id = mutr.create_text_node(text);
            mutr.append_children(node_id, &[text_id]);
        }
    }

    /// Insert a line break. Rendered HTML collapses newline characters to
    /// spaces, so breaks are `<br>` elements.
    pub fn insert_line_break(&self, doc: &mut CanvasDocument) {
        let Some(node_id) = self.editing else { return };
        let mut mutr = doc.mutate();
        let br = mutr.create_element(qual_name!("br", html), vec![]);
        mutr.append_children(node_id, &[br]);
    }

    /// Remove the last character of the edited element's trailing text, or
    /// the trailing line break itself.
    pub fn backspace(&self, doc: &mut CanvasDocument) {
        let Some(node_id) = self.editing else { return };
        let Some(last) = doc
            .get_node(node_id)
            .and_then(|n| n.children.last().copied())
        else {
            return;
        };
        let emptied = match doc.get_node_mut(last).and_then(|n| n.text_data_mut()) {
            Some(text) => {
                text.content.pop();
                text.content.is_empty()
            }
            // a <br> (or other child) goes whole
            None => true,
        };
        if emptied {
            doc.mutate().remove_and_drop_node(last);
        }
    }

    /// Leave edit mode, inlining resolved typography values first.
    ///
    /// For each typography property without an explicit inline value, the
    /// resolved value is written back as an inline declaration. After this
    /// returns the element carries no editing-mode markers. Returns the
    /// edited node's id so the caller can reserialize.
    pub fn commit(&mut self, doc: &mut CanvasDocument) -> Option<usize> {
        let node_id = self.editing.take()?;
        if doc.get_node(node_id).is_none() {
            return None;
        }

        for property in TYPOGRAPHY_PROPERTIES {
            let has_inline = doc
                .get_node(node_id)
                .and_then(|n| n.element_data())
                .and_then(|el| el.style_property(property))
                .is_some();
            if has_inline {
                continue;
            }
            let value = resolved_style(doc, node_id, property);
            if !value.is_empty() {
                doc.mutate().set_style_property(node_id, property, &value);
            }
        }

        doc.mutate()
            .clear_attribute(node_id, qual_name!("contenteditable"));
        #[cfg(feature = "tracing")]
        tracing::debug!(node_id, "edit session committed");
        Some(node_id)
    }

    /// Leave edit mode without inlining styles or keeping markers.
    pub fn cancel(&mut self, doc: &mut CanvasDocument) {
        if let Some(node_id) = self.editing.take() {
            doc.mutate()
                .clear_attribute(node_id, qual_name!("contenteditable"));
        }
    }

    /// Whether a node is inside the element currently under edit.
    pub fn contains(&self, doc: &CanvasDocument, node_id: usize) -> bool {
        let Some(edited) = self.editing else {
            return false;
        };
        doc.get_node(node_id).is_some() && doc.node_chain(node_id).contains(&edited)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maildraft_dom::local_name;
    use maildraft_html::parse_document;

    fn doc_with(html: &str) -> (CanvasDocument, usize) {
        let doc = parse_document(html);
        let body = doc.body().unwrap();
        let first = doc.get_node(body).unwrap().children[0];
        (doc, first)
    }

    #[test]
    fn image_selection_is_not_editable() {
        let (mut doc, img) =
            doc_with("<!DOCTYPE html><html><body><img src=\"x.png\"></body></html>");
        let mut session = EditSession::new();
        let result = session.begin(&mut doc, Some(img), SelectionKind::Image);
        assert_eq!(result, Err(EditError::NotEditable));
        assert!(!session.is_active());
    }

    #[test]
    fn empty_selection_is_not_editable() {
        let (mut doc, _) = doc_with("<!DOCTYPE html><html><body><p>x</p></body></html>");
        let mut session = EditSession::new();
        assert!(
            session
                .begin(&mut doc, None, SelectionKind::Unknown)
                .is_err()
        );
    }

    #[test]
    fn commit_inlines_inherited_color() {
        let (mut doc, div) = doc_with(
            "<!DOCTYPE html><html><body>\
             <div style=\"color: rgb(10, 10, 10)\"><p>Hello</p></div>\
             </body></html>",
        );
        let para = doc.get_node(div).unwrap().children[0];

        let mut session = EditSession::new();
        session
            .begin(&mut doc, Some(para), SelectionKind::Text)
            .unwrap();
        session.commit(&mut doc).unwrap();

        let el = doc.get_node(para).unwrap().element_data().unwrap();
        assert_eq!(el.style_property("color"), Some("rgb(10, 10, 10)"));
        assert_eq!(el.attr(local_name!("contenteditable")), None);
    }

    #[test]
    fn commit_keeps_explicit_inline_values() {
        let (mut doc, para) = doc_with(
            "<!DOCTYPE html><html><body>\
             <p style=\"font-size: 20px\">Hello</p>\
             </body></html>",
        );
        let mut session = EditSession::new();
        session
            .begin(&mut doc, Some(para), SelectionKind::Text)
            .unwrap();
        session.commit(&mut doc).unwrap();

        let el = doc.get_node(para).unwrap().element_data().unwrap();
        assert_eq!(el.style_property("font-size"), Some("20px"));
        // unset properties picked up UA defaults
        assert_eq!(el.style_property("font-weight"), Some("400"));
    }

    #[test]
    fn keystrokes_mutate_text_content() {
        let (mut doc, para) =
            doc_with("<!DOCTYPE html><html><body><p>Hi</p></body></html>");
        let mut session = EditSession::new();
        session
            .begin(&mut doc, Some(para), SelectionKind::Text)
            .unwrap();
        session.insert_text(&mut doc, " there");
        session.backspace(&mut doc);
        assert_eq!(doc.text_content(para), "Hi ther");
        session.commit(&mut doc);
    }

    #[test]
    fn line_breaks_are_br_elements() {
        let (mut doc, para) =
            doc_with("<!DOCTYPE html><html><body><p>Hi</p></body></html>");
        let mut session = EditSession::new();
        session
            .begin(&mut doc, Some(para), SelectionKind::Text)
            .unwrap();
        session.insert_line_break(&mut doc);
        session.insert_text(&mut doc, "there");

        let children = doc.get_node(para).unwrap().children.clone();
        assert_eq!(children.len(), 3);
        assert!(
            doc.get_node(children[1])
                .unwrap()
                .data
                .is_element_with_tag_name(&local_name!("br"))
        );
        assert_eq!(doc.text_content(para), "Hithere");

        // backspacing eats the trailing text, then the break itself
        for _ in 0.."there".len() {
            session.backspace(&mut doc);
        }
        assert_eq!(doc.get_node(para).unwrap().children.len(), 2);
        session.backspace(&mut doc);
        assert_eq!(doc.get_node(para).unwrap().children.len(), 1);
        assert_eq!(doc.text_content(para), "Hi");
    }

    #[test]
    fn contains_checks_the_edited_subtree() {
        let (mut doc, div) = doc_with(
            "<!DOCTYPE html><html><body><div><p>in</p></div><p>out</p></body></html>",
        );
        let inner = doc.get_node(div).unwrap().children[0];
        let body = doc.body().unwrap();
        let outside = doc.get_node(body).unwrap().children[1];

        let mut session = EditSession::new();
        session
            .begin(&mut doc, Some(div), SelectionKind::Container)
            .unwrap();
        assert!(session.contains(&doc, inner));
        assert!(session.contains(&doc, div));
        assert!(!session.contains(&doc, outside));
    }
}
