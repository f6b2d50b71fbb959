use markup5ever::local_name;

use crate::CanvasDocument;
use crate::node::NodeData;

/// What kind of thing the user has selected, driving which contextual
/// actions the editor offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionKind {
    /// An `<img>` element
    Image,
    /// A `<button>` or `<a>` element
    Button,
    /// An element whose content is directly editable text
    Text,
    /// Any other element (structural wrapper, table cell, ...)
    Container,
    /// Not an element
    Unknown,
}

impl SelectionKind {
    /// Classify a node. Tag checks win over content checks: a link whose
    /// only child is text is still a Button.
    pub fn classify(doc: &CanvasDocument, node_id: usize) -> Self {
        let Some(node) = doc.get_node(node_id) else {
            return Self::Unknown;
        };
        let Some(el) = node.element_data() else {
            return Self::Unknown;
        };

        if el.name.local == local_name!("img") {
            return Self::Image;
        }
        if el.name.local == local_name!("button") || el.name.local == local_name!("a") {
            return Self::Button;
        }

        let children = &node.children;
        let sole_text_child = children.len() == 1
            && doc
                .get_node(children[0])
                .is_some_and(|child| child.is_text_node());
        if sole_text_child {
            return Self::Text;
        }

        let has_element_children = children.iter().any(|id| {
            doc.get_node(*id)
                .is_some_and(|child| matches!(child.data, NodeData::Element(_)))
        });
        let has_visible_text = children.iter().any(|id| {
            doc.get_node(*id).is_some_and(|child| {
                child
                    .text_data()
                    .is_some_and(|text| !text.content.trim().is_empty())
            })
        });
        if !has_element_children && has_visible_text {
            return Self::Text;
        }

        Self::Container
    }

    pub fn is_text_editable(self) -> bool {
        matches!(self, Self::Text | Self::Button)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Attribute;
    use crate::qual_name;

    fn doc_with_body() -> (CanvasDocument, usize) {
        let mut doc = CanvasDocument::new();
        doc.ensure_email_scaffold();
        let body = doc.body().unwrap();
        (doc, body)
    }

    #[test]
    fn tags_beat_content() {
        let (mut doc, body) = doc_with_body();
        let link = {
            let mut mutr = doc.mutate();
            let link = mutr.create_element(
                qual_name!("a", html),
                vec![Attribute {
                    name: qual_name!("href"),
                    value: "https://example.com".to_string(),
                }],
            );
            let text = mutr.create_text_node("Click me");
            mutr.append_children(link, &[text]);
            mutr.append_children(body, &[link]);
            link
        };
        assert_eq!(SelectionKind::classify(&doc, link), SelectionKind::Button);
    }

    #[test]
    fn paragraph_with_only_text_is_text() {
        let (mut doc, body) = doc_with_body();
        let para = {
            let mut mutr = doc.mutate();
            let para = mutr.create_element(qual_name!("p", html), vec![]);
            let text = mutr.create_text_node("Hello");
            mutr.append_children(para, &[text]);
            mutr.append_children(body, &[para]);
            para
        };
        assert_eq!(SelectionKind::classify(&doc, para), SelectionKind::Text);
    }

    #[test]
    fn wrapper_with_element_children_is_container() {
        let (mut doc, body) = doc_with_body();
        let div = {
            let mut mutr = doc.mutate();
            let div = mutr.create_element(qual_name!("div", html), vec![]);
            let whitespace = mutr.create_text_node("\n  ");
            let img = mutr.create_element(qual_name!("img", html), vec![]);
            mutr.append_children(div, &[whitespace, img]);
            mutr.append_children(body, &[div]);
            div
        };
        assert_eq!(SelectionKind::classify(&doc, div), SelectionKind::Container);
    }

    #[test]
    fn non_elements_are_unknown() {
        let (mut doc, body) = doc_with_body();
        let text = {
            let mut mutr = doc.mutate();
            let text = mutr.create_text_node("loose");
            mutr.append_children(body, &[text]);
            text
        };
        assert_eq!(SelectionKind::classify(&doc, text), SelectionKind::Unknown);
        assert_eq!(SelectionKind::classify(&doc, 99999), SelectionKind::Unknown);
    }
}
