use markup5ever::{LocalName, QualName, local_name};

use crate::style::{Declaration, parse_declarations, serialize_declarations};
use maildraft_traits::geometry::FrameRect;

/// A single node in the slab arena.
///
/// `layout` is the node's border-box in frame-document coordinates. The
/// engine does not compute layout itself; the embedding shell reports each
/// element's rendered rectangle via
/// [`CanvasDocument::set_node_layout`](crate::CanvasDocument::set_node_layout)
/// after every render, and hit-testing and selection bounds are derived
/// from those rectangles.
pub struct Node {
    /// Our id within the arena
    pub id: usize,
    /// Our parent's id
    pub parent: Option<usize>,
    /// Our children's ids, in document order
    pub children: Vec<usize>,
    /// Node type (element, text, ...) specific data
    pub data: NodeData,
    /// Border-box reported by the embedding shell
    pub layout: FrameRect,
}

impl Node {
    pub fn new(id: usize, data: NodeData) -> Self {
        Self {
            id,
            parent: None,
            children: vec![],
            data,
            layout: FrameRect::zero(),
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    pub fn is_text_node(&self) -> bool {
        matches!(self.data, NodeData::Text(_))
    }

    pub fn element_data(&self) -> Option<&ElementData> {
        match self.data {
            NodeData::Element(ref data) => Some(data),
            _ => None,
        }
    }

    pub fn element_data_mut(&mut self) -> Option<&mut ElementData> {
        match self.data {
            NodeData::Element(ref mut data) => Some(data),
            _ => None,
        }
    }

    pub fn text_data(&self) -> Option<&TextData> {
        match self.data {
            NodeData::Text(ref data) => Some(data),
            _ => None,
        }
    }

    pub fn text_data_mut(&mut self) -> Option<&mut TextData> {
        match self.data {
            NodeData::Text(ref mut data) => Some(data),
            _ => None,
        }
    }

    pub fn attrs(&self) -> Option<&[Attribute]> {
        Some(&self.element_data()?.attrs)
    }

    pub fn attr(&self, name: LocalName) -> Option<&str> {
        self.element_data()?.attr(name)
    }

    pub fn tag_name(&self) -> Option<&LocalName> {
        self.element_data().map(|el| &el.name.local)
    }
}

/// The different kinds of nodes in the DOM.
#[derive(Debug, Clone)]
pub enum NodeData {
    /// The `Document` itself - the root node of a HTML document.
    Document,
    /// An element with attributes.
    Element(ElementData),
    /// A text node.
    Text(TextData),
    /// A comment. Content is preserved: email templates lean on
    /// conditional comments (`<!--[if mso]>`) for Outlook.
    Comment(String),
}

impl NodeData {
    pub fn downcast_element(&self) -> Option<&ElementData> {
        match self {
            Self::Element(data) => Some(data),
            _ => None,
        }
    }

    pub fn is_element_with_tag_name(&self, name: &impl PartialEq<LocalName>) -> bool {
        let Some(elem) = self.downcast_element() else {
            return false;
        };
        *name == elem.name.local
    }
}

/// A tag attribute, e.g. `class="test"` in `<div class="test" ...>`.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Debug)]
pub struct Attribute {
    /// The name of the attribute (e.g. the `class` in `<div class="test">`)
    pub name: QualName,
    /// The value of the attribute (e.g. the `"test"` in `<div class="test">`)
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct ElementData {
    /// The element's tag name, namespace and prefix
    pub name: QualName,
    /// The element's id attribute (if it has one)
    pub id: Option<String>,
    /// The element's attributes
    pub attrs: Vec<Attribute>,
    /// The element's parsed `style` attribute, kept in sync with the
    /// serialized attribute by [`flush_style_attribute`](Self::flush_style_attribute)
    pub style: Vec<Declaration>,
}

impl ElementData {
    pub fn new(name: QualName, attrs: Vec<Attribute>) -> Self {
        let id = attrs
            .iter()
            .find(|attr| attr.name.local == local_name!("id"))
            .map(|attr| attr.value.clone());

        let mut data = ElementData {
            name,
            id,
            attrs,
            style: Vec::new(),
        };
        data.flush_style_attribute();
        data
    }

    pub fn attr(&self, name: impl PartialEq<LocalName>) -> Option<&str> {
        let attr = self.attrs.iter().find(|attr| name == attr.name.local)?;
        Some(&attr.value)
    }

    /// Re-parse the `style` attribute into the cached declaration list.
    pub fn flush_style_attribute(&mut self) {
        self.style = match self.attr(local_name!("style")) {
            Some(css) => parse_declarations(css),
            None => Vec::new(),
        };
    }

    /// Look up an inline style declaration by property name.
    pub fn style_property(&self, property: &str) -> Option<&str> {
        self.style
            .iter()
            .find(|decl| decl.property == property)
            .map(|decl| decl.value.as_str())
    }

    /// Set an inline style declaration and rewrite the `style` attribute.
    pub fn set_style_property(&mut self, property: &str, value: &str) {
        match self
            .style
            .iter_mut()
            .find(|decl| decl.property == property)
        {
            Some(decl) => decl.value = value.to_string(),
            None => self.style.push(Declaration {
                property: property.to_string(),
                value: value.to_string(),
            }),
        }
        let css = serialize_declarations(&self.style);
        self.upsert_attr(local_name!("style"), &css);
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr(local_name!("class"))
            .unwrap_or("")
            .split_ascii_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let mut value = self.attr(local_name!("class")).unwrap_or("").to_string();
        if !value.is_empty() {
            value.push(' ');
        }
        value.push_str(class);
        self.upsert_attr(local_name!("class"), &value);
    }

    pub fn remove_class(&mut self, class: &str) {
        let Some(current) = self.attr(local_name!("class")) else {
            return;
        };
        let value = current
            .split_ascii_whitespace()
            .filter(|c| *c != class)
            .collect::<Vec<_>>()
            .join(" ");
        if value.is_empty() {
            self.attrs
                .retain(|attr| attr.name.local != local_name!("class"));
        } else {
            self.upsert_attr(local_name!("class"), &value);
        }
    }

    fn upsert_attr(&mut self, name: LocalName, value: &str) {
        match self.attrs.iter_mut().find(|attr| attr.name.local == name) {
            Some(attr) => {
                attr.value.clear();
                attr.value.push_str(value);
            }
            None => self.attrs.push(Attribute {
                name: QualName::new(None, markup5ever::ns!(), name),
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TextData {
    /// The textual content of the text node
    pub content: String,
}

impl TextData {
    pub fn new(content: String) -> Self {
        Self { content }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qual_name;

    fn div_with(attrs: Vec<Attribute>) -> ElementData {
        ElementData::new(qual_name!("div", html), attrs)
    }

    #[test]
    fn class_list_round_trips() {
        let mut el = div_with(vec![]);
        el.add_class("selected-outline");
        el.add_class("hover-outline");
        assert!(el.has_class("selected-outline"));

        el.remove_class("selected-outline");
        assert_eq!(el.attr(local_name!("class")), Some("hover-outline"));

        el.remove_class("hover-outline");
        assert_eq!(el.attr(local_name!("class")), None);
    }

    #[test]
    fn style_attribute_stays_in_sync() {
        let mut el = div_with(vec![Attribute {
            name: qual_name!("style"),
            value: "color: red".to_string(),
        }]);
        assert_eq!(el.style_property("color"), Some("red"));

        el.set_style_property("font-size", "14px");
        let css = el.attr(local_name!("style")).unwrap();
        assert!(css.contains("color: red"));
        assert!(css.contains("font-size: 14px"));
    }
}
