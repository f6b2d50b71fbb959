use std::collections::HashSet;

use markup5ever::{QualName, local_name};

use crate::node::{Attribute, ElementData, NodeData};
use crate::{CanvasDocument, qual_name};

pub enum AppendTextErr {
    /// The node is not a text node
    NotTextNode,
}

/// Batched mutation API over a [`CanvasDocument`].
///
/// Both the HTML parser and the editor core go through this type rather
/// than touching nodes directly, so id-map upkeep and style attribute
/// re-parsing happen in one place.
pub struct DocumentMutator<'doc> {
    /// Document is public as an escape hatch, but users of this API should ideally avoid using it
    /// and prefer exposing additional functionality in DocumentMutator.
    pub doc: &'doc mut CanvasDocument,
}

impl DocumentMutator<'_> {
    pub fn new<'doc>(doc: &'doc mut CanvasDocument) -> DocumentMutator<'doc> {
        DocumentMutator { doc }
    }

    pub fn node_has_parent(&self, node_id: usize) -> bool {
        self.doc.get_node(node_id).is_some_and(|n| n.parent.is_some())
    }

    pub fn previous_sibling_id(&self, node_id: usize) -> Option<usize> {
        let parent_id = self.doc.get_node(node_id)?.parent?;
        let children = &self.doc.get_node(parent_id)?.children;
        let index = children.iter().position(|id| *id == node_id)?;
        index.checked_sub(1).map(|i| children[i])
    }

    pub fn next_sibling_id(&self, node_id: usize) -> Option<usize> {
        let parent_id = self.doc.get_node(node_id)?.parent?;
        let children = &self.doc.get_node(parent_id)?.children;
        let index = children.iter().position(|id| *id == node_id)?;
        children.get(index + 1).copied()
    }

    pub fn last_child_id(&self, node_id: usize) -> Option<usize> {
        self.doc.get_node(node_id)?.children.last().copied()
    }

    pub fn element_name(&self, node_id: usize) -> Option<&QualName> {
        self.doc.get_node(node_id)?.element_data().map(|el| &el.name)
    }

    pub fn create_comment_node(&mut self, content: &str) -> usize {
        self.doc.create_node(NodeData::Comment(content.to_string()))
    }

    pub fn create_text_node(&mut self, text: &str) -> usize {
        self.doc.create_text_node(text)
    }

    pub fn create_element(&mut self, name: QualName, attrs: Vec<Attribute>) -> usize {
        let data = ElementData::new(name, attrs);
        let id = self.doc.create_node(NodeData::Element(data));

        // If the node has an "id" attribute, store it in the ID map.
        if let Some(id_attr) = self.doc.get_node(id).unwrap().attr(local_name!("id")) {
            let id_attr = id_attr.to_string();
            self.doc.nodes_to_id.insert(id_attr, id);
        }

        id
    }

    /// Remove all of the children from old_parent_id and append them to new_parent_id
    pub fn reparent_children(&mut self, old_parent_id: usize, new_parent_id: usize) {
        let child_ids = std::mem::take(&mut self.doc.get_node_mut(old_parent_id).unwrap().children);
        for child_id in &child_ids {
            self.doc.get_node_mut(*child_id).unwrap().parent = None;
        }
        self.append_children(new_parent_id, &child_ids);
    }

    pub fn append_children(&mut self, parent_id: usize, child_ids: &[usize]) {
        self.doc.append(parent_id, child_ids);
    }

    pub fn insert_nodes_before(&mut self, anchor_node_id: usize, new_node_ids: &[usize]) {
        self.doc.insert_before(anchor_node_id, new_node_ids);
    }

    pub fn insert_nodes_after(&mut self, anchor_node_id: usize, new_node_ids: &[usize]) {
        match self.next_sibling_id(anchor_node_id) {
            Some(sibling_id) => self.doc.insert_before(sibling_id, new_node_ids),
            None => {
                let parent_id = self
                    .doc
                    .get_node(anchor_node_id)
                    .and_then(|n| n.parent)
                    .expect("anchor has no parent");
                self.doc.append(parent_id, new_node_ids);
            }
        }
    }

    /// Replace a node with the given nodes, dropping the replaced subtree.
    pub fn replace_node_with(&mut self, anchor_node_id: usize, new_node_ids: &[usize]) {
        self.doc.insert_before(anchor_node_id, new_node_ids);
        self.doc.remove_and_drop_node(anchor_node_id);
    }

    /// Detach a node from its parent without dropping its subtree.
    pub fn remove_node(&mut self, node_id: usize) {
        self.doc.remove_node(node_id);
    }

    /// Detach a node and drop its entire subtree from the arena.
    pub fn remove_and_drop_node(&mut self, node_id: usize) {
        self.doc.remove_and_drop_node(node_id);
    }

    pub fn remove_node_if_unparented(&mut self, node_id: usize) {
        if let Some(node) = self.doc.get_node(node_id) {
            if node.parent.is_none() {
                self.doc.remove_and_drop_node(node_id);
            }
        }
    }

    pub fn append_text_to_node(&mut self, node_id: usize, text: &str) -> Result<(), AppendTextErr> {
        match self.doc.get_node_mut(node_id).unwrap().text_data_mut() {
            Some(data) => {
                data.content += text;
                Ok(())
            }
            None => Err(AppendTextErr::NotTextNode),
        }
    }

    pub fn set_node_text(&mut self, node_id: usize, value: &str) {
        let node = self.doc.get_node_mut(node_id).unwrap();
        let NodeData::Text(ref mut text) = node.data else {
            return;
        };
        if text.content != value {
            text.content.clear();
            text.content.push_str(value);
        }
    }

    /// Replace an element's children with a single text node holding the
    /// given content. This is what a committed text edit boils down to.
    pub fn set_element_text_content(&mut self, node_id: usize, value: &str) {
        let child_ids = std::mem::take(&mut self.doc.get_node_mut(node_id).unwrap().children);
        for child_id in child_ids {
            self.doc.get_node_mut(child_id).unwrap().parent = None;
            self.doc.remove_and_drop_node(child_id);
        }
        let text_id = self.create_text_node(value);
        self.append_children(node_id, &[text_id]);
    }

    pub fn add_attrs_if_missing(&mut self, node_id: usize, attrs: Vec<Attribute>) {
        let node = self.doc.get_node_mut(node_id).unwrap();
        let element_data = node.element_data_mut().expect("Not an element");

        let existing_names = element_data
            .attrs
            .iter()
            .map(|e| e.name.clone())
            .collect::<HashSet<_>>();

        for attr in attrs
            .into_iter()
            .filter(|attr| !existing_names.contains(&attr.name))
        {
            self.set_attribute(node_id, attr.name, &attr.value);
        }
    }

    pub fn set_attribute(&mut self, node_id: usize, name: QualName, value: &str) {
        let node = self.doc.get_node_mut(node_id).unwrap();
        let NodeData::Element(ref mut element) = node.data else {
            return;
        };

        let existing_attr = element.attrs.iter_mut().find(|a| a.name == name);
        if let Some(existing_attr) = existing_attr {
            existing_attr.value.clear();
            existing_attr.value.push_str(value);
        } else {
            element.attrs.push(Attribute {
                name: name.clone(),
                value: value.to_string(),
            });
        }

        if name.local == local_name!("style") {
            element.flush_style_attribute();
        }
        if name.local == local_name!("id") {
            element.id = Some(value.to_string());
            self.doc.nodes_to_id.insert(value.to_string(), node_id);
        }
    }

    pub fn clear_attribute(&mut self, node_id: usize, name: QualName) {
        let node = self.doc.get_node_mut(node_id).unwrap();
        let NodeData::Element(ref mut element) = node.data else {
            return;
        };

        element.attrs.retain(|attr| attr.name.local != name.local);

        if name.local == local_name!("style") {
            element.flush_style_attribute();
        }
        if name.local == local_name!("id") {
            if let Some(id_attr) = element.id.take() {
                self.doc.nodes_to_id.remove(&id_attr);
            }
        }
    }

    pub fn add_class(&mut self, node_id: usize, class: &str) {
        if let Some(el) = self
            .doc
            .get_node_mut(node_id)
            .and_then(|n| n.element_data_mut())
        {
            el.add_class(class);
        }
    }

    pub fn remove_class(&mut self, node_id: usize, class: &str) {
        if let Some(el) = self
            .doc
            .get_node_mut(node_id)
            .and_then(|n| n.element_data_mut())
        {
            el.remove_class(class);
        }
    }

    pub fn set_style_property(&mut self, node_id: usize, property: &str, value: &str) {
        if let Some(el) = self
            .doc
            .get_node_mut(node_id)
            .and_then(|n| n.element_data_mut())
        {
            el.set_style_property(property, value);
        }
    }

    /// Wrap a node in a new element, which takes the node's place in the
    /// tree. Returns the wrapper's id.
    pub fn wrap_node(&mut self, node_id: usize, name: QualName, attrs: Vec<Attribute>) -> usize {
        let wrapper_id = self.create_element(name, attrs);
        self.doc.insert_before(node_id, &[wrapper_id]);
        self.doc.append(wrapper_id, &[node_id]);
        wrapper_id
    }
}

impl DocumentMutator<'_> {
    /// Create a `<div>` wrapper. Used when converting a bare link target.
    pub fn create_div(&mut self) -> usize {
        self.create_element(qual_name!("div", html), vec![])
    }
}
