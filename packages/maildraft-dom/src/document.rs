use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use markup5ever::{LocalName, local_name};
use slab::Slab;

use crate::node::{Attribute, ElementData, Node, NodeData, TextData};
use crate::{DocumentMutator, qual_name};
use maildraft_traits::events::HitResult;
use maildraft_traits::geometry::{FrameMetrics, FramePoint, FrameRect};

/// Attribute marking the editor-only `<style>` block injected after every
/// load. Anything carrying it is stripped before markup is read back out.
pub const EDITOR_STYLE_MARKER: &str = "data-maildraft-editor";

/// The live DOM tree: a slab-backed arena of [`Node`]s plus the document
/// level bookkeeping the editor needs (id map, frame metrics, doctype).
///
/// The document node always occupies arena index 0.
pub struct CanvasDocument {
    /// ID of the document (unique per live editor session)
    id: usize,

    /// A slab-backed tree of nodes
    nodes: Box<Slab<Node>>,

    /// Map of `id` attribute values to node ids for fast lookups
    pub(crate) nodes_to_id: HashMap<String, usize>,

    /// Where the frame showing this document sits on the host page
    metrics: FrameMetrics,
}

impl CanvasDocument {
    /// Create a new (empty) document containing only the root node.
    pub fn new() -> Self {
        static ID_GENERATOR: AtomicUsize = AtomicUsize::new(1);
        let id = ID_GENERATOR.fetch_add(1, Ordering::SeqCst);

        let mut nodes = Box::new(Slab::new());
        let root_id = nodes.insert(Node::new(0, NodeData::Document));
        debug_assert_eq!(root_id, 0);

        Self {
            id,
            nodes,
            nodes_to_id: HashMap::new(),
            metrics: FrameMetrics::default(),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn mutate(&mut self) -> DocumentMutator<'_> {
        DocumentMutator::new(self)
    }

    pub fn metrics(&self) -> FrameMetrics {
        self.metrics
    }

    pub fn set_metrics(&mut self, metrics: FrameMetrics) {
        self.metrics = metrics;
    }

    pub(crate) fn create_node(&mut self, data: NodeData) -> usize {
        let entry = self.nodes.vacant_entry();
        let id = entry.key();
        entry.insert(Node::new(id, data));
        id
    }

    pub(crate) fn create_text_node(&mut self, content: &str) -> usize {
        self.create_node(NodeData::Text(TextData::new(content.to_string())))
    }

    pub fn get_node(&self, node_id: usize) -> Option<&Node> {
        self.nodes.get(node_id)
    }

    pub fn get_node_mut(&mut self, node_id: usize) -> Option<&mut Node> {
        self.nodes.get_mut(node_id)
    }

    /// Find the node whose `id` attribute is the given string.
    pub fn node_by_id_attr(&self, id_attr: &str) -> Option<&Node> {
        self.nodes_to_id.get(id_attr).and_then(|id| self.get_node(*id))
    }

    pub fn root(&self) -> &Node {
        &self.nodes[0]
    }

    /// The `<html>` element, if the document has one.
    pub fn html_element(&self) -> Option<usize> {
        self.element_child(0, local_name!("html"))
    }

    pub fn head(&self) -> Option<usize> {
        self.element_child(self.html_element()?, local_name!("head"))
    }

    pub fn body(&self) -> Option<usize> {
        self.element_child(self.html_element()?, local_name!("body"))
    }

    fn element_child(&self, parent_id: usize, tag: LocalName) -> Option<usize> {
        self.nodes[parent_id]
            .children
            .iter()
            .copied()
            .find(|id| self.nodes[*id].data.is_element_with_tag_name(&tag))
    }

    /// The chain of node ids from the given node up to (and including) the
    /// document root.
    pub fn node_chain(&self, node_id: usize) -> Vec<usize> {
        let mut chain = vec![node_id];
        let mut current = self.nodes[node_id].parent;
        while let Some(id) = current {
            chain.push(id);
            current = self.nodes[id].parent;
        }
        chain
    }

    pub(crate) fn append(&mut self, parent_id: usize, child_ids: &[usize]) {
        for child_id in child_ids.iter().copied() {
            self.remove_node(child_id);
            self.nodes[parent_id].children.push(child_id);
            self.nodes[child_id].parent = Some(parent_id);
        }
    }

    pub(crate) fn insert_before(&mut self, anchor_id: usize, new_ids: &[usize]) {
        let parent_id = self.nodes[anchor_id]
            .parent
            .expect("insert_before called on a node without a parent");
        for new_id in new_ids.iter().copied() {
            self.remove_node(new_id);
        }
        let anchor_index = self.nodes[parent_id]
            .children
            .iter()
            .position(|id| *id == anchor_id)
            .expect("anchor is not a child of its parent");
        for (offset, new_id) in new_ids.iter().copied().enumerate() {
            self.nodes[parent_id]
                .children
                .insert(anchor_index + offset, new_id);
            self.nodes[new_id].parent = Some(parent_id);
        }
    }

    /// Detach a node from its parent, keeping its subtree alive in the
    /// arena. The HTML parser relies on this during adoption.
    pub(crate) fn remove_node(&mut self, node_id: usize) {
        if let Some(parent_id) = self.nodes[node_id].parent.take() {
            self.nodes[parent_id].children.retain(|id| *id != node_id);
        }
    }

    /// Detach a node from its parent and drop its entire subtree from the
    /// arena. Ids within the subtree become invalid.
    pub(crate) fn remove_and_drop_node(&mut self, node_id: usize) {
        self.remove_node(node_id);
        let mut stack = vec![node_id];
        while let Some(id) = stack.pop() {
            let node = self.nodes.remove(id);
            if let NodeData::Element(ref el) = node.data {
                if let Some(id_attr) = &el.id {
                    self.nodes_to_id.remove(id_attr);
                }
            }
            stack.extend(node.children);
        }
    }

    /// The concatenated text content of a node's subtree.
    pub fn text_content(&self, node_id: usize) -> String {
        let mut out = String::new();
        self.write_text_content(node_id, &mut out);
        out
    }

    fn write_text_content(&self, node_id: usize, out: &mut String) {
        match &self.nodes[node_id].data {
            NodeData::Text(data) => out.push_str(&data.content),
            NodeData::Element(_) | NodeData::Document => {
                for child_id in self.nodes[node_id].children.iter() {
                    self.write_text_content(*child_id, out);
                }
            }
            NodeData::Comment(_) => {}
        }
    }

    /// Record the rendered border-box of a node, as reported by the
    /// embedding shell, in frame-document coordinates.
    pub fn set_node_layout(&mut self, node_id: usize, rect: FrameRect) {
        if let Some(node) = self.nodes.get_mut(node_id) {
            node.layout = rect;
        }
    }

    /// Hit-test a point (in frame-document coordinates) against the tree,
    /// returning the deepest element containing it. Later siblings win,
    /// approximating paint order.
    pub fn hit(&self, x: f32, y: f32) -> Option<HitResult> {
        self.hit_node(0, x, y)
    }

    fn hit_node(&self, node_id: usize, x: f32, y: f32) -> Option<HitResult> {
        let node = self.nodes.get(node_id)?;
        match node.data {
            NodeData::Document | NodeData::Element(_) => {}
            _ => return None,
        }

        let sized = node.layout.size.width > 0.0 && node.layout.size.height > 0.0;
        if sized && !node.layout.contains(FramePoint::new(x, y)) {
            return None;
        }

        let child_hit = node
            .children
            .iter()
            .rev()
            .find_map(|child_id| self.hit_node(*child_id, x, y));

        child_hit.or_else(|| {
            if sized && node.is_element() {
                Some(HitResult {
                    node_id,
                    x: x - node.layout.origin.x,
                    y: y - node.layout.origin.y,
                })
            } else {
                None
            }
        })
    }

    /// A node's border-box mapped into host-page coordinates, for overlay
    /// positioning. Recomputed from the current layout and frame metrics
    /// on every call, so scroll/resize handlers just call it again.
    pub fn host_bounds(&self, node_id: usize) -> Option<maildraft_traits::geometry::HostRect> {
        let node = self.get_node(node_id)?;
        Some(self.metrics.to_host(node.layout))
    }

    /// Guarantee the email scaffold: `<html>` with `<head>` and `<body>`,
    /// and charset/viewport meta tags in the head. Exported documents must
    /// always be complete, directly mailable payloads, never fragments.
    pub fn ensure_email_scaffold(&mut self) {
        let html_id = match self.html_element() {
            Some(id) => id,
            None => {
                let id = self.create_element_node(qual_name!("html", html), vec![]);
                self.append(0, &[id]);
                id
            }
        };

        let head_id = match self.element_child(html_id, local_name!("head")) {
            Some(id) => id,
            None => {
                let id = self.create_element_node(qual_name!("head", html), vec![]);
                let first_child = self.nodes[html_id].children.first().copied();
                match first_child {
                    Some(anchor) => self.insert_before(anchor, &[id]),
                    None => self.append(html_id, &[id]),
                }
                id
            }
        };

        if self.element_child(html_id, local_name!("body")).is_none() {
            let id = self.create_element_node(qual_name!("body", html), vec![]);
            self.append(html_id, &[id]);
        }

        let has_charset = self.nodes[head_id].children.iter().any(|id| {
            let node = &self.nodes[*id];
            node.data.is_element_with_tag_name(&local_name!("meta"))
                && node.attr(local_name!("charset")).is_some()
        });
        if !has_charset {
            let meta = self.create_element_node(
                qual_name!("meta", html),
                vec![Attribute {
                    name: qual_name!("charset"),
                    value: "utf-8".to_string(),
                }],
            );
            let first_child = self.nodes[head_id].children.first().copied();
            match first_child {
                Some(anchor) => self.insert_before(anchor, &[meta]),
                None => self.append(head_id, &[meta]),
            }
        }

        let has_viewport = self.nodes[head_id].children.iter().any(|id| {
            let node = &self.nodes[*id];
            node.data.is_element_with_tag_name(&local_name!("meta"))
                && node.attr(local_name!("name")) == Some("viewport")
        });
        if !has_viewport {
            let meta = self.create_element_node(
                qual_name!("meta", html),
                vec![
                    Attribute {
                        name: qual_name!("name"),
                        value: "viewport".to_string(),
                    },
                    Attribute {
                        name: qual_name!("content"),
                        value: "width=device-width, initial-scale=1.0".to_string(),
                    },
                ],
            );
            self.append(head_id, &[meta]);
        }
    }

    fn create_element_node(
        &mut self,
        name: markup5ever::QualName,
        attrs: Vec<Attribute>,
    ) -> usize {
        self.create_node(NodeData::Element(ElementData::new(name, attrs)))
    }

    /// Remove every editor-only affordance from the entire tree: outline
    /// classes, contenteditable markers left behind by rapid interactions,
    /// and the injected editor style block.
    pub fn strip_editor_artifacts(&mut self, classes: &[&str]) {
        let node_ids: Vec<usize> = self.nodes.iter().map(|(id, _)| id).collect();
        let mut to_remove = Vec::new();

        for node_id in node_ids {
            let Some(node) = self.nodes.get_mut(node_id) else {
                continue;
            };
            let Some(el) = node.element_data_mut() else {
                continue;
            };

            if el.attr(LocalName::from(EDITOR_STYLE_MARKER)).is_some() {
                to_remove.push(node_id);
                continue;
            }

            for class in classes {
                el.remove_class(class);
            }
            el.attrs
                .retain(|attr| attr.name.local != local_name!("contenteditable"));
        }

        for node_id in to_remove {
            self.remove_and_drop_node(node_id);
        }
    }
}

impl Default for CanvasDocument {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use euclid::{Point2D, Rect, Size2D};

    fn rect(x: f32, y: f32, w: f32, h: f32) -> FrameRect {
        Rect::new(Point2D::new(x, y), Size2D::new(w, h))
    }

    fn build_doc() -> (CanvasDocument, usize, usize) {
        let mut doc = CanvasDocument::new();
        doc.ensure_email_scaffold();
        let body = doc.body().unwrap();
        let (outer, inner) = {
            let mut mutr = doc.mutate();
            let outer = mutr.create_element(qual_name!("div", html), vec![]);
            let inner = mutr.create_element(qual_name!("p", html), vec![]);
            let text = mutr.create_text_node("hello");
            mutr.append_children(outer, &[inner]);
            mutr.append_children(inner, &[text]);
            mutr.append_children(body, &[outer]);
            (outer, inner)
        };
        doc.set_node_layout(body, rect(0.0, 0.0, 800.0, 600.0));
        doc.set_node_layout(outer, rect(10.0, 10.0, 300.0, 100.0));
        doc.set_node_layout(inner, rect(20.0, 20.0, 200.0, 40.0));
        (doc, outer, inner)
    }

    #[test]
    fn hit_returns_deepest_sized_element() {
        let (doc, outer, inner) = build_doc();
        assert_eq!(doc.hit(25.0, 25.0).unwrap().node_id, inner);
        assert_eq!(doc.hit(15.0, 80.0).unwrap().node_id, outer);
        assert!(doc.hit(5000.0, 5000.0).is_none());
    }

    #[test]
    fn scaffold_is_idempotent() {
        let mut doc = CanvasDocument::new();
        doc.ensure_email_scaffold();
        let head = doc.head().unwrap();
        let meta_count = doc.get_node(head).unwrap().children.len();
        doc.ensure_email_scaffold();
        assert_eq!(doc.get_node(head).unwrap().children.len(), meta_count);
    }

    #[test]
    fn remove_node_drops_subtree_and_id_entries() {
        let (mut doc, outer, inner) = build_doc();
        {
            let mut mutr = doc.mutate();
            mutr.set_attribute(inner, qual_name!("id"), "para");
        }
        assert!(doc.node_by_id_attr("para").is_some());
        doc.remove_and_drop_node(outer);
        assert!(doc.get_node(inner).is_none());
        assert!(doc.node_by_id_attr("para").is_none());
    }

    #[test]
    fn text_content_concatenates_subtree() {
        let (doc, outer, _) = build_doc();
        assert_eq!(doc.text_content(outer), "hello");
    }
}
