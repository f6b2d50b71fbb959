//! DOM to markup serialization.
//!
//! Uses html5ever's serializer so void elements, attribute escaping and
//! raw-text elements (`<style>`, `<script>`) follow the HTML spec rather
//! than hand-rolled rules. The doctype is written up front: the arena does
//! not model doctype nodes, and exported email must never be quirks-mode.

use std::io;

use html5ever::serialize::{Serialize, SerializeOpts, Serializer, TraversalScope, serialize};

use crate::CanvasDocument;
use crate::node::NodeData;

struct SerializableNode<'doc> {
    doc: &'doc CanvasDocument,
    node_id: usize,
}

impl Serialize for SerializableNode<'_> {
    fn serialize<S: Serializer>(
        &self,
        serializer: &mut S,
        traversal_scope: TraversalScope,
    ) -> io::Result<()> {
        serialize_node(self.doc, self.node_id, serializer, traversal_scope)
    }
}

fn serialize_node<S: Serializer>(
    doc: &CanvasDocument,
    node_id: usize,
    serializer: &mut S,
    traversal_scope: TraversalScope,
) -> io::Result<()> {
    let Some(node) = doc.get_node(node_id) else {
        return Ok(());
    };

    match (&traversal_scope, &node.data) {
        (_, NodeData::Document) => {
            for child_id in &node.children {
                serialize_node(doc, *child_id, serializer, TraversalScope::IncludeNode)?;
            }
            Ok(())
        }
        (TraversalScope::IncludeNode, NodeData::Element(el)) => {
            serializer.start_elem(
                el.name.clone(),
                el.attrs.iter().map(|attr| (&attr.name, attr.value.as_str())),
            )?;
            for child_id in &node.children {
                serialize_node(doc, *child_id, serializer, TraversalScope::IncludeNode)?;
            }
            serializer.end_elem(el.name.clone())
        }
        (TraversalScope::ChildrenOnly(_), NodeData::Element(_)) => {
            for child_id in &node.children {
                serialize_node(doc, *child_id, serializer, TraversalScope::IncludeNode)?;
            }
            Ok(())
        }
        (TraversalScope::IncludeNode, NodeData::Text(data)) => {
            serializer.write_text(&data.content)
        }
        (TraversalScope::IncludeNode, NodeData::Comment(content)) => {
            serializer.write_comment(content)
        }
        (TraversalScope::ChildrenOnly(_), _) => Ok(()),
    }
}

/// Serialize the whole document to a complete HTML payload, doctype
/// included.
pub fn serialize_document(doc: &CanvasDocument) -> String {
    let mut buf: Vec<u8> = Vec::new();
    buf.extend_from_slice(b"<!DOCTYPE html>");

    let root = SerializableNode { doc, node_id: 0 };
    serialize(&mut buf, &root, SerializeOpts::default())
        .expect("writing to a Vec does not fail");

    String::from_utf8(buf).expect("serializer output is valid UTF-8")
}
