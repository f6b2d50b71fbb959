//! The DOM layer of maildraft.
//!
//! This crate implements a headless, slab-backed DOM tree designed to be
//! embedded in and driven by external code: an HTML parser fills it (see
//! `maildraft-html`), an embedding shell reports element geometry into it,
//! and the editor core (`maildraft-editor`) mutates it through
//! [`DocumentMutator`] and reads it back out through [`serialize_document`].
//!
//! Nodes are addressed by arena index, never by reference. Indices are
//! only meaningful against the tree that issued them; a full reload
//! produces a fresh arena and invalidates all previously handed-out ids.

mod classify;
mod document;
mod mutator;
mod node;
mod serialize;
mod style;

pub use classify::SelectionKind;
pub use document::{CanvasDocument, EDITOR_STYLE_MARKER};
pub use markup5ever::{
    LocalName, Namespace, Prefix, QualName, local_name, namespace_url, ns,
};
pub use mutator::{AppendTextErr, DocumentMutator};
pub use node::{Attribute, ElementData, Node, NodeData, TextData};
pub use serialize::serialize_document;
pub use style::{
    Declaration, TYPOGRAPHY_PROPERTIES, is_inherited, parse_declarations, resolved_style,
    serialize_declarations, ua_default,
};

/// Creates a markup5ever::QualName.
/// Given a local name and an optional namespace
#[macro_export]
macro_rules! qual_name {
    ($local:tt $(, $ns:ident)?) => {
        $crate::QualName {
            prefix: None,
            ns: $crate::ns!($($ns)?),
            local: $crate::local_name!($local),
        }
    };
}
