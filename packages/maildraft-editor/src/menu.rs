//! The contextual action menu.
//!
//! Thin on its own: it consumes the selection tracker's output (kind and
//! host-page bounds) and exposes the per-kind action list plus the DOM
//! edits behind the non-AI actions (link editing, image source swap,
//! deletion). AI-backed actions are surfaced as menu items here and
//! fulfilled through `maildraft-net` by the embedding shell.

use maildraft_dom::{Attribute, CanvasDocument, SelectionKind, local_name, qual_name};
use maildraft_traits::geometry::{HostPoint, HostRect};

/// An action the menu can offer for the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    EditText,
    Rewrite,
    Translate,
    Shorter,
    Longer,
    ToneProfessional,
    ToneCasual,
    EditLink,
    SetImageUrl,
    GenerateImage,
    UploadImage,
    Delete,
}

/// The actions offered for a selection of the given kind.
pub fn actions_for(kind: SelectionKind) -> &'static [MenuAction] {
    use MenuAction::*;
    match kind {
        SelectionKind::Text => &[
            EditText,
            Rewrite,
            Translate,
            Shorter,
            Longer,
            ToneProfessional,
            ToneCasual,
            EditLink,
            Delete,
        ],
        SelectionKind::Button => &[EditText, EditLink, Delete],
        SelectionKind::Image => &[SetImageUrl, GenerateImage, UploadImage, EditLink, Delete],
        SelectionKind::Container => &[EditLink, Delete],
        SelectionKind::Unknown => &[],
    }
}

/// Where to anchor the menu: centered above the selection, clamped so it
/// never leaves the top of the host page.
pub fn anchor_position(bounds: HostRect) -> HostPoint {
    const MENU_CLEARANCE: f32 = 44.0;
    const TOP_MARGIN: f32 = 8.0;
    HostPoint::new(
        bounds.origin.x + bounds.size.width / 2.0,
        (bounds.origin.y - MENU_CLEARANCE).max(TOP_MARGIN),
    )
}

/// The link governing a node: its own `href` if it is an anchor, else its
/// parent's if that is an anchor.
pub fn current_link(doc: &CanvasDocument, node_id: usize) -> Option<String> {
    let node = doc.get_node(node_id)?;
    if let Some(el) = node.element_data() {
        if el.name.local == local_name!("a") {
            return el.attr(local_name!("href")).map(str::to_string);
        }
    }
    let parent = doc.get_node(node.parent?)?;
    let parent_el = parent.element_data()?;
    if parent_el.name.local == local_name!("a") {
        return parent_el.attr(local_name!("href")).map(str::to_string);
    }
    None
}

/// Point a node at a URL. Anchors (and children of anchors) get their
/// `href` updated in place; anything else is wrapped in a new anchor that
/// opens in a new tab. Returns the anchor's id.
pub fn set_link(doc: &mut CanvasDocument, node_id: usize, url: &str) -> Option<usize> {
    let node = doc.get_node(node_id)?;
    let is_anchor = node
        .element_data()
        .is_some_and(|el| el.name.local == local_name!("a"));
    let parent_anchor = node.parent.filter(|pid| {
        doc.get_node(*pid)
            .and_then(|p| p.element_data())
            .is_some_and(|el| el.name.local == local_name!("a"))
    });

    let mut mutr = doc.mutate();
    if is_anchor {
        mutr.set_attribute(node_id, qual_name!("href"), url);
        Some(node_id)
    } else if let Some(parent_id) = parent_anchor {
        mutr.set_attribute(parent_id, qual_name!("href"), url);
        Some(parent_id)
    } else {
        let anchor = mutr.wrap_node(
            node_id,
            qual_name!("a", html),
            vec![
                Attribute {
                    name: qual_name!("href"),
                    value: url.to_string(),
                },
                Attribute {
                    name: qual_name!("target"),
                    value: "_blank".to_string(),
                },
                Attribute {
                    name: qual_name!("rel"),
                    value: "noopener noreferrer".to_string(),
                },
            ],
        );
        Some(anchor)
    }
}

/// Swap an image selection's source.
pub fn set_image_url(doc: &mut CanvasDocument, node_id: usize, url: &str) {
    let is_img = doc
        .get_node(node_id)
        .and_then(|n| n.element_data())
        .is_some_and(|el| el.name.local == local_name!("img"));
    if is_img {
        doc.mutate().set_attribute(node_id, qual_name!("src"), url);
    }
}
