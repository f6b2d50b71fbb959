//! Selection tracking.
//!
//! Translates hit-test results into hovered/selected element state and
//! keeps the selected element's host-page bounding box current across
//! scroll and resize. Elements are tracked by arena id, re-validated
//! against the document on every use; a sandbox reload invalidates all ids
//! and must clear the tracker.

use maildraft_dom::{CanvasDocument, SelectionKind, local_name};
use maildraft_traits::geometry::HostRect;

pub struct SelectionTracker {
    hover_class: String,
    selected_class: String,
    hovered: Option<usize>,
    selected: Option<usize>,
    kind: SelectionKind,
    bounds: Option<HostRect>,
    /// Bumped on every selection change and every reload. Async actions
    /// capture the current value and discard their result if it has moved.
    generation: u64,
}

impl SelectionTracker {
    pub fn new(hover_class: &str, selected_class: &str) -> Self {
        Self {
            hover_class: hover_class.to_string(),
            selected_class: selected_class.to_string(),
            hovered: None,
            selected: None,
            kind: SelectionKind::Unknown,
            bounds: None,
            generation: 0,
        }
    }

    pub fn selected_node(&self) -> Option<usize> {
        self.selected
    }

    pub fn hovered_node(&self) -> Option<usize> {
        self.hovered
    }

    /// Kind of the current selection, recomputed on every selection
    /// change. [`SelectionKind::Unknown`] when nothing is selected.
    pub fn kind(&self) -> SelectionKind {
        self.kind
    }

    /// Host-page bounds of the selection. None whenever nothing is
    /// selected.
    pub fn bounds(&self) -> Option<HostRect> {
        self.bounds
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a node is background as far as selection is concerned: the
    /// document itself, `<html>` or `<body>`. Clicking background clears
    /// the selection instead of creating one.
    pub fn is_background(doc: &CanvasDocument, node_id: usize) -> bool {
        let Some(node) = doc.get_node(node_id) else {
            return true;
        };
        if !node.is_element() {
            return true;
        }
        node.data.is_element_with_tag_name(&local_name!("html"))
            || node.data.is_element_with_tag_name(&local_name!("body"))
    }

    /// Pointer moved over a node (or off the document entirely). The
    /// selected element never gets a hover outline on top of its selected
    /// one.
    pub fn hover(&mut self, doc: &mut CanvasDocument, target: Option<usize>) {
        let target = target
            .filter(|id| !Self::is_background(doc, *id))
            .filter(|id| Some(*id) != self.selected);

        if target == self.hovered {
            return;
        }
        if let Some(old) = self.hovered.take() {
            remove_class(doc, old, &self.hover_class);
        }
        if let Some(id) = target {
            add_class(doc, id, &self.hover_class);
            self.hovered = Some(id);
        }
    }

    /// Select a node, clearing any previous selection's outline first so
    /// at most one element ever carries the selected class. Background
    /// targets clear the selection instead.
    pub fn select(&mut self, doc: &mut CanvasDocument, node_id: usize) {
        if Self::is_background(doc, node_id) {
            self.clear(doc);
            return;
        }
        if self.selected == Some(node_id) {
            return;
        }

        if let Some(old) = self.hovered.take() {
            remove_class(doc, old, &self.hover_class);
        }
        if let Some(old) = self.selected.take() {
            remove_class(doc, old, &self.selected_class);
        }

        add_class(doc, node_id, &self.selected_class);
        self.selected = Some(node_id);
        self.kind = SelectionKind::classify(doc, node_id);
        self.bounds = doc.host_bounds(node_id);
        self.generation += 1;
        #[cfg(feature = "tracing")]
        tracing::debug!(node_id, kind = ?self.kind, "selected");
    }

    /// Drop selection and hover state, removing outline classes.
    pub fn clear(&mut self, doc: &mut CanvasDocument) {
        if let Some(old) = self.hovered.take() {
            remove_class(doc, old, &self.hover_class);
        }
        if let Some(old) = self.selected.take() {
            remove_class(doc, old, &self.selected_class);
        }
        self.kind = SelectionKind::Unknown;
        self.bounds = None;
        self.generation += 1;
    }

    /// Forget all state without touching the document. For reloads, where
    /// the old arena (and its ids) no longer exists.
    pub fn reset(&mut self) {
        self.hovered = None;
        self.selected = None;
        self.kind = SelectionKind::Unknown;
        self.bounds = None;
        self.generation += 1;
    }

    /// The selected element's box must track the element across scroll and
    /// resize, not a stale snapshot.
    pub fn refresh_bounds(&mut self, doc: &CanvasDocument) {
        if let Some(id) = self.selected {
            self.bounds = doc.host_bounds(id);
        }
    }

    /// Re-apply outline classes. Serialization strips classes tree-wide;
    /// the active selection and hover get their outlines back afterwards
    /// so the tracker's state and the DOM stay in step.
    pub fn reapply_outline(&self, doc: &mut CanvasDocument) {
        if let Some(id) = self.selected {
            add_class(doc, id, &self.selected_class);
        }
        if let Some(id) = self.hovered {
            add_class(doc, id, &self.hover_class);
        }
    }
}

fn add_class(doc: &mut CanvasDocument, node_id: usize, class: &str) {
    if let Some(el) = doc.get_node_mut(node_id).and_then(|n| n.element_data_mut()) {
        el.add_class(class);
    }
}

fn remove_class(doc: &mut CanvasDocument, node_id: usize, class: &str) {
    if let Some(el) = doc.get_node_mut(node_id).and_then(|n| n.element_data_mut()) {
        el.remove_class(class);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maildraft_html::parse_document;

    fn setup() -> (CanvasDocument, usize, usize, SelectionTracker) {
        let doc = parse_document(
            "<!DOCTYPE html><html><body><p>one</p><p>two</p></body></html>",
        );
        let body = doc.body().unwrap();
        let children = &doc.get_node(body).unwrap().children;
        let (a, b) = (children[0], children[1]);
        let tracker = SelectionTracker::new("hover-outline", "selected-outline");
        (doc, a, b, tracker)
    }

    fn has_class(doc: &CanvasDocument, id: usize, class: &str) -> bool {
        doc.get_node(id)
            .and_then(|n| n.element_data())
            .is_some_and(|el| el.has_class(class))
    }

    #[test]
    fn hover_applies_and_removes_outline() {
        let (mut doc, a, b, mut tracker) = setup();
        tracker.hover(&mut doc, Some(a));
        assert!(has_class(&doc, a, "hover-outline"));

        tracker.hover(&mut doc, Some(b));
        assert!(!has_class(&doc, a, "hover-outline"));
        assert!(has_class(&doc, b, "hover-outline"));

        tracker.hover(&mut doc, None);
        assert!(!has_class(&doc, b, "hover-outline"));
        assert_eq!(tracker.hovered_node(), None);
    }

    #[test]
    fn selected_element_never_carries_hover_outline() {
        let (mut doc, a, _, mut tracker) = setup();
        tracker.select(&mut doc, a);
        tracker.hover(&mut doc, Some(a));
        assert!(!has_class(&doc, a, "hover-outline"));
        assert!(has_class(&doc, a, "selected-outline"));
    }

    #[test]
    fn selecting_a_new_element_clears_the_previous_outline() {
        let (mut doc, a, b, mut tracker) = setup();
        tracker.select(&mut doc, a);
        tracker.select(&mut doc, b);

        assert!(!has_class(&doc, a, "selected-outline"));
        assert!(has_class(&doc, b, "selected-outline"));
        assert_eq!(tracker.selected_node(), Some(b));
    }

    #[test]
    fn background_click_clears_selection() {
        let (mut doc, a, _, mut tracker) = setup();
        tracker.select(&mut doc, a);
        let body = doc.body().unwrap();
        tracker.select(&mut doc, body);

        assert_eq!(tracker.selected_node(), None);
        assert_eq!(tracker.bounds(), None);
        assert!(!has_class(&doc, a, "selected-outline"));
    }

    #[test]
    fn reapply_restores_both_outlines_after_stripping() {
        let (mut doc, a, b, mut tracker) = setup();
        tracker.select(&mut doc, a);
        tracker.hover(&mut doc, Some(b));

        doc.strip_editor_artifacts(&["hover-outline", "selected-outline"]);
        assert!(!has_class(&doc, b, "hover-outline"));

        tracker.reapply_outline(&mut doc);
        assert!(has_class(&doc, a, "selected-outline"));
        assert!(has_class(&doc, b, "hover-outline"));
        assert_eq!(tracker.hovered_node(), Some(b));
    }

    #[test]
    fn generation_moves_on_every_selection_change() {
        let (mut doc, a, b, mut tracker) = setup();
        let g0 = tracker.generation();
        tracker.select(&mut doc, a);
        let g1 = tracker.generation();
        tracker.select(&mut doc, b);
        let g2 = tracker.generation();
        tracker.clear(&mut doc);
        let g3 = tracker.generation();
        assert!(g0 < g1 && g1 < g2 && g2 < g3);
    }
}
