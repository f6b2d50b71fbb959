//! Raw UI event routing.
//!
//! The embedding shell forwards pointer, keyboard and scroll/resize
//! events; this module turns them into selection transitions, edit-session
//! keystrokes and bound refreshes. Pointer coordinates arrive in
//! frame-document space (the shell translates through the frame metrics
//! before dispatch).

use keyboard_types::Key;
use maildraft_traits::events::{KeyEvent, PointerButton, PointerEvent, UiEvent};

use crate::{EmailEditor, SelectionTracker};

impl EmailEditor {
    /// Route one raw UI event. Returns true if the event was consumed.
    pub fn handle_ui_event(&mut self, event: UiEvent) -> bool {
        match event {
            UiEvent::PointerMove(pointer) => self.pointer_move(pointer),
            UiEvent::PointerDown(_) => false,
            UiEvent::PointerUp(pointer) => self.click(pointer),
            UiEvent::KeyDown(key) => self.key_down(key),
            UiEvent::KeyUp(_) => false,
            UiEvent::Scroll(metrics) | UiEvent::Resize(metrics) => {
                self.sandbox.set_metrics(metrics);
                self.selection.refresh_bounds(self.sandbox.document());
                self.shell.request_redraw();
                true
            }
        }
    }

    fn pointer_move(&mut self, pointer: PointerEvent) -> bool {
        // hover tracking is suspended entirely during an edit session
        if self.edit.is_active() {
            return false;
        }
        let target = self
            .sandbox
            .document()
            .hit(pointer.x, pointer.y)
            .map(|hit| hit.node_id);
        self.selection
            .hover(self.sandbox.document_mut(), target);
        true
    }

    fn click(&mut self, pointer: PointerEvent) -> bool {
        if pointer.button != PointerButton::Main {
            return false;
        }

        let target = self
            .sandbox
            .document()
            .hit(pointer.x, pointer.y)
            .map(|hit| hit.node_id);

        if self.edit.is_active() {
            // Clicks are always swallowed while editing: inside the edited
            // element to let the caret land, outside to prevent accidental
            // navigation.
            return true;
        }

        match target {
            Some(node_id) if !SelectionTracker::is_background(self.sandbox.document(), node_id) => {
                self.selection.select(self.sandbox.document_mut(), node_id);
            }
            _ => self.selection.clear(self.sandbox.document_mut()),
        }
        self.shell.request_redraw();
        true
    }

    fn key_down(&mut self, key: KeyEvent) -> bool {
        if !self.edit.is_active() {
            return false;
        }
        match key.key {
            Key::Escape => self.commit_edit(),
            Key::Backspace => self.edit.backspace(self.sandbox.document_mut()),
            Key::Enter => self.edit.insert_line_break(self.sandbox.document_mut()),
            Key::Character(ref ch) => {
                self.edit.insert_text(self.sandbox.document_mut(), ch);
            }
            _ => {
                if let Some(text) = key.text.as_deref() {
                    self.edit.insert_text(self.sandbox.document_mut(), text);
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EditorConfig;
    use keyboard_types::{Code, Modifiers};

    fn pointer(x: f32, y: f32) -> PointerEvent {
        PointerEvent {
            x,
            y,
            button: PointerButton::Main,
            mods: Modifiers::empty(),
        }
    }

    fn key(k: Key) -> KeyEvent {
        KeyEvent {
            key: k,
            code: Code::Unidentified,
            mods: Modifiers::empty(),
            text: None,
        }
    }

    fn editor_with_layout() -> (crate::EmailEditor, usize) {
        let config = EditorConfig {
            initial_html: Some(
                "<!DOCTYPE html><html><body><p>Hello</p></body></html>".to_string(),
            ),
            ..Default::default()
        };
        let mut editor = crate::EmailEditor::with_default_shell(config);
        let body = editor.document().body().unwrap();
        let para = editor.document().get_node(body).unwrap().children[0];
        editor.document_mut().set_node_layout(
            body,
            euclid::Rect::new(euclid::Point2D::new(0.0, 0.0), euclid::Size2D::new(600.0, 400.0)),
        );
        editor.document_mut().set_node_layout(
            para,
            euclid::Rect::new(euclid::Point2D::new(10.0, 10.0), euclid::Size2D::new(200.0, 20.0)),
        );
        (editor, para)
    }

    #[test]
    fn click_selects_the_hit_element() {
        let (mut editor, para) = editor_with_layout();
        editor.handle_ui_event(UiEvent::PointerUp(pointer(20.0, 15.0)));
        assert_eq!(editor.selected_node(), Some(para));
    }

    #[test]
    fn background_click_clears() {
        let (mut editor, _) = editor_with_layout();
        editor.handle_ui_event(UiEvent::PointerUp(pointer(20.0, 15.0)));
        editor.handle_ui_event(UiEvent::PointerUp(pointer(400.0, 300.0)));
        assert_eq!(editor.selected_node(), None);
    }

    #[test]
    fn hover_is_suspended_and_clicks_swallowed_while_editing() {
        let (mut editor, para) = editor_with_layout();
        editor.handle_ui_event(UiEvent::PointerUp(pointer(20.0, 15.0)));
        editor.begin_edit().unwrap();

        editor.handle_ui_event(UiEvent::PointerMove(pointer(20.0, 15.0)));
        assert_eq!(editor.selection.hovered_node(), None);

        // a click outside the edited element is swallowed, selection stays
        assert!(editor.handle_ui_event(UiEvent::PointerUp(pointer(400.0, 300.0))));
        assert_eq!(editor.selected_node(), Some(para));
        assert!(editor.is_editing());
    }

    #[test]
    fn escape_commits_the_edit_session() {
        let (mut editor, para) = editor_with_layout();
        editor.handle_ui_event(UiEvent::PointerUp(pointer(20.0, 15.0)));
        editor.begin_edit().unwrap();
        editor.handle_ui_event(UiEvent::KeyDown(key(Key::Character("!".to_string()))));
        editor.handle_ui_event(UiEvent::KeyDown(key(Key::Escape)));

        assert!(!editor.is_editing());
        assert_eq!(editor.document().text_content(para), "Hello!");
        assert!(editor.html().contains("Hello!"));
    }
}
