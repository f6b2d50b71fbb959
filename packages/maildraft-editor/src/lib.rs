//! The maildraft editing core.
//!
//! [`EmailEditor`] wires the frame sandbox, selection tracker, edit
//! session and code/preview coordinator into one direct-manipulation
//! engine. The embedding shell feeds it raw UI events and element
//! geometry, renders the document it holds, and fulfils network-backed
//! actions (AI, persistence, uploads) through `maildraft-net`.

mod driver;
mod edit;
mod menu;
mod sandbox;
mod selection;
mod sync;

pub use edit::{EditError, EditSession};
pub use menu::{MenuAction, actions_for, anchor_position, current_link};
pub use sandbox::FrameSandbox;
pub use selection::SelectionTracker;
pub use sync::{Coordinator, SuppressionGuard};

use std::sync::Arc;
use std::time::{Duration, Instant};

use maildraft_dom::{CanvasDocument, SelectionKind};
use maildraft_traits::geometry::HostRect;
use maildraft_traits::shell::{DummyShellProvider, ShellProvider, Toast};

/// The starter document a fresh session opens with.
pub const DEFAULT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
</head>
<body style="margin: 0; background-color: #f4f4f7; font-family: Arial, Helvetica, sans-serif">
<div style="max-width: 600px; margin: 0 auto; background-color: #ffffff; padding: 32px">
<h1 style="color: #111827">Welcome aboard</h1>
<p style="color: #374151; line-height: 1.6">Thanks for signing up. Click any element in the preview to edit it, or use the code pane to work on the markup directly.</p>
<a href="https://example.com" style="display: inline-block; padding: 12px 24px; background-color: #2563eb; color: #ffffff; text-decoration: none; border-radius: 6px">Get started</a>
</div>
</body>
</html>
"#;

/// Construction-time knobs for an editor instance.
#[derive(Debug, Clone)]
pub struct EditorConfig {
    /// Quiet period before a free-text edit becomes authoritative.
    pub debounce: Duration,
    /// Class applied to the hovered element.
    pub hover_class: String,
    /// Class applied to the selected element.
    pub selected_class: String,
    /// Markup the session opens with. Defaults to [`DEFAULT_TEMPLATE`].
    pub initial_html: Option<String>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_secs(1),
            hover_class: "hover-outline".to_string(),
            selected_class: "selected-outline".to_string(),
            initial_html: None,
        }
    }
}

/// Kinds of network-backed action, for the one-outstanding-request-per-
/// kind latch. The triggering control stays disabled until the request
/// settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsyncActionKind {
    AiText,
    AiImage,
    Convert,
    Upload,
    Persist,
}

const ASYNC_ACTION_KINDS: usize = 5;

impl AsyncActionKind {
    fn index(self) -> usize {
        match self {
            Self::AiText => 0,
            Self::AiImage => 1,
            Self::Convert => 2,
            Self::Upload => 3,
            Self::Persist => 4,
        }
    }
}

/// The root editor object: owns the authoritative document string and the
/// live canvas, and routes every edit between them.
pub struct EmailEditor {
    pub(crate) config: EditorConfig,
    pub(crate) sandbox: FrameSandbox,
    pub(crate) selection: SelectionTracker,
    pub(crate) edit: EditSession,
    pub(crate) coordinator: Coordinator,
    pub(crate) shell: Arc<dyn ShellProvider>,
    busy: [bool; ASYNC_ACTION_KINDS],
}

impl EmailEditor {
    pub fn new(config: EditorConfig, shell: Arc<dyn ShellProvider>) -> Self {
        let initial = config
            .initial_html
            .clone()
            .unwrap_or_else(|| DEFAULT_TEMPLATE.to_string());

        let mut sandbox = FrameSandbox::new();
        sandbox.load(&initial);

        let selection = SelectionTracker::new(&config.hover_class, &config.selected_class);
        let coordinator = Coordinator::new(initial, config.debounce);

        Self {
            config,
            sandbox,
            selection,
            edit: EditSession::new(),
            coordinator,
            shell,
            busy: [false; ASYNC_ACTION_KINDS],
        }
    }

    pub fn with_default_shell(config: EditorConfig) -> Self {
        Self::new(config, Arc::new(DummyShellProvider))
    }

    // --- document access -------------------------------------------------

    /// The authoritative document string, i.e. the code pane's content.
    pub fn html(&self) -> &str {
        self.coordinator.html()
    }

    pub fn document(&self) -> &CanvasDocument {
        self.sandbox.document()
    }

    pub fn document_mut(&mut self) -> &mut CanvasDocument {
        self.sandbox.document_mut()
    }

    pub fn sandbox(&self) -> &FrameSandbox {
        &self.sandbox
    }

    /// Exportable markup of the live tree, stripped of all editor state.
    pub fn export_markup(&mut self) -> String {
        self.current_markup()
    }

    pub(crate) fn current_markup(&mut self) -> String {
        let classes = [
            self.config.hover_class.clone(),
            self.config.selected_class.clone(),
        ];
        let class_refs: Vec<&str> = classes.iter().map(String::as_str).collect();
        let markup = self.sandbox.read_current_markup(&class_refs);
        // serialization strips tree-wide; the live selection and hover keep
        // their outlines
        self.selection.reapply_outline(self.sandbox.document_mut());
        markup
    }

    // --- external string changes -----------------------------------------

    /// Apply an externally-originated document string: a committed text
    /// edit, a loaded template, an AI conversion result.
    ///
    /// Reloads wholesale so embedded scripts would re-run deterministically,
    /// unless the incoming string matches the live markup (echo
    /// suppression). A reload invalidates every node id; selection and any
    /// active edit session are dropped.
    pub fn apply_external_html(&mut self, incoming: &str) {
        let live = self.current_markup();
        if !self.coordinator.should_reload(incoming, &live) {
            #[cfg(feature = "tracing")]
            tracing::debug!("reload suppressed: incoming markup matches live document");
            return;
        }

        self.edit.cancel(self.sandbox.document_mut());
        self.sandbox.load(incoming);
        self.selection.reset();
        self.coordinator.commit_canvas_markup(incoming.to_string());
        self.shell.request_redraw();
    }

    /// Record a keystroke in the code pane. Committed after the debounce
    /// quiet period elapses, via [`tick`](Self::tick).
    pub fn stage_text_edit(&mut self, content: String, now: Instant) {
        self.coordinator.stage_text_edit(content, now);
    }

    /// Commit a staged text edit immediately ("apply now").
    pub fn apply_pending_now(&mut self) {
        if let Some(committed) = self.coordinator.apply_now() {
            let committed = committed.to_string();
            self.apply_external_html(&committed);
        }
    }

    /// Drive debounced work. The shell calls this from its tick; the next
    /// deadline is available from [`next_deadline`](Self::next_deadline).
    pub fn tick(&mut self, now: Instant) {
        if let Some(committed) = self.coordinator.poll(now) {
            let committed = committed.to_string();
            self.apply_external_html(&committed);
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.coordinator.poll_at()
    }

    /// Raise the echo-suppression flag for the lifetime of the returned
    /// guard. The shell holds it while pushing an editor-originated string
    /// into its code surface: the change event that write-back fires, and
    /// any reload racing it (an upload settling while an external document
    /// arrives), is dropped instead of tearing the canvas down. String
    /// comparison stays the primary guard; this covers the window where
    /// the strings have not converged yet.
    pub fn suppress(&self) -> SuppressionGuard {
        self.coordinator.suppress()
    }

    // --- canvas-originated changes ---------------------------------------

    /// Serialize the live tree and, if it differs from the authoritative
    /// string, commit it. Called after every structural canvas edit.
    pub fn sync_from_canvas(&mut self) {
        let markup = self.current_markup();
        if self.coordinator.commit_canvas_markup(markup) {
            self.shell.request_redraw();
        }
    }

    // --- selection -------------------------------------------------------

    pub fn selected_node(&self) -> Option<usize> {
        self.selection.selected_node()
    }

    pub fn selection_kind(&self) -> SelectionKind {
        self.selection.kind()
    }

    pub fn selection_bounds(&self) -> Option<HostRect> {
        self.selection.bounds()
    }

    /// Actions the contextual menu should offer right now.
    pub fn menu_actions(&self) -> &'static [MenuAction] {
        actions_for(self.selection.kind())
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear(self.sandbox.document_mut());
    }

    // --- edit session ----------------------------------------------------

    pub fn is_editing(&self) -> bool {
        self.edit.is_active()
    }

    /// Enter text-edit mode on the current selection. Image selections
    /// fail with [`EditError::NotEditable`]; the caller redirects those to
    /// file selection.
    pub fn begin_edit(&mut self) -> Result<(), EditError> {
        let selected = self.selection.selected_node();
        let kind = self.selection.kind();
        self.edit.begin(self.sandbox.document_mut(), selected, kind)
    }

    /// Commit the active edit session and reserialize.
    pub fn commit_edit(&mut self) {
        if self.edit.commit(self.sandbox.document_mut()).is_some() {
            self.sync_from_canvas();
        }
    }

    pub fn cancel_edit(&mut self) {
        self.edit.cancel(self.sandbox.document_mut());
    }

    // --- contextual actions ----------------------------------------------

    /// Delete the selected element and its subtree.
    pub fn delete_selected(&mut self) {
        let Some(node_id) = self.selection.selected_node() else {
            return;
        };
        self.edit.cancel(self.sandbox.document_mut());
        self.selection.clear(self.sandbox.document_mut());
        self.sandbox.document_mut().mutate().remove_and_drop_node(node_id);
        self.sync_from_canvas();
    }

    /// The link governing the selection, if any.
    pub fn selection_link(&self) -> Option<String> {
        let node_id = self.selection.selected_node()?;
        menu::current_link(self.sandbox.document(), node_id)
    }

    /// Point the selection at a URL, wrapping it in an anchor if needed.
    pub fn set_selection_link(&mut self, url: &str) {
        let Some(node_id) = self.selection.selected_node() else {
            return;
        };
        if menu::set_link(self.sandbox.document_mut(), node_id, url).is_some() {
            self.sync_from_canvas();
        }
    }

    /// Swap the selected image's source.
    pub fn set_selection_image_url(&mut self, url: &str) {
        let Some(node_id) = self.selection.selected_node() else {
            return;
        };
        menu::set_image_url(self.sandbox.document_mut(), node_id, url);
        self.sync_from_canvas();
    }

    // --- AI action plumbing ----------------------------------------------

    /// Token identifying the current selection generation. Async actions
    /// capture it at launch; results are only applied while it still
    /// matches.
    pub fn selection_token(&self) -> u64 {
        self.selection.generation()
    }

    /// Text and context for an AI text action against the selection.
    /// Context names the element so prompts can reference it.
    pub fn ai_text_context(&self) -> Option<(String, String)> {
        let node_id = self.selection.selected_node()?;
        let doc = self.sandbox.document();
        let text = doc.text_content(node_id);
        let el = doc.get_node(node_id)?.element_data()?;
        let classes: Vec<&str> = el
            .classes()
            .filter(|c| *c != self.config.hover_class && *c != self.config.selected_class)
            .collect();
        let context = format!("Tag: {}, Classes: {}", el.name.local, classes.join(" "));
        Some((text, context))
    }

    /// Apply an AI text result, unless the selection has moved on since
    /// the request was launched.
    pub fn apply_ai_text(&mut self, token: u64, text: &str) -> bool {
        if token != self.selection.generation() {
            #[cfg(feature = "tracing")]
            tracing::debug!("discarding stale AI text result");
            return false;
        }
        let Some(node_id) = self.selection.selected_node() else {
            return false;
        };
        self.sandbox
            .document_mut()
            .mutate()
            .set_element_text_content(node_id, text);
        self.sync_from_canvas();
        true
    }

    /// Apply an AI-generated image URL to the selected image, unless the
    /// selection has moved on.
    pub fn apply_ai_image(&mut self, token: u64, url: &str) -> bool {
        if token != self.selection.generation() {
            #[cfg(feature = "tracing")]
            tracing::debug!("discarding stale AI image result");
            return false;
        }
        if self.selection.selected_node().is_none() {
            return false;
        }
        self.set_selection_image_url(url);
        true
    }

    // --- busy latch / notifications --------------------------------------

    /// Try to start a network-backed action. Returns false while one of
    /// the same kind is outstanding.
    pub fn try_begin_action(&mut self, kind: AsyncActionKind) -> bool {
        let slot = &mut self.busy[kind.index()];
        if *slot {
            return false;
        }
        *slot = true;
        true
    }

    /// Mark an action settled (success or failure) and re-enable its
    /// trigger.
    pub fn finish_action(&mut self, kind: AsyncActionKind) {
        self.busy[kind.index()] = false;
        self.shell.request_redraw();
    }

    pub fn is_action_busy(&self, kind: AsyncActionKind) -> bool {
        self.busy[kind.index()]
    }

    /// Surface an external-service failure as a toast. State is left
    /// unchanged; nothing here is fatal.
    pub fn notify_error(&self, message: impl Into<String>) {
        self.shell.notify(Toast::error(message));
    }

    pub fn notify_success(&self, message: impl Into<String>) {
        self.shell.notify(Toast::success(message));
    }
}
