use crate::geometry::FrameMetrics;
use keyboard_types::{Code, Key, Modifiers};

/// A raw input event fed into the engine by the embedding shell.
///
/// Pointer coordinates are in frame-document space: the shell translates
/// host-page pointer positions through [`FrameMetrics::to_frame`] before
/// dispatch. Scroll/resize events carry fresh metrics so that selection
/// bounds can be recomputed from the element, not a stale snapshot.
#[derive(Debug, Clone)]
pub enum UiEvent {
    PointerMove(PointerEvent),
    PointerDown(PointerEvent),
    PointerUp(PointerEvent),
    KeyDown(KeyEvent),
    KeyUp(KeyEvent),
    /// Host-page or frame-internal scroll.
    Scroll(FrameMetrics),
    /// Host window or frame resize.
    Resize(FrameMetrics),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerButton {
    #[default]
    Main,
    Auxiliary,
    Secondary,
}

#[derive(Debug, Clone)]
pub struct PointerEvent {
    /// x position within the frame document.
    pub x: f32,
    /// y position within the frame document.
    pub y: f32,
    pub button: PointerButton,
    pub mods: Modifiers,
}

#[derive(Debug, Clone)]
pub struct KeyEvent {
    pub key: Key,
    pub code: Code,
    pub mods: Modifiers,
    /// Text produced by the key, if any.
    pub text: Option<String>,
}

/// The result of hit-testing a point against the live tree.
#[derive(Debug, Clone, Copy)]
pub struct HitResult {
    /// The node id of the deepest node containing the point.
    pub node_id: usize,
    /// The x coordinate of the hit within the node's box.
    pub x: f32,
    /// The y coordinate of the hit within the node's box.
    pub y: f32,
}

/// An event retargeted at a specific DOM node.
#[derive(Debug, Clone)]
pub struct DomEvent {
    pub target: usize,
    /// Whether the default user agent action was prevented.
    pub default_prevented: bool,
    pub data: DomEventData,
}

impl DomEvent {
    pub fn new(target: usize, data: DomEventData) -> Self {
        Self {
            target,
            default_prevented: false,
            data,
        }
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Returns the name of the event ("click", "pointerenter", etc)
    pub fn name(&self) -> &'static str {
        self.data.name()
    }
}

#[derive(Debug, Clone)]
pub enum DomEventData {
    Click(PointerEvent),
    PointerEnter(PointerEvent),
    PointerLeave(PointerEvent),
    KeyDown(KeyEvent),
    Input { value: String },
}

impl DomEventData {
    pub fn name(&self) -> &'static str {
        match self {
            DomEventData::Click(_) => "click",
            DomEventData::PointerEnter(_) => "pointerenter",
            DomEventData::PointerLeave(_) => "pointerleave",
            DomEventData::KeyDown(_) => "keydown",
            DomEventData::Input { .. } => "input",
        }
    }
}
