//! Shared vocabulary for the maildraft engine: event types, typed geometry,
//! and the provider traits injected at the composition root.

pub mod events;
pub mod geometry;
pub mod net;
pub mod shell;

pub use events::{
    DomEvent, DomEventData, HitResult, KeyEvent, PointerButton, PointerEvent, UiEvent,
};
pub use geometry::{FrameMetrics, FramePoint, FrameRect, FrameSpace, HostPoint, HostRect,
    HostSpace};
pub use shell::{DummyShellProvider, ShellProvider, Toast, ToastLevel};
