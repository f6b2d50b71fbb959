use euclid::{Point2D, Rect, Size2D, Vector2D};

/// Coordinate space of the sandboxed frame's internal document.
pub struct FrameSpace;

/// Coordinate space of the host page that embeds the frame.
pub struct HostSpace;

pub type FramePoint = Point2D<f32, FrameSpace>;
pub type FrameRect = Rect<f32, FrameSpace>;
pub type HostPoint = Point2D<f32, HostSpace>;
pub type HostRect = Rect<f32, HostSpace>;

/// Where the sandboxed frame currently sits on the host page, and how far
/// its internal document is scrolled. Overlay positioning (selection
/// outlines, the contextual menu) needs both to map an element rectangle
/// into host-page coordinates.
///
/// The embedding shell refreshes this on every host scroll/resize and on
/// every scroll of the frame's internal document.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameMetrics {
    /// The frame's top-left corner in host-page coordinates.
    pub origin: HostPoint,
    /// The internal scroll offset of the frame's document.
    pub scroll: Vector2D<f32, FrameSpace>,
    /// The frame's visible size.
    pub size: Size2D<f32, FrameSpace>,
}

impl FrameMetrics {
    pub fn new(origin: HostPoint, size: Size2D<f32, FrameSpace>) -> Self {
        Self {
            origin,
            scroll: Vector2D::zero(),
            size,
        }
    }

    /// Map a rectangle in frame-document coordinates to host-page
    /// coordinates, compensating for the frame's internal scroll.
    pub fn to_host(&self, rect: FrameRect) -> HostRect {
        let visible = rect.translate(-self.scroll);
        HostRect::new(
            HostPoint::new(
                self.origin.x + visible.origin.x,
                self.origin.y + visible.origin.y,
            ),
            Size2D::new(rect.size.width, rect.size.height),
        )
    }

    /// Map a point in host-page coordinates into the frame's document.
    pub fn to_frame(&self, point: HostPoint) -> FramePoint {
        FramePoint::new(point.x - self.origin.x, point.y - self.origin.y) + self.scroll
    }
}
