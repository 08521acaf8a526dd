//! Geometry engine: resize and move math, virtual ↔ screen scaling.
//!
//! Horizontal quantities (`x`, `width`) are stored in **virtual units** on a
//! fixed-width canvas so layouts stay proportional when the editor viewport
//! changes size. Vertical quantities (`y`, `height`) are plain pixels and are
//! never scaled.
//!
//! All functions here are pure: they take the rect captured at the start of
//! an interaction plus the cumulative pointer delta, and return the new rect.
//! Live sessions recompute from the start rect on every move, so rounding
//! never accumulates.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Width of the virtual canvas all stored horizontal units refer to.
pub const VIRTUAL_WIDTH: f32 = 1200.0;

// ─── Position & Size ─────────────────────────────────────────────────────

/// Top-left corner of a block. `x` is virtual, `y` is px.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Block extent. `width` is virtual, `height` is px.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// A measurement is usable only when both sides are finite and positive.
    pub fn is_degenerate(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
    }
}

// ─── Rect ────────────────────────────────────────────────────────────────

/// An axis-aligned rectangle in editor coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn from_parts(position: Position, size: Size) -> Self {
        Self::new(position.x, position.y, size.width, size.height)
    }

    /// Normalized rect spanned by two corner points (any drag direction).
    pub fn from_points(a: Point, b: Point) -> Self {
        let r = kurbo::Rect::from_points(a, b);
        Self::new(r.x0 as f32, r.y0 as f32, r.width() as f32, r.height() as f32)
    }

    pub fn position(&self) -> Position {
        Position::new(self.left, self.top)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    pub fn to_kurbo(&self) -> kurbo::Rect {
        kurbo::Rect::new(
            self.left as f64,
            self.top as f64,
            self.right() as f64,
            self.bottom() as f64,
        )
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        self.to_kurbo().contains(Point::new(x as f64, y as f64))
    }

    /// True when `other` lies entirely inside `self` (edges inclusive).
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.left >= self.left
            && other.top >= self.top
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        !self.to_kurbo().intersect(other.to_kurbo()).is_zero_area()
    }
}

// ─── Resize handles ──────────────────────────────────────────────────────

/// One of the eight drag handles around a selected block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeHandle {
    N,
    S,
    E,
    W,
    Ne,
    Nw,
    Se,
    Sw,
}

impl ResizeHandle {
    pub const ALL: [ResizeHandle; 8] = [
        Self::N,
        Self::S,
        Self::E,
        Self::W,
        Self::Ne,
        Self::Nw,
        Self::Se,
        Self::Sw,
    ];

    /// Parse the handle name used by the DOM (`"n"`, `"se"`, ...).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "n" => Some(Self::N),
            "s" => Some(Self::S),
            "e" => Some(Self::E),
            "w" => Some(Self::W),
            "ne" => Some(Self::Ne),
            "nw" => Some(Self::Nw),
            "se" => Some(Self::Se),
            "sw" => Some(Self::Sw),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::N => "n",
            Self::S => "s",
            Self::E => "e",
            Self::W => "w",
            Self::Ne => "ne",
            Self::Nw => "nw",
            Self::Se => "se",
            Self::Sw => "sw",
        }
    }

    pub fn moves_north(&self) -> bool {
        matches!(self, Self::N | Self::Ne | Self::Nw)
    }

    pub fn moves_south(&self) -> bool {
        matches!(self, Self::S | Self::Se | Self::Sw)
    }

    pub fn moves_east(&self) -> bool {
        matches!(self, Self::E | Self::Ne | Self::Se)
    }

    pub fn moves_west(&self) -> bool {
        matches!(self, Self::W | Self::Nw | Self::Sw)
    }
}

/// Lower bound on a rect's dimensions during resize.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinSize {
    pub width: f32,
    pub height: f32,
}

impl MinSize {
    /// Minimum for top-level blocks.
    pub const BLOCK: MinSize = MinSize {
        width: 50.0,
        height: 30.0,
    };
    /// Minimum for inserted elements nested inside a block.
    pub const ELEMENT: MinSize = MinSize {
        width: 40.0,
        height: 30.0,
    };
}

impl Default for MinSize {
    fn default() -> Self {
        Self::BLOCK
    }
}

// ─── Resize / move ───────────────────────────────────────────────────────

/// Resize `start` by dragging `handle` a cumulative `delta`.
///
/// East/south edges follow the pointer. West/north edges follow the pointer
/// while the opposite edge stays fixed: the shift applied to `left`/`top`
/// is derived from the *clamped* dimension, so hitting the minimum never
/// makes the anchored edge drift. A west/north edge stops at zero.
pub fn resize(start: Rect, handle: ResizeHandle, delta: Vec2, min: MinSize) -> Rect {
    let (dx, dy) = (delta.x as f32, delta.y as f32);
    let mut out = start;

    if handle.moves_east() {
        out.width = (start.width + dx).max(min.width);
    }
    if handle.moves_south() {
        out.height = (start.height + dy).max(min.height);
    }
    if handle.moves_west() {
        let (left, width) = shrink_from_leading(start.left, start.width, dx, min.width);
        out.left = left;
        out.width = width;
    }
    if handle.moves_north() {
        let (top, height) = shrink_from_leading(start.top, start.height, dy, min.height);
        out.top = top;
        out.height = height;
    }
    out
}

/// Leading-edge resize along one axis. Returns `(origin, extent)` with the
/// trailing edge `origin + extent` held at its starting value.
fn shrink_from_leading(origin: f32, extent: f32, delta: f32, min: f32) -> (f32, f32) {
    let trailing = origin + extent;
    let mut next = (extent - delta).max(min);
    if trailing - next < 0.0 {
        next = trailing.max(min);
    }
    ((trailing - next).max(0.0), next)
}

/// Move `start` by a cumulative `delta`, keeping the origin non-negative.
pub fn translate(start: Rect, delta: Vec2) -> Rect {
    Rect {
        left: (start.left + delta.x as f32).max(0.0),
        top: (start.top + delta.y as f32).max(0.0),
        ..start
    }
}

// ─── Virtual canvas scaling ──────────────────────────────────────────────

/// Maps between virtual horizontal units and rendered pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasScale {
    pub virtual_width: f32,
    pub rendered_width: f32,
}

impl Default for CanvasScale {
    fn default() -> Self {
        Self::new(VIRTUAL_WIDTH, VIRTUAL_WIDTH)
    }
}

impl CanvasScale {
    pub const fn new(virtual_width: f32, rendered_width: f32) -> Self {
        Self {
            virtual_width,
            rendered_width,
        }
    }

    /// `rendered / virtual`. Falls back to 1.0 before the canvas is measured.
    pub fn factor(&self) -> f32 {
        let valid = |v: f32| v.is_finite() && v > 0.0;
        if valid(self.virtual_width) && valid(self.rendered_width) {
            self.rendered_width / self.virtual_width
        } else {
            1.0
        }
    }

    pub fn x_to_screen(&self, x: f32) -> f32 {
        x * self.factor()
    }

    pub fn x_to_virtual(&self, x: f32) -> f32 {
        x / self.factor()
    }

    pub fn rect_to_screen(&self, r: Rect) -> Rect {
        Rect::new(
            self.x_to_screen(r.left),
            r.top,
            self.x_to_screen(r.width),
            r.height,
        )
    }

    pub fn rect_to_virtual(&self, r: Rect) -> Rect {
        Rect::new(
            self.x_to_virtual(r.left),
            r.top,
            self.x_to_virtual(r.width),
            r.height,
        )
    }

    pub fn point_to_virtual(&self, p: Point) -> Point {
        Point::new(self.x_to_virtual(p.x as f32) as f64, p.y)
    }

    /// Pixel delta → virtual delta (only the horizontal component scales).
    pub fn delta_to_virtual(&self, d: Vec2) -> Vec2 {
        Vec2::new(self.x_to_virtual(d.x as f32) as f64, d.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn start() -> Rect {
        Rect::new(100.0, 100.0, 300.0, 200.0)
    }

    #[test]
    fn east_and_south_follow_pointer() {
        let r = resize(start(), ResizeHandle::Se, Vec2::new(40.0, -20.0), MinSize::BLOCK);
        assert_eq!(r, Rect::new(100.0, 100.0, 340.0, 180.0));
    }

    #[test]
    fn west_clamp_keeps_right_edge() {
        let r = resize(start(), ResizeHandle::W, Vec2::new(250.0, 0.0), MinSize::BLOCK);
        assert_eq!(r.width, 50.0);
        assert_eq!(r.left, 350.0);
        assert_eq!(r.right(), start().right());

        // Overshooting the minimum must not move the anchored edge further.
        let r = resize(start(), ResizeHandle::W, Vec2::new(280.0, 0.0), MinSize::BLOCK);
        assert_eq!(r.width, 50.0);
        assert_eq!(r.left, 350.0);
    }

    #[test]
    fn west_drag_past_minimum_anchors_right_edge() {
        let start = Rect::new(100.0, 100.0, 200.0, 100.0);
        let r = resize(start, ResizeHandle::W, Vec2::new(250.0, 0.0), MinSize::BLOCK);
        assert_eq!(r, Rect::new(250.0, 100.0, 50.0, 100.0));
        assert_eq!(r.right(), 300.0);
    }

    #[test]
    fn north_clamp_keeps_bottom_edge() {
        let r = resize(start(), ResizeHandle::N, Vec2::new(0.0, 500.0), MinSize::BLOCK);
        assert_eq!(r.height, 30.0);
        assert_eq!(r.bottom(), start().bottom());
    }

    #[test]
    fn every_handle_respects_minimum() {
        for handle in ResizeHandle::ALL {
            for d in [-1000.0, 1000.0] {
                let r = resize(start(), handle, Vec2::new(d, d), MinSize::ELEMENT);
                assert!(r.width >= 40.0, "{handle:?} width {}", r.width);
                assert!(r.height >= 30.0, "{handle:?} height {}", r.height);
                if handle.moves_west() {
                    assert_eq!(r.right(), start().right(), "{handle:?}");
                }
                if handle.moves_north() {
                    assert_eq!(r.bottom(), start().bottom(), "{handle:?}");
                }
            }
        }
    }

    #[test]
    fn west_edge_stops_at_zero() {
        let r = resize(start(), ResizeHandle::Nw, Vec2::new(-500.0, -500.0), MinSize::BLOCK);
        assert_eq!(r.left, 0.0);
        assert_eq!(r.top, 0.0);
        assert_eq!(r.width, 400.0);
        assert_eq!(r.height, 300.0);
    }

    #[test]
    fn translate_clamps_origin() {
        let r = translate(start(), Vec2::new(-150.0, 25.0));
        assert_eq!(r, Rect::new(0.0, 125.0, 300.0, 200.0));
    }

    #[test]
    fn scale_roundtrip_through_screen() {
        let scale = CanvasScale::new(1200.0, 600.0);
        assert_eq!(scale.factor(), 0.5);
        assert_eq!(scale.x_to_screen(300.0), 150.0);
        assert_eq!(scale.x_to_virtual(450.0), 900.0);

        let block = Rect::new(300.0, 40.0, 300.0, 100.0);
        let screen = scale.rect_to_screen(block);
        assert_eq!(screen, Rect::new(150.0, 40.0, 150.0, 100.0));
        assert_eq!(scale.rect_to_virtual(screen), block);
    }

    #[test]
    fn unmeasured_scale_is_identity() {
        assert_eq!(CanvasScale::new(1200.0, 0.0).factor(), 1.0);
        assert_eq!(CanvasScale::new(f32::NAN, 800.0).factor(), 1.0);
    }

    #[test]
    fn vertical_delta_is_not_scaled() {
        let scale = CanvasScale::new(1200.0, 600.0);
        assert_eq!(
            scale.delta_to_virtual(Vec2::new(10.0, 10.0)),
            Vec2::new(20.0, 10.0)
        );
    }

    #[test]
    fn degenerate_sizes() {
        assert!(Size::new(0.0, 10.0).is_degenerate());
        assert!(Size::new(f32::NAN, 10.0).is_degenerate());
        assert!(!Size::new(1.0, 1.0).is_degenerate());
    }

    #[test]
    fn marquee_from_any_direction() {
        let r = Rect::from_points(Point::new(50.0, 80.0), Point::new(10.0, 20.0));
        assert_eq!(r, Rect::new(10.0, 20.0, 40.0, 60.0));
        assert!(r.contains_rect(&Rect::new(10.0, 20.0, 40.0, 60.0)));
        assert!(!r.contains_rect(&Rect::new(5.0, 20.0, 40.0, 60.0)));
    }
}
