//! Hit testing: screen point → block / element / resize handle.
//!
//! Walks blocks front-to-back (last painted = topmost). Points are
//! canvas-local screen pixels and are mapped to virtual units through the
//! current `CanvasScale` before comparing against stored rects.

use sc_core::geometry::{CanvasScale, Rect, ResizeHandle};
use sc_core::id::NodeId;
use sc_core::{Canvas, Point};

/// What a pointer landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitTarget {
    pub block_id: NodeId,
    /// Deepest inserted element under the pointer, if any.
    pub element_id: Option<NodeId>,
}

/// Find the topmost block (and deepest inserted element) at `point`.
/// Returns `None` for empty canvas.
pub fn hit_test(canvas: &Canvas, scale: &CanvasScale, point: Point) -> Option<HitTarget> {
    let p = scale.point_to_virtual(point);
    let (x, y) = (p.x as f32, p.y as f32);
    let block = canvas.block_at(x, y)?;
    let element_id = block
        .inserts
        .hit_test(x - block.position.x, y - block.position.y);
    Some(HitTarget {
        block_id: block.id,
        element_id,
    })
}

/// The handle of `rect` (screen space) within `tolerance` px of `point`.
/// Corners win over edges.
pub fn hit_test_handle(rect: Rect, point: Point, tolerance: f32) -> Option<ResizeHandle> {
    let (px, py) = (point.x as f32, point.y as f32);
    let near = |a: f32, b: f32| (a - b).abs() <= tolerance;
    let within = |v: f32, lo: f32, hi: f32| v >= lo - tolerance && v <= hi + tolerance;
    if !within(px, rect.left, rect.right()) || !within(py, rect.top, rect.bottom()) {
        return None;
    }

    let n = near(py, rect.top);
    let s = near(py, rect.bottom());
    let w = near(px, rect.left);
    let e = near(px, rect.right());
    match (n, s, w, e) {
        (true, _, true, _) => Some(ResizeHandle::Nw),
        (true, _, _, true) => Some(ResizeHandle::Ne),
        (_, true, true, _) => Some(ResizeHandle::Sw),
        (_, true, _, true) => Some(ResizeHandle::Se),
        (true, ..) => Some(ResizeHandle::N),
        (_, true, ..) => Some(ResizeHandle::S),
        (_, _, true, _) => Some(ResizeHandle::W),
        (_, _, _, true) => Some(ResizeHandle::E),
        _ => None,
    }
}

/// Blocks lying entirely inside `area` (screen space), in paint order.
/// Used for area (marquee) selection.
pub fn blocks_within(canvas: &Canvas, scale: &CanvasScale, area: Rect) -> Vec<NodeId> {
    canvas
        .blocks()
        .iter()
        .filter(|b| area.contains_rect(&scale.rect_to_screen(b.rect())))
        .map(|b| b.id)
        .collect()
}
