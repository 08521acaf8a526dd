//! Selection model and click addressing.
//!
//! The single *focus* selection is what the style panel edits: nothing, a
//! whole block, or one element inside a block. Alongside it the editor
//! keeps a multi-selection set of blocks for ctrl/cmd-click and area
//! selection, which bulk operations (delete, z-order) act on.

use crate::hit::blocks_within;
use sc_core::geometry::{CanvasScale, Rect};
use sc_core::id::NodeId;
use sc_core::{Canvas, Point, TemplateRegistry};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// What the user is currently editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Selection {
    #[default]
    None,
    Block { block_id: NodeId },
    /// `element_id` is a template element key (`navItem-0`) or an
    /// inserted element id.
    Element { block_id: NodeId, element_id: NodeId },
}

impl Selection {
    pub fn block(block_id: NodeId) -> Self {
        Self::Block { block_id }
    }

    pub fn element(block_id: NodeId, element_id: NodeId) -> Self {
        Self::Element {
            block_id,
            element_id,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    pub fn block_id(&self) -> Option<NodeId> {
        match self {
            Self::None => None,
            Self::Block { block_id } | Self::Element { block_id, .. } => Some(*block_id),
        }
    }

    pub fn element_id(&self) -> Option<NodeId> {
        match self {
            Self::Element { element_id, .. } => Some(*element_id),
            _ => None,
        }
    }

    /// True when the selection points at something no longer on the canvas.
    /// Template slots count as present even before they carry any style.
    pub fn is_stale(&self, canvas: &Canvas, registry: &dyn TemplateRegistry) -> bool {
        match self {
            Self::None => false,
            Self::Block { block_id } => !canvas.contains(*block_id),
            Self::Element {
                block_id,
                element_id,
            } => !canvas
                .get(*block_id)
                .is_some_and(|b| registry.addresses(b, element_id.as_str())),
        }
    }
}

/// Resolve a click inside a block from its DOM marker path.
///
/// `path` lists the element markers from the click target up to (and
/// including) the block root; `None` entries are DOM nodes without a
/// marker. The nearest marker wins: if it is the block's own root marker
/// the block is selected, otherwise that element is.
pub fn resolve_click(block_id: NodeId, root_marker: &str, path: &[Option<&str>]) -> Selection {
    match path.iter().flatten().next() {
        Some(marker) if *marker != root_marker => Selection::element(block_id, NodeId::intern(marker)),
        _ => Selection::block(block_id),
    }
}

// ─── Multi-selection ─────────────────────────────────────────────────────

/// Ordered set of selected block ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: SmallVec<[NodeId; 4]>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.ids.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn ids(&self) -> &[NodeId] {
        &self.ids
    }

    /// Replace the set with exactly `ids`.
    pub fn set(&mut self, ids: impl IntoIterator<Item = NodeId>) {
        self.ids.clear();
        for id in ids {
            if !self.ids.contains(&id) {
                self.ids.push(id);
            }
        }
    }

    /// Ctrl/cmd-click: add if absent, remove if present. Returns whether
    /// `id` is selected afterwards.
    pub fn toggle(&mut self, id: NodeId) -> bool {
        if let Some(pos) = self.ids.iter().position(|i| *i == id) {
            self.ids.remove(pos);
            false
        } else {
            self.ids.push(id);
            true
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Drop ids that are no longer on the canvas.
    pub fn retain_existing(&mut self, canvas: &Canvas) {
        self.ids.retain(|id| canvas.contains(*id));
    }
}

/// A rubber-band drag over empty canvas, in screen space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaSelection {
    pub start: Point,
    pub current: Point,
}

impl AreaSelection {
    pub fn new(start: Point) -> Self {
        Self {
            start,
            current: start,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::from_points(self.start, self.current)
    }

    /// Blocks fully inside the box, or `None` when the box is below
    /// `threshold` px in either dimension (treated as a click that
    /// clears the selection).
    pub fn resolve(&self, canvas: &Canvas, scale: &CanvasScale, threshold: f32) -> Option<Vec<NodeId>> {
        let rect = self.rect();
        if rect.width < threshold || rect.height < threshold {
            return None;
        }
        Some(blocks_within(canvas, scale, rect))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sc_core::{Block, BuiltinTemplates, Position, Size};

    #[test]
    fn click_on_nested_text_selects_element() {
        let block = NodeId::intern("blk");
        // <span> (no marker) → <li data-el="navItem-0"> → <ul data-el="navList"> → root
        let sel = resolve_click(block, "root", &[None, Some("navItem-0"), Some("navList"), Some("root")]);
        assert_eq!(sel, Selection::element(block, NodeId::intern("navItem-0")));
    }

    #[test]
    fn click_on_root_or_unmarked_selects_block() {
        let block = NodeId::intern("blk");
        assert_eq!(resolve_click(block, "root", &[None, Some("root")]), Selection::block(block));
        assert_eq!(resolve_click(block, "root", &[None, None]), Selection::block(block));
        assert_eq!(resolve_click(block, "root", &[]), Selection::block(block));
    }

    #[test]
    fn staleness_tracks_canvas() {
        let reg = BuiltinTemplates::new();
        let header = reg.instantiate("header1", Position::default());
        let id = header.id;
        let mut canvas = Canvas::from_blocks(vec![header]);

        assert!(!Selection::element(id, NodeId::intern("navItem-0")).is_stale(&canvas, &reg));
        assert!(Selection::element(id, NodeId::intern("navItem-5")).is_stale(&canvas, &reg));
        assert!(!Selection::block(id).is_stale(&canvas, &reg));
        canvas.remove_block(id);
        assert!(Selection::block(id).is_stale(&canvas, &reg));
        assert!(!Selection::None.is_stale(&canvas, &reg));
    }

    #[test]
    fn declared_slots_are_selectable_before_styling() {
        let reg = BuiltinTemplates::new();
        let header1 = reg.instantiate("header1", Position::default());
        let header2 = reg.instantiate("header2", Position::new(0.0, 200.0));
        let (h1, h2) = (header1.id, header2.id);
        assert!(!header1.props.elements.contains_key("navList"));
        assert!(header2.props.elements.is_empty());
        let canvas = Canvas::from_blocks(vec![header1, header2]);

        for (block, key) in [(h1, "navList"), (h1, "header"), (h2, "logo"), (h2, "nav")] {
            let sel = Selection::element(block, NodeId::intern(key));
            assert!(!sel.is_stale(&canvas, &reg), "{key} on {block}");
        }
        // No such slot on either template.
        assert!(Selection::element(h2, NodeId::intern("sidebar")).is_stale(&canvas, &reg));
    }

    #[test]
    fn toggle_adds_and_removes() {
        let (a, b) = (NodeId::intern("a"), NodeId::intern("b"));
        let mut set = SelectionSet::new();
        assert!(set.toggle(a));
        assert!(set.toggle(b));
        assert!(!set.toggle(a));
        assert_eq!(set.ids(), &[b]);
    }

    #[test]
    fn small_area_clears() {
        let canvas = Canvas::from_blocks(vec![Block::new(
            "div",
            Position::new(10.0, 10.0),
            Size::new(50.0, 50.0),
        )]);
        let scale = CanvasScale::default();
        let mut area = AreaSelection::new(Point::new(0.0, 0.0));
        area.current = Point::new(8.0, 200.0);
        assert_eq!(area.resolve(&canvas, &scale, 10.0), None);
        area.current = Point::new(100.0, 100.0);
        assert_eq!(area.resolve(&canvas, &scale, 10.0).map(|v| v.len()), Some(1));
    }

    #[test]
    fn selection_json_shape() {
        let sel = Selection::element(NodeId::intern("b1"), NodeId::intern("title"));
        assert_eq!(
            serde_json::to_string(&sel).unwrap(),
            r#"{"type":"element","blockId":"b1","elementId":"title"}"#
        );
        assert_eq!(serde_json::to_string(&Selection::None).unwrap(), r#"{"type":"none"}"#);
    }
}
