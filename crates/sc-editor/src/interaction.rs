//! Arrange tool: pointer gestures on the canvas.
//!
//! Translates normalized input events into `EditorAction`s that the
//! store applies. One gesture is in flight at a time:
//!
//! | Gesture | Target | Writes |
//! |---------|--------|--------|
//! | drag body / handle | block | live, inside one history session |
//! | drag body / handle | inserted element | transient, committed once on release |
//! | drag on empty canvas | area | selects blocks fully inside on release |
//! | ctrl/cmd-click | block | toggles multi-selection, no drag |
//!
//! Releasing the pointer or losing window focus ends the gesture; the
//! last computed rect is committed either way. Pointer positions are
//! canvas-local screen pixels; rects are computed in virtual units from
//! the cumulative pointer delta, so a drag never accumulates rounding.

use crate::hit::{hit_test, hit_test_handle};
use crate::input::{InputEvent, Modifiers};
use crate::selection::{AreaSelection, Selection};
use crate::store::{CanvasMutation, EditorAction, EditorStore};
use sc_core::geometry::{CanvasScale, MinSize, Position, Rect, ResizeHandle, Size, resize, translate};
use sc_core::id::NodeId;
use sc_core::{Block, Point};

/// What a drag acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragTarget {
    Block(NodeId),
    Element { block_id: NodeId, element_id: NodeId },
}

impl DragTarget {
    pub fn block_id(&self) -> NodeId {
        match self {
            Self::Block(id) | Self::Element { block_id: id, .. } => *id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragKind {
    Move,
    Resize(ResizeHandle),
}

/// State of an in-flight move or resize.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    pub target: DragTarget,
    pub kind: DragKind,
    /// Pointer position at gesture start (screen px).
    origin: Point,
    /// Rect at gesture start (virtual units; parent-relative for elements).
    start: Rect,
    min: MinSize,
    /// Latest rect computed from the pointer.
    pub current: Rect,
}

impl DragSession {
    /// Rect for the pointer at `pointer`, derived from the start state.
    pub fn rect_at(&self, pointer: Point, scale: &CanvasScale) -> Rect {
        let delta = scale.delta_to_virtual(pointer - self.origin);
        match self.kind {
            DragKind::Move => translate(self.start, delta),
            DragKind::Resize(handle) => resize(self.start, handle, delta, self.min),
        }
    }

    pub fn label(&self) -> &'static str {
        match (self.target, self.kind) {
            (DragTarget::Block(_), DragKind::Move) => "Move block",
            (DragTarget::Block(_), DragKind::Resize(_)) => "Resize block",
            (DragTarget::Element { .. }, DragKind::Move) => "Move element",
            (DragTarget::Element { .. }, DragKind::Resize(_)) => "Resize element",
        }
    }

    fn mutation(&self, rect: Rect) -> EditorAction {
        let mutation = match self.target {
            DragTarget::Block(id) => CanvasMutation::SetRect { id, rect },
            DragTarget::Element {
                block_id,
                element_id,
            } => CanvasMutation::SetElementRect {
                block_id,
                element_id,
                rect,
            },
        };
        EditorAction::Mutate {
            mutation,
            label: self.label().to_string(),
        }
    }
}

/// The canvas pointer tool.
#[derive(Debug, Default)]
pub struct ArrangeTool {
    drag: Option<DragSession>,
    area: Option<AreaSelection>,
}

impl ArrangeTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// A drag or area selection is in progress.
    pub fn is_active(&self) -> bool {
        self.drag.is_some() || self.area.is_some()
    }

    pub fn drag(&self) -> Option<&DragSession> {
        self.drag.as_ref()
    }

    /// Marquee to draw, in screen space.
    pub fn area(&self) -> Option<Rect> {
        self.area.as_ref().map(AreaSelection::rect)
    }

    /// Transient rect of an element being dragged (not yet in the store).
    pub fn preview(&self) -> Option<(DragTarget, Rect)> {
        self.drag
            .as_ref()
            .filter(|d| matches!(d.target, DragTarget::Element { .. }))
            .map(|d| (d.target, d.current))
    }

    /// Handle an input event, returning the actions to dispatch.
    pub fn handle(&mut self, event: &InputEvent, store: &EditorStore) -> Vec<EditorAction> {
        match event {
            InputEvent::PointerDown { x, y, modifiers } => {
                self.pointer_down(store, point(*x, *y), *modifiers)
            }
            InputEvent::PointerMove { x, y, .. } => self.pointer_move(store, point(*x, *y)),
            InputEvent::PointerUp { x, y } => self.finish(store, Some(point(*x, *y))),
            InputEvent::Blur => self.finish(store, None),
            InputEvent::Key { .. } => vec![],
        }
    }

    fn pointer_down(&mut self, store: &EditorStore, at: Point, modifiers: Modifiers) -> Vec<EditorAction> {
        if self.is_active() {
            return vec![];
        }

        // Handles of the focused block or element sit on its edges and
        // take precedence over the body underneath.
        if let Some((target, handle)) = handle_under(store, at) {
            return self.begin(store, target, DragKind::Resize(handle), at, vec![]);
        }

        let Some(hit) = hit_test(store.canvas(), &store.scale(), at) else {
            self.area = Some(AreaSelection::new(at));
            if modifiers.shift || modifiers.command() {
                return vec![];
            }
            return vec![EditorAction::ClearSelection];
        };

        if modifiers.command() {
            return vec![EditorAction::ToggleInSet(hit.block_id)];
        }

        let (target, select) = match hit.element_id {
            Some(element_id) => (
                DragTarget::Element {
                    block_id: hit.block_id,
                    element_id,
                },
                Some(Selection::element(hit.block_id, element_id)),
            ),
            // Keep a template element selected by the click resolver.
            None if store.selection().block_id() == Some(hit.block_id) => (DragTarget::Block(hit.block_id), None),
            None => (
                DragTarget::Block(hit.block_id),
                Some(Selection::block(hit.block_id)),
            ),
        };
        let actions = select.map(EditorAction::Select).into_iter().collect();
        self.begin(store, target, DragKind::Move, at, actions)
    }

    fn begin(
        &mut self,
        store: &EditorStore,
        target: DragTarget,
        kind: DragKind,
        at: Point,
        mut actions: Vec<EditorAction>,
    ) -> Vec<EditorAction> {
        if store
            .editing()
            .is_some_and(|(block, _)| block == target.block_id())
        {
            log::debug!("arrange: block {} is being text-edited, no drag", target.block_id());
            return actions;
        }
        let min = match target {
            DragTarget::Block(_) => store.config().min_size,
            DragTarget::Element { .. } => store.config().element_min_size,
        };
        let Some(start) = start_rect(store, target, min) else {
            return actions;
        };
        let session = DragSession {
            target,
            kind,
            origin: at,
            start,
            min,
            current: start,
        };
        if let DragTarget::Block(_) = target {
            actions.push(EditorAction::BeginSession {
                label: session.label().to_string(),
            });
        }
        log::trace!("arrange: {} started", session.label());
        self.drag = Some(session);
        actions
    }

    fn pointer_move(&mut self, store: &EditorStore, at: Point) -> Vec<EditorAction> {
        if let Some(drag) = self.drag.as_mut() {
            let rect = drag.rect_at(at, &store.scale());
            if rect == drag.current {
                return vec![];
            }
            drag.current = rect;
            return match drag.target {
                DragTarget::Block(_) => vec![drag.mutation(rect)],
                DragTarget::Element { .. } => vec![],
            };
        }
        if let Some(area) = self.area.as_mut() {
            area.current = at;
        }
        vec![]
    }

    /// End the gesture. `pointer` is `None` when focus was lost, in which
    /// case the last computed rect is committed.
    fn finish(&mut self, store: &EditorStore, pointer: Option<Point>) -> Vec<EditorAction> {
        if let Some(drag) = self.drag.take() {
            let rect = pointer.map_or(drag.current, |p| drag.rect_at(p, &store.scale()));
            return match drag.target {
                DragTarget::Block(_) => {
                    let mut out = Vec::with_capacity(2);
                    if rect != drag.current {
                        out.push(drag.mutation(rect));
                    }
                    out.push(EditorAction::EndSession);
                    out
                }
                DragTarget::Element { .. } if rect != drag.start => vec![drag.mutation(rect)],
                DragTarget::Element { .. } => vec![],
            };
        }
        if let Some(mut area) = self.area.take() {
            if let Some(p) = pointer {
                area.current = p;
            }
            let threshold = store.config().area_select_threshold;
            if let Some(ids) = area.resolve(store.canvas(), &store.scale(), threshold) {
                return vec![EditorAction::SelectSet(ids)];
            }
        }
        vec![]
    }
}

fn point(x: f32, y: f32) -> Point {
    Point::new(x as f64, y as f64)
}

fn start_rect(store: &EditorStore, target: DragTarget, min: MinSize) -> Option<Rect> {
    let block = store.canvas().get(target.block_id())?;
    match target {
        DragTarget::Block(_) => Some(block.rect()),
        DragTarget::Element { element_id, .. } => {
            let el = block.inserts.get(element_id)?;
            Some(
                el.local_rect()
                    .unwrap_or_else(|| Rect::from_parts(el.position, Size::new(min.width, min.height))),
            )
        }
    }
}

/// Virtual-space origin of an inserted element's parent frame.
fn parent_origin(block: &Block, element_id: NodeId) -> Position {
    block
        .inserts
        .ancestors(element_id)
        .iter()
        .filter_map(|id| block.inserts.get(*id))
        .fold(block.position, |acc, el| {
            Position::new(acc.x + el.position.x, acc.y + el.position.y)
        })
}

/// Resize handle of the focused block or inserted element under `at`.
fn handle_under(store: &EditorStore, at: Point) -> Option<(DragTarget, ResizeHandle)> {
    let scale = store.scale();
    let tolerance = store.config().handle_tolerance;
    match store.selection() {
        Selection::Block { block_id } => {
            let block = store.canvas().get(block_id)?;
            let rect = scale.rect_to_screen(block.rect());
            hit_test_handle(rect, at, tolerance).map(|h| (DragTarget::Block(block_id), h))
        }
        Selection::Element {
            block_id,
            element_id,
        } => {
            let block = store.canvas().get(block_id)?;
            let local = block.inserts.get(element_id)?.local_rect()?;
            let origin = parent_origin(block, element_id);
            let abs = Rect::new(origin.x + local.left, origin.y + local.top, local.width, local.height);
            hit_test_handle(scale.rect_to_screen(abs), at, tolerance).map(|h| {
                (
                    DragTarget::Element {
                        block_id,
                        element_id,
                    },
                    h,
                )
            })
        }
        Selection::None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sc_core::{ElementKind, InsertedElement};

    fn run(tool: &mut ArrangeTool, store: &mut EditorStore, event: InputEvent) {
        let actions = tool.handle(&event, store);
        store.dispatch(actions);
    }

    fn hero_store() -> (EditorStore, NodeId) {
        let mut store = EditorStore::default();
        let id = store.add_component("hero", Position::new(0.0, 0.0));
        (store, id)
    }

    #[test]
    fn block_drag_is_live_and_one_undo_step() {
        let (mut store, id) = hero_store();
        let mut tool = ArrangeTool::new();
        run(&mut tool, &mut store, InputEvent::pointer_down(500.0, 200.0, Modifiers::NONE));
        run(&mut tool, &mut store, InputEvent::pointer_move(550.0, 260.0));
        assert_eq!(store.canvas().get(id).unwrap().position, Position::new(50.0, 60.0));
        run(&mut tool, &mut store, InputEvent::pointer_move(560.0, 260.0));
        run(&mut tool, &mut store, InputEvent::pointer_up(560.0, 260.0));

        assert!(!tool.is_active());
        assert_eq!(store.canvas().get(id).unwrap().position, Position::new(60.0, 60.0));
        assert_eq!(store.history().undo_len(), 2);
        assert_eq!(store.history().undo_label(), Some("Move block"));
        store.undo();
        assert_eq!(store.canvas().get(id).unwrap().position, Position::new(0.0, 0.0));
    }

    #[test]
    fn click_without_motion_records_nothing() {
        let (mut store, _) = hero_store();
        let mut tool = ArrangeTool::new();
        run(&mut tool, &mut store, InputEvent::pointer_down(500.0, 200.0, Modifiers::NONE));
        run(&mut tool, &mut store, InputEvent::pointer_up(500.0, 200.0));
        assert_eq!(store.history().undo_len(), 1);
    }

    #[test]
    fn drag_is_scaled_to_virtual_units() {
        let (mut store, id) = hero_store();
        store.set_rendered_width(600.0);
        let mut tool = ArrangeTool::new();
        run(&mut tool, &mut store, InputEvent::pointer_down(100.0, 100.0, Modifiers::NONE));
        run(&mut tool, &mut store, InputEvent::pointer_up(150.0, 110.0));
        assert_eq!(store.canvas().get(id).unwrap().position, Position::new(100.0, 10.0));
    }

    #[test]
    fn west_handle_anchors_right_edge() {
        let mut store = EditorStore::default();
        let id = store.add_component("hero", Position::new(300.0, 0.0));
        let mut tool = ArrangeTool::new();
        run(&mut tool, &mut store, InputEvent::pointer_down(300.0, 200.0, Modifiers::NONE));
        assert_eq!(
            tool.drag().map(|d| d.kind),
            Some(DragKind::Resize(ResizeHandle::W))
        );
        run(&mut tool, &mut store, InputEvent::pointer_move(550.0, 200.0));
        assert_eq!(store.canvas().get(id).unwrap().rect(), Rect::new(550.0, 0.0, 750.0, 400.0));
        run(&mut tool, &mut store, InputEvent::pointer_up(1400.0, 200.0));
        assert_eq!(store.canvas().get(id).unwrap().rect(), Rect::new(1250.0, 0.0, 50.0, 400.0));
    }

    #[test]
    fn element_drag_commits_once_on_release() {
        let (mut store, id) = hero_store();
        let el = store
            .insert_element(
                id,
                None,
                InsertedElement::new(ElementKind::Button, "Buy").at(10.0, 10.0).sized(80.0, 30.0),
            )
            .unwrap();
        let steps = store.history().undo_len();
        let mut tool = ArrangeTool::new();

        run(&mut tool, &mut store, InputEvent::pointer_down(20.0, 20.0, Modifiers::NONE));
        assert_eq!(store.selection(), Selection::element(id, el));
        run(&mut tool, &mut store, InputEvent::pointer_move(70.0, 40.0));
        // Store untouched until release.
        assert_eq!(store.canvas().get(id).unwrap().inserts.get(el).unwrap().position, Position::new(10.0, 10.0));
        assert_eq!(tool.preview().map(|(_, r)| r), Some(Rect::new(60.0, 30.0, 80.0, 30.0)));

        run(&mut tool, &mut store, InputEvent::pointer_up(70.0, 40.0));
        let moved = store.canvas().get(id).unwrap().inserts.get(el).unwrap().clone();
        assert_eq!(moved.position, Position::new(60.0, 30.0));
        assert_eq!(store.history().undo_len(), steps + 1);
        assert_eq!(store.history().undo_label(), Some("Move element"));
    }

    #[test]
    fn blur_commits_last_rect() {
        let (mut store, id) = hero_store();
        let mut tool = ArrangeTool::new();
        run(&mut tool, &mut store, InputEvent::pointer_down(500.0, 200.0, Modifiers::NONE));
        run(&mut tool, &mut store, InputEvent::pointer_move(520.0, 230.0));
        run(&mut tool, &mut store, InputEvent::Blur);

        assert!(!tool.is_active());
        assert!(!store.history().in_session());
        assert_eq!(store.history().undo_label(), Some("Move block"));
        // Moves after blur go nowhere.
        run(&mut tool, &mut store, InputEvent::pointer_move(900.0, 300.0));
        assert_eq!(store.canvas().get(id).unwrap().position, Position::new(20.0, 30.0));
    }

    #[test]
    fn area_select_picks_contained_blocks() {
        let mut store = EditorStore::default();
        let a = store.add_block(Block::new("div", Position::new(10.0, 10.0), Size::new(100.0, 100.0)));
        let b = store.add_block(Block::new("div", Position::new(200.0, 10.0), Size::new(100.0, 100.0)));
        let mut tool = ArrangeTool::new();

        run(&mut tool, &mut store, InputEvent::pointer_down(0.0, 300.0, Modifiers::NONE));
        assert_eq!(store.selection(), Selection::None);
        run(&mut tool, &mut store, InputEvent::pointer_move(150.0, 0.0));
        assert_eq!(tool.area(), Some(Rect::new(0.0, 0.0, 150.0, 300.0)));
        run(&mut tool, &mut store, InputEvent::pointer_up(150.0, 0.0));
        assert_eq!(store.selection_set().ids(), &[a]);
        assert_eq!(store.selection(), Selection::block(a));

        let cmd = Modifiers {
            ctrl: true,
            ..Modifiers::NONE
        };
        run(&mut tool, &mut store, InputEvent::pointer_down(250.0, 50.0, cmd));
        assert_eq!(store.selection_set().ids(), &[a, b]);
        assert!(!tool.is_active());
    }

    #[test]
    fn tiny_area_just_clears() {
        let mut store = EditorStore::default();
        store.add_block(Block::new("div", Position::new(10.0, 10.0), Size::new(100.0, 100.0)));
        let mut tool = ArrangeTool::new();
        run(&mut tool, &mut store, InputEvent::pointer_down(500.0, 500.0, Modifiers::NONE));
        run(&mut tool, &mut store, InputEvent::pointer_up(505.0, 503.0));
        assert_eq!(store.selection(), Selection::None);
        assert!(store.selection_set().is_empty());
    }

    #[test]
    fn text_editing_blocks_drag() {
        let (mut store, id) = hero_store();
        store.set_editing(Some((id, NodeId::intern("title"))));
        let mut tool = ArrangeTool::new();
        run(&mut tool, &mut store, InputEvent::pointer_down(500.0, 200.0, Modifiers::NONE));
        assert!(!tool.is_active());
        run(&mut tool, &mut store, InputEvent::pointer_move(600.0, 300.0));
        assert_eq!(store.canvas().get(id).unwrap().position, Position::new(0.0, 0.0));
    }
}
