//! Editor store: the single owner of the page being edited.
//!
//! The store holds the authoritative block collection together with the
//! history, the selection, the canvas scale and the template registry.
//! Every change to the collection goes through `EditorStore::apply`, which
//! decides whether to record an undo step (discrete edit) or just mark the
//! open session dirty (drag, resize, typing). After each change the
//! selection is repaired so it never points at something deleted.
//!
//! Tools don't touch the store directly: they return `EditorAction`s,
//! which `dispatch` applies in order.

use crate::config::EditorConfig;
use crate::history::History;
use crate::input::{KeyTarget, Modifiers};
use crate::selection::{Selection, SelectionSet};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use sc_core::geometry::{CanvasScale, Position, Rect};
use sc_core::id::NodeId;
use sc_core::registry::{BuiltinTemplates, TemplateRegistry};
use sc_core::style::{StyleBucket, StyleMap, StyleValue};
use sc_core::{Block, Canvas, InsertedElement, TreeError, WriteOutcome};
use serde::{Deserialize, Serialize};

/// Z-order moves for a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZOrder {
    Forward,
    Backward,
    Front,
    Back,
}

/// A change to the block collection.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasMutation {
    AddBlock {
        block: Block,
    },
    RemoveBlocks {
        ids: Vec<NodeId>,
    },
    SetRect {
        id: NodeId,
        rect: Rect,
    },
    PatchBlockStyle {
        id: NodeId,
        patch: StyleMap,
    },
    SetElementStyle {
        block_id: NodeId,
        element: NodeId,
        key: String,
        value: StyleValue,
        bucket: StyleBucket,
    },
    SetBlockContent {
        id: NodeId,
        value: String,
    },
    SetElementContent {
        block_id: NodeId,
        element: NodeId,
        value: String,
    },
    InsertElement {
        block_id: NodeId,
        parent: Option<NodeId>,
        element: InsertedElement,
    },
    EditElement {
        block_id: NodeId,
        element: InsertedElement,
    },
    RemoveElement {
        block_id: NodeId,
        element_id: NodeId,
    },
    SetElementRect {
        block_id: NodeId,
        element_id: NodeId,
        rect: Rect,
    },
    ReorderElement {
        block_id: NodeId,
        dragged: NodeId,
        target: NodeId,
    },
    Reorder {
        id: NodeId,
        op: ZOrder,
    },
}

impl CanvasMutation {
    fn apply(self, canvas: &mut Canvas, registry: &dyn TemplateRegistry) -> WriteOutcome {
        match self {
            Self::AddBlock { block } => {
                canvas.add_block(block);
                WriteOutcome::Applied
            }
            Self::RemoveBlocks { ids } => found(!canvas.remove_blocks(&ids).is_empty()),
            Self::SetRect { id, rect } => {
                if !canvas.contains(id) {
                    return WriteOutcome::NotFound;
                }
                changed(canvas.set_rect(id, rect))
            }
            Self::PatchBlockStyle { id, patch } => {
                if !canvas.contains(id) {
                    return WriteOutcome::NotFound;
                }
                changed(canvas.update_block_style(id, &patch))
            }
            Self::SetElementStyle {
                block_id,
                element,
                key,
                value,
                bucket,
            } => canvas.update_element_style(registry, block_id, element.as_str(), &key, value, bucket),
            Self::SetBlockContent { id, value } => {
                if !canvas.contains(id) {
                    return WriteOutcome::NotFound;
                }
                changed(canvas.update_block_content(id, &value))
            }
            Self::SetElementContent {
                block_id,
                element,
                value,
            } => {
                if !canvas
                    .get(block_id)
                    .is_some_and(|b| registry.addresses(b, element.as_str()))
                {
                    return WriteOutcome::NotFound;
                }
                changed(canvas.update_element_content(block_id, element.as_str(), &value))
            }
            Self::InsertElement {
                block_id,
                parent,
                element,
            } => match canvas.insert_element(block_id, parent, element) {
                Ok(_) => WriteOutcome::Applied,
                Err(e) => {
                    log::warn!("insert refused: {e}");
                    WriteOutcome::NotFound
                }
            },
            Self::EditElement { block_id, element } => match canvas.edit_element(block_id, element) {
                Ok(c) => changed(c),
                Err(e) => {
                    log::warn!("edit refused: {e}");
                    WriteOutcome::NotFound
                }
            },
            Self::RemoveElement {
                block_id,
                element_id,
            } => found(!canvas.remove_element(block_id, element_id).is_empty()),
            Self::SetElementRect {
                block_id,
                element_id,
                rect,
            } => changed(canvas.set_element_rect(block_id, element_id, rect)),
            Self::ReorderElement {
                block_id,
                dragged,
                target,
            } => changed(canvas.reorder_element(block_id, dragged, target)),
            Self::Reorder { id, op } => changed(match op {
                ZOrder::Forward => canvas.bring_forward(id),
                ZOrder::Backward => canvas.send_backward(id),
                ZOrder::Front => canvas.bring_to_front(id),
                ZOrder::Back => canvas.send_to_back(id),
            }),
        }
    }
}

fn changed(c: bool) -> WriteOutcome {
    if c {
        WriteOutcome::Applied
    } else {
        WriteOutcome::Unchanged
    }
}

fn found(f: bool) -> WriteOutcome {
    if f {
        WriteOutcome::Applied
    } else {
        WriteOutcome::NotFound
    }
}

/// An instruction produced by a tool, applied by `EditorStore::dispatch`.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorAction {
    BeginSession { label: String },
    Mutate { mutation: CanvasMutation, label: String },
    EndSession,
    Select(Selection),
    /// Ctrl/cmd-click on a block.
    ToggleInSet(NodeId),
    /// Result of an area selection.
    SelectSet(Vec<NodeId>),
    ClearSelection,
}

/// Page-wide settings that travel with the editing session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeConfig {
    pub theme_id: Option<String>,
    /// Page-level style defaults (body font, background).
    #[serde(default)]
    pub styles: StyleMap,
}

/// Owner of the page, its history and the selection.
pub struct EditorStore {
    canvas: Canvas,
    history: History,
    selection: Selection,
    selection_set: SelectionSet,
    scale: CanvasScale,
    config: EditorConfig,
    registry: Box<dyn TemplateRegistry>,
    theme: ThemeConfig,
    /// Element whose text is being edited in place (block, element).
    editing: Option<(NodeId, NodeId)>,
}

impl Default for EditorStore {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl EditorStore {
    /// A store backed by the built-in templates.
    pub fn new(config: EditorConfig) -> Self {
        Self::with_registry(config, Box::new(BuiltinTemplates::new()))
    }

    pub fn with_registry(config: EditorConfig, registry: Box<dyn TemplateRegistry>) -> Self {
        Self {
            canvas: Canvas::new(),
            history: History::new(config.history_depth),
            selection: Selection::None,
            selection_set: SelectionSet::new(),
            scale: CanvasScale::new(config.virtual_width, config.virtual_width),
            config,
            registry,
            theme: ThemeConfig::default(),
            editing: None,
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn registry(&self) -> &dyn TemplateRegistry {
        self.registry.as_ref()
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn scale(&self) -> CanvasScale {
        self.scale
    }

    /// The canvas element was measured (mount or window resize).
    pub fn set_rendered_width(&mut self, width: f32) {
        self.scale.rendered_width = width;
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn selection_set(&self) -> &SelectionSet {
        &self.selection_set
    }

    pub fn theme(&self) -> &ThemeConfig {
        &self.theme
    }

    pub fn set_theme(&mut self, theme: ThemeConfig) {
        self.theme = theme;
    }

    /// Block types on the page, in paint order.
    pub fn components(&self) -> Vec<&str> {
        self.canvas
            .blocks()
            .iter()
            .map(|b| b.block_type.as_str())
            .collect()
    }

    pub fn editing(&self) -> Option<(NodeId, NodeId)> {
        self.editing
    }

    /// Mark an element as focused for in-place text editing. Blocks
    /// holding an editing element can't be dragged or resized.
    pub fn set_editing(&mut self, editing: Option<(NodeId, NodeId)>) {
        self.editing = editing;
    }

    /// Replace the page (document load). History and selection reset.
    pub fn load(&mut self, canvas: Canvas) {
        log::debug!("store: loading {} blocks", canvas.len());
        self.canvas = canvas;
        self.history.clear();
        self.selection = Selection::None;
        self.selection_set.clear();
        self.editing = None;
    }

    // ─── Mutation path ───────────────────────────────────────────────────

    /// Apply one change. Outside a session a changed collection records
    /// an undo step labeled `label`; inside a session the write is live
    /// and the session is marked dirty.
    pub fn apply(&mut self, mutation: CanvasMutation, label: &str) -> WriteOutcome {
        let before = (!self.history.in_session()).then(|| self.canvas.clone());
        let outcome = mutation.apply(&mut self.canvas, self.registry.as_ref());
        if outcome.changed() {
            match before {
                Some(state) => {
                    log::debug!("store: {label}");
                    self.history.push(state, label);
                }
                None => {
                    log::trace!("store: live {label}");
                    self.history.mark_dirty();
                }
            }
        }
        self.repair_selection();
        outcome
    }

    pub fn begin_session(&mut self, label: &str) {
        self.history.begin_session(&self.canvas, label);
    }

    /// Close the current session. Returns `true` if an undo step was recorded.
    pub fn end_session(&mut self) -> bool {
        self.history.end_session(&self.canvas)
    }

    pub fn undo(&mut self) -> Option<String> {
        let entry = self.history.undo(&self.canvas)?;
        self.canvas = entry.blocks;
        self.repair_selection();
        log::debug!("store: undo {}", entry.label);
        Some(entry.label)
    }

    pub fn redo(&mut self) -> Option<String> {
        let entry = self.history.redo(&self.canvas)?;
        self.canvas = entry.blocks;
        self.repair_selection();
        log::debug!("store: redo {}", entry.label);
        Some(entry.label)
    }

    /// Apply tool output in order. Returns `true` if the collection changed.
    pub fn dispatch(&mut self, actions: Vec<EditorAction>) -> bool {
        let mut any = false;
        for action in actions {
            match action {
                EditorAction::BeginSession { label } => self.begin_session(&label),
                EditorAction::EndSession => any |= self.end_session(),
                EditorAction::Mutate { mutation, label } => {
                    any |= self.apply(mutation, &label).changed();
                }
                EditorAction::Select(sel) => self.select(sel),
                EditorAction::ToggleInSet(id) => self.toggle_selected(id),
                EditorAction::SelectSet(ids) => self.select_blocks(ids),
                EditorAction::ClearSelection => self.clear_selection(),
            }
        }
        any
    }

    // ─── Selection ───────────────────────────────────────────────────────

    /// Focus a block or element. Stale targets clear the selection.
    pub fn select(&mut self, selection: Selection) {
        if selection.is_stale(&self.canvas, self.registry.as_ref()) {
            self.clear_selection();
            return;
        }
        self.selection = selection;
        self.selection_set.set(selection.block_id());
    }

    pub fn clear_selection(&mut self) {
        self.selection = Selection::None;
        self.selection_set.clear();
    }

    /// Ctrl/cmd-click a block in or out of the multi-selection.
    pub fn toggle_selected(&mut self, id: NodeId) {
        if !self.canvas.contains(id) {
            return;
        }
        if self.selection_set.toggle(id) {
            self.selection = Selection::block(id);
        } else if self.selection.block_id() == Some(id) {
            self.selection = Selection::None;
        }
    }

    /// Area selection result. Focus follows only a single-block result.
    pub fn select_blocks(&mut self, ids: Vec<NodeId>) {
        self.selection_set.set(ids.into_iter().filter(|id| self.canvas.contains(*id)));
        self.selection = match self.selection_set.ids() {
            [only] => Selection::block(*only),
            _ => Selection::None,
        };
    }

    fn repair_selection(&mut self) {
        if self.selection.is_stale(&self.canvas, self.registry.as_ref()) {
            log::debug!("store: selection {:?} went stale", self.selection);
            self.selection = Selection::None;
        }
        self.selection_set.retain_existing(&self.canvas);
        if let Some((block, element)) = self.editing
            && Selection::element(block, element).is_stale(&self.canvas, self.registry.as_ref())
        {
            self.editing = None;
        }
    }

    // ─── High-level operations ───────────────────────────────────────────

    /// Insert a registry template at `position` (virtual units) and select it.
    pub fn add_component(&mut self, block_type: &str, position: Position) -> NodeId {
        let block = self.registry.instantiate(block_type, position);
        self.add_block(block)
    }

    /// Append a prepared block, record an undo step, and select it.
    pub fn add_block(&mut self, block: Block) -> NodeId {
        let id = block.id;
        let label = format!("Add {}", block.block_type);
        self.apply(CanvasMutation::AddBlock { block }, &label);
        self.select(Selection::block(id));
        id
    }

    /// Rich element insert. Validates before touching the collection.
    pub fn insert_element(
        &mut self,
        block_id: NodeId,
        parent: Option<NodeId>,
        element: InsertedElement,
    ) -> Result<NodeId, TreeError> {
        element.validate()?;
        let block = self
            .canvas
            .get(block_id)
            .ok_or(TreeError::UnknownBlock(block_id))?;
        if let Some(p) = parent
            && !block.inserts.contains(p)
        {
            return Err(TreeError::UnknownParent(p));
        }
        if block.inserts.contains(element.id) {
            return Err(TreeError::DuplicateId(element.id));
        }
        let id = element.id;
        let label = format!("Insert {}", element.kind.as_str());
        self.apply(
            CanvasMutation::InsertElement {
                block_id,
                parent,
                element,
            },
            &label,
        );
        Ok(id)
    }

    /// Rich element edit form save. Returns whether anything changed.
    pub fn edit_element(&mut self, block_id: NodeId, element: InsertedElement) -> Result<bool, TreeError> {
        element.validate()?;
        let label = format!("Edit {}", element.kind.as_str());
        Ok(self
            .apply(CanvasMutation::EditElement { block_id, element }, &label)
            .changed())
    }

    /// Delete what is selected: an inserted element (with its subtree),
    /// or every selected block. Clears the selection. Returns removed ids.
    pub fn delete_selection(&mut self) -> Vec<NodeId> {
        let mut removed = Vec::new();
        match self.selection {
            Selection::Element {
                block_id,
                element_id,
            } => {
                let inserted = self
                    .canvas
                    .get(block_id)
                    .is_some_and(|b| b.inserts.contains(element_id));
                if inserted {
                    removed = self
                        .canvas
                        .get(block_id)
                        .map(|b| {
                            let mut ids = vec![element_id];
                            ids.extend(
                                b.inserts
                                    .flatten()
                                    .into_iter()
                                    .filter(|id| b.inserts.is_ancestor_of(element_id, *id)),
                            );
                            ids
                        })
                        .unwrap_or_default();
                    self.apply(
                        CanvasMutation::RemoveElement {
                            block_id,
                            element_id,
                        },
                        "Delete element",
                    );
                }
            }
            _ => {
                let ids: Vec<NodeId> = if self.selection_set.is_empty() {
                    self.selection.block_id().into_iter().collect()
                } else {
                    self.selection_set.ids().to_vec()
                };
                if !ids.is_empty() {
                    let label = if ids.len() == 1 {
                        "Delete block".to_string()
                    } else {
                        format!("Delete {} blocks", ids.len())
                    };
                    removed = ids.clone();
                    self.apply(CanvasMutation::RemoveBlocks { ids }, &label);
                }
            }
        }
        self.clear_selection();
        removed
    }

    /// Z-order move for the focused block.
    pub fn reorder_selected(&mut self, op: ZOrder) -> bool {
        let Some(id) = self.selection.block_id() else {
            return false;
        };
        self.apply(CanvasMutation::Reorder { id, op }, "Reorder").changed()
    }

    /// Run a resolved shortcut. Returns `true` if anything happened.
    pub fn perform(&mut self, action: ShortcutAction) -> bool {
        match action {
            ShortcutAction::Undo => self.undo().is_some(),
            ShortcutAction::Redo => self.redo().is_some(),
            ShortcutAction::Delete => !self.delete_selection().is_empty(),
            ShortcutAction::Deselect => {
                let had = !self.selection.is_none() || !self.selection_set.is_empty();
                self.clear_selection();
                had
            }
            ShortcutAction::BringForward => self.reorder_selected(ZOrder::Forward),
            ShortcutAction::SendBackward => self.reorder_selected(ZOrder::Backward),
            ShortcutAction::BringToFront => self.reorder_selected(ZOrder::Front),
            ShortcutAction::SendToBack => self.reorder_selected(ZOrder::Back),
        }
    }

    /// Global keydown entry point. Keys typed into editable targets are
    /// left alone.
    pub fn handle_key(&mut self, key: &str, modifiers: Modifiers, target: KeyTarget) -> Option<ShortcutAction> {
        let action = ShortcutMap::resolve_for(target, key, modifiers)?;
        self.perform(action);
        Some(action)
    }
}
