//! Block data model for Sitecraft pages.
//!
//! A page is an ordered collection of `Block`s on a fixed-width virtual
//! canvas. Array order is paint order: later blocks draw on top. Each
//! block carries template content, a root style, per-element style buckets
//! keyed by stable element keys (`title`, `navItem-0`), and optionally a
//! tree of free-form inserted elements.

use crate::geometry::{Position, Rect, Size};
use crate::id::{IdKind, NodeId};
use crate::registry::{SlotRole, TemplateRegistry};
use crate::style::{ElementStyle, StyleBucket, StyleMap, StyleValue, classify_property};
use crate::tree::{ElementTree, InsertedElement, TreeError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ─── Content ─────────────────────────────────────────────────────────────

/// One entry of a navigation or call-to-action list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContentItem {
    pub content: String,
}

impl ContentItem {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// Template content, one variant per template family.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum BlockContent {
    Header {
        title: String,
        #[serde(default)]
        nav_items: Vec<ContentItem>,
        #[serde(default)]
        cta_items: Vec<ContentItem>,
    },
    Hero {
        title: String,
        subtitle: String,
    },
    Footer {
        text: String,
    },
    /// Single-text primitives (`h1`, `p`).
    Text {
        text: String,
    },
    #[default]
    Empty,
}

/// Parse `"navItem-3"` with prefix `"navItem"` → `Some(3)`.
pub fn indexed_key(key: &str, prefix: &str) -> Option<usize> {
    key.strip_prefix(prefix)?.strip_prefix('-')?.parse().ok()
}

impl BlockContent {
    /// The text a plain "edit content" action targets.
    pub fn primary_text(&self) -> Option<&str> {
        match self {
            Self::Header { title, .. } | Self::Hero { title, .. } => Some(title.as_str()),
            Self::Footer { text } | Self::Text { text } => Some(text.as_str()),
            Self::Empty => None,
        }
    }

    /// Read a content field by element key.
    pub fn field(&self, key: &str) -> Option<&str> {
        match self {
            Self::Header {
                title,
                nav_items,
                cta_items,
            } => {
                if key == "title" {
                    Some(title.as_str())
                } else if let Some(i) = indexed_key(key, "navItem") {
                    nav_items.get(i).map(|n| n.content.as_str())
                } else {
                    indexed_key(key, "cta")
                        .and_then(|i| cta_items.get(i))
                        .map(|c| c.content.as_str())
                }
            }
            Self::Hero { title, subtitle } => match key {
                "title" => Some(title.as_str()),
                "subtitle" => Some(subtitle.as_str()),
                _ => None,
            },
            Self::Footer { text } | Self::Text { text } => (key == "text").then_some(text.as_str()),
            Self::Empty => None,
        }
    }

    fn field_mut(&mut self, key: &str) -> Option<&mut String> {
        match self {
            Self::Header {
                title,
                nav_items,
                cta_items,
            } => {
                if key == "title" {
                    Some(title)
                } else if let Some(i) = indexed_key(key, "navItem") {
                    nav_items.get_mut(i).map(|n| &mut n.content)
                } else {
                    indexed_key(key, "cta")
                        .and_then(|i| cta_items.get_mut(i))
                        .map(|c| &mut c.content)
                }
            }
            Self::Hero { title, subtitle } => match key {
                "title" => Some(title),
                "subtitle" => Some(subtitle),
                _ => None,
            },
            Self::Footer { text } | Self::Text { text } => (key == "text").then_some(text),
            Self::Empty => None,
        }
    }

    /// Write a content field. `None` when the key names no text field,
    /// `Some(changed)` otherwise.
    pub fn set_field(&mut self, key: &str, value: &str) -> Option<bool> {
        let slot = self.field_mut(key)?;
        if *slot == value {
            return Some(false);
        }
        value.clone_into(slot);
        Some(true)
    }

    pub fn set_primary_text(&mut self, value: &str) -> bool {
        let key = match self {
            Self::Header { .. } | Self::Hero { .. } => "title",
            Self::Footer { .. } | Self::Text { .. } => "text",
            Self::Empty => return false,
        };
        self.set_field(key, value).unwrap_or(false)
    }
}

// ─── Blocks ──────────────────────────────────────────────────────────────

/// Template-level properties of a block.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BlockProps {
    /// Style of the block root.
    #[serde(default)]
    pub style: StyleMap,
    /// Style buckets of the template's addressable sub-elements.
    #[serde(default)]
    pub elements: BTreeMap<String, ElementStyle>,
    #[serde(default)]
    pub content: BlockContent,
}

/// A top-level positioned unit on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: NodeId,
    /// Template or primitive tag (`header1`, `hero`, `h1`, ...).
    #[serde(rename = "type")]
    pub block_type: String,
    pub position: Position,
    pub size: Size,
    #[serde(default)]
    pub props: BlockProps,
    #[serde(default, skip_serializing_if = "ElementTree::is_empty")]
    pub inserts: ElementTree,
}

impl Block {
    /// New block with a freshly minted id.
    pub fn new(block_type: impl Into<String>, position: Position, size: Size) -> Self {
        Self {
            id: NodeId::mint(IdKind::Block),
            block_type: block_type.into(),
            position,
            size,
            props: BlockProps::default(),
            inserts: ElementTree::new(),
        }
    }

    #[must_use]
    pub fn with_props(mut self, props: BlockProps) -> Self {
        self.props = props;
        self
    }

    pub fn rect(&self) -> Rect {
        Rect::from_parts(self.position, self.size)
    }

    /// Returns `true` if the rect changed.
    pub fn set_rect(&mut self, rect: Rect) -> bool {
        if self.rect() == rect {
            return false;
        }
        self.position = rect.position();
        self.size = rect.size();
        true
    }

    /// Whether `key` addresses something inside this block: a keyed
    /// template element, a content field, or an inserted element id.
    pub fn has_element(&self, key: &str) -> bool {
        self.props.elements.contains_key(key)
            || self.props.content.field(key).is_some()
            || NodeId::lookup(key).is_some_and(|id| self.inserts.contains(id))
    }

    /// Current style buckets of an element, keyed or inserted.
    pub fn element_style(&self, key: &str) -> Option<&ElementStyle> {
        if let Some(style) = self.props.elements.get(key) {
            return Some(style);
        }
        let id = NodeId::lookup(key)?;
        self.inserts.get(id).map(|el| &el.style)
    }

    fn inserted_mut(&mut self, key: &str) -> Option<&mut InsertedElement> {
        let id = NodeId::lookup(key)?;
        self.inserts.get_mut(id)
    }
}

// ─── Write outcomes ──────────────────────────────────────────────────────

/// Why a style write was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RejectReason {
    /// Text style aimed at a structural-only container.
    StructuralContainer,
    /// Text style aimed at an element with no text (e.g. an image).
    NoText,
    /// The template declares no element under this key.
    UnknownSlot,
}

/// Result of a style write. Writes never panic on a bad address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "camelCase")]
pub enum WriteOutcome {
    Applied,
    Unchanged,
    Rejected(RejectReason),
    NotFound,
}

impl WriteOutcome {
    pub fn changed(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

// ─── Canvas ──────────────────────────────────────────────────────────────

/// The authoritative ordered collection of blocks.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Canvas {
    blocks: Vec<Block>,
}

impl Canvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        self.blocks.iter().position(|b| b.id == id)
    }

    pub fn get(&self, id: NodeId) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Block> {
        self.blocks.iter_mut().find(|b| b.id == id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.index_of(id).is_some()
    }

    /// Append a block on top of the paint order.
    pub fn add_block(&mut self, block: Block) -> NodeId {
        let id = block.id;
        self.blocks.push(block);
        id
    }

    pub fn remove_block(&mut self, id: NodeId) -> Option<Block> {
        let idx = self.index_of(id)?;
        Some(self.blocks.remove(idx))
    }

    /// Remove every listed block. Returns the ids that were present.
    pub fn remove_blocks(&mut self, ids: &[NodeId]) -> Vec<NodeId> {
        let removed: Vec<NodeId> = self
            .blocks
            .iter()
            .map(|b| b.id)
            .filter(|id| ids.contains(id))
            .collect();
        self.blocks.retain(|b| !ids.contains(&b.id));
        removed
    }

    pub fn set_rect(&mut self, id: NodeId, rect: Rect) -> bool {
        self.get_mut(id).is_some_and(|b| b.set_rect(rect))
    }

    /// Shallow-merge `patch` into the block root style.
    pub fn update_block_style(&mut self, id: NodeId, patch: &StyleMap) -> bool {
        self.get_mut(id).is_some_and(|b| b.props.style.merge(patch))
    }

    /// Merge one property into an element's `style` or `textStyle`.
    ///
    /// `element_key` is either a keyed template element or an inserted
    /// element id (any depth). The template schema decides whether the
    /// element can take text style; structural containers refuse it.
    pub fn update_element_style(
        &mut self,
        registry: &dyn TemplateRegistry,
        block_id: NodeId,
        element_key: &str,
        key: &str,
        value: StyleValue,
        bucket: StyleBucket,
    ) -> WriteOutcome {
        let Some(block) = self.get_mut(block_id) else {
            return WriteOutcome::NotFound;
        };

        if let Some(el) = block.inserted_mut(element_key) {
            if bucket == StyleBucket::Text && !el.kind.accepts_text_style() {
                log::warn!("text style {key} refused on {} element", el.kind.as_str());
                return WriteOutcome::Rejected(RejectReason::NoText);
            }
            return outcome(el.style.bucket_mut(bucket).set(key, value));
        }

        match registry.template(&block.block_type) {
            Some(template) => match template.schema.role_of(element_key) {
                Some(SlotRole::Structural) if bucket == StyleBucket::Text => {
                    log::warn!(
                        "text style {key} refused on structural container {element_key} of {}",
                        block.block_type
                    );
                    WriteOutcome::Rejected(RejectReason::StructuralContainer)
                }
                Some(_) => {
                    let entry = block
                        .props
                        .elements
                        .entry(element_key.to_string())
                        .or_default();
                    outcome(entry.bucket_mut(bucket).set(key, value))
                }
                None => WriteOutcome::Rejected(RejectReason::UnknownSlot),
            },
            // Unregistered type: only already-present keys are addressable.
            None => match block.props.elements.get_mut(element_key) {
                Some(entry) => outcome(entry.bucket_mut(bucket).set(key, value)),
                None => WriteOutcome::NotFound,
            },
        }
    }

    /// Like `update_element_style`, picking the bucket from the property name.
    pub fn set_element_property(
        &mut self,
        registry: &dyn TemplateRegistry,
        block_id: NodeId,
        element_key: &str,
        key: &str,
        value: StyleValue,
    ) -> WriteOutcome {
        let bucket = classify_property(key);
        self.update_element_style(registry, block_id, element_key, key, value, bucket)
    }

    /// Replace the block's primary text (title or body text).
    pub fn update_block_content(&mut self, id: NodeId, value: &str) -> bool {
        self.get_mut(id)
            .is_some_and(|b| b.props.content.set_primary_text(value))
    }

    /// Replace the text of one element: a content field (`title`,
    /// `navItem-1`, `cta-0`...) or an inserted element.
    pub fn update_element_content(&mut self, id: NodeId, element_key: &str, value: &str) -> bool {
        let Some(block) = self.get_mut(id) else {
            return false;
        };
        if let Some(changed) = block.props.content.set_field(element_key, value) {
            return changed;
        }
        match block.inserted_mut(element_key) {
            Some(el) if el.content != value => {
                value.clone_into(&mut el.content);
                true
            }
            _ => false,
        }
    }

    pub fn insert_element(
        &mut self,
        block_id: NodeId,
        parent: Option<NodeId>,
        element: InsertedElement,
    ) -> Result<NodeId, TreeError> {
        let block = self
            .get_mut(block_id)
            .ok_or(TreeError::UnknownBlock(block_id))?;
        block.inserts.insert(parent, element)
    }

    /// Replace an inserted element's editable fields (rich element edit form).
    pub fn edit_element(
        &mut self,
        block_id: NodeId,
        element: InsertedElement,
    ) -> Result<bool, TreeError> {
        element.validate()?;
        let block = self
            .get_mut(block_id)
            .ok_or(TreeError::UnknownBlock(block_id))?;
        let Some(current) = block.inserts.get_mut(element.id) else {
            return Ok(false);
        };
        let changed = current.kind != element.kind
            || current.content != element.content
            || current.url != element.url;
        current.kind = element.kind;
        current.content = element.content;
        current.url = element.url;
        Ok(changed)
    }

    /// Remove an inserted element and its subtree. Returns removed ids.
    pub fn remove_element(&mut self, block_id: NodeId, element_id: NodeId) -> Vec<NodeId> {
        self.get_mut(block_id)
            .map(|b| b.inserts.remove(element_id))
            .unwrap_or_default()
    }

    /// Commit an inserted element's rect (relative to its parent).
    pub fn set_element_rect(&mut self, block_id: NodeId, element_id: NodeId, rect: Rect) -> bool {
        let Some(el) = self
            .get_mut(block_id)
            .and_then(|b| b.inserts.get_mut(element_id))
        else {
            return false;
        };
        let before = (el.position, el.width, el.height);
        el.position = rect.position();
        el.width = Some(rect.width);
        el.height = Some(rect.height);
        before != (el.position, el.width, el.height)
    }

    pub fn reorder_element(&mut self, block_id: NodeId, dragged: NodeId, target: NodeId) -> bool {
        self.get_mut(block_id)
            .is_some_and(|b| b.inserts.reorder(dragged, target))
    }

    // ─── Z-order ─────────────────────────────────────────────────────────

    /// Swap one step toward the top. Returns true if the order changed.
    pub fn bring_forward(&mut self, id: NodeId) -> bool {
        match self.index_of(id) {
            Some(i) if i + 1 < self.blocks.len() => {
                self.blocks.swap(i, i + 1);
                true
            }
            _ => false,
        }
    }

    pub fn send_backward(&mut self, id: NodeId) -> bool {
        match self.index_of(id) {
            Some(i) if i > 0 => {
                self.blocks.swap(i, i - 1);
                true
            }
            _ => false,
        }
    }

    pub fn bring_to_front(&mut self, id: NodeId) -> bool {
        match self.index_of(id) {
            Some(i) if i + 1 < self.blocks.len() => {
                let block = self.blocks.remove(i);
                self.blocks.push(block);
                true
            }
            _ => false,
        }
    }

    pub fn send_to_back(&mut self, id: NodeId) -> bool {
        match self.index_of(id) {
            Some(i) if i > 0 => {
                let block = self.blocks.remove(i);
                self.blocks.insert(0, block);
                true
            }
            _ => false,
        }
    }

    /// Topmost block whose rect contains `(x, y)` (virtual coordinates).
    pub fn block_at(&self, x: f32, y: f32) -> Option<&Block> {
        self.blocks.iter().rev().find(|b| b.rect().contains(x, y))
    }
}

fn outcome(changed: bool) -> WriteOutcome {
    if changed {
        WriteOutcome::Applied
    } else {
        WriteOutcome::Unchanged
    }
}
