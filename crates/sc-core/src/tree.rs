//! Arena-backed tree of inserted elements nested inside a block.
//!
//! Rich elements (links, buttons, images, icons, text) can be dropped into
//! a block and nested inside each other. They live in a `StableDiGraph`
//! with parent → child edges plus an id index, so a style write touches
//! exactly one node and lookups by id are O(1) at any depth.
//!
//! On the wire the tree is the familiar nested array shape:
//! `[{ id, kind, content, ..., elements: [ ... ] }]`.

use crate::geometry::{Position, Rect};
use crate::id::{IdKind, NodeId};
use crate::style::ElementStyle;
use petgraph::Direction;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;
use std::collections::HashMap;
use thiserror::Error;

// ─── Elements ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Link,
    Button,
    Image,
    Icon,
    Text,
    Heading,
    Paragraph,
}

impl ElementKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "link" => Some(Self::Link),
            "button" => Some(Self::Button),
            "image" => Some(Self::Image),
            "icon" => Some(Self::Icon),
            "text" => Some(Self::Text),
            "heading" => Some(Self::Heading),
            "paragraph" => Some(Self::Paragraph),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Link => "link",
            Self::Button => "button",
            Self::Image => "image",
            Self::Icon => "icon",
            Self::Text => "text",
            Self::Heading => "heading",
            Self::Paragraph => "paragraph",
        }
    }

    /// Images have no text to style. Icons are glyphs, so color and size apply.
    pub fn accepts_text_style(&self) -> bool {
        !matches!(self, Self::Image)
    }

    /// Kinds whose edit form carries a URL field.
    pub fn has_url(&self) -> bool {
        matches!(self, Self::Link | Self::Button | Self::Image)
    }
}

/// A rich element placed inside a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertedElement {
    pub id: NodeId,
    pub kind: ElementKind,
    /// Visible text; the icon name for icons, alt text for images.
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Offset from the parent element (or the block for top-level elements).
    #[serde(default)]
    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    #[serde(flatten)]
    pub style: ElementStyle,
}

impl InsertedElement {
    pub fn new(kind: ElementKind, content: impl Into<String>) -> Self {
        Self {
            id: NodeId::mint(IdKind::Element),
            kind,
            content: content.into(),
            url: None,
            position: Position::default(),
            width: None,
            height: None,
            style: ElementStyle::default(),
        }
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    #[must_use]
    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.position = Position::new(x, y);
        self
    }

    #[must_use]
    pub fn sized(mut self, width: f32, height: f32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Local rect relative to the parent. Auto-sized elements have none.
    pub fn local_rect(&self) -> Option<Rect> {
        Some(Rect::new(
            self.position.x,
            self.position.y,
            self.width?,
            self.height?,
        ))
    }

    /// Insert/edit form validation: every element needs visible text.
    pub fn validate(&self) -> Result<(), TreeError> {
        if self.content.trim().is_empty() {
            return Err(TreeError::EmptyContent(self.kind));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TreeError {
    #[error("{} elements need text", .0.as_str())]
    EmptyContent(ElementKind),
    #[error("no element {0} to nest under")]
    UnknownParent(NodeId),
    #[error("element id {0} is already in use")]
    DuplicateId(NodeId),
    #[error("no block {0}")]
    UnknownBlock(NodeId),
}

// ─── Tree ────────────────────────────────────────────────────────────────

type Siblings = SmallVec<[NodeIndex; 4]>;

/// Nested inserted elements of one block.
#[derive(Debug, Clone, Default)]
pub struct ElementTree {
    graph: StableDiGraph<InsertedElement, ()>,
    id_index: HashMap<NodeId, NodeIndex>,
    /// Top-level elements in paint order.
    roots: Siblings,
    /// Child paint order per parent.
    child_order: HashMap<NodeIndex, Siblings>,
}

impl ElementTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.id_index.is_empty()
    }

    pub fn len(&self) -> usize {
        self.id_index.len()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.id_index.contains_key(&id)
    }

    pub fn get(&self, id: NodeId) -> Option<&InsertedElement> {
        self.id_index.get(&id).map(|idx| &self.graph[*idx])
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut InsertedElement> {
        self.id_index
            .get(&id)
            .copied()
            .map(|idx| &mut self.graph[idx])
    }

    /// Add `element` under `parent` (or at the top level), appended last.
    pub fn insert(
        &mut self,
        parent: Option<NodeId>,
        element: InsertedElement,
    ) -> Result<NodeId, TreeError> {
        element.validate()?;
        self.attach(parent, element)
    }

    /// Insertion without content validation (used when loading documents).
    fn attach(
        &mut self,
        parent: Option<NodeId>,
        element: InsertedElement,
    ) -> Result<NodeId, TreeError> {
        let id = element.id;
        if self.contains(id) {
            return Err(TreeError::DuplicateId(id));
        }
        let parent_idx = match parent {
            Some(p) => Some(self.index_of(p).ok_or(TreeError::UnknownParent(p))?),
            None => None,
        };
        let idx = self.graph.add_node(element);
        self.id_index.insert(id, idx);
        match parent_idx {
            Some(p) => {
                self.graph.add_edge(p, idx, ());
                self.child_order.entry(p).or_default().push(idx);
            }
            None => self.roots.push(idx),
        }
        Ok(id)
    }

    fn index_of(&self, id: NodeId) -> Option<NodeIndex> {
        self.id_index.get(&id).copied()
    }

    fn parent_index(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(idx, Direction::Incoming)
            .next()
    }

    fn siblings(&self, parent: Option<NodeIndex>) -> &[NodeIndex] {
        match parent {
            Some(p) => self.child_order.get(&p).map_or(&[], |v| v.as_slice()),
            None => &self.roots,
        }
    }

    fn siblings_mut(&mut self, parent: Option<NodeIndex>) -> &mut Siblings {
        match parent {
            Some(p) => self.child_order.entry(p).or_default(),
            None => &mut self.roots,
        }
    }

    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        let idx = self.index_of(id)?;
        self.parent_index(idx).map(|p| self.graph[p].id)
    }

    /// Children of `parent` (or the top level) in paint order.
    pub fn children_of(&self, parent: Option<NodeId>) -> Vec<NodeId> {
        let parent_idx = match parent {
            Some(p) => match self.index_of(p) {
                Some(idx) => Some(idx),
                None => return Vec::new(),
            },
            None => None,
        };
        self.siblings(parent_idx)
            .iter()
            .map(|idx| self.graph[*idx].id)
            .collect()
    }

    /// Ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cur = self.index_of(id);
        while let Some(idx) = cur.and_then(|i| self.parent_index(i)) {
            out.push(self.graph[idx].id);
            cur = Some(idx);
        }
        out
    }

    pub fn is_ancestor_of(&self, ancestor: NodeId, descendant: NodeId) -> bool {
        self.ancestors(descendant).contains(&ancestor)
    }

    /// Every element id in pre-order (parents before children).
    pub fn flatten(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.len());
        for &root in &self.roots {
            self.collect_preorder(root, &mut out);
        }
        out
    }

    fn collect_preorder(&self, idx: NodeIndex, out: &mut Vec<NodeId>) {
        out.push(self.graph[idx].id);
        for &child in self.siblings(Some(idx)) {
            self.collect_preorder(child, out);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &InsertedElement> + '_ {
        self.flatten()
            .into_iter()
            .filter_map(move |id| self.get(id))
    }

    /// Remove `id` and its whole subtree. Returns every removed id
    /// (empty if `id` was not present).
    pub fn remove(&mut self, id: NodeId) -> Vec<NodeId> {
        let Some(idx) = self.index_of(id) else {
            return Vec::new();
        };
        let parent = self.parent_index(idx);
        self.siblings_mut(parent).retain(|s| *s != idx);

        let mut doomed = Vec::new();
        self.collect_preorder(idx, &mut doomed);
        for dead in &doomed {
            if let Some(dead_idx) = self.id_index.remove(dead) {
                self.child_order.remove(&dead_idx);
                self.graph.remove_node(dead_idx);
            }
        }
        doomed
    }

    /// Hover-reorder: move `dragged` into `target`'s slot among
    /// `target`'s siblings, reparenting if they differ. Refuses to move
    /// an element into its own subtree.
    pub fn reorder(&mut self, dragged: NodeId, target: NodeId) -> bool {
        if dragged == target || self.is_ancestor_of(dragged, target) {
            return false;
        }
        let (Some(drag_idx), Some(target_idx)) = (self.index_of(dragged), self.index_of(target))
        else {
            return false;
        };
        let from_parent = self.parent_index(drag_idx);
        let to_parent = self.parent_index(target_idx);
        let Some(target_pos) = self.siblings(to_parent).iter().position(|s| *s == target_idx)
        else {
            return false;
        };

        self.siblings_mut(from_parent).retain(|s| *s != drag_idx);
        let dest = self.siblings_mut(to_parent);
        let at = target_pos.min(dest.len());
        dest.insert(at, drag_idx);

        if from_parent != to_parent {
            if let Some(old) = from_parent
                && let Some(edge) = self.graph.find_edge(old, drag_idx)
            {
                self.graph.remove_edge(edge);
            }
            if let Some(new) = to_parent {
                self.graph.add_edge(new, drag_idx, ());
            }
        }
        true
    }

    /// Deepest element whose rect contains `(x, y)`, given in the block's
    /// local coordinate space. Later siblings paint on top and win.
    pub fn hit_test(&self, x: f32, y: f32) -> Option<NodeId> {
        self.hit_in(&self.roots, x, y)
    }

    fn hit_in(&self, siblings: &[NodeIndex], x: f32, y: f32) -> Option<NodeId> {
        for &idx in siblings.iter().rev() {
            let el = &self.graph[idx];
            let Some(rect) = el.local_rect() else {
                continue;
            };
            if rect.contains(x, y) {
                let inner = self.hit_in(self.siblings(Some(idx)), x - rect.left, y - rect.top);
                return Some(inner.unwrap_or(el.id));
            }
        }
        None
    }

    // ─── Nested interchange form ─────────────────────────────────────────

    pub fn to_nodes(&self) -> Vec<ElementNode> {
        self.roots.iter().map(|&idx| self.node_at(idx)).collect()
    }

    fn node_at(&self, idx: NodeIndex) -> ElementNode {
        ElementNode {
            element: self.graph[idx].clone(),
            elements: self
                .siblings(Some(idx))
                .iter()
                .map(|&c| self.node_at(c))
                .collect(),
        }
    }

    pub fn from_nodes(nodes: Vec<ElementNode>) -> Result<Self, TreeError> {
        let mut tree = Self::new();
        for node in nodes {
            tree.attach_node(None, node)?;
        }
        Ok(tree)
    }

    fn attach_node(&mut self, parent: Option<NodeId>, node: ElementNode) -> Result<(), TreeError> {
        let id = self.attach(parent, node.element)?;
        for child in node.elements {
            self.attach_node(Some(id), child)?;
        }
        Ok(())
    }
}

impl PartialEq for ElementTree {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.to_nodes() == other.to_nodes()
    }
}

/// One element plus its children, as stored in documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementNode {
    #[serde(flatten)]
    pub element: InsertedElement,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub elements: Vec<ElementNode>,
}

impl Serialize for ElementTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_nodes().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ElementTree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let nodes = Vec::<ElementNode>::deserialize(deserializer)?;
        ElementTree::from_nodes(nodes).map_err(serde::de::Error::custom)
    }
}
