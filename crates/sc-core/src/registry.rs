//! Template registry: the catalog of block types the sidebar offers.
//!
//! Each template declares a default size, default props, and a schema of
//! addressable element slots. The schema is what decides whether an element
//! can take text style: a `Structural` slot (a nav wrapper, a list, the
//! header shell) only takes box style.

use crate::geometry::{Position, Size};
use crate::model::{Block, BlockContent, BlockProps, ContentItem, indexed_key};
use crate::style::ElementStyle;
use serde::{Deserialize, Serialize};

/// Size used for types the registry has never heard of.
pub const FALLBACK_SIZE: Size = Size::new(300.0, 100.0);

// ─── Schema ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SlotRole {
    /// Renders text: takes both `style` and `textStyle`.
    Text,
    /// Pure layout wrapper: takes `style` only.
    Structural,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKey {
    Exact(&'static str),
    /// Repeated item: `navItem` matches `navItem-0`, `navItem-1`, ...
    Indexed(&'static str),
}

impl SlotKey {
    pub fn matches(&self, key: &str) -> bool {
        match self {
            Self::Exact(k) => *k == key,
            Self::Indexed(prefix) => indexed_key(key, prefix).is_some(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementSlot {
    pub key: SlotKey,
    pub role: SlotRole,
}

/// Declared element slots of one template.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateSchema {
    slots: Vec<ElementSlot>,
}

impl TemplateSchema {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn text(self, key: &'static str) -> Self {
        self.slot(SlotKey::Exact(key), SlotRole::Text)
    }

    #[must_use]
    pub fn text_list(self, prefix: &'static str) -> Self {
        self.slot(SlotKey::Indexed(prefix), SlotRole::Text)
    }

    #[must_use]
    pub fn structural(self, key: &'static str) -> Self {
        self.slot(SlotKey::Exact(key), SlotRole::Structural)
    }

    #[must_use]
    pub fn slot(mut self, key: SlotKey, role: SlotRole) -> Self {
        self.slots.push(ElementSlot { key, role });
        self
    }

    /// Role of the element under `key`, or `None` if the template has no
    /// such element.
    pub fn role_of(&self, key: &str) -> Option<SlotRole> {
        self.slots
            .iter()
            .find(|s| s.key.matches(key))
            .map(|s| s.role)
    }

    /// Whether a fixed (non-indexed) slot named `key` exists. Indexed
    /// items only exist while their content entry does.
    pub fn declares(&self, key: &str) -> bool {
        self.slots
            .iter()
            .any(|s| matches!(s.key, SlotKey::Exact(k) if k == key))
    }

    pub fn slots(&self) -> &[ElementSlot] {
        &self.slots
    }
}

// ─── Templates ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Template {
    pub block_type: &'static str,
    /// Label shown in the component sidebar.
    pub name: &'static str,
    pub default_size: Size,
    pub default_props: BlockProps,
    pub schema: TemplateSchema,
}

/// Source of templates for placement, styling and export.
pub trait TemplateRegistry {
    fn template(&self, block_type: &str) -> Option<&Template>;

    /// All registered type tags, in sidebar order.
    fn types(&self) -> Vec<&'static str>;

    fn default_size(&self, block_type: &str) -> Size {
        self.template(block_type)
            .map_or(FALLBACK_SIZE, |t| t.default_size)
    }

    fn default_props(&self, block_type: &str) -> BlockProps {
        self.template(block_type)
            .map(|t| t.default_props.clone())
            .unwrap_or_default()
    }

    /// Whether `key` names an element of `block`: anything the block
    /// already holds, or a fixed slot its template declares even if it has
    /// never been styled.
    fn addresses(&self, block: &Block, key: &str) -> bool {
        block.has_element(key)
            || self
                .template(&block.block_type)
                .is_some_and(|t| t.schema.declares(key))
    }

    /// Build a fresh block of `block_type` at `position` with default size
    /// and props. Unknown types still produce a block.
    fn instantiate(&self, block_type: &str, position: Position) -> Block {
        Block::new(block_type, position, self.default_size(block_type))
            .with_props(self.default_props(block_type))
    }
}

/// The templates shipped with the builder.
#[derive(Debug, Clone)]
pub struct BuiltinTemplates {
    templates: Vec<Template>,
}

impl Default for BuiltinTemplates {
    fn default() -> Self {
        Self::new()
    }
}

impl BuiltinTemplates {
    pub fn new() -> Self {
        let header_schema = || {
            TemplateSchema::new()
                .structural("header")
                .text("logo")
                .text("title")
                .structural("nav")
                .structural("navList")
                .text_list("navItem")
                .structural("cta")
                .text_list("cta")
        };
        let text_schema = || TemplateSchema::new().text("text");

        let templates = vec![
            Template {
                block_type: "header1",
                name: "Header Style 1",
                default_size: Size::new(1000.0, 150.0),
                default_props: BlockProps {
                    content: BlockContent::Header {
                        title: "My Site".into(),
                        nav_items: vec![ContentItem::new("Home"), ContentItem::new("About")],
                        cta_items: vec![ContentItem::new("Get Started")],
                    },
                    elements: keyed(&["logo", "title", "nav", "navItem-0", "navItem-1", "cta", "cta-0"]),
                    ..BlockProps::default()
                },
                schema: header_schema(),
            },
            Template {
                block_type: "header2",
                name: "Header Style 2",
                default_size: Size::new(1000.0, 150.0),
                default_props: BlockProps {
                    content: BlockContent::Header {
                        title: "Header 2".into(),
                        nav_items: Vec::new(),
                        cta_items: Vec::new(),
                    },
                    ..BlockProps::default()
                },
                schema: header_schema(),
            },
            Template {
                block_type: "hero",
                name: "Hero Section",
                default_size: Size::new(1000.0, 400.0),
                default_props: BlockProps {
                    content: BlockContent::Hero {
                        title: "Hero Title".into(),
                        subtitle: "Hero Subtitle".into(),
                    },
                    elements: keyed(&["title", "subtitle"]),
                    ..BlockProps::default()
                },
                schema: TemplateSchema::new().text("title").text("subtitle"),
            },
            Template {
                block_type: "footer1",
                name: "Footer",
                default_size: Size::new(1000.0, 100.0),
                default_props: BlockProps {
                    content: BlockContent::Footer {
                        text: "© 2025 My Company".into(),
                    },
                    elements: keyed(&["text"]),
                    ..BlockProps::default()
                },
                schema: text_schema(),
            },
            primitive("h1", "Heading", BlockContent::Text { text: "Heading".into() }),
            primitive("h2", "Subheading", BlockContent::Text { text: "Subheading".into() }),
            primitive("p", "Paragraph", BlockContent::Text { text: "Paragraph text".into() }),
            primitive("div", "Container", BlockContent::Empty),
            primitive("section", "Section", BlockContent::Empty),
        ];
        Self { templates }
    }
}

impl TemplateRegistry for BuiltinTemplates {
    fn template(&self, block_type: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.block_type == block_type)
    }

    fn types(&self) -> Vec<&'static str> {
        self.templates.iter().map(|t| t.block_type).collect()
    }
}

fn keyed(keys: &[&str]) -> std::collections::BTreeMap<String, ElementStyle> {
    keys.iter()
        .map(|k| (k.to_string(), ElementStyle::default()))
        .collect()
}

fn primitive(block_type: &'static str, name: &'static str, content: BlockContent) -> Template {
    let has_text = content != BlockContent::Empty;
    Template {
        block_type,
        name,
        default_size: FALLBACK_SIZE,
        default_props: BlockProps {
            content,
            elements: if has_text { keyed(&["text"]) } else { Default::default() },
            ..BlockProps::default()
        },
        schema: if has_text {
            TemplateSchema::new().text("text")
        } else {
            TemplateSchema::new()
        },
    }
}
