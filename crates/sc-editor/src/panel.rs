//! Style/content panel bound to the current selection.
//!
//! The panel is a view plus commands. `sync` reloads the editable field
//! values from whatever the selection points at; `set_field` writes one
//! field straight through the store, so the canvas previews the change
//! immediately. There is no save step: `close` only hides the panel.
//!
//! Text content typed into the panel runs in a history session so a
//! burst of keystrokes undoes as one step.

use crate::selection::Selection;
use crate::store::{CanvasMutation, EditorStore};
use sc_core::geometry::{Rect, Size};
use sc_core::id::NodeId;
use sc_core::registry::SlotRole;
use sc_core::style::{StyleMap, StyleValue, classify_property, normalize_hex_color, parse_css_length};
use sc_core::{Block, WriteOutcome};
use serde::Serialize;

/// Root font size used to resolve `rem`/`em` font sizes.
const ROOT_FONT_PX: f64 = 16.0;

/// An editable field of the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelField {
    BackgroundColor,
    TextColor,
    FontSize,
    FontFamily,
    Bold,
    Italic,
    TextAlign,
    Border,
    BorderRadius,
    Padding,
    Margin,
    Width,
    Height,
    Content,
}

impl PanelField {
    pub const ALL: [PanelField; 14] = [
        Self::BackgroundColor,
        Self::TextColor,
        Self::FontSize,
        Self::FontFamily,
        Self::Bold,
        Self::Italic,
        Self::TextAlign,
        Self::Border,
        Self::BorderRadius,
        Self::Padding,
        Self::Margin,
        Self::Width,
        Self::Height,
        Self::Content,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == s)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BackgroundColor => "backgroundColor",
            Self::TextColor => "textColor",
            Self::FontSize => "fontSize",
            Self::FontFamily => "fontFamily",
            Self::Bold => "bold",
            Self::Italic => "italic",
            Self::TextAlign => "textAlign",
            Self::Border => "border",
            Self::BorderRadius => "borderRadius",
            Self::Padding => "padding",
            Self::Margin => "margin",
            Self::Width => "width",
            Self::Height => "height",
            Self::Content => "content",
        }
    }

    /// The style property this field writes. `None` for geometry and
    /// content fields.
    pub fn property(&self) -> Option<&'static str> {
        Some(match self {
            Self::BackgroundColor => "backgroundColor",
            Self::TextColor => "color",
            Self::FontSize => "fontSize",
            Self::FontFamily => "fontFamily",
            Self::Bold => "fontWeight",
            Self::Italic => "fontStyle",
            Self::TextAlign => "textAlign",
            Self::Border => "border",
            Self::BorderRadius => "borderRadius",
            Self::Padding => "padding",
            Self::Margin => "margin",
            Self::Width | Self::Height | Self::Content => return None,
        })
    }

    /// Convert the raw input into the stored value. `None` when the input
    /// can't be read (a font size of `"big"`).
    fn value(&self, raw: &str) -> Option<StyleValue> {
        let raw = raw.trim();
        match self {
            Self::FontSize => parse_css_length(raw)
                .and_then(|l| l.to_px(ROOT_FONT_PX))
                .map(StyleValue::Number),
            Self::Bold => Some(if truthy(raw) { "bold" } else { "normal" }.into()),
            Self::Italic => Some(if truthy(raw) { "italic" } else { "normal" }.into()),
            _ => Some(raw.into()),
        }
    }
}

fn truthy(raw: &str) -> bool {
    matches!(raw, "true" | "1" | "on" | "bold" | "italic")
}

// ─── View ────────────────────────────────────────────────────────────────

/// Field values for a selected block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockFields {
    pub block_id: NodeId,
    pub block_type: String,
    pub background_color: Option<String>,
    pub border: Option<String>,
    pub border_radius: Option<String>,
    pub padding: Option<String>,
    pub margin: Option<String>,
    pub width: f32,
    pub height: f32,
    pub content: Option<String>,
}

/// Field values for a selected element. Typography fields are `None`
/// for structural containers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementFields {
    pub block_id: NodeId,
    pub element_id: NodeId,
    pub text_capable: bool,
    pub text_color: Option<String>,
    pub font_size: Option<f64>,
    pub font_family: Option<String>,
    pub bold: bool,
    pub italic: bool,
    pub text_align: Option<String>,
    pub background_color: Option<String>,
    pub padding: Option<String>,
    pub border: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PanelView {
    Empty { message: String },
    NotStyleable { message: String },
    Block(BlockFields),
    Element(ElementFields),
}

impl Default for PanelView {
    fn default() -> Self {
        Self::Empty {
            message: "Select a block or element to edit".into(),
        }
    }
}

fn text_of(map: &StyleMap, key: &str) -> Option<String> {
    map.get(key).map(ToString::to_string)
}

/// Colors go to a picker: expand short hex, keep anything else as is.
fn color_of(map: &StyleMap, key: &str) -> Option<String> {
    text_of(map, key).map(|c| normalize_hex_color(&c).unwrap_or(c))
}

/// Whether `key` can take text style. `None` when it isn't styleable.
fn text_capability(store: &EditorStore, block: &Block, key: &str) -> Option<bool> {
    if let Some(el) = NodeId::lookup(key).and_then(|id| block.inserts.get(id)) {
        return Some(el.kind.accepts_text_style());
    }
    match store.registry().template(&block.block_type) {
        Some(template) => template
            .schema
            .role_of(key)
            .map(|role| role == SlotRole::Text),
        None => block.has_element(key).then_some(true),
    }
}

fn element_content(block: &Block, key: &str) -> Option<String> {
    if let Some(text) = block.props.content.field(key) {
        return Some(text.to_string());
    }
    let id = NodeId::lookup(key)?;
    block.inserts.get(id).map(|el| el.content.clone())
}

fn build_view(store: &EditorStore, selection: Selection) -> PanelView {
    match selection {
        Selection::None => PanelView::default(),
        Selection::Block { block_id } => {
            let Some(block) = store.canvas().get(block_id) else {
                return PanelView::default();
            };
            let style = &block.props.style;
            PanelView::Block(BlockFields {
                block_id,
                block_type: block.block_type.clone(),
                background_color: color_of(style, "backgroundColor"),
                border: text_of(style, "border"),
                border_radius: text_of(style, "borderRadius"),
                padding: text_of(style, "padding"),
                margin: text_of(style, "margin"),
                width: block.size.width,
                height: block.size.height,
                content: block.props.content.primary_text().map(str::to_string),
            })
        }
        Selection::Element {
            block_id,
            element_id,
        } => {
            let Some(block) = store.canvas().get(block_id) else {
                return PanelView::default();
            };
            let key = element_id.as_str();
            let Some(text_capable) = text_capability(store, block, key) else {
                return PanelView::NotStyleable {
                    message: format!("{key} can't be styled"),
                };
            };
            let buckets = block.element_style(key).cloned().unwrap_or_default();
            let (style, text) = (&buckets.style, &buckets.text_style);
            let typography = |v: Option<String>| v.filter(|_| text_capable);
            PanelView::Element(ElementFields {
                block_id,
                element_id,
                text_capable,
                text_color: typography(color_of(text, "color")),
                font_size: text_capable
                    .then(|| text.get("fontSize").and_then(StyleValue::as_number))
                    .flatten(),
                font_family: typography(text_of(text, "fontFamily")),
                bold: text_capable && text.get("fontWeight").is_some_and(|v| v.to_string() == "bold"),
                italic: text_capable && text.get("fontStyle").is_some_and(|v| v.to_string() == "italic"),
                text_align: typography(text_of(text, "textAlign")),
                background_color: color_of(style, "backgroundColor"),
                padding: text_of(style, "padding"),
                border: text_of(style, "border"),
                content: element_content(block, key),
            })
        }
    }
}

// ─── Panel ───────────────────────────────────────────────────────────────

/// The panel's state across selections.
#[derive(Debug, Default)]
pub struct StylePanel {
    open: bool,
    bound: Selection,
    view: PanelView,
    text_session: bool,
}

impl StylePanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn bound(&self) -> Selection {
        self.bound
    }

    pub fn view(&self) -> &PanelView {
        &self.view
    }

    /// Show the panel for the current selection.
    pub fn open(&mut self, store: &EditorStore) {
        self.open = true;
        self.sync(store);
    }

    /// Done. Closes any open text session first.
    pub fn close(&mut self, store: &mut EditorStore) {
        self.end_text_edit(store);
        self.open = false;
    }

    /// Re-bind to the store's selection and reload field values. A new
    /// target opens the panel; re-selecting keeps it as it is.
    pub fn sync(&mut self, store: &EditorStore) {
        let selection = store.selection();
        if selection != self.bound {
            self.open |= !selection.is_none();
            self.bound = selection;
        }
        self.view = build_view(store, selection);
    }

    /// Write one field through the store and refresh the view.
    pub fn set_field(&mut self, store: &mut EditorStore, field: PanelField, value: &str) -> WriteOutcome {
        self.sync(store);
        let outcome = write_field(store, self.bound, field, value);
        self.sync(store);
        outcome
    }

    /// Start a typing burst on the bound block or element.
    pub fn begin_text_edit(&mut self, store: &mut EditorStore) -> bool {
        if self.text_session || self.bound.is_none() {
            return false;
        }
        store.begin_session("Edit text");
        if let Selection::Element {
            block_id,
            element_id,
        } = self.bound
        {
            store.set_editing(Some((block_id, element_id)));
        }
        self.text_session = true;
        true
    }

    /// One keystroke's worth of content. Live while a text session is open.
    pub fn input_text(&mut self, store: &mut EditorStore, value: &str) -> WriteOutcome {
        self.set_field(store, PanelField::Content, value)
    }

    /// Finish the typing burst. Returns `true` if an undo step was recorded.
    pub fn end_text_edit(&mut self, store: &mut EditorStore) -> bool {
        if !std::mem::take(&mut self.text_session) {
            return false;
        }
        store.set_editing(None);
        let recorded = store.end_session();
        self.sync(store);
        recorded
    }
}

/// Route one field write to the right mutation.
fn write_field(store: &mut EditorStore, target: Selection, field: PanelField, raw: &str) -> WriteOutcome {
    let label = format!("Set {}", field.as_str());
    match (target, field) {
        (Selection::None, _) => WriteOutcome::NotFound,

        (Selection::Block { block_id }, PanelField::Content) => store.apply(
            CanvasMutation::SetBlockContent {
                id: block_id,
                value: raw.to_string(),
            },
            "Edit text",
        ),
        (Selection::Block { block_id }, PanelField::Width | PanelField::Height) => {
            let Some(rect) = store.canvas().get(block_id).map(Block::rect) else {
                return WriteOutcome::NotFound;
            };
            let min = store.config().min_size;
            let Some(rect) = resized(rect, field, raw, Size::new(min.width, min.height)) else {
                return WriteOutcome::Unchanged;
            };
            store.apply(CanvasMutation::SetRect { id: block_id, rect }, "Resize block")
        }
        (Selection::Block { block_id }, _) => {
            let (Some(prop), Some(value)) = (field.property(), field.value(raw)) else {
                return WriteOutcome::Unchanged;
            };
            let mut patch = StyleMap::new();
            patch.set(prop, value);
            store.apply(CanvasMutation::PatchBlockStyle { id: block_id, patch }, &label)
        }

        (
            Selection::Element {
                block_id,
                element_id,
            },
            PanelField::Content,
        ) => store.apply(
            CanvasMutation::SetElementContent {
                block_id,
                element: element_id,
                value: raw.to_string(),
            },
            "Edit text",
        ),
        (
            Selection::Element {
                block_id,
                element_id,
            },
            PanelField::Width | PanelField::Height,
        ) => {
            // Only inserted elements carry their own geometry.
            let Some(el) = store
                .canvas()
                .get(block_id)
                .and_then(|b| b.inserts.get(element_id))
            else {
                return WriteOutcome::NotFound;
            };
            let min = store.config().element_min_size;
            let current = el
                .local_rect()
                .unwrap_or_else(|| Rect::from_parts(el.position, Size::new(min.width, min.height)));
            let Some(rect) = resized(current, field, raw, Size::new(min.width, min.height)) else {
                return WriteOutcome::Unchanged;
            };
            store.apply(
                CanvasMutation::SetElementRect {
                    block_id,
                    element_id,
                    rect,
                },
                "Resize element",
            )
        }
        (
            Selection::Element {
                block_id,
                element_id,
            },
            _,
        ) => {
            let (Some(prop), Some(value)) = (field.property(), field.value(raw)) else {
                return WriteOutcome::Unchanged;
            };
            store.apply(
                CanvasMutation::SetElementStyle {
                    block_id,
                    element: element_id,
                    key: prop.to_string(),
                    value,
                    bucket: classify_property(prop),
                },
                &label,
            )
        }
    }
}

/// `rect` with its width or height replaced by the parsed length,
/// clamped to `min`.
fn resized(rect: Rect, field: PanelField, raw: &str, min: Size) -> Option<Rect> {
    let px = parse_css_length(raw)?.to_px(ROOT_FONT_PX)? as f32;
    if !px.is_finite() {
        return None;
    }
    let mut out = rect;
    match field {
        PanelField::Width => out.width = px.max(min.width),
        PanelField::Height => out.height = px.max(min.height),
        _ => return None,
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sc_core::{Position, RejectReason};

    fn header_store() -> (EditorStore, NodeId) {
        let mut store = EditorStore::default();
        let id = store.add_component("header1", Position::new(0.0, 0.0));
        (store, id)
    }

    fn select_element(store: &mut EditorStore, block: NodeId, key: &str) {
        store.select(Selection::element(block, NodeId::intern(key)));
    }

    #[test]
    fn empty_view_without_selection() {
        let mut store = EditorStore::default();
        let mut panel = StylePanel::new();
        panel.sync(&store);
        assert!(matches!(panel.view(), PanelView::Empty { .. }));
        assert_eq!(panel.set_field(&mut store, PanelField::TextColor, "red"), WriteOutcome::NotFound);
    }

    #[test]
    fn text_color_goes_to_text_style() {
        let (mut store, id) = header_store();
        select_element(&mut store, id, "navItem-0");
        let mut panel = StylePanel::new();
        panel.sync(&store);
        assert!(panel.is_open());

        assert_eq!(panel.set_field(&mut store, PanelField::TextColor, "#f00"), WriteOutcome::Applied);
        assert_eq!(panel.set_field(&mut store, PanelField::Padding, "4px 8px"), WriteOutcome::Applied);
        let el = store.canvas().get(id).unwrap().element_style("navItem-0").unwrap();
        assert_eq!(el.text_style.get("color"), Some(&StyleValue::from("#f00")));
        assert_eq!(el.style.get("padding"), Some(&StyleValue::from("4px 8px")));
        assert_eq!(el.style.get("color"), None);

        let PanelView::Element(fields) = panel.view() else {
            panic!("expected element view");
        };
        assert_eq!(fields.text_color.as_deref(), Some("#ff0000"));
        assert_eq!(fields.content.as_deref(), Some("Home"));
    }

    #[test]
    fn font_size_is_parsed_to_px() {
        let (mut store, id) = header_store();
        select_element(&mut store, id, "title");
        let mut panel = StylePanel::new();
        panel.set_field(&mut store, PanelField::FontSize, "1.5rem");
        let PanelView::Element(fields) = panel.view() else {
            panic!("expected element view");
        };
        assert_eq!(fields.font_size, Some(24.0));
        let steps = store.history().undo_len();
        assert_eq!(panel.set_field(&mut store, PanelField::FontSize, "huge"), WriteOutcome::Unchanged);
        assert_eq!(store.history().undo_len(), steps);
    }

    #[test]
    fn structural_container_hides_typography() {
        let (mut store, id) = header_store();
        select_element(&mut store, id, "nav");
        let mut panel = StylePanel::new();
        panel.sync(&store);
        let PanelView::Element(fields) = panel.view() else {
            panic!("expected element view");
        };
        assert!(!fields.text_capable);
        assert_eq!(
            panel.set_field(&mut store, PanelField::TextColor, "red"),
            WriteOutcome::Rejected(RejectReason::StructuralContainer)
        );
        assert_eq!(panel.set_field(&mut store, PanelField::BackgroundColor, "#eee"), WriteOutcome::Applied);
    }

    #[test]
    fn bold_and_block_fields() {
        let (mut store, id) = header_store();
        let mut panel = StylePanel::new();
        panel.sync(&store);
        assert_eq!(panel.bound(), Selection::block(id));

        panel.set_field(&mut store, PanelField::Width, "40");
        panel.set_field(&mut store, PanelField::BackgroundColor, "#abc");
        let PanelView::Block(fields) = panel.view() else {
            panic!("expected block view");
        };
        assert_eq!(fields.width, 50.0);
        assert_eq!(fields.background_color.as_deref(), Some("#aabbcc"));

        select_element(&mut store, id, "title");
        panel.sync(&store);
        panel.set_field(&mut store, PanelField::Bold, "true");
        let PanelView::Element(fields) = panel.view() else {
            panic!("expected element view");
        };
        assert!(fields.bold);
        assert!(!fields.italic);
    }

    #[test]
    fn typing_burst_is_one_step() {
        let (mut store, id) = header_store();
        select_element(&mut store, id, "title");
        let mut panel = StylePanel::new();
        panel.sync(&store);
        let steps = store.history().undo_len();

        assert!(panel.begin_text_edit(&mut store));
        assert_eq!(store.editing(), Some((id, NodeId::intern("title"))));
        for text in ["M", "My", "My S", "My Shop"] {
            panel.input_text(&mut store, text);
        }
        assert!(panel.end_text_edit(&mut store));
        assert_eq!(store.editing(), None);
        assert_eq!(store.history().undo_len(), steps + 1);

        store.undo();
        panel.sync(&store);
        let PanelView::Element(fields) = panel.view() else {
            panic!("expected element view");
        };
        assert_eq!(fields.content.as_deref(), Some("My Site"));
    }

    #[test]
    fn close_keeps_closed_until_new_target() {
        let (mut store, id) = header_store();
        let mut panel = StylePanel::new();
        panel.sync(&store);
        panel.close(&mut store);
        panel.sync(&store);
        assert!(!panel.is_open());
        select_element(&mut store, id, "logo");
        panel.sync(&store);
        assert!(panel.is_open());
    }

    #[test]
    fn unstyled_template_slots_bind_the_panel() {
        let (mut store, header1) = header_store();
        let header2 = store.add_component("header2", Position::new(0.0, 200.0));
        let mut panel = StylePanel::new();

        select_element(&mut store, header1, "navList");
        panel.sync(&store);
        assert_eq!(panel.bound(), Selection::element(header1, NodeId::intern("navList")));
        let PanelView::Element(fields) = panel.view() else {
            panic!("expected element view");
        };
        assert!(!fields.text_capable);
        assert_eq!(panel.set_field(&mut store, PanelField::Padding, "8px"), WriteOutcome::Applied);

        select_element(&mut store, header2, "logo");
        panel.sync(&store);
        assert!(matches!(panel.view(), PanelView::Element(f) if f.text_capable));
        assert_eq!(panel.set_field(&mut store, PanelField::TextColor, "#123456"), WriteOutcome::Applied);
        let logo = store.canvas().get(header2).unwrap().element_style("logo").unwrap();
        assert_eq!(logo.text_style.get("color"), Some(&StyleValue::from("#123456")));

        select_element(&mut store, header2, "nav");
        assert_eq!(store.selection(), Selection::element(header2, NodeId::intern("nav")));
    }

    #[test]
    fn oversized_numbers_leave_the_page_loadable() {
        let (mut store, id) = header_store();
        let mut panel = StylePanel::new();
        panel.sync(&store);
        let huge = format!("1{}", "0".repeat(40));

        assert_eq!(panel.set_field(&mut store, PanelField::Width, &huge), WriteOutcome::Unchanged);
        assert_eq!(store.canvas().get(id).unwrap().size.width, 1000.0);

        select_element(&mut store, id, "title");
        panel.sync(&store);
        assert_eq!(panel.set_field(&mut store, PanelField::FontSize, &huge), WriteOutcome::Unchanged);

        let json = sc_core::document::to_json(store.canvas()).unwrap();
        assert_eq!(&sc_core::document::from_json(&json).unwrap(), store.canvas());
    }

    #[test]
    fn unknown_slot_is_not_styleable() {
        let (mut store, id) = header_store();
        // Selecting goes through staleness, so bind the panel by hand.
        let mut panel = StylePanel::new();
        panel.bound = Selection::element(id, NodeId::intern("sidebar"));
        panel.view = build_view(&store, panel.bound);
        assert!(matches!(panel.view(), PanelView::NotStyleable { .. }));
        assert_eq!(
            write_field(&mut store, panel.bound, PanelField::TextColor, "red"),
            WriteOutcome::Rejected(RejectReason::UnknownSlot)
        );
    }
}
