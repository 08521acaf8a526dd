//! WASM bridge for Sitecraft: exposes the editor store to the browser.
//!
//! Compiled via `wasm-pack build --target web`. The page renders blocks
//! from `get_canvas_json` and forwards pointer, drop and key events here;
//! methods that report more than a flag return JSON strings.

use sc_core::document;
use sc_core::id::NodeId;
use sc_core::{ElementKind, InsertedElement, Point, Position, Size, Vec2, export_html_at};
use sc_editor::placement::PremeasuredSize;
use sc_editor::selection::resolve_click;
use sc_editor::{
    ArrangeTool, CanvasFrame, DropEvent, EditorAction, EditorConfig, EditorStore, InputEvent, KeyTarget,
    Modifiers, PanelField, Selection, ShortcutAction, StylePanel, ZOrder, place,
};
use serde_json::json;
use wasm_bindgen::prelude::*;

/// Marker the page puts on every block root element.
const ROOT_MARKER: &str = "root";

/// The main WASM-facing canvas controller.
///
/// Holds the editor store, the arrange tool and the style panel. All
/// interaction from JS goes through this struct.
#[wasm_bindgen]
pub struct SiteCanvas {
    store: EditorStore,
    tool: ArrangeTool,
    panel: StylePanel,
}

#[wasm_bindgen]
impl SiteCanvas {
    /// Create a controller. `config_json` may be empty or a partial
    /// `EditorConfig`; unreadable config falls back to defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Self {
        console_error_panic_hook_setup();
        let config = if config_json.trim().is_empty() {
            EditorConfig::default()
        } else {
            serde_json::from_str(config_json).unwrap_or_else(|e| {
                log::warn!("ignoring editor config: {e}");
                EditorConfig::default()
            })
        };
        Self {
            store: EditorStore::new(config),
            tool: ArrangeTool::new(),
            panel: StylePanel::new(),
        }
    }

    /// The canvas element was measured (mount or window resize).
    pub fn set_rendered_width(&mut self, width: f32) {
        self.store.set_rendered_width(width);
    }

    // ─── Document ────────────────────────────────────────────────────────

    /// Replace the page with a JSON block array. Returns `false` (and
    /// leaves the page untouched) when the document doesn't parse.
    pub fn load_json(&mut self, json: &str) -> bool {
        match document::from_json(json) {
            Ok(canvas) => {
                self.store.load(canvas);
                self.panel.sync(&self.store);
                true
            }
            Err(e) => {
                log::warn!("load failed: {e}");
                false
            }
        }
    }

    /// The page as compact JSON, for rendering and saving.
    pub fn get_canvas_json(&self) -> String {
        document::to_json_compact(self.store.canvas()).unwrap_or_else(|e| {
            log::warn!("serialization failed: {e}");
            "[]".to_string()
        })
    }

    /// Standalone HTML plus the export report:
    /// `{"html":"...","report":{"blockCount":n,"missing":[...]}}`.
    pub fn export_html(&self) -> String {
        let bundle = export_html_at(self.store.canvas(), self.store.registry(), self.store.config().virtual_width);
        serde_json::to_string(&bundle).unwrap_or_default()
    }

    /// Block types on the page, in paint order (JSON array).
    pub fn get_components(&self) -> String {
        serde_json::to_string(&self.store.components()).unwrap_or_default()
    }

    // ─── Pointer ─────────────────────────────────────────────────────────

    /// Pointer down at canvas-local screen coordinates. `marker_path` is a
    /// JSON array of the `data-el` markers from the event target up to the
    /// block root (`null` for unmarked nodes); pass `""` when unknown.
    /// Returns true if anything needs re-rendering.
    #[allow(clippy::too_many_arguments)]
    pub fn handle_pointer_down(
        &mut self,
        x: f32,
        y: f32,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
        marker_path: &str,
    ) -> bool {
        let modifiers = Modifiers {
            shift,
            ctrl,
            alt,
            meta,
        };
        if !modifiers.command()
            && let Some(selection) = self.resolve_markers(x, y, marker_path)
        {
            self.store.dispatch(vec![EditorAction::Select(selection)]);
        }
        self.run(InputEvent::pointer_down(x, y, modifiers));
        true
    }

    pub fn handle_pointer_move(&mut self, x: f32, y: f32) -> bool {
        self.run(InputEvent::pointer_move(x, y)) || self.tool.is_active()
    }

    pub fn handle_pointer_up(&mut self, x: f32, y: f32) -> bool {
        self.run(InputEvent::pointer_up(x, y));
        true
    }

    /// The window lost focus: commit any gesture in flight.
    pub fn handle_blur(&mut self) -> bool {
        self.run(InputEvent::Blur)
    }

    /// The element being dragged, before it is committed:
    /// `{"blockId","elementId","rect"}` or `null`.
    pub fn get_drag_preview(&self) -> String {
        match self.tool.preview() {
            Some((target, rect)) => {
                let element_id = match target {
                    sc_editor::DragTarget::Element { element_id, .. } => Some(element_id),
                    sc_editor::DragTarget::Block(_) => None,
                };
                json!({
                    "blockId": target.block_id(),
                    "elementId": element_id,
                    "rect": rect,
                })
                .to_string()
            }
            None => "null".to_string(),
        }
    }

    /// Area selection box in screen space, or `null`.
    pub fn get_area(&self) -> String {
        serde_json::to_string(&self.tool.area()).unwrap_or_default()
    }

    // ─── Drop ────────────────────────────────────────────────────────────

    /// Sidebar drop. Pass `NaN` for the client position when the event had
    /// no usable offset and for the origin when the canvas isn't mounted;
    /// `NaN` measured sizes fall back to the template default. Returns the
    /// new block id, or `""` when the drop was ignored.
    #[allow(clippy::too_many_arguments)]
    pub fn handle_drop(
        &mut self,
        block_type: &str,
        client_x: f64,
        client_y: f64,
        origin_x: f64,
        origin_y: f64,
        scroll_x: f64,
        scroll_y: f64,
        measured_width: f32,
        measured_height: f32,
    ) -> String {
        let client = finite_point(client_x, client_y);
        let frame = finite_point(origin_x, origin_y).map(|origin| CanvasFrame::new(origin, Vec2::new(scroll_x, scroll_y)));
        let drop = DropEvent {
            block_type: block_type.to_string(),
            client,
        };
        let mut measured = PremeasuredSize(Some(Size::new(measured_width, measured_height)));
        let placed = place(&mut self.store, frame.as_ref(), &drop, &mut measured);
        self.panel.sync(&self.store);
        placed.map(|id| id.as_str().to_string()).unwrap_or_default()
    }

    /// Programmatic insert at virtual coordinates. Returns the new id.
    pub fn add_component(&mut self, block_type: &str, x: f32, y: f32) -> String {
        let id = self.store.add_component(block_type, Position::new(x, y));
        self.panel.sync(&self.store);
        id.as_str().to_string()
    }

    // ─── Selection ───────────────────────────────────────────────────────

    /// `{"type":"none"}`, `{"type":"block","blockId":..}` or
    /// `{"type":"element","blockId":..,"elementId":..}`.
    pub fn get_selection(&self) -> String {
        serde_json::to_string(&self.store.selection()).unwrap_or_default()
    }

    /// Selected block ids (multi-selection) as a JSON array.
    pub fn get_selected_ids(&self) -> String {
        serde_json::to_string(self.store.selection_set().ids()).unwrap_or_default()
    }

    /// Select from a selection JSON (the shape `get_selection` returns).
    pub fn select_json(&mut self, json: &str) -> bool {
        match serde_json::from_str::<Selection>(json) {
            Ok(selection) => {
                self.store.select(selection);
                self.panel.sync(&self.store);
                self.store.selection() == selection
            }
            Err(_) => false,
        }
    }

    pub fn delete_selected(&mut self) -> bool {
        let removed = !self.store.delete_selection().is_empty();
        self.panel.sync(&self.store);
        removed
    }

    /// Z-order move for the selected block: `forward`, `backward`,
    /// `front` or `back`.
    pub fn reorder_selected(&mut self, op: &str) -> bool {
        let op = match op {
            "forward" => ZOrder::Forward,
            "backward" => ZOrder::Backward,
            "front" => ZOrder::Front,
            "back" => ZOrder::Back,
            _ => return false,
        };
        self.store.reorder_selected(op)
    }

    // ─── History ─────────────────────────────────────────────────────────

    pub fn undo(&mut self) -> bool {
        let done = self.store.undo().is_some();
        self.panel.sync(&self.store);
        done
    }

    pub fn redo(&mut self) -> bool {
        let done = self.store.redo().is_some();
        self.panel.sync(&self.store);
        done
    }

    pub fn can_undo(&self) -> bool {
        self.store.history().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.store.history().can_redo()
    }

    // ─── Keyboard Shortcut API ───────────────────────────────────────────

    /// Handle a global keydown. `target_tag` and `content_editable`
    /// describe `event.target`. Returns
    /// `{"handled":bool,"action":"<action_name>"}`; JS should call
    /// `preventDefault` only when `handled` is true.
    #[allow(clippy::too_many_arguments)]
    pub fn handle_key(
        &mut self,
        key: &str,
        ctrl: bool,
        shift: bool,
        alt: bool,
        meta: bool,
        target_tag: &str,
        content_editable: bool,
    ) -> String {
        let modifiers = Modifiers {
            shift,
            ctrl,
            alt,
            meta,
        };
        let target = KeyTarget::from_dom(target_tag, content_editable);
        let action = self.store.handle_key(key, modifiers, target);
        self.panel.sync(&self.store);
        match action {
            Some(a) => json!({ "handled": true, "action": action_to_name(a) }).to_string(),
            None => r#"{"handled":false,"action":"none"}"#.to_string(),
        }
    }

    // ─── Style panel ─────────────────────────────────────────────────────

    /// Current panel view as JSON (`kind`: `empty`, `notStyleable`,
    /// `block`, `element`) plus an `open` flag.
    pub fn get_panel(&mut self) -> String {
        self.panel.sync(&self.store);
        let mut view = serde_json::to_value(self.panel.view()).unwrap_or_default();
        if let Some(obj) = view.as_object_mut() {
            obj.insert("open".into(), self.panel.is_open().into());
        }
        view.to_string()
    }

    /// Write one panel field. Returns the outcome JSON
    /// (`{"status":"applied"}`, `{"status":"rejected","reason":"noText"}`...).
    pub fn set_panel_field(&mut self, field: &str, value: &str) -> String {
        let Some(field) = PanelField::parse(field) else {
            return r#"{"status":"notFound"}"#.to_string();
        };
        let outcome = self.panel.set_field(&mut self.store, field, value);
        serde_json::to_string(&outcome).unwrap_or_default()
    }

    pub fn close_panel(&mut self) {
        self.panel.close(&mut self.store);
    }

    /// Focus entered a content-editable region of the selected element.
    pub fn begin_text_edit(&mut self) -> bool {
        self.panel.sync(&self.store);
        self.panel.begin_text_edit(&mut self.store)
    }

    pub fn input_text(&mut self, value: &str) -> bool {
        self.panel.input_text(&mut self.store, value).changed()
    }

    /// Focus left the editable region. Returns true if an undo step was
    /// recorded.
    pub fn end_text_edit(&mut self) -> bool {
        self.panel.end_text_edit(&mut self.store)
    }

    // ─── Rich elements ───────────────────────────────────────────────────

    /// Insert a rich element into a block (`parent_id` may be empty).
    /// Returns `{"ok":true,"id":".."}` or `{"ok":false,"error":".."}`.
    pub fn insert_element(&mut self, block_id: &str, parent_id: &str, kind: &str, content: &str, url: &str) -> String {
        let Some(kind) = ElementKind::parse(kind) else {
            return json!({ "ok": false, "error": format!("unknown element kind {kind}") }).to_string();
        };
        let mut element = InsertedElement::new(kind, content);
        if kind.has_url() && !url.is_empty() {
            element = element.with_url(url);
        }
        let parent = (!parent_id.is_empty()).then(|| NodeId::intern(parent_id));
        match self.store.insert_element(NodeId::intern(block_id), parent, element) {
            Ok(id) => json!({ "ok": true, "id": id }).to_string(),
            Err(e) => json!({ "ok": false, "error": e.to_string() }).to_string(),
        }
    }

    /// Rich element edit form save. Same result shape as `insert_element`.
    pub fn edit_element(&mut self, block_id: &str, element_id: &str, kind: &str, content: &str, url: &str) -> String {
        let Some(block) = self.store.canvas().get(NodeId::intern(block_id)) else {
            return json!({ "ok": false, "error": format!("no block {block_id}") }).to_string();
        };
        let Some(current) = block.inserts.get(NodeId::intern(element_id)) else {
            return json!({ "ok": false, "error": format!("no element {element_id}") }).to_string();
        };
        let block_id = block.id;
        let mut element = current.clone();
        if let Some(kind) = ElementKind::parse(kind) {
            element.kind = kind;
        }
        content.clone_into(&mut element.content);
        element.url = (element.kind.has_url() && !url.is_empty()).then(|| url.to_string());
        match self.store.edit_element(block_id, element) {
            Ok(_) => json!({ "ok": true, "id": element_id }).to_string(),
            Err(e) => json!({ "ok": false, "error": e.to_string() }).to_string(),
        }
    }
}

impl SiteCanvas {
    /// Run one input event through the arrange tool. Returns true if the
    /// page changed.
    fn run(&mut self, event: InputEvent) -> bool {
        let actions = self.tool.handle(&event, &self.store);
        let changed = self.store.dispatch(actions);
        self.panel.sync(&self.store);
        changed
    }

    /// Marker-based click resolution for template elements.
    fn resolve_markers(&self, x: f32, y: f32, marker_path: &str) -> Option<Selection> {
        if marker_path.trim().is_empty() {
            return None;
        }
        let path: Vec<Option<String>> = serde_json::from_str(marker_path).ok()?;
        let hit = sc_editor::hit::hit_test(
            self.store.canvas(),
            &self.store.scale(),
            Point::new(x as f64, y as f64),
        )?;
        if hit.element_id.is_some() {
            return None;
        }
        let path: Vec<Option<&str>> = path.iter().map(Option::as_deref).collect();
        let selection = resolve_click(hit.block_id, ROOT_MARKER, &path);
        (!selection.is_stale(self.store.canvas(), self.store.registry())).then_some(selection)
    }
}

fn finite_point(x: f64, y: f64) -> Option<Point> {
    (x.is_finite() && y.is_finite()).then(|| Point::new(x, y))
}

fn action_to_name(action: ShortcutAction) -> &'static str {
    match action {
        ShortcutAction::Undo => "undo",
        ShortcutAction::Redo => "redo",
        ShortcutAction::Delete => "delete",
        ShortcutAction::SendBackward => "sendBackward",
        ShortcutAction::BringForward => "bringForward",
        ShortcutAction::SendToBack => "sendToBack",
        ShortcutAction::BringToFront => "bringToFront",
        ShortcutAction::Deselect => "deselect",
    }
}

// ─── Panic hook and logger for WASM debugging ────────────────────────────

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("Sitecraft WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
            if log::set_logger(&ConsoleLogger).is_ok() {
                log::set_max_level(log::LevelFilter::Info);
            }
        });
    }
}

/// Routes `log` records to the browser console.
#[cfg(target_arch = "wasm32")]
struct ConsoleLogger;

#[cfg(target_arch = "wasm32")]
impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let msg = format!("[{}] {}", record.target(), record.args()).into();
        match record.level() {
            log::Level::Error => web_sys::console::error_1(&msg),
            log::Level::Warn => web_sys::console::warn_1(&msg),
            _ => web_sys::console::log_1(&msg),
        }
    }

    fn flush(&self) {}
}

// ─── Standalone functions (no canvas needed) ─────────────────────────────

/// Validate a page document. Returns JSON: `{"ok":true}` or
/// `{"ok":false,"error":"..."}`.
#[wasm_bindgen]
pub fn validate(json: &str) -> String {
    match document::from_json(json) {
        Ok(_) => r#"{"ok":true}"#.to_string(),
        Err(e) => json!({ "ok": false, "error": e.to_string() }).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(s: &str) -> serde_json::Value {
        serde_json::from_str(s).unwrap()
    }

    #[test]
    fn drop_select_style_undo() {
        let mut canvas = SiteCanvas::new("");
        let id = canvas.handle_drop("header1", 400.0, 250.0, 100.0, 50.0, 0.0, 0.0, f32::NAN, f32::NAN);
        assert!(!id.is_empty());

        let blocks = parse(&canvas.get_canvas_json());
        assert_eq!(blocks[0]["position"], json!({ "x": 300.0, "y": 200.0 }));
        assert_eq!(blocks[0]["size"], json!({ "width": 1000.0, "height": 150.0 }));

        // Click on the first nav item (block at screen x 300..1300, y 200..350).
        canvas.handle_pointer_down(400.0, 250.0, false, false, false, false, r#"[null,"navItem-0","navList","root"]"#);
        canvas.handle_pointer_up(400.0, 250.0);
        assert_eq!(
            parse(&canvas.get_selection()),
            json!({ "type": "element", "blockId": id, "elementId": "navItem-0" })
        );

        assert_eq!(parse(&canvas.set_panel_field("textColor", "#ff0000")), json!({ "status": "applied" }));
        let blocks = parse(&canvas.get_canvas_json());
        assert_eq!(blocks[0]["props"]["elements"]["navItem-0"]["textStyle"]["color"], "#ff0000");

        let key = parse(&canvas.handle_key("z", true, false, false, false, "BODY", false));
        assert_eq!(key, json!({ "handled": true, "action": "undo" }));
        let blocks = parse(&canvas.get_canvas_json());
        assert!(blocks[0]["props"]["elements"]["navItem-0"]["textStyle"].get("color").is_none());
    }

    #[test]
    fn ignored_drop_and_editable_keys() {
        let mut canvas = SiteCanvas::new(r#"{"historyDepth": 5}"#);
        assert_eq!(canvas.handle_drop("hero", f64::NAN, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0), "");
        assert_eq!(canvas.get_canvas_json(), "[]");

        canvas.add_component("hero", 0.0, 0.0);
        let key = parse(&canvas.handle_key("Backspace", false, false, false, false, "INPUT", false));
        assert_eq!(key["handled"], false);
        assert_eq!(parse(&canvas.get_components()), json!(["hero"]));
    }

    #[test]
    fn structural_text_style_is_rejected() {
        let mut canvas = SiteCanvas::new("");
        let id = canvas.add_component("header1", 0.0, 0.0);
        assert!(canvas.select_json(&json!({ "type": "element", "blockId": id, "elementId": "nav" }).to_string()));
        assert_eq!(
            parse(&canvas.set_panel_field("textColor", "red")),
            json!({ "status": "rejected", "reason": "structuralContainer" })
        );
        let panel = parse(&canvas.get_panel());
        assert_eq!(panel["kind"], "element");
        assert_eq!(panel["textCapable"], false);
    }

    #[test]
    fn rich_element_validation_surfaces_errors() {
        let mut canvas = SiteCanvas::new("");
        let id = canvas.add_component("hero", 0.0, 0.0);
        let bad = parse(&canvas.insert_element(&id, "", "button", "  ", ""));
        assert_eq!(bad["ok"], false);
        let ok = parse(&canvas.insert_element(&id, "", "link", "Docs", "https://example.com"));
        assert_eq!(ok["ok"], true);
        let el = ok["id"].as_str().unwrap();
        let edited = parse(&canvas.edit_element(&id, el, "button", "Read docs", ""));
        assert_eq!(edited["ok"], true);
        assert!(canvas.can_undo());
    }
}
