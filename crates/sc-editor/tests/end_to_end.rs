//! Integration tests: full editing flows across placement, selection,
//! the style panel, pointer gestures and keyboard shortcuts.

use pretty_assertions::assert_eq;
use sc_core::document::{from_json, to_json};
use sc_core::geometry::{Position, Size};
use sc_core::id::NodeId;
use sc_core::style::StyleValue;
use sc_core::{BlockContent, Point, Vec2};
use sc_editor::placement::DefaultSizes;
use sc_editor::selection::resolve_click;
use sc_editor::{
    ArrangeTool, CanvasFrame, DropEvent, EditorStore, InputEvent, KeyTarget, Modifiers, PanelField, PanelView,
    Selection, StylePanel, place,
};

fn cmd() -> Modifiers {
    Modifiers {
        ctrl: true,
        ..Modifiers::NONE
    }
}

fn nav_color(store: &EditorStore, block: NodeId) -> Option<StyleValue> {
    store
        .canvas()
        .get(block)?
        .element_style("navItem-0")?
        .text_style
        .get("color")
        .cloned()
}

#[test]
fn drop_header_style_nav_item_and_undo() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut store = EditorStore::default();
    let mut panel = StylePanel::new();

    // Drop at client (400, 250) on a canvas whose box starts at (100, 50).
    let frame = CanvasFrame::new(Point::new(100.0, 50.0), Vec2::ZERO);
    let drop = DropEvent {
        block_type: "header1".into(),
        client: Some(Point::new(400.0, 250.0)),
    };
    let block_id = place(&mut store, Some(&frame), &drop, &mut DefaultSizes).unwrap();

    let block = store.canvas().get(block_id).unwrap();
    assert_eq!(block.block_type, "header1");
    assert_eq!(block.position, Position::new(300.0, 200.0));
    assert_eq!(block.size, Size::new(1000.0, 150.0));
    let BlockContent::Header { nav_items, .. } = &block.props.content else {
        panic!("expected header content");
    };
    assert_eq!(nav_items.len(), 2);

    // Click the first nav item's text span.
    let selection = resolve_click(block_id, "root", &[None, Some("navItem-0"), Some("navList"), Some("root")]);
    store.select(selection);
    panel.sync(&store);
    assert!(matches!(panel.view(), PanelView::Element(f) if f.text_capable));

    panel.set_field(&mut store, PanelField::TextColor, "#ff0000");
    assert_eq!(nav_color(&store, block_id), Some(StyleValue::from("#ff0000")));
    let el = store.canvas().get(block_id).unwrap().element_style("navItem-0").unwrap();
    assert!(el.style.get("color").is_none(), "color must not land in the container bucket");

    // Ctrl+Z on the canvas reverts the color and keeps the selection.
    store.handle_key("z", cmd(), KeyTarget::Canvas);
    assert_eq!(nav_color(&store, block_id), None);
    assert_eq!(store.selection(), Selection::element(block_id, NodeId::intern("navItem-0")));

    // Ctrl+Shift+Z brings it back.
    store.handle_key(
        "Z",
        Modifiers {
            shift: true,
            ..cmd()
        },
        KeyTarget::Canvas,
    );
    assert_eq!(nav_color(&store, block_id), Some(StyleValue::from("#ff0000")));
}

#[test]
fn typing_in_inputs_never_hits_the_canvas() {
    let mut store = EditorStore::default();
    let id = store.add_component("hero", Position::new(0.0, 0.0));

    for target in [KeyTarget::from_dom("INPUT", false), KeyTarget::from_dom("div", true)] {
        assert_eq!(store.handle_key("Backspace", Modifiers::NONE, target), None);
        assert_eq!(store.handle_key("z", cmd(), target), None);
    }
    assert!(store.canvas().contains(id));

    assert!(store.handle_key("Delete", Modifiers::NONE, KeyTarget::Canvas).is_some());
    assert!(store.canvas().is_empty());
    assert_eq!(store.selection(), Selection::None);
}

#[test]
fn drag_then_blur_then_undo() {
    let mut store = EditorStore::default();
    store.set_rendered_width(600.0);
    let id = store.add_component("footer1", Position::new(0.0, 0.0));
    let mut tool = ArrangeTool::new();

    let mut run = |store: &mut EditorStore, event: InputEvent| {
        let actions = tool.handle(&event, store);
        store.dispatch(actions);
    };
    run(&mut store, InputEvent::pointer_down(100.0, 50.0, Modifiers::NONE));
    for step in 1..=10 {
        run(&mut store, InputEvent::pointer_move(100.0 + step as f32 * 5.0, 50.0 + step as f32));
    }
    run(&mut store, InputEvent::Blur);

    // 50 screen px at half scale is 100 virtual units.
    assert_eq!(store.canvas().get(id).unwrap().position, Position::new(100.0, 10.0));
    assert_eq!(store.history().undo_len(), 2);
    store.undo();
    assert_eq!(store.canvas().get(id).unwrap().position, Position::new(0.0, 0.0));
}

#[test]
fn edits_survive_a_save_load_cycle() {
    let mut store = EditorStore::default();
    let mut panel = StylePanel::new();
    let id = store.add_component("hero", Position::new(0.0, 40.0));
    store.select(Selection::element(id, NodeId::intern("subtitle")));
    panel.sync(&store);
    panel.set_field(&mut store, PanelField::FontSize, "20px");
    panel.set_field(&mut store, PanelField::Content, "Ship it");

    let json = to_json(store.canvas()).unwrap();
    let mut reopened = EditorStore::default();
    reopened.load(from_json(&json).unwrap());

    assert_eq!(reopened.canvas(), store.canvas());
    let block = reopened.canvas().get(id).unwrap();
    assert_eq!(block.props.content.field("subtitle"), Some("Ship it"));
    assert_eq!(
        block.element_style("subtitle").unwrap().text_style.get("fontSize"),
        Some(&StyleValue::Number(20.0))
    );
}
