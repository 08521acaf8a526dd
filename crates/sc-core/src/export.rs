//! Static HTML export of a page.
//!
//! Blocks are emitted in paint order as absolutely positioned containers
//! on a virtual-width page, so the exported layout matches the canvas.
//! Types the registry doesn't know are replaced by a visible stub and
//! listed in the `ExportReport`.

use crate::geometry::VIRTUAL_WIDTH;
use crate::model::{Block, BlockContent, Canvas};
use crate::registry::TemplateRegistry;
use crate::style::{ElementStyle, StyleMap};
use crate::tree::{ElementKind, ElementTree, InsertedElement};
use serde::Serialize;
use std::fmt::Write;

/// What happened during an export.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportReport {
    pub block_count: usize,
    /// Block types that were replaced by stubs, deduplicated, in page order.
    pub missing: Vec<String>,
}

impl ExportReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportBundle {
    pub html: String,
    pub report: ExportReport,
}

/// Render the whole page as a standalone HTML document on a
/// default-width page.
pub fn export_html(canvas: &Canvas, registry: &dyn TemplateRegistry) -> ExportBundle {
    export_html_at(canvas, registry, VIRTUAL_WIDTH)
}

/// Like `export_html` for a canvas configured with `page_width` virtual
/// units. The page grows to fit blocks that extend past it.
pub fn export_html_at(canvas: &Canvas, registry: &dyn TemplateRegistry, page_width: f32) -> ExportBundle {
    let mut report = ExportReport {
        block_count: canvas.len(),
        ..ExportReport::default()
    };
    let height = canvas
        .blocks()
        .iter()
        .map(|b| b.rect().bottom())
        .fold(0.0_f32, f32::max);
    let width = canvas
        .blocks()
        .iter()
        .map(|b| b.rect().right())
        .fold(page_width, f32::max);

    let mut body = String::new();
    for block in canvas.blocks() {
        if registry.template(&block.block_type).is_none() {
            log::warn!("export: no template for block type {}", block.block_type);
            if !report.missing.contains(&block.block_type) {
                report.missing.push(block.block_type.clone());
            }
            emit_stub(&mut body, block);
        } else {
            emit_block(&mut body, block);
        }
    }

    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>Sitecraft export</title>\n</head>\n<body>\n");
    let _ = writeln!(
        html,
        "<div class=\"sc-page\" style=\"position: relative; width: {width}px; height: {height}px; margin: 0 auto;\">"
    );
    html.push_str(&body);
    html.push_str("</div>\n</body>\n</html>\n");

    ExportBundle { html, report }
}

/// Declarations for a `style` attribute, already escaped.
fn block_css(block: &Block) -> String {
    let r = block.rect();
    let mut css = format!(
        "position: absolute; left: {}px; top: {}px; width: {}px; height: {}px;",
        r.left, r.top, r.width, r.height
    );
    if !block.props.style.is_empty() {
        css.push(' ');
        css.push_str(&block.props.style.to_css());
    }
    escape(&css)
}

fn emit_stub(out: &mut String, block: &Block) {
    let _ = writeln!(
        out,
        "<div class=\"sc-missing\" data-type=\"{ty}\" style=\"{css}\">Missing component: {ty}</div>",
        ty = escape(&block.block_type),
        css = block_css(block),
    );
}

fn emit_block(out: &mut String, block: &Block) {
    let _ = writeln!(
        out,
        "<div class=\"sc-block sc-{}\" style=\"{}\">",
        escape(&block.block_type),
        block_css(block)
    );
    let el = |key: &str| element_css(block.props.elements.get(key));
    match &block.props.content {
        BlockContent::Header {
            title,
            nav_items,
            cta_items,
        } => {
            let _ = writeln!(out, "<header style=\"{}\">", el("header"));
            let _ = writeln!(out, "<div class=\"logo\" style=\"{}\"></div>", el("logo"));
            let _ = writeln!(out, "<h1 style=\"{}\">{}</h1>", el("title"), escape(title));
            let _ = writeln!(out, "<nav style=\"{}\"><ul style=\"{}\">", el("nav"), el("navList"));
            for (i, item) in nav_items.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "<li style=\"{}\">{}</li>",
                    el(&format!("navItem-{i}")),
                    escape(&item.content)
                );
            }
            out.push_str("</ul></nav>\n");
            if !cta_items.is_empty() {
                let _ = writeln!(out, "<div class=\"cta\" style=\"{}\">", el("cta"));
                for (i, item) in cta_items.iter().enumerate() {
                    let _ = writeln!(
                        out,
                        "<button style=\"{}\">{}</button>",
                        el(&format!("cta-{i}")),
                        escape(&item.content)
                    );
                }
                out.push_str("</div>\n");
            }
            out.push_str("</header>\n");
        }
        BlockContent::Hero { title, subtitle } => {
            let _ = writeln!(out, "<h1 style=\"{}\">{}</h1>", el("title"), escape(title));
            let _ = writeln!(out, "<p style=\"{}\">{}</p>", el("subtitle"), escape(subtitle));
        }
        BlockContent::Footer { text } => {
            let _ = writeln!(out, "<footer><p style=\"{}\">{}</p></footer>", el("text"), escape(text));
        }
        BlockContent::Text { text } => {
            let tag = match block.block_type.as_str() {
                "h1" | "h2" => block.block_type.as_str(),
                _ => "p",
            };
            let _ = writeln!(out, "<{tag} style=\"{}\">{}</{tag}>", el("text"), escape(text));
        }
        BlockContent::Empty => {}
    }
    emit_inserts(out, &block.inserts, None);
    out.push_str("</div>\n");
}

fn emit_inserts(out: &mut String, tree: &ElementTree, parent: Option<crate::NodeId>) {
    for id in tree.children_of(parent) {
        let Some(el) = tree.get(id) else {
            continue;
        };
        let has_children = !tree.children_of(Some(id)).is_empty();
        emit_element(out, el);
        if has_children {
            emit_inserts(out, tree, Some(id));
        }
        out.push_str(closing_tag(el.kind));
    }
}

fn emit_element(out: &mut String, el: &InsertedElement) {
    let mut css = format!(
        "position: absolute; left: {}px; top: {}px;",
        el.position.x, el.position.y
    );
    if let (Some(w), Some(h)) = (el.width, el.height) {
        let _ = write!(css, " width: {w}px; height: {h}px;");
    }
    let inner = element_css(Some(&el.style));
    if !inner.is_empty() {
        css.push(' ');
        css.push_str(&inner);
    }
    let url = escape(el.url.as_deref().unwrap_or("#"));
    let text = escape(&el.content);
    let _ = match el.kind {
        ElementKind::Link => write!(out, "<a href=\"{url}\" style=\"{css}\">{text}"),
        ElementKind::Button => write!(out, "<a class=\"button\" href=\"{url}\" style=\"{css}\">{text}"),
        ElementKind::Image => write!(out, "<div style=\"{css}\"><img src=\"{url}\" alt=\"{text}\">"),
        ElementKind::Icon => write!(out, "<span style=\"{css}\"><i class=\"{text}\"></i>"),
        ElementKind::Text => write!(out, "<span style=\"{css}\">{text}"),
        ElementKind::Heading => write!(out, "<h3 style=\"{css}\">{text}"),
        ElementKind::Paragraph => write!(out, "<p style=\"{css}\">{text}"),
    };
}

fn closing_tag(kind: ElementKind) -> &'static str {
    match kind {
        ElementKind::Link | ElementKind::Button => "</a>\n",
        ElementKind::Image => "</div>\n",
        ElementKind::Icon | ElementKind::Text => "</span>\n",
        ElementKind::Heading => "</h3>\n",
        ElementKind::Paragraph => "</p>\n",
    }
}

/// Both buckets flattened into one escaped declaration list; text wins on
/// clashes.
fn element_css(style: Option<&ElementStyle>) -> String {
    let Some(style) = style else {
        return String::new();
    };
    let mut merged: StyleMap = style.style.clone();
    merged.merge(&style.text_style);
    escape(&merged.to_css())
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Position, Size};
    use crate::registry::BuiltinTemplates;
    use pretty_assertions::assert_eq;

    #[test]
    fn unknown_types_become_stubs() {
        let reg = BuiltinTemplates::new();
        let mut canvas = Canvas::new();
        canvas.add_block(reg.instantiate("hero", Position::new(0.0, 0.0)));
        canvas.add_block(Block::new("carousel", Position::new(0.0, 400.0), Size::new(300.0, 100.0)));
        canvas.add_block(Block::new("carousel", Position::new(0.0, 500.0), Size::new(300.0, 100.0)));

        let bundle = export_html(&canvas, &reg);
        assert_eq!(bundle.report.missing, vec!["carousel".to_string()]);
        assert_eq!(bundle.report.block_count, 3);
        assert!(!bundle.report.is_complete());
        assert!(bundle.html.contains("Missing component: carousel"));
        assert!(bundle.html.contains("<h1 style=\"\">Hero Title</h1>"));
        assert!(bundle.html.contains("height: 600px"));
    }

    #[test]
    fn element_styles_are_inlined() {
        let reg = BuiltinTemplates::new();
        let mut block = reg.instantiate("header1", Position::new(0.0, 0.0));
        let id = block.id;
        block
            .props
            .elements
            .get_mut("navItem-0")
            .unwrap()
            .text_style
            .set("color", "red".into());
        let canvas = Canvas::from_blocks(vec![block]);
        let bundle = export_html(&canvas, &reg);
        assert!(bundle.report.is_complete());
        assert!(bundle.html.contains("<li style=\"color: red;\">Home</li>"));
        assert!(!bundle.html.contains(id.as_str()));
    }

    #[test]
    fn style_values_cannot_break_out_of_attributes() {
        let reg = BuiltinTemplates::new();
        let mut block = reg.instantiate("hero", Position::new(0.0, 0.0));
        block
            .props
            .elements
            .get_mut("title")
            .unwrap()
            .text_style
            .set("fontFamily", "\"Inter\"><script>x</script>".into());
        block.props.style.set("backgroundImage", "url(\"a.png\")".into());
        let bundle = export_html(&Canvas::from_blocks(vec![block]), &reg);

        assert!(!bundle.html.contains("<script>"));
        assert!(bundle.html.contains("font-family: &quot;Inter&quot;&gt;&lt;script&gt;"));
        assert!(bundle.html.contains("url(&quot;a.png&quot;)"));
    }

    #[test]
    fn page_width_follows_configuration() {
        let reg = BuiltinTemplates::new();
        let mut canvas = Canvas::new();
        canvas.add_block(reg.instantiate("hero", Position::new(0.0, 0.0)));
        let html = export_html_at(&canvas, &reg, 1440.0).html;
        assert!(html.contains("width: 1440px; height: 400px;"));

        // A block past the configured edge widens the page.
        canvas.add_block(reg.instantiate("hero", Position::new(800.0, 0.0)));
        let html = export_html_at(&canvas, &reg, 1440.0).html;
        assert!(html.contains("width: 1800px;"));
    }

    #[test]
    fn text_is_escaped() {
        assert_eq!(escape("<b>\"A&B\"</b>"), "&lt;b&gt;&quot;A&amp;B&quot;&lt;/b&gt;");
    }
}
