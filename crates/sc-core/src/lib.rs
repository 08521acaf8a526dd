pub mod document;
pub mod export;
pub mod geometry;
pub mod id;
pub mod model;
pub mod registry;
pub mod style;
pub mod tree;

pub use document::DocumentError;
pub use export::{ExportBundle, ExportReport, export_html, export_html_at};
pub use geometry::{CanvasScale, MinSize, Position, Rect, ResizeHandle, Size, VIRTUAL_WIDTH};
pub use id::{IdKind, NodeId};
pub use model::*;
pub use registry::{BuiltinTemplates, SlotRole, Template, TemplateRegistry, TemplateSchema};
pub use style::{ElementStyle, StyleBucket, StyleMap, StyleValue, classify_property};
pub use tree::{ElementKind, ElementTree, InsertedElement, TreeError};

// Re-export kurbo so downstream crates share one vector type
pub use kurbo::{Point, Vec2};
