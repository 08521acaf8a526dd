//! Interactive editing for Sitecraft pages: selection, history, pointer
//! gestures, drop placement and the style panel, all driven through one
//! `EditorStore`.

pub mod config;
pub mod history;
pub mod hit;
pub mod input;
pub mod interaction;
pub mod panel;
pub mod placement;
pub mod selection;
pub mod shortcuts;
pub mod store;

pub use config::EditorConfig;
pub use history::{History, HistoryEntry};
pub use input::{InputEvent, KeyTarget, Modifiers};
pub use interaction::{ArrangeTool, DragKind, DragTarget};
pub use panel::{PanelField, PanelView, StylePanel};
pub use placement::{CanvasFrame, DropEvent, Measurer, place};
pub use selection::{Selection, SelectionSet};
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use store::{CanvasMutation, EditorAction, EditorStore, ThemeConfig, ZOrder};
