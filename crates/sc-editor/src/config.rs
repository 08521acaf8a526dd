//! Editor configuration.

use sc_core::geometry::{MinSize, VIRTUAL_WIDTH};
use serde::{Deserialize, Serialize};

/// Tunables for one editing session. Every field has a default, so a
/// partial JSON object (or `{}`) deserializes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Width of the virtual canvas stored coordinates refer to.
    pub virtual_width: f32,
    /// Resize floor for blocks.
    pub min_size: MinSize,
    /// Resize floor for inserted elements.
    pub element_min_size: MinSize,
    /// Maximum number of undo steps kept.
    pub history_depth: usize,
    /// Area-selection boxes smaller than this (px, either side) clear
    /// the selection instead of selecting.
    pub area_select_threshold: f32,
    /// Pointer distance (px) within which a resize handle is grabbed.
    pub handle_tolerance: f32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            virtual_width: VIRTUAL_WIDTH,
            min_size: MinSize::BLOCK,
            element_min_size: MinSize::ELEMENT,
            history_depth: 50,
            area_select_threshold: 10.0,
            handle_tolerance: 6.0,
        }
    }
}
