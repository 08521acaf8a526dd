//! Persistence: JSON interchange and compact binary snapshots.
//!
//! The JSON form is the bare block array the builder exchanges with
//! storage and export. The binary form (MessagePack with named fields)
//! carries the same data in less space.

use crate::id::NodeId;
use crate::model::Canvas;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("invalid document JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("could not encode snapshot: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    #[error("could not decode snapshot: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
    #[error("id {0} is used more than once")]
    DuplicateId(NodeId),
}

/// Serialize the block collection as pretty JSON.
pub fn to_json(canvas: &Canvas) -> Result<String, DocumentError> {
    Ok(serde_json::to_string_pretty(canvas)?)
}

/// Serialize as single-line JSON (for the browser bridge).
pub fn to_json_compact(canvas: &Canvas) -> Result<String, DocumentError> {
    Ok(serde_json::to_string(canvas)?)
}

/// Parse and validate a block collection.
pub fn from_json(input: &str) -> Result<Canvas, DocumentError> {
    let canvas: Canvas = serde_json::from_str(input)?;
    validate(&canvas)?;
    log::debug!("loaded {} blocks from JSON", canvas.len());
    Ok(canvas)
}

pub fn to_msgpack(canvas: &Canvas) -> Result<Vec<u8>, DocumentError> {
    Ok(rmp_serde::to_vec_named(canvas)?)
}

pub fn from_msgpack(bytes: &[u8]) -> Result<Canvas, DocumentError> {
    let canvas: Canvas = rmp_serde::from_slice(bytes)?;
    validate(&canvas)?;
    Ok(canvas)
}

/// Every block and inserted element id must be unique across the page.
pub fn validate(canvas: &Canvas) -> Result<(), DocumentError> {
    let mut seen = HashSet::new();
    for block in canvas.blocks() {
        if !seen.insert(block.id) {
            return Err(DocumentError::DuplicateId(block.id));
        }
        for id in block.inserts.flatten() {
            if !seen.insert(id) {
                return Err(DocumentError::DuplicateId(id));
            }
        }
    }
    Ok(())
}
