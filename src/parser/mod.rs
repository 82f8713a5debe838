use anyhow::{Result, anyhow};

use crate::model::Document;

/// Parse the whole input JSON string into a `Document`.
///
/// The document is expected to carry a top-level object with `name`,
/// `player` and `font`; every entity list is optional and may contain
/// holes (`false` / `null`).
pub fn load_from_json(json: &str) -> Result<Document> {
    log::info!("File loaded, size: {} bytes", json.len());

    let doc: Document =
        serde_json::from_str(json).map_err(|e| anyhow!("Failed to parse JSON: {}", e))?;

    log::info!(
        "Document `{}` parsed: {} frames, {} tiles, {} rooms, {} sounds, {} scripts",
        doc.name,
        doc.frames.len(),
        doc.tiles.len(),
        doc.rooms.len(),
        doc.sounds.len(),
        doc.scripts.len()
    );

    Ok(doc)
}
