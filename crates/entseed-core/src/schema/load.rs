use std::path::Path;

use tracing::debug;

use crate::error::{EntseedError, Result};
use crate::schema::types::Entities;

/// Parse the schema reader's JSON output: an object keyed by entity name.
pub fn parse_schema(json: &str) -> Result<Entities> {
    let mut entities: Entities =
        serde_json::from_str(json).map_err(|e| EntseedError::SchemaParse { source: e })?;
    for (name, entity) in entities.iter_mut() {
        entity.name = name.clone();
    }
    debug!("Parsed {} entities", entities.len());
    Ok(entities)
}

/// Read and parse a schema JSON file.
pub fn read_schema(path: &Path) -> Result<Entities> {
    let content = std::fs::read_to_string(path).map_err(|e| EntseedError::Output {
        message: format!("Failed to read schema {}", path.display()),
        source: e,
    })?;
    parse_schema(&content)
}
