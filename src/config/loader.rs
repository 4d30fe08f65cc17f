//! Load entity declarations from a YAML (or JSON) file and resolve them into a registry.

use crate::config::{EntityDescriptor, EntityRegistry};
use crate::error::ConfigError;
use std::path::Path;

/// Parse a declaration document: a list of entities.
pub fn parse_entities(source: &str) -> Result<Vec<EntityDescriptor>, ConfigError> {
    serde_yaml::from_str(source).map_err(|e| ConfigError::Load(e.to_string()))
}

/// Read a declaration file and build the registry from it.
pub async fn load_registry(path: &Path) -> Result<EntityRegistry, ConfigError> {
    let source = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    let entities = parse_entities(&source)?;
    tracing::info!(path = %path.display(), entities = entities.len(), "entity declarations loaded");
    EntityRegistry::builder().register_all(entities).build()
}
