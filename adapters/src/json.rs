//! JSON inputs.

use crate::Error;
use bincraft_layout::{Config, Schema, Tree, Value};
use std::{path::Path, sync::Arc};

/// Parses a JSON document.
pub fn from_str(s: &str) -> Result<Value, Error> {
    Ok(serde_json::from_str(s)?)
}

/// Builds `schema` from the JSON file at `path`.
pub fn load(path: impl AsRef<Path>, schema: &Arc<Schema>) -> Result<Tree, Error> {
    load_cfg(path, schema, Config::default())
}

/// Builds `schema` from the JSON file at `path` with a custom configuration.
pub fn load_cfg(path: impl AsRef<Path>, schema: &Arc<Schema>, cfg: Config) -> Result<Tree, Error> {
    crate::load(path.as_ref(), schema, cfg, from_str)
}
