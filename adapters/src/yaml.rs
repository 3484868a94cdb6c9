//! YAML inputs.

use crate::Error;
use bincraft_layout::{Config, Schema, Tree, Value};
use std::{path::Path, sync::Arc};

/// Parses a YAML document.
pub fn from_str(s: &str) -> Result<Value, Error> {
    Ok(serde_yaml::from_str(s)?)
}

/// Builds `schema` from the YAML file at `path`.
pub fn load(path: impl AsRef<Path>, schema: &Arc<Schema>) -> Result<Tree, Error> {
    load_cfg(path, schema, Config::default())
}

/// Builds `schema` from the YAML file at `path` with a custom configuration.
pub fn load_cfg(path: impl AsRef<Path>, schema: &Arc<Schema>, cfg: Config) -> Result<Tree, Error> {
    crate::load(path.as_ref(), schema, cfg, from_str)
}
