//! Load layout inputs from JSON, TOML, or YAML and visualize built trees.
//!
//! Each front-end parses a document into a [Value] and builds it against a schema. Relative
//! `File` paths in the document are resolved against the directory the document was loaded from.
//!
//! # Example
//!
//! ```
//! use bincraft_adapters::{json, visualize};
//! use bincraft_layout::{build, Config, Kind, Schema};
//!
//! let schema = Schema::builder("Header")
//!     .field("magic", Kind::U16)
//!     .field("items", Kind::array(Kind::U8))
//!     .build();
//! let value = json::from_str(r#"{"magic": 258, "items": [1, 2]}"#).unwrap();
//! let tree = build(&schema, &value, &Config::default()).unwrap();
//! assert_eq!(tree.root().to_bytes().unwrap(), vec![1, 2, 1, 2]);
//! assert_eq!(
//!     visualize(tree.root()).unwrap(),
//!     "0x0 (0x0) magic: U16\n0x2 (0x2) items: Array[U8] (2)\n    0x2 ...\n"
//! );
//! ```

use bincraft_layout::{build, Config, Schema, Tree, Value};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use thiserror::Error;
use tracing::debug;

pub mod json;
pub mod toml;
mod visualize;
pub mod yaml;

pub use visualize::visualize;

/// Errors that can occur when loading a layout input.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("toml error: {0}")]
    Toml(#[from] ::toml::de::Error),
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("build error: {0}")]
    Build(#[from] bincraft_layout::Error),
}

/// Returns the absolute directory containing `path`.
fn root_dir(path: &Path) -> Result<PathBuf, Error> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    Ok(std::path::absolute(parent)?)
}

/// Reads `path`, parses it with `parse`, and builds `schema` from the result.
///
/// `cfg.root_path` is replaced with the directory of `path`.
fn load(
    path: &Path,
    schema: &Arc<Schema>,
    cfg: Config,
    parse: fn(&str) -> Result<Value, Error>,
) -> Result<Tree, Error> {
    let text = std::fs::read_to_string(path)?;
    let value = parse(&text)?;
    let root = root_dir(path)?;
    debug!(path = %path.display(), root = %root.display(), schema = schema.name(), "loaded input");
    Ok(build(schema, &value, &cfg.with_root_path(root))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_dir() {
        let dir = root_dir(Path::new("/data/layouts/input.json")).unwrap();
        assert_eq!(dir, PathBuf::from("/data/layouts"));

        let dir = root_dir(Path::new("input.json")).unwrap();
        assert!(dir.is_absolute());
        assert_eq!(dir, std::path::absolute(".").unwrap());
    }
}
