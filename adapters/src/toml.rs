//! TOML inputs.

use crate::Error;
use bincraft_layout::{Config, Schema, Tree, Value};
use std::{path::Path, sync::Arc};

/// Parses a TOML document.
pub fn from_str(s: &str) -> Result<Value, Error> {
    Ok(::toml::from_str(s)?)
}

/// Builds `schema` from the TOML file at `path`.
pub fn load(path: impl AsRef<Path>, schema: &Arc<Schema>) -> Result<Tree, Error> {
    load_cfg(path, schema, Config::default())
}

/// Builds `schema` from the TOML file at `path` with a custom configuration.
pub fn load_cfg(path: impl AsRef<Path>, schema: &Arc<Schema>, cfg: Config) -> Result<Tree, Error> {
    crate::load(path.as_ref(), schema, cfg, from_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        let value = from_str("magic = 7\nname = \"hdr\"\n\n[inner]\nitems = [1, 2]\n").unwrap();
        assert_eq!(value.get("magic"), Some(&Value::Int(7)));
        assert_eq!(value.get("name"), Some(&Value::from("hdr")));
        assert_eq!(
            value.get("inner").and_then(|v| v.get("items")),
            Some(&Value::list([1, 2]))
        );
        assert!(matches!(from_str("magic = "), Err(Error::Toml(_))));
    }
}
