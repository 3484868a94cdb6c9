//! Byte buffers read from disk.

use crate::{
    config::RangeCfg,
    error::{Error, ErrorKind, Result},
    raw,
    value::Value,
};
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolves `path` against `root_path` unless it is absolute.
pub fn resolve(path: &Path, root_path: Option<&Path>) -> PathBuf {
    match root_path {
        Some(root) if path.is_relative() => root.join(path),
        _ => path.to_path_buf(),
    }
}

/// Reads the file named by `value` (a path string) and returns its path and contents.
pub fn load(
    value: &Value,
    root_path: Option<&Path>,
    max_len: &RangeCfg<usize>,
) -> Result<(PathBuf, Bytes)> {
    let Value::Str(path) = value else {
        return Err(Error::invalid(format!(
            "Expected path str, received {}",
            value.type_name()
        )));
    };
    let path = resolve(Path::new(path), root_path);
    let contents =
        std::fs::read(&path).map_err(|source| ErrorKind::FileRead {
            path: path.clone(),
            source,
        })?;
    debug!(path = %path.display(), len = contents.len(), "read file");
    raw::check_len(contents.len(), max_len)?;
    Ok((path, Bytes::from(contents)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Category;

    #[test]
    fn test_resolve() {
        let root = Path::new("/data/layouts");
        assert_eq!(
            resolve(Path::new("blob.bin"), Some(root)),
            PathBuf::from("/data/layouts/blob.bin")
        );
        assert_eq!(
            resolve(Path::new("/abs/blob.bin"), Some(root)),
            PathBuf::from("/abs/blob.bin")
        );
        assert_eq!(
            resolve(Path::new("blob.bin"), None),
            PathBuf::from("blob.bin")
        );
    }

    #[test]
    fn test_load_relative() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("payload.bin"), [7, 8, 9]).unwrap();
        let (path, contents) = load(
            &Value::Str("payload.bin".into()),
            Some(dir.path()),
            &RangeCfg::from(..),
        )
        .unwrap();
        assert_eq!(path, dir.path().join("payload.bin"));
        assert_eq!(contents.as_ref(), &[7, 8, 9]);
    }

    #[test]
    fn test_load_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(
            &Value::Str("nope.bin".into()),
            Some(dir.path()),
            &RangeCfg::from(..),
        )
        .unwrap_err();
        assert_eq!(err.category(), Category::Build);
        assert!(matches!(err.kind(), ErrorKind::FileRead { path, .. } if path.ends_with("nope.bin")));
    }

    #[test]
    fn test_load_too_long() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("big.bin"), [0; 10]).unwrap();
        let err = load(
            &Value::Str("big.bin".into()),
            Some(dir.path()),
            &RangeCfg::from(..=8),
        )
        .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::LengthExceeded(10)));
    }

    #[test]
    fn test_load_wrong_type() {
        let err = load(&Value::Int(3), None, &RangeCfg::from(..)).unwrap_err();
        assert_eq!(err.category(), Category::Validation);
    }
}
