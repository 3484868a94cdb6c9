//! Error types for layout builds.
//!
//! Every failure carries an [ErrorKind] (what went wrong) and a trail of notes (where it went
//! wrong). Notes are appended as an error propagates out of nested blocks and sequences, so a
//! failure deep in a tree reads as a path from the root to the failing leaf:
//!
//! ```text
//! validation failed: Value 300 outside of range, must be -128 to 255
//!   at Archive -> entries: Array[Entry]
//!   at Array[Entry] -> (element 2)
//!   at Entry -> flags: U8
//! ```

use std::{fmt, io, path::PathBuf};
use thiserror::Error;

/// A specialized `Result` type for layout operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The umbrella category of an [ErrorKind].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    /// A value (raw input, or the size or offset of an unbuilt node) was not available.
    DataMissing,
    /// A value was supplied but failed a node's type or range check.
    Validation,
    /// The declaration itself is unusable (names, dependencies, wrapping, file access).
    Build,
}

/// The cause of a failed build.
#[derive(Error, Debug)]
pub enum ErrorKind {
    #[error("data missing: {0}")]
    DataMissing(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("length exceeded: {0} is outside of the configured range")]
    LengthExceeded(usize),
    #[error("build failed: {0}")]
    Build(String),
    #[error("name '{0}' is reserved and cannot be used as a field name")]
    Reserved(String),
    #[error("setter for '{field}' in {schema} is trying to access itself")]
    SelfAccess { schema: String, field: String },
    #[error("couldn't build all fields of {schema}, check for circular dependencies among {fields:?}")]
    CircularDependency { schema: String, fields: Vec<String> },
    #[error("file read error: {}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Clone for ErrorKind {
    fn clone(&self) -> Self {
        match self {
            Self::DataMissing(msg) => Self::DataMissing(msg.clone()),
            Self::Validation(msg) => Self::Validation(msg.clone()),
            Self::LengthExceeded(len) => Self::LengthExceeded(*len),
            Self::Build(msg) => Self::Build(msg.clone()),
            Self::Reserved(name) => Self::Reserved(name.clone()),
            Self::SelfAccess { schema, field } => Self::SelfAccess {
                schema: schema.clone(),
                field: field.clone(),
            },
            Self::CircularDependency { schema, fields } => Self::CircularDependency {
                schema: schema.clone(),
                fields: fields.clone(),
            },
            // io::Error is not Clone, so the copy keeps only its kind and message.
            Self::FileRead { path, source } => Self::FileRead {
                path: path.clone(),
                source: io::Error::new(source.kind(), source.to_string()),
            },
        }
    }
}

impl ErrorKind {
    /// Returns the umbrella category of this kind.
    pub fn category(&self) -> Category {
        match self {
            Self::DataMissing(_) => Category::DataMissing,
            Self::Validation(_) | Self::LengthExceeded(_) => Category::Validation,
            Self::Build(_)
            | Self::Reserved(_)
            | Self::SelfAccess { .. }
            | Self::CircularDependency { .. }
            | Self::FileRead { .. } => Category::Build,
        }
    }
}

/// A build failure together with its diagnostic trail.
#[derive(Clone, Debug)]
pub struct Error {
    kind: ErrorKind,

    /// Notes in the order they were attached (innermost first).
    notes: Vec<String>,
}

impl Error {
    /// Creates a data-missing error.
    pub fn missing(msg: impl Into<String>) -> Self {
        ErrorKind::DataMissing(msg.into()).into()
    }

    /// Creates a validation error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        ErrorKind::Validation(msg.into()).into()
    }

    /// Creates a structural build error.
    pub fn build(msg: impl Into<String>) -> Self {
        ErrorKind::Build(msg.into()).into()
    }

    /// Returns the cause of this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Returns the umbrella category of this error.
    pub fn category(&self) -> Category {
        self.kind.category()
    }

    /// Attaches a diagnostic note while propagating outward. The kind is left untouched.
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Iterates over the attached notes from the root of the tree to the failing leaf.
    pub fn trail(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.notes.iter().rev().map(String::as_str)
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self {
            kind,
            notes: Vec::new(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        for note in self.trail() {
            write!(f, "\n  at {note}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_trail_is_root_first() {
        let err = Error::invalid("bad value")
            .note("Leaf -> value: U8")
            .note("Array[Leaf] -> (element 1)")
            .note("Root -> leaves: Array[Leaf]");
        let trail: Vec<_> = err.trail().collect();
        assert_eq!(
            trail,
            vec![
                "Root -> leaves: Array[Leaf]",
                "Array[Leaf] -> (element 1)",
                "Leaf -> value: U8",
            ]
        );
        assert_eq!(
            err.to_string(),
            "validation failed: bad value\n  at Root -> leaves: Array[Leaf]\n  at Array[Leaf] -> (element 1)\n  at Leaf -> value: U8"
        );
    }

    #[test]
    fn test_note_preserves_kind() {
        let err = Error::missing("no value").note("Root -> a: U8");
        assert!(matches!(err.kind(), ErrorKind::DataMissing(msg) if msg == "no value"));
        assert_eq!(err.category(), Category::DataMissing);
    }

    #[test]
    fn test_categories() {
        assert_eq!(Error::build("x").category(), Category::Build);
        assert_eq!(
            Error::from(ErrorKind::LengthExceeded(5)).category(),
            Category::Validation
        );
        assert_eq!(
            Error::from(ErrorKind::CircularDependency {
                schema: "S".into(),
                fields: vec!["a".into()],
            })
            .category(),
            Category::Build
        );
    }

    #[test]
    fn test_file_read_source() {
        let err = Error::from(ErrorKind::FileRead {
            path: PathBuf::from("missing.bin"),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        });
        assert_eq!(err.to_string(), "file read error: missing.bin");
        assert!(err.source().is_some());

        let copy = err.clone().note("Image -> firmware: File");
        assert!(
            matches!(copy.kind(), ErrorKind::FileRead { source, .. } if source.kind() == io::ErrorKind::NotFound)
        );
        assert_eq!(copy.trail().count(), 1);
        assert_eq!(err.trail().count(), 0);
    }
}
