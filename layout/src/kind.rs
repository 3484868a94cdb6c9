//! Declared field types.

use crate::schema::Schema;
use std::{fmt, sync::Arc};

/// The bit width of a primitive integer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Width {
    W8,
    W16,
    W32,
    W64,
}

impl Width {
    /// Returns the number of bits.
    pub const fn bits(self) -> u32 {
        match self {
            Self::W8 => 8,
            Self::W16 => 16,
            Self::W32 => 32,
            Self::W64 => 64,
        }
    }

    /// Returns the number of encoded bytes.
    pub const fn bytes(self) -> usize {
        (self.bits() / 8) as usize
    }

    /// The smallest accepted value: the signed minimum.
    pub const fn min(self) -> i128 {
        -(1i128 << (self.bits() - 1))
    }

    /// The largest accepted value: the unsigned maximum.
    pub const fn max(self) -> i128 {
        (1i128 << self.bits()) - 1
    }
}

/// The declared type of a field or sequence element.
///
/// Only [Kind::Primitive] and [Kind::Empty] have a size that is known without instance data (see
/// [Kind::fixed_size]). That distinction drives dependency inference in blocks: a field whose
/// offset matters can only be placed once every preceding field of unknown size is built.
#[derive(Clone)]
pub enum Kind {
    /// A fixed-width integer.
    Primitive(Width),
    /// A raw byte buffer.
    Bytes,
    /// A byte buffer read from a file path.
    File,
    /// A zero-size placeholder that emits nothing.
    Empty,
    /// Zero padding up to the next multiple of the target's static size.
    Align(Box<Kind>),
    /// A sequence of elements of one kind.
    Array(Box<Kind>),
    /// A composite with named fields.
    Block(Arc<Schema>),
    /// Any one of several kinds. Values must be typed explicitly (see [crate::Output::Typed]).
    OneOf(Vec<Kind>),
}

impl Kind {
    pub const U8: Kind = Kind::Primitive(Width::W8);
    pub const U16: Kind = Kind::Primitive(Width::W16);
    pub const U32: Kind = Kind::Primitive(Width::W32);
    pub const U64: Kind = Kind::Primitive(Width::W64);

    /// Padding that aligns the next field to the static size of `target`.
    pub fn align(target: Kind) -> Self {
        Self::Align(Box::new(target))
    }

    /// A sequence of `element`.
    pub fn array(element: Kind) -> Self {
        Self::Array(Box::new(element))
    }

    /// A nested composite.
    pub fn block(schema: &Arc<Schema>) -> Self {
        Self::Block(schema.clone())
    }

    /// A field that accepts any of `kinds`.
    pub fn one_of(kinds: impl IntoIterator<Item = Kind>) -> Self {
        Self::OneOf(kinds.into_iter().collect())
    }

    /// Returns the size of this kind if it is known without any instance data.
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            Self::Primitive(width) => Some(width.bytes()),
            Self::Empty => Some(0),
            _ => None,
        }
    }

    /// Returns the display name of this kind.
    pub fn type_name(&self) -> String {
        match self {
            Self::Primitive(width) => format!("U{}", width.bits()),
            Self::Bytes => "Bytes".into(),
            Self::File => "File".into(),
            Self::Empty => "Empty".into(),
            Self::Align(target) => format!("Align[{}]", target.type_name()),
            Self::Array(element) => format!("Array[{}]", element.type_name()),
            Self::Block(schema) => schema.name().into(),
            Self::OneOf(kinds) => kinds
                .iter()
                .map(Kind::type_name)
                .collect::<Vec<_>>()
                .join(" | "),
        }
    }
}

impl PartialEq for Kind {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Primitive(a), Self::Primitive(b)) => a == b,
            (Self::Bytes, Self::Bytes) | (Self::File, Self::File) | (Self::Empty, Self::Empty) => {
                true
            }
            (Self::Align(a), Self::Align(b)) | (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Block(a), Self::Block(b)) => Arc::ptr_eq(a, b),
            (Self::OneOf(a), Self::OneOf(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_name())
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_name())
    }
}
