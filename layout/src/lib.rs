//! Declare binary layouts as typed field trees and build them into bytes.
//!
//! # Overview
//!
//! A layout is declared as a [Schema]: an ordered list of named fields, each with a declared
//! [Kind]. Building a schema against a loosely typed [Value] produces a [Tree] of nodes whose
//! concatenated bytes are the final binary.
//!
//! Fields can be computed from other fields with a [Setter]: a length prefix from the size of a
//! body, a pointer from the offset of a later table, a checksum from earlier bytes. Setters declare
//! which fields they read and which offsets they query, and the build engine resolves fields in an
//! order that satisfies every declaration. Circular declarations are reported with every stuck
//! field named.
//!
//! # Supported Kinds
//!
//! - Integers: `U8`, `U16`, `U32`, `U64` (big-endian, signed or unsigned input)
//! - Buffers: `Bytes`, `File` (read relative to [Config::root_path])
//! - Layout helpers: `Empty` (zero bytes), `Align[T]` (zero padding to the size of `T`)
//! - Containers: `Array[T]`, nested blocks, and `OneOf` alternatives
//!
//! # Example
//!
//! ```
//! use bincraft_layout::{build, Config, Kind, Schema, Setter, Value};
//!
//! let header = Schema::builder("Header")
//!     .field("magic", Kind::U16)
//!     .computed(
//!         "body_offset",
//!         Kind::U8,
//!         Setter::new(|scope| Ok(scope.offset("body")?.into())).offsets(["body"]),
//!     )
//!     .field("pad", Kind::align(Kind::U32))
//!     .field("body", Kind::Bytes)
//!     .build();
//!
//! let input = Value::map([("magic", Value::from(0xcafe)), ("body", Value::from("ok"))]);
//! let tree = build(&header, &input, &Config::default()).unwrap();
//!
//! let root = tree.root();
//! assert_eq!(root.size().unwrap(), 6);
//! assert_eq!(root.field("body").unwrap().global_offset().unwrap(), 4);
//! assert_eq!(
//!     root.to_bytes().unwrap(),
//!     vec![0xca, 0xfe, 0x04, 0x00, b'o', b'k']
//! );
//! ```

mod array;
pub mod block;
pub mod config;
pub mod encode;
pub mod error;
pub mod file;
pub mod kind;
pub mod padding;
pub mod primitive;
pub mod raw;
pub mod schema;
pub mod tree;
pub mod value;
mod wrap;

pub use block::Scope;
pub use config::{Config, RangeCfg, Scan};
pub use encode::{Encode, Write};
pub use error::{Category, Error, ErrorKind, Result};
pub use kind::{Kind, Width};
pub use schema::{Builder, Field, Output, Schema, Setter, RESERVED_NAMES};
pub use tree::{Node, NodeId, Tree};
pub use value::Value;

use std::sync::Arc;
use tree::Position;

/// Builds `schema` from `input` into a new [Tree].
///
/// Fails with the first error encountered. No partial tree is returned.
pub fn build(schema: &Arc<Schema>, input: &Value, cfg: &Config) -> Result<Tree> {
    let mut tree = Tree::new(cfg.root_path.clone());
    block::build(&mut tree, schema, None, Position::Root, input, cfg, 0)?;
    Ok(tree)
}
