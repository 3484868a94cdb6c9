//! Composite declarations: named, ordered, typed fields.
//!
//! A [Schema] is declared once with a [Builder] and shared (via `Arc`) by every block built from
//! it. Each field takes its value from one of three places:
//!
//! - the block's input, looked up by field name ([Builder::field]),
//! - a [Setter] that computes it from sibling fields, offsets, or the input ([Builder::computed]),
//! - a pre-populated default ([Builder::default]).
//!
//! Setters declare what they touch up front with [Setter::reads] and [Setter::offsets]. The build
//! engine derives a safe resolution order from those declarations.
//!
//! # Example
//!
//! ```
//! use bincraft_layout::{build, Config, Kind, Schema, Setter, Value};
//!
//! let schema = Schema::builder("Packet")
//!     .computed(
//!         "len",
//!         Kind::U16,
//!         Setter::new(|scope| Ok(scope.field("body")?.size()?.into())).reads(["body"]),
//!     )
//!     .field("body", Kind::Bytes)
//!     .build();
//!
//! let input = Value::map([("body", "hi")]);
//! let tree = build(&schema, &input, &Config::default()).unwrap();
//! assert_eq!(tree.root().to_bytes().unwrap(), vec![0x00, 0x02, b'h', b'i']);
//! ```

use crate::{
    block::{self, Scope},
    error::{Error, Result},
    kind::Kind,
    value::Value,
};
use std::{fmt, sync::Arc};

/// Names that cannot be used as field names.
///
/// These collide with the queries every node answers, so a field with one of these names could
/// never be addressed unambiguously. Using one is reported by [Schema::check] and fails every
/// build of the schema.
pub const RESERVED_NAMES: [&str; 11] = [
    "offset",
    "global_offset",
    "offset_of",
    "child_level",
    "parent_prop_name",
    "size",
    "bit_size",
    "static_size",
    "to_bytes",
    "type_name",
    "root_path",
];

/// The value produced for a field by a setter or default.
#[derive(Clone, Debug, PartialEq)]
pub enum Output {
    /// An untyped value, wrapped into the field's declared kind.
    Raw(Value),
    /// A value that is already an instance of `Kind`.
    ///
    /// Required for fields declared as [Kind::OneOf], where the alternative must be chosen.
    Typed(Kind, Value),
}

impl Output {
    /// Creates a typed output.
    pub fn typed(kind: Kind, value: impl Into<Value>) -> Self {
        Self::Typed(kind, value.into())
    }
}

impl From<Value> for Output {
    fn from(v: Value) -> Self {
        Self::Raw(v)
    }
}

macro_rules! impl_output_from {
    ($($type:ty),+) => {
        $(
            impl From<$type> for Output {
                fn from(v: $type) -> Self {
                    Self::Raw(v.into())
                }
            }
        )+
    };
}

impl_output_from!(
    i8, i16, i32, i64, i128, u8, u16, u32, u64, usize, bool, &str, String, Vec<u8>, &[u8]
);

type SetterFn = dyn Fn(&Scope<'_>) -> Result<Output> + Send + Sync;

/// Computes a field's value once its declared dependencies are built.
#[derive(Clone)]
pub struct Setter {
    func: Arc<SetterFn>,
    reads: Vec<String>,
    offsets: Vec<String>,
}

impl Setter {
    /// Wraps a setter function. It may only touch what it declares.
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&Scope<'_>) -> Result<Output> + Send + Sync + 'static,
    {
        Self {
            func: Arc::new(func),
            reads: Vec::new(),
            offsets: Vec::new(),
        }
    }

    /// Declares sibling fields whose built nodes the setter reads.
    ///
    /// A setter may not read its own field.
    pub fn reads<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reads.extend(names.into_iter().map(Into::into));
        self
    }

    /// Declares fields whose offsets the setter queries.
    ///
    /// The setter's own field may be listed: its offset only depends on the fields before it.
    pub fn offsets<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.offsets.extend(names.into_iter().map(Into::into));
        self
    }

    /// Returns the declared value dependencies.
    pub fn read_names(&self) -> &[String] {
        &self.reads
    }

    /// Returns the declared offset dependencies.
    pub fn offset_names(&self) -> &[String] {
        &self.offsets
    }

    pub(crate) fn call(&self, scope: &Scope<'_>) -> Result<Output> {
        (self.func)(scope)
    }
}

impl fmt::Debug for Setter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Setter")
            .field("reads", &self.reads)
            .field("offsets", &self.offsets)
            .finish_non_exhaustive()
    }
}

/// Where a field's value comes from.
#[derive(Clone, Debug)]
pub(crate) enum Init {
    Input,
    Setter(Setter),
    Default(Output),
}

/// One declared field of a [Schema].
#[derive(Clone, Debug)]
pub struct Field {
    name: String,
    kind: Kind,
    init: Init,
}

impl Field {
    /// Returns the field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared kind.
    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    /// Returns the setter, if the field is computed.
    pub fn setter(&self) -> Option<&Setter> {
        match &self.init {
            Init::Setter(setter) => Some(setter),
            _ => None,
        }
    }

    pub(crate) fn init(&self) -> &Init {
        &self.init
    }
}

/// The declaration of a composite type.
pub struct Schema {
    name: String,
    fields: Vec<Field>,

    /// Dependency set of every field, derived once when the schema is declared.
    plan: Result<Vec<Vec<usize>>>,
}

impl Schema {
    /// Starts declaring a composite named `name`.
    pub fn builder(name: impl Into<String>) -> Builder {
        Builder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Returns the type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the fields in declaration order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Reports why the declaration can never build, if it can't.
    ///
    /// Covers reserved and duplicate names, misused `Align` fields, and setter declarations that
    /// name unknown fields or the field itself.
    pub fn check(&self) -> Result<()> {
        self.dependencies().map(|_| ())
    }

    pub(crate) fn dependencies(&self) -> Result<&[Vec<usize>]> {
        match &self.plan {
            Ok(deps) => Ok(deps.as_slice()),
            Err(err) => Err(err.clone()),
        }
    }

    /// Returns the declaration index of `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Returns the size of every instance, if all fields have a static size.
    pub fn static_size(&self) -> Result<usize> {
        self.static_size_before(self.fields.len())
    }

    /// Returns the offset of `name` in every instance, if all preceding fields have a static
    /// size.
    ///
    /// Prefer querying offsets from a setter (see [Scope::offset]) where the engine can order the
    /// build around them.
    pub fn static_offset_of(&self, name: &str) -> Result<usize> {
        let index = self
            .position(name)
            .ok_or_else(|| Error::build(format!("field '{name}' does not exist in {}", self.name)))?;
        self.static_size_before(index)
    }

    fn static_size_before(&self, end: usize) -> Result<usize> {
        self.fields[..end].iter().try_fold(0, |acc, field| {
            field.kind.fixed_size().map(|size| acc + size).ok_or_else(|| {
                Error::missing(format!(
                    "size of '{}: {}' in {} is not known statically",
                    field.name, field.kind, self.name
                ))
            })
        })
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .finish()
    }
}

/// Declares the fields of a [Schema] in order.
#[derive(Debug)]
pub struct Builder {
    name: String,
    fields: Vec<Field>,
}

impl Builder {
    /// Adds a field whose value is looked up by name in the block's input.
    pub fn field(self, name: impl Into<String>, kind: Kind) -> Self {
        self.push(name, kind, Init::Input)
    }

    /// Adds a field computed by `setter`.
    pub fn computed(self, name: impl Into<String>, kind: Kind, setter: Setter) -> Self {
        self.push(name, kind, Init::Setter(setter))
    }

    /// Adds a field with a pre-populated value, resolved before any other field.
    pub fn default(self, name: impl Into<String>, kind: Kind, value: impl Into<Output>) -> Self {
        self.push(name, kind, Init::Default(value.into()))
    }

    /// Finishes the declaration.
    ///
    /// Declaring never fails. A declaration that can never build is reported by [Schema::check]
    /// and by every build of the schema.
    pub fn build(self) -> Arc<Schema> {
        let mut schema = Schema {
            name: self.name,
            fields: self.fields,
            plan: Ok(Vec::new()),
        };
        schema.plan = block::plan(&schema);
        Arc::new(schema)
    }

    fn push(mut self, name: impl Into<String>, kind: Kind, init: Init) -> Self {
        self.fields.push(Field {
            name: name.into(),
            kind,
            init,
        });
        self
    }
}
