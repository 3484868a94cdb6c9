//! The dependency-resolution build engine.
//!
//! Building a block runs in three steps:
//!
//! 1. Fields with a default are wrapped immediately.
//! 2. Every other field gets a dependency set, computed once per [Schema] when it is declared. An `Align` field depends on every preceding field
//!    without a static size (its length depends on its offset). A computed field depends on the
//!    fields its [Setter] reads, plus every field without a static size declared before any field
//!    whose offset it queries. Input fields depend on nothing.
//! 3. Passes run over the unresolved fields until all are resolved. A field is resolved as soon as
//!    its whole dependency set is, and counts as resolved for the rest of the same pass. A pass
//!    that resolves nothing means the remaining fields wait on each other, which is reported with
//!    every stuck field named.
//!
//! A setter only sees what it declared (see [Scope]), so the tree produced never depends on the
//! order fields happen to be visited in ([crate::Scan]).

use crate::{
    config::{Config, Scan},
    error::{Error, ErrorKind, Result},
    kind::Kind,
    schema::{Field, Init, Schema, Setter, RESERVED_NAMES},
    tree::{Data, Node, NodeId, Position, Tree},
    value::Value,
    wrap,
};
use std::{collections::HashSet, path::Path, sync::Arc};
use tracing::{debug, trace};

/// What a [Setter] can see while its field is being computed.
///
/// Sibling values and offsets are only available if the setter declared them with
/// [Setter::reads] and [Setter::offsets].
pub struct Scope<'a> {
    tree: &'a Tree,
    block: NodeId,
    schema: &'a Schema,
    index: usize,
    input: &'a Value,
    setter: &'a Setter,
}

impl<'a> Scope<'a> {
    /// Returns the name of the field being computed.
    pub fn name(&self) -> &'a str {
        self.schema.fields()[self.index].name()
    }

    /// Returns the input the block is being built from.
    pub fn input(&self) -> &'a Value {
        self.input
    }

    /// Looks up `key` in the block's input.
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.input.get(key)
    }

    /// Returns the built sibling `name`, which must be listed in [Setter::reads].
    pub fn field(&self, name: &str) -> Result<Node<'a>> {
        if name == self.name() {
            return Err(self_access(self.schema, self.name()));
        }
        if !self.setter.read_names().iter().any(|n| n == name) {
            return Err(Error::build(format!(
                "setter for '{}' in {} reads '{name}' without declaring it",
                self.name(),
                self.schema.name()
            )));
        }
        self.this().field(name)
    }

    /// Returns the offset of `name` within the block, which must be listed in [Setter::offsets].
    ///
    /// A setter may query the offset of its own field.
    pub fn offset(&self, name: &str) -> Result<usize> {
        if !self.setter.offset_names().iter().any(|n| n == name) {
            return Err(Error::build(format!(
                "setter for '{}' in {} queries the offset of '{name}' without declaring it",
                self.name(),
                self.schema.name()
            )));
        }
        self.this().offset_of(name)
    }

    /// Returns the partially built block.
    ///
    /// Queries made through this handle are not checked against the setter's declarations.
    pub fn this(&self) -> Node<'a> {
        self.tree.node(self.block)
    }

    /// Returns the directory relative `File` paths are resolved against.
    pub fn root_path(&self) -> Option<&'a Path> {
        self.tree.root_path()
    }
}

fn self_access(schema: &Schema, field: &str) -> Error {
    ErrorKind::SelfAccess {
        schema: schema.name().to_string(),
        field: field.to_string(),
    }
    .into()
}

fn index_of(schema: &Schema, name: &str) -> Result<usize> {
    schema.position(name).ok_or_else(|| {
        Error::build(format!(
            "field '{name}' does not exist in {}",
            schema.name()
        ))
    })
}

/// Rejects declarations that can never build, before any field is touched.
fn check(schema: &Schema) -> Result<()> {
    let mut seen = HashSet::new();
    for field in schema.fields() {
        let name = field.name();
        if RESERVED_NAMES.contains(&name) {
            return Err(ErrorKind::Reserved(name.to_string()).into());
        }
        if !seen.insert(name) {
            return Err(Error::build(format!(
                "field '{name}' is declared more than once in {}",
                schema.name()
            )));
        }
        if let Kind::Align(target) = field.kind() {
            if !matches!(field.init(), Init::Input) {
                return Err(Error::build(format!(
                    "'{name}: {}' in {} is computed from its offset and cannot have a setter or default",
                    field.kind(),
                    schema.name()
                )));
            }
            if !matches!(target.fixed_size(), Some(size) if size > 0) {
                return Err(Error::build(format!(
                    "Align target of '{name}' in {} must have a non-zero static size, found {target}",
                    schema.name()
                )));
            }
        }
    }
    Ok(())
}

/// Indices of the fields before `end` whose size is only known once built.
fn unsized_before(fields: &[Field], end: usize) -> impl Iterator<Item = usize> + '_ {
    (0..end).filter(move |&j| fields[j].kind().fixed_size().is_none())
}

/// Computes the dependency set of every field.
fn dependencies(schema: &Schema) -> Result<Vec<Vec<usize>>> {
    let fields = schema.fields();
    fields
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let mut deps = Vec::new();
            match (field.kind(), field.init()) {
                (Kind::Align(_), _) => deps.extend(unsized_before(fields, i)),
                (_, Init::Setter(setter)) => {
                    for name in setter.offset_names() {
                        deps.extend(unsized_before(fields, index_of(schema, name)?));
                    }
                    for name in setter.read_names() {
                        let target = index_of(schema, name)?;
                        if target == i {
                            return Err(self_access(schema, field.name()));
                        }
                        deps.push(target);
                    }
                }
                _ => {}
            }
            deps.sort_unstable();
            deps.dedup();

            // Only reachable through the offset of a later field.
            if deps.contains(&i) {
                return Err(self_access(schema, field.name()));
            }
            Ok(deps)
        })
        .collect()
}

/// Checks the declaration and computes the dependency set of every field.
///
/// Runs once per schema, when it is declared.
pub(crate) fn plan(schema: &Schema) -> Result<Vec<Vec<usize>>> {
    check(schema)?;
    dependencies(schema)
}

/// Builds a block of `schema` from `input` and returns its id.
pub(crate) fn build(
    tree: &mut Tree,
    schema: &Arc<Schema>,
    parent: Option<NodeId>,
    position: Position,
    input: &Value,
    cfg: &Config,
    depth: usize,
) -> Result<NodeId> {
    if depth > cfg.max_depth {
        return Err(Error::build(format!(
            "{} exceeds the maximum nesting depth of {}",
            schema.name(),
            cfg.max_depth
        )));
    }
    if !matches!(input, Value::Map(_) | Value::Null) {
        return Err(Error::invalid(format!(
            "Expected map type, received {}",
            input.type_name()
        ))
        .note(schema.name()));
    }
    debug!(schema = schema.name(), depth, "building block");

    let id = tree.alloc(
        parent,
        position,
        Data::Block {
            schema: schema.clone(),
            fields: vec![None; schema.fields().len()],
        },
    );
    let mut current = None;
    resolve(tree, schema, id, input, cfg, depth, &mut current).map_err(|e| match current {
        Some(index) => {
            let field = &schema.fields()[index];
            e.note(format!(
                "{} -> {}: {}",
                schema.name(),
                field.name(),
                field.kind()
            ))
        }
        None => e.note(schema.name()),
    })?;

    debug!(schema = schema.name(), depth, "built block");
    Ok(id)
}

fn resolve(
    tree: &mut Tree,
    schema: &Arc<Schema>,
    block: NodeId,
    input: &Value,
    cfg: &Config,
    depth: usize,
    current: &mut Option<usize>,
) -> Result<()> {
    let deps = schema.dependencies()?;
    let fields = schema.fields();
    let mut done = vec![false; fields.len()];

    for (index, field) in fields.iter().enumerate() {
        if let Init::Default(output) = field.init() {
            *current = Some(index);
            let child = wrap::output(
                tree,
                field.kind(),
                output.clone(),
                block,
                Position::Field(index),
                cfg,
                depth,
            )?;
            tree.set_field(block, index, child);
            done[index] = true;
            trace!(schema = schema.name(), field = field.name(), "resolved default");
        }
    }
    *current = None;

    let order: Vec<usize> = match cfg.scan {
        Scan::Forward => (0..fields.len()).collect(),
        Scan::Reverse => (0..fields.len()).rev().collect(),
    };
    while done.iter().any(|d| !d) {
        let mut progress = false;
        for &index in &order {
            if done[index] || deps[index].iter().any(|&d| !done[d]) {
                continue;
            }
            *current = Some(index);
            let child = compute(tree, schema, block, index, input, cfg, depth)?;
            tree.set_field(block, index, child);
            done[index] = true;
            progress = true;
            trace!(
                schema = schema.name(),
                field = fields[index].name(),
                "resolved field"
            );
        }
        *current = None;

        if !progress {
            let stuck: Vec<String> = fields
                .iter()
                .zip(&done)
                .filter(|(_, done)| !**done)
                .map(|(field, _)| field.name().to_string())
                .collect();
            debug!(schema = schema.name(), fields = ?stuck, "circular dependency");
            return Err(ErrorKind::CircularDependency {
                schema: schema.name().to_string(),
                fields: stuck,
            }
            .into());
        }
    }
    Ok(())
}

/// Produces the node for one field whose dependencies are resolved.
fn compute(
    tree: &mut Tree,
    schema: &Arc<Schema>,
    block: NodeId,
    index: usize,
    input: &Value,
    cfg: &Config,
    depth: usize,
) -> Result<NodeId> {
    let field = &schema.fields()[index];
    let position = Position::Field(index);
    match (field.kind(), field.init()) {
        (Kind::Align(target), _) => {
            let align = target.fixed_size().unwrap_or(0);
            Ok(tree.alloc(
                Some(block),
                position,
                Data::Padding {
                    target: (**target).clone(),
                    align,
                },
            ))
        }
        (kind, Init::Setter(setter)) => {
            let output = {
                let scope = Scope {
                    tree: &*tree,
                    block,
                    schema,
                    index,
                    input,
                    setter,
                };
                setter.call(&scope)?
            };
            wrap::output(tree, kind, output, block, position, cfg, depth)
        }
        (kind, Init::Default(output)) => {
            wrap::output(tree, kind, output.clone(), block, position, cfg, depth)
        }
        (kind, Init::Input) => match input.get(field.name()) {
            Some(value) => wrap::value(tree, kind, value, block, position, cfg, depth),
            None if *kind == Kind::Empty => {
                wrap::value(tree, kind, &Value::Null, block, position, cfg, depth)
            }
            None => Err(Error::missing(format!(
                "No setter or input value found for '{}'",
                field.name()
            ))),
        },
    }
}
