//! Wrapping values into nodes of a declared kind.
//!
//! Every value that reaches a field (from input, a setter, or a default) passes through here. Each
//! kind applies its own acceptance check. Nothing is coerced across kinds except where the kind's
//! own parser allows it (see [crate::primitive::parse] and [crate::raw::parse]).

use crate::{
    array, block,
    config::Config,
    error::{Error, Result},
    file,
    kind::Kind,
    primitive, raw,
    schema::Output,
    tree::{Data, NodeId, Position, Tree},
    value::Value,
};

/// Wraps a setter or default output into a node of the declared kind.
pub(crate) fn output(
    tree: &mut Tree,
    declared: &Kind,
    output: Output,
    parent: NodeId,
    position: Position,
    cfg: &Config,
    depth: usize,
) -> Result<NodeId> {
    match output {
        Output::Raw(value) => self::value(tree, declared, &value, parent, position, cfg, depth),
        Output::Typed(kind, value) => {
            let target = match declared {
                Kind::OneOf(alternatives) => {
                    if !alternatives.contains(&kind) {
                        return Err(Error::build(format!(
                            "{kind} is not one of the alternatives of {declared}"
                        )));
                    }
                    &kind
                }
                _ if kind != *declared => {
                    return Err(Error::build(format!(
                        "{kind} cannot be wrapped into {declared}"
                    )));
                }
                _ => declared,
            };
            self::value(tree, target, &value, parent, position, cfg, depth)
        }
    }
}

/// Wraps a raw value into a node of `kind`.
pub(crate) fn value(
    tree: &mut Tree,
    kind: &Kind,
    value: &Value,
    parent: NodeId,
    position: Position,
    cfg: &Config,
    depth: usize,
) -> Result<NodeId> {
    let data = match kind {
        Kind::Primitive(width) => Data::Primitive {
            width: *width,
            value: primitive::parse(*width, value)?,
        },
        Kind::Bytes => Data::Bytes(raw::parse(value, &cfg.max_len)?),
        Kind::File => {
            let (path, contents) = file::load(value, tree.root_path(), &cfg.max_len)?;
            Data::File { path, contents }
        }
        Kind::Empty => match value {
            Value::Null => Data::Empty,
            other => {
                return Err(Error::invalid(format!(
                    "Expected null for Empty, received {}",
                    other.type_name()
                )))
            }
        },
        Kind::Align(_) => {
            return Err(Error::build(format!(
                "{kind} is computed from its offset and cannot be given a value"
            )))
        }
        Kind::OneOf(_) => {
            return Err(Error::build(format!(
                "can't implicitly wrap a value into {kind}, return Output::Typed instead"
            )))
        }
        Kind::Array(element) => {
            return array::build(tree, element, Some(parent), position, value, cfg, depth + 1)
        }
        Kind::Block(schema) => {
            return block::build(tree, schema, Some(parent), position, value, cfg, depth + 1)
        }
    };
    Ok(tree.alloc(Some(parent), position, data))
}
