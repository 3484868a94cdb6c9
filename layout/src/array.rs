//! Sequences of one element kind.
//!
//! Sequences are built eagerly: every element is wrapped as soon as the sequence is, in index
//! order. There is no dependency resolution between elements.

use crate::{
    config::Config,
    error::{Error, Result},
    kind::Kind,
    raw,
    tree::{Data, NodeId, Position, Tree},
    value::Value,
    wrap,
};
use tracing::trace;

/// Builds a sequence of `element` from a list value (or a byte string, one element per byte).
pub(crate) fn build(
    tree: &mut Tree,
    element: &Kind,
    parent: Option<NodeId>,
    position: Position,
    input: &Value,
    cfg: &Config,
    depth: usize,
) -> Result<NodeId> {
    if depth > cfg.max_depth {
        return Err(Error::build(format!(
            "Array[{element}] exceeds the maximum nesting depth of {}",
            cfg.max_depth
        )));
    }
    let items: Vec<Value> = match input {
        Value::List(items) => items.clone(),
        Value::Bytes(bytes) => bytes.iter().map(|&b| Value::from(b)).collect(),
        other => {
            return Err(Error::invalid(format!(
                "Expected iterable type, received {}",
                other.type_name()
            )))
        }
    };
    raw::check_len(items.len(), &cfg.max_len)?;

    let id = tree.alloc(
        parent,
        position,
        Data::Array {
            element: element.clone(),
            items: Vec::with_capacity(items.len()),
        },
    );
    for (i, item) in items.iter().enumerate() {
        let child = wrap::value(tree, element, item, id, Position::Element(i), cfg, depth)
            .map_err(|e| e.note(format!("Array[{element}] -> (element {i})")))?;
        tree.push_item(id, child);
        trace!(element = %element, index = i, "built element");
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{encode::Encode, error::Category, schema::Schema};
    use bincraft_macros::test_traced;

    fn build_root(element: Kind, input: Value, cfg: &Config) -> Result<Tree> {
        let mut tree = Tree::new(None);
        build(&mut tree, &element, None, Position::Root, &input, cfg, 0)?;
        Ok(tree)
    }

    #[test_traced]
    fn test_u16_sequence() {
        let tree = build_root(
            Kind::U16,
            Value::list([1u32, 256, 65535]),
            &Config::default(),
        )
        .unwrap();
        let root = tree.root();
        assert_eq!(root.size().unwrap(), 6);
        assert_eq!(root.len(), 3);
        let offsets: Vec<_> = root.elements().map(|e| e.offset().unwrap()).collect();
        assert_eq!(offsets, vec![0, 2, 4]);
        assert_eq!(
            root.encode().unwrap().as_ref(),
            &[0x00, 0x01, 0x01, 0x00, 0xff, 0xff]
        );
    }

    #[test]
    fn test_empty_sequence_is_present() {
        let tree = build_root(Kind::U8, Value::List(Vec::new()), &Config::default()).unwrap();
        let root = tree.root();
        assert!(root.is_present());
        assert!(root.is_empty());
        assert_eq!(root.size().unwrap(), 0);
    }

    #[test]
    fn test_from_bytes() {
        let tree = build_root(Kind::U8, Value::Bytes(vec![9, 8]), &Config::default()).unwrap();
        let values: Vec<_> = tree.root().elements().map(|e| e.as_int().unwrap()).collect();
        assert_eq!(values, vec![9, 8]);
    }

    #[test]
    fn test_not_iterable() {
        let err = build_root(Kind::U8, Value::Int(1), &Config::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "validation failed: Expected iterable type, received int"
        );
    }

    #[test]
    fn test_element_failure_is_noted() {
        let err = build_root(
            Kind::U8,
            Value::list([1, 2, 300]),
            &Config::default(),
        )
        .unwrap_err();
        assert_eq!(err.category(), Category::Validation);
        let trail: Vec<_> = err.trail().collect();
        assert_eq!(trail, vec!["Array[U8] -> (element 2)"]);
    }

    #[test]
    fn test_length_limit() {
        let cfg = Config::default().with_max_len(..=2);
        assert!(build_root(Kind::U8, Value::list([1, 2]), &cfg).is_ok());
        assert!(build_root(Kind::U8, Value::list([1, 2, 3]), &cfg).is_err());
    }

    #[test]
    fn test_nested_blocks() {
        let point = Schema::builder("Point")
            .field("x", Kind::U8)
            .field("y", Kind::U8)
            .build();
        let input = Value::list([
            Value::map([("x", 1), ("y", 2)]),
            Value::map([("x", 3), ("y", 4)]),
        ]);
        let tree = build_root(Kind::block(&point), input, &Config::default()).unwrap();
        let second = tree.root().element(1).unwrap();
        assert_eq!(second.offset().unwrap(), 2);
        assert_eq!(second.field("y").unwrap().global_offset().unwrap(), 3);
        assert_eq!(tree.root().to_bytes().unwrap(), vec![1, 2, 3, 4]);
    }
}
