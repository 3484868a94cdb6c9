//! The node arena and the [Node] query protocol.
//!
//! A build produces a [Tree]: an arena that owns every node. Nodes refer to their parent by
//! [NodeId], which is only used for offset and ancestry queries. Ownership flows strictly from
//! the arena, so dropping the tree drops everything.
//!
//! Queries may be issued at any point, including from setters while a block is still being
//! built. Sizes and offsets use built nodes where they exist and fall back to the static size of
//! a declared kind where they do not. When neither is available the query fails with
//! [crate::Category::DataMissing] rather than guessing.

use crate::{
    encode::{Encode, Write},
    error::{Error, Result},
    kind::{Kind, Width},
    padding, primitive,
    schema::Schema,
};
use bytes::{BufMut, Bytes};
use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

/// Identifies a node within its [Tree].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Where a node sits in its parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Position {
    Root,
    Field(usize),
    Element(usize),
}

pub(crate) enum Data {
    Primitive { width: Width, value: i128 },
    Bytes(Bytes),
    File { path: PathBuf, contents: Bytes },
    Padding { target: Kind, align: usize },
    Empty,
    Array { element: Kind, items: Vec<NodeId> },
    Block {
        schema: Arc<Schema>,
        fields: Vec<Option<NodeId>>,
    },
}

struct Entry {
    parent: Option<NodeId>,
    position: Position,
    data: Data,
}

/// An arena holding one built layout.
pub struct Tree {
    entries: Vec<Entry>,
    root_path: Option<PathBuf>,
}

impl Tree {
    pub(crate) fn new(root_path: Option<PathBuf>) -> Self {
        Self {
            entries: Vec::new(),
            root_path,
        }
    }

    /// Returns the root node.
    ///
    /// # Panics
    ///
    /// Panics if the tree is empty, which [crate::build] never returns.
    pub fn root(&self) -> Node<'_> {
        assert!(!self.entries.is_empty(), "tree has no root");
        self.node(NodeId(0))
    }

    /// Returns a handle to the node `id`.
    pub fn node(&self, id: NodeId) -> Node<'_> {
        Node { tree: self, id }
    }

    /// Returns the directory relative `File` paths were resolved against.
    pub fn root_path(&self) -> Option<&Path> {
        self.root_path.as_deref()
    }

    /// Returns the number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the tree holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn alloc(&mut self, parent: Option<NodeId>, position: Position, data: Data) -> NodeId {
        let id = NodeId(self.entries.len());
        self.entries.push(Entry {
            parent,
            position,
            data,
        });
        id
    }

    pub(crate) fn set_field(&mut self, block: NodeId, index: usize, child: NodeId) {
        if let Data::Block { fields, .. } = &mut self.entries[block.0].data {
            fields[index] = Some(child);
        }
    }

    pub(crate) fn push_item(&mut self, array: NodeId, child: NodeId) {
        if let Data::Array { items, .. } = &mut self.entries[array.0].data {
            items.push(child);
        }
    }

    fn entry(&self, id: NodeId) -> &Entry {
        &self.entries[id.0]
    }
}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("nodes", &self.entries.len())
            .field("root_path", &self.root_path)
            .finish()
    }
}

/// A borrowed handle to one node of a [Tree].
#[derive(Clone, Copy)]
pub struct Node<'a> {
    tree: &'a Tree,
    id: NodeId,
}

impl<'a> Node<'a> {
    /// Returns this node's id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    fn data(&self) -> &'a Data {
        &self.tree.entry(self.id).data
    }

    /// Returns the parent node, or `None` for the root.
    pub fn parent(&self) -> Option<Node<'a>> {
        self.tree
            .entry(self.id)
            .parent
            .map(|id| self.tree.node(id))
    }

    /// Returns the number of ancestors (0 for the root).
    pub fn depth(&self) -> usize {
        self.parent().map_or(0, |p| p.depth() + 1)
    }

    /// Returns the concrete kind of this node.
    pub fn kind(&self) -> Kind {
        match self.data() {
            Data::Primitive { width, .. } => Kind::Primitive(*width),
            Data::Bytes(_) => Kind::Bytes,
            Data::File { .. } => Kind::File,
            Data::Padding { target, .. } => Kind::align(target.clone()),
            Data::Empty => Kind::Empty,
            Data::Array { element, .. } => Kind::array(element.clone()),
            Data::Block { schema, .. } => Kind::Block(schema.clone()),
        }
    }

    /// Returns the display name of this node's kind, e.g. `U16` or `Array[Header]`.
    pub fn type_name(&self) -> String {
        self.kind().type_name()
    }

    /// Returns the name this node has in its parent: the field name, `Element {i}` for
    /// sequence elements, or an empty string for the root.
    pub fn prop_name(&self) -> String {
        match self.tree.entry(self.id).position {
            Position::Root => String::new(),
            Position::Element(i) => format!("Element {i}"),
            Position::Field(i) => match self.parent().map(|p| p.data()) {
                Some(Data::Block { schema, .. }) => schema.fields()[i].name().to_string(),
                _ => String::new(),
            },
        }
    }

    /// Returns false only for [Kind::Empty] nodes. Empty sequences are present.
    pub fn is_present(&self) -> bool {
        !matches!(self.data(), Data::Empty)
    }

    /// Returns true if this node is a sequence.
    pub fn is_array(&self) -> bool {
        matches!(self.data(), Data::Array { .. })
    }

    /// Returns true if this node is a composite.
    pub fn is_block(&self) -> bool {
        matches!(self.data(), Data::Block { .. })
    }

    /// Returns true if this node is a primitive integer.
    pub fn is_primitive(&self) -> bool {
        matches!(self.data(), Data::Primitive { .. })
    }

    /// Returns the integer held by a primitive node.
    pub fn as_int(&self) -> Option<i128> {
        match self.data() {
            Data::Primitive { value, .. } => Some(*value),
            _ => None,
        }
    }

    /// Returns the buffer held by a bytes or file node.
    pub fn as_bytes(&self) -> Option<&'a [u8]> {
        match self.data() {
            Data::Bytes(bytes) | Data::File { contents: bytes, .. } => Some(&bytes[..]),
            _ => None,
        }
    }

    /// Returns the path a file node was read from.
    pub fn file_path(&self) -> Option<&'a Path> {
        match self.data() {
            Data::File { path, .. } => Some(path.as_path()),
            _ => None,
        }
    }

    /// Returns the number of children: elements of a sequence or fields of a block.
    pub fn len(&self) -> usize {
        match self.data() {
            Data::Array { items, .. } => items.len(),
            Data::Block { fields, .. } => fields.len(),
            _ => 0,
        }
    }

    /// Returns true if this node has no children.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the `index`th element of a sequence.
    pub fn element(&self, index: usize) -> Option<Node<'a>> {
        match self.data() {
            Data::Array { items, .. } => items.get(index).map(|&id| self.tree.node(id)),
            _ => None,
        }
    }

    /// Iterates over the elements of a sequence (nothing for other nodes).
    pub fn elements(&self) -> impl Iterator<Item = Node<'a>> + 'a {
        let tree = self.tree;
        let items: &'a [NodeId] = match self.data() {
            Data::Array { items, .. } => items.as_slice(),
            _ => &[],
        };
        items.iter().map(move |&id| tree.node(id))
    }

    /// Iterates over the built fields of a block in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&'a str, Node<'a>)> + 'a {
        let tree = self.tree;
        let (names, slots): (&'a [crate::schema::Field], &'a [Option<NodeId>]) = match self.data()
        {
            Data::Block { schema, fields } => (schema.fields(), fields.as_slice()),
            _ => (&[], &[]),
        };
        names
            .iter()
            .zip(slots)
            .filter_map(move |(field, slot)| slot.map(|id| (field.name(), tree.node(id))))
    }

    /// Returns the built field `name` of a block.
    ///
    /// Fails with a data-missing error if the field has not been built yet.
    pub fn field(&self, name: &str) -> Result<Node<'a>> {
        let (schema, fields) = self.block()?;
        let index = Self::index_of(schema, name)?;
        fields[index].map(|id| self.tree.node(id)).ok_or_else(|| {
            Error::missing(format!(
                "field '{name}' of {} has not been built",
                schema.name()
            ))
        })
    }

    /// Returns the offset of field `name` within this block.
    ///
    /// Every preceding field must be built or have a static size.
    pub fn offset_of(&self, name: &str) -> Result<usize> {
        let (schema, _) = self.block()?;
        let index = Self::index_of(schema, name)?;
        self.offset_of_index(index)
    }

    /// Returns the size of this node in bytes.
    pub fn size(&self) -> Result<usize> {
        match self.data() {
            Data::Primitive { width, .. } => Ok(width.bytes()),
            Data::Bytes(bytes) | Data::File { contents: bytes, .. } => Ok(bytes.len()),
            Data::Padding { align, .. } => Ok(padding::length(*align, self.offset()?)),
            Data::Empty => Ok(0),
            Data::Array { items, .. } => items
                .iter()
                .try_fold(0, |acc, &id| Ok(acc + self.tree.node(id).size()?)),
            Data::Block { fields, .. } => self.offset_of_index(fields.len()),
        }
    }

    /// Returns the offset of this node within its parent (0 for the root).
    pub fn offset(&self) -> Result<usize> {
        let Some(parent) = self.parent() else {
            return Ok(0);
        };
        match self.tree.entry(self.id).position {
            Position::Root => Ok(0),
            Position::Field(index) => parent.offset_of_index(index),
            Position::Element(index) => match parent.data() {
                Data::Array { items, .. } => items
                    .iter()
                    .take(index)
                    .try_fold(0, |acc, &id| Ok(acc + self.tree.node(id).size()?)),
                _ => Err(Error::missing("could not find node in its parent")),
            },
        }
    }

    /// Returns the offset of this node relative to its `level`th ancestor above the parent.
    ///
    /// `offset_at(0)` equals [Node::offset]. Higher levels add the offsets of the ancestors in
    /// between, which is only possible once those ancestors are built far enough to know their
    /// own position. Otherwise this fails with a data-missing error.
    pub fn offset_at(&self, level: usize) -> Result<usize> {
        let base = match (level, self.parent()) {
            (0, _) | (_, None) => 0,
            (_, Some(parent)) => parent.offset_at(level - 1)?,
        };
        Ok(base + self.offset()?)
    }

    /// Returns the absolute offset of this node from the root.
    pub fn global_offset(&self) -> Result<usize> {
        match self.parent() {
            Some(parent) => Ok(self.offset()? + parent.global_offset()?),
            None => Ok(0),
        }
    }

    /// Returns the serialized bytes of this node.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.encode()?.to_vec())
    }

    /// Checks that this subtree is fully built and every integer is in range.
    pub fn validate(&self) -> Result<()> {
        match self.data() {
            Data::Primitive { width, value } => primitive::check(*width, *value),
            Data::Array { .. } => self.elements().try_for_each(|e| e.validate()),
            Data::Block { schema, fields } => {
                for (field, slot) in schema.fields().iter().zip(fields) {
                    let id = slot.ok_or_else(|| {
                        Error::missing(format!(
                            "field '{}' of {} has not been built",
                            field.name(),
                            schema.name()
                        ))
                    })?;
                    self.tree.node(id).validate()?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn block(&self) -> Result<(&'a Schema, &'a [Option<NodeId>])> {
        match self.data() {
            Data::Block { schema, fields } => Ok((&**schema, fields.as_slice())),
            _ => Err(Error::build(format!("{} has no named fields", self.type_name()))),
        }
    }

    fn index_of(schema: &Schema, name: &str) -> Result<usize> {
        schema.position(name).ok_or_else(|| {
            Error::build(format!(
                "field '{name}' does not exist in {}",
                schema.name()
            ))
        })
    }

    /// Sums the sizes of the first `end` fields of this block.
    fn offset_of_index(&self, end: usize) -> Result<usize> {
        let (schema, fields) = self.block()?;
        schema.fields()[..end]
            .iter()
            .zip(fields)
            .try_fold(0, |acc, (field, slot)| {
                let size = match slot {
                    Some(id) => self.tree.node(*id).size()?,
                    None => field.kind().fixed_size().ok_or_else(|| {
                        Error::missing(format!(
                            "size of '{}: {}' in {} is not known before it is built",
                            field.name(),
                            field.kind(),
                            schema.name()
                        ))
                    })?,
                };
                Ok(acc + size)
            })
    }
}

impl Write for Node<'_> {
    fn write(&self, buf: &mut impl BufMut) -> Result<()> {
        match self.data() {
            Data::Primitive { width, value } => primitive::write(*width, *value, buf),
            Data::Bytes(bytes) | Data::File { contents: bytes, .. } => buf.put_slice(bytes),
            Data::Padding { .. } => buf.put_bytes(0, self.size()?),
            Data::Empty => {}
            Data::Array { .. } => {
                for element in self.elements() {
                    element.write(buf)?;
                }
            }
            Data::Block { schema, fields } => {
                for (field, slot) in schema.fields().iter().zip(fields) {
                    let id = slot.ok_or_else(|| {
                        Error::missing(format!(
                            "attempted to get bytes of unbuilt field '{}' in {}",
                            field.name(),
                            schema.name()
                        ))
                    })?;
                    self.tree.node(id).write(buf)?;
                }
            }
        }
        Ok(())
    }
}

impl Encode for Node<'_> {
    fn encode_size(&self) -> Result<usize> {
        self.size()
    }
}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hand-assembles `Root { a: U8 = 1, rest: Array[U16] = [2, 3] }`.
    fn sample() -> Tree {
        let schema = Schema::builder("Root")
            .field("a", Kind::U8)
            .field("rest", Kind::array(Kind::U16))
            .build();
        let mut tree = Tree::new(None);
        let root = tree.alloc(
            None,
            Position::Root,
            Data::Block {
                schema,
                fields: vec![None, None],
            },
        );
        let a = tree.alloc(
            Some(root),
            Position::Field(0),
            Data::Primitive {
                width: Width::W8,
                value: 1,
            },
        );
        tree.set_field(root, 0, a);
        let rest = tree.alloc(
            Some(root),
            Position::Field(1),
            Data::Array {
                element: Kind::U16,
                items: Vec::new(),
            },
        );
        for (i, value) in [2, 3].into_iter().enumerate() {
            let item = tree.alloc(
                Some(rest),
                Position::Element(i),
                Data::Primitive {
                    width: Width::W16,
                    value,
                },
            );
            tree.push_item(rest, item);
        }
        tree.set_field(root, 1, rest);
        tree
    }

    #[test]
    fn test_sizes_and_offsets() {
        let tree = sample();
        let root = tree.root();
        assert_eq!(root.size().unwrap(), 5);
        assert_eq!(root.offset().unwrap(), 0);
        assert_eq!(root.depth(), 0);

        let rest = root.field("rest").unwrap();
        assert_eq!(rest.offset().unwrap(), 1);
        assert_eq!(rest.depth(), 1);
        let second = rest.element(1).unwrap();
        assert_eq!(second.offset().unwrap(), 2);
        assert_eq!(second.offset_at(1).unwrap(), 3);
        assert_eq!(second.global_offset().unwrap(), 3);
        assert_eq!(second.depth(), 2);
    }

    #[test]
    fn test_names() {
        let tree = sample();
        let root = tree.root();
        let rest = root.field("rest").unwrap();
        assert_eq!(root.prop_name(), "");
        assert_eq!(rest.prop_name(), "rest");
        assert_eq!(rest.element(0).unwrap().prop_name(), "Element 0");
        assert_eq!(rest.type_name(), "Array[U16]");
        assert_eq!(root.type_name(), "Root");
        let names: Vec<_> = root.fields().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["a", "rest"]);
    }

    #[test]
    fn test_encode() {
        let tree = sample();
        assert_eq!(tree.root().to_bytes().unwrap(), vec![1, 0, 2, 0, 3]);
        assert!(tree.root().validate().is_ok());
    }

    #[test]
    fn test_unbuilt_field() {
        let schema = Schema::builder("Half")
            .field("a", Kind::U16)
            .field("b", Kind::Bytes)
            .field("c", Kind::U8)
            .build();
        let mut tree = Tree::new(None);
        tree.alloc(
            None,
            Position::Root,
            Data::Block {
                schema,
                fields: vec![None, None, None],
            },
        );
        let root = tree.root();
        assert_eq!(root.offset_of("b").unwrap(), 2);
        assert!(root.offset_of("c").is_err());
        assert!(root.size().is_err());
        assert!(root.field("a").is_err());
        assert!(root.to_bytes().is_err());
        assert!(root.validate().is_err());
        assert!(root.offset_of("missing").is_err());
    }
}
