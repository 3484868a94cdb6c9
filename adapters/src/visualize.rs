use bincraft_layout::{Node, Result};

/// Renders the fields of `root` as an indented listing.
///
/// Each line reads `{global offset} ({local offset}) {name}: {type}`, with the element count
/// appended for sequences. Children are indented four spaces per level. A sequence of integers
/// is collapsed to its first offset followed by `...`, and `Empty` fields are skipped.
pub fn visualize(root: Node<'_>) -> Result<String> {
    let mut out = String::new();
    render(root, 0, 0, &mut out)?;
    Ok(out)
}

fn render(node: Node<'_>, indent: usize, base: usize, out: &mut String) -> Result<()> {
    let children: Vec<(&str, Node<'_>)> = if node.is_array() {
        node.elements().map(|e| ("", e)).collect()
    } else {
        node.fields().collect()
    };
    let pad = " ".repeat(indent * 4);

    // Children are contiguous, so offsets are a running sum of sizes.
    let mut next = 0;
    for (index, (name, child)) in children.into_iter().enumerate() {
        let local = next;
        next += child.size()?;
        if !child.is_present() {
            continue;
        }
        let global = base + local;
        if node.is_array() && child.is_primitive() {
            if index == 0 {
                out.push_str(&format!("{pad}{global:#x} ...\n"));
            }
        } else {
            let mut type_name = child.type_name();
            if child.is_array() {
                type_name = format!("{type_name} ({})", child.len());
            }
            if !name.is_empty() {
                type_name = format!("{name}: {type_name}");
            }
            out.push_str(&format!("{pad}{global:#x} ({local:#x}) {type_name}\n"));
        }
        if child.is_array() || child.is_block() {
            render(child, indent + 1, global, out)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bincraft_layout::{build, Config, Kind, Schema, Value};

    #[test]
    fn test_visualize_nested() {
        let point = Schema::builder("Point")
            .field("x", Kind::U8)
            .field("y", Kind::U8)
            .build();
        let shape = Schema::builder("Shape")
            .field("id", Kind::U16)
            .field("hidden", Kind::Empty)
            .field("name", Kind::Bytes)
            .field("pad", Kind::align(Kind::U32))
            .field("points", Kind::array(Kind::block(&point)))
            .field("weights", Kind::array(Kind::U16))
            .build();
        let input = Value::map([
            ("id", Value::from(1)),
            ("name", Value::from("tri")),
            (
                "points",
                Value::list([
                    Value::map([("x", 0), ("y", 1)]),
                    Value::map([("x", 2), ("y", 3)]),
                ]),
            ),
            ("weights", Value::list([5, 6, 7])),
        ]);
        let tree = build(&shape, &input, &Config::default()).unwrap();
        let expected = "\
0x0 (0x0) id: U16
0x2 (0x2) name: Bytes
0x5 (0x5) pad: Align[U32]
0x8 (0x8) points: Array[Point] (2)
    0x8 (0x0) Point
        0x8 (0x0) x: U8
        0x9 (0x1) y: U8
    0xa (0x2) Point
        0xa (0x0) x: U8
        0xb (0x1) y: U8
0xc (0xc) weights: Array[U16] (3)
    0xc ...
";
        assert_eq!(visualize(tree.root()).unwrap(), expected);
    }

    #[test]
    fn test_visualize_long_byte_array() {
        let schema = Schema::builder("Blob")
            .field("len", Kind::U32)
            .field("data", Kind::array(Kind::U8))
            .field("tail", Kind::U8)
            .build();
        let input = Value::map([
            ("len", Value::from(0)),
            ("data", Value::Bytes(vec![0xff; 200_000])),
            ("tail", Value::from(1)),
        ]);
        let tree = build(&schema, &input, &Config::default()).unwrap();
        assert_eq!(
            visualize(tree.root()).unwrap(),
            "0x0 (0x0) len: U32\n\
             0x4 (0x4) data: Array[U8] (200000)\n    \
             0x4 ...\n\
             0x30d44 (0x30d44) tail: U8\n"
        );
    }

    #[test]
    fn test_visualize_empty_array() {
        let schema = Schema::builder("Bare")
            .field("items", Kind::array(Kind::U8))
            .build();
        let tree = build(
            &schema,
            &Value::map([("items", Value::List(Vec::new()))]),
            &Config::default(),
        )
        .unwrap();
        assert_eq!(
            visualize(tree.root()).unwrap(),
            "0x0 (0x0) items: Array[U8] (0)\n"
        );
    }
}
