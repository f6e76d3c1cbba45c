//! Nested-object conversion.
//!
//! The document becomes `{ "<root tag>": <node> }`. A node with neither
//! attributes nor children is just its text (`null` when empty). Any other
//! node is an object of `"#name"` attribute entries, then one entry per child
//! tag in first-seen order (an array when the tag repeats), then `"@text"`.

use markedit_parser::{collapse_whitespace, ChainedMap, Node, NodeId, Tree};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use tracing::instrument;

use crate::FormatError;

/// Render `tree` as JSON text: pretty with `indent` spaces, compact when
/// `indent` is negative. Comments are dropped from element text.
#[instrument(level = "debug", skip(tree), fields(nodes = tree.size()))]
pub fn to_object(tree: &Tree, indent: i32) -> Result<String, FormatError> {
    let value = to_value(tree, indent < 0);

    let Ok(width) = usize::try_from(indent) else {
        return Ok(serde_json::to_string(&value)?);
    };

    let spaces = " ".repeat(width);
    let mut buf = Vec::new();
    let mut ser =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(spaces.as_bytes()));
    value.serialize(&mut ser)?;
    // serde_json only ever writes UTF-8.
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Build the object value bottom-up: reversed pre-order visits every child
/// before its parent, so each node's children are ready when it is reached.
pub fn to_value(tree: &Tree, compact: bool) -> Value {
    let Some(root) = tree.root() else {
        return Value::Object(Map::new());
    };

    let mut built: Vec<Option<Value>> = vec![None; tree.size()];
    for id in tree.descendants().into_iter().rev() {
        let value = node_value(tree, id, &mut built, compact);
        built[id.index()] = Some(value);
    }

    let mut doc = Map::new();
    doc.insert(
        tree[root].tag.clone(),
        built[root.index()].take().unwrap_or(Value::Null),
    );
    Value::Object(doc)
}

fn node_value(tree: &Tree, id: NodeId, built: &mut [Option<Value>], compact: bool) -> Value {
    let node = &tree[id];
    let text = element_text(node, compact);

    if node.attributes.is_empty() && node.is_leaf() {
        return if text.is_empty() {
            Value::Null
        } else {
            Value::String(text)
        };
    }

    let mut object = Map::new();
    for (name, value) in node.attributes.iter() {
        object.insert(format!("#{name}"), Value::String(value.clone()));
    }

    let mut slots: ChainedMap<&str, usize> = ChainedMap::new();
    let mut groups: Vec<(&str, Vec<Value>)> = Vec::new();
    for &child in node.children() {
        let tag = tree[child].tag.as_str();
        let value = built[child.index()].take().unwrap_or(Value::Null);
        match slots.get(tag) {
            Some(&slot) => groups[slot].1.push(value),
            None => {
                slots.insert(tag, groups.len());
                groups.push((tag, vec![value]));
            }
        }
    }

    for (tag, mut values) in groups {
        let value = if values.len() == 1 {
            values.pop().unwrap_or(Value::Null)
        } else {
            Value::Array(values)
        };
        object.insert(tag.to_string(), value);
    }

    if !text.is_empty() {
        object.insert("@text".to_string(), Value::String(text));
    }
    Value::Object(object)
}

fn element_text(node: &Node, compact: bool) -> String {
    let text = strip_comments(node.text());
    if compact {
        collapse_whitespace(&text)
    } else {
        text.trim().to_string()
    }
}

/// Remove every `<!-- ... -->` span. An unclosed comment runs to the end.
fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("<!--") {
        out.push_str(&rest[..start]);
        rest = match rest[start..].find("-->") {
            Some(end) => &rest[start + end + 3..],
            None => "",
        };
    }
    out.push_str(rest);
    out
}
