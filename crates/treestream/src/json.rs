//! JSON authoring and debug dumps for tree streams.
//!
//! Trees can be authored as JSON documents and compiled to the binary
//! stream form, and any built stream can be dumped back to the same JSON
//! shape for inspection. A node is an object with four optional keys:
//!
//! | Key        | Value                                      |
//! |------------|--------------------------------------------|
//! | `name`     | node name string                           |
//! | `type`     | type catalog index (0-254), default 0      |
//! | `body`     | node body bytes, base64                    |
//! | `children` | array of child nodes, in order             |
//!
//! # Example
//!
//! ```
//! use treestream::{TreeStream, from_json};
//!
//! let root = from_json(r#"{"name": "world", "children": [{"name": "sky"}]}"#).unwrap();
//! let stream: TreeStream = TreeStream::from_node(&root, None);
//! assert!(stream.find_tag(stream.root(), &["sky"]).is_some());
//! ```

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Map, Value as JsonValue};

use crate::error::{Error, Result};
use crate::node::SourceNode;
use crate::stream::{StreamObject, TreeStream};
use crate::tag::Tag;

/// Parse a JSON authoring document into a source tree.
///
/// # Errors
///
/// Returns `Error::JsonParse` on malformed JSON or mistyped keys,
/// `Error::InvalidBodyEncoding` on bad base64, `Error::TypeIndexRange` when
/// a type index is outside the 0-254 domain.
pub fn from_json(json: &str) -> Result<SourceNode> {
    let value: JsonValue = serde_json::from_str(json).map_err(|e| Error::JsonParse(e.to_string()))?;
    node_from_value(&value)
}

fn node_from_value(value: &JsonValue) -> Result<SourceNode> {
    let obj = value
        .as_object()
        .ok_or_else(|| Error::JsonParse("node must be a JSON object".to_string()))?;

    let mut node = match obj.get("name") {
        Some(v) => {
            let name = v
                .as_str()
                .ok_or_else(|| Error::JsonParse("\"name\" must be a string".to_string()))?;
            SourceNode::named(name)
        }
        None => SourceNode::unnamed(),
    };

    if let Some(v) = obj.get("type") {
        let index = v
            .as_u64()
            .ok_or_else(|| Error::JsonParse("\"type\" must be an unsigned integer".to_string()))?;
        // 0xFF is reserved, matching the builder's capacity limit.
        if index >= u8::MAX as u64 {
            return Err(Error::TypeIndexRange(index));
        }
        node = node.with_type(index as u8);
    }

    if let Some(v) = obj.get("body") {
        let encoded = v
            .as_str()
            .ok_or_else(|| Error::JsonParse("\"body\" must be a base64 string".to_string()))?;
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| Error::InvalidBodyEncoding(e.to_string()))?;
        node = node.with_body(bytes);
    }

    if let Some(v) = obj.get("children") {
        let children = v
            .as_array()
            .ok_or_else(|| Error::JsonParse("\"children\" must be an array".to_string()))?;
        for child in children {
            node.push_child(node_from_value(child)?);
        }
    }

    Ok(node)
}

/// Dump a built stream back to the JSON authoring shape.
///
/// Default-valued keys are omitted: unnamed nodes carry no `"name"`, type 0
/// no `"type"`, empty bodies no `"body"`, leaves no `"children"`.
///
/// # Errors
///
/// Returns `Error::JsonSerialize` if the value tree cannot be serialized.
pub fn to_json<O: StreamObject>(tree: &TreeStream<O>) -> Result<String> {
    let value = value_of(tree, tree.root());
    serde_json::to_string(&value).map_err(|e| Error::JsonSerialize(e.to_string()))
}

fn value_of<O: StreamObject>(tree: &TreeStream<O>, tag: Tag) -> JsonValue {
    let store = tree.store();
    let mut obj = Map::new();

    let name = tree.name_of(tag);
    if !name.is_empty() {
        obj.insert("name".to_string(), JsonValue::from(name));
    }

    let type_index = tag.type_index(store);
    if type_index != 0 {
        obj.insert("type".to_string(), JsonValue::from(type_index));
    }

    if tag.entry_size(store) > 0 {
        let body = &store.as_bytes()[tag.entry_position()..tag.first_child_position()];
        obj.insert("body".to_string(), JsonValue::from(STANDARD.encode(body)));
    }

    if !tag.is_leaf() {
        let children: Vec<JsonValue> =
            tree.children(tag).map(|child| value_of(tree, child)).collect();
        obj.insert("children".to_string(), JsonValue::Array(children));
    }

    JsonValue::Object(obj)
}
