//! Generic content extraction, used when no block schemas are involved.
//!
//! Every element maps to a small tagged JSON object (`{"type": "heading",
//! ...}`), blocks keep their name and options, and unknown elements
//! degrade to `{"tag": ...}`.

use serde_json::{Map, Value, json};

use super::section::is_section_metadata;
use crate::dom::{BlockInfo, Document, NodeId};

/// True for text nodes holding only whitespace.
fn is_blank_text(doc: &Document, node: NodeId) -> bool {
    doc.text(node).is_some_and(|t| t.trim().is_empty())
}

/// Children that carry content: elements and non-blank text.
fn content_children(doc: &Document, node: NodeId) -> Vec<NodeId> {
    doc.children(node)
        .filter(|&c| doc.is_element(c) || (doc.is_text(c) && !is_blank_text(doc, c)))
        .collect()
}

/// Extract a node and flatten array results into `out`.
fn push_flattened(doc: &Document, node: NodeId, out: &mut Vec<Value>) {
    match extract_content_element(doc, node) {
        Some(Value::Array(items)) => out.extend(items),
        Some(value) => out.push(value),
        None => {}
    }
}

/// Convert one node to its content JSON.
///
/// Returns an array for plain `div`s (their children, flattened by the
/// caller) and `None` for blank text, comments and doctypes.
pub fn extract_content_element(doc: &Document, node: NodeId) -> Option<Value> {
    if let Some(text) = doc.text(node) {
        if text.trim().is_empty() {
            return None;
        }
        return Some(json!({ "type": "text", "text": text }));
    }

    let tag = doc.tag_name(node)?;
    match tag {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = tag[1..].parse::<u8>().unwrap_or(1);
            return Some(json!({
                "type": "heading",
                "level": level,
                "text": doc.text_content(node).trim(),
            }));
        }
        "p" | "strong" | "em" => return Some(extract_inline_container(doc, node, tag)),
        "picture" => {
            if let Some(img) = doc.element_children(node).find(|&c| doc.is_tag(c, "img")) {
                return Some(image(doc, img));
            }
        }
        "img" => return Some(image(doc, node)),
        "ul" | "ol" => {
            return Some(json!({
                "type": "list",
                "ordered": tag == "ol",
                "items": extract_list_items(doc, node),
            }));
        }
        "a" => {
            return Some(json!({
                "type": "link",
                "href": doc.attr(node, "href").unwrap_or_default(),
                "text": doc.text_content(node).trim(),
            }));
        }
        "table" => {
            if let Some(block) = extract_table_block(doc, node) {
                return Some(block);
            }
        }
        _ => {}
    }

    if tag == "div" {
        if !doc.classes(node).is_empty() && !is_section_metadata(doc, node) {
            return Some(extract_block_div(doc, node));
        }
        let mut items = Vec::new();
        for child in content_children(doc, node) {
            if let Some(value) = extract_content_element(doc, child) {
                items.push(value);
            }
        }
        return Some(Value::Array(items));
    }

    Some(json!({ "tag": tag }))
}

fn image(doc: &Document, img: NodeId) -> Value {
    json!({
        "type": "image",
        "src": doc.attr(img, "src").unwrap_or_default(),
        "alt": doc.attr(img, "alt").unwrap_or_default(),
    })
}

/// `p`, `strong` and `em`: plain text when that is all they hold, else a
/// flattened list of text runs and nested elements.
fn extract_inline_container(doc: &Document, node: NodeId, tag: &str) -> Value {
    let kind = if tag == "p" { "paragraph" } else { tag };
    let children = content_children(doc, node);

    if let [only] = children.as_slice()
        && doc.is_text(*only)
    {
        return json!({ "type": kind, "text": doc.text_content(node).trim() });
    }

    let mut content = Vec::new();
    for child in children {
        match doc.text(child) {
            Some(text) => content.push(Value::String(text.to_string())),
            None => push_flattened(doc, child, &mut content),
        }
    }
    json!({ "type": kind, "content": content })
}

/// Items of a `ul`/`ol`, one per `li`.
///
/// A `li` with one content node becomes that node, several become an
/// array, and an empty one becomes its trimmed text.
pub fn extract_list_items(doc: &Document, list: NodeId) -> Vec<Value> {
    doc.element_children(list)
        .filter(|&c| doc.is_tag(c, "li"))
        .map(|li| {
            let mut items = Vec::new();
            for child in content_children(doc, li) {
                push_flattened(doc, child, &mut items);
            }
            match items.len() {
                0 => Value::String(doc.text_content(li).trim().to_string()),
                1 => items.remove(0),
                _ => Value::Array(items),
            }
        })
        .collect()
}

/// A table whose first body row holds `th` cells is a block in table form:
/// the header names the block, the remaining rows are its cells.
fn extract_table_block(doc: &Document, table: NodeId) -> Option<Value> {
    let tbody = doc.element_children(table).find(|&c| doc.is_tag(c, "tbody"))?;
    let rows: Vec<_> = doc.element_children(tbody).collect();
    let first = *rows.first()?;
    if !doc.is_tag(first, "tr") {
        return None;
    }

    let header = doc.element_children(first).find(|&c| doc.is_tag(c, "th"))?;
    let name = doc.text_content(header).trim().to_lowercase();
    let block_rows: Vec<Value> = rows[1..]
        .iter()
        .map(|&tr| {
            doc.element_children(tr)
                .map(|cell| Value::String(doc.text_content(cell)))
                .collect()
        })
        .collect();

    Some(json!({ "type": "block", "name": name, "rows": block_rows }))
}

fn extract_block_div(doc: &Document, node: NodeId) -> Value {
    let info = BlockInfo::from_classes(doc.classes(node));
    let content: Vec<Value> = content_children(doc, node)
        .into_iter()
        .filter_map(|child| extract_content_element(doc, child))
        .collect();

    let mut block = Map::new();
    block.insert("type".to_string(), json!("block"));
    block.insert("name".to_string(), json!(info.name.unwrap_or_default()));
    block.insert("content".to_string(), Value::Array(content));
    if !info.options.is_empty() {
        block.insert("options".to_string(), json!(info.options));
    }
    Value::Object(block)
}

/// Key/value pairs of the first `div.section-metadata` below `section`.
///
/// Each two-cell row contributes a lowercased key and its value.
pub fn extract_section_metadata(doc: &Document, section: NodeId) -> Option<Map<String, Value>> {
    let meta = doc
        .descendants(section)
        .find(|&id| is_section_metadata(doc, id))?;

    let mut fields = Map::new();
    for row in doc.element_children(meta).filter(|&r| doc.is_tag(r, "div")) {
        let cells: Vec<_> = doc.element_children(row).collect();
        let [key, value] = cells.as_slice() else {
            continue;
        };
        let key = doc.text_content(*key).trim().to_lowercase();
        if !key.is_empty() {
            let value = doc.text_content(*value).trim().to_string();
            fields.insert(key, Value::String(value));
        }
    }
    (!fields.is_empty()).then_some(fields)
}

/// Every section of `main` as `{"metadata"?: {...}, "section": [...]}`.
pub fn extract_main(doc: &Document, main: NodeId) -> Vec<Value> {
    doc.element_children(main)
        .filter(|&c| doc.is_tag(c, "div"))
        .map(|section| {
            let mut content = Vec::new();
            for child in content_children(doc, section) {
                if is_section_metadata(doc, child) {
                    continue;
                }
                push_flattened(doc, child, &mut content);
            }

            let mut entry = Map::new();
            if let Some(metadata) = extract_section_metadata(doc, section) {
                entry.insert("metadata".to_string(), Value::Object(metadata));
            }
            entry.insert("section".to_string(), Value::Array(content));
            Value::Object(entry)
        })
        .collect()
}
