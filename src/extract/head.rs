//! `<head>` extraction.

use serde_json::{Map, Value, json};

use crate::dom::{Document, NodeId};

/// Convert the element children of `<head>` to JSON.
///
/// - `<link rel=X href=Y>` becomes `X: {"href": Y}`
/// - `<meta name|property=X content=Y>` is appended to `meta` as
///   `{"tag": X, "text": Y}`
/// - anything else is keyed by tag name with its attributes, plus the text
///   of `title`, `script` and `style`
pub fn extract_head(doc: &Document, head: NodeId) -> Map<String, Value> {
    let mut result = Map::new();
    let mut meta = Vec::new();

    for child in doc.element_children(head) {
        let Some(tag) = doc.tag_name(child) else {
            continue;
        };

        match tag {
            "link" => {
                if let (Some(rel), Some(href)) = (doc.attr(child, "rel"), doc.attr(child, "href")) {
                    result.insert(rel.to_string(), json!({ "href": href }));
                    continue;
                }
            }
            "meta" => {
                let key = doc.attr(child, "name").or_else(|| doc.attr(child, "property"));
                if let (Some(key), Some(content)) = (key, doc.attr(child, "content")) {
                    meta.push(json!({ "tag": key, "text": content }));
                    continue;
                }
            }
            _ => {}
        }

        let mut entry = Map::new();
        let attrs = doc.attrs(child);
        if !attrs.is_empty() {
            let attrs: Map<String, Value> = attrs
                .iter()
                .map(|a| (a.name.local.to_string(), Value::String(a.value.clone())))
                .collect();
            entry.insert("attrs".to_string(), Value::Object(attrs));
        }
        if matches!(tag, "title" | "script" | "style") {
            entry.insert("text".to_string(), Value::String(doc.text_content(child)));
        }
        result.insert(tag.to_string(), Value::Object(entry));
    }

    if !meta.is_empty() {
        result.insert("meta".to_string(), Value::Array(meta));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_head() {
        let doc = Document::parse(
            r#"<html><head>
                <title>Photoshop</title>
                <link rel="canonical" href="https://example.com/ps">
                <meta name="description" content="Edit photos">
                <meta property="og:title" content="PS">
                <script src="/scripts/aem.js" type="module"></script>
            </head><body></body></html>"#,
        );
        let head = doc.find_by_tag("head").unwrap();

        assert_eq!(
            Value::Object(extract_head(&doc, head)),
            json!({
                "title": { "text": "Photoshop" },
                "canonical": { "href": "https://example.com/ps" },
                "script": { "attrs": { "src": "/scripts/aem.js", "type": "module" }, "text": "" },
                "meta": [
                    { "tag": "description", "text": "Edit photos" },
                    { "tag": "og:title", "text": "PS" }
                ]
            })
        );
    }

    #[test]
    fn test_incomplete_link_falls_back_to_tag() {
        let doc = Document::parse(r#"<html><head><link rel="icon"></head></html>"#);
        let head = doc.find_by_tag("head").unwrap();

        assert_eq!(
            Value::Object(extract_head(&doc, head)),
            json!({ "link": { "attrs": { "rel": "icon" } } })
        );
    }
}
