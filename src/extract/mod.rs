//! HTML to JSON extraction.
//!
//! Two modes share the parsed [`Document`]:
//!
//! - **schema mode** ([`extract_schema_document`]): blocks and primitives
//!   are read through their JSON schemas, one object per section
//! - **legacy mode** ([`extract_legacy_document`]): every element maps to a
//!   generic tagged object and `<head>` is summarized alongside

mod content;
mod element;
mod head;
mod section;
mod value;

use serde_json::{Map, Value, json};

pub use content::{extract_content_element, extract_list_items, extract_main, extract_section_metadata};
pub use element::{attribute_alias, find_element, value_from_element};
pub use head::extract_head;
pub use section::{
    SECTION_METADATA_CLASS, extract_schema_document, extract_section, extract_sections,
    is_section_metadata,
};
pub use value::{extract_block, extract_value};

use crate::dom::Document;

/// Extract a page without schemas: `{"head": {...}, "content": [...]}`.
///
/// Missing `<head>` or `<main>` yield an empty object or array.
pub fn extract_legacy_document(doc: &Document) -> Value {
    let head = doc
        .find_by_tag("head")
        .map(|head| extract_head(doc, head))
        .unwrap_or_else(Map::new);
    let content = doc
        .find_by_tag("main")
        .map(|main| extract_main(doc, main))
        .unwrap_or_default();
    json!({ "head": head, "content": content })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_document_without_main() {
        let doc = Document::parse("<html><head><title>T</title></head><body><p>x</p></body></html>");
        assert_eq!(
            extract_legacy_document(&doc),
            json!({ "head": { "title": { "text": "T" } }, "content": [] })
        );
    }
}
