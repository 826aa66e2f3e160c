//! Schema-mode page extraction, one JSON object per section.

use futures::future::join_all;
use serde_json::{Map, Value, json};
use tracing::{debug, trace, warn};

use super::value::{extract_block, extract_value};
use crate::dom::{Document, NodeId};
use crate::error::{Error, Result};
use crate::schema::{SchemaKind, SchemaResolver};

/// Class marking the section metadata table, which is not content.
pub const SECTION_METADATA_CLASS: &str = "section-metadata";

/// How one direct child of a section is extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Candidate<'a> {
    /// A div whose first class names a supported block.
    Block {
        node: NodeId,
        name: &'a str,
        variant: Option<&'a str>,
    },
    /// An element whose tag has a base element schema.
    Primitive { node: NodeId, tag: &'a str },
    Skip,
}

impl<'a> Candidate<'a> {
    fn classify(doc: &'a Document, node: NodeId, resolver: &SchemaResolver) -> Self {
        let Some(tag) = doc.tag_name(node) else {
            return Candidate::Skip;
        };

        let classes = doc.classes(node);
        if tag == "div" && !classes.is_empty() {
            let name = classes[0].as_str();
            if !resolver.is_supported_block(name) {
                trace!(block = name, "unsupported block, skipping");
                return Candidate::Skip;
            }
            return Candidate::Block {
                node,
                name,
                variant: classes.get(1).map(String::as_str),
            };
        }

        if resolver.is_supported_base_element(tag) {
            Candidate::Primitive { node, tag }
        } else {
            Candidate::Skip
        }
    }
}

/// Section object under construction, renaming colliding keys.
#[derive(Debug, Default)]
struct SectionBuilder {
    fields: Map<String, Value>,
}

impl SectionBuilder {
    /// Insert `value` under `key`, or `key_2`, `key_3`, ... if taken.
    fn insert(&mut self, key: &str, value: Value) {
        if !self.fields.contains_key(key) {
            self.fields.insert(key.to_string(), value);
            return;
        }
        let mut i = 2;
        let mut candidate = format!("{key}_{i}");
        while self.fields.contains_key(&candidate) {
            i += 1;
            candidate = format!("{key}_{i}");
        }
        self.fields.insert(candidate, value);
    }
}

/// True for the `div.section-metadata` table of a section.
pub fn is_section_metadata(doc: &Document, node: NodeId) -> bool {
    doc.is_tag(node, "div") && doc.has_class(node, SECTION_METADATA_CLASS)
}

/// Extract every section of `main` in document order.
pub async fn extract_sections(
    doc: &Document,
    main: NodeId,
    resolver: &SchemaResolver,
) -> Vec<Map<String, Value>> {
    let mut sections = Vec::new();
    for section in doc.element_children(main).filter(|&c| doc.is_tag(c, "div")) {
        sections.push(extract_section(doc, section, resolver).await);
    }
    sections
}

/// Extract the blocks and primitives of one section into a single object.
pub async fn extract_section(
    doc: &Document,
    section: NodeId,
    resolver: &SchemaResolver,
) -> Map<String, Value> {
    let candidates: Vec<_> = doc
        .element_children(section)
        .filter(|&c| !is_section_metadata(doc, c))
        .map(|c| Candidate::classify(doc, c, resolver))
        .collect();

    // Load all schemas of the section at once, then extract in order.
    let schemas = join_all(candidates.iter().map(|candidate| async move {
        match *candidate {
            Candidate::Block { name, variant, .. } => {
                resolver.load_block_schema(name, variant).await
            }
            Candidate::Primitive { tag, .. } => resolver.load_base_element_schema(tag).await,
            Candidate::Skip => None,
        }
    }))
    .await;

    let mut builder = SectionBuilder::default();
    for (candidate, schema) in candidates.iter().zip(schemas) {
        let Some(schema) = schema else {
            continue;
        };
        match *candidate {
            Candidate::Block {
                node,
                name,
                variant,
            } => match extract_value(doc, node, &schema, None, Some(name)) {
                Ok(Some(data)) => {
                    let mut entry = Map::new();
                    entry.insert("data".to_string(), data);
                    if let Some(variant) = variant {
                        entry.insert("option".to_string(), Value::String(variant.to_string()));
                    }
                    builder.insert(name, Value::Object(entry));
                }
                Ok(None) => debug!(block = name, "block produced no data"),
                Err(e) => warn!(block = name, error = %e, "error extracting block"),
            },
            Candidate::Primitive { node, tag } => {
                if matches!(schema.kind, SchemaKind::Object { .. }) {
                    for (key, value) in extract_block(doc, node, &schema, tag).into_iter().flatten()
                    {
                        builder.insert(&key, value);
                    }
                } else {
                    match extract_value(doc, node, &schema, None, Some(tag)) {
                        Ok(Some(value)) => builder.insert(tag, value),
                        Ok(None) => {}
                        Err(e) => warn!(element = tag, error = %e, "error extracting element"),
                    }
                }
            }
            Candidate::Skip => {}
        }
    }
    builder.fields
}

/// Extract a whole page in schema mode: `{"sections": [...]}`.
pub async fn extract_schema_document(doc: &Document, resolver: &SchemaResolver) -> Result<Value> {
    let main = doc
        .find_by_tag("main")
        .ok_or_else(|| Error::MissingElement("main".to_string()))?;
    let sections = extract_sections(doc, main, resolver).await;
    Ok(json!({ "sections": sections }))
}
