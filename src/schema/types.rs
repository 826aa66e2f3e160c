//! Typed schema model.
//!
//! Schema documents are JSON objects in a small JSON-Schema dialect. They are
//! validated once, when loaded, into the closed [`Schema`] tree below; the
//! extractor never looks at raw JSON.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Sentinel attribute name meaning "the element's text content".
pub const TEXT_ATTRIBUTE: &str = "text";

/// One node of a schema tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub format: Option<String>,
    /// CSS selector locating the element this value is read from.
    pub selector: Option<String>,
    /// Attribute to read, or [`TEXT_ATTRIBUTE`].
    pub attribute: Option<String>,
    /// Set when this node was produced by resolving a `$ref`.
    pub base_ref: bool,
    pub kind: SchemaKind,
}

/// What a schema node extracts.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    String,
    Object {
        /// Properties in declaration order.
        properties: Vec<(String, Schema)>,
        required: Vec<String>,
    },
    Array {
        items: Option<Box<Schema>>,
    },
    /// Unresolved reference to a base element schema.
    Ref {
        target: String,
        /// Structure declared next to the `$ref`, kept for the overlay.
        overrides: RefOverrides,
    },
}

/// Structural keywords written alongside a `$ref`.
///
/// Each one that is present replaces the corresponding part of the
/// referenced schema when the reference is resolved.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RefOverrides {
    pub properties: Option<Vec<(String, Schema)>>,
    pub items: Option<Box<Schema>>,
    pub required: Option<Vec<String>>,
}

/// Wire form of a schema node.
#[derive(Debug, Deserialize)]
struct RawSchema {
    #[serde(rename = "$id")]
    id: Option<String>,
    #[serde(rename = "$ref")]
    reference: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    title: Option<String>,
    description: Option<String>,
    format: Option<String>,
    #[serde(rename = "x-aem-selector", alias = "x-eds-selector")]
    selector: Option<String>,
    #[serde(rename = "x-aem-attribute", alias = "x-eds-attribute")]
    attribute: Option<String>,
    #[serde(rename = "x-aem-base-ref", default)]
    base_ref: bool,
    properties: Option<Map<String, Value>>,
    items: Option<Box<Value>>,
    required: Option<Vec<String>>,
}

impl Schema {
    /// Validate a JSON schema document into a typed tree.
    ///
    /// `location` names the document in error messages.
    pub fn from_value(value: &Value, location: &str) -> Result<Self> {
        Self::from_value_at(value, location, "#")
    }

    /// Parse and validate a schema document from JSON text.
    pub fn from_json(json: &str, location: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(&value, location)
    }

    fn from_value_at(value: &Value, location: &str, pointer: &str) -> Result<Self> {
        let invalid = |message: String| Error::InvalidSchema {
            location: format!("{location}{pointer}"),
            message,
        };

        let raw = RawSchema::deserialize(value).map_err(|e| invalid(e.to_string()))?;

        let kind = match raw.kind.as_deref() {
            Some("string") => SchemaKind::String,
            Some("object") => SchemaKind::Object {
                properties: Self::parse_properties(raw.properties.as_ref(), location, pointer)?,
                required: raw.required.unwrap_or_default(),
            },
            Some("array") => SchemaKind::Array {
                items: Self::parse_items(raw.items.as_deref(), location, pointer)?,
            },
            Some(other) => return Err(invalid(format!("unsupported type `{other}`"))),
            None => match (raw.reference, raw.properties.as_ref()) {
                (Some(target), props) => SchemaKind::Ref {
                    target,
                    overrides: RefOverrides {
                        properties: props
                            .map(|props| Self::parse_properties(Some(props), location, pointer))
                            .transpose()?,
                        items: Self::parse_items(raw.items.as_deref(), location, pointer)?,
                        required: raw.required,
                    },
                },
                (None, Some(props)) => SchemaKind::Object {
                    properties: Self::parse_properties(Some(props), location, pointer)?,
                    required: raw.required.unwrap_or_default(),
                },
                (None, None) => {
                    return Err(invalid(
                        "node has no `type`, `$ref` or `properties`".to_string(),
                    ));
                }
            },
        };

        Ok(Schema {
            id: raw.id,
            title: raw.title,
            description: raw.description,
            format: raw.format,
            selector: raw.selector,
            attribute: raw.attribute,
            base_ref: raw.base_ref,
            kind,
        })
    }

    fn parse_properties(
        props: Option<&Map<String, Value>>,
        location: &str,
        pointer: &str,
    ) -> Result<Vec<(String, Schema)>> {
        let mut properties = Vec::new();
        for (name, prop) in props.into_iter().flatten() {
            let child = format!("{pointer}/properties/{name}");
            properties.push((name.clone(), Self::from_value_at(prop, location, &child)?));
        }
        Ok(properties)
    }

    fn parse_items(
        items: Option<&Value>,
        location: &str,
        pointer: &str,
    ) -> Result<Option<Box<Schema>>> {
        let Some(items) = items else {
            return Ok(None);
        };
        let child = format!("{pointer}/items");
        Ok(Some(Box::new(Self::from_value_at(items, location, &child)?)))
    }

    /// A bare schema node of the given kind.
    pub fn new(kind: SchemaKind) -> Self {
        Schema {
            id: None,
            title: None,
            description: None,
            format: None,
            selector: None,
            attribute: None,
            base_ref: false,
            kind,
        }
    }

    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    pub fn is_ref(&self) -> bool {
        matches!(self.kind, SchemaKind::Ref { .. })
    }

    /// Properties of an object schema, empty for other kinds.
    pub fn properties(&self) -> &[(String, Schema)] {
        match &self.kind {
            SchemaKind::Object { properties, .. } => properties,
            _ => &[],
        }
    }

    /// Look up a property of an object schema by name.
    pub fn property(&self, name: &str) -> Option<&Schema> {
        self.properties()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s)
    }

    /// Every `$ref` target still reachable from this node.
    pub fn unresolved_refs(&self) -> Vec<&str> {
        let mut refs = Vec::new();
        self.collect_refs(&mut refs);
        refs
    }

    fn collect_refs<'a>(&'a self, refs: &mut Vec<&'a str>) {
        match &self.kind {
            SchemaKind::Ref { target, overrides } => {
                refs.push(target);
                for (_, prop) in overrides.properties.iter().flatten() {
                    prop.collect_refs(refs);
                }
                if let Some(items) = &overrides.items {
                    items.collect_refs(refs);
                }
            }
            SchemaKind::Object { properties, .. } => {
                for (_, prop) in properties {
                    prop.collect_refs(refs);
                }
            }
            SchemaKind::Array { items: Some(items) } => items.collect_refs(refs),
            SchemaKind::Array { items: None } | SchemaKind::String => {}
        }
    }

    /// Combine this `$ref` node with the schema it points to.
    ///
    /// The target contributes its type, structure, selector, attribute,
    /// description and format. Fields set on this node take precedence,
    /// including `properties`, `items` and `required` declared next to the
    /// `$ref`; each replaces the target's whole.
    pub fn overlay_ref(&self, target: &Schema) -> Schema {
        let kind = match (&self.kind, &target.kind) {
            (
                SchemaKind::Ref { overrides, .. },
                SchemaKind::Object {
                    properties,
                    required,
                },
            ) => SchemaKind::Object {
                properties: overrides
                    .properties
                    .clone()
                    .unwrap_or_else(|| properties.clone()),
                required: overrides.required.clone().unwrap_or_else(|| required.clone()),
            },
            (SchemaKind::Ref { overrides, .. }, SchemaKind::Array { items }) => {
                SchemaKind::Array {
                    items: overrides.items.clone().or_else(|| items.clone()),
                }
            }
            (_, kind) => kind.clone(),
        };

        Schema {
            id: self.id.clone(),
            title: self.title.clone(),
            description: self
                .description
                .clone()
                .or_else(|| target.description.clone()),
            format: self.format.clone().or_else(|| target.format.clone()),
            selector: self.selector.clone().or_else(|| target.selector.clone()),
            attribute: self.attribute.clone().or_else(|| target.attribute.clone()),
            base_ref: true,
            kind,
        }
    }
}

/// Element name a `$ref` points to: the last path segment without its
/// `.schema.json` suffix.
///
/// `"../base/text.schema.json"` names `text`. Returns `None` for references
/// that do not name a schema document.
pub fn ref_target_name(reference: &str) -> Option<&str> {
    let segment = reference.rsplit('/').next()?;
    let name = segment.strip_suffix(".schema.json")?;
    (!name.is_empty()).then_some(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_object_preserves_order() {
        let schema = Schema::from_value(
            &json!({
                "type": "object",
                "properties": {
                    "zeta": { "type": "string" },
                    "alpha": { "type": "string", "x-aem-selector": "h1" },
                    "mid": { "type": "array", "items": { "type": "string" } }
                },
                "required": ["alpha"]
            }),
            "test",
        )
        .unwrap();

        let names: Vec<_> = schema.properties().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
        assert_eq!(schema.property("alpha").unwrap().selector.as_deref(), Some("h1"));
        match &schema.kind {
            SchemaKind::Object { required, .. } => assert_eq!(required, &["alpha"]),
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn test_eds_aliases() {
        let schema = Schema::from_value(
            &json!({
                "type": "string",
                "x-eds-selector": "picture source",
                "x-eds-attribute": "srcSet"
            }),
            "test",
        )
        .unwrap();
        assert_eq!(schema.selector.as_deref(), Some("picture source"));
        assert_eq!(schema.attribute.as_deref(), Some("srcSet"));
    }

    #[test]
    fn test_properties_without_type_is_object() {
        let schema =
            Schema::from_value(&json!({ "properties": { "a": { "type": "string" } } }), "t")
                .unwrap();
        assert!(matches!(schema.kind, SchemaKind::Object { .. }));
    }

    #[test]
    fn test_ref_node() {
        let schema = Schema::from_value(
            &json!({ "$ref": "../base/h1.schema.json", "x-aem-selector": "h1" }),
            "t",
        )
        .unwrap();
        assert_eq!(
            schema.kind,
            SchemaKind::Ref {
                target: "../base/h1.schema.json".into(),
                overrides: RefOverrides::default(),
            }
        );
        assert_eq!(schema.unresolved_refs(), vec!["../base/h1.schema.json"]);
    }

    #[test]
    fn test_array_without_items() {
        let schema = Schema::from_value(&json!({ "type": "array" }), "t").unwrap();
        assert_eq!(schema.kind, SchemaKind::Array { items: None });
    }

    #[test]
    fn test_unknown_type_is_invalid() {
        let err = Schema::from_value(&json!({ "type": "integer" }), "hero").unwrap_err();
        assert!(matches!(err, Error::InvalidSchema { .. }));
    }

    #[test]
    fn test_empty_node_is_invalid() {
        let err = Schema::from_value(
            &json!({ "type": "object", "properties": { "bad": { "title": "x" } } }),
            "hero",
        )
        .unwrap_err();
        match err {
            Error::InvalidSchema { location, .. } => {
                assert_eq!(location, "hero#/properties/bad");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_overlay_ref_prefers_own_fields() {
        let node = Schema::new(SchemaKind::Ref {
            target: "text.schema.json".into(),
            overrides: RefOverrides::default(),
        })
        .with_selector("h2");
        let target = Schema {
            description: Some("text".into()),
            ..Schema::new(SchemaKind::String).with_selector("p").with_attribute("title")
        };

        let merged = node.overlay_ref(&target);
        assert_eq!(merged.kind, SchemaKind::String);
        assert_eq!(merged.selector.as_deref(), Some("h2"));
        assert_eq!(merged.attribute.as_deref(), Some("title"));
        assert_eq!(merged.description.as_deref(), Some("text"));
        assert!(merged.base_ref);
    }

    #[test]
    fn test_ref_keeps_local_structure() {
        let schema = Schema::from_value(
            &json!({
                "$ref": "../base/pic.schema.json",
                "required": ["src", "alt"],
                "items": { "type": "string" }
            }),
            "t",
        )
        .unwrap();
        let SchemaKind::Ref { overrides, .. } = &schema.kind else {
            panic!("expected ref, got {:?}", schema.kind);
        };
        assert_eq!(overrides.required, Some(vec!["src".to_string(), "alt".to_string()]));
        assert_eq!(overrides.items.as_deref(), Some(&Schema::new(SchemaKind::String)));
        assert!(overrides.properties.is_none());
    }

    #[test]
    fn test_overlay_ref_local_required_replaces_target() {
        let node = Schema::new(SchemaKind::Ref {
            target: "pic.schema.json".into(),
            overrides: RefOverrides {
                required: Some(vec!["alt".into()]),
                ..RefOverrides::default()
            },
        });
        let target = Schema::new(SchemaKind::Object {
            properties: vec![
                ("src".into(), Schema::new(SchemaKind::String)),
                ("alt".into(), Schema::new(SchemaKind::String)),
            ],
            required: vec!["src".into()],
        })
        .with_selector("img");

        let merged = node.overlay_ref(&target);
        assert_eq!(merged.selector.as_deref(), Some("img"));
        assert_eq!(merged.properties().len(), 2);
        match merged.kind {
            SchemaKind::Object { required, .. } => assert_eq!(required, ["alt"]),
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn test_ref_target_name() {
        assert_eq!(ref_target_name("../base/text.schema.json"), Some("text"));
        assert_eq!(ref_target_name("picture.schema.json"), Some("picture"));
        assert_eq!(ref_target_name("#/definitions/x"), None);
        assert_eq!(ref_target_name(".schema.json"), None);
    }
}
