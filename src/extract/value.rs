//! Schema-driven value extraction.
//!
//! [`extract_value`] walks a subtree guided by a resolved [`Schema`] and
//! produces a JSON value. `Ok(None)` means "absent": no element matched, a
//! required property was missing, or every property came out empty.

use serde_json::{Map, Value};
use tracing::{trace, warn};

use super::element::{find_element, value_from_element};
use crate::dom::{Document, NodeId, select_all, select_first};
use crate::error::Result;
use crate::schema::{Schema, SchemaKind, TEXT_ATTRIBUTE};

/// Extract one value of `schema` from `context`.
///
/// `shared` is the element matched by the nearest enclosing object
/// selector; properties without their own selector read from it.
/// `property_name` doubles as the default attribute for strings.
pub fn extract_value(
    doc: &Document,
    context: NodeId,
    schema: &Schema,
    shared: Option<NodeId>,
    property_name: Option<&str>,
) -> Result<Option<Value>> {
    match &schema.kind {
        SchemaKind::String => extract_string(doc, context, schema, shared, property_name),
        SchemaKind::Array { items } => extract_array(doc, context, schema, items.as_deref()),
        SchemaKind::Object {
            properties,
            required,
        } => {
            let Some(object) = extract_object(doc, context, schema, properties, required)? else {
                return Ok(None);
            };
            if schema.base_ref && object.len() == 1 {
                return Ok(object.into_iter().next().map(|(_, v)| v));
            }
            Ok(Some(Value::Object(object)))
        }
        SchemaKind::Ref { target, .. } => {
            trace!(reference = %target, "skipping unresolved reference");
            Ok(None)
        }
    }
}

/// Extract every top-level property of `schema` from `node`.
///
/// Unlike an object value there is no selector or `required` check: each
/// property stands on its own and failures only drop that property.
pub fn extract_block(
    doc: &Document,
    node: NodeId,
    schema: &Schema,
    block_name: &str,
) -> Option<Map<String, Value>> {
    let mut data = Map::new();
    for (name, property) in schema.properties() {
        match extract_value(doc, node, property, None, Some(name)) {
            Ok(Some(value)) => {
                data.insert(name.clone(), value);
            }
            Ok(None) => {}
            Err(e) => {
                warn!(block = block_name, property = %name, error = %e, "error extracting property");
            }
        }
    }
    (!data.is_empty()).then_some(data)
}

fn extract_string(
    doc: &Document,
    context: NodeId,
    schema: &Schema,
    shared: Option<NodeId>,
    property_name: Option<&str>,
) -> Result<Option<Value>> {
    let selector = schema.selector.as_deref();
    let element = match find_element(doc, context, selector, shared)? {
        Some(element) => element,
        // Nothing to narrow down to: read from the context itself.
        None if selector.is_none() && shared.is_none() => context,
        None => return Ok(None),
    };

    let attribute = schema
        .attribute
        .as_deref()
        .or(property_name)
        .unwrap_or(TEXT_ATTRIBUTE);
    Ok(Some(Value::String(value_from_element(doc, element, attribute))))
}

fn extract_array(
    doc: &Document,
    context: NodeId,
    schema: &Schema,
    items: Option<&Schema>,
) -> Result<Option<Value>> {
    let (Some(selector), Some(items)) = (schema.selector.as_deref(), items) else {
        return Ok(None);
    };

    let mut values = Vec::new();
    for element in select_all(doc, selector, context)? {
        match extract_value(doc, element, items, None, None) {
            Ok(Some(value)) => values.push(value),
            Ok(None) => {}
            Err(e) => warn!(selector, error = %e, "error extracting array item"),
        }
    }

    Ok((!values.is_empty()).then_some(Value::Array(values)))
}

fn extract_object(
    doc: &Document,
    context: NodeId,
    schema: &Schema,
    properties: &[(String, Schema)],
    required: &[String],
) -> Result<Option<Map<String, Value>>> {
    if properties.is_empty() {
        return Ok(None);
    }

    // An object selector scopes every property; no match means no object.
    let shared = match schema.selector.as_deref() {
        Some(selector) => match select_first(doc, selector, context)? {
            Some(element) => Some(element),
            None => return Ok(None),
        },
        None => None,
    };
    let scope = shared.unwrap_or(context);

    let mut object = Map::new();
    for (name, property) in properties {
        match extract_value(doc, scope, property, shared, Some(name)) {
            Ok(Some(value)) => {
                object.insert(name.clone(), value);
            }
            Ok(None) => {}
            Err(e) => warn!(property = %name, error = %e, "error extracting property"),
        }
    }

    if let Some(missing) = required.iter().find(|r| !object.contains_key(r.as_str())) {
        trace!(property = %missing, "required property missing, dropping object");
        return Ok(None);
    }

    Ok((!object.is_empty()).then_some(object))
}
