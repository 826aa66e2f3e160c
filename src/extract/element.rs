//! Element lookup and attribute reading for the value extractor.

use crate::dom::{Document, NodeId, select_first};
use crate::error::Result;
use crate::schema::TEXT_ATTRIBUTE;

/// Find the element a value is read from.
///
/// With a selector, the first match below `context`; otherwise the shared
/// element inherited from an enclosing object, if any.
pub fn find_element(
    doc: &Document,
    context: NodeId,
    selector: Option<&str>,
    shared: Option<NodeId>,
) -> Result<Option<NodeId>> {
    match selector {
        Some(selector) => select_first(doc, selector, context),
        None => Ok(shared),
    }
}

/// Map a DOM property name to its HTML attribute name.
pub fn attribute_alias(name: &str) -> &str {
    match name {
        "className" => "class",
        "htmlFor" => "for",
        "httpEquiv" => "http-equiv",
        "acceptCharset" => "accept-charset",
        _ => name,
    }
}

/// Read `attribute` from `element`.
///
/// [`TEXT_ATTRIBUTE`] and attributes the element lacks both yield the
/// element's trimmed text content. Present attributes are returned verbatim,
/// including empty values.
pub fn value_from_element(doc: &Document, element: NodeId, attribute: &str) -> String {
    if attribute == TEXT_ATTRIBUTE {
        return doc.text_content(element).trim().to_string();
    }

    match doc.attr_ignore_case(element, attribute_alias(attribute)) {
        Some(value) => value.to_string(),
        None => doc.text_content(element).trim().to_string(),
    }
}
