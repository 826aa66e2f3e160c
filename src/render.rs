//! One page render: pick the output mode from a [`Context`] and run it.

use serde_json::Value;
use tracing::debug;

use crate::config::Context;
use crate::dom::{Document, RoleMap};
use crate::error::Result;
use crate::export::annotated_html;
use crate::extract::{extract_legacy_document, extract_schema_document};
use crate::schema::SchemaResolver;
use crate::transform::apply_transformers;

/// Output of a render.
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    Json(Value),
    Html(String),
}

impl Rendered {
    /// Serialize for output: pretty JSON or the HTML as is.
    pub fn to_text(&self) -> Result<String> {
        match self {
            Rendered::Json(value) => Ok(serde_json::to_string_pretty(value)?),
            Rendered::Html(html) => Ok(html.clone()),
        }
    }
}

/// Render `doc` the way `ctx` asks.
///
/// - `html`: the document with its roles as `data-*` attributes
/// - `use_schema`: schema-driven sections, via `resolver`
/// - otherwise: legacy extraction followed by `ctx.transformers`
pub async fn render(doc: &Document, ctx: &Context, resolver: &SchemaResolver) -> Result<Rendered> {
    if ctx.html {
        debug!("rendering annotated html");
        let roles = RoleMap::classify(doc);
        return Ok(Rendered::Html(annotated_html(doc, &roles)));
    }

    if ctx.use_schema {
        debug!("rendering schema json");
        return Ok(Rendered::Json(extract_schema_document(doc, resolver).await?));
    }

    debug!(transformers = ?ctx.transformers, "rendering legacy json");
    let value = extract_legacy_document(doc);
    Ok(Rendered::Json(apply_transformers(value, &ctx.transformers)))
}
