//! # eds-json
//!
//! Extract structured JSON from block-authored HTML pages.
//!
//! Pages are made of sections (`main > div`) holding blocks (`div.<name>`)
//! whose rows and cells carry content. Each block name maps to a JSON schema
//! that says which selector and attribute every field is read from.
//!
//! ## Features
//!
//! - html5ever parsing into an arena [`Document`] with CSS selector queries
//! - role classification of pages, sections, blocks, rows and cells
//! - schema loading from memory, a directory or HTTP, with `$ref` resolution
//!   and a per-resolver cache
//! - schema-driven extraction, plus a schema-less generic extractor with
//!   JSON transformers
//! - role-annotated HTML output
//!
//! ## Quick Start
//!
//! ```
//! use eds_json::{Document, MemorySource, SchemaResolver, extract_schema_document};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let doc = Document::parse(r#"<main><div><h1>Welcome</h1></div></main>"#);
//! let resolver = SchemaResolver::new(MemorySource::builtin());
//!
//! let json = extract_schema_document(&doc, &resolver).await.unwrap();
//! assert_eq!(json["sections"][0]["h1"], "Welcome");
//! # }
//! ```

pub mod config;
pub mod dom;
pub mod error;
pub mod export;
pub mod extract;
#[cfg(feature = "http")]
pub mod fetch;
pub mod render;
pub mod schema;
pub mod transform;
pub(crate) mod util;

pub use config::{Context, ResolverConfig};
pub use dom::{Document, NodeId, Role, RoleMap, Selector, classify};
pub use error::{Error, Result};
pub use export::annotated_html;
pub use extract::{extract_legacy_document, extract_schema_document, extract_value};
#[cfg(feature = "http")]
pub use fetch::fetch_page;
pub use render::{Rendered, render};
#[cfg(feature = "http")]
pub use schema::HttpSource;
pub use schema::{
    DirectorySource, MemorySource, RefOverrides, Schema, SchemaKind, SchemaResolver, SchemaSource,
};
pub use transform::{Transformer, apply_transformer};
