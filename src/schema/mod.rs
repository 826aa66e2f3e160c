//! Block and base element schemas.
//!
//! - [`types`]: the validated schema tree
//! - [`source`]: where schema documents come from (memory, disk, HTTP)
//! - [`resolver`]: loading, `$ref` resolution and per-render caching

mod builtin;
pub mod resolver;
pub mod source;
pub mod types;

pub use resolver::SchemaResolver;
#[cfg(feature = "http")]
pub use source::HttpSource;
pub use source::{DirectorySource, MemorySource, SchemaSource};
pub use types::{RefOverrides, Schema, SchemaKind, TEXT_ATTRIBUTE, ref_target_name};
