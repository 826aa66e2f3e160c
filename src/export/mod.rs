//! Output formats other than JSON.
//!
//! Currently only [`annotated_html`], which writes a document back out with
//! its classified roles attached.

mod annotated;

pub use annotated::{annotated_html, escape_attr, escape_text};
