//! Document tree, HTML parsing, selector matching and role classification.
//!
//! The arena [`Document`] is the only tree representation in the crate.
//! html5ever builds it through [`tree_sink::DocumentSink`], the selector
//! adapter queries it, and [`roles`] annotates it out of band.

mod arena;
pub mod roles;
pub mod selector;
mod tree_sink;

use html5ever::driver::ParseOpts;
use html5ever::tendril::TendrilSink;

pub use arena::{Attribute, Children, Descendants, Document, Node, NodeData, NodeId};
pub use roles::{BlockInfo, Role, RoleMap, classify};
pub use selector::{ElementRef, Selector, select_all, select_first};
pub use tree_sink::DocumentSink;

use crate::util::{decode_text, sniff_html_charset};

impl Document {
    /// Parse an HTML string into a document.
    ///
    /// Parsing never fails: malformed markup is repaired the way browsers
    /// repair it.
    pub fn parse(html: &str) -> Self {
        html5ever::parse_document(DocumentSink::new(), ParseOpts::default())
            .one(html)
            .into_document()
    }

    /// Parse raw bytes, decoding them with the charset declared in the
    /// document (UTF-8 first, then the declared charset, then Windows-1252).
    pub fn parse_bytes(bytes: &[u8]) -> Self {
        let html = decode_text(bytes, sniff_html_charset(bytes));
        Self::parse(&html)
    }

    /// Parse raw bytes with an externally supplied charset hint.
    pub fn parse_bytes_with_hint(bytes: &[u8], hint: Option<&str>) -> Self {
        let hint = hint.or_else(|| sniff_html_charset(bytes));
        let html = decode_text(bytes, hint);
        Self::parse(&html)
    }

    /// The `<html>` element, if present.
    pub fn html_element(&self) -> Option<NodeId> {
        self.element_children(self.root())
            .find(|&id| self.is_tag(id, "html"))
    }

    /// First element (document order) with the given tag below `scope`.
    pub fn find_tag_in(&self, scope: NodeId, tag: &str) -> Option<NodeId> {
        self.descendants(scope).find(|&id| self.is_tag(id, tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bytes_windows_1252() {
        let doc = Document::parse_bytes(
            b"<html><head><meta charset=\"windows-1252\"></head><body><p>caf\xe9</p></body></html>",
        );
        let p = doc.find_by_tag("p").unwrap();
        assert_eq!(doc.text_content(p), "café");
    }

    #[test]
    fn test_html_element() {
        let doc = Document::parse("<p>x</p>");
        let html = doc.html_element().unwrap();
        assert!(doc.is_tag(html, "html"));
        assert!(doc.find_tag_in(html, "body").is_some());
    }

    #[test]
    fn test_comments_are_not_elements() {
        let doc = Document::parse("<div><!-- note --><p>x</p></div>");
        let div = doc.find_by_tag("div").unwrap();
        assert_eq!(doc.children(div).count(), 2);
        assert_eq!(doc.element_children(div).count(), 1);
    }
}
