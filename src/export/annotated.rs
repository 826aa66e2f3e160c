//! Annotated HTML serializer.
//!
//! Writes the document back out as HTML with each classified role attached
//! as `data-*` attributes, so a classification can be inspected in a
//! browser or diffed as text.
//!
//! # Example
//!
//! ```
//! use eds_json::dom::{Document, RoleMap};
//! use eds_json::export::annotated_html;
//!
//! let doc = Document::parse("<main><div><h2>Hi</h2></div></main>");
//! let roles = RoleMap::classify(&doc);
//! let html = annotated_html(&doc, &roles);
//!
//! assert!(html.contains(r#"<h2 data-role="heading" data-level="2">Hi</h2>"#));
//! ```

use crate::dom::{Document, NodeData, NodeId, RoleMap};

/// Elements that never have an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose text children are written unescaped.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Serialize `doc` with the roles in `roles` as `data-*` attributes.
pub fn annotated_html(doc: &Document, roles: &RoleMap) -> String {
    let mut ctx = SerializeContext {
        out: String::new(),
        doc,
        roles,
    };
    for child in doc.children(doc.root()) {
        walk_node(child, false, &mut ctx);
    }
    ctx.out
}

struct SerializeContext<'a> {
    out: String,
    doc: &'a Document,
    roles: &'a RoleMap,
}

fn walk_node(id: NodeId, raw_text: bool, ctx: &mut SerializeContext) {
    let doc = ctx.doc;
    let Some(node) = doc.get(id) else {
        return;
    };

    match &node.data {
        NodeData::Document => {}
        NodeData::Doctype { name } => {
            ctx.out.push_str("<!DOCTYPE ");
            ctx.out.push_str(name);
            ctx.out.push_str(">\n");
        }
        NodeData::Comment(text) => {
            ctx.out.push_str("<!--");
            ctx.out.push_str(text);
            ctx.out.push_str("-->");
        }
        NodeData::Text(text) => {
            if raw_text {
                ctx.out.push_str(text);
            } else {
                ctx.out.push_str(&escape_text(text));
            }
        }
        NodeData::Element { name, attrs, .. } => {
            let tag = name.local.as_ref();

            ctx.out.push('<');
            ctx.out.push_str(tag);
            for attr in attrs {
                push_attr(&mut ctx.out, attr.name.local.as_ref(), &attr.value);
            }
            push_role_attrs(id, ctx);
            ctx.out.push('>');

            if VOID_ELEMENTS.contains(&tag) {
                return;
            }

            let raw = RAW_TEXT_ELEMENTS.contains(&tag);
            for child in doc.children(id) {
                walk_node(child, raw, ctx);
            }

            ctx.out.push_str("</");
            ctx.out.push_str(tag);
            ctx.out.push('>');
        }
    }
}

fn push_role_attrs(id: NodeId, ctx: &mut SerializeContext) {
    let Some(role) = ctx.roles.role(id) else {
        return;
    };
    push_attr(&mut ctx.out, "data-role", role.as_str());

    if let Some(level) = ctx.roles.level(id) {
        push_attr(&mut ctx.out, "data-level", &level.to_string());
    }
    if let Some(ordered) = ctx.roles.ordered(id) {
        push_attr(&mut ctx.out, "data-ordered", if ordered { "true" } else { "false" });
    }
    if let Some(block) = ctx.roles.block(id) {
        if let Some(name) = &block.name {
            push_attr(&mut ctx.out, "data-block-name", name);
        }
        if !block.options.is_empty() {
            push_attr(&mut ctx.out, "data-block-options", &block.options.join(" "));
        }
    }
}

fn push_attr(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&escape_attr(value));
    out.push('"');
}

/// Escape text content.
pub fn escape_text(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '\u{a0}' => result.push_str("&nbsp;"),
            _ => result.push(c),
        }
    }
    result
}

/// Escape a double-quoted attribute value.
pub fn escape_attr(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            '\u{a0}' => result.push_str("&nbsp;"),
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotate(html: &str) -> String {
        let doc = Document::parse(html);
        let roles = RoleMap::classify(&doc);
        annotated_html(&doc, &roles)
    }

    #[test]
    fn test_structural_roles() {
        let out = annotate(
            r#"<body><main><div><div class="hero dark"><div><div><p>Hi</p></div></div></div></div></main></body>"#,
        );

        assert!(out.contains(r#"<main data-role="main">"#));
        assert!(out.contains(
            r#"<div class="hero dark" data-role="block" data-block-name="hero" data-block-options="dark">"#
        ));
        assert!(out.contains(r#"<p data-role="paragraph">Hi</p>"#));
    }

    #[test]
    fn test_list_order_and_void_elements() {
        let out = annotate(r#"<ol><li>a</li></ol><img src="/a.png" alt="x"><br>"#);

        assert!(out.contains(r#"<ol data-role="list" data-ordered="true">"#));
        assert!(out.contains(r#"<img src="/a.png" alt="x">"#));
        assert!(!out.contains("</img>"));
        assert!(!out.contains("</br>"));
    }

    #[test]
    fn test_escaping() {
        let out = annotate(r#"<p title="a &quot;b&quot; &amp; c">1 &lt; 2 &amp; 3</p>"#);

        assert!(out.contains(r#"title="a &quot;b&quot; &amp; c""#));
        assert!(out.contains("1 &lt; 2 &amp; 3"));
    }

    #[test]
    fn test_raw_text_is_verbatim() {
        let out = annotate("<html><head><script>if (a < b && c) {}</script></head></html>");
        assert!(out.contains("<script>if (a < b && c) {}</script>"));
    }

    #[test]
    fn test_doctype_is_kept() {
        let out = annotate("<!DOCTYPE html><html><body></body></html>");
        assert!(out.starts_with("<!DOCTYPE html>\n<html"));
    }
}
