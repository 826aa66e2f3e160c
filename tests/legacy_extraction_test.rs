//! Schema-less extraction, transformers and the render pipeline.

use eds_json::{
    Context, Document, MemorySource, Rendered, SchemaResolver, extract_legacy_document, render,
};
use serde_json::json;

const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>Products</title>
  <link rel="canonical" href="https://main--site--org.aem.live/products">
  <meta name="description" content="All products">
  <meta property="og:image" content="/og.png">
</head>
<body>
  <header></header>
  <main>
    <div>
      <h1 id="products">Products</h1>
      <p>Some <strong>bold</strong> text</p>
      <div class="columns wide">
        <div>
          <div><p>Left</p></div>
          <div><p><a href="/more">More</a></p></div>
        </div>
      </div>
      <div class="section-metadata">
        <div><div>Style</div><div>Highlight</div></div>
      </div>
    </div>
    <div>
      <ol><li>one</li><li><em>two</em></li></ol>
      <picture><img src="/p.png" alt="P"></picture>
    </div>
  </main>
</body>
</html>"#;

#[test]
fn test_legacy_document() {
    let doc = Document::parse(PAGE);

    assert_eq!(
        extract_legacy_document(&doc),
        json!({
            "head": {
                "title": { "text": "Products" },
                "canonical": { "href": "https://main--site--org.aem.live/products" },
                "meta": [
                    { "tag": "description", "text": "All products" },
                    { "tag": "og:image", "text": "/og.png" }
                ]
            },
            "content": [
                {
                    "metadata": { "style": "Highlight" },
                    "section": [
                        { "type": "heading", "level": 1, "text": "Products" },
                        {
                            "type": "paragraph",
                            "content": ["Some ", { "type": "strong", "text": "bold" }, " text"]
                        },
                        {
                            "type": "block",
                            "name": "columns",
                            "content": [[
                                [{ "type": "paragraph", "text": "Left" }],
                                [{
                                    "type": "paragraph",
                                    "content": [{ "type": "link", "href": "/more", "text": "More" }]
                                }]
                            ]],
                            "options": ["wide"]
                        }
                    ]
                },
                {
                    "section": [
                        {
                            "type": "list",
                            "ordered": true,
                            "items": [
                                { "type": "text", "text": "one" },
                                { "type": "em", "text": "two" }
                            ]
                        },
                        { "type": "image", "src": "/p.png", "alt": "P" }
                    ]
                }
            ]
        })
    );
}

#[tokio::test]
async fn test_render_applies_transformers() {
    let doc = Document::parse(PAGE);
    let resolver = SchemaResolver::new(MemorySource::builtin());
    let ctx = Context::from_request_url("/org/site/products?transform=strip-metadata,compact")
        .unwrap();

    let Rendered::Json(json) = render(&doc, &ctx, &resolver).await.unwrap() else {
        panic!("expected json output");
    };

    assert!(json["content"][0].get("metadata").is_none());
    assert_eq!(json["content"][1]["section"][1]["type"], "image");
    assert_eq!(json["head"]["title"]["text"], "Products");
}

#[tokio::test]
async fn test_render_schema_mode() {
    let doc = Document::parse(PAGE);
    let resolver = SchemaResolver::new(MemorySource::builtin());
    let ctx = Context::from_request_url("/org/site/products?schema=true").unwrap();

    let rendered = render(&doc, &ctx, &resolver).await.unwrap();
    assert_eq!(
        rendered,
        Rendered::Json(json!({
            "sections": [
                { "h1": "Products" },
                { "picture": { "src": "/p.png", "alt": "P" } }
            ]
        }))
    );
}

#[tokio::test]
async fn test_render_annotated_html() {
    let doc = Document::parse(PAGE);
    let resolver = SchemaResolver::new(MemorySource::builtin());
    let ctx = Context::from_request_url("/org/site/products?html=true").unwrap();

    let text = render(&doc, &ctx, &resolver).await.unwrap().to_text().unwrap();

    assert!(text.starts_with("<!DOCTYPE html>"));
    assert!(text.contains(r#"<main data-role="main">"#));
    assert!(text.contains(
        r#"<div class="columns wide" data-role="block" data-block-name="columns" data-block-options="wide">"#
    ));
    assert!(text.contains(r#"<h1 id="products" data-role="heading" data-level="1">Products</h1>"#));
    assert!(text.contains(r#"<ol data-role="list" data-ordered="true">"#));
}
