//! Schemas loaded from a directory tree on disk.

use std::fs;
use std::path::Path;

use eds_json::{
    DirectorySource, Document, Error, ResolverConfig, SchemaResolver, SchemaSource,
    extract_schema_document,
};
use serde_json::{Value, json};
use tempfile::TempDir;

fn write(root: &Path, path: &str, value: &Value) {
    let file = root.join(path);
    fs::create_dir_all(file.parent().unwrap()).unwrap();
    fs::write(file, serde_json::to_vec_pretty(value).unwrap()).unwrap();
}

fn schema_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "blocks/quote/quote.schema.json",
        &json!({
            "title": "Quote",
            "type": "object",
            "properties": {
                "text": { "type": "string", "x-aem-selector": "blockquote" },
                "author": { "$ref": "../../schema/base/cite.schema.json", "x-aem-selector": "cite" }
            },
            "required": ["text"]
        }),
    );
    write(
        dir.path(),
        "schema/base/cite.schema.json",
        &json!({
            "type": "object",
            "properties": { "name": { "type": "string" } }
        }),
    );
    dir
}

fn resolver(dir: &TempDir) -> SchemaResolver {
    SchemaResolver::new(DirectorySource::new(dir.path()))
        .with_config(ResolverConfig::new().with_block("quote"))
}

#[tokio::test]
async fn test_block_from_directory() {
    let dir = schema_dir();
    let resolver = resolver(&dir);
    let doc = Document::parse(
        r#"<main><div><div class="quote"><div><div>
            <blockquote>Less is more.</blockquote><cite>Mies</cite>
        </div></div></div></div></main>"#,
    );

    let json = extract_schema_document(&doc, &resolver).await.unwrap();

    assert_eq!(
        json,
        json!({ "sections": [{ "quote": { "data": { "text": "Less is more.", "author": "Mies" } } }] })
    );
    assert_eq!(resolver.cached_keys(), vec!["base:cite", "block:quote"]);
}

#[tokio::test]
async fn test_missing_file_is_not_an_error() {
    let dir = schema_dir();
    let resolver = resolver(&dir);

    assert!(resolver.try_load_block_schema("hero", None).await.unwrap().is_none());
    assert!(resolver.cached_keys().is_empty());
}

#[tokio::test]
async fn test_malformed_file_is_reported() {
    let dir = schema_dir();
    fs::write(dir.path().join("blocks/quote/quote.schema.json"), b"{ not json").unwrap();
    let resolver = resolver(&dir);

    let err = resolver.try_load_block_schema("quote", None).await.unwrap_err();
    assert!(matches!(err, Error::Json(_)));
    assert!(resolver.load_block_schema("quote", None).await.is_none());
}

#[tokio::test]
async fn test_paths_cannot_escape_root() {
    let dir = schema_dir();
    let source = DirectorySource::new(dir.path().join("blocks"));

    assert!(source.fetch("../schema/base/cite.schema.json").await.unwrap().is_none());
    assert!(source.fetch("quote/quote.schema.json").await.unwrap().is_some());
}
