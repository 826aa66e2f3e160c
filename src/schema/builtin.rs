//! Schemas bundled with the crate, so pages can be converted offline.

use serde_json::{Value, json};

use super::source::MemorySource;

impl MemorySource {
    /// A source holding the bundled block and base element schemas.
    ///
    /// Blocks: `hero`, `cards`, `fragment`. Base elements: `text`, `h1`,
    /// `h2`, `h3`, `paragraph`, `link`, `picture`, `list`.
    pub fn builtin() -> Self {
        let mut source = MemorySource::new()
            .with_block("hero", hero())
            .with_block("cards", cards())
            .with_block("fragment", fragment())
            .with_base_element("text", json!({ "title": "text", "type": "string" }))
            .with_base_element("paragraph", single("paragraph", "Paragraph text"))
            .with_base_element("link", link())
            .with_base_element("picture", picture())
            .with_base_element("list", list());

        for level in ["h1", "h2", "h3"] {
            source.insert(
                super::source::base_schema_path(level),
                single(level, "Heading text"),
            );
        }
        source
    }
}

/// Object wrapping one text property named after the element.
fn single(name: &str, description: &str) -> Value {
    json!({
        "title": name,
        "type": "object",
        "properties": {
            name: { "type": "string", "description": description }
        }
    })
}

fn hero() -> Value {
    json!({
        "title": "Hero Block",
        "description": "Main hero section with image and title",
        "type": "object",
        "properties": {
            "title": {
                "type": "string",
                "description": "Main hero title",
                "x-eds-selector": "h1"
            },
            "image": {
                "type": "object",
                "x-eds-selector": "picture img",
                "properties": {
                    "src": { "type": "string", "format": "uri" },
                    "alt": { "type": "string" }
                },
                "required": ["src", "alt"]
            }
        },
        "required": ["image", "title"]
    })
}

fn cards() -> Value {
    json!({
        "title": "Cards Block",
        "description": "Collection of cards with images and content",
        "type": "object",
        "properties": {
            "cards": {
                "type": "array",
                "description": "Array of card items",
                "x-eds-selector": ":scope > div",
                "items": {
                    "type": "object",
                    "properties": {
                        "title": {
                            "type": "string",
                            "description": "Card title from strong text",
                            "x-eds-selector": "strong"
                        },
                        "description": {
                            "type": "string",
                            "description": "Card description from last paragraph",
                            "x-eds-selector": "p:last-child"
                        },
                        "image": {
                            "$ref": "../../schema/base/picture.schema.json",
                            "x-eds-selector": "picture"
                        }
                    }
                }
            }
        },
        "required": ["cards"]
    })
}

fn fragment() -> Value {
    json!({
        "title": "Fragment Block",
        "description": "Fragment inclusion block with reference URL",
        "type": "object",
        "properties": {
            "url": {
                "type": "string",
                "format": "uri",
                "x-eds-selector": "a",
                "x-eds-attribute": "href"
            },
            "text": { "type": "string", "x-eds-selector": "a" }
        },
        "required": ["url"]
    })
}

fn link() -> Value {
    json!({
        "title": "link",
        "type": "object",
        "properties": {
            "link": {
                "type": "object",
                "properties": {
                    "href": { "type": "string", "format": "uri" },
                    "text": { "type": "string" }
                },
                "required": ["href"]
            }
        }
    })
}

fn picture() -> Value {
    json!({
        "title": "picture",
        "type": "object",
        "properties": {
            "picture": {
                "type": "object",
                "properties": {
                    "src": {
                        "type": "string",
                        "format": "uri",
                        "x-eds-selector": "img",
                        "x-eds-attribute": "src"
                    },
                    "alt": {
                        "type": "string",
                        "x-eds-selector": "img",
                        "x-eds-attribute": "alt"
                    }
                },
                "required": ["src"]
            }
        }
    })
}

fn list() -> Value {
    json!({
        "title": "list",
        "type": "object",
        "properties": {
            "list": {
                "type": "array",
                "x-eds-selector": ":scope > li",
                "items": { "type": "string" }
            }
        }
    })
}
