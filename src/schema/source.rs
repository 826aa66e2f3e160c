//! Where schema documents come from.
//!
//! A [`SchemaSource`] maps a relative path such as
//! `blocks/hero/hero.schema.json` to a JSON document. Not-found is
//! `Ok(None)`; any other failure is an error so callers can tell a missing
//! schema from a broken transport.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::Result;

/// A provider of raw schema documents.
#[async_trait]
pub trait SchemaSource: Send + Sync {
    /// Fetch the document at `path`, relative to the source root.
    async fn fetch(&self, path: &str) -> Result<Option<Value>>;

    /// Human-readable description for log messages.
    fn describe(&self) -> String;
}

/// Path of a block schema, optionally for one variant.
pub fn block_schema_path(name: &str, variant: Option<&str>) -> String {
    match variant {
        Some(variant) => format!("blocks/{name}/{name}.{variant}.schema.json"),
        None => format!("blocks/{name}/{name}.schema.json"),
    }
}

/// Path of a base element schema.
pub fn base_schema_path(tag: &str) -> String {
    format!("schema/base/{tag}.schema.json")
}

/// In-memory schema documents keyed by path.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    documents: HashMap<String, Value>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document at an arbitrary path.
    pub fn insert(&mut self, path: impl Into<String>, document: Value) {
        self.documents.insert(path.into(), document);
    }

    /// Add the default schema of a block.
    pub fn with_block(mut self, name: &str, document: Value) -> Self {
        self.insert(block_schema_path(name, None), document);
        self
    }

    /// Add the schema of one block variant.
    pub fn with_block_variant(mut self, name: &str, variant: &str, document: Value) -> Self {
        self.insert(block_schema_path(name, Some(variant)), document);
        self
    }

    /// Add a base element schema.
    pub fn with_base_element(mut self, tag: &str, document: Value) -> Self {
        self.insert(base_schema_path(tag), document);
        self
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl SchemaSource for MemorySource {
    async fn fetch(&self, path: &str) -> Result<Option<Value>> {
        Ok(self.documents.get(path).cloned())
    }

    fn describe(&self) -> String {
        format!("memory ({} documents)", self.documents.len())
    }
}

/// Schema documents laid out on disk under a root directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Join `path` below the root, refusing anything that would escape it.
    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path);
        let contained = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        contained.then(|| self.root.join(relative))
    }
}

#[async_trait]
impl SchemaSource for DirectorySource {
    async fn fetch(&self, path: &str) -> Result<Option<Value>> {
        let Some(file) = self.resolve(path) else {
            warn!(path, "refusing schema path outside the schema directory");
            return Ok(None);
        };

        let bytes = match tokio::fs::read(&file).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %file.display(), "schema file not found");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    fn describe(&self) -> String {
        format!("directory {}", self.root.display())
    }
}

#[cfg(feature = "http")]
pub use http::HttpSource;

#[cfg(feature = "http")]
mod http {
    use std::time::Duration;

    use async_trait::async_trait;
    use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
    use reqwest::StatusCode;
    use serde_json::Value;
    use tracing::debug;
    use url::Url;

    use super::SchemaSource;
    use crate::error::{Error, Result};

    /// Characters escaped inside one URL path segment.
    const SEGMENT: &AsciiSet = &CONTROLS
        .add(b' ')
        .add(b'"')
        .add(b'#')
        .add(b'%')
        .add(b'/')
        .add(b'<')
        .add(b'>')
        .add(b'?')
        .add(b'`')
        .add(b'{')
        .add(b'}');

    /// Schema documents served over HTTP below a base URL.
    #[derive(Debug, Clone)]
    pub struct HttpSource {
        client: reqwest::Client,
        base: Url,
    }

    impl HttpSource {
        /// Create a source rooted at `base` (e.g. the site's EDS domain).
        pub fn new(base: &str) -> Result<Self> {
            Self::with_client(reqwest::Client::new(), base)
        }

        /// Create a source with a request timeout.
        pub fn with_timeout(base: &str, timeout: Duration) -> Result<Self> {
            let client = reqwest::Client::builder().timeout(timeout).build()?;
            Self::with_client(client, base)
        }

        pub fn with_client(client: reqwest::Client, base: &str) -> Result<Self> {
            let mut base = Url::parse(base)?;
            if !base.path().ends_with('/') {
                let path = format!("{}/", base.path());
                base.set_path(&path);
            }
            Ok(Self { client, base })
        }

        pub fn base(&self) -> &Url {
            &self.base
        }

        /// Absolute URL of a relative schema path, each segment escaped.
        pub fn url_for(&self, path: &str) -> Result<Url> {
            let escaped: Vec<String> = path
                .split('/')
                .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
                .collect();
            Ok(self.base.join(&escaped.join("/"))?)
        }
    }

    #[async_trait]
    impl SchemaSource for HttpSource {
        async fn fetch(&self, path: &str) -> Result<Option<Value>> {
            let url = self.url_for(path)?;
            let response = self.client.get(url.clone()).send().await?;

            match response.status() {
                status if status.is_success() => {
                    let bytes = response.bytes().await?;
                    Ok(Some(serde_json::from_slice(&bytes)?))
                }
                StatusCode::NOT_FOUND | StatusCode::GONE => {
                    debug!(%url, "schema not found");
                    Ok(None)
                }
                status => Err(Error::SchemaTransport(format!(
                    "{url} returned status {}",
                    status.as_u16()
                ))),
            }
        }

        fn describe(&self) -> String {
            format!("http {}", self.base)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_base_gets_trailing_slash() {
            let source = HttpSource::new("https://main--site--org.aem.live/schemas").unwrap();
            assert_eq!(source.base().as_str(), "https://main--site--org.aem.live/schemas/");
        }

        #[test]
        fn test_url_for_escapes_segments() {
            let source = HttpSource::new("https://main--site--org.aem.live").unwrap();
            let url = source.url_for("blocks/my block/my block.schema.json").unwrap();
            assert_eq!(
                url.as_str(),
                "https://main--site--org.aem.live/blocks/my%20block/my%20block.schema.json"
            );
        }
    }
}
