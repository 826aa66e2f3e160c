//! Request context and resolver configuration.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

/// Which page to convert and how.
///
/// Built from a request path of the form
/// `/org/site/path/to/page?preview=true&schema=true&html=true&branch=x&transform=compact`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    pub org: String,
    pub site: String,
    /// Git branch of the site.
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Read from the preview (`.aem.page`) rather than live (`.aem.live`) domain.
    #[serde(default)]
    pub preview: bool,
    /// Page path below the site root, without a leading slash.
    #[serde(default)]
    pub content_path: String,
    /// Extract with block schemas instead of the generic content extractor.
    #[serde(default)]
    pub use_schema: bool,
    /// Emit role-annotated HTML instead of JSON.
    #[serde(default)]
    pub html: bool,
    /// Transformer names applied to the output, in order.
    #[serde(default)]
    pub transformers: Vec<String>,
}

fn default_branch() -> String {
    "main".to_string()
}

impl Context {
    pub fn new(org: impl Into<String>, site: impl Into<String>) -> Self {
        Self {
            org: org.into(),
            site: site.into(),
            branch: default_branch(),
            preview: false,
            content_path: String::new(),
            use_schema: false,
            html: false,
            transformers: Vec::new(),
        }
    }

    /// Parse a request URL or a bare request path.
    pub fn from_request_url(request: &str) -> Result<Self> {
        let url = if request.starts_with('/') {
            Url::parse("http://localhost")?.join(request)?
        } else {
            Url::parse(request)?
        };

        let mut segments = url.path_segments().into_iter().flatten();
        let org = segments.next().unwrap_or_default();
        let site = segments.next().unwrap_or_default();
        if org.is_empty() || site.is_empty() {
            return Err(Error::InvalidRequest("usage: /org/site/path".to_string()));
        }
        let content_path = segments.collect::<Vec<_>>().join("/");

        let mut ctx = Self::new(org, site).with_content_path(content_path);
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "preview" => ctx.preview = value == "true",
                "schema" => ctx.use_schema = value == "true",
                "html" => ctx.html = value == "true",
                "branch" if !value.is_empty() => ctx.branch = value.into_owned(),
                "transform" => ctx.transformers.extend(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|t| !t.is_empty())
                        .map(str::to_string),
                ),
                _ => {}
            }
        }
        Ok(ctx)
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    pub fn with_preview(mut self, preview: bool) -> Self {
        self.preview = preview;
        self
    }

    pub fn with_content_path(mut self, path: impl Into<String>) -> Self {
        self.content_path = path.into().trim_start_matches('/').to_string();
        self
    }

    /// Origin of the site, e.g. `https://main--site--org.aem.live`.
    pub fn eds_domain_url(&self) -> String {
        let tld = if self.preview { "page" } else { "live" };
        format!(
            "https://{}--{}--{}.aem.{tld}",
            self.branch, self.site, self.org
        )
    }

    /// Full URL of the page to convert.
    pub fn page_url(&self) -> Result<Url> {
        Ok(Url::parse(&format!(
            "{}/{}",
            self.eds_domain_url(),
            self.content_path
        ))?)
    }
}

/// Which blocks and base elements the schema extractor handles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Block names (first class of a block div) with schemas.
    #[serde(default = "default_blocks")]
    pub blocks: Vec<String>,
    /// Tag names with base element schemas.
    #[serde(default = "default_base_elements")]
    pub base_elements: Vec<String>,
}

fn default_blocks() -> Vec<String> {
    ["hero", "cards", "tabs"].map(String::from).to_vec()
}

fn default_base_elements() -> Vec<String> {
    ["text", "h1", "h2", "h3", "paragraph", "link", "picture", "list"]
        .map(String::from)
        .to_vec()
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            blocks: default_blocks(),
            base_elements: default_base_elements(),
        }
    }
}

impl ResolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a supported block name.
    pub fn with_block(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.blocks.contains(&name) {
            self.blocks.push(name);
        }
        self
    }

    /// Add a supported base element tag.
    pub fn with_base_element(mut self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        if !self.base_elements.contains(&tag) {
            self.base_elements.push(tag);
        }
        self
    }

    pub fn supports_block(&self, name: &str) -> bool {
        self.blocks.iter().any(|b| b == name)
    }

    pub fn supports_base_element(&self, tag: &str) -> bool {
        self.base_elements.iter().any(|t| t == tag)
    }
}
