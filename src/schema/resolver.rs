//! Schema loading, `$ref` resolution and caching.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use super::source::{SchemaSource, base_schema_path, block_schema_path};
use super::types::{Schema, SchemaKind, ref_target_name};
use crate::config::ResolverConfig;
use crate::error::Result;

/// Loads block and base element schemas for one page render.
///
/// Every schema handed out is fully resolved: `$ref` nodes have been replaced
/// by the base element schema they point to, except where a reference cycle
/// was cut or the target could not be found. Resolved schemas are cached by
/// key (`block:<name>`, `block:<name>.<variant>`, `base:<tag>`) for the
/// lifetime of the resolver.
pub struct SchemaResolver {
    source: Arc<dyn SchemaSource>,
    config: ResolverConfig,
    cache: Mutex<HashMap<String, Arc<Schema>>>,
}

impl SchemaResolver {
    pub fn new(source: impl SchemaSource + 'static) -> Self {
        Self::with_source(Arc::new(source))
    }

    pub fn with_source(source: Arc<dyn SchemaSource>) -> Self {
        Self {
            source,
            config: ResolverConfig::default(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn is_supported_block(&self, name: &str) -> bool {
        self.config.supports_block(name)
    }

    pub fn is_supported_base_element(&self, tag: &str) -> bool {
        self.config.supports_base_element(tag)
    }

    /// Load a block schema, preferring the variant-specific document.
    ///
    /// Failures are logged and reported as `None`.
    pub async fn load_block_schema(
        &self,
        name: &str,
        variant: Option<&str>,
    ) -> Option<Arc<Schema>> {
        match self.try_load_block_schema(name, variant).await {
            Ok(schema) => schema,
            Err(e) => {
                warn!(block = name, error = %e, "failed to load block schema");
                None
            }
        }
    }

    /// Load a block schema, distinguishing not-found (`Ok(None)`) from
    /// transport and validation failures.
    pub async fn try_load_block_schema(
        &self,
        name: &str,
        variant: Option<&str>,
    ) -> Result<Option<Arc<Schema>>> {
        if let Some(variant) = variant {
            let key = format!("block:{name}.{variant}");
            let path = block_schema_path(name, Some(variant));
            match self.load_cached(key, path, &mut HashSet::new(), true).await {
                Ok(Some(schema)) => return Ok(Some(schema)),
                Ok(None) => {
                    debug!(block = name, variant, "no variant schema, using default");
                }
                Err(e) => {
                    warn!(block = name, variant, error = %e, "variant schema unavailable, using default");
                }
            }
        }

        let key = format!("block:{name}");
        let path = block_schema_path(name, None);
        self.load_cached(key, path, &mut HashSet::new(), true).await
    }

    /// Load a base element schema. Failures are logged and reported as `None`.
    pub async fn load_base_element_schema(&self, tag: &str) -> Option<Arc<Schema>> {
        match self.try_load_base_element_schema(tag).await {
            Ok(schema) => schema,
            Err(e) => {
                warn!(element = tag, error = %e, "failed to load base element schema");
                None
            }
        }
    }

    pub async fn try_load_base_element_schema(&self, tag: &str) -> Result<Option<Arc<Schema>>> {
        self.load_base(tag, &mut HashSet::new()).await
    }

    /// Resolve every `$ref` reachable from `schema`.
    ///
    /// Already-resolved schemas come back unchanged.
    pub async fn resolve(&self, schema: Schema) -> Schema {
        self.resolve_node(schema, &mut HashSet::new()).await
    }

    /// Drop every cached schema.
    pub fn clear_cache(&self) {
        self.cache.lock().clear();
    }

    /// Keys currently in the cache, sorted.
    pub fn cached_keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.cache.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Base element load that tracks which elements are mid-resolution.
    fn load_base<'a>(
        &'a self,
        tag: &'a str,
        visited: &'a mut HashSet<String>,
    ) -> BoxFuture<'a, Result<Option<Arc<Schema>>>> {
        async move {
            let top_level = visited.is_empty();
            visited.insert(tag.to_string());
            let loaded = self
                .load_cached(format!("base:{tag}"), base_schema_path(tag), visited, top_level)
                .await;
            visited.remove(tag);
            loaded
        }
        .boxed()
    }

    /// Fetch, validate, resolve and cache one schema document.
    ///
    /// `top_level` marks loads that start a resolution. Their result is
    /// cached even when a cycle was cut or a target was missing, since the
    /// same entry point always resolves the same way. Nested loads are only
    /// cached when complete.
    async fn load_cached(
        &self,
        key: String,
        path: String,
        visited: &mut HashSet<String>,
        top_level: bool,
    ) -> Result<Option<Arc<Schema>>> {
        if let Some(schema) = self.cache.lock().get(&key) {
            trace!(%key, "schema cache hit");
            return Ok(Some(Arc::clone(schema)));
        }

        let Some(document) = self.source.fetch(&path).await? else {
            debug!(%path, source = %self.source.describe(), "schema not found");
            return Ok(None);
        };

        let schema = Schema::from_value(&document, &path)?;
        let resolved = Arc::new(self.resolve_node(schema, visited).await);

        if top_level || resolved.unresolved_refs().is_empty() {
            debug!(%key, "caching resolved schema");
            self.cache.lock().insert(key, Arc::clone(&resolved));
        }
        Ok(Some(resolved))
    }

    fn resolve_node<'a>(
        &'a self,
        schema: Schema,
        visited: &'a mut HashSet<String>,
    ) -> BoxFuture<'a, Schema> {
        async move {
            match schema.kind {
                SchemaKind::Ref {
                    target: ref reference,
                    ..
                } => {
                    let Some(target) = ref_target_name(reference) else {
                        warn!(reference = %reference, "cannot resolve base element reference");
                        return schema;
                    };
                    if visited.contains(target) {
                        debug!(reference = %reference, "reference cycle, leaving unresolved");
                        return schema;
                    }

                    let target = target.to_string();
                    match self.load_base(&target, visited).await {
                        Ok(Some(base)) if !base.is_ref() => {
                            self.resolve_overrides(schema, visited).await.overlay_ref(&base)
                        }
                        Ok(Some(_)) => {
                            debug!(reference = %reference, "reference resolves to another cycle");
                            schema
                        }
                        Ok(None) => {
                            warn!(reference = %reference, "referenced schema not found");
                            schema
                        }
                        Err(e) => {
                            warn!(reference = %reference, error = %e, "error resolving reference");
                            schema
                        }
                    }
                }
                SchemaKind::Object {
                    properties,
                    required,
                } => {
                    let mut resolved = Vec::with_capacity(properties.len());
                    for (name, prop) in properties {
                        let prop = self.resolve_node(prop, &mut *visited).await;
                        resolved.push((name, prop));
                    }
                    Schema {
                        kind: SchemaKind::Object {
                            properties: resolved,
                            required,
                        },
                        ..schema
                    }
                }
                SchemaKind::Array { items: Some(items) } => {
                    let items = self.resolve_node(*items, visited).await;
                    Schema {
                        kind: SchemaKind::Array {
                            items: Some(Box::new(items)),
                        },
                        ..schema
                    }
                }
                SchemaKind::Array { items: None } | SchemaKind::String => schema,
            }
        }
        .boxed()
    }

    /// Resolve the properties and items declared next to a `$ref`.
    async fn resolve_overrides(&self, mut schema: Schema, visited: &mut HashSet<String>) -> Schema {
        if let SchemaKind::Ref { overrides, .. } = &mut schema.kind {
            if let Some(properties) = overrides.properties.take() {
                let mut resolved = Vec::with_capacity(properties.len());
                for (name, prop) in properties {
                    resolved.push((name, self.resolve_node(prop, &mut *visited).await));
                }
                overrides.properties = Some(resolved);
            }
            if let Some(items) = overrides.items.take() {
                overrides.items = Some(Box::new(self.resolve_node(*items, visited).await));
            }
        }
        schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::MemorySource;
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts fetches reaching the wrapped source.
    struct CountingSource {
        inner: MemorySource,
        fetches: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl SchemaSource for CountingSource {
        async fn fetch(&self, path: &str) -> Result<Option<Value>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch(path).await
        }

        fn describe(&self) -> String {
            format!("counting {}", self.inner.describe())
        }
    }

    fn counting(inner: MemorySource) -> (SchemaResolver, Arc<AtomicUsize>) {
        let fetches = Arc::new(AtomicUsize::new(0));
        let source = CountingSource {
            inner,
            fetches: Arc::clone(&fetches),
        };
        (SchemaResolver::new(source), fetches)
    }

    fn source() -> MemorySource {
        MemorySource::new()
            .with_block(
                "hero",
                json!({
                    "type": "object",
                    "properties": {
                        "title": { "$ref": "../base/h1.schema.json", "x-aem-selector": "h1" }
                    }
                }),
            )
            .with_block_variant(
                "hero",
                "dark",
                json!({ "type": "object", "properties": { "tone": { "type": "string" } } }),
            )
            .with_base_element(
                "h1",
                json!({
                    "type": "object",
                    "description": "Top-level heading",
                    "properties": { "h1": { "type": "string" } }
                }),
            )
    }

    #[tokio::test]
    async fn test_block_ref_is_resolved() {
        let resolver = SchemaResolver::new(source());
        let hero = resolver.load_block_schema("hero", None).await.unwrap();

        let title = hero.property("title").unwrap();
        assert!(title.base_ref);
        assert_eq!(title.selector.as_deref(), Some("h1"));
        assert_eq!(title.description.as_deref(), Some("Top-level heading"));
        assert!(title.property("h1").is_some());
        assert!(hero.unresolved_refs().is_empty());
    }

    #[tokio::test]
    async fn test_variant_first_then_default() {
        let resolver = SchemaResolver::new(source());

        let dark = resolver.load_block_schema("hero", Some("dark")).await.unwrap();
        assert!(dark.property("tone").is_some());

        let wide = resolver.load_block_schema("hero", Some("wide")).await.unwrap();
        assert!(wide.property("title").is_some());

        assert_eq!(
            resolver.cached_keys(),
            vec!["base:h1", "block:hero", "block:hero.dark"]
        );
    }

    #[tokio::test]
    async fn test_cache_and_clear() {
        let resolver = SchemaResolver::new(source());
        let first = resolver.load_base_element_schema("h1").await.unwrap();
        let second = resolver.load_base_element_schema("h1").await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        resolver.clear_cache();
        assert!(resolver.cached_keys().is_empty());
    }

    #[tokio::test]
    async fn test_missing_schema_is_none() {
        let resolver = SchemaResolver::new(MemorySource::new());
        assert!(resolver.load_block_schema("cards", None).await.is_none());
        assert!(resolver.try_load_base_element_schema("h2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_schema_is_error_for_try_api() {
        let resolver = SchemaResolver::new(
            MemorySource::new().with_block("bad", json!({ "type": "number" })),
        );
        assert!(resolver.try_load_block_schema("bad", None).await.is_err());
        assert!(resolver.load_block_schema("bad", None).await.is_none());
    }

    #[tokio::test]
    async fn test_self_reference_terminates() {
        let resolver = SchemaResolver::new(MemorySource::new().with_base_element(
            "node",
            json!({
                "type": "object",
                "properties": {
                    "label": { "type": "string" },
                    "child": { "$ref": "node.schema.json" }
                }
            }),
        ));

        let node = resolver.load_base_element_schema("node").await.unwrap();
        assert!(node.property("child").unwrap().is_ref());
        assert_eq!(node.unresolved_refs(), vec!["node.schema.json"]);
    }

    #[tokio::test]
    async fn test_mutual_reference_terminates() {
        let (resolver, fetches) = counting(
            MemorySource::new()
                .with_base_element("a", json!({ "$ref": "b.schema.json" }))
                .with_base_element("b", json!({ "$ref": "a.schema.json" })),
        );

        let a = resolver.load_base_element_schema("a").await.unwrap();
        assert!(a.is_ref());
        assert_eq!(fetches.load(Ordering::SeqCst), 2);

        let again = resolver.load_base_element_schema("a").await.unwrap();
        assert!(Arc::ptr_eq(&a, &again));
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_self_referencing_base_fetched_once() {
        let (resolver, fetches) = counting(MemorySource::new().with_base_element(
            "node",
            json!({ "type": "object", "properties": { "child": { "$ref": "node.schema.json" } } }),
        ));

        for _ in 0..5 {
            let node = resolver.load_base_element_schema("node").await.unwrap();
            assert!(node.property("child").unwrap().is_ref());
        }
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
        assert_eq!(resolver.cached_keys(), vec!["base:node"]);
    }

    #[tokio::test]
    async fn test_resolve_is_noop_on_resolved_schema() {
        let resolver = SchemaResolver::new(source());
        let hero = resolver.load_block_schema("hero", None).await.unwrap();
        let again = resolver.resolve((*hero).clone()).await;
        assert_eq!(*hero, again);
    }

    #[tokio::test]
    async fn test_missing_ref_target_left_unresolved() {
        let (resolver, fetches) = counting(MemorySource::new().with_block(
            "hero",
            json!({ "properties": { "x": { "$ref": "nowhere.schema.json" } } }),
        ));

        let hero = resolver.load_block_schema("hero", None).await.unwrap();
        assert!(hero.property("x").unwrap().is_ref());
        // block document plus the missing base element
        assert_eq!(fetches.load(Ordering::SeqCst), 2);

        resolver.load_block_schema("hero", None).await.unwrap();
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
        assert_eq!(resolver.cached_keys(), vec!["block:hero"]);
    }

    #[tokio::test]
    async fn test_ref_local_structure_overrides_target() {
        let source = MemorySource::new()
            .with_block(
                "hero",
                json!({
                    "type": "object",
                    "properties": {
                        "image": { "$ref": "../base/pic.schema.json", "required": ["src", "alt"] },
                        "caption": {
                            "$ref": "../base/pic.schema.json",
                            "properties": { "alt": { "$ref": "../base/label.schema.json" } }
                        }
                    }
                }),
            )
            .with_base_element(
                "pic",
                json!({
                    "type": "object",
                    "x-aem-selector": "img",
                    "properties": {
                        "src": { "type": "string", "x-aem-attribute": "src" },
                        "alt": { "type": "string", "x-aem-selector": "span.alt" }
                    },
                    "required": ["src"]
                }),
            )
            .with_base_element("label", json!({ "type": "string", "x-aem-selector": "span" }));
        let resolver = SchemaResolver::new(source);

        let hero = resolver.load_block_schema("hero", None).await.unwrap();

        let image = hero.property("image").unwrap();
        assert_eq!(image.selector.as_deref(), Some("img"));
        assert_eq!(image.properties().len(), 2);
        match &image.kind {
            SchemaKind::Object { required, .. } => assert_eq!(required, &["src", "alt"]),
            other => panic!("expected object, got {other:?}"),
        }

        let caption = hero.property("caption").unwrap();
        let names: Vec<_> = caption.properties().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["alt"]);
        let alt = caption.property("alt").unwrap();
        assert!(alt.base_ref);
        assert_eq!(alt.selector.as_deref(), Some("span"));
        match &caption.kind {
            SchemaKind::Object { required, .. } => assert_eq!(required, &["src"]),
            other => panic!("expected object, got {other:?}"),
        }
        assert!(hero.unresolved_refs().is_empty());
    }

    #[tokio::test]
    async fn test_broken_variant_falls_back_to_default() {
        let resolver = SchemaResolver::new(
            source().with_block_variant("hero", "odd", json!({ "type": "number" })),
        );

        let hero = resolver.try_load_block_schema("hero", Some("odd")).await.unwrap().unwrap();
        assert!(hero.property("title").is_some());
        assert!(!resolver.cached_keys().contains(&"block:hero.odd".to_string()));
    }
}
