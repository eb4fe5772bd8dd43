//! Maps configured resolver kinds to factories.
//!
//! The registry is the composition seam between [`VerifierSettings`] and
//! [`ResolverDescriptor`]s. Built-in kinds are registered by
//! [`ResolverRegistry::with_builtin`]; third-party resolvers are added with
//! [`ResolverRegistry::register`].

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use depgate_core::{
    DependencyResolver, DependencySettings, ResolverDescriptor, SettingsError, VerifierSettings,
    validate_settings,
};

use crate::resolvers::{CommandResolver, HttpJsonResolver, OsReleaseResolver, parse_options};

/// Builds a resolver from its `options` object. Errors are reported as
/// [`SettingsError::InvalidOptions`].
pub type ResolverFactory =
    Arc<dyn Fn(&Map<String, Value>) -> Result<Arc<dyn DependencyResolver>, String> + Send + Sync>;

#[derive(Clone, Default)]
pub struct ResolverRegistry {
    factories: BTreeMap<String, ResolverFactory>,
}

impl std::fmt::Debug for ResolverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverRegistry")
            .field("kinds", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ResolverRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `command`, `os-release` and `http-json`.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register("command", |options| {
            let resolver: CommandResolver = parse_options(options)?;
            Ok(Arc::new(resolver) as Arc<dyn DependencyResolver>)
        });
        registry.register("os-release", |options| {
            Ok(Arc::new(OsReleaseResolver::from_options(options)?) as Arc<dyn DependencyResolver>)
        });
        registry.register("http-json", |options| {
            Ok(Arc::new(HttpJsonResolver::from_options(options)?) as Arc<dyn DependencyResolver>)
        });
        registry
    }

    /// Add or replace the factory for `kind`.
    pub fn register<F>(&mut self, kind: impl Into<String>, factory: F)
    where
        F: Fn(&Map<String, Value>) -> Result<Arc<dyn DependencyResolver>, String>
            + Send
            + Sync
            + 'static,
    {
        self.factories.insert(kind.into(), Arc::new(factory));
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    /// Registered kinds in sorted order.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Instantiate the resolver for one dependency.
    pub fn create(
        &self,
        dependency: &DependencySettings,
    ) -> Result<Arc<dyn DependencyResolver>, SettingsError> {
        let factory =
            self.factories
                .get(&dependency.kind)
                .ok_or_else(|| SettingsError::UnknownKind {
                    name: dependency.name.clone(),
                    kind: dependency.kind.clone(),
                })?;
        factory(&dependency.options).map_err(|reason| SettingsError::InvalidOptions {
            name: dependency.name.clone(),
            reason,
        })
    }

    /// Validate `settings` and build one descriptor per dependency, in
    /// configuration order.
    pub fn build_descriptors(
        &self,
        settings: &VerifierSettings,
    ) -> Result<Vec<ResolverDescriptor>, SettingsError> {
        validate_settings(settings)?;

        settings
            .dependencies
            .iter()
            .map(|dependency| {
                let resolver = self.create(dependency)?;
                let mut descriptor = ResolverDescriptor::with_constraint(
                    dependency.name.clone(),
                    resolver,
                    dependency.parse_constraint()?,
                )
                .with_options(dependency.execution_options(&settings.defaults))
                .with_source_key(dependency.source_key())
                .with_node_policy(dependency.node_policy);
                if !dependency.required {
                    descriptor = descriptor.optional();
                }
                Ok(descriptor)
            })
            .collect()
    }
}
