//! Turns a configuration file into a ready-to-run verification context.

use std::io;
use std::path::Path;
use std::sync::Arc;

use depgate_core::{ResolverDescriptor, VerifierSettings};
use depgate_runtime::{
    ChainSourceProvider, EnvSourceProvider, MapSourceProvider, ResolutionOrchestrator,
    ResolverRegistry,
};
use tracing::debug;

use crate::error::CliError;

/// Everything a handler needs to run a verification.
#[derive(Debug)]
pub struct CliContext {
    pub settings: VerifierSettings,
    pub orchestrator: ResolutionOrchestrator,
    pub descriptors: Vec<ResolverDescriptor>,
}

/// Read and validate the configuration at `path`.
pub fn load_settings(path: &Path) -> Result<VerifierSettings, CliError> {
    let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => {
            CliError::Config(format!("config file not found: {}", path.display()))
        }
        _ => CliError::Io(format!("failed to read {}: {e}", path.display())),
    })?;
    Ok(VerifierSettings::from_json_str(&text)?)
}

/// Connection strings from the config file first, then `DEPGATE_SOURCE_*`
/// environment variables.
pub fn build_sources(settings: &VerifierSettings) -> ChainSourceProvider {
    ChainSourceProvider::new()
        .with(MapSourceProvider::from_iter(settings.sources.clone()))
        .with(EnvSourceProvider::new())
}

/// Build a context from already-loaded settings.
pub fn bootstrap_settings(settings: VerifierSettings) -> Result<CliContext, CliError> {
    let descriptors = ResolverRegistry::with_builtin().build_descriptors(&settings)?;
    let orchestrator = ResolutionOrchestrator::new(Arc::new(build_sources(&settings)));

    debug!(
        dependencies = descriptors.len(),
        sources = settings.sources.len(),
        "Loaded verifier configuration"
    );

    Ok(CliContext {
        settings,
        orchestrator,
        descriptors,
    })
}

/// Load `path` and build a context from it.
pub fn bootstrap(path: &Path) -> Result<CliContext, CliError> {
    bootstrap_settings(load_settings(path)?)
}
