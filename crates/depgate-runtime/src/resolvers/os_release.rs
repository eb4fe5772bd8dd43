//! Host operating system version from an os-release file.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;

use depgate_core::{
    DependencyResolver, DependencyVersion, ResolveError, ResolveRequest, SourceProvider,
};

use super::parse_options;

/// Standard locations, in lookup order.
pub const DEFAULT_PATHS: [&str; 2] = ["/etc/os-release", "/usr/lib/os-release"];

/// Reads `VERSION_ID` from the first os-release file that exists and labels
/// the version with `NAME` (falling back to `ID`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsReleaseResolver {
    paths: Vec<PathBuf>,
}

impl Default for OsReleaseResolver {
    fn default() -> Self {
        Self {
            paths: DEFAULT_PATHS.iter().map(PathBuf::from).collect(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct OsReleaseOptions {
    path: Option<PathBuf>,
}

impl OsReleaseResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read only `path`.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            paths: vec![path.into()],
        }
    }

    pub(crate) fn from_options(
        options: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Self, String> {
        let options: OsReleaseOptions = parse_options(options)?;
        Ok(options.path.map_or_else(Self::default, Self::with_path))
    }

    async fn read_first(&self) -> Result<String, ResolveError> {
        for path in &self.paths {
            match tokio::fs::read_to_string(path).await {
                Ok(text) => return Ok(text),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(ResolveError::Configuration(format!(
                        "failed to read {}: {e}",
                        path.display()
                    )));
                }
            }
        }
        Err(ResolveError::Configuration(format!(
            "no os-release file found (tried {})",
            self.paths
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        )))
    }
}

/// Parse `KEY=VALUE` lines, dropping comments and surrounding quotes.
pub fn parse_os_release(text: &str) -> HashMap<String, String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let value = value.trim();
            let unquoted = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(value);
            (key.trim().to_string(), unquoted.to_string())
        })
        .collect()
}

#[async_trait]
impl DependencyResolver for OsReleaseResolver {
    fn kind(&self) -> &str {
        "os-release"
    }

    async fn resolve(
        &self,
        _sources: &dyn SourceProvider,
        request: &ResolveRequest,
    ) -> Result<Vec<DependencyVersion>, ResolveError> {
        let fields = parse_os_release(&self.read_first().await?);

        let Some(version_id) = fields.get("VERSION_ID").filter(|v| !v.is_empty()) else {
            return Err(ResolveError::NoVersionFound {
                dependency: request.dependency.clone(),
            });
        };

        let mut version = DependencyVersion::parse(version_id)?;
        if let Some(name) = fields.get("NAME").or_else(|| fields.get("ID")) {
            version = version.with_label(name.as_str());
        }
        Ok(vec![version])
    }
}
