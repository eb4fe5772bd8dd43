//! Dependency resolver port.

use std::time::Duration;

use async_trait::async_trait;

use super::SourceProvider;
use crate::error::ResolveError;
use crate::version::DependencyVersion;

/// Everything a resolver needs to know about the attempt it is running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveRequest {
    /// Descriptor name, used in errors.
    pub dependency: String,
    /// Key to look up in the [`SourceProvider`].
    pub source_key: String,
    /// 1-based attempt number.
    pub attempt: u32,
    /// Deadline the orchestrator will enforce for this attempt.
    pub timeout: Duration,
}

/// Discovers the running version(s) of one dependency.
///
/// A clustered dependency returns one version per node. Resolvers do not
/// need to enforce their own timeout; the orchestrator drops the future when
/// the deadline passes, so implementations should hold no state that
/// outlives a cancelled attempt.
#[async_trait]
pub trait DependencyResolver: Send + Sync {
    /// Short identifier used in logs (e.g. `"command"`).
    fn kind(&self) -> &str;

    async fn resolve(
        &self,
        sources: &dyn SourceProvider,
        request: &ResolveRequest,
    ) -> Result<Vec<DependencyVersion>, ResolveError>;
}

/// Turns an empty version list into [`ResolveError::NoVersionFound`].
pub fn ensure_found(
    dependency: &str,
    versions: Vec<DependencyVersion>,
) -> Result<Vec<DependencyVersion>, ResolveError> {
    if versions.is_empty() {
        return Err(ResolveError::NoVersionFound {
            dependency: dependency.to_string(),
        });
    }
    Ok(versions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{ConnectionInfo, MockSourceProvider};

    struct SourceEcho;

    #[async_trait]
    impl DependencyResolver for SourceEcho {
        fn kind(&self) -> &str {
            "echo"
        }

        async fn resolve(
            &self,
            sources: &dyn SourceProvider,
            request: &ResolveRequest,
        ) -> Result<Vec<DependencyVersion>, ResolveError> {
            let info = sources.connection_info(&request.source_key)?;
            Ok(vec![DependencyVersion::parse(info.value())?])
        }
    }

    fn request(key: &str) -> ResolveRequest {
        ResolveRequest {
            dependency: "db".to_string(),
            source_key: key.to_string(),
            attempt: 1,
            timeout: Duration::from_secs(1),
        }
    }

    #[tokio::test]
    async fn test_resolver_reads_source() {
        let mut sources = MockSourceProvider::new();
        sources
            .expect_connection_info()
            .returning(|key| Ok(ConnectionInfo::new(key, "4.2.1")));

        let versions = SourceEcho.resolve(&sources, &request("db")).await.unwrap();
        assert_eq!(versions, vec![DependencyVersion::new(4, 2, 1)]);
    }

    #[tokio::test]
    async fn test_missing_source_surfaces_as_resolve_error() {
        let sources = crate::ports::NoopSourceProvider;
        let err = SourceEcho
            .resolve(&sources, &request("cache"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ResolveError::ConnectionStringNotFound {
                key: "cache".to_string()
            }
        );
    }

    #[test]
    fn test_ensure_found() {
        assert!(matches!(
            ensure_found("db", Vec::new()),
            Err(ResolveError::NoVersionFound { dependency }) if dependency == "db"
        ));
        assert_eq!(
            ensure_found("db", vec![DependencyVersion::new(1, 0, 0)]).unwrap().len(),
            1
        );
    }
}
