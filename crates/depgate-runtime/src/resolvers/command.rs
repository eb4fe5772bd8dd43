//! Resolver that runs a program and scrapes its version output.

use std::io;
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use depgate_core::{
    DependencyResolver, DependencyVersion, ResolveError, ResolveRequest, SourceProvider,
    ensure_found,
};

/// Placeholder in arguments replaced by the source's connection string.
pub const SOURCE_PLACEHOLDER: &str = "{source}";

/// Runs `program args...` and extracts the first version from its output.
///
/// stdout is searched first, then stderr (many tools print `--version` to
/// stderr). When any argument contains `{source}`, the connection string for
/// the request's source key is substituted in.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandResolver {
    program: String,
    #[serde(default)]
    args: Vec<String>,
}

impl CommandResolver {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn render_args(
        &self,
        sources: &dyn SourceProvider,
        request: &ResolveRequest,
    ) -> Result<Vec<String>, ResolveError> {
        if !self.args.iter().any(|a| a.contains(SOURCE_PLACEHOLDER)) {
            return Ok(self.args.clone());
        }
        let info = sources.connection_info(&request.source_key)?;
        Ok(self
            .args
            .iter()
            .map(|a| a.replace(SOURCE_PLACEHOLDER, info.value()))
            .collect())
    }

    fn spawn_error(&self, err: &io::Error) -> ResolveError {
        match err.kind() {
            io::ErrorKind::NotFound => {
                ResolveError::Configuration(format!("program '{}' not found", self.program))
            }
            io::ErrorKind::PermissionDenied => ResolveError::Configuration(format!(
                "program '{}' is not executable",
                self.program
            )),
            _ => ResolveError::TransientConnectivity(format!(
                "failed to run '{}': {err}",
                self.program
            )),
        }
    }
}

#[async_trait]
impl DependencyResolver for CommandResolver {
    fn kind(&self) -> &str {
        "command"
    }

    async fn resolve(
        &self,
        sources: &dyn SourceProvider,
        request: &ResolveRequest,
    ) -> Result<Vec<DependencyVersion>, ResolveError> {
        let args = self.render_args(sources, request)?;

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| self.spawn_error(&e))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            let detail = stderr.lines().next().unwrap_or_default().trim();
            return Err(ResolveError::TransientConnectivity(format!(
                "'{}' exited with {}: {detail}",
                self.program, output.status
            )));
        }

        let version =
            DependencyVersion::extract(&stdout).or_else(|| DependencyVersion::extract(&stderr));
        ensure_found(&request.dependency, version.into_iter().collect())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::time::Duration;

    use depgate_core::{ErrorKind, NoopSourceProvider};

    use super::*;
    use crate::sources::MapSourceProvider;

    fn request() -> ResolveRequest {
        ResolveRequest {
            dependency: "tool".to_string(),
            source_key: "tool".to_string(),
            attempt: 1,
            timeout: Duration::from_secs(5),
        }
    }

    fn shell(script: &str) -> CommandResolver {
        CommandResolver::new("sh").args(["-c", script])
    }

    #[tokio::test]
    async fn test_version_from_stdout() {
        let versions = shell("echo 'psql (PostgreSQL) 15.4'")
            .resolve(&NoopSourceProvider, &request())
            .await
            .unwrap();
        assert_eq!(versions, vec![DependencyVersion::parse("15.4").unwrap()]);
    }

    #[tokio::test]
    async fn test_version_from_stderr() {
        let versions = shell("echo 'java version 17.0.2' >&2")
            .resolve(&NoopSourceProvider, &request())
            .await
            .unwrap();
        assert_eq!(versions[0].to_string(), "17.0.2");
    }

    #[tokio::test]
    async fn test_no_version_in_output() {
        let err = shell("echo hello")
            .resolve(&NoopSourceProvider, &request())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoVersionFound);
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_transient() {
        let err = shell("echo 'server not ready' >&2; exit 3")
            .resolve(&NoopSourceProvider, &request())
            .await
            .unwrap_err();
        assert!(err.is_transient());
        assert!(err.to_string().contains("server not ready"));
    }

    #[tokio::test]
    async fn test_missing_program_is_configuration() {
        let err = CommandResolver::new("depgate-definitely-not-installed")
            .resolve(&NoopSourceProvider, &request())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn test_source_placeholder() {
        let sources = MapSourceProvider::new().with("tool", "v2.31.4");
        let versions = shell("echo {source}")
            .resolve(&sources, &request())
            .await
            .unwrap();
        assert_eq!(versions[0].to_string(), "2.31.4");

        let err = shell("echo {source}")
            .resolve(&NoopSourceProvider, &request())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConnectionStringNotFound);
    }

    #[test]
    fn test_options_deserialize() {
        let resolver: CommandResolver =
            serde_json::from_str(r#"{ "program": "redis-server", "args": ["--version"] }"#)
                .unwrap();
        assert_eq!(resolver, CommandResolver::new("redis-server").arg("--version"));
    }
}
