//! Resolver that reads a version from a JSON status endpoint.
//!
//! The URL comes from the source provider (it usually carries credentials),
//! so a missing source surfaces as `ConnectionStringNotFound`.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use depgate_core::{
    DependencyResolver, DependencyVersion, ResolveError, ResolveRequest, SourceProvider,
    ensure_found,
};

use super::parse_options;

/// JSON pointer used when none is configured.
pub const DEFAULT_POINTER: &str = "/version";

const USER_AGENT: &str = concat!("depgate/", env!("CARGO_PKG_VERSION"));

/// GETs the source URL and reads the version at a JSON pointer.
///
/// The pointer may target a string (`"7.2.4"`), a number (`7.2`), or an array
/// of those or of node objects carrying a `version` field; each array element
/// becomes one resolved version.
#[derive(Debug, Clone)]
pub struct HttpJsonResolver {
    client: Client,
    pointer: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct HttpJsonOptions {
    #[serde(default)]
    pointer: Option<String>,
}

impl HttpJsonResolver {
    /// Resolver with its own client. Fails when the TLS backend cannot be
    /// initialised.
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            pointer: DEFAULT_POINTER.to_string(),
        }
    }

    #[must_use]
    pub fn with_pointer(mut self, pointer: impl Into<String>) -> Self {
        self.pointer = pointer.into();
        self
    }

    pub fn pointer(&self) -> &str {
        &self.pointer
    }

    pub(crate) fn from_options(
        options: &serde_json::Map<String, Value>,
    ) -> Result<Self, String> {
        let options: HttpJsonOptions = parse_options(options)?;
        let resolver = Self::new().map_err(|e| format!("failed to build HTTP client: {e}"))?;
        match options.pointer {
            Some(pointer) if !pointer.is_empty() && !pointer.starts_with('/') => {
                Err(format!("pointer '{pointer}' must start with '/'"))
            }
            Some(pointer) => Ok(resolver.with_pointer(pointer)),
            None => Ok(resolver),
        }
    }
}

fn request_error(err: &reqwest::Error, request: &ResolveRequest) -> ResolveError {
    if err.is_timeout() {
        ResolveError::Timeout {
            after: request.timeout,
        }
    } else if err.is_builder() {
        ResolveError::Configuration(format!("invalid request: {err}"))
    } else if err.is_decode() {
        ResolveError::Configuration(format!("response is not valid JSON: {err}"))
    } else {
        ResolveError::TransientConnectivity(err.to_string())
    }
}

fn status_error(status: StatusCode) -> ResolveError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ResolveError::Authentication(format!("endpoint answered {status}"))
        }
        s if s.is_server_error() || s == StatusCode::TOO_MANY_REQUESTS => {
            ResolveError::TransientConnectivity(format!("endpoint answered {status}"))
        }
        _ => ResolveError::Configuration(format!("endpoint answered {status}")),
    }
}

/// Versions found at `pointer` inside `body`.
pub fn extract_versions(
    body: &Value,
    pointer: &str,
) -> Result<Vec<DependencyVersion>, ResolveError> {
    let Some(target) = body.pointer(pointer) else {
        return Ok(Vec::new());
    };
    match target {
        Value::Array(nodes) => nodes.iter().map(node_version).collect(),
        other => Ok(vec![scalar_version(other)?]),
    }
}

fn node_version(node: &Value) -> Result<DependencyVersion, ResolveError> {
    let Value::Object(fields) = node else {
        return scalar_version(node);
    };
    let version = fields.get("version").ok_or_else(|| {
        ResolveError::Configuration("cluster node has no 'version' field".to_string())
    })?;
    let version = scalar_version(version)?;
    let label = ["node", "name", "id"]
        .iter()
        .find_map(|key| fields.get(*key).and_then(Value::as_str));
    Ok(match label {
        Some(label) => version.with_label(label),
        None => version,
    })
}

fn scalar_version(value: &Value) -> Result<DependencyVersion, ResolveError> {
    let text = match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        other => {
            return Err(ResolveError::Configuration(format!(
                "expected a version string, found {other}"
            )));
        }
    };
    DependencyVersion::parse(&text)
        .or_else(|err| DependencyVersion::extract(&text).ok_or(err))
        .map_err(ResolveError::from)
}

#[async_trait]
impl DependencyResolver for HttpJsonResolver {
    fn kind(&self) -> &str {
        "http-json"
    }

    async fn resolve(
        &self,
        sources: &dyn SourceProvider,
        request: &ResolveRequest,
    ) -> Result<Vec<DependencyVersion>, ResolveError> {
        let info = sources.connection_info(&request.source_key)?;

        let response = self
            .client
            .get(info.value())
            .send()
            .await
            .map_err(|e| request_error(&e.without_url(), request))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| request_error(&e.without_url(), request))?;

        ensure_found(&request.dependency, extract_versions(&body, &self.pointer)?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use depgate_core::{ErrorKind, FailurePolicy, NoopSourceProvider, ResolverDescriptor};
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;
    use crate::ResolutionOrchestrator;
    use crate::sources::MapSourceProvider;

    /// Serve exactly one canned HTTP response and return its URL.
    async fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        });
        format!("http://{addr}/status")
    }

    /// Accept connections and never answer.
    async fn serve_silence() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });
        format!("http://{addr}/status")
    }

    fn request() -> ResolveRequest {
        ResolveRequest {
            dependency: "search".to_string(),
            source_key: "search".to_string(),
            attempt: 1,
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_extract_scalar_and_number() {
        let versions = extract_versions(&json!({ "version": "8.11.1" }), "/version").unwrap();
        assert_eq!(versions[0].to_string(), "8.11.1");

        let versions = extract_versions(&json!({ "v": 7.2 }), "/v").unwrap();
        assert_eq!(versions[0], DependencyVersion::parse("7.2").unwrap());

        let body = json!({ "version": { "number": "RabbitMQ 3.12.4" } });
        let versions = extract_versions(&body, "/version/number").unwrap();
        assert_eq!(versions[0].to_string(), "3.12.4");
    }

    #[test]
    fn test_extract_cluster_nodes() {
        let body = json!({
            "nodes": [
                { "node": "a", "version": "3.12.4" },
                { "node": "b", "version": "3.11.0" },
                "3.12.0"
            ]
        });
        let versions = extract_versions(&body, "/nodes").unwrap();
        assert_eq!(versions.len(), 3);
        assert_eq!(versions[0].label(), Some("a"));
        assert_eq!(versions[1].to_string(), "3.11.0");
        assert_eq!(versions[2].label(), None);
    }

    #[test]
    fn test_extract_missing_pointer_is_empty() {
        assert!(extract_versions(&json!({}), "/version").unwrap().is_empty());
    }

    #[test]
    fn test_extract_rejects_garbage() {
        let err = extract_versions(&json!({ "version": "latest" }), "/version").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedVersion);

        let err = extract_versions(&json!({ "version": true }), "/version").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_error(StatusCode::UNAUTHORIZED).kind(),
            ErrorKind::Authentication
        );
        assert!(status_error(StatusCode::SERVICE_UNAVAILABLE).is_transient());
        assert_eq!(
            status_error(StatusCode::NOT_FOUND).kind(),
            ErrorKind::Configuration
        );
    }

    #[tokio::test]
    async fn test_resolves_from_endpoint() {
        let url = serve_once("200 OK", r#"{"version":"8.11.1","status":"green"}"#).await;
        let sources = MapSourceProvider::new().with("search", url);

        let versions = HttpJsonResolver::new()
            .unwrap()
            .resolve(&sources, &request())
            .await
            .unwrap();
        assert_eq!(versions, vec![DependencyVersion::new(8, 11, 1)]);
    }

    #[tokio::test]
    async fn test_forbidden_is_authentication() {
        let url = serve_once("403 Forbidden", "{}").await;
        let sources = MapSourceProvider::new().with("search", url);

        let err = HttpJsonResolver::new()
            .unwrap()
            .resolve(&sources, &request())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_server_error_is_transient() {
        let url = serve_once("503 Service Unavailable", "{}").await;
        let sources = MapSourceProvider::new().with("search", url);

        let err = HttpJsonResolver::new()
            .unwrap()
            .resolve(&sources, &request())
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_missing_source() {
        let err = HttpJsonResolver::new()
            .unwrap()
            .resolve(&NoopSourceProvider, &request())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConnectionStringNotFound);
    }

    #[tokio::test]
    async fn test_connection_refused_is_transient() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let sources = MapSourceProvider::new().with("search", format!("http://{addr}/"));

        let err = HttpJsonResolver::new()
            .unwrap()
            .resolve(&sources, &request())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransientConnectivity);
    }

    #[test]
    fn test_from_options() {
        let mut options = serde_json::Map::new();
        assert_eq!(
            HttpJsonResolver::from_options(&options).unwrap().pointer(),
            DEFAULT_POINTER
        );
        options.insert("pointer".to_string(), "/nodes".into());
        assert_eq!(
            HttpJsonResolver::from_options(&options).unwrap().pointer(),
            "/nodes"
        );
        options.insert("pointer".to_string(), "nodes".into());
        assert!(HttpJsonResolver::from_options(&options).is_err());
    }

    #[tokio::test]
    async fn test_client_timeout_is_timeout() {
        let url = serve_silence().await;
        let sources = MapSourceProvider::new().with("search", url);
        let client = Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .unwrap();

        let err = HttpJsonResolver::with_client(client)
            .resolve(&sources, &request())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_unresponsive_endpoint_reports_timeout() {
        let url = serve_silence().await;
        let orchestrator = ResolutionOrchestrator::new(Arc::new(
            MapSourceProvider::new().with("search", url),
        ));
        let descriptor = ResolverDescriptor::new(
            "search",
            Arc::new(HttpJsonResolver::new().unwrap()),
            ">=8",
        )
        .unwrap()
        .with_timeout(Duration::from_millis(200))
        .with_retries(0);

        for _ in 0..5 {
            let report = orchestrator
                .verify(std::slice::from_ref(&descriptor), FailurePolicy::Log)
                .await
                .unwrap();
            let error = report.entry("search").unwrap().error.as_ref().unwrap();
            assert_eq!(error.kind, ErrorKind::Timeout);
        }
    }
}
