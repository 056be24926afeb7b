use std::time::Duration;

use async_trait::async_trait;
use gamelink_core::Transport;
use gamelink_domain::constants::{DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT, UPLOAD_FILE_FIELD};
use gamelink_domain::{
    BinaryUpload, GameLinkError, HttpConfig, RequestBody, ResolvedRequest, ResponseEnvelope,
};
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Client as ReqwestClient, Method, RequestBuilder};
use tracing::{debug, instrument, warn};

use crate::errors::conversions::fault_message;
use crate::errors::InfraError;

/// [`Transport`] over reqwest.
///
/// Sends each request exactly once. Retrying is the dispatcher's job, so
/// HTTP error statuses come back as ordinary envelopes and connection
/// problems as status-0 envelopes.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: ReqwestClient,
}

impl ReqwestTransport {
    /// Start building a new transport.
    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self, GameLinkError> {
        Self::builder().build()
    }

    /// Transport configured from the `http` section of the config.
    pub fn from_config(config: &HttpConfig) -> Result<Self, GameLinkError> {
        let mut builder = Self::builder().timeout(Duration::from_secs(config.timeout_secs));
        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        builder.build()
    }

    fn prepare(&self, request: ResolvedRequest) -> Result<RequestBuilder, String> {
        let method = Method::from_bytes(request.method.wire_method().as_bytes())
            .map_err(|e| format!("invalid method: {e}"))?;
        let has_content_type = request.header(CONTENT_TYPE.as_str()).is_some();

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let builder = match request.body {
            RequestBody::None => builder,
            RequestBody::Json(text) if has_content_type => builder.body(text),
            RequestBody::Json(text) => builder.header(CONTENT_TYPE, "application/json").body(text),
            RequestBody::Form(fields) => builder.form(&fields),
            RequestBody::Binary(upload) => builder.multipart(multipart_form(upload)?),
        };

        Ok(builder)
    }
}

fn multipart_form(upload: BinaryUpload) -> Result<Form, String> {
    let BinaryUpload { bytes, file_name, content_type, fields } = upload;

    let mut part = Part::bytes(bytes).file_name(file_name);
    if !content_type.is_empty() {
        part = part.mime_str(&content_type).map_err(|e| format!("invalid content type: {e}"))?;
    }

    let form = fields.into_iter().fold(Form::new(), |form, (name, value)| form.text(name, value));
    Ok(form.part(UPLOAD_FILE_FIELD, part))
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[instrument(skip_all, fields(method = request.method.wire_method(), url = %request.url))]
    async fn send(&self, request: ResolvedRequest) -> ResponseEnvelope {
        let correlation_id = request.correlation_id.clone();

        let builder = match self.prepare(request) {
            Ok(builder) => builder,
            Err(message) => {
                warn!(error = %message, "request could not be built");
                return ResponseEnvelope::transport_fault(message, correlation_id);
            }
        };

        let response = match builder.send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "HTTP request failed before a response");
                return ResponseEnvelope::transport_fault(fault_message(err), correlation_id);
            }
        };

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value.to_str().ok().map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();

        let text = match response.text().await {
            Ok(text) => text,
            Err(err) => {
                warn!(status, error = %err, "response body could not be read");
                return ResponseEnvelope::transport_fault(fault_message(err), correlation_id);
            }
        };

        debug!(status, bytes = text.len(), "received HTTP response");
        ResponseEnvelope::from_http(status, headers, text, correlation_id)
    }
}

/// Builder for [`ReqwestTransport`].
#[derive(Debug)]
pub struct ReqwestTransportBuilder {
    timeout: Duration,
    user_agent: String,
    default_headers: Option<HeaderMap>,
    accept_invalid_certs: bool,
}

impl Default for ReqwestTransportBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            default_headers: None,
            accept_invalid_certs: false,
        }
    }
}

impl ReqwestTransportBuilder {
    /// Overall per-request timeout; expiry yields a status-0 envelope.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// Headers sent on every request, below per-request headers.
    pub fn default_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers = Some(headers);
        self
    }

    /// Test-only helper to allow insecure TLS (e.g., self-signed certs).
    #[cfg(test)]
    pub fn accept_invalid_certs(mut self, enabled: bool) -> Self {
        self.accept_invalid_certs = enabled;
        self
    }

    pub fn build(self) -> Result<ReqwestTransport, GameLinkError> {
        let mut builder =
            ReqwestClient::builder().timeout(self.timeout).user_agent(self.user_agent).no_proxy();

        if let Some(headers) = self.default_headers {
            builder = builder.default_headers(headers);
        }

        if self.accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder.build().map_err(|err| GameLinkError::from(InfraError::from(err)))?;

        Ok(ReqwestTransport { client })
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use gamelink_domain::HttpMethod;
    use reqwest::header::HeaderValue;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn resolved(method: HttpMethod, url: String, body: RequestBody) -> ResolvedRequest {
        ResolvedRequest { method, url, headers: Vec::new(), body, correlation_id: None }
    }

    #[tokio::test]
    async fn returns_error_statuses_as_envelopes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(404).set_body_string(r#"{"message":"missing","code":12}"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new().unwrap();
        let envelope = transport
            .send(resolved(HttpMethod::Get, format!("{}/v1/x", server.uri()), RequestBody::None))
            .await;

        assert!(!envelope.success);
        assert_eq!(envelope.status_code, 404);
        assert_eq!(envelope.error_message(), Some("missing"));
        assert_eq!(envelope.error.unwrap().code.as_deref(), Some("12"));
    }

    #[tokio::test]
    async fn json_body_gets_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/scores"))
            .and(header("content-type", "application/json"))
            .and(body_string(r#"{"score":9}"#))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new().unwrap();
        let envelope = transport
            .send(resolved(
                HttpMethod::Post,
                format!("{}/v1/scores", server.uri()),
                RequestBody::Json(r#"{"score":9}"#.into()),
            ))
            .await;

        assert!(envelope.success);
        assert_eq!(envelope.status_code, 201);
    }

    #[tokio::test]
    async fn form_fields_are_url_encoded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/feedback"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string("rating=5&comment=great+game"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new().unwrap();
        let fields = vec![
            ("rating".to_string(), "5".to_string()),
            ("comment".to_string(), "great game".to_string()),
        ];
        let envelope = transport
            .send(resolved(
                HttpMethod::Post,
                format!("{}/v1/feedback", server.uri()),
                RequestBody::Form(fields),
            ))
            .await;

        assert!(envelope.success);
        assert_eq!(envelope.status_code, 204);
    }

    #[tokio::test]
    async fn default_headers_and_user_agent_are_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("x-client", "tests"))
            .and(header("user-agent", "gamelink-tests/1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mut defaults = HeaderMap::new();
        defaults.insert("x-client", HeaderValue::from_static("tests"));
        let transport = ReqwestTransport::builder()
            .user_agent("gamelink-tests/1")
            .default_headers(defaults)
            .accept_invalid_certs(false)
            .build()
            .unwrap();

        let envelope =
            transport.send(resolved(HttpMethod::Get, server.uri(), RequestBody::None)).await;
        assert!(envelope.success);
    }

    #[tokio::test]
    async fn connection_refused_is_status_zero() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = ReqwestTransport::new().unwrap();
        let envelope = transport
            .send(resolved(HttpMethod::Get, format!("http://{addr}/v1/x"), RequestBody::None))
            .await;

        assert!(!envelope.success);
        assert_eq!(envelope.status_code, 0);
        assert!(envelope.error_message().is_some());
    }

    #[tokio::test]
    async fn truncated_body_is_a_transport_fault() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0_u8; 1024];
            let _ = socket.read(&mut buf).await;
            socket
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 100\r\n\r\n{\"partial\"")
                .await
                .unwrap();
            socket.shutdown().await.unwrap();
        });

        let transport = ReqwestTransport::new().unwrap();
        let envelope = transport
            .send(ResolvedRequest {
                correlation_id: Some("c-9".into()),
                ..resolved(HttpMethod::Get, format!("http://{addr}/v1/x"), RequestBody::None)
            })
            .await;

        assert!(!envelope.success);
        assert_eq!(envelope.status_code, 0);
        assert!(envelope.error_message().is_some());
        assert_eq!(envelope.correlation_id.as_deref(), Some("c-9"));
    }

    #[tokio::test]
    async fn invalid_upload_content_type_is_a_fault() {
        let transport = ReqwestTransport::new().unwrap();
        let upload = BinaryUpload {
            bytes: vec![1],
            file_name: "a.bin".into(),
            content_type: "not a mime type".into(),
            fields: Vec::new(),
        };

        let envelope = transport
            .send(resolved(
                HttpMethod::Upload,
                "http://127.0.0.1:9/upload".into(),
                RequestBody::Binary(upload),
            ))
            .await;

        assert_eq!(envelope.status_code, 0);
        assert!(envelope.error_message().unwrap().contains("content type"));
    }
}
