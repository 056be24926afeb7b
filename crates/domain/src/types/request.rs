//! Request-side types: the logical description of one call
//!
//! A [`RequestDescriptor`] is what endpoint wrappers build and hand to the
//! dispatcher. A [`ResolvedRequest`] is what the dispatcher hands to the
//! transport once the URL, credentials and headers are known.

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::errors::Result;
use crate::impl_wire_enum_conversions;

/// HTTP method of a descriptor.
///
/// `Upload` is not a real HTTP verb: it is sent as `POST` with a multipart
/// body, and always gets a correlation id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Patch,
    Options,
    Upload,
}

impl_wire_enum_conversions!(HttpMethod {
    Get => "GET",
    Post => "POST",
    Put => "PUT",
    Delete => "DELETE",
    Head => "HEAD",
    Patch => "PATCH",
    Options => "OPTIONS",
    Upload => "UPLOAD",
});

impl HttpMethod {
    /// The verb that goes on the wire.
    pub fn wire_method(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post | Self::Upload => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Patch => "PATCH",
            Self::Options => "OPTIONS",
        }
    }

    /// Methods that should not carry a request body.
    pub fn expects_empty_body(self) -> bool {
        matches!(self, Self::Get | Self::Head | Self::Options)
    }
}

/// Identity space a request is authenticated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialDomain {
    /// End-user identity (game-facing API)
    Player,
    /// Administrative identity (admin-facing API)
    Admin,
    /// No credentials attached
    Unauthenticated,
}

impl_wire_enum_conversions!(CredentialDomain {
    Player => "player",
    Admin => "admin",
    Unauthenticated => "unauthenticated",
});

/// File payload for upload-style calls.
#[derive(Clone, PartialEq, Eq)]
pub struct BinaryUpload {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub content_type: String,
    /// Text fields sent alongside the file in the multipart form.
    pub fields: Vec<(String, String)>,
}

impl std::fmt::Debug for BinaryUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinaryUpload")
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("fields", &self.fields)
            .finish()
    }
}

/// Request body variants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RequestBody {
    #[default]
    None,
    /// Pre-serialized JSON text
    Json(String),
    /// URL-encoded form, order preserved
    Form(Vec<(String, String)>),
    /// Multipart upload
    Binary(BinaryUpload),
}

impl RequestBody {
    /// Whether the body carries any payload.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::None => true,
            Self::Json(text) => text.is_empty(),
            Self::Form(fields) => fields.is_empty(),
            Self::Binary(_) => false,
        }
    }
}

/// Immutable description of one logical call.
///
/// Built with [`RequestDescriptor::builder`] or one of the per-method
/// shortcuts. The retry counters are never mutated in place: the pipeline
/// derives a new descriptor for every replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    path: String,
    path_args: Vec<String>,
    method: HttpMethod,
    body: RequestBody,
    headers: Vec<(String, String)>,
    query: Vec<(String, String)>,
    credential_domain: CredentialDomain,
    retry_count: u32,
    rate_limit_retries: u32,
    correlation_id: Option<String>,
    body_warning: bool,
}

impl RequestDescriptor {
    /// Start building a descriptor. The credential domain defaults to
    /// [`CredentialDomain::Player`].
    pub fn builder(method: HttpMethod, path: impl Into<String>) -> RequestDescriptorBuilder {
        RequestDescriptorBuilder {
            inner: Self {
                path: path.into(),
                path_args: Vec::new(),
                method,
                body: RequestBody::None,
                headers: Vec::new(),
                query: Vec::new(),
                credential_domain: CredentialDomain::Player,
                retry_count: 0,
                rate_limit_retries: 0,
                correlation_id: None,
                body_warning: false,
            },
        }
    }

    pub fn get(path: impl Into<String>) -> RequestDescriptorBuilder {
        Self::builder(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> RequestDescriptorBuilder {
        Self::builder(HttpMethod::Post, path)
    }

    pub fn put(path: impl Into<String>) -> RequestDescriptorBuilder {
        Self::builder(HttpMethod::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> RequestDescriptorBuilder {
        Self::builder(HttpMethod::Delete, path)
    }

    pub fn upload(path: impl Into<String>) -> RequestDescriptorBuilder {
        Self::builder(HttpMethod::Upload, path)
    }

    /// Path template, placeholders unresolved.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Values for the `{0}`, `{1}`, ... placeholders of the path.
    pub fn path_args(&self) -> &[String] {
        &self.path_args
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    /// Extra headers; empty means none beyond the domain defaults.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn credential_domain(&self) -> CredentialDomain {
        self.credential_domain
    }

    /// Number of refresh-retry cycles this descriptor has been through.
    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Number of rate-limit replays this descriptor has been through.
    pub fn rate_limit_retries(&self) -> u32 {
        self.rate_limit_retries
    }

    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    /// True when a body was attached to a GET/HEAD/OPTIONS descriptor.
    pub fn has_body_warning(&self) -> bool {
        self.body_warning
    }

    /// The same call, one refresh-retry cycle later.
    #[must_use]
    pub fn next_auth_attempt(&self) -> Self {
        Self { retry_count: self.retry_count.saturating_add(1), ..self.clone() }
    }

    /// The same call, one rate-limit replay later.
    #[must_use]
    pub fn next_rate_limit_attempt(&self) -> Self {
        Self { rate_limit_retries: self.rate_limit_retries.saturating_add(1), ..self.clone() }
    }

    /// The same call with `spent` refresh-retry cycles already used up.
    /// Never lowers the count.
    #[must_use]
    pub fn with_spent_auth_retries(&self, spent: u32) -> Self {
        Self { retry_count: self.retry_count.max(spent), ..self.clone() }
    }
}

/// Builder for [`RequestDescriptor`]
#[derive(Debug, Clone)]
pub struct RequestDescriptorBuilder {
    inner: RequestDescriptor,
}

impl RequestDescriptorBuilder {
    /// Append a value for the next positional placeholder.
    pub fn path_arg(mut self, value: impl ToString) -> Self {
        self.inner.path_args.push(value.to_string());
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.inner.query.push((name.into(), value.to_string()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.inner.headers.push((name.into(), value.into()));
        self
    }

    pub fn domain(mut self, domain: CredentialDomain) -> Self {
        self.inner.credential_domain = domain;
        self
    }

    pub fn unauthenticated(self) -> Self {
        self.domain(CredentialDomain::Unauthenticated)
    }

    /// Use an already serialized JSON document as the body.
    pub fn json_text(mut self, text: impl Into<String>) -> Self {
        self.inner.body = RequestBody::Json(text.into());
        self
    }

    /// Serialize `value` as the JSON body.
    ///
    /// # Errors
    ///
    /// Returns `GameLinkError::Serialization` if `value` cannot be encoded.
    pub fn json<T: Serialize + ?Sized>(self, value: &T) -> Result<Self> {
        let text = serde_json::to_string(value)?;
        Ok(self.json_text(text))
    }

    /// Add a url-encoded form field. On an upload this becomes a multipart
    /// text field instead.
    pub fn form_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let pair = (name.into(), value.into());
        match &mut self.inner.body {
            RequestBody::Form(fields) => fields.push(pair),
            RequestBody::Binary(upload) => upload.fields.push(pair),
            body => *body = RequestBody::Form(vec![pair]),
        }
        self
    }

    /// Attach a file. Form fields added before or after are sent with it;
    /// an earlier JSON body is dropped with a warning.
    pub fn file(
        mut self,
        bytes: Vec<u8>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        let fields = match std::mem::take(&mut self.inner.body) {
            RequestBody::Form(fields) => fields,
            RequestBody::Binary(upload) => upload.fields,
            RequestBody::Json(_) => {
                warn!(path = %self.inner.path, "JSON body replaced by file upload");
                Vec::new()
            }
            RequestBody::None => Vec::new(),
        };
        self.inner.body = RequestBody::Binary(BinaryUpload {
            bytes,
            file_name: file_name.into(),
            content_type: content_type.into(),
            fields,
        });
        self
    }

    pub fn correlation_id(mut self, id: impl Into<String>) -> Self {
        self.inner.correlation_id = Some(id.into());
        self
    }

    /// Finish the descriptor.
    ///
    /// A body on GET/HEAD/OPTIONS is logged and flagged but kept: the
    /// request is still sent as built.
    pub fn build(mut self) -> RequestDescriptor {
        if self.inner.method.expects_empty_body() && !self.inner.body.is_empty() {
            warn!(
                method = %self.inner.method,
                path = %self.inner.path,
                "request body attached to a method that does not expect one"
            );
            self.inner.body_warning = true;
        }

        if self.inner.method == HttpMethod::Upload && self.inner.correlation_id.is_none() {
            self.inner.correlation_id = Some(Uuid::new_v4().to_string());
        }

        self.inner
    }
}

/// A descriptor after URL resolution and credential attachment; the only
/// input the transport sees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
    pub correlation_id: Option<String>,
}

impl ResolvedRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}
