//! Request model, transport seam, and the typed Maileon API client
//!
//! [`MaileonClient`] knows the endpoints and how to read their responses;
//! a [`Transport`] knows how to move an [`ApiRequest`] over the wire. The
//! production transport is [`HttpTransport`] (reqwest); tests use the
//! recording `MockTransport` from the `test-support` feature.

use crate::error::MaileonError;
use crate::fields::FieldSchema;
use crate::schema;
use crate::types::{ContactIdentity, Webhook, WebhookEvent};
use serde_json::{Value, json};
use std::fmt;
use std::future::Future;
use tracing::debug;

/// Default base of the Maileon REST API
pub const DEFAULT_API_BASE: &str = "https://api.maileon.com/1.0";

/// Best-effort usage heartbeat, called once per node invocation
pub const DEFAULT_HEARTBEAT_URL: &str =
    "https://integrations.maileon.com/xsic/ext/n8n/heartbeat.php";

/// Vendor JSON content type used for contact upserts
pub const MAILEON_JSON: &str = "application/vnd.maileon.api+json";
pub const APPLICATION_JSON: &str = "application/json";

pub mod endpoints {
    pub const PING: &str = "/ping";
    pub const CUSTOM_FIELDS: &str = "/contacts/fields/custom";
    pub const TRANSACTION_TYPES: &str = "/transactions/types";
    pub const TRANSACTIONS: &str = "/transactions";
    pub const WEBHOOKS: &str = "/webhooks";
}

/// Standard payload fields requested for every webhook registration
pub const WEBHOOK_STANDARD_FIELDS: [&str; 2] = ["email", "external_id"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Delete => "DELETE",
        })
    }
}

/// Where a request goes: a path under the API base or an absolute URL
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    Api(String),
    Absolute(String),
}

impl Target {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Api(path) | Self::Absolute(path) => path,
        }
    }
}

/// A fully described request, independent of the transport that sends it
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub target: Target,
    /// Query parameters in the order they are sent
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub content_type: Option<&'static str>,
    pub accept: Option<&'static str>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            target: Target::Api(path.into()),
            query: Vec::new(),
            body: None,
            content_type: None,
            accept: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn absolute(method: Method, url: impl Into<String>) -> Self {
        Self {
            target: Target::Absolute(url.into()),
            ..Self::new(method, String::new())
        }
    }

    pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    /// Attach a JSON body with the given content type
    pub fn json(mut self, body: Value, content_type: &'static str) -> Self {
        self.body = Some(body);
        self.content_type = Some(content_type);
        self
    }

    pub fn accept(mut self, accept: &'static str) -> Self {
        self.accept = Some(accept);
        self
    }

    pub fn path(&self) -> &str {
        self.target.as_str()
    }

    /// `application/x-www-form-urlencoded` rendering of the query
    pub fn query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query.iter())
            .finish()
    }

    /// Value of the first query parameter named `key`
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// A successful (2xx) response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Body as JSON: `{}` when empty, the raw text as a string when not JSON
    pub fn json_value(&self) -> Value {
        if self.body.trim().is_empty() {
            return json!({});
        }
        serde_json::from_str(&self.body).unwrap_or_else(|_| Value::String(self.body.clone()))
    }

    /// Body parsed strictly as JSON
    pub fn parse_json(&self, what: &'static str) -> Result<Value, MaileonError> {
        serde_json::from_str(&self.body).map_err(|e| MaileonError::Schema {
            what,
            message: e.to_string(),
            source: Some(Box::new(e)),
        })
    }
}

/// Moves requests to the API. Non-2xx responses must come back as
/// [`MaileonError::Api`] with the body verbatim; no retries.
///
/// Futures must be `Send` so the client can run on a multi-threaded runtime.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: ApiRequest,
    ) -> impl Future<Output = Result<ApiResponse, MaileonError>> + Send;
}

/// reqwest-backed transport using HTTP Basic auth with the API key as username
pub struct HttpTransport {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl HttpTransport {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self, MaileonError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("maileon-connector/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MaileonError::Http {
                message: format!("failed to create HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, target: &Target) -> String {
        match target {
            Target::Api(path) => format!("{}{}", self.base_url, path),
            Target::Absolute(url) => url.clone(),
        }
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, MaileonError> {
        let url = self.url(&request.target);
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Delete => reqwest::Method::DELETE,
        };

        debug!("{} {}", request.method, url);

        let mut builder = self
            .http
            .request(method, &url)
            .basic_auth(&self.api_key, Option::<&str>::None);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(accept) = request.accept {
            builder = builder.header(reqwest::header::ACCEPT, accept);
        }
        if let Some(body) = &request.body {
            let bytes = serde_json::to_vec(body).map_err(|e| MaileonError::Http {
                message: format!("failed to encode request body: {e}"),
                source: Some(Box::new(e)),
            })?;
            builder = builder
                .header(
                    reqwest::header::CONTENT_TYPE,
                    request.content_type.unwrap_or(APPLICATION_JSON),
                )
                .body(bytes);
        }

        let response = builder.send().await.map_err(|e| MaileonError::Http {
            message: format!("{} {url}: {e}", request.method),
            source: Some(Box::new(e)),
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| MaileonError::Http {
            message: format!("failed to read response from {url}: {e}"),
            source: Some(Box::new(e)),
        })?;

        if !status.is_success() {
            return Err(MaileonError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(ApiResponse::new(status.as_u16(), body))
    }
}

/// Typed access to the Maileon endpoints used by the connector
#[derive(Debug, Clone)]
pub struct MaileonClient<T> {
    transport: T,
    heartbeat_url: Option<String>,
}

impl<T: Transport> MaileonClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            heartbeat_url: Some(DEFAULT_HEARTBEAT_URL.to_string()),
        }
    }

    /// Override or disable (`None`) the invocation heartbeat
    pub fn with_heartbeat_url(mut self, url: Option<String>) -> Self {
        self.heartbeat_url = url;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, MaileonError> {
        self.transport.send(request).await
    }

    /// Credential test: succeeds iff `GET /ping` answers 2xx
    pub async fn ping(&self) -> Result<(), MaileonError> {
        self.send(ApiRequest::get(endpoints::PING)).await.map(|_| ())
    }

    /// Fire-and-forget usage heartbeat; every failure is swallowed
    pub async fn heartbeat(&self) {
        let Some(url) = &self.heartbeat_url else {
            return;
        };
        let request = ApiRequest::absolute(Method::Get, url.clone()).accept(APPLICATION_JSON);
        if let Err(e) = self.send(request).await {
            debug!("Heartbeat failed (ignored): {e}");
        }
    }

    /// Custom contact fields defined for the account
    pub async fn custom_fields(&self) -> Result<FieldSchema, MaileonError> {
        let response = self.send(ApiRequest::get(endpoints::CUSTOM_FIELDS)).await?;
        schema::parse_custom_fields(&response.body)
    }

    /// Names of all transaction (event) types
    pub async fn transaction_types(&self) -> Result<Vec<String>, MaileonError> {
        let response = self.send(ApiRequest::get(endpoints::TRANSACTION_TYPES)).await?;
        schema::parse_transaction_types(&response.body)
    }

    /// Attribute schema of one transaction type
    pub async fn transaction_type(&self, name: &str) -> Result<FieldSchema, MaileonError> {
        let path = format!(
            "{}/{}",
            endpoints::TRANSACTION_TYPES,
            urlencoding::encode(name)
        );
        let response = self.send(ApiRequest::get(path)).await?;
        schema::parse_transaction_type(&response.body)
    }

    /// Submit a batch of transactions.
    ///
    /// The body is read leniently (see [`ApiResponse::json_value`]); the
    /// caller decides whether it acknowledges the batch.
    pub async fn send_transactions(&self, batch: Value) -> Result<Value, MaileonError> {
        let request = ApiRequest::post(endpoints::TRANSACTIONS)
            .json(batch, APPLICATION_JSON)
            .accept(APPLICATION_JSON);
        Ok(self.send(request).await?.json_value())
    }

    /// `DELETE /contacts/{identity}/unsubscribe[?mailingId=..]`
    pub async fn unsubscribe(
        &self,
        identity: &ContactIdentity,
        mailing_id: Option<&str>,
    ) -> Result<ApiResponse, MaileonError> {
        let mut request = ApiRequest::delete(format!("{}/unsubscribe", identity.path()));
        if let Some(mailing_id) = mailing_id.filter(|m| !m.is_empty()) {
            request = request.query("mailingId", mailing_id);
        }
        self.send(request).await
    }

    /// All webhooks registered for the account
    pub async fn list_webhooks(&self) -> Result<Vec<Webhook>, MaileonError> {
        let request = ApiRequest::get(endpoints::WEBHOOKS).accept(APPLICATION_JSON);
        let response = self.send(request).await?;
        let listed = response.parse_json("webhook list")?;
        let entries = match listed {
            Value::Array(entries) => entries,
            Value::Object(ref map) => match map.get("webhooks") {
                Some(Value::Array(entries)) => entries.clone(),
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };
        Ok(entries.iter().filter_map(Webhook::from_json).collect())
    }

    /// Register a webhook and return its remote id
    pub async fn create_webhook(
        &self,
        event: WebhookEvent,
        url: &str,
    ) -> Result<String, MaileonError> {
        let body = json!({
            "event": event.as_str(),
            "url": url,
            "standardFields": WEBHOOK_STANDARD_FIELDS,
        });
        let request = ApiRequest::post(endpoints::WEBHOOKS)
            .json(body, APPLICATION_JSON)
            .accept(APPLICATION_JSON);
        let response = self.send(request).await?;
        let created = response.parse_json("webhook registration")?;

        match created.get("id") {
            Some(Value::String(id)) => Ok(id.clone()),
            Some(Value::Number(id)) => Ok(id.to_string()),
            _ => Err(MaileonError::Response {
                message: format!("webhook registration returned no id: {}", response.body),
            }),
        }
    }

    pub async fn delete_webhook(&self, id: &str) -> Result<(), MaileonError> {
        let path = format!("{}/{}", endpoints::WEBHOOKS, urlencoding::encode(id));
        self.send(ApiRequest::delete(path).accept(APPLICATION_JSON))
            .await
            .map(|_| ())
    }
}
