//! Request transport
//!
//! A [`Transport`] moves one [`ApiRequest`] to the server and hands back the
//! raw status and body. It knows nothing about sessions; credential handling
//! and refresh live in [`crate::client`] and [`crate::refresh`].

use async_trait::async_trait;
use board_core::{AuthError, ClientConfig, Credential, ErrorBody};
use reqwest::header::HeaderValue;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{ClientError, ClientResult};

/// One outgoing API call
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path below the API base, e.g. `/welcome`
    pub path: String,
    pub body: Option<Value>,
    /// Full `Authorization` header value, attached right before sending
    pub authorization: Option<String>,
    /// Whether a stale-session rejection may be refreshed and replayed
    pub refreshable: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            authorization: None,
            refreshable: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, path).with_body(body)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Attach the credential as a bearer header, or drop any header if there is none
    pub fn with_credential(mut self, credential: Option<&Credential>) -> Self {
        self.authorization = credential.and_then(Credential::authorization_header);
        self
    }

    /// Mark the request as never eligible for refresh-and-replay
    pub fn without_refresh(mut self) -> Self {
        self.refreshable = false;
        self
    }
}

/// Raw server answer
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

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> ClientResult<T> {
        serde_json::from_str(&self.body).map_err(|e| {
            ClientError::InvalidResponse(format!("Failed to decode response body: {}", e))
        })
    }

    /// Turn a failure status into the matching [`ClientError`]
    pub fn into_result(self) -> ClientResult<Self> {
        if self.is_success() {
            return Ok(self);
        }

        match serde_json::from_str::<ErrorBody>(&self.body) {
            Ok(body) => match body.kind() {
                Some(kind) => Err(ClientError::Rejected(kind)),
                None => Err(ClientError::Unexpected {
                    status: self.status,
                    message: body.message,
                }),
            },
            Err(_) => Err(ClientError::Unexpected {
                status: self.status,
                message: if self.body.is_empty() {
                    format!("HTTP {}", self.status)
                } else {
                    self.body
                },
            }),
        }
    }
}

/// Sends requests to the server
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> ClientResult<ApiResponse>;
}

/// Settings for [`HttpTransport`]
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Base URL including the `/api` prefix
    pub base_url: String,
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::from(&ClientConfig::default())
    }
}

impl From<&ClientConfig> for TransportConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            timeout_seconds: config.timeout_seconds,
            user_agent: config.user_agent.clone(),
        }
    }
}

impl TransportConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// HTTP transport backed by reqwest
pub struct HttpTransport {
    client: reqwest::Client,
    config: TransportConfig,
}

impl HttpTransport {
    pub fn new(config: TransportConfig) -> ClientResult<Self> {
        let client = create_http_client(&config)?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        let url = self.config.url(&request.path);
        debug!("{} {}", request.method, url);

        let mut builder = self.client.request(request.method, &url);
        if let Some(authorization) = &request.authorization {
            // Names may be non-ASCII; send the UTF-8 bytes as they are
            let value = HeaderValue::from_bytes(authorization.as_bytes()).map_err(|e| {
                warn!("Credential cannot be sent as a header: {}", e);
                ClientError::Rejected(AuthError::InvalidCredential)
            })?;
            builder = builder.header(reqwest::header::AUTHORIZATION, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(network_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(network_error)?;

        debug!("{} from {}", status, url);
        Ok(ApiResponse { status, body })
    }
}

fn network_error(error: reqwest::Error) -> ClientError {
    ClientError::NetworkUnavailable(error.to_string())
}

fn create_http_client(config: &TransportConfig) -> ClientResult<reqwest::Client> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::USER_AGENT,
        HeaderValue::from_str(&config.user_agent)
            .map_err(|e| ClientError::InvalidResponse(format!("Invalid user agent: {}", e)))?,
    );

    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .default_headers(headers)
        .build()
        .map_err(|e| ClientError::NetworkUnavailable(format!("Failed to create HTTP client: {}", e)))
}
