//! Shared HTTP plumbing: base URL, bearer auth, timeouts and envelope decoding.

use std::time::Duration;

use domain::models::{ApiEnvelope, Session};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::error::ClientError;
use crate::metrics::RequestTimer;

fn default_timeout_ms() -> u64 {
    15_000
}

/// Connection settings for the remote API.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to, e.g.
    /// `https://attendance.example.com/api/v1`.
    pub base_url: String,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Body of a non-2xx answer. Only the message is of interest.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Client for the remote attendance API.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    timeout_ms: u64,
}

impl ApiClient {
    /// Create a new API client.
    pub fn new(config: &ApiConfig) -> Result<Self, ClientError> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientError::InvalidBaseUrl(config.base_url.clone()));
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base_url,
            timeout_ms: config.timeout_ms,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(method = %method, url = %url, "Calling remote API");
        self.client.request(method, url)
    }

    fn authorized(
        &self,
        method: Method,
        path: &str,
        session: &Session,
    ) -> Result<RequestBuilder, ClientError> {
        let token = session.token().ok_or(ClientError::NotAuthenticated)?;
        Ok(self.request(method, path).bearer_auth(token))
    }

    /// Authenticated `GET` returning the envelope payload.
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        path: &str,
        session: &Session,
    ) -> Result<T, ClientError> {
        let request = self.authorized(Method::GET, path, session)?;
        self.fetch(endpoint, request).await
    }

    /// Authenticated `POST` returning the envelope payload.
    pub(crate) async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        path: &str,
        body: &B,
        session: &Session,
    ) -> Result<T, ClientError> {
        let request = self.authorized(Method::POST, path, session)?.json(body);
        self.fetch(endpoint, request).await
    }

    /// `POST` whose payload is ignored; returns the server message.
    ///
    /// Without a session the request is sent unauthenticated.
    pub(crate) async fn post_ack<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        path: &str,
        body: &B,
        session: Option<&Session>,
    ) -> Result<Option<String>, ClientError> {
        let request = match session {
            Some(session) => self.authorized(Method::POST, path, session)?,
            None => self.request(Method::POST, path),
        };
        self.acknowledge(endpoint, request.json(body)).await
    }

    /// Authenticated `DELETE`; returns the server message.
    pub(crate) async fn delete_ack(
        &self,
        endpoint: &str,
        path: &str,
        session: &Session,
    ) -> Result<Option<String>, ClientError> {
        let request = self.authorized(Method::DELETE, path, session)?;
        self.acknowledge(endpoint, request).await
    }

    /// Unauthenticated `POST` returning the envelope payload.
    pub(crate) async fn post_public<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let request = self.request(Method::POST, path).json(body);
        self.fetch(endpoint, request).await
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: RequestBuilder,
    ) -> Result<T, ClientError> {
        let envelope: ApiEnvelope<T> = self.execute(endpoint, request).await?;
        envelope.into_data().map_err(|e| {
            let err = ClientError::from(e);
            warn!(endpoint = endpoint, error = %err, "Remote API rejected request");
            err
        })
    }

    async fn acknowledge(
        &self,
        endpoint: &str,
        request: RequestBuilder,
    ) -> Result<Option<String>, ClientError> {
        let envelope: ApiEnvelope<serde_json::Value> = self.execute(endpoint, request).await?;
        envelope.into_ack().map_err(|e| {
            let err = ClientError::from(e);
            warn!(endpoint = endpoint, error = %err, "Remote API rejected request");
            err
        })
    }

    /// Sends the request and decodes the envelope, recording metrics.
    async fn execute<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: RequestBuilder,
    ) -> Result<ApiEnvelope<T>, ClientError> {
        let timer = RequestTimer::new(endpoint);
        let result = self.send(request).await;

        let succeeded = matches!(&result, Ok(envelope) if envelope.success);
        timer.finish(succeeded);

        if let Err(e) = &result {
            match e {
                ClientError::Status { .. } => {
                    warn!(endpoint = endpoint, error = %e, "Remote API error")
                }
                _ => error!(endpoint = endpoint, error = %e, "Remote API call failed"),
            }
        }
        result
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<ApiEnvelope<T>, ClientError> {
        let response = request.send().await.map_err(|e| self.map_transport(e))?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| self.map_transport(e))?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.message);
            return Err(ClientError::Status {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&body).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    fn map_transport(&self, e: reqwest::Error) -> ClientError {
        if e.is_timeout() {
            ClientError::Timeout(self.timeout_ms)
        } else {
            ClientError::Http(e)
        }
    }
}
