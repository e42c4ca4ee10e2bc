use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};

use care_types::AuthToken;
use reqwest::{Method, RequestBuilder, Url};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};

/// Whether an endpoint needs the bearer token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Public,
    Secure,
}

/// Thin JSON client for the PlanetCare backend.
///
/// Paths are given as segments so emails and ids are percent-encoded.
/// Secure calls carry `Authorization: Bearer <token>` and fail with
/// [`ApiError::AuthRequired`] without touching the network when no token is set.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Arc<RwLock<Option<AuthToken>>>,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.clone(),
            token: Arc::new(RwLock::new(None)),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_token(&self, token: Option<AuthToken>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    pub fn token(&self) -> Option<AuthToken> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub async fn get<S: AsRef<str>>(&self, segments: &[S], access: Access) -> ApiResult<Value> {
        self.send(Method::GET, segments, None, access).await
    }

    pub async fn post<S, B>(&self, segments: &[S], body: &B, access: Access) -> ApiResult<Value>
    where
        S: AsRef<str>,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body)?;
        self.send(Method::POST, segments, Some(body), access).await
    }

    pub async fn patch<S, B>(&self, segments: &[S], body: &B, access: Access) -> ApiResult<Value>
    where
        S: AsRef<str>,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body)?;
        self.send(Method::PATCH, segments, Some(body), access).await
    }

    pub async fn delete<S: AsRef<str>>(
        &self,
        segments: &[S],
        body: Option<Value>,
        access: Access,
    ) -> ApiResult<Value> {
        self.send(Method::DELETE, segments, body, access).await
    }

    pub fn url<S: AsRef<str>>(&self, segments: &[S]) -> ApiResult<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ApiError::NetworkFailure(format!("invalid base url {}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|()| ApiError::NetworkFailure(format!("base url {} cannot hold a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send<S: AsRef<str>>(
        &self,
        method: Method,
        segments: &[S],
        body: Option<Value>,
        access: Access,
    ) -> ApiResult<Value> {
        let url = self.url(segments)?;
        debug!(%method, %url, ?access, "api request");

        let mut request = self.http.request(method.clone(), url.clone());
        if access == Access::Secure {
            let Some(token) = self.token() else {
                warn!(%method, %url, "secure request without a session token");
                return Err(ApiError::AuthRequired { body: None });
            };
            request = request.bearer_auth(token.0);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let (status, text) = execute(request).await?;
        if !(200..300).contains(&status) {
            warn!(%method, %url, status, "api request failed");
        }
        decode_body(status, &text)
    }
}

// Browser fetch futures are !Send; they only ever run on the page's single thread.
fn execute(request: RequestBuilder) -> impl Future<Output = ApiResult<(u16, String)>> + Send {
    let exchange = async move {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::NetworkFailure(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::NetworkFailure(e.to_string()))?;
        Ok((status, text))
    };
    #[cfg(target_arch = "wasm32")]
    let exchange = send_wrapper::SendWrapper::new(exchange);
    exchange
}

fn decode_body(status: u16, text: &str) -> ApiResult<Value> {
    let parsed = if text.trim().is_empty() {
        Ok(Value::Null)
    } else {
        serde_json::from_str::<Value>(text)
    };

    if (200..300).contains(&status) {
        return parsed.map_err(ApiError::from);
    }

    let body = match parsed {
        Ok(Value::Null) => None,
        Ok(value) => Some(value),
        Err(_) => Some(Value::String(text.to_string())),
    };
    Err(ApiError::from_status(status, body))
}
