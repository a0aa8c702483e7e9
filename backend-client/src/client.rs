use std::fmt;
use std::sync::Arc;

use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use reqwest::header::AUTHORIZATION;
use reqwest::header::CONTENT_TYPE;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderName;
use reqwest::header::HeaderValue;
use reqwest::header::USER_AGENT;
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use taskboard_login::TokenStore;
use tracing::debug;
use tracing::error;
use tracing::warn;

use crate::error::ApiError;
use crate::error::Result;
use crate::notify::Notification;
use crate::notify::Notifier;
use crate::notify::TracingNotifier;
use crate::request::Attempt;
use crate::request::Method;
use crate::request::RequestOptions;

pub const REFRESH_ENDPOINT: &str = "/auth/refresh/";

const DEFAULT_USER_AGENT: &str = "taskboard-cli";

/// How concurrent 401-triggered refreshes interact.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshStrategy {
    /// Refreshes run one at a time. A request that was rejected with a token
    /// that has since been replaced reuses the replacement instead of
    /// refreshing again.
    #[default]
    Coalesced,
    /// Every rejected request runs its own refresh.
    Independent,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access: String,
    #[serde(default)]
    refresh: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<String>,
}

/// A request resolved to its URL, headers and serialized body. Resending
/// after a refresh reuses it unchanged apart from the bearer credential.
pub(crate) struct PreparedRequest {
    pub(crate) method: Method,
    pub(crate) url: String,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Option<Vec<u8>>,
}

/// HTTP client for the taskboard REST API.
///
/// Authenticated requests carry the stored access token; a 401 triggers one
/// token refresh followed by one resend.
#[derive(Clone)]
pub struct Client {
    base_url: String,
    http: reqwest::Client,
    pub(crate) store: Arc<dyn TokenStore>,
    notifier: Arc<dyn Notifier>,
    user_agent: Option<HeaderValue>,
    refresh_strategy: RefreshStrategy,
    refresh_gate: Arc<tokio::sync::Mutex<()>>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("refresh_strategy", &self.refresh_strategy)
            .finish_non_exhaustive()
    }
}

impl Client {
    pub fn new(base_url: impl Into<String>, store: Arc<dyn TokenStore>) -> Result<Self> {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            base_url,
            http,
            store,
            notifier: Arc::new(TracingNotifier),
            user_agent: None,
            refresh_strategy: RefreshStrategy::default(),
            refresh_gate: Arc::new(tokio::sync::Mutex::new(())),
        })
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_user_agent(mut self, ua: impl Into<String>) -> Self {
        if let Ok(hv) = HeaderValue::from_str(&ua.into()) {
            self.user_agent = Some(hv);
        }
        self
    }

    pub fn with_refresh_strategy(mut self, strategy: RefreshStrategy) -> Self {
        self.refresh_strategy = strategy;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token_store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    pub(crate) fn url(&self, endpoint: &str) -> String {
        if endpoint.starts_with('/') {
            format!("{}{endpoint}", self.base_url)
        } else {
            format!("{}/{endpoint}", self.base_url)
        }
    }

    fn default_headers(&self) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        h.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(ua) = &self.user_agent {
            h.insert(USER_AGENT, ua.clone());
        } else {
            h.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
        }
        h
    }

    pub(crate) fn prepare(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<&serde_json::Value>,
        options: &RequestOptions,
    ) -> Result<PreparedRequest> {
        let mut headers = self.default_headers();
        for (name, value) in &options.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ApiError::invalid_header(name, e))?;
            let header_value =
                HeaderValue::from_str(value).map_err(|e| ApiError::invalid_header(name, e))?;
            headers.insert(header_name, header_value);
        }
        let body = match body {
            Some(body) if method.carries_body() => Some(serde_json::to_vec(body)?),
            _ => None,
        };
        Ok(PreparedRequest {
            method,
            url: self.url(endpoint),
            headers,
            body,
        })
    }

    pub(crate) async fn send(
        &self,
        request: &PreparedRequest,
        bearer_token: Option<&str>,
    ) -> Result<reqwest::Response> {
        let mut headers = request.headers.clone();
        if let Some(token) = bearer_token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| ApiError::invalid_header(AUTHORIZATION.as_str(), e))?;
            headers.insert(AUTHORIZATION, value);
        }
        let mut req = self
            .http
            .request(request.method.to_reqwest(), &request.url)
            .headers(headers);
        if let Some(body) = &request.body {
            req = req.body(body.clone());
        }
        debug!(method = %request.method, url = %request.url, "sending request");
        req.send().await.map_err(|err| {
            error!(method = %request.method, url = %request.url, "request failed to send: {err}");
            ApiError::Transport(err)
        })
    }

    /// Perform one logical request.
    ///
    /// Returns `Ok(None)` for `204 No Content` and for every successful
    /// `DELETE`; the body is not read in either case. Otherwise the JSON body
    /// is decoded into `T`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<&serde_json::Value>,
        options: &RequestOptions,
    ) -> Result<Option<T>> {
        let response = self.execute(endpoint, method, body, options).await?;
        let status = response.status();
        if status == StatusCode::NO_CONTENT || method == Method::Delete {
            return Ok(None);
        }

        let bytes = response.bytes().await?;
        match serde_json::from_slice::<T>(&bytes) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                error!(
                    endpoint,
                    status = status.as_u16(),
                    "could not decode response body: {err}"
                );
                Err(ApiError::Decode(err))
            }
        }
    }

    /// POST to an action endpoint whose reply carries no meaningful body.
    ///
    /// Same authentication and retry rules as [`Client::request`], but any
    /// success status is enough; the body is never decoded.
    pub async fn post_action(&self, endpoint: &str, body: &serde_json::Value) -> Result<()> {
        self.execute(endpoint, Method::Post, Some(body), &RequestOptions::default())
            .await
            .map(|_| ())
    }

    /// Send with credentials, refreshing and resending once on a 401.
    /// Returns the final response only when its status is a success.
    async fn execute(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<&serde_json::Value>,
        options: &RequestOptions,
    ) -> Result<reqwest::Response> {
        let mut token = None;
        if options.requires_auth {
            match self.store.access_token() {
                Some(t) => token = Some(t),
                None => {
                    warn!(endpoint, "no access token stored, request not sent");
                    self.notifier.notify(Notification::AuthorizationRequired);
                    return Err(ApiError::Unauthenticated);
                }
            }
        }
        let prepared = self.prepare(endpoint, method, body, options)?;

        let mut attempt = Attempt::Sent;
        let mut response = self.send(&prepared, token.as_deref()).await?;
        if attempt.should_refresh(response.status(), options.requires_auth) {
            debug!(endpoint, "access token rejected, refreshing");
            let new_token = if self.refresh_after_rejection(token.as_deref()).await {
                self.store.access_token()
            } else {
                None
            };
            let Some(new_token) = new_token else {
                warn!(endpoint, status = 401, "token refresh failed, giving up");
                self.notifier.notify(Notification::SessionExpired);
                return Err(ApiError::AuthenticationFailed);
            };
            attempt = Attempt::RetriedAfterRefresh;
            response = self.send(&prepared, Some(&new_token)).await?;
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            let err = error_for_status(endpoint, status, &body);
            warn!(
                endpoint,
                status = status.as_u16(),
                ?attempt,
                "request failed: {err}"
            );
            return Err(err);
        }
        Ok(response)
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<Option<T>> {
        self.request(endpoint, Method::Get, None, &RequestOptions::default())
            .await
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &serde_json::Value,
    ) -> Result<Option<T>> {
        self.request(endpoint, Method::Post, Some(body), &RequestOptions::default())
            .await
    }

    pub async fn put<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &serde_json::Value,
    ) -> Result<Option<T>> {
        self.request(endpoint, Method::Put, Some(body), &RequestOptions::default())
            .await
    }

    pub async fn patch<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &serde_json::Value,
    ) -> Result<Option<T>> {
        self.request(endpoint, Method::Patch, Some(body), &RequestOptions::default())
            .await
    }

    pub async fn delete(&self, endpoint: &str) -> Result<()> {
        self.request::<serde_json::Value>(endpoint, Method::Delete, None, &RequestOptions::default())
            .await
            .map(|_| ())
    }

    /// Exchange the stored refresh token for a new access token.
    ///
    /// Returns `false` without touching the network when no refresh token is
    /// stored. Any other failure clears the stored tokens.
    pub async fn refresh(&self) -> bool {
        match self.refresh_strategy {
            RefreshStrategy::Independent => self.refresh_tokens().await,
            RefreshStrategy::Coalesced => {
                let _gate = self.refresh_gate.lock().await;
                self.refresh_tokens().await
            }
        }
    }

    async fn refresh_after_rejection(&self, rejected_token: Option<&str>) -> bool {
        match self.refresh_strategy {
            RefreshStrategy::Independent => self.refresh_tokens().await,
            RefreshStrategy::Coalesced => {
                let _gate = self.refresh_gate.lock().await;
                match self.store.access_token() {
                    Some(current) if Some(current.as_str()) != rejected_token => {
                        debug!("access token already refreshed by a concurrent request");
                        true
                    }
                    // A concurrent refresh failed and cleared the credentials.
                    None => false,
                    Some(_) => self.refresh_tokens().await,
                }
            }
        }
    }

    async fn refresh_tokens(&self) -> bool {
        let Some(refresh_token) = self.store.refresh_token() else {
            debug!("no refresh token stored, skipping refresh");
            return false;
        };
        match self.exchange_refresh_token(&refresh_token).await {
            Ok(()) => true,
            Err(err) => {
                warn!(endpoint = REFRESH_ENDPOINT, "token refresh failed: {err}");
                if let Err(err) = self.store.clear_tokens() {
                    error!("failed to clear stored tokens: {err}");
                }
                false
            }
        }
    }

    async fn exchange_refresh_token(&self, refresh_token: &str) -> Result<()> {
        let payload = serde_json::to_value(RefreshRequest {
            refresh: refresh_token,
        })?;
        let prepared = self.prepare(
            REFRESH_ENDPOINT,
            Method::Post,
            Some(&payload),
            &RequestOptions::public(),
        )?;
        let res = self.send(&prepared, None).await?;
        let status = res.status();
        if !status.is_success() {
            return Err(ApiError::RequestFailed {
                status: status.as_u16(),
                message: format!("token refresh rejected with status {}", status.as_u16()),
            });
        }
        let bytes = res.bytes().await?;
        let body: RefreshResponse = serde_json::from_slice(&bytes)?;
        self.store.update_tokens(body.access, body.refresh)?;
        debug!("access token refreshed");
        Ok(())
    }
}

/// Map a non-success status to an error, using the backend's `detail`
/// message for statuses without a dedicated variant.
pub(crate) fn error_for_status(endpoint: &str, status: StatusCode, body: &[u8]) -> ApiError {
    match status {
        StatusCode::NOT_FOUND => ApiError::NotFound {
            endpoint: endpoint.to_string(),
        },
        StatusCode::FORBIDDEN => ApiError::Forbidden,
        StatusCode::INTERNAL_SERVER_ERROR => ApiError::ServerError,
        _ => ApiError::RequestFailed {
            status: status.as_u16(),
            message: detail_message(body)
                .unwrap_or_else(|| format!("request failed with status {}", status.as_u16())),
        },
    }
}

pub(crate) fn detail_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail)
        .filter(|d| !d.is_empty())
}
