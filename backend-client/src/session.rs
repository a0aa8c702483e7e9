use reqwest::StatusCode;
use serde::Deserialize;
use serde::Serialize;
use taskboard_login::TokenPair;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::Client;
use crate::client::detail_message;
use crate::error::ApiError;
use crate::error::Result;
use crate::request::Method;
use crate::request::RequestOptions;

pub const LOGIN_ENDPOINT: &str = "/auth/login/";
pub const LOGOUT_ENDPOINT: &str = "/auth/logout/";

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    access: String,
    refresh: String,
}

impl Client {
    /// Exchange a username and password for a credential pair and store it.
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        let payload = serde_json::to_value(LoginRequest { username, password })?;
        let prepared = self.prepare(
            LOGIN_ENDPOINT,
            Method::Post,
            Some(&payload),
            &RequestOptions::public(),
        )?;
        let res = self.send(&prepared, None).await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.bytes().await.unwrap_or_default();
            let message = detail_message(&body).unwrap_or_else(|| "authentication error".to_string());
            warn!(
                endpoint = LOGIN_ENDPOINT,
                status = status.as_u16(),
                "login rejected: {message}"
            );
            return Err(ApiError::LoginFailed(message));
        }
        let bytes = res.bytes().await?;
        let tokens: LoginResponse = serde_json::from_slice(&bytes)?;
        self.store.store_login(
            username,
            TokenPair {
                access_token: tokens.access,
                refresh_token: tokens.refresh,
            },
        )?;
        info!(username, "logged in");
        Ok(())
    }

    /// Tell the backend the session is over, then forget local credentials.
    ///
    /// The backend call is best effort: its failure is logged and local
    /// credentials are cleared regardless.
    pub async fn logout(&self) -> Result<()> {
        if let Some(token) = self.store.access_token() {
            match self.notify_logout(&token).await {
                Ok(status) if status.is_success() || status == StatusCode::UNAUTHORIZED => {
                    debug!(status = status.as_u16(), "logout acknowledged");
                }
                Ok(status) => {
                    warn!(
                        endpoint = LOGOUT_ENDPOINT,
                        status = status.as_u16(),
                        "logout call failed, clearing local credentials anyway"
                    );
                }
                Err(err) => {
                    warn!(
                        endpoint = LOGOUT_ENDPOINT,
                        "logout call failed, clearing local credentials anyway: {err}"
                    );
                }
            }
        }
        self.store.clear()?;
        Ok(())
    }

    async fn notify_logout(&self, token: &str) -> Result<StatusCode> {
        let prepared = self.prepare(
            LOGOUT_ENDPOINT,
            Method::Post,
            None,
            &RequestOptions::default(),
        )?;
        let res = self.send(&prepared, Some(token)).await?;
        Ok(res.status())
    }

    /// Display name stored at login, if any.
    pub fn current_user(&self) -> Option<String> {
        self.store.username()
    }

    pub fn is_logged_in(&self) -> bool {
        self.store.access_token().is_some()
    }
}
