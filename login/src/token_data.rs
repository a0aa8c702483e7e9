use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Access/refresh credential pair issued by the backend. Both values are
/// opaque to the client.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived bearer credential attached to authenticated requests.
    pub access_token: String,
    /// Longer-lived credential used only against the refresh endpoint.
    pub refresh_token: String,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

/// Everything persisted for a signed-in user.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAuth {
    /// Display name captured at login time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<TokenPair>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_refresh: Option<DateTime<Utc>>,
}

impl StoredAuth {
    pub fn access_token(&self) -> Option<&str> {
        self.tokens.as_ref().map(|t| t.access_token.as_str())
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.tokens.as_ref().map(|t| t.refresh_token.as_str())
    }

    /// Replace the credential pair after a refresh. The refresh token is kept
    /// when the backend did not issue a new one.
    ///
    /// Returns `None` when there is no prior pair to refresh against and no
    /// refresh token was supplied.
    pub(crate) fn with_refreshed_tokens(
        mut self,
        access_token: String,
        refresh_token: Option<String>,
    ) -> Option<Self> {
        let refresh_token = refresh_token.or_else(|| self.refresh_token().map(str::to_string))?;
        self.tokens = Some(TokenPair {
            access_token,
            refresh_token,
        });
        self.last_refresh = Some(Utc::now());
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn refreshed_tokens_keep_existing_refresh_token() {
        let auth = StoredAuth {
            username: Some("alice".to_string()),
            tokens: Some(TokenPair::new("A1", "R1")),
            last_refresh: None,
        };

        let refreshed = auth
            .with_refreshed_tokens("A2".to_string(), None)
            .unwrap_or_default();

        assert_eq!(refreshed.tokens, Some(TokenPair::new("A2", "R1")));
        assert_eq!(refreshed.username.as_deref(), Some("alice"));
        assert!(refreshed.last_refresh.is_some());
    }

    #[test]
    fn refreshed_tokens_without_any_refresh_token_is_rejected() {
        let refreshed = StoredAuth::default().with_refreshed_tokens("A2".to_string(), None);
        assert_eq!(refreshed, None);
    }

    #[test]
    fn serialized_shape_omits_empty_fields() {
        let auth = StoredAuth {
            username: None,
            tokens: Some(TokenPair::new("a", "r")),
            last_refresh: None,
        };
        let value = serde_json::to_value(&auth).unwrap_or_default();
        assert_eq!(
            value,
            serde_json::json!({
                "tokens": { "access_token": "a", "refresh_token": "r" }
            })
        );
    }
}
