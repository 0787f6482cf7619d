use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::random;

/// Disambiguation hint flavours per RFC 7662 / RFC 7009
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenHintType {
    #[serde(rename = "access_token")]
    AccessToken,
    #[serde(rename = "refresh_token")]
    RefreshToken,
}

impl TokenHintType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "access_token" => Some(TokenHintType::AccessToken),
            "refresh_token" => Some(TokenHintType::RefreshToken),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenHintType::AccessToken => "access_token",
            TokenHintType::RefreshToken => "refresh_token",
        }
    }
}

/// A (token, token_type_hint) pair used to direct store lookups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHint {
    pub token: String,
    pub hint: Option<TokenHintType>,
}

impl TokenHint {
    pub fn new(token: &str, hint: Option<TokenHintType>) -> Self {
        Self {
            token: token.to_string(),
            hint,
        }
    }

    pub fn access(token: &str) -> Self {
        Self::new(token, Some(TokenHintType::AccessToken))
    }

    pub fn refresh(token: &str) -> Self {
        Self::new(token, Some(TokenHintType::RefreshToken))
    }
}

/// The party a token pair is bound to
///
/// Client-credentials grants make the client its own resource owner, so
/// bindings live either on an owner or on a client. The binding store keys
/// its entries by this variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenHolder {
    Owner(Uuid),
    Client(Uuid),
}

/// Inputs assembled per grant type before any token is minted
#[derive(Debug, Clone)]
pub struct AccessTokenOptions {
    pub client_id: Uuid,
    pub owner_id: Uuid,
    pub scope: String,
    pub state: Option<String>,
    pub add_refresh_token: bool,
}

/// An issued access or refresh token
///
/// Access and refresh tokens share this shape and a single store keyspace;
/// `hint_type` tells them apart and `parent_token` links a refresh token to
/// the access token it can renew.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUnit {
    pub token: String,
    pub hint_type: TokenHintType,
    pub active: bool,
    pub client_id: Uuid,
    pub owner_id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub not_before: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub scope: String,
    pub state: Option<String>,
    pub parent_token: Option<String>,
}

/// Bearer is the only token type this engine emits
pub const TOKEN_TYPE_BEARER: &str = "Bearer";

impl TokenUnit {
    /// Mint an access token and, when requested, a refresh token bound to it
    pub fn new_set(
        opt: &AccessTokenOptions,
        access_duration: Duration,
        refresh_duration: Duration,
    ) -> (TokenUnit, Option<TokenUnit>) {
        let now = Utc::now();
        let access = TokenUnit {
            token: random::token(),
            hint_type: TokenHintType::AccessToken,
            active: true,
            client_id: opt.client_id,
            owner_id: opt.owner_id,
            issued_at: now,
            not_before: now,
            expires_at: now + access_duration,
            scope: opt.scope.clone(),
            state: opt.state.clone(),
            parent_token: None,
        };

        if !opt.add_refresh_token {
            return (access, None);
        }

        let refresh = TokenUnit {
            token: random::token(),
            hint_type: TokenHintType::RefreshToken,
            active: true,
            client_id: opt.client_id,
            owner_id: opt.owner_id,
            issued_at: now,
            not_before: now,
            expires_at: now + refresh_duration,
            scope: opt.scope.clone(),
            state: opt.state.clone(),
            parent_token: Some(access.token.clone()),
        };

        (access, Some(refresh))
    }

    /// Mint a fresh refresh token bound to an existing access token
    pub fn new_refresh_for(access: &TokenUnit, refresh_duration: Duration) -> TokenUnit {
        let now = Utc::now();
        TokenUnit {
            token: random::token(),
            hint_type: TokenHintType::RefreshToken,
            active: true,
            client_id: access.client_id,
            owner_id: access.owner_id,
            issued_at: now,
            not_before: now,
            expires_at: now + refresh_duration,
            scope: access.scope.clone(),
            state: access.state.clone(),
            parent_token: Some(access.token.clone()),
        }
    }

    /// Whether `now` falls within [not_before, expires_at)
    pub fn in_time_window(&self, now: DateTime<Utc>) -> bool {
        now >= self.not_before && now < self.expires_at
    }

    /// Seconds until expiry, floored at zero
    pub fn expires_in(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at.timestamp() - now.timestamp()).max(0)
    }

    pub fn hint(&self) -> TokenHint {
        TokenHint::new(&self.token, Some(self.hint_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(add_refresh: bool) -> AccessTokenOptions {
        AccessTokenOptions {
            client_id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            scope: "read write".to_string(),
            state: None,
            add_refresh_token: add_refresh,
        }
    }

    #[test]
    fn test_new_set_without_refresh() {
        let (access, refresh) = TokenUnit::new_set(
            &options(false),
            Duration::hours(1),
            Duration::hours(24),
        );
        assert_eq!(access.hint_type, TokenHintType::AccessToken);
        assert_eq!(access.token.len(), random::TOKEN_LENGTH);
        assert!(access.parent_token.is_none());
        assert!(refresh.is_none());
    }

    #[test]
    fn test_new_set_links_refresh_to_access() {
        let (access, refresh) = TokenUnit::new_set(
            &options(true),
            Duration::hours(1),
            Duration::hours(24),
        );
        let refresh = refresh.unwrap();
        assert_eq!(refresh.hint_type, TokenHintType::RefreshToken);
        assert_eq!(refresh.parent_token.as_deref(), Some(access.token.as_str()));
        assert_eq!(refresh.scope, access.scope);
        assert!(refresh.expires_at > access.expires_at);
    }

    #[test]
    fn test_new_refresh_for_keeps_access_identity() {
        let (access, _) = TokenUnit::new_set(
            &options(false),
            Duration::hours(1),
            Duration::hours(24),
        );
        let rotated = TokenUnit::new_refresh_for(&access, Duration::hours(24));
        assert_eq!(rotated.client_id, access.client_id);
        assert_eq!(rotated.owner_id, access.owner_id);
        assert_eq!(rotated.parent_token.as_deref(), Some(access.token.as_str()));
        assert_ne!(rotated.token, access.token);
    }

    #[test]
    fn test_time_window() {
        let (access, _) = TokenUnit::new_set(
            &options(false),
            Duration::hours(1),
            Duration::hours(24),
        );
        assert!(access.in_time_window(Utc::now()));
        assert!(!access.in_time_window(Utc::now() + Duration::hours(2)));
        assert!(!access.in_time_window(Utc::now() - Duration::seconds(5)));
    }

    #[test]
    fn test_expires_in_floors_at_zero() {
        let (access, _) = TokenUnit::new_set(
            &options(false),
            Duration::hours(1),
            Duration::hours(24),
        );
        assert!(access.expires_in(Utc::now()) <= 3600);
        assert_eq!(access.expires_in(Utc::now() + Duration::hours(2)), 0);
    }

    #[test]
    fn test_hint_type_parse() {
        assert_eq!(TokenHintType::parse("access_token"), Some(TokenHintType::AccessToken));
        assert_eq!(TokenHintType::parse("refresh_token"), Some(TokenHintType::RefreshToken));
        assert!(TokenHintType::parse("id_token").is_none());
    }
}
