use chrono::Utc;
use dograte_core::ObjectId;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::infra::config::AuthConfig;

const MAX_RETAINED_KEYS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Hex user id.
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
    pub kind: TokenKind,
}

impl Claims {
    pub fn user_id(&self) -> Result<ObjectId, TokenError> {
        ObjectId::parse_str(&self.sub).map_err(|_| TokenError::Invalid)
    }

    pub fn is_expired(&self) -> bool {
        self.exp <= Utc::now().timestamp()
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token is malformed or signed with an unknown key")]
    Invalid,
    /// Signature was valid; the claims are kept so the caller can clean up.
    #[error("token has expired")]
    Expired(Claims),
    #[error("failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// JWT key manager for handling multiple keys during rotation
#[derive(Clone)]
pub struct JwtKeyManager {
    keys: Arc<Vec<String>>,
}

impl std::fmt::Debug for JwtKeyManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtKeyManager")
            .field("keys", &self.keys.len())
            .finish()
    }
}

impl JwtKeyManager {
    pub fn new(current_secret: impl Into<String>) -> Self {
        Self::with_previous(current_secret, &[])
    }

    /// Current key first, then retired keys that still verify.
    pub fn with_previous(current_secret: impl Into<String>, previous: &[String]) -> Self {
        let mut keys = vec![current_secret.into()];
        keys.extend(previous.iter().take(MAX_RETAINED_KEYS - 1).cloned());
        Self {
            keys: Arc::new(keys),
        }
    }

    pub fn get_current_key(&self) -> &str {
        &self.keys[0]
    }

    pub fn get_all_keys(&self) -> &[String] {
        &self.keys
    }
}

/// Issues and verifies access and refresh tokens.
#[derive(Debug, Clone)]
pub struct TokenService {
    keys: JwtKeyManager,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(keys: JwtKeyManager, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            keys,
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn from_config(auth: &AuthConfig) -> Self {
        Self::new(
            JwtKeyManager::with_previous(auth.jwt_secret.clone(), &auth.previous_jwt_secrets),
            auth.access_token_ttl,
            auth.refresh_token_ttl,
        )
    }

    pub fn access_token(&self, user: ObjectId) -> Result<String, TokenError> {
        self.issue(user, TokenKind::Access, self.access_ttl)
    }

    pub fn refresh_token(&self, user: ObjectId) -> Result<String, TokenError> {
        self.issue(user, TokenKind::Refresh, self.refresh_ttl)
    }

    fn issue(&self, user: ObjectId, kind: TokenKind, ttl: Duration) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            sub: user.to_hex(),
            exp: now.saturating_add(ttl),
            iat: now,
            jti: Uuid::new_v4().to_string(),
            kind,
        };

        // Always sign with the current (first) key
        let secret = self.keys.get_current_key();
        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )?)
    }

    /// Tries every retained key. Expiry is checked after the signature so that
    /// an expired but authentic token still reveals its subject.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        for secret in self.keys.get_all_keys() {
            match decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
            {
                Ok(data) => {
                    let claims = data.claims;
                    if claims.is_expired() {
                        return Err(TokenError::Expired(claims));
                    }
                    return Ok(claims);
                }
                Err(err) if matches!(err.kind(), ErrorKind::InvalidSignature) => continue,
                Err(_) => return Err(TokenError::Invalid),
            }
        }

        Err(TokenError::Invalid)
    }

    /// An unexpired access token for an id that parses.
    pub fn validate_access(&self, token: &str) -> Result<ObjectId, TokenError> {
        let claims = self.decode(token)?;
        if claims.kind != TokenKind::Access {
            return Err(TokenError::Invalid);
        }
        claims.user_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(
            JwtKeyManager::new("test-secret"),
            Duration::from_secs(900),
            Duration::from_secs(3600),
        )
    }

    fn signed(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_generate_and_validate_token() {
        let tokens = service();
        let user = ObjectId::new();

        let access = tokens.access_token(user).unwrap();
        assert_eq!(tokens.validate_access(&access).unwrap(), user);

        let refresh = tokens.refresh_token(user).unwrap();
        let claims = tokens.decode(&refresh).unwrap();
        assert_eq!(claims.kind, TokenKind::Refresh);
        assert!(tokens.validate_access(&refresh).is_err());
    }

    #[test]
    fn test_expired_token_keeps_claims() {
        let tokens = service();
        let user = ObjectId::new();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user.to_hex(),
            exp: now - 100,
            iat: now - 1000,
            jti: Uuid::new_v4().to_string(),
            kind: TokenKind::Refresh,
        };

        match tokens.decode(&signed(&claims, "test-secret")) {
            Err(TokenError::Expired(expired)) => assert_eq!(expired.user_id().unwrap(), user),
            other => panic!("expected expiry, got {other:?}"),
        }
    }

    #[test]
    fn test_foreign_signature_is_invalid() {
        let tokens = service();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: ObjectId::new().to_hex(),
            exp: now + 100,
            iat: now,
            jti: Uuid::new_v4().to_string(),
            kind: TokenKind::Access,
        };

        assert!(matches!(
            tokens.decode(&signed(&claims, "someone-else")),
            Err(TokenError::Invalid)
        ));
        assert!(matches!(tokens.decode("not.a.jwt"), Err(TokenError::Invalid)));
    }

    #[test]
    fn test_previous_secrets_still_verify() {
        let user = ObjectId::new();
        let old = service().access_token(user).unwrap();

        let rotated = TokenService::new(
            JwtKeyManager::with_previous("rotated", &["test-secret".to_string()]),
            Duration::from_secs(900),
            Duration::from_secs(3600),
        );
        assert_eq!(rotated.validate_access(&old).unwrap(), user);

        let new = rotated.access_token(user).unwrap();
        assert!(service().validate_access(&new).is_err());
    }

    #[test]
    fn test_retained_keys_are_capped() {
        let previous: Vec<String> = (1..=10).map(|i| format!("key-{i}")).collect();
        let manager = JwtKeyManager::with_previous("current", &previous);

        assert_eq!(manager.get_current_key(), "current");
        assert_eq!(manager.get_all_keys().len(), MAX_RETAINED_KEYS);
        assert_eq!(manager.get_all_keys()[1], "key-1");
    }
}
