use thiserror::Error;
use url::Url;

use super::models::{AuthConfig, Config, CorsConfig};

const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum ConfigGuardRailError {
    #[error("JWT_SECRET must be set when DEV_MODE is false")]
    MissingJwtSecret,
    #[error("CORS wildcard origins are not allowed when DEV_MODE is false")]
    DangerousCorsWildcard,
    #[error("invalid CORS origin '{origin}'")]
    InvalidCorsOrigin { origin: String },
    #[error("{field} must be greater than zero")]
    ZeroTtl { field: &'static str },
    #[error("DOG_API_BASE_URL '{url}' is not an http(s) url")]
    InvalidDogApiUrl { url: String },
}

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push_with_hint<S: Into<String>, H: Into<String>>(&mut self, message: S, hint: H) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }
}

pub fn apply_guard_rails(config: &Config) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let mut warnings = ConfigWarnings::default();

    check_auth(&config.auth, config.dev_mode, &mut warnings)?;

    if !config.dev_mode && config.cors.is_wildcard_included() {
        return Err(ConfigGuardRailError::DangerousCorsWildcard);
    }
    validate_cors(&config.cors)?;
    if !is_http_url(&config.dog_api.base_url) {
        return Err(ConfigGuardRailError::InvalidDogApiUrl {
            url: config.dog_api.base_url.clone(),
        });
    }

    if config.dev_mode {
        warnings.push_with_hint(
            "DEV_MODE enabled; CORS is permissive",
            "Unset DEV_MODE for production deployments",
        );
    }

    Ok(warnings)
}

fn check_auth(
    auth: &AuthConfig,
    dev_mode: bool,
    warnings: &mut ConfigWarnings,
) -> Result<(), ConfigGuardRailError> {
    if auth.access_token_ttl.is_zero() {
        return Err(ConfigGuardRailError::ZeroTtl {
            field: "ACCESS_TOKEN_TTL",
        });
    }
    if auth.refresh_token_ttl.is_zero() {
        return Err(ConfigGuardRailError::ZeroTtl {
            field: "REFRESH_TOKEN_TTL",
        });
    }

    if auth.is_dev_secret() {
        if !dev_mode {
            return Err(ConfigGuardRailError::MissingJwtSecret);
        }
        warnings.push_with_hint(
            "JWT_SECRET not configured; using the built-in development secret",
            "Set JWT_SECRET to a random value of at least 32 characters",
        );
    } else if auth.jwt_secret.len() < MIN_SECRET_LEN {
        warnings.push_with_hint(
            format!("JWT_SECRET is shorter than {MIN_SECRET_LEN} characters"),
            "Generate a longer secret, e.g. `openssl rand -hex 32`",
        );
    }

    if !auth.secure_cookies && !dev_mode {
        warnings.push_with_hint(
            "SECURE_COOKIES=false; refresh cookies will be sent over plain HTTP",
            "Enable SECURE_COOKIES when serving behind TLS",
        );
    }

    Ok(())
}

fn validate_cors(cors: &CorsConfig) -> Result<(), ConfigGuardRailError> {
    for origin in &cors.allowed_origins {
        let trimmed = origin.trim();
        if trimmed == "*" {
            continue;
        }
        if !is_http_url(trimmed) {
            return Err(ConfigGuardRailError::InvalidCorsOrigin {
                origin: origin.clone(),
            });
        }
    }
    Ok(())
}

fn is_http_url(value: &str) -> bool {
    Url::parse(value)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::config::models::DEV_JWT_SECRET;

    fn production() -> Config {
        let mut config = Config::for_dev("a-perfectly-long-and-random-production-secret");
        config.dev_mode = false;
        config.auth.secure_cookies = true;
        config
    }

    #[test]
    fn production_requires_a_real_secret() {
        let mut config = production();
        assert!(apply_guard_rails(&config).unwrap().is_empty());

        config.auth.jwt_secret = DEV_JWT_SECRET.to_string();
        assert!(matches!(
            apply_guard_rails(&config),
            Err(ConfigGuardRailError::MissingJwtSecret)
        ));
    }

    #[test]
    fn production_rejects_wildcard_cors() {
        let mut config = production();
        config.cors.allowed_origins = vec!["*".to_string()];
        assert!(matches!(
            apply_guard_rails(&config),
            Err(ConfigGuardRailError::DangerousCorsWildcard)
        ));
    }

    #[test]
    fn dev_mode_only_warns() {
        let mut config = Config::for_dev(DEV_JWT_SECRET);
        config.cors.allowed_origins = vec!["*".to_string()];
        let warnings = apply_guard_rails(&config).unwrap();
        assert_eq!(warnings.items.len(), 2);
    }

    #[test]
    fn short_secret_is_a_warning() {
        let mut config = production();
        config.auth.jwt_secret = "short".to_string();
        let warnings = apply_guard_rails(&config).unwrap();
        assert_eq!(warnings.items.len(), 1);
        assert!(warnings.items[0].message.contains("shorter"));
    }

    #[test]
    fn origins_and_provider_url_must_be_http() {
        let mut config = production();
        config.cors.allowed_origins = vec!["localhost:3000".to_string()];
        assert!(matches!(
            apply_guard_rails(&config),
            Err(ConfigGuardRailError::InvalidCorsOrigin { .. })
        ));

        let mut config = production();
        config.dog_api.base_url = "ftp://dog.ceo/api".to_string();
        assert!(matches!(
            apply_guard_rails(&config),
            Err(ConfigGuardRailError::InvalidDogApiUrl { .. })
        ));
    }
}
