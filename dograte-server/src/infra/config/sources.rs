use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    #[serde(default)]
    pub server: FileServerConfig,
    #[serde(default)]
    pub database: FileDatabaseConfig,
    #[serde(default)]
    pub auth: FileAuthConfig,
    #[serde(default)]
    pub cors: FileCorsConfig,
    #[serde(default)]
    pub dog_api: FileDogApiConfig,
    pub dev_mode: Option<bool>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileServerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileDatabaseConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileAuthConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwt_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_jwt_secrets: Option<Vec<String>>,
    /// Humantime string such as `15m`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token_ttl: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token_ttl: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secure_cookies: Option<bool>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileCorsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_origins: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_credentials: Option<bool>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileDogApiConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Environment-derived configuration values.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub server_host: Option<String>,
    pub server_port: Option<u16>,
    pub mongodb_uri: Option<String>,
    pub mongodb_database: Option<String>,
    pub jwt_secret: Option<String>,
    pub previous_jwt_secrets: Option<Vec<String>>,
    pub access_token_ttl: Option<String>,
    pub refresh_token_ttl: Option<String>,
    pub secure_cookies: Option<bool>,
    pub cors_allowed_origins: Option<Vec<String>>,
    pub cors_allow_credentials: Option<bool>,
    pub dog_api_base_url: Option<String>,
    pub dev_mode: Option<bool>,
}

impl EnvConfig {
    pub fn gather() -> Self {
        Self {
            config_path: std::env::var("DOGRATE_CONFIG").ok().map(PathBuf::from),
            server_host: std::env::var("SERVER_HOST").ok(),
            server_port: std::env::var("SERVER_PORT")
                .ok()
                .and_then(|s| s.parse().ok()),
            mongodb_uri: std::env::var("MONGODB_URI").ok(),
            mongodb_database: std::env::var("MONGODB_DATABASE").ok(),

            jwt_secret: std::env::var("JWT_SECRET")
                .ok()
                .filter(|value| !value.trim().is_empty()),
            previous_jwt_secrets: parse_csv_var("JWT_PREVIOUS_SECRETS"),
            access_token_ttl: std::env::var("ACCESS_TOKEN_TTL").ok(),
            refresh_token_ttl: std::env::var("REFRESH_TOKEN_TTL").ok(),
            secure_cookies: parse_bool_var("SECURE_COOKIES"),

            cors_allowed_origins: parse_csv_var("CORS_ALLOWED_ORIGINS"),
            cors_allow_credentials: parse_bool_var("CORS_ALLOW_CREDENTIALS"),

            dog_api_base_url: std::env::var("DOG_API_BASE_URL").ok(),
            dev_mode: parse_bool_var("DEV_MODE"),
        }
    }
}

fn parse_csv_var(key: &str) -> Option<Vec<String>> {
    std::env::var(key).ok().map(|value| {
        value
            .split(',')
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect()
    })
}

fn parse_bool_var(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .and_then(|value| match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_config_parses_partial_toml() {
        let raw = r#"
            dev_mode = true

            [server]
            port = 4000

            [auth]
            access_token_ttl = "5m"

            [cors]
            allowed_origins = ["http://localhost:3000"]
        "#;

        let file: FileConfig = toml::from_str(raw).unwrap();
        assert_eq!(file.server.port, Some(4000));
        assert!(file.server.host.is_none());
        assert_eq!(file.auth.access_token_ttl.as_deref(), Some("5m"));
        assert_eq!(file.dev_mode, Some(true));
        assert!(file.database.uri.is_none());
        assert_eq!(
            file.cors.allowed_origins,
            Some(vec!["http://localhost:3000".to_string()])
        );
    }
}
