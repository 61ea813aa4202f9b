use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";
pub const DEFAULT_SERVER_PORT: u16 = 3005;
pub const DEFAULT_MONGODB_URI: &str = "mongodb://localhost:27017";
pub const DEFAULT_MONGODB_DATABASE: &str = "dog_database";
pub const DEFAULT_ACCESS_TOKEN_TTL: Duration = Duration::from_secs(15 * 60);
pub const DEFAULT_REFRESH_TOKEN_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Only ever used when `DEV_MODE` is on and no secret was configured.
pub const DEV_JWT_SECRET: &str = "dograte-dev-only-jwt-secret-change-me";

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub cors: CorsConfig,
    pub dog_api: DogApiConfig,
    pub dev_mode: bool,
    pub metadata: ConfigMetadata,
}

impl Config {
    /// Defaults suitable for tests and local runs against the in-memory store.
    pub fn for_dev(jwt_secret: impl Into<String>) -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            database: DatabaseConfig {
                uri: DEFAULT_MONGODB_URI.to_string(),
                name: DEFAULT_MONGODB_DATABASE.to_string(),
            },
            auth: AuthConfig {
                jwt_secret: jwt_secret.into(),
                previous_jwt_secrets: Vec::new(),
                access_token_ttl: DEFAULT_ACCESS_TOKEN_TTL,
                refresh_token_ttl: DEFAULT_REFRESH_TOKEN_TTL,
                secure_cookies: false,
            },
            cors: CorsConfig {
                allowed_origins: Vec::new(),
                allow_credentials: true,
            },
            dog_api: DogApiConfig {
                base_url: dograte_core::providers::DEFAULT_DOG_API_BASE_URL.to_string(),
            },
            dev_mode: true,
            metadata: ConfigMetadata::default(),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub uri: String,
    pub name: String,
}

#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Retired secrets still accepted when verifying tokens.
    pub previous_jwt_secrets: Vec<String>,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub secure_cookies: bool,
}

impl AuthConfig {
    pub fn is_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("previous_jwt_secrets", &self.previous_jwt_secrets.len())
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .field("secure_cookies", &self.secure_cookies)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

impl CorsConfig {
    pub fn is_wildcard_included(&self) -> bool {
        self.allowed_origins
            .iter()
            .any(|origin| origin.trim() == "*")
    }
}

#[derive(Debug, Clone)]
pub struct DogApiConfig {
    pub base_url: String,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
}
