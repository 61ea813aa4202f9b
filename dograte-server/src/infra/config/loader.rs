use once_cell::sync::Lazy;
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;

use super::{
    models::{
        AuthConfig, Config, ConfigMetadata, CorsConfig, DEFAULT_ACCESS_TOKEN_TTL,
        DEFAULT_MONGODB_DATABASE, DEFAULT_MONGODB_URI, DEFAULT_REFRESH_TOKEN_TTL,
        DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT, DEV_JWT_SECRET, DatabaseConfig, DogApiConfig,
        ServerConfig,
    },
    sources::{EnvConfig, FileConfig},
    validation::{self, ConfigGuardRailError, ConfigWarnings},
};

static DEFAULT_CONFIG_LOCATIONS: Lazy<Vec<PathBuf>> = Lazy::new(|| {
    vec![
        PathBuf::from("dograte.toml"),
        PathBuf::from("config/dograte.toml"),
    ]
});

#[derive(Debug, Default)]
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = dotenvy::dotenv().map(|_| true).or_else(|err| match err {
            dotenvy::Error::Io(_) => Ok(false),
            _ => Err(err),
        })?;

        let env_config = EnvConfig::gather();
        let (file_config, config_path) = self.load_file_config(&env_config)?;

        let (config, warnings) = compose_config(
            file_config,
            env_config,
            ConfigMetadata {
                config_path,
                env_file_loaded,
            },
        )?;

        Ok(ConfigLoad { config, warnings })
    }

    fn load_file_config(
        &self,
        env_config: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let explicit = self
            .config_path
            .clone()
            .or_else(|| env_config.config_path.clone());

        let path = match explicit {
            Some(path) if !path.exists() => {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            Some(path) => path,
            None => match DEFAULT_CONFIG_LOCATIONS
                .iter()
                .find(|candidate| candidate.exists())
            {
                Some(path) => path.clone(),
                None => return Ok((None, None)),
            },
        };

        let file_config = read_file_config(&path)?;
        Ok((Some(file_config), Some(path)))
    }
}

pub fn read_file_config(path: &Path) -> Result<FileConfig, ConfigLoadError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Merges file and environment values (environment wins) over the defaults.
pub fn compose_config(
    file_config: Option<FileConfig>,
    env: EnvConfig,
    metadata: ConfigMetadata,
) -> Result<(Config, ConfigWarnings), ConfigLoadError> {
    let mut warnings = ConfigWarnings::default();

    if file_config.is_none() {
        warnings.push_with_hint(
            "No dograte.toml detected; falling back to environment variables",
            "Set DOGRATE_CONFIG or pass --config to use a configuration file",
        );
    }

    let FileConfig {
        server: file_server,
        database: file_database,
        auth: file_auth,
        cors: file_cors,
        dog_api: file_dog_api,
        dev_mode: file_dev_mode,
    } = file_config.unwrap_or_default();

    let server = ServerConfig {
        host: env
            .server_host
            .or(file_server.host)
            .unwrap_or_else(|| DEFAULT_SERVER_HOST.to_string()),
        port: env
            .server_port
            .or(file_server.port)
            .unwrap_or(DEFAULT_SERVER_PORT),
    };

    let database = DatabaseConfig {
        uri: env
            .mongodb_uri
            .or(file_database.uri)
            .unwrap_or_else(|| DEFAULT_MONGODB_URI.to_string()),
        name: env
            .mongodb_database
            .or(file_database.name)
            .unwrap_or_else(|| DEFAULT_MONGODB_DATABASE.to_string()),
    };

    let dev_mode = env.dev_mode.or(file_dev_mode).unwrap_or(false);

    let access_token_ttl = resolve_ttl(
        "ACCESS_TOKEN_TTL",
        env.access_token_ttl.or(file_auth.access_token_ttl),
        DEFAULT_ACCESS_TOKEN_TTL,
    )?;
    let refresh_token_ttl = resolve_ttl(
        "REFRESH_TOKEN_TTL",
        env.refresh_token_ttl.or(file_auth.refresh_token_ttl),
        DEFAULT_REFRESH_TOKEN_TTL,
    )?;

    let auth = AuthConfig {
        jwt_secret: env
            .jwt_secret
            .or(file_auth.jwt_secret)
            .unwrap_or_else(|| DEV_JWT_SECRET.to_string()),
        previous_jwt_secrets: env
            .previous_jwt_secrets
            .or(file_auth.previous_jwt_secrets)
            .unwrap_or_default(),
        access_token_ttl,
        refresh_token_ttl,
        secure_cookies: env
            .secure_cookies
            .or(file_auth.secure_cookies)
            .unwrap_or(true),
    };

    let cors = CorsConfig {
        allowed_origins: env
            .cors_allowed_origins
            .or(file_cors.allowed_origins)
            .unwrap_or_else(default_cors_origins),
        allow_credentials: env
            .cors_allow_credentials
            .or(file_cors.allow_credentials)
            .unwrap_or(true),
    };

    let dog_api = DogApiConfig {
        base_url: env
            .dog_api_base_url
            .or(file_dog_api.base_url)
            .unwrap_or_else(|| dograte_core::providers::DEFAULT_DOG_API_BASE_URL.to_string()),
    };

    let config = Config {
        server,
        database,
        auth,
        cors,
        dog_api,
        dev_mode,
        metadata,
    };

    let guard_warnings = validation::apply_guard_rails(&config)?;
    warnings.extend(guard_warnings);

    Ok((config, warnings))
}

fn resolve_ttl(
    key: &'static str,
    raw: Option<String>,
    default: Duration,
) -> Result<Duration, ConfigLoadError> {
    match raw {
        Some(value) => {
            humantime::parse_duration(value.trim()).map_err(|source| ConfigLoadError::InvalidDuration {
                key,
                value,
                source,
            })
        }
        None => Ok(default),
    }
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(),
    ]
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("configuration file missing: {path}")]
    MissingConfig { path: PathBuf },
    #[error("failed to read configuration {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid duration for {key}: '{value}'")]
    InvalidDuration {
        key: &'static str,
        value: String,
        #[source]
        source: humantime::DurationError,
    },
    #[error(transparent)]
    GuardRail(#[from] ConfigGuardRailError),
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::config::sources::{FileAuthConfig, FileServerConfig};
    use std::io::Write;

    fn dev_env() -> EnvConfig {
        EnvConfig {
            dev_mode: Some(true),
            ..EnvConfig::default()
        }
    }

    #[test]
    fn defaults_apply_without_sources() {
        let (config, warnings) =
            compose_config(None, dev_env(), ConfigMetadata::default()).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3005);
        assert_eq!(config.database.uri, "mongodb://localhost:27017");
        assert_eq!(config.database.name, "dog_database");
        assert_eq!(config.auth.access_token_ttl, Duration::from_secs(900));
        assert_eq!(
            config.auth.refresh_token_ttl,
            Duration::from_secs(30 * 24 * 3600)
        );
        assert!(config.auth.is_dev_secret());
        assert!(config.auth.secure_cookies);
        assert_eq!(config.dog_api.base_url, "https://dog.ceo/api");
        assert!(!warnings.is_empty());
    }

    #[test]
    fn env_overrides_file() {
        let file = FileConfig {
            server: FileServerConfig {
                host: Some("127.0.0.1".into()),
                port: Some(4000),
            },
            auth: FileAuthConfig {
                access_token_ttl: Some("5m".into()),
                ..FileAuthConfig::default()
            },
            ..FileConfig::default()
        };
        let env = EnvConfig {
            server_port: Some(5000),
            access_token_ttl: Some("90s".into()),
            ..dev_env()
        };

        let (config, _) = compose_config(Some(file), env, ConfigMetadata::default()).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.auth.access_token_ttl, Duration::from_secs(90));
    }

    #[test]
    fn bad_duration_is_reported() {
        let env = EnvConfig {
            refresh_token_ttl: Some("thirty days".into()),
            ..dev_env()
        };
        let err = compose_config(None, env, ConfigMetadata::default()).unwrap_err();
        assert!(matches!(
            err,
            ConfigLoadError::InvalidDuration {
                key: "REFRESH_TOKEN_TTL",
                ..
            }
        ));
    }

    #[test]
    fn production_without_secret_fails() {
        let err = compose_config(None, EnvConfig::default(), ConfigMetadata::default())
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigLoadError::GuardRail(ConfigGuardRailError::MissingJwtSecret)
        ));
    }

    #[test]
    fn reads_toml_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[database]\nuri = \"mongodb://db:27017\"\nname = \"dogs_test\""
        )
        .unwrap();

        let parsed = read_file_config(file.path()).unwrap();
        assert_eq!(parsed.database.uri.as_deref(), Some("mongodb://db:27017"));
        assert_eq!(parsed.database.name.as_deref(), Some("dogs_test"));

        let missing = read_file_config(Path::new("/definitely/not/here.toml"));
        assert!(matches!(missing, Err(ConfigLoadError::Io { .. })));
    }
}
