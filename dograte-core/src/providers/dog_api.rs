use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_DOG_API_BASE_URL: &str = "https://dog.ceo/api";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),

    #[error("Dog API error ({status}): {message}")]
    Api { status: String, message: String },
}

/// Where breed lists and photo urls come from.
#[async_trait]
pub trait DogImageSource: Send + Sync {
    /// Breed name to its sub-breeds (empty when it has none).
    async fn list_all_breeds(&self) -> Result<BTreeMap<String, Vec<String>>, ProviderError>;
    async fn random_image(&self) -> Result<String, ProviderError>;
    async fn random_breed_image(
        &self,
        breed: &str,
        sub_breed: Option<&str>,
    ) -> Result<String, ProviderError>;
    async fn breed_images(
        &self,
        breed: &str,
        sub_breed: Option<&str>,
    ) -> Result<Vec<String>, ProviderError>;

    async fn is_breed(&self, breed: &str, sub_breed: Option<&str>) -> Result<bool, ProviderError> {
        let breeds = self.list_all_breeds().await?;
        Ok(match (breeds.get(breed), sub_breed) {
            (Some(subs), Some(sub)) => subs.iter().any(|s| s == sub),
            (Some(_), None) => true,
            (None, _) => false,
        })
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    message: T,
    status: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// reqwest client for the dog.ceo API.
#[derive(Debug, Clone)]
pub struct DogApiClient {
    http: Client,
    base_url: String,
}

impl DogApiClient {
    pub fn new(base_url: &str) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("dograte/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Self::with_client(http, base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Result<Self, ProviderError> {
        let parsed = Url::parse(base_url)?;
        Ok(Self {
            http,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn breed_path(breed: &str, sub_breed: Option<&str>) -> String {
        match sub_breed {
            Some(sub) => format!("breed/{breed}/{sub}"),
            None => format!("breed/{breed}"),
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ProviderError> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(%url, "dog api request");

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let envelope = serde_json::from_str::<ErrorEnvelope>(&body).ok();
            warn!(%url, %status, "dog api request failed");
            return Err(ProviderError::Api {
                status: envelope
                    .as_ref()
                    .map(|e| e.status.clone())
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| status.to_string()),
                message: envelope.map(|e| e.message).unwrap_or(body),
            });
        }

        let envelope: Envelope<T> = response.json().await?;
        if envelope.status != "success" {
            return Err(ProviderError::Api {
                status: envelope.status,
                message: format!("unexpected response from {path}"),
            });
        }
        Ok(envelope.message)
    }
}

#[async_trait]
impl DogImageSource for DogApiClient {
    async fn list_all_breeds(&self) -> Result<BTreeMap<String, Vec<String>>, ProviderError> {
        self.get("breeds/list/all").await
    }

    async fn random_image(&self) -> Result<String, ProviderError> {
        self.get("breeds/image/random").await
    }

    async fn random_breed_image(
        &self,
        breed: &str,
        sub_breed: Option<&str>,
    ) -> Result<String, ProviderError> {
        let path = format!("{}/images/random", Self::breed_path(breed, sub_breed));
        self.get(&path).await
    }

    async fn breed_images(
        &self,
        breed: &str,
        sub_breed: Option<&str>,
    ) -> Result<Vec<String>, ProviderError> {
        let path = format!("{}/images", Self::breed_path(breed, sub_breed));
        self.get(&path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let client = DogApiClient::new("https://dog.ceo/api/").unwrap();
        assert_eq!(client.base_url(), "https://dog.ceo/api");
        assert!(DogApiClient::new("not a url").is_err());
    }

    #[test]
    fn breed_paths() {
        assert_eq!(DogApiClient::breed_path("hound", None), "breed/hound");
        assert_eq!(
            DogApiClient::breed_path("hound", Some("afghan")),
            "breed/hound/afghan"
        );
    }
}
