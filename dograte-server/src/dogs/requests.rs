use dograte_core::domain::validation::{
    DEFAULT_SAMPLE_SIZE, validate_breed, validate_rating, validate_sample_size, validate_url,
};
use dograte_core::domain::ValidationError;
use serde::{Deserialize, Serialize};

fn default_sample_size() -> u32 {
    DEFAULT_SAMPLE_SIZE
}

/// Opens a photo for the caller, optionally rating it and filing it under a breed.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateDogRequest {
    pub url: String,
    #[serde(default)]
    pub breed: Option<String>,
    #[serde(default)]
    pub sub_breed: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
}

impl RateDogRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_url(&self.url)?;
        if let Some(breed) = &self.breed {
            validate_breed(breed)?;
        }
        if let Some(sub_breed) = &self.sub_breed {
            validate_breed(sub_breed)?;
        }
        if let Some(rating) = self.rating {
            validate_rating(rating)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UrlRequest {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleRequest {
    #[serde(default = "default_sample_size")]
    pub sample_size: u32,
}

impl Default for SampleRequest {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
        }
    }
}

impl SampleRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_sample_size(self.sample_size)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoreSampleRequest {
    #[serde(default, alias = "currentlyLoadedDocuments")]
    pub loaded_urls: Vec<String>,
    #[serde(default = "default_sample_size")]
    pub sample_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreedRequest {
    pub breed: String,
    #[serde(default)]
    pub sub_breed: Option<String>,
}

impl BreedRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_breed(&self.breed)?;
        if let Some(sub_breed) = &self.sub_breed {
            validate_breed(sub_breed)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CountResponse {
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RandomImageResponse {
    pub message: String,
    pub status: &'static str,
}
