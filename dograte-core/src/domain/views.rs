//! Read-side shapes produced by the aggregation pipelines.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::validation::{
    DEFAULT_SAMPLE_SIZE, ValidationError, validate_sample_size, validate_skip_count,
};

/// A single photo with its breed slot and rating summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatedUrl {
    pub breed: String,
    #[serde(default)]
    pub sub_breed: Option<String>,
    pub url: String,
    #[serde(default)]
    pub number_of_rates: i64,
    #[serde(default)]
    pub average_rating: Option<f64>,
    /// The caller's rating; absent for anonymous callers or untouched photos.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub my_rating: Option<f64>,
}

/// Per (breed, sub-breed) aggregate used by the table views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    pub breed: String,
    #[serde(default)]
    pub sub_breed: Option<String>,
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default)]
    pub number_of_rates: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleUrlRating {
    #[serde(default)]
    pub number_of_rates: i64,
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default)]
    pub my_rating: Option<f64>,
}

/// Exact breed/sub-breed match. A `None` sub-breed selects the photos of
/// breeds that have no sub-breeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreedFilter {
    pub breed: String,
    #[serde(default)]
    pub sub_breed: Option<String>,
}

impl BreedFilter {
    pub fn matches(&self, breed: &str, sub_breed: Option<&str>) -> bool {
        self.breed == breed && self.sub_breed.as_deref() == sub_breed
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortMode {
    #[default]
    #[serde(rename = "breed")]
    Breed,
    #[serde(rename = "averageRating")]
    AverageRating,
    #[serde(rename = "numberOfRates")]
    NumberOfRates,
    #[serde(rename = "myRating")]
    MyRating,
}

impl SortMode {
    /// Field name in the projected documents.
    pub fn field(self) -> &'static str {
        match self {
            SortMode::Breed => "breed",
            SortMode::AverageRating => "averageRating",
            SortMode::NumberOfRates => "numberOfRates",
            SortMode::MyRating => "myRating",
        }
    }
}

/// Accepts `1`/`-1` as well as `"asc"`/`"desc"` on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

impl SortOrder {
    pub fn as_i32(self) -> i32 {
        match self {
            SortOrder::Ascending => 1,
            SortOrder::Descending => -1,
        }
    }
}

impl Serialize for SortOrder {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.as_i32())
    }
}

impl<'de> Deserialize<'de> for SortOrder {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(i64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(1) => Ok(SortOrder::Ascending),
            Raw::Number(-1) => Ok(SortOrder::Descending),
            Raw::Text(text) => match text.to_ascii_lowercase().as_str() {
                "asc" | "ascending" | "1" => Ok(SortOrder::Ascending),
                "desc" | "descending" | "-1" => Ok(SortOrder::Descending),
                other => Err(serde::de::Error::custom(format!(
                    "invalid sort order `{other}`"
                ))),
            },
            Raw::Number(other) => Err(serde::de::Error::custom(format!(
                "invalid sort order `{other}`, expected 1 or -1"
            ))),
        }
    }
}

fn default_sample_size() -> u32 {
    DEFAULT_SAMPLE_SIZE
}

/// Paging, ordering and filtering for the sorted listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortedQuery {
    #[serde(default)]
    pub sort_order: SortOrder,
    #[serde(default)]
    pub sort_mode: SortMode,
    #[serde(default)]
    pub skip_count: u64,
    #[serde(default = "default_sample_size")]
    pub sample_size: u32,
    #[serde(default)]
    pub filtered_breed: Option<BreedFilter>,
}

impl Default for SortedQuery {
    fn default() -> Self {
        Self {
            sort_order: SortOrder::default(),
            sort_mode: SortMode::default(),
            skip_count: 0,
            sample_size: DEFAULT_SAMPLE_SIZE,
            filtered_breed: None,
        }
    }
}

impl SortedQuery {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_sample_size(self.sample_size)?;
        validate_skip_count(self.skip_count)
    }
}
