use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

pub const USERNAME_MIN_LEN: usize = 5;
pub const USERNAME_MAX_LEN: usize = 50;
pub const EMAIL_MIN_LEN: usize = 5;
pub const EMAIL_MAX_LEN: usize = 50;
pub const PASSWORD_MIN_LEN: usize = 5;
pub const PASSWORD_MAX_LEN: usize = 255;

pub const BREED_MAX_LEN: usize = 100;
pub const SUB_BREED_MAX_COUNT: usize = 100;
pub const URL_MAX_LEN: usize = 254;

pub const RATING_MIN: f64 = 0.0;
pub const RATING_MAX: f64 = 5.0;

pub const DEFAULT_SAMPLE_SIZE: u32 = 50;
pub const MAX_SAMPLE_SIZE: u32 = 500;
/// Largest offset a `$skip` stage accepts.
pub const MAX_SKIP_COUNT: u64 = i64::MAX as u64;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("\"username\" must only contain alpha-numeric characters")]
    UsernameNotAlphanumeric,

    #[error("\"{field}\" length must be between {min} and {max} characters long")]
    Length {
        field: &'static str,
        min: usize,
        max: usize,
    },

    #[error("\"email\" must be a valid email")]
    InvalidEmail,

    #[error("\"rating\" must be a number between 0 and 5")]
    RatingOutOfRange,

    #[error("\"sampleSize\" must be between 1 and {max}")]
    SampleSize { max: u32 },

    #[error("\"skipCount\" must be at most {max}")]
    SkipCount { max: u64 },

    #[error("too many sub-breeds for breed (max {max})")]
    TooManySubBreeds { max: usize },

    #[error("invalid id: {0}")]
    InvalidId(String),

    #[error("\"{0}\" is required")]
    Required(&'static str),
}

pub(crate) fn check_length(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(ValidationError::Length { field, min, max });
    }
    Ok(())
}

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if !username.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::UsernameNotAlphanumeric);
    }
    check_length("username", username, USERNAME_MIN_LEN, USERNAME_MAX_LEN)
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    check_length("email", email, EMAIL_MIN_LEN, EMAIL_MAX_LEN)?;
    if !EMAIL_RE.is_match(email) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    check_length("password", password, PASSWORD_MIN_LEN, PASSWORD_MAX_LEN)
}

pub fn validate_breed(breed: &str) -> Result<(), ValidationError> {
    check_length("breed", breed, 1, BREED_MAX_LEN)
}

pub fn validate_url(url: &str) -> Result<(), ValidationError> {
    check_length("url", url, 1, URL_MAX_LEN)
}

pub fn validate_rating(rating: f64) -> Result<(), ValidationError> {
    if !rating.is_finite() || !(RATING_MIN..=RATING_MAX).contains(&rating) {
        return Err(ValidationError::RatingOutOfRange);
    }
    Ok(())
}

pub fn validate_sample_size(size: u32) -> Result<(), ValidationError> {
    if size == 0 || size > MAX_SAMPLE_SIZE {
        return Err(ValidationError::SampleSize {
            max: MAX_SAMPLE_SIZE,
        });
    }
    Ok(())
}

pub fn validate_skip_count(count: u64) -> Result<(), ValidationError> {
    if count > MAX_SKIP_COUNT {
        return Err(ValidationError::SkipCount {
            max: MAX_SKIP_COUNT,
        });
    }
    Ok(())
}
