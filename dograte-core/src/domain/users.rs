use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use super::validation::{
    ValidationError, validate_email, validate_password, validate_username,
};

pub const USERS_COLLECTION: &str = "users";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rank {
    Admin,
    #[default]
    User,
}

impl Rank {
    pub fn is_admin(self) -> bool {
        matches!(self, Rank::Admin)
    }
}

/// Stored user document. `password` holds an argon2 PHC string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub username: String,
    pub password: String,
    pub email: String,
    #[serde(default)]
    pub rank: Rank,
    /// Photos this user has rated or opened for rating.
    #[serde(default)]
    pub urls: Vec<ObjectId>,
    /// Refresh token issued at the last login.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl User {
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id.to_hex(),
            username: self.username.clone(),
            email: self.email.clone(),
            rank: self.rank,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub rank: Rank,
}

impl NewUser {
    pub fn into_user(self) -> User {
        User {
            id: ObjectId::new(),
            username: self.username,
            password: self.password_hash,
            email: self.email,
            rank: self.rank,
            urls: Vec::new(),
            token: None,
        }
    }
}

/// Public view of a user; never carries the password hash or token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub email: String,
    pub rank: Rank,
}

/// Registration body as posted. Fields are optional so a missing one is
/// reported through [`ValidationError::Required`] like any other rule.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// A registration that passed every field rule.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    /// Reports the first failing field, username first.
    pub fn validate(self) -> Result<Registration, ValidationError> {
        let username = required("username", self.username)?;
        validate_username(&username)?;
        let email = required("email", self.email)?;
        validate_email(&email)?;
        let password = required("password", self.password)?;
        validate_password(&password)?;
        Ok(Registration {
            username,
            email,
            password,
        })
    }
}

fn required(field: &'static str, value: Option<String>) -> Result<String, ValidationError> {
    value.ok_or(ValidationError::Required(field))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(username: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: Some(username.into()),
            email: Some(email.into()),
            password: Some(password.into()),
        }
    }

    #[test]
    fn register_request_reports_first_failure() {
        let err = request("bad name", "nope", "123").validate().unwrap_err();
        assert_eq!(err, ValidationError::UsernameNotAlphanumeric);

        let err = request("goodname", "nope", "123").validate().unwrap_err();
        assert!(matches!(err, ValidationError::Length { field: "email", .. }));

        assert!(
            request("goodname", "good@mail.com", "hunter22")
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn missing_fields_are_required_in_order() {
        let err = RegisterRequest::default().validate().unwrap_err();
        assert_eq!(err, ValidationError::Required("username"));

        let body: RegisterRequest =
            serde_json::from_str(r#"{"username":"alice12","password":"hunter22"}"#).unwrap();
        assert_eq!(body.validate().unwrap_err(), ValidationError::Required("email"));
    }

    #[test]
    fn rank_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Rank::Admin).unwrap(), "\"admin\"");
        let rank: Rank = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(rank, Rank::User);
    }

    #[test]
    fn summary_hides_credentials() {
        let user = NewUser {
            username: "walker".into(),
            email: "walker@park.com".into(),
            password_hash: "$argon2id$...".into(),
            rank: Rank::User,
        }
        .into_user();
        let json = serde_json::to_value(user.summary()).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["username"], "walker");
    }
}
