use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

pub const DOGS_COLLECTION: &str = "dogs";
pub const URL_RATINGS_COLLECTION: &str = "urlratings";

/// A breed and the photo ids grouped per sub-breed.
///
/// `url_data[i]` belongs to `sub_breed[i]`. Breeds without sub-breeds keep
/// their photos in `url_data[0]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dog {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub breed: String,
    #[serde(default)]
    pub sub_breed: Vec<String>,
    #[serde(default)]
    pub url_data: Vec<Vec<ObjectId>>,
}

impl Dog {
    pub fn new(breed: impl Into<String>) -> Self {
        Self {
            id: ObjectId::new(),
            breed: breed.into(),
            sub_breed: Vec::new(),
            url_data: vec![Vec::new()],
        }
    }

    /// Slot that holds photos for `sub_breed`; slot 0 when none is given.
    pub fn slot_for(&self, sub_breed: Option<&str>) -> Option<usize> {
        match sub_breed {
            Some(sub) => self.sub_breed.iter().position(|s| s == sub),
            None => Some(0),
        }
    }
}

/// One user's entry on a photo. `rating` stays `None` until the user rates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRating {
    pub user_id: ObjectId,
    #[serde(default)]
    pub rating: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlRating {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub url: String,
    #[serde(default)]
    pub number_of_rates: i64,
    #[serde(default)]
    pub user_rating_data: Vec<UserRating>,
}

impl UrlRating {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            id: ObjectId::new(),
            url: url.into(),
            number_of_rates: 0,
            user_rating_data: Vec::new(),
        }
    }

    pub fn entry_for(&self, user_id: ObjectId) -> Option<&UserRating> {
        self.user_rating_data.iter().find(|r| r.user_id == user_id)
    }

    /// Mean of non-null ratings, `None` when nobody has rated.
    pub fn average_rating(&self) -> Option<f64> {
        let ratings: Vec<f64> = self
            .user_rating_data
            .iter()
            .filter_map(|r| r.rating)
            .collect();
        if ratings.is_empty() {
            None
        } else {
            Some(ratings.iter().sum::<f64>() / ratings.len() as f64)
        }
    }
}

/// Insert shape for `insert_many`; ids are assigned by the server.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUrlRating {
    pub url: String,
    pub number_of_rates: i64,
    pub user_rating_data: Vec<UserRating>,
}

impl NewUrlRating {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            number_of_rates: 0,
            user_rating_data: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_ignores_unrated_entries() {
        let mut photo = UrlRating::new("https://images.dog.ceo/a.jpg");
        assert_eq!(photo.average_rating(), None);

        photo.user_rating_data.push(UserRating {
            user_id: ObjectId::new(),
            rating: None,
        });
        photo.user_rating_data.push(UserRating {
            user_id: ObjectId::new(),
            rating: Some(4.0),
        });
        photo.user_rating_data.push(UserRating {
            user_id: ObjectId::new(),
            rating: Some(2.0),
        });

        assert_eq!(photo.average_rating(), Some(3.0));
    }

    #[test]
    fn slot_lookup_defaults_to_first_slot() {
        let mut dog = Dog::new("hound");
        dog.sub_breed = vec!["afghan".into(), "basset".into()];
        dog.url_data = vec![vec![], vec![]];

        assert_eq!(dog.slot_for(None), Some(0));
        assert_eq!(dog.slot_for(Some("basset")), Some(1));
        assert_eq!(dog.slot_for(Some("plott")), None);
    }
}
