use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use super::dogs::Dog;

pub const FAVOURITES_COLLECTION: &str = "favourites";

/// One document per user listing favourite breeds by dog id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Favourite {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub user: ObjectId,
    #[serde(default)]
    pub dogs: Vec<ObjectId>,
}

impl Favourite {
    pub fn new(user: ObjectId) -> Self {
        Self {
            id: ObjectId::new(),
            user,
            dogs: Vec::new(),
        }
    }
}

/// API view of a favourited dog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavouriteDog {
    pub id: String,
    pub breed: String,
    pub sub_breed: Vec<String>,
}

impl From<&Dog> for FavouriteDog {
    fn from(dog: &Dog) -> Self {
        Self {
            id: dog.id.to_hex(),
            breed: dog.breed.clone(),
            sub_breed: dog.sub_breed.clone(),
        }
    }
}
