//! Persisted documents, request validation and read-side views.

pub mod dogs;
pub mod favourites;
pub mod users;
pub mod validation;
pub mod views;

pub use dogs::{Dog, UrlRating, UserRating};
pub use favourites::{Favourite, FavouriteDog};
pub use users::{NewUser, Rank, RegisterRequest, Registration, User, UserSummary};
pub use validation::ValidationError;
pub use views::{
    BreedFilter, RatedUrl, SingleUrlRating, SortMode, SortOrder, SortedQuery,
    TableRow,
};
