pub mod dog_api;

pub use dog_api::{DEFAULT_DOG_API_BASE_URL, DogApiClient, DogImageSource, ProviderError};
