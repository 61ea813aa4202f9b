//! Fills the store with every breed and photo the image source knows about.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::database::DogRepository;
use crate::error::Result;
use crate::providers::DogImageSource;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedReport {
    pub breeds: usize,
    pub sub_breeds: usize,
    pub urls: usize,
}

pub struct BreedSeeder {
    dogs: Arc<dyn DogRepository>,
    source: Arc<dyn DogImageSource>,
}

impl std::fmt::Debug for BreedSeeder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BreedSeeder").finish_non_exhaustive()
    }
}

impl BreedSeeder {
    pub fn new(dogs: Arc<dyn DogRepository>, source: Arc<dyn DogImageSource>) -> Self {
        Self { dogs, source }
    }

    /// Re-running only adds what is missing.
    pub async fn store_all_breeds(&self) -> Result<SeedReport> {
        let breeds = self.source.list_all_breeds().await?;
        let mut report = SeedReport::default();

        for (breed, sub_breeds) in &breeds {
            let dog = self.dogs.save_dog(breed).await?;
            report.breeds += 1;

            if sub_breeds.is_empty() {
                report.urls += self.store_slot(dog.id, breed, None, 0).await?;
                continue;
            }

            for sub_breed in sub_breeds {
                let dog = self.dogs.save_sub_breed(dog.id, sub_breed).await?;
                report.sub_breeds += 1;
                let Some(index) = dog.slot_for(Some(sub_breed)) else {
                    warn!(breed, sub_breed, "sub-breed slot missing after save");
                    continue;
                };
                report.urls += self
                    .store_slot(dog.id, breed, Some(sub_breed), index)
                    .await?;
            }
        }

        info!(
            breeds = report.breeds,
            sub_breeds = report.sub_breeds,
            urls = report.urls,
            "stored all breeds"
        );
        Ok(report)
    }

    async fn store_slot(
        &self,
        dog_id: crate::ObjectId,
        breed: &str,
        sub_breed: Option<&str>,
        index: usize,
    ) -> Result<usize> {
        let urls = self.source.breed_images(breed, sub_breed).await?;
        let ids = self.dogs.save_many_urls(&urls).await?;
        self.dogs.save_url_ids_to_dog(&ids, dog_id, index).await?;
        Ok(ids.len())
    }
}
