//! # Dograte Core
//!
//! Core library for the dograte backend: dog photo records, user ratings,
//! favourites, and the aggregation views the HTTP layer serves.
//!
//! ## Overview
//!
//! - **Domain**: [`domain`] holds the persisted documents (dogs, url ratings,
//!   users, favourites), request validation and the read-side views.
//! - **Aggregations**: [`aggregate`] builds MongoDB pipeline stages and
//!   composes them into listing, sampling, sorting, table and count queries.
//! - **Storage**: [`database`] defines repository ports with a MongoDB adapter
//!   and an in-memory adapter that evaluates the same views in Rust.
//! - **Providers**: [`providers`] talks to the public dog image API.
//! - **Seeding**: [`seed`] fills the store from a [`providers::DogImageSource`].
//!
//! ## Examples
//!
//! ```no_run
//! use dograte_core::{
//!     database::{DogRepository, memory::InMemoryStore},
//!     domain::SortedQuery,
//! };
//!
//! async fn top_rated(store: &InMemoryStore) -> dograte_core::Result<()> {
//!     store.save_dog("hound").await?;
//!     let page = store.all_sorted(&SortedQuery::default(), None).await?;
//!     println!("{} photos", page.len());
//!     Ok(())
//! }
//! ```

pub mod aggregate;
pub mod database;
pub mod domain;
pub mod error;
pub mod providers;
pub mod seed;

pub use error::{CoreError, Result};

/// BSON types used across the public API.
pub use mongodb::bson::oid::ObjectId;
