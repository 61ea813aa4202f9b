//! Stage compositions backing each repository query.

use mongodb::bson::{Document, oid::ObjectId};

use super::stages::*;
use crate::domain::views::{BreedFilter, SortedQuery};

/// Name of the field produced by the trailing `$count` stage.
pub const COUNT_FIELD: &str = "count";

fn join_photos() -> [Document; 4] {
    [
        project_zip_sub_breed_urls(),
        unwind_url_sub_breed(),
        lookup_url_rating_data(),
        unwind_url_rating_data(),
    ]
}

fn format_for(user: Option<ObjectId>) -> Vec<Document> {
    match user {
        Some(user) => vec![
            project_standard_format(Some(user)),
            project_tidy_my_rating(),
        ],
        None => vec![project_standard_format(None)],
    }
}

/// Random sample over every photo.
pub fn random_docs(size: u32, user: Option<ObjectId>) -> Vec<Document> {
    let mut pipeline: Vec<Document> = join_photos().into();
    pipeline.push(sample(size));
    pipeline.extend(format_for(user));
    pipeline
}

/// Random sample skipping photos the client already holds.
pub fn random_with_exclusions(
    loaded_urls: &[String],
    size: u32,
    user: Option<ObjectId>,
) -> Vec<Document> {
    let mut pipeline: Vec<Document> = join_photos().into();
    pipeline.push(exclude_urls(loaded_urls));
    pipeline.push(sample(size));
    pipeline.extend(format_for(user));
    pipeline
}

pub fn all_sorted(query: &SortedQuery, user: Option<ObjectId>) -> Vec<Document> {
    let filter = query.filtered_breed.as_ref();
    let mut pipeline = vec![
        match_breed_filter(filter),
        project_zip_sub_breed_urls(),
        unwind_url_sub_breed(),
        match_sub_breed_filter(filter),
        lookup_url_rating_data(),
        unwind_url_rating_data(),
    ];
    pipeline.extend(format_for(user));
    pipeline.push(sort_by(query.sort_mode, query.sort_order));
    pipeline.push(exclude_unrated(query.sort_mode));
    pipeline.push(skip(query.skip_count));
    pipeline.push(limit(query.sample_size));
    pipeline
}

/// Same listing restricted to `url_ids`; unrated photos stay visible.
pub fn user_sorted(
    url_ids: &[ObjectId],
    user: ObjectId,
    query: &SortedQuery,
) -> Vec<Document> {
    let filter = query.filtered_breed.as_ref();
    let mut pipeline = vec![
        match_user_urls(url_ids),
        match_breed_filter(filter),
        project_matching_user_urls(url_ids),
        project_zip_sub_breed_urls(),
        unwind_url_sub_breed(),
        match_sub_breed_filter(filter),
        lookup_url_rating_data(),
        unwind_url_rating_data(),
    ];
    pipeline.extend(format_for(Some(user)));
    pipeline.push(sort_by(query.sort_mode, query.sort_order));
    pipeline.push(skip(query.skip_count));
    pipeline.push(limit(query.sample_size));
    pipeline
}

fn table_tail() -> [Document; 4] {
    [
        project_sub_breed_for_group(),
        group_by_sub_breed(),
        project_grouped_sub_breeds(),
        sort_table_rows(),
    ]
}

pub fn table() -> Vec<Document> {
    let mut pipeline: Vec<Document> = join_photos().into();
    pipeline.extend(table_tail());
    pipeline
}

pub fn user_table(url_ids: &[ObjectId]) -> Vec<Document> {
    let mut pipeline = vec![
        match_user_urls(url_ids),
        project_matching_user_urls(url_ids),
    ];
    pipeline.extend(join_photos());
    pipeline.extend(table_tail());
    pipeline
}

/// Runs against the `urlratings` collection.
pub fn single_url(url: &str, user: ObjectId) -> Vec<Document> {
    vec![
        match_url(url),
        project_single_url(user),
        project_single_url_tidy(),
    ]
}

pub fn filtered_count(filter: &BreedFilter) -> Vec<Document> {
    vec![
        match_breed_filter(Some(filter)),
        project_zip_sub_breed_urls(),
        unwind_url_sub_breed(),
        match_sub_breed_filter(Some(filter)),
        lookup_url_rating_data(),
        unwind_url_rating_data(),
        project_url_only(),
        count(COUNT_FIELD),
    ]
}

pub fn filtered_count_user(
    filter: &BreedFilter,
    url_ids: &[ObjectId],
) -> Vec<Document> {
    vec![
        match_breed_filter(Some(filter)),
        project_matching_user_urls(url_ids),
        project_zip_sub_breed_urls(),
        unwind_url_sub_breed(),
        match_sub_breed_filter(Some(filter)),
        lookup_url_rating_data(),
        unwind_url_rating_data(),
        project_url_only(),
        count(COUNT_FIELD),
    ]
}
