//! Single pipeline stages.
//!
//! Dogs are stored as `{breed, subBreed: [..], urlData: [[ids], ..]}`. The
//! listing pipelines zip `subBreed` with `urlData` into `urlSubBreed`, unwind
//! one `[subBreed, ids]` pair per document, then join the ids against the
//! `urlratings` collection as `urlRatingData`.

use mongodb::bson::{Bson, Document, doc, oid::ObjectId};

use crate::domain::dogs::URL_RATINGS_COLLECTION;
use crate::domain::views::{BreedFilter, SortMode, SortOrder};

fn id_list(ids: &[ObjectId]) -> Vec<Bson> {
    ids.iter().copied().map(Bson::ObjectId).collect()
}

/// Dogs holding at least one of `ids` in any slot.
pub fn match_user_urls(ids: &[ObjectId]) -> Document {
    doc! {
        "$match": {
            "urlData": {
                "$elemMatch": { "$elemMatch": { "$in": id_list(ids) } }
            }
        }
    }
}

pub fn match_breed_filter(filter: Option<&BreedFilter>) -> Document {
    match filter {
        Some(filter) => doc! { "$match": { "breed": filter.breed.as_str() } },
        None => doc! { "$match": {} },
    }
}

/// Runs after [`unwind_url_sub_breed`]; a `None` sub-breed matches `null`.
pub fn match_sub_breed_filter(filter: Option<&BreedFilter>) -> Document {
    match filter {
        Some(filter) => doc! {
            "$match": { "urlSubBreed.0": filter.sub_breed.clone() }
        },
        None => doc! { "$match": {} },
    }
}

/// Drops photos already handed to the client. Runs after
/// [`unwind_url_rating_data`].
pub fn exclude_urls(urls: &[String]) -> Document {
    doc! { "$match": { "urlRatingData.url": { "$nin": urls.to_vec() } } }
}

/// Sorting by a rating field hides photos nobody has rated.
pub fn exclude_unrated(mode: SortMode) -> Document {
    match mode {
        SortMode::AverageRating => {
            doc! { "$match": { "averageRating": { "$ne": Bson::Null } } }
        }
        SortMode::NumberOfRates => {
            doc! { "$match": { "numberOfRates": { "$gt": 0 } } }
        }
        SortMode::Breed | SortMode::MyRating => doc! { "$match": {} },
    }
}

pub fn match_url(url: &str) -> Document {
    doc! { "$match": { "url": url } }
}

/// Keeps only `ids` inside every `urlData` slot.
pub fn project_matching_user_urls(ids: &[ObjectId]) -> Document {
    doc! {
        "$project": {
            "breed": 1,
            "subBreed": 1,
            "urlData": {
                "$map": {
                    "input": "$urlData",
                    "as": "innerArray",
                    "in": {
                        "$filter": {
                            "input": "$$innerArray",
                            "as": "url",
                            "cond": { "$in": ["$$url", id_list(ids)] }
                        }
                    }
                }
            }
        }
    }
}

/// Pads the shorter array with `null`, so sub-breed-less dogs yield
/// `[null, ids]`.
pub fn project_zip_sub_breed_urls() -> Document {
    doc! {
        "$project": {
            "breed": 1,
            "urlSubBreed": {
                "$zip": {
                    "inputs": ["$subBreed", "$urlData"],
                    "useLongestLength": true
                }
            }
        }
    }
}

pub fn unwind_url_sub_breed() -> Document {
    doc! { "$unwind": "$urlSubBreed" }
}

pub fn lookup_url_rating_data() -> Document {
    doc! {
        "$lookup": {
            "from": URL_RATINGS_COLLECTION,
            "localField": "urlSubBreed.1",
            "foreignField": "_id",
            "as": "urlRatingData"
        }
    }
}

pub fn unwind_url_rating_data() -> Document {
    doc! { "$unwind": "$urlRatingData" }
}

fn average_of_ratings(path: &str) -> Document {
    doc! { "$avg": { "$avg": path } }
}

/// Flattens a joined photo into the [`RatedUrl`](crate::domain::RatedUrl)
/// shape. With a user, `myRating` is the user's entries, collapsed by
/// [`project_tidy_my_rating`].
pub fn project_standard_format(user: Option<ObjectId>) -> Document {
    let mut fields = doc! {
        "_id": 0,
        "breed": 1,
        "subBreed": { "$arrayElemAt": ["$urlSubBreed", 0] },
        "url": "$urlRatingData.url",
        "numberOfRates": "$urlRatingData.numberOfRates",
        "averageRating": average_of_ratings("$urlRatingData.userRatingData.rating"),
    };
    if let Some(user) = user {
        fields.insert(
            "myRating",
            doc! {
                "$filter": {
                    "input": "$urlRatingData.userRatingData",
                    "as": "rating",
                    "cond": { "$eq": ["$$rating.userId", user] }
                }
            },
        );
    }
    doc! { "$project": fields }
}

pub fn project_tidy_my_rating() -> Document {
    doc! {
        "$project": {
            "_id": 0,
            "breed": 1,
            "subBreed": 1,
            "url": 1,
            "numberOfRates": 1,
            "averageRating": 1,
            "myRating": {
                "$arrayElemAt": [
                    { "$map": { "input": "$myRating", "as": "rating", "in": "$$rating.rating" } },
                    0
                ]
            }
        }
    }
}

/// Runs directly on `urlratings`.
pub fn project_single_url(user: ObjectId) -> Document {
    doc! {
        "$project": {
            "_id": 0,
            "numberOfRates": 1,
            "myRating": {
                "$filter": {
                    "input": "$userRatingData",
                    "as": "rating",
                    "cond": { "$eq": ["$$rating.userId", user] }
                }
            },
            "averageRating": average_of_ratings("$userRatingData.rating"),
        }
    }
}

pub fn project_single_url_tidy() -> Document {
    doc! {
        "$project": {
            "_id": 0,
            "numberOfRates": 1,
            "myRating": { "$arrayElemAt": ["$myRating.rating", 0] },
            "averageRating": 1,
        }
    }
}

pub fn project_url_only() -> Document {
    doc! { "$project": { "_id": 0, "url": "$urlRatingData.url" } }
}

pub fn project_sub_breed_for_group() -> Document {
    doc! {
        "$project": {
            "breed": 1,
            "subBreed": { "$arrayElemAt": ["$urlSubBreed", 0] },
            "urlRatingData": 1,
        }
    }
}

/// Average of per-photo averages; unrated photos do not count.
pub fn group_by_sub_breed() -> Document {
    doc! {
        "$group": {
            "_id": { "breed": "$breed", "subBreed": "$subBreed" },
            "averageRating": average_of_ratings("$urlRatingData.userRatingData.rating"),
            "numberOfRates": { "$sum": "$urlRatingData.numberOfRates" },
        }
    }
}

pub fn project_grouped_sub_breeds() -> Document {
    doc! {
        "$project": {
            "_id": 0,
            "breed": "$_id.breed",
            "subBreed": "$_id.subBreed",
            "averageRating": 1,
            "numberOfRates": 1,
        }
    }
}

/// `url` ascending breaks ties so paging is stable.
pub fn sort_by(mode: SortMode, order: SortOrder) -> Document {
    let mut keys = Document::new();
    keys.insert(mode.field(), order.as_i32());
    keys.insert("url", 1);
    doc! { "$sort": keys }
}

pub fn sort_table_rows() -> Document {
    doc! { "$sort": { "breed": 1, "subBreed": 1 } }
}

/// Counts past `i64::MAX` are clamped; [`SortedQuery::validate`] rejects them first.
///
/// [`SortedQuery::validate`]: crate::domain::SortedQuery::validate
pub fn skip(count: u64) -> Document {
    doc! { "$skip": i64::try_from(count).unwrap_or(i64::MAX) }
}

pub fn limit(count: u32) -> Document {
    doc! { "$limit": i64::from(count) }
}

pub fn sample(size: u32) -> Document {
    doc! { "$sample": { "size": size as i64 } }
}

pub fn count(field: &str) -> Document {
    doc! { "$count": field }
}
