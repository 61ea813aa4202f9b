//! Rust evaluation of the aggregation views over in-memory documents.
//!
//! Mirrors the pipelines in `aggregate::pipelines`: dogs are expanded into
//! one row per photo slot entry, joined with their `UrlRating`, and
//! formatted, sorted, grouped or counted the same way.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use mongodb::bson::oid::ObjectId;
use ordered_float::OrderedFloat;
use rand::seq::IndexedRandom;

use crate::domain::{
    BreedFilter, Dog, RatedUrl, SortMode, SortOrder, SortedQuery, TableRow,
    UrlRating,
};

/// A photo joined with the breed slot it sits in.
#[derive(Debug, Clone, Copy)]
pub(crate) struct JoinedPhoto<'a> {
    pub breed: &'a str,
    pub sub_breed: Option<&'a str>,
    pub rating: &'a UrlRating,
}

impl JoinedPhoto<'_> {
    pub fn format(&self, user: Option<ObjectId>) -> RatedUrl {
        RatedUrl {
            breed: self.breed.to_string(),
            sub_breed: self.sub_breed.map(str::to_string),
            url: self.rating.url.clone(),
            number_of_rates: self.rating.number_of_rates,
            average_rating: self.rating.average_rating(),
            my_rating: user
                .and_then(|user| self.rating.entry_for(user))
                .and_then(|entry| entry.rating),
        }
    }
}

/// Zips sub-breeds with slots, unwinds, and joins against `ratings`.
/// `only` restricts slot entries to the given ids.
pub(crate) fn join_photos<'a>(
    dogs: &'a [Dog],
    ratings: &'a HashMap<ObjectId, UrlRating>,
    only: Option<&HashSet<ObjectId>>,
) -> Vec<JoinedPhoto<'a>> {
    let mut rows = Vec::new();
    for dog in dogs {
        let slots = dog.sub_breed.len().max(dog.url_data.len());
        for index in 0..slots {
            let Some(ids) = dog.url_data.get(index) else {
                continue;
            };
            let sub_breed = dog.sub_breed.get(index).map(String::as_str);
            let mut seen = HashSet::new();
            for id in ids {
                if !seen.insert(*id) {
                    continue;
                }
                if only.is_some_and(|only| !only.contains(id)) {
                    continue;
                }
                if let Some(rating) = ratings.get(id) {
                    rows.push(JoinedPhoto {
                        breed: &dog.breed,
                        sub_breed,
                        rating,
                    });
                }
            }
        }
    }
    rows
}

pub(crate) fn filter_breed<'a>(
    rows: Vec<JoinedPhoto<'a>>,
    filter: Option<&BreedFilter>,
) -> Vec<JoinedPhoto<'a>> {
    match filter {
        Some(filter) => rows
            .into_iter()
            .filter(|row| filter.matches(row.breed, row.sub_breed))
            .collect(),
        None => rows,
    }
}

fn nullable(value: Option<f64>) -> Option<OrderedFloat<f64>> {
    value.map(OrderedFloat)
}

/// Nulls sort before numbers; `url` ascending breaks ties.
pub(crate) fn compare(
    a: &RatedUrl,
    b: &RatedUrl,
    mode: SortMode,
    order: SortOrder,
) -> Ordering {
    let primary = match mode {
        SortMode::Breed => a.breed.cmp(&b.breed),
        SortMode::AverageRating => {
            nullable(a.average_rating).cmp(&nullable(b.average_rating))
        }
        SortMode::NumberOfRates => a.number_of_rates.cmp(&b.number_of_rates),
        SortMode::MyRating => nullable(a.my_rating).cmp(&nullable(b.my_rating)),
    };
    let primary = match order {
        SortOrder::Ascending => primary,
        SortOrder::Descending => primary.reverse(),
    };
    primary.then_with(|| a.url.cmp(&b.url))
}

fn is_rated_for(row: &RatedUrl, mode: SortMode) -> bool {
    match mode {
        SortMode::AverageRating => row.average_rating.is_some(),
        SortMode::NumberOfRates => row.number_of_rates > 0,
        SortMode::Breed | SortMode::MyRating => true,
    }
}

/// Sort, optionally hide unrated rows, then page.
pub(crate) fn sort_and_page(
    mut rows: Vec<RatedUrl>,
    query: &SortedQuery,
    hide_unrated: bool,
) -> Vec<RatedUrl> {
    rows.sort_by(|a, b| compare(a, b, query.sort_mode, query.sort_order));
    rows.into_iter()
        .filter(|row| !hide_unrated || is_rated_for(row, query.sort_mode))
        .skip(usize::try_from(query.skip_count).unwrap_or(usize::MAX))
        .take(query.sample_size as usize)
        .collect()
}

pub(crate) fn sample(
    rows: &[JoinedPhoto<'_>],
    size: u32,
    user: Option<ObjectId>,
) -> Vec<RatedUrl> {
    let mut rng = rand::rng();
    rows.choose_multiple(&mut rng, size as usize)
        .map(|row| row.format(user))
        .collect()
}

/// Per (breed, sub-breed): mean of per-photo averages and summed rate counts,
/// ordered by breed then sub-breed.
pub(crate) fn table_rows(rows: &[JoinedPhoto<'_>]) -> Vec<TableRow> {
    #[derive(Default)]
    struct Group {
        averages: Vec<f64>,
        number_of_rates: i64,
    }

    let mut groups: BTreeMap<(String, Option<String>), Group> = BTreeMap::new();
    for row in rows {
        let group = groups
            .entry((row.breed.to_string(), row.sub_breed.map(str::to_string)))
            .or_default();
        if let Some(average) = row.rating.average_rating() {
            group.averages.push(average);
        }
        group.number_of_rates += row.rating.number_of_rates;
    }

    groups
        .into_iter()
        .map(|((breed, sub_breed), group)| TableRow {
            breed,
            sub_breed,
            average_rating: (!group.averages.is_empty()).then(|| {
                group.averages.iter().sum::<f64>() / group.averages.len() as f64
            }),
            number_of_rates: group.number_of_rates,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserRating;

    fn photo(url: &str, ratings: &[Option<f64>]) -> UrlRating {
        let mut photo = UrlRating::new(url);
        for rating in ratings {
            photo.user_rating_data.push(UserRating {
                user_id: ObjectId::new(),
                rating: *rating,
            });
        }
        photo.number_of_rates = ratings.iter().filter(|r| r.is_some()).count() as i64;
        photo
    }

    fn rated(url: &str, average: Option<f64>, rates: i64) -> RatedUrl {
        RatedUrl {
            breed: "pug".into(),
            sub_breed: None,
            url: url.into(),
            number_of_rates: rates,
            average_rating: average,
            my_rating: None,
        }
    }

    #[test]
    fn join_expands_sub_breed_slots_and_skips_missing_ratings() {
        let a = photo("a", &[]);
        let b = photo("b", &[]);
        let mut dog = Dog::new("hound");
        dog.sub_breed = vec!["afghan".into(), "basset".into()];
        dog.url_data = vec![vec![a.id, a.id], vec![b.id, ObjectId::new()]];
        let dogs = vec![dog];
        let ratings: HashMap<ObjectId, UrlRating> =
            [(a.id, a.clone()), (b.id, b.clone())].into_iter().collect();

        let rows = join_photos(&dogs, &ratings, None);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].sub_breed, Some("afghan"));
        assert_eq!(rows[1].sub_breed, Some("basset"));
    }

    #[test]
    fn descending_average_puts_nulls_last_and_ties_by_url() {
        let mut rows = vec![
            rated("c", Some(3.0), 1),
            rated("a", None, 0),
            rated("b", Some(3.0), 2),
            rated("d", Some(4.5), 1),
        ];
        rows.sort_by(|x, y| {
            compare(x, y, SortMode::AverageRating, SortOrder::Descending)
        });
        let urls: Vec<&str> = rows.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["d", "b", "c", "a"]);
    }

    #[test]
    fn sort_and_page_hides_unrated_when_sorting_by_rating() {
        let rows = vec![
            rated("a", None, 0),
            rated("b", Some(2.0), 1),
            rated("c", Some(5.0), 1),
        ];
        let query = SortedQuery {
            sort_mode: SortMode::NumberOfRates,
            sort_order: SortOrder::Ascending,
            skip_count: 1,
            sample_size: 10,
            filtered_breed: None,
        };
        let page = sort_and_page(rows, &query, true);
        let urls: Vec<&str> = page.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["c"]);
    }

    #[test]
    fn table_averages_per_photo_averages() {
        let first = photo("a", &[Some(5.0), Some(3.0)]);
        let second = photo("b", &[Some(1.0)]);
        let unrated = photo("c", &[None]);
        let mut dog = Dog::new("pug");
        dog.url_data = vec![vec![first.id, second.id, unrated.id]];
        let dogs = vec![dog];
        let ratings: HashMap<ObjectId, UrlRating> = [first, second, unrated]
            .into_iter()
            .map(|r| (r.id, r))
            .collect();

        let rows = table_rows(&join_photos(&dogs, &ratings, None));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].average_rating, Some(2.5));
        assert_eq!(rows[0].number_of_rates, 3);
        assert_eq!(rows[0].sub_breed, None);
    }
}
