//! Bulk places search request/response types and local post-filters.

use serde::{Deserialize, Serialize};

use crate::records::PlaceRecord;

const DEFAULT_MAX_RESULTS: u32 = 20;
const MAX_RESULTS_CAP: u32 = 500;

/// Caller parameters for a places search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlacesQuery {
    pub query: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub max_results: Option<u32>,
    #[serde(default)]
    pub has_website: Option<bool>,
    #[serde(default)]
    pub max_reviews: Option<u64>,
}

impl PlacesQuery {
    /// Result cap sent to the remote job, defaulted and bounded.
    #[must_use]
    pub fn result_cap(&self) -> u32 {
        self.max_results
            .unwrap_or(DEFAULT_MAX_RESULTS)
            .clamp(1, MAX_RESULTS_CAP)
    }

    #[must_use]
    pub fn filter(&self) -> PlacesFilter {
        PlacesFilter {
            has_website: self.has_website.unwrap_or(false),
            max_reviews: self.max_reviews,
        }
    }
}

/// Local filters applied after normalization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlacesFilter {
    /// Keep only places with a non-blank website.
    pub has_website: bool,
    /// Keep only places with at most this many reviews.
    pub max_reviews: Option<u64>,
}

/// Applies `filter` to `records`, preserving order. The input is untouched.
#[must_use]
pub fn filter_places(records: &[PlaceRecord], filter: &PlacesFilter) -> Vec<PlaceRecord> {
    records
        .iter()
        .filter(|place| !filter.has_website || place.has_website())
        .filter(|place| {
            filter
                .max_reviews
                .is_none_or(|max| place.review_count <= max)
        })
        .cloned()
        .collect()
}

/// Response of a bulk places search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlacesSearchResult {
    pub success: bool,
    pub data: Vec<PlaceRecord>,
    pub total_results: usize,
    pub source: String,
    pub actor_id: String,
    pub run_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PlacesSearchResult {
    pub fn failed(actor_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: Vec::new(),
            total_results: 0,
            source: "apify".to_string(),
            actor_id: actor_id.into(),
            run_id: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::SocialLinks;
    use chrono::Utc;

    fn place(name: &str, website: &str, review_count: u64) -> PlaceRecord {
        PlaceRecord {
            id: name.to_string(),
            name: name.to_string(),
            address: String::new(),
            phone: String::new(),
            website: website.to_string(),
            email: String::new(),
            category: String::new(),
            rating: None,
            review_count,
            map_url: String::new(),
            external_place_id: String::new(),
            latitude: None,
            longitude: None,
            social_media: SocialLinks::default(),
            source: "apify".to_string(),
            scraped_at: Utc::now(),
        }
    }

    fn names(records: &[PlaceRecord]) -> Vec<&str> {
        records.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn has_website_keeps_only_places_with_websites_in_order() {
        let records: Vec<PlaceRecord> = (0..10)
            .map(|i| {
                let website = if matches!(i, 1 | 4 | 6 | 9) {
                    format!("https://p{i}.example")
                } else if i == 2 {
                    "   ".to_string()
                } else {
                    String::new()
                };
                place(&format!("p{i}"), &website, 0)
            })
            .collect();
        let filter = PlacesFilter {
            has_website: true,
            max_reviews: None,
        };
        let kept = filter_places(&records, &filter);
        assert_eq!(names(&kept), vec!["p1", "p4", "p6", "p9"]);
        assert_eq!(records.len(), 10, "input is not mutated");
    }

    #[test]
    fn max_reviews_drops_places_above_cap() {
        let records = vec![
            place("zero", "", 0),
            place("five", "", 5),
            place("twelve", "", 12),
            place("fifty", "", 50),
        ];
        let filter = PlacesFilter {
            has_website: false,
            max_reviews: Some(10),
        };
        assert_eq!(names(&filter_places(&records, &filter)), vec!["zero", "five"]);
    }

    #[test]
    fn default_filter_keeps_everything() {
        let records = vec![place("a", "", 3), place("b", "https://b.example", 300)];
        assert_eq!(filter_places(&records, &PlacesFilter::default()).len(), 2);
    }

    #[test]
    fn result_cap_is_defaulted_and_bounded() {
        let mut query = PlacesQuery {
            query: "coffee".to_string(),
            location: None,
            max_results: None,
            has_website: None,
            max_reviews: None,
        };
        assert_eq!(query.result_cap(), 20);
        query.max_results = Some(0);
        assert_eq!(query.result_cap(), 1);
        query.max_results = Some(10_000);
        assert_eq!(query.result_cap(), 500);
    }
}
