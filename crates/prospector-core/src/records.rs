//! Canonical, backend-independent record shapes.
//!
//! Both backends emit these after normalization, so storage and UI only ever
//! see one layout per lookup kind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Social profile links grouped by network, deduplicated in order of first
/// appearance.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SocialLinks {
    #[serde(default)]
    pub linkedin: Vec<String>,
    #[serde(default)]
    pub twitter: Vec<String>,
    #[serde(default)]
    pub facebook: Vec<String>,
    #[serde(default)]
    pub instagram: Vec<String>,
    #[serde(default)]
    pub youtube: Vec<String>,
    #[serde(default)]
    pub tiktok: Vec<String>,
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    let value = value.trim();
    if !value.is_empty() && !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}

impl SocialLinks {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.linkedin.is_empty()
            && self.twitter.is_empty()
            && self.facebook.is_empty()
            && self.instagram.is_empty()
            && self.youtube.is_empty()
            && self.tiktok.is_empty()
    }

    /// Mutable list for a network name; unknown networks return `None`.
    pub fn network_mut(&mut self, network: &str) -> Option<&mut Vec<String>> {
        match network {
            "linkedin" => Some(&mut self.linkedin),
            "twitter" | "x" => Some(&mut self.twitter),
            "facebook" => Some(&mut self.facebook),
            "instagram" => Some(&mut self.instagram),
            "youtube" => Some(&mut self.youtube),
            "tiktok" => Some(&mut self.tiktok),
            _ => None,
        }
    }

    pub fn add(&mut self, network: &str, link: &str) {
        if let Some(list) = self.network_mut(network) {
            push_unique(list, link);
        }
    }

    pub fn merge(&mut self, other: &SocialLinks) {
        for (network, links) in [
            ("linkedin", &other.linkedin),
            ("twitter", &other.twitter),
            ("facebook", &other.facebook),
            ("instagram", &other.instagram),
            ("youtube", &other.youtube),
            ("tiktok", &other.tiktok),
        ] {
            for link in links {
                self.add(network, link);
            }
        }
    }
}

/// Appends `values` to `list`, skipping blanks and duplicates.
pub fn extend_unique<'a>(list: &mut Vec<String>, values: impl IntoIterator<Item = &'a str>) {
    for value in values {
        push_unique(list, value);
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    pub full_name: Option<String>,
    pub headline: Option<String>,
    pub location: Option<String>,
    pub about: Option<String>,
    pub company: Option<String>,
    pub profile_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteRecord {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub heading: Option<String>,
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default)]
    pub phones: Vec<String>,
    #[serde(default)]
    pub social_links: SocialLinks,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContactRecord {
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default)]
    pub phones: Vec<String>,
    #[serde(default)]
    pub social_links: SocialLinks,
    #[serde(default)]
    pub pages_visited: Vec<String>,
}

impl ContactRecord {
    pub fn merge(&mut self, other: &ContactRecord) {
        extend_unique(&mut self.emails, other.emails.iter().map(String::as_str));
        extend_unique(&mut self.phones, other.phones.iter().map(String::as_str));
        self.social_links.merge(&other.social_links);
        extend_unique(
            &mut self.pages_visited,
            other.pages_visited.iter().map(String::as_str),
        );
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultRecord {
    pub position: u32,
    pub title: String,
    pub url: String,
    pub snippet: Option<String>,
}

/// A business listing from a bulk places search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlaceRecord {
    pub id: String,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub website: String,
    pub email: String,
    pub category: String,
    pub rating: Option<f64>,
    pub review_count: u64,
    pub map_url: String,
    pub external_place_id: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub social_media: SocialLinks,
    pub source: String,
    pub scraped_at: DateTime<Utc>,
}

impl PlaceRecord {
    #[must_use]
    pub fn has_website(&self) -> bool {
        !self.website.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn social_links_dedup_and_ignore_unknown_networks() {
        let mut links = SocialLinks::default();
        links.add("linkedin", "https://linkedin.com/company/acme");
        links.add("linkedin", "https://linkedin.com/company/acme");
        links.add("x", "https://x.com/acme");
        links.add("myspace", "https://myspace.com/acme");
        assert_eq!(links.linkedin.len(), 1);
        assert_eq!(links.twitter, vec!["https://x.com/acme"]);
        assert!(!links.is_empty());
    }

    #[test]
    fn contact_merge_preserves_first_seen_order() {
        let mut left = ContactRecord {
            emails: vec!["a@acme.test".to_string()],
            ..ContactRecord::default()
        };
        let right = ContactRecord {
            emails: vec!["b@acme.test".to_string(), "a@acme.test".to_string()],
            phones: vec!["+1 555 0100".to_string()],
            ..ContactRecord::default()
        };
        left.merge(&right);
        assert_eq!(left.emails, vec!["a@acme.test", "b@acme.test"]);
        assert_eq!(left.phones, vec!["+1 555 0100"]);
    }
}
