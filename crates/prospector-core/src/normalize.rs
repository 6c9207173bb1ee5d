//! Normalization from raw, weakly-typed backend items to canonical records.
//!
//! Each canonical field has an ordered alias list; the first alias that
//! resolves to a usable value wins. Missing fields never fail normalization:
//! strings default to `""`/`None`, numbers to `None`, lists to empty. The only
//! error is being handed something that is not a JSON object.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::patterns::{extract_emails, extract_phones, extract_social_links};
use crate::records::{
    extend_unique, ContactRecord, PlaceRecord, ProfileRecord, SearchResultRecord, SocialLinks,
    WebsiteRecord,
};

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("expected a JSON object for {context}, got {found}")]
    NotAnObject {
        context: &'static str,
        found: &'static str,
    },
}

const PLACE_NAME: &[&str] = &["title", "name", "businessName"];
const PLACE_ADDRESS: &[&str] = &["address", "fullAddress", "street"];
const PLACE_PHONE: &[&str] = &["phone", "phoneUnformatted", "phoneNumber"];
const PLACE_WEBSITE: &[&str] = &["website", "websiteUrl", "domain"];
const PLACE_EMAIL: &[&str] = &["email", "emails"];
const PLACE_CATEGORY: &[&str] = &["categoryName", "category", "categories"];
const PLACE_RATING: &[&str] = &["totalScore", "rating", "stars"];
const PLACE_REVIEWS: &[&str] = &["reviewsCount", "reviewCount", "reviews"];
const PLACE_MAP_URL: &[&str] = &["url", "googleMapsUrl", "mapsUrl"];
const PLACE_EXTERNAL_ID: &[&str] = &["placeId", "place_id", "cid"];
const PLACE_LAT: &[&str] = &["location.lat", "latitude", "lat"];
const PLACE_LNG: &[&str] = &["location.lng", "longitude", "lng"];

const PROFILE_NAME: &[&str] = &["fullName", "name", "full_name"];
const PROFILE_FIRST: &[&str] = &["firstName", "first_name"];
const PROFILE_LAST: &[&str] = &["lastName", "last_name"];
const PROFILE_HEADLINE: &[&str] = &["headline", "occupation", "title", "jobTitle"];
const PROFILE_LOCATION: &[&str] = &[
    "location",
    "addressWithCountry",
    "geoLocationName",
    "locationName",
];
const PROFILE_ABOUT: &[&str] = &["about", "summary", "description"];
const PROFILE_COMPANY: &[&str] = &[
    "companyName",
    "company",
    "currentCompany",
    "experiences.0.companyName",
];
const PROFILE_URL: &[&str] = &["linkedinUrl", "profileUrl", "url", "publicIdentifierUrl"];

const WEBSITE_URL: &[&str] = &["url", "loadedUrl", "startUrl"];
const WEBSITE_TITLE: &[&str] = &["metadata.title", "title", "pageTitle"];
const WEBSITE_DESCRIPTION: &[&str] = &["metadata.description", "description", "metaDescription"];
const WEBSITE_HEADING: &[&str] = &["metadata.h1", "h1", "heading"];
const WEBSITE_TEXT: &[&str] = &["text", "markdown", "html"];

const CONTACT_EMAILS: &[&str] = &["emails", "email"];
const CONTACT_PHONES: &[&str] = &["phones", "phonesUncertain", "phone"];
const CONTACT_PAGE: &[&str] = &["url", "originalStartUrl", "domain"];

const SEARCH_TITLE: &[&str] = &["title", "name"];
const SEARCH_URL: &[&str] = &["url", "link", "href"];
const SEARCH_SNIPPET: &[&str] = &["description", "snippet", "text"];

const SOCIAL_KEYS: &[(&str, &str)] = &[
    ("linkedIns", "linkedin"),
    ("linkedin", "linkedin"),
    ("twitters", "twitter"),
    ("twitter", "twitter"),
    ("facebooks", "facebook"),
    ("facebook", "facebook"),
    ("instagrams", "instagram"),
    ("instagram", "instagram"),
    ("youtubes", "youtube"),
    ("youtube", "youtube"),
    ("tiktoks", "tiktok"),
    ("tiktok", "tiktok"),
];

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn as_object<'a>(
    item: &'a Value,
    context: &'static str,
) -> Result<&'a Map<String, Value>, NormalizeError> {
    item.as_object().ok_or(NormalizeError::NotAnObject {
        context,
        found: kind_name(item),
    })
}

/// Walks a dotted path (`location.lat`, `experiences.0.companyName`).
fn lookup_path<'a>(obj: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = obj.get(segments.next()?)?;
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Scalar text for a value: strings trimmed, numbers stringified, arrays
/// resolved to their first usable element.
fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => items.iter().find_map(text_of),
        Value::Object(map) => map.get("name").or_else(|| map.get("text")).and_then(text_of),
        _ => None,
    }
}

fn number_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

fn first_text(obj: &Map<String, Value>, aliases: &[&str]) -> Option<String> {
    aliases
        .iter()
        .find_map(|alias| lookup_path(obj, alias).and_then(text_of))
}

fn first_number(obj: &Map<String, Value>, aliases: &[&str]) -> Option<f64> {
    aliases
        .iter()
        .find_map(|alias| lookup_path(obj, alias).and_then(number_of))
}

/// Every string found under any alias (arrays flattened), deduplicated.
fn all_texts(obj: &Map<String, Value>, aliases: &[&str]) -> Vec<String> {
    let mut out = Vec::new();
    for alias in aliases {
        match lookup_path(obj, alias) {
            Some(Value::Array(items)) => {
                let texts: Vec<String> = items.iter().filter_map(text_of).collect();
                extend_unique(&mut out, texts.iter().map(String::as_str));
            }
            Some(value) => {
                if let Some(text) = text_of(value) {
                    extend_unique(&mut out, [text.as_str()]);
                }
            }
            None => {}
        }
    }
    out
}

fn social_links_of(obj: &Map<String, Value>) -> SocialLinks {
    let mut links = SocialLinks::default();
    for (key, network) in SOCIAL_KEYS {
        for link in all_texts(obj, &[*key]) {
            links.add(network, &link);
        }
    }
    links
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn review_count_of(obj: &Map<String, Value>) -> u64 {
    first_number(obj, PLACE_REVIEWS).map_or(0, |n| if n <= 0.0 { 0 } else { n.round() as u64 })
}

/// Normalizes one places item into a [`PlaceRecord`].
///
/// # Errors
///
/// Returns [`NormalizeError::NotAnObject`] if `item` is not a JSON object.
pub fn normalize_place(
    item: &Value,
    source: &str,
    scraped_at: DateTime<Utc>,
) -> Result<PlaceRecord, NormalizeError> {
    let obj = as_object(item, "place")?;
    let text = |aliases: &[&str]| first_text(obj, aliases).unwrap_or_default();
    let external_place_id = text(PLACE_EXTERNAL_ID);
    let id = if external_place_id.is_empty() {
        uuid::Uuid::new_v4().to_string()
    } else {
        external_place_id.clone()
    };

    Ok(PlaceRecord {
        id,
        name: text(PLACE_NAME),
        address: text(PLACE_ADDRESS),
        phone: text(PLACE_PHONE),
        website: text(PLACE_WEBSITE),
        email: text(PLACE_EMAIL),
        category: text(PLACE_CATEGORY),
        rating: first_number(obj, PLACE_RATING),
        review_count: review_count_of(obj),
        map_url: text(PLACE_MAP_URL),
        external_place_id,
        latitude: first_number(obj, PLACE_LAT),
        longitude: first_number(obj, PLACE_LNG),
        social_media: social_links_of(obj),
        source: source.to_string(),
        scraped_at,
    })
}

/// Normalizes one profile item into a [`ProfileRecord`].
///
/// # Errors
///
/// Returns [`NormalizeError::NotAnObject`] if `item` is not a JSON object.
pub fn normalize_profile(item: &Value) -> Result<ProfileRecord, NormalizeError> {
    let obj = as_object(item, "profile")?;
    let full_name = first_text(obj, PROFILE_NAME).or_else(|| {
        let parts: Vec<String> = [PROFILE_FIRST, PROFILE_LAST]
            .into_iter()
            .filter_map(|aliases| first_text(obj, aliases))
            .collect();
        (!parts.is_empty()).then(|| parts.join(" "))
    });

    Ok(ProfileRecord {
        full_name,
        headline: first_text(obj, PROFILE_HEADLINE),
        location: first_text(obj, PROFILE_LOCATION),
        about: first_text(obj, PROFILE_ABOUT),
        company: first_text(obj, PROFILE_COMPANY),
        profile_url: first_text(obj, PROFILE_URL),
        note: None,
    })
}

/// Normalizes one crawled page into a [`WebsiteRecord`], mining the page
/// text for contact details.
///
/// # Errors
///
/// Returns [`NormalizeError::NotAnObject`] if `item` is not a JSON object.
pub fn normalize_website(item: &Value) -> Result<WebsiteRecord, NormalizeError> {
    let obj = as_object(item, "website page")?;
    let body = first_text(obj, WEBSITE_TEXT).unwrap_or_default();
    let mut social_links = extract_social_links(&body);
    social_links.merge(&social_links_of(obj));

    Ok(WebsiteRecord {
        url: first_text(obj, WEBSITE_URL).unwrap_or_default(),
        title: first_text(obj, WEBSITE_TITLE),
        description: first_text(obj, WEBSITE_DESCRIPTION),
        heading: first_text(obj, WEBSITE_HEADING),
        emails: extract_emails(&body),
        phones: extract_phones(&body),
        social_links,
    })
}

/// Folds every contact item into one [`ContactRecord`].
///
/// # Errors
///
/// Returns [`NormalizeError::NotAnObject`] if any item is not a JSON object.
pub fn normalize_contacts(items: &[Value]) -> Result<ContactRecord, NormalizeError> {
    let mut record = ContactRecord::default();
    for item in items {
        let obj = as_object(item, "contact item")?;
        let emails: Vec<String> = all_texts(obj, CONTACT_EMAILS)
            .iter()
            .map(|e| e.to_ascii_lowercase())
            .collect();
        let found = ContactRecord {
            emails,
            phones: all_texts(obj, CONTACT_PHONES),
            social_links: social_links_of(obj),
            pages_visited: first_text(obj, CONTACT_PAGE).into_iter().collect(),
        };
        record.merge(&found);
    }
    Ok(record)
}

/// Flattens search items into ranked [`SearchResultRecord`]s.
///
/// Items may be result pages carrying an `organicResults` array or bare
/// results; results without a URL are skipped. Positions are renumbered
/// from 1 in output order.
///
/// # Errors
///
/// Returns [`NormalizeError::NotAnObject`] if an item or nested result is
/// not a JSON object.
pub fn normalize_search_results(items: &[Value]) -> Result<Vec<SearchResultRecord>, NormalizeError> {
    let mut results = Vec::new();
    for item in items {
        let obj = as_object(item, "search item")?;
        if let Some(Value::Array(organic)) = obj.get("organicResults") {
            for entry in organic {
                push_search_result(&mut results, as_object(entry, "organic result")?);
            }
        } else {
            push_search_result(&mut results, obj);
        }
    }
    Ok(results)
}

fn push_search_result(results: &mut Vec<SearchResultRecord>, obj: &Map<String, Value>) {
    let Some(url) = first_text(obj, SEARCH_URL) else {
        return;
    };
    if results.iter().any(|r| r.url == url) {
        return;
    }
    let position = u32::try_from(results.len() + 1).unwrap_or(u32::MAX);
    results.push(SearchResultRecord {
        position,
        title: first_text(obj, SEARCH_TITLE).unwrap_or_default(),
        url,
        snippet: first_text(obj, SEARCH_SNIPPET),
    });
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
