//! Field extraction from rendered page HTML.
//!
//! Every extractor is best-effort: a selector miss yields `None` or an empty
//! list, never an error.

use std::sync::LazyLock;

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use prospector_core::patterns::{
    decode_entities, extract_emails, extract_phones, extract_social_links, html_to_text,
};
use prospector_core::{ContactRecord, ProfileRecord, SearchResultRecord, WebsiteRecord};
use regex::Regex;
use reqwest::Url;

static META_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<meta\b[^>]*>").expect("valid regex"));
static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title\b[^>]*>(.*?)</title>").expect("valid regex"));
static H1_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h1\b[^>]*>(.*?)</h1>").expect("valid regex"));
static H3_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h3\b[^>]*>(.*?)</h3>").expect("valid regex"));
static ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<a\b([^>]*)>(.*?)</a>").expect("valid anchor regex")
});
static OPEN_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<([a-z][a-z0-9]*)\b([^>]*)>").expect("valid open tag regex")
});
static CLASS_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| attr_regex("class"));
static HREF_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| attr_regex("href"));
static CONTENT_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| attr_regex("content"));
static PROPERTY_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| attr_regex("property"));
static NAME_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| attr_regex("name"));

fn attr_regex(attr: &str) -> Regex {
    Regex::new(&format!(
        r#"(?is)(?:^|\s){attr}\s*=\s*(?:"([^"]*)"|'([^']*)')"#
    ))
    .expect("valid attribute regex")
}

/// Attributes the extractors read.
#[derive(Debug, Clone, Copy)]
enum Attr {
    Class,
    Href,
    Content,
    Property,
    Name,
}

impl Attr {
    fn regex(self) -> &'static Regex {
        match self {
            Self::Class => &CLASS_ATTR_RE,
            Self::Href => &HREF_ATTR_RE,
            Self::Content => &CONTENT_ATTR_RE,
            Self::Property => &PROPERTY_ATTR_RE,
            Self::Name => &NAME_ATTR_RE,
        }
    }
}

/// Markers in the final URL of a profile page that mean a login wall.
const AUTH_WALL_URL_MARKERS: [&str; 4] = ["authwall", "/login", "checkpoint", "/signup"];
const AUTH_WALL_NOTE: &str =
    "profile requires sign-in; only publicly visible fields were extracted";

/// Class fragments for public and signed-in profile layouts, in priority order.
const PROFILE_NAME_CLASSES: [&str; 2] = ["top-card-layout__title", "text-heading-xlarge"];
const PROFILE_HEADLINE_CLASSES: [&str; 2] = ["top-card-layout__headline", "text-body-medium"];
const PROFILE_LOCATION_CLASSES: [&str; 2] = ["top-card__subline-item", "text-body-small inline"];
const PROFILE_ABOUT_CLASSES: [&str; 2] = ["core-section-container__content", "pv-about__summary"];
const PROFILE_COMPANY_CLASSES: [&str; 2] = [
    "top-card-link--link",
    "pv-text-details__right-panel-item-text",
];

/// Class fragments of the snippet block under an organic search result.
const SNIPPET_CLASSES: [&str; 2] = ["VwiC3b", "snippet"];
const SNIPPET_MAX_CHARS: usize = 300;

/// Builds the search engine query URL for `query`.
#[must_use]
pub fn search_url(base_url: &str, query: &str, results: usize) -> String {
    let encoded = utf8_percent_encode(query.trim(), NON_ALPHANUMERIC).to_string();
    format!("{base_url}?q={encoded}&num={results}&hl=en")
}

/// `true` if the page is a sign-in wall rather than the requested profile.
#[must_use]
pub fn is_auth_wall(final_url: &str, html: &str) -> bool {
    let url = final_url.to_ascii_lowercase();
    if AUTH_WALL_URL_MARKERS.iter().any(|m| url.contains(m)) {
        return true;
    }
    let lower = html.to_ascii_lowercase();
    lower.contains("sign-in-form")
        || lower.contains("join-form")
        || (lower.contains("<form") && lower.contains("type=\"password\""))
}

/// Extracts visible profile fields. On a sign-in wall the record carries a
/// note and whatever the wall itself exposes (usually name and headline
/// from the page metadata).
#[must_use]
pub fn extract_profile(html: &str, requested_url: &str, final_url: &str) -> ProfileRecord {
    let og_title = find_meta_content(html, Attr::Property, "og:title");
    let (og_name, og_headline) = og_title
        .as_deref()
        .map(split_profile_title)
        .unwrap_or_default();

    let full_name = first_text_by_class(html, &PROFILE_NAME_CLASSES)
        .or(og_name)
        .or_else(|| first_heading(html));
    let headline = first_text_by_class(html, &PROFILE_HEADLINE_CLASSES).or(og_headline);
    let about = first_text_by_class(html, &PROFILE_ABOUT_CLASSES)
        .or_else(|| find_meta_content(html, Attr::Name, "description"));

    let mut record = ProfileRecord {
        full_name,
        headline,
        location: first_text_by_class(html, &PROFILE_LOCATION_CLASSES),
        about,
        company: first_text_by_class(html, &PROFILE_COMPANY_CLASSES),
        profile_url: Some(requested_url.to_string()),
        note: None,
    };
    if is_auth_wall(final_url, html) {
        record.note = Some(AUTH_WALL_NOTE.to_string());
    }
    record
}

/// Splits `"Ada Lovelace - Analyst | LinkedIn"` into name and headline.
fn split_profile_title(title: &str) -> (Option<String>, Option<String>) {
    let title = title.split(" | ").next().unwrap_or(title);
    let mut parts = title.splitn(2, " - ");
    let name = parts.next().map(str::trim).filter(|s| !s.is_empty());
    let headline = parts.next().map(str::trim).filter(|s| !s.is_empty());
    (name.map(str::to_string), headline.map(str::to_string))
}

/// Extracts metadata and contact details from a website page.
#[must_use]
pub fn extract_website(html: &str, url: &str) -> WebsiteRecord {
    let title = TITLE_RE
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| html_to_text(m.as_str()))
        .filter(|t| !t.is_empty())
        .or_else(|| find_meta_content(html, Attr::Property, "og:title"));
    let description = find_meta_content(html, Attr::Name, "description")
        .or_else(|| find_meta_content(html, Attr::Property, "og:description"));

    WebsiteRecord {
        url: url.to_string(),
        title,
        description,
        heading: first_heading(html),
        emails: extract_emails(html),
        phones: extract_phones(html),
        social_links: extract_social_links(html),
    }
}

/// Contact details found on one page.
#[must_use]
pub fn extract_contacts(html: &str, url: &str) -> ContactRecord {
    ContactRecord {
        emails: extract_emails(html),
        phones: extract_phones(html),
        social_links: extract_social_links(html),
        pages_visited: vec![url.to_string()],
    }
}

/// First same-site link whose href or text mentions "contact".
#[must_use]
pub fn find_contact_link(html: &str, base_url: &str) -> Option<String> {
    let base = Url::parse(base_url).ok()?;
    ANCHOR_RE.captures_iter(html).find_map(|caps| {
        let attrs = caps.get(1)?.as_str();
        let href = extract_attr(attrs, Attr::Href)?;
        let text = html_to_text(caps.get(2).map_or("", |m| m.as_str()));
        let mentions_contact = href.to_ascii_lowercase().contains("contact")
            || text.to_ascii_lowercase().contains("contact");
        if !mentions_contact {
            return None;
        }
        let target = base.join(&decode_entities(&href)).ok()?;
        let same_site = matches!(target.scheme(), "http" | "https")
            && target.host_str().map(strip_www) == base.host_str().map(strip_www);
        (same_site && target.as_str() != base.as_str()).then(|| target.to_string())
    })
}

fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

/// First `limit` organic results from a search engine results page.
///
/// A result is an anchor wrapping an `<h3>` title. Redirect wrappers are
/// unwrapped and links back to the engine itself are skipped.
#[must_use]
pub fn extract_search_results(html: &str, page_url: &str, limit: usize) -> Vec<SearchResultRecord> {
    let engine_host = Url::parse(page_url)
        .ok()
        .and_then(|u| u.host_str().map(|h| strip_www(h).to_string()));

    let anchors: Vec<_> = ANCHOR_RE
        .captures_iter(html)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let title = H3_RE
                .captures(caps.get(2)?.as_str())
                .and_then(|c| c.get(1))
                .map(|m| html_to_text(m.as_str()))
                .filter(|t| !t.is_empty())?;
            let href = extract_attr(caps.get(1)?.as_str(), Attr::Href)?;
            Some((whole.start(), whole.end(), title, href))
        })
        .collect();

    let mut results: Vec<SearchResultRecord> = Vec::new();
    for (index, (_, end, title, href)) in anchors.iter().enumerate() {
        if results.len() >= limit {
            break;
        }
        let Some(url) = unwrap_redirect(href, page_url) else {
            continue;
        };
        let host = Url::parse(&url)
            .ok()
            .and_then(|u| u.host_str().map(|h| strip_www(h).to_string()));
        if host.is_none() || host == engine_host {
            continue;
        }
        if results.iter().any(|r| r.url == url) {
            continue;
        }
        let segment_end = anchors.get(index + 1).map_or(html.len(), |next| next.0);
        let segment = html.get(*end..segment_end).unwrap_or_default();
        let position = u32::try_from(results.len() + 1).unwrap_or(u32::MAX);
        results.push(SearchResultRecord {
            position,
            title: title.clone(),
            url,
            snippet: extract_snippet(segment),
        });
    }
    results
}

fn extract_snippet(segment: &str) -> Option<String> {
    let text = first_text_by_class(segment, &SNIPPET_CLASSES).unwrap_or_else(|| html_to_text(segment));
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some(text.chars().take(SNIPPET_MAX_CHARS).collect())
}

/// Resolves `href` against `page_url` and unwraps `/url?q=` redirects.
/// Returns `None` for non-HTTP targets.
#[must_use]
pub fn unwrap_redirect(href: &str, page_url: &str) -> Option<String> {
    let base = Url::parse(page_url).ok()?;
    let resolved = base.join(&decode_entities(href)).ok()?;
    let target = if resolved.path() == "/url" {
        let inner = resolved
            .query_pairs()
            .find(|(k, _)| k == "q" || k == "url")
            .map(|(_, v)| v.into_owned())?;
        Url::parse(&inner).ok()?
    } else {
        resolved
    };
    matches!(target.scheme(), "http" | "https").then(|| target.to_string())
}

fn first_heading(html: &str) -> Option<String> {
    H1_RE
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| html_to_text(m.as_str()))
        .filter(|t| !t.is_empty())
}

/// Visible text of the first element whose class attribute contains any of
/// `fragments` (tried in order).
fn first_text_by_class(html: &str, fragments: &[&str]) -> Option<String> {
    fragments
        .iter()
        .find_map(|fragment| text_by_class(html, fragment))
}

fn text_by_class(html: &str, fragment: &str) -> Option<String> {
    OPEN_TAG_RE.captures_iter(html).find_map(|caps| {
        let class = extract_attr(caps.get(2)?.as_str(), Attr::Class)?;
        if !class.contains(fragment) {
            return None;
        }
        let tag = caps.get(1)?.as_str().to_ascii_lowercase();
        let start = caps.get(0)?.end();
        let rest = html.get(start..)?;
        let close = format!("</{tag}");
        let end = find_ignore_ascii_case(rest, &close).unwrap_or(rest.len());
        let text = html_to_text(&rest[..end]);
        (!text.is_empty()).then_some(text)
    })
}

/// Byte offset of the first ASCII-case-insensitive match of `needle`.
fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    let needle = needle.as_bytes();
    if needle.is_empty() {
        return Some(0);
    }
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle))
}

fn find_meta_content(html: &str, key_attr: Attr, key_value: &str) -> Option<String> {
    META_TAG_RE.find_iter(html).find_map(|m| {
        let tag = m.as_str();
        let key = extract_attr(tag, key_attr)?;
        if key.eq_ignore_ascii_case(key_value) {
            extract_attr(tag, Attr::Content)
                .map(|c| decode_entities(&c))
                .filter(|c| !c.is_empty())
        } else {
            None
        }
    })
}

fn extract_attr(tag: &str, attr: Attr) -> Option<String> {
    attr.regex()
        .captures(tag)
        .and_then(|c| c.get(1).or_else(|| c.get(2)))
        .map(|m| m.as_str().trim().to_string())
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
