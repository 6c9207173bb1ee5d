//! Best-effort contact pattern extraction (emails, phone numbers, social
//! profile links) from page HTML or plain text.
//!
//! Every function returns an empty list rather than failing; misses are
//! expected.

use std::sync::LazyLock;

use regex::Regex;

use crate::records::{extend_unique, SocialLinks};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,24}\b").expect("valid email regex")
});
static TEL_HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)href\s*=\s*["']tel:([^"']+)["']"#).expect("valid tel regex"));
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\+\d{1,3}[\s.\-]?)?(?:\(\d{2,4}\)|\d{2,4})[\s.\-]\d{3,4}[\s.\-]?\d{3,4}\b")
        .expect("valid phone regex")
});
static SOCIAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)https?://(?:[a-z]{2,3}\.)?(?:www\.)?(linkedin\.com/(?:in|company|school)/[^\s"'<>?#]+|twitter\.com/[a-z0-9_]{1,15}|x\.com/[a-z0-9_]{1,15}|facebook\.com/[^\s"'<>?#]+|instagram\.com/[a-z0-9_.]+|youtube\.com/(?:c/|channel/|user/|@)[^\s"'<>?#]+|tiktok\.com/@[a-z0-9_.]+)"#,
    )
    .expect("valid social regex")
});
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag regex"));
static SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style|noscript)\b[^>]*>.*?</(script|style|noscript)>")
        .expect("valid script regex")
});
static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid ws regex"));

const ASSET_SUFFIXES: [&str; 6] = [".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp"];
const IGNORED_EMAIL_DOMAINS: [&str; 4] = [
    "example.com",
    "sentry.io",
    "wixpress.com",
    "domain.com",
];
const SHARE_MARKERS: [&str; 5] = ["/sharer", "/share", "/intent", "/dialog", "/plugins"];

/// Email addresses in order of first appearance, lowercased.
///
/// Image file names that look like addresses (`logo@2x.png`) and common
/// placeholder domains are dropped.
#[must_use]
pub fn extract_emails(text: &str) -> Vec<String> {
    let mut emails = Vec::new();
    for m in EMAIL_RE.find_iter(text) {
        let email = m.as_str().trim_matches('.').to_ascii_lowercase();
        if ASSET_SUFFIXES.iter().any(|s| email.ends_with(s)) {
            continue;
        }
        let domain = email.rsplit('@').next().unwrap_or_default();
        if IGNORED_EMAIL_DOMAINS.contains(&domain) {
            continue;
        }
        extend_unique(&mut emails, [email.as_str()]);
    }
    emails
}

/// Phone numbers from `tel:` links and visible text.
///
/// Candidates with fewer than 7 or more than 15 digits are discarded.
#[must_use]
pub fn extract_phones(html: &str) -> Vec<String> {
    let mut phones = Vec::new();
    for caps in TEL_HREF_RE.captures_iter(html) {
        if let Some(raw) = caps.get(1) {
            push_phone(&mut phones, raw.as_str());
        }
    }
    let text = html_to_text(html);
    for m in PHONE_RE.find_iter(&text) {
        push_phone(&mut phones, m.as_str());
    }
    phones
}

fn push_phone(phones: &mut Vec<String>, raw: &str) {
    let cleaned = raw.replace("%20", " ");
    let cleaned = cleaned.trim();
    let digits = cleaned.chars().filter(char::is_ascii_digit).count();
    if !(7..=15).contains(&digits) {
        return;
    }
    let key: String = cleaned.chars().filter(char::is_ascii_digit).collect();
    let duplicate = phones
        .iter()
        .any(|p| p.chars().filter(char::is_ascii_digit).collect::<String>() == key);
    if !duplicate {
        phones.push(cleaned.to_string());
    }
}

/// Social profile links, grouped by network. Share/intent widgets are skipped.
#[must_use]
pub fn extract_social_links(html: &str) -> SocialLinks {
    let mut links = SocialLinks::default();
    for m in SOCIAL_RE.find_iter(html) {
        let link = m.as_str().trim_end_matches('/');
        let lower = link.to_ascii_lowercase();
        if SHARE_MARKERS.iter().any(|marker| lower.contains(marker)) {
            continue;
        }
        if let Some(network) = social_network(&lower) {
            links.add(network, link);
        }
    }
    links
}

/// Network name for a social URL, if recognized.
#[must_use]
pub fn social_network(url: &str) -> Option<&'static str> {
    let lower = url.to_ascii_lowercase();
    if lower.contains("linkedin.com/") {
        Some("linkedin")
    } else if lower.contains("twitter.com/") || lower.contains("//x.com/") || lower.contains(".x.com/") {
        Some("twitter")
    } else if lower.contains("facebook.com/") {
        Some("facebook")
    } else if lower.contains("instagram.com/") {
        Some("instagram")
    } else if lower.contains("youtube.com/") {
        Some("youtube")
    } else if lower.contains("tiktok.com/") {
        Some("tiktok")
    } else {
        None
    }
}

/// Visible text of an HTML fragment: scripts/styles removed, tags stripped,
/// common entities decoded, whitespace collapsed.
#[must_use]
pub fn html_to_text(html: &str) -> String {
    let without_scripts = SCRIPT_RE.replace_all(html, " ");
    let without_tags = TAG_RE.replace_all(&without_scripts, " ");
    let decoded = decode_entities(&without_tags);
    WS_RE.replace_all(&decoded, " ").trim().to_string()
}

#[must_use]
pub fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_emails_and_skips_asset_names() {
        let html = r#"<a href="mailto:Sales@Acme.io">Sales@Acme.io</a>
            <img src="/img/logo@2x.png"> hello@acme.io, info@example.com"#;
        assert_eq!(extract_emails(html), vec!["sales@acme.io", "hello@acme.io"]);
    }

    #[test]
    fn extracts_phones_from_tel_links_and_text_without_duplicates() {
        let html = r#"<a href="tel:+15550100200">Call</a>
            <p>Office: +1 555-010-0200</p><p>Fax: (555) 010 0300</p><p>Order #12345</p>"#;
        let phones = extract_phones(html);
        assert_eq!(phones, vec!["+15550100200", "(555) 010 0300"]);
    }

    #[test]
    fn extracts_social_profiles_and_ignores_share_widgets() {
        let html = r#"
            <a href="https://www.linkedin.com/company/acme/">LinkedIn</a>
            <a href="https://twitter.com/acmehq">Twitter</a>
            <a href="https://www.facebook.com/sharer/sharer.php?u=x">Share</a>
            <a href="https://www.instagram.com/acme.hq">IG</a>
            <a href="https://x.com/intent/tweet?text=hi">Tweet</a>
        "#;
        let links = extract_social_links(html);
        assert_eq!(links.linkedin, vec!["https://www.linkedin.com/company/acme"]);
        assert_eq!(links.twitter, vec!["https://twitter.com/acmehq"]);
        assert_eq!(links.instagram, vec!["https://www.instagram.com/acme.hq"]);
        assert!(links.facebook.is_empty());
    }

    #[test]
    fn html_to_text_drops_scripts_and_collapses_whitespace() {
        let html = "<div>Hello <b>there</b>&amp; welcome<script>var x = 1;</script>\n\n</div>";
        assert_eq!(html_to_text(html), "Hello there & welcome");
    }
}
