use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::constants::limits::MAX_KEYWORD_LEN;
use crate::domain::RecordId;
use crate::entities::keyword_records;

static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"<[^>]*>").unwrap()
});

/// A set of trigger phrases mapped to one reply image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordRecord {
    pub id: RecordId,
    pub keywords: Vec<String>,
    pub image_url: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<keyword_records::Model> for KeywordRecord {
    fn from(model: keyword_records::Model) -> Self {
        let keywords = serde_json::from_str(&model.keywords).unwrap_or_else(|e| {
            tracing::warn!(record_id = model.id, error = %e, "Stored keywords are not a JSON array");
            Vec::new()
        });

        Self {
            id: RecordId::new(model.id),
            keywords,
            image_url: model.image_url,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Removes HTML tags, trims, and caps a single keyword at the keyword length limit.
#[must_use]
pub fn sanitize_keyword(raw: &str) -> String {
    let stripped = HTML_TAG.replace_all(raw, "");
    stripped.trim().chars().take(MAX_KEYWORD_LEN).collect()
}

/// Sanitizes each entry and drops the ones that end up empty.
pub fn sanitize_keywords<'a, I>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    raw.into_iter()
        .filter(|kw| !kw.trim().is_empty())
        .map(sanitize_keyword)
        .filter(|kw| !kw.is_empty())
        .collect()
}

/// Splits comma-separated keyword input the way the console form submits it.
#[must_use]
pub fn parse_keyword_list(raw: &str) -> Vec<String> {
    sanitize_keywords(raw.split(','))
}

/// Image URLs must be absolute `https` URLs with a host.
#[must_use]
pub fn is_valid_image_url(raw: &str) -> bool {
    let raw = raw.trim();
    if raw.is_empty() {
        return false;
    }

    url::Url::parse(raw).is_ok_and(|url| url.scheme() == "https" && url.host_str().is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_keyword_strips_tags_and_whitespace() {
        assert_eq!(sanitize_keyword("  hello  "), "hello");
        assert_eq!(sanitize_keyword("<b>bold</b>"), "bold");
        assert_eq!(sanitize_keyword("<script>alert(1)</script>"), "alert(1)");
        assert_eq!(sanitize_keyword("<img src=x>"), "");
    }

    #[test]
    fn sanitize_keyword_caps_length_by_chars() {
        let long = "梗".repeat(80);
        assert_eq!(sanitize_keyword(&long).chars().count(), 50);
    }

    #[test]
    fn parse_keyword_list_drops_empty_entries() {
        assert_eq!(
            parse_keyword_list("cat, dog,, <i></i> ,bird "),
            vec!["cat", "dog", "bird"]
        );
        assert!(parse_keyword_list(" , <br>").is_empty());
    }

    #[test]
    fn image_url_requires_https() {
        assert!(is_valid_image_url("https://i.imgur.com/abc.png"));
        assert!(is_valid_image_url("  https://cdn.jsdelivr.net/x.jpg "));
        assert!(!is_valid_image_url("http://i.imgur.com/abc.png"));
        assert!(!is_valid_image_url("javascript:alert(1)"));
        assert!(!is_valid_image_url("//i.imgur.com/abc.png"));
        assert!(!is_valid_image_url(""));
    }
}
