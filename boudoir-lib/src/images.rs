//! Article image list codec.
//!
//! The `images` column stores a JSON-encoded array of URL strings. Every
//! read and write of an article goes through [`encode`] and [`decode`];
//! decoding never fails and falls back to an empty list.

/// Encodes image URLs as a JSON array string.
///
/// # Example
///
/// ```
/// use boudoir_lib::images;
///
/// let stored = images::encode(&["https://x/a.jpg".to_string()]);
/// assert_eq!(stored, r#"["https://x/a.jpg"]"#);
/// assert_eq!(images::decode(&stored), vec!["https://x/a.jpg".to_string()]);
/// ```
pub fn encode(images: &[String]) -> String {
    serde_json::to_string(images).unwrap_or_else(|_| "[]".to_string())
}

/// Decodes a stored image column. Malformed or non-array input yields `[]`;
/// non-string elements are dropped.
pub fn decode(raw: &str) -> Vec<String> {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                serde_json::Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Decodes a nullable column.
pub fn decode_opt(raw: Option<&str>) -> Vec<String> {
    raw.map(decode).unwrap_or_default()
}

/// Interprets legacy values for repair: valid JSON arrays, a bare URL, or a
/// comma-separated list of URLs.
fn parse_lenient(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Vec::new();
    }
    if trimmed.starts_with('[') {
        return decode(trimmed);
    }
    if let Ok(serde_json::Value::String(inner)) = serde_json::from_str::<serde_json::Value>(trimmed) {
        // Double-encoded column: "\"[...]\"" or "\"https://...\"".
        return parse_lenient(&inner);
    }
    trimmed
        .split(',')
        .map(str::trim)
        .filter(|s| s.starts_with("http://") || s.starts_with("https://"))
        .map(str::to_string)
        .collect()
}

/// Returns the canonical encoding of a stored value when it differs from
/// what is stored, `None` when the value is already canonical.
pub fn normalize(raw: Option<&str>) -> Option<String> {
    let canonical = encode(&parse_lenient(raw.unwrap_or_default()));
    match raw {
        Some(stored) if stored == canonical => None,
        _ => Some(canonical),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let images = vec!["https://x/a.jpg".to_string()];
        assert_eq!(decode(&encode(&images)), images);
        assert_eq!(encode(&[]), "[]");
    }

    #[test]
    fn test_malformed_decodes_to_empty() {
        assert!(decode("not json").is_empty());
        assert!(decode("{\"a\": 1}").is_empty());
        assert!(decode("").is_empty());
        assert!(decode_opt(None).is_empty());
    }

    #[test]
    fn test_non_string_elements_are_dropped() {
        assert_eq!(decode(r#"["https://x/a.jpg", 3, null]"#), vec!["https://x/a.jpg"]);
    }

    #[test]
    fn test_normalize_repairs_legacy_values() {
        assert_eq!(normalize(Some(r#"["https://x/a.jpg"]"#)), None);
        assert_eq!(
            normalize(Some("https://x/a.jpg")),
            Some(r#"["https://x/a.jpg"]"#.to_string())
        );
        assert_eq!(
            normalize(Some("https://x/a.jpg, https://x/b.jpg")),
            Some(r#"["https://x/a.jpg","https://x/b.jpg"]"#.to_string())
        );
        assert_eq!(
            normalize(Some(r#""[\"https://x/a.jpg\"]""#)),
            Some(r#"["https://x/a.jpg"]"#.to_string())
        );
        assert_eq!(normalize(None), Some("[]".to_string()));
        assert_eq!(normalize(Some("garbage")), Some("[]".to_string()));
        assert_eq!(normalize(Some(r#"[ "https://x/a.jpg" ]"#)), Some(r#"["https://x/a.jpg"]"#.to_string()));
    }
}
