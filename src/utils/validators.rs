//! Input validation for generation requests. Validation failures reject a
//! request before any fetch or generation work is spent on it.

use url::Url;

pub const MAX_KEYWORD_CHARS: usize = 100;
pub const MIN_KEYWORD_CHARS: usize = 2;
pub const MAX_BRAND_CHARS: usize = 100;
pub const MAX_KEYWORDS_FIELD_CHARS: usize = 500;
pub const MAX_SELLING_POINTS_CHARS: usize = 500;

pub fn validate_url(raw: &str) -> Result<(), String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("URL cannot be empty".to_string());
    }

    let parsed = Url::parse(raw).map_err(|_| "Invalid URL format".to_string())?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(format!("Unsupported URL scheme: {}", other)),
    }

    if parsed.host_str().is_none() {
        return Err("URL must include a host".to_string());
    }

    Ok(())
}

pub fn validate_keywords(raw: &str) -> Result<(), String> {
    if raw.trim().is_empty() {
        return Err("Keywords cannot be empty".to_string());
    }

    let keywords: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .collect();

    if keywords.is_empty() {
        return Err("At least one keyword is required".to_string());
    }

    for keyword in keywords {
        let len = keyword.chars().count();
        if len < MIN_KEYWORD_CHARS {
            return Err(format!(
                "Keyword '{}' is too short (minimum {} characters)",
                keyword, MIN_KEYWORD_CHARS
            ));
        }
        if len > MAX_KEYWORD_CHARS {
            return Err(format!(
                "Keyword is too long (maximum {} characters)",
                MAX_KEYWORD_CHARS
            ));
        }
    }

    Ok(())
}

pub fn validate_brand_name(raw: &str) -> Result<(), String> {
    let brand = raw.trim();
    if brand.is_empty() {
        return Err("Brand name cannot be empty".to_string());
    }
    if brand.chars().count() > MAX_BRAND_CHARS {
        return Err(format!(
            "Brand name is too long (maximum {} characters)",
            MAX_BRAND_CHARS
        ));
    }
    if brand.chars().any(char::is_control) {
        return Err("Brand name contains control characters".to_string());
    }
    Ok(())
}

/// Trim, strip control characters (keeping line breaks) and truncate to a
/// field-specific maximum.
pub fn sanitize_input(raw: &str, max_chars: usize) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_control() || *c == '\n')
        .collect();

    if cleaned.chars().count() <= max_chars {
        return cleaned;
    }
    cleaned.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url_accepts_http_and_https() {
        assert!(validate_url("https://example.com/page").is_ok());
        assert!(validate_url("http://localhost:8080/x?q=1").is_ok());
    }

    #[test]
    fn test_validate_url_rejects_bad_input() {
        assert!(validate_url("").is_err());
        assert!(validate_url("not a url").is_err());
        assert!(validate_url("ftp://example.com").is_err());
        assert!(validate_url("javascript:alert(1)").is_err());
    }

    #[test]
    fn test_validate_keywords() {
        assert!(validate_keywords("shoes, running gear").is_ok());
        assert!(validate_keywords("").is_err());
        assert!(validate_keywords(" , ,").is_err());
        assert!(validate_keywords("a").is_err());
        assert!(validate_keywords(&"x".repeat(150)).is_err());
    }

    #[test]
    fn test_validate_brand_name() {
        assert!(validate_brand_name("Acme Corp").is_ok());
        assert!(validate_brand_name("  ").is_err());
        assert!(validate_brand_name(&"b".repeat(101)).is_err());
        assert!(validate_brand_name("bad\u{0007}brand").is_err());
    }

    #[test]
    fn test_sanitize_input() {
        assert_eq!(sanitize_input("  hello\u{0000} world  ", 50), "hello world");
        assert_eq!(sanitize_input("abcdef", 3), "abc");
        // Line breaks survive sanitization.
        assert_eq!(sanitize_input("a\nb", 10), "a\nb");
    }
}
