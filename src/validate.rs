/// Validate a required text field with a max length.
pub fn validate_required(value: &str, field_name: &str, max_len: usize) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Some(format!("{field_name} is required"));
    }
    if trimmed.len() > max_len {
        return Some(format!("{field_name} must be at most {max_len} characters"));
    }
    None
}

/// Validate an optional text field with a max length (absent or empty is OK).
pub fn validate_optional(value: Option<&str>, field_name: &str, max_len: usize) -> Option<String> {
    let trimmed = value.unwrap_or_default().trim();
    if trimmed.len() > max_len {
        return Some(format!("{field_name} must be at most {max_len} characters"));
    }
    None
}

/// Validate an optional URL: when present it must be http(s).
pub fn validate_url(value: Option<&str>, field_name: &str) -> Option<String> {
    let trimmed = value.unwrap_or_default().trim();
    if trimmed.is_empty() {
        return None;
    }
    if !(trimmed.starts_with("https://") || trimmed.starts_with("http://")) {
        return Some(format!("{field_name} must start with http:// or https://"));
    }
    if trimmed.len() > 500 {
        return Some(format!("{field_name} must be at most 500 characters"));
    }
    None
}

/// Validate an optional number against an inclusive range.
pub fn validate_range<T>(value: Option<T>, field_name: &str, min: T, max: T) -> Option<String>
where
    T: PartialOrd + std::fmt::Display + Copy,
{
    match value {
        Some(v) if v < min || v > max => {
            Some(format!("{field_name} must be between {min} and {max}"))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_rejects_blank_and_long() {
        assert!(validate_required("", "Title", 10).is_some());
        assert!(validate_required("   ", "Title", 10).is_some());
        assert!(validate_required("Gala night", "Title", 10).is_none());
        assert!(validate_required("Gala night!", "Title", 10).is_some());
    }

    #[test]
    fn optional_allows_absent() {
        assert!(validate_optional(None, "Bio", 5).is_none());
        assert!(validate_optional(Some(""), "Bio", 5).is_none());
        assert!(validate_optional(Some("toolong"), "Bio", 5).is_some());
    }

    #[test]
    fn url_scheme() {
        assert!(validate_url(None, "LinkedIn").is_none());
        assert!(validate_url(Some("https://linkedin.com/in/sam"), "LinkedIn").is_none());
        assert!(validate_url(Some("javascript:alert(1)"), "LinkedIn").is_some());
    }

    #[test]
    fn range_bounds_inclusive() {
        assert!(validate_range(Some(2026), "Year", 1900, 2100).is_none());
        assert!(validate_range(Some(1900), "Year", 1900, 2100).is_none());
        assert!(validate_range(Some(1899), "Year", 1900, 2100).is_some());
        assert!(validate_range::<i32>(None, "Year", 1900, 2100).is_none());
    }
}
