//! GUID and OData helpers shared by data sources and cell renderers.

use once_cell::sync::Lazy;
use regex::Regex;

static GUID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
        .expect("GUID pattern is a valid regex")
});

/// First GUID found in `value` (or the whole value), braces and brackets
/// removed, lower-cased.
pub fn sanitize_guid(value: &str) -> String {
    let target = GUID_PATTERN
        .find(value)
        .map(|found| found.as_str())
        .unwrap_or(value);
    target
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | '{' | '}'))
        .collect::<String>()
        .to_lowercase()
}

pub fn is_guid(value: &str) -> bool {
    GUID_PATTERN
        .find(value)
        .is_some_and(|found| found.start() == 0 && found.end() == value.len())
}

/// Sanitized GUID wrapped in single quotes, ready for a filter clause.
pub fn guid_literal(value: &str) -> String {
    format!("'{}'", sanitize_guid(value))
}

/// Escape a string for use inside a quoted OData literal.
pub fn escape_odata_value(value: &str) -> String {
    value.replace('\'', "''")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guid_pattern_compiles() {
        assert!(GUID_PATTERN.is_match("00000000-0000-0000-0000-000000000000"));
    }

    #[test]
    fn test_sanitize_guid() {
        assert_eq!(
            sanitize_guid("{A1B2C3D4-0000-1111-2222-333344445555}"),
            "a1b2c3d4-0000-1111-2222-333344445555"
        );
        assert_eq!(
            sanitize_guid("id=[0A1B2C3D-0000-1111-2222-333344445555] trailing"),
            "0a1b2c3d-0000-1111-2222-333344445555"
        );
        assert_eq!(sanitize_guid("{Not-A-Guid}"), "not-a-guid");
        assert_eq!(guid_literal("{ABCDEF01-2345-6789-abcd-ef0123456789}"), "'abcdef01-2345-6789-abcd-ef0123456789'");
    }

    #[test]
    fn test_is_guid() {
        assert!(is_guid("abcdef01-2345-6789-abcd-ef0123456789"));
        assert!(!is_guid("{abcdef01-2345-6789-abcd-ef0123456789}"));
        assert!(!is_guid("hello"));
    }

    #[test]
    fn test_escape_odata_value() {
        assert_eq!(escape_odata_value("O'Brien"), "O''Brien");
        assert_eq!(escape_odata_value("plain"), "plain");
    }
}
