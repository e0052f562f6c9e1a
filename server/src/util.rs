//! Shared utility functions

use std::sync::LazyLock;

use regex::Regex;

/// Allowed username characters: letters, digits, `_`, `.` and `-`.
pub static USERNAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_.-]+$").expect("username pattern is a valid regex")
});

/// Format file size in human-readable units
///
/// # Examples
///
/// ```
/// use portal_server::util::format_file_size;
///
/// assert_eq!(format_file_size(512), "512 bytes");
/// assert_eq!(format_file_size(2048), "2KB");
/// assert_eq!(format_file_size(10 * 1024 * 1024), "10.0MB");
/// ```
pub fn format_file_size(bytes: usize) -> String {
    if bytes < 1024 {
        format!("{bytes} bytes")
    } else if bytes < 1024 * 1024 {
        format!("{}KB", bytes / 1024)
    } else {
        format!("{:.1}MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

/// Trim an optional text field, mapping blank input to `None`.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 bytes");
        assert_eq!(format_file_size(1023), "1023 bytes");
        assert_eq!(format_file_size(1024), "1KB");
        assert_eq!(format_file_size(1024 * 1024 - 1), "1023KB");
        assert_eq!(format_file_size(1024 * 1024), "1.0MB");
        assert_eq!(format_file_size(5_500_000), "5.2MB");
    }

    #[test]
    fn test_username_regex() {
        assert!(USERNAME_REGEX.is_match("alice_01.b-c"));
        assert!(!USERNAME_REGEX.is_match("alice smith"));
        assert!(!USERNAME_REGEX.is_match("bob@home"));
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some("   ".into())), None);
        assert_eq!(non_blank(Some(" text ".into())), Some("text".into()));
    }
}
