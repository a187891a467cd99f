//! Code normalization rules used by the matcher

/// Trimmed form of a scanned or catalog code.
pub fn normalize_code(raw: &str) -> &str {
    raw.trim()
}

/// Digits only. Absorbs scanner prefixes, dashes and spacing.
pub fn digits_only(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// True when either code is a suffix of the other. Empty codes never match.
pub fn suffix_contains(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.ends_with(b) || b.ends_with(a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digits_only_strips_noise() {
        assert_eq!(digits_only("978-0-13-110362-7"), "9780131103627");
        assert_eq!(digits_only("]E0 4006381333931"), "04006381333931");
        assert_eq!(digits_only("ABC"), "");
    }

    #[test]
    fn test_suffix_both_directions() {
        assert!(suffix_contains("9780131103627", "0131103627"));
        assert!(suffix_contains("0131103627", "9780131103627"));
        assert!(!suffix_contains("9780131103627", "0131103628"));
        assert!(!suffix_contains("", "123"));
    }
}
