//! Phone number normalization.
//!
//! Numbers are keyed as bare digits including the country code, e.g.
//! `+968 9123-4567` and `0096891234567` both become `96891234567`.

/// Shortest accepted number, country code included.
pub const MIN_PHONE_DIGITS: usize = 8;

/// Longest accepted number (E.164).
pub const MAX_PHONE_DIGITS: usize = 15;

/// Normalizes a user-entered phone number.
///
/// Separators (spaces, dashes, dots, parentheses) are dropped, and a leading
/// `+` or `00` marks the number as international. National numbers get
/// `default_country_code` prepended (after dropping trunk zeros) unless they
/// already start with it. Returns `None` if anything but digits remain or the
/// length falls outside 8–15 digits.
pub fn normalize_phone_number(raw: &str, default_country_code: Option<&str>) -> Option<String> {
    let compact: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
        .collect();

    let (international, digits) = if let Some(rest) = compact.strip_prefix('+') {
        (true, rest)
    } else if let Some(rest) = compact.strip_prefix("00") {
        (true, rest)
    } else {
        (false, compact.as_str())
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let normalized = match default_country_code {
        Some(cc) if !international && !digits.starts_with(cc) => {
            format!("{}{}", cc, digits.trim_start_matches('0'))
        }
        _ => digits.to_string(),
    };

    (MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS)
        .contains(&normalized.len())
        .then_some(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_formatting() {
        assert_eq!(
            normalize_phone_number("+968 9123-4567", None).as_deref(),
            Some("96891234567")
        );
        assert_eq!(
            normalize_phone_number(" (968) 9123.4567 ", None).as_deref(),
            Some("96891234567")
        );
        assert_eq!(
            normalize_phone_number("0096891234567", None).as_deref(),
            Some("96891234567")
        );
    }

    #[test]
    fn test_default_country_code() {
        assert_eq!(
            normalize_phone_number("91234567", Some("968")).as_deref(),
            Some("96891234567")
        );
        assert_eq!(
            normalize_phone_number("96891234567", Some("968")).as_deref(),
            Some("96891234567")
        );
        // International numbers are left alone
        assert_eq!(
            normalize_phone_number("+14155550100", Some("968")).as_deref(),
            Some("14155550100")
        );
    }

    #[test]
    fn test_rejects_malformed() {
        assert_eq!(normalize_phone_number("", None), None);
        assert_eq!(normalize_phone_number("   ", None), None);
        assert_eq!(normalize_phone_number("+", None), None);
        assert_eq!(normalize_phone_number("9689123abc", None), None);
        assert_eq!(normalize_phone_number("1234567", None), None);
        assert_eq!(normalize_phone_number("1234567890123456", None), None);
        assert_eq!(normalize_phone_number("+968+91234567", None), None);
    }
}
