//! Phone number normalization.
//!
//! Messaging providers expect E.164 (`+41791234567`) while customers type
//! numbers in every local format. [`normalize_phone`] is the single place that
//! turns user input into a destination.

/// Shortest number (country code included) accepted as a destination.
const MIN_DIGITS: usize = 7;
/// E.164 allows at most 15 digits.
const MAX_DIGITS: usize = 15;

/// Normalizes a phone number to E.164.
///
/// Contract:
/// * every non-digit character is stripped (spaces, dashes, brackets, `whatsapp:`);
/// * input whose first significant character is `+` already carries its country code;
/// * a leading `00` is the international dialing prefix and is dropped;
/// * a single leading `0` is a trunk prefix and is replaced by `default_country_code`;
/// * otherwise `default_country_code` is prepended unless the digits already start with it;
/// * the result is `+` followed by 7 to 15 digits, anything else yields `None`.
///
/// ```
/// use bookwise_common::phone::normalize_phone;
///
/// assert_eq!(normalize_phone("079 123 45 67", "41").as_deref(), Some("+41791234567"));
/// assert_eq!(normalize_phone("+1 (555) 123-4567", "41").as_deref(), Some("+15551234567"));
/// ```
pub fn normalize_phone(raw: &str, default_country_code: &str) -> Option<String> {
    let country_code: String = default_country_code
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    let international = raw
        .chars()
        .find(|c| c.is_ascii_digit() || *c == '+')
        == Some('+');
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.is_empty() {
        return None;
    }

    let full = if international {
        digits
    } else if let Some(rest) = digits.strip_prefix("00") {
        rest.to_string()
    } else if let Some(rest) = digits.strip_prefix('0') {
        format!("{}{}", country_code, rest)
    } else if !country_code.is_empty() && digits.starts_with(&country_code) {
        digits
    } else {
        format!("{}{}", country_code, digits)
    };

    if full.len() < MIN_DIGITS || full.len() > MAX_DIGITS {
        return None;
    }
    Some(format!("+{}", full))
}
