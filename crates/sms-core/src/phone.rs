/// Remove every `+` and `-` from a phone number, leaving other characters untouched.
///
/// ```
/// assert_eq!(sms_core::strip_plus_and_hyphens("+852-1234-5678"), "85212345678");
/// ```
pub fn strip_plus_and_hyphens(phone: &str) -> String {
    phone.chars().filter(|c| !matches!(c, '+' | '-')).collect()
}

/// Mask a phone number for logging, keeping only the last 4 characters.
pub fn mask_phone_number(phone: &str) -> String {
    let len = phone.chars().count();
    if len <= 4 {
        return "*".repeat(len);
    }

    let visible: String = phone.chars().skip(len - 4).collect();
    if phone.starts_with('+') {
        format!("+{}{}", "*".repeat(len - 5), visible)
    } else {
        format!("{}{}", "*".repeat(len - 4), visible)
    }
}
