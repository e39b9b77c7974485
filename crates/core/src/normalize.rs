//! Identifier normalization applied at the webhook boundary

/// Strip everything except ASCII letters and digits.
///
/// `"11.111.111-1"` becomes `"111111111"`.
pub fn normalize_national_id(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

/// Strip everything except ASCII letters and digits, keeping a single
/// leading `+` so keys stay in E.164 form.
///
/// `" +56 9 1234-5678 "` becomes `"+56912345678"`.
pub fn normalize_phone_number(raw: &str) -> String {
    let trimmed = raw.trim_start();
    let mut out = String::with_capacity(trimmed.len());
    if trimmed.starts_with('+') {
        out.push('+');
    }
    out.extend(trimmed.chars().filter(|c| c.is_ascii_alphanumeric()));
    out
}
