// validate.rs
// Input validation helpers: Indian phone numbers and period labels.

/// Normalize a phone number to the canonical `+91-XXXXXXXXXX` form.
///
/// Accepted inputs: an optional `+91` country code (with or without
/// separators) followed by exactly 10 digits starting with 6-9. A bare
/// 10-digit number assumes the country code.
pub fn normalize_phone(input: &str) -> Result<String, String> {
    let compact: String = input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();

    let digits = if let Some(rest) = compact.strip_prefix("+91") {
        rest
    } else if compact.len() == 12 && compact.starts_with("91") {
        &compact[2..]
    } else {
        compact.as_str()
    };

    if digits.len() != 10 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("invalid phone number: {input}"));
    }
    if !matches!(digits.as_bytes()[0], b'6'..=b'9') {
        return Err(format!("phone number must start with 6-9: {input}"));
    }

    Ok(format!("+91-{digits}"))
}

/// Check a period label has the `MM/YYYY` shape with month 01-12.
pub fn validate_month_year(label: &str) -> Result<(), String> {
    let bytes = label.as_bytes();
    let well_formed = bytes.len() == 7
        && bytes[2] == b'/'
        && bytes[..2].iter().all(u8::is_ascii_digit)
        && bytes[3..].iter().all(u8::is_ascii_digit);
    if !well_formed {
        return Err(format!("period must be MM/YYYY, got: {label}"));
    }
    let month: u32 = label[..2].parse().map_err(|_| "bad month".to_string())?;
    if !(1..=12).contains(&month) {
        return Err(format!("month out of range in period: {label}"));
    }
    Ok(())
}
