// SPDX-FileCopyrightText: 2026 Outreach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recipient address normalization.
//!
//! Phone numbers are reduced to an E.164-like form (`+` followed by digits).
//! Bare 10-digit numbers are assumed to be North American and get a `+1`
//! country code. Anything that does not look like a phone number (an email
//! address, a short code with letters) is returned trimmed but otherwise
//! untouched, so non-SMS transports still receive a stable key.

/// Normalize a recipient address for sending and for thread lookup.
pub fn normalize_recipient(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let looks_like_phone = trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '(' | ')' | '.' | ' '));
    if !looks_like_phone {
        return trimmed.to_string();
    }

    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return trimmed.to_string();
    }

    if trimmed.starts_with('+') {
        return format!("+{digits}");
    }
    if let Some(rest) = digits.strip_prefix("00") {
        return format!("+{rest}");
    }
    match digits.len() {
        10 => format!("+1{digits}"),
        11 if digits.starts_with('1') => format!("+{digits}"),
        _ => format!("+{digits}"),
    }
}
