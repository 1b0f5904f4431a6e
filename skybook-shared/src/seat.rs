use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

// One row letter followed by the seat number, e.g. "A12".
static SEAT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][0-9]+$").expect("seat pattern is a valid regex"));

/// A validated seat label.
///
/// Input is trimmed and upper-cased before validation and leading zeros
/// are dropped, so `" a12 "`, `"A012"` and `"A12"` name the same seat.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SeatLabel(String);

impl SeatLabel {
    pub fn parse(raw: &str) -> Result<Self, SeatLabelError> {
        let label = raw.trim().to_uppercase();
        if label.is_empty() {
            return Err(SeatLabelError::Empty);
        }
        if !SEAT_PATTERN.is_match(&label) {
            return Err(SeatLabelError::Malformed(label));
        }

        let number: u32 = label[1..]
            .parse()
            .map_err(|_| SeatLabelError::Malformed(label.clone()))?;
        if number < 1 {
            return Err(SeatLabelError::NumberTooSmall(label));
        }

        // Canonical form drops leading zeros: "A01" and "A1" are one seat
        Ok(Self(format!("{}{}", &label[..1], number)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Row letter
    pub fn letter(&self) -> char {
        // Non-empty and ASCII by construction.
        self.0.as_bytes()[0] as char
    }

    pub fn number(&self) -> u32 {
        self.0[1..].parse().unwrap_or_default()
    }
}

impl fmt::Display for SeatLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SeatLabel {
    type Error = SeatLabelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SeatLabel> for String {
    fn from(seat: SeatLabel) -> Self {
        seat.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeatLabelError {
    #[error("Seat number is required")]
    Empty,

    #[error("Invalid seat format '{0}': must be a letter followed by numbers, e.g. A12")]
    Malformed(String),

    #[error("Invalid seat '{0}': seat number must be at least 1")]
    NumberTooSmall(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes_input() {
        let seat = SeatLabel::parse("  b7 ").unwrap();
        assert_eq!(seat.as_str(), "B7");
        assert_eq!(seat.letter(), 'B');
        assert_eq!(seat.number(), 7);
    }

    #[test]
    fn test_parse_rejects_bad_labels() {
        assert_eq!(SeatLabel::parse("   "), Err(SeatLabelError::Empty));
        assert!(matches!(SeatLabel::parse("12A"), Err(SeatLabelError::Malformed(_))));
        assert!(matches!(SeatLabel::parse("AB1"), Err(SeatLabelError::Malformed(_))));
        assert!(matches!(SeatLabel::parse("A"), Err(SeatLabelError::Malformed(_))));
        assert!(matches!(SeatLabel::parse("A-1"), Err(SeatLabelError::Malformed(_))));
        assert!(matches!(SeatLabel::parse("A0"), Err(SeatLabelError::NumberTooSmall(_))));
        assert!(matches!(SeatLabel::parse("A000"), Err(SeatLabelError::NumberTooSmall(_))));
        // Overflows u32
        assert!(matches!(
            SeatLabel::parse("A99999999999"),
            Err(SeatLabelError::Malformed(_))
        ));
    }

    #[test]
    fn test_leading_zeros_are_dropped() {
        let seat = SeatLabel::parse("a01").unwrap();
        assert_eq!(seat.as_str(), "A1");
        assert_eq!(seat.number(), 1);
        assert_eq!(seat, SeatLabel::parse("A1").unwrap());
        assert_eq!(SeatLabel::parse("c0012").unwrap().as_str(), "C12");
    }

    #[test]
    fn test_deserialization_validates() {
        let seat: SeatLabel = serde_json::from_str("\"c3\"").unwrap();
        assert_eq!(seat.as_str(), "C3");

        let bad: Result<SeatLabel, _> = serde_json::from_str("\"3C\"");
        assert!(bad.is_err());
    }
}
