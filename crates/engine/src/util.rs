//! Internal helpers for input validation and normalization.
//!
//! These utilities are **not** part of the public API. They are plain
//! functions called at the start of every write, so the engine enforces the
//! same preconditions for bills and rides.

use unicode_normalization::UnicodeNormalization;

use crate::{EngineError, ResultEngine};

/// Trim and NFC-normalize a free-text field, rejecting empty values.
pub(crate) fn normalize_required_text(value: &str, label: &str) -> ResultEngine<String> {
    let normalized: String = value.trim().nfc().collect();
    if normalized.is_empty() {
        return Err(EngineError::Validation(format!("{label} must not be empty")));
    }
    Ok(normalized)
}

/// Normalize a person label; `None` when nothing is left after trimming.
pub(crate) fn normalize_label(value: &str) -> Option<String> {
    let normalized: String = value.trim().nfc().collect();
    (!normalized.is_empty()).then_some(normalized)
}

/// Label given to a slot the caller did not name (1-based).
pub(crate) fn default_person_label(position: usize) -> String {
    format!("Person {position}")
}

pub(crate) fn ensure_non_negative(amount_minor: i64, label: &str) -> ResultEngine<()> {
    if amount_minor < 0 {
        return Err(EngineError::Validation(format!("{label} must be >= 0")));
    }
    Ok(())
}

/// Convert a stored integer column into an unsigned count.
pub(crate) fn stored_count(value: i32, label: &str) -> ResultEngine<u32> {
    u32::try_from(value)
        .map_err(|_| EngineError::Validation(format!("stored {label} is negative: {value}")))
}

/// Convert an unsigned count into the integer column that stores it.
pub(crate) fn storable_count(value: u32, label: &str) -> ResultEngine<i32> {
    i32::try_from(value)
        .map_err(|_| EngineError::Validation(format!("{label} is too large: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_trimmed_and_composed() {
        assert_eq!(normalize_label("  Ana "), Some("Ana".to_string()));
        // "e" followed by a combining acute accent composes to "é".
        assert_eq!(normalize_label("Jose\u{301}"), Some("José".to_string()));
        assert_eq!(normalize_label("   "), None);
    }

    #[test]
    fn required_text_rejects_blank() {
        assert!(normalize_required_text(" ", "description").is_err());
        assert_eq!(
            normalize_required_text(" Dinner ", "description").unwrap(),
            "Dinner"
        );
    }

    #[test]
    fn counts_round_trip_through_storage() {
        assert_eq!(stored_count(storable_count(4, "n").unwrap(), "n").unwrap(), 4);
        assert!(stored_count(-1, "n").is_err());
        assert!(storable_count(u32::MAX, "n").is_err());
    }
}
