use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// An amount in integer cents, as typed by a user or shown back to one.
///
/// Every stored amount is a plain `i64` of cents (`*_minor` fields); this
/// type only sits at the edges, parsing input and rendering output.
///
/// ```rust
/// use engine::MoneyCents;
///
/// assert_eq!("10,5".parse::<MoneyCents>().unwrap().cents(), 1050);
/// assert_eq!(MoneyCents::new(1234).to_string(), "12.34");
/// assert!("12.345".parse::<MoneyCents>().is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MoneyCents(i64);

impl MoneyCents {
    #[must_use]
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// `None` on overflow.
    #[must_use]
    pub fn checked_mul(self, count: u32) -> Option<MoneyCents> {
        self.0.checked_mul(i64::from(count)).map(MoneyCents)
    }
}

impl fmt::Display for MoneyCents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

fn digits(raw: &str) -> Option<i64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

impl FromStr for MoneyCents {
    type Err = EngineError;

    /// `12`, `12.3`, `12,30`, optionally signed. More than two decimals is
    /// an error.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::Validation(format!("invalid amount: {s:?}"));

        let trimmed = s.trim();
        let (negative, unsigned) = match trimmed.as_bytes().first() {
            Some(b'-') => (true, &trimmed[1..]),
            Some(b'+') => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };

        let (whole, fraction) = match unsigned.split_once(['.', ',']) {
            Some((whole, fraction)) => (whole, Some(fraction)),
            None => (unsigned, None),
        };
        let units = digits(whole).ok_or_else(invalid)?;
        let cents = match fraction {
            None => 0,
            Some(f) if f.len() == 1 => digits(f).ok_or_else(invalid)? * 10,
            Some(f) if f.len() == 2 => digits(f).ok_or_else(invalid)?,
            Some(_) => return Err(invalid()),
        };

        let magnitude = units
            .checked_mul(100)
            .and_then(|v| v.checked_add(cents))
            .ok_or_else(invalid)?;
        Ok(MoneyCents(if negative { -magnitude } else { magnitude }))
    }
}
