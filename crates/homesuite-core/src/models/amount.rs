//! Fixed-point decimal used for money fields.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Number of decimal places carried by [`Amount`].
pub const AMOUNT_SCALE: u32 = 4;

const UNITS: i64 = 10_i64.pow(AMOUNT_SCALE);

/// A decimal amount stored as a whole number of 1/10 000 units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(i64);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseAmountError {
    #[error("empty amount")]
    Empty,
    #[error("invalid amount: {0:?}")]
    Invalid(String),
    #[error("amount has more than {AMOUNT_SCALE} decimal places: {0:?}")]
    TooPrecise(String),
    #[error("amount out of range: {0:?}")]
    OutOfRange(String),
}

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> i64 {
        self.0
    }

    /// Whole units, e.g. `Amount::from_units(12)` is `12.00`.
    pub fn from_units(units: i64) -> Option<Self> {
        units.checked_mul(UNITS).map(Self)
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn to_f64(self) -> f64 {
        self.0 as f64 / UNITS as f64
    }
}

impl FromStr for Amount {
    type Err = ParseAmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseAmountError::Empty);
        }

        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        // Accept a decimal comma as well as a point.
        let (whole, frac) = match digits.split_once(['.', ',']) {
            Some((whole, frac)) => (whole, frac),
            None => (digits, ""),
        };

        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if (whole.is_empty() && frac.is_empty()) || !all_digits(whole) || !all_digits(frac) {
            return Err(ParseAmountError::Invalid(s.to_string()));
        }
        if frac.len() > AMOUNT_SCALE as usize {
            return Err(ParseAmountError::TooPrecise(s.to_string()));
        }

        let out_of_range = || ParseAmountError::OutOfRange(s.to_string());
        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| out_of_range())?
        };
        let frac: i64 = if frac.is_empty() {
            0
        } else {
            let padded = format!("{frac:0<width$}", width = AMOUNT_SCALE as usize);
            padded.parse().map_err(|_| out_of_range())?
        };

        let raw = whole
            .checked_mul(UNITS)
            .and_then(|v| v.checked_add(frac))
            .ok_or_else(out_of_range)?;
        Ok(Self(if negative { -raw } else { raw }))
    }
}

impl fmt::Display for Amount {
    /// Two decimal places unless the value needs more.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = abs / UNITS as u64;
        let frac = abs % UNITS as u64;
        if frac % 100 == 0 {
            write!(f, "{sign}{whole}.{:02}", frac / 100)
        } else {
            write!(f, "{sign}{whole}.{frac:04}")
        }
    }
}
