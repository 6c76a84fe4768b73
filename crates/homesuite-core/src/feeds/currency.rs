//! Exchange-rate list in the `country;currency;amount;code;rate` format.
//! A `|` delimiter is accepted as well.
//!
//! Rates are quoted against a single base currency: `amount` units of
//! `code` cost `rate` units of the base.

use std::collections::HashMap;

use super::FeedError;

/// Currency every rate in the list is quoted against.
pub const BASE_CURRENCY: &str = "CZK";

const DELIMITERS: [char; 2] = [';', '|'];

#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyInfo {
    pub country: String,
    pub currency: String,
    pub amount: u32,
    pub code: String,
    pub rate: f64,
}

impl CurrencyInfo {
    /// Base-currency value of one unit.
    pub fn unit_rate(&self) -> f64 {
        self.rate / f64::from(self.amount)
    }
}

/// Parse one data line. `line` is the 1-based line number used in errors.
pub fn parse_line(text: &str, line: usize) -> Result<CurrencyInfo, FeedError> {
    let err = |reason: String| FeedError::Csv { line, reason };

    let fields: Vec<&str> = text.trim().split(DELIMITERS).map(str::trim).collect();
    let [country, currency, amount, code, rate] = fields.as_slice() else {
        return Err(err(format!("expected 5 fields, found {}", fields.len())));
    };

    let amount: u32 = amount
        .parse()
        .map_err(|_| err(format!("invalid amount {amount:?}")))?;
    if amount == 0 {
        return Err(err("amount must be positive".to_string()));
    }
    let rate: f64 = rate
        .replace(',', ".")
        .parse()
        .map_err(|_| err(format!("invalid rate {rate:?}")))?;
    if !rate.is_finite() || rate <= 0.0 {
        return Err(err(format!("rate must be positive, got {rate}")));
    }
    if code.is_empty() {
        return Err(err("empty currency code".to_string()));
    }

    Ok(CurrencyInfo {
        country: country.to_string(),
        currency: currency.to_string(),
        amount,
        code: code.to_uppercase(),
        rate,
    })
}

/// Parse a whole rate list. Blank lines and lines without a numeric amount
/// column (the date line and column headers) are skipped.
pub fn parse_rates(text: &str) -> Result<Vec<CurrencyInfo>, FeedError> {
    let mut rates = Vec::new();
    for (i, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let is_data = line
            .split(DELIMITERS)
            .nth(2)
            .is_some_and(|amount| amount.trim().parse::<u32>().is_ok());
        if !is_data {
            tracing::trace!("Skipping non-data line {}: {}", i + 1, line);
            continue;
        }
        rates.push(parse_line(line, i + 1)?);
    }
    tracing::debug!("Parsed {} exchange rates", rates.len());
    Ok(rates)
}

/// Rates keyed by currency code.
#[derive(Debug, Clone, Default)]
pub struct RateTable {
    rates: HashMap<String, CurrencyInfo>,
}

impl RateTable {
    pub fn new(rates: Vec<CurrencyInfo>) -> Self {
        Self {
            rates: rates.into_iter().map(|r| (r.code.clone(), r)).collect(),
        }
    }

    pub fn get(&self, code: &str) -> Option<&CurrencyInfo> {
        self.rates.get(&code.to_uppercase())
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    fn unit_rate(&self, code: &str) -> Result<f64, FeedError> {
        if code.eq_ignore_ascii_case(BASE_CURRENCY) {
            return Ok(1.0);
        }
        self.get(code)
            .map(CurrencyInfo::unit_rate)
            .ok_or_else(|| FeedError::UnknownCurrency(code.to_string()))
    }

    /// Convert `value` of `from` into `to`, going through the base currency.
    pub fn convert(&self, value: f64, from: &str, to: &str) -> Result<f64, FeedError> {
        Ok(value * self.unit_rate(from)? / self.unit_rate(to)?)
    }
}
