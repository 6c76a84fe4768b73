//! Network-sourced data: exchange rates and RSS feeds.

mod currency;
mod http;
mod rss;

pub use currency::{parse_line, parse_rates, CurrencyInfo, RateTable, BASE_CURRENCY};
pub use http::{HttpClient, DEFAULT_TIMEOUT};
pub use rss::{parse_feed, Channel, FeedItem};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Invalid URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Request to {url} failed with status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Line {line}: {reason}")]
    Csv { line: usize, reason: String },

    #[error("Malformed feed: {0}")]
    Xml(String),

    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),
}
