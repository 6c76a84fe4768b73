//! Blocking HTTP GET used by the rate and feed readers. No retries.

use std::time::Duration;

use url::Url;

use super::{parse_feed, parse_rates, Channel, CurrencyInfo, FeedError};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

pub struct HttpClient {
    client: reqwest::blocking::Client,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Result<Self, FeedError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("homesuite/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| FeedError::Transport {
                url: String::new(),
                source,
            })?;
        Ok(Self { client })
    }

    /// Fetch `url` as text. Non-success statuses are errors.
    pub fn get_text(&self, url: &str) -> Result<String, FeedError> {
        let parsed = Url::parse(url).map_err(|source| FeedError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;
        tracing::debug!("GET {}", parsed);

        let transport = |source| FeedError::Transport {
            url: url.to_string(),
            source,
        };
        let response = self.client.get(parsed).send().map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!("GET {} returned {}", url, status);
            return Err(FeedError::Status {
                url: url.to_string(),
                status,
            });
        }
        response.text().map_err(transport)
    }

    pub fn fetch_rates(&self, url: &str) -> Result<Vec<CurrencyInfo>, FeedError> {
        parse_rates(&self.get_text(url)?)
    }

    pub fn fetch_feed(&self, url: &str) -> Result<Channel, FeedError> {
        parse_feed(&self.get_text(url)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_url_is_rejected_before_sending() {
        let client = HttpClient::new(DEFAULT_TIMEOUT).unwrap();
        assert!(matches!(
            client.get_text("not a url"),
            Err(FeedError::InvalidUrl { .. })
        ));
    }
}
