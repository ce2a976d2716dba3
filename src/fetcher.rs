use std::cell::Cell;
use std::thread;
use std::time::Duration;

use reqwest::redirect;
use thiserror::Error;
use tracing::debug;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
const MAX_REDIRECTS: usize = 10;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("no page at {0}")]
    NotFound(String),
}

/// Anything that can turn a URL into a page body.
pub trait Fetch {
    fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Blocking HTTP fetcher that waits `delay` between consecutive requests.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    delay: Duration,
    has_fetched: Cell<bool>,
}

impl HttpFetcher {
    pub fn new(delay: Duration) -> Result<Self, FetchError> {
        let custom_redirect_policy = redirect::Policy::custom(|attempt| {
            if attempt.previous().len() > MAX_REDIRECTS {
                attempt.error("Too many redirects")
            } else {
                attempt.follow()
            }
        });

        let client = reqwest::blocking::Client::builder()
            .redirect(custom_redirect_policy)
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(HttpFetcher {
            client,
            delay,
            has_fetched: Cell::new(false),
        })
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        if self.has_fetched.replace(true) && !self.delay.is_zero() {
            thread::sleep(self.delay);
        }

        debug!(url, "Fetching");
        self.client
            .get(url)
            .send()?
            .error_for_status()?
            .text()
            .map_err(|e| e.into())
    }
}
