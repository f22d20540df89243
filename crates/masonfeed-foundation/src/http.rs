//! HTTP data source for a paged JSON collection endpoint.

use std::time::Duration;

use masonfeed_core::{FetchError, PageToken, Post};
use reqwest::blocking::Client;
use reqwest::StatusCode;

use crate::feed::FeedDataSource;

const PAGE_PLACEHOLDER: &str = "{page}";

/// Fetches pages with `GET` requests.
///
/// The URL template contains `{page}`, replaced with the page token. A
/// template without the placeholder gets a `page` query parameter instead.
/// The response body is a JSON array of posts.
#[derive(Clone, Debug)]
pub struct HttpFeedSource {
    client: Client,
    url_template: String,
}

impl HttpFeedSource {
    pub fn new(url_template: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self::with_client(client, url_template))
    }

    pub fn with_client(client: Client, url_template: impl Into<String>) -> Self {
        Self {
            client,
            url_template: url_template.into(),
        }
    }

    /// URL requested for `token`.
    pub fn page_url(&self, token: PageToken) -> String {
        page_url(&self.url_template, token)
    }
}

fn page_url(template: &str, token: PageToken) -> String {
    if template.contains(PAGE_PLACEHOLDER) {
        template.replace(PAGE_PLACEHOLDER, &token.to_string())
    } else if template.contains('?') {
        format!("{template}&page={token}")
    } else {
        format!("{template}?page={token}")
    }
}

impl FeedDataSource for HttpFeedSource {
    fn fetch_page(&self, token: PageToken) -> Result<Vec<Post>, FetchError> {
        let url = self.page_url(token);
        log::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| FetchError::Transport {
                token,
                message: e.to_string(),
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(token));
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                token,
                status: status.as_u16(),
            });
        }

        let body = response.text().map_err(|e| FetchError::Transport {
            token,
            message: e.to_string(),
        })?;
        decode_page(token, &body)
    }
}

fn decode_page(token: PageToken, body: &str) -> Result<Vec<Post>, FetchError> {
    serde_json::from_str(body).map_err(|e| FetchError::Decode {
        token,
        message: e.to_string(),
    })
}
