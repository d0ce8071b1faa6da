//! Wikipedia article summaries

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{Encyclopedia, Summary};
use crate::{Error, Result};

const SEARCH_URL: &str = "https://en.wikipedia.org/w/api.php";
const SUMMARY_URL: &str = "https://en.wikipedia.org/api/rest_v1/page/summary";
const USER_AGENT: &str = concat!("voice-dispatcher/", env!("CARGO_PKG_VERSION"));

/// Sentences kept from each summary
const SUMMARY_SENTENCES: usize = 2;

/// Number of titles requested from search
const SEARCH_LIMIT: &str = "5";

/// Wikipedia REST client
pub struct WikipediaClient {
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct PageSummary {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    extract: String,
}

impl WikipediaClient {
    /// Create a client
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .user_agent(USER_AGENT)
                .build()?,
        })
    }

    /// Titles matching `query`, best first
    async fn search(&self, query: &str) -> Result<Vec<String>> {
        let response = self
            .client
            .get(SEARCH_URL)
            .query(&[
                ("action", "opensearch"),
                ("search", query),
                ("limit", SEARCH_LIMIT),
                ("namespace", "0"),
                ("format", "json"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(Error::Encyclopedia(format!("search failed: {status}")));
        }

        let body: serde_json::Value = response.json().await?;
        Ok(parse_opensearch(&body))
    }

    async fn page_summary(&self, title: &str) -> Result<Option<PageSummary>> {
        let response = self
            .client
            .get(format!("{SUMMARY_URL}/{}", urlencoding::encode(title)))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            return Err(Error::Encyclopedia(format!("summary failed: {status}")));
        }

        Ok(Some(response.json().await?))
    }
}

/// Opensearch returns `[query, [titles], [descriptions], [urls]]`
fn parse_opensearch(body: &serde_json::Value) -> Vec<String> {
    body.get(1)
        .and_then(serde_json::Value::as_array)
        .map(|titles| {
            titles
                .iter()
                .filter_map(serde_json::Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Keep the first `count` sentences of `text`
///
/// A sentence ends at `.`, `!` or `?` followed by whitespace or end of text.
#[must_use]
pub fn first_sentences(text: &str, count: usize) -> String {
    let text = text.trim();
    let mut seen = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let at_boundary = chars.peek().is_none_or(|(_, next)| next.is_whitespace());
        if at_boundary {
            seen += 1;
            if seen == count {
                return text[..i + c.len_utf8()].to_string();
            }
        }
    }

    text.to_string()
}

#[async_trait]
impl Encyclopedia for WikipediaClient {
    async fn summarize(&self, query: &str) -> Result<Summary> {
        let titles = self.search(query).await?;
        let Some(best) = titles.first() else {
            return Ok(Summary::NotFound);
        };

        let Some(page) = self.page_summary(best).await? else {
            return Ok(Summary::NotFound);
        };

        if page.kind == "disambiguation" {
            let options = titles.into_iter().skip(1).collect::<Vec<_>>();
            tracing::debug!(query, options = options.len(), "disambiguation page");
            return Ok(Summary::Disambiguation(options));
        }

        if page.extract.trim().is_empty() {
            return Ok(Summary::NotFound);
        }

        Ok(Summary::Text(first_sentences(&page.extract, SUMMARY_SENTENCES)))
    }
}
