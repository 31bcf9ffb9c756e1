//! Candidate image retrieval from an HTML image-search endpoint.
//!
//! One query against the index page, then one download per harvested
//! candidate URL, every network round trip guarded by the caller's
//! [`RetryPolicy`]. Result anchors on the index page carry a JSON blob in
//! their `m` attribute; only its `murl` field (the full-size image URL) is
//! trusted, and only after strict JSON parsing. Transient trouble degrades
//! the result instead of failing it: an unreachable index or a dead
//! candidate URL shrinks the returned vector, it never aborts the batch.

use std::sync::LazyLock;

use image::DynamicImage;
use miette::Diagnostic;
use reqwest::Client;
use scraper::{Html, Selector};
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::advisory::SectionQuery;
use crate::config::{ConfigError, IllustratorConfig};
use crate::retry::{RetryPolicy, with_retries};

/// A downloaded, decoded candidate image for one outline section.
///
/// Candidates are ephemeral: they live between retrieval and persistence,
/// and the decoded pixels are dropped as soon as the winning candidate has
/// been written to disk.
#[derive(Debug, Clone)]
pub struct ImageCandidate {
    pub section_title: String,
    pub query: String,
    pub width: u32,
    pub height: u32,
    /// `width * height`, the ranking key used by selection.
    pub resolution: u64,
    pub image: DynamicImage,
}

/// The one hard failure `search` can report. Everything transient is
/// absorbed into a shorter (possibly empty) candidate list.
#[derive(Debug, Error, Diagnostic)]
pub enum SearchError {
    /// The section's query was blank after trimming.
    #[error("image search query is empty")]
    #[diagnostic(
        code(slidesmith::retrieval::empty_query),
        help("advisory lines like `[Title]: query` must carry a non-empty query")
    )]
    EmptyQuery,
}

/// What can go wrong inside one retried network attempt.
#[derive(Debug, Error)]
enum FetchError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("image decode failed: {0}")]
    Decode(#[from] image::ImageError),
}

/// Queries an image-search endpoint and turns its result anchors into
/// decoded [`ImageCandidate`]s.
#[derive(Debug, Clone)]
pub struct ImageSearcher {
    client: Client,
    endpoint: Url,
}

impl ImageSearcher {
    /// Wraps an existing HTTP client and endpoint.
    ///
    /// The client's user agent matters: the endpoint serves the
    /// anchor-metadata markup this module scrapes only to browser-looking
    /// agents. [`ImageSearcher::from_config`] sets one up accordingly.
    pub fn new(client: Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    /// Builds a searcher with a fresh client configured from `config`
    /// (user agent, rustls transport) and the configured endpoint.
    pub fn from_config(config: &IllustratorConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(config.build_client()?, config.endpoint()?))
    }

    /// Collects up to `count` decoded candidates for one section.
    ///
    /// The index query and every candidate download each run under
    /// `policy`. An exhausted index query logs at error level and yields
    /// `Ok(vec![])`; an exhausted candidate download drops just that URL.
    /// The returned candidates are unsorted; ranking belongs to
    /// [`select_best`](crate::selection::select_best).
    #[instrument(
        skip(self, section, policy),
        fields(section = %section.section_title, query = %section.query)
    )]
    pub async fn search(
        &self,
        section: &SectionQuery,
        count: usize,
        policy: RetryPolicy,
    ) -> Result<Vec<ImageCandidate>, SearchError> {
        let query = section.query.trim();
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let body = match with_retries(policy, "image index query", || self.fetch_index(query)).await
        {
            Ok(body) => body,
            Err(err) => {
                tracing::error!(error = %err, "image index unreachable, no candidates");
                return Ok(Vec::new());
            }
        };

        let urls = extract_image_urls(&body, count);
        if urls.is_empty() {
            tracing::warn!("index page yielded no candidate image urls");
            return Ok(Vec::new());
        }

        let mut candidates = Vec::with_capacity(urls.len());
        for url in &urls {
            match with_retries(policy, "image download", || self.fetch_candidate(url)).await {
                Ok(image) => {
                    let (width, height) = (image.width(), image.height());
                    tracing::debug!(url = %url, width, height, "candidate decoded");
                    candidates.push(ImageCandidate {
                        section_title: section.section_title.clone(),
                        query: section.query.clone(),
                        width,
                        height,
                        resolution: u64::from(width) * u64::from(height),
                        image,
                    });
                }
                Err(err) => {
                    tracing::error!(url = %url, error = %err, "giving up on candidate image");
                }
            }
        }
        Ok(candidates)
    }

    async fn fetch_index(&self, query: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[("q", query)])
            .send()
            .await?
            .error_for_status()?;
        Ok(response.text().await?)
    }

    async fn fetch_candidate(&self, url: &Url) -> Result<DynamicImage, FetchError> {
        let bytes = self
            .client
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(image::load_from_memory(&bytes)?)
    }
}

/// JSON blob carried by each result anchor's `m` attribute. Only the
/// full-size image URL is of interest; unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct AnchorMetadata {
    murl: String,
}

/// Harvests up to `count` candidate image URLs from an index page body.
///
/// Kept synchronous on purpose: the parsed DOM is not `Send`, so it must
/// never be held across an await point.
fn extract_image_urls(body: &str, count: usize) -> Vec<Url> {
    static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a.iusc").unwrap());

    let document = Html::parse_document(body);
    let mut urls = Vec::new();
    for anchor in document.select(&ANCHOR) {
        if urls.len() >= count {
            break;
        }
        let Some(meta) = anchor.value().attr("m") else {
            continue;
        };
        let murl = match serde_json::from_str::<AnchorMetadata>(meta) {
            Ok(meta) => meta.murl,
            Err(err) => {
                tracing::debug!(error = %err, "skipping anchor with malformed metadata");
                continue;
            }
        };
        match Url::parse(&murl) {
            Ok(url) => urls.push(url),
            Err(err) => {
                tracing::debug!(error = %err, murl, "skipping unparseable image url");
            }
        }
    }
    urls
}
