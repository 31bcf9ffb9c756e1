//! Pipeline tunables with environment overrides.
//!
//! Defaults are chosen so a zero-configuration run behaves sensibly
//! against the public endpoint: three candidates per section, three
//! one-second attempts per network call, 1080-pixel output, JPEG
//! quality 85, strictly sequential sections. Every knob can be overridden
//! through `SLIDESMITH_*` variables (a `.env` file is honored) or the
//! `with_*` builders.

use std::time::Duration;

use miette::Diagnostic;
use reqwest::Client;
use thiserror::Error;
use url::Url;

use crate::persistence::SaveOptions;
use crate::retry::RetryPolicy;

/// Image-search endpoint queried with `?q=<query>`.
pub const DEFAULT_ENDPOINT: &str = "https://www.bing.com/images/search";

/// Desktop-browser identity sent with every request. The endpoint serves
/// the anchor-metadata markup this crate scrapes only to browser-looking
/// agents, so an honest library user agent would get an empty page.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/87.0.4280.88 Safari/537.36";

/// Configuration for a [`DeckIllustrator`](crate::pipeline::DeckIllustrator).
#[derive(Debug, Clone)]
pub struct IllustratorConfig {
    pub endpoint: String,
    pub user_agent: String,
    /// Candidate images fetched per section before ranking.
    pub images_per_section: usize,
    /// Attempt budget for each network operation.
    pub attempts: u32,
    /// Per-attempt timeout.
    pub timeout: Duration,
    /// Larger-edge bound applied before an image is written.
    pub max_dimension: u32,
    /// JPEG quality for opaque images.
    pub jpeg_quality: u8,
    /// Sections processed at once; 1 keeps the pipeline sequential.
    pub max_concurrent_sections: usize,
}

impl Default for IllustratorConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            images_per_section: Self::DEFAULT_IMAGES_PER_SECTION,
            attempts: Self::DEFAULT_ATTEMPTS,
            timeout: Self::DEFAULT_TIMEOUT,
            max_dimension: Self::DEFAULT_MAX_DIMENSION,
            jpeg_quality: Self::DEFAULT_JPEG_QUALITY,
            max_concurrent_sections: 1,
        }
    }
}

impl IllustratorConfig {
    pub const DEFAULT_IMAGES_PER_SECTION: usize = 3;
    pub const DEFAULT_ATTEMPTS: u32 = 3;
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);
    pub const DEFAULT_MAX_DIMENSION: u32 = 1080;
    pub const DEFAULT_JPEG_QUALITY: u8 = 85;

    /// Builds a config from defaults plus `SLIDESMITH_*` environment
    /// overrides. A `.env` file in the working directory is loaded first.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(endpoint) = lookup("SLIDESMITH_ENDPOINT") {
            config.endpoint = endpoint;
        }
        if let Some(user_agent) = lookup("SLIDESMITH_USER_AGENT") {
            config.user_agent = user_agent;
        }
        if let Some(raw) = lookup("SLIDESMITH_IMAGES_PER_SECTION") {
            config.images_per_section = parse_env("SLIDESMITH_IMAGES_PER_SECTION", &raw)?;
        }
        if let Some(raw) = lookup("SLIDESMITH_ATTEMPTS") {
            config.attempts = parse_env("SLIDESMITH_ATTEMPTS", &raw)?;
        }
        if let Some(raw) = lookup("SLIDESMITH_TIMEOUT_MS") {
            let millis: u64 = parse_env("SLIDESMITH_TIMEOUT_MS", &raw)?;
            config.timeout = Duration::from_millis(millis);
        }
        if let Some(raw) = lookup("SLIDESMITH_MAX_DIMENSION") {
            config.max_dimension = parse_env("SLIDESMITH_MAX_DIMENSION", &raw)?;
        }
        if let Some(raw) = lookup("SLIDESMITH_JPEG_QUALITY") {
            config.jpeg_quality = parse_env("SLIDESMITH_JPEG_QUALITY", &raw)?;
        }
        if let Some(raw) = lookup("SLIDESMITH_MAX_CONCURRENT_SECTIONS") {
            config.max_concurrent_sections = parse_env("SLIDESMITH_MAX_CONCURRENT_SECTIONS", &raw)?;
        }
        Ok(config)
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    #[must_use]
    pub fn with_images_per_section(mut self, images_per_section: usize) -> Self {
        self.images_per_section = images_per_section;
        self
    }

    #[must_use]
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension;
        self
    }

    #[must_use]
    pub fn with_jpeg_quality(mut self, jpeg_quality: u8) -> Self {
        self.jpeg_quality = jpeg_quality;
        self
    }

    #[must_use]
    pub fn with_max_concurrent_sections(mut self, max_concurrent_sections: usize) -> Self {
        self.max_concurrent_sections = max_concurrent_sections.max(1);
        self
    }

    /// Network budget shared by the index query and each image download.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.attempts, self.timeout)
    }

    /// Resize and encoding knobs for persistence.
    pub fn save_options(&self) -> SaveOptions {
        SaveOptions {
            max_dimension: self.max_dimension,
            jpeg_quality: self.jpeg_quality,
        }
    }

    /// The endpoint as a parsed URL.
    pub fn endpoint(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.endpoint).map_err(|source| ConfigError::InvalidEndpoint {
            value: self.endpoint.clone(),
            source,
        })
    }

    /// A fresh HTTP client carrying the configured user agent over rustls.
    pub fn build_client(&self) -> Result<Client, ConfigError> {
        Client::builder()
            .user_agent(&self.user_agent)
            .use_rustls_tls()
            .build()
            .map_err(|source| ConfigError::HttpClient { source })
    }
}

fn parse_env<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|err: T::Err| ConfigError::EnvParse {
        key,
        value: raw.to_owned(),
        message: err.to_string(),
    })
}

/// Configuration problems surfaced before any pipeline work starts.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("could not parse {key}={value}: {message}")]
    #[diagnostic(code(slidesmith::config::env_parse))]
    EnvParse {
        key: &'static str,
        value: String,
        message: String,
    },

    #[error("invalid search endpoint {value}")]
    #[diagnostic(
        code(slidesmith::config::endpoint),
        help("set a full http(s) URL, e.g. https://www.bing.com/images/search")
    )]
    InvalidEndpoint {
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to build the HTTP client")]
    #[diagnostic(code(slidesmith::config::http_client))]
    HttpClient {
        #[source]
        source: reqwest::Error,
    },
}
