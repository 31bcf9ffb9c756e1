//! Contract for the upstream model turn that writes the advisory text.
//!
//! Prompting, session history, and transport all live behind this trait;
//! the pipeline only ever needs one turn: given the full outline, come
//! back with one `[Section Title]: search query` line per section worth
//! illustrating.

use async_trait::async_trait;
use miette::Diagnostic;
use thiserror::Error;

/// Produces advisory text for an outline.
///
/// Implementations are expected to be cheap to share (`&dyn ImageAdvisor`
/// is all the pipeline holds) and safe to call concurrently.
#[async_trait]
pub trait ImageAdvisor: Send + Sync {
    /// Runs one advisory turn over `outline` and returns the raw reply.
    ///
    /// The reply does not have to be clean: anything that is not a
    /// `[title]: query` line is ignored downstream.
    async fn advise(&self, outline: &str) -> Result<String, AdvisorError>;
}

/// Failures of the advisory turn. These propagate to the pipeline caller
/// unchanged; unlike per-section retrieval trouble they are not absorbed.
#[derive(Debug, Error, Diagnostic)]
pub enum AdvisorError {
    #[error("advisory request failed: {message}")]
    #[diagnostic(code(slidesmith::advisor::request))]
    RequestFailed { message: String },

    #[error("advisory provider is rate limiting requests")]
    #[diagnostic(
        code(slidesmith::advisor::rate_limited),
        help("back off and retry the whole generation later")
    )]
    RateLimited,

    #[error("advisory response was unusable: {message}")]
    #[diagnostic(code(slidesmith::advisor::response))]
    InvalidResponse { message: String },
}
