//! # Slidesmith: image sourcing and embedding for slide outlines
//!
//! Given a markdown outline and an advisory text naming one image search
//! per section, slidesmith finds, ranks, shrinks, and stores an image for
//! each section and splices the references back into the outline.
//!
//! ```text
//! advisory text ──► advisory::extract_section_queries ──► Vec<SectionQuery>
//!                                                              │  per section
//!                                                              ▼
//!                        retrieval::ImageSearcher::search ──► Vec<ImageCandidate>
//!                                 (retry::with_retries)       │
//!                                                              ▼
//!                           selection::select_best ──► best candidate
//!                                                              │
//!                                                              ▼
//!                        persistence::persist_image ──► {slug}_{k}.{jpeg|png}
//!                                                              │
//! outline ────────────────► outline::insert_images ◄── image_pair map
//!                                      │
//!                                      ▼
//!                    EnrichedOutline { content, image_pair }
//! ```
//!
//! The [`pipeline::DeckIllustrator`] drives the whole flow; the upstream
//! model turn that writes the advisory text stays behind the
//! [`advisor::ImageAdvisor`] trait.
//!
//! ## Quick start
//!
//! ```no_run
//! use std::path::Path;
//!
//! use slidesmith::config::IllustratorConfig;
//! use slidesmith::pipeline::DeckIllustrator;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> miette::Result<()> {
//! let illustrator = DeckIllustrator::new(IllustratorConfig::from_env()?)?;
//!
//! let advisory = "[Intro]: sunrise over mountains\n[Summary]: handshake close-up";
//! let outline = "## Intro\nWelcome aboard.\n## Summary\nThanks for listening!\n";
//!
//! let enriched = illustrator
//!     .generate(advisory, outline, Path::new("images/deck"), 3)
//!     .await?;
//! println!("{}", enriched.content);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module guide
//!
//! - [`advisory`] - advisory text parsing into per-section queries
//! - [`retrieval`] - index query, URL harvesting, candidate download
//! - [`selection`] - resolution ranking
//! - [`persistence`] - resize, transcode, and write the winner
//! - [`outline`] - heading-anchored markdown splicing
//! - [`pipeline`] - the orchestrator tying the stages together
//! - [`retry`] - bounded attempts with per-attempt timeouts
//! - [`config`] - tunables, defaults, and environment overrides
//! - [`advisor`] - contract for the upstream advisory model turn

pub mod advisor;
pub mod advisory;
pub mod config;
pub mod outline;
pub mod persistence;
pub mod pipeline;
pub mod retrieval;
pub mod retry;
pub mod selection;

pub use advisory::{SectionQuery, extract_section_queries};
pub use config::IllustratorConfig;
pub use outline::insert_images;
pub use pipeline::{DeckIllustrator, EnrichedOutline, PipelineError};
