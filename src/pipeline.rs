//! End-to-end orchestration: advisory parsing, then per-section
//! retrieval, ranking, and persistence, then one splice pass over the
//! original outline.
//!
//! The pipeline degrades instead of failing: a section whose search comes
//! back empty, whose best candidate cannot be decoded, or whose file
//! write fails is logged and left without an image. The only hard errors
//! a caller sees are its own misuse (blank advisory or outline, an output
//! directory that cannot be created) and advisory-turn failures from
//! [`generate_with_advisor`].

use std::path::{Path, PathBuf};

use futures_util::stream::{self, StreamExt};
use miette::Diagnostic;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use crate::advisor::{AdvisorError, ImageAdvisor};
use crate::advisory::{SectionQuery, extract_section_queries};
use crate::config::{ConfigError, IllustratorConfig};
use crate::outline::insert_images;
use crate::persistence::{SaveOptions, persist_image, slug};
use crate::retrieval::ImageSearcher;
use crate::retry::RetryPolicy;
use crate::selection::select_best;

/// Result of one generation run: the outline with image references
/// spliced in, and the section-title-to-path map used to splice them.
///
/// A section missing from `image_pair` simply found no usable image;
/// that is an expected outcome, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedOutline {
    pub content: String,
    pub image_pair: FxHashMap<String, String>,
}

/// Hard failures of a generation run.
#[derive(Debug, Error, Diagnostic)]
pub enum PipelineError {
    #[error("advisory text is empty")]
    #[diagnostic(
        code(slidesmith::pipeline::empty_advisory),
        help("run the advisory turn first, or pass its reply through unchanged")
    )]
    EmptyAdvisory,

    #[error("outline is empty")]
    #[diagnostic(code(slidesmith::pipeline::empty_outline))]
    EmptyOutline,

    #[error("could not create output directory {path}: {source}")]
    #[diagnostic(code(slidesmith::pipeline::output_dir))]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Advisor(#[from] AdvisorError),
}

/// Drives the whole illustration pipeline for one outline.
///
/// Construction wires the dependencies explicitly; nothing here is a
/// process-wide singleton, so two illustrators with different endpoints
/// or budgets can coexist in one program.
#[derive(Debug, Clone)]
pub struct DeckIllustrator {
    config: IllustratorConfig,
    searcher: ImageSearcher,
}

impl DeckIllustrator {
    /// Builds an illustrator with a fresh HTTP client from `config`.
    pub fn new(config: IllustratorConfig) -> Result<Self, PipelineError> {
        let searcher = ImageSearcher::from_config(&config)?;
        Ok(Self { config, searcher })
    }

    /// Uses an externally constructed searcher (shared client, custom
    /// endpoint) with this config.
    pub fn with_searcher(config: IllustratorConfig, searcher: ImageSearcher) -> Self {
        Self { config, searcher }
    }

    pub fn config(&self) -> &IllustratorConfig {
        &self.config
    }

    /// Enriches `outline` with up to one image per advisory section.
    ///
    /// Extraction runs once over `advisory_text`; each extracted section
    /// is searched, ranked, and persisted under `output_dir`; the splice
    /// runs once, over the original outline, after every section settled.
    /// File stems are assigned up front in section order as
    /// `{slug(title)}_{k}`, where `k` counts sections sharing a slug, so
    /// concurrent sections never contend for a path.
    ///
    /// An advisory without a single `[title]: query` line yields the
    /// outline untouched and an empty map.
    #[instrument(skip(self, advisory_text, outline), fields(output_dir = %output_dir.display()), err)]
    pub async fn generate(
        &self,
        advisory_text: &str,
        outline: &str,
        output_dir: &Path,
        images_per_section: usize,
    ) -> Result<EnrichedOutline, PipelineError> {
        if advisory_text.trim().is_empty() {
            return Err(PipelineError::EmptyAdvisory);
        }
        if outline.trim().is_empty() {
            return Err(PipelineError::EmptyOutline);
        }
        tokio::fs::create_dir_all(output_dir)
            .await
            .map_err(|source| PipelineError::OutputDir {
                path: output_dir.to_path_buf(),
                source,
            })?;

        let sections = extract_section_queries(advisory_text);
        if sections.is_empty() {
            tracing::warn!("advisory text contained no [title]: query lines");
            return Ok(EnrichedOutline {
                content: outline.to_owned(),
                image_pair: FxHashMap::default(),
            });
        }

        let base_names = assign_base_names(&sections);
        let policy = self.config.retry_policy();
        let opts = self.config.save_options();

        let jobs = sections.iter().zip(&base_names).map(|(section, base_name)| {
            self.illustrate_section(
                section,
                base_name,
                output_dir,
                images_per_section,
                policy,
                &opts,
            )
        });
        let settled: Vec<Option<(String, String)>> = stream::iter(jobs)
            .buffer_unordered(self.config.max_concurrent_sections.max(1))
            .collect()
            .await;

        let image_pair: FxHashMap<String, String> = settled.into_iter().flatten().collect();
        tracing::info!(
            sections = sections.len(),
            illustrated = image_pair.len(),
            "outline enriched"
        );

        Ok(EnrichedOutline {
            content: insert_images(outline, &image_pair),
            image_pair,
        })
    }

    /// Runs one advisory turn against `advisor`, then
    /// [`generate`](Self::generate) with its reply.
    ///
    /// Advisor failures propagate; they concern the whole run, not a
    /// single section.
    #[instrument(skip(self, advisor, outline), fields(output_dir = %output_dir.display()), err)]
    pub async fn generate_with_advisor(
        &self,
        advisor: &dyn ImageAdvisor,
        outline: &str,
        output_dir: &Path,
        images_per_section: usize,
    ) -> Result<EnrichedOutline, PipelineError> {
        if outline.trim().is_empty() {
            return Err(PipelineError::EmptyOutline);
        }
        let advisory_text = advisor.advise(outline).await?;
        tracing::debug!(advisory = %advisory_text, "advisory turn complete");
        self.generate(&advisory_text, outline, output_dir, images_per_section)
            .await
    }

    /// One section end to end. Every failure mode is absorbed into
    /// `None`; the batch never aborts because of a single section.
    async fn illustrate_section(
        &self,
        section: &SectionQuery,
        base_name: &str,
        output_dir: &Path,
        images_per_section: usize,
        policy: RetryPolicy,
        opts: &SaveOptions,
    ) -> Option<(String, String)> {
        if section.query.trim().is_empty() {
            tracing::warn!(section = %section.section_title, "skipping section with an empty query");
            return None;
        }

        let candidates = match self
            .searcher
            .search(section, images_per_section, policy)
            .await
        {
            Ok(candidates) => candidates,
            Err(err) => {
                tracing::warn!(section = %section.section_title, error = %err, "search rejected the section");
                return None;
            }
        };
        for candidate in &candidates {
            tracing::debug!(
                section = %candidate.section_title,
                query = %candidate.query,
                width = candidate.width,
                height = candidate.height,
                "candidate"
            );
        }

        let Some(best) = select_best(candidates) else {
            tracing::warn!(section = %section.section_title, "no images found");
            return None;
        };

        match persist_image(&best.image, output_dir, base_name, opts).await {
            Ok(path) => Some((
                section.section_title.clone(),
                path.to_string_lossy().into_owned(),
            )),
            Err(err) => {
                tracing::error!(section = %section.section_title, error = %err, "failed to save image");
                None
            }
        }
    }
}

/// Pre-assigns `{slug}_{k}` file stems in section order.
///
/// `k` counts sections sharing a slug, starting at 1, so two titles that
/// sanitize to the same stem get distinct files no matter how the
/// sections interleave at runtime.
fn assign_base_names(sections: &[SectionQuery]) -> Vec<String> {
    let mut seen: FxHashMap<String, usize> = FxHashMap::default();
    sections
        .iter()
        .map(|section| {
            let stem = slug(&section.section_title);
            let k = *seen
                .entry(stem.clone())
                .and_modify(|k| *k += 1)
                .or_insert(1);
            format!("{stem}_{k}")
        })
        .collect()
}
