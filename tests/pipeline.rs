//! End-to-end pipeline runs against a mocked search endpoint and a
//! temporary output directory.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use httpmock::prelude::*;
use image::DynamicImage;
use tempfile::tempdir;

use slidesmith::advisor::{AdvisorError, ImageAdvisor};
use slidesmith::config::IllustratorConfig;
use slidesmith::pipeline::{DeckIllustrator, PipelineError};

fn results_page(murls: &[String]) -> String {
    let anchors: Vec<String> = murls
        .iter()
        .map(|murl| format!(r#"<a class="iusc" m='{{"murl":"{murl}"}}'>thumb</a>"#))
        .collect();
    format!("<html><body><ul>{}</ul></body></html>", anchors.join("\n"))
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        width,
        height,
        image::Rgb([99, 120, 33]),
    ));
    let mut bytes = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

fn illustrator_for(server: &MockServer, max_concurrent_sections: usize) -> DeckIllustrator {
    let config = IllustratorConfig::default()
        .with_endpoint(server.url("/images/search"))
        .with_timeout(Duration::from_secs(2))
        .with_max_concurrent_sections(max_concurrent_sections);
    DeckIllustrator::new(config).unwrap()
}

async fn mock_section(server: &MockServer, query: &str, images: &[(&str, u32, u32)]) {
    let mut murls = Vec::new();
    for (path, width, height) in images {
        server
            .mock_async(|when, then| {
                when.method(GET).path(*path);
                then.status(200).body(png_bytes(*width, *height));
            })
            .await;
        murls.push(server.url(*path));
    }
    let page = results_page(&murls);
    let query = query.to_owned();
    server
        .mock_async(move |when, then| {
            when.method(GET)
                .path("/images/search")
                .query_param("q", query);
            then.status(200)
                .header("content-type", "text/html")
                .body(page);
        })
        .await;
}

struct ScriptedAdvisor(&'static str);

#[async_trait]
impl ImageAdvisor for ScriptedAdvisor {
    async fn advise(&self, _outline: &str) -> Result<String, AdvisorError> {
        Ok(self.0.to_owned())
    }
}

struct UnavailableAdvisor;

#[async_trait]
impl ImageAdvisor for UnavailableAdvisor {
    async fn advise(&self, _outline: &str) -> Result<String, AdvisorError> {
        Err(AdvisorError::RequestFailed {
            message: "provider offline".to_owned(),
        })
    }
}

#[tokio::test]
async fn enriches_outline_and_writes_images() {
    let server = MockServer::start_async().await;
    mock_section(
        &server,
        "sunrise over mountains",
        &[("/img/intro-big.png", 64, 32), ("/img/intro-small.png", 8, 4)],
    )
    .await;
    mock_section(&server, "business handshake", &[("/img/summary.png", 20, 10)]).await;

    let advisory = "Suggestions below:\n\
                    [Intro]: sunrise over mountains\n\
                    [Summary]: business handshake\n";
    let outline = "## Intro\nWelcome aboard.\n## Summary\nThanks for listening!\n";

    let dir = tempdir().unwrap();
    let enriched = illustrator_for(&server, 1)
        .generate(advisory, outline, dir.path(), 5)
        .await
        .unwrap();

    assert_eq!(enriched.image_pair.len(), 2);
    let intro_path = &enriched.image_pair["Intro"];
    let summary_path = &enriched.image_pair["Summary"];
    assert!(intro_path.ends_with("Intro_1.jpeg"));
    assert!(summary_path.ends_with("Summary_1.jpeg"));

    let expected = format!(
        "## Intro\n![Intro]({intro_path})\nWelcome aboard.\n## Summary\n![Summary]({summary_path})\nThanks for listening!\n"
    );
    assert_eq!(enriched.content, expected);

    // The higher-resolution intro candidate is the one on disk.
    let intro = image::load_from_memory(&tokio::fs::read(intro_path).await.unwrap()).unwrap();
    assert_eq!((intro.width(), intro.height()), (64, 32));
    assert!(tokio::fs::metadata(summary_path).await.is_ok());
}

#[tokio::test]
async fn failing_section_is_absent_but_run_succeeds() {
    let server = MockServer::start_async().await;
    mock_section(&server, "good query", &[("/img/good.png", 12, 12)]).await;
    let broken = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/images/search")
                .query_param("q", "broken query");
            then.status(500);
        })
        .await;

    let advisory = "[Good]: good query\n[Broken]: broken query";
    let outline = "## Good\nbody\n## Broken\nbody\n";

    let dir = tempdir().unwrap();
    let enriched = illustrator_for(&server, 1)
        .generate(advisory, outline, dir.path(), 3)
        .await
        .unwrap();

    assert_eq!(broken.hits_async().await, 3);
    assert_eq!(enriched.image_pair.len(), 1);
    assert!(enriched.image_pair.contains_key("Good"));
    assert!(enriched.content.contains("![Good]("));
    assert!(!enriched.content.contains("![Broken]("));
    assert!(enriched.content.contains("## Broken\nbody\n"));
}

#[tokio::test]
async fn colliding_slugs_get_numbered_files() {
    let server = MockServer::start_async().await;
    mock_section(&server, "first query", &[("/img/one.png", 6, 6)]).await;
    mock_section(&server, "second query", &[("/img/two.png", 6, 6)]).await;

    // Distinct titles, identical slug.
    let advisory = "[Intro?]: first query\n[Intro!]: second query";
    let outline = "## Intro?\nbody\n## Intro!\nbody\n";

    let dir = tempdir().unwrap();
    let enriched = illustrator_for(&server, 1)
        .generate(advisory, outline, dir.path(), 3)
        .await
        .unwrap();

    assert_eq!(enriched.image_pair.len(), 2);
    assert!(enriched.image_pair["Intro?"].ends_with("Intro__1.jpeg"));
    assert!(enriched.image_pair["Intro!"].ends_with("Intro__2.jpeg"));
    assert!(tokio::fs::metadata(&enriched.image_pair["Intro?"]).await.is_ok());
    assert!(tokio::fs::metadata(&enriched.image_pair["Intro!"]).await.is_ok());
}

#[tokio::test]
async fn concurrent_and_sequential_runs_agree() {
    let server = MockServer::start_async().await;
    mock_section(&server, "alpha sky", &[("/img/a.png", 10, 5)]).await;
    mock_section(&server, "beta sea", &[("/img/b.png", 12, 6)]).await;
    mock_section(&server, "gamma field", &[("/img/c.png", 14, 7)]).await;

    let advisory = "[Alpha]: alpha sky\n[Beta]: beta sea\n[Gamma]: gamma field";
    let outline = "## Alpha\na\n## Beta\nb\n## Gamma\nc\n";

    let seq_dir = tempdir().unwrap();
    let conc_dir = tempdir().unwrap();
    let sequential = illustrator_for(&server, 1)
        .generate(advisory, outline, seq_dir.path(), 3)
        .await
        .unwrap();
    let concurrent = illustrator_for(&server, 4)
        .generate(advisory, outline, conc_dir.path(), 3)
        .await
        .unwrap();

    let file_names = |pair: &rustc_hash::FxHashMap<String, String>| {
        let mut names: Vec<(String, String)> = pair
            .iter()
            .map(|(title, path)| {
                let name = Path::new(path)
                    .file_name()
                    .unwrap()
                    .to_string_lossy()
                    .into_owned();
                (title.clone(), name)
            })
            .collect();
        names.sort();
        names
    };
    assert_eq!(file_names(&sequential.image_pair), file_names(&concurrent.image_pair));
    assert_eq!(sequential.image_pair.len(), 3);
}

#[tokio::test]
async fn advisor_reply_drives_generation() {
    let server = MockServer::start_async().await;
    mock_section(&server, "city skyline", &[("/img/city.png", 16, 9)]).await;

    let advisor = ScriptedAdvisor("[Intro]: city skyline");
    let outline = "## Intro\nbody\n";

    let dir = tempdir().unwrap();
    let enriched = illustrator_for(&server, 1)
        .generate_with_advisor(&advisor, outline, dir.path(), 3)
        .await
        .unwrap();

    assert_eq!(enriched.image_pair.len(), 1);
    assert!(enriched.content.starts_with("## Intro\n![Intro]("));
}

#[tokio::test]
async fn advisor_failure_propagates() {
    let server = MockServer::start_async().await;
    let dir = tempdir().unwrap();
    let err = illustrator_for(&server, 1)
        .generate_with_advisor(&UnavailableAdvisor, "## Intro\nbody\n", dir.path(), 3)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Advisor(_)));
}

#[tokio::test]
async fn headings_without_advisory_entries_stay_bare() {
    let server = MockServer::start_async().await;
    mock_section(&server, "only query", &[("/img/only.png", 10, 10)]).await;

    let advisory = "[Middle]: only query";
    let outline = "## Opening\nhello\n## Middle\nbody\n## Closing\nbye\n";

    let dir = tempdir().unwrap();
    let enriched = illustrator_for(&server, 1)
        .generate(advisory, outline, dir.path(), 3)
        .await
        .unwrap();

    assert_eq!(enriched.image_pair.len(), 1);
    assert!(enriched.content.contains("## Opening\nhello\n"));
    assert!(enriched.content.contains("## Closing\nbye\n"));
    assert!(enriched.content.contains("## Middle\n![Middle]("));
}
