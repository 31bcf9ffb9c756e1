//! End-to-end outline illustration against the live image index.
//!
//! Pairs an advisory (one `[Section]: query` line per slide that should get
//! a picture) with a markdown outline, downloads and saves the best image
//! for each advised section, and prints the outline with the image
//! references spliced in.
//!
//! Inline samples are used by default. Point `SLIDESMITH_ADVISORY` and
//! `SLIDESMITH_OUTLINE` at files to illustrate your own deck, and set
//! `SLIDESMITH_OUTPUT_DIR` to choose where images land:
//!
//! ```bash
//! cargo run --example illustrate_outline
//! SLIDESMITH_OUTLINE=deck.md SLIDESMITH_ADVISORY=advice.txt \
//!     cargo run --example illustrate_outline
//! ```

use std::env;
use std::path::PathBuf;
use std::time::Instant;

use miette::Result;
use slidesmith::{DeckIllustrator, IllustratorConfig};
use tracing_subscriber::FmtSubscriber;

const SAMPLE_ADVISORY: &str = "\
[Ferris the Crab]: rust mascot ferris crab
[Ownership and Borrowing]: rust ownership borrowing diagram
[Fearless Concurrency]: multithreaded programming illustration
";

const SAMPLE_OUTLINE: &str = "\
# Why Rust
## Ferris the Crab
- A mascot with pincers and a plan
## Ownership and Borrowing
- Memory safety without a garbage collector
## Fearless Concurrency
- Threads that cannot race on shared state
## Closing Notes
- Questions welcome
";

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let advisory = read_input("SLIDESMITH_ADVISORY", SAMPLE_ADVISORY).await?;
    let outline = read_input("SLIDESMITH_OUTLINE", SAMPLE_OUTLINE).await?;
    let output_dir = PathBuf::from(
        env::var("SLIDESMITH_OUTPUT_DIR").unwrap_or_else(|_| "images/deck".to_string()),
    );

    let config = IllustratorConfig::from_env()?;
    let images_per_section = config.images_per_section;
    let illustrator = DeckIllustrator::new(config)?;

    println!("🖼  Illustrating outline");
    println!("  output directory : {}", output_dir.display());
    println!("  images per query : {images_per_section}");

    let start = Instant::now();
    let enriched = illustrator
        .generate(&advisory, &outline, &output_dir, images_per_section)
        .await?;
    let duration = start.elapsed();

    println!("\n✅ Enriched outline\n");
    println!("{}", enriched.content);

    if enriched.image_pair.is_empty() {
        println!("(no section could be illustrated)");
    } else {
        let mut pairs: Vec<_> = enriched.image_pair.iter().collect();
        pairs.sort();
        println!("Saved images:");
        for (section, path) in pairs {
            println!("  {section} -> {path}");
        }
    }
    println!("\n  duration: {:.2}s", duration.as_secs_f64());

    Ok(())
}

/// Reads the file named by `var` when set, otherwise falls back to the
/// inline sample.
async fn read_input(var: &str, fallback: &str) -> Result<String> {
    match env::var(var) {
        Ok(path) => tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| miette::miette!("reading {var} from {path}: {e}")),
        Err(_) => Ok(fallback.to_string()),
    }
}

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let subscriber = FmtSubscriber::builder().with_env_filter("info").finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
