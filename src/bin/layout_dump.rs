//! Dump the reconstructed layout of extractor output as JSON
//!
//! Usage:
//!   cargo run --release --bin layout_dump -- fragments.json
//!   cargo run --release --bin layout_dump -- fragments.json --config layout.json --sequential

use layout_oxide::fragment::fragments_from_path;
use layout_oxide::{LayoutAnalyzer, LayoutConfig};
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

struct DumpArgs {
    input: PathBuf,
    config: Option<PathBuf>,
    sequential: bool,
    compact: bool,
}

impl DumpArgs {
    fn from_args() -> Option<Self> {
        let args: Vec<String> = std::env::args().collect();
        let mut input = None;
        let mut config = None;
        let mut sequential = false;
        let mut compact = false;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--config" => {
                    i += 1;
                    if i < args.len() {
                        config = Some(PathBuf::from(&args[i]));
                    }
                },
                "--sequential" => {
                    sequential = true;
                },
                "--compact" => {
                    compact = true;
                },
                other => {
                    input = Some(PathBuf::from(other));
                },
            }
            i += 1;
        }

        Some(Self {
            input: input?,
            config,
            sequential,
            compact,
        })
    }
}

fn load_config(args: &DumpArgs) -> layout_oxide::Result<LayoutConfig> {
    let mut config = match &args.config {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => LayoutConfig::default(),
    };
    if args.sequential {
        config = config.sequential();
    }
    Ok(config)
}

fn run(args: &DumpArgs) -> layout_oxide::Result<()> {
    let analyzer = LayoutAnalyzer::with_config(load_config(args)?)?;
    let ingested = fragments_from_path(&args.input)?;
    if ingested.dropped > 0 {
        log::warn!("Dropped {} records without a usable bbox", ingested.dropped);
    }

    let start = Instant::now();
    let layout = analyzer.analyze(&ingested.fragments);
    log::info!(
        "Analyzed {} fragments on {} pages in {:.2?} ({} tables, {} diagnostics)",
        ingested.fragments.len(),
        layout.pages.len(),
        start.elapsed(),
        layout.tables.len(),
        layout.diagnostics.len()
    );

    let json = if args.compact {
        layout.to_json()?
    } else {
        layout.to_json_pretty()?
    };
    println!("{}", json);
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let Some(args) = DumpArgs::from_args() else {
        eprintln!("Usage: layout_dump <fragments.json> [--config <layout.json>] [--sequential] [--compact]");
        std::process::exit(2);
    };

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
