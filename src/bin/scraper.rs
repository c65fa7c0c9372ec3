use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use rankings_ingest::exit_code;

/// Discovers and downloads admission ranking pages into a local archive.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Root directory the archive is read from and written to. Falls
    /// back to a temp directory when omitted.
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Re-download and overwrite the link store even when no new links
    /// were discovered this run.
    #[arg(short, long)]
    force: bool,

    /// Supplement discovery with an offline URL enumeration sweep for
    /// the given admission year.
    #[arg(short, long)]
    bruteforce: Option<u16>,

    /// Maximum concurrent HTTP workers.
    #[arg(short = 'w', long, default_value_t = 8)]
    max_workers: usize,
}

#[tokio::main]
async fn main() {
    rankings_ingest::init_logging();

    if let Err(e) = run().await {
        tracing::error!(error = ?e, "scraper run failed");
        std::process::exit(exit_code::IO_ERROR);
    }
    std::process::exit(exit_code::OK);
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let data_dir = rankings_ingest::resolve_data_dir(cli.data_dir);

    rankings_ingest::ensure_dir_exists(&data_dir)
        .await
        .with_context(|| format!("creating data directory {}", data_dir.display()))?;

    let cfg = rankings_core::pipeline::ScrapeConfig {
        data_dir,
        max_workers: cli.max_workers,
        force: cli.force,
        bruteforce_year: cli.bruteforce,
    };

    rankings_core::pipeline::run_scrape_pipeline(&cfg)
        .await
        .context("running scrape pipeline")?;
    Ok(())
}
