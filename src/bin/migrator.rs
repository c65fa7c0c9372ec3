use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use rankings_core::constants::OUTPUT_HTML_FOLDER;
use rankings_ingest::exit_code;

/// Reorganizes a flat directory of legacy-named ranking HTML files into
/// the nested `html/<rankingId>/{by_merit,by_course}` layout `scraper`
/// produces.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory containing the legacy flat ranking directories.
    #[arg(short = 'i', long)]
    html_dir: PathBuf,

    /// Archive root the migrated tree is written under. Falls back to a
    /// temp directory when omitted.
    #[arg(short, long)]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    rankings_ingest::init_logging();

    if let Err(e) = run().await {
        tracing::error!(error = ?e, "migrator run failed");
        std::process::exit(exit_code::IO_ERROR);
    }
    std::process::exit(exit_code::OK);
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let data_dir = rankings_ingest::resolve_data_dir(cli.data_dir);
    let html_out_dir = data_dir.join(OUTPUT_HTML_FOLDER);

    rankings_ingest::ensure_dir_exists(&html_out_dir)
        .await
        .with_context(|| format!("creating data directory {}", html_out_dir.display()))?;

    rankings_core::migrate::migrate_html_tree(&cli.html_dir, &html_out_dir)
        .await
        .context("migrating legacy html tree")?;
    Ok(())
}
