use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use rankings_ingest::exit_code;

/// Parses downloaded ranking HTML into structured JSON and rebuilds the
/// cross-ranking indexes.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Root directory the archive is read from and written to. Falls
    /// back to a temp directory when omitted.
    #[arg(short, long)]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    rankings_ingest::init_logging();

    if let Err(e) = run().await {
        tracing::error!(error = ?e, "parser run failed");
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

    let cfg = rankings_core::pipeline::ParseConfig { data_dir: data_dir.clone() };
    rankings_core::pipeline::run_parse_pipeline(&cfg)
        .await
        .context("running parse pipeline")?;

    // manifesti_list.json is an optional input produced by an external
    // collaborator (the manifesti scraper); its absence is not a parse
    // failure, just nothing to regroup yet.
    match rankings_core::manifesti::write_manifesti(&data_dir).await {
        Ok(()) => Ok(()),
        Err(rankings_core::IngestError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!("no manifesti list found under data-dir, skipping manifesti grouping");
            Ok(())
        }
        Err(e) => Err(e).context("grouping manifesti"),
    }
}
