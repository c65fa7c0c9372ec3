//! Shared argv/env plumbing for the three CLI binaries (`scraper`,
//! `parser`, `migrator`): data-dir resolution and logging
//! initialization, the Rust analogue of the original `cmd/*/argv.go` +
//! `pkg/logger`.

use std::path::PathBuf;

use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Initializes the global tracing subscriber, reading `LOG_LEVEL` (§6)
/// into an [`EnvFilter`] directive and defaulting to `info` when unset.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Resolves `--data-dir`: an explicit path is canonicalized as given; an
/// absent one falls back to a process-specific directory under the
/// system temp dir, with a warning, exactly as the original tools default
/// to `pkg/utils.TmpDirectory()`.
pub fn resolve_data_dir(data_dir: Option<PathBuf>) -> PathBuf {
    match data_dir {
        Some(path) => path,
        None => {
            let dir = std::env::temp_dir().join("rankings-ingest");
            warn!(
                data_dir = %dir.display(),
                "no --data-dir given, falling back to a temp directory"
            );
            dir
        }
    }
}

/// Ensures `dir` exists, creating it (and its parents) if absent. The
/// only CLI-level failure mode that must abort a run per §7(c).
pub async fn ensure_dir_exists(dir: &std::path::Path) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await
}

/// Exit codes shared by all three binaries (§6): 0 ok, 1 internal/I-O
/// error, 2 invalid argv.
pub mod exit_code {
    pub const OK: i32 = 0;
    pub const IO_ERROR: i32 = 1;
    pub const INVALID_ARGV: i32 = 2;
}
