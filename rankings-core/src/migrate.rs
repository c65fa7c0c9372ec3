//! Migrator: reorganizes a flat directory of legacy-named HTML files into
//! the `html/<rankingId>/{by_merit,by_course}` layout C5 produces.
//!
//! Grounded directly on the legacy `cmd/migrate` tool: before the current
//! downloader existed, ranking pages were saved flat, one directory per
//! ranking, with the family encoded in the filename rather than in a
//! subfolder.

use std::path::Path;

use tracing::error;

use crate::constants::{
    OUTPUT_HTML_BY_COURSE_FOLDER, OUTPUT_HTML_BY_MERIT_FOLDER, OUTPUT_HTML_INDEX_FILENAME,
};
use crate::download::HtmlPage;
use crate::error::Result;
use crate::writer::FsStore;

const SUFFIX_MERIT_INDEX: &str = "_indice_M.html";
const SUFFIX_COURSE_INDEX: &str = "_sotto_indice.html";
const SUFFIX_MAIN_INDEX: &str = "_generale.html";

/// Migrates every ranking subdirectory found directly under `html_dir`
/// into the canonical layout rooted at `html_out_dir`. One ranking's
/// failure is logged and does not abort the rest of the migration.
pub async fn migrate_html_tree(html_dir: &Path, html_out_dir: &Path) -> Result<()> {
    let mut read = tokio::fs::read_dir(html_dir).await?;
    while let Some(entry) = read.next_entry().await? {
        if !entry.file_type().await?.is_dir() {
            continue;
        }
        let input_path = entry.path();
        if let Err(e) = organize_html(&input_path, html_out_dir).await {
            error!(dir = %input_path.display(), error = %e, "could not migrate ranking directory, skipping");
        }
    }
    Ok(())
}

/// Classifies every flat file directly under `input_path` by its legacy
/// filename shape, then writes the result into
/// `html_out_dir/<rankingId>/...`. A ranking id with no recognized
/// index file still writes any classified table pages it did find.
async fn organize_html(input_path: &Path, html_out_dir: &Path) -> Result<()> {
    let mut index: Option<Vec<u8>> = None;
    let mut by_merit = Vec::new();
    let mut by_course = Vec::new();

    let mut read = tokio::fs::read_dir(input_path).await?;
    while let Some(entry) = read.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }

        let filename = entry.file_name().to_string_lossy().into_owned();
        let parts: Vec<&str> = filename.split('_').collect();

        // the sub-indexes themselves aren't data pages; they only
        // existed to be crawled and are dropped here.
        if filename.ends_with(SUFFIX_MERIT_INDEX) || filename.ends_with(SUFFIX_COURSE_INDEX) {
            continue;
        }
        if filename.ends_with(SUFFIX_MAIN_INDEX) {
            index = Some(tokio::fs::read(entry.path()).await?);
            continue;
        }
        if parts.len() >= 3 && parts[2] == "sotto" {
            by_course.push(HtmlPage {
                id: filename,
                content: tokio::fs::read(entry.path()).await?,
            });
            continue;
        }
        if parts.len() >= 5 && parts[2] == "grad" && parts[4].trim_end_matches(".html") == "M" {
            by_merit.push(HtmlPage {
                id: filename,
                content: tokio::fs::read(entry.path()).await?,
            });
            continue;
        }
    }

    let ranking_id = input_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let out_root = html_out_dir.join(&ranking_id);
    let store = FsStore::new(&out_root).await?;

    if let Some(index) = index {
        store.write_bytes(OUTPUT_HTML_INDEX_FILENAME, &index).await?;
    }

    write_family(&out_root, OUTPUT_HTML_BY_MERIT_FOLDER, &by_merit).await?;
    write_family(&out_root, OUTPUT_HTML_BY_COURSE_FOLDER, &by_course).await?;

    Ok(())
}

async fn write_family(root: &Path, subfolder: &str, pages: &[HtmlPage]) -> Result<()> {
    if pages.is_empty() {
        return Ok(());
    }
    let store = FsStore::new(root.join(subfolder)).await?;
    for page in pages {
        store.write_bytes(&page.id, &page.content).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tempdir(name: &str) -> std::path::PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("rankings-core-migrate-test-{name}-{}-{}", std::process::id(), unique()));
        p
    }

    fn unique() -> u64 {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        COUNTER.fetch_add(1, Ordering::Relaxed)
    }

    #[tokio::test]
    async fn test_organize_html_classifies_legacy_filenames() {
        let html_dir = tempdir("in");
        let out_dir = tempdir("out");

        let ranking_dir = html_dir.join("2024_20103_html");
        tokio::fs::create_dir_all(&ranking_dir).await.unwrap();

        tokio::fs::write(ranking_dir.join("2024_20103_generale.html"), b"index").await.unwrap();
        tokio::fs::write(ranking_dir.join("2024_20103_indice_M.html"), b"merit index").await.unwrap();
        tokio::fs::write(ranking_dir.join("2024_20103_sotto_indice.html"), b"course index").await.unwrap();
        tokio::fs::write(ranking_dir.join("2024_20103_grad_001_M.html"), b"merit page").await.unwrap();
        tokio::fs::write(ranking_dir.join("2024_20103_sotto_001.html"), b"course page").await.unwrap();

        migrate_html_tree(&html_dir, &out_dir).await.unwrap();

        let out_root = out_dir.join("2024_20103_html");
        assert!(tokio::fs::try_exists(out_root.join(OUTPUT_HTML_INDEX_FILENAME)).await.unwrap());
        assert!(tokio::fs::try_exists(
            out_root.join(OUTPUT_HTML_BY_MERIT_FOLDER).join("2024_20103_grad_001_M.html")
        )
        .await
        .unwrap());
        assert!(tokio::fs::try_exists(
            out_root.join(OUTPUT_HTML_BY_COURSE_FOLDER).join("2024_20103_sotto_001.html")
        )
        .await
        .unwrap());
        assert!(!tokio::fs::try_exists(out_root.join("2024_20103_indice_M.html")).await.unwrap());

        tokio::fs::remove_dir_all(&html_dir).await.ok();
        tokio::fs::remove_dir_all(&out_dir).await.ok();
    }
}
