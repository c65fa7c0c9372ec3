//! HTML Writer (C5): persists a downloaded [`HtmlRanking`] under a stable
//! per-ranking directory layout.

use std::path::{Path, PathBuf};

use crate::constants::{
    OUTPUT_HTML_BY_COURSE_FOLDER, OUTPUT_HTML_BY_ID_FOLDER, OUTPUT_HTML_BY_MERIT_FOLDER,
    OUTPUT_HTML_INDEX_FILENAME,
};
use crate::download::{HtmlPage, HtmlRanking};
use crate::error::Result;
use crate::writer::FsStore;

/// Writes `ranking`'s pages under `html_root/<ranking.id>/`.
pub async fn write_ranking(html_root: &Path, ranking: &HtmlRanking) -> Result<()> {
    let root = html_root.join(&ranking.id);
    let store = FsStore::new(&root).await?;

    if let Some(index) = &ranking.index {
        store.write_bytes(OUTPUT_HTML_INDEX_FILENAME, &index.content).await?;
    }

    write_family(&root, OUTPUT_HTML_BY_MERIT_FOLDER, &ranking.by_merit).await?;
    write_family(&root, OUTPUT_HTML_BY_ID_FOLDER, &ranking.by_id).await?;
    write_family(&root, OUTPUT_HTML_BY_COURSE_FOLDER, &ranking.by_course).await?;

    Ok(())
}

async fn write_family(root: &Path, subfolder: &str, pages: &[HtmlPage]) -> Result<()> {
    if pages.is_empty() {
        return Ok(());
    }

    let store = FsStore::new(root.join(subfolder)).await?;
    for page in pages {
        store.write_bytes(&page_filename(&page.id), &page.content).await?;
    }
    Ok(())
}

/// Derives a filesystem-safe filename from a source href: the basename,
/// with path separators replaced so a relative href can't escape its folder.
fn page_filename(href: &str) -> String {
    let base = href.rsplit('/').next().unwrap_or(href);
    if base.is_empty() {
        href.replace(['/', '\\'], "_")
    } else {
        base.to_string()
    }
}

pub fn ranking_dir(html_root: &Path, ranking_id: &str) -> PathBuf {
    html_root.join(ranking_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_filename_takes_basename() {
        assert_eq!(page_filename("2024_generale.html"), "2024_generale.html");
        assert_eq!(page_filename("sub/path/2024_generale.html"), "2024_generale.html");
    }

    #[tokio::test]
    async fn test_write_ranking_creates_expected_tree() {
        let dir = tempdir();
        let ranking = HtmlRanking {
            id: "2024_20103_html".to_string(),
            url: "https://example.test/2024_20103_html/".to_string(),
            index: Some(HtmlPage {
                id: "index".to_string(),
                content: b"<html></html>".to_vec(),
            }),
            by_merit: vec![HtmlPage {
                id: "2024_generale.html".to_string(),
                content: b"<html>merit</html>".to_vec(),
            }],
            by_id: vec![],
            by_course: vec![],
            page_count: 2,
        };

        write_ranking(&dir, &ranking).await.unwrap();

        let root = ranking_dir(&dir, &ranking.id);
        assert!(tokio::fs::try_exists(root.join(OUTPUT_HTML_INDEX_FILENAME)).await.unwrap());
        assert!(tokio::fs::try_exists(
            root.join(OUTPUT_HTML_BY_MERIT_FOLDER).join("2024_generale.html")
        )
        .await
        .unwrap());
    }

    fn tempdir() -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("rankings-core-html-writer-test-{}-{}", std::process::id(), unique()));
        p
    }

    fn unique() -> u64 {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        COUNTER.fetch_add(1, Ordering::Relaxed)
    }
}
