//! Pipeline Driver (C12): orchestrates C1–C11 into the two idempotent,
//! independently-runnable pipelines described in §4.12 — scrape and parse.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use scraper::Html;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::bruteforce;
use crate::constants::{
    OUTPUT_BASE_FOLDER, OUTPUT_HTML_BY_COURSE_FOLDER, OUTPUT_HTML_BY_MERIT_FOLDER,
    OUTPUT_HTML_FOLDER, OUTPUT_HTML_INDEX_FILENAME, OUTPUT_INDEXES_FOLDER, OUTPUT_LINKS_FOLDER,
    OUTPUT_RANKINGS_FOLDER, STYLE_DIRECTORY_NAME, WEB_RISULTATI_AMMISSIONE_HOST,
};
use crate::course_table;
use crate::download::{self, HtmlPage};
use crate::error::{IngestError, Result};
use crate::fetch::Fetcher;
use crate::html_writer;
use crate::id_hash_index::IdHashIndex;
use crate::index_header;
use crate::links::{self, LinkStore};
use crate::merit_table;
use crate::model::{IndexEntry, Ranking};
use crate::news;
use crate::rollup::IndexGenerator;
use crate::writer::FsStore;

/// Configuration for [`run_scrape_pipeline`].
pub struct ScrapeConfig {
    pub data_dir: PathBuf,
    /// Bounded concurrency used by C1's HEAD worker pool (only exercised
    /// by the bruteforce supplement).
    pub max_workers: usize,
    /// Re-download and overwrite even when no new links were discovered.
    pub force: bool,
    /// Optional offline URL enumeration for a year, merged into the
    /// candidate links before download.
    pub bruteforce_year: Option<u16>,
}

/// Runs the scrape pipeline: discovers candidate ranking URLs via C3,
/// filters them through C2, downloads them via C4, persists successes
/// via C5, and records the outcome back into the link store.
pub async fn run_scrape_pipeline(cfg: &ScrapeConfig) -> Result<()> {
    let fetcher = Fetcher::new(cfg.max_workers);
    let mut link_store = LinkStore::open(cfg.data_dir.join(OUTPUT_LINKS_FOLDER)).await?;

    let news_links = match news::scrape_rankings_links(&fetcher, WEB_RISULTATI_AMMISSIONE_HOST).await {
        Ok(links) => links,
        Err(e) => {
            error!(error = %e, "could not scrape news discovery page, no candidate links found");
            Vec::new()
        }
    };

    let mut candidates = link_store.filter_new(&news_links);

    if let Some(year) = cfg.bruteforce_year {
        let html_root = cfg.data_dir.join(OUTPUT_HTML_FOLDER);
        match bruteforce::run_bruteforce(&fetcher, &cfg.data_dir, &html_root, year).await {
            Ok(extra) => candidates = links::merge_unique(&candidates, &extra),
            Err(e) => error!(error = %e, year, "bruteforce supplement failed, continuing without it"),
        }
    }

    info!(count = candidates.len(), "downloading candidate rankings");
    let rankings = download::download_rankings(&fetcher, &candidates).await;

    let html_root = cfg.data_dir.join(OUTPUT_HTML_FOLDER);
    let mut success = Vec::new();
    let mut broken = Vec::new();

    for ranking in &rankings {
        if ranking.is_broken() {
            warn!(url = ranking.url, "ranking has no pages, treating as broken/expired");
            broken.push(ranking.url.clone());
            continue;
        }

        if let Err(e) = html_writer::write_ranking(&html_root, ranking).await {
            error!(url = ranking.url, error = %e, "could not persist ranking HTML, skipping");
            continue;
        }

        success.push(ranking.url.clone());
    }

    link_store.set_new(success, broken);
    link_store.write(cfg.force).await;

    Ok(())
}

/// Configuration for [`run_parse_pipeline`].
pub struct ParseConfig {
    pub data_dir: PathBuf,
}

/// Runs the parse pipeline: for every ranking directory under `html/`
/// (skipping `style`), runs C6→C7→C8→C9 and feeds the result to a
/// per-run C10 and C11. One ranking's failure is logged and never
/// aborts the batch.
pub async fn run_parse_pipeline(cfg: &ParseConfig) -> Result<()> {
    let html_root = cfg.data_dir.join(OUTPUT_HTML_FOLDER);

    let mut read = tokio::fs::read_dir(&html_root)
        .await
        .map_err(|e| IngestError::Config(format!("could not read html root {}: {e}", html_root.display())))?;

    let mut dir_names = Vec::new();
    while let Some(entry) = read.next_entry().await? {
        if !entry.file_type().await?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name == STYLE_DIRECTORY_NAME {
            continue;
        }
        dir_names.push(name);
    }

    let index_gen = Arc::new(IndexGenerator::new());
    let id_hash_index = Arc::new(IdHashIndex::new());
    let rankings_store = Arc::new(
        FsStore::new(cfg.data_dir.join(OUTPUT_BASE_FOLDER).join(OUTPUT_RANKINGS_FOLDER)).await?,
    );

    let mut set = JoinSet::new();
    for name in dir_names {
        let ranking_dir = html_root.join(&name);
        let index_gen = index_gen.clone();
        let id_hash_index = id_hash_index.clone();
        let rankings_store = rankings_store.clone();

        set.spawn(async move {
            match parse_one_ranking(&ranking_dir, &name).await {
                Ok(ranking) => {
                    index_gen.add(IndexEntry::from(&ranking));
                    id_hash_index.add(&ranking);

                    if let Err(e) = rankings_store.write_json(&format!("{name}.json"), &ranking, true).await {
                        error!(ranking_id = name, error = %e, "could not write parsed ranking output");
                    }
                }
                Err(e) => {
                    error!(ranking_id = name, error = %e, "could not parse ranking, skipping");
                }
            }
        });
    }

    while set.join_next().await.is_some() {}

    let indexes_store = FsStore::new(cfg.data_dir.join(OUTPUT_BASE_FOLDER).join(OUTPUT_INDEXES_FOLDER)).await?;
    index_gen.generate(&indexes_store).await?;
    id_hash_index.write(&indexes_store).await?;

    Ok(())
}

/// Runs C6→C7→C8→C9 for a single ranking directory (`index.html` plus
/// `by_merit/`/`by_id/`/`by_course/` subfolders). Ordering is a hard
/// invariant: the merit table must be parsed before the course table.
async fn parse_one_ranking(ranking_dir: &Path, ranking_id: &str) -> Result<Ranking> {
    let store = FsStore::new(ranking_dir).await?;

    let index_bytes = store.read_bytes(OUTPUT_HTML_INDEX_FILENAME).await?;
    let index_html = Html::parse_document(&String::from_utf8_lossy(&index_bytes));
    let (header, phase) = index_header::parse_header_and_phase(&index_html)?;

    let mut ranking = Ranking::new(ranking_id.to_string(), header.school, header.year, phase);

    let merit_pages = read_page_family(ranking_dir, OUTPUT_HTML_BY_MERIT_FOLDER).await?;
    merit_table::parse_merit_table(&mut ranking, &merit_pages).await?;

    let course_pages = read_page_family(ranking_dir, OUTPUT_HTML_BY_COURSE_FOLDER).await?;
    course_table::parse_all_course_tables(&mut ranking, &course_pages).await?;

    Ok(ranking)
}

/// Reads every file directly under `ranking_dir/subfolder` into an
/// [`HtmlPage`], keyed by filename. A missing subfolder (the family
/// wasn't downloaded, or doesn't exist for this ranking) yields no pages
/// rather than an error.
async fn read_page_family(ranking_dir: &Path, subfolder: &str) -> Result<Vec<HtmlPage>> {
    let folder = ranking_dir.join(subfolder);

    let mut read = match tokio::fs::read_dir(&folder).await {
        Ok(read) => read,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(IngestError::Io(e)),
    };

    let mut pages = Vec::new();
    while let Some(entry) = read.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let id = entry.file_name().to_string_lossy().into_owned();
        let content = tokio::fs::read(entry.path()).await?;
        pages.push(HtmlPage { id, content });
    }
    pages.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tempdir(name: &str) -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("rankings-core-pipeline-test-{name}-{}-{}", std::process::id(), unique()));
        p
    }

    fn unique() -> u64 {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        COUNTER.fetch_add(1, Ordering::Relaxed)
    }

    #[tokio::test]
    async fn test_read_page_family_missing_folder_returns_empty() {
        let dir = tempdir("missing-folder");
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let pages = read_page_family(&dir, "by_merit").await.unwrap();
        assert!(pages.is_empty());
        tokio::fs::remove_dir_all(&dir).await.ok();
    }

    #[tokio::test]
    async fn test_read_page_family_reads_and_sorts_files() {
        let dir = tempdir("family");
        let sub = dir.join("by_merit");
        tokio::fs::create_dir_all(&sub).await.unwrap();
        tokio::fs::write(sub.join("b.html"), b"b").await.unwrap();
        tokio::fs::write(sub.join("a.html"), b"a").await.unwrap();

        let pages = read_page_family(&dir, "by_merit").await.unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].id, "a.html");
        assert_eq!(pages[1].id, "b.html");

        tokio::fs::remove_dir_all(&dir).await.ok();
    }

    #[tokio::test]
    async fn test_run_parse_pipeline_skips_style_directory_and_succeeds_on_empty_html_root() {
        let dir = tempdir("run-parse");
        let html_root = dir.join(OUTPUT_HTML_FOLDER);
        tokio::fs::create_dir_all(html_root.join(STYLE_DIRECTORY_NAME)).await.unwrap();

        let cfg = ParseConfig { data_dir: dir.clone() };
        run_parse_pipeline(&cfg).await.unwrap();

        let indexes_dir = dir.join(OUTPUT_BASE_FOLDER).join(OUTPUT_INDEXES_FOLDER);
        assert!(tokio::fs::try_exists(indexes_dir.join("by_school_year.json")).await.unwrap());

        tokio::fs::remove_dir_all(&dir).await.ok();
    }
}
