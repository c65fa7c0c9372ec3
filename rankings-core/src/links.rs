//! Link Store (C2): a persisted set of successfully scraped URLs and
//! known-broken URLs, with set-difference filtering for "new" links.

use std::collections::HashSet;

use tracing::{error, info};

use crate::constants::{OUTPUT_BROKEN_LINKS_FILENAME, OUTPUT_SCRAPED_LINKS_FILENAME};
use crate::error::Result;
use crate::writer::FsStore;

pub struct LinkStore {
    store: FsStore,
    scraped: Vec<String>,
    broken: Vec<String>,
    new_scraped: Vec<String>,
    new_broken: Vec<String>,
}

impl LinkStore {
    /// Loads both lists from `links_dir`, treating an absent file as
    /// empty (and writing it back so it exists for next time).
    pub async fn open(links_dir: impl Into<std::path::PathBuf>) -> Result<Self> {
        let store = FsStore::new(links_dir).await?;
        let scraped: Vec<String> = store.read_json_or_default(OUTPUT_SCRAPED_LINKS_FILENAME).await;
        let broken: Vec<String> = store.read_json_or_default(OUTPUT_BROKEN_LINKS_FILENAME).await;

        if store.read_bytes(OUTPUT_SCRAPED_LINKS_FILENAME).await.is_err() {
            store.write_json(OUTPUT_SCRAPED_LINKS_FILENAME, &scraped, true).await?;
        }
        if store.read_bytes(OUTPUT_BROKEN_LINKS_FILENAME).await.is_err() {
            store.write_json(OUTPUT_BROKEN_LINKS_FILENAME, &broken, true).await?;
        }

        Ok(Self {
            store,
            scraped,
            broken,
            new_scraped: Vec::new(),
            new_broken: Vec::new(),
        })
    }

    /// `candidates \ (scraped ∪ new_broken)`, preserving input order.
    pub fn filter_new(&self, candidates: &[String]) -> Vec<String> {
        let known: HashSet<&str> = self
            .scraped
            .iter()
            .chain(self.new_broken.iter())
            .map(String::as_str)
            .collect();

        candidates
            .iter()
            .filter(|c| !known.contains(c.as_str()))
            .cloned()
            .collect()
    }

    /// Records the results of the current run. Both lists are first
    /// filtered against what's already known.
    pub fn set_new(&mut self, scraped: Vec<String>, broken: Vec<String>) {
        self.new_scraped = self.filter_new(&scraped);
        self.new_broken = self.filter_new(&broken);
    }

    /// If either new set is non-empty (or `force`), merges the sorted
    /// union with the persisted set and rewrites both files. On I/O
    /// failure, logs each new link at `info` so the run stays
    /// recoverable.
    pub async fn write(&mut self, force: bool) {
        if self.new_scraped.is_empty() && self.new_broken.is_empty() && !force {
            info!("no new links, nothing to write");
            return;
        }

        let mut merged_scraped: Vec<String> = self
            .scraped
            .iter()
            .chain(self.new_scraped.iter())
            .cloned()
            .collect();
        merged_scraped.sort();
        merged_scraped.dedup();

        let mut merged_broken: Vec<String> = self
            .broken
            .iter()
            .chain(self.new_broken.iter())
            .cloned()
            .collect();
        merged_broken.sort();
        merged_broken.dedup();

        if !self.new_scraped.is_empty() || force {
            if let Err(e) = self
                .store
                .write_json(OUTPUT_SCRAPED_LINKS_FILENAME, &merged_scraped, true)
                .await
            {
                error!(error = %e, "cannot write scraped links, falling back to console");
                for link in &self.new_scraped {
                    info!(link, "FALLBACK new link scraped");
                }
            }
        }

        if !self.new_broken.is_empty() || force {
            if let Err(e) = self
                .store
                .write_json(OUTPUT_BROKEN_LINKS_FILENAME, &merged_broken, true)
                .await
            {
                error!(error = %e, "cannot write broken links, falling back to console");
                for link in &self.new_broken {
                    info!(link, "FALLBACK new link broken");
                }
            }
        }

        self.scraped = merged_scraped;
        self.broken = merged_broken;
        self.new_scraped.clear();
        self.new_broken.clear();
    }
}

/// Preserves order-of-first-appearance; every element of `a ∪ b` appears
/// exactly once.
pub fn merge_unique(a: &[String], b: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(a.len() + b.len());
    for item in a.iter().chain(b.iter()) {
        if seen.insert(item.clone()) {
            out.push(item.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_merge_unique_preserves_first_appearance_order() {
        let a = s(&["a", "b", "c"]);
        let b = s(&["c", "d", "a"]);
        assert_eq!(merge_unique(&a, &b), s(&["a", "b", "c", "d"]));
    }

    #[tokio::test]
    async fn test_filter_new_and_set_new_and_write() {
        let dir = tempdir();
        let mut store = LinkStore::open(&dir).await.unwrap();
        store.scraped = s(&["A", "B"]);

        let filtered = store.filter_new(&s(&["B", "C", "D", "C"]));
        assert_eq!(filtered, s(&["C", "D"]));

        store.set_new(s(&["C"]), s(&["D"]));
        store.write(false).await;

        let scraped: Vec<String> = store
            .store
            .read_json(OUTPUT_SCRAPED_LINKS_FILENAME)
            .await
            .unwrap();
        assert_eq!(scraped, s(&["A", "B", "C"]));

        let broken: Vec<String> = store
            .store
            .read_json(OUTPUT_BROKEN_LINKS_FILENAME)
            .await
            .unwrap();
        assert_eq!(broken, s(&["D"]));
    }

    fn tempdir() -> std::path::PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!(
            "rankings-core-links-test-{}-{}",
            std::process::id(),
            unique()
        ));
        p
    }

    fn unique() -> u64 {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        COUNTER.fetch_add(1, Ordering::Relaxed)
    }
}
