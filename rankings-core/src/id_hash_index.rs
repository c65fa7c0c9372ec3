//! ID-Hash Index (C11): inverted index from a student's salted-hash id to
//! every ranking they appear in, so a student can find their own rankings
//! without re-running the whole pipeline.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::constants::OUTPUT_ID_HASH_INDEX_FILENAME;
use crate::error::Result;
use crate::model::Ranking;
use crate::writer::FsStore;

#[derive(Default)]
pub struct IdHashIndex {
    index: Mutex<HashMap<String, Vec<String>>>,
}

impl IdHashIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records every id in `ranking.rows_by_id` as appearing in `ranking.id`,
    /// with this ranking prepended ahead of any ranking already indexed for
    /// that id.
    pub fn add(&self, ranking: &Ranking) {
        let mut guard = self.index.lock().expect("id hash index mutex poisoned");
        for id in ranking.rows_by_id.keys() {
            let entry = guard.entry(id.clone()).or_default();
            entry.insert(0, ranking.id.clone());
        }
    }

    pub async fn write(&self, store: &FsStore) -> Result<()> {
        let index = self.index.lock().expect("id hash index mutex poisoned");
        store.write_json(OUTPUT_ID_HASH_INDEX_FILENAME, &*index, true).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Language, Phase, School, StudentRow};

    fn ranking_with_ids(id: &str, student_ids: &[&str]) -> Ranking {
        let mut ranking = Ranking::new(
            id.to_string(),
            School::Engineering,
            2024,
            Phase {
                raw: String::new(),
                stripped: String::new(),
                primary: 1,
                secondary: 0,
                language: Language::Italian,
                is_extra_eu: false,
            },
        );
        for sid in student_ids {
            ranking.rows_by_id.insert(sid.to_string(), StudentRow::default());
        }
        ranking
    }

    #[test]
    fn test_add_indexes_every_row_id_to_its_ranking() {
        let idx = IdHashIndex::new();
        idx.add(&ranking_with_ids("r1", &["a", "b"]));

        let guard = idx.index.lock().unwrap();
        assert_eq!(guard.get("a"), Some(&vec!["r1".to_string()]));
        assert_eq!(guard.get("b"), Some(&vec!["r1".to_string()]));
    }

    #[test]
    fn test_add_prepends_newer_ranking_for_shared_id() {
        let idx = IdHashIndex::new();
        idx.add(&ranking_with_ids("r1", &["a"]));
        idx.add(&ranking_with_ids("r2", &["a"]));

        let guard = idx.index.lock().unwrap();
        assert_eq!(guard.get("a"), Some(&vec!["r2".to_string(), "r1".to_string()]));
    }
}
