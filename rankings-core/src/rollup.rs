//! Roll-up Indexer (C10): builds the two cross-ranking indexes served
//! alongside the per-ranking JSON, grouped by school-then-year and by
//! year-then-school.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::constants::{OUTPUT_INDEX_BY_SCHOOL_YEAR_FILENAME, OUTPUT_INDEX_BY_YEAR_SCHOOL_FILENAME};
use crate::error::Result;
use crate::model::{IndexEntry, School};
use crate::phase::cmp_phases;
use crate::writer::FsStore;

pub type BySchoolYear = HashMap<School, HashMap<u16, Vec<IndexEntry>>>;
pub type ByYearSchool = HashMap<u16, HashMap<School, Vec<IndexEntry>>>;

/// Accepts [`IndexEntry`] records from concurrently-running ranking
/// parses (behind an internal mutex, mirroring [`crate::id_hash_index::IdHashIndex`])
/// and builds the two roll-up projections once every parse has reported in.
#[derive(Default)]
pub struct IndexGenerator {
    entries: Mutex<Vec<IndexEntry>>,
}

impl IndexGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, entry: IndexEntry) {
        self.entries
            .lock()
            .expect("index generator mutex poisoned")
            .push(entry);
    }

    fn by_school_year(&self, entries: &[IndexEntry]) -> BySchoolYear {
        let mut index: BySchoolYear = HashMap::new();
        for entry in entries {
            index
                .entry(entry.school)
                .or_default()
                .entry(entry.year)
                .or_default()
                .push(entry.clone());
        }
        for school_map in index.values_mut() {
            for entries in school_map.values_mut() {
                entries.sort_by(|a, b| cmp_phases(&a.phase, &b.phase));
            }
        }
        index
    }

    fn by_year_school(&self, entries: &[IndexEntry]) -> ByYearSchool {
        let mut index: ByYearSchool = HashMap::new();
        for entry in entries {
            index
                .entry(entry.year)
                .or_default()
                .entry(entry.school)
                .or_default()
                .push(entry.clone());
        }
        for year_map in index.values_mut() {
            for entries in year_map.values_mut() {
                entries.sort_by(|a, b| cmp_phases(&a.phase, &b.phase));
            }
        }
        index
    }

    /// Builds both indexes and writes them under `store`'s root. Both
    /// files must be written successfully, or this reports failure.
    pub async fn generate(&self, store: &FsStore) -> Result<()> {
        let entries = self.entries.lock().expect("index generator mutex poisoned").clone();
        let by_school_year = self.by_school_year(&entries);
        let by_year_school = self.by_year_school(&entries);

        store
            .write_json(OUTPUT_INDEX_BY_SCHOOL_YEAR_FILENAME, &by_school_year, true)
            .await?;
        store
            .write_json(OUTPUT_INDEX_BY_YEAR_SCHOOL_FILENAME, &by_year_school, true)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Language, Phase};

    fn entry(id: &str, school: School, year: u16, primary: u8) -> IndexEntry {
        IndexEntry {
            id: id.to_string(),
            school,
            year,
            phase: Phase {
                raw: String::new(),
                stripped: String::new(),
                primary,
                secondary: 0,
                language: Language::Italian,
                is_extra_eu: false,
            },
        }
    }

    #[test]
    fn test_by_school_year_groups_and_sorts() {
        let gen = IndexGenerator::new();
        gen.add(entry("b", School::Engineering, 2024, 2));
        gen.add(entry("a", School::Engineering, 2024, 1));

        let entries = gen.entries.lock().unwrap().clone();
        let index = gen.by_school_year(&entries);
        let rows = &index[&School::Engineering][&2024];
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "a");
        assert_eq!(rows[1].id, "b");
    }

    #[test]
    fn test_by_year_school_groups_by_year_then_school() {
        let gen = IndexGenerator::new();
        gen.add(entry("a", School::Engineering, 2024, 1));
        gen.add(entry("b", School::Architecture, 2024, 1));

        let entries = gen.entries.lock().unwrap().clone();
        let index = gen.by_year_school(&entries);
        assert_eq!(index[&2024].len(), 2);
        assert!(index[&2024].contains_key(&School::Architecture));
    }
}
