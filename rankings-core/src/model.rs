//! The uniform domain model rankings get parsed into: schools, phases,
//! students, courses, and the roll-up projections built on top of them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One of the four schools whose admission rankings are published on the
/// same portal.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum School {
    #[serde(rename = "ARC")]
    Architecture,
    #[serde(rename = "DES")]
    Design,
    #[serde(rename = "IND")]
    Engineering,
    #[serde(rename = "URB")]
    Urbanistica,
}

/// Language a ranking's index page was published in.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "IT")]
    Italian,
    #[serde(rename = "EN")]
    English,
    Other,
}

impl Language {
    /// Sort priority used by [`crate::phase::cmp_phases`]: IT < EN < Other.
    pub fn priority(self) -> u8 {
        match self {
            Language::Italian => 1,
            Language::English => 2,
            Language::Other => 3,
        }
    }
}

/// The administrative round within an admission cycle.
///
/// Exactly one of `primary`/`secondary` is normally nonzero, except for
/// method-2 parses where both legitimately carry a value (e.g. "third
/// ranking of second phase"). `raw` is kept verbatim for auditability,
/// `stripped` is `raw` with school/extra-EU prefixes and casing removed.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    pub raw: String,
    pub stripped: String,
    pub primary: u8,
    pub secondary: u8,
    pub language: Language,
    #[serde(rename = "isExtraEu")]
    pub is_extra_eu: bool,
}

/// Status of one course awarded to a student within a ranking.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct CourseStatus {
    pub title: String,
    pub location: String,
    pub position: u16,
    #[serde(rename = "canEnroll")]
    pub can_enroll: bool,
}

/// A single student's row, reconciled across the merit and course table
/// families by [`crate::hash::hash_with_salt`] of their matricola.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudentRow {
    /// Salted hash of the matricola, or empty if the source row carried
    /// none (legal on some years/schools — see [`crate::error::IngestError::DataQuality`]).
    pub id: String,
    #[serde(rename = "birthDate", skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    pub position: u16,
    #[serde(rename = "canEnroll")]
    pub can_enroll: bool,
    pub courses: Vec<CourseStatus>,
    pub result: f32,
    #[serde(rename = "englishResult", skip_serializing_if = "Option::is_none")]
    pub english_result: Option<u8>,
    #[serde(rename = "sectionsResults")]
    pub sections_results: HashMap<String, f32>,
    pub ofa: HashMap<String, bool>,
}

/// One published admission result snapshot for one school, phase,
/// language.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ranking {
    pub id: String,
    pub school: School,
    pub year: u16,
    pub phase: Phase,
    /// courseTitle -> ordered sequence of locations the course is offered
    /// at within this ranking.
    pub courses: HashMap<String, Vec<String>>,
    pub rows: Vec<StudentRow>,

    /// Join scratch space used only while C8/C9 run; not serialized and
    /// dropped once parsing completes.
    #[serde(skip)]
    pub rows_by_id: HashMap<String, StudentRow>,
}

impl Ranking {
    pub fn new(id: String, school: School, year: u16, phase: Phase) -> Self {
        Self {
            id,
            school,
            year,
            phase,
            courses: HashMap::new(),
            rows: Vec::new(),
            rows_by_id: HashMap::new(),
        }
    }
}

/// Projection of a [`Ranking`] used by the roll-up indexer (C10) and the
/// id-hash index (C11).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    pub school: School,
    pub year: u16,
    pub phase: Phase,
}

impl From<&Ranking> for IndexEntry {
    fn from(r: &Ranking) -> Self {
        Self {
            id: r.id.clone(),
            school: r.school,
            year: r.year,
            phase: r.phase.clone(),
        }
    }
}

/// Academic course catalog entry. External to the core pipeline — only
/// ever consumed, never produced, by this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifesto {
    #[serde(rename = "courseName")]
    pub course_name: String,
    pub location: String,
    #[serde(rename = "degreeType")]
    pub degree_type: String,
    pub url: String,
}
