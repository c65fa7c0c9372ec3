//! Course Table Parser (C9): parses paginated course tables and joins them
//! onto merit rows by salted-hash id.
//!
//! Must run after [`crate::merit_table::parse_merit_table`] — it consumes
//! `ranking.rows`/`ranking.rows_by_id`.

use std::sync::Mutex;

use scraper::{Html, Selector};
use tracing::warn;

use crate::download::HtmlPage;
use crate::error::{IngestError, Result};
use crate::hash::hash_with_salt;
use crate::model::{CourseStatus, Ranking};
use crate::table::{course_title_location, field_by_index, first_text_fragment};

const MARCO_POLO_SUFFIX: &str = "(Contingente Marco Polo)";

struct ColumnIndexes {
    id: i32,
    position: i32,
    birth: i32,
    can_enroll: i32,
    eng_result: i32,
    first_section: i32,
    ofa_eng: i32,
    ofa_test: i32,
    sections: Vec<String>,
}

fn detect_columns(doc: &Html) -> ColumnIndexes {
    let section_header_selector =
        Selector::parse(".TableDati tr:not(.elenco-campi) th").expect("selector literal is valid");
    let sections: Vec<String> = doc
        .select(&section_header_selector)
        .map(first_text_fragment)
        .collect();

    let th_selector = Selector::parse(".TableDati .elenco-campi th").expect("selector literal is valid");

    let mut cols = ColumnIndexes {
        id: -1,
        position: -1,
        birth: -1,
        can_enroll: -1,
        eng_result: -1,
        first_section: -1,
        ofa_eng: -1,
        ofa_test: -1,
        sections: sections.clone(),
    };

    for (i, th) in doc.select(&th_selector).enumerate() {
        let text = first_text_fragment(th).to_lowercase();
        let i = i as i32;

        if text.contains("sezioni") {
            cols.first_section = i;
            continue;
        }

        // columns after the section run are shifted by (sections - 1),
        // since the single "sezioni" header stands in for all of them.
        let idx = if cols.first_section != -1 && i > cols.first_section {
            i + sections.len() as i32 - 1
        } else {
            i
        };

        if text.contains("posizione") {
            cols.position = idx;
        } else if text.contains("matricola") {
            cols.id = idx;
        } else if text.contains("nascita") {
            cols.birth = idx;
        } else if text.contains("consentita") {
            cols.can_enroll = idx;
        } else if text.contains("risposte esatte inglese") {
            cols.eng_result = idx;
        } else if text.contains("ofa inglese") {
            cols.ofa_eng = idx;
        } else if text.contains("ofa test") {
            cols.ofa_test = idx;
        }
    }

    cols
}

/// Parses every course-table page, joining each row onto `ranking.rows_by_id`
/// under `rows_mutex`, then replaces `ranking.rows` with the joined values
/// sorted by position and stable-sorts each row's courses by (title, location).
pub async fn parse_all_course_tables(ranking: &mut Ranking, pages: &[HtmlPage]) -> Result<()> {
    if ranking.rows.is_empty() {
        return Err(IngestError::Parse(
            "this ranking does not have merit table rows, so the course table is not parsed".to_string(),
        ));
    }
    if pages.is_empty() {
        return Err(IngestError::Parse(
            "no course table pages passed to the course table parser".to_string(),
        ));
    }
    if ranking.rows[0].id.is_empty() {
        warn!(
            ranking_id = ranking.id,
            "this ranking does not have matricola ids, so the course table is useless"
        );
        return Ok(());
    }

    let ranking_id = ranking.id.clone();
    let year = ranking.year;
    let rows_by_id = Mutex::new(std::mem::take(&mut ranking.rows_by_id));
    let courses = Mutex::new(std::mem::take(&mut ranking.courses));

    let mut set = tokio::task::JoinSet::new();
    for page in pages.iter().cloned() {
        let ranking_id = ranking_id.clone();
        set.spawn(async move { parse_course_table_page(&page.content, year, &ranking_id) });
    }

    let mut errors = Vec::new();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(Ok(parsed)) => {
                {
                    let mut courses_guard = courses.lock().expect("courses mutex poisoned");
                    let locations = courses_guard.entry(parsed.course_title.clone()).or_default();
                    if !locations.contains(&parsed.course_location) {
                        locations.push(parsed.course_location.clone());
                    }
                }

                let mut guard = rows_by_id.lock().expect("rows_by_id mutex poisoned");
                for update in parsed.updates {
                    apply_update(&mut guard, update);
                }
            }
            Ok(Err(e)) => errors.push(e.to_string()),
            Err(e) => errors.push(e.to_string()),
        }
    }

    if !errors.is_empty() {
        return Err(IngestError::Parse(format!(
            "error(s) during ranking table parsing:\n{}",
            errors.join("\n")
        )));
    }

    ranking.rows_by_id = rows_by_id.into_inner().expect("mutex poisoned");
    ranking.courses = courses.into_inner().expect("mutex poisoned");

    let mut rows: Vec<_> = ranking.rows_by_id.values().cloned().collect();
    rows.sort_by_key(|r| r.position);
    for row in &mut rows {
        row.courses.sort_by(|a, b| (&a.title, &a.location).cmp(&(&b.title, &b.location)));
    }
    ranking.rows = rows;

    Ok(())
}

struct RowUpdate {
    id: String,
    birth_date: Option<String>,
    english_result: Option<u8>,
    ofa: Vec<(String, bool)>,
    sections_results: Option<std::collections::HashMap<String, f32>>,
    course: CourseStatus,
}

struct ParsedCoursePage {
    course_title: String,
    course_location: String,
    updates: Vec<RowUpdate>,
}

fn apply_update(rows_by_id: &mut std::collections::HashMap<String, crate::model::StudentRow>, update: RowUpdate) {
    let row = rows_by_id.entry(update.id).or_default();
    row.birth_date = update.birth_date;
    if update.english_result.is_some() {
        row.english_result = update.english_result;
    }
    for (key, value) in update.ofa {
        row.ofa.entry(key).or_insert(value);
    }
    if row.sections_results.is_empty() {
        if let Some(sections) = update.sections_results {
            row.sections_results = sections;
        }
    }
    row.courses.push(update.course);
}

fn parse_course_table_page(html: &[u8], year: u16, ranking_id: &str) -> Result<ParsedCoursePage> {
    let doc = Html::parse_document(&String::from_utf8_lossy(html));

    let title_selector = Selector::parse(".CenterBar .titolo").expect("selector literal is valid");
    let title_text = doc
        .select(&title_selector)
        .next()
        .map(|el| el.text().collect::<String>())
        .unwrap_or_default();
    let (course_title, course_location) = course_title_location(&title_text);

    let cols = detect_columns(&doc);

    let row_selector = Selector::parse(".TableDati-tbody tr").expect("selector literal is valid");
    let td_selector = Selector::parse("td").expect("selector literal is valid");

    let mut updates = Vec::new();

    for row in doc.select(&row_selector) {
        let items: Vec<String> = row.select(&td_selector).map(|td| td.text().collect::<String>()).collect();

        if items.len() == 1 && items[0].contains("Nessun candidato") {
            continue;
        }
        if items.is_empty() {
            warn!(ranking_id, "course table row has no cells");
            continue;
        }

        let position: u16 = field_by_index(&items, cols.position, "0", ranking_id)
            .parse()
            .unwrap_or(0);

        let raw_id = field_by_index(&items, cols.id, "", ranking_id);
        let trimmed_id = raw_id.replace(MARCO_POLO_SUFFIX, "").trim().to_string();
        if trimmed_id.is_empty() && year > 2020 {
            warn!(ranking_id, position, "course table row without matricola id");
        }
        let id = if trimmed_id.is_empty() {
            String::new()
        } else {
            hash_with_salt(&trimmed_id)
        };

        let birth_date = {
            let v = field_by_index(&items, cols.birth, "", ranking_id);
            (!v.is_empty()).then_some(v)
        };

        let english_result = if cols.eng_result != -1 {
            field_by_index(&items, cols.eng_result, "-1", ranking_id).parse().ok()
        } else {
            None
        };

        let mut ofa = Vec::new();
        if cols.ofa_eng != -1 {
            ofa.push((
                "ENG".to_string(),
                field_by_index(&items, cols.ofa_eng, "No", ranking_id) != "No",
            ));
        }
        if cols.ofa_test != -1 {
            ofa.push((
                "TEST".to_string(),
                field_by_index(&items, cols.ofa_test, "No", ranking_id) != "No",
            ));
        }

        let can_enroll = if cols.can_enroll != -1 {
            field_by_index(&items, cols.can_enroll, "No", ranking_id) != "No"
        } else {
            false
        };

        let sections_results = (cols.first_section != -1).then(|| {
            cols.sections
                .iter()
                .enumerate()
                .filter_map(|(i, section)| {
                    let idx = cols.first_section + i as i32;
                    let text = field_by_index(&items, idx, "-1", ranking_id).replace(',', ".");
                    text.parse().ok().map(|v| (section.clone(), v))
                })
                .collect()
        });

        updates.push(RowUpdate {
            id,
            birth_date,
            english_result,
            ofa,
            sections_results,
            course: CourseStatus {
                title: course_title.clone(),
                location: course_location.clone(),
                position,
                can_enroll,
            },
        });
    }

    Ok(ParsedCoursePage {
        course_title,
        course_location,
        updates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Language, Phase, School, StudentRow};

    fn base_ranking() -> Ranking {
        let mut ranking = Ranking::new(
            "2024_20103_html".to_string(),
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
        let hashed = hash_with_salt("123456");
        ranking.rows.push(StudentRow {
            id: hashed.clone(),
            position: 1,
            can_enroll: true,
            ..Default::default()
        });
        ranking.rows_by_id.insert(
            hashed,
            StudentRow {
                id: hash_with_salt("123456"),
                position: 1,
                can_enroll: true,
                ..Default::default()
            },
        );
        ranking
    }

    fn course_page_html() -> String {
        format!(
            r#"<div class="CenterBar"><div class="titolo">Ingegneria Informatica (Milano)</div></div>
            <table class="TableDati">
                <tr class="elenco-campi"><th>Posizione</th><th>Matricola</th><th>Consentita</th></tr>
            </table>
            <table><tbody class="TableDati-tbody">
                <tr><td>1</td><td>123456</td><td>Si</td></tr>
            </tbody></table>"#
        )
    }

    #[tokio::test]
    async fn test_skips_when_no_id_on_rows() {
        let mut ranking = base_ranking();
        ranking.rows[0].id = String::new();
        ranking.rows_by_id.clear();

        let pages = vec![HtmlPage {
            id: "p".to_string(),
            content: course_page_html().into_bytes(),
        }];

        parse_all_course_tables(&mut ranking, &pages).await.unwrap();
        assert!(ranking.rows_by_id.is_empty());
    }

    #[tokio::test]
    async fn test_errors_when_no_merit_rows() {
        let mut ranking = base_ranking();
        ranking.rows.clear();
        let pages = vec![HtmlPage {
            id: "p".to_string(),
            content: course_page_html().into_bytes(),
        }];
        assert!(parse_all_course_tables(&mut ranking, &pages).await.is_err());
    }

    #[tokio::test]
    async fn test_joins_course_onto_merit_row() {
        let mut ranking = base_ranking();
        let pages = vec![HtmlPage {
            id: "p".to_string(),
            content: course_page_html().into_bytes(),
        }];

        parse_all_course_tables(&mut ranking, &pages).await.unwrap();

        assert_eq!(ranking.rows.len(), 1);
        assert_eq!(ranking.rows[0].courses.len(), 1);
        assert_eq!(ranking.rows[0].courses[0].title, "Ingegneria Informatica");
        assert!(ranking.rows[0].courses[0].can_enroll);
        assert!(ranking.courses.contains_key("Ingegneria Informatica"));
    }
}
