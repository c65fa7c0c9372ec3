//! Merit Table Parser (C8): parses paginated merit tables into
//! [`StudentRow`]s keyed by salted-hash id.

use scraper::{Html, Selector};
use tracing::{error, warn};

use crate::download::HtmlPage;
use crate::error::{IngestError, Result};
use crate::hash::hash_with_salt;
use crate::model::{CourseStatus, Ranking, StudentRow};
use crate::table::{course_title_location, field_by_index, first_text_fragment};

const STATUS_NOT_ENROLLABLE: &str = "immatricolazione non consentita / enrolment is not possible";

struct ColumnIndexes {
    id: i32,
    result: i32,
    position: i32,
    status: i32,
    ofa_eng: i32,
    ofa_test: i32,
}

fn detect_columns(doc: &Html) -> ColumnIndexes {
    let th_selector = Selector::parse(".TableDati .elenco-campi th").expect("selector literal is valid");

    let mut cols = ColumnIndexes {
        id: -1,
        result: -1,
        position: -1,
        status: -1,
        ofa_eng: -1,
        ofa_test: -1,
    };

    for (i, th) in doc.select(&th_selector).enumerate() {
        let text = first_text_fragment(th).to_lowercase();
        let i = i as i32;
        if text.contains("matricola") {
            cols.id = i;
        } else if text.contains("voto") {
            cols.result = i;
        } else if text.contains("posizione") {
            cols.position = i;
        } else if text.contains("immatricolazione") || text.contains("stato") {
            cols.status = i;
        } else if text.contains("ofa inglese") {
            cols.ofa_eng = i;
        } else if text.contains("ofa test") {
            cols.ofa_test = i;
        }
    }

    cols
}

/// Parses every page of the merit-table family, concurrently, then
/// stable-sorts `ranking.rows` by ascending position and populates
/// `ranking.rows_by_id` for every row with a non-empty id.
pub async fn parse_merit_table(ranking: &mut Ranking, pages: &[HtmlPage]) -> Result<()> {
    let ranking_id = ranking.id.clone();
    let year = ranking.year;

    let mut set = tokio::task::JoinSet::new();
    for page in pages.iter().cloned() {
        let ranking_id = ranking_id.clone();
        set.spawn(async move { parse_merit_table_page(&page.content, year, &ranking_id) });
    }

    let mut rows = Vec::new();
    let mut errors = Vec::new();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(Ok(mut page_rows)) => rows.append(&mut page_rows),
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

    rows.sort_by_key(|r: &StudentRow| r.position);

    for row in &rows {
        if !row.id.is_empty() {
            ranking.rows_by_id.insert(row.id.clone(), row.clone());
        }
    }
    ranking.rows = rows;

    Ok(())
}

fn parse_merit_table_page(html: &[u8], year: u16, ranking_id: &str) -> Result<Vec<StudentRow>> {
    let doc = Html::parse_document(&String::from_utf8_lossy(html));
    let cols = detect_columns(&doc);

    let row_selector = Selector::parse(".TableDati-tbody tr").expect("selector literal is valid");
    let td_selector = Selector::parse("td").expect("selector literal is valid");

    let mut rows = Vec::new();

    for row in doc.select(&row_selector) {
        let items: Vec<String> = row.select(&td_selector).map(|td| td.text().collect::<String>()).collect();
        if items.is_empty() {
            error!(ranking_id, "empty merit table row, skipping");
            continue;
        }

        let mut student = StudentRow::default();

        if let Ok(pos) = field_by_index(&items, cols.position, "0", ranking_id).parse() {
            student.position = pos;
        }

        let raw_id = field_by_index(&items, cols.id, "", ranking_id);
        if raw_id.is_empty() && year > 2020 {
            warn!(ranking_id, position = student.position, "merit row without matricola id");
        }
        if !raw_id.is_empty() {
            student.id = hash_with_salt(&raw_id);
        }

        let result_str = field_by_index(&items, cols.result, "0", ranking_id).replace(',', ".");
        if let Ok(result) = result_str.parse() {
            student.result = result;
        }

        if cols.ofa_eng != -1 {
            student
                .ofa
                .insert("ENG".to_string(), field_by_index(&items, cols.ofa_eng, "No", ranking_id) != "No");
        }
        if cols.ofa_test != -1 {
            student
                .ofa
                .insert("TEST".to_string(), field_by_index(&items, cols.ofa_test, "No", ranking_id) != "No");
        }

        let status_text = field_by_index(&items, cols.status, "", ranking_id);
        if status_text.is_empty() {
            warn!(ranking_id, position = student.position, "merit row without status");
        } else {
            let lower = status_text.to_lowercase();
            student.can_enroll = !lower.contains(STATUS_NOT_ENROLLABLE);

            if student.id.is_empty() && student.can_enroll {
                let parts: Vec<&str> = status_text.split(" - ").collect();
                let course_text = if parts.len() == 2 { parts[1] } else { status_text.as_str() };
                let (title, location) = course_title_location(course_text);
                student.courses.push(CourseStatus {
                    title,
                    location,
                    position: 0,
                    can_enroll: true,
                });
            }
        }

        rows.push(student);
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::School;

    fn sample_html() -> &'static str {
        r#"<table class="TableDati">
            <tr class="elenco-campi">
                <th>Posizione</th><th>Matricola</th><th>Voto</th><th>Stato</th>
            </tr>
        </table>
        <table><tbody class="TableDati-tbody">
            <tr><td>1</td><td>123456</td><td>85,5</td><td>Immatricolazione non consentita / Enrolment is not possible</td></tr>
            <tr><td>2</td><td></td><td>70,0</td><td>Ingegneria Informatica (Milano)</td></tr>
        </tbody></table>"#
    }

    #[tokio::test]
    async fn test_parse_merit_table_builds_rows_and_index() {
        let mut ranking = Ranking::new(
            "2024_20103_html".to_string(),
            School::Engineering,
            2024,
            crate::model::Phase {
                raw: String::new(),
                stripped: String::new(),
                primary: 1,
                secondary: 0,
                language: crate::model::Language::Italian,
                is_extra_eu: false,
            },
        );

        let pages = vec![HtmlPage {
            id: "p1".to_string(),
            content: sample_html().as_bytes().to_vec(),
        }];

        parse_merit_table(&mut ranking, &pages).await.unwrap();

        assert_eq!(ranking.rows.len(), 2);
        assert_eq!(ranking.rows[0].position, 1);
        assert!(!ranking.rows[0].can_enroll);
        assert!(!ranking.rows[0].id.is_empty());
        assert_eq!(ranking.rows_by_id.len(), 1);

        assert!(ranking.rows[1].id.is_empty());
        assert!(ranking.rows[1].can_enroll);
        assert_eq!(ranking.rows[1].courses.len(), 1);
        assert_eq!(ranking.rows[1].courses[0].title, "Ingegneria Informatica");
        assert_eq!(ranking.rows[1].courses[0].location, "Milano");
    }
}
