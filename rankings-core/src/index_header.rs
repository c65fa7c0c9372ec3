//! Index Header Parser (C6): reads year, school, language, phase-raw, and
//! the extra-EU flag off a ranking's `index.html`.

use scraper::{ElementRef, Html, Selector};

use crate::error::{IngestError, Result};
use crate::model::{Language, School};
use crate::phase::parse_phase;
use crate::table::first_text_fragment;

/// Everything C6 extracts before handing the phase string to C7.
pub struct IndexHeader {
    pub year: u16,
    pub school: School,
    pub language: Language,
    pub is_extra_eu: bool,
    pub phase_raw: String,
}

/// Parses the five `.CenterBar .intestazione` headings of `index_html`.
pub fn parse_index_header(index_html: &Html) -> Result<IndexHeader> {
    let selector = Selector::parse(".CenterBar .intestazione").expect("selector literal is valid");
    let headings: Vec<ElementRef> = index_html.select(&selector).collect();

    let year = heading_text(&headings, 1)?;
    let year = parse_year(&year)?;

    let school_lang = heading_text(&headings, 2)?;
    let lower = school_lang.to_lowercase();
    let school = parse_school(&lower)?;
    let language = if lower.contains("inglese") {
        Language::English
    } else {
        Language::Italian
    };

    let phase_raw = heading_text(&headings, 3)?;

    let extra_eu_text = heading_text(&headings, 4).unwrap_or_default();
    let is_extra_eu = extra_eu_text.to_lowercase().contains("extra-ue");

    Ok(IndexHeader {
        year,
        school,
        language,
        is_extra_eu,
        phase_raw,
    })
}

/// Convenience wrapper: parses the header, then dispatches the phase string
/// to C7.
pub fn parse_header_and_phase(index_html: &Html) -> Result<(IndexHeader, crate::model::Phase)> {
    let header = parse_index_header(index_html)?;
    let mut phase = parse_phase(&header.phase_raw, header.school, header.year, header.is_extra_eu)?;
    phase.language = header.language;
    Ok((header, phase))
}

fn heading_text(headings: &[ElementRef], index: usize) -> Result<String> {
    let heading = headings.get(index).ok_or_else(|| {
        IngestError::Parse(format!("index header is missing heading {index}"))
    })?;
    Ok(first_text_fragment(*heading))
}

fn parse_year(heading_text: &str) -> Result<u16> {
    let last_token = heading_text
        .split_whitespace()
        .last()
        .ok_or_else(|| IngestError::Parse(format!("empty year heading: '{heading_text}'")))?;
    let year_str = last_token.split('/').next().unwrap_or(last_token);
    year_str
        .parse()
        .map_err(|_| IngestError::Parse(format!("could not parse year. raw: '{heading_text}'")))
}

/// Substring match rather than equality: some `index.html` carry a
/// non-UTF-8 mojibake rendering of "città" in the urbanistica heading.
fn parse_school(lower: &str) -> Result<School> {
    if lower.contains("urbanistica") {
        Ok(School::Urbanistica)
    } else if lower.contains("design") {
        Ok(School::Design)
    } else if lower.contains("architettura") {
        Ok(School::Architecture)
    } else if lower.contains("ingegneria") {
        Ok(School::Engineering)
    } else {
        Err(IngestError::Parse(format!(
            "could not parse school. school string: '{lower}'"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> Html {
        Html::parse_document(
            r#"<html><body>
                <div class="CenterBar">
                    <div class="intestazione">Politecnico di Milano</div>
                    <div class="intestazione">Graduatoria 2024/2025</div>
                    <div class="intestazione">Ingegneria Industriale e dell'Informazione</div>
                    <div class="intestazione">Seconda Graduatoria di Prima Fase</div>
                    <div class="intestazione">Graduatoria Extra-ue</div>
                </div>
            </body></html>"#,
        )
    }

    #[test]
    fn test_parse_index_header_happy_path() {
        let header = parse_index_header(&fixture()).unwrap();
        assert_eq!(header.year, 2024);
        assert!(matches!(header.school, School::Engineering));
        assert!(matches!(header.language, Language::Italian));
        assert!(header.is_extra_eu);
        assert_eq!(header.phase_raw, "Seconda Graduatoria di Prima Fase");
    }

    #[test]
    fn test_parse_school_urbanistica_is_substring_match() {
        assert!(matches!(
            parse_school("urbanistica: citt\u{fffd} ambiente paesaggio").unwrap(),
            School::Urbanistica
        ));
    }

    #[test]
    fn test_parse_year_takes_last_token_before_slash() {
        assert_eq!(parse_year("Graduatoria 2024/2025").unwrap(), 2024);
    }
}
