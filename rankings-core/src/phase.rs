//! Phase parsing (C7): turns a free-form phase string into a structured
//! [`Phase`], dispatching on (school, year) to one of three historical
//! dialects. Methods 1 and 3 look similar on the surface but their
//! vocabularies and secondary-number semantics differ, so they are kept
//! separate rather than unified.

use std::cmp::Ordering;

use crate::error::{IngestError, Result};
use crate::model::{Language, Phase, School};

const SCHOOL_PREFIXES: &[(&str, School)] = &[
    ("architettura - ", School::Architecture),
    ("urbanistica - ", School::Urbanistica),
    ("design - ", School::Design),
    ("ingegneria - ", School::Engineering),
];

const EXTRA_EU_PREFIX: &str = "extra-ue - ";

fn ordinal(word: &str) -> u8 {
    match word.to_lowercase().as_str() {
        "prima" | "primo" => 1,
        "secondo" | "seconda" => 2,
        "terzo" | "terza" => 3,
        "quarto" | "quarta" => 4,
        "quinto" | "quinta" => 5,
        "sesto" | "sesta" => 6,
        "settimo" | "settima" => 7,
        "ottavo" | "ottava" => 8,
        "nono" | "nona" => 9,
        "decimo" | "decima" => 10,
        _ => 0,
    }
}

fn strip_school_prefix(raw: &str) -> &str {
    for (prefix, _) in SCHOOL_PREFIXES {
        if let Some(rest) = strip_prefix_ci(raw, prefix) {
            return rest;
        }
    }
    raw
}

/// Strips a school-name prefix from `raw`, lowercasing what's left.
/// Method 1's own escape-case matching needs to see a leading
/// `"Extra-ue - "` intact, so this does not strip it — unlike
/// [`strip_prefixes_with_extra_eu`].
fn strip_prefixes_method1(raw: &str) -> String {
    strip_school_prefix(raw).to_lowercase()
}

/// Strips a school-name prefix then a leading extra-EU prefix from `raw`,
/// returning the stripped, lowercased text. Distinct from an inline
/// `"Extra-ue [...]"` occurrence, which methods 2/3 detect by substring
/// instead. Used by methods 2 and 3, whose escape cases operate on the
/// prefix-stripped form.
fn strip_prefixes_with_extra_eu(raw: &str) -> String {
    let school_stripped = strip_school_prefix(raw);
    let s = strip_prefix_ci(school_stripped, EXTRA_EU_PREFIX).unwrap_or(school_stripped);
    s.to_lowercase()
}

fn strip_prefix_ci<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    if s.len() >= prefix.len() && s[..prefix.len()].eq_ignore_ascii_case(prefix) {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}

/// True for the (school, year) combinations dispatched to method 1 (§4.7):
/// ARC always, DES from 2024 onward.
fn is_method1(school: School, year: u16) -> bool {
    matches!(school, School::Architecture) || (matches!(school, School::Design) && year >= 2024)
}

/// Parses `raw` into a [`Phase`] for `school`/`year`. `extra_eu_hint` is
/// the extra-EU flag already read off the index header (§4.6 heading 4);
/// it seeds `is_extra_eu` before method-specific parsing, which may
/// additionally set it itself (method 1's legacy escapes, method 3).
pub fn parse_phase(raw: &str, school: School, year: u16, extra_eu_hint: bool) -> Result<Phase> {
    let stripped = if is_method1(school, year) {
        strip_prefixes_method1(raw)
    } else {
        strip_prefixes_with_extra_eu(raw)
    };

    let mut phase = Phase {
        raw: raw.to_string(),
        stripped: stripped.clone(),
        primary: 0,
        secondary: 0,
        language: Language::Italian,
        is_extra_eu: extra_eu_hint,
    };

    match (school, year) {
        (School::Architecture, _) => parse_method1(&stripped, &mut phase)?,
        (School::Design, y) if y >= 2024 => parse_method1(&stripped, &mut phase)?,
        (School::Design, _) => parse_method3(&stripped, &mut phase)?,
        (School::Engineering, _) => parse_method2(&stripped, school, &mut phase)?,
        (School::Urbanistica, y) if y >= 2024 => parse_method2(&stripped, school, &mut phase)?,
        (School::Urbanistica, _) => parse_method3(&stripped, &mut phase)?,
    }

    Ok(phase)
}

fn parse_method1(stripped: &str, phase: &mut Phase) -> Result<()> {
    // two legacy escape cases, checked against the raw (unstripped-of-case)
    // lowercase string before falling through to the generic split.
    if stripped == "extra-ue" {
        phase.is_extra_eu = true;
        phase.primary = 0;
        phase.secondary = 1;
        return Ok(());
    }
    if stripped == "extra-ue - seconda graduatoria" {
        phase.is_extra_eu = true;
        phase.primary = 0;
        phase.secondary = 2;
        return Ok(());
    }

    let tokens: Vec<&str> = stripped.split(' ').collect();
    if tokens.len() != 2 {
        return Err(IngestError::Parse(format!(
            "invalid raw phase string, splitted by spaces array length is not 2. raw: '{stripped}' (method 1)"
        )));
    }

    let num = ordinal(tokens[0]);
    if num == 0 {
        return Err(IngestError::Parse(format!(
            "could not parse phase number. raw: '{stripped}' (method 1)"
        )));
    }

    match tokens[1] {
        "fase" => {
            phase.primary = num;
            phase.secondary = 0;
        }
        _ => {
            phase.primary = 0;
            phase.secondary = num;
        }
    }

    Ok(())
}

fn parse_method2(stripped: &str, school: School, phase: &mut Phase) -> Result<()> {
    if phase.is_extra_eu {
        match school {
            School::Urbanistica => {
                if stripped.contains("anticipat") {
                    phase.secondary = 1;
                } else if stripped.contains("standard") {
                    phase.secondary = 2;
                } else if stripped.contains("ripescaggio") {
                    phase.secondary = 3;
                } else {
                    return Err(IngestError::Parse(format!(
                        "could not parse extra-EU urbanistica phase. raw: '{stripped}' (method 2)"
                    )));
                }
                phase.primary = 0;
                return Ok(());
            }
            School::Engineering => {
                if stripped == "extra-ue" {
                    phase.primary = 0;
                    phase.secondary = 1;
                    return Ok(());
                }
                if stripped == "extra-ue - seconda graduatoria" {
                    phase.primary = 0;
                    phase.secondary = 2;
                    return Ok(());
                }
                if stripped == "extra-ue - terza graduatoria" {
                    phase.primary = 0;
                    phase.secondary = 3;
                    return Ok(());
                }
                // fall through to the non-extra-EU clause below with the
                // "extra-ue" prefix stripped.
                let rest = strip_prefix_ci(stripped, "extra-ue ").unwrap_or(stripped);
                return parse_method2_non_extra_eu(rest, phase);
            }
            School::Architecture | School::Design => {
                return Err(IngestError::Parse(format!(
                    "method 2 extra-EU is not defined for this school. raw: '{stripped}'"
                )));
            }
        }
    }

    parse_method2_non_extra_eu(stripped, phase)
}

fn parse_method2_non_extra_eu(stripped: &str, phase: &mut Phase) -> Result<()> {
    let tokens: Vec<&str> = stripped.split(' ').collect();

    if tokens.len() == 5 {
        // "<ord1> graduatoria di <ord2> fase"
        let secondary = ordinal(tokens[0]);
        let primary = ordinal(tokens[3]);
        if primary == 0 || secondary == 0 {
            return Err(IngestError::Parse(format!(
                "could not parse phase number. raw: '{stripped}' (method 2)"
            )));
        }
        phase.primary = primary;
        phase.secondary = secondary;
        return Ok(());
    }

    if tokens.len() == 2 {
        return parse_method1(stripped, phase);
    }

    Err(IngestError::Parse(format!(
        "invalid raw phase string, splitted by spaces array length is not 2 or 5. raw: '{stripped}' (method 2)"
    )))
}

fn parse_method3(stripped: &str, phase: &mut Phase) -> Result<()> {
    phase.primary = 0;
    if stripped.contains("anticipat") {
        phase.secondary = 1;
        phase.is_extra_eu = false;
    } else if stripped.contains("standard") {
        phase.secondary = 2;
        phase.is_extra_eu = false;
    } else if stripped.contains("ripescaggio") {
        phase.secondary = 3;
        phase.is_extra_eu = false;
    } else if stripped.contains("extra-ue") {
        phase.secondary = 1;
        phase.is_extra_eu = true;
    } else {
        return Err(IngestError::Parse(format!(
            "could not parse before-2023 rankings phase. raw: '{stripped}' (method 3)"
        )));
    }

    Ok(())
}

/// Total order over phases: `(primary, secondary, language priority,
/// isExtraEu)`, `false < true`. Used by the roll-up indexer (C10).
pub fn cmp_phases(a: &Phase, b: &Phase) -> Ordering {
    a.primary
        .cmp(&b.primary)
        .then(a.secondary.cmp(&b.secondary))
        .then(a.language.priority().cmp(&b.language.priority()))
        .then(a.is_extra_eu.cmp(&b.is_extra_eu))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phase(raw: &str, school: School, year: u16, extra_eu: bool) -> Phase {
        parse_phase(raw, school, year, extra_eu).expect("should parse")
    }

    #[test]
    fn test_ordinal() {
        assert_eq!(ordinal("Prima"), 1);
        assert_eq!(ordinal("Decima"), 10);
        assert_eq!(ordinal("banana"), 0);
    }

    #[test]
    fn test_method1_seconda_graduatoria() {
        let p = phase("Seconda Graduatoria", School::Architecture, 2023, false);
        assert_eq!(p.primary, 0);
        assert_eq!(p.secondary, 2);
        assert!(!p.is_extra_eu);
    }

    #[test]
    fn test_method1_extra_ue_seconda_graduatoria_escape() {
        let p = phase(
            "Extra-ue - Seconda Graduatoria",
            School::Architecture,
            2023,
            false,
        );
        assert!(p.is_extra_eu);
        assert_eq!(p.secondary, 2);
    }

    #[test]
    fn test_method2_terza_graduatoria_di_seconda_fase() {
        let p = phase(
            "Terza Graduatoria di Seconda Fase",
            School::Engineering,
            2023,
            false,
        );
        assert_eq!(p.primary, 2);
        assert_eq!(p.secondary, 3);
    }

    #[test]
    fn test_method2_urb_extra_eu_standard() {
        let p = phase("Extra-ue - Standard", School::Urbanistica, 2024, true);
        assert!(p.is_extra_eu);
        assert_eq!(p.secondary, 2);
        assert_eq!(p.stripped, "standard");
    }

    #[test]
    fn test_method3_anticipato() {
        let p = phase("Anticipato", School::Design, 2023, false);
        assert_eq!(p.primary, 0);
        assert_eq!(p.secondary, 1);
        assert!(!p.is_extra_eu);
    }

    #[test]
    fn test_method3_ripescaggio_current_mapping() {
        // current revision: ripescaggio -> 3 (not the legacy 4)
        let p = phase("Ripescaggio", School::Design, 2023, false);
        assert_eq!(p.secondary, 3);
        assert!(!p.is_extra_eu);
    }

    #[test]
    fn test_method2_arc_extra_eu_is_typed_error_not_crash() {
        // the open question: method 2 was never meant to see ARC, but if it
        // ever is invoked with extraEu set, it must return a typed Parse
        // error rather than panic.
        let mut phase = Phase {
            raw: "qualcosa".into(),
            stripped: "qualcosa".into(),
            primary: 0,
            secondary: 0,
            language: Language::Italian,
            is_extra_eu: true,
        };
        let err = parse_method2("qualcosa", School::Architecture, &mut phase);
        assert!(matches!(err, Err(IngestError::Parse(_))));
    }

    #[test]
    fn test_cmp_phases_orders_primary_then_secondary() {
        let a = phase("Prima Graduatoria", School::Architecture, 2023, false);
        let b = phase("Seconda Graduatoria", School::Architecture, 2023, false);
        assert_eq!(cmp_phases(&a, &b), Ordering::Less);
    }
}
