//! Small helpers shared by the merit (C8) and course (C9) table parsers.

use scraper::{ElementRef, Node};
use tracing::error;

/// The text of `el`'s first contiguous text-node child, trimmed. Used for
/// `<th>` headers that otherwise repeat in a second language behind a
/// `<br>`.
pub fn first_text_fragment(el: ElementRef) -> String {
    el.children()
        .find_map(|child| match child.value() {
            Node::Text(t) => Some(t.trim().to_string()),
            _ => None,
        })
        .unwrap_or_default()
}

/// `items[index]`, trimmed, or `default` if `index` is -1 (column absent)
/// or out of bounds (logged, since that signals an unexpected table shape).
pub fn field_by_index(items: &[String], index: i32, default: &str, ranking_id: &str) -> String {
    if index < 0 {
        return default.to_string();
    }
    match items.get(index as usize) {
        Some(v) => v.trim().to_string(),
        None => {
            error!(
                ranking_id,
                index, row_length = items.len(),
                "tried to index outside of row length while parsing table"
            );
            default.to_string()
        }
    }
}

/// Splits `"Foo (Milano)"` into `("Foo", "Milano")`; `"Foo"` into
/// `("Foo", "")`.
pub fn course_title_location(raw: &str) -> (String, String) {
    if raw.contains('(') && raw.contains(')') {
        if let Some((title, rest)) = raw.split_once(" (") {
            let location = rest.split(')').next().unwrap_or("");
            return (title.to_string(), location.to_string());
        }
    }
    (raw.to_string(), String::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_course_title_location_with_location() {
        assert_eq!(
            course_title_location("Foo (Milano)"),
            ("Foo".to_string(), "Milano".to_string())
        );
    }

    #[test]
    fn test_course_title_location_without_location() {
        assert_eq!(course_title_location("Foo"), ("Foo".to_string(), String::new()));
    }

    #[test]
    fn test_field_by_index_absent_column_returns_default() {
        let items = vec!["a".to_string(), "b".to_string()];
        assert_eq!(field_by_index(&items, -1, "x", "r"), "x");
    }

    #[test]
    fn test_field_by_index_out_of_bounds_returns_default() {
        let items = vec!["a".to_string()];
        assert_eq!(field_by_index(&items, 5, "x", "r"), "x");
    }
}
