//! Row matching.

use crate::types::RowData;

/// Which rows a search selects.
///
/// Matching is case-sensitive and scoped to a single column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowFilter {
    /// Every row matches.
    MatchAll,
    /// The cell in `column` equals `value`.
    Equals { column: String, value: String },
    /// The cell in `column` contains `value`.
    Contains { column: String, value: String },
}

impl RowFilter {
    /// Build a filter for `term` in `column`.
    pub fn for_term(column: impl Into<String>, term: impl Into<String>, exact: bool) -> Self {
        let (column, value) = (column.into(), term.into());
        if exact {
            Self::Equals { column, value }
        } else {
            Self::Contains { column, value }
        }
    }

    pub fn matches(&self, data: &RowData) -> bool {
        match self {
            Self::MatchAll => true,
            Self::Equals { column, value } => data.get(column).is_some_and(|cell| cell == value),
            Self::Contains { column, value } => {
                data.get(column).is_some_and(|cell| cell.contains(value.as_str()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RowFilter;
    use crate::types::RowData;

    fn row(name: &str, age: &str) -> RowData {
        RowData::from([
            ("name".to_string(), name.to_string()),
            ("age".to_string(), age.to_string()),
        ])
    }

    #[test]
    fn match_all_accepts_everything() {
        assert!(RowFilter::MatchAll.matches(&row("John", "30")));
        assert!(RowFilter::MatchAll.matches(&RowData::new()));
    }

    #[test]
    fn equals_is_exact_and_case_sensitive() {
        let f = RowFilter::for_term("name", "John", true);
        assert!(f.matches(&row("John", "30")));
        assert!(!f.matches(&row("john", "30")));
        assert!(!f.matches(&row("Johnny", "30")));
        assert!(!RowFilter::for_term("name", "J", true).matches(&row("John", "30")));
    }

    #[test]
    fn contains_is_substring_and_case_sensitive() {
        let f = RowFilter::for_term("name", "J", false);
        assert!(f.matches(&row("John", "30")));
        assert!(f.matches(&row("Jane", "25")));
        assert!(!f.matches(&row("ajax", "25")));
    }

    #[test]
    fn unknown_column_never_matches() {
        let f = RowFilter::for_term("email", "x", false);
        assert!(!f.matches(&row("x", "x")));
    }
}
