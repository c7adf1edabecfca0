//! Row visibility

use regex::{Regex, RegexBuilder};
use shotdiff_core::{DisplayDefaults, ResultKind, Result, ShotdiffError};

use crate::aggregate::{ComparisonRow, PlatformReport};

/// Which rows of a report to show
#[derive(Debug, Clone, Default)]
pub struct RowFilter {
    pub hide_similar: bool,
    pub hide_missing: bool,
    pub hide_known_inconsistencies: bool,
    /// Case-insensitive pattern searched in the row id
    pattern: Option<Regex>,
}

impl RowFilter {
    pub fn from_defaults(defaults: &DisplayDefaults) -> Self {
        Self {
            hide_similar: defaults.hide_similar,
            hide_missing: defaults.hide_missing,
            hide_known_inconsistencies: defaults.hide_known_inconsistencies,
            pattern: None,
        }
    }

    /// Only show rows whose id matches `pattern`; an empty pattern shows all
    pub fn with_pattern(mut self, pattern: &str) -> Result<Self> {
        self.pattern = if pattern.is_empty() {
            None
        } else {
            Some(
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| ShotdiffError::InvalidFilter(e.to_string()))?,
            )
        };
        Ok(self)
    }

    pub fn is_visible(&self, platform: &str, row: &ComparisonRow) -> bool {
        if self.hide_similar && row.result_kind == ResultKind::Similar {
            return false;
        }
        if self.hide_missing && row.result_kind.is_missing() {
            return false;
        }
        if self.hide_known_inconsistencies && row.is_known_inconsistency() {
            return false;
        }
        match &self.pattern {
            Some(pattern) => pattern.is_match(&row.row_id(platform)),
            None => true,
        }
    }

    /// Visible rows of one platform, in report order
    pub fn visible_rows<'a>(
        &'a self,
        report: &'a PlatformReport,
    ) -> impl Iterator<Item = &'a ComparisonRow> + 'a {
        report
            .rows
            .iter()
            .filter(move |row| self.is_visible(&report.summary.platform, row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::CellPayload;

    fn row(name: &str, kind: ResultKind, known: bool) -> ComparisonRow {
        ComparisonRow {
            combination_key: format!("{}.png", name),
            display_name: name.to_string(),
            result_kind: kind,
            known_inconsistency_reason: known.then(String::new),
            payload: CellPayload::NotCompared,
            bounds: None,
            old_image: None,
            new_image: None,
        }
    }

    #[test]
    fn test_default_shows_everything() {
        let filter = RowFilter::default();
        assert!(filter.is_visible("linux64", &row("a", ResultKind::Similar, false)));
        assert!(filter.is_visible("linux64", &row("a", ResultKind::Error, false)));
    }

    #[test]
    fn test_hide_flags() {
        let filter = RowFilter::from_defaults(&DisplayDefaults {
            hide_similar: true,
            hide_missing: true,
            hide_known_inconsistencies: true,
        });
        assert!(!filter.is_visible("p", &row("a", ResultKind::Similar, false)));
        assert!(!filter.is_visible("p", &row("a", ResultKind::MissingBefore, false)));
        assert!(!filter.is_visible("p", &row("a", ResultKind::MissingAfter, false)));
        assert!(!filter.is_visible("p", &row("a", ResultKind::Different, true)));
        assert!(filter.is_visible("p", &row("a", ResultKind::Different, false)));
        assert!(filter.is_visible("p", &row("a", ResultKind::NotCompared, false)));
    }

    #[test]
    fn test_pattern_matches_row_id_case_insensitively() {
        let filter = RowFilter::default().with_pattern("LINUX64_1_TABS").unwrap();
        assert!(filter.is_visible("linux64", &row("1_tabs_normal", ResultKind::Similar, false)));
        assert!(!filter.is_visible("windows7-32", &row("1_tabs_normal", ResultKind::Similar, false)));
    }

    #[test]
    fn test_empty_pattern_shows_all() {
        let filter = RowFilter::default().with_pattern("").unwrap();
        assert!(filter.is_visible("p", &row("anything", ResultKind::Error, false)));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = RowFilter::default().with_pattern("[unclosed").unwrap_err();
        assert!(matches!(err, ShotdiffError::InvalidFilter(_)));
    }
}
