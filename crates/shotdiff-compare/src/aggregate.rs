//! Per-platform rows and summary counts

use serde::{Deserialize, Serialize};
use shotdiff_core::{Bounds, PlatformOutcomes, ResultKind, ScreenshotRef, Side};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::classify::{classify, CellPayload, ClassifiedCell, ClassifyContext};
use crate::normalize::display_name;

/// Screenshots of one platform on both sides, keyed by combination key
#[derive(Debug, Clone, Default)]
pub struct SideScreenshots {
    pub old: BTreeMap<String, ScreenshotRef>,
    pub new: BTreeMap<String, ScreenshotRef>,
}

impl SideScreenshots {
    pub fn side(&self, side: Side) -> &BTreeMap<String, ScreenshotRef> {
        match side {
            Side::Old => &self.old,
            Side::New => &self.new,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.old.is_empty() && self.new.is_empty()
    }

    /// Union of both sides' keys in ascending order
    pub fn combination_keys(&self) -> BTreeSet<&str> {
        self.old
            .keys()
            .chain(self.new.keys())
            .map(String::as_str)
            .collect()
    }
}

/// One classified screenshot pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub combination_key: String,
    pub display_name: String,
    pub result_kind: ResultKind,
    pub known_inconsistency_reason: Option<String>,
    pub payload: CellPayload,
    pub bounds: Option<Bounds>,
    pub old_image: Option<String>,
    pub new_image: Option<String>,
}

impl ComparisonRow {
    fn new(
        combination_key: &str,
        cell: ClassifiedCell,
        old_image: Option<String>,
        new_image: Option<String>,
    ) -> Self {
        Self {
            combination_key: combination_key.to_string(),
            display_name: display_name(combination_key).to_string(),
            result_kind: cell.kind,
            known_inconsistency_reason: cell.known_inconsistency,
            payload: cell.payload,
            bounds: cell.bounds,
            old_image,
            new_image,
        }
    }

    pub fn is_known_inconsistency(&self) -> bool {
        self.known_inconsistency_reason.is_some()
    }

    /// Identifier used for text filtering, `{platform}_{display name}`
    pub fn row_id(&self, platform: &str) -> String {
        format!("{}_{}", platform, self.display_name)
    }
}

/// Counts and flags for one platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformSummary {
    pub platform: String,
    /// Non-zero counts only; KNOWN_INCONSISTENCY counts tagged DIFFERENT rows
    pub counts: BTreeMap<ResultKind, usize>,
    /// Something was similar and nothing else happened
    pub all_similar: bool,
    /// Every difference is known and nothing is missing or broken
    pub all_differences_known: bool,
}

impl PlatformSummary {
    /// Tally a platform's rows
    pub fn from_rows(platform: &str, rows: &[ComparisonRow]) -> Self {
        let mut counts = BTreeMap::new();
        for row in rows {
            *counts.entry(row.result_kind).or_insert(0) += 1;
            if row.is_known_inconsistency() {
                *counts.entry(ResultKind::KnownInconsistency).or_insert(0) += 1;
            }
        }

        let count = |kind: ResultKind| counts.get(&kind).copied().unwrap_or(0);

        let all_similar = count(ResultKind::Similar) > 0
            && counts.keys().all(|kind| *kind == ResultKind::Similar);

        let all_differences_known = count(ResultKind::Different) > 0
            && count(ResultKind::KnownInconsistency) == count(ResultKind::Different)
            && count(ResultKind::MissingBefore)
                + count(ResultKind::MissingAfter)
                + count(ResultKind::Error)
                == 0;

        Self {
            platform: platform.to_string(),
            counts,
            all_similar,
            all_differences_known,
        }
    }

    pub fn count(&self, kind: ResultKind) -> usize {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    /// e.g. `2 similar, 1 different, 1 known inconsistencies, 1 missing`
    ///
    /// Zero categories are left out; "different" excludes known inconsistencies.
    pub fn summary_line(&self) -> String {
        let categories = [
            (self.count(ResultKind::Similar), "similar"),
            (
                self.count(ResultKind::Different)
                    .saturating_sub(self.count(ResultKind::KnownInconsistency)),
                "different",
            ),
            (self.count(ResultKind::KnownInconsistency), "known inconsistencies"),
            (
                self.count(ResultKind::MissingBefore) + self.count(ResultKind::MissingAfter),
                "missing",
            ),
            (self.count(ResultKind::Error), "errors"),
            (self.count(ResultKind::NotCompared), "not compared"),
        ];

        categories
            .iter()
            .filter(|(count, _)| *count > 0)
            .map(|(count, category)| format!("{} {}", count, category))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Classified rows plus summary for one platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformReport {
    pub summary: PlatformSummary,
    pub rows: Vec<ComparisonRow>,
}

/// Classify every combination of one platform and roll up the counts
///
/// `outcomes` of `None` means no comparator data applies (unavailable, or a
/// single-revision view) and every row is NOT_COMPARED. With outcome data, a
/// key without a record is MISSING_BEFORE/MISSING_AFTER when only one side has
/// it and NOT_COMPARED otherwise.
pub fn aggregate(
    screenshots: &SideScreenshots,
    outcomes: Option<&PlatformOutcomes>,
    context: &ClassifyContext<'_>,
) -> PlatformReport {
    let rows: Vec<ComparisonRow> = screenshots
        .combination_keys()
        .into_iter()
        .map(|key| {
            let old = screenshots.side(Side::Old).get(key);
            let new = screenshots.side(Side::New).get(key);

            let cell = match outcomes {
                None => ClassifiedCell::not_compared(),
                Some(outcomes) => match (outcomes.get(key), old, new) {
                    (Some(record), _, _) => classify(Some(record), key, context),
                    (None, None, Some(_)) => ClassifiedCell::missing(ResultKind::MissingBefore),
                    (None, Some(_), None) => ClassifiedCell::missing(ResultKind::MissingAfter),
                    (None, _, _) => classify(None, key, context),
                },
            };

            ComparisonRow::new(
                key,
                cell,
                old.map(|s| s.image_location.clone()),
                new.map(|s| s.image_location.clone()),
            )
        })
        .collect();

    let summary = PlatformSummary::from_rows(context.platform, &rows);
    debug!("{}: {}", context.platform, summary.summary_line());

    PlatformReport { summary, rows }
}
