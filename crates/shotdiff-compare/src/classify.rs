//! Per-cell classification of comparator results

use serde::{Deserialize, Serialize};
use shotdiff_core::{Bounds, ComparisonOutcomeRecord, DifferenceMagnitude, ResultKind, RevisionInfo};
use tracing::warn;

use crate::normalize::display_name;
use crate::rules::RuleSet;

/// Where comparison images for a pair of revisions live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonLinks {
    pub base_url: String,
    pub old: RevisionInfo,
    pub new: RevisionInfo,
}

impl ComparisonLinks {
    pub fn new(base_url: impl Into<String>, old: RevisionInfo, new: RevisionInfo) -> Self {
        Self {
            base_url: base_url.into(),
            old,
            new,
        }
    }

    /// URL of the comparison image for one screenshot on one platform
    pub fn image_url(&self, platform: &str, image: &str) -> String {
        format!(
            "{}/{}/{}/{}/{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.old.project,
            self.old.revision,
            self.new.project,
            self.new.revision,
            platform,
            image
        )
    }
}

/// Inputs shared by every cell of one platform
#[derive(Debug, Clone, Copy)]
pub struct ClassifyContext<'a> {
    pub platform: &'a str,
    pub rules: &'a RuleSet,
    /// Absent when there is no second revision to link against
    pub links: Option<&'a ComparisonLinks>,
}

/// What a classified cell shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CellPayload {
    NotCompared,
    Similar {
        difference: Option<DifferenceMagnitude>,
    },
    Different {
        difference: Option<DifferenceMagnitude>,
        comparison_url: Option<String>,
    },
    MissingSource,
    Error,
    /// The record had no usable result
    NoResults,
}

impl std::fmt::Display for CellPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotCompared => write!(f, "Not compared"),
            Self::Similar { difference } => match difference {
                Some(d) if !d.is_zero() => write!(f, "{}", d),
                _ => write!(f, "None"),
            },
            Self::Different { difference, .. } => match difference {
                Some(d) => write!(f, "{}", d),
                None => Ok(()),
            },
            Self::MissingSource => write!(f, "Missing source image"),
            Self::Error => write!(f, "Error"),
            Self::NoResults => write!(f, "No results"),
        }
    }
}

/// Result of classifying one platform + combination pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedCell {
    /// Base kind; never `KnownInconsistency`
    pub kind: ResultKind,
    /// Reason of the matching rule, only on DIFFERENT cells
    pub known_inconsistency: Option<String>,
    pub payload: CellPayload,
    pub bounds: Option<Bounds>,
}

impl ClassifiedCell {
    pub fn not_compared() -> Self {
        Self::plain(ResultKind::NotCompared, CellPayload::NotCompared)
    }

    /// Missing-source cell for a one-sided screenshot
    pub fn missing(kind: ResultKind) -> Self {
        debug_assert!(kind.is_missing());
        Self::plain(kind, CellPayload::MissingSource)
    }

    fn plain(kind: ResultKind, payload: CellPayload) -> Self {
        Self {
            kind,
            known_inconsistency: None,
            payload,
            bounds: None,
        }
    }

    pub fn is_known_inconsistency(&self) -> bool {
        self.known_inconsistency.is_some()
    }

    /// Differing pixel count, for SIMILAR and DIFFERENT cells
    pub fn magnitude(&self) -> Option<&DifferenceMagnitude> {
        match &self.payload {
            CellPayload::Similar { difference } | CellPayload::Different { difference, .. } => {
                difference.as_ref()
            }
            _ => None,
        }
    }
}

/// Classify the comparator outcome for `combination_key`
///
/// `None` means the comparison has not run. Records without a usable result
/// degrade to ERROR with a "no results" payload.
pub fn classify(
    outcome: Option<&ComparisonOutcomeRecord>,
    combination_key: &str,
    context: &ClassifyContext<'_>,
) -> ClassifiedCell {
    let Some(record) = outcome else {
        return ClassifiedCell::not_compared();
    };

    match record.kind() {
        Some(ResultKind::Similar) => ClassifiedCell::plain(
            ResultKind::Similar,
            CellPayload::Similar {
                difference: record.difference.clone(),
            },
        ),
        Some(ResultKind::Different) => classify_different(record, combination_key, context),
        Some(kind @ (ResultKind::MissingBefore | ResultKind::MissingAfter)) => {
            ClassifiedCell::missing(kind)
        }
        Some(ResultKind::Error) => ClassifiedCell::plain(ResultKind::Error, CellPayload::Error),
        Some(ResultKind::NotCompared) => ClassifiedCell::not_compared(),
        Some(ResultKind::KnownInconsistency) | None => {
            warn!(
                "No usable result for {} on {}: {:?}",
                combination_key, context.platform, record.result
            );
            ClassifiedCell::plain(ResultKind::Error, CellPayload::NoResults)
        }
    }
}

fn classify_different(
    record: &ComparisonOutcomeRecord,
    combination_key: &str,
    context: &ClassifyContext<'_>,
) -> ClassifiedCell {
    let difference_text = record
        .difference
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_default();

    let known_inconsistency = context
        .rules
        .find_match(context.platform, display_name(combination_key), &difference_text)
        .map(|rule| rule.reason().to_string());

    ClassifiedCell {
        kind: ResultKind::Different,
        known_inconsistency,
        payload: CellPayload::Different {
            difference: record.difference.clone(),
            comparison_url: context
                .links
                .map(|links| links.image_url(context.platform, combination_key)),
        },
        bounds: record.bounds,
    }
}
