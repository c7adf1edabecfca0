//! End-to-end correlation of two revisions' screenshots
//!
//! A [`ComparisonRequest`] is a frozen snapshot of everything fetched for one
//! comparison. The engine only reads it: screenshots are canonicalized and
//! grouped per platform, outcomes are joined by canonical key, and each
//! platform is handed to the aggregator. Identical requests give identical
//! reports.

use serde::{Deserialize, Serialize};
use shotdiff_core::{
    OutcomeSet, PlatformOutcomes, ResultKind, RevisionInfo, ScreenshotRef, ScreenshotSet,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

use crate::aggregate::{aggregate, PlatformReport, PlatformSummary, SideScreenshots};
use crate::classify::{ClassifyContext, ComparisonLinks};
use crate::normalize::{normalize, NameContext};
use crate::rules::RuleSet;

/// Default location of comparison images
pub const DEFAULT_COMPARISON_BASE_URL: &str = "https://screenshots.mattn.ca/comparisons";

/// One side of a comparison: a revision and its jobs' screenshots
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideInput {
    #[serde(flatten)]
    pub revision: RevisionInfo,
    #[serde(default)]
    pub jobs: ScreenshotSet,
    /// Names on this side may carry the legacy prefix
    #[serde(default)]
    pub legacy_prefix: bool,
}

impl SideInput {
    pub fn new(revision: RevisionInfo) -> Self {
        Self {
            revision,
            jobs: Vec::new(),
            legacy_prefix: false,
        }
    }

    pub fn with_job(mut self, job: shotdiff_core::JobScreenshots) -> Self {
        self.jobs.push(job);
        self
    }

    pub fn with_legacy_prefix(mut self, legacy_prefix: bool) -> Self {
        self.legacy_prefix = legacy_prefix;
        self
    }

    fn name_context(&self) -> NameContext {
        NameContext {
            side_uses_legacy_prefix: self.legacy_prefix,
        }
    }

    /// Canonical screenshots grouped by platform
    ///
    /// Later jobs, and later raw names that canonicalize to the same key,
    /// replace earlier ones.
    fn screenshots_by_platform(&self) -> BTreeMap<String, BTreeMap<String, ScreenshotRef>> {
        let context = self.name_context();
        let mut by_platform: BTreeMap<String, BTreeMap<String, ScreenshotRef>> = BTreeMap::new();

        for job in &self.jobs {
            for (raw_name, location) in &job.screenshots {
                let key = normalize(raw_name, context);
                let screenshot = ScreenshotRef {
                    platform: job.job.platform.clone(),
                    combination_key: key.clone(),
                    image_location: location.clone(),
                    source_job: job.job.clone(),
                };
                let previous = by_platform
                    .entry(job.job.platform.clone())
                    .or_default()
                    .insert(key, screenshot);
                if let Some(previous) = previous {
                    debug!(
                        "Duplicate screenshot {} on {}, replacing job {}",
                        previous.combination_key, previous.platform, previous.source_job.id
                    );
                }
            }
        }

        by_platform
    }
}

/// Everything needed to compare two revisions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonRequest {
    pub old: SideInput,
    pub new: SideInput,
    #[serde(default)]
    pub outcomes: OutcomeSet,
    /// Only one revision was supplied; show screenshots without comparing
    #[serde(default)]
    pub single_revision_view: bool,
}

impl ComparisonRequest {
    pub fn new(old: SideInput, new: SideInput, outcomes: OutcomeSet) -> Self {
        Self {
            old,
            new,
            outcomes,
            single_revision_view: false,
        }
    }

    /// Display-only request for a single revision
    pub fn single_revision(side: SideInput) -> Self {
        Self {
            old: side,
            new: SideInput::default(),
            outcomes: OutcomeSet::new(),
            single_revision_view: true,
        }
    }
}

/// Per-platform results of one comparison, ordered by platform
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub platforms: Vec<PlatformReport>,
}

impl ComparisonReport {
    pub fn summaries(&self) -> impl Iterator<Item = &PlatformSummary> {
        self.platforms.iter().map(|p| &p.summary)
    }

    pub fn platform(&self, platform: &str) -> Option<&PlatformReport> {
        self.platforms.iter().find(|p| p.summary.platform == platform)
    }

    /// Whether any row changed in a way no rule explains
    pub fn has_unexplained_changes(&self) -> bool {
        self.platforms.iter().flat_map(|p| &p.rows).any(|row| {
            !matches!(row.result_kind, ResultKind::Similar | ResultKind::NotCompared)
                && !row.is_known_inconsistency()
        })
    }
}

/// Comparison orchestrator
///
/// Holds only read-only inputs shared across requests: the compiled rules and
/// the comparison image location.
#[derive(Debug, Clone)]
pub struct ComparisonEngine {
    rules: RuleSet,
    comparison_base_url: String,
}

impl ComparisonEngine {
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules,
            comparison_base_url: DEFAULT_COMPARISON_BASE_URL.to_string(),
        }
    }

    pub fn with_comparison_base_url(mut self, url: impl Into<String>) -> Self {
        self.comparison_base_url = url.into();
        self
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Correlate, classify and summarize both sides of `request`
    pub fn compare(&self, request: &ComparisonRequest) -> ComparisonReport {
        let mut old_by_platform = request.old.screenshots_by_platform();
        let mut new_by_platform = request.new.screenshots_by_platform();

        let platforms: BTreeSet<String> = old_by_platform
            .keys()
            .chain(new_by_platform.keys())
            .cloned()
            .collect();

        let links = (!request.single_revision_view).then(|| {
            ComparisonLinks::new(
                self.comparison_base_url.clone(),
                request.old.revision.clone(),
                request.new.revision.clone(),
            )
        });

        // Outcome keys come from the comparator, which saw either naming
        let outcome_context = NameContext {
            side_uses_legacy_prefix: request.old.legacy_prefix || request.new.legacy_prefix,
        };

        let mut reports = Vec::with_capacity(platforms.len());
        for platform in platforms {
            let screenshots = SideScreenshots {
                old: old_by_platform.remove(&platform).unwrap_or_default(),
                new: new_by_platform.remove(&platform).unwrap_or_default(),
            };
            if screenshots.is_empty() {
                continue;
            }

            let outcomes = if request.single_revision_view {
                None
            } else {
                match request.outcomes.get(&platform) {
                    Some(Some(outcomes)) => Some(canonical_outcomes(outcomes, outcome_context)),
                    Some(None) => {
                        info!("Comparison results unavailable for {}", platform);
                        None
                    }
                    None => {
                        debug!("No comparison results for {}", platform);
                        None
                    }
                }
            };

            let context = ClassifyContext {
                platform: &platform,
                rules: &self.rules,
                links: links.as_ref(),
            };
            reports.push(aggregate(&screenshots, outcomes.as_ref(), &context));
        }

        info!(
            "Compared {} platforms between {} and {}",
            reports.len(),
            request.old.revision.revision,
            request.new.revision.revision
        );

        ComparisonReport { platforms: reports }
    }
}

/// Re-key comparator results by canonical combination key
///
/// A record already stored under its canonical key is kept over one that
/// only maps to it after normalization.
fn canonical_outcomes(outcomes: &PlatformOutcomes, context: NameContext) -> PlatformOutcomes {
    let mut canonical = PlatformOutcomes::new();
    let mut renamed = Vec::new();

    for (key, record) in outcomes {
        let normalized = normalize(key, context);
        if &normalized == key {
            canonical.insert(normalized, record.clone());
        } else {
            renamed.push((normalized, record));
        }
    }
    for (key, record) in renamed {
        canonical.entry(key).or_insert_with(|| record.clone());
    }

    canonical
}
