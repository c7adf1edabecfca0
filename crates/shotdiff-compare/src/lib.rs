//! Screenshot correlation and classification for cross-revision comparisons
//!
//! Given two revisions' screenshots, the pixel comparator's per-platform
//! results and a table of known visual inconsistencies, this crate joins the
//! screenshots by canonical combination key, classifies every pair and rolls
//! the results up into per-platform summaries.
//!
//! # Example
//!
//! ```
//! use shotdiff_compare::{ComparisonEngine, ComparisonRequest, RuleSet, SideInput};
//! use shotdiff_core::{ComparisonOutcomeRecord, JobRef, JobScreenshots, OutcomeSet, ResultKind, RevisionInfo};
//!
//! let old = SideInput::new(RevisionInfo::new("mozilla-central", "aaa")).with_job(
//!     JobScreenshots::new(JobRef::new(1, "linux64", 10)).with_screenshot("a.png", "https://old/a.png"),
//! );
//! let new = SideInput::new(RevisionInfo::new("mozilla-central", "bbb")).with_job(
//!     JobScreenshots::new(JobRef::new(2, "linux64", 11)).with_screenshot("a.png", "https://new/a.png"),
//! );
//!
//! let mut outcomes = OutcomeSet::new();
//! outcomes.insert(
//!     "linux64".to_string(),
//!     Some([("a.png".to_string(), ComparisonOutcomeRecord::new(ResultKind::Similar).with_difference(0i64))].into()),
//! );
//!
//! let engine = ComparisonEngine::new(RuleSet::empty());
//! let report = engine.compare(&ComparisonRequest::new(old, new, outcomes));
//!
//! assert!(report.platforms[0].summary.all_similar);
//! ```
//!
//! # Architecture
//!
//! - [`normalize`]: combination-name canonicalization across naming schemes
//! - [`artifacts`]: picking screenshots out of upstream job details
//! - [`rules`]: known-inconsistency rule compilation and matching
//! - [`classify`]: per-cell result classification
//! - [`aggregate`]: per-platform rows and summary counts
//! - [`engine`]: end-to-end correlation of two sides
//! - [`filter`]: row visibility
//! - [`report`]: plain-text change report

pub mod aggregate;
pub mod artifacts;
pub mod classify;
pub mod engine;
pub mod filter;
pub mod normalize;
pub mod report;
pub mod rules;

// Re-export commonly used types
pub use aggregate::{aggregate, ComparisonRow, PlatformReport, PlatformSummary, SideScreenshots};
pub use artifacts::{extract_screenshot_artifacts, is_screenshot_artifact, JobDetail};
pub use classify::{classify, CellPayload, ClassifiedCell, ClassifyContext, ComparisonLinks};
pub use engine::{ComparisonEngine, ComparisonReport, ComparisonRequest, SideInput};
pub use filter::RowFilter;
pub use normalize::{display_name, normalize, NameContext};
pub use report::{ChangeReport, ReportLinks};
pub use rules::{KnownInconsistencyRule, RuleSet, RuleSource};
