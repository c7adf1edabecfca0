//! Core type definitions for screenshot comparison

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Outcome of comparing one combination between two revisions
///
/// The first five codes match the numeric results written by the pixel
/// comparator (`comparison.json`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultKind {
    Similar = 0,
    Different = 1,
    Error = 2,
    MissingBefore = 3,
    MissingAfter = 4,
    /// Tag layered onto a DIFFERENT result, never a base kind
    KnownInconsistency = 5,
    NotCompared = 6,
}

impl ResultKind {
    /// Every kind, in code order
    pub const ALL: [ResultKind; 7] = [
        Self::Similar,
        Self::Different,
        Self::Error,
        Self::MissingBefore,
        Self::MissingAfter,
        Self::KnownInconsistency,
        Self::NotCompared,
    ];

    /// Map a comparator result code to a kind
    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| *kind as i64 == code)
    }

    /// Whether this kind marks a source image absent on one side
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::MissingBefore | Self::MissingAfter)
    }
}

impl std::fmt::Display for ResultKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Similar => write!(f, "SIMILAR"),
            Self::Different => write!(f, "DIFFERENT"),
            Self::Error => write!(f, "ERROR"),
            Self::MissingBefore => write!(f, "MISSING_BEFORE"),
            Self::MissingAfter => write!(f, "MISSING_AFTER"),
            Self::KnownInconsistency => write!(f, "KNOWN_INCONSISTENCY"),
            Self::NotCompared => write!(f, "NOT_COMPARED"),
        }
    }
}

impl std::str::FromStr for ResultKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "similar" | "0" => Ok(Self::Similar),
            "different" | "1" => Ok(Self::Different),
            "error" | "2" => Ok(Self::Error),
            "missing_before" | "3" => Ok(Self::MissingBefore),
            "missing_after" | "4" => Ok(Self::MissingAfter),
            "known_inconsistency" | "5" => Ok(Self::KnownInconsistency),
            "not_compared" | "6" => Ok(Self::NotCompared),
            _ => Err(format!("Invalid result kind: {}", s)),
        }
    }
}

/// One of the two revisions being compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Old,
    New,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Old => write!(f, "old"),
            Self::New => write!(f, "new"),
        }
    }
}

/// Upstream job that produced a batch of screenshots
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JobRef {
    pub id: u64,
    pub platform: String,
    pub result_set_id: u64,
}

impl JobRef {
    pub fn new(id: u64, platform: impl Into<String>, result_set_id: u64) -> Self {
        Self {
            id,
            platform: platform.into(),
            result_set_id,
        }
    }
}

/// Revision (push) metadata for one side of a comparison
///
/// Project and revision are opaque; they only feed naming decisions and links.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionInfo {
    pub project: String,
    pub revision: String,
    /// Push time in seconds since the Unix epoch
    #[serde(default)]
    pub push_timestamp: Option<i64>,
}

impl RevisionInfo {
    pub fn new(project: impl Into<String>, revision: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            revision: revision.into(),
            push_timestamp: None,
        }
    }

    pub fn with_push_timestamp(mut self, timestamp: i64) -> Self {
        self.push_timestamp = Some(timestamp);
        self
    }

    /// Push time as a UTC datetime, if known and representable
    pub fn push_time(&self) -> Option<DateTime<Utc>> {
        self.push_timestamp
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
    }
}

/// One captured screenshot after name canonicalization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenshotRef {
    pub platform: String,
    /// Canonical combination key
    pub combination_key: String,
    /// Opaque image URL
    pub image_location: String,
    pub source_job: JobRef,
}

/// Screenshots of a single job, keyed by raw combination name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobScreenshots {
    pub job: JobRef,
    #[serde(default)]
    pub screenshots: BTreeMap<String, String>,
}

impl JobScreenshots {
    pub fn new(job: JobRef) -> Self {
        Self {
            job,
            screenshots: BTreeMap::new(),
        }
    }

    pub fn with_screenshot(mut self, name: impl Into<String>, url: impl Into<String>) -> Self {
        self.screenshots.insert(name.into(), url.into());
        self
    }
}

/// All screenshots of one side, job by job
///
/// Jobs are applied in order, so a later job wins on duplicate names.
pub type ScreenshotSet = Vec<JobScreenshots>;

/// Bounding box of the differing region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub left: i64,
    pub top: i64,
    pub right: i64,
    pub bottom: i64,
}

/// Differing pixel count as reported by the comparator
///
/// The comparator writes either a number or its raw textual output. Any
/// other JSON value is kept as-is so the record still loads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DifferenceMagnitude {
    Count(i64),
    Text(String),
    Other(serde_json::Value),
}

impl DifferenceMagnitude {
    /// Whether this is the literal zero value
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Count(n) => *n == 0,
            Self::Text(s) => s.trim() == "0",
            Self::Other(_) => false,
        }
    }
}

impl std::fmt::Display for DifferenceMagnitude {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Count(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{}", s.trim()),
            Self::Other(value) => write!(f, "{}", value),
        }
    }
}

impl From<i64> for DifferenceMagnitude {
    fn from(n: i64) -> Self {
        Self::Count(n)
    }
}

impl From<&str> for DifferenceMagnitude {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// Result field of an outcome record: a numeric code or a kind name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultCode {
    Code(i64),
    Name(String),
    /// Neither a code nor a name
    Other(serde_json::Value),
}

impl ResultCode {
    /// The kind this code denotes, or `None` for an unknown code
    pub fn kind(&self) -> Option<ResultKind> {
        match self {
            Self::Code(code) => ResultKind::from_code(*code),
            Self::Name(name) => name.parse().ok(),
            Self::Other(_) => None,
        }
    }
}

impl From<ResultKind> for ResultCode {
    fn from(kind: ResultKind) -> Self {
        Self::Code(kind as i64)
    }
}

/// One comparator result for a combination key on a platform
///
/// Every field is optional so that malformed records still deserialize;
/// the classifier degrades them instead of failing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonOutcomeRecord {
    #[serde(default, alias = "resultKind", skip_serializing_if = "Option::is_none")]
    pub result: Option<ResultCode>,
    #[serde(
        default,
        alias = "differenceMagnitude",
        skip_serializing_if = "Option::is_none"
    )]
    pub difference: Option<DifferenceMagnitude>,
    #[serde(
        default,
        alias = "differenceBounds",
        deserialize_with = "lenient_bounds",
        skip_serializing_if = "Option::is_none"
    )]
    pub bounds: Option<Bounds>,
}

/// Bounds that do not parse are dropped rather than rejecting the record
fn lenient_bounds<'de, D>(deserializer: D) -> Result<Option<Bounds>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| serde_json::from_value(value).ok()))
}

impl ComparisonOutcomeRecord {
    pub fn new(kind: ResultKind) -> Self {
        Self {
            result: Some(kind.into()),
            difference: None,
            bounds: None,
        }
    }

    pub fn with_difference(mut self, difference: impl Into<DifferenceMagnitude>) -> Self {
        self.difference = Some(difference.into());
        self
    }

    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// The recorded kind, if the record carries a recognized one
    pub fn kind(&self) -> Option<ResultKind> {
        self.result.as_ref().and_then(ResultCode::kind)
    }
}

/// Comparator results for one platform, keyed by combination key
pub type PlatformOutcomes = BTreeMap<String, ComparisonOutcomeRecord>;

/// Comparator results for every platform
///
/// A `None` entry means the results for that platform could not be fetched,
/// as opposed to an empty map which means nothing was compared.
pub type OutcomeSet = BTreeMap<String, Option<PlatformOutcomes>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_kind_codes() {
        assert_eq!(ResultKind::from_code(0), Some(ResultKind::Similar));
        assert_eq!(ResultKind::from_code(4), Some(ResultKind::MissingAfter));
        assert_eq!(ResultKind::from_code(42), None);
        assert_eq!(ResultKind::from_code(-1), None);
    }

    #[test]
    fn test_result_kind_parsing() {
        let kind: ResultKind = "missing-before".parse().unwrap();
        assert_eq!(kind, ResultKind::MissingBefore);
        assert_eq!(kind.to_string(), "MISSING_BEFORE");
        assert!("bogus".parse::<ResultKind>().is_err());
    }

    #[test]
    fn test_outcome_record_from_comparator_json() {
        let json = r#"{"result": 1, "difference": "42"}"#;
        let record: ComparisonOutcomeRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.kind(), Some(ResultKind::Different));
        assert_eq!(record.difference, Some(DifferenceMagnitude::Text("42".into())));
        assert!(record.bounds.is_none());
    }

    #[test]
    fn test_outcome_record_aliases() {
        let json = r#"{
            "resultKind": "DIFFERENT",
            "differenceMagnitude": 7,
            "differenceBounds": {"left": 1, "top": 2, "right": 3, "bottom": 4}
        }"#;
        let record: ComparisonOutcomeRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.kind(), Some(ResultKind::Different));
        assert_eq!(record.difference, Some(DifferenceMagnitude::Count(7)));
        assert_eq!(record.bounds.map(|b| b.right), Some(3));
    }

    #[test]
    fn test_malformed_record_still_parses() {
        let record: ComparisonOutcomeRecord = serde_json::from_str("{}").unwrap();
        assert_eq!(record.kind(), None);

        let record: ComparisonOutcomeRecord = serde_json::from_str(r#"{"result": 99}"#).unwrap();
        assert_eq!(record.kind(), None);
    }

    #[test]
    fn test_unexpected_json_types_still_parse() {
        let record: ComparisonOutcomeRecord =
            serde_json::from_str(r#"{"result": true, "bounds": "n/a"}"#).unwrap();
        assert_eq!(record.kind(), None);
        assert!(record.bounds.is_none());

        let record: ComparisonOutcomeRecord =
            serde_json::from_str(r#"{"result": {"code": 1}}"#).unwrap();
        assert_eq!(record.kind(), None);

        let record: ComparisonOutcomeRecord =
            serde_json::from_str(r#"{"result": 1, "difference": 1.5}"#).unwrap();
        assert_eq!(record.kind(), Some(ResultKind::Different));
        let difference = record.difference.unwrap();
        assert!(!difference.is_zero());
        assert_eq!(difference.to_string(), "1.5");
    }

    #[test]
    fn test_difference_magnitude_zero() {
        assert!(DifferenceMagnitude::Count(0).is_zero());
        assert!(DifferenceMagnitude::from("0\n").is_zero());
        assert!(!DifferenceMagnitude::from("10").is_zero());
        assert_eq!(DifferenceMagnitude::from(" 10 ").to_string(), "10");
    }

    #[test]
    fn test_push_time() {
        let rev = RevisionInfo::new("mozilla-central", "abc").with_push_timestamp(1464438021);
        let time = rev.push_time().unwrap();
        assert_eq!(time.format("%Y-%m-%d").to_string(), "2016-05-28");
        assert!(RevisionInfo::new("try", "def").push_time().is_none());
    }
}
