//! Request file parsing

use serde::Deserialize;
use shotdiff_compare::{extract_screenshot_artifacts, ComparisonRequest, JobDetail, NameContext, SideInput};
use shotdiff_core::{JobRef, JobScreenshots, LegacyPrefixConfig, OutcomeSet};
use tracing::debug;

/// Comparison request as written to disk
#[derive(Debug, Deserialize)]
pub struct RequestFile {
    pub old: SideFile,
    /// Absent for a single-revision view
    #[serde(default)]
    pub new: Option<SideFile>,
    #[serde(default)]
    pub outcomes: OutcomeSet,
}

/// One side, with screenshots given directly or as raw job details
#[derive(Debug, Deserialize)]
pub struct SideFile {
    #[serde(flatten)]
    pub side: SideInput,
    #[serde(default)]
    pub artifacts: Vec<JobArtifacts>,
}

/// Detail listing of one job
#[derive(Debug, Deserialize)]
pub struct JobArtifacts {
    pub job: JobRef,
    #[serde(default)]
    pub details: Vec<JobDetail>,
}

impl SideFile {
    fn into_side(self, legacy_prefix: bool) -> SideInput {
        let mut side = self.side;
        for listing in self.artifacts {
            let screenshots = extract_screenshot_artifacts(&listing.details);
            debug!(
                "Job {} on {}: {} screenshot artifacts",
                listing.job.id,
                listing.job.platform,
                screenshots.len()
            );
            side.jobs.push(JobScreenshots {
                job: listing.job,
                screenshots,
            });
        }
        side.legacy_prefix = legacy_prefix;
        side
    }
}

impl RequestFile {
    /// Build the engine request, applying the legacy naming to both sides
    /// when either revision falls under it or either side asks for it
    pub fn into_request(self, policy: &LegacyPrefixConfig) -> ComparisonRequest {
        let context = NameContext::for_revisions(
            policy,
            &self.old.side.revision,
            self.new.as_ref().map(|side| &side.side.revision),
        );
        let legacy = context.side_uses_legacy_prefix
            || self.old.side.legacy_prefix
            || self.new.as_ref().is_some_and(|side| side.side.legacy_prefix);

        let old = self.old.into_side(legacy);
        match self.new {
            Some(new) => ComparisonRequest::new(old, new.into_side(legacy), self.outcomes),
            None => ComparisonRequest::single_revision(old),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shotdiff_compare::{CellPayload, ComparisonEngine, RuleSet};
    use shotdiff_core::ResultKind;

    fn parse(json: &str) -> ComparisonRequest {
        let file: RequestFile = serde_json::from_str(json).unwrap();
        file.into_request(&LegacyPrefixConfig::default())
    }

    #[test]
    fn test_two_sided_request() {
        let request = parse(
            r#"{
                "old": {"project": "mozilla-central", "revision": "aaa", "push_timestamp": 1500000000,
                        "jobs": [{"job": {"id": 1, "platform": "linux64", "result_set_id": 7},
                                  "screenshots": {"1_a.png": "u1"}}]},
                "new": {"project": "mozilla-central", "revision": "bbb",
                        "artifacts": [{"job": {"id": 2, "platform": "linux64", "result_set_id": 8},
                                       "details": [{"value": "linux64_1_a.png", "url": "u2"},
                                                   {"value": "log.txt", "url": "u3"}]}]},
                "outcomes": {"linux64": {"1_a.png": {"result": 1, "difference": "4"}},
                             "osx-10-10": null}
            }"#,
        );

        assert!(!request.single_revision_view);
        assert!(!request.old.legacy_prefix);
        assert_eq!(request.new.jobs.len(), 1);
        assert_eq!(request.new.jobs[0].screenshots.get("1_a.png").map(String::as_str), Some("u2"));
        assert!(request.outcomes["osx-10-10"].is_none());
        assert_eq!(
            request.outcomes["linux64"].as_ref().unwrap()["1_a.png"].kind(),
            Some(ResultKind::Different)
        );
    }

    #[test]
    fn test_malformed_records_degrade_to_errors() {
        let request = parse(
            r#"{
                "old": {"project": "mozilla-central", "revision": "aaa",
                        "jobs": [{"job": {"id": 1, "platform": "linux64", "result_set_id": 7},
                                  "screenshots": {"a.png": "u1", "b.png": "u2"}},
                                 {"job": {"id": 2, "platform": "osx-10-10", "result_set_id": 7},
                                  "screenshots": {"c.png": "u3", "d.png": "u4"}}]},
                "new": {"project": "mozilla-central", "revision": "bbb",
                        "jobs": [{"job": {"id": 3, "platform": "linux64", "result_set_id": 8},
                                  "screenshots": {"a.png": "u5", "b.png": "u6"}},
                                 {"job": {"id": 4, "platform": "osx-10-10", "result_set_id": 8},
                                  "screenshots": {"c.png": "u7", "d.png": "u8"}}]},
                "outcomes": {
                    "linux64": {"a.png": {"result": true}, "b.png": {"result": 0, "difference": 0}},
                    "osx-10-10": {"c.png": {"difference": 1.5}, "d.png": {"result": 1, "difference": 1.5}}
                }
            }"#,
        );

        let report = ComparisonEngine::new(RuleSet::empty()).compare(&request);
        assert_eq!(report.platforms.len(), 2);

        let linux = report.platform("linux64").unwrap();
        assert_eq!(linux.rows[0].result_kind, ResultKind::Error);
        assert_eq!(linux.rows[0].payload, CellPayload::NoResults);
        assert_eq!(linux.rows[1].result_kind, ResultKind::Similar);

        let osx = report.platform("osx-10-10").unwrap();
        assert_eq!(osx.rows[0].result_kind, ResultKind::Error);
        assert_eq!(osx.rows[0].payload, CellPayload::NoResults);
        assert_eq!(osx.rows[1].result_kind, ResultKind::Different);
        assert_eq!(osx.rows[1].payload.to_string(), "1.5");
    }

    #[test]
    fn test_missing_new_side_is_single_revision() {
        let request = parse(r#"{"old": {"project": "mozilla-central", "revision": "aaa"}}"#);
        assert!(request.single_revision_view);
        assert!(request.outcomes.is_empty());
    }

    #[test]
    fn test_legacy_project_applies_to_both_sides() {
        let request = parse(
            r#"{"old": {"project": "mozilla-central", "revision": "aaa"},
                "new": {"project": "try", "revision": "bbb"}}"#,
        );
        assert!(request.old.legacy_prefix);
        assert!(request.new.legacy_prefix);
    }
}
