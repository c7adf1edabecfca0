//! Screenshot artifacts from upstream job details

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::debug;

static JOB_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^-_]+[-_]").expect("job token pattern is valid"));

/// Artifacts uploaded by test harness failures, not by the screenshot run
const FAILURE_SCREENSHOT_PREFIX: &str = "mozilla-test-fail-";

/// One entry of a job's detail listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDetail {
    /// Artifact file name
    pub value: String,
    /// Download location, absent for non-file details
    #[serde(default)]
    pub url: Option<String>,
}

impl JobDetail {
    pub fn new(value: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            url: Some(url.into()),
        }
    }
}

/// Whether a job detail is a screenshot from the screenshot run
pub fn is_screenshot_artifact(detail: &JobDetail) -> bool {
    detail.url.as_deref().is_some_and(|url| !url.is_empty())
        && detail.value.ends_with(".png")
        && !detail.value.starts_with(FAILURE_SCREENSHOT_PREFIX)
}

/// Artifact file name without its leading job token
///
/// `linux64_101_tabs.png` and `linux64-101_tabs.png` both become `101_tabs.png`.
pub fn strip_job_token(value: &str) -> &str {
    match JOB_TOKEN.find(value) {
        Some(m) => &value[m.end()..],
        None => value,
    }
}

/// Raw combination name to image location for one job's details
///
/// A later detail with the same name replaces an earlier one.
pub fn extract_screenshot_artifacts(details: &[JobDetail]) -> BTreeMap<String, String> {
    let mut screenshots = BTreeMap::new();
    for detail in details {
        if !is_screenshot_artifact(detail) {
            continue;
        }
        let Some(url) = &detail.url else {
            continue;
        };
        let name = strip_job_token(&detail.value).to_string();
        if let Some(previous) = screenshots.insert(name, url.clone()) {
            debug!("Duplicate screenshot artifact {}, replacing {}", detail.value, previous);
        }
    }
    screenshots
}
