//! Plain-text change report
//!
//! Lists, per platform, every row that changed in a way no known-inconsistency
//! rule explains. Suitable as the body of a change notification email.

use shotdiff_core::{ResultKind, RevisionInfo, ShotdiffConfig};

use crate::aggregate::ComparisonRow;
use crate::engine::ComparisonReport;

const MIN_NAME_COLUMN_WIDTH: usize = 30;
const SUBJECT_REVISION_LENGTH: usize = 12;

/// Pages linked from the report header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLinks {
    /// Interactive comparison page
    pub compare_page_url: String,
    /// Repository host serving push logs
    pub pushlog_base_url: String,
}

impl Default for ReportLinks {
    fn default() -> Self {
        Self {
            compare_page_url: "https://screenshots.mattn.ca/compare/".to_string(),
            pushlog_base_url: "https://hg.mozilla.org".to_string(),
        }
    }
}

impl From<&ShotdiffConfig> for ReportLinks {
    fn from(config: &ShotdiffConfig) -> Self {
        Self {
            compare_page_url: config.compare_page_url.clone(),
            pushlog_base_url: config.pushlog_base_url.clone(),
        }
    }
}

impl ReportLinks {
    pub fn details_url(&self, old: &RevisionInfo, new: &RevisionInfo) -> String {
        format!(
            "{}?oldProject={}&oldRev={}&newProject={}&newRev={}",
            self.compare_page_url, old.project, old.revision, new.project, new.revision
        )
    }

    /// Push log between the revisions; only meaningful within one project
    pub fn pushlog_url(&self, old: &RevisionInfo, new: &RevisionInfo) -> Option<String> {
        (old.project == new.project).then(|| {
            format!(
                "{}/{}/pushloghtml?fromchange={}&tochange={}",
                self.pushlog_base_url.trim_end_matches('/'),
                old.project,
                old.revision,
                new.revision
            )
        })
    }
}

/// Rendered change notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeReport {
    pub subject: String,
    pub body: String,
}

impl ChangeReport {
    /// Render the report, or `None` when nothing reportable changed
    pub fn render(
        old: &RevisionInfo,
        new: &RevisionInfo,
        report: &ComparisonReport,
        links: &ReportLinks,
    ) -> Option<Self> {
        let mut sections = String::new();

        for platform in &report.platforms {
            let rows: Vec<&ComparisonRow> = platform
                .rows
                .iter()
                .filter(|row| is_reportable(row))
                .collect();
            if rows.is_empty() {
                continue;
            }

            let width = rows
                .iter()
                .map(|row| row.display_name.len())
                .fold(MIN_NAME_COLUMN_WIDTH, usize::max);

            sections.push_str(&format!("== {} ==\n", platform.summary.platform));
            for row in rows {
                sections.push_str(&format!(
                    "{:<width$}  {}",
                    row.display_name,
                    row.result_kind,
                    width = width
                ));
                if row.result_kind == ResultKind::Different {
                    sections.push_str(&format!(" ({})", row.payload));
                }
                sections.push('\n');
            }
            sections.push_str("\n\n");
        }

        if sections.is_empty() {
            return None;
        }

        let mut body = String::new();
        if old.project == new.project {
            body.push_str(&format!("Project:       {}\n", old.project));
        } else {
            body.push_str(&format!("Projects:      {} to {}\n", old.project, new.project));
        }
        body.push_str(&format!("Base revision: {}\n", revision_line(old)));
        body.push_str(&format!("New revision:  {}\n", revision_line(new)));
        body.push_str(&format!("Details:       {}\n", links.details_url(old, new)));
        if let Some(pushlog) = links.pushlog_url(old, new) {
            body.push_str(&format!("Pushlog:       {}\n", pushlog));
        }
        body.push('\n');
        body.push_str(&sections);

        Some(Self {
            subject: format!(
                "{} Screenshot Changes: {} to {}",
                new.project,
                short_revision(&old.revision),
                short_revision(&new.revision)
            ),
            body,
        })
    }
}

/// Changed rows that no rule explains
fn is_reportable(row: &ComparisonRow) -> bool {
    !matches!(row.result_kind, ResultKind::Similar | ResultKind::NotCompared)
        && !row.is_known_inconsistency()
}

fn revision_line(revision: &RevisionInfo) -> String {
    match revision.push_time() {
        Some(time) => format!("{} ({})", revision.revision, time.format("%Y-%m-%d %H:%M:%S UTC")),
        None => revision.revision.clone(),
    }
}

fn short_revision(revision: &str) -> &str {
    match revision.char_indices().nth(SUBJECT_REVISION_LENGTH) {
        Some((index, _)) => &revision[..index],
        None => revision,
    }
}
