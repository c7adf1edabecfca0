//! Known-inconsistency rules
//!
//! A rule marks a DIFFERENT result as expected when the platform, the
//! differing pixel count and the combination name all match its patterns.
//! Rules are compiled once into an immutable [`RuleSet`] and only read after.

use regex::Regex;
use serde::{Deserialize, Serialize};
use shotdiff_core::{Result, ShotdiffError};
use tracing::info;

/// Rule as written in `known_inconsistencies.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSource {
    #[serde(alias = "platformPattern")]
    pub platform_regex: String,
    #[serde(alias = "differencePattern")]
    pub pixel_regex: String,
    #[serde(alias = "namePatterns")]
    pub name_regexes: Vec<String>,
    #[serde(default)]
    pub reason: String,
}

/// Compiled known-inconsistency rule
#[derive(Debug, Clone)]
pub struct KnownInconsistencyRule {
    platform: Regex,
    difference: Regex,
    names: Vec<Regex>,
    reason: String,
}

impl KnownInconsistencyRule {
    /// Compile one rule; `index` is its position in the rule file
    pub fn compile(index: usize, source: &RuleSource) -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| ShotdiffError::InvalidRule {
                index,
                pattern: pattern.to_string(),
                message: e.to_string(),
            })
        };

        Ok(Self {
            platform: compile(&source.platform_regex)?,
            difference: compile(&source.pixel_regex)?,
            names: source
                .name_regexes
                .iter()
                .map(|pattern| compile(pattern))
                .collect::<Result<Vec<_>>>()?,
            reason: source.reason.clone(),
        })
    }

    /// Whether the rule covers this platform, difference and name
    ///
    /// Patterns are searched, not anchored. Checks run platform, then
    /// difference, then names, stopping at the first name that matches.
    pub fn matches(&self, platform: &str, basename: &str, difference: &str) -> bool {
        self.platform.is_match(platform)
            && self.difference.is_match(difference)
            && self.names.iter().any(|name| name.is_match(basename))
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Ordered, immutable set of compiled rules
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<KnownInconsistencyRule>,
}

impl RuleSet {
    /// A rule set that matches nothing
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compile every rule; any invalid pattern rejects the whole set
    pub fn compile(sources: &[RuleSource]) -> Result<Self> {
        let rules = sources
            .iter()
            .enumerate()
            .map(|(index, source)| KnownInconsistencyRule::compile(index, source))
            .collect::<Result<Vec<_>>>()?;

        info!("Compiled {} known-inconsistency rules", rules.len());
        Ok(Self { rules })
    }

    /// Parse and compile a JSON array of rules
    pub fn from_json(json: &str) -> Result<Self> {
        let sources: Vec<RuleSource> = serde_json::from_str(json)?;
        Self::compile(&sources)
    }

    /// First rule matching the platform, basename and difference text
    pub fn find_match(
        &self,
        platform: &str,
        basename: &str,
        difference: &str,
    ) -> Option<&KnownInconsistencyRule> {
        self.rules
            .iter()
            .find(|rule| rule.matches(platform, basename, difference))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn win7_rule(reason: &str) -> RuleSource {
        RuleSource {
            platform_regex: "^windows7-32$".to_string(),
            pixel_regex: r"^[1-9]\d{0,2}$".to_string(),
            name_regexes: vec!["_noLWT".to_string()],
            reason: reason.to_string(),
        }
    }

    #[test]
    fn test_rule_matches_all_patterns() {
        let rules = RuleSet::compile(&[win7_rule("antialiasing")]).unwrap();

        let matched = rules.find_match("windows7-32", "foo_noLWT_bar", "42");
        assert_eq!(matched.map(|r| r.reason()), Some("antialiasing"));

        assert!(rules.find_match("linux64", "foo_noLWT_bar", "42").is_none());
        assert!(rules.find_match("windows7-32", "foo_darkLWT_bar", "42").is_none());
        assert!(rules.find_match("windows7-32", "foo_noLWT_bar", "4200").is_none());
        assert!(rules.find_match("windows7-32", "foo_noLWT_bar", "0").is_none());
    }

    #[test]
    fn test_first_match_wins() {
        let mut broad = win7_rule("second");
        broad.platform_regex = "windows".to_string();
        let rules = RuleSet::compile(&[win7_rule("first"), broad]).unwrap();

        let matched = rules.find_match("windows7-32", "x_noLWT", "5").unwrap();
        assert_eq!(matched.reason(), "first");

        let matched = rules.find_match("windows10-64", "x_noLWT", "5").unwrap();
        assert_eq!(matched.reason(), "second");
    }

    #[test]
    fn test_any_name_pattern_suffices() {
        let mut source = win7_rule("names");
        source.name_regexes = vec!["^never$".to_string(), "devtools".to_string()];
        let rules = RuleSet::compile(&[source]).unwrap();

        assert!(rules.find_match("windows7-32", "3_devtools_inspector", "12").is_some());
    }

    #[test]
    fn test_empty_name_list_never_matches() {
        let mut source = win7_rule("no names");
        source.name_regexes.clear();
        let rules = RuleSet::compile(&[source]).unwrap();

        assert!(rules.find_match("windows7-32", "anything", "12").is_none());
    }

    #[test]
    fn test_invalid_pattern_rejects_set() {
        let mut bad = win7_rule("bad");
        bad.name_regexes.push("(unclosed".to_string());
        let err = RuleSet::compile(&[win7_rule("good"), bad]).unwrap_err();

        match err {
            ShotdiffError::InvalidRule { index, pattern, .. } => {
                assert_eq!(index, 1);
                assert_eq!(pattern, "(unclosed");
            }
            other => panic!("Expected InvalidRule, got {:?}", other),
        }
    }

    #[test]
    fn test_from_json_uses_file_field_names() {
        let json = r#"[
            {"platformRegex": "^osx", "pixelRegex": "^\\d+$", "nameRegexes": ["_fullScreen"]}
        ]"#;
        let rules = RuleSet::from_json(json).unwrap();
        assert_eq!(rules.len(), 1);
        let matched = rules.find_match("osx-10-10", "1_fullScreen", "300").unwrap();
        assert_eq!(matched.reason(), "");
    }

    #[test]
    fn test_from_json_accepts_descriptive_field_names() {
        let json = r#"[
            {"platformPattern": "linux", "differencePattern": ".", "namePatterns": ["x"], "reason": "font hinting"}
        ]"#;
        let rules = RuleSet::from_json(json).unwrap();
        assert_eq!(
            rules.find_match("linux64", "x", "1").map(|r| r.reason()),
            Some("font hinting")
        );
    }

    #[test]
    fn test_empty_rule_set() {
        let rules = RuleSet::empty();
        assert!(rules.is_empty());
        assert!(rules.find_match("windows7-32", "foo_noLWT_bar", "42").is_none());
    }
}
