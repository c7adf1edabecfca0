//! Combination-name canonicalization
//!
//! Older revisions (and try pushes) name combinations with a leading free-text
//! segment, e.g. `primaryUI_101_tabsOutsideTitlebar`, while current ones start
//! at the numbered part, `101_tabsOutsideTitlebar`. Canonical keys drop the
//! segment so both sides join.

use regex::Regex;
use shotdiff_core::{LegacyPrefixConfig, RevisionInfo};
use std::sync::LazyLock;

static LEGACY_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.*?(\d+_)").expect("legacy prefix pattern is valid"));

/// Naming context for one side of a comparison
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NameContext {
    /// Names may carry the legacy free-text prefix
    pub side_uses_legacy_prefix: bool,
}

impl NameContext {
    pub fn legacy() -> Self {
        Self {
            side_uses_legacy_prefix: true,
        }
    }

    pub fn current() -> Self {
        Self::default()
    }

    /// Context for a comparison of `old` against `new`
    ///
    /// The legacy naming is assumed for the whole comparison as soon as either
    /// revision falls under it; stripping an already-canonical name is a no-op.
    pub fn for_revisions(
        policy: &LegacyPrefixConfig,
        old: &RevisionInfo,
        new: Option<&RevisionInfo>,
    ) -> Self {
        Self {
            side_uses_legacy_prefix: policy.applies_to(old)
                || new.is_some_and(|rev| policy.applies_to(rev)),
        }
    }
}

/// Canonicalize a raw combination name
///
/// Under the legacy context, everything before the first `<digits>_` run is
/// dropped. Names without such a run are returned unchanged.
pub fn normalize(raw_name: &str, context: NameContext) -> String {
    if !context.side_uses_legacy_prefix {
        return raw_name.to_string();
    }
    LEGACY_PREFIX.replace(raw_name, "${1}").into_owned()
}

/// Combination key without its image extension
pub fn display_name(combination_key: &str) -> &str {
    combination_key
        .strip_suffix(".png")
        .unwrap_or(combination_key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_legacy_prefix() {
        assert_eq!(
            normalize("primaryUI_101_tabsOutsideTitlebar", NameContext::legacy()),
            "101_tabsOutsideTitlebar"
        );
    }

    #[test]
    fn test_current_context_is_passthrough() {
        assert_eq!(
            normalize("primaryUI_101_tabsOutsideTitlebar", NameContext::current()),
            "primaryUI_101_tabsOutsideTitlebar"
        );
        assert_eq!(
            normalize("101_tabsOutsideTitlebar", NameContext::current()),
            "101_tabsOutsideTitlebar"
        );
    }

    #[test]
    fn test_no_digit_run_is_unchanged() {
        for context in [NameContext::legacy(), NameContext::current()] {
            assert_eq!(normalize("allToolbars", context), "allToolbars");
            assert_eq!(normalize("noDigits_here.png", context), "noDigits_here.png");
        }
    }

    #[test]
    fn test_idempotent() {
        let names = [
            "primaryUI_101_tabsOutsideTitlebar_twoPinnedWithOverflow_normal_allToolbars_darkLWT.png",
            "101_tabsOutsideTitlebar",
            "a_1_b_2_c",
            "devtools_3_inspector_2_x",
            "allToolbars",
            "",
        ];
        for context in [NameContext::legacy(), NameContext::current()] {
            for name in names {
                let once = normalize(name, context);
                assert_eq!(normalize(&once, context), once, "name: {}", name);
            }
        }
    }

    #[test]
    fn test_context_for_revisions() {
        let policy = LegacyPrefixConfig::default();
        let central = RevisionInfo::new("mozilla-central", "abc").with_push_timestamp(1500000000);
        let try_push = RevisionInfo::new("try", "def").with_push_timestamp(1500000000);

        assert_eq!(
            NameContext::for_revisions(&policy, &central, Some(&central)),
            NameContext::current()
        );
        assert_eq!(
            NameContext::for_revisions(&policy, &central, Some(&try_push)),
            NameContext::legacy()
        );
        assert_eq!(
            NameContext::for_revisions(&policy, &try_push, None),
            NameContext::legacy()
        );
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("a.png"), "a");
        assert_eq!(display_name("a"), "a");
        assert_eq!(display_name("a.png.png"), "a.png");
    }
}
