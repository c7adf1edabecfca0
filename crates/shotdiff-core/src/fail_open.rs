//! Fail-open utilities for graceful degradation
//!
//! Some inputs only refine a comparison and must never block it. Loading the
//! known-inconsistency rules is the main case: if the rule file is missing or
//! has a bad pattern, the comparison still runs, just without suppression.
//!
//! DO NOT use fail-open for:
//! - Screenshot or outcome inputs (the comparison itself)
//! - Configuration parsing (the user asked for specific behavior)

use std::future::Future;
use tracing::warn;

use crate::Result;

/// Execute an operation that should fail open
///
/// Logs the error via `tracing::warn!` on failure and returns `None`.
///
/// # Usage
///
/// ```no_run
/// use shotdiff_core::fail_open::fail_open;
/// use shotdiff_core::Result;
///
/// async fn load_rules() -> Result<Vec<String>> {
///     Ok(Vec::new())
/// }
///
/// async fn example() {
///     let rules = fail_open("known-inconsistency rules", || load_rules())
///         .await
///         .unwrap_or_default();
/// }
/// ```
pub async fn fail_open<F, Fut, T>(operation_name: &str, f: F) -> Option<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match f().await {
        Ok(val) => Some(val),
        Err(e) => {
            warn!("{} failed (fail-open): {}", operation_name, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ShotdiffError;

    #[tokio::test]
    async fn test_fail_open_success() {
        let result = fail_open("test_op", || async { Ok::<_, ShotdiffError>(42) }).await;
        assert_eq!(result, Some(42));
    }

    #[tokio::test]
    async fn test_fail_open_failure() {
        let result = fail_open("test_op", || async {
            Err::<i32, _>(ShotdiffError::InvalidRule {
                index: 0,
                pattern: "(".to_string(),
                message: "unclosed group".to_string(),
            })
        })
        .await;
        assert_eq!(result, None);
    }
}
