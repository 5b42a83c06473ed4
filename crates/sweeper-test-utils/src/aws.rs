//! AWS test utilities
//!
//! Region detection and unique naming for the `#[ignore]`d smoke tests that
//! talk to a real account.

use chrono::Utc;

/// Get the AWS region for smoke tests.
///
/// Checks `AWS_REGION`, then `AWS_DEFAULT_REGION`, then falls back to
/// `us-east-1`.
pub fn get_test_region() -> String {
    std::env::var("AWS_REGION")
        .or_else(|_| std::env::var("AWS_DEFAULT_REGION"))
        .unwrap_or_else(|_| "us-east-1".to_string())
}

/// Generate a unique run ID.
///
/// Format: `test-{timestamp_ms}-{counter}`.
///
/// ```
/// use sweeper_test_utils::aws::test_run_id;
///
/// assert!(test_run_id().starts_with("test-"));
/// ```
pub fn test_run_id() -> String {
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);

    let ts = Utc::now().timestamp_millis();
    let counter = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("test-{}-{}", ts, counter)
}

/// Name for a throwaway ECR repository or task definition family
pub fn test_group_name() -> String {
    format!("sweeper-{}", test_run_id())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_id_format() {
        let run_id = test_run_id();
        let parts: Vec<&str> = run_id.strip_prefix("test-").unwrap().split('-').collect();
        assert_eq!(parts.len(), 2);
        parts[0].parse::<i64>().expect("Should be valid timestamp");
        parts[1].parse::<u32>().expect("Should be valid counter");
    }

    #[test]
    fn test_run_id_unique() {
        assert_ne!(test_run_id(), test_run_id());
    }

    #[test]
    fn test_group_name_is_prefixed() {
        assert!(test_group_name().starts_with("sweeper-test-"));
    }
}
