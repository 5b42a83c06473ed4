//! Shared utilities for AWS integration tests
//!
//! Region detection and unique names, plus a context loader that fails with
//! a readable message when no credentials are configured.

#![allow(dead_code)]

pub use sweeper_test_utils::aws::{get_test_region, test_group_name, test_run_id};

use sweeper::aws::{AccountId, AwsContext, get_current_account_id};

/// Load a context for the test region and make sure credentials work
pub async fn test_context() -> (AwsContext, AccountId) {
    let ctx = AwsContext::new(&get_test_region()).await;
    let account = get_current_account_id(&ctx)
        .await
        .expect("AWS credentials required - set AWS_PROFILE or AWS_ACCESS_KEY_ID");
    (ctx, account)
}
