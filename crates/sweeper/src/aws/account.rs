//! Caller identity

use crate::aws::context::AwsContext;
use crate::aws::error::classify_sdk_error;
use anyhow::{Context, Result};
use tracing::info;

/// 12-digit AWS account ID, also the default ECR registry ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display, derive_more::Deref)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        AccountId(id.into())
    }
}

/// Fetch the account the current credentials belong to via STS
/// GetCallerIdentity.
///
/// Needs no IAM permissions, so it doubles as an early credentials check.
pub async fn get_current_account_id(ctx: &AwsContext) -> Result<AccountId> {
    let identity = ctx
        .sts_client()
        .get_caller_identity()
        .send()
        .await
        .map_err(|e| classify_sdk_error(&e))
        .context("Failed to get AWS caller identity - check credentials")?;

    let account = identity
        .account()
        .context("No account ID returned from STS GetCallerIdentity")?;

    info!(account_id = %account, "AWS account validated");

    Ok(AccountId::new(account))
}
