//! Run driver
//!
//! Builds the AWS inventory for each selected family and sweeps them one
//! after another, in processing order, into a single [`RunSummary`].

use crate::aws::{
    AwsContext, BeanstalkClient, EcrClient, EcsClient, FromAwsContext, ImageSelection,
    SharedImageUsage, get_current_account_id,
};
use crate::config::SweepConfig;
use anyhow::{Context, Result};
use sweeper_core::{
    CleanupOrchestrator, ExclusionChain, FamilySummary, Inventory, ResourceFamily, RunSummary,
};
use tracing::info;

/// Sweep one family with the retention, exclusion and deletion settings of
/// `config`
pub async fn sweep_family<I: Inventory>(config: &SweepConfig, inventory: &I) -> Result<FamilySummary> {
    let family = inventory.family();
    let retention = config.retention(family)?;
    let chain = ExclusionChain::standard(config.protected_labels(family));
    let orchestrator =
        CleanupOrchestrator::new(config.deleter()).on_group_failure(config.group_failure_policy());

    Ok(orchestrator.run(inventory, retention, &chain).await?)
}

/// Validate `config`, then sweep every selected family against AWS.
///
/// Fails on the first enumeration error; deletion failures only show up in
/// the returned summary.
pub async fn run_sweep(config: &SweepConfig) -> Result<RunSummary> {
    config.validate()?;

    let aws = match &config.aws.aws_profile {
        Some(profile) => {
            info!(profile = %profile, "Using AWS profile");
            AwsContext::with_profile(config.region(), profile).await
        }
        None => AwsContext::new(config.region()).await,
    };

    let families = config.ordered_families();
    let needs_registry = families
        .iter()
        .any(|f| matches!(f, ResourceFamily::EcrTaggedImages | ResourceFamily::EcrUntaggedImages));
    let registry_id = match (&config.aws.registry_id, needs_registry) {
        (Some(id), _) => Some(id.clone()),
        (None, true) => Some(get_current_account_id(&aws).await?.to_string()),
        (None, false) => None,
    };

    info!(
        region = %aws.region(),
        families = ?families,
        registry_id = ?registry_id,
        dry_run = config.dry_run(),
        "Starting sweep"
    );

    let image_usage = SharedImageUsage::new();
    let mut summary = RunSummary::new(config.dry_run());
    for family in families {
        let result = match family {
            ResourceFamily::BeanstalkVersions => {
                sweep_family(config, &BeanstalkClient::from_context(&aws)).await
            }
            ResourceFamily::EcsTaskDefinitions => {
                sweep_family(config, &EcsClient::from_context(&aws)).await
            }
            ResourceFamily::EcrTaggedImages | ResourceFamily::EcrUntaggedImages => {
                let selection = if family == ResourceFamily::EcrTaggedImages {
                    ImageSelection::Tagged
                } else {
                    ImageSelection::Untagged
                };
                let registry_id = registry_id
                    .as_deref()
                    .context("No ECR registry id resolved")?;
                let client =
                    EcrClient::from_context(&aws, registry_id, selection, image_usage.clone());
                sweep_family(config, &client).await
            }
        };
        summary.push(result.with_context(|| format!("Sweep of {family} failed"))?);
    }

    info!(
        seen = summary.totals.seen,
        deleted = summary.totals.deleted,
        failed = summary.totals.failed,
        skipped = summary.totals.skipped,
        "Sweep complete"
    );
    Ok(summary)
}
