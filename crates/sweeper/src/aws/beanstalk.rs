//! Elastic Beanstalk application versions
//!
//! Groups are applications, resources are their versions ordered by
//! creation date. A version is in use while any environment of the same
//! application is deployed with it.

use crate::aws::context::{AwsContext, FromAwsContext};
use crate::aws::error::classify_sdk_error;
use anyhow::{Context, Result};
use aws_sdk_elasticbeanstalk::Client;
use chrono::DateTime;
use sweeper_core::defaults::BEANSTALK_MAX_RECORDS;
use sweeper_core::{
    InUseSet, Inventory, ItemOutcome, Page, Recency, Resource, ResourceFamily, collect_pages,
};
use tracing::{info, warn};

/// In-use reference for a version label of an application
pub fn deployed_version(application: &str, label: &str) -> String {
    format!("{application}/{label}")
}

/// Beanstalk client for application version cleanup
#[derive(Clone)]
pub struct BeanstalkClient {
    client: Client,
}

impl FromAwsContext for BeanstalkClient {
    fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.elasticbeanstalk_client(),
        }
    }
}

impl BeanstalkClient {
    async fn delete_version(&self, application: &str, label: &str) -> ItemOutcome {
        let result = self
            .client
            .delete_application_version()
            .application_name(application)
            .version_label(label)
            .delete_source_bundle(true)
            .send()
            .await;

        match result {
            Ok(_) => {
                info!(application = %application, version = %label, "Deleted application version");
                ItemOutcome::deleted(label)
            }
            Err(e) => {
                let err = classify_sdk_error(&e);
                if err.is_not_found() {
                    return ItemOutcome::deleted(label);
                }
                warn!(application = %application, version = %label, code = err.code().unwrap_or("-"), error = %err, "Failed to delete application version");
                ItemOutcome::failed(label, err.to_string())
            }
        }
    }
}

impl Inventory for BeanstalkClient {
    fn family(&self) -> ResourceFamily {
        ResourceFamily::BeanstalkVersions
    }

    /// Versions are deleted one call at a time
    fn max_batch_size(&self) -> usize {
        usize::MAX
    }

    async fn list_groups(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .describe_applications()
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e))
            .context("Failed to describe applications")?;

        Ok(response
            .applications()
            .iter()
            .filter_map(|app| app.application_name())
            .map(str::to_string)
            .collect())
    }

    async fn list_resources(&self, group: &str) -> Result<Vec<Resource>> {
        collect_pages(|cursor| async move {
            let response = self
                .client
                .describe_application_versions()
                .application_name(group)
                .max_records(BEANSTALK_MAX_RECORDS)
                .set_next_token(cursor)
                .send()
                .await
                .map_err(|e| classify_sdk_error(&e))
                .with_context(|| format!("Failed to describe versions of {group}"))?;

            let versions = response
                .application_versions()
                .iter()
                .filter_map(|version| {
                    let label = version.version_label()?;
                    let created = version
                        .date_created()
                        .and_then(|dt| DateTime::from_timestamp(dt.secs(), dt.subsec_nanos()))
                        .unwrap_or(DateTime::UNIX_EPOCH);
                    Some(Resource::new(group, label, Recency::CreatedAt(created)))
                })
                .collect();
            Ok::<_, anyhow::Error>(Page::new(versions, response.next_token()))
        })
        .await
    }

    async fn list_in_use(&self) -> Result<InUseSet> {
        let environments = collect_pages(|cursor| async move {
            let response = self
                .client
                .describe_environments()
                .include_deleted(false)
                .set_next_token(cursor)
                .send()
                .await
                .map_err(|e| classify_sdk_error(&e))
                .context("Failed to describe environments")?;
            Ok::<_, anyhow::Error>(Page::new(response.environments().to_vec(), response.next_token()))
        })
        .await?;

        Ok(environments
            .iter()
            .filter_map(|env| Some(deployed_version(env.application_name()?, env.version_label()?)))
            .collect())
    }

    fn reference(&self, resource: &Resource) -> String {
        deployed_version(&resource.group, &resource.id)
    }

    async fn delete_batch(&self, group: &str, batch: &[Resource]) -> Result<Vec<ItemOutcome>> {
        let mut outcomes = Vec::with_capacity(batch.len());
        for resource in batch {
            outcomes.push(self.delete_version(group, &resource.id).await);
        }
        Ok(outcomes)
    }
}
