//! ECS task definition revisions
//!
//! Groups are ACTIVE task definition families, resources are their ACTIVE
//! revisions. ListTaskDefinitions carries no timestamps, so revisions are
//! ordered by the number after the last `:` of the ARN. A revision is in use
//! while any service in any cluster runs it.

use crate::aws::context::{AwsContext, FromAwsContext};
use crate::aws::error::classify_sdk_error;
use anyhow::{Context, Result};
use aws_sdk_ecs::Client;
use aws_sdk_ecs::types::{SortOrder, TaskDefinitionFamilyStatus, TaskDefinitionStatus};
use sweeper_core::defaults::{DESCRIBE_THROTTLE_DELAY, ECS_DESCRIBE_SERVICES_LIMIT};
use sweeper_core::{
    InUseSet, Inventory, ItemOutcome, Page, Recency, Resource, ResourceFamily, collect_pages,
};
use tracing::{debug, info, warn};

/// Split a task definition ARN (or `family:revision`) into family and revision.
///
/// ```
/// use sweeper::aws::ecs::parse_task_definition;
///
/// assert_eq!(
///     parse_task_definition("arn:aws:ecs:us-east-1:123456789012:task-definition/web:42"),
///     Some(("web", 42))
/// );
/// ```
pub fn parse_task_definition(arn: &str) -> Option<(&str, u64)> {
    let name = arn.rsplit_once('/').map_or(arn, |(_, name)| name);
    let (family, revision) = name.rsplit_once(':')?;
    if family.is_empty() {
        return None;
    }
    Some((family, revision.parse().ok()?))
}

/// ECS client for task definition cleanup and image usage lookups
#[derive(Clone)]
pub struct EcsClient {
    client: Client,
}

impl FromAwsContext for EcsClient {
    fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.ecs_client(),
        }
    }
}

impl EcsClient {
    /// ARNs of ACTIVE task definitions, optionally restricted to a family prefix
    async fn list_active_task_definitions(&self, family_prefix: Option<&str>) -> Result<Vec<String>> {
        collect_pages(|cursor| async move {
            let response = self
                .client
                .list_task_definitions()
                .set_family_prefix(family_prefix.map(str::to_string))
                .status(TaskDefinitionStatus::Active)
                .sort(SortOrder::Desc)
                .set_next_token(cursor)
                .send()
                .await
                .map_err(|e| classify_sdk_error(&e))
                .context("Failed to list task definitions")?;
            Ok::<_, anyhow::Error>(Page::new(
                response.task_definition_arns().to_vec(),
                response.next_token(),
            ))
        })
        .await
    }

    async fn list_clusters(&self) -> Result<Vec<String>> {
        collect_pages(|cursor| async move {
            let response = self
                .client
                .list_clusters()
                .set_next_token(cursor)
                .send()
                .await
                .map_err(|e| classify_sdk_error(&e))
                .context("Failed to list clusters")?;
            Ok::<_, anyhow::Error>(Page::new(response.cluster_arns().to_vec(), response.next_token()))
        })
        .await
    }

    async fn list_services(&self, cluster: &str) -> Result<Vec<String>> {
        collect_pages(|cursor| async move {
            let response = self
                .client
                .list_services()
                .cluster(cluster)
                .set_next_token(cursor)
                .send()
                .await
                .map_err(|e| classify_sdk_error(&e))
                .with_context(|| format!("Failed to list services of cluster {cluster}"))?;
            Ok::<_, anyhow::Error>(Page::new(response.service_arns().to_vec(), response.next_token()))
        })
        .await
    }

    /// Task definition ARNs currently run by services, across every cluster
    pub async fn service_task_definitions(&self) -> Result<InUseSet> {
        let mut in_use = InUseSet::new();

        for cluster in self.list_clusters().await? {
            let services = self.list_services(&cluster).await?;
            for chunk in services.chunks(ECS_DESCRIBE_SERVICES_LIMIT) {
                let response = self
                    .client
                    .describe_services()
                    .cluster(&cluster)
                    .set_services(Some(chunk.to_vec()))
                    .send()
                    .await
                    .map_err(|e| classify_sdk_error(&e))
                    .with_context(|| format!("Failed to describe services of cluster {cluster}"))?;

                for service in response.services() {
                    if let Some(arn) = service.task_definition() {
                        in_use.insert(arn);
                    }
                }
            }
            debug!(cluster = %cluster, services = services.len(), "Scanned cluster");
        }

        Ok(in_use)
    }

    /// Container images referenced by any ACTIVE task definition.
    ///
    /// One DescribeTaskDefinition call per revision, spaced out to stay under
    /// the API rate limit.
    pub async fn active_task_definition_images(&self) -> Result<InUseSet> {
        let arns = self.list_active_task_definitions(None).await?;
        info!(count = arns.len(), "Describing active task definitions for image usage");

        let mut images = InUseSet::new();
        for (index, arn) in arns.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(DESCRIBE_THROTTLE_DELAY).await;
            }
            let response = self
                .client
                .describe_task_definition()
                .task_definition(arn)
                .send()
                .await
                .map_err(|e| classify_sdk_error(&e))
                .with_context(|| format!("Failed to describe task definition {arn}"))?;

            let containers = response
                .task_definition()
                .map(|td| td.container_definitions())
                .unwrap_or_default();
            images.extend(containers.iter().filter_map(|c| c.image()));
        }

        Ok(images)
    }

    async fn deregister(&self, arn: &str) -> ItemOutcome {
        match self
            .client
            .deregister_task_definition()
            .task_definition(arn)
            .send()
            .await
        {
            Ok(_) => {
                info!(task_definition = %arn, "Deregistered");
                ItemOutcome::deleted(arn)
            }
            Err(e) => {
                let err = classify_sdk_error(&e);
                warn!(task_definition = %arn, code = err.code().unwrap_or("-"), error = %err, "Failed to deregister");
                ItemOutcome::failed(arn, err.to_string())
            }
        }
    }
}

impl Inventory for EcsClient {
    fn family(&self) -> ResourceFamily {
        ResourceFamily::EcsTaskDefinitions
    }

    /// Deregistration is one call per revision
    fn max_batch_size(&self) -> usize {
        usize::MAX
    }

    async fn list_groups(&self) -> Result<Vec<String>> {
        collect_pages(|cursor| async move {
            let response = self
                .client
                .list_task_definition_families()
                .status(TaskDefinitionFamilyStatus::Active)
                .set_next_token(cursor)
                .send()
                .await
                .map_err(|e| classify_sdk_error(&e))
                .context("Failed to list task definition families")?;
            Ok::<_, anyhow::Error>(Page::new(response.families().to_vec(), response.next_token()))
        })
        .await
    }

    async fn list_resources(&self, group: &str) -> Result<Vec<Resource>> {
        let arns = self.list_active_task_definitions(Some(group)).await?;

        // familyPrefix also matches longer family names
        Ok(arns
            .into_iter()
            .filter_map(|arn| {
                let (family, revision) = parse_task_definition(&arn)?;
                (family == group).then(|| Resource::new(group, &arn, Recency::Revision(revision)))
            })
            .collect())
    }

    async fn list_in_use(&self) -> Result<InUseSet> {
        self.service_task_definitions().await
    }

    async fn delete_batch(&self, _group: &str, batch: &[Resource]) -> Result<Vec<ItemOutcome>> {
        let mut outcomes = Vec::with_capacity(batch.len());
        for resource in batch {
            outcomes.push(self.deregister(&resource.id).await);
        }
        Ok(outcomes)
    }
}
