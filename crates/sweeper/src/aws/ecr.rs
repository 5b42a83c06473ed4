//! ECR image cleanup
//!
//! Two inventories share this client, selected by [`ImageSelection`]:
//!
//! - tagged: one resource per tag, deleted by tag. Untagging leaves the
//!   image in place while other tags still point at it.
//! - untagged: one resource per image digest, deleted by digest.
//!
//! Images referenced by any ACTIVE ECS task definition are in use. Both
//! inventories read that set through one [`SharedImageUsage`], so it is
//! loaded once per run.

use crate::aws::context::{AwsContext, FromAwsContext};
use crate::aws::ecs::EcsClient;
use crate::aws::error::classify_sdk_error;
use anyhow::{Context, Result};
use aws_sdk_ecr::Client;
use aws_sdk_ecr::types::{
    DescribeImagesFilter, ImageDetail, ImageFailure, ImageFailureCode, ImageIdentifier, TagStatus,
};
use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;
use std::future::Future;
use std::sync::Arc;
use sweeper_core::defaults::ECR_BATCH_DELETE_LIMIT;
use sweeper_core::{
    InUseSet, Inventory, ItemOutcome, Page, Recency, Resource, ResourceFamily, collect_pages,
};
use tracing::{debug, info, warn};

/// Which images an [`EcrClient`] sweeps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSelection {
    Tagged,
    Untagged,
}

impl ImageSelection {
    fn tag_status(self) -> TagStatus {
        match self {
            ImageSelection::Tagged => TagStatus::Tagged,
            ImageSelection::Untagged => TagStatus::Untagged,
        }
    }

    fn family(self) -> ResourceFamily {
        match self {
            ImageSelection::Tagged => ResourceFamily::EcrTaggedImages,
            ImageSelection::Untagged => ResourceFamily::EcrUntaggedImages,
        }
    }
}

/// Registry hostname for private ECR repositories
pub fn registry_host(registry_id: &str, region: &str) -> String {
    format!("{registry_id}.dkr.ecr.{region}.amazonaws.com")
}

/// Image reference a task definition would use for `resource`.
///
/// Tagged resources resolve to `host/repo:tag`, untagged ones to
/// `host/repo@digest`.
pub fn image_reference(host: &str, selection: ImageSelection, resource: &Resource) -> String {
    match selection {
        ImageSelection::Tagged => format!("{host}/{}:{}", resource.group, resource.id),
        ImageSelection::Untagged => format!("{host}/{}@{}", resource.group, resource.id),
    }
}

fn pushed_at(detail: &ImageDetail) -> DateTime<Utc> {
    detail
        .image_pushed_at()
        .and_then(|dt| DateTime::from_timestamp(dt.secs(), dt.subsec_nanos()))
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// Turn DescribeImages details into resources for one repository
fn image_resources(repository: &str, selection: ImageSelection, details: &[ImageDetail]) -> Vec<Resource> {
    let mut resources = Vec::new();
    for detail in details {
        let recency = Recency::CreatedAt(pushed_at(detail));
        match selection {
            ImageSelection::Tagged => {
                for tag in detail.image_tags() {
                    resources.push(Resource::new(repository, tag, recency).with_label(tag));
                }
            }
            ImageSelection::Untagged => {
                if let Some(digest) = detail.image_digest() {
                    resources.push(Resource::new(repository, digest, recency));
                }
            }
        }
    }
    resources
}

/// Image references in use, loaded on first request and shared by clones
#[derive(Debug, Clone, Default)]
pub struct SharedImageUsage {
    cell: Arc<OnceCell<InUseSet>>,
}

impl SharedImageUsage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached set, running `load` only if no clone has loaded it
    /// yet. A failed load leaves the cell empty.
    pub async fn get_or_load<F, Fut>(&self, load: F) -> Result<InUseSet>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<InUseSet>>,
    {
        self.cell.get_or_try_init(load).await.cloned()
    }
}

/// ECR client bound to one registry and one [`ImageSelection`]
#[derive(Clone)]
pub struct EcrClient {
    client: Client,
    ecs: EcsClient,
    usage: SharedImageUsage,
    registry_id: String,
    host: String,
    selection: ImageSelection,
}

impl EcrClient {
    /// Create an ECR client from a pre-loaded AWS context. Clients built
    /// with clones of the same `usage` share one in-use lookup.
    pub fn from_context(
        ctx: &AwsContext,
        registry_id: &str,
        selection: ImageSelection,
        usage: SharedImageUsage,
    ) -> Self {
        Self {
            client: ctx.ecr_client(),
            ecs: EcsClient::from_context(ctx),
            usage,
            registry_id: registry_id.to_string(),
            host: registry_host(registry_id, ctx.region()),
            selection,
        }
    }

    fn image_id(&self, id: &str) -> ImageIdentifier {
        match self.selection {
            ImageSelection::Tagged => ImageIdentifier::builder().image_tag(id).build(),
            ImageSelection::Untagged => ImageIdentifier::builder().image_digest(id).build(),
        }
    }

    fn id_of<'a>(&self, image_id: &'a ImageIdentifier) -> Option<&'a str> {
        match self.selection {
            ImageSelection::Tagged => image_id.image_tag(),
            ImageSelection::Untagged => image_id.image_digest(),
        }
    }

    fn failure_outcome(&self, failure: &ImageFailure) -> Option<ItemOutcome> {
        let id = self.id_of(failure.image_id()?)?;
        let outcome = match failure.failure_code() {
            // Already gone
            Some(ImageFailureCode::ImageNotFound) => ItemOutcome::deleted(id),
            code => {
                let reason = match (code, failure.failure_reason()) {
                    (Some(code), Some(reason)) => format!("{}: {reason}", code.as_str()),
                    (Some(code), None) => code.as_str().to_string(),
                    (None, Some(reason)) => reason.to_string(),
                    (None, None) => "unknown failure".to_string(),
                };
                ItemOutcome::failed(id, reason)
            }
        };
        Some(outcome)
    }
}

impl Inventory for EcrClient {
    fn family(&self) -> ResourceFamily {
        self.selection.family()
    }

    fn max_batch_size(&self) -> usize {
        ECR_BATCH_DELETE_LIMIT
    }

    async fn list_groups(&self) -> Result<Vec<String>> {
        collect_pages(|cursor| async move {
            let response = self
                .client
                .describe_repositories()
                .registry_id(&self.registry_id)
                .set_next_token(cursor)
                .send()
                .await
                .map_err(|e| classify_sdk_error(&e))
                .context("Failed to describe repositories")?;
            let names = response
                .repositories()
                .iter()
                .filter_map(|r| r.repository_name())
                .map(str::to_string)
                .collect();
            Ok::<_, anyhow::Error>(Page::new(names, response.next_token()))
        })
        .await
    }

    async fn list_resources(&self, group: &str) -> Result<Vec<Resource>> {
        let filter = DescribeImagesFilter::builder()
            .tag_status(self.selection.tag_status())
            .build();

        collect_pages(|cursor| {
            let filter = filter.clone();
            async move {
                let response = self
                    .client
                    .describe_images()
                    .registry_id(&self.registry_id)
                    .repository_name(group)
                    .filter(filter)
                    .set_next_token(cursor)
                    .send()
                    .await
                    .map_err(|e| classify_sdk_error(&e))
                    .with_context(|| format!("Failed to describe images of {group}"))?;
                Ok::<_, anyhow::Error>(Page::new(
                    image_resources(group, self.selection, response.image_details()),
                    response.next_token(),
                ))
            }
        })
        .await
    }

    async fn list_in_use(&self) -> Result<InUseSet> {
        self.usage
            .get_or_load(|| self.ecs.active_task_definition_images())
            .await
    }

    fn reference(&self, resource: &Resource) -> String {
        image_reference(&self.host, self.selection, resource)
    }

    async fn delete_batch(&self, group: &str, batch: &[Resource]) -> Result<Vec<ItemOutcome>> {
        let image_ids = batch.iter().map(|r| self.image_id(&r.id)).collect();

        let response = self
            .client
            .batch_delete_image()
            .registry_id(&self.registry_id)
            .repository_name(group)
            .set_image_ids(Some(image_ids))
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e))
            .with_context(|| format!("Failed to delete images from {group}"))?;

        let mut outcomes: Vec<ItemOutcome> = response
            .image_ids()
            .iter()
            .filter_map(|image_id| self.id_of(image_id))
            .map(ItemOutcome::deleted)
            .collect();
        for failure in response.failures() {
            match self.failure_outcome(failure) {
                Some(outcome) => outcomes.push(outcome),
                None => warn!(repository = %group, failure = ?failure, "Unattributable image failure"),
            }
        }

        debug!(repository = %group, requested = batch.len(), reported = outcomes.len(), "Batch delete returned");
        info!(repository = %group, count = batch.len(), selection = ?self.selection, "Deleted image batch");
        Ok(outcomes)
    }
}
