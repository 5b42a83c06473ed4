//! Inventory operations trait
//!
//! Abstracts the remote API of one resource family so the orchestrator can
//! be exercised against in-memory fakes without hitting real AWS.

use crate::batch::ItemOutcome;
use crate::family::ResourceFamily;
use crate::resource::{InUseSet, Resource};
use anyhow::Result;
use std::future::Future;

/// Remote collaborator for one resource family
pub trait Inventory: Send + Sync {
    /// Family served by this inventory
    fn family(&self) -> ResourceFamily;

    /// Largest number of resources one delete call accepts
    fn max_batch_size(&self) -> usize;

    /// List group identifiers in server order
    fn list_groups(&self) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// List every resource of a group, following pagination
    fn list_resources(&self, group: &str) -> impl Future<Output = Result<Vec<Resource>>> + Send;

    /// Collect references held by live deployments, services or task definitions
    fn list_in_use(&self) -> impl Future<Output = Result<InUseSet>> + Send;

    /// Reference a live runtime context would use to point at `resource`
    fn reference(&self, resource: &Resource) -> String {
        resource.id.clone()
    }

    /// Delete one batch of a group's resources.
    ///
    /// Returns one outcome per resource the remote side reported on. An
    /// `Err` means the whole call failed and nothing in the batch is known
    /// to be deleted.
    fn delete_batch(
        &self,
        group: &str,
        batch: &[Resource],
    ) -> impl Future<Output = Result<Vec<ItemOutcome>>> + Send;
}
