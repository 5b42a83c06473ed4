//! In-memory inventory with scriptable failures
//!
//! Groups are returned in insertion order. Successful deletions are
//! remembered, so a second run over the same fake sees the post-delete state.

use anyhow::{Result, bail};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use sweeper_core::{InUseSet, Inventory, ItemOutcome, Resource, ResourceFamily};

/// Scriptable [`Inventory`] backed by plain vectors
pub struct FakeInventory {
    family: ResourceFamily,
    max_batch_size: usize,
    groups: Vec<(String, Vec<Resource>)>,
    in_use: InUseSet,
    reference: fn(&Resource) -> String,
    fail_group_listing: bool,
    fail_in_use: bool,
    failing_groups: HashSet<String>,
    rejected: HashMap<String, String>,
    failing_calls: HashSet<usize>,
    calls: Mutex<Vec<Vec<String>>>,
    deleted: Mutex<HashSet<String>>,
}

impl FakeInventory {
    pub fn new(family: ResourceFamily) -> Self {
        Self {
            family,
            max_batch_size: 100,
            groups: Vec::new(),
            in_use: InUseSet::new(),
            reference: |r| r.id.clone(),
            fail_group_listing: false,
            fail_in_use: false,
            failing_groups: HashSet::new(),
            rejected: HashMap::new(),
            failing_calls: HashSet::new(),
            calls: Mutex::new(Vec::new()),
            deleted: Mutex::new(HashSet::new()),
        }
    }

    pub fn with_group(mut self, name: &str, resources: Vec<Resource>) -> Self {
        self.groups.push((name.to_string(), resources));
        self
    }

    pub fn with_in_use<S: Into<String>>(mut self, references: impl IntoIterator<Item = S>) -> Self {
        self.in_use.extend(references.into_iter().map(Into::into));
        self
    }

    pub fn with_batch_ceiling(mut self, ceiling: usize) -> Self {
        self.max_batch_size = ceiling;
        self
    }

    /// Derive in-use references with `reference` instead of the bare id
    pub fn with_reference(mut self, reference: fn(&Resource) -> String) -> Self {
        self.reference = reference;
        self
    }

    pub fn failing_group_listing(mut self) -> Self {
        self.fail_group_listing = true;
        self
    }

    pub fn failing_in_use(mut self) -> Self {
        self.fail_in_use = true;
        self
    }

    /// Make `list_resources` fail for one group
    pub fn failing_group(mut self, name: &str) -> Self {
        self.failing_groups.insert(name.to_string());
        self
    }

    /// Report `id` as failed whenever it is part of a delete call
    pub fn rejecting(mut self, id: &str, reason: &str) -> Self {
        self.rejected.insert(id.to_string(), reason.to_string());
        self
    }

    /// Fail the whole `n`th delete call (zero-based)
    pub fn failing_call(mut self, n: usize) -> Self {
        self.failing_calls.insert(n);
        self
    }

    /// Ids passed to each delete call, in call order
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Every id passed to any delete call
    pub fn attempted(&self) -> HashSet<String> {
        self.calls().into_iter().flatten().collect()
    }

    /// Ids the fake considers deleted
    pub fn deleted(&self) -> HashSet<String> {
        self.deleted.lock().map(|d| d.clone()).unwrap_or_default()
    }
}

impl Inventory for FakeInventory {
    fn family(&self) -> ResourceFamily {
        self.family
    }

    fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    async fn list_groups(&self) -> Result<Vec<String>> {
        if self.fail_group_listing {
            bail!("AccessDenied: not authorized to list groups");
        }
        Ok(self.groups.iter().map(|(name, _)| name.clone()).collect())
    }

    async fn list_resources(&self, group: &str) -> Result<Vec<Resource>> {
        if self.failing_groups.contains(group) {
            bail!("ServerException: listing {group} failed");
        }
        let deleted = self.deleted();
        Ok(self
            .groups
            .iter()
            .filter(|(name, _)| name == group)
            .flat_map(|(_, resources)| resources.iter())
            .filter(|r| !deleted.contains(&r.id))
            .cloned()
            .collect())
    }

    async fn list_in_use(&self) -> Result<InUseSet> {
        if self.fail_in_use {
            bail!("ThrottlingException: rate exceeded");
        }
        Ok(self.in_use.clone())
    }

    fn reference(&self, resource: &Resource) -> String {
        (self.reference)(resource)
    }

    async fn delete_batch(&self, _group: &str, batch: &[Resource]) -> Result<Vec<ItemOutcome>> {
        let ids: Vec<String> = batch.iter().map(|r| r.id.clone()).collect();
        let call = {
            let mut calls = self
                .calls
                .lock()
                .map_err(|_| anyhow::anyhow!("call log poisoned"))?;
            calls.push(ids.clone());
            calls.len() - 1
        };

        if self.failing_calls.contains(&call) {
            bail!("ServerException: delete call {call} failed");
        }

        let mut deleted = self
            .deleted
            .lock()
            .map_err(|_| anyhow::anyhow!("deleted set poisoned"))?;
        Ok(ids
            .into_iter()
            .map(|id| match self.rejected.get(&id) {
                Some(reason) => ItemOutcome::failed(id, reason.clone()),
                None => {
                    deleted.insert(id.clone());
                    ItemOutcome::deleted(id)
                }
            })
            .collect())
    }
}
