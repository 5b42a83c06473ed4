//! Bounded batch deletion
//!
//! Candidates are split into ordered batches no larger than the remote API
//! ceiling. A failed item or a failed batch is logged and counted, and the
//! remaining batches still run.

use crate::inventory::Inventory;
use crate::resource::Resource;
use crate::retention::CandidateSet;
use serde::Serialize;
use std::collections::HashSet;
use std::ops::AddAssign;
use tracing::{info, warn};

/// Result of deleting a single resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// Resource was deleted
    Deleted { id: String },
    /// Remote side refused or failed to delete the resource
    Failed { id: String, reason: String },
}

impl ItemOutcome {
    pub fn deleted(id: impl Into<String>) -> Self {
        Self::Deleted { id: id.into() }
    }

    pub fn failed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Failed {
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            ItemOutcome::Deleted { id } | ItemOutcome::Failed { id, .. } => id,
        }
    }
}

/// A resource that could not be deleted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletionFailure {
    pub group: String,
    pub id: String,
    pub reason: String,
}

/// Counts accumulated across batches and groups
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    pub deleted: usize,
    pub failed: usize,
    /// Candidates left alone because of dry run
    pub skipped: usize,
    /// Delete calls issued
    pub batches: usize,
    pub failures: Vec<DeletionFailure>,
}

impl BatchResult {
    fn record_failure(&mut self, group: &str, id: &str, reason: &str) {
        self.failed += 1;
        self.failures.push(DeletionFailure {
            group: group.to_string(),
            id: id.to_string(),
            reason: reason.to_string(),
        });
    }
}

impl AddAssign for BatchResult {
    fn add_assign(&mut self, other: Self) {
        self.deleted += other.deleted;
        self.failed += other.failed;
        self.skipped += other.skipped;
        self.batches += other.batches;
        self.failures.extend(other.failures);
    }
}

/// Issues delete calls in fixed-size batches
#[derive(Debug, Clone, Copy)]
pub struct BatchDeleter {
    batch_size: usize,
    dry_run: bool,
}

impl BatchDeleter {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
            dry_run: false,
        }
    }

    /// Log and count candidates instead of deleting them
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Configured size capped by the remote API ceiling
    pub fn effective_batch_size(&self, ceiling: usize) -> usize {
        self.batch_size.min(ceiling).max(1)
    }

    /// Delete a group's final candidates.
    ///
    /// Never fails: batch-level errors count every item of the batch as
    /// failed, item-level errors count that item. Outcomes for ids that were
    /// not part of the batch, or repeated ids, are ignored so that
    /// `deleted + failed` never exceeds the number of candidates.
    pub async fn delete<I: Inventory>(
        &self,
        inventory: &I,
        group: &str,
        candidates: CandidateSet,
    ) -> BatchResult {
        let mut result = BatchResult::default();
        let resources = candidates.into_resources();
        if resources.is_empty() {
            return result;
        }

        if self.dry_run {
            for resource in &resources {
                info!(group = %group, id = %resource.id, label = ?resource.label, "[DRY RUN] Would delete");
            }
            result.skipped = resources.len();
            return result;
        }

        let batch_size = self.effective_batch_size(inventory.max_batch_size());
        for (index, batch) in resources.chunks(batch_size).enumerate() {
            result.batches += 1;
            match inventory.delete_batch(group, batch).await {
                Ok(outcomes) => tally_batch(&mut result, group, batch, outcomes),
                Err(e) => {
                    warn!(
                        group = %group,
                        batch = index,
                        size = batch.len(),
                        error = ?e,
                        "Delete call failed"
                    );
                    let reason = format!("{e:#}");
                    for resource in batch {
                        result.record_failure(group, &resource.id, &reason);
                    }
                }
            }
        }

        info!(
            group = %group,
            deleted = result.deleted,
            failed = result.failed,
            batches = result.batches,
            "Deleted candidates"
        );
        result
    }
}

fn tally_batch(result: &mut BatchResult, group: &str, batch: &[Resource], outcomes: Vec<ItemOutcome>) {
    let mut pending: HashSet<&str> = batch.iter().map(|r| r.id.as_str()).collect();

    for outcome in outcomes {
        if !pending.remove(outcome.id()) {
            warn!(group = %group, id = %outcome.id(), "Ignoring outcome for resource outside the batch");
            continue;
        }
        match outcome {
            ItemOutcome::Deleted { .. } => result.deleted += 1,
            ItemOutcome::Failed { id, reason } => {
                warn!(group = %group, id = %id, reason = %reason, "Failed to delete");
                result.record_failure(group, &id, &reason);
            }
        }
    }

    if !pending.is_empty() {
        warn!(
            group = %group,
            unreported = pending.len(),
            "Delete call did not report on every resource"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_batch_size() {
        assert_eq!(BatchDeleter::new(100).effective_batch_size(100), 100);
        assert_eq!(BatchDeleter::new(250).effective_batch_size(100), 100);
        assert_eq!(BatchDeleter::new(10).effective_batch_size(100), 10);
        assert_eq!(BatchDeleter::new(0).effective_batch_size(100), 1);
    }

    #[test]
    fn test_add_assign_accumulates() {
        let mut total = BatchResult {
            deleted: 2,
            batches: 1,
            ..Default::default()
        };
        let mut other = BatchResult {
            deleted: 1,
            batches: 1,
            ..Default::default()
        };
        other.record_failure("web", "v1", "ImageNotFound");

        total += other;
        assert_eq!(total.deleted, 3);
        assert_eq!(total.failed, 1);
        assert_eq!(total.batches, 2);
        assert_eq!(total.failures[0].id, "v1");
    }

    #[test]
    fn test_tally_ignores_foreign_and_repeated_ids() {
        use crate::resource::Recency;

        let batch = vec![
            Resource::new("web", "a", Recency::Revision(1)),
            Resource::new("web", "b", Recency::Revision(2)),
            Resource::new("web", "c", Recency::Revision(3)),
        ];
        let outcomes = vec![
            ItemOutcome::deleted("a"),
            ItemOutcome::deleted("a"),
            ItemOutcome::deleted("zzz"),
            ItemOutcome::failed("b", "denied"),
        ];

        let mut result = BatchResult::default();
        tally_batch(&mut result, "web", &batch, outcomes);
        assert_eq!(result.deleted, 1);
        assert_eq!(result.failed, 1);
        assert_eq!(result.failures[0].reason, "denied");
    }
}
