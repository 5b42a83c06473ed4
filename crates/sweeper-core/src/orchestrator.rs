//! Per-family cleanup driver
//!
//! For one [`Inventory`] the orchestrator walks through the phases
//! `Listing -> Computing -> Filtering -> Deleting -> Reporting`, one group at
//! a time:
//!
//! 1. list in-use references once, then the groups
//! 2. for each group: list resources, apply retention, apply the exclusion
//!    chain, delete the survivors, fold the result into the family totals
//! 3. return the [`FamilySummary`]
//!
//! Enumeration errors abort the family (and therefore the run) unless
//! [`GroupFailurePolicy::Skip`] is selected, in which case a group whose
//! resource listing fails is logged and skipped. Deletion errors never abort.

use crate::batch::BatchDeleter;
use crate::error::SweepError;
use crate::exclusion::{ExclusionChain, FilterContext};
use crate::family::ResourceFamily;
use crate::inventory::Inventory;
use crate::resource::{InUseSet, Resource};
use crate::retention::{CandidateSet, RetentionPolicy};
use crate::summary::FamilySummary;
use std::fmt;
use tracing::{debug, info, warn};

/// What to do when listing one group's resources fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GroupFailurePolicy {
    /// Propagate the error and stop the run
    #[default]
    Abort,
    /// Log the error, count the group as skipped and continue
    Skip,
}

/// Orchestrator phase, reported in logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Listing,
    Computing,
    Filtering,
    Deleting,
    Reporting,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Listing => "listing",
            Phase::Computing => "computing",
            Phase::Filtering => "filtering",
            Phase::Deleting => "deleting",
            Phase::Reporting => "reporting",
        };
        f.write_str(name)
    }
}

/// Decide which of a group's resources to delete.
///
/// Pure: the same resources, policy, chain and context always give the same
/// candidate set.
pub fn plan_deletions(
    resources: Vec<Resource>,
    retention: RetentionPolicy,
    chain: &ExclusionChain,
    ctx: &FilterContext<'_>,
) -> CandidateSet {
    chain.apply(retention.select(resources), ctx)
}

/// Drives retention, exclusion and deletion for one family at a time
#[derive(Debug, Clone, Copy)]
pub struct CleanupOrchestrator {
    deleter: BatchDeleter,
    on_group_failure: GroupFailurePolicy,
}

impl CleanupOrchestrator {
    pub fn new(deleter: BatchDeleter) -> Self {
        Self {
            deleter,
            on_group_failure: GroupFailurePolicy::default(),
        }
    }

    pub fn on_group_failure(mut self, policy: GroupFailurePolicy) -> Self {
        self.on_group_failure = policy;
        self
    }

    /// Sweep every group of `inventory`
    pub async fn run<I: Inventory>(
        &self,
        inventory: &I,
        retention: RetentionPolicy,
        chain: &ExclusionChain,
    ) -> Result<FamilySummary, SweepError> {
        let family = inventory.family();
        let mut summary = FamilySummary::new(family, retention.keep());

        info!(
            family = %family,
            keep = retention.keep(),
            dry_run = self.deleter.is_dry_run(),
            filters = ?chain.filter_names(),
            "Starting family cleanup"
        );

        enter(family, Phase::Listing);
        let in_use = inventory
            .list_in_use()
            .await
            .map_err(|e| SweepError::list_in_use(family, e))?;
        info!(family = %family, references = in_use.len(), "Retrieved in-use references");

        let groups = inventory
            .list_groups()
            .await
            .map_err(|e| SweepError::list_groups(family, e))?;
        info!(family = %family, count = groups.len(), "Retrieved {}s", family.group_noun());

        for group in &groups {
            summary.groups += 1;
            if let Err(e) = self
                .sweep_group(inventory, group, retention, chain, &in_use, &mut summary)
                .await
            {
                match self.on_group_failure {
                    GroupFailurePolicy::Skip if e.is_group_scoped() => {
                        warn!(family = %family, group = %group, error = ?e, "Skipping group");
                        summary.skipped_groups += 1;
                    }
                    _ => return Err(e),
                }
            }
        }

        enter(family, Phase::Reporting);
        info!(
            family = %family,
            groups = summary.groups,
            seen = summary.seen,
            candidates = summary.candidates,
            excluded = summary.excluded,
            deleted = summary.result.deleted,
            failed = summary.result.failed,
            skipped = summary.result.skipped,
            "Finished family cleanup"
        );
        Ok(summary)
    }

    async fn sweep_group<I: Inventory>(
        &self,
        inventory: &I,
        group: &str,
        retention: RetentionPolicy,
        chain: &ExclusionChain,
        in_use: &InUseSet,
        summary: &mut FamilySummary,
    ) -> Result<(), SweepError> {
        let family = inventory.family();

        enter(family, Phase::Listing);
        let resources = inventory
            .list_resources(group)
            .await
            .map_err(|e| SweepError::list_resources(family, group, e))?;
        let count = resources.len();
        summary.seen += count;

        enter(family, Phase::Computing);
        let candidates = retention.select(resources);
        if candidates.is_empty() {
            info!(
                group = %group,
                count,
                keep = retention.keep(),
                "Within retention limit, nothing to clean"
            );
            return Ok(());
        }
        summary.candidates += candidates.len();
        info!(group = %group, count, candidates = candidates.len(), "Selected candidates past retention limit");

        enter(family, Phase::Filtering);
        let resolve = |r: &Resource| inventory.reference(r);
        let ctx = FilterContext::new(in_use, &resolve);
        let before = candidates.len();
        let candidates = chain.apply(candidates, &ctx);
        summary.excluded += before.saturating_sub(candidates.len());

        if candidates.is_empty() {
            info!(group = %group, "All candidates are protected or in use, skipping");
            return Ok(());
        }

        enter(family, Phase::Deleting);
        info!(group = %group, count = candidates.len(), ids = ?candidates.ids(), "Deleting");
        summary.result += self.deleter.delete(inventory, group, candidates).await;
        Ok(())
    }
}

fn enter(family: ResourceFamily, phase: Phase) {
    debug!(family = %family, phase = %phase, "Entering phase");
}
