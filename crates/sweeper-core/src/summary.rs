//! Family and run summaries
//!
//! Printed as JSON at the end of a run for the scheduler's logs.

use crate::batch::BatchResult;
use crate::family::ResourceFamily;
use serde::Serialize;

/// Outcome of sweeping one resource family
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FamilySummary {
    pub family: ResourceFamily,
    pub retention_limit: usize,
    /// Groups enumerated
    pub groups: usize,
    /// Groups abandoned after an enumeration error
    pub skipped_groups: usize,
    /// Resources listed across all groups
    pub seen: usize,
    /// Resources past the retention limit
    pub candidates: usize,
    /// Candidates removed by the exclusion chain
    pub excluded: usize,
    #[serde(flatten)]
    pub result: BatchResult,
}

impl FamilySummary {
    pub fn new(family: ResourceFamily, retention_limit: usize) -> Self {
        Self {
            family,
            retention_limit,
            groups: 0,
            skipped_groups: 0,
            seen: 0,
            candidates: 0,
            excluded: 0,
            result: BatchResult::default(),
        }
    }
}

/// Totals across every family of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunTotals {
    pub seen: usize,
    pub deleted: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Structured summary returned at the end of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub dry_run: bool,
    pub families: Vec<FamilySummary>,
    pub totals: RunTotals,
}

impl RunSummary {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Default::default()
        }
    }

    pub fn push(&mut self, family: FamilySummary) {
        self.totals.seen += family.seen;
        self.totals.deleted += family.result.deleted;
        self.totals.failed += family.result.failed;
        self.totals.skipped += family.result.skipped;
        self.families.push(family);
    }

    pub fn family(&self, family: ResourceFamily) -> Option<&FamilySummary> {
        self.families.iter().find(|f| f.family == family)
    }

    /// Check whether any deletion failed
    pub fn has_failures(&self) -> bool {
        self.totals.failed > 0
    }
}
