//! sweeper-core - Retention and exclusion decisions for inventory cleanup
//!
//! This crate decides which cloud resources are safe to delete and drives
//! their deletion, without any AWS SDK dependencies. Remote APIs are reached
//! only through the [`Inventory`] trait, so everything here runs against
//! in-memory fakes in tests.
//!
//! ## Modules
//!
//! - [`resource`]: Resource, recency key and in-use set
//! - [`family`]: Resource families and their processing order
//! - [`pagination`]: Cursor-driven page accumulation
//! - [`retention`]: Keep-N-most-recent selection and the candidate set
//! - [`exclusion`]: Reserved-label and in-use filters
//! - [`batch`]: Bounded batch deletion with per-item outcomes
//! - [`orchestrator`]: Per-family cleanup driver
//! - [`summary`]: Family and run summaries
//! - [`defaults`]: Default limits and API ceilings

pub mod batch;
pub mod defaults;
pub mod error;
pub mod exclusion;
pub mod family;
pub mod inventory;
pub mod orchestrator;
pub mod pagination;
pub mod resource;
pub mod retention;
pub mod summary;

// Re-export commonly used types
pub use batch::{BatchDeleter, BatchResult, DeletionFailure, ItemOutcome};
pub use error::SweepError;
pub use exclusion::{CandidateFilter, ExclusionChain, FilterContext, InUseFilter, ReservedLabelFilter};
pub use family::ResourceFamily;
pub use inventory::Inventory;
pub use orchestrator::{CleanupOrchestrator, GroupFailurePolicy, Phase};
pub use pagination::{Page, collect_pages};
pub use resource::{InUseSet, Recency, Resource};
pub use retention::{CandidateSet, RetentionPolicy};
pub use summary::{FamilySummary, RunSummary, RunTotals};
