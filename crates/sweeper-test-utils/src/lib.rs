//! Shared test utilities for sweeper
//!
//! Lives in its own crate so both `sweeper-core` and `sweeper` integration
//! tests can drive the orchestrator against the same in-memory inventory.
//!
//! ## Modules
//!
//! - [`aws`]: AWS region detection and unique names for live smoke tests
//! - [`fake`]: scriptable in-memory [`sweeper_core::Inventory`]
//! - [`fixtures`]: resource builders

pub mod aws;
pub mod fake;
pub mod fixtures;

pub use aws::{get_test_region, test_run_id};
pub use fake::FakeInventory;
pub use fixtures::{at_minute, resource_at, revision, tagged_image};
