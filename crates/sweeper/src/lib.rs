//! sweeper: scheduled garbage collection for AWS deployment artifacts
//!
//! Keeps the newest N Elastic Beanstalk application versions, ECR images
//! and ECS task definition revisions per group and deletes the rest, except
//! what is still deployed or protected. The policy engine lives in
//! `sweeper-core`; this crate wires it to the AWS APIs.

pub mod aws;
pub mod config;
pub mod error;
pub mod runner;

pub use config::SweepConfig;
pub use error::ConfigError;
pub use runner::{run_sweep, sweep_family};
