//! AWS inventories
//!
//! Wrappers around the SDK clients, one per resource family:
//! - Elastic Beanstalk: application versions
//! - ECR: tagged and untagged images
//! - ECS: task definition revisions, plus in-use lookups for the other two
//! - STS: account ID lookup for the default registry

pub mod account;
pub mod beanstalk;
pub mod context;
pub mod ecr;
pub mod ecs;
pub mod error;

pub use account::{AccountId, get_current_account_id};
pub use beanstalk::BeanstalkClient;
pub use context::{AwsContext, FromAwsContext};
pub use ecr::{EcrClient, ImageSelection, SharedImageUsage};
pub use ecs::EcsClient;

pub use error::{AwsError, classify_anyhow_error, classify_aws_error, classify_sdk_error};
