//! Default configuration values and remote API ceilings
//!
//! These constants keep the binary, the inventories and the tests in agreement.

use std::time::Duration;

/// Default number of Beanstalk application versions kept per application
pub const DEFAULT_VERSIONS_LIMIT: usize = 25;

/// Default batch size ceiling for delete calls
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Maximum image ids accepted by one ECR `BatchDeleteImage` call
pub const ECR_BATCH_DELETE_LIMIT: usize = 100;

/// Maximum services accepted by one ECS `DescribeServices` call
pub const ECS_DESCRIBE_SERVICES_LIMIT: usize = 10;

/// Page size requested from `DescribeApplicationVersions`
pub const BEANSTALK_MAX_RECORDS: i32 = 1000;

/// Floating image tag that is never deleted
pub const PROTECTED_IMAGE_TAG: &str = "latest";

/// Pause between successive `DescribeTaskDefinition` calls to stay under
/// the ECS request rate limit
pub const DESCRIBE_THROTTLE_DELAY: Duration = Duration::from_millis(100);
