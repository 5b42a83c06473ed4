//! Configuration validation errors
//!
//! Raised before any AWS call is made.

use sweeper_core::ResourceFamily;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// region is empty
    #[error("region cannot be empty (set --region, REGION or AWS_REGION)")]
    EmptyRegion,

    /// A selected family has no retention limit
    #[error("retention limit for {family} is required (set {env})")]
    MissingLimit {
        family: ResourceFamily,
        env: &'static str,
    },

    /// A retention limit is zero
    #[error("retention limit for {family} must be at least 1, got {value}")]
    InvalidLimit { family: ResourceFamily, value: usize },

    /// batch size is zero
    #[error("batch size must be at least 1")]
    InvalidBatchSize,

    /// registry id is set but empty
    #[error("ECR registry id cannot be empty")]
    EmptyRegistryId,

    /// No family selected
    #[error("no resource family selected")]
    NoFamilies,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            ConfigError::MissingLimit {
                family: ResourceFamily::EcrTaggedImages,
                env: "IMAGES_LIMIT"
            }
            .to_string(),
            "retention limit for ecr_tagged_images is required (set IMAGES_LIMIT)"
        );
        assert_eq!(
            ConfigError::InvalidLimit {
                family: ResourceFamily::BeanstalkVersions,
                value: 0
            }
            .to_string(),
            "retention limit for beanstalk_versions must be at least 1, got 0"
        );
    }
}
