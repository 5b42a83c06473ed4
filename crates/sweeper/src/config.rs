//! Run configuration
//!
//! Built from command-line arguments (or their environment fallbacks) and
//! validated before the first AWS call.

use crate::error::ConfigError;
use sweeper_core::defaults::PROTECTED_IMAGE_TAG;
use sweeper_core::{BatchDeleter, GroupFailurePolicy, ResourceFamily, RetentionPolicy};

/// AWS connection settings
#[derive(Debug, Clone)]
pub struct AwsConfig {
    pub region: String,
    /// AWS profile name (overrides default credential resolution)
    pub aws_profile: Option<String>,
    /// ECR registry, defaults to the caller's account
    pub registry_id: Option<String>,
}

/// Per-family retention limits
#[derive(Debug, Clone, Default)]
pub struct RetentionLimits {
    pub versions: usize,
    pub images: Option<usize>,
    pub task_definition_revisions: Option<usize>,
}

/// Runtime behavior flags
#[derive(Debug, Clone)]
pub struct RuntimeFlags {
    pub batch_size: usize,
    /// Log candidates instead of deleting them
    pub dry_run: bool,
    /// Skip groups whose resource listing fails instead of aborting
    pub skip_failed_groups: bool,
}

/// Configuration for one sweep
#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub aws: AwsConfig,
    pub limits: RetentionLimits,
    pub flags: RuntimeFlags,
    /// Families to sweep, in any order
    pub families: Vec<ResourceFamily>,
}

impl SweepConfig {
    /// Check everything the selected families need
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.aws.region.trim().is_empty() {
            return Err(ConfigError::EmptyRegion);
        }
        if self.aws.registry_id.as_deref().is_some_and(|id| id.trim().is_empty()) {
            return Err(ConfigError::EmptyRegistryId);
        }
        if self.flags.batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize);
        }
        if self.families.is_empty() {
            return Err(ConfigError::NoFamilies);
        }
        for family in &self.families {
            self.retention(*family)?;
        }
        Ok(())
    }

    /// Families in processing order, without duplicates
    pub fn ordered_families(&self) -> Vec<ResourceFamily> {
        let mut families = self.families.clone();
        families.sort_by_key(|f| f.processing_priority());
        families.dedup();
        families
    }

    /// Retention policy for a family.
    ///
    /// Untagged images are never worth keeping, so their policy keeps none.
    pub fn retention(&self, family: ResourceFamily) -> Result<RetentionPolicy, ConfigError> {
        let (limit, env) = match family {
            ResourceFamily::EcrUntaggedImages => return Ok(RetentionPolicy::keep_none()),
            ResourceFamily::BeanstalkVersions => (Some(self.limits.versions), "VERSIONS_LIMIT"),
            ResourceFamily::EcrTaggedImages => (self.limits.images, "IMAGES_LIMIT"),
            ResourceFamily::EcsTaskDefinitions => (
                self.limits.task_definition_revisions,
                "TASK_DEFINITION_REVISIONS_LIMIT",
            ),
        };

        match limit {
            None => Err(ConfigError::MissingLimit { family, env }),
            Some(0) => Err(ConfigError::InvalidLimit { family, value: 0 }),
            Some(keep) => Ok(RetentionPolicy::keep_most_recent(keep)),
        }
    }

    /// Labels that are never deleted for a family
    pub fn protected_labels(&self, family: ResourceFamily) -> &'static [&'static str] {
        match family {
            ResourceFamily::EcrTaggedImages => &[PROTECTED_IMAGE_TAG],
            _ => &[],
        }
    }

    pub fn deleter(&self) -> BatchDeleter {
        BatchDeleter::new(self.flags.batch_size).dry_run(self.flags.dry_run)
    }

    pub fn group_failure_policy(&self) -> GroupFailurePolicy {
        if self.flags.skip_failed_groups {
            GroupFailurePolicy::Skip
        } else {
            GroupFailurePolicy::Abort
        }
    }

    pub fn region(&self) -> &str {
        &self.aws.region
    }

    pub fn dry_run(&self) -> bool {
        self.flags.dry_run
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sweeper_core::defaults::{DEFAULT_BATCH_SIZE, DEFAULT_VERSIONS_LIMIT};

    fn config(families: Vec<ResourceFamily>) -> SweepConfig {
        SweepConfig {
            aws: AwsConfig {
                region: "us-east-1".to_string(),
                aws_profile: None,
                registry_id: None,
            },
            limits: RetentionLimits {
                versions: DEFAULT_VERSIONS_LIMIT,
                images: Some(100),
                task_definition_revisions: Some(25),
            },
            flags: RuntimeFlags {
                batch_size: DEFAULT_BATCH_SIZE,
                dry_run: false,
                skip_failed_groups: false,
            },
            families,
        }
    }

    #[test]
    fn test_valid_config() {
        assert_eq!(config(ResourceFamily::ALL.to_vec()).validate(), Ok(()));
    }

    #[test]
    fn test_empty_region_rejected() {
        let mut cfg = config(vec![ResourceFamily::BeanstalkVersions]);
        cfg.aws.region = "  ".to_string();
        assert_eq!(cfg.validate(), Err(ConfigError::EmptyRegion));
    }

    #[test]
    fn test_missing_limit_only_matters_for_selected_family() {
        let mut cfg = config(vec![ResourceFamily::BeanstalkVersions]);
        cfg.limits.images = None;
        assert_eq!(cfg.validate(), Ok(()));

        cfg.families.push(ResourceFamily::EcrTaggedImages);
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::MissingLimit {
                family: ResourceFamily::EcrTaggedImages,
                env: "IMAGES_LIMIT"
            })
        );
    }

    #[test]
    fn test_zero_limit_and_batch_size_rejected() {
        let mut cfg = config(vec![ResourceFamily::EcsTaskDefinitions]);
        cfg.limits.task_definition_revisions = Some(0);
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidLimit { .. })));

        let mut cfg = config(vec![ResourceFamily::BeanstalkVersions]);
        cfg.flags.batch_size = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::InvalidBatchSize));
    }

    #[test]
    fn test_untagged_images_keep_none() {
        let mut cfg = config(vec![ResourceFamily::EcrUntaggedImages]);
        cfg.limits.images = None;
        assert_eq!(
            cfg.retention(ResourceFamily::EcrUntaggedImages).map(|p| p.keep()),
            Ok(0)
        );
    }

    #[test]
    fn test_ordered_families() {
        let cfg = config(vec![
            ResourceFamily::EcsTaskDefinitions,
            ResourceFamily::EcrUntaggedImages,
            ResourceFamily::EcrTaggedImages,
            ResourceFamily::EcsTaskDefinitions,
        ]);
        assert_eq!(
            cfg.ordered_families(),
            vec![
                ResourceFamily::EcrTaggedImages,
                ResourceFamily::EcrUntaggedImages,
                ResourceFamily::EcsTaskDefinitions,
            ]
        );
    }

    #[test]
    fn test_protected_labels() {
        let cfg = config(vec![]);
        assert_eq!(cfg.protected_labels(ResourceFamily::EcrTaggedImages), &["latest"]);
        assert!(cfg.protected_labels(ResourceFamily::EcsTaskDefinitions).is_empty());
        assert_eq!(cfg.group_failure_policy(), GroupFailurePolicy::Abort);
    }
}
