//! Resource families and processing order
//!
//! A family is one kind of deletable resource with its own grouping key,
//! retention limit and in-use rules.

use serde::Serialize;
use std::fmt;

/// Kinds of resources swept by sweeper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceFamily {
    /// Elastic Beanstalk application versions, grouped by application
    BeanstalkVersions,
    /// Tagged ECR images, grouped by repository (one resource per tag)
    EcrTaggedImages,
    /// Untagged ECR images, grouped by repository
    EcrUntaggedImages,
    /// ECS task definition revisions, grouped by family
    EcsTaskDefinitions,
}

impl ResourceFamily {
    /// All families in processing order
    pub const ALL: [ResourceFamily; 4] = [
        ResourceFamily::BeanstalkVersions,
        ResourceFamily::EcrTaggedImages,
        ResourceFamily::EcrUntaggedImages,
        ResourceFamily::EcsTaskDefinitions,
    ];

    /// Stable name used in logs and summaries
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceFamily::BeanstalkVersions => "beanstalk_versions",
            ResourceFamily::EcrTaggedImages => "ecr_tagged_images",
            ResourceFamily::EcrUntaggedImages => "ecr_untagged_images",
            ResourceFamily::EcsTaskDefinitions => "ecs_task_definitions",
        }
    }

    /// What a group of this family is called remotely
    pub fn group_noun(self) -> &'static str {
        match self {
            ResourceFamily::BeanstalkVersions => "application",
            ResourceFamily::EcrTaggedImages | ResourceFamily::EcrUntaggedImages => "repository",
            ResourceFamily::EcsTaskDefinitions => "task definition family",
        }
    }

    /// Get processing priority (lower number = processed first)
    ///
    /// Removing an image's last tag leaves it untagged, so tagged images are
    /// swept before untagged ones and the leftovers go in the same run.
    pub fn processing_priority(self) -> u8 {
        match self {
            ResourceFamily::BeanstalkVersions => 0,
            ResourceFamily::EcrTaggedImages => 1,
            ResourceFamily::EcrUntaggedImages => 2,
            ResourceFamily::EcsTaskDefinitions => 3,
        }
    }
}

impl fmt::Display for ResourceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_before_untagged() {
        assert!(
            ResourceFamily::EcrTaggedImages.processing_priority()
                < ResourceFamily::EcrUntaggedImages.processing_priority(),
            "Tagged images must be swept before untagged images"
        );
    }

    #[test]
    fn test_all_is_sorted_by_priority() {
        let mut sorted = ResourceFamily::ALL;
        sorted.sort_by_key(|f| f.processing_priority());
        assert_eq!(sorted, ResourceFamily::ALL);
    }

    #[test]
    fn test_serialized_name_matches_display() {
        for family in ResourceFamily::ALL {
            let json = serde_json::to_string(&family).unwrap();
            assert_eq!(json, format!("\"{family}\""));
        }
    }
}
