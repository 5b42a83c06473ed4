//! Errors that stop a sweep
//!
//! Only enumeration failures are errors. Failed deletions are recorded in
//! [`BatchResult`](crate::batch::BatchResult) and never surface here.

use crate::family::ResourceFamily;
use thiserror::Error;

type Source = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A listing or describe call failed
#[derive(Debug, Error)]
pub enum SweepError {
    /// Group enumeration failed
    #[error("failed to list {family} groups")]
    ListGroups {
        family: ResourceFamily,
        #[source]
        source: Source,
    },

    /// Resource enumeration within one group failed
    #[error("failed to list resources of {family} group '{group}'")]
    ListResources {
        family: ResourceFamily,
        group: String,
        #[source]
        source: Source,
    },

    /// In-use reference enumeration failed
    #[error("failed to list in-use references for {family}")]
    ListInUse {
        family: ResourceFamily,
        #[source]
        source: Source,
    },
}

impl SweepError {
    pub fn list_groups(family: ResourceFamily, source: anyhow::Error) -> Self {
        Self::ListGroups {
            family,
            source: source.into(),
        }
    }

    pub fn list_resources(
        family: ResourceFamily,
        group: impl Into<String>,
        source: anyhow::Error,
    ) -> Self {
        Self::ListResources {
            family,
            group: group.into(),
            source: source.into(),
        }
    }

    pub fn list_in_use(family: ResourceFamily, source: anyhow::Error) -> Self {
        Self::ListInUse {
            family,
            source: source.into(),
        }
    }

    /// Check whether only a single group is affected
    pub fn is_group_scoped(&self) -> bool {
        matches!(self, SweepError::ListResources { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SweepError::list_resources(
            ResourceFamily::EcrTaggedImages,
            "web",
            anyhow::anyhow!("AccessDenied"),
        );
        assert_eq!(
            err.to_string(),
            "failed to list resources of ecr_tagged_images group 'web'"
        );
        assert!(err.is_group_scoped());
    }

    #[test]
    fn test_source_is_preserved() {
        use std::error::Error;

        let err = SweepError::list_in_use(
            ResourceFamily::EcsTaskDefinitions,
            anyhow::anyhow!("ThrottlingException"),
        );
        assert!(!err.is_group_scoped());
        let source = err.source().expect("source should be kept");
        assert!(source.to_string().contains("ThrottlingException"));
    }
}
