//! Listed resources and in-use references

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;

/// How recent a resource is, as reported by the remote listing.
///
/// Resources within one group always carry the same variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Recency {
    /// Creation or push timestamp
    CreatedAt(DateTime<Utc>),
    /// Monotonic revision number, for APIs that expose no timestamp
    Revision(u64),
}

/// A deletable unit under policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resource {
    /// Identifier passed back to the delete call
    pub id: String,
    /// Owning group (application, repository or task definition family)
    pub group: String,
    /// Ordering key for retention
    pub recency: Recency,
    /// Optional label (image tag)
    pub label: Option<String>,
}

impl Resource {
    pub fn new(group: impl Into<String>, id: impl Into<String>, recency: Recency) -> Self {
        Self {
            id: id.into(),
            group: group.into(),
            recency,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Check whether the resource carries exactly this label
    pub fn has_label(&self, label: &str) -> bool {
        self.label.as_deref() == Some(label)
    }
}

/// References currently bound to live deployments, services or task
/// definitions. Built once per family per run and only read afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InUseSet {
    references: HashSet<String>,
}

impl InUseSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, reference: impl Into<String>) -> bool {
        self.references.insert(reference.into())
    }

    pub fn contains(&self, reference: &str) -> bool {
        self.references.contains(reference)
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.references.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for InUseSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self {
            references: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<S: Into<String>> Extend<S> for InUseSet {
    fn extend<T: IntoIterator<Item = S>>(&mut self, iter: T) {
        self.references.extend(iter.into_iter().map(Into::into));
    }
}
