//! Exclusion filters applied after retention
//!
//! The chain runs in a fixed order on the [`CandidateSet`] produced by the
//! age filter: reserved labels first, then in-use references. Each filter is
//! a pure function of the candidates and the [`FilterContext`].

use crate::resource::{InUseSet, Resource};
use crate::retention::CandidateSet;
use tracing::debug;

/// Read-only inputs shared by every filter of one group
pub struct FilterContext<'a> {
    in_use: &'a InUseSet,
    reference: &'a (dyn Fn(&Resource) -> String + Sync),
}

impl<'a> FilterContext<'a> {
    /// `reference` derives the string a live deployment would use to point
    /// at a resource (image URI, task definition ARN, ...).
    pub fn new(in_use: &'a InUseSet, reference: &'a (dyn Fn(&Resource) -> String + Sync)) -> Self {
        Self { in_use, reference }
    }

    pub fn in_use(&self) -> &InUseSet {
        self.in_use
    }

    pub fn reference(&self, resource: &Resource) -> String {
        (self.reference)(resource)
    }

    /// Check whether a live runtime context references this resource
    pub fn is_in_use(&self, resource: &Resource) -> bool {
        self.in_use.contains(&self.reference(resource))
    }
}

/// One step of the exclusion chain
pub trait CandidateFilter: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Return the candidates that survive this filter
    fn apply(&self, candidates: CandidateSet, ctx: &FilterContext<'_>) -> CandidateSet;
}

/// Never delete a resource carrying one of the protected labels
#[derive(Debug, Clone)]
pub struct ReservedLabelFilter {
    labels: Vec<String>,
}

impl ReservedLabelFilter {
    pub fn new<S: Into<String>>(labels: impl IntoIterator<Item = S>) -> Self {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }
}

impl CandidateFilter for ReservedLabelFilter {
    fn name(&self) -> &'static str {
        "reserved_label"
    }

    fn apply(&self, mut candidates: CandidateSet, _ctx: &FilterContext<'_>) -> CandidateSet {
        candidates.retain(|r| !self.labels.iter().any(|label| r.has_label(label)));
        candidates
    }
}

/// Never delete a resource referenced by a live deployment or service
#[derive(Debug, Clone, Copy, Default)]
pub struct InUseFilter;

impl CandidateFilter for InUseFilter {
    fn name(&self) -> &'static str {
        "in_use"
    }

    fn apply(&self, mut candidates: CandidateSet, ctx: &FilterContext<'_>) -> CandidateSet {
        candidates.retain(|r| !ctx.is_in_use(r));
        candidates
    }
}

/// Ordered list of filters
#[derive(Default)]
pub struct ExclusionChain {
    filters: Vec<Box<dyn CandidateFilter>>,
}

impl ExclusionChain {
    /// Chain with no filters
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserved-label filter (when `protected_labels` is non-empty) followed
    /// by the in-use filter
    pub fn standard(protected_labels: &[&str]) -> Self {
        let chain = Self::new();
        let chain = if protected_labels.is_empty() {
            chain
        } else {
            chain.then(ReservedLabelFilter::new(protected_labels.iter().copied()))
        };
        chain.then(InUseFilter)
    }

    /// Append a filter to the end of the chain
    pub fn then(mut self, filter: impl CandidateFilter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    pub fn filter_names(&self) -> Vec<&'static str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    /// Run every filter in order
    pub fn apply(&self, mut candidates: CandidateSet, ctx: &FilterContext<'_>) -> CandidateSet {
        for filter in &self.filters {
            let before = candidates.len();
            candidates = filter.apply(candidates, ctx);
            let removed = before.saturating_sub(candidates.len());
            if removed > 0 {
                debug!(filter = filter.name(), removed, remaining = candidates.len(), "Excluded candidates");
            }
        }
        candidates
    }
}

impl std::fmt::Debug for ExclusionChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExclusionChain")
            .field("filters", &self.filter_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::Recency;
    use crate::retention::RetentionPolicy;

    fn image(tag: &str, revision: u64) -> Resource {
        Resource::new("web", tag, Recency::Revision(revision)).with_label(tag)
    }

    fn image_ref(r: &Resource) -> String {
        format!("registry/{}:{}", r.group, r.id)
    }

    fn all_candidates(resources: Vec<Resource>) -> CandidateSet {
        RetentionPolicy::keep_none().select(resources)
    }

    #[test]
    fn test_reserved_label_filter() {
        let candidates = all_candidates(vec![image("latest", 1), image("v1", 2)]);
        let in_use = InUseSet::new();
        let ctx = FilterContext::new(&in_use, &image_ref);

        let kept = ReservedLabelFilter::new(["latest"]).apply(candidates, &ctx);
        assert_eq!(kept.ids(), vec!["v1"]);
    }

    #[test]
    fn test_in_use_filter_uses_derived_reference() {
        let candidates = all_candidates(vec![image("v1", 1), image("v2", 2)]);
        let in_use: InUseSet = ["registry/web:v1", "v2"].into_iter().collect();
        let ctx = FilterContext::new(&in_use, &image_ref);

        // "v2" alone is not the derived reference, so v2 stays a candidate
        let kept = InUseFilter.apply(candidates, &ctx);
        assert_eq!(kept.ids(), vec!["v2"]);
    }

    #[test]
    fn test_standard_chain_order() {
        assert_eq!(
            ExclusionChain::standard(&["latest"]).filter_names(),
            vec!["reserved_label", "in_use"]
        );
        assert_eq!(ExclusionChain::standard(&[]).filter_names(), vec!["in_use"]);
    }

    #[test]
    fn test_chain_applies_all_filters() {
        let candidates = all_candidates(vec![
            image("v4", 4),
            image("latest", 3),
            image("v2", 2),
            image("v1", 1),
        ]);
        let in_use: InUseSet = ["registry/web:v2"].into_iter().collect();
        let ctx = FilterContext::new(&in_use, &image_ref);

        let kept = ExclusionChain::standard(&["latest"]).apply(candidates, &ctx);
        assert_eq!(kept.ids(), vec!["v4", "v1"]);
    }

    #[test]
    fn test_chain_is_idempotent() {
        let resources = vec![image("latest", 3), image("v2", 2), image("v1", 1)];
        let in_use: InUseSet = ["registry/web:v1"].into_iter().collect();
        let ctx = FilterContext::new(&in_use, &image_ref);
        let chain = ExclusionChain::standard(&["latest"]);

        let first = chain.apply(all_candidates(resources.clone()), &ctx);
        let second = chain.apply(all_candidates(resources), &ctx);
        assert_eq!(first, second);
        assert_eq!(first.ids(), vec!["v2"]);
    }

    /// Adds a resource the retention step never selected
    struct Reinstate;

    impl CandidateFilter for Reinstate {
        fn name(&self) -> &'static str {
            "reinstate"
        }

        fn apply(&self, candidates: CandidateSet, _ctx: &FilterContext<'_>) -> CandidateSet {
            let mut resources = candidates.into_resources();
            resources.push(image("v0", 0));
            all_candidates(resources)
        }
    }

    #[test]
    fn test_chain_tolerates_filter_that_grows_candidates() {
        let candidates = all_candidates(vec![image("v2", 2), image("v1", 1)]);
        let in_use = InUseSet::new();
        let ctx = FilterContext::new(&in_use, &image_ref);

        let kept = ExclusionChain::new().then(Reinstate).apply(candidates, &ctx);
        assert_eq!(kept.len(), 3);
    }
}
