//! Keep-N-most-recent retention
//!
//! [`RetentionPolicy::select`] is the age filter: the first step of every
//! decision and the only way to obtain a [`CandidateSet`]. Later filters can
//! only shrink what it returns.

use crate::resource::Resource;

/// Keep the `keep` most recent resources of a group, offer the rest for deletion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    keep: usize,
}

impl RetentionPolicy {
    pub fn keep_most_recent(keep: usize) -> Self {
        Self { keep }
    }

    /// Every resource becomes a candidate (untagged images)
    pub fn keep_none() -> Self {
        Self { keep: 0 }
    }

    pub fn keep(&self) -> usize {
        self.keep
    }

    /// Select deletion candidates from one group's resources.
    ///
    /// Resources are stable-sorted newest first, so equal recency keeps the
    /// listing order, and everything past position `keep` is returned in
    /// that order.
    pub fn select(&self, mut resources: Vec<Resource>) -> CandidateSet {
        if resources.len() <= self.keep {
            return CandidateSet::default();
        }

        resources.sort_by(|a, b| b.recency.cmp(&a.recency));
        CandidateSet {
            resources: resources.split_off(self.keep),
        }
    }
}

/// Resources selected for deletion, oldest last.
///
/// Filters may remove entries but nothing can add one back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateSet {
    resources: Vec<Resource>,
}

impl CandidateSet {
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Resource> {
        self.resources.iter()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.resources.iter().map(|r| r.id.as_str()).collect()
    }

    /// Keep only the candidates matching `keep`
    pub fn retain(&mut self, keep: impl FnMut(&Resource) -> bool) {
        self.resources.retain(keep);
    }

    pub fn into_resources(self) -> Vec<Resource> {
        self.resources
    }
}

impl<'a> IntoIterator for &'a CandidateSet {
    type Item = &'a Resource;
    type IntoIter = std::slice::Iter<'a, Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.resources.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::Recency;
    use chrono::{Duration, TimeZone, Utc};

    /// `ages[i]` is the age in days of resource `r{i}`
    fn group(ages: &[i64]) -> Vec<Resource> {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        ages.iter()
            .enumerate()
            .map(|(i, age)| {
                Resource::new("app", format!("r{i}"), Recency::CreatedAt(now - Duration::days(*age)))
            })
            .collect()
    }

    #[test]
    fn test_under_limit_is_empty() {
        let policy = RetentionPolicy::keep_most_recent(5);
        assert!(policy.select(group(&[1, 2, 3])).is_empty());
        assert!(policy.select(group(&[1, 2, 3, 4, 5])).is_empty());
        assert!(policy.select(Vec::new()).is_empty());
    }

    #[test]
    fn test_selects_oldest_beyond_limit() {
        let policy = RetentionPolicy::keep_most_recent(2);
        let candidates = policy.select(group(&[5, 1, 9, 3, 7]));
        // Newest first: r1(1) r3(3) r0(5) r4(7) r2(9)
        assert_eq!(candidates.ids(), vec!["r0", "r4", "r2"]);
    }

    #[test]
    fn test_keep_none_selects_everything() {
        let candidates = RetentionPolicy::keep_none().select(group(&[2, 1, 3]));
        assert_eq!(candidates.ids(), vec!["r1", "r0", "r2"]);
    }

    #[test]
    fn test_ties_keep_listing_order() {
        let policy = RetentionPolicy::keep_most_recent(1);
        let candidates = policy.select(group(&[4, 4, 4, 4]));
        assert_eq!(candidates.ids(), vec!["r1", "r2", "r3"]);
    }

    #[test]
    fn test_revisions() {
        let resources: Vec<_> = [3u64, 1, 2]
            .iter()
            .map(|n| Resource::new("web", format!("web:{n}"), Recency::Revision(*n)))
            .collect();
        let candidates = RetentionPolicy::keep_most_recent(1).select(resources);
        assert_eq!(candidates.ids(), vec!["web:2", "web:1"]);
    }

    #[test]
    fn test_retain_only_shrinks() {
        let mut candidates = RetentionPolicy::keep_none().select(group(&[1, 2, 3]));
        candidates.retain(|r| r.id != "r1");
        assert_eq!(candidates.ids(), vec!["r0", "r2"]);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn keeps_exactly_the_most_recent(
                ages in proptest::collection::vec(0i64..20, 0..60),
                keep in 0usize..40,
            ) {
                let resources = group(&ages);
                let candidates = RetentionPolicy::keep_most_recent(keep).select(resources.clone());

                let expected = resources.len().saturating_sub(keep);
                prop_assert_eq!(candidates.len(), expected);

                // No retained resource is older than any candidate
                if let Some(newest_candidate) = candidates.iter().map(|r| r.recency).max() {
                    let retained = resources
                        .iter()
                        .filter(|r| !candidates.ids().contains(&r.id.as_str()));
                    for r in retained {
                        prop_assert!(r.recency >= newest_candidate);
                    }
                }
            }

            #[test]
            fn selection_is_deterministic(ages in proptest::collection::vec(0i64..5, 0..40)) {
                let policy = RetentionPolicy::keep_most_recent(3);
                prop_assert_eq!(policy.select(group(&ages)), policy.select(group(&ages)));
            }
        }
    }
}
