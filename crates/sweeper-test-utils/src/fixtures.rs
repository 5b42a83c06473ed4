//! Resource builders

use chrono::{DateTime, Duration, TimeZone, Utc};
use sweeper_core::{Recency, Resource};

/// Fixed instant plus `minutes`, so ordering in tests is obvious
pub fn at_minute(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
        + Duration::minutes(minutes)
}

/// Resource created `minutes` after the fixture epoch
pub fn resource_at(group: &str, id: &str, minutes: i64) -> Resource {
    Resource::new(group, id, Recency::CreatedAt(at_minute(minutes)))
}

/// Task definition revision `family:n`
pub fn revision(family: &str, n: u64) -> Resource {
    Resource::new(family, format!("{family}:{n}"), Recency::Revision(n))
}

/// Tagged image whose id and label are both the tag
pub fn tagged_image(repository: &str, tag: &str, minutes: i64) -> Resource {
    resource_at(repository, tag, minutes).with_label(tag)
}
