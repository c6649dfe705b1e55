//! Source-specific ordering of normalized records.
//!
//! All orders are applied with a stable sort, so records with equal keys keep
//! the order in which they were fetched.

use std::cmp::Ordering;

use crate::record::{NormalizedRecord, Resolution, Source};

impl Source {
    /// The ranking comparator of this source.
    ///
    /// - TPB: seeders, descending.
    /// - EZTV: season ascending, episode ascending (absent values last),
    ///   resolution rank descending, seeds descending.
    pub fn compare(&self, a: &NormalizedRecord, b: &NormalizedRecord) -> Ordering {
        match self {
            Source::Tpb => by_seeders_desc(a, b),
            Source::Eztv => by_episode(a, b),
        }
    }
}

/// Order records in place with the comparator of `source`.
pub fn rank(source: Source, records: &mut [NormalizedRecord]) {
    records.sort_by(|a, b| source.compare(a, b));
}

/// Keep the `n` records with the most seeders, ties in fetch order.
pub fn top_by_seeders(mut records: Vec<NormalizedRecord>, n: usize) -> Vec<NormalizedRecord> {
    records.sort_by(by_seeders_desc);
    records.truncate(n);
    records
}

/// Drop records below `min`, preserving the order of the rest.
pub fn retain_min_resolution(records: &mut Vec<NormalizedRecord>, min: Resolution) {
    records.retain(|r| r.resolution.rank() >= min.rank());
}

fn by_seeders_desc(a: &NormalizedRecord, b: &NormalizedRecord) -> Ordering {
    b.seeders.cmp(&a.seeders)
}

fn by_episode(a: &NormalizedRecord, b: &NormalizedRecord) -> Ordering {
    absent_last(a.season, b.season)
        .then_with(|| absent_last(a.episode, b.episode))
        .then_with(|| b.resolution.rank().cmp(&a.resolution.rank()))
        .then_with(|| b.seeders.cmp(&a.seeders))
}

fn absent_last(a: Option<u32>, b: Option<u32>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
