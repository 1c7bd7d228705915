use comms::specs::{Blob, RunLog, TelemetrySummary};

/// An associative combine with an identity element.
///
/// Implementors let per-shard reports be folded into one, in any grouping.
pub trait Merge: Sized {
    /// The identity element of `combine`.
    fn empty() -> Self;

    fn combine(self, other: Self) -> Self;

    /// Folds every item of `iter` into one, starting from `empty`.
    fn merge_all<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        iter.into_iter().fold(Self::empty(), Self::combine)
    }
}

/// The canonical blob order, total even in presence of NaN rewards.
fn canonical(a: &Blob, b: &Blob) -> std::cmp::Ordering {
    a.ent_id
        .cmp(&b.ent_id)
        .then(a.lifetime.cmp(&b.lifetime))
        .then(a.reward.total_cmp(&b.reward))
        .then(a.value.total_cmp(&b.value))
        .then(a.pop_id.cmp(&b.pop_id))
}

impl Merge for TelemetrySummary {
    fn empty() -> Self {
        Self::default()
    }

    /// Keeps every blob of both sides, in canonical order so the result
    /// doesn't depend on the order shards answered in.
    fn combine(mut self, other: Self) -> Self {
        self.blobs.extend(other.blobs);
        self.blobs.sort_by(canonical);
        self
    }
}

impl Merge for RunLog {
    fn empty() -> Self {
        Self::default()
    }

    /// Concatenates series by key, `self`'s values go first.
    fn combine(mut self, other: Self) -> Self {
        for (key, values) in other.series {
            self.series.entry(key).or_default().extend(values);
        }
        self
    }
}
