use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{EntId, PopId};

/// The rollout record of a single entity, reported by the shard that owns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blob {
    pub ent_id: EntId,
    pub pop_id: PopId,
    /// The amount of ticks the entity was observed for.
    pub lifetime: u32,
    /// The sum of the rewards received over the rollout.
    pub reward: f32,
    /// The policy's value estimate at the end of the rollout.
    pub value: f32,
}

/// The behavioral summary of a shard, or of many merged shards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySummary {
    pub blobs: Vec<Blob>,
}

impl TelemetrySummary {
    pub fn new(blobs: Vec<Blob>) -> Self {
        Self { blobs }
    }

    /// Returns the amount of rollout records in this summary.
    pub fn events(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

/// Named statistic series, as reported by the simulation and by each shard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunLog {
    pub series: BTreeMap<String, Vec<f64>>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `value` to the series named `key`.
    pub fn record(&mut self, key: impl Into<String>, value: f64) {
        self.series.entry(key.into()).or_default().push(value);
    }

    /// Returns the series named `key`, if any value was recorded for it.
    pub fn get(&self, key: &str) -> Option<&[f64]> {
        self.series.get(key).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}
