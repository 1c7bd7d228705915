use comms::specs::TelemetrySummary;

use crate::telemetry::Merge;

/// The accumulation window of a `step` call.
///
/// It starts empty and closes the moment it holds at least one gradient.
#[derive(Debug, Clone, Default)]
pub struct Cycle {
    gradients: Vec<Vec<f32>>,
    telemetry: TelemetrySummary,
    ticks: usize,
}

impl Cycle {
    /// Empties every accumulator, opening a new cycle.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Adds one shard's gradient to the cycle.
    pub fn push_gradient(&mut self, gradient: Vec<f32>) {
        self.gradients.push(gradient);
    }

    /// Merges one shard's telemetry into the cycle's summary.
    pub fn merge_telemetry(&mut self, telemetry: TelemetrySummary) {
        let merged = std::mem::take(&mut self.telemetry).combine(telemetry);
        self.telemetry = merged;
    }

    pub fn record_tick(&mut self) {
        self.ticks += 1;
    }

    /// Whether the cycle gathered a gradient and is ready to be reported.
    pub fn is_closed(&self) -> bool {
        !self.gradients.is_empty()
    }

    pub fn gradients(&self) -> &[Vec<f32>] {
        &self.gradients
    }

    pub fn telemetry(&self) -> &TelemetrySummary {
        &self.telemetry
    }

    /// Returns the amount of ticks run since the cycle was opened.
    pub fn ticks(&self) -> usize {
        self.ticks
    }

    /// Moves the telemetry out, leaving an empty summary behind.
    pub fn take_telemetry(&mut self) -> TelemetrySummary {
        std::mem::take(&mut self.telemetry)
    }
}
