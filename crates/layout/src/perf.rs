use flowbox_types::BoxId;
use std::collections::HashMap;

/// Counters collected during one layout run.
///
/// These make the termination guarantees observable: tests assert on
/// `max_block_attempts` and `forced_line_outputs` instead of timing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutStats {
    /// Highest number of layout attempts any single block child needed.
    pub max_block_attempts: usize,
    /// Block children that were laid out more than once.
    pub block_relayouts: usize,
    /// Runs of `page-break-before/after: avoid` siblings laid out again.
    pub run_relayouts: usize,
    /// `page-break-inside: avoid` or run constraints given up on.
    pub accepted_violations: usize,
    /// Line break calls that were told to emit content regardless of fit.
    pub forced_line_outputs: usize,
    pub lines_committed: usize,
    pub floats_placed: usize,
    pub footnotes_added: usize,
    pub pages_created: usize,
    pub pages_trimmed: usize,
    pub measure_hits: usize,
    pub measure_misses: usize,
    attempts: HashMap<BoxId, usize>,
}

impl LayoutStats {
    /// Records one layout attempt of `id` as a block child.
    pub fn record_block_attempt(&mut self, id: BoxId) {
        let count = self.attempts.entry(id).or_default();
        *count += 1;
        if *count == 2 {
            self.block_relayouts += 1;
        }
        self.max_block_attempts = self.max_block_attempts.max(*count);
    }

    /// Forgets per-box attempt counts, called when a box's parent starts a
    /// fresh pass (for example when an enclosing run is relaid).
    pub fn clear_block_attempts(&mut self, id: BoxId) {
        self.attempts.remove(&id);
    }

    pub fn log_summary(&self) {
        let total = self.measure_hits + self.measure_misses;
        log::info!("=== Layout Summary ===");
        log::info!(
            "Pages: {} created, {} trimmed; lines: {}; floats: {}; footnotes: {}",
            self.pages_created,
            self.pages_trimmed,
            self.lines_committed,
            self.floats_placed,
            self.footnotes_added
        );
        log::info!(
            "Relayouts: {} blocks (max {} attempts), {} runs, {} accepted violations, {} forced lines",
            self.block_relayouts,
            self.max_block_attempts,
            self.run_relayouts,
            self.accepted_violations,
            self.forced_line_outputs
        );
        if total > 0 {
            log::info!(
                "Measure cache hits: {} ({:.1}%)",
                self.measure_hits,
                (self.measure_hits as f64 / total as f64) * 100.0
            );
        }
    }
}
