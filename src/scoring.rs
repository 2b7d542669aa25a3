//! Score, line count and level progression.

use serde::Serialize;

pub const BASE_LINE_SCORE: u64 = 100;
pub const LINES_PER_LEVEL: u32 = 10;

// Timing (in milliseconds)
pub const BASE_DROP_INTERVAL_MS: u64 = 1000;
pub const MIN_DROP_INTERVAL_MS: u64 = 100;
const DROP_INTERVAL_STEP_MS: u64 = 100;

/// Points for clearing `rows` rows in one sweep at `level`: rows² × 100 × level.
pub fn score_for(rows: u32, level: u32) -> u64 {
    let rows = rows as u64;
    rows * rows * BASE_LINE_SCORE * level as u64
}

/// Drop interval for a level, floored at 100ms.
pub fn drop_interval_for(level: u32) -> u64 {
    BASE_DROP_INTERVAL_MS
        .saturating_sub(level as u64 * DROP_INTERVAL_STEP_MS)
        .max(MIN_DROP_INTERVAL_MS)
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct Progress {
    pub score: u64,
    pub level: u32,
    pub lines: u32,
    pub drop_interval_ms: u64,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ClearAward {
    pub score_delta: u64,
    pub level_up: bool,
}

impl Progress {
    pub fn new() -> Self {
        Self {
            score: 0,
            level: 1,
            lines: 0,
            drop_interval_ms: BASE_DROP_INTERVAL_MS,
        }
    }

    /// Applies one sweep's cleared rows.
    ///
    /// Only a single level is gained per call, even when the new line total
    /// crosses more than one threshold.
    pub fn record_clear(&mut self, rows: u32) -> ClearAward {
        let score_delta = score_for(rows, self.level);
        self.score += score_delta;
        self.lines += rows;

        let level_up = self.lines >= self.level * LINES_PER_LEVEL;
        if level_up {
            self.level += 1;
            self.drop_interval_ms = drop_interval_for(self.level);
        }

        ClearAward {
            score_delta,
            level_up,
        }
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}
