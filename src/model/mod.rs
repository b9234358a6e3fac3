//! Trace model: per-process cumulative tick series indexed by global tick.

pub mod align;

pub use align::{align, carry_forward};

use serde::Serialize;
use std::collections::BTreeMap;

/// Process slot id as printed by the scheduler (1-based).
pub type ProcessId = u32;

/// Cumulative ticks consumed by one process, position = global tick index.
pub type ProcessSeries = Vec<u64>;

/// Ids pre-seeded before parsing (the reference runs use slots 1..=7).
pub const DEFAULT_UNIVERSE: [ProcessId; 7] = [1, 2, 3, 4, 5, 6, 7];

/// Complete per-process table derived from one log file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Trace {
    /// Minimum tick-axis length implied by tick markers (0 if none were seen).
    pub ticks: usize,
    pub series: BTreeMap<ProcessId, ProcessSeries>,
    /// Display names from observation lines. Never used for identity.
    pub names: BTreeMap<ProcessId, String>,
}

/// Final cumulative ticks for one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessTotal {
    pub pid: ProcessId,
    pub name: Option<String>,
    pub ticks: u64,
}

impl Trace {
    /// Empty trace with every id in `universe` seeded at the 0 baseline.
    pub fn seeded(universe: &[ProcessId]) -> Self {
        let series = universe.iter().map(|&pid| (pid, vec![0])).collect();
        Self {
            ticks: 0,
            series,
            names: BTreeMap::new(),
        }
    }

    /// Length of the longest series.
    pub fn max_len(&self) -> usize {
        self.series.values().map(Vec::len).max().unwrap_or(0)
    }

    /// Shared x axis of an aligned trace: `0..len`.
    pub fn tick_axis(&self) -> std::ops::Range<usize> {
        0..self.max_len()
    }

    /// True if every series has the same length.
    pub fn is_aligned(&self) -> bool {
        let mut lens = self.series.values().map(Vec::len);
        match lens.next() {
            Some(first) => lens.all(|l| l == first),
            None => true,
        }
    }

    /// Ids whose series does not start at 0 or decreases somewhere.
    pub fn monotonic_violations(&self) -> Vec<ProcessId> {
        self.series
            .iter()
            .filter(|(_, s)| {
                s.first().is_some_and(|&v| v != 0) || s.windows(2).any(|w| w[1] < w[0])
            })
            .map(|(&pid, _)| pid)
            .collect()
    }

    /// Final value of every series, in id order.
    pub fn summarize(&self) -> Vec<ProcessTotal> {
        self.series
            .iter()
            .map(|(&pid, s)| ProcessTotal {
                pid,
                name: self.names.get(&pid).cloned(),
                ticks: s.last().copied().unwrap_or(0),
            })
            .collect()
    }
}
