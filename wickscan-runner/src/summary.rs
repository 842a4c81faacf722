//! Per-invocation counters and repository-wide stats.

use serde::{Deserialize, Serialize};
use wickscan_core::domain::{ActiveSetup, Outcome, SetupStatus, Signal};

/// What one `scan` or `monitor` pass did. Summaries from separate passes merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    /// New setups persisted by a scan.
    pub signals_found: u32,
    /// Valid setups whose key was already stored.
    pub duplicates_skipped: u32,
    pub triggered_count: u32,
    pub expired_count: u32,
    pub win_count: u32,
    pub loss_count: u32,
    /// One line per failed instrument or rejected write.
    pub errors: Vec<String>,
}

impl ScanSummary {
    pub fn merge(&mut self, other: ScanSummary) {
        self.signals_found += other.signals_found;
        self.duplicates_skipped += other.duplicates_skipped;
        self.triggered_count += other.triggered_count;
        self.expired_count += other.expired_count;
        self.win_count += other.win_count;
        self.loss_count += other.loss_count;
        self.errors.extend(other.errors);
    }

    pub fn merged(mut self, other: ScanSummary) -> Self {
        self.merge(other);
        self
    }

    pub fn record_outcome(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Win => self.win_count += 1,
            Outcome::Loss => self.loss_count += 1,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Raw counts over everything in a repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub setups_waiting: u32,
    pub setups_triggered: u32,
    pub setups_expired: u32,
    pub signals_open: u32,
    pub signals_won: u32,
    pub signals_lost: u32,
}

impl Stats {
    pub fn from_records(setups: &[ActiveSetup], signals: &[Signal]) -> Self {
        let mut stats = Self::default();
        for setup in setups {
            match setup.status {
                SetupStatus::Waiting => stats.setups_waiting += 1,
                SetupStatus::Triggered => stats.setups_triggered += 1,
                SetupStatus::Expired => stats.setups_expired += 1,
            }
        }
        for signal in signals {
            match signal.outcome {
                None => stats.signals_open += 1,
                Some(Outcome::Win) => stats.signals_won += 1,
                Some(Outcome::Loss) => stats.signals_lost += 1,
            }
        }
        stats
    }

    /// Wins over resolved signals, `None` before the first resolution.
    pub fn win_rate(&self) -> Option<f64> {
        let resolved = self.signals_won + self.signals_lost;
        (resolved > 0).then(|| f64::from(self.signals_won) / f64::from(resolved))
    }
}
