//! Scanner: drives detection and the setup lifecycle across every configured
//! instrument and timeframe.
//!
//! - `scan()` evaluates each (pair, timeframe) in parallel, then persists
//!   valid setups one at a time so id assignment is deterministic.
//! - `monitor()` advances WAITING setups over candles they have not seen,
//!   freezes triggered ones into signals, then resolves open signals. A
//!   TRIGGERED setup whose signal write failed on an earlier pass gets its
//!   signal on the next one.
//! - One instrument failing adds a line to `ScanSummary::errors` and never
//!   halts the batch.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use wickscan_core::analysis::SetupVerdict;
use wickscan_core::domain::{
    ActiveSetup, CandleError, CandleSeries, InstrumentConfig, Signal, Timeframe, TradeSetup,
};
use wickscan_core::ids::IdGenerator;
use wickscan_core::lifecycle::{advance_setup_many, resolve_signal_many, MonitorStep, ResolveStep};
use wickscan_core::scan_series;

use crate::config::ScannerConfig;
use crate::provider::{CandleProvider, ProviderError};
use crate::repository::{InsertOutcome, RepositoryError, SetupRepository};
use crate::summary::{ScanSummary, Stats};

/// Why one (pair, timeframe) job failed.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("malformed candles: {0}")]
    Candles(#[from] CandleError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// A valid setup found by the detection pass, not yet persisted.
#[derive(Debug, Clone, PartialEq)]
struct Detection {
    pair: String,
    timeframe: Timeframe,
    signal_time: DateTime<Utc>,
    setup: TradeSetup,
}

pub struct Scanner {
    config: ScannerConfig,
    provider: Arc<dyn CandleProvider>,
    repository: Arc<dyn SetupRepository>,
    ids: Arc<dyn IdGenerator>,
}

impl Scanner {
    pub fn new(
        config: ScannerConfig,
        provider: Arc<dyn CandleProvider>,
        repository: Arc<dyn SetupRepository>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            config,
            provider,
            repository,
            ids,
        }
    }

    /// Build with the id generator named in the config.
    pub fn from_config(
        config: ScannerConfig,
        provider: Arc<dyn CandleProvider>,
        repository: Arc<dyn SetupRepository>,
    ) -> Self {
        let ids = config.id_generator();
        Self::new(config, provider, repository, ids)
    }

    // ── Scan ─────────────────────────────────────────────────────────

    /// Look for new setups on every configured instrument and timeframe.
    pub fn scan(&self) -> ScanSummary {
        let jobs = self.config.jobs();
        info!(jobs = jobs.len(), provider = self.provider.name(), "scan started");

        let results: Vec<(String, Timeframe, Result<Option<Detection>, ScanError>)> = jobs
            .par_iter()
            .map(|(instrument, tf)| (instrument.pair.clone(), *tf, self.detect(instrument, *tf)))
            .collect();

        let mut summary = ScanSummary::default();
        for (pair, tf, result) in results {
            match result.and_then(|found| self.persist(found)) {
                Ok(Some(InsertOutcome::Created { id })) => {
                    info!(setup = %id, %pair, timeframe = %tf, "setup stored");
                    summary.signals_found += 1;
                }
                Ok(Some(InsertOutcome::Duplicate { existing })) => {
                    debug!(setup = %existing, %pair, timeframe = %tf, "setup already stored");
                    summary.duplicates_skipped += 1;
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(%pair, timeframe = %tf, error = %e, "scan failed");
                    summary.errors.push(format!("{pair} {tf}: {e}"));
                }
            }
        }

        info!(
            found = summary.signals_found,
            duplicates = summary.duplicates_skipped,
            errors = summary.errors.len(),
            "scan finished"
        );
        summary
    }

    fn detect(&self, instrument: &InstrumentConfig, tf: Timeframe) -> Result<Option<Detection>, ScanError> {
        let series = self.fetch(&instrument.pair, tf)?;
        let result = scan_series(&series, instrument, &self.config.strategy);

        let (Some(signal), Some(verdict)) = (result.signal_candle, result.verdict) else {
            return Ok(None);
        };
        match verdict {
            SetupVerdict::Valid { setup } => Ok(Some(Detection {
                pair: instrument.pair.clone(),
                timeframe: tf,
                signal_time: signal.time,
                setup,
            })),
            SetupVerdict::Invalid { reason, .. } => {
                debug!(pair = %instrument.pair, timeframe = %tf, %reason, "setup rejected");
                Ok(None)
            }
            SetupVerdict::NoStructure => {
                debug!(pair = %instrument.pair, timeframe = %tf, "no structure point for stop");
                Ok(None)
            }
        }
    }

    fn persist(&self, found: Option<Detection>) -> Result<Option<InsertOutcome>, ScanError> {
        let Some(found) = found else {
            return Ok(None);
        };
        let id = self.ids.setup_id(&found.pair, found.timeframe, found.signal_time);
        let setup = ActiveSetup::new(id, found.pair, found.timeframe, found.signal_time, found.setup);
        Ok(Some(self.repository.insert_setup(setup)?))
    }

    // ── Monitor ──────────────────────────────────────────────────────

    /// Advance waiting setups and resolve open signals on every job.
    pub fn monitor(&self) -> ScanSummary {
        let jobs = self.config.jobs();
        info!(jobs = jobs.len(), "monitor started");

        let summary = jobs
            .par_iter()
            .map(|(instrument, tf)| {
                self.monitor_job(&instrument.pair, *tf)
                    .unwrap_or_else(|e| {
                        warn!(pair = %instrument.pair, timeframe = %tf, error = %e, "monitor failed");
                        ScanSummary {
                            errors: vec![format!("{} {tf}: {e}", instrument.pair)],
                            ..ScanSummary::default()
                        }
                    })
            })
            .reduce(ScanSummary::default, ScanSummary::merged);

        info!(
            triggered = summary.triggered_count,
            expired = summary.expired_count,
            wins = summary.win_count,
            losses = summary.loss_count,
            errors = summary.errors.len(),
            "monitor finished"
        );
        summary
    }

    fn monitor_job(&self, pair: &str, tf: Timeframe) -> Result<ScanSummary, ScanError> {
        let unsignalled = self.repository.triggered_without_signal(pair, tf)?;
        let waiting = self.repository.waiting_setups(pair, tf)?;
        let open = self.repository.open_signals(pair, tf)?;
        if unsignalled.is_empty() && waiting.is_empty() && open.is_empty() {
            return Ok(ScanSummary::default());
        }

        let mut summary = ScanSummary::default();
        for setup in unsignalled {
            match self.open_signal(&setup) {
                Ok(()) => info!(setup = %setup.id, pair = %setup.pair, "missing signal created"),
                Err(e) => summary.errors.push(format!("{pair} {tf}: {e}")),
            }
        }

        let series = self.fetch(pair, tf)?;

        for setup in waiting {
            if let Err(e) = self.advance(setup, &series, &mut summary) {
                summary.errors.push(format!("{pair} {tf}: {e}"));
            }
        }

        // Includes signals created by triggers above.
        for signal in self.repository.open_signals(pair, tf)? {
            if let Err(e) = self.resolve(signal, &series, &mut summary) {
                summary.errors.push(format!("{pair} {tf}: {e}"));
            }
        }
        Ok(summary)
    }

    fn advance(
        &self,
        previous: ActiveSetup,
        series: &CandleSeries,
        summary: &mut ScanSummary,
    ) -> Result<(), ScanError> {
        let mut next = previous.clone();
        let report = advance_setup_many(
            &mut next,
            series.complete_after(previous.watermark()),
            self.config.strategy.max_candles_for_entry,
        );
        if report.applied == 0 {
            return Ok(());
        }

        self.repository.update_setup(&previous, &next)?;
        match report.last {
            MonitorStep::Triggered { candles_elapsed } => {
                info!(setup = %next.id, pair = %next.pair, candles_elapsed, "setup triggered");
                summary.triggered_count += 1;
                self.open_signal(&next)?;
            }
            MonitorStep::Expired { candles_elapsed } => {
                info!(setup = %next.id, pair = %next.pair, candles_elapsed, "setup expired");
                summary.expired_count += 1;
            }
            _ => {}
        }
        Ok(())
    }

    /// Store the signal for a TRIGGERED setup. A signal another writer
    /// already stored for the same setup counts as success.
    fn open_signal(&self, setup: &ActiveSetup) -> Result<(), ScanError> {
        let id = self.ids.signal_id(&setup.id);
        let Some(signal) = Signal::from_triggered(id, setup) else {
            return Ok(());
        };
        match self.repository.insert_signal(signal) {
            Ok(()) | Err(RepositoryError::DuplicateSignal { .. }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn resolve(
        &self,
        previous: Signal,
        series: &CandleSeries,
        summary: &mut ScanSummary,
    ) -> Result<(), ScanError> {
        let mut next = previous.clone();
        let step = resolve_signal_many(
            &mut next,
            series.complete_after(previous.observed_through),
            self.config.strategy.outcome_priority,
        );
        if next == previous {
            return Ok(());
        }

        self.repository.update_signal(&previous, &next)?;
        if let ResolveStep::Resolved { outcome } = step {
            info!(signal = %next.id, pair = %next.pair, %outcome, "signal resolved");
            summary.record_outcome(outcome);
        }
        Ok(())
    }

    // ── Stats ────────────────────────────────────────────────────────

    pub fn stats(&self) -> Result<Stats, RepositoryError> {
        let setups = self.repository.setups()?;
        let signals = self.repository.signals()?;
        Ok(Stats::from_records(&setups, &signals))
    }

    fn fetch(&self, pair: &str, tf: Timeframe) -> Result<CandleSeries, ScanError> {
        let candles = self.provider.fetch(pair, tf)?;
        Ok(CandleSeries::new(candles)?)
    }
}
