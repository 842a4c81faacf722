//! In-memory repository and the record bookkeeping shared with the journal.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use wickscan_core::domain::{ActiveSetup, SetupId, SetupStatus, Signal, SignalId, Timeframe};

use crate::repository::{InsertOutcome, RepositoryError, SetupRepository};

/// Indexed setups and signals plus the write checks of the repository contract.
///
/// `check_*` methods never mutate; `put_*` methods never check. Callers check,
/// make the write durable if they need to, then put.
#[derive(Debug, Default)]
pub(crate) struct RepositoryState {
    setups: BTreeMap<SetupId, ActiveSetup>,
    keys: HashMap<(String, DateTime<Utc>), SetupId>,
    signals: BTreeMap<SignalId, Signal>,
    signal_by_setup: HashMap<SetupId, SignalId>,
}

impl RepositoryState {
    /// `Some(existing)` when the setup's key is already taken.
    pub(crate) fn check_insert_setup(
        &self,
        setup: &ActiveSetup,
    ) -> Result<Option<SetupId>, RepositoryError> {
        let key = (setup.pair.clone(), setup.signal_candle_time);
        if let Some(existing) = self.keys.get(&key) {
            return Ok(Some(existing.clone()));
        }
        if self.setups.contains_key(&setup.id) {
            return Err(RepositoryError::InvalidTransition {
                id: setup.id.to_string(),
                reason: "id already belongs to a different setup".into(),
            });
        }
        Ok(None)
    }

    pub(crate) fn check_update_setup(
        &self,
        previous: &ActiveSetup,
        next: &ActiveSetup,
    ) -> Result<(), RepositoryError> {
        let stored = self
            .setups
            .get(&previous.id)
            .ok_or_else(|| RepositoryError::NotFound(previous.id.to_string()))?;
        if stored != previous {
            return Err(RepositoryError::Conflict {
                id: previous.id.to_string(),
            });
        }

        let reason = if next.id != previous.id || next.key() != previous.key() {
            Some("identity cannot change".to_string())
        } else if stored.status.is_terminal() {
            Some(format!("setup is already {}", stored.status))
        } else if next.setup != previous.setup {
            Some("levels are frozen once stored".to_string())
        } else if next.candles_elapsed < previous.candles_elapsed {
            Some("candles_elapsed cannot decrease".to_string())
        } else {
            None
        };
        match reason {
            Some(reason) => Err(RepositoryError::InvalidTransition {
                id: previous.id.to_string(),
                reason,
            }),
            None => Ok(()),
        }
    }

    pub(crate) fn check_insert_signal(&self, signal: &Signal) -> Result<(), RepositoryError> {
        let setup = self
            .setups
            .get(&signal.setup_id)
            .ok_or_else(|| RepositoryError::NotFound(signal.setup_id.to_string()))?;
        if let Some(existing) = self.signal_by_setup.get(&signal.setup_id) {
            return Err(RepositoryError::DuplicateSignal {
                setup_id: signal.setup_id.clone(),
                existing: existing.clone(),
            });
        }
        if setup.status != SetupStatus::Triggered {
            return Err(RepositoryError::InvalidTransition {
                id: signal.id.to_string(),
                reason: format!("setup {} is {}, not TRIGGERED", setup.id, setup.status),
            });
        }
        if self.signals.contains_key(&signal.id) {
            return Err(RepositoryError::InvalidTransition {
                id: signal.id.to_string(),
                reason: "id already belongs to a different signal".into(),
            });
        }
        Ok(())
    }

    pub(crate) fn check_update_signal(
        &self,
        previous: &Signal,
        next: &Signal,
    ) -> Result<(), RepositoryError> {
        let stored = self
            .signals
            .get(&previous.id)
            .ok_or_else(|| RepositoryError::NotFound(previous.id.to_string()))?;
        if stored != previous {
            return Err(RepositoryError::Conflict {
                id: previous.id.to_string(),
            });
        }

        let frozen = next.id == previous.id
            && next.setup_id == previous.setup_id
            && next.direction == previous.direction
            && next.entry == previous.entry
            && next.stop_loss == previous.stop_loss
            && next.take_profit == previous.take_profit
            && next.triggered_at == previous.triggered_at;
        let reason = if !stored.is_open() {
            Some("outcome is already written".to_string())
        } else if !frozen {
            Some("signal levels are frozen".to_string())
        } else {
            None
        };
        match reason {
            Some(reason) => Err(RepositoryError::InvalidTransition {
                id: previous.id.to_string(),
                reason,
            }),
            None => Ok(()),
        }
    }

    pub(crate) fn put_setup(&mut self, setup: ActiveSetup) {
        self.keys
            .insert((setup.pair.clone(), setup.signal_candle_time), setup.id.clone());
        self.setups.insert(setup.id.clone(), setup);
    }

    pub(crate) fn put_signal(&mut self, signal: Signal) {
        self.signal_by_setup
            .insert(signal.setup_id.clone(), signal.id.clone());
        self.signals.insert(signal.id.clone(), signal);
    }

    pub(crate) fn waiting_setups(&self, pair: &str, timeframe: Timeframe) -> Vec<ActiveSetup> {
        self.setups
            .values()
            .filter(|s| s.status == SetupStatus::Waiting && s.pair == pair && s.timeframe == timeframe)
            .cloned()
            .collect()
    }

    pub(crate) fn triggered_without_signal(&self, pair: &str, timeframe: Timeframe) -> Vec<ActiveSetup> {
        self.setups
            .values()
            .filter(|s| {
                s.status == SetupStatus::Triggered
                    && s.pair == pair
                    && s.timeframe == timeframe
                    && !self.signal_by_setup.contains_key(&s.id)
            })
            .cloned()
            .collect()
    }

    pub(crate) fn open_signals(&self, pair: &str, timeframe: Timeframe) -> Vec<Signal> {
        self.signals
            .values()
            .filter(|s| s.is_open() && s.pair == pair && s.timeframe == timeframe)
            .cloned()
            .collect()
    }

    pub(crate) fn setups(&self) -> Vec<ActiveSetup> {
        self.setups.values().cloned().collect()
    }

    pub(crate) fn signals(&self) -> Vec<Signal> {
        self.signals.values().cloned().collect()
    }
}

/// Lock a state mutex. A poisoned lock is recovered: every write is checked
/// before any field is touched, so a panicking holder cannot leave it half-updated.
pub(crate) fn lock(state: &Mutex<RepositoryState>) -> MutexGuard<'_, RepositoryState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

/// Mutex-guarded maps. Nothing survives the process.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    state: Mutex<RepositoryState>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SetupRepository for InMemoryRepository {
    fn insert_setup(&self, setup: ActiveSetup) -> Result<InsertOutcome, RepositoryError> {
        let mut state = lock(&self.state);
        if let Some(existing) = state.check_insert_setup(&setup)? {
            return Ok(InsertOutcome::Duplicate { existing });
        }
        let id = setup.id.clone();
        state.put_setup(setup);
        Ok(InsertOutcome::Created { id })
    }

    fn waiting_setups(&self, pair: &str, timeframe: Timeframe) -> Result<Vec<ActiveSetup>, RepositoryError> {
        Ok(lock(&self.state).waiting_setups(pair, timeframe))
    }

    fn update_setup(&self, previous: &ActiveSetup, next: &ActiveSetup) -> Result<(), RepositoryError> {
        let mut state = lock(&self.state);
        state.check_update_setup(previous, next)?;
        state.put_setup(next.clone());
        Ok(())
    }

    fn insert_signal(&self, signal: Signal) -> Result<(), RepositoryError> {
        let mut state = lock(&self.state);
        state.check_insert_signal(&signal)?;
        state.put_signal(signal);
        Ok(())
    }

    fn triggered_without_signal(
        &self,
        pair: &str,
        timeframe: Timeframe,
    ) -> Result<Vec<ActiveSetup>, RepositoryError> {
        Ok(lock(&self.state).triggered_without_signal(pair, timeframe))
    }

    fn open_signals(&self, pair: &str, timeframe: Timeframe) -> Result<Vec<Signal>, RepositoryError> {
        Ok(lock(&self.state).open_signals(pair, timeframe))
    }

    fn update_signal(&self, previous: &Signal, next: &Signal) -> Result<(), RepositoryError> {
        let mut state = lock(&self.state);
        state.check_update_signal(previous, next)?;
        state.put_signal(next.clone());
        Ok(())
    }

    fn setups(&self) -> Result<Vec<ActiveSetup>, RepositoryError> {
        Ok(lock(&self.state).setups())
    }

    fn signals(&self) -> Result<Vec<Signal>, RepositoryError> {
        Ok(lock(&self.state).signals())
    }
}
