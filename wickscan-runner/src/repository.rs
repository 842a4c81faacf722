//! Setup repository: the sole owner of setup/signal identity and write ordering.
//!
//! The lifecycle functions in `wickscan-core` mutate setups and signals in
//! memory; this trait is where those mutations become durable. Implementations
//! must honour the following contract:
//!
//! - **Create-or-reject**: at most one setup per `(pair, signal_candle_time)`.
//!   A second insert for the same key returns [`InsertOutcome::Duplicate`]
//!   and leaves the stored setup untouched.
//! - **Compare-and-swap updates**: `update_setup` and `update_signal` take the
//!   record as it was read and the record to store. The write succeeds only
//!   if the stored record still matches what was read; otherwise it fails
//!   with [`RepositoryError::Conflict`]. Two writers advancing the same setup
//!   over the same candles cannot both apply the transition.
//! - **One signal per setup**, and an outcome is written at most once.
//!
//! A setup's TRIGGERED update and its signal insert are separate writes. If the
//! second fails, `triggered_without_signal` surfaces the setup so a later pass
//! can create the missing signal.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use wickscan_core::domain::{ActiveSetup, SetupId, Signal, SignalId, Timeframe};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("conflicting write to {id}: stored record changed since it was read")]
    Conflict { id: String },

    #[error("no record with id {0}")]
    NotFound(String),

    #[error("setup {setup_id} already has signal {existing}")]
    DuplicateSignal { setup_id: SetupId, existing: SignalId },

    #[error("invalid write to {id}: {reason}")]
    InvalidTransition { id: String, reason: String },

    #[error("journal '{path}' is open in another process")]
    Locked { path: String },

    #[error("journal '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("journal encoding: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Result of a create-or-reject insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InsertOutcome {
    Created { id: SetupId },
    /// A setup with the same `(pair, signal_candle_time)` already exists.
    Duplicate { existing: SetupId },
}

pub trait SetupRepository: Send + Sync {
    /// Store a new WAITING setup unless its key is already taken.
    fn insert_setup(&self, setup: ActiveSetup) -> Result<InsertOutcome, RepositoryError>;

    /// WAITING setups for one instrument and timeframe.
    fn waiting_setups(&self, pair: &str, timeframe: Timeframe) -> Result<Vec<ActiveSetup>, RepositoryError>;

    /// Replace `previous` with `next`. Fails with `Conflict` if the stored
    /// setup no longer equals `previous`.
    fn update_setup(&self, previous: &ActiveSetup, next: &ActiveSetup) -> Result<(), RepositoryError>;

    fn insert_signal(&self, signal: Signal) -> Result<(), RepositoryError>;

    /// TRIGGERED setups that have no signal yet.
    fn triggered_without_signal(
        &self,
        pair: &str,
        timeframe: Timeframe,
    ) -> Result<Vec<ActiveSetup>, RepositoryError>;

    /// Signals without an outcome for one instrument and timeframe.
    fn open_signals(&self, pair: &str, timeframe: Timeframe) -> Result<Vec<Signal>, RepositoryError>;

    /// Replace an open signal. Fails with `Conflict` if the stored signal no
    /// longer equals `previous` (including when it was already resolved).
    fn update_signal(&self, previous: &Signal, next: &Signal) -> Result<(), RepositoryError>;

    /// Every stored setup, ordered by id.
    fn setups(&self) -> Result<Vec<ActiveSetup>, RepositoryError>;

    /// Every stored signal, ordered by id.
    fn signals(&self) -> Result<Vec<Signal>, RepositoryError>;
}
