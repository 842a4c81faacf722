//! Setup lifecycle: retracement monitoring and outcome resolution.
//!
//! Both halves mutate persisted entities, so callers must hold single-writer
//! ownership of the setup or signal they pass in (see the runner's repository
//! contract).

pub mod monitor;
pub mod outcome;

pub use monitor::{advance_setup, advance_setup_many, retraces_into, MonitorReport, MonitorStep};
pub use outcome::{check_outcome, resolve_signal, resolve_signal_many, OutcomePriority, ResolveStep};
