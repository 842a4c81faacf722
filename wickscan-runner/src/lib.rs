//! WickScan Runner: batch scanning, lifecycle processing and persistence.
//!
//! This crate builds on `wickscan-core` to provide:
//! - Scanner configuration (instruments, timeframes, strategy) from TOML
//! - Candle providers (CSV directory, in-memory)
//! - Setup repositories with create-or-reject inserts and compare-and-swap
//!   updates (in-memory, JSONL journal)
//! - The `Scanner`: parallel scan, monitor pass, stats

pub mod config;
pub mod journal;
pub mod memory;
pub mod provider;
pub mod repository;
pub mod scanner;
pub mod summary;

pub use config::{ConfigError, IdScheme, InstrumentEntry, ScannerConfig};
pub use journal::{JournalRecord, JournalRepository};
pub use memory::InMemoryRepository;
pub use provider::{CandleProvider, CsvCandleProvider, MemoryCandleProvider, ProviderError};
pub use repository::{InsertOutcome, RepositoryError, SetupRepository};
pub use scanner::{ScanError, Scanner};
pub use summary::{ScanSummary, Stats};
