//! BDD tests for the Scanner
//!
//! These tests drive the full pipeline through the runner:
//! - Scan → persist, with create-or-reject deduplication
//! - Monitor → trigger → signal → outcome
//! - Expiry after the entry window
//! - Journal persistence across scanner instances
//! - Concurrent monitors over one repository
//! - Per-instrument failures collected, not fatal
//! - A failed signal write repaired on the next monitor pass
//! - The SELL side of the pipeline on a down-trend

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use wickscan_core::domain::{
    ActiveSetup, Candle, Direction, Outcome, SetupStatus, Signal, SwingKind, Timeframe,
};
use wickscan_runner::{
    CsvCandleProvider, IdScheme, InMemoryRepository, InsertOutcome, InstrumentEntry,
    JournalRepository, MemoryCandleProvider, RepositoryError, ScanSummary, Scanner,
    ScannerConfig, SetupRepository,
};

// ── Helpers ──────────────────────────────────────────────────────────

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn at(hour: i64, open: f64, high: f64, low: f64, close: f64) -> Candle {
    Candle {
        time: start() + Duration::hours(hour),
        open,
        high,
        low,
        close,
        complete: true,
    }
}

/// Higher highs and higher lows ending in a wickless bullish candle at hour 19.
///
/// Latest swing low 1.0985, so a BUY at 1.1010 gets stop 1.0983 and target 1.1037.
fn uptrend_with_signal() -> Vec<Candle> {
    let mids = [
        1.1000, 1.0990, 1.0980, 1.0970, 1.0980, 1.0990, 1.1000, 1.1010, 1.1020, 1.1010, 1.1000,
        1.0990, 1.1000, 1.1010, 1.1020, 1.1030, 1.1020, 1.1010, 1.1005,
    ];
    let mut candles: Vec<Candle> = mids
        .iter()
        .enumerate()
        .map(|(i, m)| at(i as i64, m - 0.00025, m + 0.0005, m - 0.0005, m + 0.00025))
        .collect();
    candles.push(at(19, 1.1010, 1.1030, 1.1010, 1.1028));
    candles
}

fn retrace(hour: i64) -> Candle {
    at(hour, 1.1025, 1.1027, 1.1008, 1.1015)
}

fn reach_target(hour: i64) -> Candle {
    at(hour, 1.1015, 1.1045, 1.1012, 1.1040)
}

fn quiet(hour: i64) -> Candle {
    at(hour, 1.1026, 1.1032, 1.1024, 1.1029)
}

/// Price reflected around 1.1000: highs become lows, bullish becomes bearish.
fn mirrored(candle: Candle) -> Candle {
    Candle {
        open: 2.2 - candle.open,
        high: 2.2 - candle.low,
        low: 2.2 - candle.high,
        close: 2.2 - candle.close,
        ..candle
    }
}

fn config(pairs: &[&str]) -> ScannerConfig {
    ScannerConfig {
        instruments: pairs.iter().map(|p| InstrumentEntry::new(*p)).collect(),
        ids: IdScheme::Sequential,
        ..ScannerConfig::default()
    }
}

fn memory_scanner(pairs: &[&str]) -> (Scanner, Arc<MemoryCandleProvider>, Arc<InMemoryRepository>) {
    let provider = Arc::new(MemoryCandleProvider::new());
    let repository = Arc::new(InMemoryRepository::new());
    let scanner = Scanner::from_config(config(pairs), provider.clone(), repository.clone());
    (scanner, provider, repository)
}

// ── Scan ─────────────────────────────────────────────────────────────

#[test]
fn bdd_scan_stores_setup_once() {
    // GIVEN an up-trending EUR_USD series ending in a wickless candle
    let (scanner, provider, repository) = memory_scanner(&["EUR_USD"]);
    provider.insert("EUR_USD", Timeframe::H1, uptrend_with_signal());

    // WHEN the scanner runs
    let summary = scanner.scan();

    // THEN one WAITING setup is stored with structure-anchored levels
    assert_eq!(summary.signals_found, 1);
    assert!(summary.is_clean());
    let setups = repository.setups().unwrap();
    assert_eq!(setups.len(), 1);
    let setup = &setups[0];
    assert_eq!(setup.status, SetupStatus::Waiting);
    assert_eq!(setup.signal_candle_time, start() + Duration::hours(19));
    assert!((setup.setup.entry_zone - 1.1010).abs() < 1e-9);
    assert!((setup.setup.stop_loss - 1.0983).abs() < 1e-9);
    assert!((setup.setup.take_profit - 1.1037).abs() < 1e-9);

    // WHEN the same candles are scanned again
    let again = scanner.scan();

    // THEN the duplicate is skipped, not stored and not an error
    assert_eq!(again.signals_found, 0);
    assert_eq!(again.duplicates_skipped, 1);
    assert!(again.is_clean());
    assert_eq!(repository.setups().unwrap().len(), 1);
}

#[test]
fn bdd_one_failing_instrument_does_not_halt_the_batch() {
    // GIVEN data for EUR_USD but none for GBP_USD
    let (scanner, provider, _) = memory_scanner(&["EUR_USD", "GBP_USD"]);
    provider.insert("EUR_USD", Timeframe::H1, uptrend_with_signal());

    // WHEN the scanner runs
    let summary = scanner.scan();

    // THEN EUR_USD is stored and GBP_USD is reported
    assert_eq!(summary.signals_found, 1);
    assert_eq!(summary.errors.len(), 1);
    assert!(summary.errors[0].starts_with("GBP_USD H1"));
}

#[test]
fn bdd_malformed_candles_are_reported() {
    // GIVEN a series with a candle whose high is below its low
    let (scanner, provider, _) = memory_scanner(&["EUR_USD"]);
    let mut candles = uptrend_with_signal();
    candles[5].high = candles[5].low - 0.001;
    provider.insert("EUR_USD", Timeframe::H1, candles);

    // WHEN the scanner runs
    let summary = scanner.scan();

    // THEN nothing is stored and the error names the instrument
    assert_eq!(summary.signals_found, 0);
    assert_eq!(summary.errors.len(), 1);
    assert!(summary.errors[0].contains("malformed candles"));
}

// ── Monitor ──────────────────────────────────────────────────────────

#[test]
fn bdd_monitor_triggers_then_wins() {
    // GIVEN a stored setup
    let (scanner, provider, repository) = memory_scanner(&["EUR_USD"]);
    provider.insert("EUR_USD", Timeframe::H1, uptrend_with_signal());
    scanner.scan();

    // AND price retraces into the entry, then reaches the target
    provider.extend("EUR_USD", Timeframe::H1, [retrace(20), reach_target(21)]);

    // WHEN the monitor runs
    let summary = scanner.monitor();

    // THEN the setup triggers on the retrace and the signal wins on the next candle
    assert_eq!(summary.triggered_count, 1);
    assert_eq!(summary.win_count, 1);
    assert_eq!(summary.loss_count, 0);
    assert!(summary.is_clean());

    let signals = repository.signals().unwrap();
    assert_eq!(signals.len(), 1);
    assert_eq!(signals[0].triggered_at, start() + Duration::hours(20));
    assert_eq!(signals[0].outcome, Some(Outcome::Win));
    assert_eq!(signals[0].resolved_at, Some(start() + Duration::hours(21)));

    let stats = scanner.stats().unwrap();
    assert_eq!(stats.setups_triggered, 1);
    assert_eq!(stats.signals_won, 1);
    assert_eq!(stats.win_rate(), Some(1.0));

    // WHEN the monitor runs again over the same candles
    // THEN nothing changes
    assert_eq!(scanner.monitor(), ScanSummary::default());
}

#[test]
fn bdd_downtrend_sell_setup_triggers_then_wins() {
    // GIVEN a down-trending EUR_USD series ending in a wickless bearish candle
    let (scanner, provider, repository) = memory_scanner(&["EUR_USD"]);
    provider.insert(
        "EUR_USD",
        Timeframe::H1,
        uptrend_with_signal().into_iter().map(mirrored).collect(),
    );

    // WHEN the scanner runs
    let scanned = scanner.scan();

    // THEN a SELL setup is stored, anchored above the latest swing high
    assert_eq!(scanned.signals_found, 1);
    let setup = repository.setups().unwrap()[0].clone();
    assert_eq!(setup.setup.direction, Direction::Sell);
    assert_eq!(setup.setup.structure_point.kind, SwingKind::High);
    assert!((setup.setup.entry_zone - 1.0990).abs() < 1e-9);
    assert!((setup.setup.stop_loss - 1.1017).abs() < 1e-9);
    assert!((setup.setup.take_profit - 1.0963).abs() < 1e-9);

    // WHEN price rallies into the entry, then falls to the target
    provider.extend(
        "EUR_USD",
        Timeframe::H1,
        [mirrored(retrace(20)), mirrored(reach_target(21))],
    );
    let summary = scanner.monitor();

    // THEN the setup triggers and the SELL signal wins
    assert_eq!(summary.triggered_count, 1);
    assert_eq!(summary.win_count, 1);
    assert!(summary.is_clean());
    let signal = &repository.signals().unwrap()[0];
    assert_eq!(signal.direction, Direction::Sell);
    assert_eq!(signal.triggered_at, start() + Duration::hours(20));
    assert_eq!(signal.resolved_at, Some(start() + Duration::hours(21)));
}

#[test]
fn bdd_monitor_is_incremental_across_runs() {
    // GIVEN a stored setup and three quiet candles
    let (scanner, provider, repository) = memory_scanner(&["EUR_USD"]);
    provider.insert("EUR_USD", Timeframe::H1, uptrend_with_signal());
    scanner.scan();
    provider.extend("EUR_USD", Timeframe::H1, (20..23).map(quiet));

    // WHEN the monitor runs twice without new candles
    scanner.monitor();
    scanner.monitor();

    // THEN each candle is counted once
    assert_eq!(repository.setups().unwrap()[0].candles_elapsed, 3);

    // WHEN two more candles arrive
    provider.extend("EUR_USD", Timeframe::H1, (23..25).map(quiet));
    scanner.monitor();

    // THEN only the new ones are counted
    assert_eq!(repository.setups().unwrap()[0].candles_elapsed, 5);
}

#[test]
fn bdd_setup_expires_after_entry_window() {
    // GIVEN a stored setup and ten candles that never retrace
    let (scanner, provider, repository) = memory_scanner(&["EUR_USD"]);
    provider.insert("EUR_USD", Timeframe::H1, uptrend_with_signal());
    scanner.scan();
    provider.extend("EUR_USD", Timeframe::H1, (20..30).map(quiet));

    // AND a forming candle that would retrace
    let mut forming = retrace(30);
    forming.complete = false;
    provider.extend("EUR_USD", Timeframe::H1, [forming]);

    // WHEN the monitor runs
    let summary = scanner.monitor();

    // THEN the setup expires on the tenth complete candle and no signal exists
    assert_eq!(summary.expired_count, 1);
    assert_eq!(summary.triggered_count, 0);
    let setups = repository.setups().unwrap();
    assert_eq!(setups[0].status, SetupStatus::Expired);
    assert_eq!(setups[0].candles_elapsed, 10);
    assert!(repository.signals().unwrap().is_empty());
}

// ── Persistence ──────────────────────────────────────────────────────

#[test]
fn bdd_journal_and_csv_survive_restart() {
    // GIVEN candle CSVs and a journal on disk
    let dir = tempfile::tempdir().unwrap();
    let data = CsvCandleProvider::new(dir.path().join("data"));
    let journal = dir.path().join("state.jsonl");
    let mut candles = uptrend_with_signal();
    data.write("EUR_USD", Timeframe::H1, &candles).unwrap();

    let run = |f: &dyn Fn(&Scanner) -> ScanSummary| {
        let mut config = config(&["EUR_USD"]);
        config.ids = IdScheme::Content;
        let repository = Arc::new(JournalRepository::open(&journal).unwrap());
        let scanner = Scanner::from_config(config, Arc::new(data.clone()), repository);
        f(&scanner)
    };

    // WHEN one process scans
    let scanned = run(&|s| s.scan());
    assert_eq!(scanned.signals_found, 1);

    // AND a second process scans the same data
    // THEN the replayed journal rejects the duplicate
    assert_eq!(run(&|s| s.scan()).duplicates_skipped, 1);

    // WHEN new candles land and a third process monitors
    candles.extend([retrace(20), reach_target(21)]);
    data.write("EUR_USD", Timeframe::H1, &candles).unwrap();
    let monitored = run(&|s| s.monitor());

    // THEN the trigger and the win are recorded
    assert_eq!(monitored.triggered_count, 1);
    assert_eq!(monitored.win_count, 1);

    // AND a fresh process sees the final state
    let repository = JournalRepository::open(&journal).unwrap();
    assert_eq!(repository.setups().unwrap()[0].status, SetupStatus::Triggered);
    assert_eq!(repository.signals().unwrap()[0].outcome, Some(Outcome::Win));
}

// ── Concurrency ──────────────────────────────────────────────────────

#[test]
fn bdd_concurrent_monitors_apply_each_transition_once() {
    // GIVEN one repository with a stored setup that can trigger
    let provider = Arc::new(MemoryCandleProvider::new());
    provider.insert("EUR_USD", Timeframe::H1, uptrend_with_signal());
    let repository: Arc<InMemoryRepository> = Arc::new(InMemoryRepository::new());
    let scanner_a = Scanner::from_config(config(&["EUR_USD"]), provider.clone(), repository.clone());
    let scanner_b = Scanner::from_config(config(&["EUR_USD"]), provider.clone(), repository.clone());
    scanner_a.scan();
    provider.extend("EUR_USD", Timeframe::H1, [retrace(20), reach_target(21)]);

    // WHEN two monitors run at the same time
    let (a, b) = std::thread::scope(|s| {
        let a = s.spawn(|| scanner_a.monitor());
        let b = s.spawn(|| scanner_b.monitor());
        (a.join().unwrap(), b.join().unwrap())
    });

    // THEN the trigger and the outcome are each counted exactly once
    assert_eq!(a.triggered_count + b.triggered_count, 1);
    assert_eq!(a.win_count + b.win_count, 1);
    assert_eq!(repository.signals().unwrap().len(), 1);
}

// ── Partial writes ───────────────────────────────────────────────────

/// In-memory store whose next `failures` signal inserts fail.
struct FailingSignalWrites {
    inner: InMemoryRepository,
    failures: AtomicUsize,
}

impl FailingSignalWrites {
    fn new(failures: usize) -> Self {
        Self {
            inner: InMemoryRepository::new(),
            failures: AtomicUsize::new(failures),
        }
    }
}

impl SetupRepository for FailingSignalWrites {
    fn insert_setup(&self, setup: ActiveSetup) -> Result<InsertOutcome, RepositoryError> {
        self.inner.insert_setup(setup)
    }

    fn waiting_setups(&self, pair: &str, timeframe: Timeframe) -> Result<Vec<ActiveSetup>, RepositoryError> {
        self.inner.waiting_setups(pair, timeframe)
    }

    fn update_setup(&self, previous: &ActiveSetup, next: &ActiveSetup) -> Result<(), RepositoryError> {
        self.inner.update_setup(previous, next)
    }

    fn insert_signal(&self, signal: Signal) -> Result<(), RepositoryError> {
        let fail = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if fail {
            return Err(RepositoryError::Io {
                path: "journal.jsonl".into(),
                source: io::Error::new(io::ErrorKind::Other, "disk full"),
            });
        }
        self.inner.insert_signal(signal)
    }

    fn triggered_without_signal(
        &self,
        pair: &str,
        timeframe: Timeframe,
    ) -> Result<Vec<ActiveSetup>, RepositoryError> {
        self.inner.triggered_without_signal(pair, timeframe)
    }

    fn open_signals(&self, pair: &str, timeframe: Timeframe) -> Result<Vec<Signal>, RepositoryError> {
        self.inner.open_signals(pair, timeframe)
    }

    fn update_signal(&self, previous: &Signal, next: &Signal) -> Result<(), RepositoryError> {
        self.inner.update_signal(previous, next)
    }

    fn setups(&self) -> Result<Vec<ActiveSetup>, RepositoryError> {
        self.inner.setups()
    }

    fn signals(&self) -> Result<Vec<Signal>, RepositoryError> {
        self.inner.signals()
    }
}

#[test]
fn bdd_failed_signal_write_is_repaired_next_pass() {
    // GIVEN a stored setup and a store whose next signal write fails
    let provider = Arc::new(MemoryCandleProvider::new());
    provider.insert("EUR_USD", Timeframe::H1, uptrend_with_signal());
    let repository = Arc::new(FailingSignalWrites::new(1));
    let scanner = Scanner::from_config(config(&["EUR_USD"]), provider.clone(), repository.clone());
    scanner.scan();
    provider.extend("EUR_USD", Timeframe::H1, [retrace(20), reach_target(21)]);

    // WHEN the monitor runs
    let first = scanner.monitor();

    // THEN the trigger is counted, the failed write is reported and no signal exists yet
    assert_eq!(first.triggered_count, 1);
    assert_eq!(first.win_count, 0);
    assert_eq!(first.errors.len(), 1);
    assert!(first.errors[0].contains("disk full"));
    assert_eq!(repository.setups().unwrap()[0].status, SetupStatus::Triggered);
    assert!(repository.signals().unwrap().is_empty());

    // WHEN the monitor runs again
    let second = scanner.monitor();

    // THEN the missing signal is created from the trigger and resolved
    assert!(second.is_clean());
    assert_eq!(second.triggered_count, 0);
    assert_eq!(second.win_count, 1);
    let signals = repository.signals().unwrap();
    assert_eq!(signals.len(), 1);
    assert_eq!(signals[0].triggered_at, start() + Duration::hours(20));
    assert_eq!(signals[0].outcome, Some(Outcome::Win));

    // AND a third pass has nothing left to do
    assert_eq!(scanner.monitor(), ScanSummary::default());
}
