use crate::token::SessionRegistry;
use crate::{AnalysisGate, CacheInvalidator, DisabledCleaner, StopWorldCleaner, with_analysis};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Barrier, Mutex};
use std::time::Duration;

#[derive(Clone, Default)]
struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

struct CountingInvalidator {
    runs: AtomicUsize,
}

impl CountingInvalidator {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            runs: AtomicUsize::new(0),
        })
    }

    fn count(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

impl CacheInvalidator for CountingInvalidator {
    fn invalidate(&self) {
        self.runs.fetch_add(1, Ordering::SeqCst);
    }
}

fn cleaner_with(
    invalidator: &Arc<CountingInvalidator>,
) -> (Arc<StopWorldCleaner>, Arc<SessionRegistry>) {
    let registry = Arc::new(SessionRegistry::new());
    let cleaner = Arc::new(StopWorldCleaner::new(
        Arc::clone(invalidator) as Arc<dyn CacheInvalidator>,
        Arc::clone(&registry),
    ));
    (cleaner, registry)
}

#[test]
fn test_cleanup_runs_immediately_when_idle() {
    let invalidator = CountingInvalidator::new();
    let (cleaner, registry) = cleaner_with(&invalidator);
    let token = registry.create_session();

    cleaner.schedule_cleanup();

    assert_eq!(invalidator.count(), 1);
    assert!(!token.is_valid());

    // A session created after completion is unaffected.
    let fresh = registry.create_session();
    assert!(fresh.is_valid());
}

#[test]
fn test_cleanup_defers_until_all_in_flight_exit() {
    const WORKERS: usize = 4;

    let invalidator = CountingInvalidator::new();
    let (cleaner, _registry) = cleaner_with(&invalidator);

    let entered = Arc::new(Barrier::new(WORKERS + 1));
    let mut release_txs = Vec::new();
    let mut handles = Vec::new();
    for _ in 0..WORKERS {
        let cleaner = Arc::clone(&cleaner);
        let entered = Arc::clone(&entered);
        let (tx, rx) = mpsc::channel::<()>();
        release_txs.push(tx);
        handles.push(std::thread::spawn(move || {
            cleaner.enter_analysis().unwrap();
            entered.wait();
            rx.recv().unwrap();
            cleaner.exit_analysis();
        }));
    }

    entered.wait();
    assert_eq!(cleaner.in_flight(), WORKERS);

    cleaner.schedule_cleanup();
    assert_eq!(invalidator.count(), 0, "cleanup must not run while analyses are in flight");

    // Release all but one worker; the cleanup must still be pending.
    for tx in release_txs.iter().take(WORKERS - 1) {
        tx.send(()).unwrap();
    }
    for handle in handles.drain(..WORKERS - 1) {
        handle.join().unwrap();
    }
    assert_eq!(invalidator.count(), 0);
    assert_eq!(cleaner.in_flight(), 1);

    // Last exit runs the deferred cleanup exactly once.
    release_txs[WORKERS - 1].send(()).unwrap();
    handles.pop().unwrap().join().unwrap();
    assert_eq!(invalidator.count(), 1);
    assert_eq!(cleaner.in_flight(), 0);

    // A post-cleanup entry proceeds without re-triggering it.
    cleaner.enter_analysis().unwrap();
    cleaner.exit_analysis();
    assert_eq!(invalidator.count(), 1);
}

#[test]
fn test_nested_entry_does_not_release_pending_cleanup() {
    let invalidator = CountingInvalidator::new();
    let (cleaner, _registry) = cleaner_with(&invalidator);

    cleaner.enter_analysis().unwrap();
    cleaner.enter_analysis().unwrap(); // nested, uncounted
    assert_eq!(cleaner.in_flight(), 1);
    assert_eq!(cleaner.depth_on_current_thread(), 2);

    cleaner.schedule_cleanup();
    assert_eq!(invalidator.count(), 0);

    // Inner exit must not run the cleanup; only the outer exit may.
    cleaner.exit_analysis();
    assert_eq!(invalidator.count(), 0);
    assert_eq!(cleaner.in_flight(), 1);

    cleaner.exit_analysis();
    assert_eq!(invalidator.count(), 1);
    assert_eq!(cleaner.in_flight(), 0);
}

#[test]
fn test_duplicate_cleanup_requests_coalesce() {
    let invalidator = CountingInvalidator::new();
    let (cleaner, _registry) = cleaner_with(&invalidator);

    cleaner.enter_analysis().unwrap();
    cleaner.schedule_cleanup();
    cleaner.schedule_cleanup();
    cleaner.schedule_cleanup();
    cleaner.exit_analysis();

    assert_eq!(invalidator.count(), 1);
}

#[test]
fn test_entry_blocks_while_cleanup_pending() {
    let invalidator = CountingInvalidator::new();
    let (cleaner, _registry) = cleaner_with(&invalidator);

    cleaner.enter_analysis().unwrap();
    cleaner.schedule_cleanup();

    let (done_tx, done_rx) = mpsc::channel::<()>();
    let blocked = {
        let cleaner = Arc::clone(&cleaner);
        std::thread::spawn(move || {
            cleaner.enter_analysis().unwrap();
            done_tx.send(()).unwrap();
            cleaner.exit_analysis();
        })
    };

    // The new top-level entry must not get through while the cleanup is
    // still pending.
    assert!(
        done_rx.recv_timeout(Duration::from_millis(200)).is_err(),
        "entry proceeded despite pending cleanup"
    );
    assert_eq!(invalidator.count(), 0);

    cleaner.exit_analysis();
    done_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("blocked entry must be released after cleanup");
    blocked.join().unwrap();
    assert_eq!(invalidator.count(), 1);
}

#[test]
fn test_blocked_entry_observes_cancellation() {
    let invalidator = CountingInvalidator::new();
    let registry = Arc::new(SessionRegistry::new());
    let cancelled = Arc::new(AtomicBool::new(false));
    let probe = Arc::clone(&cancelled);
    let cleaner = Arc::new(
        StopWorldCleaner::new(
            Arc::clone(&invalidator) as Arc<dyn CacheInvalidator>,
            registry,
        )
        .with_cancellation(Arc::new(move || probe.load(Ordering::SeqCst))),
    );

    cleaner.enter_analysis().unwrap();
    cleaner.schedule_cleanup();

    let waiter = {
        let cleaner = Arc::clone(&cleaner);
        let cancelled = Arc::clone(&cancelled);
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(100));
            cancelled.store(true, Ordering::SeqCst);
            cleaner.enter_analysis()
        })
    };

    let result = waiter.join().unwrap();
    assert_eq!(result, Err(crate::CancelledError));

    cleaner.exit_analysis();
    assert_eq!(invalidator.count(), 1);
}

#[test]
fn test_counter_underflow_is_clamped() {
    let invalidator = CountingInvalidator::new();
    let (cleaner, _registry) = cleaner_with(&invalidator);

    // Unmatched exit: logged, clamped, no panic, state stays usable.
    cleaner.exit_analysis();
    assert_eq!(cleaner.in_flight(), 0);

    cleaner.enter_analysis().unwrap();
    assert_eq!(cleaner.in_flight(), 1);
    cleaner.exit_analysis();
    assert_eq!(cleaner.in_flight(), 0);
}

#[test]
fn test_unmatched_exit_logs_a_consistency_error() {
    let invalidator = CountingInvalidator::new();
    let (cleaner, _registry) = cleaner_with(&invalidator);

    let capture = LogCapture::default();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::ERROR)
        .with_writer(capture.clone())
        .with_ansi(false)
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        cleaner.exit_analysis();
    });

    let logs = capture.contents();
    assert!(
        logs.contains("exit_analysis without matching enter_analysis"),
        "expected a consistency error in the captured log, got: {logs}"
    );
    assert_eq!(cleaner.in_flight(), 0);
}

#[test]
fn test_with_analysis_exits_on_panic() {
    let invalidator = CountingInvalidator::new();
    let (cleaner, _registry) = cleaner_with(&invalidator);

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _ = with_analysis(cleaner.as_ref(), || panic!("analysis body failed"));
    }));
    assert!(result.is_err());
    assert_eq!(cleaner.in_flight(), 0);

    // The gate is still usable afterwards.
    cleaner.schedule_cleanup();
    assert_eq!(invalidator.count(), 1);
}

#[test]
fn test_parallel_analyses_with_interleaved_cleanups() {
    let invalidator = CountingInvalidator::new();
    let (cleaner, _registry) = cleaner_with(&invalidator);

    rayon::scope(|scope| {
        for worker in 0..8 {
            let cleaner = Arc::clone(&cleaner);
            scope.spawn(move |_| {
                for _ in 0..50 {
                    if cleaner.enter_analysis().is_ok() {
                        cleaner.exit_analysis();
                    }
                    if worker == 0 {
                        cleaner.schedule_cleanup();
                    }
                }
            });
        }
    });

    assert_eq!(cleaner.in_flight(), 0);
    assert!(invalidator.count() >= 1);
}

#[test]
fn test_disabled_cleaner_is_a_no_op() {
    let gate = DisabledCleaner;

    gate.enter_analysis().unwrap();
    gate.schedule_cleanup();
    gate.exit_analysis();

    assert_eq!(gate.in_flight(), 0);
    assert_eq!(gate.depth_on_current_thread(), 0);
}
