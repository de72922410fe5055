use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Distinct abort reasons kept per run; further new reasons are only counted.
pub const MAX_ABORT_REASONS: usize = 64;

/// A named boolean assertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    pub name: String,
    pub passed: bool,
}

impl Check {
    pub fn new(name: impl Into<String>, passed: bool) -> Self {
        Self {
            name: name.into(),
            passed,
        }
    }
}

/// Sink for checks, shared by every virtual user of a run.
pub trait CheckRecorder: Send + Sync {
    fn record(&self, name: &str, passed: bool);
}

/// Keeps every check in order. Useful for a single scenario run.
#[derive(Debug, Default)]
pub struct RecordedChecks {
    checks: Mutex<Vec<Check>>,
}

impl RecordedChecks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn checks(&self) -> Vec<Check> {
        lock(&self.checks).clone()
    }

    pub fn all_passed(&self) -> bool {
        lock(&self.checks).iter().all(|c| c.passed)
    }
}

impl CheckRecorder for RecordedChecks {
    fn record(&self, name: &str, passed: bool) {
        lock(&self.checks).push(Check::new(name, passed));
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckCounts {
    pub passes: u64,
    pub fails: u64,
}

#[derive(Debug, Default)]
struct CheckCounter {
    passes: AtomicU64,
    fails: AtomicU64,
}

/// Aggregate pass/fail counts across concurrent virtual users.
///
/// The map lock is only held to find a counter; increments are atomic. Abort reasons
/// are grouped by message, keeping at most [`MAX_ABORT_REASONS`] of them.
#[derive(Debug, Default)]
pub struct CheckTally {
    checks: Mutex<BTreeMap<String, Arc<CheckCounter>>>,
    completed: AtomicU64,
    aborted: AtomicU64,
    aborts: Mutex<BTreeMap<String, u64>>,
}

impl CheckTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iteration_completed(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn iteration_aborted(&self, reason: impl Into<String>) {
        self.aborted.fetch_add(1, Ordering::Relaxed);

        let reason = reason.into();
        let mut aborts = lock(&self.aborts);
        if let Some(count) = aborts.get_mut(&reason) {
            *count += 1;
        } else if aborts.len() < MAX_ABORT_REASONS {
            aborts.insert(reason, 1);
        }
    }

    pub fn snapshot(&self) -> TallySnapshot {
        let checks = lock(&self.checks)
            .iter()
            .map(|(name, counter)| {
                (
                    name.clone(),
                    CheckCounts {
                        passes: counter.passes.load(Ordering::Relaxed),
                        fails: counter.fails.load(Ordering::Relaxed),
                    },
                )
            })
            .collect();

        let mut aborts: Vec<(String, u64)> = lock(&self.aborts)
            .iter()
            .map(|(reason, count)| (reason.clone(), *count))
            .collect();
        aborts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        TallySnapshot {
            checks,
            iterations_completed: self.completed.load(Ordering::Relaxed),
            iterations_aborted: self.aborted.load(Ordering::Relaxed),
            aborts,
        }
    }

    fn counter(&self, name: &str) -> Arc<CheckCounter> {
        let mut checks = lock(&self.checks);
        match checks.get(name) {
            Some(counter) => Arc::clone(counter),
            None => {
                let counter = Arc::new(CheckCounter::default());
                checks.insert(name.to_string(), Arc::clone(&counter));
                counter
            }
        }
    }
}

impl CheckRecorder for CheckTally {
    fn record(&self, name: &str, passed: bool) {
        let counter = self.counter(name);
        if passed {
            counter.passes.fetch_add(1, Ordering::Relaxed);
        } else {
            counter.fails.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Point-in-time copy of a [`CheckTally`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TallySnapshot {
    /// Sorted by check name
    pub checks: Vec<(String, CheckCounts)>,
    pub iterations_completed: u64,
    pub iterations_aborted: u64,
    /// Abort reasons with their occurrence counts, most frequent first
    pub aborts: Vec<(String, u64)>,
}

impl TallySnapshot {
    pub fn counts(&self, name: &str) -> Option<CheckCounts> {
        self.checks
            .iter()
            .find(|(check, _)| check == name)
            .map(|(_, counts)| *counts)
    }

    /// Aborts whose reason arrived after the reason list was full
    pub fn unlisted_aborts(&self) -> u64 {
        let listed: u64 = self.aborts.iter().map(|(_, count)| count).sum();
        self.iterations_aborted.saturating_sub(listed)
    }

    pub fn all_passed(&self) -> bool {
        self.iterations_aborted == 0 && self.checks.iter().all(|(_, counts)| counts.fails == 0)
    }
}

// A panicking recorder must not take the rest of the run down with it
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorded_checks_keep_order() {
        let recorded = RecordedChecks::new();
        recorded.record("status 200", true);
        recorded.record("contains header", false);

        assert_eq!(
            recorded.checks(),
            vec![
                Check::new("status 200", true),
                Check::new("contains header", false)
            ]
        );
        assert!(!recorded.all_passed());
    }

    #[test]
    fn test_tally_counts_per_name() {
        let tally = CheckTally::new();
        tally.record("join reply ok", true);
        tally.record("join reply ok", true);
        tally.record("join reply ok", false);
        tally.record("status 200", true);
        tally.iteration_completed();
        tally.iteration_aborted("Handshake timed out: no join reply within 2000ms");

        let snapshot = tally.snapshot();
        assert_eq!(
            snapshot.counts("join reply ok"),
            Some(CheckCounts {
                passes: 2,
                fails: 1
            })
        );
        assert_eq!(snapshot.checks[0].0, "join reply ok");
        assert_eq!(snapshot.iterations_completed, 1);
        assert_eq!(snapshot.iterations_aborted, 1);
        assert_eq!(snapshot.aborts.len(), 1);
        assert!(!snapshot.all_passed());
    }

    #[test]
    fn test_aborts_grouped_by_reason() {
        let tally = CheckTally::new();
        tally.iteration_aborted("Handshake timed out: no join reply within 2000ms");
        tally.iteration_aborted("GET /glennr: status 302");
        tally.iteration_aborted("Handshake timed out: no join reply within 2000ms");

        let snapshot = tally.snapshot();
        assert_eq!(
            snapshot.aborts,
            vec![
                (
                    "Handshake timed out: no join reply within 2000ms".to_string(),
                    2
                ),
                ("GET /glennr: status 302".to_string(), 1),
            ]
        );
        assert_eq!(snapshot.unlisted_aborts(), 0);
    }

    #[test]
    fn test_abort_reasons_are_bounded() {
        let tally = CheckTally::new();
        for i in 0..MAX_ABORT_REASONS + 10 {
            tally.iteration_aborted(format!("unexpected join reply: session {}", i));
        }
        // Reasons already listed keep counting once the list is full
        tally.iteration_aborted("unexpected join reply: session 0");

        let snapshot = tally.snapshot();
        assert_eq!(snapshot.aborts.len(), MAX_ABORT_REASONS);
        assert_eq!(
            snapshot.aborts[0],
            ("unexpected join reply: session 0".to_string(), 2)
        );
        assert_eq!(snapshot.iterations_aborted, MAX_ABORT_REASONS as u64 + 11);
        assert_eq!(snapshot.unlisted_aborts(), 10);
    }

    #[tokio::test]
    async fn test_tally_tolerates_concurrent_increments() {
        let tally = Arc::new(CheckTally::new());
        let mut handles = Vec::new();

        for _ in 0..16 {
            let tally = Arc::clone(&tally);
            handles.push(tokio::spawn(async move {
                for _ in 0..100 {
                    tally.record("status 200", true);
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(
            tally.snapshot().counts("status 200"),
            Some(CheckCounts {
                passes: 1600,
                fails: 0
            })
        );
    }
}
