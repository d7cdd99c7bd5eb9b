//! Stress tests for JsonDB.
//!
//! These tests verify behavior under heavy load and concurrent access.

use crate::fixtures::{config_for, scenarios::user, user_schema, TestCollection};
use jsondb_core::{Collection, EncryptionMode, Record};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        Self {
            total_ops: successful + failed,
            successful_ops: successful,
            failed_ops: failed,
            duration,
        }
    }

    /// Operations per second.
    pub fn ops_per_second(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.total_ops as f64 / secs
        } else {
            0.0
        }
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Operations per thread.
    pub operations: usize,
    /// Number of concurrent threads.
    pub threads: usize,
    /// Encryption mode of the collection under test.
    pub mode: EncryptionMode,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 25,
            threads: 4,
            mode: EncryptionMode::None,
        }
    }
}

/// Creates users from several threads at once against one collection.
///
/// Each thread uses its own name range, so every create should succeed.
pub fn concurrent_creates(config: &StressConfig) -> (TestCollection, StressTestResult) {
    let fixture = TestCollection::memory_with(config_for(config.mode), user_schema());
    let collection = Arc::new(fixture.reopen(user_schema()));
    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));

    let start = Instant::now();
    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let collection = Arc::clone(&collection);
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);
            let operations = config.operations;
            thread::spawn(move || {
                for i in 0..operations {
                    let counter = match collection.create(user(t * operations + i)) {
                        Ok(_) => &successful,
                        Err(_) => &failed,
                    };
                    counter.fetch_add(1, Ordering::Relaxed);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("stress thread panicked");
    }

    let result = StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    );
    (fixture, result)
}

/// Has every thread try to create a user with the same name. Exactly one
/// of them may win.
pub fn contended_unique_name(collection: Arc<Collection>, threads: usize) -> StressTestResult {
    let start = Instant::now();
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let collection = Arc::clone(&collection);
            thread::spawn(move || collection.create(user(0)).is_ok())
        })
        .collect();

    let wins = handles
        .into_iter()
        .map(|h| h.join().expect("stress thread panicked"))
        .filter(|won| *won)
        .count();
    StressTestResult::new(wins, threads - wins, start.elapsed())
}

/// Interleaves updates and reads of one record from several threads.
pub fn concurrent_updates(collection: Arc<Collection>, id: &str, config: &StressConfig) -> StressTestResult {
    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));

    let start = Instant::now();
    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let collection = Arc::clone(&collection);
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);
            let id = id.to_string();
            let operations = config.operations;
            thread::spawn(move || {
                for i in 0..operations {
                    let patch = Record::new().with("is2FAEnabled", (t + i) % 2 == 0);
                    let ok = collection.update(&id, &patch).is_ok() && collection.find_by_id(&id).is_some();
                    let counter = if ok { &successful } else { &failed };
                    counter.fetch_add(1, Ordering::Relaxed);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("stress thread panicked");
    }

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    )
}
