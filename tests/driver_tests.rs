//! End-to-end runs of the signal loop against real notifiers.

use std::time::Duration;

use eventfd_bench::{
    AtomicNotifier, BenchConfig, BenchDriver, ConfigBuilder, Notifier, NotifierKind,
    ProcessClock, SignalFailurePolicy,
};

fn quick(iterations: u64) -> BenchConfig {
    ConfigBuilder::from_config(BenchConfig::quick())
        .iterations(iterations)
        .build()
        .unwrap()
}

/// Every iteration performs exactly one signal
#[test]
fn test_atomic_counts_every_signal() {
    for &iterations in &[1u64, 7, 10_000, 100_000] {
        let counter = AtomicNotifier::new();
        let mut driver = BenchDriver::new(quick(iterations), counter.clone(), ProcessClock).unwrap();

        let report = driver.run().unwrap();

        assert_eq!(counter.value(), iterations);
        assert_eq!(report.signals, iterations);
        assert_eq!(report.iterations, iterations);
        assert!(report.is_clean());
        assert_eq!(report.notifier, "atomic");
    }
}

/// The signal value is added on every iteration
#[test]
fn test_signal_value_is_applied() {
    let config = ConfigBuilder::from_config(BenchConfig::quick())
        .iterations(1_000)
        .signal_value(3)
        .build()
        .unwrap();
    let counter = AtomicNotifier::new();

    BenchDriver::new(config, counter.clone(), ProcessClock)
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(counter.value(), 3_000);
}

/// Two runs do not share state
#[test]
fn test_runs_are_independent() {
    let first = AtomicNotifier::new();
    let second = AtomicNotifier::new();

    BenchDriver::new(quick(5_000), first.clone(), ProcessClock)
        .unwrap()
        .run()
        .unwrap();
    BenchDriver::new(quick(5_000), second.clone(), ProcessClock)
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(first.value(), 5_000);
    assert_eq!(second.value(), 5_000);
}

/// A boxed notifier picked at runtime behaves like the concrete one
#[test]
fn test_boxed_notifier_from_config() {
    let config = ConfigBuilder::from_config(BenchConfig::quick())
        .iterations(2_000)
        .notifier(NotifierKind::Atomic)
        .build()
        .unwrap();

    let mut driver = BenchDriver::from_config(config).unwrap();
    let report = driver.run().unwrap();

    assert_eq!(report.signals, 2_000);
    assert_eq!(driver.notifier().name(), "atomic");
}

/// Saturating the counter is tolerated under the default policy
#[test]
fn test_saturated_counter_is_ignored() {
    let counter = AtomicNotifier::with_initial(u64::MAX - 3);
    let mut driver = BenchDriver::new(quick(10), counter.clone(), ProcessClock).unwrap();

    let report = driver.run().unwrap();

    assert_eq!(report.signals, 10);
    assert_eq!(report.failures, 8);
    assert!(!report.is_clean());
    assert_eq!(counter.value(), u64::MAX - 1);
}

/// The abort policy stops at the first failure
#[test]
fn test_saturated_counter_aborts_when_strict() {
    let config = ConfigBuilder::from_config(quick(10))
        .failure_policy(SignalFailurePolicy::Abort)
        .build()
        .unwrap();
    let counter = AtomicNotifier::with_initial(u64::MAX - 1);
    let mut driver = BenchDriver::new(config, counter, ProcessClock).unwrap();

    let err = driver.run().unwrap_err();
    assert!(err.is_notifier_error());
}

/// Pauses are honoured around the loop
#[test]
fn test_pauses_take_wall_time() {
    let config = ConfigBuilder::from_config(quick(100))
        .pauses(Duration::from_millis(50))
        .build()
        .unwrap();
    let mut driver = BenchDriver::new(config, AtomicNotifier::new(), ProcessClock).unwrap();

    let start = std::time::Instant::now();
    driver.run().unwrap();

    assert!(start.elapsed() >= Duration::from_millis(100));
}

#[cfg(target_os = "linux")]
mod eventfd {
    use super::*;
    use eventfd_bench::EventFd;

    /// The kernel counter ends up at exactly the iteration count
    #[test]
    fn test_eventfd_counter_matches_iterations() {
        let mut driver = BenchDriver::new(quick(100_000), EventFd::new().unwrap(), ProcessClock)
            .unwrap();

        let report = driver.run().unwrap();
        assert!(report.is_clean());
        assert_eq!(report.notifier, "eventfd");

        let mut efd = driver.into_notifier();
        assert_eq!(efd.read().unwrap(), 100_000);
    }

    /// A hundredfold larger loop takes more CPU ticks
    #[test]
    fn test_ticks_grow_with_iterations() {
        let loop_ticks = |iterations| {
            BenchDriver::new(quick(iterations), EventFd::new().unwrap(), ProcessClock)
                .unwrap()
                .run_loop()
                .unwrap()
                .ticks
        };

        // The process clock also counts other test threads; keep the best.
        let small = (0..3).map(|_| loop_ticks(10_000)).min().unwrap();
        let large = loop_ticks(1_000_000);

        assert!(large > small, "1M: {large}, 10k: {small}");
    }

    /// The default long workload completes cleanly
    #[test]
    fn test_long_workload_without_pauses() {
        let config = ConfigBuilder::from_config(BenchConfig::long())
            .pauses(Duration::ZERO)
            .build()
            .unwrap();

        let mut driver = BenchDriver::from_config(config).unwrap();
        let report = driver.run().unwrap();

        assert_eq!(report.signals, 1_000_000);
        assert!(report.is_clean());
        assert!(report.output_line().parse::<u64>().is_ok());
    }
}
