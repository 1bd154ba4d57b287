//! The race itself: spawn the workers over one set of counters, join them,
//! then hold the counters that promise atomicity to the exact total.

use std::io::Write;
use std::panic;
use std::thread;
use std::time::Instant;

use tracing::{debug, error, info};

use crate::arch::{self, Instructions};
use crate::error::{AtomicityViolation, ConfigError, ReportError};
use crate::sync::{Counter, FetchAdd, Increment, LoadStore};
use crate::sys;

pub const DEFAULT_THREADS: usize = 2;
pub const DEFAULT_ITERATIONS: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    threads: usize,
    iterations: u64,
    expected: u64,
}

impl Config {
    /// Fails if `threads * iterations` would not fit in a counter.
    pub fn new(threads: usize, iterations: u64) -> Result<Config, ConfigError> {
        let expected = (threads as u64)
            .checked_mul(iterations)
            .ok_or(ConfigError::Overflow {
                threads,
                iterations,
            })?;

        Ok(Config {
            threads,
            iterations,
            expected,
        })
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// What every atomic counter must read after the join.
    pub fn expected(&self) -> u64 {
        self.expected
    }
}

impl Default for Config {
    fn default() -> Config {
        Config {
            threads: DEFAULT_THREADS,
            iterations: DEFAULT_ITERATIONS,
            expected: DEFAULT_THREADS as u64 * DEFAULT_ITERATIONS,
        }
    }
}

/// A counter together with the strategy that bumps it.
struct Lane {
    strategy: &'static dyn Increment,
    counter: Counter,
}

impl Lane {
    fn new(strategy: &'static dyn Increment) -> Lane {
        Lane {
            strategy,
            counter: Counter::new(),
        }
    }

    #[inline]
    fn bump(&self) {
        self.strategy.increment(&self.counter);
    }

    fn tally(&self) -> Tally {
        Tally {
            name: self.strategy.name(),
            value: self.counter.get(),
        }
    }
}

/// All counters of one run. Lives on the main thread's stack and is lent
/// to every worker.
struct Counters {
    atomic: Lane,
    non_atomic: Lane,
    arch: Option<(Lane, Lane)>,
}

impl Counters {
    fn new(instructions: Option<Instructions>) -> Counters {
        Counters {
            atomic: Lane::new(&FetchAdd),
            non_atomic: Lane::new(&LoadStore),
            arch: instructions.map(|i| (Lane::new(i.locked), Lane::new(i.plain))),
        }
    }

    fn work(&self, iterations: u64) {
        for _ in 0..iterations {
            self.atomic.bump();
            self.non_atomic.bump();
            if let Some((ref locked, ref plain)) = self.arch {
                plain.bump();
                locked.bump();
            }
        }
    }

    fn report(&self, expected: u64) -> Report {
        Report {
            expected,
            language: Pair {
                atomic: self.atomic.tally(),
                non_atomic: self.non_atomic.tally(),
            },
            arch: self.arch.as_ref().map(|(locked, plain)| Pair {
                atomic: locked.tally(),
                non_atomic: plain.tally(),
            }),
        }
    }
}

pub struct Harness {
    config: Config,
    instructions: Option<Instructions>,
}

impl Harness {
    /// A harness using whatever increment instructions this CPU offers.
    pub fn new(config: Config) -> Harness {
        Harness::with_instructions(config, arch::instructions())
    }

    pub fn with_instructions(config: Config, instructions: Option<Instructions>) -> Harness {
        Harness {
            config,
            instructions,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs every worker to completion and reads the counters.
    ///
    /// A worker that panics is re-raised here once the others are joined.
    pub fn run(&self) -> Report {
        let Config {
            threads,
            iterations,
            expected,
        } = self.config;

        debug!(threads, iterations, expected, "starting race");
        match self.instructions {
            Some(ref i) => debug!(
                locked = i.locked.name(),
                plain = i.plain.name(),
                "instruction increments enabled"
            ),
            None => debug!("no locked increment instruction on this target"),
        }
        match sys::online_cpus() {
            Some(1) => debug!("only one cpu online, lost updates will be rare"),
            Some(cpus) => debug!(cpus, "cpus online"),
            None => {}
        }

        let counters = Counters::new(self.instructions);
        let shared = &counters;
        let start = Instant::now();

        thread::scope(|s| {
            let workers: Vec<_> = (0..threads)
                .map(|_| s.spawn(move || shared.work(iterations)))
                .collect();

            let mut failure = None;
            for worker in workers {
                if let Err(e) = worker.join() {
                    if failure.is_none() {
                        failure = Some(e);
                    }
                }
            }
            if let Some(e) = failure {
                panic::resume_unwind(e);
            }
        });

        debug!(elapsed = ?start.elapsed(), "all workers joined");

        counters.report(expected)
    }
}

/// Final value of one counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub name: &'static str,
    pub value: u64,
}

/// An atomic counter and its racy twin, driven side by side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pair {
    pub atomic: Tally,
    pub non_atomic: Tally,
}

impl Pair {
    fn check(&self, expected: u64) -> Result<(), AtomicityViolation> {
        if self.atomic.value == expected {
            info!(counter = self.atomic.name, value = expected, "atomic total holds");
            Ok(())
        } else {
            error!(
                counter = self.atomic.name,
                expected,
                actual = self.atomic.value,
                "atomic counter lost updates"
            );
            Err(AtomicityViolation {
                strategy: self.atomic.name,
                expected,
                actual: self.atomic.value,
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub expected: u64,
    pub language: Pair,
    pub arch: Option<Pair>,
}

impl Report {
    fn pairs(&self) -> impl Iterator<Item = &Pair> {
        Some(&self.language).into_iter().chain(self.arch.as_ref())
    }

    /// Checks every atomic counter against the expected total.
    pub fn verify(&self) -> Result<(), AtomicityViolation> {
        self.pairs().try_for_each(|pair| pair.check(self.expected))
    }

    /// For each pair in turn: check the atomic counter, then print the
    /// racy one as `<name> <value>`. Stops at the first violation, so a
    /// racy value is only printed after its twin held.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<(), ReportError> {
        for pair in self.pairs() {
            pair.check(self.expected)?;
            writeln!(out, "{} {}", pair.non_atomic.name, pair.non_atomic.value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tally(name: &'static str, value: u64) -> Tally {
        Tally { name, value }
    }

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.threads(), 2);
        assert_eq!(config.iterations(), 10_000);
        assert_eq!(config.expected(), 20_000);
        assert_eq!(Config::new(2, 10_000), Ok(config));
    }

    #[test]
    fn overflowing_config_is_rejected() {
        assert_eq!(
            Config::new(2, u64::MAX),
            Err(ConfigError::Overflow {
                threads: 2,
                iterations: u64::MAX,
            })
        );
        assert!(Config::new(1, u64::MAX).is_ok());
    }

    #[test]
    fn zero_threads_counts_nothing() {
        let report = Harness::new(Config::new(0, 1_000).unwrap()).run();
        assert_eq!(report.expected, 0);
        assert_eq!(report.language.atomic.value, 0);
        assert_eq!(report.language.non_atomic.value, 0);
        report.verify().unwrap();
    }

    #[test]
    fn without_instructions_arch_pair_is_absent() {
        let harness = Harness::with_instructions(Config::new(3, 1_000).unwrap(), None);
        let report = harness.run();
        assert!(report.arch.is_none());
        report.verify().unwrap();

        let mut out = vec![];
        report.write_to(&mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert_eq!(out.lines().count(), 1);
        assert!(out.starts_with("non_atomic "));
    }

    #[test]
    fn short_atomic_counter_is_a_violation() {
        let report = Report {
            expected: 10,
            language: Pair {
                atomic: tally("atomic", 9),
                non_atomic: tally("non_atomic", 7),
            },
            arch: None,
        };

        let expected_err = AtomicityViolation {
            strategy: "atomic",
            expected: 10,
            actual: 9,
        };
        assert_eq!(report.verify(), Err(expected_err.clone()));

        let mut out = vec![];
        match report.write_to(&mut out) {
            Err(ReportError::Violation(v)) => assert_eq!(v, expected_err),
            other => panic!("expected a violation, got {:?}", other),
        }
        assert!(out.is_empty());
    }

    #[test]
    fn arch_violation_comes_after_first_line() {
        let report = Report {
            expected: 10,
            language: Pair {
                atomic: tally("atomic", 10),
                non_atomic: tally("non_atomic", 8),
            },
            arch: Some(Pair {
                atomic: tally("arch_atomic", 3),
                non_atomic: tally("arch_non_atomic", 6),
            }),
        };

        let mut out = vec![];
        let err = report.write_to(&mut out).unwrap_err();
        assert_eq!(err.to_string(), "arch_atomic counter is 3, expected 10");
        assert_eq!(String::from_utf8(out).unwrap(), "non_atomic 8\n");
    }

    #[test]
    fn worker_panic_reaches_the_caller() {
        struct Boom;

        impl Increment for Boom {
            fn name(&self) -> &'static str {
                "boom"
            }

            fn is_atomic(&self) -> bool {
                true
            }

            fn increment(&self, _: &Counter) {
                panic!("boom");
            }
        }

        let harness = Harness::with_instructions(
            Config::new(2, 1).unwrap(),
            Some(Instructions {
                locked: &Boom,
                plain: &LoadStore,
            }),
        );

        let result = panic::catch_unwind(panic::AssertUnwindSafe(|| harness.run()));
        assert!(result.is_err());
    }
}
