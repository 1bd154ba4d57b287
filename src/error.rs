use thiserror::Error;

/// Why a count argument could not be read.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseCountError {
    #[error("empty count")]
    Empty,
    #[error("invalid digit in {0:?}")]
    InvalidDigit(String),
    #[error("count {0:?} is too large")]
    Overflow(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{threads} threads x {iterations} iterations overflows a 64-bit counter")]
    Overflow { threads: usize, iterations: u64 },
}

/// A counter that is supposed to serialize increments came up short.
///
/// This never happens on a correct platform; seeing it means the atomic
/// primitive or the compiler is broken.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{strategy} counter is {actual}, expected {expected}")]
pub struct AtomicityViolation {
    pub strategy: &'static str,
    pub expected: u64,
    pub actual: u64,
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error(transparent)]
    Violation(#[from] AtomicityViolation),
    #[error("writing report: {0}")]
    Io(#[from] std::io::Error),
}
