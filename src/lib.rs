//! Race threads over shared counters and see which increments survive.
//!
//! Each worker bumps a language-level atomic counter and a counter updated
//! with a plain load and store. On x86-64 it also bumps a pair driven by
//! hand-written `lock inc` and `inc` instructions. After the join, the
//! atomic counters must equal `threads * iterations`; the others usually
//! come up short.

pub mod arch;
pub mod error;
pub mod harness;
pub mod parse;
pub mod sync;

mod sys;

pub use error::{AtomicityViolation, ConfigError, ParseCountError, ReportError};
pub use harness::{Config, Harness, Pair, Report, Tally};
pub use parse::parse_count;
