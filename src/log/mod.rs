//! Log parsing for "activity displayed" launch timings.

pub mod parse;
pub mod pattern;
pub mod sample;

pub use parse::{PatternSet, parse_log_file, parse_log_text};
pub use sample::{Timing, TimingSample, UNAVAILABLE};
