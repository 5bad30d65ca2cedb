//! Timing patterns for "activity displayed" log lines.
//!
//! A pattern either carries two capture groups (optional seconds, then
//! milliseconds), as in the framework line:
//!
//! ```text
//! ActivityTaskManager: Displayed com.eloelo/.HomeActivity for user 0: +1s234ms
//! ```
//!
//! or one capture group holding a pre-computed millisecond value, as in the
//! vendor line:
//!
//! ```text
//! MotoDisplayed com.connecto/.MainActivity,812
//! ```

use crate::Result;
use anyhow::{Context, bail};
use regex::{Captures, Regex};

/// Framework "Displayed" line for any component.
pub const DISPLAYED_ANY: &str = r"Displayed .*: \+(?:(\d+)s)?(\d+)ms";

/// Vendor-specific launch line carrying a single millisecond value.
pub const MOTO_DISPLAYED: &str = r"MotoDisplayed .*?,(\d+)";

/// Regex for the framework "Displayed" line of one component,
/// e.g. `com.eloelo/.HomeActivity`.
pub fn displayed_regex(component: &str) -> String {
    format!(
        r"Displayed {} .*?: \+(?:(\d+)s)?(\d+)ms",
        regex::escape(component)
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    Primary,
    Alternate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Groups {
    /// (seconds?, millis)
    SecondsMillis,
    /// (millis)
    Millis,
}

/// One compiled pattern bound to an activity.
#[derive(Debug, Clone)]
pub struct TimingPattern {
    activity: String,
    kind: PatternKind,
    re: Regex,
    groups: Groups,
}

impl TimingPattern {
    pub fn new(activity: &str, regex: &str, kind: PatternKind) -> Result<Self> {
        let re = Regex::new(regex)
            .with_context(|| format!("bad pattern for activity {}: {:?}", activity, regex))?;

        let groups = match re.captures_len() - 1 {
            1 => Groups::Millis,
            2 => Groups::SecondsMillis,
            n => bail!(
                "pattern for activity {} must have 1 or 2 capture groups, found {}: {:?}",
                activity,
                n,
                regex
            ),
        };

        Ok(Self {
            activity: activity.to_string(),
            kind,
            re,
            groups,
        })
    }

    pub fn activity(&self) -> &str {
        &self.activity
    }

    pub fn kind(&self) -> PatternKind {
        self.kind
    }

    /// Elapsed milliseconds if `line` matches.
    ///
    /// Returns `Ok(None)` when the line does not match or the millisecond
    /// group took no part in the match, and an error when the captured digits
    /// do not fit.
    pub fn elapsed_ms(&self, line: &str) -> Result<Option<u64>> {
        let Some(caps) = self.re.captures(line) else {
            return Ok(None);
        };

        let ms = match self.groups {
            Groups::Millis => match group_u64(&caps, 1)? {
                Some(ms) => ms,
                None => return Ok(None),
            },
            Groups::SecondsMillis => {
                let Some(ms) = group_u64(&caps, 2)? else {
                    return Ok(None);
                };
                let secs = group_u64(&caps, 1)?.unwrap_or(0);
                secs.checked_mul(1000)
                    .and_then(|s| s.checked_add(ms))
                    .with_context(|| format!("elapsed time overflows: {}s{}ms", secs, ms))?
            }
        };

        Ok(Some(ms))
    }
}

fn group_u64(caps: &Captures<'_>, idx: usize) -> Result<Option<u64>> {
    match caps.get(idx).map(|m| m.as_str()) {
        None | Some("") => Ok(None),
        Some(digits) => Ok(Some(
            digits
                .parse::<u64>()
                .with_context(|| format!("bad number in group {}: {:?}", idx, digits))?,
        )),
    }
}
