use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Literal written in place of a timing that was never observed.
pub const UNAVAILABLE: &str = "N/A";

/// Elapsed time for one activity in one launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timing {
    Millis(u64),
    Unavailable,
}

impl fmt::Display for Timing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timing::Millis(ms) => write!(f, "{}", ms),
            Timing::Unavailable => f.write_str(UNAVAILABLE),
        }
    }
}

impl Serialize for Timing {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Timing::Millis(ms) => serializer.serialize_u64(*ms),
            Timing::Unavailable => serializer.serialize_str(UNAVAILABLE),
        }
    }
}

/// Timings extracted from a single log capture, keyed by activity name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TimingSample(BTreeMap<String, Timing>);

impl TimingSample {
    pub fn new(timings: BTreeMap<String, Timing>) -> Self {
        Self(timings)
    }

    /// Activities absent from the sample read as unavailable.
    pub fn get(&self, activity: &str) -> Timing {
        self.0.get(activity).copied().unwrap_or(Timing::Unavailable)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Timing)> {
        self.0.iter().map(|(name, t)| (name.as_str(), *t))
    }
}

impl fmt::Display for TimingSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, timing) in self.iter() {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            write!(f, "{}={}", name, timing)?;
        }
        Ok(())
    }
}
