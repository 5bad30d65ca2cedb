//! Profile file (profile.json): what to launch and which log lines to scrape.
//!
//! JSON shape:
//! {
//!   "package": "com.eloelo",
//!   "launch_activity": ".splash.view.SplashActivityNew",
//!   "apk": "builds/app-release.apk",          // optional, enables reinstall
//!   "permissions": ["android.permission.POST_NOTIFICATIONS"],
//!   "iterations": 5,
//!   "layout": "table",                        // or "single"
//!   "pauses": { "launch_wait_ms": 5000, "settle_ms": 1000 },
//!   "activities": [
//!     {
//!       "name": "HomeActivity",
//!       "patterns": [
//!         { "displayed": "com.eloelo/.HomeActivity" },
//!         "Displayed .*: \\+(?:(\\d+)s)?(\\d+)ms",
//!         { "builtin": "moto_displayed", "alternate": true }
//!       ]
//!     }
//!   ]
//! }
//!
//! Patterns are compiled and checked here so a bad regex fails before any
//! device work starts.

use crate::Result;
use crate::log::pattern::{self, PatternKind, TimingPattern};
use crate::log::PatternSet;

use anyhow::{Context, bail};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileFile {
    #[serde(default)]
    pub package: String,

    #[serde(default)]
    pub launch_activity: String,

    #[serde(default)]
    pub apk: Option<PathBuf>,

    #[serde(default)]
    pub permissions: Vec<String>,

    #[serde(default = "default_iterations")]
    pub iterations: u32,

    #[serde(default)]
    pub layout: Layout,

    #[serde(default)]
    pub pauses: Pauses,

    #[serde(default)]
    pub activities: Vec<RawActivity>,
}

fn default_iterations() -> u32 {
    5
}

/// Raw activity shape as it appears in profile.json.
#[derive(Debug, Clone, Deserialize)]
pub struct RawActivity {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub patterns: Vec<RawPattern>,
}

/// Pattern entries in profile.json.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawPattern {
    // Bare regex string, always primary.
    Regex(String),
    Explicit {
        regex: String,
        #[serde(default)]
        alternate: bool,
    },
    Displayed {
        displayed: String,
        #[serde(default)]
        alternate: bool,
    },
    Builtin {
        builtin: Builtin,
        #[serde(default)]
        alternate: bool,
    },
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Builtin {
    DisplayedAny,
    MotoDisplayed,
}

/// How capture files are laid out on disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// Header `Iteration,<activity...>` and one row per launch.
    #[default]
    Table,
    /// No header, one value per line. Exactly one activity.
    Single,
}

/// Fixed waits between device steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Pauses {
    pub launch_wait_ms: u64,
    pub settle_ms: u64,
}

impl Default for Pauses {
    fn default() -> Self {
        Self {
            launch_wait_ms: 5000,
            settle_ms: 1000,
        }
    }
}

impl Pauses {
    pub fn launch_wait(&self) -> Duration {
        Duration::from_millis(self.launch_wait_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

/// Validated profile ready for capture and parsing.
#[derive(Debug, Clone)]
pub struct Profile {
    pub package: String,
    pub launch_activity: String,
    pub apk: Option<PathBuf>,
    pub permissions: Vec<String>,
    pub iterations: u32,
    pub layout: Layout,
    pub pauses: Pauses,
    pub patterns: PatternSet,
}

impl Profile {
    pub fn activities(&self) -> &[String] {
        self.patterns.activities()
    }
}

impl ProfileFile {
    /// Check fields, compile every pattern and fix the activity column order.
    pub fn validate_and_build(&self) -> Result<Profile> {
        if self.package.trim().is_empty() {
            bail!("profile has no package");
        }
        if self.launch_activity.trim().is_empty() {
            bail!("profile has no launch_activity");
        }
        if self.iterations == 0 {
            bail!("profile iterations must be at least 1");
        }
        if self.activities.is_empty() {
            bail!("profile contained no activities");
        }
        if self.layout == Layout::Single && self.activities.len() != 1 {
            bail!(
                "single layout records exactly one activity, profile has {}",
                self.activities.len()
            );
        }

        let mut names: Vec<String> = Vec::new();
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        let mut patterns: Vec<TimingPattern> = Vec::new();

        for raw in &self.activities {
            let name = raw.name.trim();
            if name.is_empty() {
                bail!("activity entry has an empty name");
            }
            if name.contains(',') {
                bail!("activity name {:?} cannot contain ','", name);
            }
            if !seen.insert(name) {
                bail!("duplicate activity name in profile: {}", name);
            }
            if raw.patterns.is_empty() {
                bail!("activity {} has no patterns", name);
            }

            for p in &raw.patterns {
                let (regex, alternate) = match p {
                    RawPattern::Regex(re) => (re.clone(), false),
                    RawPattern::Explicit { regex, alternate } => (regex.clone(), *alternate),
                    RawPattern::Displayed {
                        displayed,
                        alternate,
                    } => (pattern::displayed_regex(displayed), *alternate),
                    RawPattern::Builtin { builtin, alternate } => {
                        let re = match builtin {
                            Builtin::DisplayedAny => pattern::DISPLAYED_ANY,
                            Builtin::MotoDisplayed => pattern::MOTO_DISPLAYED,
                        };
                        (re.to_string(), *alternate)
                    }
                };
                let kind = if alternate {
                    PatternKind::Alternate
                } else {
                    PatternKind::Primary
                };
                patterns.push(TimingPattern::new(name, &regex, kind)?);
            }

            names.push(name.to_string());
        }

        Ok(Profile {
            package: self.package.trim().to_string(),
            launch_activity: self.launch_activity.trim().to_string(),
            apk: self.apk.clone(),
            permissions: self.permissions.clone(),
            iterations: self.iterations,
            layout: self.layout,
            pauses: self.pauses,
            patterns: PatternSet::new(names, patterns)?,
        })
    }
}

/// Read and validate a profile file.
pub fn load_profile(path: &Path) -> Result<Profile> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("read profile {}", path.display()))?;
    let raw: ProfileFile = serde_json::from_str(&text)
        .with_context(|| format!("parse profile {}", path.display()))?;
    raw.validate_and_build()
        .with_context(|| format!("invalid profile {}", path.display()))
}
