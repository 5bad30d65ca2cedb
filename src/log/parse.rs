use crate::Result;
use crate::log::pattern::{PatternKind, TimingPattern};
use crate::log::sample::{Timing, TimingSample};
use anyhow::{Context, bail};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

/// Ordered patterns plus the activities they report on.
#[derive(Debug, Clone)]
pub struct PatternSet {
    activities: Vec<String>,
    patterns: Vec<TimingPattern>,
}

impl PatternSet {
    /// Every pattern must name one of `activities`. Activities keep their
    /// order; it is the column order used when recording.
    pub fn new(activities: Vec<String>, patterns: Vec<TimingPattern>) -> Result<Self> {
        let mut seen = BTreeSet::new();
        for a in &activities {
            if !seen.insert(a.as_str()) {
                bail!("duplicate activity name: {}", a);
            }
        }
        for p in &patterns {
            if !seen.contains(p.activity()) {
                bail!("pattern references unknown activity {}", p.activity());
            }
        }
        Ok(Self {
            activities,
            patterns,
        })
    }

    pub fn activities(&self) -> &[String] {
        &self.activities
    }
}

#[derive(Default)]
struct Hits {
    primary: Option<u64>,
    alternate: Option<u64>,
}

/// Extract one timing per activity from a block of log text.
///
/// Every line is tested against every pattern in registration order. Two
/// quirks are kept on purpose:
/// - the *last* matching line for an activity wins, so a capture holding
///   several launches reports the final one;
/// - a primary match anywhere in the text beats any alternate match, even
///   one that appeared earlier.
///
/// Activities without any match report [`Timing::Unavailable`].
pub fn parse_log_text(text: &str, set: &PatternSet) -> TimingSample {
    let mut hits: BTreeMap<&str, Hits> = BTreeMap::new();

    for (lineno, line) in text.lines().enumerate() {
        for pattern in &set.patterns {
            let ms = match pattern.elapsed_ms(line) {
                Ok(Some(ms)) => ms,
                Ok(None) => continue,
                Err(err) => {
                    tracing::debug!(
                        line = lineno + 1,
                        activity = pattern.activity(),
                        "skipping log line: {:#}",
                        err
                    );
                    continue;
                }
            };

            let slot = hits.entry(pattern.activity()).or_default();
            match pattern.kind() {
                PatternKind::Primary => slot.primary = Some(ms),
                PatternKind::Alternate => slot.alternate = Some(ms),
            }
        }
    }

    let timings = set
        .activities
        .iter()
        .map(|name| {
            let timing = hits
                .get(name.as_str())
                .and_then(|h| h.primary.or(h.alternate))
                .map_or(Timing::Unavailable, Timing::Millis);
            (name.clone(), timing)
        })
        .collect();

    TimingSample::new(timings)
}

/// Read a saved log capture and extract timings from it.
pub fn parse_log_file(path: &Path, set: &PatternSet) -> Result<TimingSample> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("read log file {}", path.display()))?;
    Ok(parse_log_text(&text, set))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::pattern::{DISPLAYED_ANY, MOTO_DISPLAYED, displayed_regex};
    use pretty_assertions::assert_eq;

    fn eloelo_set() -> PatternSet {
        let comps = [
            ("SplashActivityNew", "com.eloelo/.splash.view.SplashActivityNew"),
            ("OnBoardingActivity", "com.eloelo/.splash.view.OnBoardingActivity"),
            ("HomeActivity", "com.eloelo/.HomeActivity"),
        ];
        let patterns = comps
            .iter()
            .map(|(name, comp)| {
                TimingPattern::new(name, &displayed_regex(comp), PatternKind::Primary).unwrap()
            })
            .collect();
        let names = comps.iter().map(|(n, _)| n.to_string()).collect();
        PatternSet::new(names, patterns).unwrap()
    }

    fn single_set() -> PatternSet {
        PatternSet::new(
            vec!["MainActivity".to_string()],
            vec![
                TimingPattern::new("MainActivity", DISPLAYED_ANY, PatternKind::Primary).unwrap(),
                TimingPattern::new("MainActivity", MOTO_DISPLAYED, PatternKind::Alternate)
                    .unwrap(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn no_match_is_unavailable() {
        let text = "I Zygote: Process started\nW Looper: slow dispatch\n";
        let sample = parse_log_text(text, &eloelo_set());
        assert_eq!(sample.get("SplashActivityNew"), Timing::Unavailable);
        assert_eq!(sample.get("OnBoardingActivity"), Timing::Unavailable);
        assert_eq!(sample.get("HomeActivity"), Timing::Unavailable);
    }

    #[test]
    fn extracts_each_activity() {
        let text = "\
03-12 10:00:01.000  1234  1250 I ActivityTaskManager: Displayed com.eloelo/.splash.view.SplashActivityNew for user 0: +2s105ms
03-12 10:00:02.000  1234  1250 I ActivityTaskManager: garbage line
03-12 10:00:03.000  1234  1250 I ActivityTaskManager: Displayed com.eloelo/.HomeActivity for user 0: +640ms
";
        let sample = parse_log_text(text, &eloelo_set());
        assert_eq!(sample.get("SplashActivityNew"), Timing::Millis(2105));
        assert_eq!(sample.get("OnBoardingActivity"), Timing::Unavailable);
        assert_eq!(sample.get("HomeActivity"), Timing::Millis(640));
    }

    #[test]
    fn last_match_wins() {
        let text = "\
Displayed com.eloelo/.HomeActivity for user 0: +900ms
Displayed com.eloelo/.HomeActivity for user 0: +1s5ms
";
        let sample = parse_log_text(text, &eloelo_set());
        assert_eq!(sample.get("HomeActivity"), Timing::Millis(1005));
    }

    #[test]
    fn primary_beats_earlier_alternate() {
        let text = "\
MotoDisplayed com.connecto/.MainActivity,450
Displayed com.connecto/.MainActivity: +700ms
MotoDisplayed com.connecto/.MainActivity,300
";
        let sample = parse_log_text(text, &single_set());
        assert_eq!(sample.get("MainActivity"), Timing::Millis(700));
    }

    #[test]
    fn alternate_used_when_primary_absent() {
        let text = "MotoDisplayed com.connecto/.MainActivity,450\n";
        let sample = parse_log_text(text, &single_set());
        assert_eq!(sample.get("MainActivity"), Timing::Millis(450));
    }

    #[test]
    fn overflowing_line_is_skipped() {
        let text = "\
MotoDisplayed com.connecto/.MainActivity,450
MotoDisplayed com.connecto/.MainActivity,99999999999999999999999
";
        let sample = parse_log_text(text, &single_set());
        assert_eq!(sample.get("MainActivity"), Timing::Millis(450));
    }

    #[test]
    fn line_without_millis_keeps_earlier_value() {
        let set = PatternSet::new(
            vec!["Home".to_string()],
            vec![
                TimingPattern::new("Home", r"Home ready(?: in (\d+)ms)?", PatternKind::Primary)
                    .unwrap(),
            ],
        )
        .unwrap();

        let sample = parse_log_text("Home ready in 310ms\nHome ready\n", &set);
        assert_eq!(sample.get("Home"), Timing::Millis(310));

        let sample = parse_log_text("Home ready\n", &set);
        assert_eq!(sample.get("Home"), Timing::Unavailable);
    }

    #[test]
    fn rejects_pattern_for_unknown_activity() {
        let p = TimingPattern::new("Ghost", DISPLAYED_ANY, PatternKind::Primary).unwrap();
        assert!(PatternSet::new(vec!["Main".to_string()], vec![p]).is_err());
    }

    #[test]
    fn reads_capture_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logcat.txt");
        fs::write(&path, "Displayed com.eloelo/.HomeActivity for user 0: +3s0ms\n").unwrap();

        let sample = parse_log_file(&path, &eloelo_set()).unwrap();
        assert_eq!(sample.get("HomeActivity"), Timing::Millis(3000));

        assert!(parse_log_file(&dir.path().join("missing.txt"), &eloelo_set()).is_err());
    }
}
