//! Capture files: one CSV row (or one bare value) per launch.
//!
//! Whether a call starts a fresh file is passed in by the caller; nothing here
//! remembers earlier writes.

use crate::Result;
use crate::log::{Timing, TimingSample};

use anyhow::Context;
use std::fs::{self, File, OpenOptions};
use std::path::Path;

/// First column of every table capture file.
pub const ITERATION_COLUMN: &str = "Iteration";

/// Append one launch to a table capture file.
///
/// With `write_header` the file is created or truncated and the header
/// `Iteration,<columns...>` is written before the row. Activities missing from
/// `sample` are written as `N/A`.
pub fn record_row(
    path: &Path,
    columns: &[String],
    iteration: u32,
    sample: &TimingSample,
    write_header: bool,
) -> Result<()> {
    let file = open_capture(path, write_header)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);

    if write_header {
        let mut header = Vec::with_capacity(columns.len() + 1);
        header.push(ITERATION_COLUMN.to_string());
        header.extend(columns.iter().cloned());
        writer
            .write_record(&header)
            .with_context(|| format!("write header to {}", path.display()))?;
    }

    let mut row = Vec::with_capacity(columns.len() + 1);
    row.push(iteration.to_string());
    row.extend(columns.iter().map(|c| sample.get(c).to_string()));
    writer
        .write_record(&row)
        .with_context(|| format!("write iteration {} to {}", iteration, path.display()))?;
    writer
        .flush()
        .with_context(|| format!("flush {}", path.display()))?;

    tracing::info!(iteration, path = %path.display(), "recorded launch timings");
    Ok(())
}

/// Append one value to a single-value capture file (no header).
pub fn record_value(path: &Path, timing: Timing, truncate: bool) -> Result<()> {
    let file = open_capture(path, truncate)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    writer
        .write_record([timing.to_string()])
        .with_context(|| format!("write value to {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("flush {}", path.display()))?;

    tracing::info!(%timing, path = %path.display(), "recorded launch timing");
    Ok(())
}

fn open_capture(path: &Path, truncate: bool) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }

    let mut opts = OpenOptions::new();
    opts.create(true);
    if truncate {
        opts.write(true).truncate(true);
    } else {
        opts.append(true);
    }
    opts.open(path)
        .with_context(|| format!("open capture file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn columns() -> Vec<String> {
        ["SplashActivityNew", "OnBoardingActivity", "HomeActivity"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn sample(values: &[(&str, Timing)]) -> TimingSample {
        TimingSample::new(
            values
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    #[test]
    fn header_once_then_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("Playstore_AppStartTime.csv");
        let cols = columns();

        for i in 1..=3u32 {
            let s = sample(&[
                ("SplashActivityNew", Timing::Millis(100 * i as u64)),
                ("HomeActivity", Timing::Millis(1000 + i as u64)),
            ]);
            record_row(&path, &cols, i, &s, i == 1).unwrap();
        }

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Iteration,SplashActivityNew,OnBoardingActivity,HomeActivity",
                "1,100,N/A,1001",
                "2,200,N/A,1002",
                "3,300,N/A,1003",
            ]
        );
        assert!(lines.iter().all(|l| l.split(',').count() == 4));
    }

    #[test]
    fn header_flag_truncates_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.csv");
        fs::write(&path, "stale,data\n1,2\n").unwrap();

        record_row(&path, &columns(), 1, &TimingSample::default(), true).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "Iteration,SplashActivityNew,OnBoardingActivity,HomeActivity\n1,N/A,N/A,N/A\n"
        );
    }

    #[test]
    fn single_values_have_no_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Release_AppStartTime.csv");

        record_value(&path, Timing::Millis(812), true).unwrap();
        record_value(&path, Timing::Unavailable, false).unwrap();
        record_value(&path, Timing::Millis(790), false).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "812\nN/A\n790\n");
    }

    #[test]
    fn unwritable_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "").unwrap();

        let err = record_row(
            &blocker.join("out.csv"),
            &columns(),
            1,
            &TimingSample::default(),
            true,
        )
        .unwrap_err();
        assert!(format!("{:#}", err).contains("not-a-dir"));
    }
}
