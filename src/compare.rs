//! Build-variant comparison: averages per source, written as a summary CSV.
//!
//! Summary layout:
//! ```text
//! Type,Splash (ms),Onboarding (ms),Home (ms)
//! Playstore,1234.5,800.0,2100.0
//! Release,1100.0,760.0,1999.25
//! ```

use crate::Result;
use crate::aggregate;
use crate::profile::{Layout, Profile};

use anyhow::{Context, bail};
use serde::Serialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// First column of the summary file.
pub const TYPE_COLUMN: &str = "Type";

/// Column label used for single-value capture files.
pub const SINGLE_VALUE_LABEL: &str = "Average App Start Time (ms)";

/// A labeled capture file, e.g. `Playstore` -> `data/Playstore_AppStartTime.csv`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub label: String,
    pub path: PathBuf,
}

/// A zero-based column index with the label it gets in the summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSelection {
    pub index: usize,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceMeans {
    pub label: String,
    pub means: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub columns: Vec<String>,
    pub sources: Vec<SourceMeans>,
}

/// Columns to compare for captures produced with `profile`.
pub fn columns_for_profile(profile: &Profile) -> Vec<ColumnSelection> {
    match profile.layout {
        Layout::Single => vec![ColumnSelection {
            index: 0,
            label: SINGLE_VALUE_LABEL.to_string(),
        }],
        Layout::Table => profile
            .activities()
            .iter()
            .enumerate()
            .map(|(i, name)| ColumnSelection {
                index: i + 1,
                label: format!("{} (ms)", name),
            })
            .collect(),
    }
}

/// Average every selected column of every source.
pub fn build_report(
    sources: &[Source],
    columns: &[ColumnSelection],
    has_header: bool,
) -> Result<ComparisonReport> {
    if sources.is_empty() {
        bail!("nothing to compare: no sources given");
    }
    if columns.is_empty() {
        bail!("nothing to compare: no columns selected");
    }

    let mut out = Vec::with_capacity(sources.len());
    for source in sources {
        let mut means = Vec::with_capacity(columns.len());
        for col in columns {
            let mean = aggregate::column_mean(&source.path, col.index, has_header)
                .with_context(|| format!("average {} for {}", col.label, source.label))?;
            tracing::info!(source = %source.label, column = %col.label, mean, "column average");
            means.push(mean);
        }
        out.push(SourceMeans {
            label: source.label.clone(),
            means,
        });
    }

    Ok(ComparisonReport {
        columns: columns.iter().map(|c| c.label.clone()).collect(),
        sources: out,
    })
}

/// Write `report` as a summary CSV, creating parent directories.
pub fn write_summary(path: &Path, report: &ComparisonReport) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let file =
        File::create(path).with_context(|| format!("create summary {}", path.display()))?;
    let mut writer = csv::Writer::from_writer(file);

    let mut header = vec![TYPE_COLUMN.to_string()];
    header.extend(report.columns.iter().cloned());
    writer.write_record(&header)?;

    for source in &report.sources {
        let mut row = vec![source.label.clone()];
        row.extend(source.means.iter().map(|m| format_mean(*m)));
        writer.write_record(&row)?;
    }
    writer
        .flush()
        .with_context(|| format!("flush summary {}", path.display()))?;
    Ok(())
}

/// Aggregate `sources` and write the summary to `out`.
pub fn compare_sources(
    sources: &[Source],
    columns: &[ColumnSelection],
    out: &Path,
    has_header: bool,
) -> Result<ComparisonReport> {
    let report = build_report(sources, columns, has_header)?;
    write_summary(out, &report)?;
    Ok(report)
}

/// Load a summary CSV written by [`write_summary`].
pub fn read_summary(path: &Path) -> Result<ComparisonReport> {
    let file = File::open(path).with_context(|| format!("read summary {}", path.display()))?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .with_context(|| format!("read summary header {}", path.display()))?
        .clone();
    if headers.get(0) != Some(TYPE_COLUMN) {
        bail!(
            "summary {} must start with a {} column",
            path.display(),
            TYPE_COLUMN
        );
    }
    let columns: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

    let mut sources = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let lno = idx + 2;
        let record = record.with_context(|| format!("summary {}:{}", path.display(), lno))?;
        let label = record.get(0).unwrap_or_default().to_string();
        let means = record
            .iter()
            .skip(1)
            .map(|f| {
                f.parse::<f64>().with_context(|| {
                    format!("summary {}:{}: bad mean {:?}", path.display(), lno, f)
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        sources.push(SourceMeans { label, means });
    }

    Ok(ComparisonReport { columns, sources })
}

/// Always print at least one decimal place: `200.0`, `1999.25`.
fn format_mean(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{:.1}", v)
    } else {
        format!("{}", v)
    }
}
