//! Column averages over capture files.

use crate::Result;
use crate::log::UNAVAILABLE;

use anyhow::Context;
use std::fs::File;
use std::path::Path;

/// Values of one column that survived filtering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnValues {
    pub values: Vec<f64>,
    /// Fields that were neither `N/A` nor a finite number.
    pub rejected: usize,
}

impl ColumnValues {
    /// Arithmetic mean, 0.0 when nothing survived.
    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }
}

/// Collect the numeric values of zero-based `column` across all data rows.
///
/// Rows are split on commas only; quotes carry no meaning. Fields are trimmed.
/// `N/A` (any case) is skipped silently, anything that is not UTF-8 or does
/// not parse as a finite number is skipped with a warning, and rows too short
/// to have the column are ignored.
pub fn column_values(path: &Path, column: usize, has_header: bool) -> Result<ColumnValues> {
    let file =
        File::open(path).with_context(|| format!("read capture file {}", path.display()))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(has_header)
        .flexible(true)
        .quoting(false)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut out = ColumnValues::default();
    for (idx, record) in reader.byte_records().enumerate() {
        let record = record
            .with_context(|| format!("read row {} of {}", idx + 1, path.display()))?;

        let Some(raw) = record.get(column) else {
            tracing::debug!(row = idx + 1, column, "row has no such column");
            continue;
        };
        let field = std::str::from_utf8(raw).ok();
        if field.is_some_and(|f| f.eq_ignore_ascii_case(UNAVAILABLE)) {
            continue;
        }

        match field.map(str::parse::<f64>) {
            Some(Ok(v)) if v.is_finite() => out.values.push(v),
            _ => {
                tracing::warn!(
                    path = %path.display(),
                    row = idx + 1,
                    column,
                    "invalid number {:?}, excluded from average",
                    String::from_utf8_lossy(raw)
                );
                out.rejected += 1;
            }
        }
    }

    tracing::debug!(
        path = %path.display(),
        column,
        values = ?out.values,
        "extracted column values"
    );
    Ok(out)
}

/// Mean of zero-based `column`; 0.0 for a header-only or empty file.
pub fn column_mean(path: &Path, column: usize, has_header: bool) -> Result<f64> {
    let values = column_values(path, column, has_header)?;
    if values.rejected > 0 {
        tracing::warn!(
            path = %path.display(),
            column,
            rejected = values.rejected,
            "some fields were not numbers"
        );
    }
    if values.values.is_empty() {
        tracing::warn!(path = %path.display(), column, "no valid data, average is 0");
    }
    Ok(values.mean())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn write(dir: &tempfile::TempDir, name: &str, text: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn sentinel_and_garbage_are_excluded() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "a.csv",
            "Iteration,Splash\n1,100\n2,200\n3,N/A\n4,bogus\n5,300\n",
        );

        let values = column_values(&path, 1, true).unwrap();
        assert_eq!(values.values, vec![100.0, 200.0, 300.0]);
        assert_eq!(values.rejected, 1);
        assert_eq!(column_mean(&path, 1, true).unwrap(), 200.0);
    }

    #[test]
    fn header_only_is_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "a.csv", "Iteration,Splash,Onboard,Home\n");
        for col in 0..4 {
            assert_eq!(column_mean(&path, col, true).unwrap(), 0.0);
        }

        let empty = write(&dir, "empty.csv", "");
        assert_eq!(column_mean(&empty, 1, true).unwrap(), 0.0);
    }

    #[test]
    fn end_to_end_capture_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "A.csv",
            "Iteration,Splash,Onboard,Home\n1,100,200,N/A\n2,300,400,500\n",
        );

        assert_eq!(column_mean(&path, 1, true).unwrap(), 200.0);
        assert_eq!(column_mean(&path, 2, true).unwrap(), 300.0);
        assert_eq!(column_mean(&path, 3, true).unwrap(), 500.0);
    }

    #[test]
    fn tolerates_whitespace_case_and_short_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "a.csv",
            "Iteration, Home\n1 , 250 \n2,n/a\n3\n4,  350\n",
        );
        assert_eq!(column_mean(&path, 1, true).unwrap(), 300.0);
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "a.csv", "Iteration,Home\n1,NaN\n2,inf\n3,40\n");
        let values = column_values(&path, 1, true).unwrap();
        assert_eq!(values.values, vec![40.0]);
        assert_eq!(values.rejected, 2);
    }

    #[test]
    fn stray_quote_does_not_swallow_later_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "a.csv", "Iteration,Home\n1,\"oops\n2,300\n3,500\n");
        let values = column_values(&path, 1, true).unwrap();
        assert_eq!(values.values, vec![300.0, 500.0]);
        assert_eq!(values.rejected, 1);
        assert_eq!(column_mean(&path, 1, true).unwrap(), 400.0);
    }

    #[test]
    fn invalid_utf8_field_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.csv");
        fs::write(&path, b"Iteration,Home\n1,\xff\xfe\n2,300\n3,500\n").unwrap();
        let values = column_values(&path, 1, true).unwrap();
        assert_eq!(values.values, vec![300.0, 500.0]);
        assert_eq!(values.rejected, 1);
        assert_eq!(column_mean(&path, 1, true).unwrap(), 400.0);
    }

    #[test]
    fn single_value_files_have_no_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "single.csv", "812\nN/A\n790\n");
        assert_eq!(column_mean(&path, 0, false).unwrap(), 801.0);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(column_mean(&dir.path().join("nope.csv"), 1, true).is_err());
    }
}
