use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

mod aggregate;
mod capture;
mod compare;
mod device;
mod log;
mod profile;
mod record;
mod render;

pub type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(name = "app-start-profiler")]
#[command(about = "Android app cold-start profiler", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract launch timings from a saved logcat dump.
    Extract {
        #[arg(long)]
        profile: PathBuf,

        #[arg(long)]
        log: PathBuf,

        /// Also append the timings to this capture file.
        #[arg(short = 'o', long)]
        out: Option<PathBuf>,

        #[arg(long, default_value_t = 1)]
        iteration: u32,

        /// Start a fresh capture file (truncate, write header).
        #[arg(long)]
        header: bool,
    },

    /// Reinstall the app and record its start time over repeated launches.
    Capture {
        #[arg(long)]
        profile: PathBuf,

        /// Build variant label, e.g. Playstore or Release.
        #[arg(long)]
        variant: String,

        #[arg(long)]
        apk: Option<PathBuf>,

        #[arg(long)]
        iterations: Option<u32>,

        #[arg(long, default_value = "data")]
        out_dir: PathBuf,

        #[arg(long, default_value = "adb")]
        adb: PathBuf,

        /// Device serial passed to adb -s.
        #[arg(long)]
        serial: Option<String>,
    },

    /// Average capture files and write a comparison summary.
    Compare {
        /// LABEL=PATH, once per build variant.
        #[arg(long = "input", required = true, value_parser = parse_source)]
        inputs: Vec<compare::Source>,

        /// INDEX=LABEL, zero-based column to average. Derived from --profile if omitted.
        #[arg(long = "column", value_parser = parse_column)]
        columns: Vec<compare::ColumnSelection>,

        #[arg(long)]
        profile: Option<PathBuf>,

        /// Inputs are single-value files without a header row.
        #[arg(long)]
        no_header: bool,

        #[arg(short = 'o', long, default_value = "data/comparison.csv")]
        out: PathBuf,
    },

    /// Render a comparison summary as an HTML bar chart.
    Report {
        #[arg(long, default_value = "data/comparison.csv")]
        summary: PathBuf,

        #[arg(short = 'o', long, default_value = "data/app_start_time_comparison.html")]
        out: PathBuf,
    },
}

fn parse_source(s: &str) -> std::result::Result<compare::Source, String> {
    let (label, path) = s
        .split_once('=')
        .ok_or_else(|| format!("expected LABEL=PATH, got {:?}", s))?;
    if label.trim().is_empty() || path.trim().is_empty() {
        return Err(format!("expected LABEL=PATH, got {:?}", s));
    }
    Ok(compare::Source {
        label: label.trim().to_string(),
        path: PathBuf::from(path.trim()),
    })
}

fn parse_column(s: &str) -> std::result::Result<compare::ColumnSelection, String> {
    let (index, label) = s
        .split_once('=')
        .ok_or_else(|| format!("expected INDEX=LABEL, got {:?}", s))?;
    let index = index
        .trim()
        .parse::<usize>()
        .map_err(|e| format!("bad column index {:?}: {}", index, e))?;
    Ok(compare::ColumnSelection {
        index,
        label: label.trim().to_string(),
    })
}

fn write_report(out: &Path, html: &str) -> Result<()> {
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    std::fs::write(out, html).with_context(|| format!("write report {}", out.display()))
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.cmd {
        Commands::Extract {
            profile: profile_path,
            log: log_path,
            out,
            iteration,
            header,
        } => {
            let profile = profile::load_profile(&profile_path)?;
            let sample = log::parse_log_file(&log_path, &profile.patterns)?;
            println!("{}", serde_json::to_string_pretty(&sample)?);

            if let Some(out) = out {
                capture::record_sample(&profile, &out, iteration, &sample, header)?;
                println!("Wrote {}", out.display());
            }
        }

        Commands::Capture {
            profile: profile_path,
            variant,
            apk,
            iterations,
            out_dir,
            adb,
            serial,
        } => {
            // 1) Load profile; flags win over the file.
            let mut profile = profile::load_profile(&profile_path)?;
            if apk.is_some() {
                profile.apk = apk;
            }
            if let Some(n) = iterations {
                anyhow::ensure!(n > 0, "--iterations must be at least 1");
                profile.iterations = n;
            }

            // 2) Launch loop.
            let out = out_dir.join(format!("{}_AppStartTime.csv", variant));
            let mut bridge = device::Adb::new(adb, serial);
            let summary = capture::run_capture(&mut bridge, &profile, &out)?;

            println!(
                "Wrote {} ({} of {} launches recorded, {} write failures)",
                out.display(),
                summary.rows_written,
                summary.iterations,
                summary.write_failures
            );
        }

        Commands::Compare {
            inputs,
            columns,
            profile: profile_path,
            no_header,
            out,
        } => {
            let columns = if !columns.is_empty() {
                columns
            } else if let Some(path) = profile_path {
                let profile = profile::load_profile(&path)?;
                compare::columns_for_profile(&profile)
            } else {
                anyhow::bail!("pass --column INDEX=LABEL or --profile to select columns");
            };

            let report = compare::compare_sources(&inputs, &columns, &out, !no_header)?;
            for source in &report.sources {
                println!("{}: {:?}", source.label, source.means);
            }
            println!("Wrote {}", out.display());
        }

        Commands::Report { summary, out } => {
            let report = compare::read_summary(&summary)?;
            let html = render::render_comparison_html(&report)?;
            write_report(&out, &html)?;
            println!("Wrote {}", out.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_sources_and_columns() {
        assert_eq!(
            parse_source("Playstore=data/Playstore_AppStartTime.csv").unwrap(),
            compare::Source {
                label: "Playstore".to_string(),
                path: PathBuf::from("data/Playstore_AppStartTime.csv"),
            }
        );
        assert!(parse_source("no-separator").is_err());
        assert!(parse_source("=path.csv").is_err());

        assert_eq!(
            parse_column("3=Home (ms)").unwrap(),
            compare::ColumnSelection {
                index: 3,
                label: "Home (ms)".to_string(),
            }
        );
        assert!(parse_column("x=Home").is_err());
    }

    #[test]
    fn compare_args() {
        let cli = Cli::try_parse_from([
            "app-start-profiler",
            "compare",
            "--input",
            "Playstore=a.csv",
            "--input",
            "Release=b.csv",
            "--column",
            "1=Splash (ms)",
        ])
        .unwrap();
        match cli.cmd {
            Commands::Compare {
                inputs,
                columns,
                out,
                no_header,
                ..
            } => {
                assert_eq!(inputs.len(), 2);
                assert_eq!(columns[0].index, 1);
                assert_eq!(out, PathBuf::from("data/comparison.csv"));
                assert!(!no_header);
            }
            _ => panic!("expected compare"),
        }
    }

    #[test]
    fn report_write_errors_name_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        let out = blocker.join("report.html");
        let err = write_report(&out, "<html></html>").unwrap_err();
        assert!(format!("{err:#}").contains("blocker"), "{err:#}");

        let out = dir.path().join("nested").join("report.html");
        write_report(&out, "<html></html>").unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "<html></html>");
    }
}
