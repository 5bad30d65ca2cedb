//! Launch loop: reinstall once, then launch, scrape and record N times.
//!
//! Steps are strictly sequential. The waits are fixed pauses taken from the
//! profile; nothing polls the device for readiness.

use crate::Result;
use crate::device::DeviceBridge;
use crate::log::{self, TimingSample};
use crate::profile::{Layout, Profile};
use crate::record;

use std::path::Path;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSummary {
    pub iterations: u32,
    pub rows_written: u32,
    pub write_failures: u32,
}

/// Run every launch described by `profile`, recording into `out`.
///
/// A failed write is logged and counted and the next launch still runs. A
/// failing device call aborts the run.
pub fn run_capture<D: DeviceBridge>(
    device: &mut D,
    profile: &Profile,
    out: &Path,
) -> Result<CaptureSummary> {
    if let Some(apk) = &profile.apk {
        device.uninstall(&profile.package)?;
        device.install(apk)?;
        for permission in &profile.permissions {
            device.grant_permission(&profile.package, permission)?;
        }
    }

    let mut summary = CaptureSummary {
        iterations: profile.iterations,
        rows_written: 0,
        write_failures: 0,
    };

    for iteration in 1..=profile.iterations {
        tracing::info!(iteration, "launching app");
        close_app(device, profile)?;

        device.launch(&profile.package, &profile.launch_activity)?;
        pause(profile.pauses.launch_wait());

        let text = device.capture_logs()?;
        let sample = log::parse_log_text(&text, &profile.patterns);
        tracing::info!(iteration, "extracted times: {}", sample);

        match record_sample(profile, out, iteration, &sample, iteration == 1) {
            Ok(()) => summary.rows_written += 1,
            Err(err) => {
                tracing::error!(iteration, "error writing capture file: {:#}", err);
                summary.write_failures += 1;
            }
        }

        close_app(device, profile)?;
    }

    tracing::info!(
        rows = summary.rows_written,
        failures = summary.write_failures,
        "all readings captured"
    );
    Ok(summary)
}

/// Persist one sample in the layout the profile asks for. `first` starts a
/// fresh file.
pub fn record_sample(
    profile: &Profile,
    out: &Path,
    iteration: u32,
    sample: &TimingSample,
    first: bool,
) -> Result<()> {
    match profile.layout {
        Layout::Table => record::record_row(out, profile.activities(), iteration, sample, first),
        Layout::Single => {
            // Single layout is validated to track exactly one activity.
            let timing = profile
                .activities()
                .first()
                .map_or(log::Timing::Unavailable, |name| sample.get(name));
            record::record_value(out, timing, first)
        }
    }
}

/// Stop the app, sweep leftover processes and clear the log buffer.
fn close_app<D: DeviceBridge>(device: &mut D, profile: &Profile) -> Result<()> {
    let settle = profile.pauses.settle();
    device.force_stop(&profile.package)?;
    pause(settle);
    device.kill_processes(&profile.package)?;
    pause(settle);
    device.clear_logs()?;
    pause(settle);
    Ok(())
}

fn pause(d: Duration) {
    if !d.is_zero() {
        thread::sleep(d);
    }
}
