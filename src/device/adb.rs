use crate::Result;
use crate::device::DeviceBridge;

use anyhow::Context;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// `adb` executable driven through `std::process::Command`.
#[derive(Debug, Clone)]
pub struct Adb {
    program: PathBuf,
    serial: Option<String>,
}

impl Default for Adb {
    fn default() -> Self {
        Self::new("adb", None)
    }
}

impl Adb {
    pub fn new(program: impl Into<PathBuf>, serial: Option<String>) -> Self {
        Self {
            program: program.into(),
            serial,
        }
    }

    /// Full argument list for one invocation, device selector first.
    fn args<'a>(&'a self, args: &[&'a OsStr]) -> Vec<&'a OsStr> {
        let mut out: Vec<&OsStr> = Vec::with_capacity(args.len() + 2);
        if let Some(serial) = &self.serial {
            out.push(OsStr::new("-s"));
            out.push(OsStr::new(serial.as_str()));
        }
        out.extend_from_slice(args);
        out
    }

    fn run(&self, args: &[&OsStr]) -> Result<Output> {
        let output = self.spawn(args)?;
        if !output.status.success() {
            warn_failed(args, &output);
        }
        Ok(output)
    }

    fn spawn(&self, args: &[&OsStr]) -> Result<Output> {
        let args = self.args(args);
        let shown = show(&args);
        tracing::debug!(program = %self.program.display(), args = %shown, "running device command");

        Command::new(&self.program)
            .args(&args)
            .output()
            .with_context(|| format!("run {} {}", self.program.display(), shown))
    }

    fn run_str(&self, args: &[&str]) -> Result<Output> {
        let args: Vec<&OsStr> = args.iter().map(OsStr::new).collect();
        self.run(&args)
    }
}

fn show(args: &[&OsStr]) -> String {
    args.iter()
        .map(|a| a.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

fn warn_failed(args: &[&OsStr], output: &Output) {
    tracing::warn!(
        command = %show(args),
        status = %output.status,
        stderr = %String::from_utf8_lossy(&output.stderr).trim(),
        "device command failed"
    );
}

impl DeviceBridge for Adb {
    fn install(&mut self, apk: &Path) -> Result<()> {
        tracing::info!(apk = %apk.display(), "installing app");
        self.run(&[OsStr::new("install"), apk.as_os_str()])?;
        Ok(())
    }

    fn uninstall(&mut self, package: &str) -> Result<()> {
        tracing::info!(package, "uninstalling app");
        self.run_str(&["uninstall", package])?;
        Ok(())
    }

    fn grant_permission(&mut self, package: &str, permission: &str) -> Result<()> {
        tracing::info!(package, permission, "granting permission");
        self.run_str(&["shell", "pm", "grant", package, permission])?;
        Ok(())
    }

    fn launch(&mut self, package: &str, activity: &str) -> Result<()> {
        let component = format!("{}/{}", package, activity);
        tracing::info!(%component, "launching app");
        self.run_str(&["shell", "am", "start", "-n", &component])?;
        Ok(())
    }

    fn force_stop(&mut self, package: &str) -> Result<()> {
        self.run_str(&["shell", "am", "force-stop", package])?;
        Ok(())
    }

    fn kill_processes(&mut self, package: &str) -> Result<()> {
        let args = ["shell", "pkill", "-f", package].map(OsStr::new);
        let output = self.spawn(&args)?;
        // pkill exits 1 when nothing matched; that is the usual case.
        if !matches!(output.status.code(), Some(0) | Some(1)) {
            warn_failed(&args, &output);
        }
        Ok(())
    }

    fn clear_logs(&mut self) -> Result<()> {
        self.run_str(&["logcat", "-c"])?;
        Ok(())
    }

    fn capture_logs(&mut self) -> Result<String> {
        let output = self.run_str(&["logcat", "-d"])?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
