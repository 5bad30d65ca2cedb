//! Device control used by the capture loop.
//!
//! Every call is synchronous. A command that runs but reports failure is
//! logged and otherwise ignored; only failing to run it at all is an error.

pub mod adb;

pub use adb::Adb;

use crate::Result;
use std::path::Path;

pub trait DeviceBridge {
    fn install(&mut self, apk: &Path) -> Result<()>;
    fn uninstall(&mut self, package: &str) -> Result<()>;
    fn grant_permission(&mut self, package: &str, permission: &str) -> Result<()>;
    /// Start `package/activity`, e.g. `com.eloelo` + `.splash.view.SplashActivityNew`.
    fn launch(&mut self, package: &str, activity: &str) -> Result<()>;
    fn force_stop(&mut self, package: &str) -> Result<()>;
    /// Kill any process left behind whose command line mentions `package`.
    fn kill_processes(&mut self, package: &str) -> Result<()>;
    fn clear_logs(&mut self) -> Result<()>;
    /// Dump the current device log buffer.
    fn capture_logs(&mut self) -> Result<String>;
}
