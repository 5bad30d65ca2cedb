//! Profile layer: JSON schema + validated in-memory profile.
//!
//! It owns:
//! - which package/activity to launch and the fixed pauses around it
//! - the tracked activities (column order of capture files) and their patterns

pub mod config;

pub use config::{Layout, Profile, load_profile};
