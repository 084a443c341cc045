// src/core/mod.rs

//! Session lifecycle, output triage, progress reporting and configuration loading.

pub mod config_loader;
pub mod paths;
pub mod progress;
pub mod session;
pub mod triage;
