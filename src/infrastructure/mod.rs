//! Process-level infrastructure: configuration loading and telemetry.

pub mod config_loader;
pub mod telemetry;

pub use config_loader::ConfigLoader;
