pub mod config;
pub mod error;
pub mod fraud;
pub mod telemetry;
