//! Core iptmon library: listing parser, counter selection, rate engine,
//! sampling loop, sample log and configuration.

pub mod config;
pub mod error;
pub mod format;
pub mod interrupt;
pub mod listing;
pub mod monitor;
pub mod paths;
pub mod rate;
pub mod sample_log;
pub mod schedule;
pub mod selector;
pub mod source;
pub mod telemetry;
