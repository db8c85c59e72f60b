//! CLI command implementations

pub mod classify;
pub mod demo;
pub mod run;
pub mod workload;
