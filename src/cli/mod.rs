//! Command-line interface handlers

pub mod commands;

pub use commands::{cmd_build, cmd_inspect, cmd_merge, cmd_sign, BuildOptions, CliResult};
