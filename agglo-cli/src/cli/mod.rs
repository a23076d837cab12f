//! Command-line interface for running hierarchical clustering.
//!
//! The `run` command loads points from a Parquet column or strings from a
//! text file, builds the linkage and prints the merge steps.

mod commands;

pub use commands::{
    Cli, CliError, Command, ExecutionSummary, ParquetArgs, RunCommand, RunSource, TextArgs,
    render_summary, run_cli,
};

#[cfg(test)]
mod test_fixtures;
