//! Command-line interface for crudform.
//!
//! This module provides the CLI structure and command handlers for the
//! `crudform` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AddCommand, CepCommand, ConfigCommand, DeleteCommand, DetailArgs, EditCommand, ListCommand,
    ShowCommand, StatsCommand,
};

/// crudform - Register competitors with validated forms
///
/// Keeps a local list of competitors, validates every form before saving and
/// can fill the address from a Brazilian postal code (CEP).
#[derive(Debug, Parser)]
#[command(name = "crudform")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List registered competitors
    List(ListCommand),

    /// Show one competitor
    Show(ShowCommand),

    /// Register a new competitor
    Add(AddCommand),

    /// Change a registered competitor
    Edit(EditCommand),

    /// Remove a competitor
    Delete(DeleteCommand),

    /// Look up an address by postal code
    Cep(CepCommand),

    /// Show storage statistics
    Stats(StatsCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
