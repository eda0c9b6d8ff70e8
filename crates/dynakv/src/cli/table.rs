//! Table provisioning commands.

use clap::{Parser, Subcommand};

/// Table provisioning commands.
#[derive(Debug, Parser)]
pub struct TableCommand {
    #[command(subcommand)]
    pub action: TableAction,
}

/// Available table actions.
#[derive(Debug, Subcommand)]
pub enum TableAction {
    /// Create the key/value table and wait until it is active.
    Create,
    /// Show the table's status and key schema.
    Describe,
}
