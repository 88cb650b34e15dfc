//! Command-line interface, parsed with clap.

mod commands;

use clap::{Parser, Subcommand};

/// imgbot - keyword image replies for LINE with an operator console
#[derive(Parser)]
#[command(name = "imgbot")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server and webhook endpoint (default)
    #[command(alias = "web")]
    Serve,

    /// Create default config file
    #[command(alias = "init")]
    InitConfig,

    /// Clear the lockout state of an account
    Unlock {
        /// Account username
        username: String,
    },

    /// Set a new password for an account and clear its lockout state
    ResetPassword {
        /// Account username
        username: String,
        /// New password
        password: String,
    },
}

pub use commands::*;
