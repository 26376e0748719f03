//! CLI command definitions and dispatch for the `fsn` binary.
//!
//! Uses clap derive macros for argument parsing. The CLI follows a
//! verb-noun pattern (e.g., `fsn account create`, `fsn session issue`).

pub mod account;
pub mod session;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Run and operate the Fusion AI service.
#[derive(Parser)]
#[command(name = "fsn", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Bridge tracing spans to OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server (and the daily quota reset job).
    Serve {
        /// Bind port (defaults to config.toml, then 8080).
        #[arg(long)]
        port: Option<u16>,

        /// Bind host (defaults to config.toml, then 127.0.0.1).
        #[arg(long)]
        host: Option<String>,
    },

    /// Manage user accounts and tiers.
    Account {
        #[command(subcommand)]
        action: AccountCommand,
    },

    /// Manage auth sessions.
    Session {
        #[command(subcommand)]
        action: SessionCommand,
    },

    /// Zero every daily message counter now (normally done by the
    /// scheduled job at UTC midnight).
    #[command(name = "reset-daily")]
    ResetDaily,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum AccountCommand {
    /// Create a new account (free tier unless --pro).
    Create {
        /// Start the account on the pro tier.
        #[arg(long)]
        pro: bool,
    },

    /// Show an account's profile and remaining allowances.
    Show {
        /// User id of the account.
        user_id: String,
    },

    /// Change an account's tier (billing collaborator stand-in).
    #[command(name = "set-tier")]
    SetTier {
        /// User id of the account.
        user_id: String,

        /// New tier: "free" or "pro".
        tier: String,
    },
}

#[derive(Subcommand)]
pub enum SessionCommand {
    /// Issue a session token for a user (shown once).
    Issue {
        /// User id to authenticate.
        user_id: String,
    },

    /// Revoke a session token.
    Revoke {
        /// The plaintext token to revoke.
        token: String,
    },
}
