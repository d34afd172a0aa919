//! CLI command definitions and dispatch for the `lbx` binary.
//!
//! Uses clap derive macros for argument parsing. Vault commands act on behalf
//! of the `local` owner; REST clients authenticate as their own owner.

pub mod generate;
pub mod item;
pub mod owner;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use dialoguer::Password;
use indicatif::{ProgressBar, ProgressStyle};
use secrecy::SecretString;

/// Environment variable read instead of prompting for the master password.
pub const MASTER_PASSWORD_ENV: &str = "LOCKBOX_MASTER_PASSWORD";

/// Store credentials encrypted under a master password.
#[derive(Parser)]
#[command(name = "lbx", version, about, long_about = None)]
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

    /// Also export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true, env = "LOCKBOX_OTEL")]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a credential to the vault.
    Add {
        /// Display name, e.g. the site or service.
        #[arg(long)]
        title: Option<String>,

        /// Account name on that site.
        #[arg(long)]
        username: Option<String>,

        #[arg(long)]
        url: Option<String>,

        #[arg(long)]
        notes: Option<String>,

        /// Generate a strong password instead of prompting for one.
        #[arg(long, short)]
        generate: bool,
    },

    /// List stored credentials (passwords masked).
    #[command(alias = "ls")]
    List {
        /// Only show credentials whose title, username or URL contains this
        /// text (case-insensitive).
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Show one credential (password masked).
    Show {
        /// Item ID.
        id: String,
    },

    /// Edit a credential's fields.
    Edit {
        /// Item ID.
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        username: Option<String>,

        /// New URL; pass an empty string to clear it.
        #[arg(long)]
        url: Option<String>,

        /// New notes; pass an empty string to clear them.
        #[arg(long)]
        notes: Option<String>,

        /// Prompt for a new password (re-encrypted under the master password).
        #[arg(long)]
        password: bool,
    },

    /// Delete a credential permanently.
    #[command(alias = "rm")]
    Delete {
        /// Item ID.
        id: String,

        /// Skip confirmation prompt.
        #[arg(long)]
        force: bool,
    },

    /// Decrypt and display a password for a limited time.
    Reveal {
        /// Item ID.
        id: String,

        /// Seconds to keep the password on screen (defaults to config).
        #[arg(long)]
        ttl: Option<u64>,
    },

    /// Generate a password without storing it.
    #[command(alias = "gen")]
    Generate {
        /// Number of characters.
        #[arg(short, long)]
        length: Option<usize>,

        #[arg(long)]
        no_upper: bool,

        #[arg(long)]
        no_lower: bool,

        #[arg(long)]
        no_digits: bool,

        #[arg(long)]
        no_symbols: bool,

        /// Keep look-alike characters (0/O, 1/l/I).
        #[arg(long)]
        allow_ambiguous: bool,

        /// Guarantee at least one character of every class.
        #[arg(long)]
        strong: bool,
    },

    /// Check that a master password round-trips through the cipher.
    Selftest,

    /// Manage REST API owners.
    Owner {
        #[command(subcommand)]
        action: owner::OwnerCommand,
    },

    /// Start the REST API server.
    Serve {
        /// Port to listen on.
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

/// Read the master password from `LOCKBOX_MASTER_PASSWORD` or a hidden prompt.
///
/// `confirm` asks twice, used when something new gets sealed.
pub fn master_password(confirm: bool) -> Result<SecretString> {
    if let Ok(value) = std::env::var(MASTER_PASSWORD_ENV) {
        if !value.is_empty() {
            return Ok(SecretString::from(value));
        }
    }

    let prompt = Password::new().with_prompt("Master password");
    let value = if confirm {
        prompt
            .with_confirmation("Repeat master password", "Passwords do not match")
            .interact()?
    } else {
        prompt.interact()?
    };
    Ok(SecretString::from(value))
}

/// Spinner shown while a key derivation runs.
pub fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner
}

/// Human-friendly relative time, falling back to a date after 30 days.
pub fn format_relative_time(dt: &chrono::DateTime<chrono::Utc>) -> String {
    let now = chrono::Utc::now();
    let diff = now - *dt;

    if diff.num_minutes() < 1 {
        "just now".to_string()
    } else if diff.num_hours() < 1 {
        format!("{}m ago", diff.num_minutes())
    } else if diff.num_days() < 1 {
        format!("{}h ago", diff.num_hours())
    } else if diff.num_days() < 30 {
        format!("{}d ago", diff.num_days())
    } else {
        dt.format("%Y-%m-%d").to_string()
    }
}
