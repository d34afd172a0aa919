//! Owner management CLI commands: create, list.
//!
//! Owners are the tenants of the REST API. Each gets an API key that is shown
//! exactly once; only its SHA-256 hash is stored.

use anyhow::Result;
use clap::Subcommand;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use lockbox_core::repository::owner::OwnerRepository;

use crate::cli::format_relative_time;
use crate::state::AppState;

#[derive(Subcommand)]
pub enum OwnerCommand {
    /// Create an owner and print its API key.
    Create {
        /// Unique owner name.
        name: String,
    },

    /// List owners.
    #[command(alias = "ls")]
    List,
}

pub async fn create_owner(state: &AppState, name: &str, json: bool) -> Result<()> {
    let (owner, api_key) = state.create_owner(name).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({"id": owner.id, "name": owner.name, "api_key": api_key})
        );
        return Ok(());
    }

    println!();
    println!(
        "  {} Owner '{}' created",
        style("✓").green().bold(),
        style(&owner.name).cyan()
    );
    println!();
    println!(
        "  {} API key (save this -- it won't be shown again):",
        style("🔑").bold()
    );
    println!();
    println!("  {}", style(&api_key).yellow().bold());
    println!();

    Ok(())
}

pub async fn list_owners(state: &AppState, json: bool) -> Result<()> {
    let owners = state.owner_repo.list().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&owners)?);
        return Ok(());
    }

    if owners.is_empty() {
        println!();
        println!(
            "  {} No owners yet. Create one with: {}",
            style("i").blue().bold(),
            style("lbx owner create <name>").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Name").fg(Color::White),
        Cell::new("ID").fg(Color::White),
        Cell::new("Created").fg(Color::White),
    ]);

    for owner in &owners {
        table.add_row(vec![
            Cell::new(&owner.name).fg(Color::Cyan),
            Cell::new(owner.id.to_string()).fg(Color::DarkGrey),
            Cell::new(format_relative_time(&owner.created_at)),
        ]);
    }

    println!();
    println!("{table}");
    println!();

    Ok(())
}
