//! Vault item CLI commands: add, list, show, edit, delete, reveal, selftest.

use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::{Term, style};
use dialoguer::{Confirm, Input, Password};
use secrecy::SecretString;

use lockbox_core::ephemeral::EphemeralSecret;
use lockbox_types::vault::{
    CreateVaultItemRequest, UpdateVaultItemRequest, VaultItem, VaultItemId, VaultItemView,
};

use crate::cli::{format_relative_time, master_password, spinner};
use crate::state::AppState;

fn parse_id(raw: &str) -> Result<VaultItemId> {
    raw.parse()
        .map_err(|_| anyhow::anyhow!("'{raw}' is not a valid item id"))
}

fn prompt_or(value: Option<String>, prompt: &str) -> Result<String> {
    match value {
        Some(v) => Ok(v),
        None => Ok(Input::<String>::new().with_prompt(prompt).interact_text()?),
    }
}

/// Add a credential. Prompts for anything not passed as a flag.
///
/// # Examples
///
/// ```bash
/// # Interactive
/// lbx add
///
/// # One-shot with a generated password
/// lbx add --title GitHub --username octocat --generate
/// ```
pub async fn add_item(
    state: &AppState,
    title: Option<String>,
    username: Option<String>,
    url: Option<String>,
    notes: Option<String>,
    generate: bool,
    json: bool,
) -> Result<()> {
    let title = prompt_or(title, "Title")?;
    let username = prompt_or(username, "Username")?;

    let password = if generate {
        None
    } else {
        let value = Password::new()
            .with_prompt("Password (empty to generate)")
            .allow_empty_password(true)
            .interact()?;
        (!value.is_empty()).then(|| SecretString::from(value))
    };

    let master = master_password(true)?;
    let owner = state.local_owner().await?;

    let request = CreateVaultItemRequest {
        title,
        username,
        password,
        url,
        notes,
    };

    let spinner = spinner("Encrypting...");
    let result = state
        .vault_service
        .create_item(&owner.id, request, master)
        .await;
    spinner.finish_and_clear();
    let item = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&VaultItemView::from(&item))?);
        return Ok(());
    }

    println!();
    println!("  {} Credential stored", style("✓").green().bold());
    println!();
    print_item(&item);
    println!(
        "  Reveal it with: {}",
        style(format!("lbx reveal {}", item.id)).yellow()
    );
    println!();

    Ok(())
}

/// List the local owner's credentials in a table, optionally filtered.
pub async fn list_items(state: &AppState, search: Option<&str>, json: bool) -> Result<()> {
    let owner = state.local_owner().await?;
    let items = state.vault_service.list_items(&owner.id, search).await?;

    if json {
        let views: Vec<VaultItemView> = items.iter().map(VaultItemView::from).collect();
        println!("{}", serde_json::to_string_pretty(&views)?);
        return Ok(());
    }

    if items.is_empty() {
        println!();
        match search {
            Some(term) => println!(
                "  {} No credentials match '{}'",
                style("i").blue().bold(),
                style(term).yellow()
            ),
            None => println!(
                "  {} Vault is empty. Add a credential with: {}",
                style("i").blue().bold(),
                style("lbx add").yellow()
            ),
        }
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("ID").fg(Color::White),
        Cell::new("Title").fg(Color::White),
        Cell::new("Username").fg(Color::White),
        Cell::new("URL").fg(Color::White),
        Cell::new("Updated").fg(Color::White),
    ]);

    for item in &items {
        table.add_row(vec![
            Cell::new(item.id.to_string()).fg(Color::DarkGrey),
            Cell::new(&item.title).fg(Color::Cyan),
            Cell::new(&item.username),
            Cell::new(item.url.as_deref().unwrap_or("-")),
            Cell::new(format_relative_time(&item.updated_at)).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} credential{}",
        style(items.len()).bold(),
        if items.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

/// Show one credential with its password masked.
pub async fn show_item(state: &AppState, id: &str, json: bool) -> Result<()> {
    let id = parse_id(id)?;
    let owner = state.local_owner().await?;
    let item = state.vault_service.get_item(&owner.id, &id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&VaultItemView::from(&item))?);
        return Ok(());
    }

    println!();
    print_item(&item);
    Ok(())
}

/// Edit a credential. The master password is only asked for when the
/// password itself changes.
#[allow(clippy::too_many_arguments)]
pub async fn edit_item(
    state: &AppState,
    id: &str,
    title: Option<String>,
    username: Option<String>,
    url: Option<String>,
    notes: Option<String>,
    change_password: bool,
    json: bool,
) -> Result<()> {
    let id = parse_id(id)?;

    let password = if change_password {
        let value = Password::new()
            .with_prompt("New password")
            .with_confirmation("Repeat new password", "Passwords do not match")
            .interact()?;
        Some(SecretString::from(value))
    } else {
        None
    };

    let request = UpdateVaultItemRequest {
        title,
        username,
        password,
        url,
        notes,
    };
    if request.is_empty() {
        anyhow::bail!("nothing to change; pass at least one field flag");
    }

    let master = if change_password {
        Some(master_password(false)?)
    } else {
        None
    };

    let owner = state.local_owner().await?;
    let spinner = spinner("Updating...");
    let result = state
        .vault_service
        .update_item(&owner.id, &id, request, master)
        .await;
    spinner.finish_and_clear();
    let item = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&VaultItemView::from(&item))?);
        return Ok(());
    }

    println!();
    println!("  {} Credential updated", style("✓").green().bold());
    println!();
    print_item(&item);
    Ok(())
}

/// Delete a credential after confirmation.
pub async fn delete_item(state: &AppState, id: &str, force: bool, json: bool) -> Result<()> {
    let id = parse_id(id)?;
    let owner = state.local_owner().await?;
    let item = state.vault_service.get_item(&owner.id, &id).await?;

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Permanently delete '{}'? This cannot be undone.",
                style(&item.title).red().bold()
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    state.vault_service.delete_item(&owner.id, &id).await?;

    if json {
        println!("{}", serde_json::json!({"deleted": true, "id": id}));
    } else {
        println!(
            "  {} Deleted '{}'",
            style("✓").green().bold(),
            style(&item.title).bold()
        );
    }

    Ok(())
}

/// Decrypt a password and keep it on screen until the TTL elapses or Ctrl+C.
///
/// With `--json` the password is printed once and the command exits.
pub async fn reveal_item(state: &AppState, id: &str, ttl: Option<u64>, json: bool) -> Result<()> {
    let id = parse_id(id)?;
    let owner = state.local_owner().await?;
    let master = master_password(false)?;

    let spinner = spinner("Deriving key...");
    let result = state
        .vault_service
        .reveal_password(&owner.id, &id, master)
        .await;
    spinner.finish_and_clear();
    let password = result?;

    let ttl = Duration::from_secs(ttl.unwrap_or(state.config.reveal_ttl_secs));
    let secret = EphemeralSecret::new(password, ttl);

    if json {
        let value = secret
            .expose(|s| serde_json::json!({"id": id, "password": s}))
            .context("revealed password expired before it could be printed")?;
        println!("{value}");
        return Ok(());
    }

    let term = Term::stdout();
    let hide_in = secret.remaining().as_secs();
    if let Some(line) = secret.expose(|s| {
        format!(
            "  {} {}  {}",
            style("Password:").bold(),
            style(s).yellow().bold(),
            style(format!("(hidden in {hide_in}s, Ctrl+C to hide now)")).dim()
        )
    }) {
        term.write_line(&line)?;
    }

    tokio::select! {
        _ = secret.expired() => {}
        _ = tokio::signal::ctrl_c() => {}
    }
    secret.revoke();

    term.clear_last_lines(1)?;
    term.write_line(&format!("  {} Password hidden", style("i").blue().bold()))?;
    std::io::stdout().flush()?;

    Ok(())
}

/// Round-trip a known value under the master password.
pub async fn self_test(state: &AppState, json: bool) -> Result<()> {
    let master = master_password(false)?;

    let spinner = spinner("Running cipher self-test...");
    let result = state.vault_service.verify_master(master).await;
    spinner.finish_and_clear();
    let ok = result?;

    if json {
        println!("{}", serde_json::json!({ "ok": ok }));
    } else if ok {
        println!("  {} Cipher self-test passed", style("✓").green().bold());
    } else {
        println!("  {} Cipher self-test failed", style("✗").red().bold());
    }

    if !ok {
        anyhow::bail!("cipher self-test failed");
    }
    Ok(())
}

fn print_item(item: &VaultItem) {
    let view = VaultItemView::from(item);
    println!("  {}  {}", style("Title:").bold(), style(&view.title).cyan());
    println!("  {}  {}", style("Username:").bold(), view.username);
    println!("  {}  {}", style("Password:").bold(), style(view.password).dim());
    if let Some(url) = &view.url {
        println!("  {}  {}", style("URL:").bold(), url);
    }
    if let Some(notes) = &view.notes {
        println!("  {}  {}", style("Notes:").bold(), notes);
    }
    println!(
        "  {}  {}",
        style("Updated:").bold(),
        format_relative_time(&view.updated_at)
    );
    println!("  {}  {}", style("ID:").bold(), style(view.id.to_string()).dim());
    println!();
}
