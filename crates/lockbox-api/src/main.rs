//! Lockbox CLI and REST API entry point.
//!
//! Binary name: `lbx`
//!
//! Parses CLI arguments, initializes the database and services, then
//! dispatches to the appropriate command handler or starts the REST API server.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands};
use cli::generate::GenerateArgs;
use cli::owner::OwnerCommand;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,lockbox=debug",
        _ => "trace",
    };
    lockbox_observe::tracing_setup::init_tracing(filter, cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = run(cli).await;
    lockbox_observe::tracing_setup::shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Shell completions and password generation don't need app state
    match &cli.command {
        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            generate(*shell, &mut cmd, "lbx", &mut std::io::stdout());
            return Ok(());
        }
        Commands::Generate {
            length,
            no_upper,
            no_lower,
            no_digits,
            no_symbols,
            allow_ambiguous,
            strong,
        } => {
            let defaults = lockbox_types::generator::GeneratorOptions::default();
            let args = GenerateArgs {
                length: length.unwrap_or(defaults.length),
                upper: !no_upper,
                lower: !no_lower,
                digits: !no_digits,
                symbols: !no_symbols,
                exclude_ambiguous: !allow_ambiguous,
                strong: *strong,
            };
            return cli::generate::generate_password(&args, cli.json, cli.quiet);
        }
        _ => {}
    }

    // Initialize application state (DB, services)
    let state = AppState::init().await?;

    match cli.command {
        Commands::Add {
            title,
            username,
            url,
            notes,
            generate,
        } => {
            cli::item::add_item(&state, title, username, url, notes, generate, cli.json).await?;
        }

        Commands::List { search } => {
            cli::item::list_items(&state, search.as_deref(), cli.json).await?;
        }

        Commands::Show { id } => {
            cli::item::show_item(&state, &id, cli.json).await?;
        }

        Commands::Edit {
            id,
            title,
            username,
            url,
            notes,
            password,
        } => {
            cli::item::edit_item(&state, &id, title, username, url, notes, password, cli.json)
                .await?;
        }

        Commands::Delete { id, force } => {
            cli::item::delete_item(&state, &id, force, cli.json).await?;
        }

        Commands::Reveal { id, ttl } => {
            cli::item::reveal_item(&state, &id, ttl, cli.json).await?;
        }

        Commands::Selftest => {
            cli::item::self_test(&state, cli.json).await?;
        }

        Commands::Owner { action } => match action {
            OwnerCommand::Create { name } => {
                cli::owner::create_owner(&state, &name, cli.json).await?;
            }
            OwnerCommand::List => {
                cli::owner::list_owners(&state, cli.json).await?;
            }
        },

        Commands::Serve { port, host } => {
            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            println!(
                "  {} Lockbox API listening on {}",
                console::style("⚡").bold(),
                console::style(format!("http://{addr}")).cyan()
            );
            println!(
                "  {} {}",
                console::style("Vault:").dim(),
                console::style(state.data_dir.display()).dim()
            );
            println!(
                "  {}",
                console::style("Create an API key with: lbx owner create <name>").dim()
            );
            println!("  {}", console::style("Press Ctrl+C to stop").dim());

            let shutdown = state.vault_service.shutdown_token();
            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    shutdown_signal().await;
                    // Derivations still queued for a permit are abandoned.
                    shutdown.cancel();
                })
                .await?;

            println!("\n  Server stopped.");
        }

        Commands::Generate { .. } | Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
