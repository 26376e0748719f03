//! Fusion CLI and REST API entry point.
//!
//! Binary name: `fsn`
//!
//! Parses CLI arguments, initializes database and services, then dispatches
//! to the appropriate command handler or starts the REST API server.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;
use console::style;

use fusion_core::profile::ProfileRepository;

use cli::{AccountCommand, Cli, Commands, SessionCommand};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,fusion=debug",
        _ => "trace",
    };
    fusion_observe::tracing_setup::init_tracing(filter, cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "fsn", &mut std::io::stdout());
        return Ok(());
    }

    // Initialize application state (DB, services)
    let state = AppState::init().await?;

    match cli.command {
        Commands::Serve { port, host } => {
            let host = host.unwrap_or_else(|| state.config.server.host.clone());
            let port = port.unwrap_or(state.config.server.port);

            // Keep the scheduler alive for the process lifetime; dropping
            // it stops the daily reset job.
            let _reset_scheduler =
                fusion_infra::reset::spawn_daily_reset(state.profiles.clone()).await?;

            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            println!(
                "  {} Fusion API listening on {}",
                style("⚡").bold(),
                style(format!("http://{addr}")).cyan()
            );
            println!("  {}", style("Press Ctrl+C to stop").dim());

            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            println!("\n  Server stopped.");
        }

        Commands::Account { action } => match action {
            AccountCommand::Create { pro } => {
                cli::account::create_account(&state, pro, cli.json).await?;
            }
            AccountCommand::Show { user_id } => {
                cli::account::show_account(&state, &user_id, cli.json).await?;
            }
            AccountCommand::SetTier { user_id, tier } => {
                cli::account::set_tier(&state, &user_id, &tier, cli.json).await?;
            }
        },

        Commands::Session { action } => match action {
            SessionCommand::Issue { user_id } => {
                cli::session::issue_session(&state, &user_id, cli.json).await?;
            }
            SessionCommand::Revoke { token } => {
                cli::session::revoke_session(&state, &token, cli.json).await?;
            }
        },

        Commands::ResetDaily => {
            let reset = state.profiles.reset_daily_message_counts().await?;
            if cli.json {
                println!("{}", serde_json::json!({ "profiles_reset": reset }));
            } else {
                println!();
                println!(
                    "  {} Daily message counters reset for {} profile(s)",
                    style("✓").green(),
                    style(reset).cyan()
                );
                println!();
            }
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    fusion_observe::tracing_setup::shutdown_tracing();
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
