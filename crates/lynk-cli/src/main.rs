//! Lynk CLI - keep, favorite, and search your links from the command line.

mod auth;
mod cli;
mod commands;
mod config;
mod error;

use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lynk=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let profile = cli.profile.as_deref();

    match cli.command {
        Commands::Add { title, url } => commands::links::run_add(profile, &title, &url).await,
        Commands::List {
            query,
            favorites,
            json,
        } => commands::links::run_list(profile, query.as_deref(), favorites, json).await,
        Commands::Remove { title } => commands::links::run_remove(profile, &title).await,
        Commands::Favorite { title } => commands::links::run_favorite(profile, &title, true).await,
        Commands::Unfavorite { title } => {
            commands::links::run_favorite(profile, &title, false).await
        }
        Commands::Count => commands::links::run_count(profile).await,
        Commands::Auth { command } => commands::auth_cmd::run_auth(command, profile).await,
        Commands::Avatar { command } => commands::avatar::run_avatar(command, profile).await,
        Commands::Theme { command } => commands::theme::run_theme(command),
        Commands::Config { command } => commands::config_cmd::run_config(command, profile),
        Commands::Completions { shell, output } => {
            commands::completions::run_completions(shell, output.as_deref())
        }
    }
}
