use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "lynk")]
#[command(about = "Keep, favorite, and search your links from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// CLI profile name for Supabase configuration
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Save a link (an existing title is overwritten)
    #[command(alias = "new")]
    Add {
        /// Link title; the storage key within your collection
        title: String,
        /// Target URL, stored as entered
        url: String,
    },
    /// List saved links
    List {
        /// Keep only titles containing this text (case-insensitive)
        #[arg(short, long)]
        query: Option<String>,
        /// Keep only favorites
        #[arg(short, long)]
        favorites: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a link by title
    #[command(alias = "rm")]
    Remove {
        /// Title of the link to delete
        title: String,
    },
    /// Mark a link as favorite
    #[command(alias = "fav")]
    Favorite {
        /// Title of the link to favorite
        title: String,
    },
    /// Clear a link's favorite flag
    #[command(alias = "unfav")]
    Unfavorite {
        /// Title of the link to unfavorite
        title: String,
    },
    /// Count stored links
    Count,
    /// Manage the account session
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Show or update the profile avatar
    Avatar {
        #[command(subcommand)]
        command: AvatarCommands,
    },
    /// Show or toggle the color theme
    Theme {
        #[command(subcommand)]
        command: ThemeCommands,
    },
    /// Configure CLI profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Create an account and sign in
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign out and clear the stored session
    Logout,
    /// Show the signed-in account
    Status,
}

#[derive(Subcommand)]
pub enum AvatarCommands {
    /// Print the stored avatar path
    Show,
    /// Store a new avatar from an image file
    Set {
        /// Source image; its file name is kept. Omitting the path cancels.
        path: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum ThemeCommands {
    /// Print the active theme
    Show,
    /// Switch between light and dark
    Toggle,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Create or update a profile
    Init {
        /// Supabase project URL (falls back to SUPABASE_URL)
        #[arg(long, value_name = "URL")]
        supabase_url: Option<String>,
        /// Supabase anon key (falls back to SUPABASE_ANON_KEY)
        #[arg(long, value_name = "KEY")]
        supabase_anon_key: Option<String>,
        /// Make this the active profile
        #[arg(long)]
        activate: bool,
    },
    /// Print the resolved configuration
    Show,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
