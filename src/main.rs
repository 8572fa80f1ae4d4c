//! # mirror
//!
//! Serves a tree of markdown documents mirrored from a remote git
//! repository.
//!
//! ## Usage
//!
//! ```bash
//! mirror --config ./config/mirror.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `mirror serve` | Clone if needed, keep pulling in the background, serve HTTP |
//! | `mirror sync` | Clone if needed, then pull once |
//! | `mirror show <path>` | Resolve a URL path and print the result as JSON |
//! | `mirror search <query>` | Print the paths matching a search query |

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use mirror_site::config;
use mirror_site::server;
use mirror_site::site::Site;
use mirror_site::vcs::GitCli;

#[derive(Parser)]
#[command(
    name = "mirror",
    about = "Serve a git-mirrored tree of markdown documents over HTTP",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/mirror.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clone the content store if absent, start the sync loop, and serve
    /// HTTP on `[server].bind`.
    ///
    /// Exits with an error if the initial clone fails.
    Serve,

    /// Clone the content store if absent, then pull once.
    Sync,

    /// Resolve a URL path against the local store and print the result.
    Show {
        /// URL path, e.g. `notes/foo`.
        path: String,
    },

    /// Search paths and rendered content of every document.
    ///
    /// Prefix the query with `path:` to match paths only.
    Search {
        /// Case-insensitive regular expression.
        query: String,

        /// Match paths only, never file content.
        #[arg(long)]
        path_only: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;
    let site = Arc::new(Site::new(&cfg, Arc::new(GitCli::new())));

    match cli.command {
        Commands::Serve => {
            let sync = site.sync_loop(&cfg);
            sync.bootstrap()
                .await
                .context("initial clone failed; nothing to serve")?;
            let (handle, _task) = sync.spawn();
            server::run_server(&cfg, site, Some(handle)).await?;
        }
        Commands::Sync => {
            let sync = site.sync_loop(&cfg);
            sync.bootstrap().await.context("clone failed")?;
            sync.tick().await.context("pull failed")?;
            println!("{}", serde_json::to_string_pretty(&sync.status())?);
        }
        Commands::Show { path } => {
            let result = tokio::task::spawn_blocking(move || site.resolver.resolve(&path))
                .await??;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Search { query, path_only } => {
            let result =
                tokio::task::spawn_blocking(move || site.search.search(&query, path_only))
                    .await??;
            if result.paths.is_empty() {
                println!("No results.");
            }
            for path in result.paths {
                println!("{}", path);
            }
        }
    }

    Ok(())
}
