// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Story Circle - multi-author conversations about shared media.
//!
//! This is the binary entry point. Each subcommand opens the configured
//! store, runs one operation and exits.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod circle;
mod health;
mod local;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use storycircle_core::CircleError;

use crate::circle::Circle;

/// Story Circle - multi-author conversations about shared media.
#[derive(Parser, Debug)]
#[command(name = "storycircle", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Print every participant's messages for an ember.
    Messages {
        #[arg(long)]
        ember: String,
    },
    /// Submit an answer as typed text, a recording, or both.
    Submit {
        #[arg(long)]
        ember: String,
        #[arg(long)]
        user: String,
        #[arg(long)]
        text: Option<String>,
        /// Record for this many seconds before submitting.
        #[arg(long)]
        record_secs: Option<f64>,
    },
    /// Open a circle, asking the opening question when it is empty.
    Open {
        #[arg(long)]
        ember: String,
        #[arg(long)]
        user: String,
    },
    /// Delete one message (ember owner only).
    Delete {
        #[arg(long)]
        ember: String,
        #[arg(long)]
        user: String,
        #[arg(long)]
        message: String,
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },
    /// Delete every conversation on an ember (ember owner only).
    Clear {
        #[arg(long)]
        ember: String,
        #[arg(long)]
        user: String,
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },
    /// Record the owner of an ember.
    Register {
        #[arg(long)]
        ember: String,
        #[arg(long)]
        owner: String,
    },
    /// Check every configured adapter.
    Health {
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => storycircle_config::load_and_validate_path(path),
        None => storycircle_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            storycircle_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.circle.log_level);

    let Some(command) = cli.command else {
        println!("storycircle: use --help for available commands");
        return;
    };

    match run(config, command).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}

async fn run(config: storycircle_config::CircleConfig, command: Commands) -> Result<i32, CircleError> {
    let user = match &command {
        Commands::Submit { user, .. }
        | Commands::Open { user, .. }
        | Commands::Delete { user, .. }
        | Commands::Clear { user, .. } => Some(user.clone()),
        _ => None,
    };
    let circle = Circle::open(config, user).await?;

    let mut code = 0;
    let result = match command {
        Commands::Messages { ember } => circle.messages(&ember).await,
        Commands::Submit {
            ember,
            text,
            record_secs,
            ..
        } => circle.submit(&ember, text, record_secs).await,
        Commands::Open { ember, .. } => circle.open_circle(&ember).await,
        Commands::Delete {
            ember,
            user,
            message,
            yes,
        } => circle.delete(&ember, &message, &user, yes).await,
        Commands::Clear { ember, user, yes } => circle.clear(&ember, &user, yes).await,
        Commands::Register { ember, owner } => circle.register(&ember, &owner).await,
        Commands::Health { plain } => {
            let results = health::check_all(&circle.adapters()).await;
            if health::print_results(&results, plain) > 0 {
                code = 1;
            }
            health::print_memory();
            Ok(())
        }
    };

    circle.close().await?;
    result.map(|()| code)
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("storycircle={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Only jemalloc supports advancing the epoch.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn submit_accepts_text_and_recording() {
        let cli = Cli::parse_from([
            "storycircle",
            "submit",
            "--ember",
            "e1",
            "--user",
            "alice",
            "--text",
            "We went to the park",
            "--record-secs",
            "2.5",
        ]);
        match cli.command {
            Some(Commands::Submit {
                text, record_secs, ..
            }) => {
                assert_eq!(text.as_deref(), Some("We went to the park"));
                assert_eq!(record_secs, Some(2.5));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn delete_defaults_to_unconfirmed() {
        let cli = Cli::parse_from([
            "storycircle", "delete", "--ember", "e1", "--user", "owner", "--message", "m1",
        ]);
        assert!(matches!(cli.command, Some(Commands::Delete { yes: false, .. })));
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = storycircle_config::load_and_validate_str("")
            .expect("default config should be valid");
        assert_eq!(config.circle.conversation_type, "story");
    }
}
