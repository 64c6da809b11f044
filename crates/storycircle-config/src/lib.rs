// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered `storycircle.toml` configuration.
//!
//! Files are read from `/etc`, the XDG config dir and the working directory,
//! then `STORYCIRCLE_*` variables override them. Every entry point returns
//! either a validated [`CircleConfig`] or all problems found, ready for
//! [`render_errors`].
//!
//! ```no_run
//! let config = match storycircle_config::load_and_validate() {
//!     Ok(config) => config,
//!     Err(errors) => {
//!         storycircle_config::render_errors(&errors);
//!         std::process::exit(2);
//!     }
//! };
//! assert!(config.questions.max_questions_per_conversation > 0);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::{Path, PathBuf};

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::CircleConfig;

type Loaded = Result<CircleConfig, Vec<ConfigError>>;

/// Loads the standard file hierarchy plus environment.
pub fn load_and_validate() -> Loaded {
    checked(loader::load_config(), hierarchy_sources)
}

/// Loads one explicit file plus environment, skipping the hierarchy.
pub fn load_and_validate_path(path: &Path) -> Loaded {
    checked(loader::load_config_from_path(path), || {
        read_sources([path.to_path_buf()])
    })
}

/// Loads inline TOML on top of the defaults.
pub fn load_and_validate_str(toml_content: &str) -> Loaded {
    checked(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

/// Runs validation on success. On a parse failure the sources are read
/// (lazily, only then) so diagnostics can point into them.
fn checked(
    parsed: Result<CircleConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Loaded {
    let config = parsed.map_err(|err| diagnostic::figment_to_config_errors(err, &sources()))?;
    validation::validate_config(&config)?;
    Ok(config)
}

fn hierarchy_sources() -> Vec<(String, String)> {
    let local = std::env::current_dir()
        .map(|dir| dir.join(loader::LOCAL_FILE))
        .unwrap_or_else(|_| PathBuf::from(loader::LOCAL_FILE));
    read_sources([local, loader::user_config_path(), PathBuf::from(loader::SYSTEM_FILE)])
}

fn read_sources(paths: impl IntoIterator<Item = PathBuf>) -> Vec<(String, String)> {
    paths
        .into_iter()
        .filter_map(|path| {
            let content = std::fs::read_to_string(&path).ok()?;
            Some((path.display().to_string(), content))
        })
        .collect()
}
