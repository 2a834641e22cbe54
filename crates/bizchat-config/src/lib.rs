// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for the Bizchat message router.
//!
//! Layered TOML files plus `BIZCHAT_*` environment overrides, strict
//! `deny_unknown_fields` parsing, and post-load validation whose failures are
//! reported as miette diagnostics.
//!
//! ```no_run
//! let config = bizchat_config::load_and_validate().expect("config errors");
//! println!("webhooks on {}:{}", config.server.host, config.server.port);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::{Path, PathBuf};

pub use diagnostic::{ConfigError, SourceFile, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::BizchatConfig;

/// Load from the standard file hierarchy and validate.
pub fn load_and_validate() -> Result<BizchatConfig, Vec<ConfigError>> {
    checked(loader::load_config(), hierarchy_sources)
}

/// Load from an explicit file (plus env overrides) and validate.
pub fn load_and_validate_path(path: &Path) -> Result<BizchatConfig, Vec<ConfigError>> {
    checked(loader::load_config_from_path(path), || {
        read_source(path.to_path_buf()).into_iter().collect()
    })
}

/// Load from an inline TOML string and validate.
pub fn load_and_validate_str(toml_content: &str) -> Result<BizchatConfig, Vec<ConfigError>> {
    checked(loader::load_config_from_str(toml_content), || {
        vec![SourceFile::new("<inline>", toml_content)]
    })
}

/// Sources are only read when extraction failed and spans are needed.
fn checked(
    loaded: Result<BizchatConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<SourceFile>,
) -> Result<BizchatConfig, Vec<ConfigError>> {
    let config =
        loaded.map_err(|err| diagnostic::figment_to_config_errors(err, &sources()))?;
    validation::validate_config(&config)?;
    Ok(config)
}

fn hierarchy_sources() -> Vec<SourceFile> {
    let local = std::env::current_dir()
        .map(|dir| dir.join("bizchat.toml"))
        .unwrap_or_else(|_| PathBuf::from("bizchat.toml"));
    let user = dirs::config_dir().map(|dir| dir.join("bizchat/bizchat.toml"));
    let system = Some(PathBuf::from("/etc/bizchat/bizchat.toml"));

    std::iter::once(Some(local))
        .chain([user, system])
        .flatten()
        .filter_map(read_source)
        .collect()
}

fn read_source(path: PathBuf) -> Option<SourceFile> {
    let content = std::fs::read_to_string(&path).ok()?;
    Some(SourceFile::new(path.display().to_string(), content))
}
