//! CLI module for tagsync
//!
//! `verify` and `update` share project loading; each command renders its
//! report as text or, with `--json`, as a JSON document on stdout.

pub mod error;
pub mod output;

pub mod update;
pub mod verify;

use error::HelpfulError;
use std::path::{Path, PathBuf};
use tagsync::ProjectConfig;

/// Options shared by all commands
#[derive(Debug, Clone)]
pub struct ProjectArgs {
    pub root: PathBuf,
    pub config: Option<PathBuf>,
}

/// Validate the project root and load its configuration.
pub fn load_project(args: &ProjectArgs) -> anyhow::Result<ProjectConfig> {
    let root: &Path = &args.root;
    if !root.exists() {
        return Err(HelpfulError::root_not_found(root).into());
    }
    if !root.is_dir() {
        return Err(HelpfulError::root_not_a_directory(root).into());
    }

    ProjectConfig::load(root, args.config.as_deref())
        .map_err(|err| HelpfulError::invalid_config(&err).into())
}
