//! Verify and update engines.
//!
//! Both engines share the same per-component pipeline: resolve the
//! canonical tag, fetch the compiled pattern for the component's image, then
//! walk the project tree once and look at every candidate file. They differ
//! only in what they do with the matches.
//!
//! Per-file problems (unreadable or unwritable files) are logged and
//! skipped. Per-component problems (missing version file, bad tag) are
//! recorded as [`ComponentFailure`]s and the remaining components are still
//! processed.

mod update;
mod verify;

pub use update::{ComponentUpdate, FileUpdate, UpdateReport};
pub use verify::{ComponentCheck, Mismatch, VerifyReport};

use crate::config::ProjectConfig;
use crate::error::Result;
use crate::registry::{Component, VersionTag};
use crate::scout::{ImagePattern, PatternCache, Scanner};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// A component that could not be processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentFailure {
    pub component: String,
    pub error: String,
}

/// Runs verify/update passes over one project.
pub struct Engine<'a> {
    config: &'a ProjectConfig,
    scanner: Scanner,
    patterns: PatternCache,
}

/// Resolved inputs for processing one component.
struct Target {
    tag: VersionTag,
    pattern: Arc<ImagePattern>,
}

impl<'a> Engine<'a> {
    pub fn new(config: &'a ProjectConfig) -> Self {
        Self {
            config,
            scanner: Scanner::with_config(config.scan.clone()),
            patterns: PatternCache::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    fn target(&mut self, component: &Component) -> Result<Target> {
        let tag = component.current_tag(&self.config.root)?;
        let pattern = self.patterns.get_or_build(&component.image_name)?;
        Ok(Target { tag, pattern })
    }

    /// Candidate files paired with their content. Unreadable files are
    /// logged and skipped.
    fn candidates(&self) -> impl Iterator<Item = (PathBuf, Vec<u8>)> + '_ {
        self.scanner
            .scan(&self.config.root)
            .filter_map(|path| match fs::read(&path) {
                Ok(content) => {
                    debug!(path = %path.display(), bytes = content.len(), "Scanning file");
                    Some((path, content))
                }
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "Could not read file");
                    None
                }
            })
    }

    fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.config.root)
            .unwrap_or(path)
            .to_path_buf()
    }

    /// Run `run` for each selected component, turning component errors into
    /// failures instead of aborting the pass.
    fn for_each_component<T>(
        &mut self,
        filter: Option<&str>,
        mut run: impl FnMut(&mut Self, &Component) -> Result<T>,
    ) -> Result<(Vec<T>, Vec<ComponentFailure>)> {
        let config = self.config;
        let selected = config.registry.select(filter)?;

        let mut done = Vec::with_capacity(selected.len());
        let mut failures = Vec::new();
        for component in selected {
            match run(self, component) {
                Ok(result) => done.push(result),
                Err(err) => {
                    error!(component = %component.name, error = %err, "Component failed");
                    failures.push(ComponentFailure {
                        component: component.name.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }
        Ok((done, failures))
    }
}
