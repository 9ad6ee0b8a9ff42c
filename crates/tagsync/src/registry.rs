//! Component registry: which images exist and where their versions live.
//!
//! A [`ComponentRegistry`] is built once at startup (from the built-in table
//! or from `tagsync.toml`) and handed to the engines by reference. It is
//! never mutated afterwards.

use crate::error::{Result, TagSyncError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// A deployable unit with its own image and canonical version file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Component {
    pub name: String,
    /// Image name without registry prefix or tag, e.g. `opensandbox/execd`.
    #[serde(rename = "image")]
    pub image_name: String,
    /// Version file path; relative paths are resolved against the project root.
    pub version_file: PathBuf,
}

impl Component {
    pub fn new(
        name: impl Into<String>,
        image_name: impl Into<String>,
        version_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            image_name: image_name.into(),
            version_file: version_file.into(),
        }
    }

    pub fn version_file_path(&self, root: &Path) -> PathBuf {
        root.join(&self.version_file)
    }

    /// Read the canonical tag from this component's version file.
    pub fn current_tag(&self, root: &Path) -> Result<VersionTag> {
        let path = self.version_file_path(root);
        if !path.is_file() {
            return Err(TagSyncError::MissingVersionFile {
                component: self.name.clone(),
                path,
            });
        }
        let raw = fs::read_to_string(&path)?;
        VersionTag::parse(&raw).map_err(|reason| TagSyncError::InvalidVersionTag {
            component: self.name.clone(),
            path,
            reason,
        })
    }
}

/// Canonical version of a component, e.g. `v1.0.0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct VersionTag(String);

impl VersionTag {
    /// Parse the content of a version file. Surrounding whitespace is ignored;
    /// the remainder must be a single non-empty token.
    pub fn parse(raw: &str) -> std::result::Result<Self, String> {
        let tag = raw.trim();
        if tag.is_empty() {
            return Err("version file is empty".to_string());
        }
        if tag.chars().any(char::is_whitespace) {
            return Err(format!("expected a single tag, found '{}'", tag));
        }
        Ok(Self(tag.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered, validated set of components.
#[derive(Debug, Clone)]
pub struct ComponentRegistry {
    components: Vec<Component>,
}

impl ComponentRegistry {
    /// Build a registry, rejecting empty, unnamed or duplicate components.
    pub fn new(components: Vec<Component>) -> Result<Self> {
        if components.is_empty() {
            return Err(TagSyncError::Config("no components configured".to_string()));
        }

        let mut seen = HashSet::new();
        for component in &components {
            if component.name.trim().is_empty() {
                return Err(TagSyncError::Config("component with empty name".to_string()));
            }
            if component.image_name.trim().is_empty() {
                return Err(TagSyncError::Config(format!(
                    "component '{}' has an empty image name",
                    component.name
                )));
            }
            if component.version_file.as_os_str().is_empty() {
                return Err(TagSyncError::Config(format!(
                    "component '{}' has an empty version_file",
                    component.name
                )));
            }
            if !seen.insert(component.name.as_str()) {
                return Err(TagSyncError::Config(format!(
                    "duplicate component '{}'",
                    component.name
                )));
            }
        }

        Ok(Self { components })
    }

    /// The OpenSandbox component set used when no config file is present.
    pub fn builtin() -> Self {
        Self {
            components: vec![
                Component::new(
                    "code-interpreter",
                    "opensandbox/code-interpreter",
                    "sandboxes/code-interpreter/VERSION_TAG",
                ),
                Component::new("execd", "opensandbox/execd", "components/execd/VERSION_TAG"),
                Component::new(
                    "ingress",
                    "opensandbox/ingress",
                    "components/ingress/VERSION_TAG",
                ),
                Component::new("egress", "opensandbox/egress", "components/egress/VERSION_TAG"),
            ],
        }
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn get(&self, name: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.components.iter().map(|c| c.name.as_str()).collect()
    }

    /// Resolve an optional component filter. `None` selects everything in
    /// registry order.
    pub fn select(&self, filter: Option<&str>) -> Result<Vec<&Component>> {
        match filter {
            None => Ok(self.components.iter().collect()),
            Some(name) => self
                .get(name)
                .map(|c| vec![c])
                .ok_or_else(|| TagSyncError::UnknownComponent {
                    name: name.to_string(),
                    known: self.names().join(", "),
                }),
        }
    }
}
