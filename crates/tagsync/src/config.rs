//! Project configuration (`tagsync.toml`).
//!
//! The file is optional. Without it the built-in component registry and the
//! default scan settings are used.

use crate::error::{Result, TagSyncError};
use crate::registry::{Component, ComponentRegistry};
use crate::scout::ScanConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the project root.
pub const CONFIG_FILE_NAME: &str = "tagsync.toml";

/// On-disk layout of `tagsync.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default, rename = "component")]
    pub components: Vec<Component>,

    #[serde(default)]
    pub scan: ScanSection,
}

/// Optional `[scan]` table. Missing keys keep their defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScanSection {
    pub ignore_dirs: Option<Vec<String>>,
    pub include_extensions: Option<Vec<String>>,
    #[serde(default)]
    pub exclude_files: Vec<PathBuf>,
    pub follow_symlinks: Option<bool>,
}

impl ConfigFile {
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|source| TagSyncError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Everything the engines need to know about a project.
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    pub root: PathBuf,
    pub registry: ComponentRegistry,
    pub scan: ScanConfig,
    /// The config file this was loaded from, if any.
    pub source: Option<PathBuf>,
}

impl ProjectConfig {
    /// Built-in components and default scan settings for `root`.
    pub fn builtin(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            registry: ComponentRegistry::builtin(),
            scan: ScanConfig::default(),
            source: None,
        }
    }

    /// Load configuration for `root`.
    ///
    /// An explicit path must exist. Otherwise `<root>/tagsync.toml` is used
    /// when present, and the built-in configuration when it is not.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => {
                if !path.is_file() {
                    return Err(TagSyncError::Config(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                path.to_path_buf()
            }
            None => {
                let candidate = root.join(CONFIG_FILE_NAME);
                if !candidate.is_file() {
                    tracing::debug!(root = %root.display(), "No config file, using built-in components");
                    return Ok(Self::builtin(root));
                }
                candidate
            }
        };

        let content = std::fs::read_to_string(&path)?;
        let file = ConfigFile::parse(&content, &path)?;
        tracing::debug!(
            path = %path.display(),
            components = file.components.len(),
            "Loaded config file"
        );
        Self::from_file(root, file, path)
    }

    fn from_file(root: &Path, file: ConfigFile, path: PathBuf) -> Result<Self> {
        let registry = if file.components.is_empty() {
            ComponentRegistry::builtin()
        } else {
            ComponentRegistry::new(file.components)?
        };

        let mut scan = ScanConfig::default();
        if let Some(dirs) = file.scan.ignore_dirs {
            scan.ignore_dirs = dirs.into_iter().collect();
        }
        if let Some(exts) = file.scan.include_extensions {
            scan.include_extensions = exts
                .into_iter()
                .map(|ext| ext.trim_start_matches('.').to_string())
                .collect();
        }
        if let Some(follow) = file.scan.follow_symlinks {
            scan.follow_symlinks = follow;
        }
        scan.exclude_files = file.scan.exclude_files;
        // The config file never scans itself, whatever it is called.
        scan.exclude_files
            .push(path.canonicalize().unwrap_or_else(|_| path.clone()));

        Ok(Self {
            root: root.to_path_buf(),
            registry,
            scan,
            source: Some(path),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
[[component]]
name = "api"
image = "acme/api"
version_file = "services/api/VERSION"

[[component]]
name = "worker"
image = "acme/worker"
version_file = "services/worker/VERSION"

[scan]
ignore_dirs = ["vendor"]
include_extensions = [".md", "yaml"]
exclude_files = ["docs/legacy.md"]
"#;

    #[test]
    fn test_missing_config_uses_builtin() {
        let temp = TempDir::new().unwrap();
        let config = ProjectConfig::load(temp.path(), None).unwrap();
        assert!(config.source.is_none());
        assert_eq!(config.registry.components().len(), 4);
        assert!(config.scan.ignore_dirs.contains("node_modules"));
    }

    #[test]
    fn test_loads_config_from_root() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILE_NAME), SAMPLE).unwrap();

        let config = ProjectConfig::load(temp.path(), None).unwrap();
        assert_eq!(config.registry.names(), vec!["api", "worker"]);
        assert_eq!(config.registry.get("api").unwrap().image_name, "acme/api");
        assert!(config.scan.ignore_dirs.contains("vendor"));
        assert!(!config.scan.ignore_dirs.contains("node_modules"));
        assert!(config.scan.include_extensions.contains("md"));
        assert!(config.scan.include_extensions.contains("yaml"));
        assert!(!config.scan.include_extensions.contains("py"));
        assert_eq!(config.scan.exclude_files.len(), 2);
        assert_eq!(config.source.as_deref(), Some(temp.path().join(CONFIG_FILE_NAME).as_path()));
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("other.toml");
        let err = ProjectConfig::load(temp.path(), Some(&missing)).unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_scan_only_config_keeps_builtin_components() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("custom.toml");
        fs::write(&path, "[scan]\nfollow_symlinks = true\n").unwrap();

        let config = ProjectConfig::load(temp.path(), Some(&path)).unwrap();
        assert_eq!(config.registry.components().len(), 4);
        assert!(config.scan.follow_symlinks);
        assert_eq!(config.scan.exclude_files.len(), 1);
    }

    #[test]
    fn test_rejects_unknown_keys_and_duplicates() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);

        fs::write(&path, "[scan]\nunknown = 1\n").unwrap();
        assert!(matches!(
            ProjectConfig::load(temp.path(), None),
            Err(TagSyncError::ConfigParse { .. })
        ));

        fs::write(
            &path,
            "[[component]]\nname = \"a\"\nimage = \"x/a\"\nversion_file = \"A\"\n\
             [[component]]\nname = \"a\"\nimage = \"x/b\"\nversion_file = \"B\"\n",
        )
        .unwrap();
        assert!(matches!(
            ProjectConfig::load(temp.path(), None),
            Err(TagSyncError::Config(_))
        ));
    }
}
