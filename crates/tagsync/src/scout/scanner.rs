//! Candidate file discovery.
//!
//! The scanner walks the project tree with `walkdir`, prunes ignored
//! directories before descending into them, and lazily yields the files
//! that may contain image references. Entries come back in the order the
//! filesystem returns them; nothing is sorted.

use crate::config::CONFIG_FILE_NAME;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Directories that are never descended into.
pub const DEFAULT_IGNORE_DIRS: &[&str] = &[
    ".git",
    ".idea",
    ".vscode",
    "__pycache__",
    "node_modules",
    "dist",
    "build",
    ".gemini",
];

/// File extensions (without the dot) that are scanned.
pub const DEFAULT_INCLUDE_EXTENSIONS: &[&str] = &[
    "md",
    "py",
    "java",
    "ts",
    "js",
    "kt",
    "sh",
    "yaml",
    "yml",
    "toml",
    "properties",
];

/// File names that belong to tagsync itself and are never scanned.
pub const DEFAULT_EXCLUDE_FILE_NAMES: &[&str] = &[CONFIG_FILE_NAME];

/// Configuration for scanning operations
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Directory names to prune (matched against the name, not the path)
    pub ignore_dirs: HashSet<String>,
    /// Extensions to include, compared case-sensitively
    pub include_extensions: HashSet<String>,
    /// File names that are skipped wherever they appear
    pub exclude_file_names: HashSet<String>,
    /// Exact files to skip; relative paths are resolved against the scan root
    pub exclude_files: Vec<PathBuf>,
    /// Whether to follow symlinks
    pub follow_symlinks: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            ignore_dirs: to_set(DEFAULT_IGNORE_DIRS),
            include_extensions: to_set(DEFAULT_INCLUDE_EXTENSIONS),
            exclude_file_names: to_set(DEFAULT_EXCLUDE_FILE_NAMES),
            exclude_files: Vec::new(),
            follow_symlinks: false,
        }
    }
}

fn to_set(items: &[&str]) -> HashSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl ScanConfig {
    /// Should a file with this path be yielded?
    pub fn should_process_file(&self, path: &Path) -> bool {
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => return false,
        };
        if name.starts_with('.') {
            return false;
        }
        if self.exclude_file_names.contains(name) {
            return false;
        }
        path.extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| self.include_extensions.contains(ext))
    }

    fn is_ignored_dir(&self, entry: &DirEntry) -> bool {
        entry.file_type().is_dir()
            && entry.depth() > 0
            && entry
                .file_name()
                .to_str()
                .map_or(false, |name| self.ignore_dirs.contains(name))
    }
}

/// Filesystem scanner
#[derive(Debug, Clone)]
pub struct Scanner {
    config: ScanConfig,
}

impl Scanner {
    pub fn new() -> Self {
        Self {
            config: ScanConfig::default(),
        }
    }

    pub fn with_config(config: ScanConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Lazily walk `root`, yielding candidate files.
    ///
    /// Unreadable directories are logged and skipped.
    pub fn scan<'a>(&'a self, root: &Path) -> impl Iterator<Item = PathBuf> + 'a {
        let excluded: HashSet<PathBuf> = self
            .config
            .exclude_files
            .iter()
            .map(|p| normalize(&root.join(p)))
            .collect();

        WalkDir::new(root)
            .follow_links(self.config.follow_symlinks)
            .into_iter()
            .filter_entry(move |entry| !self.config.is_ignored_dir(entry))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    warn!(
                        path = %err.path().map(|p| p.display().to_string()).unwrap_or_default(),
                        error = %err,
                        "Skipping unreadable entry"
                    );
                    None
                }
            })
            .filter(|entry| {
                entry.file_type().is_file() || (entry.path_is_symlink() && entry.path().is_file())
            })
            .map(DirEntry::into_path)
            .filter(move |path| {
                if !self.config.should_process_file(path) {
                    return false;
                }
                if excluded.contains(&normalize(path)) {
                    debug!(path = %path.display(), "Skipping self-excluded file");
                    return false;
                }
                true
            })
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Canonical form used for exclusion checks; falls back to the path as given
/// when it cannot be resolved.
fn normalize(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "x").unwrap();
    }

    fn scanned(scanner: &Scanner, root: &Path) -> Vec<String> {
        let mut found: Vec<String> = scanner
            .scan(root)
            .map(|p| {
                p.strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();
        found.sort();
        found
    }

    #[test]
    fn test_should_process_file() {
        let config = ScanConfig::default();
        assert!(config.should_process_file(Path::new("README.md")));
        assert!(config.should_process_file(Path::new("script.py")));
        assert!(config.should_process_file(Path::new("config.yaml")));
        assert!(config.should_process_file(Path::new("deploy/values.yml")));

        assert!(!config.should_process_file(Path::new(".hidden")));
        assert!(!config.should_process_file(Path::new(".env.yaml")));
        assert!(!config.should_process_file(Path::new("image.png")));
        assert!(!config.should_process_file(Path::new("text.txt")));
        assert!(!config.should_process_file(Path::new("Makefile")));
        assert!(!config.should_process_file(Path::new(CONFIG_FILE_NAME)));
    }

    #[test]
    fn test_prunes_ignored_dirs() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        touch(root, "README.md");
        touch(root, "docs/guide.md");
        touch(root, "node_modules/pkg/README.md");
        touch(root, ".git/config.toml");
        touch(root, "build/out.yaml");
        touch(root, "server/app/build/nested.yaml");
        touch(root, "docs/.draft.md");
        touch(root, "docs/diagram.png");

        let found = scanned(&Scanner::new(), root);
        assert_eq!(found, vec!["README.md", "docs/guide.md"]);
    }

    #[test]
    fn test_excludes_configured_files() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        touch(root, "docs/keep.md");
        touch(root, "docs/legacy.md");
        touch(root, "tagsync.toml");

        let config = ScanConfig {
            exclude_files: vec![PathBuf::from("docs/legacy.md")],
            ..ScanConfig::default()
        };
        let found = scanned(&Scanner::with_config(config), root);
        assert_eq!(found, vec!["docs/keep.md"]);
    }

    #[test]
    fn test_root_named_like_ignored_dir_is_still_scanned() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("build");
        touch(&root, "notes.md");

        let found = scanned(&Scanner::new(), &root);
        assert_eq!(found, vec!["notes.md"]);
    }

    #[test]
    fn test_scan_is_lazy() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        for i in 0..5 {
            touch(root, &format!("doc{i}.md"));
        }

        let scanner = Scanner::new();
        let mut iter = scanner.scan(root);
        assert!(iter.next().is_some());
        assert_eq!(iter.count(), 4);
    }
}
