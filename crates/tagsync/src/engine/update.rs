use super::{ComponentFailure, Engine};
use crate::error::Result;
use crate::registry::Component;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

/// One rewritten file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileUpdate {
    /// Path relative to the project root.
    pub file: PathBuf,
    pub occurrences: usize,
}

/// Update summary for one component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentUpdate {
    pub component: String,
    pub image: String,
    pub tag: String,
    pub files: Vec<FileUpdate>,
    pub files_modified: usize,
    pub occurrences_replaced: usize,
}

/// Result of an update pass.
#[derive(Debug, Default, Serialize)]
pub struct UpdateReport {
    pub components: Vec<ComponentUpdate>,
    pub failures: Vec<ComponentFailure>,
}

impl UpdateReport {
    pub fn files_modified(&self) -> usize {
        self.components.iter().map(|c| c.files_modified).sum()
    }

    pub fn occurrences_replaced(&self) -> usize {
        self.components.iter().map(|c| c.occurrences_replaced).sum()
    }
}

impl<'a> Engine<'a> {
    /// Rewrite stale references for one component, or all components when
    /// `filter` is `None`.
    ///
    /// Fails only when `filter` names an unknown component; other
    /// component errors end up in [`UpdateReport::failures`].
    pub fn update(&mut self, filter: Option<&str>) -> Result<UpdateReport> {
        let (components, failures) =
            self.for_each_component(filter, |engine, component| engine.update_component(component))?;
        Ok(UpdateReport {
            components,
            failures,
        })
    }

    /// Point every reference to `component`'s image at its current version.
    ///
    /// Files are only written when their content changes. A file that cannot
    /// be written is logged and left as it was.
    pub fn update_component(&mut self, component: &Component) -> Result<ComponentUpdate> {
        let target = self.target(component)?;
        let tag = target.tag.as_str();
        info!(component = %component.name, tag = %tag, "Updating component");

        let mut files = Vec::new();
        for (path, content) in self.candidates() {
            let (updated, replaced) = target.pattern.replace_tags(&content, tag);
            if replaced == 0 || updated == content {
                continue;
            }
            if let Err(err) = fs::write(&path, &updated) {
                warn!(path = %path.display(), error = %err, "Could not update file");
                continue;
            }
            info!(path = %path.display(), occurrences = replaced, "Updated file");
            files.push(FileUpdate {
                file: self.relative(&path),
                occurrences: replaced,
            });
        }

        Ok(ComponentUpdate {
            component: component.name.clone(),
            image: component.image_name.clone(),
            tag: tag.to_string(),
            files_modified: files.len(),
            occurrences_replaced: files.iter().map(|f| f.occurrences).sum(),
            files,
        })
    }
}
