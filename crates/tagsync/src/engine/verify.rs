use super::{ComponentFailure, Engine};
use crate::error::Result;
use crate::registry::Component;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use tracing::info;

/// An image reference whose tag differs from the component's version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    pub component: String,
    /// Path relative to the project root.
    pub file: PathBuf,
    pub found: String,
    pub expected: String,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: Found {}, expected {}",
            self.file.display(),
            self.found,
            self.expected
        )
    }
}

/// What was checked for one component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentCheck {
    pub component: String,
    pub image: String,
    pub tag: String,
    pub mismatches: usize,
}

/// Result of a verify pass.
#[derive(Debug, Default, Serialize)]
pub struct VerifyReport {
    pub checked: Vec<ComponentCheck>,
    /// All mismatches, in component order, then scan order, then match order.
    pub mismatches: Vec<Mismatch>,
    pub failures: Vec<ComponentFailure>,
}

impl VerifyReport {
    /// True when no mismatch was found and every component was processed.
    pub fn is_ok(&self) -> bool {
        self.mismatches.is_empty() && self.failures.is_empty()
    }
}

impl<'a> Engine<'a> {
    /// Check one component, or all components when `filter` is `None`.
    ///
    /// Fails only when `filter` names an unknown component; other
    /// component errors end up in [`VerifyReport::failures`].
    pub fn verify(&mut self, filter: Option<&str>) -> Result<VerifyReport> {
        let (results, failures) =
            self.for_each_component(filter, |engine, component| engine.verify_component(component))?;

        let mut report = VerifyReport {
            failures,
            ..VerifyReport::default()
        };
        for (check, mismatches) in results {
            report.checked.push(check);
            report.mismatches.extend(mismatches);
        }
        Ok(report)
    }

    /// Collect every mismatching reference to `component`'s image.
    pub fn verify_component(
        &mut self,
        component: &Component,
    ) -> Result<(ComponentCheck, Vec<Mismatch>)> {
        let target = self.target(component)?;
        let expected = target.tag.as_str();
        info!(
            component = %component.name,
            image = %component.image_name,
            tag = %expected,
            "Verifying component"
        );

        let mut mismatches = Vec::new();
        for (path, content) in self.candidates() {
            for found in target.pattern.find_iter(&content) {
                if found.tag != expected {
                    mismatches.push(Mismatch {
                        component: component.name.clone(),
                        file: self.relative(&path),
                        found: found.tag.to_string(),
                        expected: expected.to_string(),
                    });
                }
            }
        }

        let check = ComponentCheck {
            component: component.name.clone(),
            image: component.image_name.clone(),
            tag: expected.to_string(),
            mismatches: mismatches.len(),
        };
        Ok((check, mismatches))
    }
}
