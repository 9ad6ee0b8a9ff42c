//! Verify command - report image references that disagree with version files

use crate::cli::error::HelpfulError;
use crate::cli::output::{print_json, render_verify};
use crate::cli::{load_project, ProjectArgs};
use tagsync::Engine;

/// Arguments for the verify command
#[derive(Debug)]
pub struct VerifyArgs {
    pub project: ProjectArgs,
    pub component: Option<String>,
    pub json: bool,
}

/// Execute the verify command
pub fn run(args: VerifyArgs) -> anyhow::Result<()> {
    let project = load_project(&args.project)?;
    let mut engine = Engine::new(&project);
    let report = engine
        .verify(args.component.as_deref())
        .map_err(HelpfulError::from_engine)?;

    if args.json {
        print_json(&report)?;
    } else {
        print!("{}", render_verify(&report));
    }

    if !report.mismatches.is_empty() {
        return Err(HelpfulError::version_mismatches(report.mismatches.len()).into());
    }
    if !report.failures.is_empty() {
        return Err(HelpfulError::components_failed(&report.failures).into());
    }
    Ok(())
}
