//! Update command - rewrite stale image references in place

use crate::cli::error::HelpfulError;
use crate::cli::output::{print_json, render_update};
use crate::cli::{load_project, ProjectArgs};
use tagsync::Engine;

/// Arguments for the update command
#[derive(Debug)]
pub struct UpdateArgs {
    pub project: ProjectArgs,
    pub component: Option<String>,
    pub json: bool,
}

/// Execute the update command
pub fn run(args: UpdateArgs) -> anyhow::Result<()> {
    let project = load_project(&args.project)?;
    let mut engine = Engine::new(&project);
    let report = engine
        .update(args.component.as_deref())
        .map_err(HelpfulError::from_engine)?;

    if args.json {
        print_json(&report)?;
    } else {
        print!("{}", render_update(&report));
    }

    tracing::info!(
        files = report.files_modified(),
        occurrences = report.occurrences_replaced(),
        "Update finished"
    );

    if !report.failures.is_empty() {
        return Err(HelpfulError::components_failed(&report.failures).into());
    }
    Ok(())
}
