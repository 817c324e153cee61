use anyhow::Result;

use crate::commands::{CommandReport, commit};
use crate::folio::Site;
use crate::folio::changeset::Changeset;
use crate::folio::projects::{ProjectManager, ProjectRequest};

pub fn run(site: &Site, request: &ProjectRequest) -> Result<CommandReport> {
    let mut report = CommandReport::new("project");

    let mut changes = Changeset::default();
    let project = ProjectManager::new(site).add_project(&mut changes, request)?;
    report.detail(format!("added project `{}` dated {}", project.title, project.date));
    commit(site, changes, &mut report)?;
    Ok(report)
}
