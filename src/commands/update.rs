use anyhow::Result;

use crate::commands::{CommandReport, commit};
use crate::folio::Site;
use crate::folio::changeset::Changeset;
use crate::folio::resync;

pub fn run(site: &Site) -> Result<CommandReport> {
    let mut report = CommandReport::new("update");

    let mut changes = Changeset::default();
    let outcome = resync::update(site, &mut changes)?;
    report.detail(format!(
        "writeups={} tags={} projects={}",
        outcome.writeups, outcome.tags, outcome.projects
    ));
    for slug in &outcome.recreated_tags {
        report.detail(format!("recreated missing tag page `{slug}`"));
    }
    commit(site, changes, &mut report)?;
    Ok(report)
}
