use anyhow::Result;

use crate::commands::{CommandReport, commit};
use crate::folio::Site;
use crate::folio::changeset::Changeset;

pub fn run(site: &Site) -> Result<CommandReport> {
    let mut report = CommandReport::new("init");
    report.detail(format!("base_dir={}", site.paths.base_dir.display()));

    let mut changes = Changeset::default();
    let staged = site.scaffold(&mut changes)?;
    if staged.is_empty() {
        report.detail("site already initialized");
    }
    commit(site, changes, &mut report)?;
    Ok(report)
}
