use anyhow::Result;

use crate::commands::CommandReport;
use crate::folio::Site;
use crate::folio::resync;

pub fn run(site: &Site) -> Result<CommandReport> {
    let mut report = CommandReport::new("verify");
    let issues = resync::verify(site)?;
    if issues.is_empty() {
        report.detail("all pages in sync");
    }
    for issue in issues {
        report.issue(issue);
    }
    Ok(report)
}
