pub mod init;
pub mod list;
pub mod project;
pub mod tag;
pub mod update;
pub mod verify;
pub mod writeup;

use anyhow::Result;
use serde::Serialize;

use crate::folio::Site;
use crate::folio::audit;
use crate::folio::changeset::{ChangeAction, Changeset};

#[derive(Debug, Clone, Serialize)]
pub struct CommandReport {
    pub command: String,
    pub ok: bool,
    pub details: Vec<String>,
    pub issues: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl CommandReport {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ok: true,
            details: Vec::new(),
            issues: Vec::new(),
            data: None,
        }
    }

    pub fn detail(&mut self, text: impl Into<String>) {
        self.details.push(text.into());
    }

    pub fn issue(&mut self, text: impl Into<String>) {
        self.ok = false;
        self.issues.push(text.into());
    }
}

/// Write a command's staged edits, record them in the audit log and list
/// them in the report.
pub fn commit(site: &Site, changes: Changeset, report: &mut CommandReport) -> Result<()> {
    let applied = changes.commit()?;
    audit::record(site, &report.command, &applied);
    if applied.is_empty() {
        report.detail("no files changed");
    }
    for change in &applied {
        let shown = change
            .path
            .strip_prefix(&site.paths.base_dir)
            .unwrap_or(&change.path)
            .display();
        match change.action {
            ChangeAction::Write => report.detail(format!("wrote {shown}")),
            ChangeAction::Delete => report.detail(format!("deleted {shown}")),
        }
    }
    Ok(())
}
