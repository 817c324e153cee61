use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use crate::folio::Site;
use crate::folio::changeset::{AppliedChange, ChangeAction};
use crate::folio::util::now_epoch_secs;
use crate::folio::warn::{self, WarnEvent};

#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent<'a> {
    pub at_epoch_secs: u64,
    pub command: &'a str,
    pub action: ChangeAction,
    pub path: &'a PathBuf,
    pub before_sha256: Option<&'a str>,
    pub after_sha256: Option<&'a str>,
}

pub fn append_changes(site: &Site, command: &str, changes: &[AppliedChange]) -> Result<()> {
    if !site.config.audit.enabled || changes.is_empty() {
        return Ok(());
    }
    let logs_dir = &site.paths.logs_dir;
    fs::create_dir_all(logs_dir)
        .with_context(|| format!("failed to create {}", logs_dir.display()))?;

    let at_epoch_secs = now_epoch_secs()?;
    let mut lines = String::new();
    for change in changes {
        let event = AuditEvent {
            at_epoch_secs,
            command,
            action: change.action,
            path: &change.path,
            before_sha256: change.before_sha256.as_deref(),
            after_sha256: change.after_sha256.as_deref(),
        };
        lines.push_str(&serde_json::to_string(&event)?);
        lines.push('\n');
    }

    let path = logs_dir.join("audit.log");
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    file.write_all(lines.as_bytes())?;
    Ok(())
}

/// The content is already committed by the time this runs, so a failed
/// append only warns.
pub fn record(site: &Site, command: &str, changes: &[AppliedChange]) {
    if let Err(err) = append_changes(site, command, changes) {
        warn::emit(WarnEvent {
            code: "AUDIT_APPEND_FAILED",
            stage: command,
            action: "append-audit",
            subject: &site.paths.logs_dir.display().to_string(),
            reason: &format!("{err:#}"),
        });
    }
}
