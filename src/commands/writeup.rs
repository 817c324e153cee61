use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::commands::{CommandReport, commit};
use crate::folio::Site;
use crate::folio::changeset::Changeset;
use crate::folio::model::MachineInfo;
use crate::folio::writeups::{WriteupManager, WriteupRequest};

#[derive(Debug, Clone, Default)]
pub struct WriteupOptions {
    pub title: String,
    pub tags: Vec<String>,
    pub machine_photo: Option<String>,
    pub created_date: Option<String>,
    pub updated_date: Option<String>,
    pub difficulty: Option<String>,
    pub os: Option<String>,
    pub ip: Option<String>,
    pub content: Option<PathBuf>,
}

/// Drop blank lines around a markdown body but keep the first line's
/// indentation, which markdown reads as a code block.
fn trim_body(body: &str) -> String {
    let Some(first) = body.find(|c: char| !c.is_whitespace()) else {
        return String::new();
    };
    let start = body[..first].rfind('\n').map_or(0, |i| i + 1);
    body[start..].trim_end().to_string()
}

impl WriteupOptions {
    fn into_request(self) -> Result<WriteupRequest> {
        let content_body = match &self.content {
            Some(path) => Some(
                fs::read_to_string(path)
                    .with_context(|| format!("failed to read content file {}", path.display()))?,
            ),
            None => None,
        };
        Ok(WriteupRequest {
            title: self.title,
            tags: self.tags,
            created_date: self.created_date,
            updated_date: self.updated_date,
            machine_photo_url: self.machine_photo,
            machine: MachineInfo {
                difficulty: self.difficulty,
                os: self.os,
                ip: self.ip,
            },
            content_body: content_body.map(|body| trim_body(&body)),
        })
    }
}

pub fn run(site: &Site, opts: WriteupOptions) -> Result<CommandReport> {
    let mut report = CommandReport::new("writeup");
    let request = opts.into_request()?;

    let mut changes = Changeset::default();
    let outcome = WriteupManager::new(site).add_writeup(&mut changes, &request)?;
    let w = &outcome.writeup;
    report.detail(format!(
        "created writeup `{}` [{}] dated {}",
        w.title, w.slug, w.created_date
    ));
    for slug in &outcome.created_tags {
        report.detail(format!("created tag `{slug}`"));
    }
    if !outcome.on_home_page {
        report.detail("older than the home page window; not shown on index.html");
    }
    commit(site, changes, &mut report)?;
    Ok(report)
}

pub fn run_remove(site: &Site, title: &str) -> Result<CommandReport> {
    let mut report = CommandReport::new("remove");

    let mut changes = Changeset::default();
    let removed = WriteupManager::new(site).remove_writeup(&mut changes, title)?;
    report.detail(format!("removed writeup `{}` [{}]", removed.title, removed.slug));
    commit(site, changes, &mut report)?;
    Ok(report)
}
