use anyhow::Result;
use serde_json::json;

use crate::commands::CommandReport;
use crate::error::FolioResult;
use crate::folio::Site;
use crate::folio::store::ContentStore;
use crate::folio::warn::{self, WarnEvent};

/// A collection that failed to load is listed as empty and noted; `list`
/// itself never fails on a broken artifact.
fn loaded<T>(
    what: &str,
    result: FolioResult<Vec<T>>,
    report: &mut CommandReport,
    skipped: &mut Vec<String>,
) -> Vec<T> {
    match result {
        Ok(items) => items,
        Err(err) => {
            let reason = err.to_string();
            warn::emit(WarnEvent {
                code: "LIST_SKIPPED",
                stage: "list",
                action: "skip-collection",
                subject: what,
                reason: &reason,
            });
            report.detail(format!("{what}: not listed, {reason}"));
            skipped.push(format!("{what}: {reason}"));
            Vec::new()
        }
    }
}

pub fn run(site: &Site) -> Result<CommandReport> {
    let mut report = CommandReport::new("list");
    let store = ContentStore::new(&site.paths);
    let mut skipped = Vec::new();
    let tags = loaded("tags", store.load_tags(), &mut report, &mut skipped);
    let writeups = loaded("writeups", store.load_writeups(), &mut report, &mut skipped);
    let projects = loaded("projects", store.load_projects(), &mut report, &mut skipped);

    report.detail(format!("tags ({}):", tags.len()));
    for tag in &tags {
        match tag.description.as_deref() {
            Some(desc) => report.detail(format!("  {} - {desc}", tag.slug)),
            None => report.detail(format!("  {}", tag.slug)),
        }
    }
    report.detail(format!("writeups ({}):", writeups.len()));
    for w in &writeups {
        report.detail(format!(
            "  {} [{}] created {} tags: {}",
            w.title,
            w.slug,
            w.created_date,
            w.tags.join(", ")
        ));
    }
    report.detail(format!("projects ({}):", projects.len()));
    for p in &projects {
        report.detail(format!("  {} - {} ({})", p.title, p.url, p.date));
    }

    report.data = Some(json!({
        "tags": tags,
        "writeups": writeups,
        "projects": projects,
        "skipped": skipped,
    }));
    Ok(report)
}
