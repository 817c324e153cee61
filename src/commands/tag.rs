use anyhow::Result;

use crate::commands::{CommandReport, commit};
use crate::folio::Site;
use crate::folio::changeset::Changeset;
use crate::folio::store::ContentStore;
use crate::folio::tags::TagManager;

#[derive(Debug, Clone, Default)]
pub struct TagOptions {
    pub name: String,
    pub description: Option<String>,
}

pub fn run(site: &Site, opts: &TagOptions) -> Result<CommandReport> {
    let mut report = CommandReport::new("tag");
    let store = ContentStore::new(&site.paths);
    let mut tags = TagManager::load(site, &store)?;

    let mut changes = Changeset::default();
    let tag = tags.create_tag(&mut changes, &opts.name, opts.description.as_deref())?;
    report.detail(format!("created tag `{}` ({})", tag.slug, tag.display_name));
    commit(site, changes, &mut report)?;
    Ok(report)
}

pub fn run_remove(site: &Site, name: &str) -> Result<CommandReport> {
    let mut report = CommandReport::new("remove-tag");
    let store = ContentStore::new(&site.paths);
    let writeups = store.load_writeups()?;
    let mut tags = TagManager::load(site, &store)?;

    let mut changes = Changeset::default();
    let tag = tags.remove_tag(&mut changes, name, &writeups)?;
    report.detail(format!("removed tag `{}`", tag.slug));
    commit(site, changes, &mut report)?;
    Ok(report)
}
