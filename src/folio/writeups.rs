use crate::error::{FolioError, FolioResult};
use crate::folio::Site;
use crate::folio::changeset::Changeset;
use crate::folio::model::{self, MachineInfo, TagNames, Writeup};
use crate::folio::render::{self, CardStyle};
use crate::folio::slug::slugify;
use crate::folio::store::ContentStore;
use crate::folio::sync::{Container, Entry, PageSynchronizer, recent_entries};
use crate::folio::tags::TagManager;
use crate::folio::warn::{self, WarnEvent};

#[derive(Debug, Clone, Default)]
pub struct WriteupRequest {
    pub title: String,
    pub tags: Vec<String>,
    pub created_date: Option<String>,
    pub updated_date: Option<String>,
    pub machine_photo_url: Option<String>,
    pub machine: MachineInfo,
    pub content_body: Option<String>,
}

#[derive(Debug, Clone)]
pub struct WriteupOutcome {
    pub writeup: Writeup,
    pub created_tags: Vec<String>,
    pub on_home_page: bool,
}

pub struct WriteupManager<'a> {
    site: &'a Site,
    store: ContentStore<'a>,
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToOwned::to_owned)
}

impl<'a> WriteupManager<'a> {
    pub fn new(site: &'a Site) -> Self {
        Self {
            site,
            store: ContentStore::new(&site.paths),
        }
    }

    /// Stage a new writeup: its tags (created on demand), its card on the
    /// listing, home and tag pages, and finally its own page.
    pub fn add_writeup(
        &self,
        changes: &mut Changeset,
        request: &WriteupRequest,
    ) -> FolioResult<WriteupOutcome> {
        let title = request.title.trim().to_string();
        let slug = slugify(&title)?;
        let mut writeups = self.store.load_writeups()?;
        if let Some(existing) = writeups.iter().find(|w| w.slug == slug) {
            return Err(FolioError::DuplicateWriteup {
                title,
                existing: existing.title.clone(),
                slug,
            });
        }
        if request.tags.iter().all(|t| t.trim().is_empty()) {
            return Err(FolioError::EmptyTitle {
                what: "tag list",
                input: request.tags.join(","),
            });
        }

        let mut tags = TagManager::load(self.site, &self.store)?;
        let mut tag_slugs: Vec<String> = Vec::new();
        let mut created_tags = Vec::new();
        for name in request.tags.iter().filter(|t| !t.trim().is_empty()) {
            let ensured = tags.ensure_tag(changes, name, None)?;
            if ensured.created {
                warn::emit(WarnEvent {
                    code: "TAG_AUTO_CREATED",
                    stage: "writeup",
                    action: "ensure-tag",
                    subject: &ensured.tag.slug,
                    reason: "referenced-tag-did-not-exist",
                });
                created_tags.push(ensured.tag.slug.clone());
            }
            if !tag_slugs.contains(&ensured.tag.slug) {
                tag_slugs.push(ensured.tag.slug);
            }
        }

        let created_date = match trimmed(request.created_date.as_deref()) {
            Some(date) => date,
            None => self.site.config.today(),
        };
        let updated_date =
            trimmed(request.updated_date.as_deref()).unwrap_or_else(|| created_date.clone());
        let writeup = Writeup {
            slug,
            title,
            tags: tag_slugs,
            created_date,
            updated_date,
            machine_photo_url: trimmed(request.machine_photo_url.as_deref()),
            machine: MachineInfo {
                difficulty: trimmed(request.machine.difficulty.as_deref()),
                os: trimmed(request.machine.os.as_deref()),
                ip: trimmed(request.machine.ip.as_deref()),
            },
            content_body: request
                .content_body
                .clone()
                .unwrap_or_else(|| render::STARTER_BODY.to_string()),
        };

        writeups.push(writeup.clone());
        model::sort_newest_first(&mut writeups);
        let names: TagNames = tags.tags().collect();
        let site_cfg = &self.site.config.site;
        let paths = &self.site.paths;
        let mut sync = PageSynchronizer::new(changes);

        sync.upsert_entry(
            &paths.listing_page,
            Container::Writeups,
            &Entry::writeup(&writeup, CardStyle::Listing, site_cfg, &names),
        )?;
        let tag_entry = Entry::writeup(&writeup, CardStyle::TagPage, site_cfg, &names);
        for tag in &writeup.tags {
            sync.upsert_entry(&paths.tag_file(tag), Container::Writeups, &tag_entry)?;
        }
        let limit = self.site.config.sync.recent_limit;
        let recent = recent_entries(&writeups, limit, site_cfg, &names);
        sync.reconcile(&paths.home_page, Container::Recent, &recent)?;
        let own = recent.iter().find(|e| e.key == writeup.slug);
        let on_home_page = own.is_some();
        if let Some(entry) = own {
            sync.upsert_entry(&paths.home_page, Container::Recent, entry)?;
        }

        changes.stage_write(
            &paths.writeup_file(&writeup.slug),
            render::writeup_page(&writeup, site_cfg, &names),
        );
        Ok(WriteupOutcome {
            writeup,
            created_tags,
            on_home_page,
        })
    }

    /// Stage removal of the writeup titled `title` from every page that can
    /// list it, then the deletion of its own page. Its tags stay.
    pub fn remove_writeup(&self, changes: &mut Changeset, title: &str) -> FolioResult<Writeup> {
        let slug = slugify(title)?;
        let mut writeups = self.store.load_writeups()?;
        let Some(idx) = writeups.iter().position(|w| w.slug == slug) else {
            return Err(FolioError::WriteupNotFound {
                title: title.to_string(),
                slug,
            });
        };
        let writeup = writeups.remove(idx);

        let site_cfg = &self.site.config.site;
        let paths = &self.site.paths;
        let mut sync = PageSynchronizer::new(changes);
        sync.remove_entry(&paths.listing_page, Container::Writeups, &writeup.slug)?;
        for tag in &writeup.tags {
            let tag_page = paths.tag_file(tag);
            if !sync.exists(&tag_page)? {
                warn::emit(WarnEvent {
                    code: "TAG_PAGE_MISSING",
                    stage: "remove",
                    action: "skip-tag-page",
                    subject: tag,
                    reason: "referenced-tag-has-no-page",
                });
                continue;
            }
            sync.remove_entry(&tag_page, Container::Writeups, &writeup.slug)?;
        }
        let names: TagNames = self.store.load_tags()?.iter().collect();
        let limit = self.site.config.sync.recent_limit;
        let recent = recent_entries(&writeups, limit, site_cfg, &names);
        sync.reconcile(&paths.home_page, Container::Recent, &recent)?;

        changes.stage_delete(&paths.writeup_file(&writeup.slug));
        Ok(writeup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::folio::sync::PageDocument;
    use crate::folio::testing::scaffolded_site;
    use std::fs;

    fn request(title: &str, tags: &[&str], created: &str) -> WriteupRequest {
        WriteupRequest {
            title: title.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            created_date: Some(created.to_string()),
            ..Default::default()
        }
    }

    fn add(site: &Site, req: &WriteupRequest) -> FolioResult<WriteupOutcome> {
        let mut changes = Changeset::default();
        let outcome = WriteupManager::new(site).add_writeup(&mut changes, req)?;
        changes.commit()?;
        Ok(outcome)
    }

    fn remove(site: &Site, title: &str) -> FolioResult<Writeup> {
        let mut changes = Changeset::default();
        let removed = WriteupManager::new(site).remove_writeup(&mut changes, title)?;
        changes.commit()?;
        Ok(removed)
    }

    fn keys(page: &std::path::Path, container: Container) -> Vec<String> {
        let raw = fs::read_to_string(page).expect("read page");
        PageDocument::parse(page, &raw, container)
            .expect("parse")
            .keys()
            .into_iter()
            .map(ToOwned::to_owned)
            .collect()
    }

    #[test]
    fn add_fans_out_to_four_pages() {
        let (_tmp, site) = scaffolded_site();
        add(&site, &request("Haze", &["htb"], "Jan 1, 2024")).expect("seed");

        let outcome = add(&site, &request("X", &["htb", "Windows"], "Jan 1, 2025")).expect("add");
        assert_eq!(outcome.created_tags, vec!["windows"]);
        assert!(outcome.on_home_page);

        let p = &site.paths;
        assert_eq!(keys(&p.listing_page, Container::Writeups), vec!["x", "haze"]);
        assert_eq!(keys(&p.home_page, Container::Recent), vec!["x", "haze"]);
        assert_eq!(keys(&p.tag_file("htb"), Container::Writeups), vec!["x", "haze"]);
        assert_eq!(keys(&p.tag_file("windows"), Container::Writeups), vec!["x"]);
        assert_eq!(keys(&p.tags_page, Container::Tags), vec!["htb", "windows"]);
        assert!(p.writeup_file("x").exists());
    }

    #[test]
    fn duplicate_and_colliding_titles_are_rejected_without_writes() {
        let (_tmp, site) = scaffolded_site();
        add(&site, &request("Haze", &["htb"], "Jan 1, 2024")).expect("seed");
        let listing_before = fs::read_to_string(&site.paths.listing_page).expect("read");

        let err = add(&site, &request("HAZE!", &["new-tag"], "Jan 1, 2025")).unwrap_err();
        assert!(matches!(err, FolioError::DuplicateWriteup { .. }));
        assert_eq!(fs::read_to_string(&site.paths.listing_page).expect("read"), listing_before);
        assert!(!site.paths.tag_file("new-tag").exists());
    }

    #[test]
    fn home_page_keeps_a_bounded_window() {
        let (_tmp, mut site) = scaffolded_site();
        site.config.sync.recent_limit = 2;
        add(&site, &request("A", &["t"], "Jan 1, 2021")).expect("a");
        add(&site, &request("B", &["t"], "Jan 1, 2022")).expect("b");
        let home_before = fs::read_to_string(&site.paths.home_page).expect("read");

        let outcome = add(&site, &request("C", &["t"], "Jan 1, 2023")).expect("c");
        assert!(outcome.on_home_page);
        assert_eq!(keys(&site.paths.home_page, Container::Recent), vec!["c", "b"]);

        let old = add(&site, &request("Old", &["t"], "Jan 1, 2000")).expect("old");
        assert!(!old.on_home_page);

        remove(&site, "Old").expect("remove old");
        remove(&site, "C").expect("remove c");
        assert_eq!(fs::read_to_string(&site.paths.home_page).expect("read"), home_before);
    }

    #[test]
    fn add_then_remove_restores_every_page() {
        let (_tmp, site) = scaffolded_site();
        add(&site, &request("Haze", &["htb", "windows"], "Jan 1, 2024")).expect("seed");
        let p = &site.paths;
        let pages = [
            p.home_page.clone(),
            p.listing_page.clone(),
            p.tag_file("htb"),
            p.tag_file("windows"),
            p.tags_page.clone(),
            p.projects_page.clone(),
        ];
        let before: Vec<String> = pages
            .iter()
            .map(|page| fs::read_to_string(page).expect("read"))
            .collect();

        add(&site, &request("Nocturnal", &["htb", "windows"], "Jan 1, 2025")).expect("add");
        let removed = remove(&site, "Nocturnal").expect("remove");
        assert_eq!(removed.slug, "nocturnal");

        for (page, want) in pages.iter().zip(before) {
            assert_eq!(fs::read_to_string(page).expect("read"), want, "{}", page.display());
        }
        assert!(!p.writeup_file("nocturnal").exists());
    }

    #[test]
    fn other_home_cards_keep_their_bytes() {
        let (_tmp, site) = scaffolded_site();
        add(&site, &request("Haze", &["htb"], "Jan 1, 2024")).expect("seed");
        let home = &site.paths.home_page;
        let raw = fs::read_to_string(home).expect("read");
        let edited = raw.replace(
            "writeup-card\" data-slug=\"haze\"",
            "writeup-card featured\" data-slug=\"haze\"",
        );
        assert_ne!(edited, raw);
        fs::write(home, &edited).expect("hand edit");

        add(&site, &request("X", &["htb"], "Jan 1, 2025")).expect("add");
        assert_eq!(keys(home, Container::Recent), vec!["x", "haze"]);
        assert!(fs::read_to_string(home).expect("read").contains("featured"));

        remove(&site, "X").expect("remove");
        assert_eq!(fs::read_to_string(home).expect("read"), edited);
    }

    #[test]
    fn rerun_add_after_a_lost_artifact_converges() {
        let (_tmp, site) = scaffolded_site();
        add(&site, &request("Haze", &["htb"], "Jan 1, 2024")).expect("seed");
        add(&site, &request("X", &["htb", "web"], "Jan 1, 2025")).expect("add");
        let p = &site.paths;
        let pages = [
            (p.listing_page.clone(), Container::Writeups),
            (p.home_page.clone(), Container::Recent),
            (p.tag_file("htb"), Container::Writeups),
            (p.tag_file("web"), Container::Writeups),
        ];
        let synced: Vec<String> = pages
            .iter()
            .map(|(page, _)| fs::read_to_string(page).expect("read"))
            .collect();
        fs::remove_file(p.writeup_file("x")).expect("lose artifact");

        let outcome = add(&site, &request("X", &["htb", "web"], "Jan 1, 2025")).expect("rerun");
        assert!(outcome.created_tags.is_empty());
        for ((page, container), want) in pages.iter().zip(synced) {
            let found = keys(page, *container);
            assert_eq!(found.iter().filter(|k| *k == "x").count(), 1, "{}", page.display());
            assert_eq!(fs::read_to_string(page).expect("read"), want, "{}", page.display());
        }
        assert!(p.writeup_file("x").exists());
    }

    #[test]
    fn rerun_remove_after_pages_were_cleared_converges() {
        let (_tmp, site) = scaffolded_site();
        add(&site, &request("Haze", &["htb"], "Jan 1, 2024")).expect("seed");
        let p = &site.paths;
        let before: Vec<String> = [&p.listing_page, &p.home_page, &p.tag_file("htb")]
            .iter()
            .map(|page| fs::read_to_string(page).expect("read"))
            .collect();

        add(&site, &request("X", &["htb"], "Jan 1, 2025")).expect("add");
        let artifact = fs::read_to_string(p.writeup_file("x")).expect("read artifact");
        remove(&site, "X").expect("remove");
        fs::write(p.writeup_file("x"), artifact).expect("artifact left behind");

        remove(&site, "X").expect("rerun");
        assert!(!p.writeup_file("x").exists());
        let after: Vec<String> = [&p.listing_page, &p.home_page, &p.tag_file("htb")]
            .iter()
            .map(|page| fs::read_to_string(page).expect("read"))
            .collect();
        assert_eq!(after, before);
    }

    #[test]
    fn removing_unknown_writeup_fails() {
        let (_tmp, site) = scaffolded_site();
        let err = remove(&site, "Ghost").unwrap_err();
        assert!(matches!(err, FolioError::WriteupNotFound { .. }));
    }

    #[test]
    fn broken_tag_page_aborts_before_any_write() {
        let (_tmp, site) = scaffolded_site();
        add(&site, &request("Haze", &["htb"], "Jan 1, 2024")).expect("seed");
        let broken = render::tag_page(
            &crate::folio::model::Tag {
                slug: "htb".to_string(),
                display_name: "htb".to_string(),
                description: None,
            },
            &site.config.site,
        )
        .replace(&Container::Writeups.begin_marker(), "");
        fs::write(site.paths.tag_file("htb"), &broken).expect("break tag page");
        let listing_before = fs::read_to_string(&site.paths.listing_page).expect("read");

        let err = add(&site, &request("X", &["htb"], "Jan 1, 2025")).unwrap_err();
        assert!(matches!(err, FolioError::MissingInsertionPoint { .. }));
        assert_eq!(fs::read_to_string(&site.paths.listing_page).expect("read"), listing_before);
        assert!(!site.paths.writeup_file("x").exists());
    }
}
