use std::collections::BTreeMap;

use crate::error::{FolioError, FolioResult};
use crate::folio::Site;
use crate::folio::changeset::Changeset;
use crate::folio::model::{Tag, Writeup};
use crate::folio::render;
use crate::folio::slug::slugify_as;
use crate::folio::store::ContentStore;
use crate::folio::sync::{Container, Entry, PageSynchronizer};

#[derive(Debug, Clone)]
pub struct EnsuredTag {
    pub tag: Tag,
    pub created: bool,
}

/// Owns the tag collection for one command. Tags staged during the command
/// count as existing, so a tag is never created twice.
pub struct TagManager<'a> {
    site: &'a Site,
    known: BTreeMap<String, Tag>,
}

impl<'a> TagManager<'a> {
    pub fn load(site: &'a Site, store: &ContentStore<'_>) -> FolioResult<Self> {
        let known = store
            .load_tags()?
            .into_iter()
            .map(|tag| (tag.slug.clone(), tag))
            .collect();
        Ok(Self { site, known })
    }

    pub fn tags(&self) -> impl Iterator<Item = &Tag> {
        self.known.values()
    }

    /// Return the tag named `name`, creating its page and index card if it
    /// does not exist yet.
    pub fn ensure_tag(
        &mut self,
        changes: &mut Changeset,
        name: &str,
        description: Option<&str>,
    ) -> FolioResult<EnsuredTag> {
        let slug = slugify_as("tag", name)?;
        if let Some(tag) = self.known.get(&slug) {
            return Ok(EnsuredTag {
                tag: tag.clone(),
                created: false,
            });
        }
        let tag = self.stage_new_tag(changes, slug, name, description)?;
        Ok(EnsuredTag { tag, created: true })
    }

    /// Explicit creation; an existing slug is an error.
    pub fn create_tag(
        &mut self,
        changes: &mut Changeset,
        name: &str,
        description: Option<&str>,
    ) -> FolioResult<Tag> {
        let slug = slugify_as("tag", name)?;
        if self.known.contains_key(&slug) {
            return Err(FolioError::DuplicateTag { slug });
        }
        self.stage_new_tag(changes, slug, name, description)
    }

    /// Delete an unreferenced tag's page and its card on the tag index.
    pub fn remove_tag(
        &mut self,
        changes: &mut Changeset,
        name: &str,
        writeups: &[Writeup],
    ) -> FolioResult<Tag> {
        let slug = slugify_as("tag", name)?;
        let Some(tag) = self.known.get(&slug).cloned() else {
            return Err(FolioError::TagNotFound { slug });
        };
        let users: Vec<&str> = writeups
            .iter()
            .filter(|w| w.has_tag(&slug))
            .map(|w| w.title.as_str())
            .collect();
        if !users.is_empty() {
            return Err(FolioError::TagInUse {
                slug,
                count: users.len(),
                titles: users.join(", "),
            });
        }

        let paths = &self.site.paths;
        PageSynchronizer::new(changes).remove_entry(&paths.tags_page, Container::Tags, &slug)?;
        changes.stage_delete(&paths.tag_file(&slug));
        self.known.remove(&slug);
        Ok(tag)
    }

    fn stage_new_tag(
        &mut self,
        changes: &mut Changeset,
        slug: String,
        name: &str,
        description: Option<&str>,
    ) -> FolioResult<Tag> {
        let tag = Tag {
            slug,
            display_name: name.trim().to_string(),
            description: description
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(ToOwned::to_owned),
        };
        let paths = &self.site.paths;
        PageSynchronizer::new(changes).upsert_entry(
            &paths.tags_page,
            Container::Tags,
            &Entry::tag(&tag),
        )?;
        changes.stage_write(
            &paths.tag_file(&tag.slug),
            render::tag_page(&tag, &self.site.config.site),
        );
        self.known.insert(tag.slug.clone(), tag.clone());
        Ok(tag)
    }
}
