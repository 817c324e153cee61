use crate::error::{FolioError, FolioResult};
use crate::folio::Site;
use crate::folio::changeset::Changeset;
use crate::folio::model::Project;
use crate::folio::slug::slugify_as;
use crate::folio::store::parse_projects;
use crate::folio::sync::{Container, Entry, PageSynchronizer};

#[derive(Debug, Clone, Default)]
pub struct ProjectRequest {
    pub title: String,
    pub description: String,
    pub url: String,
    pub date: Option<String>,
}

pub struct ProjectManager<'a> {
    site: &'a Site,
}

impl<'a> ProjectManager<'a> {
    pub fn new(site: &'a Site) -> Self {
        Self { site }
    }

    /// Append a project card to the projects page. Projects are keyed by
    /// title; a title that slugs onto an existing card is a duplicate too.
    pub fn add_project(
        &self,
        changes: &mut Changeset,
        request: &ProjectRequest,
    ) -> FolioResult<Project> {
        let title = request.title.trim().to_string();
        let slug = slugify_as("project title", &title)?;
        let page = &self.site.paths.projects_page;

        let existing = match changes.read(page)? {
            Some(raw) => parse_projects(page, &raw)?,
            None => Vec::new(),
        };
        if let Some(other) = existing
            .iter()
            .find(|p| p.slug == slug || p.title.eq_ignore_ascii_case(&title))
        {
            return Err(FolioError::DuplicateProject {
                title,
                existing: other.title.clone(),
            });
        }

        let project = Project {
            slug,
            title,
            description: request.description.trim().to_string(),
            url: request.url.trim().to_string(),
            date: match request.date.as_deref().map(str::trim) {
                Some(date) if !date.is_empty() => date.to_string(),
                _ => self.site.config.today(),
            },
        };
        PageSynchronizer::new(changes).upsert_entry(
            page,
            Container::Projects,
            &Entry::project(&project),
        )?;
        Ok(project)
    }
}
