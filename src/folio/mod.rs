pub mod audit;
pub mod changeset;
pub mod config;
pub mod dates;
pub mod markup;
pub mod model;
pub mod paths;
pub mod projects;
pub mod render;
pub mod resync;
pub mod slug;
pub mod store;
pub mod sync;
pub mod tags;
pub mod util;
pub mod warn;
pub mod writeups;

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{FolioError, FolioResult};
use changeset::Changeset;
use config::{FolioConfig, load_config};
use paths::{FolioPaths, resolve_paths};

/// A portfolio checkout: where its artifacts live and how to render them.
#[derive(Debug, Clone)]
pub struct Site {
    pub paths: FolioPaths,
    pub config: FolioConfig,
}

impl Site {
    pub fn open(base_dir: Option<&Path>) -> Result<Self> {
        let paths = resolve_paths(base_dir)?;
        let config = load_config(&paths)?;
        Ok(Self { paths, config })
    }

    /// Create the artifact directories and stage every index page that is
    /// missing. Existing pages are left alone. Returns the staged pages.
    pub fn scaffold(&self, changes: &mut Changeset) -> FolioResult<Vec<PathBuf>> {
        for dir in [&self.paths.writeups_dir, &self.paths.tags_dir] {
            fs::create_dir_all(dir).map_err(|err| FolioError::io(dir, err))?;
        }
        let site = &self.config.site;
        let pages = [
            (&self.paths.home_page, render::home_page(site)),
            (&self.paths.listing_page, render::listing_page(site)),
            (&self.paths.projects_page, render::projects_page(site)),
            (&self.paths.tags_page, render::tags_page(site)),
        ];
        let mut staged = Vec::new();
        for (path, content) in pages {
            if changes.exists(path)? {
                continue;
            }
            changes.stage_write(path, content);
            staged.push(path.clone());
        }
        Ok(staged)
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use tempfile::{TempDir, tempdir};

    /// Default configuration over `base_dir`, ignoring the environment.
    pub fn site_at(base_dir: &Path) -> Site {
        Site {
            paths: FolioPaths::under(base_dir),
            config: FolioConfig::default(),
        }
    }

    /// A freshly initialized site in a scratch directory.
    pub fn scaffolded_site() -> (TempDir, Site) {
        let tmp = tempdir().expect("tempdir");
        let site = site_at(tmp.path());
        let mut changes = Changeset::default();
        site.scaffold(&mut changes).expect("scaffold");
        changes.commit().expect("commit");
        (tmp, site)
    }
}
