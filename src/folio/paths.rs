use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

pub const HOME_PAGE: &str = "index.html";
pub const LISTING_PAGE: &str = "writeups.html";
pub const PROJECTS_PAGE: &str = "projects.html";
pub const TAGS_PAGE: &str = "tags.html";

const WRITEUP_PREFIX: &str = "writeup-";
const TAG_PREFIX: &str = "tag-";
const HTML_EXT: &str = ".html";

#[derive(Debug, Clone)]
pub struct FolioPaths {
    pub base_dir: PathBuf,
    pub writeups_dir: PathBuf,
    pub tags_dir: PathBuf,
    pub home_page: PathBuf,
    pub listing_page: PathBuf,
    pub projects_page: PathBuf,
    pub tags_page: PathBuf,
    pub logs_dir: PathBuf,
}

impl FolioPaths {
    pub fn under(base_dir: &Path) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
            writeups_dir: base_dir.join("writeups"),
            tags_dir: base_dir.join("tags"),
            home_page: base_dir.join(HOME_PAGE),
            listing_page: base_dir.join(LISTING_PAGE),
            projects_page: base_dir.join(PROJECTS_PAGE),
            tags_page: base_dir.join(TAGS_PAGE),
            logs_dir: base_dir.join(".folio").join("logs"),
        }
    }

    pub fn writeup_file(&self, slug: &str) -> PathBuf {
        self.writeups_dir.join(writeup_file_name(slug))
    }

    pub fn tag_file(&self, slug: &str) -> PathBuf {
        self.tags_dir.join(tag_file_name(slug))
    }
}

pub fn writeup_file_name(slug: &str) -> String {
    format!("{WRITEUP_PREFIX}{slug}{HTML_EXT}")
}

pub fn tag_file_name(slug: &str) -> String {
    format!("{TAG_PREFIX}{slug}{HTML_EXT}")
}

/// Slug encoded in a `writeup-<slug>.html` file name.
pub fn writeup_slug_from_file(path: &Path) -> Option<&str> {
    slug_from_file(path, WRITEUP_PREFIX)
}

/// Slug encoded in a `tag-<slug>.html` file name.
pub fn tag_slug_from_file(path: &Path) -> Option<&str> {
    slug_from_file(path, TAG_PREFIX)
}

fn slug_from_file<'a>(path: &'a Path, prefix: &str) -> Option<&'a str> {
    let name = path.file_name()?.to_str()?;
    let slug = name.strip_prefix(prefix)?.strip_suffix(HTML_EXT)?;
    if slug.is_empty() { None } else { Some(slug) }
}

fn env_or_default_path(var: &str, fallback: PathBuf) -> PathBuf {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => fallback,
    }
}

/// Resolve the site layout: explicit `--base-dir`, then `FOLIO_BASE_DIR`,
/// then the working directory.
pub fn resolve_paths(base_dir: Option<&Path>) -> Result<FolioPaths> {
    let base_dir = match base_dir {
        Some(dir) => dir.to_path_buf(),
        None => {
            let cwd = env::current_dir().context("failed to resolve working directory")?;
            env_or_default_path("FOLIO_BASE_DIR", cwd)
        }
    };
    let mut paths = FolioPaths::under(&base_dir);
    paths.logs_dir = env_or_default_path("FOLIO_LOGS_DIR", paths.logs_dir);
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_names_are_prefixed_by_kind() {
        let paths = FolioPaths::under(Path::new("/site"));
        assert_eq!(
            paths.writeup_file("haze"),
            PathBuf::from("/site/writeups/writeup-haze.html")
        );
        assert_eq!(paths.tag_file("htb"), PathBuf::from("/site/tags/tag-htb.html"));
    }

    #[test]
    fn slugs_are_recovered_from_file_names() {
        assert_eq!(
            writeup_slug_from_file(Path::new("/x/writeup-haze-box.html")),
            Some("haze-box")
        );
        assert_eq!(tag_slug_from_file(Path::new("tag-web.html")), Some("web"));
        assert_eq!(tag_slug_from_file(Path::new("tag-.html")), None);
        assert_eq!(writeup_slug_from_file(Path::new("tag-web.html")), None);
        assert_eq!(writeup_slug_from_file(Path::new("writeup-x.htm")), None);
    }
}
