//! Read projection of the canonical content.
//!
//! There is no index file: tags, writeups and projects are rebuilt from the
//! artifacts themselves on every run.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{FolioError, FolioResult};
use crate::folio::markup::{field_raw, field_text, find_tag_with_attr, start_tags};
use crate::folio::model::{self, MachineInfo, Project, Tag, Writeup};
use crate::folio::paths::{FolioPaths, tag_slug_from_file, writeup_slug_from_file};
use crate::folio::sync::{Container, PageDocument};

pub struct ContentStore<'a> {
    paths: &'a FolioPaths,
}

fn read_artifact(path: &Path) -> FolioResult<String> {
    fs::read_to_string(path).map_err(|err| FolioError::io(path, err))
}

/// `(path, slug)` for every artifact in `dir` whose name `slug_of` accepts,
/// sorted by slug. A missing directory yields nothing.
fn artifact_files(
    dir: &Path,
    slug_of: fn(&Path) -> Option<&str>,
) -> FolioResult<Vec<(PathBuf, String)>> {
    let read_dir = match fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(FolioError::io(dir, err)),
    };
    let mut out = Vec::new();
    for entry in read_dir {
        let path = entry.map_err(|err| FolioError::io(dir, err))?.path();
        if !path.is_file() {
            continue;
        }
        if let Some(slug) = slug_of(&path) {
            let slug = slug.to_string();
            out.push((path, slug));
        }
    }
    out.sort_by(|a, b| a.1.cmp(&b.1));
    Ok(out)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn check_marker_slug(path: &Path, marker_slug: Option<&str>, file_slug: &str) -> FolioResult<()> {
    match marker_slug {
        Some(slug) if slug == file_slug => Ok(()),
        Some(slug) => Err(FolioError::corrupt(
            path,
            format!("data-slug `{slug}` does not match file name slug `{file_slug}`"),
        )),
        None => Err(FolioError::corrupt(path, "marker element has no data-slug")),
    }
}

/// The markdown body as written. The page puts it on its own lines, so one
/// leading newline and the final newline with its indentation are dropped.
fn body_text(raw: &str) -> String {
    let Some(text) = field_raw(raw, "body") else {
        return String::new();
    };
    let body = text.strip_prefix('\n').unwrap_or(&text);
    let body = body.trim_end_matches([' ', '\t']);
    body.strip_suffix('\n').unwrap_or(body).to_string()
}

pub fn parse_writeup(path: &Path, slug: &str, raw: &str) -> FolioResult<Writeup> {
    let Some(marker) = find_tag_with_attr(raw, "data-folio", "writeup") else {
        return Err(FolioError::corrupt(path, "missing data-folio=\"writeup\" marker"));
    };
    check_marker_slug(path, marker.attr("data-slug"), slug)?;

    let required = |field: &str| {
        non_empty(field_text(raw, field))
            .ok_or_else(|| FolioError::corrupt(path, format!("missing `{field}` field")))
    };
    let title = required("title")?;
    let created_date = required("created")?;
    let updated_date = non_empty(field_text(raw, "updated")).unwrap_or_else(|| created_date.clone());

    let mut tags: Vec<String> = Vec::new();
    for tag in start_tags(raw) {
        if let Some(t) = tag.attr("data-tag") {
            if !t.is_empty() && !tags.iter().any(|seen| seen == t) {
                tags.push(t.to_string());
            }
        }
    }
    if tags.is_empty() {
        return Err(FolioError::corrupt(path, "writeup lists no tags"));
    }

    let machine_photo_url = find_tag_with_attr(raw, "data-field", "photo")
        .and_then(|img| img.attr("src").map(ToOwned::to_owned))
        .filter(|src| !src.is_empty());

    Ok(Writeup {
        slug: slug.to_string(),
        title,
        tags,
        created_date,
        updated_date,
        machine_photo_url,
        machine: MachineInfo {
            difficulty: non_empty(field_text(raw, "difficulty")),
            os: non_empty(field_text(raw, "os")),
            ip: non_empty(field_text(raw, "ip")),
        },
        content_body: body_text(raw),
    })
}

pub fn parse_tag(path: &Path, slug: &str, raw: &str) -> FolioResult<Tag> {
    let Some(marker) = find_tag_with_attr(raw, "data-folio", "tag") else {
        return Err(FolioError::corrupt(path, "missing data-folio=\"tag\" marker"));
    };
    check_marker_slug(path, marker.attr("data-slug"), slug)?;
    let display_name = non_empty(field_text(raw, "name"))
        .ok_or_else(|| FolioError::corrupt(path, "missing `name` field"))?;
    Ok(Tag {
        slug: slug.to_string(),
        display_name,
        description: non_empty(field_text(raw, "description")),
    })
}

pub fn parse_projects(path: &Path, raw: &str) -> FolioResult<Vec<Project>> {
    let doc = PageDocument::parse(path, raw, Container::Projects).map_err(|err| match err {
        FolioError::MissingInsertionPoint { reason, .. } => FolioError::corrupt(path, reason),
        other => other,
    })?;

    let mut projects = Vec::new();
    for fragment in doc.fragments() {
        let Some(slug) = fragment.key.as_deref() else {
            continue;
        };
        let corrupt = |what: &str| {
            FolioError::corrupt(path, format!("project `{slug}` is missing its {what}"))
        };
        let title_tag = find_tag_with_attr(&fragment.raw, "data-field", "title")
            .ok_or_else(|| corrupt("title"))?;
        let title = non_empty(field_text(&fragment.raw, "title")).ok_or_else(|| corrupt("title"))?;
        projects.push(Project {
            slug: slug.to_string(),
            title,
            description: field_text(&fragment.raw, "description").unwrap_or_default(),
            url: title_tag.attr("href").unwrap_or_default().to_string(),
            date: field_text(&fragment.raw, "date").unwrap_or_default(),
        });
    }
    Ok(projects)
}

impl<'a> ContentStore<'a> {
    pub fn new(paths: &'a FolioPaths) -> Self {
        Self { paths }
    }

    /// Every tag with a tag page, sorted by slug.
    pub fn load_tags(&self) -> FolioResult<Vec<Tag>> {
        artifact_files(&self.paths.tags_dir, tag_slug_from_file)?
            .into_iter()
            .map(|(path, slug)| parse_tag(&path, &slug, &read_artifact(&path)?))
            .collect()
    }

    /// Every writeup with a writeup page, newest first.
    pub fn load_writeups(&self) -> FolioResult<Vec<Writeup>> {
        let mut writeups = artifact_files(&self.paths.writeups_dir, writeup_slug_from_file)?
            .into_iter()
            .map(|(path, slug)| parse_writeup(&path, &slug, &read_artifact(&path)?))
            .collect::<FolioResult<Vec<_>>>()?;
        model::sort_newest_first(&mut writeups);
        Ok(writeups)
    }

    /// Projects in page order. A site without a projects page has none.
    pub fn load_projects(&self) -> FolioResult<Vec<Project>> {
        let path = &self.paths.projects_page;
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(FolioError::io(path, err)),
        };
        parse_projects(path, &raw)
    }
}
