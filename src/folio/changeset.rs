use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::error::{FolioError, FolioResult};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Staged {
    Write(String),
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Write,
    Delete,
}

#[derive(Debug, Clone, Serialize)]
pub struct AppliedChange {
    pub path: PathBuf,
    pub action: ChangeAction,
    pub before_sha256: Option<String>,
    pub after_sha256: Option<String>,
}

/// Edits staged in memory for one command.
///
/// Reads go through the staged view. Nothing touches disk until
/// [`Changeset::commit`], which applies operations in staging order; callers
/// stage an entity's own artifact last so an interrupted commit can simply
/// be re-run.
#[derive(Debug, Default)]
pub struct Changeset {
    ops: Vec<(PathBuf, Staged)>,
}

fn digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn read_disk(path: &Path) -> FolioResult<Option<String>> {
    match fs::read_to_string(path) {
        Ok(raw) => Ok(Some(raw)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(FolioError::io(path, err)),
    }
}

impl Changeset {
    pub fn read(&self, path: &Path) -> FolioResult<Option<String>> {
        match self.ops.iter().find(|(p, _)| p == path) {
            Some((_, Staged::Write(content))) => Ok(Some(content.clone())),
            Some((_, Staged::Delete)) => Ok(None),
            None => read_disk(path),
        }
    }

    pub fn exists(&self, path: &Path) -> FolioResult<bool> {
        match self.ops.iter().find(|(p, _)| p == path) {
            Some((_, staged)) => Ok(matches!(staged, Staged::Write(_))),
            None => Ok(path.exists()),
        }
    }

    fn stage(&mut self, path: &Path, staged: Staged) {
        match self.ops.iter_mut().find(|(p, _)| p == path) {
            Some((_, slot)) => *slot = staged,
            None => self.ops.push((path.to_path_buf(), staged)),
        }
    }

    pub fn stage_write(&mut self, path: &Path, content: String) {
        self.stage(path, Staged::Write(content));
    }

    pub fn stage_delete(&mut self, path: &Path) {
        self.stage(path, Staged::Delete);
    }

    /// Apply every staged operation. Writes go through a temp file in the
    /// target directory and are renamed into place; unchanged files are
    /// skipped.
    pub fn commit(self) -> FolioResult<Vec<AppliedChange>> {
        let mut applied = Vec::new();
        for (path, staged) in self.ops {
            let before = read_disk(&path)?;
            match staged {
                Staged::Write(content) => {
                    if before.as_deref() == Some(content.as_str()) {
                        continue;
                    }
                    write_atomic(&path, &content)?;
                    applied.push(AppliedChange {
                        action: ChangeAction::Write,
                        before_sha256: before.as_deref().map(|b| digest(b.as_bytes())),
                        after_sha256: Some(digest(content.as_bytes())),
                        path,
                    });
                }
                Staged::Delete => {
                    let Some(before) = before else {
                        continue;
                    };
                    fs::remove_file(&path).map_err(|err| FolioError::io(&path, err))?;
                    applied.push(AppliedChange {
                        action: ChangeAction::Delete,
                        before_sha256: Some(digest(before.as_bytes())),
                        after_sha256: None,
                        path,
                    });
                }
            }
        }
        Ok(applied)
    }
}

fn write_atomic(path: &Path, content: &str) -> FolioResult<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).map_err(|err| FolioError::io(&parent, err))?;
    let mut tmp = NamedTempFile::new_in(&parent).map_err(|err| FolioError::io(&parent, err))?;
    tmp.write_all(content.as_bytes())
        .map_err(|err| FolioError::io(path, err))?;
    tmp.persist(path)
        .map_err(|err| FolioError::io(path, err.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn reads_see_staged_content_first() {
        let tmp = tempdir().expect("tempdir");
        let path = tmp.path().join("a.html");
        fs::write(&path, "disk").expect("write");

        let mut changes = Changeset::default();
        assert_eq!(changes.read(&path).expect("read").as_deref(), Some("disk"));
        changes.stage_write(&path, "staged".to_string());
        assert_eq!(changes.read(&path).expect("read").as_deref(), Some("staged"));
        changes.stage_delete(&path);
        assert_eq!(changes.read(&path).expect("read"), None);
        assert!(!changes.exists(&path).expect("exists"));
        assert_eq!(fs::read_to_string(&path).expect("read"), "disk");
    }

    #[test]
    fn commit_writes_deletes_and_skips_unchanged() {
        let tmp = tempdir().expect("tempdir");
        let same = tmp.path().join("same.html");
        let gone = tmp.path().join("gone.html");
        let fresh = tmp.path().join("nested/fresh.html");
        fs::write(&same, "same").expect("write");
        fs::write(&gone, "bye").expect("write");

        let mut changes = Changeset::default();
        changes.stage_write(&same, "same".to_string());
        changes.stage_delete(&gone);
        changes.stage_write(&fresh, "hello".to_string());
        let applied = changes.commit().expect("commit");

        assert_eq!(applied.len(), 2);
        assert_eq!(applied[0].action, ChangeAction::Delete);
        assert_eq!(applied[1].path, fresh);
        assert!(applied[1].before_sha256.is_none());
        assert!(!gone.exists());
        assert_eq!(fs::read_to_string(&fresh).expect("read"), "hello");
    }

    #[test]
    fn restaging_keeps_first_position() {
        let tmp = tempdir().expect("tempdir");
        let a = tmp.path().join("a.html");
        let b = tmp.path().join("b.html");
        let mut changes = Changeset::default();
        changes.stage_write(&a, "1".to_string());
        changes.stage_write(&b, "2".to_string());
        changes.stage_write(&a, "3".to_string());

        let order: Vec<_> = changes
            .commit()
            .expect("commit")
            .into_iter()
            .map(|c| c.path)
            .collect();
        assert_eq!(order, vec![a.clone(), b]);
        assert_eq!(fs::read_to_string(&a).expect("read"), "3");
    }
}
