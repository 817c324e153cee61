use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FolioError {
    #[error("{what} `{input}` has no letters or digits to build a slug from")]
    EmptyTitle { what: &'static str, input: String },
    #[error("tag `{slug}` already exists")]
    DuplicateTag { slug: String },
    #[error("writeup `{title}` collides with existing writeup `{existing}` (slug `{slug}`)")]
    DuplicateWriteup {
        title: String,
        existing: String,
        slug: String,
    },
    #[error("project `{title}` collides with existing project `{existing}`")]
    DuplicateProject { title: String, existing: String },
    #[error("writeup `{title}` not found (looked for slug `{slug}`)")]
    WriteupNotFound { title: String, slug: String },
    #[error("tag `{slug}` not found")]
    TagNotFound { slug: String },
    #[error("tag `{slug}` is still referenced by {count} writeup(s): {titles}")]
    TagInUse {
        slug: String,
        count: usize,
        titles: String,
    },
    #[error("artifact {} is corrupt: {reason}", path.display())]
    CorruptArtifact { path: PathBuf, reason: String },
    #[error("page {} has no `{container}` insertion container: {reason}", path.display())]
    MissingInsertionPoint {
        path: PathBuf,
        container: String,
        reason: String,
    },
    #[error("file I/O failed on {}: {source}", path.display())]
    FileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FolioError {
    pub fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::CorruptArtifact {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn missing_container(
        path: impl Into<PathBuf>,
        container: &str,
        reason: impl Into<String>,
    ) -> Self {
        Self::MissingInsertionPoint {
            path: path.into(),
            container: container.to_string(),
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileIo {
            path: path.into(),
            source,
        }
    }
}

pub type FolioResult<T> = Result<T, FolioError>;
