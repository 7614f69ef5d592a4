//! Storage engine
//!
//! The [`Database`] trait is the newsgroup/article CRUD capability shared by
//! every session. Two backends implement it:
//!
//! - [`MemoryDatabase`]: ordered maps in process memory
//! - [`FilesystemDatabase`]: one directory per newsgroup under a root
//!
//! Both present identical semantics: ids start at 0, are allocated
//! monotonically and are never reused while the store lives; listings are
//! sorted by id; every lookup of a missing newsgroup or article fails with
//! the matching not-found error and leaves the store unchanged.

mod filesystem;
mod memory;
mod types;

pub use filesystem::FilesystemDatabase;
pub use memory::MemoryDatabase;
pub use types::{Article, ArticleContent, ArticleSummary, Newsgroup, StatusCode};

use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::info;

use crate::config::{StorageBackend, StorageConfig};
use crate::types::{ArticleId, NewsgroupId};

/// Failure of one storage operation
///
/// Storage errors are values: sessions translate them into a negative
/// acknowledgement and carry on.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("a newsgroup with that name already exists")]
    AlreadyExists,

    #[error("newsgroup {0} does not exist")]
    NewsgroupNotFound(NewsgroupId),

    #[error("article {article} does not exist in newsgroup {group}")]
    ArticleNotFound {
        group: NewsgroupId,
        article: ArticleId,
    },

    #[error("storage failure: {0}")]
    Failure(String),

    #[error("storage I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Status code reported for this error
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::AlreadyExists => StatusCode::AlreadyExists,
            Self::NewsgroupNotFound(_) => StatusCode::NewsgroupNotFound,
            Self::ArticleNotFound { .. } => StatusCode::ArticleNotFound,
            Self::Failure(_) | Self::Io(_) => StatusCode::Failure,
        }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Newsgroup and article CRUD
///
/// Implementations hold no concurrency guarantees of their own; share them
/// through [`SharedDatabase`].
pub trait Database: Send {
    /// Every live newsgroup, sorted by id. Never fails for the memory backend.
    fn get_newsgroup_list(&mut self) -> StorageResult<Vec<Newsgroup>>;

    /// Create a newsgroup, rejecting an exact (case-sensitive) duplicate name
    fn create_newsgroup(&mut self, name: &str) -> StorageResult<NewsgroupId>;

    /// Delete a newsgroup together with all of its articles
    fn delete_newsgroup(&mut self, group: NewsgroupId) -> StorageResult<()>;

    /// Every live article of a newsgroup, sorted by id
    fn list_articles(&mut self, group: NewsgroupId) -> StorageResult<Vec<Article>>;

    fn create_article(
        &mut self,
        group: NewsgroupId,
        content: ArticleContent,
    ) -> StorageResult<ArticleId>;

    fn delete_article(&mut self, group: NewsgroupId, article: ArticleId) -> StorageResult<()>;

    fn get_article(&mut self, group: NewsgroupId, article: ArticleId) -> StorageResult<Article>;

    /// Remove every newsgroup and reset id allocation
    fn clear(&mut self) -> StorageResult<()>;
}

/// A database shared by every session of a reactor
pub type SharedDatabase = Arc<Mutex<dyn Database>>;

/// Wrap a backend for sharing
pub fn shared<D: Database + 'static>(database: D) -> SharedDatabase {
    Arc::new(Mutex::new(database))
}

/// Lock a shared database, reporting a poisoned lock as a storage failure
pub fn lock(database: &SharedDatabase) -> StorageResult<MutexGuard<'_, dyn Database + 'static>> {
    database
        .lock()
        .map_err(|_| StorageError::Failure("storage lock poisoned".to_string()))
}

/// Open the backend selected by configuration
pub fn open(config: &StorageConfig) -> Result<SharedDatabase> {
    let database = match config.backend {
        StorageBackend::Memory => {
            info!("Using in-memory storage");
            shared(MemoryDatabase::new())
        }
        StorageBackend::Filesystem => {
            info!(root = %config.root, "Using filesystem storage");
            let db = FilesystemDatabase::open(config.root.as_path(), config.dir_mode, config.file_mode)
                .with_context(|| format!("Failed to open storage root {}", config.root))?;
            shared(db)
        }
    };

    if config.clear_on_start {
        info!("Clearing storage on start");
        lock(&database)?.clear().context("Failed to clear storage")?;
    }

    Ok(database)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(StorageError::AlreadyExists.status(), StatusCode::AlreadyExists);
        assert_eq!(
            StorageError::NewsgroupNotFound(NewsgroupId::new(1)).status(),
            StatusCode::NewsgroupNotFound
        );
        assert_eq!(
            StorageError::ArticleNotFound {
                group: NewsgroupId::new(1),
                article: ArticleId::new(2)
            }
            .status(),
            StatusCode::ArticleNotFound
        );
        assert_eq!(
            StorageError::Failure("disk full".into()).status(),
            StatusCode::Failure
        );
        let io = std::io::Error::other("boom");
        assert_eq!(StorageError::from(io).status(), StatusCode::Failure);
    }

    #[test]
    fn test_shared_database_locks() {
        let db = shared(MemoryDatabase::new());
        let id = lock(&db).unwrap().create_newsgroup("comp.lang.rust").unwrap();
        assert_eq!(id, NewsgroupId::new(0));
        assert_eq!(lock(&db).unwrap().get_newsgroup_list().unwrap().len(), 1);
    }

    #[test]
    fn test_open_memory_backend() {
        let config = StorageConfig::default();
        let db = open(&config).unwrap();
        assert!(lock(&db).unwrap().get_newsgroup_list().unwrap().is_empty());
    }

    #[test]
    fn test_open_filesystem_backend_with_clear() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("db");
        let config = StorageConfig {
            backend: StorageBackend::Filesystem,
            root: crate::types::StorageRoot::new(root.display().to_string()).unwrap(),
            ..StorageConfig::default()
        };

        let db = open(&config).unwrap();
        lock(&db).unwrap().create_newsgroup("alt.test").unwrap();
        drop(db);

        let reopened = open(&config).unwrap();
        assert_eq!(lock(&reopened).unwrap().get_newsgroup_list().unwrap().len(), 1);

        let cleared = open(&StorageConfig {
            clear_on_start: true,
            ..config
        })
        .unwrap();
        assert!(lock(&cleared).unwrap().get_newsgroup_list().unwrap().is_empty());
    }
}
