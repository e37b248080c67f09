//! Directory-backed account storage.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};

use super::model::{Account, AccountId};
use crate::{Error, Result};

/// An account id together with the file that holds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountTarget {
    id: AccountId,
    path: PathBuf,
}

impl AccountTarget {
    /// Account id.
    #[must_use]
    pub const fn id(&self) -> &AccountId {
        &self.id
    }

    /// Path of the account file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Account storage over a directory, one JSON file per account.
///
/// Nothing is cached: every call goes to the filesystem, and there is no
/// locking between concurrent callers.
#[derive(Debug, Clone)]
pub struct AccountStore {
    dir: PathBuf,
}

impl AccountStore {
    /// Create a store over `dir`. The directory is not touched until the
    /// first operation.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// List the ids of every entry in the store directory, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreUnavailable`] if the directory cannot be read.
    pub async fn list(&self) -> Result<Vec<AccountId>> {
        let mut entries = fs::read_dir(&self.dir)
            .await
            .map_err(|source| self.unavailable(source))?;

        let mut ids = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|source| self.unavailable(source))?
        {
            match entry.file_name().into_string() {
                Ok(name) => ids.push(AccountId::new(name)),
                Err(name) => warn!(?name, "Skipping store entry with a non UTF-8 name"),
            }
        }
        ids.sort();

        Ok(ids)
    }

    /// Map an id to its file. Does not check that the file exists.
    #[must_use]
    pub fn resolve(&self, id: AccountId) -> AccountTarget {
        let path = self.dir.join(id.as_str());
        AccountTarget { id, path }
    }

    /// Open an account file for streaming.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotReadable`] if the file cannot be opened.
    pub async fn open(&self, target: &AccountTarget) -> Result<fs::File> {
        fs::File::open(&target.path)
            .await
            .map_err(|source| Error::NotReadable {
                id: target.id.clone(),
                source,
            })
    }

    /// Read an account file fully and parse it as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotReadable`] on I/O failure and [`Error::Malformed`]
    /// if the contents are not JSON.
    pub async fn read(&self, target: &AccountTarget) -> Result<serde_json::Value> {
        let contents = fs::read(&target.path)
            .await
            .map_err(|source| Error::NotReadable {
                id: target.id.clone(),
                source,
            })?;

        serde_json::from_slice(&contents).map_err(|source| Error::Malformed {
            id: target.id.clone(),
            source,
        })
    }

    /// Create or fully overwrite an account file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotWritable`] if the file cannot be written.
    pub async fn write(&self, target: &AccountTarget, contents: &[u8]) -> Result<()> {
        fs::write(&target.path, contents)
            .await
            .map_err(|source| Error::NotWritable {
                id: target.id.clone(),
                source,
            })?;

        debug!(id = %target.id, bytes = contents.len(), "Wrote account");
        Ok(())
    }

    /// Serialize an account and store it under its id.
    ///
    /// An existing file with the same id is overwritten.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub async fn create(&self, account: &Account) -> Result<AccountTarget> {
        let contents = serde_json::to_vec(account)?;
        let target = self.resolve(account.id.clone());
        self.write(&target, &contents).await?;
        Ok(target)
    }

    /// Remove an account file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AccountNotFound`] if the file is already gone and
    /// [`Error::NotWritable`] for any other failure.
    pub async fn delete(&self, target: &AccountTarget) -> Result<()> {
        match fs::remove_file(&target.path).await {
            Ok(()) => {
                debug!(id = %target.id, "Deleted account");
                Ok(())
            }
            Err(source) if source.kind() == io::ErrorKind::NotFound => {
                Err(Error::AccountNotFound(target.id.clone()))
            }
            Err(source) => Err(Error::NotWritable {
                id: target.id.clone(),
                source,
            }),
        }
    }

    /// Delete every given account concurrently.
    ///
    /// One task is spawned per id and all of them are awaited, so the report
    /// holds the outcome of every deletion, in the order the ids were given.
    /// Deletions that succeeded are not undone when others fail.
    pub async fn purge(&self, ids: &[AccountId]) -> PurgeReport {
        let tasks: Vec<_> = ids
            .iter()
            .map(|id| {
                let path = self.dir.join(id.as_str());
                (id.clone(), tokio::spawn(fs::remove_file(path)))
            })
            .collect();

        let mut report = PurgeReport::default();
        for (id, task) in tasks {
            let outcome = task
                .await
                .unwrap_or_else(|join_error| Err(io::Error::other(join_error)));
            match outcome {
                Ok(()) => report.deleted.push(id),
                Err(source) => report.failed.push(PurgeFailure { id, source }),
            }
        }

        debug!(
            deleted = report.deleted.len(),
            failed = report.failed.len(),
            "Purged accounts"
        );
        report
    }

    fn unavailable(&self, source: io::Error) -> Error {
        Error::StoreUnavailable {
            dir: self.dir.clone(),
            source,
        }
    }
}

/// A deletion that failed during [`AccountStore::purge`].
#[derive(Debug)]
pub struct PurgeFailure {
    /// Account that could not be deleted.
    pub id: AccountId,
    /// Why.
    pub source: io::Error,
}

/// Outcome of every deletion in a purge.
#[derive(Debug, Default)]
pub struct PurgeReport {
    /// Accounts that were deleted.
    pub deleted: Vec<AccountId>,
    /// Accounts that could not be deleted.
    pub failed: Vec<PurgeFailure>,
}

impl PurgeReport {
    /// Number of deletions attempted.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.deleted.len() + self.failed.len()
    }

    /// Strict reading of the report: any failure fails the whole purge.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PurgeIncomplete`] naming the first failure.
    pub fn into_result(self) -> Result<Vec<AccountId>> {
        let total = self.total();
        let failed = self.failed.len();
        match self.failed.into_iter().next() {
            None => Ok(self.deleted),
            Some(first) => Err(Error::PurgeIncomplete {
                id: first.id,
                failed,
                total,
                source: first.source,
            }),
        }
    }
}
