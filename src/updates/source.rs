//! Sources of the published update list.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{FeedgateError, Result};

/// A published update entry.
///
/// Field names on the wire are capitalized (`ID`, `Date`, `Title`,
/// `Description`) to match what existing clients of the feed expect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Update {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Description")]
    pub description: String,
}

/// Where the update list is read from.
///
/// Only called for requests the rate limiter has admitted.
#[async_trait]
pub trait UpdateSource: Send + Sync {
    /// Fetch the full list of updates.
    async fn fetch_updates(&self) -> Result<Vec<Update>>;
}

/// Reads updates from a JSON array file on every fetch.
///
/// Nothing is cached, so edits to the file show up on the next request.
#[derive(Debug, Clone)]
pub struct FileUpdateSource {
    path: PathBuf,
}

impl FileUpdateSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl UpdateSource for FileUpdateSource {
    async fn fetch_updates(&self) -> Result<Vec<Update>> {
        let contents = tokio::fs::read(&self.path).await.map_err(|e| {
            FeedgateError::Updates(format!("failed to read {}: {}", self.path.display(), e))
        })?;

        let updates: Vec<Update> = serde_json::from_slice(&contents)?;
        debug!(path = %self.path.display(), count = updates.len(), "Loaded updates");
        Ok(updates)
    }
}

/// Serves a fixed, in-memory update list.
#[derive(Debug, Clone, Default)]
pub struct StaticUpdateSource {
    updates: Vec<Update>,
}

impl StaticUpdateSource {
    pub fn new(updates: Vec<Update>) -> Self {
        Self { updates }
    }
}

#[async_trait]
impl UpdateSource for StaticUpdateSource {
    async fn fetch_updates(&self) -> Result<Vec<Update>> {
        Ok(self.updates.clone())
    }
}
