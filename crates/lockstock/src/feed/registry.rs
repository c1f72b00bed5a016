//! Persisted registry of social sources

use crate::error::{Result, StockError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Category of a registered source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Reddit,
    TwitterUsers,
    TwitterLists,
}

impl SourceKind {
    /// All kinds in feed fan-out order
    pub const ALL: [SourceKind; 3] = [Self::Reddit, Self::TwitterUsers, Self::TwitterLists];

    /// Registry key of this kind
    pub fn key(self) -> &'static str {
        match self {
            Self::Reddit => "reddit",
            Self::TwitterUsers => "twitter_users",
            Self::TwitterLists => "twitter_lists",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for SourceKind {
    type Err = StockError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.key() == s)
            .ok_or_else(|| StockError::Other(format!("Unknown source kind: {s}")))
    }
}

/// Subreddits, X usernames and X list ids to poll, each in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRegistry {
    #[serde(default)]
    pub reddit: Vec<String>,
    #[serde(default)]
    pub twitter_users: Vec<String>,
    #[serde(default)]
    pub twitter_lists: Vec<String>,
}

impl SourceRegistry {
    pub fn list(&self, kind: SourceKind) -> &[String] {
        match kind {
            SourceKind::Reddit => &self.reddit,
            SourceKind::TwitterUsers => &self.twitter_users,
            SourceKind::TwitterLists => &self.twitter_lists,
        }
    }

    pub(crate) fn list_mut(&mut self, kind: SourceKind) -> &mut Vec<String> {
        match kind {
            SourceKind::Reddit => &mut self.reddit,
            SourceKind::TwitterUsers => &mut self.twitter_users,
            SourceKind::TwitterLists => &mut self.twitter_lists,
        }
    }

    pub fn contains(&self, kind: SourceKind, id: &str) -> bool {
        self.list(kind).iter().any(|existing| existing == id)
    }

    /// Number of registered sources across all kinds
    pub fn len(&self) -> usize {
        SourceKind::ALL.iter().map(|k| self.list(*k).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// JSON file holding a [`SourceRegistry`].
///
/// The file is read once and rewritten wholesale on every save. There is no
/// locking: when several processes share a file the last writer wins.
#[derive(Debug, Clone)]
pub struct SourceStore {
    path: PathBuf,
}

impl SourceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the registry; a missing file yields an empty registry
    pub fn load(&self) -> Result<SourceRegistry> {
        if !self.path.exists() {
            debug!("No source registry at {}, starting empty", self.path.display());
            return Ok(SourceRegistry::default());
        }

        let raw = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Overwrite the file with `registry` as 4-space indented JSON
    pub fn save(&self, registry: &SourceRegistry) -> Result<()> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        registry.serialize(&mut serializer)?;

        std::fs::write(&self.path, buf)?;
        debug!("Saved {} sources to {}", registry.len(), self.path.display());
        Ok(())
    }
}
