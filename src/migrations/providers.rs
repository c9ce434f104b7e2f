//! Sources of migration scripts

use super::script::ScriptInfo;
use crate::core::error::{DatabaseError, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A source of migration scripts
#[async_trait]
pub trait ScriptsProvider: Send + Sync {
    /// List the scripts the provider holds
    async fn scripts(&self) -> Result<Vec<ScriptInfo>>;

    /// Load the SQL body of one of this provider's scripts
    async fn load(&self, script: &ScriptInfo) -> Result<String>;

    /// Short description used in logs and errors
    fn source(&self) -> String;
}

/// Scripts stored as `*.sql` files in one directory
///
/// A missing directory holds no scripts.
#[derive(Debug, Clone)]
pub struct DirectoryScriptsProvider {
    directory: PathBuf,
}

impl DirectoryScriptsProvider {
    /// Read scripts from `directory`
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Directory the scripts are read from
    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

#[async_trait]
impl ScriptsProvider for DirectoryScriptsProvider {
    async fn scripts(&self) -> Result<Vec<ScriptInfo>> {
        let mut entries = match tokio::fs::read_dir(&self.directory).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(directory = %self.directory.display(), "scripts directory does not exist");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut scripts = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            if let Some(info) = file_name.to_str().and_then(ScriptInfo::from_file_name) {
                scripts.push(info);
            }
        }
        Ok(scripts)
    }

    async fn load(&self, script: &ScriptInfo) -> Result<String> {
        Ok(tokio::fs::read_to_string(self.directory.join(script.key())).await?)
    }

    fn source(&self) -> String {
        format!("directory:{}", self.directory.display())
    }
}

/// Scripts compiled into the binary
///
/// ```
/// use korm_bootstrap::migrations::EmbeddedScriptsProvider;
///
/// let provider = EmbeddedScriptsProvider::new("app")
///     .with_script("001_CreatePeople.sql", "CREATE TABLE People (Id INTEGER PRIMARY KEY);");
/// ```
///
/// With real files the bodies usually come from `include_str!`.
#[derive(Debug, Clone)]
pub struct EmbeddedScriptsProvider {
    name: String,
    scripts: BTreeMap<String, String>,
}

impl EmbeddedScriptsProvider {
    /// Create an empty provider labelled `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scripts: BTreeMap::new(),
        }
    }

    /// Add a script under its file name
    pub fn with_script(mut self, file_name: impl Into<String>, body: impl Into<String>) -> Self {
        self.scripts.insert(file_name.into(), body.into());
        self
    }

    /// Number of files added, including ones not named like scripts
    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    /// Check if no file was added
    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}

#[async_trait]
impl ScriptsProvider for EmbeddedScriptsProvider {
    async fn scripts(&self) -> Result<Vec<ScriptInfo>> {
        Ok(self
            .scripts
            .keys()
            .filter_map(|file_name| ScriptInfo::from_file_name(file_name))
            .collect())
    }

    async fn load(&self, script: &ScriptInfo) -> Result<String> {
        self.scripts.get(script.key()).cloned().ok_or_else(|| {
            DatabaseError::migration(format!(
                "Script '{}' is not part of {}",
                script.key(),
                self.source()
            ))
        })
    }

    fn source(&self) -> String {
        format!("embedded:{}", self.name)
    }
}
