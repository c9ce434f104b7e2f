//! Migration options and their default setup

use super::providers::{DirectoryScriptsProvider, EmbeddedScriptsProvider, ScriptsProvider};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Directory scripts are read from when no setup callback is given
pub const DEFAULT_SCRIPTS_DIR: &str = "SqlScripts";

/// Longest time a single script may run
pub const DEFAULT_SCRIPT_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Callback customizing migration options
pub type MigrationOptionsSetup = Arc<dyn Fn(&mut MigrationOptions) + Send + Sync>;

/// Options a migrations runner is built from
#[derive(Clone)]
pub struct MigrationOptions {
    providers: Vec<Arc<dyn ScriptsProvider>>,
    timeout: Duration,
}

impl MigrationOptions {
    /// Options without providers
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            timeout: DEFAULT_SCRIPT_TIMEOUT,
        }
    }

    /// Add a script source
    pub fn add_scripts_provider(&mut self, provider: Arc<dyn ScriptsProvider>) -> &mut Self {
        self.providers.push(provider);
        self
    }

    /// Add the `*.sql` files of a directory
    pub fn add_file_scripts_provider(&mut self, directory: impl Into<PathBuf>) -> &mut Self {
        self.add_scripts_provider(Arc::new(DirectoryScriptsProvider::new(directory)))
    }

    /// Add scripts compiled into the binary
    pub fn add_embedded_scripts_provider(&mut self, provider: EmbeddedScriptsProvider) -> &mut Self {
        self.add_scripts_provider(Arc::new(provider))
    }

    /// Limit how long a single script may run
    pub fn set_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.timeout = timeout;
        self
    }

    /// Registered script sources, in registration order
    pub fn providers(&self) -> &[Arc<dyn ScriptsProvider>] {
        &self.providers
    }

    /// Per-script timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MigrationOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sources: Vec<_> = self.providers.iter().map(|p| p.source()).collect();
        f.debug_struct("MigrationOptions")
            .field("providers", &sources)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Build the options a runner is constructed with
///
/// With a callback, the callback alone decides the providers. Without one, a
/// single directory provider for `default_scripts_dir` is added.
pub fn setup_migration_options(
    setup: Option<&(dyn Fn(&mut MigrationOptions) + Send + Sync)>,
    default_scripts_dir: &Path,
) -> MigrationOptions {
    let mut options = MigrationOptions::new();
    match setup {
        Some(setup) => setup(&mut options),
        None => {
            options.add_file_scripts_provider(default_scripts_dir);
        }
    }
    options
}
