//! Database migrations
//!
//! Scripts come from one or more [`ScriptsProvider`]s collected in
//! [`MigrationOptions`]; a [`MigrationsRunner`] applies the ones not yet
//! recorded in the `__KormMigrationsHistory` table.
//!
//! # Example
//!
//! ```rust,no_run
//! use korm_bootstrap::migrations::{EmbeddedScriptsProvider, MigrationOptions};
//!
//! let mut options = MigrationOptions::new();
//! options
//!     .add_file_scripts_provider("db/scripts")
//!     .add_embedded_scripts_provider(
//!         EmbeddedScriptsProvider::new("core")
//!             .with_script("001_CreatePeople.sql", "CREATE TABLE People (Id INTEGER PRIMARY KEY);"),
//!     );
//! ```

pub mod options;
pub mod providers;
pub mod runner;
pub mod script;

pub use options::{
    setup_migration_options, MigrationOptions, MigrationOptionsSetup, DEFAULT_SCRIPTS_DIR,
    DEFAULT_SCRIPT_TIMEOUT,
};
pub use providers::{DirectoryScriptsProvider, EmbeddedScriptsProvider, ScriptsProvider};
pub use runner::{DatabaseMigrationsRunner, MigrationsRunner, MIGRATIONS_HISTORY_TABLE};
pub use script::ScriptInfo;
