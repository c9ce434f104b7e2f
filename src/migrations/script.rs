//! Migration script identity
//!
//! Scripts are named `<id>_<name>.sql`, where `<id>` is a positive integer
//! that orders the scripts (a timestamp such as `20240115001` works well).

/// File extension of migration scripts
pub const SCRIPT_EXTENSION: &str = "sql";

/// Identity of one migration script
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScriptInfo {
    id: i64,
    name: String,
    key: String,
}

impl ScriptInfo {
    /// Parse a script file name
    ///
    /// Returns `None` for names that do not follow `<id>_<name>.sql`; such
    /// files are not migrations and are skipped by the providers.
    ///
    /// ```
    /// use korm_bootstrap::migrations::ScriptInfo;
    ///
    /// let info = ScriptInfo::from_file_name("20240115001_CreatePeople.sql").unwrap();
    /// assert_eq!(info.id(), 20240115001);
    /// assert_eq!(info.name(), "CreatePeople");
    /// assert!(ScriptInfo::from_file_name("README.md").is_none());
    /// ```
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let (stem, extension) = file_name.rsplit_once('.')?;
        if !extension.eq_ignore_ascii_case(SCRIPT_EXTENSION) {
            return None;
        }

        let (id, name) = stem.split_once('_')?;
        if id.is_empty() || name.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        Some(Self {
            id: id.parse().ok()?,
            name: name.to_string(),
            key: file_name.to_string(),
        })
    }

    /// Ordering id
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Human readable name, without the id and extension
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Provider-specific key used to load the script body
    pub fn key(&self) -> &str {
        &self.key
    }
}
