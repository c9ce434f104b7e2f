//! Connection settings
//!
//! A validated connection string together with the provider it targets and the
//! flag that decides whether migrations run at startup.

use super::database_types::DatabaseType;
use super::error::{DatabaseError, Result};
use serde::{Deserialize, Serialize};

/// Connection string key selecting the provider
pub const PROVIDER_KEY: &str = "KormProvider";

/// Connection string key enabling migrations at startup
pub const AUTO_MIGRATE_KEY: &str = "KormAutoMigrate";

/// Environment variable holding the connection string
pub const ENV_CONNECTION_STRING: &str = "KORM_CONNECTION_STRING";

/// Environment variable overriding the provider
pub const ENV_PROVIDER: &str = "KORM_PROVIDER";

/// Environment variable overriding the auto-migrate flag
pub const ENV_AUTO_MIGRATE: &str = "KORM_AUTO_MIGRATE";

/// Validated, immutable connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSettings {
    connection_string: String,
    #[serde(default)]
    provider: DatabaseType,
    #[serde(default)]
    auto_migrate: bool,
}

impl ConnectionSettings {
    /// Create settings from their parts
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` naming `connection_string` when it is empty
    /// or whitespace-only.
    pub fn new(
        connection_string: impl Into<String>,
        provider: DatabaseType,
        auto_migrate: bool,
    ) -> Result<Self> {
        let settings = Self {
            connection_string: connection_string.into(),
            provider,
            auto_migrate,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Parse a `key=value;` connection string carrying the `KormProvider` and
    /// `KormAutoMigrate` keys
    ///
    /// Both keys are stripped from the stored connection string. A string
    /// without any `=` (a bare SQLite path) is kept as it is.
    ///
    /// ```
    /// use korm_bootstrap::{ConnectionSettings, DatabaseType};
    ///
    /// let settings = ConnectionSettings::parse(
    ///     "Data Source=app.db;KormProvider=sqlite;KormAutoMigrate=true",
    /// ).unwrap();
    /// assert_eq!(settings.connection_string(), "Data Source=app.db");
    /// assert_eq!(settings.provider(), DatabaseType::Sqlite);
    /// assert!(settings.auto_migrate());
    /// ```
    pub fn parse(connection_string: &str) -> Result<Self> {
        validate_connection_string(connection_string)?;

        let mut provider = DatabaseType::default();
        let mut auto_migrate = false;
        let mut kept = Vec::new();

        for segment in connection_string.split(';') {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            match segment.split_once('=') {
                Some((key, value)) if key.trim().eq_ignore_ascii_case(PROVIDER_KEY) => {
                    provider = value
                        .parse()
                        .map_err(DatabaseError::invalid_connection_string)?;
                }
                Some((key, value)) if key.trim().eq_ignore_ascii_case(AUTO_MIGRATE_KEY) => {
                    auto_migrate = parse_flag(AUTO_MIGRATE_KEY, value)?;
                }
                _ => kept.push(segment),
            }
        }

        Self::new(kept.join(";"), provider, auto_migrate)
    }

    /// Deserialize settings from JSON
    ///
    /// ```
    /// use korm_bootstrap::ConnectionSettings;
    ///
    /// let settings = ConnectionSettings::from_json(
    ///     r#"{"connectionString": "app.db", "autoMigrate": true}"#,
    /// ).unwrap();
    /// assert!(settings.auto_migrate());
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from `KORM_CONNECTION_STRING`, `KORM_PROVIDER` and
    /// `KORM_AUTO_MIGRATE`
    ///
    /// The connection string is parsed like [`ConnectionSettings::parse`];
    /// the two optional variables take precedence over keys embedded in it.
    pub fn from_env() -> Result<Self> {
        let connection_string = std::env::var(ENV_CONNECTION_STRING).map_err(|_| {
            DatabaseError::configuration(format!("{} is not set", ENV_CONNECTION_STRING))
        })?;
        let mut settings = Self::parse(&connection_string)?;

        if let Ok(provider) = std::env::var(ENV_PROVIDER) {
            settings.provider = provider.parse().map_err(DatabaseError::configuration)?;
        }
        if let Ok(flag) = std::env::var(ENV_AUTO_MIGRATE) {
            settings.auto_migrate = parse_flag(ENV_AUTO_MIGRATE, &flag)?;
        }

        Ok(settings)
    }

    /// Check the connection string invariant
    ///
    /// Settings built through the constructors are always valid; this exists
    /// for values that bypassed them (deserialization, clones of old configs).
    pub fn validate(&self) -> Result<()> {
        validate_connection_string(&self.connection_string)
    }

    /// The connection string with `Korm*` keys removed
    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }

    /// The provider the connection targets
    pub fn provider(&self) -> DatabaseType {
        self.provider
    }

    /// Whether migrations should run at startup
    pub fn auto_migrate(&self) -> bool {
        self.auto_migrate
    }
}

fn validate_connection_string(connection_string: &str) -> Result<()> {
    if connection_string.trim().is_empty() {
        return Err(DatabaseError::invalid_argument(
            "connection_string",
            "must not be empty or whitespace",
        ));
    }
    Ok(())
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(DatabaseError::invalid_connection_string(format!(
            "{} expects a boolean, got '{}'",
            key, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_blank_connection_string() {
        for blank in ["", "   ", "\t\n"] {
            let err = ConnectionSettings::new(blank, DatabaseType::Sqlite, false).unwrap_err();
            assert_eq!(err.param_name(), Some("connection_string"));
        }
    }

    #[test]
    fn test_parse_strips_korm_keys() {
        let settings = ConnectionSettings::parse(
            "Data Source=app.db; kormprovider = Microsoft.Data.Sqlite ;KormAutoMigrate=YES;",
        )
        .unwrap();

        assert_eq!(settings.connection_string(), "Data Source=app.db");
        assert_eq!(settings.provider(), DatabaseType::Sqlite);
        assert!(settings.auto_migrate());
    }

    #[test]
    fn test_parse_defaults() {
        let settings = ConnectionSettings::parse("/var/lib/app/data.db").unwrap();
        assert_eq!(settings.connection_string(), "/var/lib/app/data.db");
        assert_eq!(settings.provider(), DatabaseType::Sqlite);
        assert!(!settings.auto_migrate());
    }

    #[test]
    fn test_parse_only_korm_keys_is_empty() {
        let err = ConnectionSettings::parse("KormAutoMigrate=true").unwrap_err();
        assert_eq!(err.param_name(), Some("connection_string"));
    }

    #[test]
    fn test_parse_invalid_values() {
        let err = ConnectionSettings::parse("Data Source=a.db;KormAutoMigrate=maybe").unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidConnectionString(_)));

        let err = ConnectionSettings::parse("Data Source=a.db;KormProvider=oracle").unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidConnectionString(_)));
    }

    #[test]
    fn test_from_json_validates() {
        let settings = ConnectionSettings::from_json(
            r#"{"connectionString": "app.db", "provider": "postgres", "autoMigrate": true}"#,
        )
        .unwrap();
        assert_eq!(settings.provider(), DatabaseType::Postgres);
        assert!(settings.auto_migrate());

        let settings = ConnectionSettings::from_json(
            r#"{"connectionString": "Host=db", "provider": "Npgsql"}"#,
        )
        .unwrap();
        assert_eq!(settings.provider(), DatabaseType::Postgres);
        let settings = ConnectionSettings::from_json(
            r#"{"connectionString": "Server=db", "provider": "SqlServer"}"#,
        )
        .unwrap();
        assert_eq!(settings.provider(), DatabaseType::SqlServer);

        let err = ConnectionSettings::from_json(r#"{"connectionString": "  "}"#).unwrap_err();
        assert_eq!(err.param_name(), Some("connection_string"));

        let err = ConnectionSettings::from_json("{").unwrap_err();
        assert!(matches!(err, DatabaseError::JsonError(_)));
    }
}
