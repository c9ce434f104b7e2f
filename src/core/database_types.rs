//! Database provider identifiers
//!
//! This module defines the database providers a connection can target.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Supported database providers
///
/// Serializes to the lowercase name; deserializes from anything `FromStr`
/// accepts, provider assembly names included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum DatabaseType {
    /// SQLite database
    #[default]
    Sqlite,
    /// PostgreSQL database
    Postgres,
    /// Microsoft SQL Server database
    SqlServer,
}

impl DatabaseType {
    /// Convert database type to string representation
    pub fn to_str(&self) -> &'static str {
        match self {
            DatabaseType::Sqlite => "sqlite",
            DatabaseType::Postgres => "postgres",
            DatabaseType::SqlServer => "sqlserver",
        }
    }
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for DatabaseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" | "sqlite3" | "microsoft.data.sqlite" | "system.data.sqlite" => {
                Ok(DatabaseType::Sqlite)
            }
            "postgres" | "postgresql" | "npgsql" => Ok(DatabaseType::Postgres),
            "sqlserver" | "mssql" | "system.data.sqlclient" | "microsoft.data.sqlclient" => {
                Ok(DatabaseType::SqlServer)
            }
            _ => Err(format!("Invalid database provider: '{}'", s)),
        }
    }
}

impl TryFrom<String> for DatabaseType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_type_to_str() {
        assert_eq!(DatabaseType::Sqlite.to_str(), "sqlite");
        assert_eq!(DatabaseType::Postgres.to_str(), "postgres");
        assert_eq!(DatabaseType::SqlServer.to_str(), "sqlserver");
    }

    #[test]
    fn test_database_type_from_str() {
        assert_eq!(
            "sqlite".parse::<DatabaseType>().ok(),
            Some(DatabaseType::Sqlite)
        );
        assert_eq!(
            "Microsoft.Data.Sqlite".parse::<DatabaseType>().ok(),
            Some(DatabaseType::Sqlite)
        );
        assert_eq!(
            "Npgsql".parse::<DatabaseType>().ok(),
            Some(DatabaseType::Postgres)
        );
        assert_eq!(
            "System.Data.SqlClient".parse::<DatabaseType>().ok(),
            Some(DatabaseType::SqlServer)
        );
        assert_eq!("unknown".parse::<DatabaseType>().ok(), None);
    }

    #[test]
    fn test_default_is_sqlite() {
        assert_eq!(DatabaseType::default(), DatabaseType::Sqlite);
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&DatabaseType::SqlServer).unwrap();
        assert_eq!(json, "\"sqlserver\"");
        let parsed: DatabaseType = serde_json::from_str("\"postgres\"").unwrap();
        assert_eq!(parsed, DatabaseType::Postgres);
    }

    #[test]
    fn test_serde_accepts_provider_names() {
        for (name, expected) in [
            ("\"Npgsql\"", DatabaseType::Postgres),
            ("\"Microsoft.Data.Sqlite\"", DatabaseType::Sqlite),
            ("\"SqlServer\"", DatabaseType::SqlServer),
            ("\"PostgreSQL\"", DatabaseType::Postgres),
        ] {
            let parsed: DatabaseType = serde_json::from_str(name).unwrap();
            assert_eq!(parsed, expected);
        }

        let err = serde_json::from_str::<DatabaseType>("\"oracle\"").unwrap_err();
        assert!(err.to_string().contains("Invalid database provider"));
    }
}
