//! Process settings from environment variables (after `dotenvy::dotenv()` in the binary).

use crate::error::ConfigError;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_WINDOW: u64 = 100;
pub const MAX_WINDOW: u64 = 1000;

#[derive(Clone, Debug)]
pub struct Settings {
    /// `DATABASE_URL`, e.g. `sqlite::memory:` or `sqlite://data.db`.
    pub database_url: String,
    pub bind_addr: String,
    /// Create missing tables for every registered entity at startup.
    pub create_tables: bool,
    /// Rows returned when a request names no window.
    pub default_window: u64,
    /// Upper bound on any window.
    pub max_window: u64,
    pub max_connections: u32,
    pub body_limit: usize,
    /// Schema export overlay; a missing file is not an error.
    pub schema_patch: PathBuf,
    pub entities_path: Option<PathBuf>,
    /// SQL run on every new connection (pragmas, attached databases).
    pub init_script: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            database_url: "sqlite::memory:".into(),
            bind_addr: "127.0.0.1:3333".into(),
            create_tables: true,
            default_window: DEFAULT_WINDOW,
            max_window: MAX_WINDOW,
            max_connections: 5,
            body_limit: 1024 * 1024,
            schema_patch: PathBuf::from("patch.yaml"),
            entities_path: None,
            init_script: None,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut s = Settings::default();
        if let Some(v) = lookup("DATABASE_URL") {
            s.database_url = v;
        }
        if let Some(v) = lookup("BIND_ADDR") {
            s.bind_addr = v;
        }
        if let Some(v) = lookup("CREATE_TABLES") {
            s.create_tables = parse_bool("CREATE_TABLES", &v)?;
        }
        if let Some(v) = lookup("DEFAULT_WINDOW") {
            s.default_window = parse_num("DEFAULT_WINDOW", &v)?;
        }
        if let Some(v) = lookup("MAX_WINDOW") {
            s.max_window = parse_num("MAX_WINDOW", &v)?;
        }
        if let Some(v) = lookup("MAX_CONNECTIONS") {
            s.max_connections = parse_num("MAX_CONNECTIONS", &v)?;
        }
        if let Some(v) = lookup("BODY_LIMIT") {
            s.body_limit = parse_num("BODY_LIMIT", &v)?;
        }
        if let Some(v) = lookup("SCHEMA_PATCH") {
            s.schema_patch = PathBuf::from(v);
        }
        s.entities_path = lookup("ENTITIES_PATH").filter(|v| !v.is_empty()).map(PathBuf::from);
        s.init_script = lookup("SQLITE_INIT_SCRIPT").filter(|v| !v.is_empty()).map(PathBuf::from);

        if s.default_window == 0 || s.max_window == 0 {
            return Err(ConfigError::Settings("window sizes must be positive".into()));
        }
        if s.default_window > s.max_window {
            return Err(ConfigError::Settings(format!(
                "DEFAULT_WINDOW ({}) exceeds MAX_WINDOW ({})",
                s.default_window, s.max_window
            )));
        }
        Ok(s)
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_url.contains(":memory:") || self.database_url.contains("mode=memory")
    }
}

fn parse_num<T: FromStr>(key: &str, v: &str) -> Result<T, ConfigError> {
    v.trim()
        .parse()
        .map_err(|_| ConfigError::Settings(format!("{} must be a non-negative integer, got '{}'", key, v)))
}

fn parse_bool(key: &str, v: &str) -> Result<bool, ConfigError> {
    match v.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Settings(format!("{} must be a boolean, got '{}'", key, v))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Settings::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let s = settings(&[]).unwrap();
        assert_eq!(s.database_url, "sqlite::memory:");
        assert_eq!(s.default_window, 100);
        assert_eq!(s.max_window, 1000);
        assert!(s.create_tables);
        assert!(s.is_in_memory());
        assert!(s.entities_path.is_none());
        assert!(s.init_script.is_none());
    }

    #[test]
    fn overrides_are_parsed() {
        let s = settings(&[
            ("DATABASE_URL", "sqlite://data.db"),
            ("DEFAULT_WINDOW", "1000"),
            ("CREATE_TABLES", "no"),
            ("ENTITIES_PATH", "entities.yaml"),
            ("SQLITE_INIT_SCRIPT", "init.sql"),
        ])
        .unwrap();
        assert_eq!(s.default_window, 1000);
        assert!(!s.create_tables);
        assert!(!s.is_in_memory());
        assert_eq!(s.entities_path, Some(PathBuf::from("entities.yaml")));
        assert_eq!(s.init_script, Some(PathBuf::from("init.sql")));
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(settings(&[("MAX_WINDOW", "lots")]), Err(ConfigError::Settings(_))));
        assert!(matches!(settings(&[("CREATE_TABLES", "maybe")]), Err(ConfigError::Settings(_))));
        assert!(matches!(
            settings(&[("DEFAULT_WINDOW", "500"), ("MAX_WINDOW", "100")]),
            Err(ConfigError::Settings(_))
        ));
    }
}
