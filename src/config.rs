use std::{env, path::PathBuf, time::Duration};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATABASE_PATH: &str = "data/scientia.db";
const DEFAULT_SESSION_IDLE_MINUTES: u64 = 120;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: PathBuf,
    /// Insert the demo users, classes and students into empty tables.
    pub seed_sample_data: bool,
    /// Sessions unused for this long are dropped.
    pub session_idle: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = lookup("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);
        let database_path = lookup("DATABASE_PATH")
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH));
        let seed_sample_data = lookup("SEED_SAMPLE_DATA")
            .map(|value| !matches!(value.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no"))
            .unwrap_or(true);
        let session_idle_minutes = lookup("SESSION_IDLE_MINUTES")
            .and_then(|value| value.trim().parse::<u64>().ok())
            .filter(|minutes| *minutes > 0)
            .unwrap_or(DEFAULT_SESSION_IDLE_MINUTES);

        Self {
            port,
            database_path,
            seed_sample_data,
            session_idle: Duration::from_secs(session_idle_minutes * 60),
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == ":memory:"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config(&[]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.database_path, PathBuf::from("data/scientia.db"));
        assert!(config.seed_sample_data);
        assert_eq!(config.session_idle, Duration::from_secs(120 * 60));
        assert!(!config.is_in_memory());
    }

    #[test]
    fn invalid_port_falls_back() {
        assert_eq!(config(&[("PORT", "not-a-port")]).port, 8080);
        assert_eq!(config(&[("PORT", "9001")]).port, 9001);
    }

    #[test]
    fn seeding_can_be_disabled() {
        assert!(!config(&[("SEED_SAMPLE_DATA", "false")]).seed_sample_data);
        assert!(!config(&[("SEED_SAMPLE_DATA", "0")]).seed_sample_data);
        assert!(config(&[("SEED_SAMPLE_DATA", "yes")]).seed_sample_data);
    }

    #[test]
    fn session_idle_is_read_in_minutes() {
        assert_eq!(
            config(&[("SESSION_IDLE_MINUTES", "15")]).session_idle,
            Duration::from_secs(15 * 60)
        );
        assert_eq!(
            config(&[("SESSION_IDLE_MINUTES", "0")]).session_idle,
            Duration::from_secs(120 * 60)
        );
    }

    #[test]
    fn memory_database_is_detected() {
        assert!(config(&[("DATABASE_PATH", ":memory:")]).is_in_memory());
    }
}
