use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATA_PATH: &str = "data/state.json";
const DEFAULT_USER: &str = "local";
const DEFAULT_WATCH_TIMEOUT_SECS: u64 = 25;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub data_path: PathBuf,
    /// User id for requests without an `x-user-id` header.
    pub default_user: String,
    /// How long `/api/watch` waits for a change before answering `204`.
    pub watch_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = parse_or("PORT", lookup("PORT"), DEFAULT_PORT);
        let data_path = lookup("APP_DATA_PATH")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH));
        let default_user = lookup("APP_DEFAULT_USER")
            .map(|user| user.trim().to_string())
            .filter(|user| !user.is_empty())
            .unwrap_or_else(|| DEFAULT_USER.to_string());
        let watch_timeout = Duration::from_secs(parse_or(
            "APP_WATCH_TIMEOUT_SECS",
            lookup("APP_WATCH_TIMEOUT_SECS"),
            DEFAULT_WATCH_TIMEOUT_SECS,
        ));

        Self {
            port,
            data_path,
            default_user,
            watch_timeout,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn parse_or<T: std::str::FromStr + Copy>(key: &str, value: Option<String>, default: T) -> T {
    match value {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("ignoring invalid {key}={raw:?}");
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_without_variables() {
        let config = config(&[]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.data_path, PathBuf::from("data/state.json"));
        assert_eq!(config.default_user, "local");
        assert_eq!(config.watch_timeout, Duration::from_secs(25));
    }

    #[test]
    fn variables_override_defaults() {
        let config = config(&[
            ("PORT", "9001"),
            ("APP_DATA_PATH", "/tmp/ramadan.json"),
            ("APP_DEFAULT_USER", " guest "),
            ("APP_WATCH_TIMEOUT_SECS", "3"),
        ]);
        assert_eq!(config.port, 9001);
        assert_eq!(config.data_path, PathBuf::from("/tmp/ramadan.json"));
        assert_eq!(config.default_user, "guest");
        assert_eq!(config.watch_timeout, Duration::from_secs(3));
    }

    #[test]
    fn invalid_numbers_fall_back() {
        let config = config(&[("PORT", "eighty"), ("APP_WATCH_TIMEOUT_SECS", "-1")]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.watch_timeout, Duration::from_secs(25));
    }
}
