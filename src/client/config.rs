use std::env;
use std::path::PathBuf;
use std::time::Duration;

use log::info;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub auth_url: String,
    pub api_url: String,
    pub upload_url: String,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub data_dir: PathBuf,
    pub keyring_fallback: bool,
    pub log_level: String,
}

impl ClientConfig {
    /// Reads `.env` (if any) and the process environment
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like `from_env` but reads the given dotenv file first
    pub fn from_env_file(path: &str) -> Self {
        // values from the named file win over a default .env
        let _ = dotenvy::from_filename(path);
        Self::from_env()
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let secs = |key: &str, default: u64| {
            get(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|v| *v > 0)
                .map(Duration::from_secs)
                .unwrap_or(Duration::from_secs(default))
        };

        Self {
            auth_url: get("BUZZZY_AUTH_URL").unwrap_or_else(|| "http://127.0.0.1:8000/auth".to_string()),
            api_url: get("BUZZZY_API_URL").unwrap_or_else(|| "http://127.0.0.1:8000/api".to_string()),
            upload_url: get("BUZZZY_UPLOAD_URL").unwrap_or_else(|| "http://127.0.0.1:8000/upload".to_string()),
            poll_interval: secs("BUZZZY_POLL_INTERVAL_SECS", 5),
            request_timeout: secs("BUZZZY_REQUEST_TIMEOUT_SECS", 15),
            data_dir: PathBuf::from(get("BUZZZY_DATA_DIR").unwrap_or_else(|| "data".to_string())),
            keyring_fallback: get("KEYRING_FALLBACK").is_some_and(|v| v == "true"),
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        }
    }

    /// Where the session store may write when the OS keyring is unavailable
    pub fn fallback_dir(&self) -> Option<PathBuf> {
        self.keyring_fallback.then(|| self.data_dir.clone())
    }

    pub fn log_summary(&self) {
        info!("Client configuration loaded:");
        info!("  Auth service: {}", self.auth_url);
        info!("  Domain API: {}", self.api_url);
        info!("  Upload service: {}", self.upload_url);
        info!("  Conversation poll interval: {:?}", self.poll_interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> ClientConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ClientConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_point_at_localhost() {
        let cfg = config(&[]);
        assert_eq!(cfg.api_url, "http://127.0.0.1:8000/api");
        assert_eq!(cfg.poll_interval, Duration::from_secs(5));
        assert_eq!(cfg.request_timeout, Duration::from_secs(15));
        assert!(cfg.fallback_dir().is_none());
    }

    #[test]
    fn overrides_and_bad_numbers() {
        let cfg = config(&[
            ("BUZZZY_POLL_INTERVAL_SECS", "2"),
            ("BUZZZY_REQUEST_TIMEOUT_SECS", "soon"),
            ("KEYRING_FALLBACK", "true"),
            ("BUZZZY_DATA_DIR", "/tmp/buzzzy"),
        ]);
        assert_eq!(cfg.poll_interval, Duration::from_secs(2));
        assert_eq!(cfg.request_timeout, Duration::from_secs(15));
        assert_eq!(cfg.fallback_dir(), Some(PathBuf::from("/tmp/buzzzy")));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let cfg = config(&[("BUZZZY_POLL_INTERVAL_SECS", "0")]);
        assert_eq!(cfg.poll_interval, Duration::from_secs(5));
    }
}
