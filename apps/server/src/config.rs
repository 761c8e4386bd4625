// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Server configuration loaded from environment variables.

/// Where project records live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// cacache directory, survives restarts
    Disk,
    /// Process memory only
    Memory,
}

impl StoreBackend {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => StoreBackend::Memory,
            _ => StoreBackend::Disk,
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port to listen on.
    pub port: u16,
    pub store_backend: StoreBackend,
    /// Directory for the disk project store.
    pub store_dir: String,
    /// Maximum request body in MB.
    pub max_body_mb: usize,
    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Rayon pool size for batch processing.
    pub worker_threads: usize,
    /// State code for UTM zone inference when a request names none.
    pub default_state: Option<String>,
    /// Allowed CORS origins (comma-separated, or "*" for all).
    pub cors_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()
                .unwrap_or(8080),
            store_backend: StoreBackend::parse(
                &std::env::var("STORE_BACKEND").unwrap_or_else(|_| "disk".into()),
            ),
            store_dir: std::env::var("STORE_DIR").unwrap_or_else(|_| {
                // Docker images get /app/store, local runs ./.store
                if std::path::Path::new("/.dockerenv").exists() {
                    "/app/store".into()
                } else {
                    std::env::current_dir()
                        .ok()
                        .and_then(|dir| dir.join(".store").to_str().map(|s| s.to_string()))
                        .unwrap_or_else(|| "./.store".into())
                }
            }),
            max_body_mb: std::env::var("MAX_BODY_MB")
                .unwrap_or_else(|_| "10".into())
                .parse()
                .unwrap_or(10),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| "60".into())
                .parse()
                .unwrap_or(60),
            worker_threads: std::env::var("WORKER_THREADS")
                .unwrap_or_else(|_| num_cpus::get().to_string())
                .parse()
                .unwrap_or_else(|_| num_cpus::get()),
            default_state: std::env::var("DEFAULT_STATE")
                .ok()
                .map(|s| s.trim().to_ascii_uppercase())
                .filter(|s| !s.is_empty()),
            cors_origins: parse_origins(&std::env::var("CORS_ORIGINS").unwrap_or_else(|_| {
                "http://localhost:3000,http://localhost:5173,http://127.0.0.1:3000,http://127.0.0.1:5173".into()
            })),
        }
    }

    /// In-memory configuration for handler tests.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            port: 0,
            store_backend: StoreBackend::Memory,
            store_dir: String::new(),
            max_body_mb: 1,
            request_timeout_secs: 5,
            worker_threads: 2,
            default_state: None,
            cors_origins: vec!["*".into()],
        }
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|o| o == "*")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_backend_parse() {
        assert_eq!(StoreBackend::parse("memory"), StoreBackend::Memory);
        assert_eq!(StoreBackend::parse(" MEM "), StoreBackend::Memory);
        assert_eq!(StoreBackend::parse("disk"), StoreBackend::Disk);
        assert_eq!(StoreBackend::parse("anything"), StoreBackend::Disk);
    }

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins("http://a, ,http://b,"),
            vec!["http://a".to_string(), "http://b".to_string()]
        );
        assert!(parse_origins("").is_empty());
    }
}
