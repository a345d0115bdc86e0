//! Process-wide configuration and the global capture destination.

use crate::core::capture::CaptureAdapter;
use crate::core::telemetry::ExampleSink;
use crate::error::{BlackboxError, ConfigError};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

pub const DEFAULT_API_SERVER: &str = "https://blackbox-backend-u2gu.onrender.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

pub const ENV_PROJECT_KEY: &str = "BLACKBOX_PROJECT_KEY";
pub const ENV_API_SERVER: &str = "BLACKBOX_API_SERVER";
pub const ENV_TIMEOUT_SECS: &str = "BLACKBOX_TIMEOUT_SECS";
pub const ENV_QUEUE_CAPACITY: &str = "BLACKBOX_QUEUE_CAPACITY";

/// Settings for remote delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub project_key: String,
    pub api_server: String,
    pub timeout: Duration,
    pub queue_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_key: String::new(),
            api_server: DEFAULT_API_SERVER.to_string(),
            timeout: DEFAULT_TIMEOUT,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl Config {
    pub fn new(project_key: impl Into<String>) -> Self {
        Self {
            project_key: project_key.into(),
            ..Self::default()
        }
    }

    pub fn with_api_server(mut self, api_server: impl Into<String>) -> Self {
        self.api_server = api_server.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    /// Reads settings from `BLACKBOX_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Config::from_env), reading variables through
    /// `lookup`. Unset variables keep their defaults, except the project
    /// key, which is required.
    pub fn from_lookup<L>(lookup: L) -> Result<Self, ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        config.project_key = lookup(ENV_PROJECT_KEY)
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingProjectKey)?;

        if let Some(server) = lookup(ENV_API_SERVER) {
            config.api_server = server;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs = parse_env::<u64>(ENV_TIMEOUT_SECS, &raw)?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(raw) = lookup(ENV_QUEUE_CAPACITY) {
            config.queue_capacity = parse_env(ENV_QUEUE_CAPACITY, &raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.project_key.trim().is_empty() {
            return Err(ConfigError::MissingProjectKey);
        }
        if self.api_server.trim().is_empty() {
            return Err(ConfigError::MissingApiServer);
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::ZeroQueueCapacity);
        }
        Ok(())
    }

    /// The collection endpoint, `{api_server}/api/v1/examples`.
    pub fn endpoint(&self) -> String {
        format!("{}/api/v1/examples", self.api_server.trim_end_matches('/'))
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        name: name.to_string(),
        value: raw.to_string(),
    })
}

static GLOBAL: OnceLock<CaptureAdapter> = OnceLock::new();

/// Installs the process-wide capture destination. Can be done once.
pub fn init_with_adapter(adapter: CaptureAdapter) -> Result<(), BlackboxError> {
    GLOBAL
        .set(adapter)
        .map_err(|_| BlackboxError::Config(ConfigError::AlreadyInitialized))
}

pub fn init_with_sink(sink: Arc<dyn ExampleSink>) -> Result<(), BlackboxError> {
    init_with_adapter(CaptureAdapter::new(sink))
}

/// Installs an HTTP delivery pipeline built from `config`.
///
/// Captures are queued and sent by a worker on its own thread, so this
/// works with or without an enclosing tokio runtime.
#[cfg(feature = "http")]
pub fn init(config: Config) -> Result<(), BlackboxError> {
    use crate::core::delivery::QueuedSink;
    use crate::http::HttpTransport;

    config.validate()?;
    if is_initialized() {
        return Err(ConfigError::AlreadyInitialized.into());
    }

    let transport = HttpTransport::new(config.clone())?;
    let (sink, worker) = QueuedSink::new(transport, config.queue_capacity);
    worker.spawn_thread()?;
    init_with_sink(Arc::new(sink))?;

    log::info!("Blackbox initialized, sending examples to {}", config.endpoint());
    Ok(())
}

pub fn is_initialized() -> bool {
    GLOBAL.get().is_some()
}

pub(crate) fn global_adapter() -> Result<&'static CaptureAdapter, BlackboxError> {
    GLOBAL.get().ok_or(BlackboxError::NotInitialized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::new("pk_123");
        assert_eq!(config.api_server, DEFAULT_API_SERVER);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.queue_capacity, 1024);
        assert!(config.validate().is_ok());
        assert_eq!(
            config.with_api_server("http://localhost:8000/").endpoint(),
            "http://localhost:8000/api/v1/examples"
        );
    }

    #[test]
    fn test_validation() {
        assert_eq!(
            Config::default().validate(),
            Err(ConfigError::MissingProjectKey)
        );
        assert_eq!(
            Config::new("pk").with_api_server(" ").validate(),
            Err(ConfigError::MissingApiServer)
        );
        assert_eq!(
            Config::new("pk").with_queue_capacity(0).validate(),
            Err(ConfigError::ZeroQueueCapacity)
        );
    }

    #[test]
    fn test_from_lookup() {
        let config = Config::from_lookup(lookup(&[
            (ENV_PROJECT_KEY, "pk_env"),
            (ENV_API_SERVER, "http://collector"),
            (ENV_TIMEOUT_SECS, "12"),
            (ENV_QUEUE_CAPACITY, "16"),
        ]))
        .unwrap();
        assert_eq!(config.project_key, "pk_env");
        assert_eq!(config.api_server, "http://collector");
        assert_eq!(config.timeout, Duration::from_secs(12));
        assert_eq!(config.queue_capacity, 16);

        assert_eq!(
            Config::from_lookup(lookup(&[])),
            Err(ConfigError::MissingProjectKey)
        );
        assert_eq!(
            Config::from_lookup(lookup(&[(ENV_PROJECT_KEY, "pk"), (ENV_TIMEOUT_SECS, "soon")])),
            Err(ConfigError::InvalidEnv {
                name: ENV_TIMEOUT_SECS.to_string(),
                value: "soon".to_string(),
            })
        );
    }
}
