//! Engine configuration from the environment.
//!
//! Every setting has a default, so an empty environment yields a usable
//! config. A missing API key is not an error here; calls made without one
//! report `not_configured` instead.

use crate::error::ConfigError;
use std::collections::HashMap;
use std::env::VarError;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Keys at or below this length are treated as placeholders and ignored.
pub const MIN_API_KEY_LEN: usize = 10;

/// Which provider API to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderKind {
    /// Any OpenAI-compatible chat endpoint. Defaults to Groq.
    #[default]
    OpenAi,
    /// Google Gemini `generateContent`.
    Gemini,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Gemini => "gemini",
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "https://api.groq.com/openai",
            ProviderKind::Gemini => "https://generativelanguage.googleapis.com",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "llama3-8b-8192",
            ProviderKind::Gemini => "gemini-1.5-pro",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "openai" | "groq" => Some(ProviderKind::OpenAi),
            "gemini" | "google" => Some(ProviderKind::Gemini),
            _ => None,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings for an [`Engine`](crate::outreach::Engine).
#[derive(Clone, PartialEq)]
pub struct EngineConfig {
    pub provider: ProviderKind,
    pub api_key: Option<String>,
    /// Provider base URL; the provider default when `None`.
    pub base_url: Option<String>,
    /// Model name; the provider default when `None`.
    pub model: Option<String>,
    pub temperature: f64,
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub timeout: Duration,
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_attempts", &self.max_attempts)
            .field("base_delay", &self.base_delay)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            api_key: None,
            base_url: None,
            model: None,
            temperature: 0.7,
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            timeout: Duration::from_secs(60),
        }
    }
}

impl EngineConfig {
    pub fn new(provider: ProviderKind) -> Self {
        Self {
            provider,
            ..Self::default()
        }
    }

    /// Set the API key. Placeholder-length keys are dropped.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = usable_key(key.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Effective base URL.
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_base_url())
    }

    /// Effective model name.
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    /// Load from `OUTREACH_*` environment variables.
    ///
    /// Calls `dotenvy::dotenv().ok()` first, so a `.env` file in the working
    /// directory (or a parent) fills in anything not already set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnvVar`] when a variable is set but
    /// cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_process_env()
    }

    /// Load from the process environment, falling back to the entries of
    /// the dotenv file at `path`. Process variables win, as with
    /// [`from_env`](Self::from_env). The process environment is not modified.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let env_file_error = |reason: String| ConfigError::EnvFile {
            path: path.display().to_string(),
            reason,
        };

        let mut file_vars = HashMap::new();
        for item in dotenvy::from_path_iter(path).map_err(|e| env_file_error(e.to_string()))? {
            let (key, value) = item.map_err(|e| env_file_error(e.to_string()))?;
            file_vars.insert(key, value);
        }

        Self::from_lookup(|key| {
            std::env::var(key).or_else(|_| file_vars.get(key).cloned().ok_or(VarError::NotPresent))
        })
    }

    /// Load from variables already in the process, without reading `.env`.
    pub fn from_process_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key))
    }

    /// Load using `lookup` in place of the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, VarError>,
    {
        let defaults = Self::default();
        let get = |var: &str| lookup(var).ok().filter(|v| !v.trim().is_empty());

        let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason,
        };

        let provider = match get("OUTREACH_PROVIDER") {
            Some(raw) => ProviderKind::parse(&raw).ok_or_else(|| {
                invalid("OUTREACH_PROVIDER", format!("unknown provider '{raw}'"))
            })?,
            None => defaults.provider,
        };

        let temperature = match get("OUTREACH_TEMPERATURE") {
            Some(raw) => raw
                .trim()
                .parse::<f64>()
                .map_err(|e| invalid("OUTREACH_TEMPERATURE", e.to_string()))?,
            None => defaults.temperature,
        };

        let parse_u64 = |var: &str, default: u64| -> Result<u64, ConfigError> {
            match get(var) {
                Some(raw) => raw
                    .trim()
                    .parse::<u64>()
                    .map_err(|e| invalid(var, e.to_string())),
                None => Ok(default),
            }
        };

        let max_attempts = match get("OUTREACH_MAX_ATTEMPTS") {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(0) => return Err(invalid("OUTREACH_MAX_ATTEMPTS", "must be at least 1".into())),
                Ok(n) => n,
                Err(e) => return Err(invalid("OUTREACH_MAX_ATTEMPTS", e.to_string())),
            },
            None => defaults.max_attempts,
        };

        let base_delay_ms = parse_u64("OUTREACH_BASE_DELAY_MS", defaults.base_delay.as_millis() as u64)?;
        let timeout_secs = parse_u64("OUTREACH_TIMEOUT_SECONDS", defaults.timeout.as_secs())?;

        Ok(Self {
            provider,
            api_key: get("OUTREACH_API_KEY").and_then(usable_key),
            base_url: get("OUTREACH_BASE_URL"),
            model: get("OUTREACH_MODEL"),
            temperature,
            max_attempts,
            base_delay: Duration::from_millis(base_delay_ms),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn usable_key(key: String) -> Option<String> {
    let key = key.trim().to_string();
    (key.len() > MIN_API_KEY_LEN).then_some(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| {
            map.get(key)
                .map(|v| (*v).to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    #[test]
    fn test_empty_env_gives_defaults() {
        let map = HashMap::new();
        let config = EngineConfig::from_lookup(lookup_from_map(&map)).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.model(), "llama3-8b-8192");
        assert_eq!(config.base_url(), "https://api.groq.com/openai");
        assert_eq!(config.api_key, None);
    }

    #[test]
    fn test_full_env() {
        let map = HashMap::from([
            ("OUTREACH_PROVIDER", "Gemini"),
            ("OUTREACH_API_KEY", "AIzaSyTestKey0123456"),
            ("OUTREACH_MODEL", "gemini-1.5-flash"),
            ("OUTREACH_TEMPERATURE", "0.2"),
            ("OUTREACH_MAX_ATTEMPTS", "5"),
            ("OUTREACH_BASE_DELAY_MS", "250"),
            ("OUTREACH_TIMEOUT_SECONDS", "15"),
        ]);
        let config = EngineConfig::from_lookup(lookup_from_map(&map)).unwrap();
        assert_eq!(config.provider, ProviderKind::Gemini);
        assert_eq!(config.api_key.as_deref(), Some("AIzaSyTestKey0123456"));
        assert_eq!(config.model(), "gemini-1.5-flash");
        assert_eq!(config.base_url(), "https://generativelanguage.googleapis.com");
        assert_eq!(config.temperature, 0.2);
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.base_delay, Duration::from_millis(250));
        assert_eq!(config.timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_short_key_is_absent() {
        let map = HashMap::from([("OUTREACH_API_KEY", "sk-short")]);
        let config = EngineConfig::from_lookup(lookup_from_map(&map)).unwrap();
        assert_eq!(config.api_key, None);
        assert_eq!(EngineConfig::default().with_api_key("0123456789").api_key, None);
        assert!(EngineConfig::default().with_api_key("0123456789a").api_key.is_some());
    }

    #[test]
    fn test_invalid_numbers() {
        let map = HashMap::from([("OUTREACH_BASE_DELAY_MS", "soon")]);
        let err = EngineConfig::from_lookup(lookup_from_map(&map)).unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "OUTREACH_BASE_DELAY_MS"),
            "got: {err:?}"
        );

        let map = HashMap::from([("OUTREACH_MAX_ATTEMPTS", "0")]);
        assert!(EngineConfig::from_lookup(lookup_from_map(&map)).is_err());
    }

    #[test]
    fn test_unknown_provider() {
        let map = HashMap::from([("OUTREACH_PROVIDER", "carrier-pigeon")]);
        let err = EngineConfig::from_lookup(lookup_from_map(&map)).unwrap_err();
        assert!(err.to_string().contains("carrier-pigeon"));
    }

    #[test]
    fn test_env_file_fills_unset_vars() {
        let path = std::env::temp_dir().join(format!("outreach-{}.env", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            "# provider settings\nOUTREACH_TEST_ONLY_IGNORED=1\nOUTREACH_BASE_DELAY_MS=321\n",
        )
        .unwrap();
        let config = EngineConfig::from_env_file(&path);
        std::fs::remove_file(&path).ok();
        let config = config.unwrap();
        if std::env::var("OUTREACH_BASE_DELAY_MS").is_err() {
            assert_eq!(config.base_delay, Duration::from_millis(321));
        }
    }

    #[test]
    fn test_missing_env_file_is_error() {
        let path = std::env::temp_dir().join(format!("missing-{}.env", uuid::Uuid::new_v4()));
        let err = EngineConfig::from_env_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::EnvFile { .. }), "got: {err:?}");
    }

    #[test]
    fn test_debug_hides_key() {
        let config = EngineConfig::default().with_api_key("gsk_supersecretvalue");
        assert!(!format!("{config:?}").contains("supersecret"));
    }
}
