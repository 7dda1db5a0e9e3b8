//! Configuration, layered: code-level setters over environment variables.

use std::time::Duration;

/// Default debounce interval for coalesced broadcast publishes.
pub const DEFAULT_COALESCE_INTERVAL: Duration = Duration::from_millis(250);

/// Default wait before an unanswered confirmation counts as a denial.
pub const DEFAULT_CONFIRM_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Default cap on function-call loop iterations within one run.
pub const DEFAULT_MAX_TURNS: usize = 20;

/// Settings for the orchestrator and its collaborators.
#[derive(Debug, Clone)]
pub struct ParleyConfig {
    /// API key for the model provider.
    pub api_key: Option<String>,
    /// Model name sent with every chat-completion request.
    pub model: String,
    /// Provider base URL override.
    pub base_url: Option<String>,
    /// Broadcast room URL (the party endpoint messages are POSTed to).
    pub party_url: Option<String>,
    /// Debounce interval between broadcast publishes.
    pub coalesce_interval: Duration,
    /// How long a confirmation gate waits before treating silence as denial.
    pub confirm_timeout: Duration,
    /// Cap on function-call loop iterations within one run.
    pub max_turns: usize,
}

impl Default for ParleyConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gpt-4o".to_string(),
            base_url: None,
            party_url: None,
            coalesce_interval: DEFAULT_COALESCE_INTERVAL,
            confirm_timeout: DEFAULT_CONFIRM_TIMEOUT,
            max_turns: DEFAULT_MAX_TURNS,
        }
    }
}

impl ParleyConfig {
    /// Load from environment variables (`.env` honored when present).
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let mut config = Self::default();

        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            config.api_key = Some(key);
        }
        if let Ok(model) = std::env::var("OPENAI_MODEL_NAME") {
            config.model = model;
        }
        if let Ok(url) = std::env::var("OPENAI_BASE_URL") {
            config.base_url = Some(url);
        }
        if let Ok(url) = std::env::var("PARTY_BROADCAST_URL") {
            config.party_url = Some(url);
        }
        if let Some(ms) = env_millis("PARLEY_COALESCE_INTERVAL_MS") {
            config.coalesce_interval = ms;
        }
        if let Some(ms) = env_millis("PARLEY_CONFIRM_TIMEOUT_MS") {
            config.confirm_timeout = ms;
        }

        config
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_party_url(mut self, url: impl Into<String>) -> Self {
        self.party_url = Some(url.into());
        self
    }

    pub fn with_coalesce_interval(mut self, interval: Duration) -> Self {
        self.coalesce_interval = interval;
        self
    }

    pub fn with_confirm_timeout(mut self, timeout: Duration) -> Self {
        self.confirm_timeout = timeout;
        self
    }
}

fn env_millis(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|raw| raw.parse::<u64>().ok())
        .map(Duration::from_millis)
}
