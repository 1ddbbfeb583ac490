//! Configuration for providers, request timeouts and health polling

use std::time::Duration;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::prompt::PromptStyle;

pub const DEFAULT_OPENAI_BASE: &str = "https://api.openai.com";
pub const DEFAULT_ANTHROPIC_BASE: &str = "https://api.anthropic.com";
pub const DEFAULT_GOOGLE_BASE: &str
  = "https://generativelanguage.googleapis.com";
pub const DEFAULT_OLLAMA_BASE: &str = "http://localhost:11434";
pub const DEFAULT_LMSTUDIO_BASE: &str = "http://localhost:1234";

/// Per-backend connection settings
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderConfig
{   /// API base URL, without a trailing path
    pub base_url: String
  , /// Credential, if the backend needs one
    #[serde(default)]
    pub api_key: Option<String>
}

impl ProviderConfig
{   pub fn new(base_url: impl Into<String>) -> Self
    {   ProviderConfig
        {   base_url: base_url.into()
          , api_key: None
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self
    {   self.api_key = Some(key.into());
        self
    }

    /// Join a path onto the base URL
    pub fn endpoint(&self, path: &str) -> String
    {   format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

// Keys stay out of logs.
impl std::fmt::Debug for ProviderConfig
{   fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {   f.debug_struct("ProviderConfig")
          .field("base_url", &self.base_url)
          .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
          .finish()
    }
}

/// Health polling configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthConfig
{   /// Seconds between scheduled probes
    pub poll_interval_secs: u64
  , /// Bound on a single probe, in milliseconds
    pub probe_timeout_ms: u64
}

impl HealthConfig
{   pub fn poll_interval(&self) -> Duration
    {   Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn probe_timeout(&self) -> Duration
    {   Duration::from_millis(self.probe_timeout_ms)
    }
}

impl Default for HealthConfig
{   fn default() -> Self
    {   HealthConfig
        {   poll_interval_secs: 30
          , probe_timeout_ms: 5_000
        }
    }
}

/// Gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GatewayConfig
{   pub openai: ProviderConfig
  , pub anthropic: ProviderConfig
  , pub google: ProviderConfig
  , /// Also the server the health monitor probes
    pub ollama: ProviderConfig
  , pub lmstudio: ProviderConfig
  , /// Bound on one generation call, in milliseconds
    pub request_timeout_ms: u64
  , /// How the raw-generate adapter wants its prompt rendered
    pub ollama_prompt_style: PromptStyle
  , pub health: HealthConfig
}

impl Default for GatewayConfig
{   fn default() -> Self
    {   GatewayConfig
        {   openai: ProviderConfig::new(DEFAULT_OPENAI_BASE)
          , anthropic: ProviderConfig::new(DEFAULT_ANTHROPIC_BASE)
          , google: ProviderConfig::new(DEFAULT_GOOGLE_BASE)
          , ollama: ProviderConfig::new(DEFAULT_OLLAMA_BASE)
          , lmstudio: ProviderConfig::new(DEFAULT_LMSTUDIO_BASE)
          , request_timeout_ms: 60_000
          , ollama_prompt_style: PromptStyle::Flat
          , health: HealthConfig::default()
        }
    }
}

impl GatewayConfig
{   pub fn request_timeout(&self) -> Duration
    {   Duration::from_millis(self.request_timeout_ms)
    }

    /// Build a configuration from process environment variables,
    /// falling back to defaults for anything unset.
    pub fn from_env() -> Result<Self, crate::error::Error>
    {   Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as `from_env` over an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, crate::error::Error>
    where
      F: Fn(&str) -> Option<String>
    {   let mut config = GatewayConfig::default();
        let get = |name: &str| {
          lookup(name).filter(|value| !value.trim().is_empty())
        };

        let providers = [
          (&mut config.openai, "OPENAI")
        , (&mut config.anthropic, "ANTHROPIC")
        , (&mut config.google, "GOOGLE")
        , (&mut config.ollama, "OLLAMA")
        , (&mut config.lmstudio, "LMSTUDIO")
        ];
        for (provider, prefix) in providers
        {   if let Some(base) = get(format!("{}_BASE_URL", prefix).as_str())
            {   provider.base_url = base;
            }
            if let Some(key) = get(format!("{}_API_KEY", prefix).as_str())
            {   provider.api_key = Some(key);
            }
        }

        if let Some(raw) = get("PROMPTGATE_REQUEST_TIMEOUT_MS")
        {   config.request_timeout_ms
              = parse_number("PROMPTGATE_REQUEST_TIMEOUT_MS", &raw)?;
        }
        if let Some(raw) = get("PROMPTGATE_HEALTH_INTERVAL_SECS")
        {   config.health.poll_interval_secs
              = parse_number("PROMPTGATE_HEALTH_INTERVAL_SECS", &raw)?;
        }
        if let Some(raw) = get("PROMPTGATE_OLLAMA_PROMPT_STYLE")
        {   config.ollama_prompt_style = raw.parse()?;
        }

        debug!("Loaded gateway config: {:?}", config);
        Ok(config)
    }
}

fn parse_number(name: &str, raw: &str)
  -> Result<u64, crate::error::Error>
{   raw.trim().parse().map_err(|_| {
      crate::error::Error::InvalidConfiguration(
        format!("{} must be a whole number, got {:?}", name, raw)
      )
    })
}
