pub mod error;
pub mod config;
pub mod prompt;
pub mod providers;
pub mod registry;
pub mod request;
pub mod health;
pub mod templates;
pub mod gateway;

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};

pub use error::{Error, ErrorKind};
pub use config::{GatewayConfig, HealthConfig, ProviderConfig};
pub use gateway::Gateway;
pub use health::{HealthMonitor, HealthProbe, HealthSnapshot, HealthStatus};
pub use prompt::{MetaPrompt, PromptStyle};
pub use registry::ProviderRegistry;
pub use request::{GenerationRequest, GenerationResult, Usage};
pub use templates::{PromptTemplate, TemplateLibrary};

// ===== PROMPTGATE STRUCTURES =====

/// What the caller wants the model to do with the input.
/// Rendered into the base line of every compiled system prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptMode
{   Expansion
  , Compression
  , Conversion
  , Seeker
  , Action
  , Reasoning
}

impl PromptMode
{   pub fn as_str(&self) -> &'static str
    {   match self
        {   PromptMode::Expansion => "expansion"
          , PromptMode::Compression => "compression"
          , PromptMode::Conversion => "conversion"
          , PromptMode::Seeker => "seeker"
          , PromptMode::Action => "action"
          , PromptMode::Reasoning => "reasoning"
        }
    }
}

impl fmt::Display for PromptMode
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   f.write_str(self.as_str())
    }
}

/// The fixed set of backends a request can be routed to.
/// Each variant corresponds to exactly one adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind
{
  // ===== CLOUD PROVIDERS =====
  /// OpenAI chat completions
  OpenAi
  ,
  /// Anthropic messages API
  Anthropic
  ,
  /// Google generateContent (single-turn generation)
  Google
  ,
  // ===== SELF-HOSTED/LOCAL =====
  /// Ollama raw `/api/generate`
  Ollama
  ,
  /// LM Studio or any local OpenAI-compatible server
  LmStudio
}

impl ProviderKind
{   pub const ALL: [ProviderKind; 5] = [
      ProviderKind::OpenAi
    , ProviderKind::Anthropic
    , ProviderKind::Google
    , ProviderKind::Ollama
    , ProviderKind::LmStudio
    ];

    /// Canonical identifier used in requests
    pub fn as_str(&self) -> &'static str
    {   match self
        {   ProviderKind::OpenAi => "openai"
          , ProviderKind::Anthropic => "anthropic"
          , ProviderKind::Google => "google"
          , ProviderKind::Ollama => "ollama"
          , ProviderKind::LmStudio => "lmstudio"
        }
    }

    /// Descriptive identifier, accepted as an alias of `as_str`
    pub fn descriptive_id(&self) -> &'static str
    {   match self
        {   ProviderKind::OpenAi => "openai-compatible-cloud-chat"
          , ProviderKind::Anthropic => "anthropic-style-cloud-chat"
          , ProviderKind::Google => "google-style-cloud-generation"
          , ProviderKind::Ollama => "local-raw-generate"
          , ProviderKind::LmStudio => "local-openai-compatible"
        }
    }

    pub fn is_local(&self) -> bool
    {   matches!(self, ProviderKind::Ollama | ProviderKind::LmStudio)
    }
}

impl fmt::Display for ProviderKind
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind
{   type Err = Error;

    fn from_str(id: &str) -> Result<Self, Self::Err>
    {   let id = id.trim();
        ProviderKind::ALL
          .iter()
          .copied()
          .find(|kind| {
            kind.as_str().eq_ignore_ascii_case(id)
              || kind.descriptive_id().eq_ignore_ascii_case(id)
          })
          .ok_or_else(|| Error::UnknownProvider(id.to_string()))
    }
}
