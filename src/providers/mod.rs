//! LLM provider implementations
//!
//! The set of backends is closed, so adapters are variants of one enum
//! rather than trait objects. Every adapter funnels its HTTP exchange
//! through `send_json`, which owns the status/timeout/decode mapping.

pub mod openai;
pub mod anthropic;
pub mod google;
pub mod ollama;
pub mod lmstudio;

use log::{debug, error, trace};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::prompt::PromptStyle;
use crate::request::GenerationResult;
use crate::ProviderKind;

pub use anthropic::AnthropicClient;
pub use google::GoogleClient;
pub use lmstudio::LmStudioClient;
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;

// ===== Shared Message Types =====

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage
{   pub role: String
  , pub content: String
}

impl ChatMessage
{   pub fn system(content: impl Into<String>) -> Self
    {   ChatMessage
        {   role: "system".to_string()
          , content: content.into()
        }
    }

    pub fn user(content: impl Into<String>) -> Self
    {   ChatMessage
        {   role: "user".to_string()
          , content: content.into()
        }
    }
}

/// One call of the uniform generation contract
#[derive(Debug, Clone, Copy)]
pub struct GenerateArgs<'a>
{   pub model: &'a str
  , /// Empty when the prompt style folded it into `input_text`
    pub system_prompt: &'a str
  , pub input_text: &'a str
  , pub temperature: f32
  , pub max_tokens: u32
}

impl GenerateArgs<'_>
{   /// System prompt and input as one single-turn prompt
    pub fn joined_prompt(&self) -> String
    {   if self.system_prompt.is_empty()
        {   self.input_text.to_string()
        } else
        {   format!("{}\n\n{}", self.system_prompt, self.input_text)
        }
    }

    /// System prompt and input as role-tagged chat messages
    pub fn chat_messages(&self) -> Vec<ChatMessage>
    {   let mut messages = Vec::with_capacity(2);
        if !self.system_prompt.is_empty()
        {   messages.push(ChatMessage::system(self.system_prompt));
        }
        messages.push(ChatMessage::user(self.input_text));
        messages
    }
}

// ===== Adapter Sum Type =====

/// A backend adapter, one variant per `ProviderKind`
#[derive(Debug, Clone)]
pub enum ProviderAdapter
{   OpenAi(OpenAiClient)
  , Anthropic(AnthropicClient)
  , Google(GoogleClient)
  , Ollama(OllamaClient)
  , LmStudio(LmStudioClient)
}

impl ProviderAdapter
{   pub fn kind(&self) -> ProviderKind
    {   match self
        {   ProviderAdapter::OpenAi(_) => ProviderKind::OpenAi
          , ProviderAdapter::Anthropic(_) => ProviderKind::Anthropic
          , ProviderAdapter::Google(_) => ProviderKind::Google
          , ProviderAdapter::Ollama(_) => ProviderKind::Ollama
          , ProviderAdapter::LmStudio(_) => ProviderKind::LmStudio
        }
    }

    /// How this adapter wants the meta-prompt rendered
    pub fn prompt_style(&self) -> PromptStyle
    {   match self
        {   ProviderAdapter::Ollama(client) => client.prompt_style()
          , _ => PromptStyle::Flat
        }
    }

    /// Raw-generate backends take the bare input when no meta-prompt
    /// is given
    pub fn sends_raw_prompt(&self) -> bool
    {   matches!(self, ProviderAdapter::Ollama(_))
    }

    /// Run one generation. Never retries; the caller bounds the wait.
    pub async fn generate(
      &self
    , args: GenerateArgs<'_>
    ) -> Result<GenerationResult, Error>
    {   debug!(
          "{} generate: model={}, max_tokens={}",
          self.kind(), args.model, args.max_tokens
        );
        match self
        {   ProviderAdapter::OpenAi(client) => client.generate(args).await
          , ProviderAdapter::Anthropic(client) => client.generate(args).await
          , ProviderAdapter::Google(client) => client.generate(args).await
          , ProviderAdapter::Ollama(client) => client.generate(args).await
          , ProviderAdapter::LmStudio(client) => client.generate(args).await
        }
    }
}

// ===== Transport =====

/// Look up a required credential without touching the network
pub(crate) fn require_key(
  key: Option<&str>
, provider: ProviderKind
) -> Result<&str, Error>
{   key.filter(|k| !k.is_empty())
      .ok_or_else(|| {
        error!("No API key configured for {}", provider);
        Error::MissingApiKey(provider.to_string())
      })
}

/// Send a prepared request and decode a JSON success body.
///
/// Non-2xx becomes `Backend`, transport timeouts become `Timeout`,
/// connection failures `Unreachable`, and a body that does not decode
/// into `T` becomes `MalformedResponse`.
pub(crate) async fn send_json<T>(
  request: reqwest::RequestBuilder
, provider: ProviderKind
) -> Result<T, Error>
where
  T: DeserializeOwned
{   let response = request
      .send()
      .await
      .map_err(|e| {
        let err = Error::from_transport(e);
        error!("{} transport error: {}", provider, err);
        err
      })?;

    let status = response.status();
    trace!("{} response status: {}", provider, status);

    let body = response.text().await.map_err(Error::from_transport)?;

    if !status.is_success()
    {   error!("{} API error ({}): {}", provider, status, body);
        return Err(Error::backend(status.as_u16(), &body));
    }

    serde_json::from_str(&body).map_err(|e| {
      error!("{} parse error: {}", provider, e);
      Error::MalformedResponse(format!("{} response: {}", provider, e))
    })
}
