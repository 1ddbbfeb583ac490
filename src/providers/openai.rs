use serde::{Deserialize, Serialize};
use log::trace;

use crate::config::ProviderConfig;
use crate::error::Error;
use crate::request::{GenerationResult, Usage};
use crate::ProviderKind;
use super::{ChatMessage, GenerateArgs};

pub const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

// ===== Message Types =====
// Shared with every OpenAI-compatible server.

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest
{   pub model: String
  , pub messages: Vec<ChatMessage>
  , pub temperature: f32
  , pub max_tokens: u32
  , pub stream: bool
}

impl ChatCompletionRequest
{   pub fn from_args(args: &GenerateArgs<'_>) -> Self
    {   ChatCompletionRequest
        {   model: args.model.to_string()
          , messages: args.chat_messages()
          , temperature: args.temperature
          , max_tokens: args.max_tokens
          , stream: false
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse
{   pub choices: Vec<Choice>
  , #[serde(default)]
    pub usage: Option<ChatUsage>
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice
{   pub message: ChoiceMessage
  , #[serde(default)]
    pub finish_reason: Option<String>
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage
{   #[serde(default)]
    pub content: Option<String>
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatUsage
{   #[serde(default)]
    pub prompt_tokens: Option<u64>
  , #[serde(default)]
    pub completion_tokens: Option<u64>
  , #[serde(default)]
    pub total_tokens: Option<u64>
}

impl From<ChatUsage> for Usage
{   fn from(usage: ChatUsage) -> Self
    {   Usage
        {   prompt_tokens: usage.prompt_tokens
          , completion_tokens: usage.completion_tokens
          , total_tokens: usage.total_tokens
        }
    }
}

impl ChatCompletionResponse
{   /// Content of the first choice, plus whatever usage was reported
    pub fn into_result(
      self
    , provider: ProviderKind
    ) -> Result<GenerationResult, Error>
    {   let usage = self.usage.map(Usage::from);
        let content = self.choices
          .into_iter()
          .next()
          .ok_or_else(|| Error::MalformedResponse(
            format!("{} response contained no choices", provider)
          ))?
          .message
          .content
          .ok_or_else(|| Error::MalformedResponse(
            format!("{} choice has no message content", provider)
          ))?;
        Ok(GenerationResult::success(content, usage))
    }
}

// ===== OpenAI Client =====

/// Cloud chat-completions adapter
#[derive(Debug, Clone)]
pub struct OpenAiClient
{   http_client: reqwest::Client
  , config: ProviderConfig
}

impl OpenAiClient
{   pub fn new(http_client: reqwest::Client, config: ProviderConfig) -> Self
    {   OpenAiClient
        {   http_client
          , config
        }
    }

    pub async fn generate(
      &self
    , args: GenerateArgs<'_>
    ) -> Result<GenerationResult, Error>
    {   let api_key = super::require_key(
          self.config.api_key.as_deref(),
          ProviderKind::OpenAi
        )?;

        let request = ChatCompletionRequest::from_args(&args);
        trace!("OpenAI request: {:?}", request);

        let response: ChatCompletionResponse = super::send_json(
          self.http_client
            .post(self.config.endpoint(CHAT_COMPLETIONS_PATH))
            .bearer_auth(api_key)
            .json(&request),
          ProviderKind::OpenAi
        ).await?;

        response.into_result(ProviderKind::OpenAi)
    }
}
