use serde::{Deserialize, Serialize};
use log::trace;

use crate::config::ProviderConfig;
use crate::error::Error;
use crate::request::{GenerationResult, Usage};
use crate::ProviderKind;
use super::{ChatMessage, GenerateArgs};

pub const MESSAGES_PATH: &str = "/v1/messages";
pub const API_VERSION: &str = "2023-06-01";

// ===== Message Types =====

#[derive(Debug, Clone, Serialize)]
pub struct MessagesRequest
{   pub model: String
  , #[serde(skip_serializing_if = "String::is_empty")]
    pub system: String
  , pub messages: Vec<ChatMessage>
  , pub max_tokens: u32
  , pub temperature: f32
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessagesResponse
{   pub content: Vec<ContentBlock>
  , #[serde(default)]
    pub usage: Option<MessagesUsage>
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentBlock
{   #[serde(rename = "type")]
    pub kind: String
  , #[serde(default)]
    pub text: Option<String>
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessagesUsage
{   pub input_tokens: u64
  , pub output_tokens: u64
}

impl MessagesResponse
{   /// Text of the first text block
    pub fn into_result(self) -> Result<GenerationResult, Error>
    {   let usage = self.usage
          .map(|u| Usage::from_counts(u.input_tokens, u.output_tokens));
        let text = self.content
          .into_iter()
          .find(|block| block.kind == "text")
          .and_then(|block| block.text)
          .ok_or_else(|| Error::MalformedResponse(
            "anthropic response contained no text block".to_string()
          ))?;
        Ok(GenerationResult::success(text, usage))
    }
}

// ===== Anthropic Client =====

/// Cloud messages adapter; the system prompt travels in its own field
#[derive(Debug, Clone)]
pub struct AnthropicClient
{   http_client: reqwest::Client
  , config: ProviderConfig
}

impl AnthropicClient
{   pub fn new(http_client: reqwest::Client, config: ProviderConfig) -> Self
    {   AnthropicClient
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
          ProviderKind::Anthropic
        )?;

        let request = MessagesRequest
        {   model: args.model.to_string()
          , system: args.system_prompt.to_string()
          , messages: vec![ChatMessage::user(args.input_text)]
          , max_tokens: args.max_tokens
          , temperature: args.temperature
        };
        trace!("Anthropic request: {:?}", request);

        let response: MessagesResponse = super::send_json(
          self.http_client
            .post(self.config.endpoint(MESSAGES_PATH))
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request),
          ProviderKind::Anthropic
        ).await?;

        response.into_result()
    }
}
