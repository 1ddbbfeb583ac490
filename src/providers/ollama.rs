use serde::{Deserialize, Serialize};
use log::trace;

use crate::config::ProviderConfig;
use crate::error::Error;
use crate::prompt::PromptStyle;
use crate::request::GenerationResult;
use crate::ProviderKind;
use super::GenerateArgs;

pub const GENERATE_PATH: &str = "/api/generate";

// ===== Message Types =====

#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest
{   pub model: String
  , pub prompt: String
  , pub stream: bool
  , pub options: GenerateOptions
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateOptions
{   pub temperature: f32
  , pub num_predict: u32
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse
{   pub response: String
}

// ===== Ollama Client =====

/// Local raw-generate adapter. Sends one `prompt` field, never streams,
/// and reports no usage.
#[derive(Debug, Clone)]
pub struct OllamaClient
{   http_client: reqwest::Client
  , config: ProviderConfig
  , prompt_style: PromptStyle
}

impl OllamaClient
{   pub fn new(
      http_client: reqwest::Client
    , config: ProviderConfig
    , prompt_style: PromptStyle
    ) -> Self
    {   OllamaClient
        {   http_client
          , config
          , prompt_style
        }
    }

    pub fn prompt_style(&self) -> PromptStyle
    {   self.prompt_style
    }

    pub fn request_for(args: &GenerateArgs<'_>) -> GenerateRequest
    {   GenerateRequest
        {   model: args.model.to_string()
          , prompt: args.joined_prompt()
          , stream: false
          , options: GenerateOptions
            {   temperature: args.temperature
              , num_predict: args.max_tokens
            }
        }
    }

    pub async fn generate(
      &self
    , args: GenerateArgs<'_>
    ) -> Result<GenerationResult, Error>
    {   let request = Self::request_for(&args);
        trace!("Ollama request: {:?}", request);

        let response: GenerateResponse = super::send_json(
          self.http_client
            .post(self.config.endpoint(GENERATE_PATH))
            .json(&request),
          ProviderKind::Ollama
        ).await?;

        Ok(GenerationResult::success(response.response, None))
    }
}
