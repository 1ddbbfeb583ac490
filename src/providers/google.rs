use serde::{Deserialize, Serialize};
use log::trace;

use crate::config::ProviderConfig;
use crate::error::Error;
use crate::request::GenerationResult;
use crate::ProviderKind;
use super::GenerateArgs;

// ===== Message Types =====

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest
{   pub contents: Vec<Content>
  , pub generation_config: GenerationConfig
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content
{   #[serde(default)]
    pub parts: Vec<Part>
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part
{   #[serde(default)]
    pub text: Option<String>
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig
{   pub temperature: f32
  , pub max_output_tokens: u32
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateContentResponse
{   #[serde(default)]
    pub candidates: Vec<Candidate>
}

#[derive(Debug, Clone, Deserialize)]
pub struct Candidate
{   pub content: Option<Content>
}

impl GenerateContentResponse
{   /// Text parts of the first candidate. No usage is reported.
    pub fn into_result(self) -> Result<GenerationResult, Error>
    {   let parts = self.candidates
          .into_iter()
          .next()
          .and_then(|c| c.content)
          .map(|c| c.parts)
          .unwrap_or_default();

        let texts: Vec<String> = parts
          .into_iter()
          .filter_map(|p| p.text)
          .collect();

        if texts.is_empty()
        {   return Err(Error::MalformedResponse(
              "google response contained no candidate text".to_string()
            ));
        }
        Ok(GenerationResult::success(texts.concat(), None))
    }
}

// ===== Google Client =====

/// Single-turn cloud generation adapter
#[derive(Debug, Clone)]
pub struct GoogleClient
{   http_client: reqwest::Client
  , config: ProviderConfig
}

impl GoogleClient
{   pub fn new(http_client: reqwest::Client, config: ProviderConfig) -> Self
    {   GoogleClient
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
          ProviderKind::Google
        )?;

        let request = GenerateContentRequest
        {   contents: vec![Content
            {   parts: vec![Part { text: Some(args.joined_prompt()) }]
            }]
          , generation_config: GenerationConfig
            {   temperature: args.temperature
              , max_output_tokens: args.max_tokens
            }
        };
        trace!("Google request: {:?}", request);

        let path = format!("/v1beta/models/{}:generateContent", args.model);
        let response: GenerateContentResponse = super::send_json(
          self.http_client
            .post(self.config.endpoint(&path))
            .header("x-goog-api-key", api_key)
            .json(&request),
          ProviderKind::Google
        ).await?;

        response.into_result()
    }
}
