//! Unified request and response types for promptgate

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::prompt::MetaPrompt;
use crate::PromptMode;

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const MAX_TEMPERATURE: f32 = 2.0;

fn default_temperature() -> f32
{   DEFAULT_TEMPERATURE
}

fn default_max_tokens() -> u32
{   DEFAULT_MAX_TOKENS
}

/// Provider-agnostic generation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest
{   pub mode: PromptMode
  , /// Provider identifier, resolved by the registry
    pub provider: String
  , /// Backend-specific model name
    pub model: String
  , #[serde(alias = "inputText")]
    pub input_text: String
  , #[serde(default, alias = "metaPrompt", skip_serializing_if = "Option::is_none")]
    pub meta_prompt: Option<MetaPrompt>
  , #[serde(default = "default_temperature")]
    pub temperature: f32
  , #[serde(default = "default_max_tokens", alias = "maxTokens")]
    pub max_tokens: u32
}

impl GenerationRequest
{   pub fn new(
      mode: PromptMode
    , provider: impl Into<String>
    , model: impl Into<String>
    , input_text: impl Into<String>
    ) -> Self
    {   GenerationRequest
        {   mode
          , provider: provider.into()
          , model: model.into()
          , input_text: input_text.into()
          , meta_prompt: None
          , temperature: DEFAULT_TEMPERATURE
          , max_tokens: DEFAULT_MAX_TOKENS
        }
    }

    pub fn with_meta_prompt(mut self, meta: MetaPrompt) -> Self
    {   self.meta_prompt = Some(meta);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self
    {   self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self
    {   self.max_tokens = max_tokens;
        self
    }

    /// Decode an inbound JSON body
    pub fn from_json(body: &str) -> Result<Self, Error>
    {   serde_json::from_str(body)
          .map_err(|e| Error::Validation(e.to_string()))
    }

    /// Field-level checks that need no provider lookup
    pub fn validate(&self) -> Result<(), Error>
    {   if self.model.trim().is_empty()
        {   return Err(Error::Validation("model is required".into()));
        }
        if self.input_text.trim().is_empty()
        {   return Err(Error::Validation("input_text is required".into()));
        }
        if !(0.0..=MAX_TEMPERATURE).contains(&self.temperature)
        {   return Err(Error::Validation(format!(
              "temperature must be within [0, {}], got {}",
              MAX_TEMPERATURE, self.temperature
            )));
        }
        if self.max_tokens == 0
        {   return Err(Error::Validation(
              "max_tokens must be positive".into()
            ));
        }
        if let Some(meta) = &self.meta_prompt
        {   if meta.purpose.trim().is_empty()
            {   return Err(Error::Validation(
                  "meta_prompt.purpose is required".into()
                ));
            }
        }
        Ok(())
    }
}

/// Token counts as reported by the backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage
{   #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u64>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u64>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u64>
}

impl Usage
{   /// Build from input/output counts, deriving the total
    pub fn from_counts(prompt: u64, completion: u64) -> Self
    {   Usage
        {   prompt_tokens: Some(prompt)
          , completion_tokens: Some(completion)
          , total_tokens: Some(prompt + completion)
        }
    }
}

/// Normalized generation result.
/// An error is terminal: a failure carries no content and no usage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult
{   pub content: String
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>
}

impl GenerationResult
{   pub fn success(content: impl Into<String>, usage: Option<Usage>) -> Self
    {   GenerationResult
        {   content: content.into()
          , usage
          , error: None
        }
    }

    pub fn failure(err: &Error) -> Self
    {   GenerationResult
        {   content: String::new()
          , usage: None
          , error: Some(err.to_string())
        }
    }

    pub fn is_error(&self) -> bool
    {   self.error.is_some()
    }
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn defaults_fill_missing_fields()
    {   let request = GenerationRequest::from_json(
          r#"{"mode":"expansion","provider":"ollama",
              "model":"llama3","input_text":"hi"}"#
        ).unwrap();
        assert_eq!(request.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(request.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(request.meta_prompt, None);
    }

    #[test]
    fn camel_case_aliases_are_accepted()
    {   let request = GenerationRequest::from_json(
          r#"{"mode":"expansion","provider":"local-raw-generate",
              "model":"llama3","inputText":"hello","maxTokens":64,
              "metaPrompt":{"purpose":"test","instructions":["do X"]}}"#
        ).unwrap();
        assert_eq!(request.input_text, "hello");
        assert_eq!(request.max_tokens, 64);
        assert_eq!(request.meta_prompt.unwrap().purpose, "test");
    }

    #[test]
    fn undecodable_body_is_validation_error()
    {   let err = GenerationRequest::from_json(
          r#"{"mode":"dreaming","provider":"ollama"}"#
        ).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Validation);
    }

    #[test]
    fn validation_rejects_bad_fields()
    {   let ok = GenerationRequest::new(
          PromptMode::Action, "openai", "gpt-4o", "text"
        );
        assert!(ok.validate().is_ok());

        let cases = [
          ok.clone().with_temperature(2.5)
        , ok.clone().with_temperature(-0.1)
        , ok.clone().with_max_tokens(0)
        , GenerationRequest { model: " ".into(), ..ok.clone() }
        , GenerationRequest { input_text: String::new(), ..ok.clone() }
        , ok.clone().with_meta_prompt(MetaPrompt::new("", ["x"]))
        ];
        for case in cases
        {   let err = case.validate().unwrap_err();
            assert_eq!(err.kind(), crate::ErrorKind::Validation);
        }
    }

    #[test]
    fn temperature_bounds_are_inclusive()
    {   let request = GenerationRequest::new(
          PromptMode::Action, "openai", "gpt-4o", "text"
        );
        assert!(request.clone().with_temperature(0.0).validate().is_ok());
        assert!(request.with_temperature(2.0).validate().is_ok());
    }

    #[test]
    fn failure_is_terminal()
    {   let result = GenerationResult::failure(&Error::Timeout);
        assert!(result.is_error());
        assert!(result.content.is_empty());
        assert_eq!(result.usage, None);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["error"], "Request timed out");
        assert!(json.get("usage").is_none());
    }

    #[test]
    fn usage_totals_counts()
    {   let usage = Usage::from_counts(12, 30);
        assert_eq!(usage.total_tokens, Some(42));
    }
}
