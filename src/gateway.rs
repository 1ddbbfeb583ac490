//! Gateway: validate, compile, resolve, invoke under a timeout
//!
//! Each call owns its request end to end. The only state shared between
//! concurrent calls is the read-only registry, so one slow backend never
//! holds up another request.

use std::sync::Arc;
use std::time::Duration;
use log::{debug, error, info};

use crate::config::GatewayConfig;
use crate::error::Error;
use crate::prompt::{self, RenderedPrompt};
use crate::providers::GenerateArgs;
use crate::registry::ProviderRegistry;
use crate::request::{GenerationRequest, GenerationResult};

/// Request handler over a shared provider registry. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Gateway
{   registry: Arc<ProviderRegistry>
  , request_timeout: Duration
}

impl Gateway
{   pub fn new(config: &GatewayConfig) -> Result<Self, Error>
    {   let registry = ProviderRegistry::from_config(config)?;
        Ok(Gateway::with_registry(
          Arc::new(registry),
          config.request_timeout()
        ))
    }

    pub fn with_registry(
      registry: Arc<ProviderRegistry>
    , request_timeout: Duration
    ) -> Self
    {   Gateway
        {   registry
          , request_timeout
        }
    }

    pub fn registry(&self) -> &ProviderRegistry
    {   &self.registry
    }

    pub fn request_timeout(&self) -> Duration
    {   self.request_timeout
    }

    /// Handle one request. Validation and provider resolution both
    /// happen before any outbound call; adapter errors pass through
    /// unchanged and are never retried here.
    pub async fn handle(
      &self
    , request: &GenerationRequest
    ) -> Result<GenerationResult, Error>
    {   debug!(
          "Handling {} request for {}/{}",
          request.mode, request.provider, request.model
        );
        request.validate()?;

        let adapter = self.registry.resolve(&request.provider)?;
        let rendered = match request.meta_prompt.as_ref()
        {   None if adapter.sends_raw_prompt() =>
              RenderedPrompt::plain(&request.input_text)
          , meta => prompt::render(
              adapter.prompt_style(),
              request.mode,
              meta,
              &request.input_text
            )
        };

        let args = GenerateArgs
        {   model: &request.model
          , system_prompt: &rendered.system
          , input_text: &rendered.input
          , temperature: request.temperature
          , max_tokens: request.max_tokens
        };

        let outcome = tokio::time::timeout(
          self.request_timeout,
          adapter.generate(args)
        ).await;

        match outcome
        {   Ok(Ok(result)) => {
              info!(
                "{}/{} answered with {} chars",
                adapter.kind(), request.model, result.content.chars().count()
              );
              Ok(result)
            }
          , Ok(Err(err)) => {
              error!("{}/{} failed: {}", adapter.kind(), request.model, err);
              Err(err)
            }
          , Err(_) => {
              error!(
                "{}/{} exceeded {:?}",
                adapter.kind(), request.model, self.request_timeout
              );
              Err(Error::Timeout)
            }
        }
    }

    /// Handle a raw JSON body and return the outward result shape.
    /// Any failure is folded into a terminal `GenerationResult`.
    pub async fn handle_json(&self, body: &str) -> GenerationResult
    {   let outcome = match GenerationRequest::from_json(body)
        {   Ok(request) => self.handle(&request).await
          , Err(err) => Err(err)
        };
        outcome.unwrap_or_else(|err| GenerationResult::failure(&err))
    }
}
