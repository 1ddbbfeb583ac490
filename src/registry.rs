//! Provider registry: the single answer to "which backends exist"

use std::collections::HashMap;
use log::{debug, info};

use crate::config::GatewayConfig;
use crate::error::Error;
use crate::providers::{
  AnthropicClient, GoogleClient, LmStudioClient, OllamaClient, OpenAiClient,
  ProviderAdapter,
};
use crate::ProviderKind;

/// Maps provider identifiers to adapters.
/// Built once at start-up and read-only afterwards.
#[derive(Debug, Clone)]
pub struct ProviderRegistry
{   adapters: HashMap<ProviderKind, ProviderAdapter>
}

impl ProviderRegistry
{   /// Build one adapter per provider over a shared HTTP client
    pub fn from_config(config: &GatewayConfig) -> Result<Self, Error>
    {   let http_client = reqwest::Client::builder()
          .user_agent(concat!("promptgate/", env!("CARGO_PKG_VERSION")))
          .build()
          .map_err(|e| Error::InvalidConfiguration(e.to_string()))?;
        Ok(Self::with_client(http_client, config))
    }

    pub fn with_client(
      http_client: reqwest::Client
    , config: &GatewayConfig
    ) -> Self
    {   let adapters: HashMap<ProviderKind, ProviderAdapter>
          = ProviderKind::ALL
            .into_iter()
            .map(|kind| {
              let adapter = build_adapter(kind, &http_client, config);
              debug!("Registered provider: {}", kind);
              (kind, adapter)
            })
            .collect();
        info!("Provider registry ready with {} backends", adapters.len());
        ProviderRegistry { adapters }
    }

    /// Resolve an identifier (canonical or descriptive) to its adapter
    pub fn resolve(&self, provider_id: &str)
      -> Result<&ProviderAdapter, Error>
    {   let kind: ProviderKind = provider_id.parse()?;
        self.adapters
          .get(&kind)
          .ok_or_else(|| Error::UnknownProvider(provider_id.to_string()))
    }

    /// Registered kinds, in declaration order
    pub fn providers(&self) -> Vec<ProviderKind>
    {   ProviderKind::ALL
          .into_iter()
          .filter(|kind| self.adapters.contains_key(kind))
          .collect()
    }
}

fn build_adapter(
  kind: ProviderKind
, http_client: &reqwest::Client
, config: &GatewayConfig
) -> ProviderAdapter
{   let client = http_client.clone();
    match kind
    {   ProviderKind::OpenAi => ProviderAdapter::OpenAi(
          OpenAiClient::new(client, config.openai.clone())
        )
      , ProviderKind::Anthropic => ProviderAdapter::Anthropic(
          AnthropicClient::new(client, config.anthropic.clone())
        )
      , ProviderKind::Google => ProviderAdapter::Google(
          GoogleClient::new(client, config.google.clone())
        )
      , ProviderKind::Ollama => ProviderAdapter::Ollama(
          OllamaClient::new(
            client,
            config.ollama.clone(),
            config.ollama_prompt_style
          )
        )
      , ProviderKind::LmStudio => ProviderAdapter::LmStudio(
          LmStudioClient::new(client, config.lmstudio.clone())
        )
    }
}
