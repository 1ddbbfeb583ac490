use log::trace;

use crate::config::ProviderConfig;
use crate::error::Error;
use crate::request::GenerationResult;
use crate::ProviderKind;
use super::openai::{
  ChatCompletionRequest, ChatCompletionResponse, CHAT_COMPLETIONS_PATH
};
use super::GenerateArgs;

/// Local OpenAI-compatible adapter (LM Studio, vLLM, llama.cpp server).
/// Same wire shape as the OpenAI adapter; the key is optional and usage
/// is forwarded only when the server reports it.
#[derive(Debug, Clone)]
pub struct LmStudioClient
{   http_client: reqwest::Client
  , config: ProviderConfig
}

impl LmStudioClient
{   pub fn new(http_client: reqwest::Client, config: ProviderConfig) -> Self
    {   LmStudioClient
        {   http_client
          , config
        }
    }

    pub async fn generate(
      &self
    , args: GenerateArgs<'_>
    ) -> Result<GenerationResult, Error>
    {   let request = ChatCompletionRequest::from_args(&args);
        trace!("LM Studio request: {:?}", request);

        let mut builder = self.http_client
          .post(self.config.endpoint(CHAT_COMPLETIONS_PATH))
          .json(&request);
        if let Some(key) = self.config.api_key.as_deref()
        {   builder = builder.bearer_auth(key);
        }

        let response: ChatCompletionResponse
          = super::send_json(builder, ProviderKind::LmStudio).await?;
        response.into_result(ProviderKind::LmStudio)
    }
}
