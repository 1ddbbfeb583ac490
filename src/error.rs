//! Error taxonomy shared by adapters, the registry and the gateway

use serde::Serialize;

/// Longest backend body kept in an error detail
const BODY_SNIPPET_CHARS: usize = 512;

/// Machine-distinguishable failure class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind
{   Validation
  , UnknownProvider
  , Timeout
  , Unreachable
  , Backend
  , MalformedResponse
  , Configuration
}

/// Error type for promptgate operations
/// Implements Clone so results can be fanned out to waiting callers
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error
{   /// Request is malformed and never reached a backend
    #[error("Invalid request: {0}")]
    Validation(String)
  , /// Provider identifier is not registered
    #[error("Unknown provider: {0}")]
    UnknownProvider(String)
  , /// Bounded wait exceeded
    #[error("Request timed out")]
    Timeout
  , /// Transport or connection failure
    #[error("Backend unreachable: {0}")]
    Unreachable(String)
  , /// Backend answered with a non-success status
    #[error("Backend error (HTTP {status}): {body}")]
    Backend
    {   status: u16
      , body: String
    }
  , /// Success status but the body had an unexpected shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String)
  , /// Cloud provider has no credential configured
    #[error("Missing API key for: {0}")]
    MissingApiKey(String)
  , /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String)
}

impl Error
{   /// Build a backend error, keeping only a short snippet of the body
    pub fn backend(status: u16, body: &str) -> Self
    {   let body: String = body.trim()
          .chars()
          .take(BODY_SNIPPET_CHARS)
          .collect();
        Error::Backend { status, body }
    }

    /// Map a transport error onto the taxonomy.
    /// The request URL is dropped so query-string credentials never leak.
    pub fn from_transport(err: reqwest::Error) -> Self
    {   if err.is_timeout()
        {   return Error::Timeout;
        }
        if err.is_decode()
        {   return Error::MalformedResponse(
              err.without_url().to_string()
            );
        }
        Error::Unreachable(err.without_url().to_string())
    }

    pub fn kind(&self) -> ErrorKind
    {   match self
        {   Error::Validation(_) => ErrorKind::Validation
          , Error::UnknownProvider(_) => ErrorKind::UnknownProvider
          , Error::Timeout => ErrorKind::Timeout
          , Error::Unreachable(_) => ErrorKind::Unreachable
          , Error::Backend { .. } => ErrorKind::Backend
          , Error::MalformedResponse(_) => ErrorKind::MalformedResponse
          , Error::MissingApiKey(_)
          | Error::InvalidConfiguration(_) => ErrorKind::Configuration
        }
    }

    /// Only a timeout is worth retrying by the caller
    pub fn is_retryable(&self) -> bool
    {   self.kind() == ErrorKind::Timeout
    }

    /// HTTP status a front-end should answer with
    pub fn status_code(&self) -> u16
    {   match self.kind()
        {   ErrorKind::Validation
          | ErrorKind::UnknownProvider => 400
          , ErrorKind::Timeout => 504
          , _ => 500
        }
    }
}
