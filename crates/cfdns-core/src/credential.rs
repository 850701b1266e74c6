// # API Credential
//
// Bearer token passed explicitly into every provider call.
//
// The core never stores a token beyond the session that was handed one;
// where a token comes from (flag, environment, prompt) is the front-end's
// business.

use crate::{Error, Result};

/// Cloudflare API token
///
/// The `Debug` implementation never prints the token value.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiToken(String);

impl ApiToken {
    /// Wrap a token, rejecting empty or whitespace-only values
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(Error::config("API token cannot be empty"));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The raw token, for building the `Authorization` header only
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiToken(<REDACTED>)")
    }
}
