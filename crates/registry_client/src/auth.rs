//! Registry credentials.
//!
//! The token comes from configuration; this module only knows how the
//! registry wants it presented.

use std::fmt;

#[derive(Clone)]
pub struct RegistryCredentials {
    /// API token
    pub token: String,
    /// API base URL without trailing slash (e.g., "http://api.makindo.io")
    pub api_base: String,
}

impl RegistryCredentials {
    pub fn new(token: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    /// Value of the `Authorization` header.
    pub fn authorization(&self) -> String {
        format!("Token token=\"{}\"", self.token)
    }
}

// Tokens must not end up in logs.
impl fmt::Debug for RegistryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryCredentials")
            .field("token", &"<redacted>")
            .field("api_base", &self.api_base)
            .finish()
    }
}
