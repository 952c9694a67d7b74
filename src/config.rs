//! Client configuration and credential resolution.

use crate::error::Error;

/// Environment variable consulted when no API key is passed explicitly.
pub const API_KEY_ENV: &str = "KHULNASOFT_KEY";

/// Default Khulnasoft API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.khulnasoft.com/v0";

/// Resolved settings shared by the async and blocking clients.
#[derive(Clone)]
pub(crate) struct ClientConfig {
    pub(crate) api_key: String,
    pub(crate) base_url: String,
}

impl ClientConfig {
    /// URL of the chat-completion endpoint.
    pub(crate) fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

/// Environment lookup used to resolve the default API key.
pub(crate) type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Optional overrides collected by the client builders. `resolve` turns
/// them into a [`ClientConfig`], failing fast when no credential can be
/// found: an explicit key wins, otherwise the lookup (by default
/// [`std::env::var`]) is consulted with [`API_KEY_ENV`].
#[derive(Default)]
pub(crate) struct ConfigBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    env_lookup: Option<EnvLookup>,
}

impl ConfigBuilder {
    pub(crate) fn api_key(&mut self, api_key: impl Into<String>) {
        self.api_key = Some(api_key.into());
    }

    pub(crate) fn base_url(&mut self, base_url: impl Into<String>) {
        let base_url = base_url.into();
        self.base_url = Some(base_url.trim_end_matches('/').to_string());
    }

    pub(crate) fn env_lookup<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env_lookup = Some(Box::new(lookup));
    }

    pub(crate) fn resolve(self) -> Result<ClientConfig, Error> {
        let lookup = self
            .env_lookup
            .unwrap_or_else(|| Box::new(|name| std::env::var(name).ok()));
        let api_key = self
            .api_key
            .or_else(|| lookup(API_KEY_ENV))
            .ok_or(Error::MissingApiKey)?;
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Ok(ClientConfig { api_key, base_url })
    }
}
