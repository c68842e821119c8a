//! Provider router — one OpenAI-compatible client per configured endpoint.

use std::collections::BTreeMap;
use std::sync::Arc;

use skillloop_config::{AppConfig, ProviderConfig};
use skillloop_core::provider::Provider;
use tracing::{debug, warn};

use crate::openai_compat::OpenAiCompatProvider;

/// Holds every configured provider, keyed by name.
pub struct ProviderRouter {
    providers: BTreeMap<String, Arc<dyn Provider>>,
    default_provider: String,
}

impl ProviderRouter {
    /// Create a new router with a default provider.
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: BTreeMap::new(),
            default_provider: default_provider.into(),
        }
    }

    /// Register a provider.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.insert(name.into(), provider);
    }

    /// Get the default provider.
    pub fn default_provider(&self) -> Option<Arc<dyn Provider>> {
        self.providers.get(&self.default_provider).cloned()
    }

    /// Get a specific provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }

    /// Registered provider names, sorted.
    pub fn list(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }
}

/// Build the router from `[providers.*]` plus the default provider.
///
/// Every provider speaks the OpenAI chat-completions dialect. A provider
/// without an `api_url` must be one of the well-known names; unknown ones
/// are skipped with a warning, which leaves the router without that entry.
pub fn build_from_config(config: &AppConfig) -> ProviderRouter {
    let mut router = ProviderRouter::new(&config.default_provider);

    for (name, provider_config) in &config.providers {
        if let Some(provider) = make_provider(name, Some(provider_config), config) {
            router.register(name.clone(), provider);
        }
    }

    if router.get(&config.default_provider).is_none()
        && let Some(provider) = make_provider(&config.default_provider, None, config)
    {
        router.register(config.default_provider.clone(), provider);
    }

    router
}

fn make_provider(
    name: &str,
    provider_config: Option<&ProviderConfig>,
    config: &AppConfig,
) -> Option<Arc<dyn Provider>> {
    let base_url = match provider_config.and_then(|p| p.api_url.clone()) {
        Some(url) => url,
        None => match known_base_url(name) {
            Some(url) => url.to_string(),
            None => {
                warn!(provider = %name, "Unknown provider without api_url; skipping");
                return None;
            }
        },
    };
    let api_key = provider_config
        .and_then(|p| p.api_key.clone())
        .or_else(|| config.api_key.clone())
        .unwrap_or_default();

    debug!(provider = %name, url = %base_url, "Registering provider");
    Some(Arc::new(OpenAiCompatProvider::new(name, &base_url, &api_key)))
}

/// Base URLs of OpenAI-compatible services that need no `api_url`.
fn known_base_url(provider_name: &str) -> Option<&'static str> {
    let url = match provider_name {
        "openai" => "https://api.openai.com/v1",
        "openrouter" => "https://openrouter.ai/api/v1",
        "deepseek" => "https://api.deepseek.com/v1",
        "groq" => "https://api.groq.com/openai/v1",
        "ollama" => "http://localhost:11434/v1",
        "vllm" => "http://localhost:8000/v1",
        _ => return None,
    };
    Some(url)
}
