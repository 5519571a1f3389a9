use std::collections::HashMap;

use lgn_oauth::{OAuthError, Provider, ProviderClient, ProviderCredentials};

use crate::error::ApiError;

/// OAuth clients of the providers enabled in this deployment
#[derive(Clone, Debug, Default)]
pub struct ProviderRegistry {
    clients: HashMap<Provider, ProviderClient>,
}

impl ProviderRegistry {
    pub fn from_credentials(
        credentials: Vec<(Provider, ProviderCredentials)>,
    ) -> Result<Self, OAuthError> {
        let http = ProviderClient::http_client()?;
        let mut registry = Self::default();

        for (provider, credentials) in credentials {
            registry.insert(ProviderClient::new(provider, credentials, http.clone())?);
            tracing::info!(%provider, "OAuth provider enabled");
        }

        Ok(registry)
    }

    pub fn insert(&mut self, client: ProviderClient) {
        self.clients.insert(client.provider(), client);
    }

    pub fn get(&self, provider: Provider) -> Option<&ProviderClient> {
        self.clients.get(&provider)
    }

    /// Client for the provider named by a path segment
    ///
    /// Unknown and disabled providers are both reported as not found.
    pub fn resolve(&self, segment: &str) -> Result<&ProviderClient, ApiError> {
        segment
            .parse::<Provider>()
            .ok()
            .and_then(|provider| self.get(provider))
            .ok_or_else(|| ApiError::ProviderNotFound(segment.to_string()))
    }

    /// Enabled providers, in display order
    pub fn enabled(&self) -> impl Iterator<Item = Provider> + '_ {
        Provider::ALL
            .into_iter()
            .filter(|provider| self.clients.contains_key(provider))
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
