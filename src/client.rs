// Front-end handle to the external wallet/provider bridge.
// Construction only; every call goes through the provider itself.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

fn default_endpoint() -> String {
    "http://127.0.0.1:8545".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ProviderHandle {
    endpoint: String,
}

impl ProviderHandle {
    pub fn connect(config: &ProviderConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
