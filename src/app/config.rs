use crate::storage::Storage;
use color_eyre::Result;
use serde::{Deserialize, Serialize};

pub const DEFAULT_RPC_URL: &str = "https://eth.llamarpc.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    RpcUrl,
    WalletRpcUrl,
    LegacyWalletRpcUrl,
}

impl SettingKey {
    pub const ALL: [SettingKey; 3] = [
        SettingKey::RpcUrl,
        SettingKey::WalletRpcUrl,
        SettingKey::LegacyWalletRpcUrl,
    ];

    pub fn env_var(self) -> &'static str {
        match self {
            SettingKey::RpcUrl => "EVM_ACCOUNT_TUI_RPC_URL",
            SettingKey::WalletRpcUrl => "EVM_ACCOUNT_TUI_WALLET_URL",
            SettingKey::LegacyWalletRpcUrl => "EVM_ACCOUNT_TUI_LEGACY_WALLET_URL",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            SettingKey::RpcUrl => "Read RPC URL",
            SettingKey::WalletRpcUrl => "Wallet RPC URL",
            SettingKey::LegacyWalletRpcUrl => "Legacy wallet URL",
        }
    }
}

/// Endpoints used by the session. The read RPC is mandatory, wallets are optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub rpc_url: String,
    #[serde(default)]
    pub wallet_rpc_url: Option<String>,
    #[serde(default)]
    pub legacy_wallet_rpc_url: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            wallet_rpc_url: None,
            legacy_wallet_rpc_url: None,
        }
    }
}

impl Settings {
    /// Persisted values, overridden per field by the environment.
    pub fn load(storage: &Storage) -> Result<Self> {
        let stored = storage.settings().load()?.unwrap_or_default();
        Ok(stored.with_overrides(|name| std::env::var(name).ok()))
    }

    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        for key in SettingKey::ALL {
            if let Some(value) = lookup(key.env_var()) {
                self.set(key, &value);
            }
        }
        self
    }

    pub fn get(&self, key: SettingKey) -> Option<&str> {
        match key {
            SettingKey::RpcUrl => Some(self.rpc_url.as_str()),
            SettingKey::WalletRpcUrl => self.wallet_rpc_url.as_deref(),
            SettingKey::LegacyWalletRpcUrl => self.legacy_wallet_rpc_url.as_deref(),
        }
    }

    /// Blank values clear optional endpoints and are ignored for the read RPC.
    pub fn set(&mut self, key: SettingKey, value: &str) {
        let value = value.trim();
        let optional = (!value.is_empty()).then(|| value.to_string());
        match key {
            SettingKey::RpcUrl => {
                if let Some(url) = optional {
                    self.rpc_url = url;
                }
            }
            SettingKey::WalletRpcUrl => self.wallet_rpc_url = optional,
            SettingKey::LegacyWalletRpcUrl => self.legacy_wallet_rpc_url = optional,
        }
    }

    pub fn has_wallet(&self) -> bool {
        self.wallet_rpc_url.is_some() || self.legacy_wallet_rpc_url.is_some()
    }
}
