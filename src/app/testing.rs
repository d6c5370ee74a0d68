use super::{
    ens::{ProviderError, ReadProvider},
    wallet::{WalletEndpoint, WalletError},
};
use alloy::primitives::Address;
use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

/// In-memory name system.
#[derive(Default)]
pub struct StaticProvider {
    forward: HashMap<String, Address>,
    reverse: HashMap<Address, String>,
    failing: bool,
    forward_calls: AtomicUsize,
}

impl StaticProvider {
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: &str, address: Address) -> Self {
        self.forward.insert(name.to_string(), address);
        self
    }

    /// Registers a verified reverse record (and the matching forward record).
    pub fn with_reverse(mut self, address: Address, name: &str) -> Self {
        self.reverse.insert(address, name.to_string());
        self.with_name(name, address)
    }

    pub fn forward_calls(&self) -> usize {
        self.forward_calls.load(Ordering::SeqCst)
    }

    fn unreachable() -> ProviderError {
        ProviderError::Connect {
            url: "http://127.0.0.1:1".into(),
            reason: "connection refused".into(),
        }
    }
}

#[async_trait]
impl ReadProvider for StaticProvider {
    async fn resolve_name(&self, name: &str) -> Result<Option<Address>, ProviderError> {
        self.forward_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(Self::unreachable());
        }
        Ok(self.forward.get(name).copied())
    }

    async fn lookup_address(&self, address: Address) -> Result<Option<String>, ProviderError> {
        if self.failing {
            return Err(Self::unreachable());
        }
        Ok(self.reverse.get(&address).cloned())
    }

    fn endpoint(&self) -> &str {
        "memory://static"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prompt {
    Grant,
    Reject,
}

/// Wallet double with a fixed set of accounts and a scripted answer to the prompt.
pub struct ScriptedWallet {
    accounts: Vec<Address>,
    granted: AtomicBool,
    prompt: Prompt,
    broken: bool,
    prompts: AtomicUsize,
    log: Mutex<Vec<&'static str>>,
}

impl ScriptedWallet {
    fn new(accounts: Vec<Address>, granted: bool, prompt: Prompt) -> Self {
        Self {
            accounts,
            granted: AtomicBool::new(granted),
            prompt,
            broken: false,
            prompts: AtomicUsize::new(0),
            log: Mutex::new(Vec::new()),
        }
    }

    /// Access granted in an earlier session.
    pub fn authorized(accounts: Vec<Address>) -> Self {
        Self::new(accounts, true, Prompt::Grant)
    }

    /// No access yet; the user approves when asked.
    pub fn locked(accounts: Vec<Address>) -> Self {
        Self::new(accounts, false, Prompt::Grant)
    }

    /// No access yet; the user declines when asked.
    pub fn rejecting(accounts: Vec<Address>) -> Self {
        Self::new(accounts, false, Prompt::Reject)
    }

    /// Every call fails at the transport level.
    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::new(Vec::new(), false, Prompt::Grant)
        }
    }

    pub fn prompts(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.log.lock().unwrap().clone()
    }

    fn record(&self, call: &'static str) -> Result<(), WalletError> {
        self.log.lock().unwrap().push(call);
        if self.broken {
            return Err(WalletError::Connect {
                url: "http://127.0.0.1:1248".into(),
                reason: "connection refused".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl WalletEndpoint for ScriptedWallet {
    async fn accounts(&self) -> Result<Vec<Address>, WalletError> {
        self.record("eth_accounts")?;
        if self.granted.load(Ordering::SeqCst) {
            Ok(self.accounts.clone())
        } else {
            Ok(Vec::new())
        }
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        self.record("eth_requestAccounts")?;
        self.prompts.fetch_add(1, Ordering::SeqCst);
        match self.prompt {
            Prompt::Grant => {
                self.granted.store(true, Ordering::SeqCst);
                Ok(self.accounts.clone())
            }
            Prompt::Reject => Err(WalletError::Rejected("User rejected the request.".into())),
        }
    }
}
