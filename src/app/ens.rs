use super::address::{ChecksummedAddress, validate};
use alloy::{
    primitives::{Address, B256, address, hex, keccak256},
    providers::{DynProvider, Provider, ProviderBuilder},
    sol,
};
use async_trait::async_trait;
use std::fmt;

/// Names ending in this suffix are looked up on ENS; anything else must be a literal address.
pub const ENS_SUFFIX: &str = ".eth";

/// ENS registry, deployed at the same address on mainnet and the public testnets.
pub const ENS_REGISTRY: Address = address!("00000000000C2E074eC69A0dFb2997BA6C7d2e1e");

sol! {
    #[sol(rpc)]
    contract EnsRegistry {
        function resolver(bytes32 node) external view returns (address);
    }

    #[sol(rpc)]
    contract EnsResolver {
        function addr(bytes32 node) external view returns (address);
        function name(bytes32 node) external view returns (string);
    }
}

#[derive(Debug)]
pub enum ProviderError {
    Connect { url: String, reason: String },
    Contract(alloy::contract::Error),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Connect { url, reason } => {
                write!(f, "failed to connect to RPC provider at {url}: {reason}")
            }
            ProviderError::Contract(err) => write!(f, "ENS call failed: {err}"),
        }
    }
}

impl std::error::Error for ProviderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProviderError::Contract(err) => Some(err),
            ProviderError::Connect { .. } => None,
        }
    }
}

impl From<alloy::contract::Error> for ProviderError {
    fn from(value: alloy::contract::Error) -> Self {
        ProviderError::Contract(value)
    }
}

/// Read-only chain access. Both lookups answer `Ok(None)` when nothing is registered.
#[async_trait]
pub trait ReadProvider: Send + Sync {
    async fn resolve_name(&self, name: &str) -> Result<Option<Address>, ProviderError>;

    async fn lookup_address(&self, address: Address) -> Result<Option<String>, ProviderError>;

    /// Where queries go, for display and logs.
    fn endpoint(&self) -> &str;
}

pub fn is_ens_name(identifier: &str) -> bool {
    identifier.ends_with(ENS_SUFFIX)
}

/// Turns free text into a checksummed address, or `None` if it cannot be resolved.
///
/// Lookup failures are not retried and read exactly like a missing record.
pub async fn resolve(identifier: &str, provider: &dyn ReadProvider) -> Option<ChecksummedAddress> {
    if !is_ens_name(identifier) {
        return validate(identifier);
    }
    match provider.resolve_name(identifier).await {
        Ok(found) => found.map(ChecksummedAddress::from),
        Err(err) => {
            tracing::debug!(name = identifier, error = %err, "name lookup failed");
            None
        }
    }
}

/// EIP-137 namehash. Labels are lowercased before hashing.
pub fn namehash(name: &str) -> B256 {
    let mut node = B256::ZERO;
    if name.is_empty() {
        return node;
    }
    for label in name.rsplit('.') {
        let label_hash = keccak256(label.to_lowercase().as_bytes());
        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(node.as_slice());
        buf[32..].copy_from_slice(label_hash.as_slice());
        node = keccak256(buf);
    }
    node
}

fn reverse_name(address: Address) -> String {
    format!("{}.addr.reverse", hex::encode(address.as_slice()))
}

pub struct RpcReadProvider {
    url: String,
    provider: DynProvider,
    registry: Address,
}

impl RpcReadProvider {
    pub async fn connect(rpc_url: &str) -> Result<Self, ProviderError> {
        let provider = ProviderBuilder::new()
            .connect(rpc_url)
            .await
            .map_err(|err| ProviderError::Connect {
                url: rpc_url.to_string(),
                reason: err.to_string(),
            })?;
        Ok(Self::new(rpc_url, provider.erased()))
    }

    fn new(url: &str, provider: DynProvider) -> Self {
        Self {
            url: url.to_string(),
            provider,
            registry: ENS_REGISTRY,
        }
    }

    async fn resolver_for(&self, node: B256) -> Result<Option<Address>, ProviderError> {
        let resolver = EnsRegistry::new(self.registry, &self.provider)
            .resolver(node)
            .call()
            .await?;
        Ok((resolver != Address::ZERO).then_some(resolver))
    }
}

#[async_trait]
impl ReadProvider for RpcReadProvider {
    async fn resolve_name(&self, name: &str) -> Result<Option<Address>, ProviderError> {
        let node = namehash(name);
        let Some(resolver) = self.resolver_for(node).await? else {
            return Ok(None);
        };
        let resolved = EnsResolver::new(resolver, &self.provider)
            .addr(node)
            .call()
            .await?;
        Ok((resolved != Address::ZERO).then_some(resolved))
    }

    async fn lookup_address(&self, address: Address) -> Result<Option<String>, ProviderError> {
        let node = namehash(&reverse_name(address));
        let Some(resolver) = self.resolver_for(node).await? else {
            return Ok(None);
        };
        let name = EnsResolver::new(resolver, &self.provider)
            .name(node)
            .call()
            .await?;
        if name.is_empty() {
            return Ok(None);
        }
        // a reverse record only counts if the name points back at the address
        match self.resolve_name(&name).await? {
            Some(forward) if forward == address => Ok(Some(name)),
            _ => {
                tracing::debug!(%address, name = %name, "reverse record does not resolve back");
                Ok(None)
            }
        }
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}
