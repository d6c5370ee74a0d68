use super::{
    address::ChecksummedAddress,
    config::Settings,
    ens::{ReadProvider, RpcReadProvider},
};
use alloy::{
    primitives::Address,
    providers::{DynProvider, Provider, ProviderBuilder},
    transports::TransportError,
};
use async_trait::async_trait;
use color_eyre::{Result, eyre::WrapErr};
use std::{borrow::Cow, fmt, sync::Arc};

/// EIP-1193 code returned when the user dismisses the authorization prompt.
const USER_REJECTED_REQUEST: i64 = 4001;

#[derive(Debug)]
pub enum WalletError {
    Connect { url: String, reason: String },
    Rejected(String),
    NoAccount,
    Transport(TransportError),
}

impl fmt::Display for WalletError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalletError::Connect { url, reason } => {
                write!(f, "failed to reach wallet endpoint at {url}: {reason}")
            }
            WalletError::Rejected(message) => write!(f, "authorization rejected: {message}"),
            WalletError::NoAccount => f.write_str("wallet exposes no authorized account"),
            WalletError::Transport(err) => write!(f, "wallet request failed: {err}"),
        }
    }
}

impl std::error::Error for WalletError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WalletError::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TransportError> for WalletError {
    fn from(value: TransportError) -> Self {
        match value.as_error_resp() {
            Some(payload) if payload.code == USER_REJECTED_REQUEST => {
                WalletError::Rejected(payload.message.to_string())
            }
            _ => WalletError::Transport(value),
        }
    }
}

/// The handle a wallet exposes for account queries.
#[async_trait]
pub trait WalletEndpoint: Send + Sync {
    /// Accounts the wallet has already authorized. Never prompts.
    async fn accounts(&self) -> Result<Vec<Address>, WalletError>;

    /// Asks the user to authorize this session. May prompt and may be rejected.
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError>;
}

/// Wallet reached over JSON-RPC, e.g. a local Frame instance or a dev node.
pub struct RpcWallet {
    provider: DynProvider,
}

impl RpcWallet {
    pub async fn connect(url: &str) -> Result<Self, WalletError> {
        let provider = ProviderBuilder::new()
            .connect(url)
            .await
            .map_err(|err| WalletError::Connect {
                url: url.to_string(),
                reason: err.to_string(),
            })?;
        Ok(Self::from_provider(provider.erased()))
    }

    fn from_provider(provider: DynProvider) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl WalletEndpoint for RpcWallet {
    async fn accounts(&self) -> Result<Vec<Address>, WalletError> {
        Ok(self.provider.get_accounts().await?)
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        Ok(self
            .provider
            .raw_request::<_, Vec<Address>>(Cow::Borrowed("eth_requestAccounts"), ())
            .await?)
    }
}

/// The wallet endpoints visible to this session.
///
/// `ethereum` is a modern wallet that supports an explicit authorization
/// request; `legacy` only answers account queries. Either may be absent.
#[derive(Clone, Default)]
pub struct WalletEnvironment {
    pub ethereum: Option<Arc<dyn WalletEndpoint>>,
    pub legacy: Option<Arc<dyn WalletEndpoint>>,
}

impl WalletEnvironment {
    /// Connects whichever endpoints are configured. Unreachable ones are treated as absent.
    pub async fn detect(settings: &Settings) -> Self {
        Self {
            ethereum: Self::attach(settings.wallet_rpc_url.as_deref()).await,
            legacy: Self::attach(settings.legacy_wallet_rpc_url.as_deref()).await,
        }
    }

    async fn attach(url: Option<&str>) -> Option<Arc<dyn WalletEndpoint>> {
        let url = url?;
        match RpcWallet::connect(url).await {
            Ok(wallet) => Some(Arc::new(wallet) as Arc<dyn WalletEndpoint>),
            Err(err) => {
                tracing::debug!(error = %err, "wallet endpoint unavailable");
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ethereum.is_none() && self.legacy.is_none()
    }

    fn current_provider(&self) -> Option<Arc<dyn WalletEndpoint>> {
        self.ethereum.clone().or_else(|| self.legacy.clone())
    }
}

impl fmt::Debug for WalletEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletEnvironment")
            .field("ethereum", &self.ethereum.is_some())
            .field("legacy", &self.legacy.is_some())
            .finish()
    }
}

/// A wallet account able to authorize actions. Holds at least one account by construction.
#[derive(Clone)]
pub struct Signer {
    endpoint: Arc<dyn WalletEndpoint>,
    address: ChecksummedAddress,
}

impl Signer {
    async fn derive(endpoint: Arc<dyn WalletEndpoint>) -> Result<Self, WalletError> {
        let accounts = endpoint.accounts().await?;
        let address = accounts.first().copied().ok_or(WalletError::NoAccount)?;
        Ok(Self {
            endpoint,
            address: address.into(),
        })
    }

    /// The account reported when the signer was derived.
    pub fn address(&self) -> ChecksummedAddress {
        self.address
    }

    /// Asks the wallet for its active account, falling back to the derived one.
    pub async fn current_address(&self) -> ChecksummedAddress {
        match self.endpoint.accounts().await {
            Ok(accounts) => accounts
                .first()
                .copied()
                .map(ChecksummedAddress::from)
                .unwrap_or(self.address),
            Err(err) => {
                tracing::debug!(error = %err, "signer account query failed");
                self.address
            }
        }
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub address: ChecksummedAddress,
    pub display_name: Option<String>,
}

impl Identity {
    /// What to show for this account: its ENS name when it has one.
    pub fn label(&self) -> String {
        self.display_name
            .clone()
            .unwrap_or_else(|| self.address.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct Connection {
    pub signer: Signer,
    pub identity: Identity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectMode {
    Silent,
    Requested,
}

#[derive(Debug, Clone, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting {
        previous: Option<Box<Connection>>,
    },
    Connected(Connection),
}

impl ConnectionState {
    pub fn begin(&mut self) {
        let previous = match std::mem::take(self) {
            ConnectionState::Connected(connection) => Some(Box::new(connection)),
            ConnectionState::Connecting { previous } => previous,
            ConnectionState::Disconnected => None,
        };
        *self = ConnectionState::Connecting { previous };
    }

    /// A failed attempt restores whatever was there before [`begin`](Self::begin).
    pub fn finish(&mut self, outcome: Option<Connection>) {
        let previous = match std::mem::take(self) {
            ConnectionState::Connecting { previous } => previous,
            ConnectionState::Connected(connection) => Some(Box::new(connection)),
            ConnectionState::Disconnected => None,
        };
        *self = match outcome.or_else(|| previous.map(|boxed| *boxed)) {
            Some(connection) => ConnectionState::Connected(connection),
            None => ConnectionState::Disconnected,
        };
    }

    pub fn is_connecting(&self) -> bool {
        matches!(self, ConnectionState::Connecting { .. })
    }

    /// The usable connection, including the one kept alive during a reconnect attempt.
    pub fn connection(&self) -> Option<&Connection> {
        match self {
            ConnectionState::Connected(connection) => Some(connection),
            ConnectionState::Connecting { previous } => previous.as_deref(),
            ConnectionState::Disconnected => None,
        }
    }
}

/// Builds the read provider. Failing here leaves the session unusable.
pub async fn init_read_provider(settings: &Settings) -> Result<Arc<dyn ReadProvider>> {
    let provider = RpcReadProvider::connect(&settings.rpc_url)
        .await
        .wrap_err("failed to initialize the read provider")?;
    tracing::info!(url = provider.endpoint(), "read provider ready");
    Ok(Arc::new(provider))
}

/// Derives a signer from already-granted wallet access without prompting.
pub async fn try_silent_connect(wallets: &WalletEnvironment) -> Option<Signer> {
    let endpoint = wallets.current_provider()?;
    match Signer::derive(endpoint).await {
        Ok(signer) => Some(signer),
        Err(err) => {
            tracing::debug!(error = %err, "silent wallet connect skipped");
            None
        }
    }
}

/// User-initiated connect. A modern wallet is asked for authorization first.
pub async fn request_connect(wallets: &WalletEnvironment) -> Option<Signer> {
    if let Some(ethereum) = wallets.ethereum.as_ref() {
        if let Err(err) = ethereum.request_accounts().await {
            tracing::info!(error = %err, "wallet authorization not granted");
            return None;
        }
    }
    try_silent_connect(wallets).await
}

pub async fn derive_identity(signer: &Signer, provider: &dyn ReadProvider) -> Identity {
    let address = signer.current_address().await;
    let display_name = match provider.lookup_address(address.as_address()).await {
        Ok(name) => name,
        Err(err) => {
            tracing::debug!(%address, error = %err, "reverse lookup failed");
            None
        }
    };
    Identity {
        address,
        display_name,
    }
}

/// Full connect flow: signer, then identity.
pub async fn connect_signer(
    mode: ConnectMode,
    wallets: &WalletEnvironment,
    provider: &dyn ReadProvider,
) -> Option<Connection> {
    let signer = match mode {
        ConnectMode::Silent => try_silent_connect(wallets).await,
        ConnectMode::Requested => request_connect(wallets).await,
    }?;
    let identity = derive_identity(&signer, provider).await;
    tracing::info!(address = %identity.address, name = ?identity.display_name, "wallet connected");
    Some(Connection { signer, identity })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::testing::{ScriptedWallet, StaticProvider};
    use alloy::primitives::address;

    const ALICE: Address = address!("5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
    const BOB: Address = address!("fB6916095ca1df60bB79Ce92cE3Ea74c37c5d359");

    fn env(
        ethereum: Option<ScriptedWallet>,
        legacy: Option<ScriptedWallet>,
    ) -> WalletEnvironment {
        WalletEnvironment {
            ethereum: ethereum.map(|w| Arc::new(w) as Arc<dyn WalletEndpoint>),
            legacy: legacy.map(|w| Arc::new(w) as Arc<dyn WalletEndpoint>),
        }
    }

    async fn connected(address: Address) -> Connection {
        let wallets = env(Some(ScriptedWallet::authorized(vec![address])), None);
        let provider = StaticProvider::default();
        connect_signer(ConnectMode::Silent, &wallets, &provider)
            .await
            .expect("connection")
    }

    #[tokio::test]
    async fn silent_connect_without_wallet_is_none() {
        assert!(try_silent_connect(&WalletEnvironment::default()).await.is_none());
        assert!(request_connect(&WalletEnvironment::default()).await.is_none());
    }

    #[tokio::test]
    async fn silent_connect_uses_granted_accounts() {
        let wallets = env(None, Some(ScriptedWallet::authorized(vec![ALICE, BOB])));
        let signer = try_silent_connect(&wallets).await.expect("signer");
        assert_eq!(signer.address().as_address(), ALICE);
    }

    #[tokio::test]
    async fn silent_connect_never_prompts() {
        let wallet = Arc::new(ScriptedWallet::locked(vec![ALICE]));
        let wallets = WalletEnvironment {
            ethereum: Some(wallet.clone()),
            legacy: None,
        };
        assert!(try_silent_connect(&wallets).await.is_none());
        assert_eq!(wallet.prompts(), 0);
    }

    #[tokio::test]
    async fn silent_connect_swallows_transport_errors() {
        let wallets = env(Some(ScriptedWallet::broken()), None);
        assert!(try_silent_connect(&wallets).await.is_none());
    }

    #[tokio::test]
    async fn request_connect_prompts_then_derives() {
        let wallet = Arc::new(ScriptedWallet::locked(vec![BOB]));
        let wallets = WalletEnvironment {
            ethereum: Some(wallet.clone()),
            legacy: None,
        };
        let signer = request_connect(&wallets).await.expect("signer");
        assert_eq!(signer.address().as_address(), BOB);
        assert_eq!(wallet.prompts(), 1);
        assert_eq!(wallet.calls(), vec!["eth_requestAccounts", "eth_accounts"]);
    }

    #[tokio::test]
    async fn request_connect_falls_back_to_legacy() {
        let wallets = env(None, Some(ScriptedWallet::authorized(vec![ALICE])));
        let signer = request_connect(&wallets).await.expect("signer");
        assert_eq!(signer.address().as_address(), ALICE);
    }

    #[tokio::test]
    async fn rejected_request_leaves_state_untouched() {
        let wallets = env(Some(ScriptedWallet::rejecting(vec![BOB])), None);
        let provider = StaticProvider::default();
        let mut state = ConnectionState::default();

        state.begin();
        let outcome = connect_signer(ConnectMode::Requested, &wallets, &provider).await;
        assert!(outcome.is_none());
        state.finish(outcome);

        assert!(matches!(state, ConnectionState::Disconnected));
    }

    #[tokio::test]
    async fn rejected_reconnect_keeps_previous_connection() {
        let mut state = ConnectionState::Connected(connected(ALICE).await);

        state.begin();
        assert!(state.is_connecting());
        assert_eq!(
            state.connection().map(|c| c.identity.address.as_address()),
            Some(ALICE)
        );
        state.finish(None);

        let identity = &state.connection().expect("still connected").identity;
        assert_eq!(identity.address.as_address(), ALICE);
        assert!(!state.is_connecting());
    }

    #[tokio::test]
    async fn empty_account_list_is_not_a_signer() {
        let wallets = env(Some(ScriptedWallet::authorized(Vec::new())), None);
        assert!(request_connect(&wallets).await.is_none());
    }

    #[tokio::test]
    async fn identity_carries_verified_reverse_name() {
        let wallets = env(Some(ScriptedWallet::authorized(vec![ALICE])), None);
        let provider = StaticProvider::default().with_reverse(ALICE, "alice.eth");
        let signer = try_silent_connect(&wallets).await.unwrap();

        let identity = derive_identity(&signer, &provider).await;

        assert_eq!(identity.display_name.as_deref(), Some("alice.eth"));
        assert_eq!(identity.label(), "alice.eth");
    }

    #[tokio::test]
    async fn identity_without_reverse_name_uses_address() {
        let wallets = env(Some(ScriptedWallet::authorized(vec![ALICE])), None);
        let signer = try_silent_connect(&wallets).await.unwrap();

        let identity = derive_identity(&signer, &StaticProvider::failing()).await;

        assert_eq!(identity.display_name, None);
        assert_eq!(identity.label(), "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
    }

    mod rpc {
        use super::*;
        use alloy::{providers::mock::Asserter, rpc::json_rpc::ErrorPayload};

        fn rpc_error(code: i64, message: &str) -> ErrorPayload {
            serde_json::from_value(serde_json::json!({ "code": code, "message": message }))
                .expect("error payload")
        }

        fn mocked() -> (RpcWallet, Asserter) {
            let asserter = Asserter::new();
            let provider = ProviderBuilder::new()
                .connect_mocked_client(asserter.clone())
                .erased();
            (RpcWallet::from_provider(provider), asserter)
        }

        #[tokio::test]
        async fn authorized_accounts_come_back_in_order() {
            let (wallet, asserter) = mocked();
            asserter.push_success(&vec![ALICE, BOB]);

            assert_eq!(wallet.accounts().await.unwrap(), vec![ALICE, BOB]);
        }

        #[tokio::test]
        async fn granted_request_returns_accounts() {
            let (wallet, asserter) = mocked();
            asserter.push_success(&vec![ALICE]);

            assert_eq!(wallet.request_accounts().await.unwrap(), vec![ALICE]);
        }

        #[tokio::test]
        async fn user_rejection_maps_to_rejected() {
            let (wallet, asserter) = mocked();
            asserter.push_failure(rpc_error(4001, "User rejected the request."));

            let err = wallet.request_accounts().await.unwrap_err();
            assert!(
                matches!(&err, WalletError::Rejected(message) if message == "User rejected the request."),
                "{err}"
            );
        }

        #[tokio::test]
        async fn other_rpc_errors_stay_transport_errors() {
            let (wallet, asserter) = mocked();
            asserter.push_failure(rpc_error(-32601, "method not found"));

            let err = wallet.request_accounts().await.unwrap_err();
            assert!(matches!(err, WalletError::Transport(_)), "{err}");
        }

        #[tokio::test]
        async fn rejected_rpc_prompt_yields_no_signer() {
            let (wallet, asserter) = mocked();
            asserter.push_failure(rpc_error(4001, "User rejected the request."));
            let wallets = WalletEnvironment {
                ethereum: Some(Arc::new(wallet)),
                legacy: None,
            };

            assert!(request_connect(&wallets).await.is_none());
        }
    }
}
