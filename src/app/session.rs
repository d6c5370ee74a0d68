use super::{address::ChecksummedAddress, wallet::Identity};

/// Identifies one resolution request; only the ticket for the latest edit may land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionTicket {
    pub version: u64,
    pub text: String,
}

/// The address input and the address it currently resolves to.
#[derive(Debug, Default)]
pub struct InputSession {
    raw_text: String,
    resolved_address: Option<ChecksummedAddress>,
    version: u64,
    settled_version: u64,
}

impl InputSession {
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn resolved_address(&self) -> Option<ChecksummedAddress> {
        self.resolved_address
    }

    /// True while the latest edit has not been answered yet.
    pub fn is_resolving(&self) -> bool {
        self.settled_version != self.version
    }

    /// Records the edit and hands back the ticket the caller resolves against.
    pub fn on_text_changed(&mut self, new_text: impl Into<String>) -> ResolutionTicket {
        self.raw_text = new_text.into();
        self.version += 1;
        ResolutionTicket {
            version: self.version,
            text: self.raw_text.clone(),
        }
    }

    /// Applies a finished resolution unless a later edit superseded it.
    pub fn apply_resolution(
        &mut self,
        ticket: &ResolutionTicket,
        result: Option<ChecksummedAddress>,
    ) -> bool {
        if ticket.version != self.version {
            tracing::trace!(
                stale = ticket.version,
                current = self.version,
                "dropping superseded resolution"
            );
            return false;
        }
        self.resolved_address = result;
        self.settled_version = ticket.version;
        true
    }

    pub fn seed_from_identity(&mut self, identity: &Identity) {
        self.raw_text = identity.label();
        self.resolved_address = Some(identity.address);
        self.version += 1;
        self.settled_version = self.version;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{address::validate, ens::resolve, testing::StaticProvider};
    use alloy::primitives::address;

    fn addr(text: &str) -> ChecksummedAddress {
        validate(text).unwrap()
    }

    #[test]
    fn latest_edit_wins_over_late_completion() {
        let mut session = InputSession::default();
        let a = session.on_text_changed("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed");
        let b = session.on_text_changed("0xfb6916095ca1df60bb79ce92ce3ea74c37c5d359");

        assert!(session.apply_resolution(&b, validate(&b.text)));
        assert!(!session.apply_resolution(&a, validate(&a.text)));

        assert_eq!(
            session.resolved_address(),
            Some(addr("0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359"))
        );
        assert_eq!(session.raw_text(), b.text);
        assert!(!session.is_resolving());
    }

    #[test]
    fn invalid_latest_edit_clears_address() {
        let mut session = InputSession::default();
        let a = session.on_text_changed("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed");
        assert!(session.apply_resolution(&a, validate(&a.text)));

        let b = session.on_text_changed("0x5aaeb6053f3e94c9b9a09f33669435e7ef1bea");
        assert!(session.is_resolving());
        assert!(session.resolved_address().is_some());

        assert!(session.apply_resolution(&b, validate(&b.text)));
        assert_eq!(session.resolved_address(), None);
    }

    #[test]
    fn early_completion_of_stale_edit_is_dropped() {
        let mut session = InputSession::default();
        let a = session.on_text_changed("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed");
        let b = session.on_text_changed("garbage");

        assert!(!session.apply_resolution(&a, validate(&a.text)));
        assert_eq!(session.resolved_address(), None);
        assert!(session.is_resolving());

        assert!(session.apply_resolution(&b, None));
        assert_eq!(session.resolved_address(), None);
    }

    #[test]
    fn seeding_prefers_display_name() {
        let mut session = InputSession::default();
        let identity = Identity {
            address: addr("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"),
            display_name: Some("alice.eth".into()),
        };

        session.seed_from_identity(&identity);

        assert_eq!(session.raw_text(), "alice.eth");
        assert_eq!(session.resolved_address(), Some(identity.address));
        assert!(!session.is_resolving());
    }

    #[test]
    fn seeding_without_name_shows_checksummed_address() {
        let mut session = InputSession::default();
        let identity = Identity {
            address: addr("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"),
            display_name: None,
        };

        session.seed_from_identity(&identity);

        assert_eq!(session.raw_text(), "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
    }

    #[test]
    fn seeding_supersedes_in_flight_resolution() {
        let mut session = InputSession::default();
        let pending = session.on_text_changed("0xfb6916095ca1df60bb79ce92ce3ea74c37c5d359");
        let identity = Identity {
            address: addr("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"),
            display_name: None,
        };

        session.seed_from_identity(&identity);

        assert!(!session.apply_resolution(&pending, validate(&pending.text)));
        assert_eq!(session.resolved_address(), Some(identity.address));
    }

    #[tokio::test]
    async fn out_of_order_tasks_respect_freshness() {
        let target = address!("d8dA6BF26964aF9D7eEd9e03E53415D37aA96045");
        let provider = std::sync::Arc::new(
            StaticProvider::default().with_name("vitalik.eth", target),
        );
        let mut session = InputSession::default();
        let slow_ticket = session.on_text_changed("vitalik.eth");
        let fast_ticket = session.on_text_changed("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed");

        let (release_slow, wait_slow) = tokio::sync::oneshot::channel::<()>();
        let slow = {
            let provider = provider.clone();
            let text = slow_ticket.text.clone();
            tokio::spawn(async move {
                let _ = wait_slow.await;
                resolve(&text, provider.as_ref()).await
            })
        };
        let fast = {
            let provider = provider.clone();
            let text = fast_ticket.text.clone();
            tokio::spawn(async move { resolve(&text, provider.as_ref()).await })
        };

        let fast_result = fast.await.unwrap();
        assert!(session.apply_resolution(&fast_ticket, fast_result));
        release_slow.send(()).unwrap();
        let slow_result = slow.await.unwrap();
        assert_eq!(slow_result.map(|a| a.as_address()), Some(target));
        assert!(!session.apply_resolution(&slow_ticket, slow_result));

        assert_eq!(
            session.resolved_address(),
            Some(addr("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"))
        );
    }
}
