use alloy::primitives::Address;
use std::{fmt, str::FromStr};

/// A 20-byte account address that always renders in its EIP-55 checksummed form.
///
/// The only ways to obtain one are [`validate`] or an already-typed [`Address`],
/// so a value of this type never carries unvalidated text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChecksummedAddress(Address);

impl ChecksummedAddress {
    pub fn as_address(&self) -> Address {
        self.0
    }

    pub fn to_checksum(&self) -> String {
        self.0.to_checksum(None)
    }
}

impl From<Address> for ChecksummedAddress {
    fn from(value: Address) -> Self {
        Self(value)
    }
}

impl fmt::Display for ChecksummedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

/// Canonicalizes a literal hex address.
///
/// Casing is informative only: a mixed-case string with a wrong checksum is
/// accepted and re-checksummed, as long as the digits themselves are valid hex.
pub fn validate(text: &str) -> Option<ChecksummedAddress> {
    let digits = text.strip_prefix("0x").unwrap_or(text);
    if digits.len() != 40 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    Address::from_str(digits).ok().map(ChecksummedAddress)
}
