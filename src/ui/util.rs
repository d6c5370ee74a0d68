use crate::app::address::ChecksummedAddress;

/// `0x5aAe...eAed`, keeping the checksum casing.
pub fn short_address(address: &ChecksummedAddress) -> String {
    let full = address.to_checksum();
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::address::validate;

    #[test]
    fn keeps_checksum_casing() {
        let address = validate("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").unwrap();
        assert_eq!(short_address(&address), "0x5aAe...eAed");
    }
}
