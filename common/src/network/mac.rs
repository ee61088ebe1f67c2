use pnet::util::MacAddr;

/// Canonical form of a hardware address: uppercase hex pairs joined by colons.
pub fn canonical(mac: MacAddr) -> String {
    mac.to_string().to_uppercase()
}

/// Parses a colon separated address in any letter case.
pub fn parse(raw: &str) -> Option<MacAddr> {
    raw.trim().parse::<MacAddr>().ok()
}
