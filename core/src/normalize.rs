//! # Host Record Normalizer
//!
//! Turns raw scanner output into a [`Roster`]: validated, deduplicated by MAC,
//! augmented with the self-record and sorted by IP.

use std::collections::HashSet;
use std::net::Ipv4Addr;

use presence_common::error::DiscoveryError;
use presence_common::network::host::{
    HostRecord, RawHost, Roster, UNKNOWN_VENDOR, ip_sort_key, now_millis,
};
use presence_common::network::mac;

/// Builds the roster for one tick.
///
/// The first record seen for a MAC wins. The self-record takes precedence
/// over anything the scanner reported for the local hardware address.
pub fn normalize(raw: Vec<RawHost>, local: HostRecord) -> Result<Roster, DiscoveryError> {
    let records = parse_hosts(raw)?;

    let mut seen: HashSet<String> = HashSet::with_capacity(records.len() + 1);
    seen.insert(local.mac.to_uppercase());

    let mut roster: Roster = records
        .into_iter()
        .filter(|record| seen.insert(record.mac.clone()))
        .collect();
    roster.push(local);

    roster.sort_by_key(|record| ip_sort_key(&record.ip));
    for record in roster.iter_mut() {
        record.mac.make_ascii_uppercase();
    }

    Ok(roster)
}

/// Validates every raw host. A single malformed record rejects the whole
/// batch so a partial roster is never published.
pub fn parse_hosts(raw: Vec<RawHost>) -> Result<Vec<HostRecord>, DiscoveryError> {
    let now = now_millis();
    raw.into_iter().map(|host| parse_host(host, now)).collect()
}

fn parse_host(host: RawHost, now: u64) -> Result<HostRecord, DiscoveryError> {
    let raw_mac = host.mac.ok_or(DiscoveryError::MissingField("mac"))?;
    let raw_ip = host.ip.ok_or(DiscoveryError::MissingField("ip"))?;

    let mac = mac::parse(&raw_mac).ok_or_else(|| DiscoveryError::Malformed {
        field: "mac",
        value: raw_mac.clone(),
    })?;
    let ip: Ipv4Addr = raw_ip
        .trim()
        .parse()
        .map_err(|_| DiscoveryError::Malformed {
            field: "ip",
            value: raw_ip.clone(),
        })?;

    Ok(HostRecord {
        mac: mac::canonical(mac),
        ip,
        vendor: host
            .vendor
            .filter(|vendor| !vendor.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_VENDOR.to_string()),
        timestamp: host.timestamp.unwrap_or(now),
    })
}
