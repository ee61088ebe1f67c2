//! Concrete discovery mechanisms implementing
//! [`presence_common::scanning::NetworkScanner`].

mod arp_scan;

pub use arp_scan::{ArpScanner, parse_output};
