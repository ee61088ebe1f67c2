//! # Presence Core
//!
//! The ticking and broadcast engine. A [`engine::TickerEngine`] drives a
//! [`scheduler::Scheduler`] that runs one discovery attempt at a time, turns
//! each result into a normalized roster and fans it out through the
//! [`hub::BroadcastHub`] and the optional [`forward::Forwarder`].
//!
//! The concrete outbound adapters live next to the engine:
//! [`scanner::ArpScanner`], [`discovery::DiscoveryService`],
//! [`system::SystemRepo`] and [`vendors::MacOuiRepo`].

pub mod discovery;
pub mod engine;
pub mod forward;
pub mod gate;
pub mod hub;
pub mod normalize;
pub mod scanner;
pub mod scheduler;
pub mod system;
pub mod vendors;
