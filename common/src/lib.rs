//! # Presence Common
//!
//! Shared models, configuration, errors and port traits used by the presence
//! engine and its adapters.
//!
//! * **[`network`]**: host records, MAC handling and interface helpers.
//! * **[`config`]**: the immutable options an engine instance runs with.
//! * **[`error`]**: the error taxonomy shared by every stage of a tick.
//! * **[`scanning`]**, **[`system`]**, **[`vendors`]**: traits implemented by the
//!   outbound adapters in `presence-core`.

pub mod config;
pub mod error;
pub mod network;
pub mod scanning;
pub mod system;
pub mod vendors;
