//! Decides whether a discovery pass is worth running this tick.

/// True when somebody will consume the roster: at least one subscriber is
/// attached, or a forwarding sink is configured.
pub fn should_discover(subscribers: usize, forwarding: bool) -> bool {
    subscribers > 0 || forwarding
}
