//! Navigator subscriber trait

use super::NavigatorSnapshot;

/// Trait for components that refresh when the navigator changes state
pub trait NavigatorSubscriber: Send + Sync {
    /// Called after every operation that actually changed navigator state
    fn on_state_changed(&self, snapshot: &NavigatorSnapshot);
}
