//! Redirect hook for the "not configured" condition.

/// Receives requests to send the operator to the configuration screen.
///
/// Missing credentials are never reported through result channels; they
/// go here instead.
pub trait Navigator: Send + Sync {
    fn redirect_to_config(&self, reason: &str);
}
