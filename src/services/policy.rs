use std::fmt;

/// Shown verbatim to a sender whose message tripped the denylist.
pub const SAFETY_MESSAGE: &str =
    "Safety Alert: For your protection, please keep all communication and payments within the app.";

/// Pluggable moderation seam for outgoing message text. The messaging core
/// only knows that a policy can reject text with a user-facing reason.
pub trait ContentPolicy: Send + Sync + fmt::Debug {
    /// Returns the rejection reason when `text` violates the policy.
    fn violation(&self, text: &str) -> Option<String>;
}

/// Case-insensitive substring match against a fixed list of off-platform
/// contact and payment terms.
#[derive(Debug, Clone)]
pub struct StaticDenylist {
    terms: Vec<String>,
}

impl StaticDenylist {
    #[must_use]
    pub fn new(terms: &[String]) -> Self {
        Self { terms: terms.iter().map(|t| t.trim().to_lowercase()).filter(|t| !t.is_empty()).collect() }
    }
}

impl ContentPolicy for StaticDenylist {
    fn violation(&self, text: &str) -> Option<String> {
        let lowered = text.to_lowercase();
        if self.terms.iter().any(|term| lowered.contains(term)) {
            Some(SAFETY_MESSAGE.to_string())
        } else {
            None
        }
    }
}
