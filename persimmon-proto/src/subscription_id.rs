use std::fmt::{self, Display};

/// The client-assigned identifier of a subscription
///
/// Allocated by the client when the subscription is created and used by
/// the server to route matching messages back to it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub const MIN: Self = SubscriptionId(1);
    pub const MAX: Self = SubscriptionId(u64::MAX);
}

impl From<u64> for SubscriptionId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<SubscriptionId> for u64 {
    fn from(value: SubscriptionId) -> Self {
        value.0
    }
}

impl Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}
