use tokio::sync::mpsc;

#[cfg(feature = "from-env")]
use super::from_env::FromEnv;
use crate::{handler::HandlerCommand, Client};

const DEFAULT_PENDING_MESSAGES_LIMIT: usize = 65_536;

/// A builder for [`Client`]
///
/// Obtained from [`Client::builder`].
#[derive(Debug)]
pub struct ClientBuilder {
    pub(crate) pending_messages_limit: usize,
    pub(crate) no_delivery_delay: bool,
}

impl ClientBuilder {
    pub(super) fn new() -> Self {
        Self {
            pending_messages_limit: DEFAULT_PENDING_MESSAGES_LIMIT,
            no_delivery_delay: false,
        }
    }

    /// Construct [`ClientBuilder`] from environment variables
    ///
    /// Reads the following environment variables into [`ClientBuilder`]:
    ///
    /// * `PERSIMMON_PENDING_MESSAGES_LIMIT`: per subscription pending
    ///   queue bound
    /// * `PERSIMMON_NO_DELIVERY_DELAY`: signal on every enqueue instead
    ///   of coalescing wakeups
    ///
    /// # Panics
    ///
    /// It panics if an environment variable is present but cannot be
    /// parsed.
    #[cfg(feature = "from-env")]
    #[must_use]
    pub fn from_env() -> Self {
        let env = envy::prefixed("PERSIMMON_")
            .from_env::<FromEnv>()
            .expect("FromEnv deserialization error");

        let mut this = Self::new();

        if let Some(pending_messages_limit) = env.pending_messages_limit {
            this = this.pending_messages_limit(pending_messages_limit);
        }

        if let Some(no_delivery_delay) = env.no_delivery_delay {
            this = this.no_delivery_delay(no_delivery_delay);
        }

        this
    }

    /// Bound the number of messages queued per subscription
    ///
    /// A subscription whose pending queue reaches this limit is marked
    /// as a slow consumer and further messages are dropped until the
    /// queue drains. The bound is advisory: it detects a consumer that
    /// cannot keep up, it does not apply backpressure to the server.
    ///
    /// Default: 65536
    #[must_use]
    pub fn pending_messages_limit(mut self, pending_messages_limit: usize) -> Self {
        self.pending_messages_limit = pending_messages_limit;
        self
    }

    /// Signal the consumer on every enqueue instead of batching wakeups
    ///
    /// New subscriptions skip the coalescing signal timer entirely,
    /// trading one wakeup per message for lower delivery latency.
    ///
    /// Default: `false`
    #[must_use]
    pub fn no_delivery_delay(mut self, no_delivery_delay: bool) -> Self {
        self.no_delivery_delay = no_delivery_delay;
        self
    }

    /// Create the [`Client`] and the command stream its transport drains
    #[must_use]
    pub fn build(self) -> (Client, mpsc::Receiver<HandlerCommand>) {
        Client::build(self)
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
