use std::num::NonZeroU64;

use persimmon_proto::{QueueGroup, Subject, SubscriptionId};
use tokio::sync::oneshot;

/// A wire-level operation the client asks its transport to perform
///
/// [`ClientBuilder::build`] hands out the receiving half of the command
/// channel; the transport drains it and writes the corresponding
/// operation to the server. Inbound traffic flows the other way through
/// [`Client::process_message`] and [`Client::process_connection_closed`].
///
/// [`ClientBuilder::build`]: crate::ClientBuilder::build
/// [`Client::process_message`]: crate::Client::process_message
/// [`Client::process_connection_closed`]: crate::Client::process_connection_closed
#[derive(Debug)]
pub enum HandlerCommand {
    /// Register interest in `subject` with the server
    Subscribe {
        id: SubscriptionId,
        subject: Subject,
        queue_group: Option<QueueGroup>,
    },
    /// Remove interest, immediately or after `max_messages` further
    /// deliveries
    Unsubscribe {
        id: SubscriptionId,
        max_messages: Option<NonZeroU64>,
    },
    /// Flush outstanding writes, stop reading commands and complete the
    /// acknowledgement
    Close(oneshot::Sender<()>),
}
