/// An error returned by a [`Client`] or [`Subscription`] operation
///
/// Errors are plain status tags: none of them latches into the
/// subscription, with the exception of the slow consumer condition,
/// which is recorded when the network reader drops messages and
/// reported to the next [`Subscription::next_message`] call.
///
/// [`Client`]: crate::Client
/// [`Subscription`]: crate::Subscription
/// [`Subscription::next_message`]: crate::Subscription::next_message
#[derive(Debug, thiserror::Error)]
#[cfg_attr(test, derive(PartialEq, Eq))]
#[non_exhaustive]
pub enum Error {
    /// The subscription has been closed
    #[error("invalid subscription")]
    InvalidSubscription,
    /// The connection has been closed
    #[error("connection closed")]
    ConnectionClosed,
    /// The operation is not supported by this kind of subscription
    #[error("operation not supported by this subscription")]
    IllegalState,
    /// Messages were dropped because the pending queue hit its limit
    #[error("slow consumer, messages dropped")]
    SlowConsumer,
    /// No message became available in time
    #[error("timed out waiting for a message")]
    Timeout,
    /// The subscription reached its delivery limit
    #[error("maximum number of delivered messages reached")]
    MaxDeliveredMessages,
}
