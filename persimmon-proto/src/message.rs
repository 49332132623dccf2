use bytes::Bytes;

use crate::Subject;

/// A message received from, or destined to, the server
///
/// Ownership moves with the message: the network reader hands it to the
/// subscription it matched, and the subscription hands it to whoever
/// consumes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub subject: Subject,
    pub reply_subject: Option<Subject>,
    pub payload: Bytes,
}

impl Message {
    /// Construct a message with no reply subject
    #[must_use]
    pub fn new(subject: Subject, payload: Bytes) -> Self {
        Self {
            subject,
            reply_subject: None,
            payload,
        }
    }
}
