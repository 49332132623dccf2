use std::collections::VecDeque;

use persimmon_proto::Message;

/// FIFO of messages pending delivery, owned by a single subscription
///
/// The list has no capacity of its own; the enqueuing side enforces the
/// subscription's pending limit. Accessed with the subscription lock
/// held.
#[derive(Debug, Default)]
pub(crate) struct MessageList {
    messages: VecDeque<Message>,
}

impl MessageList {
    pub(crate) fn new() -> Self {
        Self {
            messages: VecDeque::new(),
        }
    }

    pub(crate) fn enqueue(&mut self, message: Message) {
        self.messages.push_back(message);
    }

    pub(crate) fn dequeue(&mut self) -> Option<Message> {
        self.messages.pop_front()
    }

    /// Free every message still queued
    pub(crate) fn clear(&mut self) {
        self.messages.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.messages.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
