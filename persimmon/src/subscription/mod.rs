use std::{num::NonZeroU64, sync::Arc, time::Duration};

use parking_lot::Mutex;
use persimmon_proto::{Message, QueueGroup, Subject, SubscriptionId};
use tokio::{
    sync::Notify,
    time::{self, Instant},
};
use tracing::warn;

use self::list::MessageList;
use crate::{client::Client, error::Error, timer::Timer};

mod list;
pub(crate) mod signal;
pub(crate) mod worker;

/// A subscription to a subject
///
/// Messages matching the subject are queued by the network reader and
/// consumed either through the callback the subscription was created
/// with ([`Client::subscribe`]) or by pulling them one at a time with
/// [`Subscription::next_message`] ([`Client::subscribe_sync`]). A
/// subscription is one or the other for its whole life.
///
/// Dropping the handle unsubscribes. An in-flight callback keeps
/// running to completion because the delivery worker owns its own
/// reference to the subscription state.
#[derive(Debug)]
pub struct Subscription {
    shared: Arc<SubscriptionShared>,
}

/// Whether messages are delivered through a callback or pulled
#[derive(Debug, Copy, Clone)]
pub(crate) enum SubscriptionKind {
    Async,
    Sync,
}

#[derive(Debug)]
pub(crate) struct SubscriptionShared {
    pub(crate) id: SubscriptionId,
    pub(crate) subject: Subject,
    pub(crate) queue_group: Option<QueueGroup>,
    pub(crate) kind: SubscriptionKind,
    pub(crate) client: Client,
    pub(crate) state: Mutex<SubscriptionState>,
    pub(crate) signal: Notify,
}

#[derive(Debug)]
pub(crate) struct SubscriptionState {
    pub(crate) list: MessageList,
    /// Messages handed to the consumer so far
    pub(crate) delivered: u64,
    /// Messages discarded after the pending limit was hit
    pub(crate) dropped: u64,
    /// Delivery limit, `0` meaning unlimited
    pub(crate) max: u64,
    pub(crate) pending_limit: usize,
    /// 75% of `pending_limit`; crossing it promotes the signal timer
    /// into fast mode
    pub(crate) signal_limit: usize,
    pub(crate) no_delay: bool,
    /// Number of tasks currently waiting on `signal`
    pub(crate) in_wait: usize,
    pub(crate) closed: bool,
    pub(crate) conn_closed: bool,
    pub(crate) slow_consumer: bool,
    pub(crate) signal_timer: Option<Timer>,
    pub(crate) signal_timer_interval: Duration,
}

impl SubscriptionShared {
    pub(crate) fn new(
        id: SubscriptionId,
        subject: Subject,
        queue_group: Option<QueueGroup>,
        kind: SubscriptionKind,
        client: Client,
        pending_limit: usize,
        no_delay: bool,
    ) -> Self {
        Self {
            id,
            subject,
            queue_group,
            kind,
            client,
            state: Mutex::new(SubscriptionState {
                list: MessageList::new(),
                delivered: 0,
                dropped: 0,
                max: 0,
                pending_limit,
                signal_limit: pending_limit.saturating_mul(3) / 4,
                no_delay,
                in_wait: 0,
                closed: false,
                conn_closed: false,
                slow_consumer: false,
                signal_timer: None,
                signal_timer_interval: signal::SIGNAL_TIMER_SLOW,
            }),
            signal: Notify::new(),
        }
    }

    /// Queue an inbound message, the upcall of the network reader
    ///
    /// A subscription whose pending queue is full is marked as a slow
    /// consumer and the message is discarded. Otherwise the waiter is
    /// either signaled directly (`no_delay`, or the queue was empty) or
    /// left to the signal timer.
    pub(crate) fn push_message(&self, message: Message) {
        let mut state = self.state.lock();
        if state.closed {
            return;
        }

        if state.list.len() >= state.pending_limit {
            state.slow_consumer = true;
            state.dropped += 1;
            drop(state);
            warn!(subscription = %self.id, "pending queue full, dropping message");
            return;
        }

        let was_empty = state.list.is_empty();
        state.list.enqueue(message);

        if state.no_delay {
            drop(state);
            self.signal.notify_waiters();
        } else if was_empty {
            signal::fast_mode(&mut state);
            drop(state);
            self.signal.notify_waiters();
        } else if state.list.len() >= state.signal_limit {
            signal::fast_mode(&mut state);
        }
    }

    /// The one terminal transition
    ///
    /// Stops the signal timer, frees pending messages and wakes both
    /// the delivery worker and any blocked pull. Idempotent.
    pub(crate) fn close(&self, conn_closed: bool) {
        let timer = {
            let mut state = self.state.lock();
            if state.closed {
                return;
            }
            state.closed = true;
            state.conn_closed = conn_closed;
            state.list.clear();
            state.signal_timer.take()
        };

        if let Some(timer) = timer {
            timer.stop();
        }
        self.signal.notify_waiters();
    }
}

impl Subscription {
    pub(crate) fn new(shared: Arc<SubscriptionShared>) -> Self {
        Self { shared }
    }

    /// The client-assigned identifier of this subscription
    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.shared.id
    }

    /// The subject this subscription is interested in
    #[must_use]
    pub fn subject(&self) -> &Subject {
        &self.shared.subject
    }

    /// The queue group this subscription is part of, if any
    #[must_use]
    pub fn queue_group(&self) -> Option<&QueueGroup> {
        self.shared.queue_group.as_ref()
    }

    /// Returns `true` while the subscription can still receive messages
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.shared.state.lock().closed
    }

    /// Number of messages queued and not yet consumed
    ///
    /// # Errors
    ///
    /// It returns an error if the subscription has been closed.
    pub fn queued_messages(&self) -> Result<usize, Error> {
        let state = self.shared.state.lock();
        if state.closed {
            return Err(Error::InvalidSubscription);
        }
        Ok(state.list.len())
    }

    /// Number of messages handed to the consumer so far
    #[must_use]
    pub fn delivered(&self) -> u64 {
        self.shared.state.lock().delivered
    }

    /// Number of messages dropped after the pending limit was exceeded
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.shared.state.lock().dropped
    }

    /// Signal the consumer on every enqueue instead of batching wakeups
    ///
    /// Stops the coalescing signal timer for good. Useful on
    /// request/reply paths where latency matters more than the cost of
    /// one wakeup per message.
    ///
    /// Calling this method multiple times is a NOOP.
    pub fn no_delivery_delay(&self) {
        let timer = {
            let mut state = self.shared.state.lock();
            if state.no_delay {
                return;
            }
            state.no_delay = true;
            state.signal_timer.take()
        };

        if let Some(timer) = timer {
            timer.stop();
        }
    }

    /// Pull the next message, waiting up to `timeout`
    ///
    /// The deadline is computed from the first wait, not restarted on
    /// every wakeup. With a `timeout` of [`Duration::ZERO`] the call
    /// never suspends: it either returns an already queued message or
    /// fails with [`Error::Timeout`].
    ///
    /// Only valid on subscriptions created without a callback.
    ///
    /// # Errors
    ///
    /// It returns an error if the connection or the subscription has
    /// been closed, if the subscription delivers through a callback, if
    /// the network reader had to drop messages, or if no message became
    /// available in time. A subscription that closed by reaching its
    /// [`Subscription::auto_unsubscribe`] limit keeps reporting
    /// [`Error::MaxDeliveredMessages`] rather than
    /// [`Error::InvalidSubscription`].
    pub async fn next_message(&self, timeout: Duration) -> Result<Message, Error> {
        let shared = &self.shared;
        let mut deadline = None;
        let mut timed_out = false;

        loop {
            let notified = shared.signal.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = shared.state.lock();
                if state.conn_closed {
                    return Err(Error::ConnectionClosed);
                }
                if state.closed {
                    return Err(if state.max > 0 && state.delivered >= state.max {
                        Error::MaxDeliveredMessages
                    } else {
                        Error::InvalidSubscription
                    });
                }
                if matches!(shared.kind, SubscriptionKind::Async) {
                    return Err(Error::IllegalState);
                }
                if state.slow_consumer {
                    // Consumed once per incident
                    state.slow_consumer = false;
                    return Err(Error::SlowConsumer);
                }

                if let Some(message) = state.list.dequeue() {
                    state.delivered += 1;
                    if state.max > 0 && state.delivered > state.max {
                        return Err(Error::MaxDeliveredMessages);
                    }
                    let remove = state.max > 0 && state.delivered == state.max;
                    drop(state);

                    if remove {
                        shared.client.remove_subscription(shared.id, true);
                    }
                    return Ok(message);
                }

                if timeout.is_zero() || timed_out {
                    return Err(Error::Timeout);
                }

                state.in_wait += 1;
            }

            let deadline = *deadline.get_or_insert_with(|| Instant::now() + timeout);
            timed_out = time::timeout_at(deadline, notified).await.is_err();
            shared.state.lock().in_wait -= 1;
        }
    }

    /// Stop receiving messages
    ///
    /// The subscription closes immediately; messages still queued are
    /// freed without being delivered.
    ///
    /// # Errors
    ///
    /// It returns an error if the connection or the subscription has
    /// already been closed.
    pub async fn unsubscribe(&self) -> Result<(), Error> {
        self.unsubscribe_with(None).await
    }

    /// Stop receiving messages once `max` have been delivered
    ///
    /// The subscription closes by itself when the limit is reached. If
    /// `max` messages have already been delivered it closes right away.
    ///
    /// # Errors
    ///
    /// It returns an error if the connection or the subscription has
    /// already been closed.
    pub async fn auto_unsubscribe(&self, max: NonZeroU64) -> Result<(), Error> {
        self.unsubscribe_with(Some(max)).await
    }

    async fn unsubscribe_with(&self, max_messages: Option<NonZeroU64>) -> Result<(), Error> {
        {
            let state = self.shared.state.lock();
            if state.conn_closed {
                return Err(Error::ConnectionClosed);
            }
            if state.closed {
                return Err(Error::InvalidSubscription);
            }
        }

        self.shared.client.unsubscribe(&self.shared, max_messages).await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.shared.state.lock().closed {
            return;
        }

        self.shared.client.lazy_unsubscribe(self.shared.id);
    }
}
