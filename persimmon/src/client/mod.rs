use std::{collections::BTreeMap, future::Future, num::NonZeroU64, process::abort, sync::Arc};

use futures_core::future::BoxFuture;
use parking_lot::Mutex;
use persimmon_proto::{Message, QueueGroup, Subject, SubscriptionId};
use tokio::sync::{
    mpsc::{self, Permit},
    oneshot,
};
use tracing::{debug, trace};

pub use self::builder::ClientBuilder;
pub use self::quick_info::QuickInfo;
pub(crate) use self::quick_info::RawQuickInfo;
#[cfg(test)]
use self::tests::TestHandler;
use crate::{
    atomic::{AtomicU64, Ordering},
    error::Error,
    handler::HandlerCommand,
    subscription::{
        signal,
        worker::{self, MessageHandler},
        Subscription, SubscriptionKind, SubscriptionShared,
    },
};

mod builder;
mod quick_info;
#[cfg(test)]
pub(crate) mod tests;

#[cfg(feature = "from-env")]
pub(super) mod from_env;

const CLIENT_OP_CHANNEL_SIZE: usize = 512;

/// Handle to the subscription state of one connection
///
/// `Client` is a `Clone`able handle. It owns the subscription table and
/// the command channel towards the transport; the transport in turn
/// routes inbound messages back through [`Client::process_message`].
///
/// Subscriptions retain the client while they are alive, so the command
/// channel stays usable for as long as any subscription may need to
/// unsubscribe.
#[derive(Debug, Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

#[derive(Debug)]
struct ClientInner {
    sender: mpsc::Sender<HandlerCommand>,
    quick_info: Arc<RawQuickInfo>,
    next_subscription_id: AtomicU64,
    subscriptions: Mutex<BTreeMap<SubscriptionId, Arc<SubscriptionShared>>>,
    pending_messages_limit: usize,
    no_delivery_delay: bool,
}

impl Client {
    /// Construct a new client
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub(crate) fn build(builder: ClientBuilder) -> (Self, mpsc::Receiver<HandlerCommand>) {
        let (sender, receiver) = mpsc::channel(CLIENT_OP_CHANNEL_SIZE);

        let this = Self::new(builder, sender, Arc::new(RawQuickInfo::new()));
        (this, receiver)
    }

    #[cfg(test)]
    pub(crate) fn test(
        builder: ClientBuilder,
        client_to_handler_chan_size: usize,
    ) -> (Self, TestHandler) {
        let (sender, receiver) = mpsc::channel(client_to_handler_chan_size);
        let quick_info = Arc::new(RawQuickInfo::new());

        let this = Self::new(builder, sender, Arc::clone(&quick_info));
        let handler = TestHandler {
            receiver,
            quick_info,
        };
        (this, handler)
    }

    fn new(
        builder: ClientBuilder,
        sender: mpsc::Sender<HandlerCommand>,
        quick_info: Arc<RawQuickInfo>,
    ) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                sender,
                quick_info,
                next_subscription_id: AtomicU64::new(u64::from(SubscriptionId::MIN)),
                subscriptions: Mutex::new(BTreeMap::new()),
                pending_messages_limit: builder.pending_messages_limit,
                no_delivery_delay: builder.no_delivery_delay,
            }),
        }
    }

    /// Subscribe to `subject`, delivering messages through `handler`
    ///
    /// A worker task dedicated to this subscription hands every matching
    /// message to `handler` in arrival order. The returned future is
    /// awaited before the next message is delivered, and the
    /// subscription lock is never held while it runs.
    ///
    /// # Errors
    ///
    /// It returns an error if the client is closed.
    pub async fn subscribe<F, Fut>(
        &self,
        subject: Subject,
        handler: F,
    ) -> Result<Subscription, Error>
    where
        F: FnMut(Message) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.subscribe_inner(subject, None, Some(box_handler(handler)))
            .await
    }

    /// Subscribe to `subject` as part of `queue_group`, delivering
    /// messages through `handler`
    ///
    /// The server distributes each message to a single member of the
    /// queue group.
    ///
    /// # Errors
    ///
    /// It returns an error if the client is closed.
    pub async fn queue_subscribe<F, Fut>(
        &self,
        subject: Subject,
        queue_group: QueueGroup,
        handler: F,
    ) -> Result<Subscription, Error>
    where
        F: FnMut(Message) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.subscribe_inner(subject, Some(queue_group), Some(box_handler(handler)))
            .await
    }

    /// Subscribe to `subject` for consumption through
    /// [`Subscription::next_message`]
    ///
    /// # Errors
    ///
    /// It returns an error if the client is closed.
    pub async fn subscribe_sync(&self, subject: Subject) -> Result<Subscription, Error> {
        self.subscribe_inner(subject, None, None).await
    }

    /// Subscribe to `subject` as part of `queue_group` for consumption
    /// through [`Subscription::next_message`]
    ///
    /// # Errors
    ///
    /// It returns an error if the client is closed.
    pub async fn queue_subscribe_sync(
        &self,
        subject: Subject,
        queue_group: QueueGroup,
    ) -> Result<Subscription, Error> {
        self.subscribe_inner(subject, Some(queue_group), None).await
    }

    async fn subscribe_inner(
        &self,
        subject: Subject,
        queue_group: Option<QueueGroup>,
        handler: Option<MessageHandler>,
    ) -> Result<Subscription, Error> {
        let permit = self
            .inner
            .sender
            .reserve()
            .await
            .map_err(|_| Error::ConnectionClosed)?;

        Ok(self.do_subscribe(permit, subject, queue_group, handler))
    }

    fn do_subscribe(
        &self,
        permit: Permit<'_, HandlerCommand>,
        subject: Subject,
        queue_group: Option<QueueGroup>,
        handler: Option<MessageHandler>,
    ) -> Subscription {
        let id = self
            .inner
            .next_subscription_id
            .fetch_add(1, Ordering::AcqRel)
            .into();
        if id == SubscriptionId::MAX {
            abort();
        }

        let kind = if handler.is_some() {
            SubscriptionKind::Async
        } else {
            SubscriptionKind::Sync
        };
        let shared = Arc::new(SubscriptionShared::new(
            id,
            subject.clone(),
            queue_group.clone(),
            kind,
            self.clone(),
            self.inner.pending_messages_limit,
            self.inner.no_delivery_delay,
        ));

        if !self.inner.no_delivery_delay {
            let timer = signal::start(&shared);
            shared.state.lock().signal_timer = Some(timer);
        }

        if let Some(handler) = handler {
            tokio::spawn(worker::run(Arc::clone(&shared), handler));
        }

        // Inserting under the table lock doubles as the initialization
        // barrier: no message can route to the subscription earlier.
        self.inner
            .subscriptions
            .lock()
            .insert(id, Arc::clone(&shared));

        permit.send(HandlerCommand::Subscribe {
            id,
            subject,
            queue_group,
        });

        Subscription::new(shared)
    }

    /// Route an inbound message to the subscription it belongs to
    ///
    /// Called by the network reader for every message the server
    /// delivers. Messages for unknown ids are dropped: the server may
    /// keep sending for a short while after an unsubscribe.
    pub fn process_message(&self, id: SubscriptionId, message: Message) {
        let subscription = self.inner.subscriptions.lock().get(&id).cloned();

        if let Some(subscription) = subscription {
            subscription.push_message(message);
        } else {
            trace!(subscription = %id, "message for unknown subscription");
        }
    }

    /// Tear down every subscription after the connection is lost
    ///
    /// Called by the transport when the connection cannot be recovered.
    /// Blocked [`Subscription::next_message`] calls fail with
    /// [`Error::ConnectionClosed`]; delivery workers finish their
    /// in-flight callback and exit.
    pub fn process_connection_closed(&self) {
        self.inner.quick_info.store_is_connected(false);
        self.close_subscriptions();
    }

    /// Close this client, waiting for the transport to acknowledge
    ///
    /// Every subscription is closed first, then the transport is asked
    /// to flush and shut down.
    pub async fn close(&self) {
        self.inner.quick_info.store_is_connected(false);
        self.close_subscriptions();

        let (sender, receiver) = oneshot::channel();
        if self
            .enqueue_command(HandlerCommand::Close(sender))
            .await
            .is_err()
        {
            return;
        }

        let _ = receiver.await;
    }

    fn close_subscriptions(&self) {
        let subscriptions = std::mem::take(&mut *self.inner.subscriptions.lock());

        for (_, subscription) in subscriptions {
            subscription.close(true);
        }
    }

    /// Get status flags for the client
    #[must_use]
    pub fn quick_info(&self) -> QuickInfo {
        self.inner.quick_info.get()
    }

    /// Drop the table entry and close the subscription
    ///
    /// `drain` is `true` when the removal was triggered by reaching the
    /// delivery limit rather than by an explicit unsubscribe.
    pub(crate) fn remove_subscription(&self, id: SubscriptionId, drain: bool) {
        let subscription = self.inner.subscriptions.lock().remove(&id);

        if let Some(subscription) = subscription {
            debug!(subscription = %id, drain, "removing subscription");
            subscription.close(false);
        }
    }

    pub(crate) async fn unsubscribe(
        &self,
        shared: &Arc<SubscriptionShared>,
        max_messages: Option<NonZeroU64>,
    ) -> Result<(), Error> {
        let remove_now = {
            let mut state = shared.state.lock();
            state.max = max_messages.map_or(0, NonZeroU64::get);
            state.max == 0 || state.delivered >= state.max
        };

        self.enqueue_command(HandlerCommand::Unsubscribe {
            id: shared.id,
            max_messages,
        })
        .await?;

        if remove_now {
            self.remove_subscription(shared.id, max_messages.is_some());
        }

        Ok(())
    }

    /// Best-effort unsubscribe from [`Subscription`]'s `Drop`
    ///
    /// The command channel may be full or gone; the failure is latched
    /// into [`QuickInfo`] so the transport can sweep the table later.
    pub(crate) fn lazy_unsubscribe(&self, id: SubscriptionId) {
        if self
            .inner
            .sender
            .try_send(HandlerCommand::Unsubscribe {
                id,
                max_messages: None,
            })
            .is_err()
        {
            self.inner.quick_info.store_is_failed_unsubscribe(true);
        }

        self.remove_subscription(id, false);
    }

    async fn enqueue_command(&self, cmd: HandlerCommand) -> Result<(), Error> {
        self.inner
            .sender
            .send(cmd)
            .await
            .map_err(|_| Error::ConnectionClosed)
    }
}

fn box_handler<F, Fut>(mut handler: F) -> MessageHandler
where
    F: FnMut(Message) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Box::new(move |message| -> BoxFuture<'static, ()> { Box::pin(handler(message)) })
}
