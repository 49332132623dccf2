use std::sync::Arc;

use futures_core::future::BoxFuture;
use persimmon_proto::Message;
use tracing::trace;

use super::SubscriptionShared;

pub(crate) type MessageHandler = Box<dyn FnMut(Message) -> BoxFuture<'static, ()> + Send>;

/// Delivery loop of an asynchronous subscription
///
/// Drains the pending queue one message at a time and hands each to the
/// user callback, in arrival order, with the subscription lock released.
/// The task holds its own reference to the subscription and exits when
/// the subscription closes or the delivery limit is reached.
pub(crate) async fn run(shared: Arc<SubscriptionShared>, mut handler: MessageHandler) {
    trace!(subscription = %shared.id, "delivery worker started");

    loop {
        let notified = shared.signal.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        let (message, delivered, max) = {
            let mut state = shared.state.lock();
            if state.closed {
                break;
            }

            match state.list.dequeue() {
                Some(message) => {
                    state.delivered += 1;
                    (message, state.delivered, state.max)
                }
                None => {
                    state.in_wait += 1;
                    drop(state);
                    notified.await;
                    shared.state.lock().in_wait -= 1;
                    continue;
                }
            }
        };

        // Messages past the delivery limit are freed, not delivered.
        if max == 0 || delivered <= max {
            handler(message).await;
        }

        if max > 0 && delivered >= max {
            shared.client.remove_subscription(shared.id, true);
            break;
        }
    }

    trace!(subscription = %shared.id, "delivery worker stopped");
}
