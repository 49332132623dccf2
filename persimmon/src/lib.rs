//! Subscription core of a pub/sub messaging client
//!
//! Manages a connection's subscriptions: per subscription message
//! queues, callback delivery workers, synchronous pulls with a
//! deadline, delivery limits, slow consumer detection and coordinated
//! shutdown. The network half lives elsewhere: a transport drains the
//! [`HandlerCommand`] stream returned by [`ClientBuilder::build`] and
//! feeds inbound messages back through [`Client::process_message`].

pub use persimmon_proto as proto;

pub use self::client::{Client, ClientBuilder, QuickInfo};
pub use self::error::Error;
pub use self::handler::HandlerCommand;
pub use self::subscription::Subscription;

mod atomic;
mod client;
pub mod error;
mod handler;
mod subscription;
mod timer;
