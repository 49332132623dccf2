pub use self::message::Message;
pub use self::queue_group::QueueGroup;
pub use self::subject::Subject;
pub use self::subscription_id::SubscriptionId;

mod message;
mod queue_group;
mod subject;
mod subscription_id;

pub mod error {
    pub use super::queue_group::QueueGroupValidateError;
    pub use super::subject::SubjectValidateError;
}
