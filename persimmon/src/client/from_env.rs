use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(super) struct FromEnv {
    pub(super) pending_messages_limit: Option<usize>,
    pub(super) no_delivery_delay: Option<bool>,
}
