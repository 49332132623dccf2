use std::sync::Arc;

use tokio::sync::mpsc;

use crate::{client::RawQuickInfo, handler::HandlerCommand};

#[derive(Debug)]
pub(crate) struct TestHandler {
    pub(crate) receiver: mpsc::Receiver<HandlerCommand>,
    pub(crate) quick_info: Arc<RawQuickInfo>,
}
