pub mod websocket;

use crate::agent::ChatAgent;
use crate::error::BoxError;
use crate::session::SessionDefaults;
use std::sync::Arc;

pub struct Server {
    addr: String,
    agent: Arc<ChatAgent>,
    defaults: SessionDefaults,
}

impl Server {
    pub fn new(addr: String, agent: Arc<ChatAgent>, defaults: SessionDefaults) -> Self {
        Self {
            addr,
            agent,
            defaults,
        }
    }

    pub async fn run(&self) -> Result<(), BoxError> {
        websocket::start_ws_server(&self.addr, self.agent.clone(), self.defaults.clone()).await
    }
}
