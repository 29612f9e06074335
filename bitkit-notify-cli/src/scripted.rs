//! Scripted wallet node and order service for the `simulate` command

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bitkit_notify::wake::{ChannelDetails, EventSender, NodeEvent, OrderService, WalletNode};
use bitkit_notify::NodeError;
use tokio::sync::Mutex;

/// Replays events read from the command line once started.
#[derive(Default)]
pub struct ScriptedNode {
    script: Mutex<Vec<(Duration, NodeEvent)>>,
    channels: Vec<ChannelDetails>,
    start_failure: Option<String>,
    start_delay: Option<Duration>,
    sender: Mutex<Option<EventSender>>,
    stops: AtomicUsize,
}

impl ScriptedNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `event` `delay` after the previous one.
    pub fn push_event(&mut self, delay: Duration, event: NodeEvent) {
        self.script.get_mut().push((delay, event));
    }

    pub fn push_channel(&mut self, channel: ChannelDetails) {
        self.channels.push(channel);
    }

    pub fn fail_start(&mut self, reason: String) {
        self.start_failure = Some(reason);
    }

    pub fn delay_start(&mut self, delay: Duration) {
        self.start_delay = Some(delay);
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WalletNode for ScriptedNode {
    async fn start(&self, events: EventSender) -> Result<(), NodeError> {
        if let Some(delay) = self.start_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(reason) = &self.start_failure {
            return Err(NodeError::Start(reason.clone()));
        }

        let script = std::mem::take(&mut *self.script.lock().await);
        let replay = events.clone();
        *self.sender.lock().await = Some(events);

        tokio::spawn(async move {
            for (delay, event) in script {
                tokio::time::sleep(delay).await;
                if replay.send(event).is_err() {
                    break;
                }
            }
        });
        Ok(())
    }

    async fn stop(&self) -> Result<(), NodeError> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.sender.lock().await.take();
        Ok(())
    }

    async fn list_channels(&self) -> Result<Vec<ChannelDetails>, NodeError> {
        Ok(self.channels.clone())
    }
}

/// Order service that always succeeds, or always fails with one reason.
pub struct ScriptedOrders {
    failure: Option<String>,
}

impl ScriptedOrders {
    pub fn new(failure: Option<String>) -> Self {
        Self { failure }
    }
}

#[async_trait]
impl OrderService for ScriptedOrders {
    async fn open_channel(&self, order_id: &str) -> Result<(), NodeError> {
        tracing::debug!(order_id, "scripted channel open");
        match &self.failure {
            Some(reason) => Err(NodeError::ChannelOpen(reason.clone())),
            None => Ok(()),
        }
    }
}
