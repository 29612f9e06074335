//! Scripted wallet node, order service and presenter doubles.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::errors::NodeError;
use crate::wake::{
    ChannelDetails, EventSender, NodeEvent, NotificationPresenter, OrderService, WalletNode,
};

/// A node that replays a fixed script of events after starting.
#[derive(Default)]
pub struct MockNode {
    script: Mutex<Vec<(Duration, NodeEvent)>>,
    start_delay: Option<Duration>,
    stop_delay: Option<Duration>,
    start_failure: Option<String>,
    close_after_script: bool,
    channels: Mutex<Vec<ChannelDetails>>,
    sender: Mutex<Option<EventSender>>,
    starts: AtomicUsize,
    stops: AtomicUsize,
    channel_lookups: AtomicUsize,
}

impl MockNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit `event` right after start.
    pub fn with_event(self, event: NodeEvent) -> Self {
        self.with_event_after(Duration::ZERO, event)
    }

    /// Emit `event` `delay` after the previous scripted event.
    pub fn with_event_after(self, delay: Duration, event: NodeEvent) -> Self {
        self.script.lock().unwrap().push((delay, event));
        self
    }

    pub fn with_start_failure(mut self, reason: impl Into<String>) -> Self {
        self.start_failure = Some(reason.into());
        self
    }

    pub fn with_start_delay(mut self, delay: Duration) -> Self {
        self.start_delay = Some(delay);
        self
    }

    /// Make `stop` take `delay` before it returns.
    pub fn with_stop_delay(mut self, delay: Duration) -> Self {
        self.stop_delay = Some(delay);
        self
    }

    pub fn with_channel(self, channel: ChannelDetails) -> Self {
        self.channels.lock().unwrap().push(channel);
        self
    }

    /// Drop the event sender once the script has been replayed.
    pub fn closing_stream(mut self) -> Self {
        self.close_after_script = true;
        self
    }

    /// Push an event by hand. Returns false if the node is not running.
    pub fn emit(&self, event: NodeEvent) -> bool {
        match self.sender.lock().unwrap().as_ref() {
            Some(sender) => sender.send(event).is_ok(),
            None => false,
        }
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    /// Number of `list_channels` calls.
    pub fn channel_lookups(&self) -> usize {
        self.channel_lookups.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.sender.lock().unwrap().is_some()
    }
}

#[async_trait]
impl WalletNode for MockNode {
    async fn start(&self, events: EventSender) -> Result<(), NodeError> {
        self.starts.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.start_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(reason) = &self.start_failure {
            return Err(NodeError::Start(reason.clone()));
        }

        let script = std::mem::take(&mut *self.script.lock().unwrap());
        let replay = events.clone();
        if !self.close_after_script {
            *self.sender.lock().unwrap() = Some(events);
        }

        tokio::spawn(async move {
            for (delay, event) in script {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                if replay.send(event).is_err() {
                    break;
                }
            }
        });
        Ok(())
    }

    async fn stop(&self) -> Result<(), NodeError> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.stop_delay {
            tokio::time::sleep(delay).await;
        }
        self.sender.lock().unwrap().take();
        Ok(())
    }

    async fn list_channels(&self) -> Result<Vec<ChannelDetails>, NodeError> {
        self.channel_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.channels.lock().unwrap().clone())
    }
}

/// Order service that records requests and succeeds or fails on demand.
#[derive(Default)]
pub struct MockOrderService {
    failure: Option<String>,
    opened: Mutex<Vec<String>>,
}

impl MockOrderService {
    pub fn succeeding() -> Self {
        Self::default()
    }

    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            failure: Some(reason.into()),
            opened: Mutex::new(Vec::new()),
        }
    }

    /// Order ids `open_channel` was called with.
    pub fn requested(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl OrderService for MockOrderService {
    async fn open_channel(&self, order_id: &str) -> Result<(), NodeError> {
        self.opened.lock().unwrap().push(order_id.to_string());
        match &self.failure {
            Some(reason) => Err(NodeError::ChannelOpen(reason.clone())),
            None => Ok(()),
        }
    }
}

/// A notification as handed to the presenter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PresentedNotification {
    pub title: Option<String>,
    pub body: Option<String>,
    pub extras: HashMap<String, String>,
}

/// Presenter that records every call.
#[derive(Default)]
pub struct RecordingPresenter {
    presented: Mutex<Vec<PresentedNotification>>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.presented.lock().unwrap().len()
    }

    pub fn last(&self) -> Option<PresentedNotification> {
        self.presented.lock().unwrap().last().cloned()
    }

    pub fn all(&self) -> Vec<PresentedNotification> {
        self.presented.lock().unwrap().clone()
    }
}

impl NotificationPresenter for RecordingPresenter {
    fn present(&self, title: Option<&str>, body: Option<&str>, extras: &HashMap<String, String>) {
        self.presented.lock().unwrap().push(PresentedNotification {
            title: title.map(str::to_string),
            body: body.map(str::to_string),
            extras: extras.clone(),
        });
    }
}
