//! The wake job state machine.
//!
//! ```text
//! Idle -> Starting -> Listening -> Delivering -> Terminal(Success | Failure)
//!            |                         ^
//!            +---- start failure ------+
//! ```
//!
//! The event path (start, follow-up, listen) and the deadline path race
//! under one `select!`. Both funnel into the same [`DeliveryGate`], so the
//! node is stopped and the presenter invoked exactly once, whichever path
//! gets there first.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{sleep_until, timeout, Instant};

use super::context::{BestAttempt, Reaction, WakeContext};
use super::delivery::{Delivery, DeliveryGate, DeliveryTrigger};
use super::node::{ChannelDetails, NotificationPresenter, OrderService, WalletNode};
use crate::config::WakeConfig;
use crate::dispatcher::{DecryptedNotification, DeferredJob, NotificationKind};
use crate::errors::NodeError;

/// Coordinator states, recorded in order in the [`WakeReport`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WakeState {
    Idle,
    Starting,
    Listening,
    Delivering,
    Terminal(TerminalState),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerminalState {
    Success,
    Failure,
}

/// Result handed back to the background job runner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JobOutcome {
    Success,
    Failure { reason: String },
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Everything that happened during one wake job.
#[derive(Clone, Debug)]
pub struct WakeReport {
    pub kind: NotificationKind,
    pub outcome: JobOutcome,
    pub delivery: Delivery,
    pub transitions: Vec<WakeState>,
}

impl WakeReport {
    pub fn terminal(&self) -> Option<TerminalState> {
        match self.transitions.last() {
            Some(WakeState::Terminal(state)) => Some(*state),
            _ => None,
        }
    }
}

/// Fallback when `now + deadline` does not fit in an [`Instant`].
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Stops the node if the job is dropped before it delivered.
///
/// Starts disarmed; the job arms it right before asking the node to start,
/// so a job cancelled while still idle leaves the node alone.
struct NodeStopGuard {
    node: Arc<dyn WalletNode>,
    armed: AtomicBool,
}

impl NodeStopGuard {
    fn new(node: Arc<dyn WalletNode>) -> Self {
        Self {
            node,
            armed: AtomicBool::new(false),
        }
    }

    fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    fn disarm(&self) {
        self.armed.store(false, Ordering::SeqCst);
    }
}

impl Drop for NodeStopGuard {
    fn drop(&mut self) {
        if !self.armed.swap(false, Ordering::SeqCst) {
            return;
        }
        let node = Arc::clone(&self.node);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                tracing::warn!("wake job cancelled before delivery, stopping node");
                handle.spawn(async move {
                    if let Err(err) = node.stop().await {
                        tracing::warn!("failed to stop node after cancellation: {err}");
                    }
                });
            }
            Err(_) => {
                tracing::error!("wake job dropped outside a runtime, node left running");
            }
        }
    }
}

/// Outcome of the event path before delivery.
struct Decision {
    attempt: BestAttempt,
    trigger: DeliveryTrigger,
    failure: Option<String>,
}

/// Drives one wallet node wake per push notification.
///
/// The coordinator itself holds no per-job state and can be shared across
/// concurrent jobs; each [`run`](Self::run) owns its own [`WakeContext`].
pub struct WakeCoordinator {
    node: Arc<dyn WalletNode>,
    orders: Arc<dyn OrderService>,
    presenter: Arc<dyn NotificationPresenter>,
    config: WakeConfig,
}

impl WakeCoordinator {
    pub fn new(
        node: Arc<dyn WalletNode>,
        orders: Arc<dyn OrderService>,
        presenter: Arc<dyn NotificationPresenter>,
        config: WakeConfig,
    ) -> Self {
        Self {
            node,
            orders,
            presenter,
            config,
        }
    }

    pub fn config(&self) -> &WakeConfig {
        &self.config
    }

    /// Run a deferred job as handed over by the job runner.
    pub async fn run_job(&self, job: &DeferredJob) -> JobOutcome {
        match job.parse() {
            Ok(notification) => self.run(notification).await.outcome,
            Err(reason) => {
                tracing::warn!(kind = %job.kind, "rejecting wake job: {reason}");
                JobOutcome::Failure { reason }
            }
        }
    }

    /// Wake the node for `notification` and deliver exactly one notification.
    pub async fn run(&self, notification: DecryptedNotification) -> WakeReport {
        let kind = notification.kind;
        let now = Instant::now();
        let deadline = now
            .checked_add(self.config.deadline())
            .unwrap_or_else(|| now + FAR_FUTURE);
        let transitions = Mutex::new(vec![WakeState::Idle]);
        let gate = DeliveryGate::new();
        let guard = NodeStopGuard::new(Arc::clone(&self.node));

        tracing::info!(%kind, deadline_secs = self.config.deadline_secs, "wake job started");

        let event_path = async {
            let decision = self
                .start_and_listen(WakeContext::new(&notification), &gate, &guard, &transitions)
                .await;
            match decision {
                Some(decision) => self.deliver(&gate, decision, kind, &transitions).await,
                // The deadline path owns delivery; let it finish.
                None => std::future::pending().await,
            }
        };

        let deadline_path = async {
            sleep_until(deadline).await;
            let reason = format!(
                "timed out after {}s waiting for {kind}",
                self.config.deadline_secs
            );
            tracing::warn!(%kind, "{reason}");
            let decision = Decision {
                attempt: BestAttempt::new(self.config.error_title.clone(), reason.clone()),
                trigger: DeliveryTrigger::Deadline,
                failure: Some(reason),
            };
            self.deliver(&gate, decision, kind, &transitions).await
        };

        let delivery = tokio::select! {
            biased;
            delivery = event_path => delivery,
            delivery = deadline_path => delivery,
        };
        guard.disarm();

        let (terminal, outcome) = if delivery.trigger.is_success() {
            (TerminalState::Success, JobOutcome::Success)
        } else {
            let reason = delivery
                .failure
                .clone()
                .unwrap_or_else(|| "unknown error".to_string());
            (TerminalState::Failure, JobOutcome::Failure { reason })
        };

        let mut transitions = transitions.into_inner().unwrap_or_else(|e| e.into_inner());
        transitions.push(WakeState::Terminal(terminal));

        tracing::info!(%kind, trigger = ?delivery.trigger, ?terminal, "wake job finished");

        WakeReport {
            kind,
            outcome,
            delivery,
            transitions,
        }
    }

    /// Start the node and listen until something decides the delivery.
    ///
    /// Returns `None` once the gate has been claimed by the deadline path;
    /// from then on the node is being stopped and must not be queried.
    async fn start_and_listen(
        &self,
        ctx: WakeContext,
        gate: &DeliveryGate,
        guard: &NodeStopGuard,
        transitions: &Mutex<Vec<WakeState>>,
    ) -> Option<Decision> {
        record(transitions, WakeState::Starting);

        let (events_tx, mut events) = mpsc::unbounded_channel();
        let start_timeout = self.config.node_start_timeout();
        guard.arm();
        let started = match timeout(start_timeout, self.node.start(events_tx)).await {
            Ok(result) => result,
            Err(_) => Err(NodeError::StartTimeout(start_timeout.as_millis() as u64)),
        };
        if let Err(err) = started {
            tracing::warn!("node start failed: {err}");
            return Some(Decision {
                attempt: BestAttempt::new(self.config.error_title.clone(), err.to_string()),
                trigger: DeliveryTrigger::NodeStartFailure,
                failure: Some(err.to_string()),
            });
        }
        if gate.is_claimed() {
            return None;
        }

        record(transitions, WakeState::Listening);

        let mut ctx = ctx;
        if ctx.expected_kind() == Some(NotificationKind::OrderPaymentConfirmed) {
            if let Err(reason) = self.open_order_channel(&ctx).await {
                tracing::warn!("channel open follow-up failed: {reason}");
                let ctx = ctx.with_attempt("Channel failed to open", reason);
                return Some(Decision {
                    attempt: ctx.best_attempt().clone(),
                    trigger: DeliveryTrigger::FollowUpFailure,
                    failure: None,
                });
            }
        }

        while let Some(event) = events.recv().await {
            if gate.is_claimed() {
                tracing::debug!(event = event.name(), "delivery claimed, dropping node event");
                return None;
            }
            tracing::debug!(event = event.name(), "node event");

            let channel = match ctx.channel_lookup(&event) {
                Some(channel_id) => self.find_channel(channel_id).await,
                None => None,
            };

            match ctx.react(&event, channel.as_ref()) {
                Reaction::Ignore => {}
                Reaction::Update(next) => {
                    tracing::debug!(title = %next.best_attempt().title, "best attempt updated");
                    ctx = next;
                }
                Reaction::Deliver(next) => {
                    return Some(Decision {
                        attempt: next.best_attempt().clone(),
                        trigger: DeliveryTrigger::EventMatch,
                        failure: None,
                    });
                }
            }
        }

        if gate.is_claimed() {
            return None;
        }
        let reason = "node event stream closed".to_string();
        tracing::warn!("{reason} before a matching event");
        Some(Decision {
            attempt: BestAttempt::new(self.config.error_title.clone(), reason.clone()),
            trigger: DeliveryTrigger::EventStreamClosed,
            failure: Some(reason),
        })
    }

    async fn open_order_channel(&self, ctx: &WakeContext) -> Result<(), String> {
        let order_id = ctx
            .order_id()
            .ok_or_else(|| "orderId field missing".to_string())?;
        tracing::debug!(order_id, "opening channel for paid order");
        self.orders
            .open_channel(order_id)
            .await
            .map_err(|e| e.to_string())
    }

    async fn find_channel(&self, channel_id: &str) -> Option<ChannelDetails> {
        match self.node.list_channels().await {
            Ok(channels) => channels.into_iter().find(|c| c.channel_id == channel_id),
            Err(err) => {
                tracing::warn!(channel_id, "channel lookup failed: {err}");
                None
            }
        }
    }

    async fn deliver(
        &self,
        gate: &DeliveryGate,
        decision: Decision,
        kind: NotificationKind,
        transitions: &Mutex<Vec<WakeState>>,
    ) -> Delivery {
        let (delivery, performed) = gate
            .deliver(|| async move {
                record(transitions, WakeState::Delivering);

                if let Err(err) = self.node.stop().await {
                    tracing::warn!("failed to stop node: {err}");
                }

                let extras = HashMap::from([("type".to_string(), kind.as_str().to_string())]);
                self.presenter.present(
                    Some(&decision.attempt.title),
                    Some(&decision.attempt.body),
                    &extras,
                );

                Delivery {
                    attempt: decision.attempt,
                    trigger: decision.trigger,
                    failure: decision.failure,
                }
            })
            .await;

        if !performed {
            tracing::debug!("delivery already performed, ignoring");
        }
        delivery
    }
}

fn record(transitions: &Mutex<Vec<WakeState>>, state: WakeState) {
    tracing::debug!(?state, "wake state");
    if let Ok(mut transitions) = transitions.lock() {
        transitions.push(state);
    }
}
