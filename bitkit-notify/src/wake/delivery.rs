//! One-shot delivery gate.
//!
//! Both the event path and the deadline path of a wake job may try to
//! deliver. The gate is a single-assignment cell: the first caller runs the
//! stop-node-and-notify sequence, every later (or concurrent) caller waits
//! for it and gets the same [`Delivery`] back without side effects.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::OnceCell;

use super::context::BestAttempt;

/// What led to delivery.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeliveryTrigger {
    /// An event matched the expected kind.
    EventMatch,
    /// The post-start follow-up action failed.
    FollowUpFailure,
    /// The node could not be started.
    NodeStartFailure,
    /// The node's event stream ended before a match.
    EventStreamClosed,
    /// The overall job deadline expired.
    Deadline,
}

impl DeliveryTrigger {
    /// Whether the job counts as successful when delivery happened this way.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::EventMatch | Self::FollowUpFailure)
    }
}

/// The single delivery performed for a job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Delivery {
    pub attempt: BestAttempt,
    pub trigger: DeliveryTrigger,
    /// Failure reason for the job result, if the trigger is a failure.
    pub failure: Option<String>,
}

/// Single-assignment completion signal for one wake job.
#[derive(Clone, Default)]
pub struct DeliveryGate {
    cell: Arc<OnceCell<Delivery>>,
    claimed: Arc<AtomicBool>,
}

impl DeliveryGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `deliver` unless delivery already happened.
    ///
    /// Returns the recorded delivery and whether this call performed it.
    /// If a delivery is in flight on another path, waits for it.
    pub async fn deliver<F, Fut>(&self, deliver: F) -> (Delivery, bool)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Delivery>,
    {
        let mut performed = false;
        let delivery = self
            .cell
            .get_or_init(|| {
                performed = true;
                self.claimed.store(true, Ordering::SeqCst);
                deliver()
            })
            .await
            .clone();
        (delivery, performed)
    }

    /// True once some caller has started delivering, even if it has not
    /// finished yet. Paths that lost the race should stop acting on the node.
    pub fn is_claimed(&self) -> bool {
        self.claimed.load(Ordering::SeqCst)
    }

    pub fn is_delivered(&self) -> bool {
        self.cell.initialized()
    }

    pub fn get(&self) -> Option<&Delivery> {
        self.cell.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::task::JoinSet;

    fn delivery(trigger: DeliveryTrigger) -> Delivery {
        Delivery {
            attempt: BestAttempt::new("t", "b"),
            trigger,
            failure: None,
        }
    }

    #[tokio::test]
    async fn test_second_delivery_is_noop() {
        let gate = DeliveryGate::new();
        let (first, performed) = gate
            .deliver(|| async { delivery(DeliveryTrigger::EventMatch) })
            .await;
        assert!(performed);

        let (second, performed) = gate
            .deliver(|| async { delivery(DeliveryTrigger::Deadline) })
            .await;
        assert!(!performed);
        assert_eq!(first, second);
        assert_eq!(gate.get().unwrap().trigger, DeliveryTrigger::EventMatch);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_deliver_once() {
        let gate = DeliveryGate::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let mut tasks = JoinSet::new();

        for i in 0..50 {
            let gate = gate.clone();
            let runs = Arc::clone(&runs);
            tasks.spawn(async move {
                gate.deliver(|| async move {
                    runs.fetch_add(1, Ordering::SeqCst);
                    tokio::task::yield_now().await;
                    let trigger = if i % 2 == 0 {
                        DeliveryTrigger::EventMatch
                    } else {
                        DeliveryTrigger::Deadline
                    };
                    delivery(trigger)
                })
                .await
            });
        }

        let mut performed_count = 0;
        let mut seen = Vec::new();
        while let Some(result) = tasks.join_next().await {
            let (delivery, performed) = result.unwrap();
            if performed {
                performed_count += 1;
            }
            seen.push(delivery);
        }

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(performed_count, 1);
        assert!(seen.windows(2).all(|w| w[0] == w[1]));
    }

    #[tokio::test]
    async fn test_claimed_while_delivery_in_flight() {
        let gate = DeliveryGate::new();
        assert!(!gate.is_claimed());

        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
        let in_flight = gate.clone();
        let task = tokio::spawn(async move {
            in_flight
                .deliver(|| async move {
                    let _ = release_rx.await;
                    delivery(DeliveryTrigger::Deadline)
                })
                .await
        });

        while !gate.is_claimed() {
            tokio::task::yield_now().await;
        }
        assert!(!gate.is_delivered());

        release_tx.send(()).unwrap();
        let (_, performed) = task.await.unwrap();
        assert!(performed);
        assert!(gate.is_claimed());
        assert!(gate.is_delivered());
    }

    #[test]
    fn test_trigger_success_mapping() {
        assert!(DeliveryTrigger::EventMatch.is_success());
        assert!(DeliveryTrigger::FollowUpFailure.is_success());
        assert!(!DeliveryTrigger::Deadline.is_success());
        assert!(!DeliveryTrigger::NodeStartFailure.is_success());
        assert!(!DeliveryTrigger::EventStreamClosed.is_success());
    }
}
