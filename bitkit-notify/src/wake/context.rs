//! Per-job wake state and the event matching table.
//!
//! [`WakeContext`] is an immutable snapshot. Every event produces a
//! [`Reaction`] carrying the next snapshot, so the coordinator owns exactly
//! one current value and the race between the event path and the deadline
//! path never shares a mutable notification.

use serde_json::Value;

use super::node::{ChannelDetails, NodeEvent};
use crate::dispatcher::{DecryptedNotification, NotificationKind};

/// Most up-to-date user-facing message so far.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BestAttempt {
    pub title: String,
    pub body: String,
}

impl BestAttempt {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// Result of feeding one event into a context.
#[derive(Clone, Debug, PartialEq)]
pub enum Reaction {
    /// No state change.
    Ignore,
    /// Keep listening with the updated snapshot.
    Update(WakeContext),
    /// Deliver this snapshot now.
    Deliver(WakeContext),
}

#[derive(Clone, Debug, PartialEq)]
pub struct WakeContext {
    expected_kind: Option<NotificationKind>,
    payload: Option<Value>,
    best_attempt: BestAttempt,
    delivered: bool,
}

impl WakeContext {
    pub fn new(notification: &DecryptedNotification) -> Self {
        Self {
            expected_kind: Some(notification.kind),
            payload: Some(notification.payload.clone()),
            best_attempt: BestAttempt::default(),
            delivered: false,
        }
    }

    pub fn expected_kind(&self) -> Option<NotificationKind> {
        self.expected_kind
    }

    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    pub fn best_attempt(&self) -> &BestAttempt {
        &self.best_attempt
    }

    pub fn is_delivered(&self) -> bool {
        self.delivered
    }

    /// `orderId` from the payload of an `orderPaymentConfirmed` wake.
    pub fn order_id(&self) -> Option<&str> {
        self.payload.as_ref()?.get("orderId")?.as_str()
    }

    pub fn with_attempt(self, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            best_attempt: BestAttempt::new(title, body),
            ..self
        }
    }

    pub fn mark_delivered(self) -> Self {
        Self {
            delivered: true,
            ..self
        }
    }

    /// Channel id to resolve before calling [`react`](Self::react), if any.
    ///
    /// Only a `cjitPaymentArrived` wake needs the channel's balance.
    pub fn channel_lookup<'e>(&self, event: &'e NodeEvent) -> Option<&'e str> {
        match (self.expected_kind, event) {
            (Some(NotificationKind::CjitPaymentArrived), NodeEvent::ChannelReady { channel_id }) => {
                Some(channel_id.as_str())
            }
            _ => None,
        }
    }

    /// Apply one event. `channel` is the result of the lookup requested by
    /// [`channel_lookup`](Self::channel_lookup), if any.
    pub fn react(&self, event: &NodeEvent, channel: Option<&ChannelDetails>) -> Reaction {
        use NotificationKind::*;

        if self.delivered {
            return Reaction::Ignore;
        }

        let kind = self.expected_kind;
        let next = |title: &str, body: String| self.clone().with_attempt(title, body);

        match event {
            NodeEvent::PaymentReceived { amount_msat } => {
                let ctx = next("Payment Received", format!("⚡ {}", amount_msat / 1000));
                if kind == Some(IncomingHtlc) {
                    Reaction::Deliver(ctx.mark_delivered())
                } else {
                    Reaction::Update(ctx)
                }
            }
            NodeEvent::ChannelPending { .. } => {
                Reaction::Update(next("Channel Opened", "Pending".into()))
            }
            NodeEvent::ChannelReady { .. } => match kind {
                Some(CjitPaymentArrived) => {
                    let body = match channel {
                        Some(channel) => {
                            format!("Received ⚡ {} sats", channel.outbound_capacity_sats())
                        }
                        None => "Received ⚡".to_string(),
                    };
                    Reaction::Deliver(next("Payment received", body).mark_delivered())
                }
                Some(OrderPaymentConfirmed) => Reaction::Deliver(
                    next("Channel opened", "Ready to send".into()).mark_delivered(),
                ),
                _ => Reaction::Ignore,
            },
            NodeEvent::ChannelClosed { reason, .. } => {
                let ctx = match kind {
                    Some(MutualClose) => next(
                        "Channel closed",
                        "Balance moved from spending to savings".into(),
                    ),
                    Some(OrderPaymentConfirmed) => next(
                        "Channel failed to open in the background",
                        "Please try again".into(),
                    ),
                    _ => next(
                        "Channel closed",
                        reason.clone().unwrap_or_else(|| "Unknown reason".into()),
                    ),
                };
                Reaction::Deliver(ctx.mark_delivered())
            }
            NodeEvent::PaymentFailed { reason } => {
                let reason = reason.as_deref().unwrap_or("Unknown reason");
                let ctx = next("Payment failed", format!("⚡ {reason}"));
                if kind == Some(WakeToTimeout) {
                    Reaction::Deliver(ctx.mark_delivered())
                } else {
                    Reaction::Update(ctx)
                }
            }
            NodeEvent::PaymentSuccessful { .. } | NodeEvent::PaymentClaimable { .. } => {
                Reaction::Ignore
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context(kind: NotificationKind) -> WakeContext {
        WakeContext::new(&DecryptedNotification::new(kind, json!({"orderId": "order-1"})))
    }

    fn delivered(reaction: Reaction) -> BestAttempt {
        match reaction {
            Reaction::Deliver(ctx) => {
                assert!(ctx.is_delivered());
                ctx.best_attempt().clone()
            }
            other => panic!("expected delivery, got {other:?}"),
        }
    }

    fn updated(reaction: Reaction) -> BestAttempt {
        match reaction {
            Reaction::Update(ctx) => {
                assert!(!ctx.is_delivered());
                ctx.best_attempt().clone()
            }
            other => panic!("expected update, got {other:?}"),
        }
    }

    #[test]
    fn test_incoming_htlc_payment_received() {
        let reaction = context(NotificationKind::IncomingHtlc)
            .react(&NodeEvent::PaymentReceived { amount_msat: 21_000 }, None);
        assert_eq!(delivered(reaction), BestAttempt::new("Payment Received", "⚡ 21"));
    }

    #[test]
    fn test_payment_received_for_other_kind_only_updates() {
        let reaction = context(NotificationKind::MutualClose)
            .react(&NodeEvent::PaymentReceived { amount_msat: 5_000 }, None);
        assert_eq!(updated(reaction).title, "Payment Received");
    }

    #[test]
    fn test_channel_pending_never_delivers() {
        for kind in NotificationKind::ALL {
            let reaction = context(kind).react(
                &NodeEvent::ChannelPending {
                    channel_id: "c".into(),
                },
                None,
            );
            assert_eq!(updated(reaction), BestAttempt::new("Channel Opened", "Pending"));
        }
    }

    #[test]
    fn test_cjit_channel_ready_uses_channel_balance() {
        let ctx = context(NotificationKind::CjitPaymentArrived);
        let event = NodeEvent::ChannelReady {
            channel_id: "chan-1".into(),
        };
        assert_eq!(ctx.channel_lookup(&event), Some("chan-1"));

        let channel = ChannelDetails {
            channel_id: "chan-1".into(),
            outbound_capacity_msat: 50_000_000,
            inbound_capacity_msat: 0,
        };
        let attempt = delivered(ctx.react(&event, Some(&channel)));
        assert_eq!(attempt, BestAttempt::new("Payment received", "Received ⚡ 50000 sats"));

        let attempt = delivered(ctx.react(&event, None));
        assert_eq!(attempt.body, "Received ⚡");
    }

    #[test]
    fn test_order_channel_ready() {
        let ctx = context(NotificationKind::OrderPaymentConfirmed);
        let event = NodeEvent::ChannelReady {
            channel_id: "c".into(),
        };
        assert_eq!(ctx.channel_lookup(&event), None);
        assert_eq!(
            delivered(ctx.react(&event, None)),
            BestAttempt::new("Channel opened", "Ready to send")
        );
    }

    #[test]
    fn test_channel_ready_ignored_for_other_kinds() {
        let event = NodeEvent::ChannelReady {
            channel_id: "c".into(),
        };
        for kind in [
            NotificationKind::IncomingHtlc,
            NotificationKind::MutualClose,
            NotificationKind::WakeToTimeout,
        ] {
            assert_eq!(context(kind).react(&event, None), Reaction::Ignore);
        }
    }

    #[test]
    fn test_channel_closed_variants() {
        let event = NodeEvent::ChannelClosed {
            channel_id: "c".into(),
            reason: Some("cooperative".into()),
        };

        assert_eq!(
            delivered(context(NotificationKind::MutualClose).react(&event, None)).body,
            "Balance moved from spending to savings"
        );
        assert_eq!(
            delivered(context(NotificationKind::OrderPaymentConfirmed).react(&event, None)),
            BestAttempt::new("Channel failed to open in the background", "Please try again")
        );
        assert_eq!(
            delivered(context(NotificationKind::IncomingHtlc).react(&event, None)),
            BestAttempt::new("Channel closed", "cooperative")
        );
    }

    #[test]
    fn test_payment_failed() {
        let event = NodeEvent::PaymentFailed {
            reason: Some("RouteNotFound".into()),
        };
        assert_eq!(
            delivered(context(NotificationKind::WakeToTimeout).react(&event, None)),
            BestAttempt::new("Payment failed", "⚡ RouteNotFound")
        );
        assert_eq!(
            updated(context(NotificationKind::IncomingHtlc).react(&event, None)).title,
            "Payment failed"
        );
    }

    #[test]
    fn test_successful_and_claimable_ignored() {
        let ctx = context(NotificationKind::IncomingHtlc);
        assert_eq!(
            ctx.react(&NodeEvent::PaymentSuccessful { payment_hash: None }, None),
            Reaction::Ignore
        );
        assert_eq!(
            ctx.react(&NodeEvent::PaymentClaimable { amount_msat: 1 }, None),
            Reaction::Ignore
        );
    }

    #[test]
    fn test_no_reaction_after_delivery() {
        let ctx = context(NotificationKind::IncomingHtlc).mark_delivered();
        assert_eq!(
            ctx.react(&NodeEvent::PaymentReceived { amount_msat: 1000 }, None),
            Reaction::Ignore
        );
    }

    #[test]
    fn test_order_id() {
        assert_eq!(context(NotificationKind::OrderPaymentConfirmed).order_id(), Some("order-1"));
        let ctx = WakeContext::new(&DecryptedNotification::new(
            NotificationKind::OrderPaymentConfirmed,
            json!({}),
        ));
        assert_eq!(ctx.order_id(), None);
    }
}
