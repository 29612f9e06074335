//! Simulate command - run a wake job against a scripted node

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use bitkit_notify::dispatcher::{DecryptedNotification, DeferredJob, NotificationKind};
use bitkit_notify::wake::{
    ChannelDetails, JobOutcome, NodeEvent, NotificationPresenter, WakeCoordinator,
};
use bitkit_notify::NotifyConfig;
use clap::Args;
use serde::Deserialize;

use crate::scripted::{ScriptedNode, ScriptedOrders};
use crate::ui;

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Notification type to wake for
    #[arg(required_unless_present = "job")]
    pub kind: Option<NotificationKind>,

    /// Notification payload (JSON object)
    #[arg(short, long, default_value = "{}")]
    pub payload: String,

    /// Wake job file written by 'open --job-output'
    #[arg(long, conflicts_with = "kind")]
    pub job: Option<PathBuf>,

    /// Node event emitted right after start (JSON, repeatable)
    #[arg(long = "event")]
    pub events: Vec<String>,

    /// JSON file with timed events: [{"after_ms": 500, "event": {...}}]
    #[arg(long)]
    pub script: Option<PathBuf>,

    /// Open channel as <channel_id>:<outbound_sats> (repeatable)
    #[arg(long = "channel")]
    pub channels: Vec<String>,

    /// Make the node fail to start with this reason
    #[arg(long)]
    pub start_failure: Option<String>,

    /// Delay node start by this many seconds
    #[arg(long)]
    pub start_delay_secs: Option<u64>,

    /// Make the channel-open follow-up fail with this reason
    #[arg(long)]
    pub order_failure: Option<String>,

    /// Override the job deadline
    #[arg(long)]
    pub deadline_secs: Option<u64>,
}

#[derive(Deserialize)]
struct ScriptedEvent {
    #[serde(default)]
    after_ms: u64,
    event: NodeEvent,
}

/// Prints deliveries to the terminal.
struct ConsolePresenter;

impl NotificationPresenter for ConsolePresenter {
    fn present(&self, title: Option<&str>, body: Option<&str>, _extras: &HashMap<String, String>) {
        ui::notification(title, body);
    }
}

fn parse_channel(spec: &str) -> Result<ChannelDetails> {
    let (channel_id, sats) = spec
        .split_once(':')
        .with_context(|| format!("Channel must be <id>:<sats>, got '{spec}'"))?;
    let sats: u64 = sats
        .parse()
        .with_context(|| format!("Invalid channel balance '{sats}'"))?;
    Ok(ChannelDetails {
        channel_id: channel_id.to_string(),
        outbound_capacity_msat: sats * 1000,
        inbound_capacity_msat: 0,
    })
}

fn load_notification(args: &SimulateArgs) -> Result<DecryptedNotification> {
    if let Some(path) = &args.job {
        let job: DeferredJob = serde_json::from_str(&super::read_input(path)?)
            .context("Invalid wake job file")?;
        return job.parse().map_err(anyhow::Error::msg);
    }
    match args.kind {
        Some(kind) => Ok(DecryptedNotification::new(
            kind,
            super::parse_payload(&args.payload)?,
        )),
        None => bail!("Pass a notification type or --job"),
    }
}

fn build_node(args: &SimulateArgs) -> Result<ScriptedNode> {
    let mut node = ScriptedNode::new();

    for raw in &args.events {
        let event: NodeEvent =
            serde_json::from_str(raw).with_context(|| format!("Invalid node event: {raw}"))?;
        node.push_event(Duration::ZERO, event);
    }
    if let Some(path) = &args.script {
        let script: Vec<ScriptedEvent> = serde_json::from_str(&super::read_input(path)?)
            .context("Invalid event script")?;
        for scripted in script {
            node.push_event(Duration::from_millis(scripted.after_ms), scripted.event);
        }
    }
    for spec in &args.channels {
        node.push_channel(parse_channel(spec)?);
    }
    if let Some(reason) = &args.start_failure {
        node.fail_start(reason.clone());
    }
    if let Some(secs) = args.start_delay_secs {
        node.delay_start(Duration::from_secs(secs));
    }
    Ok(node)
}

pub async fn run(config: &NotifyConfig, args: SimulateArgs) -> Result<()> {
    let notification = load_notification(&args)?;
    let node = Arc::new(build_node(&args)?);
    let orders = ScriptedOrders::new(args.order_failure.clone());

    let mut wake = config.wake.clone();
    if let Some(deadline) = args.deadline_secs {
        let start_timeout = wake.node_start_timeout_secs.min(deadline);
        wake = wake
            .with_deadline(deadline)
            .with_node_start_timeout(start_timeout);
    }
    wake.validate().context("Invalid wake settings")?;

    let coordinator =
        WakeCoordinator::new(node.clone(), Arc::new(orders), Arc::new(ConsolePresenter), wake);

    ui::info(&format!(
        "Waking node for {} (deadline {}s)",
        notification.kind,
        coordinator.config().deadline_secs
    ));
    let report = coordinator.run(notification).await;

    ui::header("Wake Report");
    ui::key_value("Trigger", &format!("{:?}", report.delivery.trigger));
    let transitions: Vec<String> = report
        .transitions
        .iter()
        .map(|state| format!("{state:?}"))
        .collect();
    ui::key_value("States", &transitions.join(" -> "));
    ui::key_value("Node Stops", &node.stops().to_string());

    match report.outcome {
        JobOutcome::Success => {
            ui::success("Wake job succeeded");
            Ok(())
        }
        JobOutcome::Failure { reason } => bail!("Wake job failed: {reason}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_channel() {
        let channel = parse_channel("chan-1:50000").unwrap();
        assert_eq!(channel.channel_id, "chan-1");
        assert_eq!(channel.outbound_capacity_sats(), 50_000);

        assert!(parse_channel("chan-1").is_err());
        assert!(parse_channel("chan-1:lots").is_err());
    }

    #[test]
    fn test_scripted_event_shape() {
        let script: Vec<ScriptedEvent> = serde_json::from_str(
            r#"[{"event": {"type": "ChannelPending"}}, {"after_ms": 250, "event": {"type": "PaymentReceived", "amount_msat": 21000}}]"#,
        )
        .unwrap();
        assert_eq!(script[0].after_ms, 0);
        assert_eq!(script[1].event, NodeEvent::PaymentReceived { amount_msat: 21000 });
    }
}
