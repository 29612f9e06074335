//! Seal command - encrypt a notification the way the push server does

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use bitkit_notify::dispatcher::{seal_notification, NotificationKind, Preview};
use bitkit_notify::secure_storage::{SecretKeyProvider, StoredKeyProvider};
use bitkit_notify::NotifyConfig;
use clap::Args;

use crate::ui;

#[derive(Args, Debug)]
pub struct SealArgs {
    /// Notification type (incomingHtlc, mutualClose, orderPaymentConfirmed, cjitPaymentArrived, wakeToTimeout)
    pub kind: NotificationKind,

    /// Notification payload (JSON object)
    #[arg(short, long, default_value = "{}")]
    pub payload: String,

    /// Recipient public key (hex). Defaults to this device's key.
    #[arg(long)]
    pub to: Option<String>,

    /// Plaintext preview title
    #[arg(long)]
    pub title: Option<String>,

    /// Plaintext preview body
    #[arg(long)]
    pub message: Option<String>,

    /// Notification sound
    #[arg(long)]
    pub sound: Option<String>,

    /// Write the push fields to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub async fn run(storage_dir: &Path, config: &NotifyConfig, args: SealArgs) -> Result<()> {
    let payload = super::parse_payload(&args.payload)?;

    let recipient = match args.to {
        Some(hex) => hex,
        None => {
            let provider = StoredKeyProvider::new(
                Arc::new(super::key_storage(storage_dir)),
                config.private_key_id.clone(),
            );
            provider
                .notification_key()
                .await?
                .map(|pair| pair.public_hex())
                .context("No device key; run 'bitkit-notify keygen' or pass --to")?
        }
    };

    let envelope = seal_notification(args.kind, payload, &recipient, &config.domain_label)
        .context("Failed to seal notification")?
        .with_preview(Preview {
            title: args.title,
            body: args.message,
            sound: args.sound,
        });
    tracing::debug!(kind = %args.kind, sender = %envelope.sender_public_key, "sealed notification");

    let fields = serde_json::to_value(envelope.to_fields())?;
    super::write_or_print(args.output.as_deref(), &fields)?;

    if let Some(path) = &args.output {
        ui::success(&format!(
            "Sealed {} notification written to {}",
            args.kind,
            path.display()
        ));
    }
    Ok(())
}
