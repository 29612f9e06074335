//! Whoami command - show the device notification key

use anyhow::Result;
use bitkit_notify::secure_storage::{SecretKeyProvider, StoredKeyProvider};
use bitkit_notify::NotifyConfig;
use std::path::Path;
use std::sync::Arc;

use crate::ui;

pub async fn run(storage_dir: &Path, config: &NotifyConfig) -> Result<()> {
    let storage = Arc::new(super::key_storage(storage_dir));
    let provider = StoredKeyProvider::new(Arc::clone(&storage), config.private_key_id.clone());

    match provider.notification_key().await? {
        Some(pair) => {
            ui::header("Device Notification Key");
            ui::key_value("Key ID", provider.key_id());
            ui::key_value("Public Key", &pair.public_hex());
            ui::key_value("Domain Label", &config.domain_label);
            ui::key_value("Stored In", &storage.dir().display().to_string());
        }
        None => {
            ui::error("No notification key configured");
            ui::info("Run 'bitkit-notify keygen' to create one");
        }
    }

    Ok(())
}
