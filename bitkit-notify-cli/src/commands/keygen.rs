//! Keygen command - create the device notification key

use anyhow::Result;
use bitkit_notify::secure_storage::{ensure_device_keypair, SecureKeyStorage};
use bitkit_notify::NotifyConfig;
use std::path::Path;

use crate::ui;

pub async fn run(storage_dir: &Path, config: &NotifyConfig, force: bool) -> Result<()> {
    let storage = super::key_storage(storage_dir);
    let key_id = config.private_key_id.as_str();

    if storage.exists(key_id).await? {
        if force {
            storage.delete(key_id).await?;
            ui::warning("Existing notification key deleted");
        } else {
            ui::info("Notification key already exists (use --force to replace it)");
        }
    }

    let pair = ensure_device_keypair(&storage, key_id).await?;

    ui::success("Device notification key ready");
    ui::key_value("Key ID", key_id);
    ui::key_value("Public Key", &pair.public_hex());
    println!();
    ui::info("Register this public key with the push server");

    Ok(())
}
