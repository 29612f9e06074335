//! Open command - classify and decrypt a received push message

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use bitkit_notify::dispatcher::{classify, Dispatch, MessageClass, NotificationDispatcher};
use bitkit_notify::secure_storage::StoredKeyProvider;
use bitkit_notify::NotifyConfig;

use crate::ui;

pub async fn run(
    storage_dir: &Path,
    config: &NotifyConfig,
    input: &Path,
    job_output: Option<&Path>,
) -> Result<()> {
    let raw = super::read_input(input)?;
    let fields: HashMap<String, String> =
        serde_json::from_str(&raw).context("Push message must be a JSON object of strings")?;

    let provider = Arc::new(StoredKeyProvider::new(
        Arc::new(super::key_storage(storage_dir)),
        config.private_key_id.clone(),
    ));
    let dispatcher = NotificationDispatcher::from_config(provider, config);

    ui::header("Push Message");
    let class = match classify(&fields) {
        MessageClass::Plain => "plain",
        MessageClass::Encrypted => "encrypted",
    };
    ui::key_value("Class", class);

    match dispatcher.dispatch(&fields).await {
        Dispatch::Plain => {
            ui::info("Plain message, handled inline by the app");
        }
        Dispatch::Deferred { job, preview } => {
            let notification = job.parse().map_err(anyhow::Error::msg)?;

            ui::key_value("Type", notification.kind.as_str());
            if let Some(title) = &preview.title {
                ui::key_value("Preview Title", title);
            }
            if let Some(body) = &preview.body {
                ui::key_value("Preview Body", body);
            }
            ui::header("Payload");
            ui::json(&notification.payload);

            if let Some(path) = job_output {
                std::fs::write(path, serde_json::to_string_pretty(&job)?)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                ui::success(&format!("Wake job written to {}", path.display()));
            }
        }
        Dispatch::Dropped(err) => {
            bail!("Message dropped (code {}): {err}", err.code() as i32);
        }
    }

    Ok(())
}
