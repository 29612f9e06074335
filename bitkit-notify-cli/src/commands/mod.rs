//! CLI command implementations

pub mod keygen;
pub mod open;
pub mod seal;
pub mod simulate;
pub mod whoami;

use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_json::Value;

use crate::storage::FileKeyStorage;

/// Key store rooted at the storage directory
pub fn key_storage(storage_dir: &Path) -> FileKeyStorage {
    FileKeyStorage::new(storage_dir)
}

/// Parse a notification payload. Must be a JSON object.
pub fn parse_payload(json: &str) -> Result<Value> {
    let payload: Value = serde_json::from_str(json).context("Payload is not valid JSON")?;
    if !payload.is_object() {
        bail!("Payload must be a JSON object");
    }
    Ok(payload)
}

/// Read a file, or stdin when the path is `-`
pub fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut input = String::new();
        std::io::stdin()
            .read_to_string(&mut input)
            .context("Failed to read stdin")?;
        return Ok(input);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Write JSON to `path`, or print it to stdout
pub fn write_or_print(path: Option<&Path>, value: &Value) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match path {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            println!("{}", json);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_payload() {
        assert!(parse_payload(r#"{"orderId": "o1"}"#).is_ok());
        assert!(parse_payload("[]").is_err());
        assert!(parse_payload("nope").is_err());
    }
}
