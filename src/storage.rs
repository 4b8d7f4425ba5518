//! Persistence for completion payloads.

use color_eyre::{eyre::WrapErr, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Write `payload` as pretty JSON to `writer`, followed by a newline.
pub fn write_result<W: Write>(payload: &serde_json::Value, mut writer: W) -> Result<()> {
    let json = serde_json::to_string_pretty(payload).wrap_err("Failed to serialize result")?;
    writer
        .write_all(json.as_bytes())
        .and_then(|_| writer.write_all(b"\n"))
        .and_then(|_| writer.flush())
        .wrap_err("Failed to write result")?;
    Ok(())
}

/// Save `payload` to `path`, creating parent directories as needed.
pub fn save_result(payload: &serde_json::Value, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            fs::create_dir_all(parent)
                .wrap_err(format!("Failed to create directory {:?}", parent))?;
        }
    }
    let file = fs::File::create(path).wrap_err(format!("Failed to create {:?}", path))?;
    write_result(payload, file).wrap_err(format!("Failed to write result to {:?}", path))?;
    tracing::info!("Saved result to {:?}", path);
    Ok(())
}

/// Load a previously saved result.
pub fn load_result(path: &Path) -> Result<serde_json::Value> {
    let json =
        fs::read_to_string(path).wrap_err(format!("Failed to read result from {:?}", path))?;
    let payload = serde_json::from_str(&json).wrap_err("Failed to deserialize result")?;
    Ok(payload)
}
