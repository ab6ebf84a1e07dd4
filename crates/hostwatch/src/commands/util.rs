//! Shared helpers for command handlers.

use std::io::IsTerminal;

use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal on stdin the prompt cannot be answered, so the
/// operation is refused instead.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Parse a `--metadata` argument into a JSON object.
pub fn parse_metadata(raw: &str) -> Result<serde_json::Map<String, serde_json::Value>, CliError> {
    match serde_json::from_str(raw) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(_) => Err(CliError::Validation {
            field: "metadata".into(),
            reason: "expected a JSON object".into(),
        }),
        Err(e) => Err(CliError::Validation {
            field: "metadata".into(),
            reason: format!("invalid JSON: {e}"),
        }),
    }
}
