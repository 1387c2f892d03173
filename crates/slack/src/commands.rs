use serde::Deserialize;
use thiserror::Error;

/// Form-encoded body Slack posts when a user runs the slash command.
///
/// Every field defaults to empty so that a partial payload still
/// deserializes; the handler decides what is actually required.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct SlashCommandPayload {
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub trigger_id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub team_id: String,
    #[serde(default)]
    pub response_url: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("invalid_trigger_id")]
    MissingTriggerId,
}

impl SlashCommandPayload {
    pub fn trigger_id(&self) -> Result<&str, CommandParseError> {
        let trigger_id = self.trigger_id.trim();
        if trigger_id.is_empty() {
            return Err(CommandParseError::MissingTriggerId);
        }
        Ok(trigger_id)
    }
}
