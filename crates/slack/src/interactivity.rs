use std::collections::HashMap;

use changereq_core::config::{FieldConfig, FormConfig};
use changereq_core::{ChangeRequestForm, DomainError};
use serde::Deserialize;
use thiserror::Error;

pub const VIEW_SUBMISSION: &str = "view_submission";

#[derive(Debug, Error)]
pub enum InteractionParseError {
    #[error("interaction payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("view_submission payload has no {0}")]
    Incomplete(&'static str),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ActionState {
    #[serde(default)]
    pub value: Option<String>,
}

/// block_id → action_id → submitted state.
pub type StateValues = HashMap<String, HashMap<String, ActionState>>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewSubmission {
    pub user_id: String,
    pub callback_id: Option<String>,
    pub values: StateValues,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Interaction {
    ViewSubmission(ViewSubmission),
    Other { interaction_type: String },
}

impl Interaction {
    pub fn interaction_type(&self) -> &str {
        match self {
            Self::ViewSubmission(_) => VIEW_SUBMISSION,
            Self::Other { interaction_type } => interaction_type,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawInteraction {
    #[serde(rename = "type", default)]
    interaction_type: String,
    #[serde(default)]
    user: Option<RawUser>,
    #[serde(default)]
    view: Option<RawView>,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RawView {
    #[serde(default)]
    callback_id: Option<String>,
    #[serde(default)]
    state: RawState,
}

#[derive(Debug, Default, Deserialize)]
struct RawState {
    #[serde(default)]
    values: StateValues,
}

/// Parses the JSON carried in the `payload` form field of an interactivity request.
pub fn parse_interaction(raw: &str) -> Result<Interaction, InteractionParseError> {
    let raw: RawInteraction = serde_json::from_str(raw)?;
    if raw.interaction_type != VIEW_SUBMISSION {
        return Ok(Interaction::Other { interaction_type: raw.interaction_type });
    }

    let user = raw.user.ok_or(InteractionParseError::Incomplete("user"))?;
    let view = raw.view.ok_or(InteractionParseError::Incomplete("view"))?;

    Ok(Interaction::ViewSubmission(ViewSubmission {
        user_id: user.id,
        callback_id: view.callback_id.filter(|id| !id.is_empty()),
        values: view.state.values,
    }))
}

impl ViewSubmission {
    /// Submissions without a callback id are accepted for the form as well.
    pub fn is_for(&self, form: &FormConfig) -> bool {
        self.callback_id.as_deref().map_or(true, |id| id == form.callback_id)
    }

    pub fn value(&self, field: &FieldConfig) -> Result<&str, DomainError> {
        self.values
            .get(&field.block_id)
            .and_then(|actions| actions.get(&field.action_id))
            .and_then(|state| state.value.as_deref())
            .ok_or_else(|| DomainError::MissingField {
                block_id: field.block_id.clone(),
                action_id: field.action_id.clone(),
            })
    }

    pub fn extract_form(&self, form: &FormConfig) -> Result<ChangeRequestForm, DomainError> {
        Ok(ChangeRequestForm {
            company_name: self.value(&form.company)?.to_string(),
            license_type: self.value(&form.license_type)?.to_string(),
            quantity: self.value(&form.quantity)?.to_string(),
        })
    }
}
