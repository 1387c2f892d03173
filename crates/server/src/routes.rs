use axum::{
    extract::{rejection::FormRejection, State},
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Response},
    routing::post,
    Form, Json, Router,
};
use changereq_slack::blocks::change_request_modal;
use changereq_slack::commands::SlashCommandPayload;
use changereq_slack::interactivity::{parse_interaction, Interaction};
use changereq_slack::SlackApiError;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::health;
use crate::middleware::{log_request, verify_signature};
use crate::state::AppState;
use crate::submission::{process_submission, SubmissionStage};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MessageResponse {
    pub response: &'static str,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct InteractivityForm {
    #[serde(default)]
    pub payload: String,
}

const MODAL_OPENED: &str = "Modal opened successfully.";
const NO_ACTION: &str = "No action taken.";

pub fn router(state: AppState) -> Router {
    let slack_routes = Router::new()
        .route("/changereq", post(open_change_request_modal))
        .route("/slack/interactivity", post(handle_interactivity))
        .route_layer(from_fn_with_state(state.clone(), verify_signature));

    Router::new()
        .merge(health::router::<AppState>())
        .merge(slack_routes)
        .layer(from_fn(log_request))
        .with_state(state)
}

fn slack_api_error(error: SlackApiError) -> Response {
    match error {
        SlackApiError::Api { error: code, .. } => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse { error: format!("Slack API Error: {code}") }),
        )
            .into_response(),
        other => {
            (StatusCode::BAD_GATEWAY, Json(ErrorResponse { error: other.to_string() })).into_response()
        }
    }
}

async fn open_change_request_modal(
    State(state): State<AppState>,
    payload: Result<Form<SlashCommandPayload>, FormRejection>,
) -> Response {
    let Form(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!(
                event_name = "slack.command.rejected",
                error = %rejection,
                "slash command body is not a form"
            );
            return (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: rejection.body_text() }))
                .into_response();
        }
    };

    info!(
        event_name = "slack.command.received",
        command = %payload.command,
        user_id = %payload.user_id,
        channel_id = %payload.channel_id,
        "received slash command"
    );

    let trigger_id = match payload.trigger_id() {
        Ok(trigger_id) => trigger_id,
        Err(error) => {
            warn!(event_name = "slack.command.rejected", error = %error, "slash command has no trigger id");
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse { error: format!("Slack API Error: {error}") }),
            )
                .into_response();
        }
    };

    let modal = change_request_modal(&state.settings.form);
    match state.slack.open_view(trigger_id, &modal).await {
        Ok(()) => {
            info!(event_name = "slack.modal.opened", user_id = %payload.user_id, "modal opened");
            Json(MessageResponse { response: MODAL_OPENED }).into_response()
        }
        Err(slack_error) => {
            error!(event_name = "slack.modal.failed", error = %slack_error, "could not open modal");
            slack_api_error(slack_error)
        }
    }
}

async fn handle_interactivity(
    State(state): State<AppState>,
    form: Result<Form<InteractivityForm>, FormRejection>,
) -> Response {
    let Form(form) = match form {
        Ok(form) => form,
        Err(rejection) => {
            warn!(
                event_name = "slack.interaction.unparseable",
                stage = %SubmissionStage::Received,
                error = %rejection,
                "ignoring interactivity request that is not a form"
            );
            return Json(serde_json::json!({})).into_response();
        }
    };

    let interaction = match parse_interaction(&form.payload) {
        Ok(interaction) => interaction,
        Err(parse_error) => {
            warn!(
                event_name = "slack.interaction.unparseable",
                stage = %SubmissionStage::Received,
                error = %parse_error,
                "ignoring unparseable interactivity payload"
            );
            return Json(serde_json::json!({})).into_response();
        }
    };
    info!(
        event_name = "slack.interaction.received",
        interaction_type = interaction.interaction_type(),
        stage = %SubmissionStage::Parsed,
        "received interactivity payload"
    );

    match interaction {
        Interaction::ViewSubmission(submission) if submission.is_for(&state.settings.form) => {
            let outcome = process_submission(&state, &submission).await;
            Json(outcome.response(&state.settings)).into_response()
        }
        _ => Json(MessageResponse { response: NO_ACTION }).into_response(),
    }
}
