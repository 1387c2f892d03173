//! Form submission workflow: id generation, ledger append, channel
//! notification, and the single failure notice.

use std::collections::BTreeMap;
use std::fmt;

use changereq_core::{ApplicationError, RequestId};
use changereq_sheets::next_request_id;
use changereq_slack::blocks::change_request_notification;
use changereq_slack::interactivity::ViewSubmission;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::state::{AppState, BridgeSettings};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmissionStage {
    Received,
    Parsed,
    IdGenerated,
    Appended,
    Notified,
    Done,
}

impl SubmissionStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Parsed => "parsed",
            Self::IdGenerated => "id_generated",
            Self::Appended => "appended",
            Self::Notified => "notified",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for SubmissionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Completed { request_id: RequestId },
    /// `stage` is the last stage reached before `error`.
    Failed { stage: SubmissionStage, error: ApplicationError, notice_delivered: bool },
}

/// Body returned to Slack for a `view_submission`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SubmissionResponse {
    Close {},
    Errors { response_action: &'static str, errors: BTreeMap<String, String> },
}

impl SubmissionOutcome {
    pub fn response(&self, settings: &BridgeSettings) -> SubmissionResponse {
        match self {
            Self::Failed { .. } if !settings.submission.close_modal_on_failure => {
                let errors = BTreeMap::from([(
                    settings.form.company.block_id.clone(),
                    settings.submission.failure_notice.clone(),
                )]);
                SubmissionResponse::Errors { response_action: "errors", errors }
            }
            _ => SubmissionResponse::Close {},
        }
    }
}

pub async fn process_submission(state: &AppState, submission: &ViewSubmission) -> SubmissionOutcome {
    let mut stage = SubmissionStage::Parsed;

    match run(state, submission, &mut stage).await {
        Ok(request_id) => {
            info!(
                event_name = "submission.completed",
                request_id = %request_id,
                user_id = %submission.user_id,
                stage = %SubmissionStage::Done,
                "change request recorded and announced"
            );
            SubmissionOutcome::Completed { request_id }
        }
        Err(failure) => {
            error!(
                event_name = "submission.failed",
                user_id = %submission.user_id,
                stage = %stage,
                error_class = failure.error_class(),
                error = %failure,
                "error processing form submission"
            );
            let notice_delivered = send_failure_notice(state, &submission.user_id).await;
            SubmissionOutcome::Failed { stage, error: failure, notice_delivered }
        }
    }
}

async fn run(
    state: &AppState,
    submission: &ViewSubmission,
    stage: &mut SubmissionStage,
) -> Result<RequestId, ApplicationError> {
    let settings = &state.settings;
    let form = submission.extract_form(&settings.form)?;
    info!(
        event_name = "submission.parsed",
        user_id = %submission.user_id,
        company = %form.company_name,
        license_type = %form.license_type,
        quantity = %form.quantity,
        "form submitted"
    );

    let request_id =
        next_request_id(state.ledger.as_ref(), &settings.id_column, state.clock.today()).await?;
    *stage = SubmissionStage::IdGenerated;

    let record = form.into_record(request_id.clone(), submission.user_id.clone());
    state.ledger.append_row(&record).await?;
    *stage = SubmissionStage::Appended;

    state
        .slack
        .post_message(&settings.notify_channel, &change_request_notification(&record))
        .await?;
    *stage = SubmissionStage::Notified;

    Ok(request_id)
}

/// The notice goes to the submitting user's own channel.
async fn send_failure_notice(state: &AppState, user_id: &str) -> bool {
    let notice = &state.settings.submission.failure_notice;
    match state.slack.post_ephemeral(user_id, user_id, notice).await {
        Ok(()) => true,
        Err(notice_error) => {
            warn!(
                event_name = "submission.notice_failed",
                user_id = %user_id,
                error = %notice_error,
                "failure notice could not be delivered"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use changereq_core::config::{AppConfig, FormConfig};
    use changereq_core::{ApplicationError, DomainError, FixedClock, RequestId};
    use changereq_sheets::InMemoryLedger;
    use changereq_slack::interactivity::{ActionState, ViewSubmission};
    use chrono::NaiveDate;

    use super::{process_submission, SubmissionOutcome, SubmissionResponse, SubmissionStage};
    use crate::state::{AppState, BridgeSettings};
    use crate::test_support::{FailingLedger, RecordingSlack, SlackCall};

    fn submission(values: &[(&str, &str, &str)]) -> ViewSubmission {
        let mut state: HashMap<String, HashMap<String, ActionState>> = HashMap::new();
        for (block, action, value) in values {
            state
                .entry(block.to_string())
                .or_default()
                .insert(action.to_string(), ActionState { value: Some(value.to_string()) });
        }
        ViewSubmission {
            user_id: "U123".to_string(),
            callback_id: Some(FormConfig::default().callback_id),
            values: state,
        }
    }

    fn full_submission() -> ViewSubmission {
        submission(&[
            ("company_name", "company_input", "Acme"),
            ("license_type", "license_input", "Pro"),
            ("quantity", "quantity_input", "10"),
        ])
    }

    fn app_state(
        slack: Arc<RecordingSlack>,
        ledger: Arc<dyn changereq_sheets::LedgerRepository>,
    ) -> AppState {
        let mut config = AppConfig::default();
        config.slack.notify_channel = "C0NOTIFY".to_string();
        AppState::new(
            slack,
            ledger,
            Arc::new(FixedClock(NaiveDate::from_ymd_opt(2025, 1, 1).expect("date"))),
            BridgeSettings::from_config(&config),
        )
    }

    #[tokio::test]
    async fn completed_submission_appends_then_notifies() {
        let slack = Arc::new(RecordingSlack::default());
        let ledger = Arc::new(InMemoryLedger::default().with_rows(vec![
            vec!["010125-01".into(), "U9".into(), "Old".into(), "Basic".into(), "1".into()],
            vec!["123124-01".into(), "U9".into(), "Old".into(), "Basic".into(), "1".into()],
        ]));
        let state = app_state(slack.clone(), ledger.clone());

        let outcome = process_submission(&state, &full_submission()).await;

        assert_eq!(outcome, SubmissionOutcome::Completed { request_id: RequestId("010125-02".into()) });
        let rows = ledger.rows().await;
        let expected: Vec<String> =
            ["010125-02", "U123", "Acme", "Pro", "10"].into_iter().map(String::from).collect();
        assert_eq!(rows.last(), Some(&expected));

        let calls = slack.calls();
        assert_eq!(calls.len(), 1);
        assert!(matches!(
            &calls[0],
            SlackCall::Message { channel, text } if channel == "C0NOTIFY" && text.contains("*CORID:* 010125-02")
        ));
        assert_eq!(outcome.response(&state.settings), SubmissionResponse::Close {});
    }

    #[tokio::test]
    async fn append_failure_sends_one_notice_to_the_user() {
        let slack = Arc::new(RecordingSlack::default());
        let state = app_state(slack.clone(), Arc::new(FailingLedger::on_append()));

        let outcome = process_submission(&state, &full_submission()).await;

        let SubmissionOutcome::Failed { stage, error, notice_delivered } = &outcome else {
            panic!("expected a failed outcome");
        };
        assert_eq!(*stage, SubmissionStage::IdGenerated);
        assert!(matches!(error, ApplicationError::Ledger(_)));
        assert!(notice_delivered);

        let calls = slack.calls();
        assert_eq!(calls.len(), 1);
        assert!(matches!(
            &calls[0],
            SlackCall::Ephemeral { channel, user, .. } if channel == "U123" && user == "U123"
        ));
        assert_eq!(outcome.response(&state.settings), SubmissionResponse::Close {});
    }

    #[tokio::test]
    async fn notify_failure_happens_after_append() {
        let slack = Arc::new(RecordingSlack::failing_messages());
        let ledger = Arc::new(InMemoryLedger::default());
        let state = app_state(slack.clone(), ledger.clone());

        let outcome = process_submission(&state, &full_submission()).await;

        assert!(matches!(
            outcome,
            SubmissionOutcome::Failed { stage: SubmissionStage::Appended, error: ApplicationError::Chat(_), .. }
        ));
        assert_eq!(ledger.rows().await.len(), 1);
        assert_eq!(slack.ephemeral_count(), 1);
    }

    #[tokio::test]
    async fn missing_field_fails_before_touching_the_ledger() {
        let slack = Arc::new(RecordingSlack::default());
        let ledger = Arc::new(InMemoryLedger::default());
        let state = app_state(slack.clone(), ledger.clone());

        let outcome = process_submission(
            &state,
            &submission(&[("company_name", "company_input", "Acme")]),
        )
        .await;

        assert!(matches!(
            outcome,
            SubmissionOutcome::Failed {
                stage: SubmissionStage::Parsed,
                error: ApplicationError::Domain(DomainError::MissingField { .. }),
                notice_delivered: true,
            }
        ));
        assert!(ledger.rows().await.is_empty());
        assert_eq!(slack.ephemeral_count(), 1);
    }

    #[tokio::test]
    async fn keep_modal_open_policy_returns_field_errors() {
        let slack = Arc::new(RecordingSlack::default());
        let mut state = app_state(slack, Arc::new(FailingLedger::on_list()));
        let mut settings = (*state.settings).clone();
        settings.submission.close_modal_on_failure = false;
        state.settings = Arc::new(settings);

        let outcome = process_submission(&state, &full_submission()).await;

        let body = serde_json::to_value(outcome.response(&state.settings)).expect("json");
        assert_eq!(body["response_action"], "errors");
        assert_eq!(body["errors"]["company_name"], state.settings.submission.failure_notice.as_str());
    }

    #[test]
    fn close_response_serializes_to_empty_object() {
        let body = serde_json::to_value(SubmissionResponse::Close {}).expect("json");
        assert_eq!(body, serde_json::json!({}));
    }
}
