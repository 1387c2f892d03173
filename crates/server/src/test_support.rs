use std::sync::Mutex;

use async_trait::async_trait;
use changereq_core::ChangeRequestRecord;
use changereq_sheets::{InMemoryLedger, LedgerError, LedgerRepository, SheetRecord};
use changereq_slack::blocks::ModalView;
use changereq_slack::{SlackApi, SlackApiError};

#[derive(Clone, Debug)]
pub enum SlackCall {
    OpenView { trigger_id: String, view: ModalView },
    Message { channel: String, text: String },
    Ephemeral { channel: String, user: String, text: String },
}

/// Records every Web API call; optionally rejects some of them.
#[derive(Default)]
pub struct RecordingSlack {
    calls: Mutex<Vec<SlackCall>>,
    reject_views: Option<String>,
    fail_messages: bool,
}

impl RecordingSlack {
    pub fn rejecting_views(error: &str) -> Self {
        Self { reject_views: Some(error.to_string()), ..Self::default() }
    }

    pub fn failing_messages() -> Self {
        Self { fail_messages: true, ..Self::default() }
    }

    pub fn calls(&self) -> Vec<SlackCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn ephemeral_count(&self) -> usize {
        self.calls().iter().filter(|call| matches!(call, SlackCall::Ephemeral { .. })).count()
    }

    fn record(&self, call: SlackCall) {
        self.calls.lock().expect("calls lock").push(call);
    }
}

#[async_trait]
impl SlackApi for RecordingSlack {
    async fn open_view(&self, trigger_id: &str, view: &ModalView) -> Result<(), SlackApiError> {
        if let Some(error) = &self.reject_views {
            return Err(SlackApiError::Api { method: "views.open", error: error.clone() });
        }
        self.record(SlackCall::OpenView { trigger_id: trigger_id.to_string(), view: view.clone() });
        Ok(())
    }

    async fn post_message(&self, channel: &str, text: &str) -> Result<(), SlackApiError> {
        if self.fail_messages {
            return Err(SlackApiError::Api { method: "chat.postMessage", error: "channel_not_found".to_string() });
        }
        self.record(SlackCall::Message { channel: channel.to_string(), text: text.to_string() });
        Ok(())
    }

    async fn post_ephemeral(&self, channel: &str, user: &str, text: &str) -> Result<(), SlackApiError> {
        self.record(SlackCall::Ephemeral {
            channel: channel.to_string(),
            user: user.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }
}

/// Ledger whose reads or appends fail with an API error.
pub struct FailingLedger {
    inner: InMemoryLedger,
    fail_list: bool,
}

impl FailingLedger {
    pub fn on_append() -> Self {
        Self { inner: InMemoryLedger::default(), fail_list: false }
    }

    pub fn on_list() -> Self {
        Self { inner: InMemoryLedger::default(), fail_list: true }
    }

    fn unavailable() -> LedgerError {
        LedgerError::Api { status: 503, message: "The service is currently unavailable.".to_string() }
    }
}

#[async_trait]
impl LedgerRepository for FailingLedger {
    async fn list_records(&self) -> Result<Vec<SheetRecord>, LedgerError> {
        if self.fail_list {
            return Err(Self::unavailable());
        }
        self.inner.list_records().await
    }

    async fn append_row(&self, _record: &ChangeRequestRecord) -> Result<(), LedgerError> {
        Err(Self::unavailable())
    }
}
