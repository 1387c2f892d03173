use std::sync::Arc;

use changereq_core::config::{AppConfig, FormConfig, SubmissionConfig};
use changereq_core::Clock;
use changereq_sheets::LedgerRepository;
use changereq_slack::signature::SignatureVerifier;
use changereq_slack::SlackApi;

/// Settings the handlers read on every request.
#[derive(Clone, Debug)]
pub struct BridgeSettings {
    pub form: FormConfig,
    pub notify_channel: String,
    pub id_column: String,
    pub submission: SubmissionConfig,
}

impl BridgeSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            form: config.form.clone(),
            notify_channel: config.slack.notify_channel.clone(),
            id_column: config.sheets.id_column.clone(),
            submission: config.submission.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub slack: Arc<dyn SlackApi>,
    pub ledger: Arc<dyn LedgerRepository>,
    pub clock: Arc<dyn Clock>,
    pub settings: Arc<BridgeSettings>,
    pub verifier: Option<Arc<SignatureVerifier>>,
}

impl AppState {
    pub fn new(
        slack: Arc<dyn SlackApi>,
        ledger: Arc<dyn LedgerRepository>,
        clock: Arc<dyn Clock>,
        settings: BridgeSettings,
    ) -> Self {
        Self { slack, ledger, clock, settings: Arc::new(settings), verifier: None }
    }

    pub fn with_verifier(mut self, verifier: SignatureVerifier) -> Self {
        self.verifier = Some(Arc::new(verifier));
        self
    }
}
