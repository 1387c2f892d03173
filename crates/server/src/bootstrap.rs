use std::sync::Arc;

use changereq_core::config::{AppConfig, ConfigError, LoadOptions};
use changereq_core::SystemClock;
use changereq_sheets::{AuthError, GoogleSheetsLedger, ServiceAccountTokenSource};
use changereq_slack::signature::SignatureVerifier;
use changereq_slack::SlackWebClient;
use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::info;

use crate::state::{AppState, BridgeSettings};

pub struct Application {
    pub config: AppConfig,
    pub state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("service account setup failed: {0}")]
    Credentials(#[from] AuthError),
}

pub fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config)
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let tokens = ServiceAccountTokenSource::from_json(config.sheets.credentials_json.expose_secret())?;
    info!(
        event_name = "system.bootstrap.credentials_loaded",
        correlation_id = "bootstrap",
        client_email = %tokens.client_email(),
        "service account credentials parsed"
    );

    let ledger = GoogleSheetsLedger::new(
        Arc::new(tokens),
        config.sheets.spreadsheet_id.clone(),
        config.sheets.worksheet.clone(),
    );
    let slack = SlackWebClient::new(config.slack.bot_token.clone());

    let mut state = AppState::new(
        Arc::new(slack),
        Arc::new(ledger),
        Arc::new(SystemClock),
        BridgeSettings::from_config(&config),
    );
    if let Some(secret) = &config.slack.signing_secret {
        state = state.with_verifier(SignatureVerifier::new(secret.clone()));
    }

    info!(
        event_name = "system.bootstrap.ready",
        correlation_id = "bootstrap",
        worksheet = %config.sheets.worksheet,
        notify_channel = %config.slack.notify_channel,
        signature_verification = state.verifier.is_some(),
        "application bootstrap complete"
    );

    Ok(Application { config, state })
}
