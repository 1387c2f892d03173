use std::env;
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_FAILURE_NOTICE: &str = "An error occurred while processing your request. The form data may have been submitted. Please check and try again if necessary.";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub slack: SlackConfig,
    pub sheets: SheetsConfig,
    pub form: FormConfig,
    pub server: ServerConfig,
    pub submission: SubmissionConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct SlackConfig {
    pub bot_token: SecretString,
    pub signing_secret: Option<SecretString>,
    pub notify_channel: String,
}

#[derive(Clone, Debug)]
pub struct SheetsConfig {
    pub credentials_json: SecretString,
    pub spreadsheet_id: String,
    pub worksheet: String,
    pub id_column: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldConfig {
    pub block_id: String,
    pub action_id: String,
    pub label: String,
}

impl FieldConfig {
    fn new(block_id: &str, action_id: &str, label: &str) -> Self {
        Self { block_id: block_id.to_owned(), action_id: action_id.to_owned(), label: label.to_owned() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormConfig {
    pub callback_id: String,
    pub title: String,
    pub submit_label: String,
    pub company: FieldConfig,
    pub license_type: FieldConfig,
    pub quantity: FieldConfig,
}

impl FormConfig {
    pub fn fields(&self) -> [&FieldConfig; 3] {
        [&self.company, &self.license_type, &self.quantity]
    }
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            callback_id: "change_request_form".to_owned(),
            title: "Change Request Form".to_owned(),
            submit_label: "Submit".to_owned(),
            company: FieldConfig::new("company_name", "company_input", "Company Name"),
            license_type: FieldConfig::new("license_type", "license_input", "License Type"),
            quantity: FieldConfig::new("quantity", "quantity_input", "Quantity"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

impl ServerConfig {
    /// `bind_address` must be an IP literal; `::` binds every IPv6 interface.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = self.bind_address.trim().parse::<IpAddr>().map_err(|_| {
            ConfigError::Validation(format!(
                "server.bind_address `{}` is not an IP address",
                self.bind_address
            ))
        })?;
        Ok(SocketAddr::from((ip, self.port)))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmissionConfig {
    /// Answer a failed submission with an empty body so Slack closes the modal.
    pub close_modal_on_failure: bool,
    pub failure_notice: String,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self { close_modal_on_failure: true, failure_notice: DEFAULT_FAILURE_NOTICE.to_owned() }
    }
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub slack_bot_token: Option<String>,
    pub slack_signing_secret: Option<String>,
    pub notify_channel: Option<String>,
    pub google_credentials_json: Option<String>,
    pub spreadsheet_id: Option<String>,
    pub port: Option<u16>,
    pub close_modal_on_failure: Option<bool>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

/// Environment variables consulted for each setting, highest priority first.
pub mod env_keys {
    pub const SLACK_BOT_TOKEN: &[&str] = &["SLACK_BOT_TOKEN", "CHANGEREQ_SLACK_BOT_TOKEN"];
    pub const SLACK_SIGNING_SECRET: &[&str] =
        &["SLACK_SIGNING_SECRET", "CHANGEREQ_SLACK_SIGNING_SECRET"];
    pub const SLACK_NOTIFY_CHANNEL: &[&str] = &["CHANGEREQ_SLACK_NOTIFY_CHANNEL"];
    pub const GOOGLE_CREDENTIALS_JSON: &[&str] =
        &["GOOGLE_CREDENTIALS_JSON", "CHANGEREQ_SHEETS_CREDENTIALS_JSON"];
    pub const GOOGLE_SHEET_ID: &[&str] = &["GOOGLE_SHEET_ID", "CHANGEREQ_SHEETS_SPREADSHEET_ID"];
    pub const SHEETS_WORKSHEET: &[&str] = &["CHANGEREQ_SHEETS_WORKSHEET"];
    pub const SHEETS_ID_COLUMN: &[&str] = &["CHANGEREQ_SHEETS_ID_COLUMN"];
    pub const SERVER_BIND_ADDRESS: &[&str] = &["CHANGEREQ_SERVER_BIND_ADDRESS"];
    pub const SERVER_PORT: &[&str] = &["CHANGEREQ_SERVER_PORT", "PORT"];
    pub const CLOSE_MODAL_ON_FAILURE: &[&str] = &["CHANGEREQ_SUBMISSION_CLOSE_MODAL_ON_FAILURE"];
    pub const FAILURE_NOTICE: &[&str] = &["CHANGEREQ_SUBMISSION_FAILURE_NOTICE"];
    pub const LOG_LEVEL: &[&str] = &["CHANGEREQ_LOGGING_LEVEL", "CHANGEREQ_LOG_LEVEL"];
    pub const LOG_FORMAT: &[&str] = &["CHANGEREQ_LOGGING_FORMAT", "CHANGEREQ_LOG_FORMAT"];

    pub const ALL: &[&[&str]] = &[
        SLACK_BOT_TOKEN,
        SLACK_SIGNING_SECRET,
        SLACK_NOTIFY_CHANNEL,
        GOOGLE_CREDENTIALS_JSON,
        GOOGLE_SHEET_ID,
        SHEETS_WORKSHEET,
        SHEETS_ID_COLUMN,
        SERVER_BIND_ADDRESS,
        SERVER_PORT,
        CLOSE_MODAL_ON_FAILURE,
        FAILURE_NOTICE,
        LOG_LEVEL,
        LOG_FORMAT,
    ];
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            slack: SlackConfig {
                bot_token: String::new().into(),
                signing_secret: None,
                notify_channel: String::new(),
            },
            sheets: SheetsConfig {
                credentials_json: String::new().into(),
                spreadsheet_id: String::new(),
                worksheet: "Sheet1".to_string(),
                id_column: "CORID".to_string(),
            },
            form: FormConfig::default(),
            server: ServerConfig { bind_address: "0.0.0.0".to_string(), port: 8080 },
            submission: SubmissionConfig::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("changereq.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(slack) = patch.slack {
            if let Some(bot_token) = slack.bot_token {
                self.slack.bot_token = secret_value(bot_token);
            }
            if let Some(signing_secret) = slack.signing_secret {
                self.slack.signing_secret = Some(secret_value(signing_secret));
            }
            if let Some(notify_channel) = slack.notify_channel {
                self.slack.notify_channel = notify_channel;
            }
        }

        if let Some(sheets) = patch.sheets {
            if let Some(credentials_json) = sheets.credentials_json {
                self.sheets.credentials_json = secret_value(credentials_json);
            }
            if let Some(spreadsheet_id) = sheets.spreadsheet_id {
                self.sheets.spreadsheet_id = spreadsheet_id;
            }
            if let Some(worksheet) = sheets.worksheet {
                self.sheets.worksheet = worksheet;
            }
            if let Some(id_column) = sheets.id_column {
                self.sheets.id_column = id_column;
            }
        }

        if let Some(form) = patch.form {
            if let Some(callback_id) = form.callback_id {
                self.form.callback_id = callback_id;
            }
            if let Some(title) = form.title {
                self.form.title = title;
            }
            if let Some(submit_label) = form.submit_label {
                self.form.submit_label = submit_label;
            }
            apply_field_patch(&mut self.form.company, form.company);
            apply_field_patch(&mut self.form.license_type, form.license_type);
            apply_field_patch(&mut self.form.quantity, form.quantity);
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
        }

        if let Some(submission) = patch.submission {
            if let Some(close_modal_on_failure) = submission.close_modal_on_failure {
                self.submission.close_modal_on_failure = close_modal_on_failure;
            }
            if let Some(failure_notice) = submission.failure_notice {
                self.submission.failure_notice = failure_notice;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env(env_keys::SLACK_BOT_TOKEN) {
            self.slack.bot_token = secret_value(value);
        }
        if let Some(value) = read_env(env_keys::SLACK_SIGNING_SECRET) {
            self.slack.signing_secret = Some(secret_value(value));
        }
        if let Some(value) = read_env(env_keys::SLACK_NOTIFY_CHANNEL) {
            self.slack.notify_channel = value;
        }

        if let Some(value) = read_env(env_keys::GOOGLE_CREDENTIALS_JSON) {
            self.sheets.credentials_json = secret_value(value);
        }
        if let Some(value) = read_env(env_keys::GOOGLE_SHEET_ID) {
            self.sheets.spreadsheet_id = value;
        }
        if let Some(value) = read_env(env_keys::SHEETS_WORKSHEET) {
            self.sheets.worksheet = value;
        }
        if let Some(value) = read_env(env_keys::SHEETS_ID_COLUMN) {
            self.sheets.id_column = value;
        }

        if let Some(value) = read_env(env_keys::SERVER_BIND_ADDRESS) {
            self.server.bind_address = value;
        }
        if let Some((key, value)) = read_env_with_key(env_keys::SERVER_PORT) {
            self.server.port = parse_u16(key, &value)?;
        }

        if let Some((key, value)) = read_env_with_key(env_keys::CLOSE_MODAL_ON_FAILURE) {
            self.submission.close_modal_on_failure = parse_bool(key, &value)?;
        }
        if let Some(value) = read_env(env_keys::FAILURE_NOTICE) {
            self.submission.failure_notice = value;
        }

        if let Some(value) = read_env(env_keys::LOG_LEVEL) {
            self.logging.level = value;
        }
        if let Some(value) = read_env(env_keys::LOG_FORMAT) {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(bot_token) = overrides.slack_bot_token {
            self.slack.bot_token = secret_value(bot_token);
        }
        if let Some(signing_secret) = overrides.slack_signing_secret {
            self.slack.signing_secret = Some(secret_value(signing_secret));
        }
        if let Some(notify_channel) = overrides.notify_channel {
            self.slack.notify_channel = notify_channel;
        }
        if let Some(credentials_json) = overrides.google_credentials_json {
            self.sheets.credentials_json = secret_value(credentials_json);
        }
        if let Some(spreadsheet_id) = overrides.spreadsheet_id {
            self.sheets.spreadsheet_id = spreadsheet_id;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(close_modal_on_failure) = overrides.close_modal_on_failure {
            self.submission.close_modal_on_failure = close_modal_on_failure;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_slack(&self.slack)?;
        validate_sheets(&self.sheets)?;
        validate_form(&self.form)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn apply_field_patch(field: &mut FieldConfig, patch: Option<FieldPatch>) {
    let Some(patch) = patch else {
        return;
    };
    if let Some(block_id) = patch.block_id {
        field.block_id = block_id;
    }
    if let Some(action_id) = patch.action_id {
        field.action_id = action_id;
    }
    if let Some(label) = patch.label {
        field.label = label;
    }
}

pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("changereq.toml"), PathBuf::from("config/changereq.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_slack(slack: &SlackConfig) -> Result<(), ConfigError> {
    let bot_token = slack.bot_token.expose_secret();
    if bot_token.trim().is_empty() {
        return Err(ConfigError::Validation(
            "slack.bot_token is required (set SLACK_BOT_TOKEN). Get it from https://api.slack.com/apps > Your App > OAuth & Permissions > Bot User OAuth Token".to_string(),
        ));
    }
    if !bot_token.starts_with("xoxb-") {
        let hint = if bot_token.starts_with("xapp-") {
            " (hint: you may have used the app-level token instead of the bot token)"
        } else {
            ""
        };
        return Err(ConfigError::Validation(format!(
            "slack.bot_token must start with `xoxb-`{hint}"
        )));
    }

    if let Some(secret) = &slack.signing_secret {
        if secret.expose_secret().trim().is_empty() {
            return Err(ConfigError::Validation(
                "slack.signing_secret must not be blank when set".to_string(),
            ));
        }
    }

    if slack.notify_channel.trim().is_empty() {
        return Err(ConfigError::Validation(
            "slack.notify_channel is required (set CHANGEREQ_SLACK_NOTIFY_CHANNEL)".to_string(),
        ));
    }

    Ok(())
}

fn validate_sheets(sheets: &SheetsConfig) -> Result<(), ConfigError> {
    let raw = sheets.credentials_json.expose_secret();
    if raw.trim().is_empty() {
        return Err(ConfigError::Validation(
            "sheets.credentials_json is required (set GOOGLE_CREDENTIALS_JSON to the service account key document)".to_string(),
        ));
    }

    let document: serde_json::Value = serde_json::from_str(raw).map_err(|error| {
        ConfigError::Validation(format!("sheets.credentials_json is not valid JSON: {error}"))
    })?;
    for field in ["client_email", "private_key"] {
        let present = document
            .get(field)
            .and_then(serde_json::Value::as_str)
            .map(|value| !value.trim().is_empty())
            .unwrap_or(false);
        if !present {
            return Err(ConfigError::Validation(format!(
                "sheets.credentials_json is missing `{field}`"
            )));
        }
    }

    if sheets.spreadsheet_id.trim().is_empty() {
        return Err(ConfigError::Validation(
            "sheets.spreadsheet_id is required (set GOOGLE_SHEET_ID)".to_string(),
        ));
    }
    if sheets.worksheet.trim().is_empty() {
        return Err(ConfigError::Validation("sheets.worksheet must not be empty".to_string()));
    }
    if sheets.id_column.trim().is_empty() {
        return Err(ConfigError::Validation("sheets.id_column must not be empty".to_string()));
    }

    Ok(())
}

fn validate_form(form: &FormConfig) -> Result<(), ConfigError> {
    if form.callback_id.trim().is_empty() {
        return Err(ConfigError::Validation("form.callback_id must not be empty".to_string()));
    }

    let fields = form.fields();
    for field in fields {
        if field.block_id.trim().is_empty() || field.action_id.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "form field `{}` needs both block_id and action_id",
                field.label
            )));
        }
    }
    for (index, field) in fields.iter().enumerate() {
        if fields[index + 1..].iter().any(|other| other.block_id == field.block_id) {
            return Err(ConfigError::Validation(format!(
                "form block_id `{}` is used by more than one field",
                field.block_id
            )));
        }
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation("server.bind_address must not be empty".to_string()));
    }
    server.socket_addr().map(|_| ())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(keys: &[&'static str]) -> Option<String> {
    read_env_with_key(keys).map(|(_, value)| value)
}

fn read_env_with_key(keys: &[&'static str]) -> Option<(&'static str, String)> {
    keys.iter().find_map(|key| {
        env::var(key).ok().filter(|value| !value.trim().is_empty()).map(|value| (*key, value))
    })
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.trim().parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.trim().parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    slack: Option<SlackPatch>,
    sheets: Option<SheetsPatch>,
    form: Option<FormPatch>,
    server: Option<ServerPatch>,
    submission: Option<SubmissionPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct SlackPatch {
    bot_token: Option<String>,
    signing_secret: Option<String>,
    notify_channel: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SheetsPatch {
    credentials_json: Option<String>,
    spreadsheet_id: Option<String>,
    worksheet: Option<String>,
    id_column: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FormPatch {
    callback_id: Option<String>,
    title: Option<String>,
    submit_label: Option<String>,
    company: Option<FieldPatch>,
    license_type: Option<FieldPatch>,
    quantity: Option<FieldPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct FieldPatch {
    block_id: Option<String>,
    action_id: Option<String>,
    label: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct SubmissionPatch {
    close_modal_on_failure: Option<bool>,
    failure_notice: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
