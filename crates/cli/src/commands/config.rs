use std::env;
use std::fs;
use std::path::Path;

use changereq_core::config::{env_keys, resolve_config_path, AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

use super::CommandResult;

struct FieldRow<'a> {
    key_path: &'static str,
    env_keys: &'static [&'static str],
    value: &'a str,
}

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("config validation failed: {error}"),
                2,
            )
        }
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let bot_token = redact_token(config.slack.bot_token.expose_secret());
    let signing_secret = if config.slack.signing_secret.is_some() { "<redacted>" } else { "<unset>" };
    let port = config.server.port.to_string();
    let close_modal = config.submission.close_modal_on_failure.to_string();
    let log_format = format!("{:?}", config.logging.format);

    let rows = [
        FieldRow { key_path: "slack.bot_token", env_keys: env_keys::SLACK_BOT_TOKEN, value: &bot_token },
        FieldRow {
            key_path: "slack.signing_secret",
            env_keys: env_keys::SLACK_SIGNING_SECRET,
            value: signing_secret,
        },
        FieldRow {
            key_path: "slack.notify_channel",
            env_keys: env_keys::SLACK_NOTIFY_CHANNEL,
            value: &config.slack.notify_channel,
        },
        FieldRow {
            key_path: "sheets.credentials_json",
            env_keys: env_keys::GOOGLE_CREDENTIALS_JSON,
            value: "<redacted>",
        },
        FieldRow {
            key_path: "sheets.spreadsheet_id",
            env_keys: env_keys::GOOGLE_SHEET_ID,
            value: &config.sheets.spreadsheet_id,
        },
        FieldRow {
            key_path: "sheets.worksheet",
            env_keys: env_keys::SHEETS_WORKSHEET,
            value: &config.sheets.worksheet,
        },
        FieldRow {
            key_path: "sheets.id_column",
            env_keys: env_keys::SHEETS_ID_COLUMN,
            value: &config.sheets.id_column,
        },
        FieldRow { key_path: "form.callback_id", env_keys: &[], value: &config.form.callback_id },
        FieldRow {
            key_path: "server.bind_address",
            env_keys: env_keys::SERVER_BIND_ADDRESS,
            value: &config.server.bind_address,
        },
        FieldRow { key_path: "server.port", env_keys: env_keys::SERVER_PORT, value: &port },
        FieldRow {
            key_path: "submission.close_modal_on_failure",
            env_keys: env_keys::CLOSE_MODAL_ON_FAILURE,
            value: &close_modal,
        },
        FieldRow {
            key_path: "submission.failure_notice",
            env_keys: env_keys::FAILURE_NOTICE,
            value: &config.submission.failure_notice,
        },
        FieldRow { key_path: "logging.level", env_keys: env_keys::LOG_LEVEL, value: &config.logging.level },
        FieldRow { key_path: "logging.format", env_keys: env_keys::LOG_FORMAT, value: &log_format },
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for row in &rows {
        let source = field_source(
            row.key_path,
            row.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(row.key_path, row.value, source));
    }

    CommandResult::text(0, lines.join("\n"))
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}
