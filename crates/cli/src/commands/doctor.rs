use changereq_core::config::{AppConfig, LoadOptions};
use changereq_sheets::{ServiceAccountKey, ServiceAccountTokenSource};
use chrono::Utc;
use secrecy::ExposeSecret;
use serde::Serialize;

use super::CommandResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

impl DoctorCheck {
    fn skipped(name: &'static str, reason: &str) -> Self {
        Self { name, status: CheckStatus::Skipped, details: format!("skipped because {reason}") }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { 1 };

    if json_output {
        let output = serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
        return CommandResult::text(exit_code, output);
    }

    CommandResult::text(exit_code, render_human(&report))
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            match check_service_account(&config) {
                Ok((check, key)) => {
                    checks.push(check);
                    checks.push(check_token_signing(key));
                }
                Err(check) => {
                    checks.push(check);
                    checks.push(DoctorCheck::skipped(
                        "token_assertion_signing",
                        "service account credentials did not parse",
                    ));
                }
            }
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(DoctorCheck::skipped(
                "service_account_credentials",
                "configuration did not load",
            ));
            checks.push(DoctorCheck::skipped("token_assertion_signing", "configuration did not load"));
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_service_account(
    config: &AppConfig,
) -> Result<(DoctorCheck, ServiceAccountKey), DoctorCheck> {
    match ServiceAccountKey::from_json(config.sheets.credentials_json.expose_secret()) {
        Ok(key) => Ok((
            DoctorCheck {
                name: "service_account_credentials",
                status: CheckStatus::Pass,
                details: format!("service account `{}`", key.client_email),
            },
            key,
        )),
        Err(error) => Err(DoctorCheck {
            name: "service_account_credentials",
            status: CheckStatus::Fail,
            details: error.to_string(),
        }),
    }
}

/// Signs a token assertion without contacting the token endpoint.
fn check_token_signing(key: ServiceAccountKey) -> DoctorCheck {
    let token_uri = key.token_uri.clone();
    let signed = ServiceAccountTokenSource::new(key)
        .and_then(|source| source.sign_assertion(Utc::now().timestamp()));

    match signed {
        Ok(_) => DoctorCheck {
            name: "token_assertion_signing",
            status: CheckStatus::Pass,
            details: format!("RS256 assertion signed for `{token_uri}`"),
        },
        Err(error) => DoctorCheck {
            name: "token_assertion_signing",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
