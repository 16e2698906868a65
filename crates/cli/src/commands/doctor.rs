use quartermaster_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use serde::Serialize;

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

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
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
            checks.push(check_bot_token(&config));
            checks.push(check_data_dir(&config));
            checks.push(check_changelog(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["bot_token_readiness", "data_dir_writable", "changelog_present"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let failed = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let overall_status = if failed { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = if failed {
        "doctor: one or more readiness checks failed".to_string()
    } else {
        "doctor: all readiness checks passed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_bot_token(config: &AppConfig) -> DoctorCheck {
    let token = config.discord.bot_token.expose_secret();
    if token.trim().is_empty() {
        DoctorCheck {
            name: "bot_token_readiness",
            status: CheckStatus::Fail,
            details: "discord.bot_token is empty".to_string(),
        }
    } else {
        DoctorCheck {
            name: "bot_token_readiness",
            status: CheckStatus::Pass,
            details: format!("token present ({} chars)", token.len()),
        }
    }
}

fn check_data_dir(config: &AppConfig) -> DoctorCheck {
    let dir = &config.storage.data_dir;
    let probe = dir.join(".doctor-probe");
    let result = std::fs::create_dir_all(dir)
        .and_then(|()| std::fs::write(&probe, b"probe"))
        .and_then(|()| std::fs::remove_file(&probe));

    match result {
        Ok(()) => DoctorCheck {
            name: "data_dir_writable",
            status: CheckStatus::Pass,
            details: format!("{} is writable", dir.display()),
        },
        Err(error) => DoctorCheck {
            name: "data_dir_writable",
            status: CheckStatus::Fail,
            details: format!("{}: {error}", dir.display()),
        },
    }
}

fn check_changelog(config: &AppConfig) -> DoctorCheck {
    let path = &config.storage.changelog_path;
    if path.exists() {
        DoctorCheck {
            name: "changelog_present",
            status: CheckStatus::Pass,
            details: format!("{} found", path.display()),
        }
    } else {
        DoctorCheck {
            name: "changelog_present",
            status: CheckStatus::Skipped,
            details: format!("{} not found; version announcements use the fallback line", path.display()),
        }
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = vec![report.summary.clone()];
    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "PASS",
            CheckStatus::Fail => "FAIL",
            CheckStatus::Skipped => "SKIP",
        };
        lines.push(format!("  [{marker}] {} — {}", check.name, check.details));
    }
    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
