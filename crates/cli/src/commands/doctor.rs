use chrono::{Days, Utc};
use serde::Serialize;
use stayline_core::config::{AppConfig, CalendarProvider, LoadOptions};
use stayline_core::speech::{parse_date_range, resolve_range};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
pub struct DoctorCheck {
    pub name: &'static str,
    pub status: CheckStatus,
    pub details: String,
}

#[derive(Debug, Serialize)]
pub struct DoctorReport {
    pub overall_status: CheckStatus,
    pub summary: String,
    pub checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report(AppConfig::load(LoadOptions::default()));

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

pub fn build_report<E: std::fmt::Display>(loaded: Result<AppConfig, E>) -> DoctorReport {
    let mut checks = Vec::new();

    match loaded {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_calendar(&config));
            checks.push(check_notifications(&config));
            checks.push(check_date_parser(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["calendar_readiness", "notification_channels", "date_parser"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status != CheckStatus::Fail)
        && checks.iter().any(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_calendar(config: &AppConfig) -> DoctorCheck {
    let details = match config.calendar.provider {
        CalendarProvider::Memory => {
            "in-memory calendar; bookings are lost on restart".to_string()
        }
        CalendarProvider::Google => format!(
            "google calendar `{}` via {}",
            config.calendar.calendar_id.as_deref().unwrap_or("<unset>"),
            config.calendar.api_base_url
        ),
    };
    DoctorCheck { name: "calendar_readiness", status: CheckStatus::Pass, details }
}

fn check_notifications(config: &AppConfig) -> DoctorCheck {
    let mut channels = Vec::new();
    if config.notifications.sms_enabled {
        channels.push("sms (twilio)");
    }
    if config.notifications.email_enabled {
        channels.push("email (sendgrid)");
    }

    if channels.is_empty() {
        return DoctorCheck {
            name: "notification_channels",
            status: CheckStatus::Skipped,
            details: "no confirmation channels enabled".to_string(),
        };
    }
    DoctorCheck {
        name: "notification_channels",
        status: CheckStatus::Pass,
        details: format!("enabled: {}", channels.join(", ")),
    }
}

/// Parses a canned utterance against today's date in the business time zone.
fn check_date_parser(config: &AppConfig) -> DoctorCheck {
    let today = Utc::now().with_timezone(&config.dialogue.time_zone).date_naive();
    let check_in = today.checked_add_days(Days::new(7)).unwrap_or(today);
    let check_out = check_in.checked_add_days(Days::new(2)).unwrap_or(check_in);
    let utterance =
        format!("{} through {}", check_in.format("%B %-d"), check_out.format("%B %-d"));

    let resolved = parse_date_range(&utterance)
        .ok_or_else(|| format!("`{utterance}` did not parse"))
        .and_then(|range| resolve_range(&range, today).map_err(|error| error.to_string()));

    match resolved {
        Ok(stay) => DoctorCheck {
            name: "date_parser",
            status: CheckStatus::Pass,
            details: format!(
                "`{utterance}` resolved to {} - {} in {}",
                stay.check_in(),
                stay.check_out(),
                config.dialogue.time_zone.name()
            ),
        },
        Err(details) => DoctorCheck { name: "date_parser", status: CheckStatus::Fail, details },
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
