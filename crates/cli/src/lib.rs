pub mod commands;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::process::ExitCode;

use commands::parse::ParseKind;
use commands::simulate::{parse_blocked_interval, SimulateOptions};
use stayline_core::DateInterval;

#[derive(Debug, Parser)]
#[command(
    name = "stayline",
    about = "Stayline phone booking assistant operator CLI",
    long_about = "Inspect configuration, check readiness, and rehearse booking calls without a phone line.",
    after_help = "Examples:\n  stayline doctor --json\n  stayline config\n  stayline simulate \"august 10th through the 12th\" \"two guests\" \"bee cee\" yes\n  stayline parse email \"john dot doe at gmail dot com\""
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, calendar, notification, and parser readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Run a scripted call through the dialogue against an in-memory calendar")]
    Simulate {
        #[arg(help = "Caller utterances, one per turn, after the greeting")]
        utterances: Vec<String>,
        #[arg(long, help = "Pretend today is this date (YYYY-MM-DD) in the business time zone")]
        today: Option<NaiveDate>,
        #[arg(
            long = "blocked",
            value_parser = parse_blocked_interval,
            help = "Pre-booked nights as START..END with END exclusive; repeatable"
        )]
        blocked: Vec<DateInterval>,
        #[arg(long, help = "Ask for and confirm an email address before booking")]
        collect_email: bool,
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Run a single spoken-input parser on text")]
    Parse {
        #[arg(value_enum)]
        kind: ParseKind,
        #[arg(required = true, num_args = 1.., help = "Utterance text")]
        text: Vec<String>,
        #[arg(long, help = "Resolve dates relative to this day (YYYY-MM-DD); defaults to today in the business time zone")]
        today: Option<NaiveDate>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Simulate { utterances, today, blocked, collect_email, json } => {
            commands::simulate::run(SimulateOptions { utterances, today, blocked, collect_email, json })
        }
        Command::Parse { kind, text, today } => commands::parse::run(
            kind,
            &text.join(" "),
            today.unwrap_or_else(commands::parse::business_today),
        ),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
