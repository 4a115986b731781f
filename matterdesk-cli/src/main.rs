//! matterdesk CLI
//!
//! Runs one automation against the practice-management application and prints a JSON
//! result on stdout. Logs go to stderr.
//!
//! Usage:
//!   matterdesk new-matter --input payload.json
//!   matterdesk close-matter < payload.json
//!   matterdesk bill-matter --input payload.json
//!   matterdesk time-entries --file timesheet.xlsx --confirm
//!   matterdesk check-slot --input payload.json --calendar calendar.json
//!   matterdesk clean-temp-doc --path C:\Temp\receipt.docx

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use matterdesk::calendar::{check_appointment, JsonCalendarSource};
use matterdesk::cleanup::{spawn_cleanup, CleanupPolicy};
use matterdesk::matter::{bill_matter, close_matter, new_matter};
use matterdesk::notify::default_notifier;
use matterdesk::timesheet::{self, record_batch};
use matterdesk::{create_engine, AutomationConfig, Notifier, Payload, Session, SystemClock};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

mod op_result;

use op_result::{error_body, needs_notice, OpResult, OpStatus};

const NOTIFY_TITLE: &str = "matterdesk";

#[derive(Parser)]
#[command(name = "matterdesk")]
#[command(about = "Desktop automation for matter intake, closing, billing and time entry")]
struct Cli {
    /// JSON configuration file; defaults apply for anything it leaves out
    #[clap(long, global = true, env = "MATTERDESK_CONFIG")]
    config: Option<PathBuf>,

    /// Answer yes to confirmation prompts on the console
    #[clap(long, short = 'y', global = true)]
    yes: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct PayloadArgs {
    /// Request payload file (reads stdin when omitted)
    #[clap(long, short = 'i')]
    input: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct TimeEntriesArgs {
    /// Timesheet workbook (.xlsx)
    #[clap(long, short = 'f')]
    file: PathBuf,

    /// Ask before committing each entry
    #[clap(long)]
    confirm: bool,
}

#[derive(Args, Debug)]
struct CheckSlotArgs {
    #[command(flatten)]
    payload: PayloadArgs,

    /// Calendar export (JSON array of items) for the lawyer
    #[clap(long, env = "MATTERDESK_CALENDAR")]
    calendar: PathBuf,
}

#[derive(Args, Debug)]
struct CleanTempDocArgs {
    /// Temporary document to delete once it is released
    #[clap(long)]
    path: PathBuf,

    /// Give up after this many seconds
    #[clap(long, default_value_t = 30 * 60)]
    timeout_secs: u64,

    /// Seconds between lock checks
    #[clap(long, default_value_t = 30)]
    interval_secs: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Open and fill a New Matter dialog from an intake payload
    NewMatter(PayloadArgs),
    /// Close the payload's matter if all balances are zero
    CloseMatter(PayloadArgs),
    /// Bill the payload's matter as of its latest register date
    BillMatter(PayloadArgs),
    /// Record every pending entry of a timesheet workbook
    TimeEntries(TimeEntriesArgs),
    /// Check the payload's appointment against the lawyer's calendar
    CheckSlot(CheckSlotArgs),
    /// Delete a temporary document once the editor lets go of it
    CleanTempDoc(CleanTempDocArgs),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::NewMatter(_) => "new-matter",
            Commands::CloseMatter(_) => "close-matter",
            Commands::BillMatter(_) => "bill-matter",
            Commands::TimeEntries(_) => "time-entries",
            Commands::CheckSlot(_) => "check-slot",
            Commands::CleanTempDoc(_) => "clean-temp-doc",
        }
    }
}

fn init_logging() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    // LOG_LEVEL wins over RUST_LOG so the launcher can set one variable
    let filter = std::env::var("LOG_LEVEL")
        .ok()
        .and_then(|level| EnvFilter::try_new(level).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .with_target(false),
        )
        .try_init();
}

fn load_config(path: Option<&Path>) -> Result<AutomationConfig> {
    let config = match path {
        Some(path) => AutomationConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => AutomationConfig::default(),
    };
    Ok(config.with_env_overrides())
}

fn read_payload(args: &PayloadArgs) -> Result<Payload> {
    match &args.input {
        Some(path) => Payload::from_file(path)
            .with_context(|| format!("failed to read payload {}", path.display())),
        None => {
            let stdin = std::io::stdin();
            if stdin.is_terminal() {
                anyhow::bail!("no payload: pass --input or pipe JSON on stdin");
            }
            Payload::from_reader(stdin.lock()).context("failed to read payload from stdin")
        }
    }
}

fn connect(config: AutomationConfig) -> Result<Session> {
    let engine = create_engine().context("failed to initialise UI automation")?;
    Session::connect(engine, Arc::new(SystemClock::new()), Arc::new(config))
        .context("failed to connect to the application window")
}

fn run(command: Commands, config: AutomationConfig, notifier: &dyn Notifier) -> Result<OpResult> {
    match command {
        Commands::NewMatter(args) => {
            let payload = read_payload(&args)?;
            let session = connect(config)?;
            let report = new_matter(&session, notifier, &payload)?;
            Ok(OpResult::success(report.message.clone()).with(&report))
        }
        Commands::CloseMatter(args) => {
            let payload = read_payload(&args)?;
            let matter_id = payload.matter_id()?.to_string();
            let session = connect(config)?;
            let report = close_matter(&session, notifier, &matter_id)
                .with_context(|| format!("could not close matter {matter_id}"))?;
            Ok(OpResult::success(report.message.clone()).with(&report))
        }
        Commands::BillMatter(args) => {
            let payload = read_payload(&args)?;
            let matter_id = payload.matter_id()?.to_string();
            let session = connect(config)?;
            let report = bill_matter(&session, notifier, &matter_id)
                .with_context(|| format!("could not bill matter {matter_id}"))?;
            Ok(OpResult::success(report.message.clone()).with(&report))
        }
        Commands::TimeEntries(args) => {
            let mut entries = timesheet::parse(&args.file, &config.timesheet)
                .with_context(|| format!("failed to parse {}", args.file.display()))?;
            if entries.is_empty() {
                info!("Nothing to record in {}", args.file.display());
                return Ok(OpResult::success("No pending time entries.").field("recorded", 0));
            }
            let session = connect(config)?;
            let report = record_batch(&session, notifier, &mut entries, &args.file, args.confirm)?;
            let status = if report.cancelled {
                OpStatus::Cancelled
            } else {
                OpStatus::Success
            };
            let message = format!("{} time entries recorded.", report.recorded);
            Ok(OpResult::new(status, message).with(&report))
        }
        Commands::CheckSlot(args) => {
            let payload = read_payload(&args.payload)?;
            let source = JsonCalendarSource::new(&args.calendar);
            let check = check_appointment(
                &source,
                &payload.form.appointment_date,
                &payload.form.appointment_time,
                &payload.lawyer.name,
                payload.lawyer.break_minutes,
            )?;
            let (status, message) = if check.available {
                (OpStatus::Success, "Time slot is available.")
            } else {
                (OpStatus::Unavailable, "Time slot is not available.")
            };
            Ok(OpResult::new(status, message).with(&check))
        }
        Commands::CleanTempDoc(args) => {
            let policy = CleanupPolicy {
                timeout: Duration::from_secs(args.timeout_secs),
                interval: Duration::from_secs(args.interval_secs),
            };
            let watcher = spawn_cleanup(args.path.clone(), policy)
                .context("failed to start the cleanup watcher")?;
            let outcome = watcher
                .join()
                .map_err(|_| anyhow::anyhow!("cleanup watcher panicked"))?;
            Ok(OpResult::success(format!("Cleanup finished for {}", args.path.display()))
                .field("outcome", serde_json::to_value(outcome)?))
        }
    }
}

fn main() -> ExitCode {
    // .env is optional
    let _ = dotenvy::dotenv();
    init_logging();

    let cli = Cli::parse();
    let notifier = default_notifier(NOTIFY_TITLE, cli.yes);
    let op = cli.command.name();
    info!("Starting {}", op);

    let result = load_config(cli.config.as_deref())
        .and_then(|config| run(cli.command, config, notifier.as_ref()));

    match result {
        Ok(result) => {
            info!("{} finished: {}", op, result.message);
            match serde_json::to_string(&result) {
                Ok(json) => println!("{json}"),
                Err(e) => println!("{}", error_body(&e.into())),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            let e = e.context(format!("{op} failed"));
            error!("{:#}", e);
            if needs_notice(&e) {
                notifier.error(&format!("{e:#}"));
            }
            println!("{}", error_body(&e));
            ExitCode::FAILURE
        }
    }
}
