//! Pulse CLI - Command-line interface for Prep Pulse
//!
//! Commands:
//! - transform: Compute a progress snapshot from an activity file (batch mode)
//! - fetch: Pull the activity feed from an endpoint and compute a snapshot
//! - validate: Validate activity events against prep.activity.v1
//! - schema: Print schema information
//! - doctor: Diagnose pipeline health and configuration

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{DateTime, Utc};
use prep_pulse::pipeline::{ProgressEngine, ViewOptions};
use prep_pulse::schema::{ActivityAdapter, AdapterOutcome};
use prep_pulse::trend::TrendWindows;
use prep_pulse::types::{BucketMode, Granularity, PersonalTargets};
use prep_pulse::{MetricsError, ENGINE_VERSION, PRODUCER_NAME, SCHEMA_VERSION};

/// Pulse - Progress analytics engine for interview-preparation activity
#[derive(Parser)]
#[command(name = "pulse")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Transform activity records into progress snapshots", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute a progress snapshot from an activity file (batch mode)
    Transform {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,

        #[command(flatten)]
        view: ViewArgs,
    },

    /// Pull the activity feed from an endpoint and compute a snapshot
    #[cfg(feature = "fetch")]
    Fetch {
        /// Aggregation endpoint URL
        #[arg(short, long)]
        endpoint: String,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,

        #[command(flatten)]
        view: ViewArgs,
    },

    /// Validate activity events against prep.activity.v1
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,

        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },

    /// Diagnose pipeline health and configuration
    Doctor {
        /// Check an activity file against the input schema
        #[arg(long)]
        activity: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// View configuration shared by transform and fetch
#[derive(clap::Args)]
struct ViewArgs {
    /// Bucketing granularity for the chart series
    #[arg(long, default_value = "day")]
    granularity: GranularityArg,

    /// Bucket values: mean normalized score or record count
    #[arg(long, default_value = "score")]
    mode: ModeArg,

    /// Days in the current trend window
    #[arg(long, default_value = "7")]
    window_days: i64,

    /// Days in the previous trend window
    #[arg(long, default_value = "7")]
    previous_days: i64,

    /// Reference instant for the trend windows (RFC 3339; defaults to now)
    #[arg(long)]
    reference: Option<String>,

    /// Personal target: mean normalized score
    #[arg(long)]
    target_score: Option<f64>,

    /// Personal target: practice minutes per week
    #[arg(long)]
    target_weekly_minutes: Option<u32>,

    /// Personal target: scored sessions per week
    #[arg(long)]
    target_sessions: Option<u32>,
}

impl ViewArgs {
    fn to_options(&self) -> Result<ViewOptions, PulseCliError> {
        let reference = match &self.reference {
            Some(text) => Some(
                DateTime::parse_from_rfc3339(text)
                    .map_err(|e| {
                        PulseCliError::ParseError(format!("Invalid --reference: {}", e))
                    })?
                    .with_timezone(&Utc),
            ),
            None => None,
        };

        let targets = PersonalTargets {
            overall_score: self.target_score,
            weekly_minutes: self.target_weekly_minutes,
            sessions_per_week: self.target_sessions,
        };

        Ok(ViewOptions {
            granularity: self.granularity.into(),
            mode: self.mode.into(),
            windows: TrendWindows {
                current_days: self.window_days,
                previous_days: self.previous_days,
            },
            reference,
            targets: targets.is_configured().then_some(targets),
        })
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum GranularityArg {
    Day,
    Month,
    Year,
}

impl From<GranularityArg> for Granularity {
    fn from(arg: GranularityArg) -> Self {
        match arg {
            GranularityArg::Day => Granularity::Day,
            GranularityArg::Month => Granularity::Month,
            GranularityArg::Year => Granularity::Year,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Score,
    Count,
}

impl From<ModeArg> for BucketMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Score => BucketMode::Score,
            ModeArg::Count => BucketMode::Count,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// JSON array of activity events
    Json,
    /// Newline-delimited JSON (one event per line)
    Ndjson,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input schema (prep.activity.v1)
    Input,
    /// Output schema (prep.progress.v1)
    Output,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), PulseCliError> {
    match cli.command {
        Commands::Transform {
            input,
            output,
            input_format,
            output_format,
            view,
        } => cmd_transform(&input, &output, input_format, output_format, &view),

        #[cfg(feature = "fetch")]
        Commands::Fetch {
            endpoint,
            output,
            output_format,
            view,
        } => cmd_fetch(&endpoint, &output, output_format, &view),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Schema {
            schema_type,
            json_schema,
        } => cmd_schema(schema_type, json_schema),

        Commands::Doctor { activity, json } => cmd_doctor(activity.as_deref(), json),
    }
}

fn cmd_transform(
    input: &PathBuf,
    output: &PathBuf,
    input_format: InputFormat,
    output_format: OutputFormat,
    view: &ViewArgs,
) -> Result<(), PulseCliError> {
    let (input_data, source) = read_input(input)?;
    let events = parse_events(&input_data, &input_format)?;

    if events.is_empty() {
        return Err(PulseCliError::NoEvents);
    }

    let outcome = ActivityAdapter::to_canonical(&events);
    let options = view.to_options()?;
    write_snapshot(&outcome, &source, options, output, &output_format)
}

#[cfg(feature = "fetch")]
fn cmd_fetch(
    endpoint: &str,
    output: &PathBuf,
    output_format: OutputFormat,
    view: &ViewArgs,
) -> Result<(), PulseCliError> {
    use prep_pulse::source::{ActivityFeed, FetchOutcome};

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let feed = ActivityFeed::new(endpoint);
    let outcome = match runtime.block_on(feed.refresh())? {
        FetchOutcome::Fresh(outcome) => outcome,
        FetchOutcome::Stale => return Err(PulseCliError::FeedSuperseded),
    };

    let options = view.to_options()?;
    write_snapshot(&outcome, endpoint, options, output, &output_format)
}

fn write_snapshot(
    outcome: &AdapterOutcome,
    source: &str,
    options: ViewOptions,
    output: &PathBuf,
    output_format: &OutputFormat,
) -> Result<(), PulseCliError> {
    let engine = ProgressEngine::new(options);
    let snapshot = engine.snapshot(outcome, source);

    let output_data = match output_format {
        OutputFormat::Json => serde_json::to_string(&snapshot)?,
        OutputFormat::JsonPretty => serde_json::to_string_pretty(&snapshot)?,
    };

    if output.to_string_lossy() == "-" {
        println!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_validate(
    input: &PathBuf,
    input_format: InputFormat,
    json: bool,
) -> Result<(), PulseCliError> {
    let (input_data, _) = read_input(input)?;
    let events = parse_events(&input_data, &input_format)?;
    let failures = ActivityAdapter::validate_events(&events);

    let report = ValidationReport {
        total_events: events.len(),
        valid_events: events.len() - failures.len(),
        invalid_events: failures.len(),
        errors: failures
            .iter()
            .map(|f| ValidationErrorDetail {
                index: f.index,
                event_id: f.event_id.clone(),
                error: f.error.to_string(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total events:   {}", report.total_events);
        println!("Valid events:   {}", report.valid_events);
        println!("Invalid events: {}", report.invalid_events);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!(
                    "  - Event {} (index {}): {}",
                    err.event_id.as_deref().unwrap_or("unknown"),
                    err.index,
                    err.error
                );
            }
        }
    }

    if report.invalid_events > 0 {
        Err(PulseCliError::ValidationFailed(report.invalid_events))
    } else {
        Ok(())
    }
}

fn cmd_schema(schema_type: SchemaType, json_schema: bool) -> Result<(), PulseCliError> {
    match schema_type {
        SchemaType::Input => {
            if json_schema {
                println!("{}", get_input_json_schema());
            } else {
                println!("Input Schema: {}", SCHEMA_VERSION);
                println!();
                println!("One activity event per record, loosely typed:");
                println!();
                println!("- type (required): quiz, test (alias eq), interview, practice,");
                println!("  learning, goal-started, goal-completed");
                println!("- score: number or numeric string; native scale depends on type");
                println!("  (quiz/test 0-10, interview/practice/learning 0-100)");
                println!("- duration: minutes, non-negative");
                println!("- timestamp (required): RFC 3339, YYYY-MM-DD, or epoch value");
                println!("- skillScores: map of skill label to sub-score; labels FUND, PROB,");
                println!("  COMM, DOMAIN and long forms resolve to the canonical dimensions");
                println!();
                println!("Unknown extra fields are ignored; malformed optional fields");
                println!("extract to safe defaults.");
            }
        }
        SchemaType::Output => {
            if json_schema {
                println!("{}", get_output_json_schema());
            } else {
                println!("Output Schema: prep.progress.v1");
                println!();
                println!("Progress snapshot contains:");
                println!();
                println!("- snapshot_version: Schema version (prep.progress.v1)");
                println!("- producer: {{ name, version, instance_id }}");
                println!("- provenance: {{ source, computed_at_utc }}");
                println!("- quality: {{ records_seen, records_skipped, coverage, flags }}");
                println!("- trend: {{ current, previous, delta }}");
                println!("- series: per-period quiz/test/interview values");
                println!("- progress: per-period overall score with dimension means");
                println!("- radar: {{ fundamental, problem_solving, communication, domain }}");
                println!("- targets: per-axis attainment, present when targets configured");
            }
        }
    }

    Ok(())
}

fn cmd_doctor(activity: Option<&std::path::Path>, json: bool) -> Result<(), PulseCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "engine_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Pulse version {}", ENGINE_VERSION),
    });

    checks.push(DoctorCheck {
        name: "schema_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Input schema: {}", SCHEMA_VERSION),
    });

    checks.push(DoctorCheck {
        name: "feed_support".to_string(),
        status: if cfg!(feature = "fetch") {
            CheckStatus::Ok
        } else {
            CheckStatus::Warning
        },
        message: if cfg!(feature = "fetch") {
            "fetch command available".to_string()
        } else {
            "built without the fetch feature".to_string()
        },
    });

    // Check an activity file if provided
    if let Some(activity_path) = activity {
        if activity_path.exists() {
            let check = match fs::read_to_string(activity_path)
                .map_err(PulseCliError::from)
                .and_then(|data| Ok(ActivityAdapter::parse_array(&data)?))
            {
                Ok(events) => {
                    let failures = ActivityAdapter::validate_events(&events);
                    if failures.is_empty() {
                        DoctorCheck {
                            name: "activity_file".to_string(),
                            status: CheckStatus::Ok,
                            message: format!("{} events, all valid", events.len()),
                        }
                    } else {
                        DoctorCheck {
                            name: "activity_file".to_string(),
                            status: CheckStatus::Error,
                            message: format!(
                                "{} of {} events fail validation",
                                failures.len(),
                                events.len()
                            ),
                        }
                    }
                }
                Err(e) => DoctorCheck {
                    name: "activity_file".to_string(),
                    status: CheckStatus::Error,
                    message: format!("Cannot parse activity file: {}", CliError::from(e).message),
                },
            };
            checks.push(check);
        } else {
            checks.push(DoctorCheck {
                name: "activity_file".to_string(),
                status: CheckStatus::Warning,
                message: "Activity file does not exist".to_string(),
            });
        }
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (batch mode ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: ENGINE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Pulse Doctor Report");
        println!("===================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(PulseCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn read_input(input: &PathBuf) -> Result<(String, String), PulseCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok((buffer, "stdin".to_string()))
    } else {
        let data = fs::read_to_string(input)?;
        Ok((data, input.to_string_lossy().into_owned()))
    }
}

fn parse_events(
    input_data: &str,
    input_format: &InputFormat,
) -> Result<Vec<prep_pulse::ActivityEvent>, PulseCliError> {
    let events = match input_format {
        InputFormat::Json => ActivityAdapter::parse_array(input_data)?,
        InputFormat::Ndjson => ActivityAdapter::parse_ndjson(input_data)?,
    };
    Ok(events)
}

fn get_input_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "https://preppulse.dev/schemas/prep.activity.v1.json",
        "title": "prep.activity.v1",
        "description": "Prep Pulse activity record schema",
        "type": "object",
        "required": ["type", "timestamp"],
        "properties": {
            "type": {
                "type": "string",
                "enum": ["quiz", "test", "eq", "interview", "practice", "learning",
                         "goal-started", "goal-completed"]
            },
            "score": { "type": ["number", "string"] },
            "duration": { "type": ["number", "string"] },
            "timestamp": { "type": ["string", "number"] },
            "skillScores": {
                "type": "object",
                "additionalProperties": { "type": ["number", "string"] }
            },
            "id": { "type": "string" }
        },
        "additionalProperties": true
    })
    .to_string()
}

fn get_output_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "https://preppulse.dev/schemas/prep.progress.v1.json",
        "title": "prep.progress.v1",
        "description": "Prep Pulse progress snapshot schema",
        "type": "object",
        "required": ["snapshot_version", "producer", "provenance", "quality",
                     "trend", "series", "progress", "radar"],
        "properties": {
            "snapshot_version": { "type": "string" },
            "producer": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "version": { "type": "string" },
                    "instance_id": { "type": "string" }
                }
            },
            "provenance": {
                "type": "object",
                "properties": {
                    "source": { "type": "string" },
                    "computed_at_utc": { "type": "string" }
                }
            },
            "quality": {
                "type": "object",
                "properties": {
                    "records_seen": { "type": "integer" },
                    "records_skipped": { "type": "integer" },
                    "coverage": { "type": "number" },
                    "flags": { "type": "array", "items": { "type": "string" } }
                }
            },
            "trend": {
                "type": "object",
                "properties": {
                    "current": { "type": "number" },
                    "previous": { "type": "number" },
                    "delta": { "type": "number" }
                }
            },
            "series": { "type": "array", "items": { "type": "object" } },
            "progress": { "type": "array", "items": { "type": "object" } },
            "radar": { "type": "object" },
            "targets": { "type": "object" }
        }
    })
    .to_string()
}

// Error types

#[derive(Debug)]
enum PulseCliError {
    Io(io::Error),
    Metrics(MetricsError),
    Json(serde_json::Error),
    NoEvents,
    ValidationFailed(usize),
    DoctorFailed,
    ParseError(String),
    #[cfg(feature = "fetch")]
    FeedSuperseded,
}

impl From<io::Error> for PulseCliError {
    fn from(e: io::Error) -> Self {
        PulseCliError::Io(e)
    }
}

impl From<MetricsError> for PulseCliError {
    fn from(e: MetricsError) -> Self {
        PulseCliError::Metrics(e)
    }
}

impl From<serde_json::Error> for PulseCliError {
    fn from(e: serde_json::Error) -> Self {
        PulseCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<PulseCliError> for CliError {
    fn from(e: PulseCliError) -> Self {
        match e {
            PulseCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            PulseCliError::Metrics(e) => CliError {
                code: "METRICS_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Ensure input matches prep.activity.v1".to_string()),
            },
            PulseCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            PulseCliError::NoEvents => CliError {
                code: "NO_EVENTS".to_string(),
                message: "No events found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            PulseCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} events failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            PulseCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
            PulseCliError::ParseError(msg) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: msg,
                hint: Some("Check argument format".to_string()),
            },
            #[cfg(feature = "fetch")]
            PulseCliError::FeedSuperseded => CliError {
                code: "FEED_SUPERSEDED".to_string(),
                message: "Feed response was superseded by a newer request".to_string(),
                hint: Some("Retry the fetch".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_events: usize,
    valid_events: usize,
    invalid_events: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    event_id: Option<String>,
    error: String,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
