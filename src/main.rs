/// Version injected at compile time via SCW_RDB_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("SCW_RDB_VERSION") {
    Some(v) => v,
    None => "dev",
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use scw_rdb::config::Config;
use scw_rdb::provider::instance::DEFAULT_INSTANCE_TIMEOUT;
use scw_rdb::provider::{
    database, dispatch, instance, privilege, user, AttrValue, Diagnostic, Diagnostics, Meta,
    MetaConfig, Operation, ResourceData,
};
use scw_rdb::scw::http::format_scw_error;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Manage Scaleway Managed Database resources
#[derive(Parser, Debug)]
#[command(name = "scw-rdb", version, about, long_about = None)]
struct Args {
    /// Resource kind
    #[arg(value_enum)]
    kind: Kind,

    /// Operation to run
    #[arg(value_enum)]
    op: Op,

    /// Persisted identifier (`region/id` or `region/id/name`)
    #[arg(long)]
    id: Option<String>,

    /// Attribute as key=value; values that parse as JSON keep their type
    #[arg(long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,

    /// Attributes as a JSON object, applied before --set
    #[arg(long)]
    json: Option<String>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Kind {
    Instance,
    Database,
    User,
    Privilege,
}

impl Kind {
    fn resource_type(self) -> &'static str {
        match self {
            Kind::Instance => instance::RESOURCE_TYPE,
            Kind::Database => database::RESOURCE_TYPE,
            Kind::User => user::RESOURCE_TYPE,
            Kind::Privilege => privilege::RESOURCE_TYPE,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Op {
    Create,
    Read,
    Update,
    Delete,
}

impl From<Op> for Operation {
    fn from(op: Op) -> Self {
        match op {
            Op::Create => Operation::Create,
            Op::Read => Operation::Read,
            Op::Update => Operation::Update,
            Op::Delete => Operation::Delete,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(err) => {
            eprintln!("Failed to open log file {:?}: {}", log_path, err);
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("scw-rdb {} started with log level: {:?}", VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("scw-rdb").join("scw-rdb.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".scw-rdb").join("scw-rdb.log");
    }
    PathBuf::from("scw-rdb.log")
}

/// Build the resource data from --json, --set and --id
fn resource_data(args: &Args) -> Result<ResourceData> {
    let mut attributes: BTreeMap<String, AttrValue> = match &args.json {
        Some(json) => {
            serde_json::from_str(json).context("--json must be an object of attributes")?
        }
        None => BTreeMap::new(),
    };

    for pair in &args.set {
        let (key, value) = pair
            .split_once('=')
            .with_context(|| format!("--set expects KEY=VALUE, got '{}'", pair))?;
        let value = serde_json::from_str::<AttrValue>(value)
            .unwrap_or_else(|_| AttrValue::String(value.to_string()));
        attributes.insert(key.to_string(), value);
    }

    let mut data = ResourceData::with_attributes(attributes);
    if let Some(id) = &args.id {
        data.set_id(id.as_str());
    }
    Ok(data)
}

#[derive(Serialize)]
struct Output<'a> {
    #[serde(flatten)]
    data: &'a ResourceData,
    diagnostics: &'a Diagnostics,
}

async fn run(args: &Args, data: &mut ResourceData, meta: &Meta) -> Diagnostics {
    let resource_type = args.kind.resource_type();
    let operation = Operation::from(args.op);

    match args.kind {
        Kind::Instance => {
            let call = dispatch(resource_type, operation, data, meta);
            match tokio::time::timeout(DEFAULT_INSTANCE_TIMEOUT, call).await {
                Ok(diags) => diags,
                Err(_) => vec![Diagnostic::error(format!(
                    "{} {} timed out after {} minutes",
                    resource_type,
                    operation,
                    DEFAULT_INSTANCE_TIMEOUT.as_secs() / 60
                ))],
            }
        }
        _ => dispatch(resource_type, operation, data, meta).await,
    }
}

async fn run_cli(args: &Args) -> Result<ExitCode> {
    let config = Config::load()?;
    tracing::debug!("Loaded configuration: {:?}", config);

    let meta = Meta::new(MetaConfig {
        config,
        caller_version: format!("cli/{}", VERSION),
    })?;

    let mut data = resource_data(args)?;
    let diags = run(args, &mut data, &meta).await;

    for diag in &diags {
        tracing::warn!("{}", diag);
        eprintln!("{}", diag);
    }

    let output = Output {
        data: &data,
        diagnostics: &diags,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    if diags.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);

    match run_cli(&args).await {
        Ok(code) => code,
        Err(err) => {
            tracing::error!("{:#}", err);
            eprintln!("Error: {}", format_scw_error(&err));
            ExitCode::FAILURE
        }
    }
}
