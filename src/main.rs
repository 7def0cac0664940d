use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use brief_core::options::DetailLevel;
use brief_core::security::ApiKey;
use brief_core::taxonomy::{report, ClassifiedError, ErrorReport};
use brief_engine::{EngineError, Pipeline, RunConfig, RunReport};
use brief_llm::{BackendConfig, LlmSummarizer};
use brief_settings::{
    api_key_from_env, load_settings, load_settings_from_path, validate, BackendSettings,
    BriefSettings, SettingsError,
};
use brief_telemetry::{init_telemetry, parse_level, TelemetryConfig};
use clap::{ArgAction, Parser};
use tracing::{warn, Level};

/// Write a one-paragraph summary of every source file under a directory.
#[derive(Debug, Parser)]
#[command(name = "filebrief", version)]
struct Cli {
    /// Directory to scan.
    root: PathBuf,

    /// Report file (default: summaries.txt).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Files summarized concurrently.
    #[arg(short, long)]
    batch_size: Option<usize>,

    /// low, medium or high.
    #[arg(long)]
    detail: Option<DetailLevel>,

    /// Approximate summary length in characters.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    max_length: Option<u32>,

    /// Files larger than this many bytes are not sent to the backend.
    #[arg(long)]
    max_file_size: Option<u64>,

    #[arg(long)]
    model: Option<String>,

    /// Settings file (default: ~/.filebrief/settings.json).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Log as JSON lines.
    #[arg(long)]
    json_logs: bool,

    /// -v for debug, -vv for trace.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// Flags win over file and environment settings.
    fn apply(&self, settings: &mut BriefSettings) {
        if let Some(output) = &self.output {
            settings.scan.output = output.display().to_string();
        }
        if let Some(batch_size) = self.batch_size {
            settings.scan.batch_size = batch_size;
        }
        if let Some(detail) = self.detail {
            settings.summary.detail_level = detail;
        }
        if let Some(max_length) = self.max_length {
            settings.summary.max_length = max_length;
        }
        if let Some(max_file_size) = self.max_file_size {
            settings.scan.max_file_bytes = max_file_size;
        }
        if let Some(model) = &self.model {
            settings.backend.model = model.clone();
        }
        if self.json_logs {
            settings.logging.json = true;
        }
    }

    fn telemetry(&self, settings: &BriefSettings) -> TelemetryConfig {
        let configured = parse_level(&settings.logging.level).unwrap_or(Level::INFO);
        let log_level = match self.verbose {
            0 => configured,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        };
        TelemetryConfig {
            log_level,
            json: settings.logging.json,
            ..Default::default()
        }
    }
}

fn backend_config(settings: &BackendSettings, api_key: Option<ApiKey>) -> BackendConfig {
    BackendConfig {
        api_key,
        model: settings.model.clone(),
        base_url: settings.base_url.clone(),
        max_tokens: settings.max_tokens,
        temperature: Some(settings.temperature),
        max_retries: settings.max_retries,
        connect_timeout: Duration::from_secs(settings.connect_timeout_secs),
        idle_timeout: Duration::from_secs(settings.idle_timeout_secs),
        request_timeout: Duration::from_secs(settings.request_timeout_secs),
    }
}

fn run_config(root: PathBuf, settings: &BriefSettings) -> RunConfig {
    RunConfig {
        batch_size: settings.scan.batch_size,
        max_file_bytes: settings.scan.max_file_bytes,
        options: settings.summary.options(),
        ignore_file: settings.scan.ignore_file.clone(),
        ..RunConfig::new(root, &settings.scan.output)
    }
}

async fn run(cli: Cli) -> anyhow::Result<RunReport> {
    let loaded = match &cli.settings {
        Some(path) => load_settings_from_path(path)?,
        None => load_settings()?,
    };
    let mut settings = loaded.settings;
    cli.apply(&mut settings);
    validate(&settings)?;
    init_telemetry(&cli.telemetry(&settings)).context("logging setup")?;
    // settings load before the subscriber exists
    for warning in &loaded.warnings {
        warn!(key = %warning.key, value = %warning.value, "{}, ignoring", warning.reason);
    }

    let summarizer = LlmSummarizer::from_config(&backend_config(&settings.backend, api_key_from_env()))?;
    tracing::info!(
        root = %cli.root.display(),
        model = summarizer.model(),
        batch_size = settings.scan.batch_size,
        "starting"
    );

    let config = run_config(cli.root, &settings);
    Ok(Pipeline::new(Arc::new(summarizer)).run(&config).await?)
}

/// Classify a top-level failure by its concrete type where known.
fn report_failure(err: &anyhow::Error) -> ErrorReport {
    if let Some(e) = err.downcast_ref::<EngineError>() {
        return report(e);
    }
    if let Some(e) = err.downcast_ref::<SettingsError>() {
        return report(e);
    }
    if let Some(e) = err.downcast_ref::<ClassifiedError>() {
        return report(e);
    }
    let opaque: &(dyn std::error::Error + Send + Sync + 'static) = err.as_ref();
    report(opaque)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(run) => {
            println!(
                "Summarized {} of {} files ({} too large, {} failed). Report: {}",
                run.summarized,
                run.discovered,
                run.too_large,
                run.failed,
                run.output.display()
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            let failure = report_failure(&err);
            match serde_json::to_string(&failure) {
                Ok(json) => eprintln!("{json}"),
                Err(_) => eprintln!("{}: {}", failure.code, failure.message),
            }
            ExitCode::FAILURE
        }
    }
}
