use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;
use styleaudit_contracts::design::FontMergePolicy;
use styleaudit_contracts::events::EventWriter;
use styleaudit_engine::config::{
    AuditConfig, DEFAULT_DEBUG_PATH, DEFAULT_DESIGN_IMAGE, DEFAULT_GUIDELINE_IMAGE,
    DEFAULT_REPORT_PATH,
};
use styleaudit_engine::figma::FigmaClient;
use styleaudit_engine::openai::OpenAiChat;
use styleaudit_engine::AuditPipeline;

#[derive(Debug, Parser)]
#[command(
    name = "styleaudit",
    version,
    about = "Audit a design mock-up against a design guideline"
)]
struct Cli {
    #[arg(long, default_value = DEFAULT_GUIDELINE_IMAGE)]
    guideline: PathBuf,
    #[arg(long, default_value = DEFAULT_DESIGN_IMAGE)]
    design: PathBuf,
    #[arg(long, default_value = DEFAULT_REPORT_PATH)]
    report: PathBuf,
    #[arg(long, default_value = DEFAULT_DEBUG_PATH)]
    debug: PathBuf,
    #[arg(long)]
    model: Option<String>,
    #[arg(long)]
    events: Option<PathBuf>,
    #[arg(long)]
    env_file: Option<PathBuf>,
    #[arg(long, default_value_t = FontMergePolicy::SizeOnly)]
    merge_policy: FontMergePolicy,
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("styleaudit error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    load_env_file(cli.env_file.as_deref())?;

    let mut config = AuditConfig::from_env()?;
    apply_cli_overrides(&mut config, &cli);

    let run_id = format!("audit-{}", timestamp_millis());
    let events = match &cli.events {
        Some(path) => EventWriter::create(path, run_id)?,
        None => EventWriter::in_memory(run_id),
    };
    events.subscribe(Arc::new(print_event))?;

    let pipeline = AuditPipeline::new(
        config.clone(),
        Box::new(OpenAiChat::from_config(&config)),
        Box::new(FigmaClient::from_config(&config)),
        events,
    );
    let outcome = pipeline.run()?;
    if let Some(reason) = &outcome.event_log_error {
        eprintln!("warning: event log is incomplete: {reason}");
    }
    if outcome.is_degraded() {
        println!(
            "Audit finished with {} fallback(s); see {} for details.",
            outcome.fallbacks.len(),
            config.debug_path.display()
        );
    } else {
        println!("Audit finished.");
    }
    Ok(0)
}

fn load_env_file(path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("failed loading env file {}", path.display()))?;
        }
        None => {
            if let Err(err) = dotenvy::dotenv() {
                if !err.not_found() {
                    return Err(err).context("failed loading .env");
                }
            }
        }
    }
    Ok(())
}

fn apply_cli_overrides(config: &mut AuditConfig, cli: &Cli) {
    config.guideline_image = cli.guideline.clone();
    config.design_image = cli.design.clone();
    config.report_path = cli.report.clone();
    config.debug_path = cli.debug.clone();
    config.merge_policy = cli.merge_policy;
    if let Some(model) = cli
        .model
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
    {
        config.model = model.to_string();
    }
}

fn print_event(event: &Value) {
    let Some(line) = describe_event(event) else {
        return;
    };
    if event.get("type").and_then(Value::as_str) == Some("stage_fallback") {
        eprintln!("{line}");
    } else {
        println!("{line}");
    }
}

fn describe_event(event: &Value) -> Option<String> {
    let kind = event.get("type").and_then(Value::as_str)?;
    let stage = event.get("stage").and_then(Value::as_str).unwrap_or_default();
    match kind {
        "stage_started" => Some(format!("> {}", stage_label(stage))),
        "stage_completed" => match stage {
            "figma_styles" => Some(format!(
                "  Figma: {} top-level node(s), {} text style(s)",
                event_count(event, "top_level_nodes"),
                event_count(event, "text_styles")
            )),
            "design_parse" => Some(format!(
                "  Backfilled font size on {} element(s)",
                event_count(event, "merged_elements")
            )),
            _ => Some(format!("  {} done", stage_label(stage))),
        },
        "text_style_found" => Some(format!(
            "  text '{}' -> font: {}, size: {}",
            event.get("text").and_then(Value::as_str).unwrap_or_default(),
            value_label(event.get("font_family")),
            value_label(event.get("font_size"))
        )),
        "stage_fallback" => Some(format!(
            "! {} failed, using fallback: {}",
            stage_label(stage),
            event.get("reason").and_then(Value::as_str).unwrap_or("unknown error")
        )),
        "artifact_written" => Some(format!(
            "  Wrote {}",
            event.get("path").and_then(Value::as_str).unwrap_or_default()
        )),
        _ => None,
    }
}

fn stage_label(stage: &str) -> &str {
    match stage {
        "encode_images" => "Loading images",
        "figma_styles" => "Collecting Figma text styles",
        "guideline" => "Extracting guideline",
        "design" => "Extracting design mock-up",
        "design_parse" => "Merging Figma font sizes",
        "compare" => "Comparing guideline and design",
        "write_report" => "Writing report",
        "write_debug" => "Writing debug data",
        other => other,
    }
}

fn event_count(event: &Value, key: &str) -> u64 {
    event.get(key).and_then(Value::as_u64).unwrap_or(0)
}

fn value_label(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Null) | None => "unknown".to_string(),
        Some(other) => other.to_string(),
    }
}

fn timestamp_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis())
        .unwrap_or(0)
}
