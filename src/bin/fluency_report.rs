use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::Parser;
use orf_fluency::report::SCHEMA_VERSION;
use orf_fluency::{
    aggregate_reports, compute_case_report, AssessmentInput, CaseReport, EngineConfig, FluencyEngine,
    FluencyEngineBuilder, Meta, Report,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "fluency_report")]
#[command(about = "Align oral-reading transcripts and write fluency diagnostics reports")]
struct Args {
    /// A case JSON file, or a directory of them.
    #[arg(long, env = "FLUENCY_REPORT_INPUT")]
    input: PathBuf,
    /// Engine configuration JSON; defaults apply to anything missing.
    #[arg(long, env = "FLUENCY_REPORT_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long, env = "FLUENCY_REPORT_OUT")]
    out: Option<PathBuf>,
    #[arg(long, env = "FLUENCY_REPORT_LIMIT")]
    limit: Option<usize>,
}

#[derive(Debug, Clone)]
struct Case {
    id: String,
    input: AssessmentInput,
}

fn main() {
    init_logging();
    if let Err(err) = run() {
        tracing::error!(error = %err, "fluency report failed");
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run() -> Result<(), String> {
    let args = Args::parse();

    let config = match args.config.as_ref() {
        Some(path) => EngineConfig::load(path).map_err(|err| err.to_string())?,
        None => EngineConfig::default(),
    };
    let engine = FluencyEngineBuilder::new(config)
        .build()
        .map_err(|err| format!("failed to build engine: {err}"))?;

    let mut cases = load_cases(&args.input)?;
    if let Some(limit) = args.limit {
        cases.truncate(limit);
    }
    if cases.is_empty() {
        return Err(format!("No case files found at '{}'.", args.input.display()));
    }

    let reports: Vec<CaseReport> = cases.iter().map(|case| assess_case(&engine, case)).collect();
    let report = Report {
        schema_version: SCHEMA_VERSION,
        meta: Meta {
            generated_at: Utc::now().to_rfc3339(),
            config_path: args.config.as_ref().map(|p| p.display().to_string()),
            case_count: reports.len(),
        },
        aggregates: aggregate_reports(&reports),
        cases: reports,
    };

    let out_path = resolve_out_path(args.out.as_ref());
    write_report(&out_path, &report)?;
    tracing::info!(
        cases = report.meta.case_count,
        collapsed = report.aggregates.counts.collapsed,
        path = %out_path.display(),
        "report written"
    );
    Ok(())
}

fn assess_case(engine: &FluencyEngine, case: &Case) -> CaseReport {
    let assessment = engine.assess(&case.input);
    let report = compute_case_report(&case.id, assessment);
    tracing::info!(
        case = %case.id,
        accuracy = ?report.accuracy.accuracy_percent,
        struggles = report.accuracy.struggles,
        "case assessed"
    );
    report
}

fn load_cases(input: &Path) -> Result<Vec<Case>, String> {
    if !input.exists() {
        return Err(format!("Input path '{}' does not exist.", input.display()));
    }
    let mut files = if input.is_dir() {
        let entries = fs::read_dir(input)
            .map_err(|err| format!("Failed to read input directory '{}': {err}", input.display()))?;
        let mut files = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|err| format!("Failed to read entry in '{}': {err}", input.display()))?
                .path();
            if path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        files
    } else {
        vec![input.to_path_buf()]
    };
    files.sort();
    files.iter().map(|path| load_case(path)).collect()
}

fn load_case(path: &Path) -> Result<Case, String> {
    let data = fs::read_to_string(path)
        .map_err(|err| format!("Failed to read case file '{}': {err}", path.display()))?;
    let input: AssessmentInput = serde_json::from_str(&data)
        .map_err(|err| format!("Failed to parse case file '{}': {err}", path.display()))?;
    let id = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    Ok(Case { id, input })
}

fn resolve_out_path(out: Option<&PathBuf>) -> PathBuf {
    if let Some(path) = out {
        return path.clone();
    }
    let run_id = Utc::now().format("%Y%m%dT%H%M%SZ");
    PathBuf::from("target")
        .join("fluency_reports")
        .join(format!("fluency-report-{run_id}.json"))
}

fn write_report(path: &Path, report: &Report) -> Result<(), String> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|err| format!("Failed to create report directory '{}': {err}", parent.display()))?;
    }
    let mut json = serde_json::to_string_pretty(report)
        .map_err(|err| format!("Failed to serialize report '{}': {err}", path.display()))?;
    json.push('\n');
    fs::write(path, json).map_err(|err| format!("Failed to write report '{}': {err}", path.display()))
}
