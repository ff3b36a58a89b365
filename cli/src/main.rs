//! gradmap CLI - import a degree audit onto a curriculum flowchart.
//!
//! ```text
//! main() -> acquire() (async file reads) -> extract + reconcile (sync) -> stdout JSON
//! ```
//!
//! All IO happens before extraction starts. Logs go to stderr so stdout only
//! ever carries the JSON result.

mod args;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tokio::fs;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use gradmap_audit::{AuditSettings, extract_evidence};
use gradmap_config::GradmapConfig;
use gradmap_engine::{NoteTemplateCache, ReconcileSettings, ReconciliationEngine};
use gradmap_types::{CurriculumNode, ReconciliationResult};

use args::Args;

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::try_new("warn").expect("warn filter is valid"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(env_filter)
        .init();
}

/// Raw inputs, read in full before any parsing.
struct Inputs {
    audit: String,
    curriculum: Option<String>,
    state: Option<String>,
    notes: Option<(String, String)>,
}

fn load_config(path: Option<&Path>) -> Result<GradmapConfig> {
    match path {
        Some(path) => GradmapConfig::load_from(path).context("failed to load config"),
        None => Ok(GradmapConfig::load().unwrap_or_default()),
    }
}

/// Program name for the template cache: the explicit one, else the notes file stem.
fn program_name(args: &Args) -> Option<String> {
    args.program.clone().or_else(|| {
        args.notes
            .as_deref()
            .and_then(Path::file_stem)
            .map(|stem| stem.to_string_lossy().into_owned())
    })
}

fn notes_path(args: &Args, config: &GradmapConfig) -> Option<(PathBuf, bool)> {
    if let Some(path) = &args.notes {
        return Some((path.clone(), true));
    }
    let program = args.program.as_deref()?;
    config
        .notes()
        .template_path(program)
        .map(|path| (path, false))
}

async fn read(path: &Path, what: &str) -> Result<String> {
    fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {what} {}", path.display()))
}

async fn acquire(args: &Args, config: &GradmapConfig) -> Result<Inputs> {
    let audit = read(&args.audit, "audit").await?;

    let curriculum = match &args.curriculum {
        Some(path) => Some(read(path, "curriculum").await?),
        None => None,
    };
    let state = match &args.state {
        Some(path) => Some(read(path, "state").await?),
        None => None,
    };

    let notes = match (notes_path(args, config), program_name(args)) {
        (Some((path, true)), Some(program)) => Some((program, read(&path, "notes").await?)),
        (Some((path, false)), Some(program)) => match fs::read_to_string(&path).await {
            Ok(content) => Some((program, content)),
            Err(err) => {
                tracing::debug!(path = %path.display(), "no note template: {err}");
                None
            }
        },
        _ => None,
    };

    Ok(Inputs {
        audit,
        curriculum,
        state,
        notes,
    })
}

fn run(args: &Args, config: &GradmapConfig, inputs: Inputs) -> Result<String> {
    let audit_settings = AuditSettings::from_config(&config.audit());
    let evidence = extract_evidence(&inputs.audit, &audit_settings)
        .with_context(|| format!("failed to extract evidence from {}", args.audit.display()))?;

    if args.evidence_only {
        return serde_json::to_string_pretty(&evidence).context("failed to render evidence");
    }

    let curriculum = inputs.curriculum.as_deref().unwrap_or_default();
    let nodes: Vec<CurriculumNode> =
        serde_json::from_str(curriculum).context("failed to parse curriculum")?;
    let displayed: ReconciliationResult = match inputs.state.as_deref() {
        Some(state) => serde_json::from_str(state).context("failed to parse state")?,
        None => ReconciliationResult::new(),
    };

    let mut cache = NoteTemplateCache::new();
    let templates = match inputs.notes {
        Some((program, content)) => Some(
            cache
                .get_or_parse(&program, &audit_settings.normalizer, || content)
                .context("failed to load note template")?,
        ),
        None => None,
    };

    let settings = ReconcileSettings::from_config(&config.engine(), &audit_settings.normalizer);
    let engine = ReconciliationEngine::from_settings(&audit_settings, settings);
    let result = engine.reconcile(&evidence, &nodes, &displayed, templates.as_deref());

    serde_json::to_string_pretty(&result).context("failed to render result")
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;
    let inputs = acquire(&args, &config).await?;
    let output = run(&args, &config, inputs)?;

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{output}").context("failed to write result")?;
    Ok(())
}
