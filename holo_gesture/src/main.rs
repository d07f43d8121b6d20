//! holo-gesture — command-line entry point.

use std::path::Path;

use anyhow::{bail, Context};
use gesture_seq::GestureSequencer;
use hand_pose::AtomicGestureClassifier;
use holo_gesture::app::{self, RunSummary, Session};
use holo_gesture::cli::{Cli, Commands, RunArgs};
use holo_gesture::config::AppConfig;
use holo_gesture::recorder::{self, FrameRecorder};
use holo_gesture::source::{ReplayFrameSource, ScriptFrameSource};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_args();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = AppConfig::load_or_default(cli.config.as_deref())
        .with_context(|| match &cli.config {
            Some(p) => format!("loading config {}", p.display()),
            None => "building default config".to_string(),
        })?;

    match cli.command {
        Commands::Run(args) => run(args, config),
        Commands::Classify { frames, explain, json } => run_classify(&frames, explain, json, &config),
        Commands::Sequences { sequences } => run_sequences(sequences.as_deref(), config),
        Commands::InitConfig { path, force } => run_init_config(&path, force),
    }
}

fn with_sequences_file(config: AppConfig, path: Option<&Path>) -> anyhow::Result<AppConfig> {
    match path {
        Some(p) => config
            .with_sequences_file(p)
            .with_context(|| format!("loading sequences {}", p.display())),
        None => Ok(config),
    }
}

fn run(args: RunArgs, config: AppConfig) -> anyhow::Result<()> {
    let config = with_sequences_file(config, args.sequences.as_deref())?;
    let mut session = Session::new(&config)?;
    if let Some(path) = &args.record {
        let rec = FrameRecorder::create(path)
            .with_context(|| format!("creating recording {}", path.display()))?;
        session = session.with_recorder(rec);
    }
    info!("{}", session.status);

    let summary = if let Some(path) = &args.script {
        let src = ScriptFrameSource::from_path(path, config.tracking.frame_interval_ms)
            .with_context(|| format!("reading script {}", path.display()))?
            .realtime(args.realtime);
        app::run_source(session, src)?
    } else if let Some(path) = &args.replay {
        let src = ReplayFrameSource::from_path(path)
            .with_context(|| format!("reading recording {}", path.display()))?
            .realtime(args.realtime);
        app::run_source(session, src)?
    } else {
        run_interactive(session, &args, &config)?
    };

    print_summary(&summary);
    Ok(())
}

#[cfg(feature = "window")]
fn run_interactive(session: Session, args: &RunArgs, config: &AppConfig) -> anyhow::Result<RunSummary> {
    if !args.window {
        bail!("choose an input: --script <file>, --replay <file> or --window");
    }
    Ok(app::run_window(session, config.tracking.frame_interval_ms)?)
}

#[cfg(not(feature = "window"))]
fn run_interactive(_session: Session, _args: &RunArgs, _config: &AppConfig) -> anyhow::Result<RunSummary> {
    bail!("choose an input: --script <file> or --replay <file> (build with --features window for the simulator)");
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("  Frames processed: {}", summary.frames);
    if summary.commands.is_empty() {
        println!("  No commands fired.");
    } else {
        println!("  Commands fired:");
        for c in &summary.commands {
            println!("    {:>7} ms  {}", c.t_ms, c.command);
        }
    }
    println!();
}

fn run_classify(path: &Path, explain: bool, json: bool, config: &AppConfig) -> anyhow::Result<()> {
    let frames = recorder::load_frames(path)
        .with_context(|| format!("reading recording {}", path.display()))?;
    let classifier = AtomicGestureClassifier::new(config.classifier.clone());
    let reports = app::classify_frames(&classifier, &frames);

    for r in &reports {
        if json {
            println!("{}", serde_json::to_string(r)?);
            continue;
        }
        let label = r.label.map(|l| l.as_str()).unwrap_or("-");
        if explain {
            let digits = r.digits.map(|d| d.to_string()).unwrap_or_else(|| "(incomplete hand)".into());
            println!("{:>7} ms  hands={}  {:<12} {}", r.t_ms, r.hands, label, digits);
        } else {
            println!("{:>7} ms  hands={}  {}", r.t_ms, r.hands, label);
        }
    }
    info!(frames = reports.len(), "classified recording");
    Ok(())
}

fn run_sequences(sequences: Option<&Path>, config: AppConfig) -> anyhow::Result<()> {
    let config = with_sequences_file(config, sequences)?;
    // Built the same way a session would, so invalid entries are reported and skipped.
    let sequencer = GestureSequencer::new(config.sequences.iter().cloned());
    println!();
    println!("  {:<22} {:<28} {}", "COMMAND", "SEQUENCE", "STEP TIMEOUT");
    for def in sequencer.definitions() {
        println!("  {:<22} {:<28} {} ms", def.command, def.describe(), def.timeout_ms);
    }
    let skipped = config.sequences.len() - sequencer.len();
    if let Err(first) = config.sequence_config().validate() {
        println!("  ({} invalid definition(s) skipped; first: {})", skipped, first);
    }
    println!();
    Ok(())
}

fn run_init_config(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    AppConfig::default()
        .save(path)
        .with_context(|| format!("writing {}", path.display()))?;
    println!("  Wrote default config to {}", path.display());
    Ok(())
}
