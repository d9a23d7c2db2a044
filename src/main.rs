//! keystyle CLI: enroll typing sessions, train the classifier, and identify who typed a session.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use keystyle::{
    config::{KeystyleConfig, StoreBackend},
    error::{PredictionError, TrainingError},
    features::FEATURE_LAYOUT,
    logging::{AuditRecord, StructuredLogger},
    model::ModelStore,
    pipeline,
    session::{CaptureFile, Session, SessionValidator},
    storage::{open_store, SessionStore},
    train::Trainer,
};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "keystyle", about = "Keystroke-dynamics user identification")]
struct Cli {
    /// Config file (JSON); falls back to $KEYSTYLE_CONFIG_PATH, then keystyle.json
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a captured session and append it to the session store
    Enroll {
        #[arg(long)]
        session: PathBuf,
        /// Overrides the label stored in the capture file
        #[arg(long)]
        label: Option<String>,
    },
    /// Check a captured session against the prompt without storing it
    Validate {
        #[arg(long)]
        session: PathBuf,
    },
    /// Train on every stored session and replace the model artifact
    Train {
        /// Also print an ndjson audit line
        #[arg(long)]
        audit: bool,
    },
    /// Identify who typed a captured session
    Predict {
        #[arg(long)]
        session: PathBuf,
        /// Also print an ndjson audit line
        #[arg(long)]
        audit: bool,
    },
    /// Sessions per label in the store
    Stats,
}

fn config_path(cli: &Cli) -> PathBuf {
    cli.config.clone().unwrap_or_else(|| {
        std::env::var("KEYSTYLE_CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("keystyle.json"))
    })
}

fn read_session(path: &Path, label: Option<&str>) -> anyhow::Result<Session> {
    let data = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let capture: CaptureFile =
        serde_json::from_slice(&data).with_context(|| format!("parsing {}", path.display()))?;
    Ok(capture.into_session(label))
}

fn store_for(config: &KeystyleConfig) -> anyhow::Result<Box<dyn SessionStore>> {
    let secret = match config.store.backend {
        StoreBackend::Sqlite => Some(
            std::env::var(&config.store.secret_env)
                .with_context(|| format!("${} must hold the session store secret", config.store.secret_env))?,
        ),
        StoreBackend::Json => None,
    };
    Ok(open_store(&config.store, secret.as_deref().map(str::as_bytes))?)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = KeystyleConfig::load(&config_path(&cli));
    StructuredLogger::init(config.log.json, &config.log.level);
    config.validate()?;

    let validator = SessionValidator::new(config.prompt.clone(), &config.validation);
    let model_store = ModelStore::new(&config.model_dir);

    match cli.command {
        Command::Enroll { session, label } => {
            let session = read_session(&session, label.as_deref())?;
            if session.label.trim().is_empty() {
                bail!("session has no label; pass --label");
            }
            let label = session.label.clone();
            let store = store_for(&config)?;
            let count = pipeline::enroll(store.as_ref(), &validator, session)?;
            println!("Session saved for {}: {} sessions enrolled", label, count);
        }
        Command::Validate { session } => {
            let session = read_session(&session, None)?;
            let validated = validator.validate(session)?;
            let vector = pipeline::extract_features(&validated)?;
            println!("Session accepted ({} key events)", validated.events.len());
            for (name, value) in FEATURE_LAYOUT.iter().zip(vector.as_slice()) {
                println!("  {:<14} {:>10.2}", name, value);
            }
        }
        Command::Train { audit } => {
            let store = store_for(&config)?;
            let report = match pipeline::train(store.as_ref(), &model_store, &config) {
                Ok(r) => r,
                Err(TrainingError::InsufficientSessions { label, have, need, counts }) => {
                    eprintln!("Current sessions per label:");
                    for (l, n) in &counts {
                        eprintln!("  {}: {}", l, n);
                    }
                    bail!("need {} sessions for label {:?}, have {}", need, label, have);
                }
                Err(e) => return Err(e.into()),
            };
            let metrics = report.model.metrics();
            println!("Training successful");
            println!("Accuracy: {:.2}%", metrics.accuracy * 100.0);
            println!("Train size: {}  Test size: {}", metrics.train_size, metrics.test_size);
            for (label, n) in &metrics.label_counts {
                println!("  {}: {} sessions", label, n);
            }
            if !report.skipped.is_empty() {
                println!("Skipped {} invalid sessions", report.skipped.len());
            }
            if audit {
                StructuredLogger::emit_json(
                    &AuditRecord::trained(metrics, report.skipped.len()),
                    &mut std::io::stdout(),
                )?;
            }
            info!(dir = %model_store.dir().display(), "model replaced");
        }
        Command::Predict { session, audit } => {
            let model = match pipeline::load_model(&model_store) {
                Ok(m) => m,
                Err(PredictionError::ModelNotTrained(dir)) => {
                    bail!("no model in {}; enroll sessions and run `keystyle train` first", dir.display())
                }
                Err(e) => return Err(e.into()),
            };
            let validated = validator.validate(read_session(&session, None)?)?;
            let result = pipeline::predict_with(&model, &validated, &config)?;
            println!("Predicted: {}", result.label);
            println!("Confidence: {:.2}% ({})", result.confidence * 100.0, result.band.as_str());
            for p in &result.probabilities {
                println!("  {}: {:.2}%", p.label, p.probability * 100.0);
            }
            if audit {
                StructuredLogger::emit_json(
                    &AuditRecord::predicted(&validated.id, &result),
                    &mut std::io::stdout(),
                )?;
            }
        }
        Command::Stats => {
            let store = store_for(&config)?;
            let counts = pipeline::label_counts(store.as_ref())?;
            if counts.is_empty() {
                println!("No sessions stored");
            }
            let need = Trainer::new(config.training.clone()).min_sessions_per_label();
            for (label, n) in counts {
                let marker = if n >= need { "" } else { " (needs more)" };
                println!("{}: {}{}", label, n, marker);
            }
        }
    }
    Ok(())
}
