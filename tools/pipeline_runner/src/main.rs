use clap::Parser;
use fingenius_core::api::{IntakeRequest, PipelineApi};
use fingenius_core::audit::log::verify_chain;
use fingenius_core::documents::model::{DocumentId, LifecycleState};
use fingenius_core::extraction::fixture::FixtureAdapter;
use fingenius_core::extraction::interface::RawExtraction;
use fingenius_core::telemetry::init_tracing;
use fingenius_core::{CoreError, CoreResult, DocumentManager, PipelineConfig};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Replays a fixture of pre-extracted documents through the full pipeline
/// and prints one stable line per document, transaction and insight.
#[derive(Debug, Parser)]
#[command(name = "pipeline_runner", version, about = "Replay statement fixtures through the pipeline")]
struct Cli {
    /// JSON fixture describing the owner and their documents.
    #[arg(long)]
    fixture: PathBuf,

    /// Optional TOML pipeline configuration.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the hash-chained audit log here instead of keeping it in memory.
    #[arg(long)]
    audit_log: Option<PathBuf>,

    /// Print each Ready document's transactions as CSV.
    #[arg(long, default_value_t = false)]
    csv: bool,
}

#[derive(Debug, Deserialize)]
struct Fixture {
    owner_id: String,
    documents: Vec<FixtureDocument>,
}

#[derive(Debug, Deserialize)]
struct FixtureDocument {
    document_type: String,
    #[serde(default)]
    filename: Option<String>,
    /// Raw payload; must start with a PDF, PNG or JPEG signature.
    content: String,
    #[serde(default)]
    extraction: Option<RawExtraction>,
    #[serde(default)]
    failure: Option<String>,
}

#[tokio::main]
async fn main() {
    init_tracing("warn");
    let cli = Cli::parse();
    match run(&cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("RUNNER_ERROR {} {}", err.kind(), err);
            std::process::exit(2);
        }
    }
}

/// Returns false when any document ends in `Failed`.
async fn run(cli: &Cli) -> CoreResult<bool> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(path) = &cli.audit_log {
        config = config.with_audit_log_path(path);
    }

    let fixture: Fixture = serde_json::from_slice(&std::fs::read(&cli.fixture)?)?;
    let adapter = Arc::new(FixtureAdapter::new("fixture"));
    for doc in &fixture.documents {
        match (&doc.extraction, &doc.failure) {
            (_, Some(message)) => adapter.register_failure(doc.content.as_bytes(), message.clone()),
            (Some(extraction), None) => adapter.register(doc.content.as_bytes(), extraction.clone()),
            (None, None) => {
                return Err(CoreError::InvalidInput(format!(
                    "fixture document {:?} has neither extraction nor failure",
                    doc.filename
                )))
            }
        }
    }

    let api = PipelineApi::new(Arc::new(DocumentManager::new(config, adapter)?));
    let mut all_ready = true;
    // Sequential on purpose: later documents compare against earlier history.
    for (n, doc) in fixture.documents.iter().enumerate() {
        let intake = api.intake(IntakeRequest {
            owner_id: fixture.owner_id.clone(),
            document_type: doc.document_type.clone(),
            filename: doc.filename.clone(),
            description: None,
            content: doc.content.as_bytes().to_vec(),
        });
        let accepted = match intake {
            Ok(accepted) => accepted,
            Err(err) => {
                println!("DOCUMENT {} REJECTED {} {}", n + 1, err.kind(), err);
                all_ready = false;
                continue;
            }
        };
        api.settle(&accepted.document_id).await?;
        all_ready &= print_document(&api, n + 1, &accepted.document_id, cli.csv)?;
    }

    let events = api.manager().audit_events()?;
    match verify_chain(&events) {
        Ok(()) => println!("AUDIT_CHAIN PASS events={}", events.len()),
        Err(err) => {
            println!("AUDIT_CHAIN FAIL {}", err);
            all_ready = false;
        }
    }
    let stats = api.pool().stats();
    println!(
        "POOL dispatched={} stages={} ready={} failed={}",
        stats.dispatched, stats.stages_run, stats.ready, stats.failed
    );
    tracing::info!(all_ready, "fixture replay finished");
    Ok(all_ready)
}

fn print_document(api: &PipelineApi, n: usize, id: &DocumentId, csv: bool) -> CoreResult<bool> {
    let status = api.status(id.as_str())?;
    if let Some(failure) = &status.failure_reason {
        println!("DOCUMENT {} {} {}", n, status.state, failure);
        return Ok(false);
    }
    println!("DOCUMENT {} {}", n, status.state);
    for txn in status.transactions.iter().flatten() {
        let flag = match txn.flag_severity() {
            Some(severity) => format!(" FLAG={}", severity.as_str()),
            None => String::new(),
        };
        println!(
            "TXN {} {} {:.2} {}{} {}",
            txn.date(),
            txn.direction().as_str(),
            txn.amount(),
            txn.category().map(|c| c.as_str()).unwrap_or("-"),
            flag,
            txn.description()
        );
    }
    for insight in status.insights.iter().flatten() {
        println!(
            "INSIGHT {} {} {}",
            insight.importance,
            insight.insight_type.as_str(),
            insight.title
        );
    }
    if csv && status.state == LifecycleState::Ready {
        print!("{}", api.manager().export_transactions_csv(id)?);
    }
    Ok(status.state == LifecycleState::Ready)
}
