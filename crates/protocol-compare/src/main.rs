use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

use protocol_common::insight::{InsightClient, InsightClientConfig};
use protocol_compare::error::AppError;
use protocol_compare::{compare_with_insights, find_similar, normalize};

const USAGE: &str = "usage:\n  \
    protocol-compare compare <protocol1.json> <protocol2.json>\n  \
    protocol-compare similar <target.json> <corpus.json> [limit]";

const DEFAULT_SIMILAR_LIMIT: usize = 10;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("compare") if args.len() == 3 => run_compare(&args[1], &args[2]).await,
        Some("similar") if args.len() == 3 || args.len() == 4 => {
            let limit = match args.get(3) {
                Some(raw) => raw.parse::<usize>().map_err(|_| {
                    AppError::MalformedInput(format!("limit must be an integer, got \"{raw}\""))
                })?,
                None => DEFAULT_SIMILAR_LIMIT,
            };
            run_similar(&args[1], &args[2], limit)
        }
        _ => {
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    }
}

async fn run_compare(path1: &str, path2: &str) -> anyhow::Result<()> {
    let raw1 = load_record(path1)?;
    let raw2 = load_record(path2)?;

    // Collaborator is optional: without INSIGHT_BASE_URL the comparison
    // falls back to deterministic recommendations.
    let client = match InsightClientConfig::from_env() {
        Some(config) => {
            info!(base_url = %config.base_url, model = %config.model, "insight service configured");
            let client = InsightClient::new(config)
                .map_err(|e| AppError::Common(protocol_common::error::CommonError::from(e)))?;
            Some(client)
        }
        None => {
            info!("no insight service configured, using deterministic recommendations");
            None
        }
    };

    let result = compare_with_insights(&raw1, &raw2, client.as_ref()).await;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn run_similar(target_path: &str, corpus_path: &str, limit: usize) -> anyhow::Result<()> {
    let target = normalize(&load_record(target_path)?);

    let corpus_value = load_record(corpus_path)?;
    let Value::Array(records) = corpus_value else {
        return Err(AppError::MalformedInput(format!(
            "corpus file {corpus_path} must contain a JSON array of protocol records"
        ))
        .into());
    };
    let corpus: Vec<_> = records.iter().map(normalize).collect();

    let ranked = find_similar(&target, &corpus, limit);
    info!(target = %target.id, candidates = corpus.len(), returned = ranked.len(), "ranked corpus");
    println!("{}", serde_json::to_string_pretty(&ranked)?);
    Ok(())
}

/// Resolve a path to a raw protocol record.
///
/// This is the external lookup at the engine's boundary: a missing file is
/// `NotFound`, unparseable content is `MalformedInput`. Sloppy fields inside
/// a parsed record are not errors; normalization absorbs those.
fn load_record(path: &str) -> Result<Value, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|_| AppError::NotFound(path.to_string()))?;
    serde_json::from_str(&content)
        .map_err(|e| AppError::MalformedInput(format!("{path}: {e}")))
}
