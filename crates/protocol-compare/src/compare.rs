//! Pairwise comparison orchestration.
//!
//! Normalization feeds three independent single-pass analyses (similarity
//! metrics, differences, missing items), which fold into one bounded fit
//! score. Everything is pure and synchronous except the optional insight
//! call layered on top by [`compare_with_insights`].
use futures::future::join_all;
use serde_json::Value;
use tracing::info;

use protocol_common::insight::InsightClient;

use crate::diff::find_differences;
use crate::insight::{fallback_recommendations, generate_insights, InsightBundle};
use crate::missing::{find_missing_materials, find_missing_steps};
use crate::model::{ComparisonResult, Difference, Procedure, SimilarityMetric};
use crate::normalize::normalize;
use crate::similarity::similarity_metrics;

/// Each difference costs this much off the mean similarity.
const DIFFERENCE_PENALTY: f64 = 0.05;
/// The total penalty never exceeds this, so many low-impact differences
/// cannot drag the score more than 0.3 below the metrics alone.
const PENALTY_CAP: f64 = 0.3;

/// Compare two raw procedure records structurally.
///
/// Never fails: malformed fields are absorbed by normalization.
/// Recommendations come from the deterministic fallback; use
/// [`compare_with_insights`] to involve the collaborator.
pub fn compare(raw1: &Value, raw2: &Value) -> ComparisonResult {
    let p1 = normalize(raw1);
    let p2 = normalize(raw2);
    let mut result = compare_normalized(p1, p2);
    result.recommendations = fallback_recommendations(
        &result.differences,
        &result.missing_steps,
        &result.missing_materials,
    );
    result
}

/// Compare two raw records and augment with collaborator insights.
///
/// The structural comparison completes first and is returned regardless of
/// how the insight call goes; the collaborator can only add to it.
pub async fn compare_with_insights(
    raw1: &Value,
    raw2: &Value,
    client: Option<&InsightClient>,
) -> ComparisonResult {
    let p1 = normalize(raw1);
    let p2 = normalize(raw2);
    let mut result = compare_normalized(p1, p2);

    let InsightBundle {
        recommendations,
        troubleshooting,
    } = generate_insights(
        client,
        &result.protocol1,
        &result.protocol2,
        &result.differences,
        &result.missing_steps,
        &result.missing_materials,
    )
    .await;

    result.recommendations = recommendations;
    result.troubleshooting = troubleshooting;
    result
}

/// Structurally compare each corpus record against the target.
///
/// The pairwise comparisons are independent, so the map step runs on
/// blocking worker threads and results are collected in corpus order.
pub async fn compare_corpus(target: &Value, corpus: &[Value]) -> Vec<ComparisonResult> {
    let tasks: Vec<_> = corpus
        .iter()
        .map(|candidate| {
            let target = target.clone();
            let candidate = candidate.clone();
            tokio::task::spawn_blocking(move || compare(&target, &candidate))
        })
        .collect();

    join_all(tasks)
        .await
        .into_iter()
        .filter_map(|joined| joined.ok())
        .collect()
}

fn compare_normalized(p1: Procedure, p2: Procedure) -> ComparisonResult {
    let similarities = similarity_metrics(&p1, &p2);
    let differences = find_differences(&p1, &p2);
    let missing_steps = find_missing_steps(&p1, &p2);
    let missing_materials = find_missing_materials(&p1, &p2);
    let overall_score = overall_score(&similarities, &differences);

    info!(
        protocol1 = %p1.id,
        protocol2 = %p2.id,
        differences = differences.len(),
        missing_steps = missing_steps.len(),
        missing_materials = missing_materials.len(),
        overall_score,
        "protocols compared"
    );

    ComparisonResult {
        protocol1: p1,
        protocol2: p2,
        similarities,
        differences,
        missing_steps,
        missing_materials,
        recommendations: Vec::new(),
        troubleshooting: Vec::new(),
        overall_score,
    }
}

/// Mean of the six similarity metrics minus a capped per-difference penalty,
/// clamped to [0, 1]. A deliberately simple linear model, not a calibrated
/// statistical score.
fn overall_score(similarities: &[SimilarityMetric], differences: &[Difference]) -> f64 {
    let mean = similarities.iter().map(|s| s.similarity).sum::<f64>() / similarities.len() as f64;
    let penalty = (differences.len() as f64 * DIFFERENCE_PENALTY).min(PENALTY_CAP);
    (mean - penalty).clamp(0.0, 1.0)
}
