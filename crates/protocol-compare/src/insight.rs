//! Insight generation boundary.
//!
//! The structural comparison is complete before anything here runs. When an
//! insight client is configured, its completion is parsed into
//! recommendations and troubleshooting entries; when it is absent, times
//! out, or fails in any way, the deterministic count-based fallback is used
//! instead. The fallback is a first-class path, not an exception handler,
//! and the comparison result is returned either way.
use serde::Deserialize;
use tracing::{info, warn};

use protocol_common::insight::InsightClient;

use crate::model::{
    Difference, DifferenceKind, MissingMaterial, MissingStep, Procedure, Severity,
    TroubleshootingInsight,
};

const SYSTEM_PROMPT: &str =
    "You are an expert research protocol analyst. Provide detailed, actionable insights.";

/// Recommendations plus troubleshooting entries, from either source.
#[derive(Debug, Clone, Default)]
pub struct InsightBundle {
    pub recommendations: Vec<String>,
    pub troubleshooting: Vec<TroubleshootingInsight>,
}

/// Shape of the JSON object the collaborator is instructed to return.
#[derive(Debug, Deserialize)]
struct InsightPayload {
    #[serde(default)]
    recommendations: Vec<String>,
    #[serde(default)]
    troubleshooting: Vec<TroubleshootingInsight>,
}

/// Produce insights for a completed structural comparison.
///
/// `client` is `None` when the collaborator is unconfigured. The call is
/// already bounded by the client's own timeout; any error degrades to
/// [`fallback_recommendations`] with empty troubleshooting.
pub async fn generate_insights(
    client: Option<&InsightClient>,
    p1: &Procedure,
    p2: &Procedure,
    differences: &[Difference],
    missing_steps: &[MissingStep],
    missing_materials: &[MissingMaterial],
) -> InsightBundle {
    let fallback = || InsightBundle {
        recommendations: fallback_recommendations(differences, missing_steps, missing_materials),
        troubleshooting: Vec::new(),
    };

    let Some(client) = client else {
        return fallback();
    };

    let prompt = comparison_prompt(p1, p2, differences, missing_steps, missing_materials);
    match client.complete(SYSTEM_PROMPT, &prompt).await {
        Ok(content) => match parse_insight_payload(&content) {
            Some(payload) => {
                info!(
                    recommendations = payload.recommendations.len(),
                    troubleshooting = payload.troubleshooting.len(),
                    "insight service responded"
                );
                InsightBundle {
                    recommendations: payload.recommendations,
                    troubleshooting: payload.troubleshooting,
                }
            }
            None => {
                warn!("insight response contained no parseable payload, using fallback");
                fallback()
            }
        },
        Err(e) => {
            warn!(error = %e, "insight service unavailable, using fallback");
            fallback()
        }
    }
}

/// Extract the JSON object from a completion that may wrap it in prose or
/// code fences: everything from the first `{` to the last `}`.
fn parse_insight_payload(content: &str) -> Option<InsightPayload> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&content[start..=end]).ok()
}

/// Deterministic recommendations derived purely from counts.
///
/// Each line is emitted only when its count is nonzero; identical protocols
/// produce an empty list.
pub fn fallback_recommendations(
    differences: &[Difference],
    missing_steps: &[MissingStep],
    missing_materials: &[MissingMaterial],
) -> Vec<String> {
    let mut recommendations = Vec::new();

    if !missing_steps.is_empty() {
        recommendations.push(format!(
            "Consider adding {} missing step(s) that are present in the compared protocol",
            missing_steps.len()
        ));
    }

    if !missing_materials.is_empty() {
        recommendations.push(format!(
            "Review {} material(s) that differ between protocols",
            missing_materials.len()
        ));
    }

    let critical = differences
        .iter()
        .filter(|d| d.severity >= Severity::High)
        .count();
    if critical > 0 {
        recommendations.push(format!(
            "Address {critical} critical difference(s) that may affect protocol success"
        ));
    }

    let equipment = differences
        .iter()
        .filter(|d| d.kind == DifferenceKind::Equipment)
        .count();
    if equipment > 0 {
        recommendations.push(format!(
            "Verify equipment requirements - {equipment} equipment difference(s) found"
        ));
    }

    recommendations
}

/// Summarize the structural comparison for the collaborator.
fn comparison_prompt(
    p1: &Procedure,
    p2: &Procedure,
    differences: &[Difference],
    missing_steps: &[MissingStep],
    missing_materials: &[MissingMaterial],
) -> String {
    let difference_lines: Vec<String> = differences
        .iter()
        .map(|d| format!("- {}: {}", kind_label(d.kind), d.impact))
        .collect();
    let missing_step_lines: Vec<String> = missing_steps
        .iter()
        .map(|s| {
            format!(
                "- {} (in Protocol {})",
                s.step.title,
                side_label(s.in_protocol)
            )
        })
        .collect();
    let missing_material_lines: Vec<String> = missing_materials
        .iter()
        .map(|m| format!("- {} (in Protocol {})", m.material, side_label(m.in_protocol)))
        .collect();

    format!(
        "Analyze these two protocols and provide insights:\n\n\
         PROTOCOL 1: {}\n- Steps: {}\n- Success Rate: {}%\n- Usage Count: {}\n\n\
         PROTOCOL 2: {}\n- Steps: {}\n- Success Rate: {}%\n- Usage Count: {}\n\n\
         KEY DIFFERENCES:\n{}\n\n\
         MISSING STEPS:\n{}\n\n\
         MISSING MATERIALS:\n{}\n\n\
         Provide:\n\
         1. 3-5 specific recommendations for improving Protocol 1\n\
         2. Troubleshooting insights for common issues that might occur due to these differences\n\n\
         Format as JSON:\n\
         {{\n  \"recommendations\": [\"rec1\", \"rec2\"],\n  \"troubleshooting\": [\n    {{\n      \"issue\": \"issue description\",\n      \"likelyCause\": \"cause\",\n      \"solution\": \"solution\",\n      \"relatedDifferences\": [\"diff1\"],\n      \"confidence\": 0.8\n    }}\n  ]\n}}",
        p1.title,
        p1.steps.len(),
        p1.success_rate,
        p1.usage_count,
        p2.title,
        p2.steps.len(),
        p2.success_rate,
        p2.usage_count,
        difference_lines.join("\n"),
        missing_step_lines.join("\n"),
        missing_material_lines.join("\n"),
    )
}

fn kind_label(kind: DifferenceKind) -> &'static str {
    match kind {
        DifferenceKind::StepOrder => "step_order",
        DifferenceKind::StepContent => "step_content",
        DifferenceKind::Material => "material",
        DifferenceKind::Equipment => "equipment",
        DifferenceKind::Duration => "duration",
        DifferenceKind::Safety => "safety",
    }
}

fn side_label(side: crate::model::Side) -> &'static str {
    match side {
        crate::model::Side::One => "1",
        crate::model::Side::Two => "2",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Side;

    fn difference(kind: DifferenceKind, severity: Severity) -> Difference {
        Difference {
            kind,
            location: "loc".to_string(),
            protocol1_value: Some("a".to_string()),
            protocol2_value: None,
            severity,
            impact: "impact".to_string(),
        }
    }

    fn missing_material(name: &str) -> MissingMaterial {
        MissingMaterial {
            material: name.to_string(),
            in_protocol: Side::One,
            impact: "impact".to_string(),
            alternative: None,
        }
    }

    #[test]
    fn test_fallback_empty_when_nothing_differs() {
        assert!(fallback_recommendations(&[], &[], &[]).is_empty());
    }

    #[test]
    fn test_fallback_counts() {
        let differences = vec![
            difference(DifferenceKind::Equipment, Severity::High),
            difference(DifferenceKind::Material, Severity::Medium),
            difference(DifferenceKind::StepContent, Severity::Critical),
        ];
        let materials = vec![missing_material("NaCl")];

        let recs = fallback_recommendations(&differences, &[], &materials);
        assert_eq!(recs.len(), 3);
        assert!(recs[0].contains("1 material(s)"));
        // High and critical both count as critical here.
        assert!(recs[1].contains("2 critical difference(s)"));
        assert!(recs[2].contains("1 equipment difference(s)"));
    }

    #[test]
    fn test_payload_parsed_from_fenced_response() {
        let content = "Here are my insights:\n```json\n{\"recommendations\": [\"do x\"], \
                       \"troubleshooting\": [{\"issue\": \"i\", \"likelyCause\": \"c\", \
                       \"solution\": \"s\", \"relatedDifferences\": [], \"confidence\": 0.9}]}\n```";
        let payload = parse_insight_payload(content).unwrap();
        assert_eq!(payload.recommendations, vec!["do x"]);
        assert_eq!(payload.troubleshooting.len(), 1);
        assert_eq!(payload.troubleshooting[0].likely_cause, "c");
    }

    #[test]
    fn test_payload_rejects_non_json() {
        assert!(parse_insight_payload("no json here").is_none());
        assert!(parse_insight_payload("} backwards {").is_none());
    }

    #[tokio::test]
    async fn test_absent_client_uses_fallback() {
        let p = Procedure::default();
        let differences = vec![difference(DifferenceKind::Equipment, Severity::High)];

        let bundle = generate_insights(None, &p, &p, &differences, &[], &[]).await;
        assert_eq!(bundle.recommendations.len(), 2);
        assert!(bundle.troubleshooting.is_empty());
    }

    #[test]
    fn test_prompt_lists_structural_findings() {
        let mut p1 = Procedure::default();
        p1.title = "Protocol A".to_string();
        let mut p2 = Procedure::default();
        p2.title = "Protocol B".to_string();
        let differences = vec![difference(DifferenceKind::Material, Severity::Medium)];
        let materials = vec![missing_material("NaCl")];

        let prompt = comparison_prompt(&p1, &p2, &differences, &[], &materials);
        assert!(prompt.contains("PROTOCOL 1: Protocol A"));
        assert!(prompt.contains("- material: impact"));
        assert!(prompt.contains("- NaCl (in Protocol 1)"));
        assert!(prompt.contains("Format as JSON"));
    }
}
