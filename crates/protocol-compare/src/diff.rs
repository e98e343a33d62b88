//! Difference detector.
//!
//! Walks the same positional step alignment as the procedure similarity
//! metric, then diffs the material and equipment lists by exact membership.
//! Identical values never produce a difference; safety notes are not
//! surfaced here at all (only via the safety similarity metric).
use crate::model::{Difference, DifferenceKind, Procedure, Severity};
use crate::similarity::{text_similarity, unique_items};

/// Step descriptions below this similarity are reported as content drift.
const STEP_CONTENT_THRESHOLD: f64 = 0.7;
/// Below this, the drift is severe rather than moderate.
const STEP_CONTENT_SEVERE: f64 = 0.3;
/// Duration deltas within this many minutes are noise, not a difference.
const DURATION_TOLERANCE_MINUTES: u32 = 5;
/// Descriptions are truncated to this many characters in the payload.
const DESCRIPTION_PREVIEW_CHARS: usize = 100;

pub fn find_differences(p1: &Procedure, p2: &Procedure) -> Vec<Difference> {
    let mut differences = Vec::new();

    step_differences(p1, p2, &mut differences);
    list_differences(
        &p1.materials,
        &p2.materials,
        DifferenceKind::Material,
        "Materials list",
        Severity::Medium,
        "uses",
        &mut differences,
    );
    // Equipment gaps are more likely to block reproduction outright than
    // consumable-material gaps, hence the higher severity.
    list_differences(
        &p1.equipment,
        &p2.equipment,
        DifferenceKind::Equipment,
        "Equipment list",
        Severity::High,
        "requires",
        &mut differences,
    );

    differences
}

fn step_differences(p1: &Procedure, p2: &Procedure, out: &mut Vec<Difference>) {
    let max_steps = p1.steps.len().max(p2.steps.len());
    for i in 0..max_steps {
        match (p1.steps.get(i), p2.steps.get(i)) {
            (None, Some(step2)) => out.push(Difference {
                kind: DifferenceKind::StepContent,
                location: format!("Step {}", i + 1),
                protocol1_value: None,
                protocol2_value: Some(step2.title.clone()),
                severity: Severity::High,
                impact: format!("Protocol 2 has an additional step: \"{}\"", step2.title),
            }),
            (Some(step1), None) => out.push(Difference {
                kind: DifferenceKind::StepContent,
                location: format!("Step {}", i + 1),
                protocol1_value: Some(step1.title.clone()),
                protocol2_value: None,
                severity: Severity::High,
                impact: format!("Protocol 1 has an additional step: \"{}\"", step1.title),
            }),
            (Some(step1), Some(step2)) => {
                let step_sim = text_similarity(&step1.description, &step2.description);
                if step_sim < STEP_CONTENT_THRESHOLD {
                    out.push(Difference {
                        kind: DifferenceKind::StepContent,
                        location: format!("Step {}: {}", i + 1, step1.title),
                        protocol1_value: Some(truncate(&step1.description)),
                        protocol2_value: Some(truncate(&step2.description)),
                        severity: if step_sim < STEP_CONTENT_SEVERE {
                            Severity::High
                        } else {
                            Severity::Medium
                        },
                        impact: format!(
                            "Step descriptions differ significantly ({:.0}% similar)",
                            step_sim * 100.0
                        ),
                    });
                }

                let d1 = step1.duration.unwrap_or(0);
                let d2 = step2.duration.unwrap_or(0);
                if d1.abs_diff(d2) > DURATION_TOLERANCE_MINUTES {
                    out.push(Difference {
                        kind: DifferenceKind::Duration,
                        location: format!("Step {}: {}", i + 1, step1.title),
                        protocol1_value: Some(format!("{d1} minutes")),
                        protocol2_value: Some(format!("{d2} minutes")),
                        severity: Severity::Low,
                        impact: "Duration difference may affect timing".to_string(),
                    });
                }
            }
            (None, None) => unreachable!("index below max of both lengths"),
        }
    }
}

/// One difference per item unique to either side; the absent side is `None`.
#[allow(clippy::too_many_arguments)]
fn list_differences(
    list1: &[String],
    list2: &[String],
    kind: DifferenceKind,
    location: &str,
    severity: Severity,
    verb: &str,
    out: &mut Vec<Difference>,
) {
    for item in unique_items(list1, list2) {
        out.push(Difference {
            kind,
            location: location.to_string(),
            protocol1_value: Some(item.to_string()),
            protocol2_value: None,
            severity,
            impact: format!("Protocol 1 {verb} \"{item}\" which is not in Protocol 2"),
        });
    }
    for item in unique_items(list2, list1) {
        out.push(Difference {
            kind,
            location: location.to_string(),
            protocol1_value: None,
            protocol2_value: Some(item.to_string()),
            severity,
            impact: format!("Protocol 2 {verb} \"{item}\" which is not in Protocol 1"),
        });
    }
}

fn truncate(text: &str) -> String {
    text.chars().take(DESCRIPTION_PREVIEW_CHARS).collect()
}
