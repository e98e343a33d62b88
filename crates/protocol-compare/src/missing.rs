//! Missing-item resolver.
//!
//! Unlike the difference detector, this does not use positional alignment:
//! a step counts as present on the other side if any step there matches it
//! by title OR description similarity above the threshold, wherever it sits.
//! Materials use exact set membership instead of similarity, and a missing
//! material gets a substitute suggested by naive keyword overlap with the
//! other side's inventory.
use crate::model::{MissingMaterial, MissingStep, Procedure, Side, Step};
use crate::similarity::text_similarity;

/// A step on the other side exceeding this on title or description counts
/// as the same step.
const STEP_MATCH_THRESHOLD: f64 = 0.6;

const MISSING_HERE_REASON: &str = "This step is present in Protocol 2 but missing in Protocol 1. \
     It may be important for success.";
const MISSING_THERE_REASON: &str = "This step is present in Protocol 1 but missing in Protocol 2. \
     Consider if it's necessary.";

/// Steps present on one side with no existential match on the other.
///
/// Side-2 steps are examined first, matching the source emission order.
pub fn find_missing_steps(p1: &Procedure, p2: &Procedure) -> Vec<MissingStep> {
    let mut missing = Vec::new();

    for step2 in &p2.steps {
        if !has_similar_step(step2, &p1.steps) {
            missing.push(MissingStep {
                step: step2.clone(),
                in_protocol: Side::Two,
                suggested_position: step2.position,
                reason: MISSING_HERE_REASON.to_string(),
            });
        }
    }

    for step1 in &p1.steps {
        if !has_similar_step(step1, &p2.steps) {
            missing.push(MissingStep {
                step: step1.clone(),
                in_protocol: Side::One,
                suggested_position: step1.position,
                reason: MISSING_THERE_REASON.to_string(),
            });
        }
    }

    missing
}

/// Existential match: any step on the other side similar by title OR
/// description (logical OR, not AND).
fn has_similar_step(step: &Step, others: &[Step]) -> bool {
    others.iter().any(|other| {
        text_similarity(&other.title, &step.title) > STEP_MATCH_THRESHOLD
            || text_similarity(&other.description, &step.description) > STEP_MATCH_THRESHOLD
    })
}

/// Materials listed on exactly one side, by exact string membership.
pub fn find_missing_materials(p1: &Procedure, p2: &Procedure) -> Vec<MissingMaterial> {
    let mut missing = Vec::new();

    for material in &p2.materials {
        if !p1.materials.contains(material) {
            missing.push(MissingMaterial {
                material: material.clone(),
                in_protocol: Side::Two,
                impact: format!("Missing \"{material}\" may cause protocol failure"),
                alternative: find_substitute(material, &p1.materials),
            });
        }
    }

    for material in &p1.materials {
        if !p2.materials.contains(material) {
            missing.push(MissingMaterial {
                material: material.clone(),
                in_protocol: Side::One,
                impact: format!(
                    "Your protocol uses \"{material}\" which others don't. Verify if it's necessary."
                ),
                alternative: find_substitute(material, &p2.materials),
            });
        }
    }

    missing
}

/// First inventory item whose name contains any lower-cased word of the
/// missing material's name. `None` when nothing overlaps.
fn find_substitute(material: &str, inventory: &[String]) -> Option<String> {
    let keywords: Vec<String> = material.to_lowercase().split_whitespace().map(str::to_string).collect();
    inventory
        .iter()
        .find(|item| {
            let item_lower = item.to_lowercase();
            keywords.iter().any(|k| item_lower.contains(k.as_str()))
        })
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(position: usize, title: &str, description: &str) -> Step {
        Step {
            position,
            title: title.to_string(),
            description: description.to_string(),
            duration: None,
            critical: false,
        }
    }

    fn with_materials(items: &[&str]) -> Procedure {
        Procedure {
            materials: items.iter().map(|s| s.to_string()).collect(),
            ..Procedure::default()
        }
    }

    #[test]
    fn test_reordered_steps_are_not_missing() {
        // Same steps in opposite order: positional diffing would flag these,
        // the existential matcher must not.
        let p1 = Procedure {
            steps: vec![
                step(1, "Mix the reagents", ""),
                step(2, "Heat the sample", ""),
            ],
            ..Procedure::default()
        };
        let p2 = Procedure {
            steps: vec![
                step(1, "Heat the sample", ""),
                step(2, "Mix the reagents", ""),
            ],
            ..Procedure::default()
        };
        assert!(find_missing_steps(&p1, &p2).is_empty());
    }

    #[test]
    fn test_description_match_suffices_without_title_match() {
        let p1 = Procedure {
            steps: vec![step(1, "Preparation", "add buffer to the tube slowly")],
            ..Procedure::default()
        };
        let p2 = Procedure {
            steps: vec![step(1, "Setup phase", "add buffer to the tube slowly")],
            ..Procedure::default()
        };
        assert!(find_missing_steps(&p1, &p2).is_empty());
    }

    #[test]
    fn test_unmatched_step_reported_with_side_and_position() {
        let p1 = Procedure {
            steps: vec![step(1, "Mix the reagents", "combine all reagents")],
            ..Procedure::default()
        };
        let p2 = Procedure {
            steps: vec![
                step(1, "Mix the reagents", "combine all reagents"),
                step(2, "Centrifuge sample", "spin at full speed"),
            ],
            ..Procedure::default()
        };

        let missing = find_missing_steps(&p1, &p2);
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].in_protocol, Side::Two);
        assert_eq!(missing[0].suggested_position, 2);
        assert_eq!(missing[0].step.title, "Centrifuge sample");
        assert!(missing[0].reason.contains("important for success"));
    }

    #[test]
    fn test_side_two_items_reported_first() {
        let p1 = Procedure {
            steps: vec![step(1, "Alpha beta gamma", "one two three")],
            ..Procedure::default()
        };
        let p2 = Procedure {
            steps: vec![step(1, "Delta epsilon zeta", "four five six")],
            ..Procedure::default()
        };

        let missing = find_missing_steps(&p1, &p2);
        assert_eq!(missing.len(), 2);
        assert_eq!(missing[0].in_protocol, Side::Two);
        assert_eq!(missing[1].in_protocol, Side::One);
        assert!(missing[1].reason.contains("Consider if it's necessary"));
    }

    #[test]
    fn test_missing_material_without_substitute() {
        let p1 = with_materials(&["Ethanol", "NaCl"]);
        let p2 = with_materials(&["Ethanol"]);

        let missing = find_missing_materials(&p1, &p2);
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].material, "NaCl");
        assert_eq!(missing[0].in_protocol, Side::One);
        assert!(missing[0].alternative.is_none());
    }

    #[test]
    fn test_substitute_found_by_keyword_overlap() {
        let p1 = with_materials(&["Tris buffer"]);
        let p2 = with_materials(&["Phosphate buffer solution"]);

        let missing = find_missing_materials(&p1, &p2);
        // Each side misses the other's buffer, but both share the "buffer"
        // keyword so each gets the counterpart as a substitute.
        assert_eq!(missing.len(), 2);
        assert_eq!(missing[0].in_protocol, Side::Two);
        assert_eq!(missing[0].alternative.as_deref(), Some("Tris buffer"));
        assert_eq!(
            missing[1].alternative.as_deref(),
            Some("Phosphate buffer solution")
        );
    }

    #[test]
    fn test_substitute_match_is_case_insensitive() {
        let p1 = with_materials(&["AGAR plate"]);
        let p2 = with_materials(&["nutrient agar"]);

        let missing = find_missing_materials(&p1, &p2);
        let side_two = missing.iter().find(|m| m.in_protocol == Side::Two).unwrap();
        assert_eq!(side_two.alternative.as_deref(), Some("AGAR plate"));
    }
}
