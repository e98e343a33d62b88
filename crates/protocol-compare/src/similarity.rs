//! Similarity primitives and the six-aspect aggregator.
//!
//! Text similarity is Jaccard over lower-cased whitespace tokens; list
//! similarity is Jaccard over exact strings. Procedure similarity aligns
//! steps positionally: step `i` of one protocol is compared to step `i` of
//! the other, with absent positions contributing zero. Positional alignment
//! assumes authors order their steps around a shared standard method; it
//! under-detects similarity when one protocol inserts an extra early step
//! and shifts the rest.
use std::collections::HashSet;

use crate::model::{Aspect, Procedure, SimilarityMetric, Step};

/// Jaccard similarity of two strings over lower-cased whitespace tokens.
///
/// Either string empty (after tokenizing) yields 0, even if both are empty.
/// This differs from [`set_similarity`] on purpose: two protocols with no
/// materials are vacuously identical, but two with no text are not known to
/// say the same thing.
pub fn text_similarity(a: &str, b: &str) -> f64 {
    let words_a: HashSet<String> = tokenize(a);
    let words_b: HashSet<String> = tokenize(b);
    if words_a.is_empty() || words_b.is_empty() {
        return 0.0;
    }
    let intersection = words_a.intersection(&words_b).count();
    let union = words_a.union(&words_b).count();
    intersection as f64 / union as f64
}

fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Jaccard similarity of two string lists by exact, case-sensitive match.
///
/// Both empty yields 1.0 (vacuously identical). Counted over distinct
/// items, so repeated entries cannot push the ratio past 1.0 even before
/// normalization has deduplicated the lists.
pub fn set_similarity(a: &[String], b: &[String]) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let set_a: HashSet<&str> = a.iter().map(String::as_str).collect();
    let set_b: HashSet<&str> = b.iter().map(String::as_str).collect();
    let union = set_a.union(&set_b).count();
    if union == 0 {
        return 0.0;
    }
    set_a.intersection(&set_b).count() as f64 / union as f64
}

/// Items of `a` also present in `b`, preserving `a`'s order.
pub fn common_items<'a>(a: &'a [String], b: &[String]) -> Vec<&'a str> {
    a.iter()
        .filter(|item| b.contains(item))
        .map(String::as_str)
        .collect()
}

/// Items of `a` absent from `b`, preserving `a`'s order.
pub fn unique_items<'a>(a: &'a [String], b: &[String]) -> Vec<&'a str> {
    a.iter()
        .filter(|item| !b.contains(item))
        .map(String::as_str)
        .collect()
}

/// Positional step-by-step similarity.
///
/// Averages `(title similarity + description similarity) / 2` over
/// `max(len1, len2)` positions; a position populated on only one side
/// contributes 0. Both lists empty is 1, exactly one empty is 0.
pub fn procedure_similarity(steps1: &[Step], steps2: &[Step]) -> f64 {
    if steps1.is_empty() && steps2.is_empty() {
        return 1.0;
    }
    if steps1.is_empty() || steps2.is_empty() {
        return 0.0;
    }

    let max_len = steps1.len().max(steps2.len());
    let mut total = 0.0;
    for i in 0..max_len {
        if let (Some(s1), Some(s2)) = (steps1.get(i), steps2.get(i)) {
            let title_sim = text_similarity(&s1.title, &s2.title);
            let desc_sim = text_similarity(&s1.description, &s2.description);
            total += (title_sim + desc_sim) / 2.0;
        }
    }
    total / max_len as f64
}

/// Objective falls back to the description when no explicit objective exists.
pub fn objective_text(p: &Procedure) -> &str {
    if p.objective.is_empty() {
        &p.description
    } else {
        &p.objective
    }
}

/// Compute all six similarity metrics for a protocol pair.
pub fn similarity_metrics(p1: &Procedure, p2: &Procedure) -> Vec<SimilarityMetric> {
    let mut metrics = Vec::with_capacity(6);

    let title_sim = text_similarity(&p1.title, &p2.title);
    metrics.push(SimilarityMetric {
        aspect: Aspect::Title,
        similarity: title_sim,
        details: format!("Titles are {:.0}% similar", title_sim * 100.0),
    });

    let objective_sim = text_similarity(objective_text(p1), objective_text(p2));
    metrics.push(SimilarityMetric {
        aspect: Aspect::Objective,
        similarity: objective_sim,
        details: format!("Objectives are {:.0}% similar", objective_sim * 100.0),
    });

    metrics.push(SimilarityMetric {
        aspect: Aspect::Materials,
        similarity: set_similarity(&p1.materials, &p2.materials),
        details: format!(
            "{} common materials out of {}",
            common_items(&p1.materials, &p2.materials).len(),
            p1.materials.len().max(p2.materials.len())
        ),
    });

    metrics.push(SimilarityMetric {
        aspect: Aspect::Equipment,
        similarity: set_similarity(&p1.equipment, &p2.equipment),
        details: format!(
            "{} common equipment out of {}",
            common_items(&p1.equipment, &p2.equipment).len(),
            p1.equipment.len().max(p2.equipment.len())
        ),
    });

    let procedure_sim = procedure_similarity(&p1.steps, &p2.steps);
    metrics.push(SimilarityMetric {
        aspect: Aspect::Procedure,
        similarity: procedure_sim,
        details: format!("Procedures have {:.0}% similarity", procedure_sim * 100.0),
    });

    metrics.push(SimilarityMetric {
        aspect: Aspect::Safety,
        similarity: set_similarity(&p1.safety_notes, &p2.safety_notes),
        details: format!(
            "{} common safety notes",
            common_items(&p1.safety_notes, &p2.safety_notes).len()
        ),
    });

    metrics
}
