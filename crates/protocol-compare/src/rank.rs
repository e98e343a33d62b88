//! Candidate ranker for protocol retrieval.
//!
//! A deliberately cheap pre-filter, not a substitute for the pairwise
//! comparator: candidates are admitted on any affinity with the target
//! (same category, title containing the target's first word, or a shared
//! tag) and ordered by a small integer heuristic. The score only orders
//! candidates for one target; it means nothing across targets.
use crate::model::{Procedure, RankedCandidate};

const CATEGORY_MATCH_POINTS: i64 = 3;
const TITLE_MATCH_POINTS: i64 = 2;
const SHARED_TAG_POINTS: i64 = 1;
const SUCCESS_RATE_BONUS: i64 = 2;
/// Success rate at or above this percentage earns the bonus.
const SUCCESS_RATE_FLOOR: f64 = 80.0;

/// Score and rank `corpus` against `target`, best first.
///
/// The target is excluded from its own results by id; `limit` bounds the
/// returned length. Ties break by success rate, then usage count.
pub fn find_similar(
    target: &Procedure,
    corpus: &[Procedure],
    limit: usize,
) -> Vec<RankedCandidate> {
    let first_title_word = target
        .title
        .split_whitespace()
        .next()
        .map(str::to_lowercase);

    let mut ranked: Vec<RankedCandidate> = corpus
        .iter()
        .filter(|candidate| candidate.id != target.id)
        .filter_map(|candidate| {
            let category_match =
                !target.category.is_empty() && candidate.category == target.category;
            let title_match = first_title_word
                .as_deref()
                .is_some_and(|word| candidate.title.to_lowercase().contains(word));
            let shared_tags = candidate
                .tags
                .iter()
                .filter(|tag| target.tags.contains(tag))
                .count() as i64;

            // No affinity at all means the candidate is not a match, however
            // successful it is on its own.
            if !category_match && !title_match && shared_tags == 0 {
                return None;
            }

            let mut score = shared_tags * SHARED_TAG_POINTS;
            if category_match {
                score += CATEGORY_MATCH_POINTS;
            }
            if title_match {
                score += TITLE_MATCH_POINTS;
            }
            if candidate.success_rate >= SUCCESS_RATE_FLOOR {
                score += SUCCESS_RATE_BONUS;
            }

            Some(RankedCandidate {
                procedure: candidate.clone(),
                similarity_score: score,
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.similarity_score
            .cmp(&a.similarity_score)
            .then(b.procedure.success_rate.total_cmp(&a.procedure.success_rate))
            .then(b.procedure.usage_count.cmp(&a.procedure.usage_count))
    });
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn procedure(id: &str, title: &str, category: &str, tags: &[&str]) -> Procedure {
        Procedure {
            id: id.to_string(),
            title: title.to_string(),
            category: category.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ..Procedure::default()
        }
    }

    #[test]
    fn test_target_excluded_even_with_duplicates() {
        let target = procedure("p1", "PCR amplification", "molecular-biology", &[]);
        let mut duplicate = target.clone();
        duplicate.id = "p2".to_string();
        let corpus = vec![target.clone(), duplicate];

        let ranked = find_similar(&target, &corpus, 10);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].procedure.id, "p2");
    }

    #[test]
    fn test_limit_bounds_results() {
        let target = procedure("t", "PCR amplification", "molecular-biology", &[]);
        let corpus: Vec<Procedure> = (0..5)
            .map(|i| procedure(&format!("c{i}"), "Other", "molecular-biology", &[]))
            .collect();

        let ranked = find_similar(&target, &corpus, 3);
        assert_eq!(ranked.len(), 3);
    }

    #[test]
    fn test_heuristic_point_values() {
        let target = procedure("t", "PCR amplification", "molecular-biology", &["dna", "enzyme"]);

        // Category (+3), title contains "pcr" (+2), both tags (+2), and a
        // high success rate (+2).
        let mut full = procedure("c1", "Nested PCR setup", "molecular-biology", &["dna", "enzyme"]);
        full.success_rate = 85.0;
        // One shared tag only.
        let tag_only = procedure("c2", "Gel electrophoresis", "imaging", &["dna"]);

        let ranked = find_similar(&target, &[full, tag_only], 10);
        assert_eq!(ranked[0].procedure.id, "c1");
        assert_eq!(ranked[0].similarity_score, 9);
        assert_eq!(ranked[1].procedure.id, "c2");
        assert_eq!(ranked[1].similarity_score, 1);
    }

    #[test]
    fn test_title_match_is_case_insensitive_substring() {
        let target = procedure("t", "PCR amplification", "", &[]);
        let candidate = procedure("c", "Multiplex-PCR variant", "other", &[]);

        let ranked = find_similar(&target, &[candidate], 10);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].similarity_score, 2);
    }

    #[test]
    fn test_no_affinity_excludes_candidate() {
        let target = procedure("t", "PCR amplification", "molecular-biology", &["dna"]);
        let mut unrelated = procedure("c", "Autoclave maintenance", "facilities", &["cleaning"]);
        // High success rate alone does not admit a candidate.
        unrelated.success_rate = 99.0;

        assert!(find_similar(&target, &[unrelated], 10).is_empty());
    }

    #[test]
    fn test_ties_break_by_success_rate_then_usage() {
        let target = procedure("t", "PCR amplification", "molecular-biology", &[]);

        let mut a = procedure("a", "Other", "molecular-biology", &[]);
        a.success_rate = 70.0;
        a.usage_count = 5;
        let mut b = procedure("b", "Other", "molecular-biology", &[]);
        b.success_rate = 75.0;
        b.usage_count = 1;
        let mut c = procedure("c", "Other", "molecular-biology", &[]);
        c.success_rate = 70.0;
        c.usage_count = 9;

        let ranked = find_similar(&target, &[a, b, c], 10);
        let ids: Vec<&str> = ranked.iter().map(|r| r.procedure.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }
}
