use serde::{Deserialize, Serialize};

/// The normalized form of an experimental protocol.
///
/// Produced once at ingestion by [`crate::normalize::normalize`]; no field is
/// ever null downstream; absence is an empty string, list, or zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Procedure {
    /// Record identifier, e.g. a UUID or database key
    pub id: String,
    pub title: String,
    /// Free-text statement of what the protocol achieves
    pub objective: String,
    /// Longer free-text description; used as the objective fallback
    pub description: String,
    /// Category label, e.g. "molecular-biology"
    pub category: String,
    /// Ordered tag list
    pub tags: Vec<String>,
    /// Material names, deduplicated at the string level by the source
    pub materials: Vec<String>,
    /// Equipment names
    pub equipment: Vec<String>,
    /// One note per line of the source safety block
    pub safety_notes: Vec<String>,
    /// Ordered instruction sequence
    pub steps: Vec<Step>,
    /// Reported success rate in percent; ranking signal only
    pub success_rate: f64,
    /// How often the protocol has been run; ranking tie-breaker only
    pub usage_count: u64,
}

/// One ordered instruction within a [`Procedure`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Step {
    /// 1-based ordinal, unique and increasing within its procedure
    pub position: usize,
    pub title: String,
    pub description: String,
    /// Expected duration in minutes, when stated
    pub duration: Option<u32>,
    /// Whether the source flags this step as critical to success
    pub critical: bool,
}

/// The six compared aspects of a protocol pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aspect {
    Title,
    Objective,
    Materials,
    Equipment,
    Procedure,
    Safety,
}

/// Similarity of one aspect, in [0, 1], with a human-readable summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityMetric {
    pub aspect: Aspect,
    pub similarity: f64,
    pub details: String,
}

/// Kind tag for a concrete discrepancy between two protocols.
///
/// `StepOrder` and `Safety` exist in the wire format but are not produced by
/// the positional detector; safety gaps surface only through the safety
/// similarity metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifferenceKind {
    StepOrder,
    StepContent,
    Material,
    Equipment,
    Duration,
    Safety,
}

/// Qualitative impact ranking of a difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// A concrete discrepancy between the two compared protocols.
///
/// A `None` value on one side means the item is absent there; the other side
/// is then always populated (two absences are never a difference).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Difference {
    #[serde(rename = "type")]
    pub kind: DifferenceKind,
    pub location: String,
    pub protocol1_value: Option<String>,
    pub protocol2_value: Option<String>,
    pub severity: Severity,
    pub impact: String,
}

/// Which of the two compared protocols an item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    #[serde(rename = "1")]
    One,
    #[serde(rename = "2")]
    Two,
}

/// A step present on one side with no sufficiently similar counterpart on
/// the other.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingStep {
    pub step: Step,
    pub in_protocol: Side,
    /// 1-based position the step holds on its own side, suggested as the
    /// insertion point on the other
    pub suggested_position: usize,
    pub reason: String,
}

/// A material listed on one side only, with a keyword-matched substitute
/// from the other side's inventory when one exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingMaterial {
    pub material: String,
    pub in_protocol: Side,
    pub impact: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternative: Option<String>,
}

/// One troubleshooting entry from the insight collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TroubleshootingInsight {
    pub issue: String,
    pub likely_cause: String,
    pub solution: String,
    #[serde(default)]
    pub related_differences: Vec<String>,
    #[serde(default)]
    pub confidence: f64,
}

/// Complete result of one pairwise comparison. Terminal, return-only value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub protocol1: Procedure,
    pub protocol2: Procedure,
    pub similarities: Vec<SimilarityMetric>,
    pub differences: Vec<Difference>,
    pub missing_steps: Vec<MissingStep>,
    pub missing_materials: Vec<MissingMaterial>,
    pub recommendations: Vec<String>,
    pub troubleshooting: Vec<TroubleshootingInsight>,
    /// Bounded fit score in [0, 1]
    pub overall_score: f64,
}

/// A corpus procedure scored against a target by the retrieval heuristic.
///
/// The score is dimensionless and only orders candidates for one target; it
/// is not comparable across targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedCandidate {
    pub procedure: Procedure,
    pub similarity_score: i64,
}
