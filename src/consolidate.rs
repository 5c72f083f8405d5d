//! Greedy consolidation of multi-source search results.
//!
//! A module for folding results fetched from several independent sources
//! into clusters that each describe one underlying work. Clustering is by
//! title similarity only, scored by [`crate::similarity::TitleScorer`].
//!
//! ## Clustering
//!
//! Candidates are processed strictly in input order. Each candidate is
//! compared against the representative (first-inserted member) of every
//! existing cluster, in cluster creation order, and joins the first cluster
//! whose representative matches. If none matches, it opens a new cluster.
//!
//! There is a single pass and no re-clustering, so the whole run is
//! O(n * k) comparisons for n candidates and k clusters. Because members
//! other than the representative are never consulted, an ambiguous
//! candidate that resembles a late member of an early cluster can still
//! open its own cluster. That asymmetry is the accepted cost of keeping
//! results stable under a fixed input order, and it is why callers must
//! feed candidates in a documented, reproducible order.
//!
//! Titles below the configured minimum token count are never compared at
//! all. Each becomes its own singleton cluster, and clusters whose
//! representative is such a title never gain members.
//!
//! ## Usage
//!
//! ```rust
//! use litmerge::consolidate::Consolidator;
//! use litmerge::record::CandidateRecord;
//!
//! let candidates = vec![
//!     CandidateRecord::new("Deep Learning for Climate Modeling", "arXiv"),
//!     CandidateRecord::new("Deep learning for climate modeling.", "CrossRef"),
//!     CandidateRecord::new("Climate Modeling Overview", "PubMed"),
//! ];
//!
//! let consolidated = Consolidator::new().consolidate(&candidates);
//! assert_eq!(consolidated.len(), 2);
//! assert_eq!(consolidated[0].member_sources, ["arXiv", "CrossRef"]);
//! ```

use crate::record::{CandidateRecord, ConsolidatedRecord};
use crate::similarity::{NormalizedTitle, SimilarityConfig, TitleScorer};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Consolidation engine for candidate records.
///
/// Single-threaded and infallible. Malformed candidates (blank title or
/// source) are logged and skipped rather than failing the run, and an empty
/// input produces an empty output.
///
/// # Examples
///
/// ```rust
/// use litmerge::consolidate::Consolidator;
/// use litmerge::similarity::SimilarityConfig;
///
/// let strict = Consolidator::new().with_config(SimilarityConfig {
///     match_threshold: 0.9,
///     ..Default::default()
/// });
/// ```
#[derive(Debug, Default, Clone)]
pub struct Consolidator {
    scorer: TitleScorer,
}

struct Cluster<'a> {
    representative: NormalizedTitle,
    rep_eligible: bool,
    members: Vec<&'a CandidateRecord>,
}

impl Consolidator {
    /// Creates a consolidator with the default similarity thresholds.
    #[must_use]
    pub fn new() -> Self {
        Self {
            scorer: TitleScorer::new(),
        }
    }

    /// Creates a consolidator with custom similarity thresholds.
    #[must_use]
    pub fn with_config(mut self, config: SimilarityConfig) -> Self {
        self.scorer = TitleScorer::new().with_config(config);
        self
    }

    /// Clusters candidates and merges each cluster into one record.
    ///
    /// Output is ordered by `cluster_id` ascending, which is cluster
    /// creation order. For a fixed input sequence and configuration the
    /// output is identical across runs, field for field.
    #[must_use]
    pub fn consolidate(&self, candidates: &[CandidateRecord]) -> Vec<ConsolidatedRecord> {
        let mut clusters: Vec<Cluster> = Vec::new();

        for candidate in candidates {
            if let Err(reason) = candidate.validate() {
                warn!(
                    source = %candidate.source,
                    error = %reason,
                    "skipping malformed candidate"
                );
                continue;
            }

            let normalized = NormalizedTitle::new(&candidate.title);
            let eligible = self.scorer.meets_min_tokens(&normalized);

            let matched = if eligible {
                clusters.iter().position(|cluster| {
                    cluster.rep_eligible
                        && self
                            .scorer
                            .is_match_normalized(&cluster.representative, &normalized)
                })
            } else {
                None
            };

            match matched {
                Some(idx) => clusters[idx].members.push(candidate),
                None => clusters.push(Cluster {
                    representative: normalized,
                    rep_eligible: eligible,
                    members: vec![candidate],
                }),
            }
        }

        debug!(
            candidates = candidates.len(),
            clusters = clusters.len(),
            "consolidation finished"
        );

        clusters
            .iter()
            .enumerate()
            .map(|(index, cluster)| merge_cluster(index + 1, &cluster.members))
            .collect()
    }
}

/// Merges a cluster's members into a single record.
///
/// All list fields keep first-seen order across members. The abstract is
/// the longest non-blank one, with the earliest member winning ties.
fn merge_cluster(cluster_id: usize, members: &[&CandidateRecord]) -> ConsolidatedRecord {
    let mut member_sources: Vec<String> = Vec::new();
    let mut merged_authors: Vec<String> = Vec::new();
    let mut seen_authors: HashSet<String> = HashSet::new();
    let mut urls: Vec<String> = Vec::new();
    let mut merged_abstract: Option<&str> = None;

    for member in members {
        if !member_sources.contains(&member.source) {
            member_sources.push(member.source.clone());
        }

        for author in &member.authors {
            if seen_authors.insert(author.to_lowercase()) {
                merged_authors.push(author.clone());
            }
        }

        if let Some(url) = &member.url {
            if !urls.contains(url) {
                urls.push(url.clone());
            }
        }

        if let Some(text) = member.abstract_text.as_deref() {
            if !text.trim().is_empty() && merged_abstract.is_none_or(|best| text.len() > best.len())
            {
                merged_abstract = Some(text);
            }
        }
    }

    ConsolidatedRecord {
        cluster_id,
        representative_title: members[0].title.clone(),
        member_sources,
        merged_authors,
        merged_abstract: merged_abstract.map(str::to_owned),
        urls,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(title: &str, source: &str) -> CandidateRecord {
        CandidateRecord::new(title, source)
    }

    #[test]
    fn test_consolidate_empty_input() {
        let consolidated = Consolidator::new().consolidate(&[]);
        assert_eq!(consolidated, Vec::new());
    }

    #[test]
    fn test_case_and_punctuation_variants_merge() {
        let candidates = vec![
            record("Deep Learning for Climate Modeling", "arXiv"),
            record("Deep learning for climate modeling.", "CrossRef"),
            record("Climate Modeling Overview", "PubMed"),
        ];

        let consolidated = Consolidator::new().consolidate(&candidates);

        assert_eq!(consolidated.len(), 2);
        assert_eq!(consolidated[0].cluster_id, 1);
        assert_eq!(
            consolidated[0].representative_title,
            "Deep Learning for Climate Modeling"
        );
        assert_eq!(consolidated[0].member_sources, ["arXiv", "CrossRef"]);
        assert_eq!(consolidated[1].cluster_id, 2);
        assert_eq!(consolidated[1].member_sources, ["PubMed"]);

        // Every valid candidate is in exactly one cluster. Sources are
        // distinct here, so membership is countable through them.
        let total: usize = consolidated.iter().map(|c| c.member_sources.len()).sum();
        assert_eq!(total, candidates.len());
    }

    #[test]
    fn test_identical_titles_across_sources_merge() {
        let candidates = vec![
            record("The Role of Agency in Economic Systems", "arXiv"),
            record("The Role of Agency in Economic Systems", "OpenAlex"),
        ];

        let consolidated = Consolidator::new().consolidate(&candidates);

        assert_eq!(consolidated.len(), 1);
        assert_eq!(consolidated[0].member_sources, ["arXiv", "OpenAlex"]);
    }

    #[test]
    fn test_reordered_words_merge() {
        let candidates = vec![
            record("Financial Decision Making and Cognitive Agency", "CrossRef"),
            record("Cognitive Agency and Financial Decision-Making", "OpenAlex"),
        ];

        let consolidated = Consolidator::new().consolidate(&candidates);

        assert_eq!(consolidated.len(), 1);
        assert_eq!(consolidated[0].member_sources, ["CrossRef", "OpenAlex"]);
        assert_eq!(
            consolidated[0].representative_title,
            "Financial Decision Making and Cognitive Agency"
        );
    }

    #[test]
    fn test_partial_overlap_stays_separate() {
        let candidates = vec![
            record("Quantum Computing Advances", "arXiv"),
            record("Quantum Error Correction Advances", "arXiv"),
        ];

        let consolidated = Consolidator::new().consolidate(&candidates);
        assert_eq!(consolidated.len(), 2);
    }

    #[test]
    fn test_unrelated_titles_stay_separate() {
        let candidates = vec![
            record("Agentic Economics", "Web"),
            record("Differential Equations in Ecology", "arXiv"),
        ];

        let consolidated = Consolidator::new().consolidate(&candidates);

        assert_eq!(consolidated.len(), 2);
        assert_eq!(consolidated[0].member_sources, ["Web"]);
        assert_eq!(consolidated[1].member_sources, ["arXiv"]);
    }

    #[test]
    fn test_short_titles_stay_singletons() {
        // Identical one-token titles never merge, not even with each other.
        let candidates = vec![record("AI", "Web"), record("AI", "GoogleScholar")];

        let consolidated = Consolidator::new().consolidate(&candidates);

        assert_eq!(consolidated.len(), 2);
        assert_eq!(consolidated[0].cluster_id, 1);
        assert_eq!(consolidated[0].member_sources, ["Web"]);
        assert_eq!(consolidated[1].cluster_id, 2);
        assert_eq!(consolidated[1].member_sources, ["GoogleScholar"]);
    }

    #[test]
    fn test_first_match_against_representative_wins() {
        // B matches both A and C, but A and C do not match each other.
        let a = "Adaptive Methods for Stochastic Optimization";
        let b = "Adaptive Methods for Stochastic Convex Optimization";
        let c = "Adaptive Methods for Stochastic Convex Optimization Part II";

        // With A first, C is compared against representative A and misses,
        // even though it resembles member B.
        let consolidated = Consolidator::new().consolidate(&[
            record(a, "arXiv"),
            record(b, "CrossRef"),
            record(c, "OpenAlex"),
        ]);
        assert_eq!(consolidated.len(), 2);
        assert_eq!(consolidated[0].member_sources, ["arXiv", "CrossRef"]);
        assert_eq!(consolidated[1].member_sources, ["OpenAlex"]);

        // With B first, both neighbours match the representative and the
        // same three titles form one cluster.
        let consolidated = Consolidator::new().consolidate(&[
            record(b, "CrossRef"),
            record(c, "OpenAlex"),
            record(a, "arXiv"),
        ]);
        assert_eq!(consolidated.len(), 1);
        assert_eq!(
            consolidated[0].member_sources,
            ["CrossRef", "OpenAlex", "arXiv"]
        );
    }

    #[test]
    fn test_short_title_clusters_never_gain_members() {
        // With a loosened overlap gate this pair would score 22/27, above
        // the match threshold. The one-token representative keeps its
        // cluster closed regardless.
        let config = SimilarityConfig {
            token_overlap_threshold: 0.4,
            ..Default::default()
        };
        let candidates = vec![
            record("Electroencephalography", "PubMed"),
            record("Electroencephalography Data", "OpenAlex"),
        ];

        let consolidated = Consolidator::new().with_config(config).consolidate(&candidates);
        assert_eq!(consolidated.len(), 2);
    }

    #[test]
    fn test_same_source_duplicates_merge() {
        let candidates = vec![
            record("Deep Learning for Climate Modeling", "arXiv"),
            record("Deep Learning for Climate Modeling", "arXiv"),
        ];

        let consolidated = Consolidator::new().consolidate(&candidates);

        assert_eq!(consolidated.len(), 1);
        assert_eq!(consolidated[0].member_sources, ["arXiv"]);
    }

    #[test]
    fn test_merged_authors_deduplicate_case_insensitively() {
        let mut first = record("Deep Learning for Climate Modeling", "arXiv");
        first.authors = vec!["Jane Doe".to_string(), "Wei Chen".to_string()];
        let mut second = record("Deep learning for climate modeling.", "CrossRef");
        second.authors = vec!["jane doe".to_string(), "Ahmed Khan".to_string()];

        let consolidated = Consolidator::new().consolidate(&[first, second]);

        assert_eq!(consolidated.len(), 1);
        assert_eq!(
            consolidated[0].merged_authors,
            ["Jane Doe", "Wei Chen", "Ahmed Khan"]
        );
    }

    #[test]
    fn test_merged_abstract_is_longest_first_on_tie() {
        let mut first = record("Deep Learning for Climate Modeling", "arXiv");
        first.abstract_text = Some("Short.".to_string());
        let mut second = record("Deep learning for climate modeling.", "CrossRef");
        second.abstract_text = Some("A much longer abstract with more detail.".to_string());
        let mut third = record("Deep Learning for Climate Modeling", "OpenAlex");
        third.abstract_text = None;

        let consolidated = Consolidator::new().consolidate(&[first, second, third]);
        assert_eq!(
            consolidated[0].merged_abstract.as_deref(),
            Some("A much longer abstract with more detail.")
        );

        let mut tied_a = record("Quantum Computing Advances", "arXiv");
        tied_a.abstract_text = Some("aaaa".to_string());
        let mut tied_b = record("Quantum Computing Advances", "CrossRef");
        tied_b.abstract_text = Some("bbbb".to_string());

        let consolidated = Consolidator::new().consolidate(&[tied_a, tied_b]);
        assert_eq!(consolidated[0].merged_abstract.as_deref(), Some("aaaa"));
    }

    #[test]
    fn test_urls_are_distinct_in_first_seen_order() {
        let mut first = record("Deep Learning for Climate Modeling", "arXiv");
        first.url = Some("https://arxiv.org/abs/2101.00001".to_string());
        let mut second = record("Deep learning for climate modeling.", "CrossRef");
        second.url = Some("https://doi.org/10.1000/xyz".to_string());
        let mut third = record("Deep Learning for Climate Modeling", "OpenAlex");
        third.url = Some("https://arxiv.org/abs/2101.00001".to_string());

        let consolidated = Consolidator::new().consolidate(&[first, second, third]);

        assert_eq!(
            consolidated[0].urls,
            [
                "https://arxiv.org/abs/2101.00001",
                "https://doi.org/10.1000/xyz"
            ]
        );
    }

    #[test]
    fn test_malformed_candidates_are_skipped() {
        let candidates = vec![
            record("", "arXiv"),
            record("Deep Learning for Climate Modeling", "arXiv"),
            record("Quantum Computing Advances", ""),
        ];

        let consolidated = Consolidator::new().consolidate(&candidates);

        assert_eq!(consolidated.len(), 1);
        assert_eq!(consolidated[0].cluster_id, 1);
        assert_eq!(
            consolidated[0].representative_title,
            "Deep Learning for Climate Modeling"
        );
    }

    #[test]
    fn test_consolidate_is_deterministic() {
        let mut first = record("Deep Learning for Climate Modeling", "arXiv");
        first.authors = vec!["Jane Doe".to_string()];
        first.url = Some("https://arxiv.org/abs/2101.00001".to_string());
        let mut second = record("Deep learning for climate modeling.", "CrossRef");
        second.authors = vec!["Wei Chen".to_string()];
        let candidates = vec![
            first,
            second,
            record("Quantum Computing Advances", "arXiv"),
            record("AI", "Web"),
        ];

        let engine = Consolidator::new();
        assert_eq!(engine.consolidate(&candidates), engine.consolidate(&candidates));
    }

    #[test]
    fn test_cluster_ids_are_sequential() {
        let candidates = vec![
            record("Deep Learning for Climate Modeling", "arXiv"),
            record("Quantum Computing Advances", "arXiv"),
            record("Financial Decision Making and Cognitive Agency", "CrossRef"),
        ];

        let consolidated = Consolidator::new().consolidate(&candidates);
        let ids: Vec<usize> = consolidated.iter().map(|c| c.cluster_id).collect();
        assert_eq!(ids, [1, 2, 3]);
    }

    #[test]
    fn test_engine_threshold_is_tunable() {
        let candidates = vec![
            record("Adaptive Methods for Stochastic Optimization", "arXiv"),
            record("Adaptive Methods for Stochastic Convex Optimization", "CrossRef"),
        ];

        let default_engine = Consolidator::new();
        assert_eq!(default_engine.consolidate(&candidates).len(), 1);

        let strict = Consolidator::new().with_config(SimilarityConfig {
            match_threshold: 0.9,
            ..Default::default()
        });
        assert_eq!(strict.consolidate(&candidates).len(), 2);
    }
}
