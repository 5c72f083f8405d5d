//! Concurrent fan-out across source adapters.
//!
//! The orchestrator owns the full pipeline for one query: fetch from every
//! adapter concurrently, translate per-source failures into empty result
//! sets, validate records at the adapter boundary, and consolidate what
//! remains. A run never fails outright; when every source is down the
//! summary simply contains zero records.

use crate::consolidate::Consolidator;
use crate::record::CandidateRecord;
use crate::report::ResearchSummary;
use crate::similarity::SimilarityConfig;
use crate::sources::SourceAdapter;
use tracing::{debug, warn};

/// Fetches from every adapter concurrently.
///
/// The returned lists are in adapter order, not completion order, so
/// downstream concatenation is reproducible run to run. A failed source
/// yields an empty list and a warning in the log.
pub async fn fetch_all(
    adapters: &[Box<dyn SourceAdapter>],
    query: &str,
    limit: usize,
) -> Vec<Vec<CandidateRecord>> {
    let fetches = adapters.iter().map(|adapter| async move {
        let outcome = adapter.fetch(query, limit).await;
        (adapter.name(), outcome)
    });

    futures::future::join_all(fetches)
        .await
        .into_iter()
        .map(|(name, outcome)| match outcome {
            Ok(records) => {
                debug!(source = name, count = records.len(), "source returned results");
                records
            }
            Err(error) => {
                warn!(source = name, error = %error, "source unavailable, continuing without it");
                Vec::new()
            }
        })
        .collect()
}

/// Runs the research pipeline for one query and returns the summary.
///
/// Per-source counts reflect what each source returned before any
/// validation, so the report shows a failed source as zero results and a
/// noisy source at full size even when some of its records are dropped.
pub async fn run_research(
    adapters: &[Box<dyn SourceAdapter>],
    query: &str,
    limit: usize,
    config: SimilarityConfig,
) -> ResearchSummary {
    let per_source = fetch_all(adapters, query, limit).await;

    let mut source_counts = Vec::with_capacity(adapters.len());
    let mut candidates = Vec::new();
    for (adapter, records) in adapters.iter().zip(per_source) {
        source_counts.push((adapter.name().to_string(), records.len()));
        for record in records {
            match record.validate() {
                Ok(()) => candidates.push(record),
                Err(error) => {
                    warn!(source = adapter.name(), %error, "dropping malformed record");
                }
            }
        }
    }

    let records = Consolidator::new()
        .with_config(config)
        .consolidate(&candidates);
    debug!(
        raw = candidates.len(),
        consolidated = records.len(),
        "research run finished"
    );

    ResearchSummary {
        query: query.to_string(),
        source_counts,
        records,
    }
}
