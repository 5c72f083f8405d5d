//! Markdown report rendering.
//!
//! All functions here are pure. The generation timestamp is a caller-supplied
//! string, so rendering the same summary twice yields identical bytes.

use crate::record::ConsolidatedRecord;
use serde::{Deserialize, Serialize};

/// The complete outcome of one query run, ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchSummary {
    /// The research topic as entered
    pub query: String,
    /// Raw result count per source, in adapter priority order
    pub source_counts: Vec<(String, usize)>,
    /// Consolidated records, ordered by `cluster_id` ascending
    pub records: Vec<ConsolidatedRecord>,
}

/// Render the full markdown report for a run.
///
/// An empty run still renders a complete document with a "No results found."
/// body instead of failing.
#[must_use]
pub fn render_markdown(summary: &ResearchSummary, generated_at: &str) -> String {
    let mut output = format!("# Research Report: {}\n\n", summary.query);
    output.push_str(&format!("_Generated_: {generated_at}\n\n"));

    output.push_str("## Retrieval summary\n\n");
    for (source, count) in &summary.source_counts {
        output.push_str(&format!("- **{source}**: {count} results\n"));
    }

    let raw_total: usize = summary.source_counts.iter().map(|(_, count)| count).sum();
    output.push_str(&format!(
        "\n{raw_total} raw results consolidated into {} records.\n\n",
        summary.records.len()
    ));

    if summary.records.is_empty() {
        output.push_str("No results found.\n");
        return output;
    }

    output.push_str("## Consolidated results\n\n");
    for record in &summary.records {
        output.push_str(&format_record_markdown(record));
        output.push_str("\n---\n\n");
    }

    output
}

/// Format one consolidated record as a markdown block.
#[must_use]
pub fn format_record_markdown(record: &ConsolidatedRecord) -> String {
    let mut output = String::new();

    // Tag and title, linking the first URL when there is one.
    match record.urls.first() {
        Some(url) => output.push_str(&format!(
            "**[Consolidated-{}]** [{}]({url})  \n",
            record.cluster_id, record.representative_title
        )),
        None => output.push_str(&format!(
            "**[Consolidated-{}]** {}  \n",
            record.cluster_id, record.representative_title
        )),
    }

    output.push_str(&format!(
        "_Sources_: {}  \n",
        record.member_sources.join(", ")
    ));

    if !record.merged_authors.is_empty() {
        output.push_str(&format!(
            "_Authors_: {}  \n",
            record.merged_authors.join(", ")
        ));
    }

    if record.urls.len() > 1 {
        output.push_str(&format!("_Links_: {}  \n", record.urls.join(", ")));
    }

    if let Some(abstract_text) = &record.merged_abstract {
        output.push_str(&format!("\n{abstract_text}\n"));
    }

    output
}

/// File-system safe slug for a query.
///
/// Alphanumeric characters are lower-cased, everything else collapses to a
/// single underscore.
#[must_use]
pub fn slugify(query: &str) -> String {
    let mut slug = String::with_capacity(query.len());
    for c in query.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }
    slug.trim_matches('_').to_string()
}

/// Report filename for a query at a given timestamp.
#[must_use]
pub fn report_filename(query: &str, timestamp: &str) -> String {
    let slug = slugify(query);
    if slug.is_empty() {
        format!("report_{timestamp}.md")
    } else {
        format!("{slug}_{timestamp}.md")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_record() -> ConsolidatedRecord {
        ConsolidatedRecord {
            cluster_id: 1,
            representative_title: "Deep Learning for Climate Modeling".to_string(),
            member_sources: vec!["arXiv".to_string(), "CrossRef".to_string()],
            merged_authors: vec!["Jane Doe".to_string()],
            merged_abstract: Some("An overview.".to_string()),
            urls: vec![
                "https://arxiv.org/abs/2101.00001".to_string(),
                "https://doi.org/10.1000/xyz".to_string(),
            ],
        }
    }

    #[test]
    fn test_format_record_with_urls() {
        let expected = "**[Consolidated-1]** [Deep Learning for Climate Modeling](https://arxiv.org/abs/2101.00001)  \n\
                        _Sources_: arXiv, CrossRef  \n\
                        _Authors_: Jane Doe  \n\
                        _Links_: https://arxiv.org/abs/2101.00001, https://doi.org/10.1000/xyz  \n\
                        \nAn overview.\n";
        assert_eq!(format_record_markdown(&sample_record()), expected);
    }

    #[test]
    fn test_format_record_without_url_or_authors() {
        let record = ConsolidatedRecord {
            cluster_id: 3,
            representative_title: "Quantum Computing Advances".to_string(),
            member_sources: vec!["PubMed".to_string()],
            merged_authors: vec![],
            merged_abstract: None,
            urls: vec![],
        };
        let expected = "**[Consolidated-3]** Quantum Computing Advances  \n\
                        _Sources_: PubMed  \n";
        assert_eq!(format_record_markdown(&record), expected);
    }

    #[test]
    fn test_render_markdown_full_report() {
        let summary = ResearchSummary {
            query: "climate modeling".to_string(),
            source_counts: vec![("arXiv".to_string(), 2), ("CrossRef".to_string(), 1)],
            records: vec![sample_record()],
        };

        let report = render_markdown(&summary, "2026-08-22 10:15:30");

        assert!(report.starts_with("# Research Report: climate modeling\n"));
        assert!(report.contains("_Generated_: 2026-08-22 10:15:30"));
        assert!(report.contains("- **arXiv**: 2 results\n"));
        assert!(report.contains("- **CrossRef**: 1 results\n"));
        assert!(report.contains("3 raw results consolidated into 1 records."));
        assert!(report.contains("## Consolidated results"));
        assert!(report.contains("**[Consolidated-1]**"));
    }

    #[test]
    fn test_render_markdown_empty_run() {
        let summary = ResearchSummary {
            query: "obscure topic".to_string(),
            source_counts: vec![("arXiv".to_string(), 0)],
            records: vec![],
        };

        let report = render_markdown(&summary, "2026-08-22 10:15:30");

        assert!(report.contains("No results found.\n"));
        assert!(!report.contains("## Consolidated results"));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Deep Learning!"), "deep_learning");
        assert_eq!(slugify("CRISPR/Cas9 gene editing"), "crispr_cas9_gene_editing");
        assert_eq!(slugify("Naïve Bayes"), "naïve_bayes");
        assert_eq!(slugify(" ??? "), "");
    }

    #[test]
    fn test_report_filename() {
        assert_eq!(
            report_filename("Deep Learning", "20260822-101530"),
            "deep_learning_20260822-101530.md"
        );
        assert_eq!(report_filename("???", "20260822-101530"), "report_20260822-101530.md");
    }
}
