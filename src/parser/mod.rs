pub mod clean;
pub mod collect;
pub mod patterns;
pub mod source;

use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::rules::ExtractionRules;
use collect::{collect_candidates, Strategy};
use patterns::PatternMatcher;
use source::ContentSource;

/// Outcome of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extraction {
    /// `None` when no strategy produced anything.
    pub strategy: Option<Strategy>,
    /// Raw candidates collected before cleaning.
    pub candidates: usize,
    pub addresses: Vec<String>,
}

/// Five-stage pipeline: collect → normalize → dedup → re-filter → limit.
pub struct AddressExtractor {
    rules: ExtractionRules,
    matcher: PatternMatcher,
}

impl AddressExtractor {
    pub fn new(rules: ExtractionRules) -> Result<Self> {
        let matcher = PatternMatcher::new(&rules)?;
        Ok(AddressExtractor { rules, matcher })
    }

    pub fn extract(&self, source: &impl ContentSource) -> Extraction {
        let (strategy, raw) = match collect_candidates(source, &self.rules, &self.matcher) {
            Some((strategy, raw)) => (Some(strategy), raw),
            None => (None, Vec::new()),
        };
        let candidates = raw.len();

        let cleaned = raw.iter().filter_map(|c| clean::normalize(c)).collect();
        let unique = clean::retain_valid(clean::dedup(cleaned));
        let addresses = clean::limit(unique, self.rules.max_results);

        match strategy {
            Some(s) => info!(strategy = %s, candidates, kept = addresses.len(), "Extracted addresses"),
            None => info!("No address candidates found"),
        }

        Extraction {
            strategy,
            candidates,
            addresses,
        }
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use super::source::{ContentNode, HtmlSnapshot, MemorySource};

    fn extractor() -> AddressExtractor {
        AddressExtractor::new(ExtractionRules::default()).unwrap()
    }

    fn fixture(name: &str) -> HtmlSnapshot {
        let html = std::fs::read_to_string(format!("tests/fixtures/{}.html", name)).unwrap();
        HtmlSnapshot::parse(&html)
    }

    #[test]
    fn favorites_page_uses_address_containers() {
        let out = extractor().extract(&fixture("favorites"));
        assert_eq!(out.strategy, Some(Strategy::SelectorBased));
        assert_eq!(
            out.addresses,
            vec![
                "1400 Shoreline Blvd, Mountain View, CA 94043",
                "88 Castro St, Mountain View, CA 94041",
                "2150 Rock St #12, Mountain View, CA 94043",
                "500 Castro St, Mountain View, CA 94041",
            ]
        );
    }

    #[test]
    fn title_links_page_uses_labels() {
        let out = extractor().extract(&fixture("title_links"));
        assert_eq!(out.strategy, Some(Strategy::AttributeBased));
        assert_eq!(
            out.addresses,
            vec![
                "512 Alma St, Palo Alto, CA 94301",
                "77 Lytton Ave, Palo Alto, CA 94301",
            ]
        );
    }

    #[test]
    fn plain_cards_fall_back_to_text_scan() {
        let out = extractor().extract(&fixture("plain_cards"));
        assert_eq!(out.strategy, Some(Strategy::FreeTextScan));
        assert_eq!(
            out.addresses,
            vec![
                "123 Main St, Springfield, IL 62704",
                "4 Elm Ct, Springfield, IL 62711",
            ]
        );
        assert!(out.addresses.iter().all(|a| !a.contains("sq ft")));
    }

    #[test]
    fn empty_page_yields_empty_list() {
        let out = extractor().extract(&HtmlSnapshot::parse("<html><body></body></html>"));
        assert_eq!(out.strategy, None);
        assert_eq!(out.candidates, 0);
        assert!(out.addresses.is_empty());
    }

    #[test]
    fn duplicates_collapse_after_cleaning() {
        let src = MemorySource::new()
            .node(&[".addressDisplay"], ContentNode::text("9 Elm Ct\nTroy, NY 12180"))
            .node(&[".addressDisplay"], ContentNode::text("9 Elm Ct, Troy, NY 12180"))
            .node(&[".addressDisplay"], ContentNode::text("593 sq ft\n9 Elm Ct, Troy, NY 12180"));
        let out = extractor().extract(&src);
        assert_eq!(out.candidates, 3);
        assert_eq!(out.addresses, vec!["9 Elm Ct, Troy, NY 12180"]);
    }

    #[test]
    fn result_is_capped_in_first_seen_order() {
        let src = (0..30).fold(MemorySource::new(), |src, i| {
            src.node(
                &["span"],
                ContentNode::text(&format!("{} Elm Rd, Troy, NY 121{:02}", i + 1, i)),
            )
        });
        let out = extractor().extract(&src);
        assert_eq!(out.candidates, 30);
        assert_eq!(out.addresses.len(), 20);
        assert_eq!(out.addresses[0], "1 Elm Rd, Troy, NY 12100");
        assert_eq!(out.addresses[19], "20 Elm Rd, Troy, NY 12119");
    }

    #[test]
    fn cap_follows_rules() {
        let rules = ExtractionRules {
            max_results: 1,
            ..Default::default()
        };
        let src = MemorySource::new()
            .node(&["div"], ContentNode::text("1 Elm Rd, Troy, NY 12180"))
            .node(&["div"], ContentNode::text("2 Elm Rd, Troy, NY 12180"));
        let out = AddressExtractor::new(rules).unwrap().extract(&src);
        assert_eq!(out.addresses, vec!["1 Elm Rd, Troy, NY 12180"]);
    }
}
