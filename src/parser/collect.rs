use std::fmt;

use serde::Serialize;
use tracing::debug;

use super::patterns::{has_zip, PatternMatcher};
use super::source::ContentSource;
use crate::rules::ExtractionRules;

/// Extraction technique, in decreasing order of specificity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    SelectorBased,
    AttributeBased,
    FreeTextScan,
}

/// Priority order; the first strategy with any candidate wins.
pub const STRATEGIES: [Strategy; 3] = [
    Strategy::SelectorBased,
    Strategy::AttributeBased,
    Strategy::FreeTextScan,
];

impl Strategy {
    pub fn collect(
        self,
        source: &impl ContentSource,
        rules: &ExtractionRules,
        matcher: &PatternMatcher,
    ) -> Vec<String> {
        match self {
            Strategy::SelectorBased => selector_based(source, rules),
            Strategy::AttributeBased => attribute_based(source, rules, matcher),
            Strategy::FreeTextScan => free_text_scan(source, rules, matcher),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::SelectorBased => "selector",
            Strategy::AttributeBased => "attribute",
            Strategy::FreeTextScan => "free-text",
        };
        f.write_str(name)
    }
}

/// Runs strategies in priority order and returns the first non-empty result.
pub fn collect_candidates(
    source: &impl ContentSource,
    rules: &ExtractionRules,
    matcher: &PatternMatcher,
) -> Option<(Strategy, Vec<String>)> {
    for strategy in STRATEGIES {
        let candidates = strategy.collect(source, rules, matcher);
        debug!(%strategy, count = candidates.len(), "Strategy finished");
        if !candidates.is_empty() {
            return Some((strategy, candidates));
        }
    }
    None
}

fn selector_based(source: &impl ContentSource, rules: &ExtractionRules) -> Vec<String> {
    source
        .query(&rules.marker_selectors)
        .into_iter()
        .filter(|node| !node.text.is_empty() && has_zip(&node.text))
        .map(|node| node.text)
        .collect()
}

fn attribute_based(
    source: &impl ContentSource,
    rules: &ExtractionRules,
    matcher: &PatternMatcher,
) -> Vec<String> {
    source
        .query(std::slice::from_ref(&rules.label_selector))
        .iter()
        .filter_map(|node| node.attr(&rules.label_attribute))
        .filter(|value| matcher.is_labeled_address(value))
        .map(str::to_string)
        .collect()
}

fn free_text_scan(
    source: &impl ContentSource,
    rules: &ExtractionRules,
    matcher: &PatternMatcher,
) -> Vec<String> {
    source
        .query(&rules.leaf_selectors)
        .iter()
        .filter(|node| node.is_leaf() && !node.text.is_empty())
        .flat_map(|node| matcher.scan(&node.text))
        .collect()
}
