use serde::{Deserialize, Serialize};

/// Containers known to hold a full "street, city, state zip" line.
pub const MARKER_SELECTORS: &[&str] = &[
    ".homeAddressV2",
    ".addressDisplay",
    "div[data-rf-test-id='abp-streetLine']",
    ".street-address",
    ".full-address",
];

pub const LABEL_SELECTOR: &str = "a[title]";
pub const LABEL_ATTRIBUTE: &str = "title";

/// Elements whose text is scanned when no marker or label matched.
pub const LEAF_SELECTORS: &[&str] = &["div", "span", "a"];

/// Words that may follow a bare number without it being a street number.
/// Matched as case-insensitive prefixes, so `bed` also covers `beds`/`bedrooms`.
pub const EXCLUDED_UNIT_TOKENS: &[&str] = &["sq", "ft", "bed", "bath", "ac", "wb"];

pub const STREET_SUFFIXES: &[&str] = &[
    "Road", "Rd", "Street", "St", "Drive", "Dr", "Avenue", "Ave", "Boulevard", "Blvd", "Lane",
    "Ln", "Court", "Ct", "Way", "Circle", "Cir", "Place", "Pl", "Terrace", "Ter", "Parkway",
    "Pkwy", "Square", "Sq", "Trail", "Trl", "Highway", "Hwy",
];

/// Substring that disqualifies a label value outright.
pub const AREA_MARKER: &str = "sq ft";

pub const MAX_RESULTS: usize = 20;

/// Everything the extraction pipeline treats as configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionRules {
    pub marker_selectors: Vec<String>,
    pub label_selector: String,
    pub label_attribute: String,
    pub leaf_selectors: Vec<String>,
    pub excluded_unit_tokens: Vec<String>,
    pub street_suffixes: Vec<String>,
    pub area_marker: String,
    pub max_results: usize,
}

impl Default for ExtractionRules {
    fn default() -> Self {
        ExtractionRules {
            marker_selectors: owned(MARKER_SELECTORS),
            label_selector: LABEL_SELECTOR.to_string(),
            label_attribute: LABEL_ATTRIBUTE.to_string(),
            leaf_selectors: owned(LEAF_SELECTORS),
            excluded_unit_tokens: owned(EXCLUDED_UNIT_TOKENS),
            street_suffixes: owned(STREET_SUFFIXES),
            area_marker: AREA_MARKER.to_string(),
            max_results: MAX_RESULTS,
        }
    }
}

impl ExtractionRules {
    /// True if `rest` (the text right after a leading number) opens with an excluded token.
    pub fn is_excluded_unit(&self, rest: &str) -> bool {
        self.excluded_unit_tokens.iter().any(|token| {
            rest.get(..token.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(token))
        })
    }
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
