use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};
use crate::rules::ExtractionRules;

static ZIP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]{5}").unwrap());
static LEADING_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]+\s").unwrap());
static TRAILING_ZIP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]{5}$").unwrap());
static AREA_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[0-9]+\s*sq\s*ft").unwrap());

/// True if the text carries a 5-digit run anywhere.
pub fn has_zip(text: &str) -> bool {
    ZIP_RE.is_match(text)
}

/// True if the text opens with a number immediately followed by "sq ft".
pub fn starts_with_area(text: &str) -> bool {
    AREA_PREFIX_RE.is_match(text)
}

/// Compiled street-address matching for one rule set.
pub struct PatternMatcher {
    street: Regex,
    rules: ExtractionRules,
}

impl PatternMatcher {
    pub fn new(rules: &ExtractionRules) -> Result<Self> {
        if rules.street_suffixes.is_empty() {
            return Err(Error::NoStreetSuffixes);
        }
        let suffixes = rules
            .street_suffixes
            .iter()
            .map(|s| regex::escape(s))
            .collect::<Vec<_>>()
            .join("|");

        // The street-name group starts exactly where a lookahead would sit;
        // `scan` applies the unit exclusion there. Word boundary, letters and
        // case folding are ASCII-only; `\s` stays Unicode.
        let pattern = format!(
            r"(?-u:\b)[0-9]+\s+(?P<street>(?:[A-Za-z0-9.]+\s+){{1,4}}(?i-u:{suffixes})[A-Za-z0-9_\s.]*,\s*[A-Za-z0-9_\s.]+,\s*[A-Za-z]{{2}}\s+[0-9]{{5}})"
        );

        Ok(PatternMatcher {
            street: Regex::new(&pattern)?,
            rules: rules.clone(),
        })
    }

    /// All street addresses embedded in `text`, left to right.
    pub fn scan(&self, text: &str) -> Vec<String> {
        let mut found = Vec::new();
        let mut at = 0;

        while at <= text.len() {
            let Some(caps) = self.street.captures_at(text, at) else {
                break;
            };
            let (Some(whole), Some(street)) = (caps.get(0), caps.name("street")) else {
                break;
            };

            if self.rules.is_excluded_unit(&text[street.start()..]) {
                // Retry from the next position, as a failed lookahead would.
                at = whole.start() + 1;
                continue;
            }

            found.push(whole.as_str().to_string());
            at = whole.end();
        }

        found
    }

    /// Label/tooltip value check: number first, comma inside, zip last, no area marker.
    pub fn is_labeled_address(&self, value: &str) -> bool {
        LEADING_NUMBER_RE.is_match(value)
            && value.contains(',')
            && TRAILING_ZIP_RE.is_match(value)
            && !value.contains(self.rules.area_marker.as_str())
    }
}
