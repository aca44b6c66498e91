use std::collections::HashSet;

use super::patterns::{has_zip, starts_with_area};

/// Flattens line breaks to ", " and trims. `None` for area figures posing as addresses.
pub fn normalize(raw: &str) -> Option<String> {
    let clean = raw
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\n', ", ")
        .trim()
        .to_string();
    if starts_with_area(&clean) {
        return None;
    }
    Some(clean)
}

/// Drops exact repeats, keeping first occurrences in order.
pub fn dedup(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

pub fn retain_valid(items: Vec<String>) -> Vec<String> {
    items.into_iter().filter(|item| has_zip(item)).collect()
}

pub fn limit(mut items: Vec<String>, max: usize) -> Vec<String> {
    items.truncate(max);
    items
}
