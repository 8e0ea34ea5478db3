//! Lexical normalisation shared by the matcher and the similarity scorer.

use std::collections::BTreeSet;

/// Pack-size units folded into the preceding number (`500 mL` -> `500ml`).
const QUANTITY_UNITS: &[&str] = &[
    "l", "ml", "ul", "µl", "nl", "g", "kg", "mg", "ug", "µg", "ng", "m", "cm", "mm", "um", "µm",
    "nm", "mol", "mmol", "umol", "iu", "ku", "u", "oz", "gal", "pk", "pcs", "ea",
];

/// Lower-cased alphanumeric words with quantity/unit pairs folded together.
pub fn lexical_words(text: &str) -> Vec<String> {
    let raw = text
        .split(|ch: char| !ch.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>();

    let mut words = Vec::with_capacity(raw.len());
    let mut index = 0;
    while index < raw.len() {
        let word = &raw[index];
        let next = raw.get(index + 1);
        match next {
            Some(unit)
                if word.chars().all(|ch| ch.is_ascii_digit())
                    && QUANTITY_UNITS.contains(&unit.as_str()) =>
            {
                words.push(format!("{word}{unit}"));
                index += 2;
            }
            _ => {
                words.push(word.clone());
                index += 1;
            }
        }
    }
    words
}

/// Distinct words of at least `min_chars` characters.
pub fn token_set(text: &str, min_chars: usize) -> BTreeSet<String> {
    lexical_words(text).into_iter().filter(|word| word.chars().count() >= min_chars).collect()
}

/// |A ∩ B| / |A ∪ B|; two empty sets share nothing.
pub fn jaccard(left: &BTreeSet<String>, right: &BTreeSet<String>) -> f64 {
    let union = left.union(right).count();
    if union == 0 {
        return 0.0;
    }
    left.intersection(right).count() as f64 / union as f64
}

/// Lower-cased with every whitespace character removed.
pub fn compact_lowercase(value: &str) -> String {
    value.chars().filter(|ch| !ch.is_whitespace()).flat_map(char::to_lowercase).collect()
}

pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

pub fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
