// Copyright (c) My Warehouse Engineering
// SPDX-License-Identifier: Apache-2.0
//
// Keyword-based tag/alias extraction. Despite the "LLM" naming carried through the
// surrounding settings surface (SPEC_FULL.md §4.9), this is a local heuristic, not a
// model call — preserved as-is from the source rather than wired to a real provider.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

// Preserved byte-for-byte from the source (SPEC_FULL.md §9 open questions).
const STOPWORDS: &[&str] = &[
    "the", "and", "for", "con", "sin", "para", "una", "unos", "unas", "este", "esta", "that",
    "from", "with", "garaje",
];

static TOKEN_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z0-9]{3,}").unwrap());

fn normalize_text(raw: &str) -> String {
    // NFKD + strip combining marks, approximating Python's unicodedata normalize+strip.
    raw.chars()
        .flat_map(|c| c.to_lowercase())
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

fn is_combining_mark(c: char) -> bool {
    matches!(c as u32, 0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0x20D0..=0x20FF)
}

fn tokenize(raw: &str) -> Vec<String> {
    let stopwords: HashSet<&str> = STOPWORDS.iter().copied().collect();
    let text = normalize_text(raw);
    TOKEN_PATTERN
        .find_iter(&text)
        .map(|m| m.as_str().to_string())
        .filter(|tok| !stopwords.contains(tok.as_str()))
        .collect()
}

/// Mirrors `generate_tags_and_aliases` in the source settings/LLM reprocessing flow.
pub fn generate_tags_and_aliases(name: &str, description: Option<&str>) -> (Vec<String>, Vec<String>) {
    let source = format!("{name} {}", description.unwrap_or("")).trim().to_string();
    let tokens = tokenize(&source);

    let mut tags = Vec::new();
    for token in &tokens {
        if !tags.contains(token) {
            tags.push(token.clone());
        }
        if tags.len() >= 8 {
            break;
        }
    }

    let normalized_name = normalize_text(name);
    let name_tokens = tokenize(name);
    let mut aliases = Vec::new();
    if !name_tokens.is_empty() {
        aliases.push(name_tokens[..name_tokens.len().min(2)].join("-"));
    }
    if name_tokens.len() >= 2 {
        aliases.push(name_tokens[..2].join(" "));
    }
    if !normalized_name.is_empty() && !aliases.contains(&normalized_name) {
        aliases.push(normalized_name.clone());
    }

    aliases.retain(|alias| !alias.is_empty() && *alias != normalized_name);
    aliases.truncate(5);
    tags.truncate(10);
    (tags, aliases)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_drops_stopwords_and_short_tokens() {
        let tokens = tokenize("The garaje box with a filter and 12 bolts");
        assert!(!tokens.contains(&"the".to_string()));
        assert!(!tokens.contains(&"garaje".to_string()));
        assert!(!tokens.contains(&"and".to_string()));
        assert!(!tokens.contains(&"a".to_string()));
        assert!(tokens.contains(&"filter".to_string()));
        assert!(tokens.contains(&"bolts".to_string()));
    }

    #[test]
    fn tokenize_strips_accents_before_matching() {
        let tokens = tokenize("Cojinete");
        assert!(tokens.contains(&"cojinete".to_string()));
        let accented = tokenize("tornillo");
        assert_eq!(tokenize("TORNILLO"), accented);
    }

    #[test]
    fn normalize_text_strips_combining_marks_and_lowercases() {
        let with_mark = format!("caf{}e", '\u{0301}');
        assert_eq!(normalize_text(&with_mark), "cafe");
        assert_eq!(normalize_text("BOLT"), "bolt");
    }

    #[test]
    fn generate_tags_and_aliases_is_capped_and_deduplicated() {
        let (tags, aliases) = generate_tags_and_aliases(
            "Bolt bolt washer",
            Some("assorted hardware bolt washer nut spring clip bracket hinge screw"),
        );
        assert!(tags.len() <= 10);
        let unique: HashSet<&String> = tags.iter().collect();
        assert_eq!(unique.len(), tags.len(), "tags must not contain duplicates");
        assert!(aliases.len() <= 5);
    }

    #[test]
    fn generate_tags_and_aliases_handles_empty_input() {
        let (tags, aliases) = generate_tags_and_aliases("", None);
        assert!(tags.is_empty());
        assert!(aliases.is_empty());
    }
}
