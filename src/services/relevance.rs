// Copyright (c) My Warehouse Engineering
// SPDX-License-Identifier: Apache-2.0
//
// Search relevance ladder for the item manager (SPEC_FULL.md §4.2).

use crate::models::item::Item;

/// Scores a live item against a lowercased query, given its pre-joined box-path text
/// (already lowercased, segments joined with " > "). Returns 0 for no match.
pub fn score_item(item: &Item, normalized_q: &str, path_text_lower: &str) -> u32 {
    let name = item.name.to_lowercase();
    if name == normalized_q {
        return 100;
    }
    if name.starts_with(normalized_q) {
        return 90;
    }
    if name.contains(normalized_q) {
        return 80;
    }
    let aliases_lower: Vec<String> = item.aliases_vec().iter().map(|a| a.to_lowercase()).collect();
    if aliases_lower
        .iter()
        .any(|alias| alias == normalized_q || alias.contains(normalized_q))
    {
        return 70;
    }
    let tags_lower: Vec<String> = item.tags_vec().iter().map(|t| t.to_lowercase()).collect();
    if tags_lower
        .iter()
        .any(|tag| tag == normalized_q || tag.contains(normalized_q))
    {
        return 60;
    }
    let description = item.description.as_deref().unwrap_or("").to_lowercase();
    let location = item.physical_location.as_deref().unwrap_or("").to_lowercase();
    if description.contains(normalized_q) || path_text_lower.contains(normalized_q) || location.contains(normalized_q) {
        return 50;
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    fn item(name: &str, tags: &[&str], aliases: &[&str]) -> Item {
        Item {
            id: Uuid::new_v4(),
            warehouse_id: Uuid::new_v4(),
            box_id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            photo_url: None,
            physical_location: None,
            tags: json!(tags),
            aliases: json!(aliases),
            version: 1,
            deleted_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn scenario_3_ranking_ladder() {
        let exact = item("drill", &["tool"], &["borer"]);
        let prefix = item("drill bits", &["accessory"], &[]);
        let substring = item("Taladro pesado", &["power"], &["drill-driver"]);
        let alias = item("Perforador", &["drill"], &[]);

        assert_eq!(score_item(&exact, "drill", ""), 100);
        assert_eq!(score_item(&prefix, "drill", ""), 90);
        assert_eq!(score_item(&substring, "drill", ""), 70);
        assert_eq!(score_item(&alias, "drill", ""), 60);
    }

    #[test]
    fn zero_score_is_dropped_by_caller() {
        let unrelated = item("hammer", &["tool"], &[]);
        assert_eq!(score_item(&unrelated, "drill", ""), 0);
    }
}
