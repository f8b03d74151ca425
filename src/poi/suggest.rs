use std::collections::HashSet;

use super::tag::TagList;

/// Frequently used OSM keys offered while typing a new tag key.
pub const COMMON_KEYS: &[&str] = &[
    "name",
    "amenity",
    "shop",
    "tourism",
    "leisure",
    "cuisine",
    "opening_hours",
    "phone",
    "website",
    "email",
    "description",
    "wheelchair",
    "internet_access",
    "outdoor_seating",
    "takeaway",
    "delivery",
    "brand",
    "operator",
    "level",
    "addr:housenumber",
    "addr:street",
    "addr:city",
    "addr:postcode",
    "addr:country",
    "contact:phone",
    "contact:website",
    "contact:email",
    "contact:facebook",
    "payment:cash",
    "payment:cards",
    "diet:vegetarian",
    "diet:vegan",
    "smoking",
    "fee",
    "access",
    "note",
    "fixme",
    "wikidata",
    "wikipedia",
];

/// Known keys starting with `prefix` (case-insensitive) that the list does not
/// already use. An empty prefix yields nothing.
pub fn suggest_keys(prefix: &str, existing: &TagList, limit: usize) -> Vec<&'static str> {
    let prefix = prefix.trim().to_lowercase();
    if prefix.is_empty() || limit == 0 {
        return Vec::new();
    }
    let used: HashSet<&str> = existing.iter().map(|(_, tag)| tag.key.as_str()).collect();
    COMMON_KEYS
        .iter()
        .copied()
        .filter(|key| key.starts_with(&prefix) && *key != prefix && !used.contains(key))
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poi::tag::Tag;

    #[test]
    fn skips_keys_already_present() {
        let tags = TagList::from_tags([Tag::new("addr:street", "Main")]);
        let hits = suggest_keys("ADDR:", &tags, 3);
        assert_eq!(hits, vec!["addr:housenumber", "addr:city", "addr:postcode"]);
    }

    #[test]
    fn exact_match_and_empty_prefix_yield_nothing() {
        let tags = TagList::new();
        assert!(suggest_keys("", &tags, 5).is_empty());
        assert!(suggest_keys("fee", &tags, 5).is_empty());
    }
}
