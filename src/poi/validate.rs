use std::collections::HashMap;

use bitflags::bitflags;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use super::tag::{TagField, TagId, TagList};

/// OSM caps keys and values at 255 characters.
pub const OSM_MAX_TAG_LEN: usize = 255;

static KEY_SYNTAX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_:.\-]*$").expect("tag key pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagInputError {
    #[error("tag key cannot be empty")]
    EmptyKey,
    #[error("tag value cannot be empty")]
    EmptyValue,
    #[error("tag {field} is longer than {limit} characters")]
    TooLong { field: TagField, limit: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagLimits {
    pub max_key_len: usize,
    pub max_value_len: usize,
}

impl TagLimits {
    pub fn for_field(&self, field: TagField) -> usize {
        match field {
            TagField::Key => self.max_key_len,
            TagField::Value => self.max_value_len,
        }
    }
}

impl Default for TagLimits {
    fn default() -> Self {
        Self {
            max_key_len: OSM_MAX_TAG_LEN,
            max_value_len: OSM_MAX_TAG_LEN,
        }
    }
}

pub fn validate_new_tag(key: &str, value: &str, limits: &TagLimits) -> Result<(), TagInputError> {
    if key.is_empty() {
        return Err(TagInputError::EmptyKey);
    }
    if value.is_empty() {
        return Err(TagInputError::EmptyValue);
    }
    for (field, text) in [(TagField::Key, key), (TagField::Value, value)] {
        let limit = limits.for_field(field);
        if text.chars().count() > limit {
            return Err(TagInputError::TooLong { field, limit });
        }
    }
    Ok(())
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TagWarnings: u8 {
        const EMPTY_KEY = 0b0001;
        const EMPTY_VALUE = 0b0010;
        const DUPLICATE_KEY = 0b0100;
        const UNUSUAL_KEY = 0b1000;
    }
}

impl TagWarnings {
    pub fn describe(self) -> Vec<&'static str> {
        let mut labels = Vec::new();
        if self.contains(TagWarnings::EMPTY_KEY) {
            labels.push("empty key");
        }
        if self.contains(TagWarnings::EMPTY_VALUE) {
            labels.push("empty value");
        }
        if self.contains(TagWarnings::DUPLICATE_KEY) {
            labels.push("duplicate key");
        }
        if self.contains(TagWarnings::UNUSUAL_KEY) {
            labels.push("unusual key");
        }
        labels
    }
}

pub fn key_looks_valid(key: &str) -> bool {
    KEY_SYNTAX.is_match(key)
}

/// Flags every tag that would likely be rejected or surprise a mapper.
pub fn tag_warnings(tags: &TagList) -> HashMap<TagId, TagWarnings> {
    let mut key_counts: HashMap<&str, usize> = HashMap::new();
    for (_, tag) in tags.iter() {
        if !tag.key.is_empty() {
            *key_counts.entry(tag.key.as_str()).or_default() += 1;
        }
    }

    let mut out = HashMap::with_capacity(tags.len());
    for (id, tag) in tags.iter() {
        let mut flags = TagWarnings::empty();
        if tag.key.is_empty() {
            flags |= TagWarnings::EMPTY_KEY;
        } else if !key_looks_valid(&tag.key) {
            flags |= TagWarnings::UNUSUAL_KEY;
        }
        if tag.value.is_empty() {
            flags |= TagWarnings::EMPTY_VALUE;
        }
        if key_counts.get(tag.key.as_str()).copied().unwrap_or(0) > 1 {
            flags |= TagWarnings::DUPLICATE_KEY;
        }
        out.insert(id, flags);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poi::tag::Tag;
    use assert_matches::assert_matches;

    #[test]
    fn rejects_empty_parts() {
        let limits = TagLimits::default();
        assert_eq!(validate_new_tag("", "x", &limits), Err(TagInputError::EmptyKey));
        assert_eq!(validate_new_tag("k", "", &limits), Err(TagInputError::EmptyValue));
        assert!(validate_new_tag("k", "v", &limits).is_ok());
    }

    #[test]
    fn enforces_character_limits() {
        let limits = TagLimits {
            max_key_len: 3,
            max_value_len: 4,
        };
        assert_matches!(
            validate_new_tag("name", "x", &limits),
            Err(TagInputError::TooLong { field: TagField::Key, limit: 3 })
        );
        // four characters, more than four bytes
        assert!(validate_new_tag("k", "café", &limits).is_ok());
        let err = validate_new_tag("k", "cafés", &limits).unwrap_err();
        assert_eq!(err.to_string(), "tag value is longer than 4 characters");
    }

    #[test]
    fn warnings_flag_duplicates_and_odd_keys() {
        let tags = TagList::from_tags([
            Tag::new("name", "A"),
            Tag::new("name", "B"),
            Tag::new("opening hours", "24/7"),
            Tag::new("addr:street", ""),
        ]);
        let warnings = tag_warnings(&tags);
        let flags: Vec<TagWarnings> = tags.iter().map(|(id, _)| warnings[&id]).collect();

        assert_eq!(flags[0], TagWarnings::DUPLICATE_KEY);
        assert_eq!(flags[1], TagWarnings::DUPLICATE_KEY);
        assert_eq!(flags[2], TagWarnings::UNUSUAL_KEY);
        assert_eq!(flags[3], TagWarnings::EMPTY_VALUE);
        assert_eq!(flags[3].describe(), vec!["empty value"]);
    }
}
