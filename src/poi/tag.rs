use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::Display;

/// Stable handle for a tag inside one [`TagList`]. Never reused by that list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TagId(u64);

impl TagId {
    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum TagField {
    Key,
    Value,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn field(&self, field: TagField) -> &str {
        match field {
            TagField::Key => &self.key,
            TagField::Value => &self.value,
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.key.is_empty() && !self.value.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct TagEntry {
    id: TagId,
    tag: Tag,
}

impl TagEntry {
    pub fn id(&self) -> TagId {
        self.id
    }

    pub fn tag(&self) -> &Tag {
        &self.tag
    }
}

/// Ordered tags. Keys may repeat; every entry is addressed by its [`TagId`].
#[derive(Debug, Clone, Default)]
pub struct TagList {
    entries: Vec<TagEntry>,
    next_id: u64,
}

impl TagList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tags<I>(tags: I) -> Self
    where
        I: IntoIterator<Item = Tag>,
    {
        let mut list = Self::new();
        for tag in tags {
            list.push(tag);
        }
        list
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, tag: Tag) -> TagId {
        let id = TagId(self.next_id);
        self.next_id += 1;
        self.entries.push(TagEntry { id, tag });
        id
    }

    pub fn get(&self, id: TagId) -> Option<&Tag> {
        self.entries
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| &entry.tag)
    }

    pub fn position(&self, id: TagId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id == id)
    }

    pub fn entries(&self) -> &[TagEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = (TagId, &Tag)> {
        self.entries.iter().map(|entry| (entry.id, &entry.tag))
    }

    /// Overwrites one field of the tag in place. Returns false for unknown ids.
    pub fn set_field(&mut self, id: TagId, field: TagField, text: &str) -> bool {
        match self.entries.iter_mut().find(|entry| entry.id == id) {
            Some(entry) => {
                let slot = match field {
                    TagField::Key => &mut entry.tag.key,
                    TagField::Value => &mut entry.tag.value,
                };
                slot.clear();
                slot.push_str(text);
                true
            }
            None => false,
        }
    }

    pub fn set_key(&mut self, id: TagId, key: &str) -> bool {
        self.set_field(id, TagField::Key, key)
    }

    pub fn set_value(&mut self, id: TagId, value: &str) -> bool {
        self.set_field(id, TagField::Value, value)
    }

    pub fn remove(&mut self, id: TagId) -> Option<Tag> {
        let index = self.position(id)?;
        Some(self.entries.remove(index).tag)
    }

    pub fn find_key(&self, key: &str) -> Option<TagId> {
        self.entries
            .iter()
            .find(|entry| entry.tag.key == key)
            .map(|entry| entry.id)
    }

    pub fn value_of(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.tag.key == key)
            .map(|entry| entry.tag.value.as_str())
    }

    pub fn count_key(&self, key: &str) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.tag.key == key)
            .count()
    }

    /// Sets the value of the first tag with `key`, appending one if none exists.
    pub fn upsert(&mut self, key: &str, value: &str) -> TagId {
        match self.find_key(key) {
            Some(id) => {
                self.set_value(id, value);
                id
            }
            None => self.push(Tag::new(key, value)),
        }
    }

    /// Removes every tag with `key` and returns how many were dropped.
    pub fn remove_key(&mut self, key: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.tag.key != key);
        before - self.entries.len()
    }

    /// Replaces the content. Ids keep counting up so stale ids never match.
    pub fn replace_all<I>(&mut self, tags: I)
    where
        I: IntoIterator<Item = Tag>,
    {
        self.entries.clear();
        for tag in tags {
            self.push(tag);
        }
    }

    pub fn to_tags(&self) -> Vec<Tag> {
        self.entries.iter().map(|entry| entry.tag.clone()).collect()
    }

    /// Collapses to a key map in first-seen key order; later duplicates win.
    pub fn to_map(&self) -> IndexMap<String, String> {
        let mut map = IndexMap::with_capacity(self.entries.len());
        for entry in &self.entries {
            map.insert(entry.tag.key.clone(), entry.tag.value.clone());
        }
        map
    }
}
