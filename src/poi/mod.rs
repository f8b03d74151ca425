//! Tag model for a point-of-interest edit.

mod data;
mod document;
mod suggest;
mod tag;
mod validate;

pub use data::{ChangeOrigin, EditPoiData, ListenerId, TagSubscription, TagsChanged};
pub use document::{name_of, EditAction, PoiDocument};
pub use suggest::{suggest_keys, COMMON_KEYS};
pub use tag::{Tag, TagEntry, TagField, TagId, TagList};
pub use validate::{
    key_looks_valid, tag_warnings, validate_new_tag, TagInputError, TagLimits, TagWarnings,
    OSM_MAX_TAG_LEN,
};
