use crate::config::EditorOptions;
use crate::poi::{
    suggest_keys, tag_warnings, validate_new_tag, ChangeOrigin, EditPoiData, Tag, TagField, TagId,
    TagInputError, TagLimits, TagSubscription, TagWarnings,
};

use super::field::TextField;

/// Whether a change came from this screen or was observed from elsewhere.
/// Only local changes are published to the other listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateSource {
    Local,
    External,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvancedFocus {
    NewKey,
    NewValue,
    Row { index: usize, field: TagField },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorMove {
    Left,
    Right,
    Home,
    End,
}

/// Rendered row bound to one tag of the backing list.
#[derive(Debug, Clone)]
pub struct TagRow {
    tag_id: TagId,
    key: TextField,
    value: TextField,
    warnings: TagWarnings,
}

impl TagRow {
    fn new(tag_id: TagId, tag: &Tag, limits: &TagLimits) -> Self {
        Self {
            tag_id,
            key: TextField::with_text(&tag.key, limits.max_key_len),
            value: TextField::with_text(&tag.value, limits.max_value_len),
            warnings: TagWarnings::empty(),
        }
    }

    pub fn tag_id(&self) -> TagId {
        self.tag_id
    }

    pub fn key(&self) -> &TextField {
        &self.key
    }

    pub fn value(&self) -> &TextField {
        &self.value
    }

    pub fn field(&self, field: TagField) -> &TextField {
        match field {
            TagField::Key => &self.key,
            TagField::Value => &self.value,
        }
    }

    fn field_mut(&mut self, field: TagField) -> &mut TextField {
        match field {
            TagField::Key => &mut self.key,
            TagField::Value => &mut self.value,
        }
    }

    pub fn warnings(&self) -> TagWarnings {
        self.warnings
    }
}

/// Free-form tag editor: an "add tag" row on top and one editable row per
/// tag in the shared list.
#[derive(Debug)]
pub struct AdvancedTagEditor {
    limits: TagLimits,
    trim_input: bool,
    suggestion_limit: usize,
    new_key: TextField,
    new_value: TextField,
    rows: Vec<TagRow>,
    focus: AdvancedFocus,
    subscription: Option<TagSubscription>,
    suggestions: Vec<&'static str>,
    status: Option<String>,
}

impl AdvancedTagEditor {
    pub fn new(options: &EditorOptions) -> Self {
        let limits = options.limits();
        Self {
            limits,
            trim_input: options.trim_input,
            suggestion_limit: options.suggestion_limit,
            new_key: TextField::new(limits.max_key_len),
            new_value: TextField::new(limits.max_value_len),
            rows: Vec::new(),
            focus: AdvancedFocus::NewKey,
            subscription: None,
            suggestions: Vec::new(),
            status: None,
        }
    }

    pub fn rows(&self) -> &[TagRow] {
        &self.rows
    }

    pub fn new_key(&self) -> &TextField {
        &self.new_key
    }

    pub fn new_value(&self) -> &TextField {
        &self.new_value
    }

    pub fn focus(&self) -> AdvancedFocus {
        self.focus
    }

    pub fn suggestions(&self) -> &[&'static str] {
        &self.suggestions
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn is_visible(&self) -> bool {
        self.subscription.is_some()
    }

    fn origin(&self) -> ChangeOrigin {
        self.subscription
            .as_ref()
            .map(TagSubscription::origin)
            .unwrap_or(ChangeOrigin::Host)
    }

    pub fn on_show(&mut self, data: &mut EditPoiData) {
        if self.subscription.is_none() {
            self.subscription = Some(data.add_listener());
        }
        self.update_views(data);
    }

    pub fn on_hide(&mut self, data: &mut EditPoiData) {
        if let Some(subscription) = self.subscription.take() {
            data.remove_listener(subscription.id());
        }
    }

    /// Appends a tag and its row. Empty or oversized input changes nothing.
    pub fn add_tag(
        &mut self,
        data: &mut EditPoiData,
        key: &str,
        value: &str,
    ) -> Result<TagId, TagInputError> {
        let (key, value) = if self.trim_input {
            (key.trim(), value.trim())
        } else {
            (key, value)
        };
        validate_new_tag(key, value, &self.limits)?;
        let tag = Tag::new(key, value);
        let id = data.tags_mut().push(tag.clone());
        self.rows.push(TagRow::new(id, &tag, &self.limits));
        self.publish(data, UpdateSource::Local);
        Ok(id)
    }

    /// Adds the tag typed into the "add tag" row and clears it on success.
    pub fn submit_new_tag(&mut self, data: &mut EditPoiData) -> Result<TagId, TagInputError> {
        let key = self.new_key.text().to_string();
        let value = self.new_value.text().to_string();
        match self.add_tag(data, &key, &value) {
            Ok(id) => {
                self.new_key.clear();
                self.new_value.clear();
                self.focus = AdvancedFocus::NewKey;
                self.suggestions.clear();
                self.status = Some(format!("Added {}", key.trim()));
                Ok(id)
            }
            Err(err) => {
                self.status = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Throws away every row and rebuilds them from the backing list.
    pub fn update_views(&mut self, data: &mut EditPoiData) {
        self.rows = data
            .tags()
            .iter()
            .map(|(id, tag)| TagRow::new(id, tag, &self.limits))
            .collect();
        self.clamp_focus();
        self.publish(data, UpdateSource::External);
    }

    /// Picks up changes made by other listeners or the host.
    pub fn sync(&mut self, data: &mut EditPoiData) -> bool {
        let Some(event) = self.subscription.as_ref().and_then(TagSubscription::drain) else {
            return false;
        };
        tracing::debug!(revision = event.revision, origin = ?event.origin, "advanced editor re-rendering");
        self.update_views(data);
        true
    }

    /// Writes the row's field into its tag in place. Position and length of
    /// the list are unchanged.
    pub fn on_text_changed(&mut self, data: &mut EditPoiData, index: usize, field: TagField) -> bool {
        let Some(row) = self.rows.get(index) else {
            return false;
        };
        let text = row.field(field).text().to_string();
        if !data.tags_mut().set_field(row.tag_id, field, &text) {
            tracing::warn!(row = index, "row no longer backed by a tag, re-rendering");
            self.update_views(data);
            return false;
        }
        self.publish(data, UpdateSource::Local);
        true
    }

    /// Removes the row and exactly the tag it renders.
    pub fn delete_row(&mut self, data: &mut EditPoiData, index: usize) -> Option<Tag> {
        if index >= self.rows.len() {
            return None;
        }
        let row = self.rows.remove(index);
        let removed = data.tags_mut().remove(row.tag_id);
        self.clamp_focus();
        match &removed {
            Some(tag) => {
                self.status = Some(format!("Deleted {}", tag.key));
                self.publish(data, UpdateSource::Local);
            }
            None => self.update_views(data),
        }
        removed
    }

    /// On a tag row deletes that tag; on the "add tag" row empties its inputs.
    pub fn delete_focused(&mut self, data: &mut EditPoiData) -> Option<Tag> {
        match self.focus {
            AdvancedFocus::Row { index, .. } => self.delete_row(data, index),
            AdvancedFocus::NewKey | AdvancedFocus::NewValue => {
                self.clear_new_tag();
                None
            }
        }
    }

    /// Empties the "add tag" row and moves focus back to its key. Returns
    /// false when there was nothing to clear.
    pub fn clear_new_tag(&mut self) -> bool {
        let had_text = !self.new_key.is_empty() || !self.new_value.is_empty();
        self.new_key.clear();
        self.new_value.clear();
        self.suggestions.clear();
        self.focus = AdvancedFocus::NewKey;
        if had_text {
            self.status = Some("Cleared new tag".to_string());
        }
        had_text
    }

    pub fn insert_char(&mut self, data: &mut EditPoiData, ch: char) -> bool {
        self.edit_focused(data, |field| field.insert_char(ch))
    }

    pub fn backspace(&mut self, data: &mut EditPoiData) -> bool {
        self.edit_focused(data, TextField::backspace)
    }

    pub fn delete_forward(&mut self, data: &mut EditPoiData) -> bool {
        self.edit_focused(data, TextField::delete)
    }

    pub fn move_cursor(&mut self, motion: CursorMove) -> bool {
        let Some(field) = self.focused_field_mut() else {
            return false;
        };
        match motion {
            CursorMove::Left => field.move_left(),
            CursorMove::Right => field.move_right(),
            CursorMove::Home => field.move_home(),
            CursorMove::End => field.move_end(),
        }
    }

    /// Enter: key → value → submit on the "add tag" row; next row elsewhere.
    pub fn activate(&mut self, data: &mut EditPoiData) {
        match self.focus {
            AdvancedFocus::NewKey => self.focus = AdvancedFocus::NewValue,
            AdvancedFocus::NewValue => {
                if let Err(err) = self.submit_new_tag(data) {
                    tracing::debug!(%err, "new tag rejected");
                }
            }
            AdvancedFocus::Row { .. } => self.focus_vertical(1),
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = match self.focus {
            AdvancedFocus::NewKey => AdvancedFocus::NewValue,
            AdvancedFocus::NewValue if self.rows.is_empty() => AdvancedFocus::NewKey,
            AdvancedFocus::NewValue => AdvancedFocus::Row {
                index: 0,
                field: TagField::Key,
            },
            AdvancedFocus::Row {
                index,
                field: TagField::Key,
            } => AdvancedFocus::Row {
                index,
                field: TagField::Value,
            },
            AdvancedFocus::Row {
                index,
                field: TagField::Value,
            } if index + 1 < self.rows.len() => AdvancedFocus::Row {
                index: index + 1,
                field: TagField::Key,
            },
            AdvancedFocus::Row { .. } => AdvancedFocus::NewKey,
        };
    }

    pub fn focus_prev(&mut self) {
        self.focus = match self.focus {
            AdvancedFocus::NewKey => match self.rows.len() {
                0 => AdvancedFocus::NewValue,
                len => AdvancedFocus::Row {
                    index: len - 1,
                    field: TagField::Value,
                },
            },
            AdvancedFocus::NewValue => AdvancedFocus::NewKey,
            AdvancedFocus::Row {
                index,
                field: TagField::Value,
            } => AdvancedFocus::Row {
                index,
                field: TagField::Key,
            },
            AdvancedFocus::Row {
                index: 0,
                field: TagField::Key,
            } => AdvancedFocus::NewValue,
            AdvancedFocus::Row { index, .. } => AdvancedFocus::Row {
                index: index - 1,
                field: TagField::Value,
            },
        };
    }

    /// Moves between the "add tag" row and tag rows, keeping the column.
    pub fn focus_vertical(&mut self, delta: isize) {
        let (position, field) = match self.focus {
            AdvancedFocus::NewKey => (0, TagField::Key),
            AdvancedFocus::NewValue => (0, TagField::Value),
            AdvancedFocus::Row { index, field } => (index as isize + 1, field),
        };
        let last = self.rows.len() as isize;
        let next = (position + delta).clamp(0, last);
        self.focus = if next == 0 {
            match field {
                TagField::Key => AdvancedFocus::NewKey,
                TagField::Value => AdvancedFocus::NewValue,
            }
        } else {
            AdvancedFocus::Row {
                index: (next - 1) as usize,
                field,
            }
        };
    }

    /// Copies the n-th key suggestion into the "add tag" row.
    pub fn accept_suggestion(&mut self, index: usize) -> Option<&'static str> {
        let key = *self.suggestions.get(index)?;
        self.new_key.set_text(key);
        self.suggestions.clear();
        self.focus = AdvancedFocus::NewValue;
        Some(key)
    }

    fn edit_focused<F>(&mut self, data: &mut EditPoiData, edit: F) -> bool
    where
        F: FnOnce(&mut TextField) -> bool,
    {
        let focus = self.focus;
        let Some(field) = self.focused_field_mut() else {
            return false;
        };
        if !edit(field) {
            return false;
        }
        self.status = None;
        match focus {
            AdvancedFocus::Row { index, field } => {
                self.on_text_changed(data, index, field);
            }
            AdvancedFocus::NewKey => {
                self.suggestions =
                    suggest_keys(self.new_key.text(), data.tags(), self.suggestion_limit);
            }
            AdvancedFocus::NewValue => {}
        }
        true
    }

    fn focused_field_mut(&mut self) -> Option<&mut TextField> {
        match self.focus {
            AdvancedFocus::NewKey => Some(&mut self.new_key),
            AdvancedFocus::NewValue => Some(&mut self.new_value),
            AdvancedFocus::Row { index, field } => {
                self.rows.get_mut(index).map(|row| row.field_mut(field))
            }
        }
    }

    fn clamp_focus(&mut self) {
        if let AdvancedFocus::Row { index, field } = self.focus {
            self.focus = match self.rows.len() {
                0 => AdvancedFocus::NewKey,
                len if index >= len => AdvancedFocus::Row {
                    index: len - 1,
                    field,
                },
                _ => self.focus,
            };
        }
    }

    fn refresh_annotations(&mut self, data: &EditPoiData) {
        let warnings = tag_warnings(data.tags());
        for row in &mut self.rows {
            row.warnings = warnings.get(&row.tag_id).copied().unwrap_or_default();
        }
        if !self.new_key.is_empty() {
            self.suggestions = suggest_keys(self.new_key.text(), data.tags(), self.suggestion_limit);
        }
    }

    /// Re-annotates the rows, then tells the other listeners about local
    /// changes. External changes are never passed on.
    fn publish(&mut self, data: &mut EditPoiData, source: UpdateSource) {
        self.refresh_annotations(data);
        match source {
            UpdateSource::Local => {
                let delivered = data.notify_tags_changed(self.origin());
                tracing::trace!(delivered, "advanced editor published tag change");
            }
            UpdateSource::External => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poi::TagList;
    use assert_matches::assert_matches;

    fn editor() -> AdvancedTagEditor {
        AdvancedTagEditor::new(&EditorOptions::default())
    }

    fn shown(tags: &[(&str, &str)]) -> (EditPoiData, AdvancedTagEditor) {
        let mut data = EditPoiData::new(TagList::from_tags(
            tags.iter().map(|(k, v)| Tag::new(*k, *v)),
        ));
        let mut screen = editor();
        screen.on_show(&mut data);
        (data, screen)
    }

    fn type_text(screen: &mut AdvancedTagEditor, data: &mut EditPoiData, text: &str) {
        for ch in text.chars() {
            screen.insert_char(data, ch);
        }
    }

    #[test]
    fn adding_complete_tag_grows_list_and_rows() {
        let (mut data, mut screen) = shown(&[("amenity", "cafe")]);
        let observer = data.add_listener();

        let id = screen.add_tag(&mut data, "name", "Blue Door").expect("added");

        assert_eq!(data.tags().len(), 2);
        assert_eq!(screen.rows().len(), 2);
        assert_eq!(screen.rows()[1].tag_id(), id);
        assert_eq!(screen.rows()[1].value().text(), "Blue Door");
        assert!(observer.drain().is_some());
    }

    #[test]
    fn adding_with_empty_part_changes_nothing() {
        let (mut data, mut screen) = shown(&[("amenity", "cafe")]);
        let observer = data.add_listener();

        assert_eq!(screen.add_tag(&mut data, "", "x"), Err(TagInputError::EmptyKey));
        assert_eq!(screen.add_tag(&mut data, "name", "  "), Err(TagInputError::EmptyValue));

        assert_eq!(data.tags().len(), 1);
        assert_eq!(screen.rows().len(), 1);
        assert_eq!(data.revision(), 0);
        assert!(observer.drain().is_none());
    }

    #[test]
    fn submit_uses_and_clears_new_tag_row() {
        let (mut data, mut screen) = shown(&[]);
        type_text(&mut screen, &mut data, "cuisine");
        screen.activate(&mut data);
        assert_eq!(screen.focus(), AdvancedFocus::NewValue);
        type_text(&mut screen, &mut data, "pizza");
        screen.activate(&mut data);

        assert_eq!(data.tags().value_of("cuisine"), Some("pizza"));
        assert!(screen.new_key().is_empty());
        assert!(screen.new_value().is_empty());
        assert_eq!(screen.status(), Some("Added cuisine"));
    }

    #[test]
    fn failed_submit_keeps_typed_text() {
        let (mut data, mut screen) = shown(&[]);
        type_text(&mut screen, &mut data, "name");
        assert_matches!(screen.submit_new_tag(&mut data), Err(TagInputError::EmptyValue));
        assert_eq!(screen.new_key().text(), "name");
        assert_eq!(screen.status(), Some("tag value cannot be empty"));
        assert!(data.tags().is_empty());
    }

    #[test]
    fn delete_removes_exactly_the_rendered_tag() {
        let (mut data, mut screen) = shown(&[("note", "a"), ("note", "b"), ("note", "c")]);

        let removed = screen.delete_row(&mut data, 1);

        assert_eq!(removed, Some(Tag::new("note", "b")));
        assert_eq!(data.tags().len(), 2);
        assert_eq!(screen.rows().len(), 2);
        let values: Vec<_> = data.tags().iter().map(|(_, t)| t.value.clone()).collect();
        assert_eq!(values, vec!["a", "c"]);
        assert!(screen.delete_row(&mut data, 5).is_none());
    }

    #[test]
    fn editing_a_row_updates_in_place() {
        let (mut data, mut screen) = shown(&[("name", "Cafe"), ("wifi", "no"), ("shop", "x")]);
        screen.focus_vertical(2);
        screen.focus_next();
        assert_eq!(
            screen.focus(),
            AdvancedFocus::Row {
                index: 1,
                field: TagField::Value
            }
        );
        screen.backspace(&mut data);
        screen.backspace(&mut data);
        type_text(&mut screen, &mut data, "yes");

        assert_eq!(data.tags().len(), 3);
        let tags = data.tags().to_tags();
        assert_eq!(tags[1], Tag::new("wifi", "yes"));
        assert_eq!(tags[2], Tag::new("shop", "x"));
        assert_eq!(screen.rows()[1].value().text(), "yes");
    }

    #[test]
    fn external_update_rerenders_without_echo() {
        let (mut data, mut screen) = shown(&[("name", "Old")]);
        let sibling = data.add_listener();

        data.update_tags(sibling.origin(), |tags| {
            tags.replace_all([Tag::new("name", "New"), Tag::new("phone", "123")])
        });
        assert!(sibling.drain().is_none());

        assert!(screen.sync(&mut data));
        assert_eq!(screen.rows().len(), 2);
        assert_eq!(screen.rows()[0].value().text(), "New");
        assert!(sibling.drain().is_none(), "sync must not notify");
        assert!(!screen.sync(&mut data));
    }

    #[test]
    fn own_changes_are_not_delivered_back() {
        let (mut data, mut screen) = shown(&[]);
        screen.add_tag(&mut data, "name", "A").expect("added");
        assert!(!screen.sync(&mut data));
    }

    #[test]
    fn hidden_screen_is_not_notified() {
        let (mut data, mut screen) = shown(&[("name", "A")]);
        screen.on_hide(&mut data);
        assert!(!screen.is_visible());
        assert_eq!(data.listener_count(), 0);

        data.replace_tags([Tag::new("name", "B")]);
        assert!(!screen.sync(&mut data));
        assert_eq!(screen.rows()[0].value().text(), "A");

        screen.on_show(&mut data);
        assert_eq!(screen.rows()[0].value().text(), "B");
    }

    #[test]
    fn suggestions_follow_new_key_input() {
        let (mut data, mut screen) = shown(&[("addr:street", "Main")]);
        type_text(&mut screen, &mut data, "addr:c");
        assert_eq!(screen.suggestions(), &["addr:city", "addr:country"]);
        assert_eq!(screen.accept_suggestion(1), Some("addr:country"));
        assert_eq!(screen.new_key().text(), "addr:country");
        assert_eq!(screen.focus(), AdvancedFocus::NewValue);
    }

    #[test]
    fn focus_wraps_and_clamps_after_delete() {
        let (mut data, mut screen) = shown(&[("a", "1"), ("b", "2")]);
        screen.focus_prev();
        assert_eq!(
            screen.focus(),
            AdvancedFocus::Row {
                index: 1,
                field: TagField::Value
            }
        );
        screen.delete_focused(&mut data);
        assert_eq!(
            screen.focus(),
            AdvancedFocus::Row {
                index: 0,
                field: TagField::Value
            }
        );
        screen.delete_focused(&mut data);
        assert_eq!(screen.focus(), AdvancedFocus::NewKey);
        assert!(data.tags().is_empty());
    }

    #[test]
    fn long_stored_value_survives_row_edit() {
        let options = EditorOptions {
            max_value_len: 10,
            ..EditorOptions::default()
        };
        let mut data = EditPoiData::new(TagList::from_tags([Tag::new(
            "note",
            "0123456789ABCDEFGHIJ",
        )]));
        let mut screen = AdvancedTagEditor::new(&options);
        screen.on_show(&mut data);
        assert_eq!(screen.rows()[0].value().text(), "0123456789ABCDEFGHIJ");

        screen.focus_vertical(1);
        screen.focus_next();
        assert!(screen.backspace(&mut data));
        assert_eq!(data.tags().value_of("note"), Some("0123456789ABCDEFGHI"));
        assert!(!screen.insert_char(&mut data, 'Z'));
        assert_eq!(data.tags().value_of("note"), Some("0123456789ABCDEFGHI"));
    }

    #[test]
    fn over_limit_input_is_rejected_on_add_and_submit() {
        let options = EditorOptions {
            max_key_len: 5,
            ..EditorOptions::default()
        };
        let mut data = EditPoiData::default();
        let mut screen = AdvancedTagEditor::new(&options);
        screen.on_show(&mut data);

        assert_eq!(
            screen.add_tag(&mut data, "toolong", "x"),
            Err(TagInputError::TooLong {
                field: TagField::Key,
                limit: 5
            })
        );

        // a suggestion may be longer than what typing allows
        type_text(&mut screen, &mut data, "addr:");
        assert!(screen.accept_suggestion(0).is_some());
        type_text(&mut screen, &mut data, "x");
        assert_matches!(
            screen.submit_new_tag(&mut data),
            Err(TagInputError::TooLong {
                field: TagField::Key,
                limit: 5
            })
        );
        assert_eq!(screen.status(), Some("tag key is longer than 5 characters"));
        assert!(data.tags().is_empty());
        assert!(screen.rows().is_empty());
        assert_eq!(data.revision(), 0);
    }

    #[test]
    fn stale_row_rerenders_without_notifying() {
        let (mut data, mut screen) = shown(&[("a", "1"), ("b", "2")]);
        let observer = data.add_listener();
        let gone = screen.rows()[1].tag_id();
        data.tags_mut().remove(gone);

        assert!(!screen.on_text_changed(&mut data, 1, TagField::Value));

        assert_eq!(screen.rows().len(), 1);
        assert_eq!(screen.rows()[0].key().text(), "a");
        assert_eq!(data.revision(), 0);
        assert!(observer.drain().is_none());
    }

    #[test]
    fn delete_on_new_tag_row_clears_inputs() {
        let (mut data, mut screen) = shown(&[("amenity", "cafe")]);
        type_text(&mut screen, &mut data, "web");
        screen.focus_next();
        type_text(&mut screen, &mut data, "x");
        assert_eq!(screen.focus(), AdvancedFocus::NewValue);

        assert!(screen.delete_focused(&mut data).is_none());

        assert!(screen.new_key().is_empty());
        assert!(screen.new_value().is_empty());
        assert!(screen.suggestions().is_empty());
        assert_eq!(screen.focus(), AdvancedFocus::NewKey);
        assert_eq!(screen.status(), Some("Cleared new tag"));
        assert_eq!(data.tags().len(), 1);
        assert!(!screen.clear_new_tag());
    }

    #[test]
    fn duplicate_keys_are_flagged_on_rows() {
        let (mut data, mut screen) = shown(&[("name", "A")]);
        screen.add_tag(&mut data, "name", "B").expect("added");
        assert!(screen
            .rows()
            .iter()
            .all(|row| row.warnings().contains(TagWarnings::DUPLICATE_KEY)));
        assert_eq!(data.tags().entries().len(), 2);
    }
}
