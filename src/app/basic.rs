use crate::config::EditorOptions;
use crate::poi::{ChangeOrigin, EditPoiData, TagSubscription};

use super::advanced::CursorMove;
use super::field::TextField;

#[derive(Debug, Clone)]
pub struct BasicField {
    pub key: String,
    pub input: TextField,
}

/// One text field per well-known key. Writes go straight to the first tag
/// carrying that key; clearing a field drops the key altogether.
#[derive(Debug)]
pub struct BasicInfoEditor {
    fields: Vec<BasicField>,
    selected: usize,
    subscription: Option<TagSubscription>,
}

impl BasicInfoEditor {
    pub fn new(keys: &[String], options: &EditorOptions) -> Self {
        let fields = keys
            .iter()
            .map(|key| BasicField {
                key: key.clone(),
                input: TextField::new(options.max_value_len),
            })
            .collect();
        Self {
            fields,
            selected: 0,
            subscription: None,
        }
    }

    pub fn fields(&self) -> &[BasicField] {
        &self.fields
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn is_visible(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn on_show(&mut self, data: &mut EditPoiData) {
        if self.subscription.is_none() {
            self.subscription = Some(data.add_listener());
        }
        self.reload_fields(data);
    }

    pub fn on_hide(&mut self, data: &mut EditPoiData) {
        if let Some(subscription) = self.subscription.take() {
            data.remove_listener(subscription.id());
        }
    }

    pub fn sync(&mut self, data: &EditPoiData) -> bool {
        match self.subscription.as_ref().and_then(TagSubscription::drain) {
            Some(_) => {
                self.reload_fields(data);
                true
            }
            None => false,
        }
    }

    pub fn move_selection(&mut self, delta: isize) {
        if self.fields.is_empty() {
            self.selected = 0;
            return;
        }
        let last = self.fields.len() as isize - 1;
        self.selected = (self.selected as isize + delta).clamp(0, last) as usize;
    }

    pub fn insert_char(&mut self, data: &mut EditPoiData, ch: char) -> bool {
        self.edit_selected(data, |input| input.insert_char(ch))
    }

    pub fn backspace(&mut self, data: &mut EditPoiData) -> bool {
        self.edit_selected(data, TextField::backspace)
    }

    pub fn delete_forward(&mut self, data: &mut EditPoiData) -> bool {
        self.edit_selected(data, TextField::delete)
    }

    pub fn move_cursor(&mut self, motion: CursorMove) -> bool {
        let Some(field) = self.fields.get_mut(self.selected) else {
            return false;
        };
        match motion {
            CursorMove::Left => field.input.move_left(),
            CursorMove::Right => field.input.move_right(),
            CursorMove::Home => field.input.move_home(),
            CursorMove::End => field.input.move_end(),
        }
    }

    fn edit_selected<F>(&mut self, data: &mut EditPoiData, edit: F) -> bool
    where
        F: FnOnce(&mut TextField) -> bool,
    {
        let origin = self
            .subscription
            .as_ref()
            .map(TagSubscription::origin)
            .unwrap_or(ChangeOrigin::Host);
        let Some(field) = self.fields.get_mut(self.selected) else {
            return false;
        };
        if !edit(&mut field.input) {
            return false;
        }
        let key = field.key.as_str();
        let value = field.input.text();
        data.update_tags(origin, |tags| {
            if value.is_empty() {
                tags.remove_key(key);
            } else {
                tags.upsert(key, value);
            }
        });
        true
    }

    fn reload_fields(&mut self, data: &EditPoiData) {
        for field in &mut self.fields {
            let current = data.tags().value_of(&field.key).unwrap_or_default();
            if field.input.text() != current {
                field.input.set_text(current);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::advanced::AdvancedTagEditor;
    use crate::poi::{Tag, TagList};

    fn keys() -> Vec<String> {
        vec!["name".into(), "phone".into()]
    }

    #[test]
    fn typing_upserts_and_clearing_removes() {
        let options = EditorOptions::default();
        let mut data = EditPoiData::new(TagList::from_tags([Tag::new("amenity", "pub")]));
        let mut basic = BasicInfoEditor::new(&keys(), &options);
        basic.on_show(&mut data);

        for ch in "Inn".chars() {
            basic.insert_char(&mut data, ch);
        }
        assert_eq!(data.tags().value_of("name"), Some("Inn"));
        assert_eq!(data.tags().len(), 2);

        for _ in 0..3 {
            basic.backspace(&mut data);
        }
        assert_eq!(data.tags().value_of("name"), None);
        assert_eq!(data.tags().len(), 1);
    }

    #[test]
    fn long_value_is_shown_whole_and_edited_in_place() {
        let options = EditorOptions {
            max_value_len: 4,
            ..EditorOptions::default()
        };
        let mut data = EditPoiData::new(TagList::from_tags([Tag::new("name", "Old Mill")]));
        let mut basic = BasicInfoEditor::new(&keys(), &options);
        basic.on_show(&mut data);
        assert_eq!(basic.fields()[0].input.text(), "Old Mill");

        assert!(basic.backspace(&mut data));
        assert_eq!(data.tags().value_of("name"), Some("Old Mil"));
    }

    #[test]
    fn basic_edits_reach_advanced_rows_after_sync() {
        let options = EditorOptions::default();
        let mut data = EditPoiData::new(TagList::from_tags([Tag::new("phone", "1")]));
        let mut basic = BasicInfoEditor::new(&keys(), &options);
        let mut advanced = AdvancedTagEditor::new(&options);
        basic.on_show(&mut data);
        advanced.on_show(&mut data);

        basic.move_selection(1);
        basic.insert_char(&mut data, '2');

        assert!(advanced.sync(&mut data));
        assert_eq!(advanced.rows()[0].value().text(), "12");
        assert!(!basic.sync(&data), "own change is not echoed");

        advanced.add_tag(&mut data, "name", "Cafe").expect("added");
        assert!(basic.sync(&data));
        assert_eq!(basic.fields()[0].input.text(), "Cafe");
    }
}
