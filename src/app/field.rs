use unicode_segmentation::UnicodeSegmentation;

/// Single-line input with a grapheme-aware cursor and a character cap.
#[derive(Debug, Clone)]
pub struct TextField {
    text: String,
    cursor: usize,
    max_chars: usize,
}

impl TextField {
    pub fn new(max_chars: usize) -> Self {
        Self {
            text: String::new(),
            cursor: 0,
            max_chars,
        }
    }

    pub fn with_text(text: &str, max_chars: usize) -> Self {
        let mut field = Self::new(max_chars);
        field.set_text(text);
        field
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Byte offset of the cursor.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Cursor position counted in graphemes, for drawing.
    pub fn cursor_column(&self) -> usize {
        self.text[..self.cursor].graphemes(true).count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Replaces the text and parks the cursor at the end. Text already over
    /// the cap is kept whole; the cap only stops further inserts.
    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.cursor = self.text.len();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    pub fn insert_char(&mut self, ch: char) -> bool {
        if ch.is_control() || self.text.chars().count() >= self.max_chars {
            return false;
        }
        self.text.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
        true
    }

    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let start = prev_grapheme_boundary(&self.text, self.cursor);
        self.text.replace_range(start..self.cursor, "");
        self.cursor = start;
        true
    }

    pub fn delete(&mut self) -> bool {
        if self.cursor >= self.text.len() {
            return false;
        }
        let end = next_grapheme_boundary(&self.text, self.cursor);
        self.text.replace_range(self.cursor..end, "");
        true
    }

    pub fn move_left(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor = prev_grapheme_boundary(&self.text, self.cursor);
        true
    }

    pub fn move_right(&mut self) -> bool {
        if self.cursor >= self.text.len() {
            return false;
        }
        self.cursor = next_grapheme_boundary(&self.text, self.cursor);
        true
    }

    pub fn move_home(&mut self) -> bool {
        let moved = self.cursor != 0;
        self.cursor = 0;
        moved
    }

    pub fn move_end(&mut self) -> bool {
        let moved = self.cursor != self.text.len();
        self.cursor = self.text.len();
        moved
    }
}

fn prev_grapheme_boundary(text: &str, cursor: usize) -> usize {
    if cursor == 0 {
        return 0;
    }
    let mut last = 0;
    for (idx, _) in text[..cursor].grapheme_indices(true) {
        last = idx;
    }
    last
}

fn next_grapheme_boundary(text: &str, cursor: usize) -> usize {
    if cursor >= text.len() {
        return text.len();
    }
    let mut iter = text[cursor..].graphemes(true);
    if let Some(grapheme) = iter.next() {
        cursor + grapheme.len()
    } else {
        text.len()
    }
}

#[cfg(test)]
mod tests {
    use super::TextField;

    #[test]
    fn backspace_removes_whole_grapheme() {
        let mut field = TextField::with_text("Café\u{301}", 32);
        assert!(field.backspace());
        assert_eq!(field.text(), "Caf");
        assert_eq!(field.cursor_column(), 3);
    }

    #[test]
    fn insert_respects_character_cap() {
        let mut field = TextField::new(3);
        for ch in "abcd".chars() {
            field.insert_char(ch);
        }
        assert_eq!(field.text(), "abc");
        assert!(!field.insert_char('\n'));
    }

    #[test]
    fn over_cap_text_is_kept_but_not_grown() {
        let mut field = TextField::with_text("0123456789ABC", 10);
        assert_eq!(field.text(), "0123456789ABC");
        assert!(!field.insert_char('D'));
        assert!(field.backspace());
        assert_eq!(field.text(), "0123456789AB");
    }

    #[test]
    fn editing_in_the_middle() {
        let mut field = TextField::with_text("shp", 16);
        field.move_left();
        field.move_left();
        assert!(field.insert_char('h'));
        assert_eq!(field.text(), "shhp");
        assert!(field.delete());
        assert_eq!(field.text(), "shp");
        field.move_home();
        assert!(!field.move_left());
        field.move_end();
        assert_eq!(field.cursor(), 3);
    }
}
