use strum::{Display, EnumIter};

use crate::config::AppConfig;
use crate::poi::{name_of, EditPoiData, PoiDocument, TagList};

use super::advanced::AdvancedTagEditor;
use super::basic::BasicInfoEditor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum EditorTab {
    Basic,
    Advanced,
}

impl EditorTab {
    pub fn other(self) -> Self {
        match self {
            EditorTab::Basic => EditorTab::Advanced,
            EditorTab::Advanced => EditorTab::Basic,
        }
    }

    pub fn index(self) -> usize {
        match self {
            EditorTab::Basic => 0,
            EditorTab::Advanced => 1,
        }
    }
}

/// Host screen: owns the shared form data and the two tag screens.
#[derive(Debug)]
pub struct AppState {
    pub document: PoiDocument,
    data: EditPoiData,
    tab: EditorTab,
    basic: BasicInfoEditor,
    advanced: AdvancedTagEditor,
    saved_revision: u64,
    status_message: Option<String>,
    quit_armed: bool,
}

impl AppState {
    pub fn new(mut document: PoiDocument, config: &AppConfig) -> Self {
        let tags = TagList::from_tags(std::mem::take(&mut document.tags));
        let mut state = Self {
            document,
            data: EditPoiData::new(tags),
            tab: EditorTab::Advanced,
            basic: BasicInfoEditor::new(&config.basic_fields, &config.editor),
            advanced: AdvancedTagEditor::new(&config.editor),
            saved_revision: 0,
            status_message: None,
            quit_armed: false,
        };
        state.advanced.on_show(&mut state.data);
        state
    }

    pub fn data(&self) -> &EditPoiData {
        &self.data
    }

    pub fn tab(&self) -> EditorTab {
        self.tab
    }

    pub fn basic(&self) -> &BasicInfoEditor {
        &self.basic
    }

    pub fn advanced(&self) -> &AdvancedTagEditor {
        &self.advanced
    }

    /// Hands the form data to whichever screen is active.
    pub fn with_basic<T>(&mut self, f: impl FnOnce(&mut BasicInfoEditor, &mut EditPoiData) -> T) -> T {
        self.quit_armed = false;
        f(&mut self.basic, &mut self.data)
    }

    pub fn with_advanced<T>(
        &mut self,
        f: impl FnOnce(&mut AdvancedTagEditor, &mut EditPoiData) -> T,
    ) -> T {
        self.quit_armed = false;
        f(&mut self.advanced, &mut self.data)
    }

    pub fn switch_tab(&mut self, tab: EditorTab) {
        if tab == self.tab {
            return;
        }
        match self.tab {
            EditorTab::Basic => self.basic.on_hide(&mut self.data),
            EditorTab::Advanced => self.advanced.on_hide(&mut self.data),
        }
        match tab {
            EditorTab::Basic => self.basic.on_show(&mut self.data),
            EditorTab::Advanced => self.advanced.on_show(&mut self.data),
        }
        tracing::debug!(%tab, "switched editor tab");
        self.tab = tab;
        self.status_message = None;
    }

    pub fn toggle_tab(&mut self) {
        self.switch_tab(self.tab.other());
    }

    /// Lets the visible screen catch up with changes made elsewhere.
    pub fn sync_visible(&mut self) -> bool {
        match self.tab {
            EditorTab::Basic => self.basic.sync(&self.data),
            EditorTab::Advanced => self.advanced.sync(&mut self.data),
        }
    }

    /// Header title, following live edits of the `name` tag.
    pub fn title(&self) -> String {
        let name = name_of(self.data.tags().iter().map(|(_, tag)| tag));
        self.document.title_with_name(name)
    }

    pub fn is_dirty(&self) -> bool {
        self.data.revision() != self.saved_revision
    }

    pub fn mark_saved(&mut self) {
        self.saved_revision = self.data.revision();
    }

    /// Document with the current tags, ready to be written.
    pub fn snapshot_document(&self) -> PoiDocument {
        let mut doc = self.document.clone();
        doc.tags = self.data.tags().to_tags();
        doc
    }

    /// Takes a freshly loaded document as an outside change to the tags.
    pub fn replace_document(&mut self, mut document: PoiDocument) {
        let tags = std::mem::take(&mut document.tags);
        self.document = document;
        self.data.replace_tags(tags);
        self.mark_saved();
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn set_status_message<S: Into<String>>(&mut self, message: Option<S>) {
        self.status_message = message.map(Into::into);
    }

    /// Returns true when quitting may proceed. With unsaved changes the
    /// first request only arms the confirmation.
    pub fn request_quit(&mut self) -> bool {
        if !self.is_dirty() || self.quit_armed {
            return true;
        }
        self.quit_armed = true;
        self.set_status_message(Some("Unsaved changes: press again to quit, Ctrl-s to save"));
        false
    }
}
