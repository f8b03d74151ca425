use std::path::Path;

use anyhow::Result;

use crate::poi::PoiDocument;

use super::state::AppState;

/// File-level actions on the document behind the editor.
pub struct ActionDispatcher<'a> {
    path: &'a Path,
}

impl<'a> ActionDispatcher<'a> {
    pub fn new(path: &'a Path) -> Self {
        Self { path }
    }

    pub fn save(&self, state: &mut AppState) -> Result<()> {
        let mut doc = state.snapshot_document();
        doc.save(self.path)?;
        state.document.modified_at = doc.modified_at;
        state.mark_saved();
        Ok(())
    }

    pub fn reload(&self, state: &mut AppState) -> Result<()> {
        let doc = PoiDocument::load(self.path)?;
        state.replace_document(doc);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::poi::Tag;
    use tempfile::TempDir;

    #[test]
    fn save_then_reload_round_trips_through_disk() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("poi.json");
        let mut state = AppState::new(PoiDocument::new(1.0, 2.0), &AppConfig::default());
        state
            .with_advanced(|screen, data| screen.add_tag(data, "amenity", "bench"))
            .map_err(anyhow::Error::from)?;

        let dispatcher = ActionDispatcher::new(&path);
        dispatcher.save(&mut state)?;
        assert!(!state.is_dirty());
        assert!(state.document.modified_at.is_some());

        let mut on_disk = PoiDocument::load(&path)?;
        on_disk.tags.push(Tag::new("backrest", "yes"));
        on_disk.save(&path)?;

        dispatcher.reload(&mut state)?;
        assert!(state.sync_visible());
        assert_eq!(state.advanced().rows().len(), 2);
        Ok(())
    }
}
