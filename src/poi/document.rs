use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use strum::Display;
use time::OffsetDateTime;
use uuid::Uuid;

use super::tag::Tag;

const TMP_EXTENSION: &str = "json.tmp";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum EditAction {
    Create,
    #[default]
    Modify,
    Delete,
}

/// One POI edit as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoiDocument {
    #[serde(default = "Uuid::new_v4")]
    pub edit_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub osm_id: Option<i64>,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub action: EditAction,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Unix seconds of the last save.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<i64>,
}

impl PoiDocument {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            edit_id: Uuid::new_v4(),
            osm_id: None,
            lat,
            lon,
            action: EditAction::Create,
            tags: Vec::new(),
            comment: None,
            modified_at: None,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read(path).with_context(|| format!("reading POI {}", path.display()))?;
        let doc: PoiDocument = serde_json::from_slice(&raw)
            .with_context(|| format!("parsing POI {}", path.display()))?;
        tracing::info!(path = %path.display(), tags = doc.tags.len(), "loaded POI document");
        Ok(doc)
    }

    pub fn read_from<R: Read>(reader: R) -> Result<Self> {
        serde_json::from_reader(reader).context("parsing POI document")
    }

    /// Writes next to the target first, then renames over it.
    pub fn save(&mut self, path: &Path) -> Result<()> {
        self.modified_at = Some(OffsetDateTime::now_utc().unix_timestamp());
        let json = serde_json::to_vec_pretty(self).context("serialising POI document")?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
        let tmp_path = path.with_extension(TMP_EXTENSION);
        {
            let mut file = fs::File::create(&tmp_path)
                .with_context(|| format!("creating {}", tmp_path.display()))?;
            file.write_all(&json)
                .with_context(|| format!("writing {}", tmp_path.display()))?;
            file.sync_all()
                .with_context(|| format!("syncing {}", tmp_path.display()))?;
        }
        fs::rename(&tmp_path, path)
            .with_context(|| format!("replacing {}", path.display()))?;
        tracing::info!(path = %path.display(), tags = self.tags.len(), "saved POI document");
        Ok(())
    }

    pub fn modified_at(&self) -> Option<OffsetDateTime> {
        self.modified_at
            .and_then(|secs| OffsetDateTime::from_unix_timestamp(secs).ok())
    }

    pub fn title(&self) -> String {
        self.title_with_name(name_of(&self.tags))
    }

    /// Title for this POI when its current tags are held elsewhere.
    pub fn title_with_name(&self, name: Option<&str>) -> String {
        match (name, self.osm_id) {
            (Some(name), _) => name.to_string(),
            (None, Some(id)) => format!("node {id}"),
            (None, None) => format!("new POI at {:.5}, {:.5}", self.lat, self.lon),
        }
    }
}

/// First non-empty `name` value.
pub fn name_of<'a, I>(tags: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a Tag>,
{
    tags.into_iter()
        .find(|tag| tag.key == "name" && !tag.value.is_empty())
        .map(|tag| tag.value.as_str())
}
