use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};

use crate::config::themes::ThemeRegistry;
use crate::poi::{TagLimits, OSM_MAX_TAG_LEN};

pub mod themes;

pub use themes::Palette;

const APP_DOMAIN: &str = "org";
const APP_ORG: &str = "PoiTags";
const APP_NAME: &str = "poitags";

pub struct ConfigLoader {
    paths: ConfigPaths,
}

impl ConfigLoader {
    pub fn discover() -> Result<Self> {
        let paths = ConfigPaths::discover()?;
        Ok(Self { paths })
    }

    pub fn from_paths(paths: ConfigPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    pub fn load_or_init(&self) -> Result<AppConfig> {
        self.paths.ensure_directories()?;
        if !self.paths.config_file.exists() {
            let mut default_cfg = AppConfig::default();
            default_cfg.post_load();
            self.write_default_config(&default_cfg)?;
            return Ok(default_cfg);
        }

        self.load()
    }

    pub fn load(&self) -> Result<AppConfig> {
        let raw = fs::read_to_string(&self.paths.config_file)
            .with_context(|| format!("reading config {}", self.paths.config_file.display()))?;
        let mut cfg: AppConfig = toml::from_str(&raw).context("parsing config toml")?;
        cfg.post_load();
        Ok(cfg)
    }

    fn write_default_config(&self, cfg: &AppConfig) -> Result<()> {
        let toml = toml::to_string_pretty(cfg).context("serializing default config")?;
        if let Some(parent) = self.paths.config_file.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut file = fs::File::create(&self.paths.config_file)
            .with_context(|| format!("creating config {}", self.paths.config_file.display()))?;
        file.write_all(toml.as_bytes())
            .context("writing default config")?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    pub state_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl ConfigPaths {
    pub fn discover() -> Result<Self> {
        let override_config = env::var("POITAGS_CONFIG").ok().map(PathBuf::from);

        let project_dirs = ProjectDirs::from(APP_DOMAIN, APP_ORG, APP_NAME)
            .context("resolving XDG project directories")?;

        let config_dir = override_config
            .clone()
            .map(|p| {
                if p.is_dir() {
                    p
                } else {
                    p.parent().map(Path::to_path_buf).unwrap_or(p)
                }
            })
            .unwrap_or_else(|| project_dirs.config_dir().to_path_buf());

        let config_file = override_config
            .filter(|p| p.is_file() || p.extension().is_some())
            .unwrap_or_else(|| config_dir.join("config.toml"));

        let state_dir = project_dirs
            .state_dir()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| project_dirs.data_dir().join("state"));
        let log_dir = state_dir.join("logs");

        Ok(Self {
            config_dir,
            config_file,
            state_dir,
            log_dir,
        })
    }

    /// Lays every directory out under `root`; used by tests and portable setups.
    pub fn rooted_at(root: &Path) -> Self {
        let config_dir = root.join("config");
        let state_dir = root.join("state");
        Self {
            config_file: config_dir.join("config.toml"),
            config_dir,
            log_dir: state_dir.join("logs"),
            state_dir,
        }
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_dir.join(format!("{APP_NAME}.log"))
    }

    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.config_dir, &self.state_dir, &self.log_dir] {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating application directory {}", dir.display()))?;
        }
        Ok(())
    }
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub theme: ThemeName,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "tick_rate_ms")]
    pub tick_rate: Duration,
    /// Keys shown as dedicated fields on the basic tab, in order.
    pub basic_fields: Vec<String>,
    pub editor: EditorOptions,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            theme: ThemeName::Dark,
            tick_rate: Duration::from_millis(200),
            basic_fields: default_basic_fields(),
            editor: EditorOptions::default(),
        }
    }
}

impl AppConfig {
    fn post_load(&mut self) {
        if !ThemeRegistry::default().contains(&self.theme) {
            tracing::warn!(?self.theme, "unknown theme in config, falling back to Dark");
            self.theme = ThemeName::Dark;
        }
        if self.tick_rate.is_zero() {
            tracing::warn!("tick_rate_ms of 0 would spin the event loop, using 200");
            self.tick_rate = Duration::from_millis(200);
        }
        self.basic_fields.retain(|key| !key.trim().is_empty());
        if self.basic_fields.is_empty() {
            self.basic_fields = default_basic_fields();
        }
        self.editor.clamp();
    }

    pub fn palette(&self) -> Palette {
        ThemeRegistry::default().palette(&self.theme)
    }
}

fn default_basic_fields() -> Vec<String> {
    ["name", "opening_hours", "phone", "website", "description"]
        .into_iter()
        .map(String::from)
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorOptions {
    pub max_key_len: usize,
    pub max_value_len: usize,
    /// Strip surrounding whitespace from a new tag before it is added.
    pub trim_input: bool,
    pub suggestion_limit: usize,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            max_key_len: OSM_MAX_TAG_LEN,
            max_value_len: OSM_MAX_TAG_LEN,
            trim_input: true,
            suggestion_limit: 5,
        }
    }
}

impl EditorOptions {
    fn clamp(&mut self) {
        self.max_key_len = self.max_key_len.clamp(1, OSM_MAX_TAG_LEN);
        self.max_value_len = self.max_value_len.clamp(1, OSM_MAX_TAG_LEN);
        self.suggestion_limit = self.suggestion_limit.min(9);
    }

    pub fn limits(&self) -> TagLimits {
        TagLimits {
            max_key_len: self.max_key_len,
            max_value_len: self.max_value_len,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, std::hash::Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ThemeName {
    Dark,
    Light,
    HighContrast,
}

impl Default for ThemeName {
    fn default() -> Self {
        ThemeName::Dark
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn first_run_writes_default_config() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let loader = ConfigLoader::from_paths(ConfigPaths::rooted_at(temp.path()));
        let cfg = loader.load_or_init()?;
        assert!(loader.paths().config_file.exists());
        assert!(loader.paths().log_dir.is_dir());
        assert_eq!(cfg.tick_rate, Duration::from_millis(200));

        let reloaded = loader.load()?;
        assert_eq!(reloaded.basic_fields, cfg.basic_fields);
        assert_eq!(reloaded.editor.max_key_len, OSM_MAX_TAG_LEN);
        Ok(())
    }

    #[test]
    fn partial_config_is_clamped_and_filled() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let paths = ConfigPaths::rooted_at(temp.path());
        paths.ensure_directories()?;
        fs::write(
            &paths.config_file,
            r#"
theme = "light"
tick_rate_ms = 50
basic_fields = ["", "  "]

[editor]
max_value_len = 9000
suggestion_limit = 20
"#,
        )?;
        let cfg = ConfigLoader::from_paths(paths).load()?;
        assert_eq!(cfg.theme, ThemeName::Light);
        assert_eq!(cfg.tick_rate, Duration::from_millis(50));
        assert_eq!(cfg.basic_fields, default_basic_fields());
        assert_eq!(cfg.editor.max_value_len, OSM_MAX_TAG_LEN);
        assert_eq!(cfg.editor.suggestion_limit, 9);
        assert!(cfg.editor.trim_input);
        Ok(())
    }
}
