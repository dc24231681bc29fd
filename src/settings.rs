use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, RwLock};

use crate::pdf::{
    BoundsPolicy, DEFAULT_PAGE_GAP, DEFAULT_RENDER_DPI, DEFAULT_SCREEN_DPI, MIN_REDACTION_SIZE,
    MatchPolicy, PAGE_PRELOAD_RADIUS, SCROLL_PRELOAD_RADIUS, ViewerConfig, Zoom,
};

pub const CURRENT_VERSION: u32 = 1;
const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "pdftool";

/// How pages are presented, which decides how many neighbours stay rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// Continuous scroll through stacked pages
    #[default]
    Scroll,
    /// One page at a time, flipping with next/previous
    Page,
}

impl RenderMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderMode::Scroll => "scroll",
            RenderMode::Page => "page",
        }
    }

    pub fn preload_radius(&self) -> usize {
        match self {
            RenderMode::Scroll => SCROLL_PRELOAD_RADIUS,
            RenderMode::Page => PAGE_PRELOAD_RADIUS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default = "default_scale")]
    pub default_scale: f32,

    #[serde(default = "default_min_zoom")]
    pub min_zoom: f32,

    #[serde(default = "default_max_zoom")]
    pub max_zoom: f32,

    #[serde(default = "default_zoom_intensity")]
    pub zoom_intensity: f32,

    #[serde(default)]
    pub render_mode: RenderMode,

    #[serde(default = "default_render_dpi")]
    pub render_dpi: f32,

    #[serde(default = "default_screen_dpi")]
    pub screen_dpi: f32,

    #[serde(default = "default_page_gap")]
    pub page_gap: f32,

    #[serde(default = "default_min_redaction_size")]
    pub min_redaction_size: f32,

    #[serde(default)]
    pub redaction_bounds: BoundsPolicy,

    #[serde(default)]
    pub search_matches: MatchPolicy,
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_scale() -> f32 {
    1.0
}

fn default_min_zoom() -> f32 {
    Zoom::MIN_SCALE
}

fn default_max_zoom() -> f32 {
    Zoom::MAX_SCALE
}

fn default_zoom_intensity() -> f32 {
    Zoom::INTENSITY
}

fn default_render_dpi() -> f32 {
    DEFAULT_RENDER_DPI
}

fn default_screen_dpi() -> f32 {
    DEFAULT_SCREEN_DPI
}

fn default_page_gap() -> f32 {
    DEFAULT_PAGE_GAP
}

fn default_min_redaction_size() -> f32 {
    MIN_REDACTION_SIZE
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            default_scale: default_scale(),
            min_zoom: default_min_zoom(),
            max_zoom: default_max_zoom(),
            zoom_intensity: default_zoom_intensity(),
            render_mode: RenderMode::default(),
            render_dpi: default_render_dpi(),
            screen_dpi: default_screen_dpi(),
            page_gap: default_page_gap(),
            min_redaction_size: default_min_redaction_size(),
            redaction_bounds: BoundsPolicy::default(),
            search_matches: MatchPolicy::default(),
        }
    }
}

impl Settings {
    /// Build the core configuration, replacing nonsensical values with defaults
    pub fn viewer_config(&self) -> ViewerConfig {
        let positive = |value: f32, fallback: f32| {
            if value.is_finite() && value > 0.0 {
                value
            } else {
                fallback
            }
        };

        let zoom = Zoom::new(self.min_zoom, self.max_zoom, self.zoom_intensity);
        ViewerConfig {
            default_scale: zoom.clamp_factor(self.default_scale),
            zoom,
            preload_radius: self.render_mode.preload_radius(),
            render_dpi: positive(self.render_dpi, DEFAULT_RENDER_DPI),
            screen_dpi: positive(self.screen_dpi, DEFAULT_SCREEN_DPI),
            page_gap: self.page_gap.max(0.0),
            min_redaction_size: self.min_redaction_size.max(0.0),
            redaction_bounds: self.redaction_bounds,
            search_matches: self.search_matches,
        }
    }
}

static SETTINGS: LazyLock<RwLock<Settings>> = LazyLock::new(|| RwLock::new(Settings::default()));

fn preferred_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

pub fn load_settings() {
    let Some(path) = preferred_config_path() else {
        warn!("Could not determine config directory, using default settings");
        return;
    };
    if path.exists() {
        load_settings_from_path(&path);
    } else {
        info!("Settings file not found, creating with defaults at {path:?}");
        if let Ok(settings) = SETTINGS.read() {
            save_settings_to_file(&settings, &path);
        }
    }
}

/// Replace the global settings with the contents of `path`.
/// Unreadable or malformed files leave the current settings in place.
pub fn load_settings_from_path(path: &Path) {
    match read_settings(path) {
        Ok(mut settings) => {
            debug!("Loaded settings from {path:?}");

            if settings.version < CURRENT_VERSION {
                migrate_settings(&mut settings);
                save_settings_to_file(&settings, path);
            }

            if let Ok(mut global) = SETTINGS.write() {
                *global = settings;
            }
        }
        Err(e) => error!("{e}"),
    }
}

fn read_settings(path: &Path) -> Result<Settings, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read settings file {path:?}: {e}"))?;
    serde_yaml::from_str::<Settings>(&content)
        .map_err(|e| format!("Failed to parse settings file {path:?}: {e}"))
}

fn migrate_settings(settings: &mut Settings) {
    info!(
        "Migrating settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );

    // Field changes between versions are applied here

    settings.version = CURRENT_VERSION;
}

fn save_settings_to_file(settings: &Settings, path: &Path) {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create config directory {parent:?}: {e}");
                return;
            }
        }
    }

    let content = generate_settings_yaml(settings);

    match fs::write(path, content) {
        Ok(()) => debug!("Saved settings to {path:?}"),
        Err(e) => error!("Failed to save settings to {path:?}: {e}"),
    }
}

fn generate_settings_yaml(settings: &Settings) -> String {
    let mut content = String::new();

    content.push_str(&format!("version: {}\n", settings.version));
    content.push('\n');
    content.push_str("# Zoom\n");
    content.push_str(&format!("default_scale: {:?}\n", settings.default_scale));
    content.push_str(&format!("min_zoom: {:?}\n", settings.min_zoom));
    content.push_str(&format!("max_zoom: {:?}\n", settings.max_zoom));
    content.push_str(&format!("zoom_intensity: {:?}\n", settings.zoom_intensity));
    content.push('\n');
    content.push_str("# Rendering (render_mode: scroll | page)\n");
    content.push_str(&format!("render_mode: {}\n", settings.render_mode.as_str()));
    content.push_str(&format!("render_dpi: {:?}\n", settings.render_dpi));
    content.push_str(&format!("screen_dpi: {:?}\n", settings.screen_dpi));
    content.push_str(&format!("page_gap: {:?}\n", settings.page_gap));
    content.push('\n');
    content.push_str("# Redaction (redaction_bounds: clamp | reject | ignore)\n");
    content.push_str(&format!(
        "min_redaction_size: {:?}\n",
        settings.min_redaction_size
    ));
    let bounds = match settings.redaction_bounds {
        BoundsPolicy::Clamp => "clamp",
        BoundsPolicy::Reject => "reject",
        BoundsPolicy::Ignore => "ignore",
    };
    content.push_str(&format!("redaction_bounds: {bounds}\n"));
    content.push('\n');
    content.push_str("# Search (search_matches: first_per_page | all)\n");
    let matches = match settings.search_matches {
        MatchPolicy::FirstPerPage => "first_per_page",
        MatchPolicy::All => "all",
    };
    content.push_str(&format!("search_matches: {matches}\n"));

    content
}

// Public API for accessing/modifying settings

pub fn get_settings() -> Settings {
    SETTINGS.read().map(|s| s.clone()).unwrap_or_default()
}

pub fn viewer_config() -> ViewerConfig {
    get_settings().viewer_config()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_yaml_parses_back() {
        let settings = Settings {
            render_mode: RenderMode::Page,
            redaction_bounds: BoundsPolicy::Reject,
            search_matches: MatchPolicy::All,
            default_scale: 1.5,
            ..Settings::default()
        };
        let yaml = generate_settings_yaml(&settings);
        let parsed: Settings = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let parsed: Settings = serde_yaml::from_str("render_mode: page\n").unwrap();
        assert_eq!(parsed.render_mode, RenderMode::Page);
        assert_eq!(parsed.version, CURRENT_VERSION);
        assert_eq!(parsed.render_dpi, DEFAULT_RENDER_DPI);
        assert_eq!(parsed.redaction_bounds, BoundsPolicy::Clamp);
    }

    #[test]
    fn render_mode_decides_preload_radius() {
        let mut settings = Settings::default();
        assert_eq!(settings.viewer_config().preload_radius, 1);
        settings.render_mode = RenderMode::Page;
        assert_eq!(settings.viewer_config().preload_radius, 3);
    }

    #[test]
    fn viewer_config_sanitizes_values() {
        let settings = Settings {
            default_scale: 40.0,
            render_dpi: -1.0,
            screen_dpi: f32::NAN,
            page_gap: -3.0,
            ..Settings::default()
        };
        let config = settings.viewer_config();
        assert_eq!(config.default_scale, Zoom::MAX_SCALE);
        assert_eq!(config.render_dpi, DEFAULT_RENDER_DPI);
        assert_eq!(config.screen_dpi, DEFAULT_SCREEN_DPI);
        assert_eq!(config.page_gap, 0.0);
    }

    #[test]
    fn old_version_is_bumped_without_touching_values() {
        let mut settings = Settings {
            version: 0,
            min_zoom: 0.25,
            max_zoom: 4.0,
            render_mode: RenderMode::Page,
            ..Settings::default()
        };
        migrate_settings(&mut settings);
        assert_eq!(settings.version, CURRENT_VERSION);
        assert_eq!(settings.min_zoom, 0.25);
        assert_eq!(settings.max_zoom, 4.0);
        assert_eq!(settings.render_mode, RenderMode::Page);
    }

    #[test]
    fn malformed_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "render_mode: [not, a, mode]\n").unwrap();
        assert!(read_settings(&path).is_err());
    }

    #[test]
    fn written_file_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");
        let settings = Settings {
            page_gap: 4.0,
            ..Settings::default()
        };
        save_settings_to_file(&settings, &path);
        assert_eq!(read_settings(&path).unwrap(), settings);
    }
}
