use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

mod bindings;
mod defaults;

pub use bindings::{
    Action, ButtonBinding, KeyBinding, Modifier, SignalBinding, SWITCHTAG_DOWN, SWITCHTAG_LEFT,
    SWITCHTAG_RIGHT, SWITCHTAG_TAG, SWITCHTAG_TOGGLETAG, SWITCHTAG_TOGGLEVIEW, SWITCHTAG_UP,
    SWITCHTAG_VIEW,
};

/// Float geometry sentinel meaning "leave this coordinate alone".
pub const FLOAT_KEEP: i32 = -11;
/// Float geometry sentinel meaning "center on the monitor".
pub const FLOAT_CENTER: i32 = -10;

/// Error types for configuration operations
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {reason}")]
    InvalidFormat { reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Where a freshly managed window is inserted in its monitor's tiling order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AttachDirection {
    #[default]
    Front,
    Above,
    Aside,
    Below,
    Bottom,
    Top,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutKind {
    Tile,
    Floating,
    Monocle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutDef {
    pub symbol: String,
    pub kind: LayoutKind,
}

/// Border colors as `#rrggbb` strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BorderColors {
    pub focused: String,
    pub normal: String,
    /// Unfocused tiled windows when gaps are wider than borders.
    pub gapped: String,
    pub floating: String,
}

impl Default for BorderColors {
    fn default() -> Self {
        Self {
            focused: "#eeeeee".to_string(),
            normal: "#222222".to_string(),
            gapped: "#444444".to_string(),
            floating: "#bbbbbb".to_string(),
        }
    }
}

/// Parse `#rrggbb` (or `rrggbb`) into a 24-bit pixel value.
pub fn parse_color(spec: &str) -> Option<u32> {
    let hex = spec.strip_prefix('#').unwrap_or(spec);
    if hex.len() != 6 {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}

/// Window rule matched against class, instance and title substrings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rule {
    pub class: Option<String>,
    pub instance: Option<String>,
    pub title: Option<String>,
    pub tags: u32,
    pub switch_to_tag: bool,
    pub floating: bool,
    pub terminal: bool,
    pub no_swallow: bool,
    /// Monitor index, negative for "current".
    pub monitor: i32,
    pub scratch_key: Option<char>,
    /// x, y, width, height with the `FLOAT_*` sentinels.
    pub float_geometry: [i32; 4],
    /// Border width for floating windows, negative for the global default.
    pub float_border: i32,
}

impl Default for Rule {
    fn default() -> Self {
        Self {
            class: None,
            instance: None,
            title: None,
            tags: 0,
            switch_to_tag: false,
            floating: false,
            terminal: false,
            no_swallow: false,
            monitor: -1,
            scratch_key: None,
            float_geometry: [FLOAT_KEEP; 4],
            float_border: -1,
        }
    }
}

/// Complete window manager configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub tags: Vec<String>,
    pub tag_rows: u32,
    pub border_px: i32,
    pub gap_px: i32,
    pub snap: i32,
    pub bar_height: i32,
    pub show_bar: bool,
    pub top_bar: bool,
    pub show_systray: bool,
    pub systray_spacing: i32,
    pub mfact: f32,
    pub nmaster: i32,
    pub resize_hints: bool,
    /// Size hints apply to tiled windows only when `gap_px` exceeds this many borders.
    pub resize_hints_threshold: i32,
    pub attach: AttachDirection,
    /// Master axis (sign mirrors), master area axis, stack area axis.
    pub layout_axes: [i32; 3],
    pub layouts: Vec<LayoutDef>,
    pub swallow_floating: bool,
    /// Drop borders of tiled windows when gaps exceed the border width.
    pub no_tile_border: bool,
    pub colors: BorderColors,
    pub rules: Vec<Rule>,
    pub keys: Vec<KeyBinding>,
    pub buttons: Vec<ButtonBinding>,
    pub signals: Vec<SignalBinding>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tags: (1..=6).map(|i| i.to_string()).collect(),
            tag_rows: 2,
            border_px: 2,
            gap_px: 10,
            snap: 10,
            bar_height: 20,
            show_bar: true,
            top_bar: true,
            show_systray: true,
            systray_spacing: 2,
            mfact: 0.55,
            nmaster: 1,
            resize_hints: true,
            resize_hints_threshold: 3,
            attach: AttachDirection::Front,
            layout_axes: [1, 2, 2],
            layouts: defaults::layouts(),
            swallow_floating: true,
            no_tile_border: true,
            colors: BorderColors::default(),
            rules: defaults::rules(),
            keys: defaults::keys(),
            buttons: defaults::buttons(),
            signals: defaults::signals(),
        }
    }
}

impl Settings {
    /// Load settings from `path`, falling back to defaults when the file is missing.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!("No configuration at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        settings.validate()?;
        debug!("Loaded configuration from {}", path.display());
        Ok(settings)
    }

    /// `$XDG_CONFIG_HOME/tagwm/config.toml`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tagwm")
            .join("config.toml")
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| Err(ConfigError::InvalidFormat { reason });

        if self.tags.is_empty() || self.tags.len() > 31 {
            return invalid(format!("expected 1..=31 tags, got {}", self.tags.len()));
        }
        if self.tag_rows == 0 {
            return invalid("tag_rows must be at least 1".to_string());
        }
        if !(0.05..=0.95).contains(&self.mfact) {
            return invalid(format!("mfact {} outside 0.05..=0.95", self.mfact));
        }
        if self.nmaster < 0 {
            return invalid(format!("nmaster {} is negative", self.nmaster));
        }
        if self.layouts.is_empty() {
            return invalid("at least one layout is required".to_string());
        }
        let [master, first, second] = self.layout_axes;
        if !matches!(master.abs(), 1 | 2) || !(1..=3).contains(&first) || !(1..=3).contains(&second) {
            return invalid(format!("bad layout_axes {:?}", self.layout_axes));
        }
        if self.border_px < 0 || self.gap_px < 0 || self.bar_height < 1 {
            return invalid("border_px, gap_px and bar_height must be non-negative".to_string());
        }
        for color in [
            &self.colors.focused,
            &self.colors.normal,
            &self.colors.gapped,
            &self.colors.floating,
        ] {
            if parse_color(color).is_none() {
                return invalid(format!("bad color {}", color));
            }
        }
        Ok(())
    }

    /// Bit mask covering every configured tag.
    pub fn tag_mask(&self) -> u32 {
        (1u32 << self.tags.len()) - 1
    }
}
