//! Console configuration.
//!
//! Every tunable lives in a single `ConsoleConfig` that can be read from a
//! TOML file. All structs are `#[serde(default)]`, so a partial file only
//! overrides what it names.

use std::path::{Path, PathBuf};

use peniko::color::{Srgb, parse_color};

use crate::error::ConsoleError;

// ---------------------------------------------------------------------------
// ConsoleConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Whether the panel starts shown.
    pub visible_by_default: bool,
    /// Animation progress per second; a transition takes `1 / appear_speed` s.
    pub appear_speed: f32,
    /// Character that toggles the panel. Never inserted into the input.
    pub toggle_key: String,
    /// Whether application log events are mirrored into the transcript.
    pub listen_to_log: bool,
    /// Script run against every freshly created scope.
    pub bootstrap_script: String,
    pub scroll: ScrollConfig,
    pub theme: Theme,
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct ScrollConfig {
    pub line_height: f32,
    pub viewport_height: f32,
    /// Views closer than this to the bottom stay pinned to it when output grows.
    pub snap_distance: f32,
}

/// Transcript colours as CSS colour strings.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct Theme {
    pub error: String,
    pub warning: String,
    pub info: String,
    pub error_echo: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            visible_by_default: false,
            appear_speed: 6.0,
            toggle_key: "`".into(),
            listen_to_log: true,
            bootstrap_script: String::new(),
            scroll: ScrollConfig::default(),
            theme: Theme::default(),
        }
    }
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            line_height: 20.0,
            viewport_height: 400.0,
            snap_distance: 20.0,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            error: "#ff0000".into(),
            warning: "#ffeb04".into(),
            info: "#000000".into(),
            error_echo: "#dd2222".into(),
        }
    }
}

impl ConsoleConfig {
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConsoleError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would leave the console stuck, such as a panel
    /// animation that never finishes.
    pub fn validate(&self) -> Result<(), ConsoleError> {
        if !(self.appear_speed.is_finite() && self.appear_speed > 0.0) {
            return Err(ConsoleError::Speed {
                value: self.appear_speed,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Palette
// ---------------------------------------------------------------------------

/// Theme colours resolved to the `#RRGGBBAA` form used in transcript markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    pub error: String,
    pub warning: String,
    pub info: String,
    pub error_echo: String,
}

impl Theme {
    pub fn palette(&self) -> Result<Palette, ConsoleError> {
        Ok(Palette {
            error: markup_hex(&self.error)?,
            warning: markup_hex(&self.warning)?,
            info: markup_hex(&self.info)?,
            error_echo: markup_hex(&self.error_echo)?,
        })
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            error: "#FF0000FF".into(),
            warning: "#FFEB04FF".into(),
            info: "#000000FF".into(),
            error_echo: "#DD2222FF".into(),
        }
    }
}

fn markup_hex(value: &str) -> Result<String, ConsoleError> {
    let color = parse_color(value).map_err(|err| ConsoleError::Color {
        value: value.to_string(),
        reason: format!("{err:?}"),
    })?;
    let rgba = color.to_alpha_color::<Srgb>().to_rgba8();
    Ok(format!(
        "#{:02X}{:02X}{:02X}{:02X}",
        rgba.r, rgba.g, rgba.b, rgba.a
    ))
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// `$XDG_CONFIG_HOME/script-console/console.toml`, falling back to
/// `~/.config/script-console/console.toml`.
pub fn default_config_path() -> PathBuf {
    let mut p = if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg)
    } else {
        let mut home = std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"));
        home.push(".config");
        home
    };
    p.push("script-console");
    p.push("console.toml");
    p
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ConsoleConfig::default();
        assert!(!c.visible_by_default);
        assert!((c.appear_speed - 6.0).abs() < f32::EPSILON);
        assert_eq!(c.toggle_key, "`");
        assert!(c.listen_to_log);
    }

    #[test]
    fn partial_toml() {
        let partial = r#"
appear_speed = 3.0

[scroll]
viewport_height = 120.0
"#;
        let c = ConsoleConfig::from_toml(partial).expect("partial parse failed");
        assert!((c.appear_speed - 3.0).abs() < f32::EPSILON);
        assert!((c.scroll.viewport_height - 120.0).abs() < f32::EPSILON);
        // Untouched values keep their defaults
        assert!((c.scroll.line_height - 20.0).abs() < f32::EPSILON);
        assert_eq!(c.theme.error, "#ff0000");
    }

    #[test]
    fn invalid_toml() {
        assert!(ConsoleConfig::from_toml("appear_speed = [[").is_err());
    }

    #[test]
    fn load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let c = ConsoleConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(c.toggle_key, "`");
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("console.toml");
        std::fs::write(&path, "visible_by_default = true\ntoggle_key = \"~\"\n").unwrap();

        let c = ConsoleConfig::load(&path).unwrap();
        assert!(c.visible_by_default);
        assert_eq!(c.toggle_key, "~");
    }

    #[test]
    fn stalling_appear_speed_is_rejected() {
        for speed in [0.0, -2.0, f32::NAN, f32::INFINITY] {
            let c = ConsoleConfig {
                appear_speed: speed,
                ..ConsoleConfig::default()
            };
            assert!(matches!(c.validate(), Err(ConsoleError::Speed { .. })), "speed {speed}");
        }
        assert!(ConsoleConfig::default().validate().is_ok());
    }

    #[test]
    fn load_rejects_zero_speed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("console.toml");
        std::fs::write(&path, "appear_speed = 0.0\n").unwrap();

        match ConsoleConfig::load(&path) {
            Err(ConsoleError::Speed { value }) => assert_eq!(value, 0.0),
            other => panic!("expected speed error, got {other:?}"),
        }
    }

    #[test]
    fn default_theme_resolves_to_default_palette() {
        let palette = Theme::default().palette().unwrap();
        assert_eq!(palette, Palette::default());
    }

    #[test]
    fn bad_theme_colour_is_reported() {
        let theme = Theme {
            warning: "not-a-colour".into(),
            ..Theme::default()
        };
        match theme.palette() {
            Err(ConsoleError::Color { value, .. }) => assert_eq!(value, "not-a-colour"),
            other => panic!("expected colour error, got {other:?}"),
        }
    }
}
