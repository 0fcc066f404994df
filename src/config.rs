use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::graphics::Size;

/// User preference for fitting the game image into the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderPlacement {
    #[default]
    Center,
    Stretch,
    StretchProportional,
    /// Size the window to the scaled game instead of fitting into it.
    ResizeWindow,
}

impl RenderPlacement {
    /// Parse a placement keyword from configuration.
    pub fn parse(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "center" => Ok(Self::Center),
            "stretch" => Ok(Self::Stretch),
            "proportional" => Ok(Self::StretchProportional),
            "resize" => Ok(Self::ResizeWindow),
            other => anyhow::bail!("Unknown placement '{}'", other),
        }
    }
}

/// Display options set via CLI or config file.
#[derive(Debug, Clone)]
pub struct Options {
    /// Requested graphics driver id (e.g. "SDL2", "Soft").
    pub driver_id: String,
    /// Scaling filter id, "max" for automatic, `None` for default handling.
    pub filter_id: Option<String>,
    /// Filter override that beats any other filter setting when present.
    pub forced_filter_id: Option<String>,
    /// Requested screen size; a dimension <= 0 means "derive from the game".
    pub screen_size: Size,
    pub windowed: bool,
    pub placement: RenderPlacement,
    /// Prefer fullscreen modes matching the desktop aspect ratio.
    pub match_desktop_ratio: bool,
    /// Desired vertical refresh rate; only honored at 50 Hz and up.
    pub refresh_rate: Option<i32>,
    pub force_16bit: bool,
    pub force_hicolor_mode: bool,
    /// Debug forces for odd-depth testing.
    pub debug_15bit_mode: bool,
    pub debug_24bit_mode: bool,
    /// Base coordinate unit for custom-resolution games.
    pub base_size: Size,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            driver_id: "SDL2".to_string(),
            filter_id: None,
            forced_filter_id: None,
            screen_size: Size::default(),
            windowed: false,
            placement: RenderPlacement::default(),
            match_desktop_ratio: false,
            refresh_rate: None,
            force_16bit: false,
            force_hicolor_mode: false,
            debug_15bit_mode: false,
            debug_24bit_mode: false,
            base_size: Size::new(320, 200),
        }
    }
}

/// Parse a resolution string in the format "WIDTHxHEIGHT".
pub fn parse_resolution(s: &str) -> Result<Size> {
    let parts: Vec<&str> = s.split('x').collect();
    if parts.len() != 2 {
        anyhow::bail!("Resolution must be in WIDTHxHEIGHT format");
    }

    let width: i32 = parts[0].trim().parse().context("Invalid width value")?;
    let height: i32 = parts[1].trim().parse().context("Invalid height value")?;

    if width <= 0 || height <= 0 {
        anyhow::bail!("Resolution values must be positive");
    }

    Ok(Size::new(width, height))
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn apply_option(options: &mut Options, key: &str, value: &str) {
    match key.to_ascii_lowercase().as_str() {
        "driver" => options.driver_id = value.to_string(),
        "filter" => options.filter_id = Some(value.to_string()),
        "force_filter" => options.forced_filter_id = Some(value.to_string()),
        "screen_width" => match value.parse() {
            Ok(v) => options.screen_size.width = v,
            Err(_) => log::warn!("Ignoring bad screen_width '{}'", value),
        },
        "screen_height" => match value.parse() {
            Ok(v) => options.screen_size.height = v,
            Err(_) => log::warn!("Ignoring bad screen_height '{}'", value),
        },
        "windowed" => options.windowed = parse_bool(value),
        "placement" => match RenderPlacement::parse(value) {
            Ok(p) => options.placement = p,
            Err(err) => log::warn!("{}", err),
        },
        "match_desktop_ratio" => options.match_desktop_ratio = parse_bool(value),
        "refresh" => match value.parse() {
            Ok(v) => options.refresh_rate = Some(v),
            Err(_) => log::warn!("Ignoring bad refresh '{}'", value),
        },
        "force_16bit" => options.force_16bit = parse_bool(value),
        "force_hicolor" => options.force_hicolor_mode = parse_bool(value),
        "debug_15bit" => options.debug_15bit_mode = parse_bool(value),
        "debug_24bit" => options.debug_24bit_mode = parse_bool(value),
        "base_width" => match value.parse() {
            Ok(v) => options.base_size.width = v,
            Err(_) => log::warn!("Ignoring bad base_width '{}'", value),
        },
        "base_height" => match value.parse() {
            Ok(v) => options.base_size.height = v,
            Err(_) => log::warn!("Ignoring bad base_height '{}'", value),
        },
        other => log::warn!("Unknown configuration key '{}'", other),
    }
}

/// Apply key=value configuration text onto `options`.
///
/// Lines starting with `#` and inline `#` comments are skipped; keys and
/// values are trimmed. Malformed lines are warned about and ignored.
pub fn parse_config_str(data: &str, options: &mut Options) {
    for line in data.lines() {
        let line = match line.find('#') {
            Some(pos) => &line[..pos],
            None => line,
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            log::warn!("Key without value: '{}'", line);
            continue;
        };
        apply_option(options, key.trim(), value.trim());
    }
}

/// Load options from an optional config file, starting from defaults.
pub fn load_config(path: Option<&Path>) -> Result<Options> {
    let mut options = Options::default();
    if let Some(path) = path {
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        parse_config_str(&data, &mut options);
    }
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resolution_valid() {
        assert_eq!(parse_resolution("640x480").unwrap(), Size::new(640, 480));
        assert_eq!(parse_resolution("1920x1080").unwrap(), Size::new(1920, 1080));
    }

    #[test]
    fn test_parse_resolution_invalid() {
        assert!(parse_resolution("640").is_err());
        assert!(parse_resolution("0x480").is_err());
        assert!(parse_resolution("ax480").is_err());
    }

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert_eq!(options.driver_id, "SDL2");
        assert_eq!(options.base_size, Size::new(320, 200));
        assert!(!options.windowed);
        assert_eq!(options.placement, RenderPlacement::Center);
    }

    #[test]
    fn test_parse_config_str() {
        let mut options = Options::default();
        parse_config_str(
            "# display setup\n\
             driver = Soft\n\
             screen_width = 1280  # inline comment\n\
             screen_height=720\n\
             windowed = yes\n\
             placement = proportional\n\
             refresh = 60\n",
            &mut options,
        );
        assert_eq!(options.driver_id, "Soft");
        assert_eq!(options.screen_size, Size::new(1280, 720));
        assert!(options.windowed);
        assert_eq!(options.placement, RenderPlacement::StretchProportional);
        assert_eq!(options.refresh_rate, Some(60));
    }

    #[test]
    fn test_parse_config_skips_malformed_lines() {
        let mut options = Options::default();
        parse_config_str("bare keyword\nwindowed = 1\nrefresh = sixty\n", &mut options);
        assert!(options.windowed);
        assert_eq!(options.refresh_rate, None);
    }

    #[test]
    fn test_placement_parse() {
        assert_eq!(RenderPlacement::parse("center").unwrap(), RenderPlacement::Center);
        assert_eq!(RenderPlacement::parse("RESIZE").unwrap(), RenderPlacement::ResizeWindow);
        assert!(RenderPlacement::parse("diagonal").is_err());
    }
}
