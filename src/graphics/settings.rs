//!
//! Screen settings planning: derives the logical game geometry, the color
//! depth pair, and the target screen size/placement from the game header
//! and the user configuration.

use crate::config::{Options, RenderPlacement};
use crate::game::{ColorDepthCategory, GameDescriptor, GameResolutionTier};
use crate::graphics::driver::{GraphicsDriver, Placement};
use crate::graphics::modes::find_nearest_supported_mode;
use crate::graphics::Size;
use crate::platform::PlatformDriver;

/// Color depths to attempt, in order. The fallback is only tried when it
/// differs from the primary and the primary failed everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorDepthOption {
    pub primary: i32,
    pub fallback: i32,
}

impl ColorDepthOption {
    #[must_use]
    pub const fn new(primary: i32, fallback: i32) -> Self {
        Self { primary, fallback }
    }

    #[must_use]
    pub const fn has_distinct_fallback(&self) -> bool {
        self.fallback != self.primary
    }
}

/// Logical geometry of the loaded game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameGeometry {
    /// Native drawing surface size; fixed for the whole session.
    pub game_size: Size,
    /// Coordinate unit the game data is expressed in.
    pub base_size: Size,
    /// game_size.width / base_size.width, the legacy upscale factor.
    pub resolution_multiplier: i32,
    /// Legacy width multiplier for text rendering.
    pub text_multiplier: i32,
}

/// The complete negotiated plan handed to the mode initializer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenSettings {
    pub game_size: Size,
    pub base_size: Size,
    pub screen_size: Size,
    pub placement: Placement,
    pub color_depths: ColorDepthOption,
    pub resolution_multiplier: i32,
    pub text_multiplier: i32,
}

/// Derive the game's native surface size and coordinate unit from its
/// declared resolution tier.
#[must_use]
pub fn derive_game_geometry(game: &GameDescriptor, options: &Options) -> GameGeometry {
    let mut base_size = Size::new(320, 200);
    let game_size;
    let text_multiplier;

    match game.resolution_tier {
        GameResolutionTier::R1024x768 => {
            base_size = Size::new(512, 384);
            game_size = Size::new(base_size.width * 2, base_size.height * 2);
            text_multiplier = 2;
        }
        GameResolutionTier::R800x600 => {
            base_size = Size::new(400, 300);
            game_size = Size::new(base_size.width * 2, base_size.height * 2);
            text_multiplier = 2;
        }
        GameResolutionTier::R640x480 => {
            game_size = Size::new(640, 480);
            text_multiplier = 2;
        }
        GameResolutionTier::R640x400 => {
            game_size = Size::new(640, 400);
            text_multiplier = 2;
        }
        GameResolutionTier::R320x240 => {
            game_size = Size::new(320, 240);
            text_multiplier = 1;
        }
        GameResolutionTier::R320x200 => {
            game_size = Size::new(320, 200);
            text_multiplier = 1;
        }
        GameResolutionTier::Custom => {
            base_size = options.base_size;
            game_size = base_size;
            text_multiplier = 1;
        }
    }

    let resolution_multiplier = if base_size.width > 0 {
        game_size.width / base_size.width
    } else {
        1
    };

    // Games authored in native coordinates address pixels directly, so the
    // coordinate unit doubles with the resolution.
    if game.is_hi_res() && game.native_coordinates {
        base_size = Size::new(base_size.width * 2, base_size.height * 2);
    }

    GameGeometry {
        game_size,
        base_size,
        resolution_multiplier,
        text_multiplier,
    }
}

/// Plan the color depth pair to attempt.
#[must_use]
pub fn plan_color_depths(game: &GameDescriptor, options: &Options) -> ColorDepthOption {
    // A 256-color game may never be forced into hi-color.
    let force_hicolor = options.force_hicolor_mode && !game.is_palette_game();

    if options.debug_15bit_mode {
        ColorDepthOption::new(15, 15)
    } else if options.debug_24bit_mode {
        ColorDepthOption::new(24, 24)
    } else if game.color_depth == ColorDepthCategory::HiColor
        || options.force_16bit
        || force_hicolor
    {
        ColorDepthOption::new(16, 15)
    } else if game.color_depth == ColorDepthCategory::TrueColor {
        ColorDepthOption::new(32, 24)
    } else {
        ColorDepthOption::new(8, 8)
    }
}

/// Compute the target screen size and placement from the configuration and
/// the filter's real (post-scale) game resolution.
#[must_use]
pub fn setup_render_frame(options: &Options, filtered_game_size: Size) -> (Size, Placement) {
    if options.placement == RenderPlacement::ResizeWindow {
        // The window wraps the scaled game exactly; never stretch past
        // what the user chose via the filter.
        return (filtered_game_size, Placement::Center);
    }

    let mut screen_size = options.screen_size;
    if screen_size.width <= 0 {
        screen_size.width = filtered_game_size.width;
    }
    if screen_size.height <= 0 {
        screen_size.height = filtered_game_size.height;
    }

    let placement = match options.placement {
        RenderPlacement::Center => Placement::Center,
        RenderPlacement::StretchProportional => Placement::StretchProportional,
        _ => Placement::Stretch,
    };
    (screen_size, placement)
}

/// In fullscreen, optionally trade the planned size for the nearest
/// supported mode matching the desktop aspect ratio.
///
/// Keeps the prior size silently when no such mode exists; a failed desktop
/// query only disables the feature.
#[must_use]
pub fn apply_desktop_ratio(
    driver: &dyn GraphicsDriver,
    platform: &dyn PlatformDriver,
    screen_size: Size,
    color_depth: i32,
    options: &Options,
) -> Size {
    if options.windowed || !options.match_desktop_ratio {
        return screen_size;
    }

    match platform.get_desktop_resolution() {
        Some(desktop) => {
            match find_nearest_supported_mode(driver, screen_size, color_depth, Some(desktop), false)
            {
                Some(fixed) => fixed,
                None => screen_size,
            }
        }
        None => {
            log::info!("Automatic borders disabled (unable to obtain desktop resolution)");
            screen_size
        }
    }
}
