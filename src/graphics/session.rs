//!
//! Graphics session lifecycle.
//!
//! A `GraphicsSession` owns the active driver and scaling filter and walks
//! the whole negotiation: plan screen settings, attempt the requested mode,
//! hunt for a corrected mode on failure, fall back to the secondary color
//! depth, and finally retry the entire sequence on the baseline software
//! driver before giving up. Exactly one driver and one filter are live at
//! a time; shutdown releases both and is safe to repeat.

use std::sync::atomic::AtomicU32;
use std::sync::Arc;

use crate::config::Options;
use crate::game::GameDescriptor;
use crate::graphics::bitmap::{Bitmap, DriverImage};
use crate::graphics::driver::{
    DisplayMode, DrawScreenCallback, DriverError, DriverRegistry, GraphicsDriver, ModeRequest,
    NullSpriteCallback, Placement, PollingCallback, TimingSource, TintMethod,
};
use crate::graphics::filter::{choose_filter_id, create_filter};
use crate::graphics::modes::find_nearest_supported_mode;
use crate::graphics::pixel_format::{ColorConversionFlags, PixelFormat, PlatformKind};
use crate::graphics::rescale::{adjust_sizes_for_resolution, CoordinateScale};
use crate::graphics::settings::{
    apply_desktop_ratio, derive_game_geometry, plan_color_depths, setup_render_frame,
    ScreenSettings,
};
use crate::graphics::Size;
use crate::platform::{desktop_size_for_windowed_mode, PlatformDriver};

/// Smallest window the engine will try to open when correcting a failed
/// windowed mode.
const MINIMAL_WINDOW_SIZE: Size = Size::new(128, 128);

/// Errors surfaced by graphics-mode negotiation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphicsModeError {
    /// The preferred backend cannot be constructed.
    #[error("graphics driver '{0}' is not available")]
    DriverUnavailable(String),

    /// A size/depth combination the driver does not offer.
    #[error("display mode {width} x {height} ({depth}-bit) is not supported: {reason}")]
    ModeUnsupported {
        width: i32,
        height: i32,
        depth: i32,
        reason: String,
    },

    /// Filter could not bind to the mode; fatal for startup.
    #[error("graphics filter '{id}' failed to initialize: {reason}")]
    FilterInitFailed { id: String, reason: String },

    /// Nearest-mode search exhausted the catalog.
    #[error("no supported display mode found at {depth}-bit")]
    NoSupportedModeFound { depth: i32 },

    /// Terminal condition after all fallbacks were exhausted.
    #[error("could not initialize graphics mode {width} x {height} ({depth}-bit): {reason}")]
    GraphicsModeFailed {
        width: i32,
        height: i32,
        depth: i32,
        reason: String,
    },
}

/// How walk-behind areas are rendered, decided by driver capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WalkBehindMethod {
    /// Composite walk-behinds over the character sprite in software.
    #[default]
    DrawOverCharSprite,
    /// Let the accelerated driver draw them as separate sprites.
    DrawAsSeparateSprite,
}

/// One recorded mode-switch attempt, for diagnosability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeAttempt {
    pub screen_size: Size,
    pub color_depth: i32,
    pub windowed: bool,
    pub placement: Placement,
    pub succeeded: bool,
}

/// Frame callbacks the engine wires into the driver once a mode is up.
#[derive(Default)]
pub struct SessionCallbacks {
    pub polling: Option<PollingCallback>,
    pub draw_screen: Option<DrawScreenCallback>,
    pub null_sprite: Option<NullSpriteCallback>,
}

/// Owned context for one graphics-mode session.
pub struct GraphicsSession {
    platform_kind: PlatformKind,
    driver: Option<Box<dyn GraphicsDriver>>,
    filter: Option<Box<dyn crate::graphics::filter::ScalingFilter>>,
    settings: Option<ScreenSettings>,
    resolution: Option<DisplayMode>,
    pixel_format: PixelFormat,
    color_conversion: ColorConversionFlags,
    walk_behind: WalkBehindMethod,
    blank_image: Option<DriverImage>,
    blank_sidebar_image: Option<DriverImage>,
    timing: TimingSource,
    attempts: Vec<ModeAttempt>,
    data_rescaled: bool,
}

impl GraphicsSession {
    #[must_use]
    pub fn new(platform_kind: PlatformKind) -> Self {
        Self {
            platform_kind,
            driver: None,
            filter: None,
            settings: None,
            resolution: None,
            pixel_format: PixelFormat::defaults_for(platform_kind),
            color_conversion: ColorConversionFlags::default(),
            walk_behind: WalkBehindMethod::default(),
            blank_image: None,
            blank_sidebar_image: None,
            timing: Arc::new(AtomicU32::new(0)),
            attempts: Vec::new(),
            data_rescaled: false,
        }
    }

    /// Run the whole negotiation: driver construction, settings planning,
    /// mode switch with fallbacks, and post-init bookkeeping.
    ///
    /// On total failure the baseline software driver is tried once before
    /// a consolidated alert is shown and the error returned.
    pub fn init(
        &mut self,
        game: &mut GameDescriptor,
        options: &Options,
        platform: &mut dyn PlatformDriver,
        registry: &DriverRegistry,
        callbacks: SessionCallbacks,
    ) -> Result<(), GraphicsModeError> {
        self.attempts.clear();

        let mut result =
            self.create_driver_and_init_mode(&options.driver_id, game, options, platform, registry);

        if let Err(err) = &result {
            let filter_failure = matches!(err, GraphicsModeError::FilterInitFailed { .. });
            let baseline = registry.baseline_id();
            let on_baseline = self
                .driver
                .as_ref()
                .is_some_and(|driver| driver.driver_id().eq_ignore_ascii_case(baseline));
            if !filter_failure && !on_baseline {
                log::info!("Retrying graphics mode with the '{}' driver", baseline);
                self.shutdown(platform);
                result =
                    self.create_driver_and_init_mode(baseline, game, options, platform, registry);
            }
        }

        if let Err(err) = result {
            match &err {
                GraphicsModeError::FilterInitFailed { reason, .. } => {
                    platform.display_alert(&format!(
                        "Unable to initialize the graphics filter. It returned the following error:\n\
                         '{}'\n\nTry running Setup and selecting a different graphics filter.",
                        reason
                    ));
                }
                _ => self.display_gfx_mode_error(platform, &err),
            }
            self.shutdown(platform);
            return Err(err);
        }

        if let Err(err) = self.post_init_gfx_driver() {
            self.display_gfx_mode_error(platform, &err);
            self.shutdown(platform);
            return Err(err);
        }
        self.prepare_screen();
        platform.post_display_init(options.windowed);
        self.set_driver_callbacks(callbacks);
        self.set_color_conversions();
        Ok(())
    }

    /// Tear down the driver and filter and leave graphics mode.
    ///
    /// Safe to call repeatedly, including when nothing was initialized.
    pub fn shutdown(&mut self, platform: &mut dyn PlatformDriver) {
        if let Some(driver) = self.driver.as_deref_mut() {
            if driver.is_initialized() {
                if let Err(err) = driver.uninit() {
                    log::warn!("Driver uninit failed: {}", err);
                }
            }
        }
        // Tell the platform we are no longer in graphics mode.
        platform.finished_using_graphics_mode();

        self.driver = None;
        self.filter = None;
        self.blank_image = None;
        self.blank_sidebar_image = None;
        self.resolution = None;
        self.settings = None;
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.driver
            .as_ref()
            .is_some_and(|driver| driver.is_initialized())
    }

    #[must_use]
    pub fn driver(&self) -> Option<&dyn GraphicsDriver> {
        self.driver.as_deref()
    }

    #[must_use]
    pub fn settings(&self) -> Option<&ScreenSettings> {
        self.settings.as_ref()
    }

    /// The achieved display mode, once a switch has succeeded.
    #[must_use]
    pub fn resolution(&self) -> Option<DisplayMode> {
        self.resolution
    }

    #[must_use]
    pub fn filter_id(&self) -> Option<&str> {
        self.filter.as_deref().map(|filter| filter.filter_id())
    }

    /// Every mode-switch attempt made by the last `init`, in order.
    #[must_use]
    pub fn attempts(&self) -> &[ModeAttempt] {
        &self.attempts
    }

    #[must_use]
    pub fn pixel_format(&self) -> &PixelFormat {
        &self.pixel_format
    }

    #[must_use]
    pub fn color_conversion(&self) -> ColorConversionFlags {
        self.color_conversion
    }

    #[must_use]
    pub fn walk_behind_method(&self) -> WalkBehindMethod {
        self.walk_behind
    }

    #[must_use]
    pub fn blank_images(&self) -> (Option<DriverImage>, Option<DriverImage>) {
        (self.blank_image, self.blank_sidebar_image)
    }

    #[must_use]
    pub fn timing(&self) -> TimingSource {
        Arc::clone(&self.timing)
    }

    fn create_driver_and_init_mode(
        &mut self,
        driver_id: &str,
        game: &mut GameDescriptor,
        options: &Options,
        platform: &mut dyn PlatformDriver,
        registry: &DriverRegistry,
    ) -> Result<(), GraphicsModeError> {
        self.create_gfx_driver(driver_id, game, registry);
        let settings = self.init_screen_settings(game, options, platform)?;
        self.settings = Some(settings);
        self.switch_to_graphics_mode(game, options, platform, &settings)
    }

    fn create_gfx_driver(
        &mut self,
        driver_id: &str,
        game: &GameDescriptor,
        registry: &DriverRegistry,
    ) {
        log::info!("Init gfx driver");
        let mut driver = registry.create(driver_id, game.is_palette_game());
        driver.set_callback_on_init(Box::new(|mode| {
            log::debug!(
                "Driver reports mode {} x {} ({}-bit)",
                mode.width,
                mode.height,
                mode.color_depth
            );
        }));
        driver.set_tint_method(TintMethod::Recolorize);
        self.driver = Some(driver);
    }

    fn init_screen_settings(
        &mut self,
        game: &mut GameDescriptor,
        options: &Options,
        platform: &mut dyn PlatformDriver,
    ) -> Result<ScreenSettings, GraphicsModeError> {
        log::info!("Initializing screen settings");

        self.pixel_format = PixelFormat::defaults_for(self.platform_kind);

        let geometry = derive_game_geometry(game, options);
        let color_depths = plan_color_depths(game, options);

        self.init_gfx_filters(options, platform, geometry.game_size, color_depths.primary)?;
        let filtered_game_size = self
            .filter
            .as_deref()
            .map_or(geometry.game_size, |filter| filter.real_resolution());

        let (mut screen_size, placement) = setup_render_frame(options, filtered_game_size);
        if let Some(driver) = self.driver.as_deref() {
            screen_size =
                apply_desktop_ratio(driver, platform, screen_size, color_depths.primary, options);
        }

        if !self.data_rescaled {
            adjust_sizes_for_resolution(
                game,
                game.file_version,
                geometry.base_size.width,
                CoordinateScale::new(geometry.resolution_multiplier),
            );
            self.data_rescaled = true;
        }

        Ok(ScreenSettings {
            game_size: geometry.game_size,
            base_size: geometry.base_size,
            screen_size,
            placement,
            color_depths,
            resolution_multiplier: geometry.resolution_multiplier,
            text_multiplier: geometry.text_multiplier,
        })
    }

    fn init_gfx_filters(
        &mut self,
        options: &Options,
        platform: &mut dyn PlatformDriver,
        game_size: Size,
        color_depth: i32,
    ) -> Result<(), GraphicsModeError> {
        log::info!("Init gfx filters");

        let filter_id = match self.driver.as_deref() {
            Some(driver) => choose_filter_id(options, driver, platform, game_size, color_depth),
            None => "None".to_string(),
        };
        let mut filter = create_filter(&filter_id);
        log::info!("Applying scaling filter: {}", filter.filter_id());

        if let Err(err) = filter.initialize(game_size.width, game_size.height, color_depth) {
            return Err(GraphicsModeError::FilterInitFailed {
                id: filter.filter_id().to_string(),
                reason: err.to_string(),
            });
        }

        if let Some(driver) = self.driver.as_deref_mut() {
            driver.set_graphics_filter(filter.as_ref());
        }
        self.filter = Some(filter);
        Ok(())
    }

    fn init_gfx_mode(
        &mut self,
        game: &GameDescriptor,
        options: &Options,
        settings: &ScreenSettings,
        screen_size: Size,
        color_depth: i32,
    ) -> Result<(), DriverError> {
        log::info!(
            "Trying to set gfx mode to {} ({}-bit) {}",
            screen_size,
            color_depth,
            if options.windowed { "windowed" } else { "fullscreen" }
        );

        // Palette games always run an 8-bit surface.
        let effective_depth = if game.is_palette_game() { 8 } else { color_depth };

        // If the filtered game appears larger than the window, a "centered"
        // style cannot fit; use proportional stretch instead.
        let mut using_placement = settings.placement;
        if using_placement == Placement::Center {
            let filtered_game_size = self
                .filter
                .as_deref()
                .map_or(settings.game_size, |filter| filter.real_resolution());
            if filtered_game_size.exceeds_by_any(screen_size) {
                using_placement = Placement::StretchProportional;
            }
        }

        let driver = self.driver.as_deref_mut().ok_or(DriverError::NotInitialized)?;
        if let Some(rate) = options.refresh_rate {
            if rate >= 50 {
                driver.request_refresh_rate(rate);
            }
        }

        let request = ModeRequest {
            game_size: settings.game_size,
            screen_size,
            placement: using_placement,
            color_depth: effective_depth,
            windowed: options.windowed,
        };
        let result = driver.init(&request, Arc::clone(&self.timing));

        match &result {
            Ok(()) => {
                let achieved = driver.resolution().unwrap_or(DisplayMode::new(
                    screen_size.width,
                    screen_size.height,
                    effective_depth,
                ));
                self.resolution = Some(achieved);
                log::info!(
                    "Succeeded. Using gfx mode {} ({}-bit) {}",
                    achieved.size(),
                    achieved.color_depth,
                    if options.windowed { "windowed" } else { "fullscreen" }
                );
            }
            Err(err) => log::info!("Failed. {}", err),
        }

        self.attempts.push(ModeAttempt {
            screen_size,
            color_depth: effective_depth,
            windowed: options.windowed,
            placement: using_placement,
            succeeded: result.is_ok(),
        });
        result
    }

    /// Attempt the requested mode; on failure, derive a corrected size and
    /// retry once.
    fn try_init_gfx_mode(
        &mut self,
        game: &GameDescriptor,
        options: &Options,
        platform: &mut dyn PlatformDriver,
        settings: &ScreenSettings,
        color_depth: i32,
    ) -> Result<(), GraphicsModeError> {
        let screen_size = settings.screen_size;
        let first_error = match self.init_gfx_mode(game, options, settings, screen_size, color_depth)
        {
            Ok(()) => return Ok(()),
            Err(err) => err,
        };

        log::info!("Attempting to find nearest supported resolution");

        let unsupported = |size: Size, reason: &dyn std::fmt::Display| {
            GraphicsModeError::ModeUnsupported {
                width: size.width,
                height: size.height,
                depth: color_depth,
                reason: reason.to_string(),
            }
        };

        if !options.windowed {
            let desktop = platform.get_desktop_resolution();
            let ratio_reference = if options.match_desktop_ratio { desktop } else { None };
            let nearest = match self.driver.as_deref() {
                Some(driver) => find_nearest_supported_mode(
                    driver,
                    screen_size,
                    color_depth,
                    ratio_reference,
                    true,
                ),
                None => None,
            };
            let Some(fixed) = nearest else {
                return Err(GraphicsModeError::NoSupportedModeFound { depth: color_depth });
            };
            self.init_gfx_mode(game, options, settings, fixed, color_depth)
                .map_err(|err| unsupported(fixed, &err))
        } else {
            // Windowed modes are not cataloged; just keep the window inside
            // the generally supported limits.
            let desktop = desktop_size_for_windowed_mode(platform).unwrap_or(screen_size);
            if screen_size.exceeds_by_any(desktop)
                || MINIMAL_WINDOW_SIZE.exceeds_by_any(screen_size)
            {
                let fixed = screen_size.clamped(MINIMAL_WINDOW_SIZE, desktop);
                self.init_gfx_mode(game, options, settings, fixed, color_depth)
                    .map_err(|err| unsupported(fixed, &err))
            } else {
                Err(unsupported(screen_size, &first_error))
            }
        }
    }

    fn switch_to_graphics_mode(
        &mut self,
        game: &GameDescriptor,
        options: &Options,
        platform: &mut dyn PlatformDriver,
        settings: &ScreenSettings,
    ) -> Result<(), GraphicsModeError> {
        log::info!("Switching to graphics mode");

        let color_depths = settings.color_depths;
        let mut last_error = match self.try_init_gfx_mode(
            game,
            options,
            platform,
            settings,
            color_depths.primary,
        ) {
            Ok(()) => return Ok(()),
            Err(err) => err,
        };

        if color_depths.has_distinct_fallback() {
            match self.try_init_gfx_mode(game, options, platform, settings, color_depths.fallback) {
                Ok(()) => return Ok(()),
                Err(err) => last_error = err,
            }
        }

        Err(GraphicsModeError::GraphicsModeFailed {
            width: settings.screen_size.width,
            height: settings.screen_size.height,
            depth: color_depths.primary,
            reason: last_error.to_string(),
        })
    }

    fn display_gfx_mode_error(
        &mut self,
        platform: &mut dyn PlatformDriver,
        error: &GraphicsModeError,
    ) {
        platform.finished_using_graphics_mode();

        let (width, height, depth, reason) = match error {
            GraphicsModeError::GraphicsModeFailed {
                width,
                height,
                depth,
                reason,
            } => (*width, *height, *depth, reason.clone()),
            other => {
                let settings = self.settings.unwrap_or(ScreenSettings {
                    game_size: Size::default(),
                    base_size: Size::default(),
                    screen_size: Size::default(),
                    placement: Placement::Center,
                    color_depths: crate::graphics::settings::ColorDepthOption::new(0, 0),
                    resolution_multiplier: 1,
                    text_multiplier: 1,
                });
                (
                    settings.screen_size.width,
                    settings.screen_size.height,
                    settings.color_depths.primary,
                    other.to_string(),
                )
            }
        };

        platform.display_alert(&format!(
            "There was a problem initializing graphics mode {} x {} ({}-bit).\n\
             (Problem: '{}')\n\
             Try to correct the problem, or seek help from the Folio homepage.\n\
             \nPossible causes:\n\
             * your graphics card drivers do not support this resolution. \
             Run the game setup program and try the other resolution.\n\
             * the graphics driver you have selected does not work. Try changing graphics driver.\n\
             * the graphics filter you have selected does not work. Try another filter.",
            width, height, depth, reason
        ));
    }

    fn post_init_gfx_driver(&mut self) -> Result<(), GraphicsModeError> {
        let accelerated = self
            .driver
            .as_deref()
            .is_some_and(|driver| driver.has_accelerated_stretch_and_flip());

        if accelerated {
            self.walk_behind = WalkBehindMethod::DrawAsSeparateSprite;
            self.create_blank_images()?;
        } else {
            self.walk_behind = WalkBehindMethod::DrawOverCharSprite;
        }
        Ok(())
    }

    /// Create the placeholder images used by the accelerated render path.
    ///
    /// This is the first real use of the new mode, so driver errors here
    /// still count as a failed graphics mode rather than a crash.
    fn create_blank_images(&mut self) -> Result<(), GraphicsModeError> {
        let resolution = match self.resolution {
            Some(resolution) => resolution,
            None => return Ok(()),
        };
        let Some(driver) = self.driver.as_deref_mut() else {
            return Ok(());
        };

        let mut blank = Bitmap::new(16, 16, resolution.color_depth);
        blank = driver.convert_bitmap_to_supported_depth(blank);
        blank.clear();

        let to_mode_error = |err: DriverError| GraphicsModeError::GraphicsModeFailed {
            width: resolution.width,
            height: resolution.height,
            depth: resolution.color_depth,
            reason: err.to_string(),
        };
        self.blank_image = Some(
            driver
                .create_image_from_bitmap(&blank, false, true)
                .map_err(to_mode_error)?,
        );
        self.blank_sidebar_image = Some(
            driver
                .create_image_from_bitmap(&blank, false, true)
                .map_err(to_mode_error)?,
        );
        Ok(())
    }

    fn prepare_screen(&mut self) {
        if let (Some(settings), Some(resolution)) = (self.settings.as_ref(), self.resolution) {
            log::info!("Preparing graphics mode screen");
            log::info!(
                "Screen resolution: {}; game resolution {}",
                resolution.size(),
                settings.game_size
            );
        }
        if let Some(resolution) = self.resolution {
            self.pixel_format
                .prepare_for_depth(resolution.color_depth, self.platform_kind);
        }
    }

    fn set_driver_callbacks(&mut self, callbacks: SessionCallbacks) {
        let Some(driver) = self.driver.as_deref_mut() else {
            return;
        };
        if let Some(polling) = callbacks.polling {
            driver.set_callback_for_polling(polling);
        }
        if let Some(draw_screen) = callbacks.draw_screen {
            driver.set_callback_to_draw_screen(draw_screen);
        }
        if let Some(null_sprite) = callbacks.null_sprite {
            driver.set_callback_for_null_sprite(null_sprite);
        }
    }

    fn set_color_conversions(&mut self) {
        log::info!("Initializing colour conversion");
        self.color_conversion = ColorConversionFlags::standard();
    }
}

impl Default for GraphicsSession {
    fn default() -> Self {
        Self::new(PlatformKind::Desktop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderPlacement;
    use crate::game::{ColorDepthCategory, GameResolutionTier};
    use crate::graphics::driver::DriverSpec;
    use crate::graphics::software::SoftwareDriver;
    use crate::platform::NullPlatform;

    fn fullscreen_options(filter: &str, driver: &str) -> Options {
        Options {
            driver_id: driver.to_string(),
            filter_id: Some(filter.to_string()),
            ..Options::default()
        }
    }

    fn always() -> bool {
        true
    }

    fn wide_catalog_driver() -> Box<dyn GraphicsDriver> {
        Box::new(SoftwareDriver::with_mode_catalog(vec![
            DisplayMode::new(1920, 1080, 32),
            DisplayMode::new(1920, 1080, 24),
        ]))
    }

    fn depth15_catalog_driver() -> Box<dyn GraphicsDriver> {
        Box::new(SoftwareDriver::with_mode_catalog(vec![
            DisplayMode::new(640, 400, 15),
            DisplayMode::new(800, 600, 15),
        ]))
    }

    fn registry_with(factory: fn() -> Box<dyn GraphicsDriver>) -> DriverRegistry {
        let mut registry = DriverRegistry::with_default_backends();
        registry.register(DriverSpec {
            id: "Test",
            name: "Scripted test driver",
            available: always,
            supports_palette_games: true,
            factory,
        });
        registry
    }

    #[test]
    fn test_end_to_end_nearest_mode_adopted() {
        // No 640x400 fullscreen mode exists, but 1920x1080 does.
        let registry = registry_with(wide_catalog_driver);
        let mut game =
            GameDescriptor::new(GameResolutionTier::R320x200, ColorDepthCategory::TrueColor);
        let options = fullscreen_options("StdScale2", "Test");
        let mut platform = NullPlatform::with_desktop(Size::new(1920, 1080));
        let mut session = GraphicsSession::default();

        session
            .init(
                &mut game,
                &options,
                &mut platform,
                &registry,
                SessionCallbacks::default(),
            )
            .unwrap();

        assert_eq!(session.resolution(), Some(DisplayMode::new(1920, 1080, 32)));
        let attempts = session.attempts();
        assert_eq!(attempts.len(), 2);
        assert!(!attempts[0].succeeded);
        assert_eq!(attempts[0].screen_size, Size::new(640, 400));
        assert!(attempts[1].succeeded);
        assert_eq!(attempts[1].screen_size, Size::new(1920, 1080));
        assert!(platform.alerts.is_empty());
    }

    #[test]
    fn test_fallback_depth_succeeds_with_two_attempts() {
        // Primary depth 16 fails everywhere; fallback 15 works at the
        // originally requested size.
        let registry = registry_with(depth15_catalog_driver);
        let mut game =
            GameDescriptor::new(GameResolutionTier::R320x200, ColorDepthCategory::HiColor);
        let options = fullscreen_options("StdScale2", "Test");
        let mut platform = NullPlatform::default();
        let mut session = GraphicsSession::default();

        session
            .init(
                &mut game,
                &options,
                &mut platform,
                &registry,
                SessionCallbacks::default(),
            )
            .unwrap();

        assert_eq!(session.resolution(), Some(DisplayMode::new(640, 400, 15)));
        let attempts = session.attempts();
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[0].color_depth, 16);
        assert!(!attempts[0].succeeded);
        assert_eq!(attempts[1].color_depth, 15);
        assert!(attempts[1].succeeded);
    }

    #[test]
    fn test_center_placement_demoted_when_filtered_size_exceeds_screen() {
        let registry = DriverRegistry::with_default_backends();
        let mut game =
            GameDescriptor::new(GameResolutionTier::R320x200, ColorDepthCategory::TrueColor);
        let options = Options {
            driver_id: "Soft".to_string(),
            filter_id: Some("StdScale2".to_string()),
            windowed: true,
            screen_size: Size::new(320, 200),
            placement: RenderPlacement::Center,
            ..Options::default()
        };
        let mut platform = NullPlatform::with_desktop(Size::new(1920, 1080));
        let mut session = GraphicsSession::default();

        session
            .init(
                &mut game,
                &options,
                &mut platform,
                &registry,
                SessionCallbacks::default(),
            )
            .unwrap();

        let attempt = session.attempts().last().copied().unwrap();
        assert!(attempt.succeeded);
        assert_eq!(attempt.placement, Placement::StretchProportional);
    }

    #[test]
    fn test_windowed_failure_clamps_into_desktop() {
        let registry = DriverRegistry::with_default_backends();
        let mut game =
            GameDescriptor::new(GameResolutionTier::R320x200, ColorDepthCategory::TrueColor);
        let options = Options {
            driver_id: "Soft".to_string(),
            filter_id: Some("None".to_string()),
            windowed: true,
            // Degenerate request the driver rejects outright.
            screen_size: Size::new(64, 40),
            ..Options::default()
        };
        let mut platform = NullPlatform::with_desktop(Size::new(1920, 1080));
        let mut session = GraphicsSession::default();

        session
            .init(
                &mut game,
                &options,
                &mut platform,
                &registry,
                SessionCallbacks::default(),
            )
            .unwrap();

        let attempt = session.attempts().last().copied().unwrap();
        assert!(attempt.succeeded);
        assert_eq!(attempt.screen_size, Size::new(128, 128));
    }

    #[test]
    fn test_palette_game_runs_at_8_bit() {
        let registry = DriverRegistry::with_default_backends();
        let mut game =
            GameDescriptor::new(GameResolutionTier::R320x200, ColorDepthCategory::Palette);
        let options = Options {
            driver_id: "Soft".to_string(),
            filter_id: Some("None".to_string()),
            force_hicolor_mode: true,
            ..Options::default()
        };
        let mut platform = NullPlatform::default();
        let mut session = GraphicsSession::default();

        session
            .init(
                &mut game,
                &options,
                &mut platform,
                &registry,
                SessionCallbacks::default(),
            )
            .unwrap();

        assert_eq!(session.resolution().map(|r| r.color_depth), Some(8));
    }

    #[test]
    fn test_filter_failure_is_fatal_with_alert() {
        let registry = DriverRegistry::with_default_backends();
        // A custom game with a degenerate base size makes the filter
        // refuse to bind.
        let mut game = GameDescriptor::default();
        let options = Options {
            driver_id: "Soft".to_string(),
            filter_id: Some("StdScale2".to_string()),
            base_size: Size::new(0, 0),
            ..Options::default()
        };
        let mut platform = NullPlatform::default();
        let mut session = GraphicsSession::default();

        let err = session
            .init(
                &mut game,
                &options,
                &mut platform,
                &registry,
                SessionCallbacks::default(),
            )
            .unwrap_err();

        assert!(matches!(err, GraphicsModeError::FilterInitFailed { .. }));
        assert_eq!(platform.alerts.len(), 1);
        assert!(platform.alerts[0].contains("graphics filter"));
        assert!(!session.is_initialized());
    }

    #[test]
    fn test_total_failure_alerts_with_attempted_mode() {
        // A registry whose baseline driver has an empty catalog: nothing
        // can ever succeed fullscreen, even after the forced retry.
        fn empty_driver() -> Box<dyn GraphicsDriver> {
            Box::new(SoftwareDriver::with_mode_catalog(Vec::new()))
        }
        let mut registry = DriverRegistry::empty();
        registry.register(DriverSpec {
            id: "Soft",
            name: "Empty software driver",
            available: always,
            supports_palette_games: true,
            factory: empty_driver,
        });

        let mut game =
            GameDescriptor::new(GameResolutionTier::R320x200, ColorDepthCategory::TrueColor);
        let options = Options {
            driver_id: "Soft".to_string(),
            filter_id: Some("None".to_string()),
            screen_size: Size::new(3000, 2000),
            ..Options::default()
        };
        let mut platform = NullPlatform::default();
        let mut session = GraphicsSession::default();

        let err = session
            .init(
                &mut game,
                &options,
                &mut platform,
                &registry,
                SessionCallbacks::default(),
            )
            .unwrap_err();

        assert!(matches!(err, GraphicsModeError::GraphicsModeFailed { .. }));
        assert_eq!(platform.alerts.len(), 1);
        assert!(platform.alerts[0].contains("3000 x 2000"));
        assert!(!session.is_initialized());
    }

    /// Driver that can never bind a mode, under a non-baseline id.
    struct FailingDriver;

    impl GraphicsDriver for FailingDriver {
        fn driver_id(&self) -> &'static str {
            "Fail"
        }

        fn driver_name(&self) -> &'static str {
            "Always-failing test driver"
        }

        fn init(
            &mut self,
            _request: &ModeRequest,
            _timing: crate::graphics::driver::TimingSource,
        ) -> Result<(), DriverError> {
            Err(DriverError::VideoModeFailed("scripted failure".to_string()))
        }

        fn uninit(&mut self) -> Result<(), DriverError> {
            Err(DriverError::NotInitialized)
        }

        fn is_initialized(&self) -> bool {
            false
        }

        fn supported_mode_list(
            &self,
            _color_depth: i32,
        ) -> Option<crate::graphics::driver::ModeList> {
            None
        }

        fn resolution(&self) -> Result<DisplayMode, DriverError> {
            Err(DriverError::NotInitialized)
        }

        fn set_graphics_filter(&mut self, _filter: &dyn crate::graphics::filter::ScalingFilter) {}

        fn set_tint_method(&mut self, _method: TintMethod) {}

        fn set_callback_on_init(&mut self, _callback: crate::graphics::driver::OnInitCallback) {}

        fn set_callback_for_polling(&mut self, _callback: PollingCallback) {}

        fn set_callback_to_draw_screen(&mut self, _callback: DrawScreenCallback) {}

        fn set_callback_for_null_sprite(&mut self, _callback: NullSpriteCallback) {}

        fn convert_bitmap_to_supported_depth(&self, bitmap: Bitmap) -> Bitmap {
            bitmap
        }

        fn create_image_from_bitmap(
            &mut self,
            _bitmap: &Bitmap,
            _has_alpha: bool,
            _opaque: bool,
        ) -> Result<DriverImage, DriverError> {
            Err(DriverError::NotInitialized)
        }

        fn has_accelerated_stretch_and_flip(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_failed_driver_retries_on_baseline() {
        fn failing_driver() -> Box<dyn GraphicsDriver> {
            Box::new(FailingDriver)
        }
        let mut registry = DriverRegistry::with_default_backends();
        registry.register(DriverSpec {
            id: "Fail",
            name: "Always-failing test driver",
            available: always,
            supports_palette_games: true,
            factory: failing_driver,
        });

        let mut game =
            GameDescriptor::new(GameResolutionTier::R320x200, ColorDepthCategory::TrueColor);
        let options = Options {
            driver_id: "Fail".to_string(),
            filter_id: Some("None".to_string()),
            ..Options::default()
        };
        let mut platform = NullPlatform::default();
        let mut session = GraphicsSession::default();

        session
            .init(
                &mut game,
                &options,
                &mut platform,
                &registry,
                SessionCallbacks::default(),
            )
            .unwrap();

        assert_eq!(session.driver().map(|d| d.driver_id()), Some("Soft"));
        assert!(session.is_initialized());
        assert!(platform.alerts.is_empty());
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let mut platform = NullPlatform::default();
        let mut session = GraphicsSession::default();
        session.shutdown(&mut platform);
        session.shutdown(&mut platform);
        assert!(!session.is_initialized());
        assert_eq!(platform.finished_calls, 2);
    }

    #[test]
    fn test_software_mode_uses_software_walk_behind() {
        let registry = DriverRegistry::with_default_backends();
        let mut game =
            GameDescriptor::new(GameResolutionTier::R320x200, ColorDepthCategory::TrueColor);
        let options = fullscreen_options("None", "Soft");
        let mut platform = NullPlatform::default();
        let mut session = GraphicsSession::default();

        session
            .init(
                &mut game,
                &options,
                &mut platform,
                &registry,
                SessionCallbacks::default(),
            )
            .unwrap();

        // The software driver has no accelerated stretch-and-flip path.
        assert_eq!(session.walk_behind_method(), WalkBehindMethod::DrawOverCharSprite);
        assert_eq!(session.blank_images(), (None, None));
        assert!(session
            .color_conversion()
            .contains(ColorConversionFlags::MOST));
    }
}
