//!
//! Graphics driver boundary: the trait every rendering backend implements,
//! the display-mode catalog types, and the backend registry.
//!
//! Backends (software framebuffer, SDL2) implement similar capability sets
//! behind one trait, so the negotiation logic can drive any of them through
//! the same attempt/fallback protocol.

use std::sync::atomic::AtomicU32;
use std::sync::Arc;

use crate::graphics::bitmap::{Bitmap, DriverImage};
use crate::graphics::filter::ScalingFilter;
use crate::graphics::software::SoftwareDriver;
use crate::graphics::Size;

/// Color depths a display mode may legally carry, in bits per pixel.
pub const SUPPORTED_COLOR_DEPTHS: [i32; 5] = [8, 15, 16, 24, 32];

/// Error types for driver operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DriverError {
    #[error("graphics driver not initialized")]
    NotInitialized,

    #[error("graphics driver already initialized")]
    AlreadyInitialized,

    #[error("video mode configuration failed: {0}")]
    VideoModeFailed(String),

    #[error("window creation failed: {0}")]
    WindowCreationFailed(String),

    #[error("renderer creation failed: {0}")]
    RendererCreationFailed(String),

    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}

/// Result type for driver operations.
pub type DriverResult<T> = Result<T, DriverError>;

/// How the filtered game image is fitted onto the physical screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    /// Draw at the filtered size, centered; borders around.
    #[default]
    Center,
    /// Stretch to fill the whole screen, ignoring aspect ratio.
    Stretch,
    /// Stretch as far as the aspect ratio allows, letterboxed.
    StretchProportional,
}

/// Sprite tint strategies a driver may be asked to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TintMethod {
    #[default]
    Recolorize,
    SpecifyMaximum,
}

/// An actual display mode a backend can switch to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayMode {
    pub width: i32,
    pub height: i32,
    /// Bits per pixel; always one of [`SUPPORTED_COLOR_DEPTHS`].
    pub color_depth: i32,
}

impl DisplayMode {
    #[must_use]
    pub const fn new(width: i32, height: i32, color_depth: i32) -> Self {
        Self {
            width,
            height,
            color_depth,
        }
    }

    #[must_use]
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    #[must_use]
    pub fn has_supported_depth(&self) -> bool {
        SUPPORTED_COLOR_DEPTHS.contains(&self.color_depth)
    }
}

/// A transient catalog of display modes supported by a driver.
///
/// Owned by the caller; releasing it is handled by drop on every path.
#[derive(Debug, Clone, Default)]
pub struct ModeList {
    modes: Vec<DisplayMode>,
}

impl ModeList {
    #[must_use]
    pub fn new(modes: Vec<DisplayMode>) -> Self {
        Self { modes }
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.modes.len()
    }

    /// Fetch a mode by index. May fail per-index.
    #[must_use]
    pub fn get_mode(&self, index: usize) -> Option<DisplayMode> {
        self.modes.get(index).copied()
    }
}

/// The full mode request handed to a driver at init time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeRequest {
    /// Size of the game's native drawing surface.
    pub game_size: Size,
    /// Target physical screen or window size.
    pub screen_size: Size,
    pub placement: Placement,
    pub color_depth: i32,
    pub windowed: bool,
}

/// Frame-timing counter shared between the engine loop and the driver.
pub type TimingSource = Arc<AtomicU32>;

/// Invoked once the driver has switched modes, with the achieved mode.
pub type OnInitCallback = Box<dyn FnMut(&DisplayMode)>;
/// Invoked periodically while the driver blocks (e.g. during long uploads).
pub type PollingCallback = Box<dyn FnMut()>;
/// Invoked when the driver wants the frame redrawn.
pub type DrawScreenCallback = Box<dyn FnMut()>;
/// Invoked for sprite slots with no image; returns whether to skip them.
pub type NullSpriteCallback = Box<dyn FnMut(i32) -> bool>;

/// Trait for graphics backends.
///
/// One driver instance is live at a time; it is created by the registry,
/// driven through `init`/`uninit` by the graphics session, and destroyed
/// with it.
pub trait GraphicsDriver {
    /// Short identifier used in configuration (e.g. "Soft", "SDL2").
    fn driver_id(&self) -> &'static str;

    /// Human-readable backend name for logs and alerts.
    fn driver_name(&self) -> &'static str;

    /// Switch into the requested mode.
    fn init(&mut self, request: &ModeRequest, timing: TimingSource) -> DriverResult<()>;

    /// Leave graphics mode and release mode-dependent resources.
    fn uninit(&mut self) -> DriverResult<()>;

    fn is_initialized(&self) -> bool;

    /// Catalog of modes supported at the given depth, or `None` when the
    /// backend cannot enumerate modes.
    fn supported_mode_list(&self, color_depth: i32) -> Option<ModeList>;

    /// The achieved display mode.
    fn resolution(&self) -> DriverResult<DisplayMode>;

    /// Hint the desired vertical refresh rate. Backends are free to ignore it.
    fn request_refresh_rate(&mut self, _hz: i32) {}

    /// Tell the driver which scaling filter is in effect.
    fn set_graphics_filter(&mut self, filter: &dyn ScalingFilter);

    fn set_tint_method(&mut self, method: TintMethod);

    fn set_callback_on_init(&mut self, callback: OnInitCallback);
    fn set_callback_for_polling(&mut self, callback: PollingCallback);
    fn set_callback_to_draw_screen(&mut self, callback: DrawScreenCallback);
    fn set_callback_for_null_sprite(&mut self, callback: NullSpriteCallback);

    /// Re-author a bitmap at the depth this backend renders natively.
    fn convert_bitmap_to_supported_depth(&self, bitmap: Bitmap) -> Bitmap;

    /// Upload a bitmap, returning a driver-dependent image handle.
    fn create_image_from_bitmap(
        &mut self,
        bitmap: &Bitmap,
        has_alpha: bool,
        opaque: bool,
    ) -> DriverResult<DriverImage>;

    /// Whether the backend can stretch and flip sprites in hardware.
    fn has_accelerated_stretch_and_flip(&self) -> bool;
}

/// Factory for one backend kind.
pub type DriverFactory = fn() -> Box<dyn GraphicsDriver>;

/// A registered backend: identity, capability flags, and a static
/// availability predicate evaluated at selection time.
#[derive(Clone, Copy)]
pub struct DriverSpec {
    pub id: &'static str,
    pub name: &'static str,
    /// Whether this backend can run in the current build/environment.
    pub available: fn() -> bool,
    /// Palette (8-bit category) games cannot run on every backend.
    pub supports_palette_games: bool,
    pub factory: DriverFactory,
}

/// Registry of known backends, queried by configured driver id.
///
/// Selection falls back to the baseline software driver when the requested
/// backend is unknown, unavailable, or unsuitable for the loaded game.
pub struct DriverRegistry {
    specs: Vec<DriverSpec>,
}

fn always_available() -> bool {
    true
}

fn make_software_driver() -> Box<dyn GraphicsDriver> {
    Box::new(SoftwareDriver::new())
}

impl DriverRegistry {
    /// Registry with no backends; callers register their own.
    #[must_use]
    pub fn empty() -> Self {
        Self { specs: Vec::new() }
    }

    /// Registry with the backends compiled into this build.
    #[must_use]
    pub fn with_default_backends() -> Self {
        let mut registry = Self::empty();

        #[cfg(feature = "sdl2-driver")]
        registry.register(DriverSpec {
            id: crate::graphics::sdl2::SDL2_DRIVER_ID,
            name: "SDL2 accelerated driver",
            available: always_available,
            supports_palette_games: false,
            factory: crate::graphics::sdl2::make_driver,
        });

        registry.register(DriverSpec {
            id: SoftwareDriver::ID,
            name: "Software framebuffer driver",
            available: always_available,
            supports_palette_games: true,
            factory: make_software_driver,
        });

        registry
    }

    pub fn register(&mut self, spec: DriverSpec) {
        self.specs.push(spec);
    }

    /// Id of the baseline compatibility backend used for forced retries.
    #[must_use]
    pub fn baseline_id(&self) -> &'static str {
        SoftwareDriver::ID
    }

    /// Registered backend ids, in preference order.
    #[must_use]
    pub fn backend_ids(&self) -> Vec<&'static str> {
        self.specs.iter().map(|spec| spec.id).collect()
    }

    /// Construct the backend for `requested_id`, falling back to the
    /// baseline software driver when the request cannot be satisfied.
    #[must_use]
    pub fn create(&self, requested_id: &str, palette_game: bool) -> Box<dyn GraphicsDriver> {
        for spec in &self.specs {
            if !spec.id.eq_ignore_ascii_case(requested_id) {
                continue;
            }
            if !(spec.available)() {
                log::info!("Graphics driver '{}' is not available in this build", spec.id);
                break;
            }
            if palette_game && !spec.supports_palette_games {
                log::info!(
                    "Graphics driver '{}' cannot run palette games, using software driver",
                    spec.id
                );
                break;
            }
            let driver = (spec.factory)();
            log::info!("Created graphics driver: {}", driver.driver_name());
            return driver;
        }

        let driver = make_software_driver();
        log::info!("Created graphics driver: {}", driver.driver_name());
        driver
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::with_default_backends()
    }
}
