//!
//! Graphics subsystem: display-mode negotiation and lifecycle.

pub mod bitmap;
pub mod driver;
pub mod filter;
pub mod modes;
pub mod pixel_format;
pub mod rescale;
pub mod session;
pub mod settings;
pub mod software;

/// SDL2-backed driver.
#[cfg(feature = "sdl2-driver")]
pub mod sdl2;

pub use bitmap::{Bitmap, DriverImage};
pub use driver::{
    DisplayMode, DriverError, DriverRegistry, DriverResult, GraphicsDriver, ModeList, ModeRequest,
    Placement, TintMethod,
};
pub use filter::{FilterError, ScalingFilter};
pub use session::{GraphicsModeError, GraphicsSession};
pub use settings::{ColorDepthOption, ScreenSettings};

/// A width/height pair in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    #[must_use]
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Whether either dimension is unset or degenerate.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// True when this size is larger than `other` in width or height.
    #[must_use]
    pub const fn exceeds_by_any(&self, other: Size) -> bool {
        self.width > other.width || self.height > other.height
    }

    /// Clamp both dimensions into the `[min, max]` range. The upper bound
    /// wins if the range is inverted.
    #[must_use]
    pub fn clamped(&self, min: Size, max: Size) -> Size {
        Size::new(
            self.width.max(min.width).min(max.width),
            self.height.max(min.height).min(max.height),
        )
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} x {}", self.width, self.height)
    }
}
