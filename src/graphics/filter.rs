//!
//! Scaling filters and filter selection.
//!
//! A filter maps the logical game size to the "real" resolution the driver
//! is asked to present. Exactly one filter is live at a time, owned by the
//! graphics session. Selection resolves, in order: a forced configuration
//! override, an explicit user choice, then automatic detection of the
//! largest integer upscale the current display can carry.

use crate::config::Options;
use crate::graphics::driver::GraphicsDriver;
use crate::graphics::modes::find_max_supported_uniform_multiplier;
use crate::graphics::Size;
use crate::platform::{desktop_size_for_windowed_mode, PlatformDriver};

/// Widest side borders (in pixels) tolerated when hunting for a fullscreen
/// integer-upscale mode.
pub const MAX_SIDEBORDERS_WIDTH: i32 = 110;

/// Largest integer upscale factor a standard scaling filter supports.
pub const MAX_FILTER_SCALING: i32 = 8;

/// Filter identifiers known to this build.
pub const FILTER_IDS: [&str; 8] = [
    "None",
    "StdScale2",
    "StdScale3",
    "StdScale4",
    "StdScale5",
    "StdScale6",
    "StdScale7",
    "StdScale8",
];

/// Errors a filter can raise while binding to a concrete mode.
///
/// These are engine-fatal: startup aborts and the diagnostic is shown to
/// the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    #[error("invalid game surface size {width} x {height}")]
    InvalidSize { width: i32, height: i32 },

    #[error("color depth {depth} is not supported by filter '{id}'")]
    UnsupportedDepth { id: String, depth: i32 },
}

/// A named scaling strategy.
pub trait ScalingFilter {
    /// Identifier the filter is selected by (e.g. "StdScale2").
    fn filter_id(&self) -> &'static str;

    /// Bind the filter to a concrete game size and color depth.
    fn initialize(&mut self, width: i32, height: i32, color_depth: i32)
        -> Result<(), FilterError>;

    /// The game size after scaling. Zero until `initialize` succeeds.
    fn real_resolution(&self) -> Size;
}

/// Pass-through filter: the game is presented at its native size.
#[derive(Debug, Default)]
pub struct NoneFilter {
    size: Size,
}

impl NoneFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScalingFilter for NoneFilter {
    fn filter_id(&self) -> &'static str {
        "None"
    }

    fn initialize(
        &mut self,
        width: i32,
        height: i32,
        _color_depth: i32,
    ) -> Result<(), FilterError> {
        if width <= 0 || height <= 0 {
            return Err(FilterError::InvalidSize { width, height });
        }
        self.size = Size::new(width, height);
        Ok(())
    }

    fn real_resolution(&self) -> Size {
        self.size
    }
}

/// Integer upscale filter ("StdScaleN"): every game pixel becomes an NxN
/// block.
#[derive(Debug)]
pub struct StdScaleFilter {
    factor: i32,
    size: Size,
}

impl StdScaleFilter {
    /// Create a standard scaler. The factor is clamped into `2..=8`.
    #[must_use]
    pub fn new(factor: i32) -> Self {
        Self {
            factor: factor.clamp(2, MAX_FILTER_SCALING),
            size: Size::default(),
        }
    }

    #[must_use]
    pub const fn factor(&self) -> i32 {
        self.factor
    }
}

impl ScalingFilter for StdScaleFilter {
    fn filter_id(&self) -> &'static str {
        match self.factor {
            2 => "StdScale2",
            3 => "StdScale3",
            4 => "StdScale4",
            5 => "StdScale5",
            6 => "StdScale6",
            7 => "StdScale7",
            _ => "StdScale8",
        }
    }

    fn initialize(
        &mut self,
        width: i32,
        height: i32,
        color_depth: i32,
    ) -> Result<(), FilterError> {
        if width <= 0 || height <= 0 {
            return Err(FilterError::InvalidSize { width, height });
        }
        if !crate::graphics::driver::SUPPORTED_COLOR_DEPTHS.contains(&color_depth) {
            return Err(FilterError::UnsupportedDepth {
                id: self.filter_id().to_string(),
                depth: color_depth,
            });
        }
        self.size = Size::new(width, height);
        Ok(())
    }

    fn real_resolution(&self) -> Size {
        Size::new(self.size.width * self.factor, self.size.height * self.factor)
    }
}

/// Construct the filter for `filter_id`.
///
/// Unknown identifiers silently select the pass-through filter; a filter
/// name that is not offered is never an error.
#[must_use]
pub fn create_filter(filter_id: &str) -> Box<dyn ScalingFilter> {
    for factor in 2..=MAX_FILTER_SCALING {
        if filter_id.eq_ignore_ascii_case(&format!("StdScale{}", factor)) {
            return Box::new(StdScaleFilter::new(factor));
        }
    }
    Box::new(NoneFilter::new())
}

/// Detect the largest integer upscale the display can show the game at.
///
/// Fullscreen consults the driver's mode catalog for uniform multiples of
/// the game size; windowed mode is bounded by the desktop instead. Returns
/// "None" when no upscale fits or the desktop size cannot be obtained.
#[must_use]
pub fn maximal_supported_scaling_filter(
    driver: &dyn GraphicsDriver,
    platform: &dyn PlatformDriver,
    game_size: Size,
    color_depth: i32,
    windowed: bool,
) -> String {
    log::info!("Detecting maximal supported scaling");

    if game_size.is_null() {
        return "None".to_string();
    }

    if !windowed {
        let selected =
            find_max_supported_uniform_multiplier(driver, game_size, color_depth, MAX_SIDEBORDERS_WIDTH);
        if selected > 1 {
            return format!("StdScale{}", selected.min(MAX_FILTER_SCALING));
        }
        return "None".to_string();
    }

    // Do not try to create a window larger than the desktop.
    match desktop_size_for_windowed_mode(platform) {
        Some(desktop) => {
            let x_ratio = desktop.width / game_size.width;
            let y_ratio = desktop.height / game_size.height;
            let selected = x_ratio.min(y_ratio).min(MAX_FILTER_SCALING);
            if selected > 1 {
                format!("StdScale{}", selected)
            } else {
                "None".to_string()
            }
        }
        None => {
            log::info!("Automatic scaling disabled (unable to obtain desktop resolution)");
            "None".to_string()
        }
    }
}

/// Resolve which filter identifier to use for this session.
#[must_use]
pub fn choose_filter_id(
    options: &Options,
    driver: &dyn GraphicsDriver,
    platform: &dyn PlatformDriver,
    game_size: Size,
    color_depth: i32,
) -> String {
    if let Some(forced) = options.forced_filter_id.as_deref() {
        if !forced.is_empty() {
            return forced.to_string();
        }
    }

    if let Some(id) = options.filter_id.as_deref() {
        if !id.is_empty() && !id.eq_ignore_ascii_case("max") {
            return id.to_string();
        }
    }

    maximal_supported_scaling_filter(driver, platform, game_size, color_depth, options.windowed)
}
