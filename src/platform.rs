//! Platform layer consumed by the graphics negotiation: desktop queries,
//! user-facing alerts, and display lifecycle notifications.

use crate::graphics::Size;

/// Vertical space left for the window frame when sizing windowed modes.
pub const WINDOW_FRAME_HEIGHT_ALLOWANCE: i32 = 32;

/// Narrow platform contract used by the graphics session.
pub trait PlatformDriver {
    /// Current desktop resolution, or `None` when it cannot be queried.
    /// Callers treat `None` as a soft failure and degrade features.
    fn get_desktop_resolution(&self) -> Option<Size>;

    /// Show a blocking message to the user.
    fn display_alert(&mut self, message: &str);

    /// Called once a display mode has been established.
    fn post_display_init(&mut self, windowed: bool);

    /// Called when the engine leaves graphics mode for good.
    fn finished_using_graphics_mode(&mut self);
}

/// Desktop size usable by a window, accounting for the frame.
#[must_use]
pub fn desktop_size_for_windowed_mode(platform: &dyn PlatformDriver) -> Option<Size> {
    platform.get_desktop_resolution().map(|desktop| {
        Size::new(desktop.width, desktop.height - WINDOW_FRAME_HEIGHT_ALLOWANCE)
    })
}

/// Platform binding for ordinary desktop builds.
#[derive(Debug, Default)]
pub struct DesktopPlatform;

impl DesktopPlatform {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl PlatformDriver for DesktopPlatform {
    #[cfg(feature = "sdl2-driver")]
    fn get_desktop_resolution(&self) -> Option<Size> {
        let video = sdl2::init().ok()?.video().ok()?;
        let mode = video.current_display_mode(0).ok()?;
        Some(Size::new(mode.w, mode.h))
    }

    #[cfg(not(feature = "sdl2-driver"))]
    fn get_desktop_resolution(&self) -> Option<Size> {
        log::debug!("No desktop query backend compiled in");
        None
    }

    fn display_alert(&mut self, message: &str) {
        log::error!("{}", message);
        eprintln!("{}", message);
    }

    fn post_display_init(&mut self, windowed: bool) {
        log::debug!(
            "Display initialized ({})",
            if windowed { "windowed" } else { "fullscreen" }
        );
    }

    fn finished_using_graphics_mode(&mut self) {
        log::debug!("Left graphics mode");
    }
}

/// Scriptable platform used by tests and headless runs: records alerts and
/// reports a configurable desktop size.
#[derive(Debug, Default)]
pub struct NullPlatform {
    pub desktop: Option<Size>,
    pub alerts: Vec<String>,
    pub post_init_calls: u32,
    pub finished_calls: u32,
}

impl NullPlatform {
    #[must_use]
    pub fn with_desktop(desktop: Size) -> Self {
        Self {
            desktop: Some(desktop),
            ..Self::default()
        }
    }
}

impl PlatformDriver for NullPlatform {
    fn get_desktop_resolution(&self) -> Option<Size> {
        self.desktop
    }

    fn display_alert(&mut self, message: &str) {
        log::error!("{}", message);
        self.alerts.push(message.to_string());
    }

    fn post_display_init(&mut self, _windowed: bool) {
        self.post_init_calls += 1;
    }

    fn finished_using_graphics_mode(&mut self) {
        self.finished_calls += 1;
    }
}
