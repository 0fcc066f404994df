//!
//! Headless software framebuffer driver.
//!
//! The baseline compatibility backend: always available, runs palette
//! games, and is the forced retry target when an accelerated backend fails
//! to negotiate a mode. Fullscreen requests must match its mode catalog;
//! windowed requests accept any sane size.

use std::sync::atomic::AtomicU32;
use std::sync::Arc;

use crate::graphics::bitmap::{Bitmap, DriverImage};
use crate::graphics::driver::{
    DisplayMode, DrawScreenCallback, DriverError, DriverResult, GraphicsDriver, ModeList,
    ModeRequest, NullSpriteCallback, OnInitCallback, PollingCallback, TintMethod,
    SUPPORTED_COLOR_DEPTHS,
};
use crate::graphics::filter::ScalingFilter;
use crate::graphics::Size;

/// Smallest window this backend will open.
const MIN_WINDOW_SIZE: Size = Size::new(128, 128);

/// Classic mode table offered at every supported depth.
const STANDARD_MODE_SIZES: [(i32, i32); 12] = [
    (320, 200),
    (320, 240),
    (640, 400),
    (640, 480),
    (800, 600),
    (960, 720),
    (1024, 768),
    (1280, 720),
    (1280, 960),
    (1280, 1024),
    (1600, 1200),
    (1920, 1080),
];

/// Software rendering driver with an in-memory framebuffer.
pub struct SoftwareDriver {
    catalog: Vec<DisplayMode>,
    request: Option<ModeRequest>,
    framebuffer: Option<Vec<u8>>,
    timing: Option<Arc<AtomicU32>>,
    refresh_rate: Option<i32>,
    filter_id: String,
    filtered_size: Size,
    tint_method: TintMethod,
    on_init: Option<OnInitCallback>,
    polling: Option<PollingCallback>,
    draw_screen: Option<DrawScreenCallback>,
    null_sprite: Option<NullSpriteCallback>,
    next_image_id: u64,
}

impl SoftwareDriver {
    /// Configuration id of this backend.
    pub const ID: &'static str = "Soft";

    /// Driver with the standard classic mode catalog.
    #[must_use]
    pub fn new() -> Self {
        let mut catalog = Vec::new();
        for depth in SUPPORTED_COLOR_DEPTHS {
            for (width, height) in STANDARD_MODE_SIZES {
                catalog.push(DisplayMode::new(width, height, depth));
            }
        }
        Self::with_mode_catalog(catalog)
    }

    /// Driver restricted to an explicit mode catalog.
    #[must_use]
    pub fn with_mode_catalog(catalog: Vec<DisplayMode>) -> Self {
        Self {
            catalog,
            request: None,
            framebuffer: None,
            timing: None,
            refresh_rate: None,
            filter_id: "None".to_string(),
            filtered_size: Size::default(),
            tint_method: TintMethod::default(),
            on_init: None,
            polling: None,
            draw_screen: None,
            null_sprite: None,
            next_image_id: 1,
        }
    }

    #[must_use]
    pub fn refresh_rate(&self) -> Option<i32> {
        self.refresh_rate
    }

    #[must_use]
    pub fn filter_id(&self) -> &str {
        &self.filter_id
    }

    #[must_use]
    pub fn filtered_size(&self) -> Size {
        self.filtered_size
    }

    #[must_use]
    pub fn tint_method(&self) -> TintMethod {
        self.tint_method
    }

    /// Advance one frame: bump the shared timer and run the frame callbacks.
    pub fn present_frame(&mut self) {
        if let Some(timing) = &self.timing {
            timing.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        }
        if let Some(polling) = self.polling.as_mut() {
            polling();
        }
        if let Some(draw) = self.draw_screen.as_mut() {
            draw();
        }
    }

    /// Ask whether a sprite slot with no image should be skipped.
    pub fn null_sprite_skipped(&mut self, index: i32) -> bool {
        match self.null_sprite.as_mut() {
            Some(callback) => callback(index),
            None => true,
        }
    }

    fn mode_in_catalog(&self, size: Size, color_depth: i32) -> bool {
        self.catalog.iter().any(|mode| {
            mode.width == size.width && mode.height == size.height && mode.color_depth == color_depth
        })
    }
}

impl Default for SoftwareDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsDriver for SoftwareDriver {
    fn driver_id(&self) -> &'static str {
        Self::ID
    }

    fn driver_name(&self) -> &'static str {
        "Software framebuffer driver"
    }

    fn init(&mut self, request: &ModeRequest, timing: Arc<AtomicU32>) -> DriverResult<()> {
        if self.request.is_some() {
            return Err(DriverError::AlreadyInitialized);
        }
        if request.screen_size.is_null() {
            return Err(DriverError::VideoModeFailed(format!(
                "degenerate screen size {}",
                request.screen_size
            )));
        }
        if !SUPPORTED_COLOR_DEPTHS.contains(&request.color_depth) {
            return Err(DriverError::VideoModeFailed(format!(
                "unsupported color depth {}",
                request.color_depth
            )));
        }
        if request.windowed {
            // Window sizes are not cataloged, but stay within the
            // generally supported limits.
            if request.screen_size.width < MIN_WINDOW_SIZE.width
                || request.screen_size.height < MIN_WINDOW_SIZE.height
            {
                return Err(DriverError::VideoModeFailed(format!(
                    "window {} below the supported minimum {}",
                    request.screen_size, MIN_WINDOW_SIZE
                )));
            }
        } else if !self.mode_in_catalog(request.screen_size, request.color_depth) {
            return Err(DriverError::VideoModeFailed(format!(
                "no fullscreen mode {} at {}-bit",
                request.screen_size, request.color_depth
            )));
        }

        let bytes_per_pixel = ((request.color_depth + 7) / 8).max(1) as usize;
        let buffer_len = request.screen_size.width as usize
            * request.screen_size.height as usize
            * bytes_per_pixel;
        self.framebuffer = Some(vec![0u8; buffer_len]);
        self.timing = Some(timing);
        self.request = Some(*request);

        log::info!(
            "Software driver entered {} ({}-bit)",
            request.screen_size,
            request.color_depth
        );

        let achieved = DisplayMode::new(
            request.screen_size.width,
            request.screen_size.height,
            request.color_depth,
        );
        if let Some(callback) = self.on_init.as_mut() {
            callback(&achieved);
        }
        Ok(())
    }

    fn uninit(&mut self) -> DriverResult<()> {
        if self.request.is_none() {
            return Err(DriverError::NotInitialized);
        }
        self.framebuffer = None;
        self.timing = None;
        self.request = None;
        log::info!("Software driver shut down");
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.request.is_some()
    }

    fn supported_mode_list(&self, color_depth: i32) -> Option<ModeList> {
        let modes: Vec<DisplayMode> = self
            .catalog
            .iter()
            .copied()
            .filter(|mode| mode.color_depth == color_depth)
            .collect();
        Some(ModeList::new(modes))
    }

    fn resolution(&self) -> DriverResult<DisplayMode> {
        let request = self.request.as_ref().ok_or(DriverError::NotInitialized)?;
        Ok(DisplayMode::new(
            request.screen_size.width,
            request.screen_size.height,
            request.color_depth,
        ))
    }

    fn request_refresh_rate(&mut self, hz: i32) {
        self.refresh_rate = Some(hz);
    }

    fn set_graphics_filter(&mut self, filter: &dyn ScalingFilter) {
        self.filter_id = filter.filter_id().to_string();
        self.filtered_size = filter.real_resolution();
    }

    fn set_tint_method(&mut self, method: TintMethod) {
        self.tint_method = method;
    }

    fn set_callback_on_init(&mut self, callback: OnInitCallback) {
        self.on_init = Some(callback);
    }

    fn set_callback_for_polling(&mut self, callback: PollingCallback) {
        self.polling = Some(callback);
    }

    fn set_callback_to_draw_screen(&mut self, callback: DrawScreenCallback) {
        self.draw_screen = Some(callback);
    }

    fn set_callback_for_null_sprite(&mut self, callback: NullSpriteCallback) {
        self.null_sprite = Some(callback);
    }

    fn convert_bitmap_to_supported_depth(&self, bitmap: Bitmap) -> Bitmap {
        match self.request.as_ref() {
            Some(request) if bitmap.color_depth() != request.color_depth => {
                bitmap.with_color_depth(request.color_depth)
            }
            _ => bitmap,
        }
    }

    fn create_image_from_bitmap(
        &mut self,
        bitmap: &Bitmap,
        _has_alpha: bool,
        opaque: bool,
    ) -> DriverResult<DriverImage> {
        if self.request.is_none() {
            return Err(DriverError::NotInitialized);
        }
        let image = DriverImage {
            id: self.next_image_id,
            width: bitmap.width(),
            height: bitmap.height(),
            color_depth: bitmap.color_depth(),
            opaque,
        };
        self.next_image_id += 1;
        Ok(image)
    }

    fn has_accelerated_stretch_and_flip(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::driver::Placement;

    fn request(size: Size, depth: i32, windowed: bool) -> ModeRequest {
        ModeRequest {
            game_size: Size::new(320, 200),
            screen_size: size,
            placement: Placement::Center,
            color_depth: depth,
            windowed,
        }
    }

    fn timing() -> Arc<AtomicU32> {
        Arc::new(AtomicU32::new(0))
    }

    #[test]
    fn test_fullscreen_init_requires_cataloged_mode() {
        let mut driver = SoftwareDriver::new();
        let err = driver
            .init(&request(Size::new(777, 333), 32, false), timing())
            .unwrap_err();
        assert!(matches!(err, DriverError::VideoModeFailed(_)));
        assert!(!driver.is_initialized());

        driver
            .init(&request(Size::new(640, 480), 32, false), timing())
            .unwrap();
        assert!(driver.is_initialized());
        assert_eq!(driver.resolution().unwrap(), DisplayMode::new(640, 480, 32));
    }

    #[test]
    fn test_windowed_init_accepts_uncataloged_size() {
        let mut driver = SoftwareDriver::new();
        driver
            .init(&request(Size::new(777, 333), 32, true), timing())
            .unwrap();
        assert_eq!(driver.resolution().unwrap(), DisplayMode::new(777, 333, 32));
    }

    #[test]
    fn test_windowed_init_rejects_tiny_window() {
        let mut driver = SoftwareDriver::new();
        let err = driver
            .init(&request(Size::new(64, 40), 32, true), timing())
            .unwrap_err();
        assert!(matches!(err, DriverError::VideoModeFailed(_)));
    }

    #[test]
    fn test_double_init_rejected() {
        let mut driver = SoftwareDriver::new();
        driver
            .init(&request(Size::new(640, 480), 32, false), timing())
            .unwrap();
        let err = driver
            .init(&request(Size::new(640, 480), 32, false), timing())
            .unwrap_err();
        assert_eq!(err, DriverError::AlreadyInitialized);
    }

    #[test]
    fn test_uninit_requires_init() {
        let mut driver = SoftwareDriver::new();
        assert_eq!(driver.uninit().unwrap_err(), DriverError::NotInitialized);

        driver
            .init(&request(Size::new(640, 480), 8, false), timing())
            .unwrap();
        driver.uninit().unwrap();
        assert!(!driver.is_initialized());
    }

    #[test]
    fn test_mode_list_filters_by_depth() {
        let driver = SoftwareDriver::with_mode_catalog(vec![
            DisplayMode::new(640, 480, 8),
            DisplayMode::new(640, 480, 32),
        ]);
        let modes = driver.supported_mode_list(8).unwrap();
        assert_eq!(modes.count(), 1);
        assert_eq!(modes.get_mode(0), Some(DisplayMode::new(640, 480, 8)));
    }

    #[test]
    fn test_unsupported_depth_rejected() {
        let mut driver = SoftwareDriver::new();
        let err = driver
            .init(&request(Size::new(640, 480), 12, false), timing())
            .unwrap_err();
        assert!(matches!(err, DriverError::VideoModeFailed(_)));
    }

    #[test]
    fn test_image_creation_needs_graphics_mode() {
        let mut driver = SoftwareDriver::new();
        let blank = Bitmap::new(16, 16, 32);
        assert!(driver.create_image_from_bitmap(&blank, false, true).is_err());

        driver
            .init(&request(Size::new(640, 480), 32, false), timing())
            .unwrap();
        let first = driver.create_image_from_bitmap(&blank, false, true).unwrap();
        let second = driver.create_image_from_bitmap(&blank, false, true).unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(first.width, 16);
        assert!(first.opaque);
    }

    #[test]
    fn test_bitmap_conversion_targets_mode_depth() {
        let mut driver = SoftwareDriver::new();
        driver
            .init(&request(Size::new(640, 480), 16, false), timing())
            .unwrap();
        let converted = driver.convert_bitmap_to_supported_depth(Bitmap::new(16, 16, 32));
        assert_eq!(converted.color_depth(), 16);
    }

    #[test]
    fn test_present_frame_advances_timer_and_callbacks() {
        use std::sync::atomic::{AtomicU32, Ordering};

        let mut driver = SoftwareDriver::new();
        let drawn = Arc::new(AtomicU32::new(0));
        let drawn_in_callback = Arc::clone(&drawn);
        driver.set_callback_to_draw_screen(Box::new(move || {
            drawn_in_callback.fetch_add(1, Ordering::Relaxed);
        }));
        driver.set_callback_for_null_sprite(Box::new(|index| index < 0));

        let shared_timer = timing();
        driver
            .init(&request(Size::new(640, 480), 32, false), Arc::clone(&shared_timer))
            .unwrap();
        driver.present_frame();
        driver.present_frame();

        assert_eq!(shared_timer.load(std::sync::atomic::Ordering::Relaxed), 2);
        assert_eq!(drawn.load(Ordering::Relaxed), 2);
        assert!(driver.null_sprite_skipped(-1));
        assert!(!driver.null_sprite_skipped(3));
    }

    #[test]
    fn test_on_init_callback_sees_achieved_mode() {
        use std::sync::atomic::{AtomicI32, Ordering};

        let seen = Arc::new(AtomicI32::new(0));
        let seen_in_callback = Arc::clone(&seen);
        let mut driver = SoftwareDriver::new();
        driver.set_callback_on_init(Box::new(move |mode| {
            seen_in_callback.store(mode.width, Ordering::Relaxed);
        }));
        driver
            .init(&request(Size::new(800, 600), 32, false), timing())
            .unwrap();
        assert_eq!(seen.load(Ordering::Relaxed), 800);
    }
}
