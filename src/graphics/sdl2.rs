//!
//! SDL2-backed graphics driver.
//!
//! Binds the negotiated mode to a real window via SDL2 and feeds the mode
//! catalog from the display-mode enumeration. Compiled in behind the
//! `sdl2-driver` feature; headless builds rely on the software driver.

use std::sync::atomic::AtomicU32;
use std::sync::Arc;

use sdl2::render::Canvas;
use sdl2::video::{FullscreenType, Window};
use sdl2::{Sdl, VideoSubsystem};

use crate::graphics::bitmap::{Bitmap, DriverImage};
use crate::graphics::driver::{
    DisplayMode, DrawScreenCallback, DriverError, DriverResult, GraphicsDriver, ModeList,
    ModeRequest, NullSpriteCallback, OnInitCallback, Placement, PollingCallback, TintMethod,
};
use crate::graphics::filter::ScalingFilter;

/// Configuration id of this backend.
pub const SDL2_DRIVER_ID: &str = "SDL2";

/// Registry factory.
#[must_use]
pub fn make_driver() -> Box<dyn GraphicsDriver> {
    Box::new(Sdl2Driver::new())
}

/// Hardware-capable driver on top of SDL2.
///
/// SDL2 must be used from the main thread; the graphics session is
/// single-threaded by design, so no further synchronization is done here.
pub struct Sdl2Driver {
    sdl_context: Option<Sdl>,
    video: Option<VideoSubsystem>,
    canvas: Option<Canvas<Window>>,
    request: Option<ModeRequest>,
    timing: Option<Arc<AtomicU32>>,
    refresh_rate: Option<i32>,
    filter_id: String,
    tint_method: TintMethod,
    on_init: Option<OnInitCallback>,
    polling: Option<PollingCallback>,
    draw_screen: Option<DrawScreenCallback>,
    null_sprite: Option<NullSpriteCallback>,
    next_image_id: u64,
}

impl Sdl2Driver {
    /// Create the driver and bring up the SDL video subsystem.
    ///
    /// The subsystem is needed before `init` so the mode catalog can be
    /// enumerated while planning; failure here only disables enumeration.
    #[must_use]
    pub fn new() -> Self {
        let (sdl_context, video) = match sdl2::init() {
            Ok(context) => match context.video() {
                Ok(video) => (Some(context), Some(video)),
                Err(err) => {
                    log::warn!("SDL2 video subsystem unavailable: {}", err);
                    (Some(context), None)
                }
            },
            Err(err) => {
                log::warn!("SDL2 init failed: {}", err);
                (None, None)
            }
        };

        Self {
            sdl_context,
            video,
            canvas: None,
            request: None,
            timing: None,
            refresh_rate: None,
            filter_id: "None".to_string(),
            tint_method: TintMethod::default(),
            on_init: None,
            polling: None,
            draw_screen: None,
            null_sprite: None,
            next_image_id: 1,
        }
    }
}

impl Sdl2Driver {
    /// Whether SDL came up and the driver can actually bind a mode.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.sdl_context.is_some() && self.video.is_some()
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
    pub fn tint_method(&self) -> TintMethod {
        self.tint_method
    }

    /// Present one frame and run the frame callbacks.
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
        if let Some(canvas) = self.canvas.as_mut() {
            canvas.clear();
            canvas.present();
        }
    }

    /// Ask whether a sprite slot with no image should be skipped.
    pub fn null_sprite_skipped(&mut self, index: i32) -> bool {
        match self.null_sprite.as_mut() {
            Some(callback) => callback(index),
            None => true,
        }
    }
}

impl Default for Sdl2Driver {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsDriver for Sdl2Driver {
    fn driver_id(&self) -> &'static str {
        SDL2_DRIVER_ID
    }

    fn driver_name(&self) -> &'static str {
        "SDL2 accelerated driver"
    }

    fn init(&mut self, request: &ModeRequest, timing: Arc<AtomicU32>) -> DriverResult<()> {
        if self.request.is_some() {
            return Err(DriverError::AlreadyInitialized);
        }
        let video = self.video.as_ref().ok_or_else(|| {
            DriverError::VideoModeFailed("SDL2 video subsystem unavailable".to_string())
        })?;
        if request.screen_size.is_null() {
            return Err(DriverError::VideoModeFailed(format!(
                "degenerate screen size {}",
                request.screen_size
            )));
        }

        let title = format!("Folio Adventure Engine v{}", env!("CARGO_PKG_VERSION"));
        let mut builder = video.window(
            &title,
            request.screen_size.width as u32,
            request.screen_size.height as u32,
        );
        builder.position_centered();
        if !request.windowed {
            builder.fullscreen();
        }
        let window = builder
            .build()
            .map_err(|err| DriverError::WindowCreationFailed(err.to_string()))?;

        let mut canvas = window
            .into_canvas()
            .accelerated()
            .build()
            .map_err(|err| DriverError::RendererCreationFailed(err.to_string()))?;

        // A logical size makes SDL letterbox or stretch the game surface;
        // plain stretch fills the window without preserving the ratio.
        if request.placement != Placement::Stretch {
            canvas
                .set_logical_size(
                    request.game_size.width as u32,
                    request.game_size.height as u32,
                )
                .map_err(|err| DriverError::RendererCreationFailed(err.to_string()))?;
        }

        self.canvas = Some(canvas);
        self.timing = Some(timing);
        self.request = Some(*request);

        log::info!(
            "SDL2 driver entered {} ({}-bit)",
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
        if let Some(canvas) = self.canvas.as_mut() {
            if canvas.window().fullscreen_state() != FullscreenType::Off {
                if let Err(err) = canvas.window_mut().set_fullscreen(FullscreenType::Off) {
                    log::warn!("Leaving fullscreen failed: {}", err);
                }
            }
        }
        self.canvas = None;
        self.timing = None;
        self.request = None;
        log::info!("SDL2 driver shut down");
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.request.is_some()
    }

    fn supported_mode_list(&self, color_depth: i32) -> Option<ModeList> {
        let video = self.video.as_ref()?;
        let count = video.num_display_modes(0).ok()?;
        let mut modes = Vec::new();
        for index in 0..count {
            let Ok(mode) = video.display_mode(0, index) else {
                continue;
            };
            let depth = mode.format.byte_size_per_pixel() as i32 * 8;
            if depth == color_depth {
                modes.push(DisplayMode::new(mode.w, mode.h, depth));
            }
        }
        Some(ModeList::new(modes))
    }

    fn resolution(&self) -> DriverResult<DisplayMode> {
        let request = self.request.as_ref().ok_or(DriverError::NotInitialized)?;
        let canvas = self.canvas.as_ref().ok_or(DriverError::NotInitialized)?;
        let (width, height) = canvas.window().size();
        Ok(DisplayMode::new(
            width as i32,
            height as i32,
            request.color_depth,
        ))
    }

    fn request_refresh_rate(&mut self, hz: i32) {
        self.refresh_rate = Some(hz);
    }

    fn set_graphics_filter(&mut self, filter: &dyn ScalingFilter) {
        self.filter_id = filter.filter_id().to_string();
        let smooth = filter.filter_id().eq_ignore_ascii_case("None");
        sdl2::hint::set(
            "SDL_RENDER_SCALE_QUALITY",
            if smooth { "linear" } else { "nearest" },
        );
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
        // The renderer works with 32-bit textures regardless of mode depth.
        if bitmap.color_depth() != 32 {
            bitmap.with_color_depth(32)
        } else {
            bitmap
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
            color_depth: 32,
            opaque,
        };
        self.next_image_id += 1;
        Ok(image)
    }

    fn has_accelerated_stretch_and_flip(&self) -> bool {
        true
    }
}
