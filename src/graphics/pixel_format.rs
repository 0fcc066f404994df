//!
//! Pixel-channel layout bookkeeping.
//!
//! Sprite data is stored with fixed per-depth channel shifts; after a mode
//! switch the shifts are recomputed for the achieved color depth, covering
//! historical hardware quirks: 16-bit surfaces laid out as BGR, and cards
//! that report 16-bit while actually running 5-5-5.

/// Platform flavors with distinct native channel orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlatformKind {
    /// Ordinary desktop targets: RGB layouts throughout.
    #[default]
    Desktop,
    /// Handheld/mobile targets with swapped blue/red in 15/16-bit modes.
    MobileBgr,
}

/// Channel bit shifts per supported depth, plus conversion state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelFormat {
    pub r_shift_32: i32,
    pub g_shift_32: i32,
    pub b_shift_32: i32,
    pub r_shift_16: i32,
    pub g_shift_16: i32,
    pub b_shift_16: i32,
    pub r_shift_15: i32,
    pub g_shift_15: i32,
    pub b_shift_15: i32,
    /// Bits dropped per channel when packing into 16-bit.
    pub places_r: i32,
    pub places_g: i32,
    pub places_b: i32,
    /// Set when 16-bit sprite data must be byte-swapped for the surface.
    pub convert_16bit_bgr: bool,
}

impl PixelFormat {
    /// Default shifts for how sprite data is stored on the given platform.
    #[must_use]
    pub fn defaults_for(platform: PlatformKind) -> Self {
        let mut format = Self {
            r_shift_32: 16,
            g_shift_32: 8,
            b_shift_32: 0,
            r_shift_16: 11,
            g_shift_16: 5,
            b_shift_16: 0,
            r_shift_15: 10,
            g_shift_15: 5,
            b_shift_15: 0,
            places_r: 3,
            places_g: 2,
            places_b: 3,
            convert_16bit_bgr: false,
        };
        if platform == PlatformKind::MobileBgr {
            // Blue and red swap places in the packed 15/16-bit layouts.
            format.b_shift_16 = 11;
            format.g_shift_16 = 5;
            format.r_shift_16 = 0;
            format.b_shift_15 = 10;
            format.g_shift_15 = 5;
            format.r_shift_15 = 0;
        }
        format
    }

    /// Recompute the shifts for the achieved display depth.
    pub fn prepare_for_depth(&mut self, color_depth: i32, platform: PlatformKind) {
        // Most cards do 5-6-5 RGB, the format sprite files are saved in.
        // Some do 5-6-5 BGR or report 16-bit while running 5-5-5; detect
        // both before the shifts are normalized below.
        if color_depth == 16 && (self.b_shift_16 != 0 || self.r_shift_16 != 11) {
            self.convert_16bit_bgr = true;
            if self.r_shift_16 == 10 {
                self.places_r = 3;
                self.places_g = 3;
            }
        }

        if color_depth > 16 {
            match platform {
                PlatformKind::MobileBgr => {
                    self.b_shift_16 = 0;
                    self.g_shift_16 = 5;
                    self.r_shift_16 = 11;
                    self.b_shift_15 = 0;
                    self.g_shift_15 = 5;
                    self.r_shift_15 = 10;
                    self.r_shift_32 = 0;
                    self.g_shift_32 = 8;
                    self.b_shift_32 = 16;
                }
                PlatformKind::Desktop => {
                    self.r_shift_16 = 11;
                    self.g_shift_16 = 5;
                    self.b_shift_16 = 0;
                }
            }
        } else if color_depth == 16 {
            match platform {
                PlatformKind::MobileBgr => {
                    self.r_shift_32 = 0;
                    self.g_shift_32 = 8;
                    self.b_shift_32 = 16;
                    self.b_shift_15 = 0;
                    self.g_shift_15 = 5;
                    self.r_shift_15 = 10;
                }
                PlatformKind::Desktop => {
                    self.r_shift_32 = 16;
                    self.g_shift_32 = 8;
                    self.b_shift_32 = 0;
                }
            }
        } else {
            match platform {
                PlatformKind::Desktop => {
                    self.r_shift_32 = 16;
                    self.g_shift_32 = 8;
                    self.b_shift_32 = 0;
                }
                PlatformKind::MobileBgr => {
                    self.r_shift_32 = 0;
                    self.g_shift_32 = 8;
                    self.b_shift_32 = 16;
                    self.b_shift_15 = 0;
                    self.g_shift_15 = 5;
                    self.r_shift_15 = 10;
                }
            }
        }
    }
}

impl Default for PixelFormat {
    fn default() -> Self {
        Self::defaults_for(PlatformKind::Desktop)
    }
}

/// Policy flags for converting loaded images to the display depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColorConversionFlags(u32);

impl ColorConversionFlags {
    pub const EXPAND_256: u32 = 1 << 0;
    pub const REDUCE_16_TO_15: u32 = 1 << 1;
    pub const MOST: u32 = 1 << 2;

    #[must_use]
    pub const fn new(flags: u32) -> Self {
        Self(flags)
    }

    /// The policy applied after every successful mode switch.
    #[must_use]
    pub const fn standard() -> Self {
        Self::new(Self::MOST | Self::EXPAND_256 | Self::REDUCE_16_TO_15)
    }

    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn contains(self, flag: u32) -> bool {
        (self.0 & flag) == flag
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_desktop_defaults_are_565_rgb() {
        let format = PixelFormat::defaults_for(PlatformKind::Desktop);
        assert_eq!(
            (format.r_shift_16, format.g_shift_16, format.b_shift_16),
            (11, 5, 0)
        );
        assert_eq!((format.r_shift_32, format.g_shift_32, format.b_shift_32), (16, 8, 0));
        assert!(!format.convert_16bit_bgr);
    }

    #[test]
    fn test_mobile_defaults_swap_blue_red() {
        let format = PixelFormat::defaults_for(PlatformKind::MobileBgr);
        assert_eq!(
            (format.r_shift_16, format.g_shift_16, format.b_shift_16),
            (0, 5, 11)
        );
        assert_eq!(
            (format.r_shift_15, format.g_shift_15, format.b_shift_15),
            (0, 5, 10)
        );
    }

    #[test]
    fn test_desktop_16_bit_needs_no_conversion() {
        let mut format = PixelFormat::defaults_for(PlatformKind::Desktop);
        format.prepare_for_depth(16, PlatformKind::Desktop);
        assert!(!format.convert_16bit_bgr);
        assert_eq!((format.r_shift_32, format.g_shift_32, format.b_shift_32), (16, 8, 0));
    }

    #[test]
    fn test_mobile_16_bit_flags_bgr_conversion() {
        let mut format = PixelFormat::defaults_for(PlatformKind::MobileBgr);
        format.prepare_for_depth(16, PlatformKind::MobileBgr);
        assert!(format.convert_16bit_bgr);
        assert_eq!((format.r_shift_32, format.g_shift_32, format.b_shift_32), (0, 8, 16));
    }

    #[test]
    fn test_15_bit_reported_as_16_widens_places() {
        let mut format = PixelFormat::defaults_for(PlatformKind::Desktop);
        // A card running 5-5-5 while claiming 16-bit.
        format.r_shift_16 = 10;
        format.prepare_for_depth(16, PlatformKind::Desktop);
        assert!(format.convert_16bit_bgr);
        assert_eq!(format.places_r, 3);
        assert_eq!(format.places_g, 3);
    }

    #[test]
    fn test_truecolor_normalizes_16_bit_shifts() {
        let mut format = PixelFormat::defaults_for(PlatformKind::MobileBgr);
        format.prepare_for_depth(32, PlatformKind::MobileBgr);
        assert_eq!(
            (format.r_shift_16, format.g_shift_16, format.b_shift_16),
            (11, 5, 0)
        );
        assert_eq!((format.r_shift_32, format.g_shift_32, format.b_shift_32), (0, 8, 16));
    }

    #[test]
    fn test_standard_conversion_policy() {
        let flags = ColorConversionFlags::standard();
        assert!(flags.contains(ColorConversionFlags::MOST));
        assert!(flags.contains(ColorConversionFlags::EXPAND_256));
        assert!(flags.contains(ColorConversionFlags::REDUCE_16_TO_15));
    }
}
