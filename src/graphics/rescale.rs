//!
//! Legacy-data coordinate rescaling.
//!
//! Older game files store coordinates in low-resolution units; when such a
//! game runs at a higher native resolution every stored coordinate is
//! multiplied up on load. Data from the native-coordinate format era is
//! left untouched.

use crate::game::GameDescriptor;

/// First game-file version whose data is stored in native coordinates.
pub const NATIVE_COORD_FILE_VERSION: i32 = 37;

/// Upscale factor between the stored coordinate unit and the native
/// game surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinateScale {
    multiplier: i32,
}

impl CoordinateScale {
    #[must_use]
    pub fn new(multiplier: i32) -> Self {
        Self {
            multiplier: multiplier.max(1),
        }
    }

    #[must_use]
    pub const fn multiplier(&self) -> i32 {
        self.multiplier
    }

    #[must_use]
    pub const fn multiply_up(&self, coord: i32) -> i32 {
        coord * self.multiplier
    }
}

/// Bring one stored size/coordinate up to native units.
///
/// File versions at or past the native-coordinate era are returned
/// unchanged.
#[must_use]
pub fn adjust_pixel_size_for_loaded_data(
    size: i32,
    file_version: i32,
    scale: CoordinateScale,
) -> i32 {
    if file_version < NATIVE_COORD_FILE_VERSION {
        scale.multiply_up(size)
    } else {
        size
    }
}

fn adjust_pixel_sizes_for_loaded_data(
    x: &mut i32,
    y: &mut i32,
    file_version: i32,
    scale: CoordinateScale,
) {
    *x = adjust_pixel_size_for_loaded_data(*x, file_version, scale);
    *y = adjust_pixel_size_for_loaded_data(*y, file_version, scale);
}

/// Rescale every legacy coordinate table in the game data to native units.
///
/// Covers cursor hotspots, inventory item hotspots, GUI geometry and
/// controls. For data from the native-coordinate era authored with native
/// coordinates off, hi-res games additionally halve character positions and
/// inventory display sizes, compensating for a historical scaling mismatch.
pub fn adjust_sizes_for_resolution(
    game: &mut GameDescriptor,
    file_version: i32,
    base_width: i32,
    scale: CoordinateScale,
) {
    for cursor in &mut game.cursors {
        cursor.hot_x = adjust_pixel_size_for_loaded_data(cursor.hot_x, file_version, scale);
        cursor.hot_y = adjust_pixel_size_for_loaded_data(cursor.hot_y, file_version, scale);
    }

    for item in &mut game.inventory_items {
        adjust_pixel_sizes_for_loaded_data(&mut item.hot_x, &mut item.hot_y, file_version, scale);
    }

    for gui in &mut game.guis {
        adjust_pixel_sizes_for_loaded_data(&mut gui.x, &mut gui.y, file_version, scale);
        if gui.width < 1 {
            gui.width = 1;
        }
        if gui.height < 1 {
            gui.height = 1;
        }
        // Temp fix for older games
        if gui.width == base_width - 1 {
            gui.width = base_width;
        }
        adjust_pixel_sizes_for_loaded_data(&mut gui.width, &mut gui.height, file_version, scale);
        gui.popup_y = adjust_pixel_size_for_loaded_data(gui.popup_y, file_version, scale);

        for control in &mut gui.controls {
            adjust_pixel_sizes_for_loaded_data(
                &mut control.x,
                &mut control.y,
                file_version,
                scale,
            );
            adjust_pixel_sizes_for_loaded_data(
                &mut control.width,
                &mut control.height,
                file_version,
                scale,
            );
            control.activated = false;
        }
    }

    if file_version >= NATIVE_COORD_FILE_VERSION && !game.native_coordinates && game.is_hi_res() {
        // Native-era file with native coordinates off: positions were
        // authored at half scale.
        for character in &mut game.characters {
            character.x /= 2;
            character.y /= 2;
        }
        for window in &mut game.inventory_windows {
            window.item_width /= 2;
            window.item_height /= 2;
        }
    }
}
