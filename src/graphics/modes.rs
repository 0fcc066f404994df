//!
//! Display-mode catalog queries: nearest-match search and integer-upscale
//! detection over a driver's supported mode list.

use crate::graphics::driver::{GraphicsDriver, ModeList};
use crate::graphics::Size;

/// Aspect ratio as a fixed-point value, avoiding float comparison.
fn fixed_point_ratio(size: Size) -> i32 {
    (size.height << 10) / size.width
}

/// Find the supported mode closest to `wanted` at the given color depth.
///
/// With a `ratio_reference`, only modes of that aspect ratio are considered.
/// Unless `ignore_given_size`, an exact match wins immediately. Returns
/// `None` when the driver cannot enumerate modes or offers nothing at the
/// requested depth; the caller keeps its original size in that case.
#[must_use]
pub fn find_nearest_supported_mode(
    driver: &dyn GraphicsDriver,
    wanted: Size,
    color_depth: i32,
    ratio_reference: Option<Size>,
    ignore_given_size: bool,
) -> Option<Size> {
    let Some(modes) = driver.supported_mode_list(color_depth) else {
        log::info!("Couldn't get a list of supported resolutions");
        return None;
    };
    nearest_mode_in_list(&modes, wanted, color_depth, ratio_reference, ignore_given_size)
}

fn nearest_mode_in_list(
    modes: &ModeList,
    wanted: Size,
    color_depth: i32,
    ratio_reference: Option<Size>,
    ignore_given_size: bool,
) -> Option<Size> {
    let wanted_ratio = ratio_reference
        .filter(|reference| reference.width > 0)
        .map(fixed_point_ratio);

    // Best candidate so far with its per-axis distances from the request.
    let mut nearest: Option<(Size, i32, i32)> = None;

    for index in 0..modes.count() {
        let Some(mode) = modes.get_mode(index) else {
            continue;
        };
        if mode.color_depth != color_depth || mode.width <= 0 {
            continue;
        }
        if let Some(ratio) = wanted_ratio {
            if fixed_point_ratio(mode.size()) != ratio {
                continue;
            }
        }
        if !ignore_given_size && mode.width == wanted.width && mode.height == wanted.height {
            return Some(wanted);
        }

        let diff_w = (wanted.width - mode.width).abs();
        let diff_h = (wanted.height - mode.height).abs();
        let better = match nearest {
            None => true,
            Some((best, best_diff_w, best_diff_h)) => {
                // On a tied distance, prefer the larger dimension: spare
                // screen space over a cropped one.
                let width_improves =
                    diff_w < best_diff_w || (diff_w == best_diff_w && mode.width > best.width);
                let height_improves =
                    diff_h < best_diff_h || (diff_h == best_diff_h && mode.height > best.height);
                (width_improves && diff_h <= best_diff_h)
                    || (height_improves && diff_w <= best_diff_w)
            }
        };
        if better {
            nearest = Some((mode.size(), diff_w, diff_h));
        }
    }

    match nearest {
        Some((size, _, _)) => Some(size),
        None => {
            log::info!("Couldn't find an acceptable supported resolution");
            None
        }
    }
}

/// Find the largest integer factor by which `base_size` can be uniformly
/// upscaled into a supported mode at the given depth.
///
/// A mode qualifies when both its dimensions are the same integer multiple
/// of the base size, with the leftover width (side borders) within
/// `width_range_allowed` pixels divided by the multiplier. Returns 0 when
/// nothing qualifies.
#[must_use]
pub fn find_max_supported_uniform_multiplier(
    driver: &dyn GraphicsDriver,
    base_size: Size,
    color_depth: i32,
    width_range_allowed: i32,
) -> i32 {
    let Some(modes) = driver.supported_mode_list(color_depth) else {
        log::info!("Couldn't get a list of supported resolutions");
        return 0;
    };
    max_uniform_multiplier_in_list(&modes, base_size, color_depth, width_range_allowed)
}

fn max_uniform_multiplier_in_list(
    modes: &ModeList,
    base_size: Size,
    color_depth: i32,
    width_range_allowed: i32,
) -> i32 {
    if base_size.is_null() {
        return 0;
    }
    let mut best_multiplier = 0;

    for index in 0..modes.count() {
        let Some(mode) = modes.get_mode(index) else {
            continue;
        };
        if mode.color_depth != color_depth {
            continue;
        }

        if mode.width > base_size.width
            && mode.height > base_size.height
            && mode.height % base_size.height == 0
        {
            let multiplier_x = mode.width / base_size.width;
            let remainder_x = mode.width % base_size.width;
            let multiplier_y = mode.height / base_size.height;
            if multiplier_x == multiplier_y
                && remainder_x / multiplier_x <= width_range_allowed
                && multiplier_x > best_multiplier
            {
                best_multiplier = multiplier_x;
            }
        }
    }

    if best_multiplier == 0 {
        log::info!("Couldn't find an acceptable supported resolution");
    }
    best_multiplier
}
