use crate::config::Layout;

use super::columns::PageGeometry;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FitMode {
    /// Already fits.
    Unchanged,
    /// Both sides multiplied by the factor.
    Scaled(f64),
    /// Geometry was unusable; only the width was clamped.
    WidthClamped,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PictureFit {
    pub width: f64,
    pub height: f64,
    pub mode: FitMode,
}

/// Largest box a picture may occupy for `layout`, in cm: the placement
/// width and the content height less the caption reservation.
pub fn picture_bounds(geometry: &PageGeometry, layout: Layout, caption_reserve: f64) -> (f64, f64) {
    (
        geometry.width_for(layout),
        geometry.content_height - caption_reserve,
    )
}

/// Uniform down-scale of `(w, h)` into `(max_w, max_h)`. Never upscales.
///
/// With a zero or non-finite dimension on either side the aspect ratio is
/// meaningless, so only the width is clamped to `max_w` and the height is
/// left as it was.
pub fn fit_picture((w, h): (f64, f64), (max_w, max_h): (f64, f64)) -> PictureFit {
    let usable = |v: f64| v.is_finite() && v > 0.0;
    if !(usable(w) && usable(h) && usable(max_w) && usable(max_h)) {
        let width = if usable(max_w) && w > max_w { max_w } else { w };
        return PictureFit {
            width,
            height: h,
            mode: FitMode::WidthClamped,
        };
    }

    let scale = (max_w / w).min(max_h / h).min(1.0);
    if scale < 1.0 {
        PictureFit {
            width: w * scale,
            height: h * scale,
            mode: FitMode::Scaled(scale),
        }
    } else {
        PictureFit {
            width: w,
            height: h,
            mode: FitMode::Unchanged,
        }
    }
}
