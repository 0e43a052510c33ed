use jats_layout::config::{Layout, LayoutConfig, PageAttributes};
use jats_layout::layout::{FitMode, PageGeometry, fit_picture, picture_bounds};

#[test]
fn oversized_picture_scales_uniformly() {
    let fit = fit_picture((4000.0, 3000.0), (2000.0, 4000.0));
    assert_eq!(fit.mode, FitMode::Scaled(0.5));
    assert_eq!((fit.width, fit.height), (2000.0, 1500.0));
}

#[test]
fn height_bound_can_be_the_limiting_side() {
    let fit = fit_picture((1000.0, 4000.0), (2000.0, 2000.0));
    assert_eq!(fit.mode, FitMode::Scaled(0.5));
    assert_eq!((fit.width, fit.height), (500.0, 2000.0));
}

#[test]
fn never_upscales() {
    let fit = fit_picture((100.0, 50.0), (2000.0, 4000.0));
    assert_eq!(fit.mode, FitMode::Unchanged);
    assert_eq!((fit.width, fit.height), (100.0, 50.0));
}

#[test]
fn exact_fit_is_unchanged() {
    let fit = fit_picture((2000.0, 1000.0), (2000.0, 1000.0));
    assert_eq!(fit.mode, FitMode::Unchanged);
}

#[test]
fn zero_height_clamps_width_only() {
    let fit = fit_picture((5000.0, 0.0), (2000.0, 4000.0));
    assert_eq!(fit.mode, FitMode::WidthClamped);
    assert_eq!((fit.width, fit.height), (2000.0, 0.0));
}

#[test]
fn unusable_height_bound_clamps_width_and_keeps_height() {
    let fit = fit_picture((5000.0, 3000.0), (2000.0, -1.0));
    assert_eq!(fit.mode, FitMode::WidthClamped);
    assert_eq!((fit.width, fit.height), (2000.0, 3000.0));

    let narrow_enough = fit_picture((1500.0, 3000.0), (2000.0, f64::NAN));
    assert_eq!((narrow_enough.width, narrow_enough.height), (1500.0, 3000.0));
}

#[test]
fn bounds_reserve_room_for_the_caption() {
    let attrs = PageAttributes::default();
    let config = LayoutConfig::default();
    let geometry = PageGeometry::new(&attrs, &config);

    let (w, h) = picture_bounds(&geometry, Layout::Narrow, 3.0);
    assert_eq!(w, geometry.narrow_width());
    assert!((h - (29.7 - 4.0 - 3.0)).abs() < 1e-9);

    let (w, _) = picture_bounds(&geometry, Layout::Wide, 3.0);
    assert_eq!(w, geometry.content_width);
}
