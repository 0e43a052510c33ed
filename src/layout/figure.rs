//! Wide-or-narrow placement for figures.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::assets::{AssetResolver, DocumentContext, locate};
use crate::config::{Layout, LayoutConfig};
use crate::error::{Warning, Warnings};
use crate::image_info::{ImageInfo, ImageProbe};
use crate::spec::FigureSpec;
use crate::units::CM_PER_INCH;

use super::columns::PageGeometry;

/// Layout decisions keyed by spec identity ([`FigureSpec::key`],
/// [`crate::spec::TableSpec::key`]). Lives for one document.
#[derive(Debug, Default)]
pub struct LayoutCache {
    decisions: HashMap<String, Layout>,
}

impl LayoutCache {
    pub fn get(&self, key: &str) -> Option<Layout> {
        self.decisions.get(key).copied()
    }

    pub fn insert(&mut self, key: String, layout: Layout) {
        self.decisions.insert(key, layout);
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }
}

/// Resolution of an image in dots per inch: explicit DPI first, then JFIF
/// density, then `default_dpi`.
pub fn infer_dpi(info: &ImageInfo, default_dpi: f64) -> f64 {
    info.density().map_or(default_dpi, |(x, _)| x)
}

/// Printed width in cm of `pixel_width` pixels at `dpi`.
pub fn natural_width(pixel_width: u32, dpi: f64) -> f64 {
    pixel_width as f64 / dpi * CM_PER_INCH
}

pub struct FigureLayoutResolver<'a> {
    geometry: PageGeometry,
    config: &'a LayoutConfig,
    assets: &'a dyn AssetResolver,
    probe: &'a dyn ImageProbe,
    ctx: &'a DocumentContext,
}

impl<'a> FigureLayoutResolver<'a> {
    pub fn new(
        geometry: PageGeometry,
        config: &'a LayoutConfig,
        assets: &'a dyn AssetResolver,
        probe: &'a dyn ImageProbe,
        ctx: &'a DocumentContext,
    ) -> Self {
        Self {
            geometry,
            config,
            assets,
            probe,
            ctx,
        }
    }

    /// Explicit layout wins; otherwise a decision cached for this figure is
    /// reused; otherwise the image is located, measured and the result
    /// cached. Unmeasurable images go wide.
    pub fn resolve(
        &self,
        spec: &FigureSpec,
        cache: &mut LayoutCache,
        warnings: &mut Warnings,
    ) -> Layout {
        self.resolve_with(spec, cache, warnings, || {
            locate(self.assets, &spec.image_ref, self.ctx)
        })
    }

    /// Same as [`resolve`](Self::resolve) for an image the caller already
    /// located; `asset` is `None` when it could not be.
    pub fn resolve_located(
        &self,
        spec: &FigureSpec,
        asset: Option<&Path>,
        cache: &mut LayoutCache,
        warnings: &mut Warnings,
    ) -> Layout {
        self.resolve_with(spec, cache, warnings, || asset.map(Path::to_path_buf))
    }

    fn resolve_with(
        &self,
        spec: &FigureSpec,
        cache: &mut LayoutCache,
        warnings: &mut Warnings,
        asset: impl FnOnce() -> Option<PathBuf>,
    ) -> Layout {
        if let Some(layout) = spec.layout {
            return layout;
        }
        let key = spec.key();
        if let Some(layout) = cache.get(&key) {
            return layout;
        }
        let layout = self.measure(spec, asset(), warnings);
        log::debug!("{}: resolved {} placement", spec.display_name(), layout.as_str());
        cache.insert(key, layout);
        layout
    }

    fn measure(
        &self,
        spec: &FigureSpec,
        asset: Option<PathBuf>,
        warnings: &mut Warnings,
    ) -> Layout {
        let threshold = spec
            .threshold
            .filter(|t| t.is_finite() && *t > 0.0)
            .unwrap_or(self.config.wide_threshold);

        let Some(path) = asset else {
            warnings.push(Warning::AssetUnresolved {
                href: spec.image_ref.clone(),
            });
            return Layout::Wide;
        };

        let info = match self.probe.probe(&path) {
            Ok(info) if info.pixel_width > 0 => info,
            Ok(_) => {
                warnings.push(Warning::MetricsUnavailable {
                    path: path.display().to_string(),
                    reason: "zero pixel width".to_string(),
                });
                return Layout::Wide;
            }
            Err(e) => {
                warnings.push(Warning::MetricsUnavailable {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                });
                return Layout::Wide;
            }
        };

        let dpi = infer_dpi(&info, self.config.default_dpi);
        let width = natural_width(info.pixel_width, dpi);
        let narrow = self.geometry.narrow_width();
        log::debug!(
            "{}: {}px at {dpi:.1} dpi = {width:.2}cm, narrow column {narrow:.2}cm, threshold {threshold}",
            spec.display_name(),
            info.pixel_width
        );
        if width >= threshold * narrow {
            Layout::Wide
        } else {
            Layout::Narrow
        }
    }
}
