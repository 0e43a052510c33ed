#![allow(dead_code)]

use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::{fs, io};

use jats_layout::assets::{AssetLocation, AssetResolver};
use jats_layout::image_info::{ImageInfo, ImageInfoError, ImageProbe};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Fresh directory under the system temp dir, unique per call.
pub fn scratch_dir(name: &str) -> PathBuf {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let n = COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!(
        "jats-layout-{}-{}-{}",
        name,
        std::process::id(),
        n
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

pub fn write_png(path: &Path, width: u32, height: u32) {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 40, 40]));
    img.save(path).expect("write png");
}

/// Probe returning a fixed answer and counting how often it was asked.
pub struct FixedProbe {
    pub info: Option<ImageInfo>,
    pub calls: Cell<usize>,
}

impl FixedProbe {
    pub fn pixels(pixel_width: u32, pixel_height: u32) -> Self {
        Self::with_info(ImageInfo {
            pixel_width,
            pixel_height,
            dpi: None,
            jfif_density: None,
        })
    }

    pub fn with_info(info: ImageInfo) -> Self {
        Self {
            info: Some(info),
            calls: Cell::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            info: None,
            calls: Cell::new(0),
        }
    }
}

impl ImageProbe for FixedProbe {
    fn probe(&self, _path: &Path) -> Result<ImageInfo, ImageInfoError> {
        self.calls.set(self.calls.get() + 1);
        self.info.clone().ok_or_else(|| {
            ImageInfoError::Io(io::Error::new(io::ErrorKind::InvalidData, "unreadable image"))
        })
    }
}

/// Resolves every reference to the same local file.
pub struct FixedResolver(pub PathBuf);

impl AssetResolver for FixedResolver {
    fn resolve(&self, _href: &str, _assets_dir: &Path) -> Option<AssetLocation> {
        Some(AssetLocation::Local(self.0.clone()))
    }

    fn fetch(&self, _url: &str, _cache_dir: &Path) -> Option<PathBuf> {
        None
    }
}

pub fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
}
