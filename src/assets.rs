use std::path::{Path, PathBuf};

/// Extensions tried, in order, when an image reference has none.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "tif", "tiff"];

/// Per-document locations. Lives exactly as long as one document build.
#[derive(Clone, Debug, Default)]
pub struct DocumentContext {
    pub assets_dir: PathBuf,
    pub cache_dir: Option<PathBuf>,
}

impl DocumentContext {
    pub fn new(assets_dir: impl Into<PathBuf>) -> Self {
        Self {
            assets_dir: assets_dir.into(),
            cache_dir: None,
        }
    }

    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(cache_dir.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssetLocation {
    Local(PathBuf),
    Remote(String),
}

/// Finds image files for `xlink:href` references. Implementations report
/// failure as `None` and never panic.
pub trait AssetResolver {
    fn resolve(&self, href: &str, assets_dir: &Path) -> Option<AssetLocation>;

    fn fetch(&self, url: &str, cache_dir: &Path) -> Option<PathBuf>;
}

/// Resolves references against the assets directory and serves remote
/// references from the download cache only.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsAssetResolver;

impl AssetResolver for FsAssetResolver {
    fn resolve(&self, href: &str, assets_dir: &Path) -> Option<AssetLocation> {
        let href = href.trim();
        if href.is_empty() {
            return None;
        }
        if href.starts_with("http://") || href.starts_with("https://") {
            return Some(AssetLocation::Remote(href.to_string()));
        }
        let href = href.strip_prefix("file://").unwrap_or(href);
        let direct = Path::new(href);
        if direct.is_absolute() && direct.exists() {
            return Some(AssetLocation::Local(direct.to_path_buf()));
        }
        let joined = assets_dir.join(href);
        if joined.exists() || joined.extension().is_some() {
            return Some(AssetLocation::Local(joined));
        }
        let found = IMAGE_EXTENSIONS
            .iter()
            .map(|ext| joined.with_extension(ext))
            .find(|p| p.exists());
        Some(AssetLocation::Local(found.unwrap_or(joined)))
    }

    fn fetch(&self, url: &str, cache_dir: &Path) -> Option<PathBuf> {
        let name = cache_file_name(url)?;
        let cached = cache_dir.join(name);
        if cached.is_file() {
            log::debug!("asset {url} served from cache {}", cached.display());
            Some(cached)
        } else {
            log::warn!("asset {url} is not in the download cache {}", cache_dir.display());
            None
        }
    }
}

/// Last path segment of a URL with query and fragment removed.
fn cache_file_name(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next()?;
    path.rsplit('/').next().filter(|s| !s.is_empty())
}

/// Resolves `href` to an existing local file, fetching remote references
/// into the cache directory when one is configured.
pub fn locate(resolver: &dyn AssetResolver, href: &str, ctx: &DocumentContext) -> Option<PathBuf> {
    let path = match resolver.resolve(href, &ctx.assets_dir)? {
        AssetLocation::Local(path) => path,
        AssetLocation::Remote(url) => resolver.fetch(&url, ctx.cache_dir.as_deref()?)?,
    };
    path.is_file().then_some(path)
}
