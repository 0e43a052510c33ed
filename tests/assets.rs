mod common;

use jats_layout::assets::{AssetLocation, AssetResolver, DocumentContext, FsAssetResolver, locate};

#[test]
fn urls_resolve_as_remote() {
    let dir = common::scratch_dir("assets-remote");
    assert_eq!(
        FsAssetResolver.resolve("https://example.org/figs/plot.png", &dir),
        Some(AssetLocation::Remote("https://example.org/figs/plot.png".to_string()))
    );
    assert_eq!(FsAssetResolver.resolve("  ", &dir), None);
}

#[test]
fn extension_less_reference_finds_the_file() {
    let dir = common::scratch_dir("assets-ext");
    common::write_png(&dir.join("fig2.png"), 2, 2);
    assert_eq!(
        FsAssetResolver.resolve("fig2", &dir),
        Some(AssetLocation::Local(dir.join("fig2.png")))
    );
}

#[test]
fn fetch_serves_only_cached_files() {
    let cache = common::scratch_dir("assets-cache");
    common::write_png(&cache.join("plot.png"), 2, 2);

    assert_eq!(
        FsAssetResolver.fetch("https://example.org/figs/plot.png?v=2#top", &cache),
        Some(cache.join("plot.png"))
    );
    assert_eq!(FsAssetResolver.fetch("https://example.org/figs/other.png", &cache), None);
    assert_eq!(FsAssetResolver.fetch("https://example.org/", &cache), None);
}

#[test]
fn remote_reference_is_located_through_the_cache() {
    let assets = common::scratch_dir("assets-dir");
    let cache = common::scratch_dir("assets-cache-dir");
    common::write_png(&cache.join("plot.png"), 2, 2);
    let href = "http://example.org/plot.png";

    let with_cache = DocumentContext::new(&assets).with_cache_dir(&cache);
    assert_eq!(
        locate(&FsAssetResolver, href, &with_cache),
        Some(cache.join("plot.png"))
    );

    let without_cache = DocumentContext::new(&assets);
    assert_eq!(locate(&FsAssetResolver, href, &without_cache), None);
}

#[test]
fn missing_local_file_is_not_located() {
    let assets = common::scratch_dir("assets-missing");
    let ctx = DocumentContext::new(&assets);
    assert_eq!(locate(&FsAssetResolver, "absent.png", &ctx), None);
}
