//! On-disk thumbnail store.
//!
//! Each source image is scaled down once to fit the screen and written as a JPEG
//! named by `sha256("{path}-{mtime}-{w}x{h}")`. Once a name exists it is reused
//! forever; a changed mtime or screen size simply produces a new name.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageReader, Limits};
use sha2::{Digest, Sha256};

use crate::error::FrameError;
use crate::{ImageRef, ScreenSize};

const THUMB_EXT: &str = "jpg";
const JPEG_QUALITY: u8 = 85;

/// Default decoder allocation ceiling (512 MiB).
pub const DEFAULT_MAX_DECODE_BYTES: u64 = 512 * 1024 * 1024;

/// Cache key for a (source, mtime, target size) triple.
pub fn thumbnail_key(path: &Path, mtime_secs: u64, size: ScreenSize) -> String {
    let key = format!(
        "{}-{}-{}x{}",
        path.to_string_lossy(),
        mtime_secs,
        size.width,
        size.height
    );
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Decode an image file with an allocation limit. HEIC goes through libheif
/// when the `heic` feature is on.
pub fn open_image(path: &Path, max_alloc: u64) -> Result<DynamicImage, FrameError> {
    #[cfg(feature = "heic")]
    if is_heic(path) {
        return heic::decode(path, max_alloc);
    }

    let mut reader = ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|e| FrameError::io(path, e))?;
    let mut limits = Limits::default();
    limits.max_alloc = Some(max_alloc);
    reader.limits(limits);
    reader.decode().map_err(|e| FrameError::decode(path, e))
}

/// Scale down to fit within `size`, preserving aspect. Never upscales.
pub fn fit_within(img: DynamicImage, size: ScreenSize) -> DynamicImage {
    if img.width() <= size.width && img.height() <= size.height {
        return img;
    }
    // thumbnail() is a fast box-filter downscale, plenty for a photo frame
    img.thumbnail(size.width, size.height)
}

/// Refuse a decode whose output buffer alone would exceed `max_alloc`. For
/// decoders that can't take `image::Limits`.
#[cfg_attr(not(feature = "heic"), allow(dead_code))]
fn check_decode_size(
    path: &Path,
    width: u32,
    height: u32,
    channels: u64,
    max_alloc: u64,
) -> Result<(), FrameError> {
    let bytes = u64::from(width)
        .saturating_mul(u64::from(height))
        .saturating_mul(channels);
    if bytes > max_alloc {
        return Err(FrameError::MemoryLimit {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

#[cfg(feature = "heic")]
fn is_heic(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("heic"))
        .unwrap_or(false)
}

#[cfg(feature = "heic")]
mod heic {
    use std::path::Path;

    use image::{DynamicImage, RgbImage};
    use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};

    use crate::error::FrameError;

    pub(super) fn decode(path: &Path, max_alloc: u64) -> Result<DynamicImage, FrameError> {
        let heif_err = |source| FrameError::Heic {
            path: path.to_path_buf(),
            source,
        };
        let path_str = path
            .to_str()
            .ok_or_else(|| FrameError::Config(format!("non-UTF-8 path {:?}", path)))?;

        let lib = LibHeif::new();
        let ctx = HeifContext::read_from_file(path_str).map_err(heif_err)?;
        let handle = ctx.primary_image_handle().map_err(heif_err)?;
        super::check_decode_size(path, handle.width(), handle.height(), 3, max_alloc)?;
        let decoded = lib
            .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgb), None)
            .map_err(heif_err)?;

        let planes = decoded.planes();
        let plane = planes
            .interleaved
            .ok_or_else(|| FrameError::Config(format!("{}: no interleaved plane", path.display())))?;
        let (w, h) = (plane.width, plane.height);
        let row = w as usize * 3;
        let mut rgb = Vec::with_capacity(row * h as usize);
        for y in 0..h as usize {
            let start = y * plane.stride;
            rgb.extend_from_slice(&plane.data[start..start + row]);
        }
        RgbImage::from_raw(w, h, rgb)
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(|| FrameError::Config(format!("{}: bad heic buffer", path.display())))
    }
}

/// Summary of the thumbnail directory, for `picframe status`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ThumbStats {
    pub files: usize,
    pub bytes: u64,
}

/// Content-addressed thumbnail directory.
#[derive(Debug, Clone)]
pub struct ThumbnailStore {
    dir: PathBuf,
    max_alloc: u64,
}

impl ThumbnailStore {
    /// Open (and create if needed) the thumbnail directory.
    pub fn open(dir: impl Into<PathBuf>, max_alloc: u64) -> Result<Self, FrameError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| FrameError::io(&dir, e))?;
        Ok(ThumbnailStore { dir, max_alloc })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_alloc(&self) -> u64 {
        self.max_alloc
    }

    pub fn thumbnail_path(&self, image: &ImageRef, size: ScreenSize) -> PathBuf {
        let key = thumbnail_key(image.path(), image.mtime_secs(), size);
        self.dir.join(format!("{}.{}", key, THUMB_EXT))
    }

    /// Return the thumbnail for `image`, creating it if absent.
    pub fn ensure(&self, image: &ImageRef, size: ScreenSize) -> Result<PathBuf, FrameError> {
        let dest = self.thumbnail_path(image, size);
        if dest.is_file() {
            return Ok(dest);
        }

        let img = open_image(image.path(), self.max_alloc)?;
        let thumb = fit_within(img, size);
        self.write_jpeg(&thumb, &dest)?;
        Ok(dest)
    }

    /// Write to a temp file in the store dir, then rename into place so readers
    /// never see a partial thumbnail.
    fn write_jpeg(&self, img: &DynamicImage, dest: &Path) -> Result<(), FrameError> {
        let mut tmp = tempfile::Builder::new()
            .prefix(".thumb-")
            .suffix(".tmp")
            .tempfile_in(&self.dir)
            .map_err(|e| FrameError::io(&self.dir, e))?;

        {
            let mut out = BufWriter::new(tmp.as_file_mut());
            let encoder = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
            DynamicImage::ImageRgb8(img.to_rgb8())
                .write_with_encoder(encoder)
                .map_err(|e| FrameError::decode(dest, e))?;
            out.flush().map_err(|e| FrameError::io(dest, e))?;
        }

        tmp.persist(dest)
            .map_err(|e| FrameError::io(dest, e.error))?;
        Ok(())
    }

    pub fn stats(&self) -> Result<ThumbStats, FrameError> {
        let mut stats = ThumbStats::default();
        for path in self.artifacts()? {
            stats.files += 1;
            stats.bytes += fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        }
        Ok(stats)
    }

    /// Delete every thumbnail. Returns how many were removed.
    pub fn clear(&self) -> Result<usize, FrameError> {
        let mut removed = 0usize;
        for path in self.artifacts()? {
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => log::warn!("clean: {}: {}", path.display(), e),
            }
        }
        Ok(removed)
    }

    fn artifacts(&self) -> Result<Vec<PathBuf>, FrameError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| FrameError::io(&self.dir, e))?;
        Ok(entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && p.extension().and_then(|e| e.to_str()) == Some(THUMB_EXT))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::time::{Duration, SystemTime};

    const SCREEN: ScreenSize = ScreenSize::new(80, 48);

    fn write_png(dir: &Path, name: &str, w: u32, h: u32) -> PathBuf {
        let path = dir.join(name);
        RgbImage::from_pixel(w, h, Rgb([200, 30, 30])).save(&path).unwrap();
        path
    }

    // ── keys ────────────────────────────────────────────────────────────

    #[test]
    fn key_is_deterministic_hex() {
        let a = thumbnail_key(Path::new("Pics/a.jpg"), 100, SCREEN);
        let b = thumbnail_key(Path::new("Pics/a.jpg"), 100, SCREEN);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn key_changes_with_each_component() {
        let base = thumbnail_key(Path::new("a.jpg"), 100, SCREEN);
        assert_ne!(base, thumbnail_key(Path::new("b.jpg"), 100, SCREEN));
        assert_ne!(base, thumbnail_key(Path::new("a.jpg"), 101, SCREEN));
        assert_ne!(base, thumbnail_key(Path::new("a.jpg"), 100, ScreenSize::new(80, 49)));
    }

    #[test]
    fn decode_size_check() {
        let path = Path::new("big.heic");
        assert!(check_decode_size(path, 100, 100, 3, 30_000).is_ok());
        let err = check_decode_size(path, 100, 101, 3, 30_000).unwrap_err();
        assert!(err.is_memory_limit());
        let err = check_decode_size(path, u32::MAX, u32::MAX, 3, u64::MAX - 1).unwrap_err();
        assert!(err.is_memory_limit());
    }

    #[cfg(feature = "heic")]
    #[test]
    fn only_heic_extension_routes_to_libheif() {
        assert!(is_heic(Path::new("IMG_0001.HEIC")));
        assert!(!is_heic(Path::new("IMG_0001.heif")));
        assert!(!is_heic(Path::new("IMG_0001.jpg")));
    }

    // ── fit_within ──────────────────────────────────────────────────────

    #[test]
    fn fit_within_downscales_preserving_aspect() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(400, 100));
        let out = fit_within(img, SCREEN);
        assert!(out.width() <= 80 && out.height() <= 48);
        assert_eq!(out.width(), 80);
        assert_eq!(out.height(), 20);
    }

    #[test]
    fn fit_within_never_upscales() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(10, 10));
        let out = fit_within(img, SCREEN);
        assert_eq!((out.width(), out.height()), (10, 10));
    }

    // ── store ───────────────────────────────────────────────────────────

    #[test]
    fn ensure_creates_then_reuses() {
        let src_dir = tempfile::tempdir().unwrap();
        let cache_dir = tempfile::tempdir().unwrap();
        let src = write_png(src_dir.path(), "big.png", 320, 240);
        let store = ThumbnailStore::open(cache_dir.path(), DEFAULT_MAX_DECODE_BYTES).unwrap();
        let image = ImageRef::from_path(&src);

        let thumb = store.ensure(&image, SCREEN).unwrap();
        assert!(thumb.is_file());
        assert_eq!(thumb, store.thumbnail_path(&image, SCREEN));
        let dims = image::image_dimensions(&thumb).unwrap();
        assert_eq!(dims, (64, 48));

        // Remove the source: the existing thumbnail is still reused.
        fs::remove_file(&src).unwrap();
        assert_eq!(store.ensure(&image, SCREEN).unwrap(), thumb);
    }

    #[test]
    fn different_mtime_gets_new_thumbnail() {
        let src_dir = tempfile::tempdir().unwrap();
        let cache_dir = tempfile::tempdir().unwrap();
        let src = write_png(src_dir.path(), "a.png", 20, 20);
        let store = ThumbnailStore::open(cache_dir.path(), DEFAULT_MAX_DECODE_BYTES).unwrap();

        let old = ImageRef::new(&src, Some(SystemTime::UNIX_EPOCH + Duration::from_secs(1)));
        let new = ImageRef::new(&src, Some(SystemTime::UNIX_EPOCH + Duration::from_secs(2)));
        let a = store.ensure(&old, SCREEN).unwrap();
        let b = store.ensure(&new, SCREEN).unwrap();
        assert_ne!(a, b);
        assert_eq!(store.stats().unwrap().files, 2);
    }

    #[test]
    fn ensure_fails_on_garbage() {
        let src_dir = tempfile::tempdir().unwrap();
        let cache_dir = tempfile::tempdir().unwrap();
        let src = src_dir.path().join("broken.jpg");
        fs::write(&src, b"definitely not a jpeg").unwrap();
        let store = ThumbnailStore::open(cache_dir.path(), DEFAULT_MAX_DECODE_BYTES).unwrap();

        assert!(store.ensure(&ImageRef::from_path(&src), SCREEN).is_err());
        assert_eq!(store.stats().unwrap().files, 0, "no partial artifact left");
    }

    #[test]
    fn memory_limit_is_reported() {
        let src_dir = tempfile::tempdir().unwrap();
        let src = write_png(src_dir.path(), "huge.png", 200, 200);
        let err = open_image(&src, 1024).unwrap_err();
        assert!(err.is_memory_limit(), "got {:?}", err);
    }

    #[test]
    fn missing_source_is_io_error() {
        let err = open_image(Path::new("/nonexistent/picframe/x.jpg"), DEFAULT_MAX_DECODE_BYTES)
            .unwrap_err();
        assert!(matches!(err, FrameError::Io { .. }));
    }

    #[test]
    fn stats_and_clear() {
        let src_dir = tempfile::tempdir().unwrap();
        let cache_dir = tempfile::tempdir().unwrap();
        let store = ThumbnailStore::open(cache_dir.path(), DEFAULT_MAX_DECODE_BYTES).unwrap();
        for name in ["a.png", "b.png"] {
            let src = write_png(src_dir.path(), name, 30, 30);
            store.ensure(&ImageRef::from_path(&src), SCREEN).unwrap();
        }
        fs::write(cache_dir.path().join("notes.txt"), b"keep me").unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.files, 2);
        assert!(stats.bytes > 0);

        assert_eq!(store.clear().unwrap(), 2);
        assert_eq!(store.stats().unwrap(), ThumbStats::default());
        assert!(cache_dir.path().join("notes.txt").exists());
    }
}
