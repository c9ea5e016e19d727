//! CLI subcommand implementations.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};

use picframe::config::Config;
use picframe::loader::{SurfaceLoader, ThumbLoader};
use picframe::thumbs::ThumbnailStore;
use picframe::{scanner, ImageRef, ScreenSize};

pub fn open_store(cfg: &Config) -> Result<ThumbnailStore> {
    ThumbnailStore::open(&cfg.cache_dir, cfg.max_decode_bytes)
        .with_context(|| format!("opening thumbnail cache {}", cfg.cache_dir.display()))
}

pub fn discover(cfg: &Config) -> Result<Vec<ImageRef>> {
    scanner::discover(&cfg.image_dir)
        .with_context(|| format!("scanning {}", cfg.image_dir.display()))
}

pub fn scan(cfg: &Config, list: bool) -> Result<()> {
    let images = discover(cfg)?;
    if list {
        for image in &images {
            println!("{}", image.path.display());
        }
    }
    println!("{} images in {}", images.len(), cfg.image_dir.display());
    Ok(())
}

/// Pre-generate thumbnails for the whole library so the first pass of the
/// slideshow never waits on a full-size decode.
pub fn warm(cfg: &Config, size: ScreenSize) -> Result<()> {
    let images: Arc<[ImageRef]> = discover(cfg)?.into();
    let loader = Arc::new(ThumbLoader::new(open_store(cfg)?));

    let ncpus = thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4);
    let num_workers = (ncpus / 2).clamp(1, 4);
    println!(
        "Warming {} thumbnails at {} ({} workers)...",
        images.len(),
        size,
        num_workers
    );

    let next = Arc::new(AtomicUsize::new(0));
    let done = Arc::new(AtomicU64::new(0));
    let failed = Arc::new(AtomicU64::new(0));

    let mut handles = Vec::new();
    for worker_id in 0..num_workers {
        let images = images.clone();
        let loader = loader.clone();
        let next = next.clone();
        let done = done.clone();
        let failed = failed.clone();
        let h = thread::Builder::new()
            .name(format!("warm-{}", worker_id))
            .spawn(move || loop {
                let i = next.fetch_add(1, Ordering::Relaxed);
                let Some(image) = images.get(i) else { break };
                match loader.store().ensure(image, size) {
                    Ok(_) => {
                        done.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(e) => {
                        log::warn!("warm: {}", e);
                        failed.fetch_add(1, Ordering::Relaxed);
                    }
                }
            })
            .context("spawning warm worker")?;
        handles.push(h);
    }
    for h in handles {
        h.join().ok();
    }

    println!(
        "Done. {} ok, {} failed.",
        done.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed)
    );
    Ok(())
}

pub fn status(cfg: &Config, config_path: &std::path::Path) -> Result<()> {
    let store = open_store(cfg)?;
    let stats = store.stats()?;
    let images = scanner::discover(&cfg.image_dir).map(|v| v.len());

    println!("picframe status");
    println!("===============");
    println!("config:  {}", config_path.display());
    match images {
        Ok(n) => println!("images:  {} ({})", n, cfg.image_dir.display()),
        Err(e) => println!("images:  unavailable ({})", e),
    }
    println!(
        "thumbs:  {} files, {:.1} MiB ({})",
        stats.files,
        stats.bytes as f64 / (1024.0 * 1024.0),
        store.dir().display()
    );
    println!();
    print!("{}", cfg.to_toml()?);
    Ok(())
}

pub fn clean(cfg: &Config) -> Result<()> {
    let store = open_store(cfg)?;
    let removed = store.clear()?;
    println!("Removed {} thumbnails from {}", removed, store.dir().display());
    Ok(())
}

/// Decode one image through the normal path; handy for checking a file the
/// frame keeps skipping.
pub fn check(cfg: &Config, size: ScreenSize, path: &std::path::Path) -> Result<()> {
    let loader = ThumbLoader::new(open_store(cfg)?);
    let image = ImageRef::from_path(path);
    let surface = loader
        .load(&image, size)
        .with_context(|| format!("loading {}", path.display()))?;
    println!(
        "{}: ok, {}x{} surface, thumbnail {}",
        path.display(),
        surface.width,
        surface.height,
        loader.store().thumbnail_path(&image, size).display()
    );
    Ok(())
}
