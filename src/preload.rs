//! Surface cache (LRU, memory-resident) + background image prefetcher.
//!
//! Flow:
//!   1. Prefetcher::prefetch(order, start, count) → spawns thread → loads each
//!      upcoming image → SurfaceCache::put
//!   2. Display loop: SurfaceCache::get(path) → hit, or synchronous load + put
//!
//! The cache mutex guards only map operations. Decoding always happens outside it.

use std::collections::{HashMap, VecDeque};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use crate::loader::SurfaceLoader;
use crate::{ImageRef, ScreenSize};

/// Decoded image: tightly packed RGB24 pixels ready for texture upload.
pub struct DecodedImage {
    pub rgb: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl DecodedImage {
    pub fn from_rgb(img: image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        DecodedImage {
            rgb: img.into_raw(),
            width,
            height,
        }
    }

    /// Bytes per row.
    pub fn pitch(&self) -> usize {
        self.width as usize * 3
    }
}

impl std::fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// A display-ready image shared between the prefetch threads and the display loop.
pub type Surface = Arc<DecodedImage>;

/// LRU bookkeeping. Only ever touched under the `SurfaceCache` mutex.
struct LruMap {
    map: HashMap<PathBuf, Surface>,
    /// front = least recently used, back = most recently used
    order: VecDeque<PathBuf>,
}

impl LruMap {
    /// Move a path to the back of the LRU (most recently used).
    fn touch(&mut self, path: &Path) {
        if let Some(pos) = self.order.iter().position(|p| p == path) {
            if let Some(p) = self.order.remove(pos) {
                self.order.push_back(p);
            }
        }
    }
}

/// Bounded LRU of decoded surfaces, keyed by image path. Safe to share via `Arc`.
pub struct SurfaceCache {
    capacity: usize,
    inner: Mutex<LruMap>,
}

impl SurfaceCache {
    pub fn new(capacity: usize) -> Self {
        SurfaceCache {
            capacity,
            inner: Mutex::new(LruMap {
                map: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    // No code runs under this lock that can panic mid-mutation, so a poisoned
    // lock still guards a consistent map.
    fn lock(&self) -> MutexGuard<'_, LruMap> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Residency check. Does not count as use.
    pub fn contains(&self, path: &Path) -> bool {
        self.lock().map.contains_key(path)
    }

    /// Look up a surface. A hit moves the entry to most recently used.
    pub fn get(&self, path: &Path) -> Option<Surface> {
        let mut lru = self.lock();
        let surface = lru.map.get(path).cloned()?;
        lru.touch(path);
        Some(surface)
    }

    /// Insert or replace a surface, mark it most recently used, then evict
    /// least recently used entries until the cache is within capacity.
    pub fn put(&self, path: PathBuf, surface: Surface) {
        let mut lru = self.lock();
        if lru.map.insert(path.clone(), surface).is_some() {
            lru.touch(&path);
        } else {
            lru.order.push_back(path);
        }

        while lru.map.len() > self.capacity {
            match lru.order.pop_front() {
                Some(old) => {
                    lru.map.remove(&old);
                }
                None => break,
            }
        }
    }
}

/// Background prefetcher: loads upcoming images into the surface cache on
/// short-lived worker threads.
#[derive(Clone)]
pub struct Prefetcher {
    cache: Arc<SurfaceCache>,
    loader: Arc<dyn SurfaceLoader>,
}

impl Prefetcher {
    pub fn new(cache: Arc<SurfaceCache>, loader: Arc<dyn SurfaceLoader>) -> Self {
        Prefetcher { cache, loader }
    }

    /// Schedule loading of `count` images of `order` starting at `start_index`
    /// (wrapping). Returns at once; the handle may be dropped (fire and forget).
    /// Per-image failures are skipped silently.
    pub fn prefetch(
        &self,
        order: Arc<[ImageRef]>,
        start_index: usize,
        count: usize,
        target: ScreenSize,
    ) -> Option<JoinHandle<()>> {
        let n = order.len();
        let count = count.min(n);
        if count == 0 {
            return None;
        }

        let cache = self.cache.clone();
        let loader = self.loader.clone();
        let spawned = thread::Builder::new()
            .name("prefetch".into())
            .spawn(move || {
                let mut loaded = 0usize;
                for offset in 0..count {
                    let image = &order[(start_index + offset) % n];
                    if prefetch_one(&cache, loader.as_ref(), image, target) {
                        loaded += 1;
                    }
                }
                log::debug!("prefetch: {} loaded, {} requested", loaded, count);
            });

        match spawned {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::warn!("prefetch: failed to spawn worker: {}", e);
                None
            }
        }
    }
}

/// Returns true if a new surface was inserted.
fn prefetch_one(
    cache: &SurfaceCache,
    loader: &dyn SurfaceLoader,
    image: &ImageRef,
    target: ScreenSize,
) -> bool {
    // Already hot: the lookup itself refreshes recency.
    if cache.get(image.path()).is_some() {
        return false;
    }

    let result = panic::catch_unwind(AssertUnwindSafe(|| loader.load(image, target)));
    match result {
        Ok(Ok(decoded)) => {
            cache.put(image.path.clone(), Arc::new(decoded));
            true
        }
        // Speculative work: errors and panics are dropped; the display loop
        // retries synchronously if this image is actually shown.
        Ok(Err(_)) | Err(_) => false,
    }
}
