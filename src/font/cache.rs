//! Display list cache for rendered strings.
//!
//! A font allocates a pool of `capacity` display list handles once, as the
//! consecutive range `[base, base + capacity)`. Each cached string owns one
//! handle. Until the pool is exhausted a new string takes `base + len`; after
//! that it takes over the handle of the least recently used string, which is
//! evicted. Handles are never freed individually, only the whole pool in
//! [`DisplayListCache::release`].
//!
//! Entries also memoize the string's measurements. Each one is computed the
//! first time it is asked for, independently of the others.

use std::num::NonZeroUsize;

use lru::LruCache;

use crate::error::EngineResult;
use crate::render::{ListMode, RenderBackend};

/// Default number of strings cached per font.
pub const DEFAULT_CACHE_SIZE: usize = 200;

/// A cached string: its list handle and lazily computed measurements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayList {
    handle: u32,
    width: Option<i32>,
    logical_width: Option<i32>,
    height: Option<i32>,
    y_offset: Option<i32>,
}

impl DisplayList {
    fn new(handle: u32) -> Self {
        Self {
            handle,
            width: None,
            logical_width: None,
            height: None,
            y_offset: None,
        }
    }

    pub fn handle(&self) -> u32 {
        self.handle
    }

    pub fn width_or_insert_with(&mut self, f: impl FnOnce() -> i32) -> i32 {
        *self.width.get_or_insert_with(f)
    }

    pub fn logical_width_or_insert_with(&mut self, f: impl FnOnce() -> i32) -> i32 {
        *self.logical_width.get_or_insert_with(f)
    }

    pub fn height_or_insert_with(&mut self, f: impl FnOnce() -> i32) -> i32 {
        *self.height.get_or_insert_with(f)
    }

    pub fn y_offset_or_insert_with(&mut self, f: impl FnOnce() -> i32) -> i32 {
        *self.y_offset.get_or_insert_with(f)
    }

    pub fn cached_width(&self) -> Option<i32> {
        self.width
    }

    pub fn cached_height(&self) -> Option<i32> {
        self.height
    }
}

/// Hit/miss counters of a [`DisplayListCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

pub struct DisplayListCache {
    base: u32,
    capacity: u32,
    /// Handles below `base + issued` have been handed out at least once.
    issued: u32,
    /// Handles given back by failed compiles.
    free: Vec<u32>,
    lists: LruCache<String, DisplayList>,
    stats: CacheStats,
}

impl DisplayListCache {
    /// Allocate the handle pool. Returns `None` when the renderer cannot
    /// provide `capacity` lists, in which case text is drawn uncached.
    pub fn new(renderer: &mut dyn RenderBackend, capacity: usize) -> Option<Self> {
        let slots = NonZeroUsize::new(capacity)?;
        let count = u32::try_from(capacity).ok()?;
        let base = renderer.gen_lists(count);
        if base == 0 {
            log::warn!(
                "Could not allocate {} display lists; text will not be cached",
                capacity
            );
            return None;
        }
        log::debug!("Allocated display lists {}..{}", base, base + count);
        Some(Self {
            base,
            capacity: count,
            issued: 0,
            free: Vec::new(),
            lists: LruCache::new(slots),
            stats: CacheStats::default(),
        })
    }

    pub fn capacity(&self) -> usize {
        self.lists.cap().get()
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    /// First handle of the pool.
    pub fn base_handle(&self) -> u32 {
        self.base
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// The cached entry for `text`, marked most recently used.
    pub fn get(&mut self, text: &str) -> Option<&mut DisplayList> {
        self.lists.get_mut(text)
    }

    /// The cached entry for `text` without touching its recency.
    pub fn peek(&self, text: &str) -> Option<&DisplayList> {
        self.lists.peek(text)
    }

    /// Cached strings from most to least recently used, with their handles.
    pub fn entries(&self) -> impl Iterator<Item = (&str, u32)> {
        self.lists.iter().map(|(k, v)| (k.as_str(), v.handle))
    }

    /// Draw `text` from its list, compiling the list with `draw` on a miss.
    ///
    /// Returns the handle used.
    pub fn draw<F>(&mut self, renderer: &mut dyn RenderBackend, text: &str, draw: F) -> EngineResult<u32>
    where
        F: FnOnce(&mut dyn RenderBackend) -> EngineResult<()>,
    {
        if let Some(list) = self.lists.get(text) {
            let handle = list.handle;
            self.stats.hits += 1;
            renderer.call_list(handle);
            return Ok(handle);
        }
        self.record(renderer, text, draw)
    }

    /// Assign `text` a handle and compile `draw` into it, drawing at the
    /// same time so the first use shows up immediately.
    pub fn record<F>(&mut self, renderer: &mut dyn RenderBackend, text: &str, draw: F) -> EngineResult<u32>
    where
        F: FnOnce(&mut dyn RenderBackend) -> EngineResult<()>,
    {
        let handle = self.assign(text);
        renderer.new_list(handle, ListMode::CompileAndExecute);
        let result = draw(renderer);
        renderer.end_list();
        if let Err(e) = &result {
            // a half-compiled list must not be replayed as a hit
            self.lists.pop(text);
            self.free.push(handle);
            log::debug!("Compiling '{}' into list {} failed: {}", text, handle, e);
        }
        result.map(|_| handle)
    }

    fn assign(&mut self, text: &str) -> u32 {
        if let Some(existing) = self.lists.get_mut(text) {
            // recompiling in place invalidates the measurements
            *existing = DisplayList::new(existing.handle);
            return existing.handle;
        }
        self.stats.misses += 1;

        let handle = if let Some(handle) = self.free.pop() {
            handle
        } else if self.issued < self.capacity {
            self.issued += 1;
            self.base + self.issued - 1
        } else {
            // every handle is held by an entry, so the cache is full and
            // pushing evicts the eldest; its handle is the one to reuse
            match self.lists.peek_lru() {
                Some((_, eldest)) => eldest.handle,
                None => self.base,
            }
        };
        if let Some((evicted, old)) = self.lists.push(text.to_owned(), DisplayList::new(handle)) {
            debug_assert_eq!(old.handle, handle);
            self.stats.evictions += 1;
            log::debug!("Evicted '{}' from display list {}", evicted, handle);
        }
        handle
    }

    /// Delete the whole handle pool.
    pub fn release(self, renderer: &mut dyn RenderBackend) {
        renderer.delete_lists(self.base, self.capacity);
    }
}
