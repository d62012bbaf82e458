//! Cell heap and mark/sweep collection

use std::ops::{Index, IndexMut};
use std::time::{Duration, Instant};

use crate::handle::GcRef;
use crate::trace::{Trace, Tracer};

/// GC configuration
#[derive(Debug, Clone)]
pub struct GcConfig {
    /// Number of allocations between collections (default: 4096)
    pub allocation_threshold: usize,
}

impl Default for GcConfig {
    fn default() -> Self {
        Self {
            allocation_threshold: 4096,
        }
    }
}

/// GC statistics
#[derive(Debug, Clone, Copy, Default)]
pub struct GcStats {
    /// Total cells allocated over the heap's lifetime
    pub total_allocations: usize,
    /// Cells currently live
    pub live: usize,
    /// Number of completed collections
    pub collections: u64,
    /// Cells freed by the last collection
    pub last_freed: usize,
    /// Cells freed over the heap's lifetime
    pub total_freed: usize,
    /// Duration of the last collection
    pub last_pause: Duration,
}

/// Mark color for tri-color marking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkColor {
    /// Not yet visited
    White,
    /// In worklist
    Gray,
    /// Fully scanned
    Black,
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Heap of cells of a single type, addressed by [`GcRef`].
pub struct Heap<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    config: GcConfig,
    stats: GcStats,
    allocations_since_gc: usize,
}

impl<T> Heap<T> {
    /// Create a heap with the default config
    pub fn new() -> Self {
        Self::with_config(GcConfig::default())
    }

    /// Create a heap with a custom config
    pub fn with_config(config: GcConfig) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            config,
            stats: GcStats::default(),
            allocations_since_gc: 0,
        }
    }

    /// Move `value` into the heap and return its handle.
    ///
    /// Never collects.
    pub fn allocate(&mut self, value: T) -> GcRef<T> {
        self.stats.total_allocations += 1;
        self.stats.live += 1;
        self.allocations_since_gc += 1;

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            debug_assert!(slot.value.is_none());
            slot.value = Some(value);
            return GcRef::new(index, slot.generation);
        }

        let index = u32::try_from(self.slots.len()).unwrap_or_else(|_| {
            panic!("cell heap exhausted: more than {} cells", u32::MAX)
        });
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        GcRef::new(index, 0)
    }

    /// Get a cell, or `None` if the handle is stale
    #[inline]
    pub fn get(&self, cell: GcRef<T>) -> Option<&T> {
        self.slots
            .get(cell.index() as usize)
            .filter(|slot| slot.generation == cell.generation())
            .and_then(|slot| slot.value.as_ref())
    }

    /// Get a cell mutably, or `None` if the handle is stale
    #[inline]
    pub fn get_mut(&mut self, cell: GcRef<T>) -> Option<&mut T> {
        self.slots
            .get_mut(cell.index() as usize)
            .filter(|slot| slot.generation == cell.generation())
            .and_then(|slot| slot.value.as_mut())
    }

    /// Whether the handle still refers to a live cell
    pub fn contains(&self, cell: GcRef<T>) -> bool {
        self.get(cell).is_some()
    }

    /// Number of live cells
    pub fn len(&self) -> usize {
        self.stats.live
    }

    /// Whether the heap holds no live cells
    pub fn is_empty(&self) -> bool {
        self.stats.live == 0
    }

    /// Handles of all live cells, in slot order
    pub fn cells(&self) -> impl Iterator<Item = GcRef<T>> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value
                .as_ref()
                .map(|_| GcRef::new(index as u32, slot.generation))
        })
    }

    /// Get GC statistics
    pub fn stats(&self) -> GcStats {
        self.stats
    }

    /// Get config
    pub fn config(&self) -> &GcConfig {
        &self.config
    }

    /// Whether enough allocations happened since the last collection
    pub fn should_collect(&self) -> bool {
        self.allocations_since_gc >= self.config.allocation_threshold
    }
}

impl<T: Trace> Heap<T> {
    /// Perform a full mark/sweep collection.
    ///
    /// Every cell not reachable from `roots` is dropped and its slot recycled
    /// with a bumped generation. Returns the number of cells freed.
    pub fn collect(&mut self, roots: &[GcRef<T>]) -> usize {
        let start = Instant::now();

        #[cfg(feature = "gc_logging")]
        tracing::debug!(
            target: "marten::gc",
            roots = roots.len(),
            live = self.stats.live,
            "GC cycle starting"
        );

        // Phase 1: mark from roots
        let colors = {
            let mut marker = Marker {
                slots: &self.slots,
                colors: vec![MarkColor::White; self.slots.len()],
                worklist: Vec::with_capacity(roots.len()),
            };
            for &root in roots {
                marker.mark(root);
            }
            let slots = marker.slots;
            while let Some(index) = marker.worklist.pop() {
                if let Some(value) = &slots[index as usize].value {
                    value.trace(&mut marker);
                }
                marker.colors[index as usize] = MarkColor::Black;
            }
            marker.colors
        };

        // Phase 2: sweep unmarked cells
        let mut freed = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.value.is_some() && colors[index] == MarkColor::White {
                slot.value = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
                freed += 1;
            }
        }

        let elapsed = start.elapsed();
        self.stats.live -= freed;
        self.stats.collections += 1;
        self.stats.last_freed = freed;
        self.stats.total_freed += freed;
        self.stats.last_pause = elapsed;
        self.allocations_since_gc = 0;

        #[cfg(feature = "gc_logging")]
        tracing::info!(
            target: "marten::gc",
            collection = self.stats.collections,
            freed,
            live = self.stats.live,
            pause_us = elapsed.as_micros() as u64,
            "GC cycle complete"
        );

        freed
    }
}

impl<T> Default for Heap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<GcRef<T>> for Heap<T> {
    type Output = T;

    fn index(&self, cell: GcRef<T>) -> &T {
        match self.get(cell) {
            Some(value) => value,
            None => panic!("use of reclaimed cell {cell:?}"),
        }
    }
}

impl<T> IndexMut<GcRef<T>> for Heap<T> {
    fn index_mut(&mut self, cell: GcRef<T>) -> &mut T {
        match self.get_mut(cell) {
            Some(value) => value,
            None => panic!("use of reclaimed cell {cell:?}"),
        }
    }
}

/// Gray-set worklist used during marking
struct Marker<'a, T> {
    slots: &'a [Slot<T>],
    colors: Vec<MarkColor>,
    worklist: Vec<u32>,
}

impl<T> Tracer<T> for Marker<'_, T> {
    fn mark(&mut self, cell: GcRef<T>) {
        let index = cell.index() as usize;
        // Stale handles are ignored: the cell they named is already gone.
        let live = self
            .slots
            .get(index)
            .is_some_and(|slot| slot.generation == cell.generation() && slot.value.is_some());
        if live && self.colors[index] == MarkColor::White {
            self.colors[index] = MarkColor::Gray;
            self.worklist.push(cell.index());
        }
    }
}
