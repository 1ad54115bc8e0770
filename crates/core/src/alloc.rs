//! Category-tagged allocation accounting
//!
//! Every heap-backed value payload is allocated through `alloc_cell` and
//! released through `free_cell`, tagged with the category of cell being
//! managed. A global registry keeps live-cell and byte counters per
//! category so diagnostics can answer "how many list cells are alive right
//! now" without walking the value graph.
//!
//! # Design
//!
//! One fixed slot per category, updated with single atomic stores on the
//! allocation path and only aggregated when diagnostics ask. Counters are
//! atomics so a diagnostics thread can read them while the runtime thread
//! allocates; the runtime itself is single-threaded.

use std::ptr::NonNull;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Allocation category, one per heap-backed value payload kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocCategory {
    Str,
    Float,
    List,
    Map,
    Iter,
    Anon,
}

/// Number of allocation categories (slot array size).
pub const CATEGORY_COUNT: usize = 6;

impl AllocCategory {
    #[inline]
    fn index(self) -> usize {
        match self {
            AllocCategory::Str => 0,
            AllocCategory::Float => 1,
            AllocCategory::List => 2,
            AllocCategory::Map => 3,
            AllocCategory::Iter => 4,
            AllocCategory::Anon => 5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AllocCategory::Str => "str",
            AllocCategory::Float => "float",
            AllocCategory::List => "list",
            AllocCategory::Map => "map",
            AllocCategory::Iter => "iter",
            AllocCategory::Anon => "anon",
        }
    }
}

/// Counters for a single allocation category.
#[derive(Debug)]
struct CategorySlot {
    live: AtomicU64,
    bytes: AtomicU64,
    /// High-water mark of live cells
    peak_live: AtomicU64,
}

impl CategorySlot {
    const fn new() -> Self {
        Self {
            live: AtomicU64::new(0),
            bytes: AtomicU64::new(0),
            peak_live: AtomicU64::new(0),
        }
    }
}

/// Global registry of per-category allocation counters.
pub struct AllocRegistry {
    slots: [CategorySlot; CATEGORY_COUNT],
}

impl AllocRegistry {
    const fn new() -> Self {
        Self {
            slots: [
                CategorySlot::new(),
                CategorySlot::new(),
                CategorySlot::new(),
                CategorySlot::new(),
                CategorySlot::new(),
                CategorySlot::new(),
            ],
        }
    }

    /// Record an allocation of `bytes` in `category`.
    pub fn note_alloc(&self, category: AllocCategory, bytes: usize) {
        let slot = &self.slots[category.index()];
        let live = slot.live.fetch_add(1, Ordering::Relaxed) + 1;
        slot.bytes.fetch_add(bytes as u64, Ordering::Relaxed);

        // Update peak via CAS loop
        let mut peak = slot.peak_live.load(Ordering::Relaxed);
        while live > peak {
            match slot.peak_live.compare_exchange_weak(
                peak,
                live,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(current) => peak = current,
            }
        }
    }

    /// Record a free of `bytes` in `category`.
    pub fn note_free(&self, category: AllocCategory, bytes: usize) {
        let slot = &self.slots[category.index()];
        slot.live.fetch_sub(1, Ordering::Relaxed);
        slot.bytes.fetch_sub(bytes as u64, Ordering::Relaxed);
    }

    /// Live cell count for one category.
    pub fn live(&self, category: AllocCategory) -> u64 {
        self.slots[category.index()].live.load(Ordering::Relaxed)
    }

    /// Live byte count for one category.
    pub fn bytes(&self, category: AllocCategory) -> u64 {
        self.slots[category.index()].bytes.load(Ordering::Relaxed)
    }

    /// Aggregate counters across all categories.
    pub fn aggregate(&self) -> AggregateAllocStats {
        let mut total_live = 0;
        let mut total_bytes = 0;
        let mut total_peak_live = 0;
        for slot in &self.slots {
            total_live += slot.live.load(Ordering::Relaxed);
            total_bytes += slot.bytes.load(Ordering::Relaxed);
            total_peak_live += slot.peak_live.load(Ordering::Relaxed);
        }
        AggregateAllocStats {
            total_live,
            total_bytes,
            total_peak_live,
        }
    }
}

/// Aggregated allocation statistics across all categories.
#[derive(Debug, Clone, Copy)]
pub struct AggregateAllocStats {
    pub total_live: u64,
    pub total_bytes: u64,
    pub total_peak_live: u64,
}

static ALLOC_REGISTRY: OnceLock<AllocRegistry> = OnceLock::new();

/// Get the global allocation registry.
pub fn alloc_registry() -> &'static AllocRegistry {
    ALLOC_REGISTRY.get_or_init(AllocRegistry::new)
}

/// Allocate a cell in `category`, returning an owned raw handle.
///
/// The handle carries one reference (the cell's header starts at count 1).
/// It must eventually be released with `free_cell`, and only after the
/// lifetime protocol has confirmed the count is zero and, for colored
/// cells, that the cell is not sitting in the possible-roots buffer.
pub fn alloc_cell<T>(category: AllocCategory, value: T) -> NonNull<T> {
    alloc_registry().note_alloc(category, std::mem::size_of::<T>());
    // Box never returns null
    let ptr = Box::into_raw(Box::new(value));
    unsafe { NonNull::new_unchecked(ptr) }
}

/// Free a cell previously returned by `alloc_cell`.
///
/// # Safety
/// `ptr` must have come from `alloc_cell` with the same `category` and must
/// not be used again afterwards. The caller is responsible for having
/// confirmed the refcount-zero / not-buffered conditions first.
pub unsafe fn free_cell<T>(category: AllocCategory, ptr: NonNull<T>) {
    alloc_registry().note_free(category, std::mem::size_of::<T>());
    drop(unsafe { Box::from_raw(ptr.as_ptr()) });
}
