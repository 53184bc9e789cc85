//! Interval-tree construction.
//!
//! One right-to-left sweep over the suffix array turns `(SA, PLCP)` into
//! the pruned LCP-interval tree, maintaining a monotone stack of open
//! intervals keyed by pruned lcp. Three arrays share storage:
//!
//! - `nodes[i]` holds the widened 64-bit `SA[i]` on entry and the packed
//!   interval word of node `i` once that interval closes. Closed-node
//!   slots are always at indices above every SA entry still to be read,
//!   so the overlap is clobber-free.
//! - `leaf[p]` holds `PLCP[p]` on entry; the sweep overwrites it with the
//!   index of position `p`'s leaf interval, the entry point of the
//!   bottom-up walk.
//!
//! A run of suffix-array positions whose PLCP falls below the minimum
//! match length collapses the stack to the root sentinel, so the sweep
//! can be cut at any such breakpoint and the pieces built independently.
//! The parallel driver finds one breakpoint per worker partition, then
//! builds the spans between breakpoints concurrently.

use crate::interval::{LCP_MASK, LCP_SHIFT, MAX_MATCH_LENGTH, OFFSET_MASK};
use crate::prefetch::{prefetch_read, prefetch_write};
use crate::storage::PARALLEL_THRESHOLD;

const PREFETCH_DISTANCE: usize = 32;

/// Span of node slots written by one build worker, kept so rewind can
/// clear exactly the slots in use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct WorkerSpan {
    pub tree_start: usize,
    pub tree_end: usize,
}

/// Single-threaded sweep over `SA[start .. start + len)`.
///
/// `min_match_length`/`max_match_length` are the configured bounds; the
/// pruned lcp of each entry is `PLCP - (min - 1)` clamped to
/// `[0, max - min + 1]`. The leftmost swept entry must have a pruned lcp
/// of zero (position 0, or a breakpoint), which closes every interval
/// against the root sentinel before the sweep ends.
///
/// Returns the first node slot in use; the sweep consumed
/// `[return, start + len)`.
pub(crate) fn sweep(
    nodes: &mut [u64],
    leaf: &mut [u32],
    min_match_length: u64,
    max_match_length: u64,
    start: usize,
    len: usize,
) -> usize {
    if len == 0 {
        return start;
    }

    let min_m1 = min_match_length - 1;
    let clip = max_match_length - min_m1;

    // Open intervals, strictly increasing lcp from the root sentinel at
    // the bottom; `stack[sp]` is the current top.
    let mut stack = [0u64; 2 * MAX_MATCH_LENGTH as usize];
    let mut sp = 0usize;
    let mut top = 0u64;
    let mut next_free = (start + len - 1) as u64;

    for i in (start..start + len).rev() {
        if i >= start + 2 * PREFETCH_DISTANCE {
            prefetch_read(&nodes[i - 2 * PREFETCH_DISTANCE]);
        }
        if i >= start + PREFETCH_DISTANCE {
            prefetch_write(&leaf[nodes[i - PREFETCH_DISTANCE] as usize]);
        }

        let pos = nodes[i] as usize;
        let next_lcp = (leaf[pos] as u64).saturating_sub(min_m1).min(clip);
        let cand = (next_lcp << LCP_SHIFT) + next_free;

        if next_lcp > top >> LCP_SHIFT {
            sp += 1;
            stack[sp] = cand;
            top = cand;
            next_free -= 1;
        }

        // The deepest open interval containing this suffix. Recorded
        // before any closes below: an interval about to close still has
        // this position on its left boundary.
        leaf[pos] = top as u32;

        while next_lcp < top >> LCP_SHIFT {
            let closed = top;
            sp -= 1;
            top = stack[sp];
            if next_lcp > top >> LCP_SHIFT {
                sp += 1;
                stack[sp] = cand;
                top = cand;
                next_free -= 1;
            }
            // Parent link plus the closed interval's own lcp; the offset
            // field starts clear.
            nodes[closed as u32 as usize] = (top as u32 as u64) + (closed & LCP_MASK);
        }
    }

    (next_free + 1) as usize
}

/// Rightmost position in `SA[start .. start + len)` whose PLCP falls
/// below the minimum match length, if any.
pub(crate) fn find_breakpoint(
    nodes: &[u64],
    leaf: &[u32],
    min_match_length: u32,
    start: usize,
    len: usize,
) -> Option<usize> {
    for i in (start..start + len).rev() {
        if i >= start + 2 * PREFETCH_DISTANCE {
            prefetch_read(&nodes[i - 2 * PREFETCH_DISTANCE]);
        }
        if i >= start + PREFETCH_DISTANCE {
            prefetch_read(&leaf[nodes[i - PREFETCH_DISTANCE] as usize]);
        }
        if leaf[nodes[i] as usize] < min_match_length {
            return Some(i);
        }
    }
    None
}

/// Full node and leaf-link arrays handed to build workers.
///
/// Workers operate on disjoint data: node reads and writes stay inside
/// each worker's suffix-array span, and leaf entries are indexed by SA
/// values, which are a permutation of the text positions — each entry
/// belongs to exactly one span.
struct BuildShared {
    nodes: *mut u64,
    nodes_len: usize,
    leaf: *mut u32,
    leaf_len: usize,
}

// SAFETY: see the disjointness argument above; no two workers touch the
// same element.
unsafe impl Sync for BuildShared {}

impl BuildShared {
    /// # Safety
    ///
    /// Callers must write only within their assigned breakpoint span (for
    /// nodes) or to leaf entries owned by that span's SA values.
    unsafe fn slices(&self) -> (&mut [u64], &mut [u32]) {
        (
            std::slice::from_raw_parts_mut(self.nodes, self.nodes_len),
            std::slice::from_raw_parts_mut(self.leaf, self.leaf_len),
        )
    }
}

/// Build the interval tree over `SA[0 .. n)`, fanning out across
/// `workers` threads when the block is large enough.
///
/// `spans` receives one `[tree_start, tree_end)` entry per worker;
/// workers that built nothing leave an empty span. Single-threaded
/// operation is the degenerate one-worker case and produces an
/// equivalent tree.
pub(crate) fn build_interval_tree(
    nodes: &mut [u64],
    leaf: &mut [u32],
    min_match_length: u64,
    max_match_length: u64,
    n: usize,
    workers: usize,
    spans: &mut [WorkerSpan],
) {
    debug_assert!(spans.len() >= workers.max(1));
    for span in spans.iter_mut() {
        *span = WorkerSpan::default();
    }

    if workers <= 1 || n < PARALLEL_THRESHOLD {
        let tree_start = sweep(nodes, leaf, min_match_length, max_match_length, 0, n);
        spans[0] = WorkerSpan {
            tree_start,
            tree_end: n,
        };
    } else {
        let stride = (n / workers) & !15;

        // Breakpoint phase. The last worker's partition needs no search:
        // its build span always ends at n.
        let nodes_view: &[u64] = nodes;
        let leaf_view: &[u32] = leaf;
        let breakpoints: Vec<Option<usize>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|t| {
                    let start = t * stride;
                    let size = if t + 1 < workers { stride } else { n - start };
                    scope.spawn(move || {
                        if t + 1 < workers {
                            find_breakpoint(
                                nodes_view,
                                leaf_view,
                                min_match_length as u32,
                                start,
                                size,
                            )
                        } else {
                            Some(n)
                        }
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or(None))
                .collect()
        });

        // Build phase: each worker with a breakpoint owns the span from
        // the nearest breakpoint on its left (or 0) up to its own.
        let shared = BuildShared {
            nodes: nodes.as_mut_ptr(),
            nodes_len: nodes.len(),
            leaf: leaf.as_mut_ptr(),
            leaf_len: leaf.len(),
        };
        let shared = &shared;
        let breakpoints = &breakpoints;
        let results: Vec<Option<WorkerSpan>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|t| {
                    scope.spawn(move || {
                        let end = breakpoints[t]?;
                        let start = breakpoints[..t]
                            .iter()
                            .rev()
                            .find_map(|bp| *bp)
                            .unwrap_or(0);
                        if start >= end {
                            return None;
                        }
                        // SAFETY: `[start, end)` spans between adjacent
                        // breakpoints are disjoint across workers, node
                        // slots and SA reads stay inside the span, and
                        // leaf writes land on SA values owned by it.
                        let (nodes, leaf) = unsafe { shared.slices() };
                        let tree_start = sweep(
                            nodes,
                            leaf,
                            min_match_length,
                            max_match_length,
                            start,
                            end - start,
                        );
                        Some(WorkerSpan {
                            tree_start,
                            tree_end: end,
                        })
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or(None))
                .collect()
        });
        for (span, result) in spans.iter_mut().zip(results) {
            if let Some(built) = result {
                *span = built;
            }
        }
    }

    // Root sentinel: a permanently non-zero offset field terminates the
    // bottom-up walk without a null-parent check.
    if !nodes.is_empty() {
        nodes[0] = OFFSET_MASK;
    }
}
