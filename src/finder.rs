//! The match-finder session.
//!
//! A [`MatchFinder`] owns storage for one block at a time. [`parse`]
//! derives the suffix array and PLCP array from the block, widens the
//! suffix array in place, and builds the pruned LCP-interval tree. After
//! that, every query is a short bottom-up walk: start at the position's
//! leaf interval, follow parent links to the root, and at each node
//! compare the node's last-visit stamp against the best candidate so
//! far. The walk also stamps the current position into every visited
//! node, which is what makes the single left-to-right pass work.
//!
//! Emitted matches carry the distance back to the most recent earlier
//! occurrence. Per position they are strictly decreasing in length and
//! strictly decreasing in distance: the longest match may be far away
//! while shorter ones are available closer, and that is exactly the set
//! an optimal parser wants to price.
//!
//! Two caveats are inherent to the stamp encoding: position 0's stamp is
//! indistinguishable from "never visited", so no match ever reports
//! position 0 as its source, and a fresh session reports position -1
//! until the first successful [`parse`].
//!
//! [`parse`]: MatchFinder::parse

use crate::interval::{
    self, LCP_MAX, MAX_BLOCK_SIZE, MAX_MATCH_LENGTH, MIN_MATCH_LENGTH, OFFSET_SHIFT,
    PARENT_MASK, STORAGE_PADDING,
};
use crate::prefetch::{prefetch_read, prefetch_write};
use crate::tree::WorkerSpan;
use crate::{sais, storage, tree, EsaError, EsaResult};

/// Maximum number of build workers a session will use.
pub const MAX_WORKERS: usize = 256;

/// Rows in the prefetch ring; the walk for position `p` stages node
/// indices that position `p + 4` will chase.
const PREFETCH_RING: u64 = 4;

/// A back-reference: the `length` bytes at the current position equal
/// the `length` bytes starting `offset` bytes earlier in the block.
///
/// A zeroed match means "none".
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Match {
    pub length: i32,
    pub offset: i32,
}

/// The enhanced-suffix-array match finder.
///
/// Lifecycle: create → [`parse`] → (`find_*` / [`advance`] /
/// [`rewind`])* → drop. Storage for the node and leaf-link arrays (12
/// bytes per position of the configured maximum block size) is allocated
/// once and reused across blocks. A session is single-owner: the
/// factorization calls take `&mut self` and sessions are independent of
/// one another.
///
/// [`parse`]: MatchFinder::parse
/// [`advance`]: MatchFinder::advance
/// [`rewind`]: MatchFinder::rewind
pub struct MatchFinder {
    prefetch: [[u64; 8]; PREFETCH_RING as usize],
    position: u64,

    /// Interval node words; the low bytes double as the 32-bit suffix
    /// array buffer during parse.
    nodes: Vec<u64>,
    /// Leaf links per text position; doubles as the PLCP buffer.
    leaf: Vec<u32>,
    min_match_length_minus_1: u64,

    block_size: i32,
    max_block_size: i32,
    min_match_length: i32,
    max_match_length: i32,
    num_workers: usize,

    worker_spans: Vec<WorkerSpan>,
}

impl MatchFinder {
    /// Create a single-threaded session.
    ///
    /// Constraints: `0 <= max_block_size <= MAX_BLOCK_SIZE`,
    /// `min_match_length >= MIN_MATCH_LENGTH`,
    /// `min_match_length <= max_match_length`, and
    /// `max_match_length <= 63 + min_match_length - 1`.
    pub fn new(
        max_block_size: i32,
        min_match_length: i32,
        max_match_length: i32,
    ) -> EsaResult<Self> {
        Self::with_workers(max_block_size, min_match_length, max_match_length, 1)
    }

    /// Create a session whose parse phase fans out across `num_workers`
    /// threads. `num_workers == 0` selects the available parallelism;
    /// values above [`MAX_WORKERS`] are clamped. The factorization phase
    /// is single-threaded regardless.
    pub fn with_workers(
        max_block_size: i32,
        min_match_length: i32,
        max_match_length: i32,
        num_workers: i32,
    ) -> EsaResult<Self> {
        if max_block_size < 0
            || max_block_size > MAX_BLOCK_SIZE
            || min_match_length < MIN_MATCH_LENGTH
            || max_match_length > LCP_MAX as i32 + min_match_length - 1
            || max_match_length < min_match_length
            || num_workers < 0
        {
            return Err(EsaError::BadParameter);
        }

        let num_workers = if num_workers == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        } else {
            num_workers as usize
        }
        .min(MAX_WORKERS);

        let padded =
            (max_block_size as usize + STORAGE_PADDING - 1) & !(STORAGE_PADDING - 1);

        Ok(Self {
            prefetch: [[0; 8]; PREFETCH_RING as usize],
            position: u64::MAX,
            nodes: vec![0; padded],
            leaf: vec![0; padded],
            min_match_length_minus_1: min_match_length as u64 - 1,
            block_size: -1,
            max_block_size: padded as i32,
            min_match_length,
            max_match_length,
            num_workers,
            worker_spans: vec![WorkerSpan::default(); num_workers],
        })
    }

    /// Parse a block: derive `(SA, PLCP)`, widen the suffix array in
    /// place, and build the interval tree. On success the session is
    /// positioned at 0.
    ///
    /// All derived state is rebuilt from scratch; a previous block's
    /// tree is gone either way, so a failed parse leaves the session
    /// unusable until the next successful one.
    pub fn parse(&mut self, block: &[u8]) -> EsaResult<()> {
        if block.len() > self.max_block_size as usize {
            return Err(EsaError::BadParameter);
        }
        let n = block.len();
        self.block_size = n as i32;

        {
            let sa_view: &mut [i32] = bytemuck::cast_slice_mut(&mut self.nodes);
            sais::suffix_array(block, &mut sa_view[..n]);
            sais::plcp(block, &sa_view[..n], &mut self.leaf[..n]);
        }
        storage::widen_in_place(&mut self.nodes[..n], n, self.num_workers);
        tree::build_interval_tree(
            &mut self.nodes,
            &mut self.leaf,
            self.min_match_length as u64,
            self.max_match_length as u64,
            n,
            self.num_workers,
            &mut self.worker_spans,
        );

        self.set_position(0);
        Ok(())
    }

    /// Current position, or -1 before the first successful parse.
    pub fn position(&self) -> i32 {
        self.position as i32
    }

    /// Size of the most recently parsed block, or -1 before the first
    /// successful parse.
    pub fn block_size(&self) -> i32 {
        self.block_size
    }

    /// Move the session to `position`, forward or backward.
    ///
    /// Clears every visit stamp the current pass has written (using the
    /// per-worker node spans recorded at build time), then for a
    /// non-zero target replays positions `target-1 .. 1` newest-first,
    /// stamping only still-clear nodes. The result is bit-identical to a
    /// fresh left-to-right walk over `0 .. target`.
    pub fn rewind(&mut self, position: i32) -> EsaResult<()> {
        if position < 0 || position >= self.block_size {
            return Err(EsaError::BadParameter);
        }

        let target = position as u64;
        if self.position != target {
            if self.position != 0 {
                let nodes = &mut self.nodes;
                for span in &self.worker_spans {
                    if span.tree_start < span.tree_end {
                        storage::reset_offsets(
                            &mut nodes[span.tree_start..span.tree_end],
                            self.num_workers,
                        );
                    }
                }
            }
            if target > 0 {
                self.fast_forward(target);
            }
            self.set_position(target);
        }

        Ok(())
    }

    /// Report every distance-optimal match at the current position, then
    /// advance by one byte.
    ///
    /// `matches` must hold at least [`MAX_MATCH_LENGTH`] records; the
    /// branchless emit filter writes one slot past the returned count.
    /// Returns the number of matches recorded, ordered by strictly
    /// decreasing length and strictly decreasing offset.
    pub fn find_all_matches(&mut self, matches: &mut [Match]) -> usize {
        debug_assert!(matches.len() >= MAX_MATCH_LENGTH as usize);

        let position = self.position;
        self.position += 1;
        let row = (position & (PREFETCH_RING - 1)) as usize;
        ring_step(
            &mut self.prefetch[row],
            &self.nodes,
            &self.leaf,
            position,
            self.block_size,
        );

        let min_m1 = self.min_match_length_minus_1;
        let new_offset = position << OFFSET_SHIFT;
        // Seeding with MAX_MATCH_LENGTH keeps never-stamped nodes (whose
        // packed value has an empty high half) below the first bar.
        let mut best = MAX_MATCH_LENGTH as u64;
        let mut reference = self.leaf[position as usize] as usize;
        let mut count = 0usize;

        while reference != 0 {
            let word = self.nodes[reference];
            let packed = min_m1
                + interval::lcp(word)
                + (interval::offset_field(word) << (32 - OFFSET_SHIFT));

            matches[count] = Match {
                length: packed as i32,
                offset: (position - (packed >> 32)) as i32,
            };
            count += (packed > best) as usize;
            best = packed;

            self.nodes[reference] = interval::with_offset(word, new_offset);
            reference = interval::parent(word) as usize;
        }

        count
    }

    /// Like [`find_all_matches`], but only reports matches whose offset
    /// is at most `window_size`. The walk and stamping are identical;
    /// the window is a pure emission filter.
    ///
    /// [`find_all_matches`]: MatchFinder::find_all_matches
    pub fn find_all_matches_in_window(
        &mut self,
        window_size: i32,
        matches: &mut [Match],
    ) -> usize {
        debug_assert!(matches.len() >= MAX_MATCH_LENGTH as usize);

        let position = self.position;
        self.position += 1;
        let row = (position & (PREFETCH_RING - 1)) as usize;
        ring_step(
            &mut self.prefetch[row],
            &self.nodes,
            &self.leaf,
            position,
            self.block_size,
        );

        let window = window_size.max(0) as u64;
        let min_m1 = self.min_match_length_minus_1;
        let new_offset = position << OFFSET_SHIFT;
        let mut best = MAX_MATCH_LENGTH as u64;
        let mut reference = self.leaf[position as usize] as usize;
        let mut count = 0usize;

        while reference != 0 {
            let word = self.nodes[reference];
            let packed = min_m1
                + interval::lcp(word)
                + (interval::offset_field(word) << (32 - OFFSET_SHIFT));
            let distance = position - (packed >> 32);

            matches[count] = Match {
                length: packed as i32,
                offset: distance as i32,
            };
            count += (packed > best && distance <= window) as usize;
            best = packed;

            self.nodes[reference] = interval::with_offset(word, new_offset);
            reference = interval::parent(word) as usize;
        }

        count
    }

    /// Report the longest match at the current position (the deepest
    /// stamped interval on the walk), then advance by one byte. Returns
    /// a zeroed match if there is none.
    pub fn find_best_match(&mut self) -> Match {
        let position = self.position;
        self.position += 1;
        let row = (position & (PREFETCH_RING - 1)) as usize;
        ring_step(
            &mut self.prefetch[row],
            &self.nodes,
            &self.leaf,
            position,
            self.block_size,
        );

        let min_m1 = self.min_match_length_minus_1;
        let new_offset = position << OFFSET_SHIFT;
        let mut best = 0u64;
        let mut reference = self.leaf[position as usize] as usize;

        while reference != 0 {
            let word = self.nodes[reference];
            let packed = min_m1
                + interval::lcp(word)
                + (interval::offset_field(word) << (32 - OFFSET_SHIFT));

            let packed = if interval::offset_field(word) != 0 {
                packed
            } else {
                best
            };
            if best == 0 {
                best = packed;
            }

            self.nodes[reference] = interval::with_offset(word, new_offset);
            reference = interval::parent(word) as usize;
        }

        if best == 0 {
            Match::default()
        } else {
            Match {
                length: best as i32,
                offset: (position - (best >> 32)) as i32,
            }
        }
    }

    /// Stamp the next `count` positions without recording matches.
    /// Equivalent to `count` discarded `find_*` calls, used to skip
    /// regions cheaply. Non-positive counts are a no-op.
    pub fn advance(&mut self, count: i32) {
        let current = self.position;
        let target = current + count.max(0) as u64;
        self.position = target;

        for position in current..target {
            let row = (position & (PREFETCH_RING - 1)) as usize;
            ring_step(
                &mut self.prefetch[row],
                &self.nodes,
                &self.leaf,
                position,
                self.block_size,
            );

            let new_offset = position << OFFSET_SHIFT;
            let mut reference = self.leaf[position as usize] as usize;
            while reference != 0 {
                let word = self.nodes[reference];
                self.nodes[reference] = interval::with_offset(word, new_offset);
                reference = interval::parent(word) as usize;
            }
        }
    }

    /// Replay positions `target-1 .. 1` newest-first over a clean tree.
    ///
    /// Each walk stops at the first node that already carries a stamp:
    /// its ancestors were stamped by an even later position. Position 0
    /// is skipped because its stamp is the clear value. Every node ends
    /// up holding the most recent position below `target` that touches
    /// it, the same state a forward scan would have left.
    fn fast_forward(&mut self, target: u64) {
        const DISTANCE: u64 = 32;

        let nodes = &mut self.nodes;
        let leaf = &self.leaf;

        for position in (1..target).rev() {
            if position >= 2 * DISTANCE {
                prefetch_read(&leaf[(position - 2 * DISTANCE) as usize]);
            }
            if position >= DISTANCE {
                prefetch_write(&nodes[leaf[(position - DISTANCE) as usize] as usize]);
            }

            let offset = position << OFFSET_SHIFT;
            let mut reference = leaf[position as usize] as usize;
            let mut word = nodes[reference];
            while interval::offset_field(word) == 0 {
                // The offset field is clear, so a plain add stamps it.
                nodes[reference] = word + offset;
                reference = interval::parent(word) as usize;
                word = nodes[reference];
            }
        }
    }

    fn set_position(&mut self, position: u64) {
        self.position = position;
        self.prefetch = [[0; 8]; PREFETCH_RING as usize];
    }

    #[cfg(test)]
    pub(crate) fn node_words(&self) -> &[u64] {
        &self.nodes
    }

    #[cfg(test)]
    pub(crate) fn leaf_links(&self) -> &[u32] {
        &self.leaf
    }

    #[cfg(test)]
    pub(crate) fn spans(&self) -> &[WorkerSpan] {
        &self.worker_spans
    }
}

/// Advance one row of the prefetch ring.
///
/// The ring holds node indices staged over the last few positions; each
/// call shifts them one link up the tree and requests the corresponding
/// cache lines. Pure acceleration: the values only ever feed prefetch
/// addresses, and every index is bounds-guarded.
#[inline(always)]
fn ring_step(pf: &mut [u64; 8], nodes: &[u64], leaf: &[u32], position: u64, block_size: i32) {
    prefetch_write(&nodes[(nodes[pf[0] as usize] & PARENT_MASK) as usize]);
    for k in 0..6 {
        pf[k] = nodes[pf[k + 1] as usize] & PARENT_MASK;
        prefetch_write(&nodes[pf[k] as usize]);
    }

    let ahead = position + 8 * PREFETCH_RING;
    pf[6] = if ahead < block_size as u64 {
        leaf[ahead as usize] as u64
    } else {
        0
    };
    prefetch_write(&nodes[pf[6] as usize]);

    if let Some(entry) = leaf.get((position + 9 * PREFETCH_RING) as usize) {
        prefetch_read(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Collect the per-position match lists for a whole block.
    fn scan(finder: &mut MatchFinder) -> Vec<Vec<(i32, i32)>> {
        let mut buf = [Match::default(); MAX_MATCH_LENGTH as usize];
        (0..finder.block_size())
            .map(|_| {
                let count = finder.find_all_matches(&mut buf);
                buf[..count].iter().map(|m| (m.length, m.offset)).collect()
            })
            .collect()
    }

    #[test]
    fn test_create_validates_parameters() {
        assert!(MatchFinder::new(1 << 20, 2, 64).is_ok());
        assert!(MatchFinder::new(-1, 2, 64).is_err());
        assert!(MatchFinder::new(MAX_BLOCK_SIZE + 1, 2, 64).is_err());
        assert!(MatchFinder::new(1024, 1, 64).is_err());
        assert!(MatchFinder::new(1024, 4, 3).is_err());
        // max length is bounded by the 6-bit lcp field: 63 + min - 1.
        assert!(MatchFinder::new(1024, 2, 64).is_ok());
        assert!(MatchFinder::new(1024, 2, 65).is_err());
        assert!(MatchFinder::new(1024, 8, 70).is_ok());
        assert!(MatchFinder::with_workers(1024, 2, 64, -1).is_err());
        assert!(MatchFinder::with_workers(1024, 2, 64, 0).is_ok());
    }

    #[test]
    fn test_fresh_session_reports_position_minus_one() {
        let mut finder = MatchFinder::new(1024, 2, 64).unwrap();
        assert_eq!(finder.position(), -1);
        assert_eq!(finder.block_size(), -1);
        assert_eq!(finder.rewind(0), Err(EsaError::BadParameter));
    }

    #[test]
    fn test_parse_rejects_oversized_block() {
        let mut finder = MatchFinder::new(64, 2, 64).unwrap();
        assert!(finder.parse(&[0u8; 64]).is_ok());
        // The storage grid rounds the maximum up to 64 entries.
        assert_eq!(finder.parse(&[0u8; 65]), Err(EsaError::BadParameter));

        let mut finder = MatchFinder::new(100, 2, 64).unwrap();
        assert!(finder.parse(&[0u8; 128]).is_ok());
        assert_eq!(finder.parse(&[0u8; 129]), Err(EsaError::BadParameter));
    }

    #[test]
    fn test_literal_string_no_matches() {
        let mut finder = MatchFinder::new(64, 2, 64).unwrap();
        finder.parse(b"abcde").unwrap();
        assert_eq!(finder.position(), 0);
        let lists = scan(&mut finder);
        assert!(lists.iter().all(|l| l.is_empty()));
        assert_eq!(finder.position(), 5);
    }

    #[test]
    fn test_single_repeat() {
        let mut finder = MatchFinder::new(64, 2, 64).unwrap();
        finder.parse(b"abcabc").unwrap();
        let lists = scan(&mut finder);
        // Position 3's only candidate source is position 0, whose stamp
        // is invisible; position 4 sees "bc" at distance 3.
        assert_eq!(
            lists,
            vec![vec![], vec![], vec![], vec![], vec![(2, 3)], vec![]]
        );
    }

    #[test]
    fn test_run_lengths_overlap() {
        let mut finder = MatchFinder::new(64, 2, 64).unwrap();
        finder.parse(b"aaaaaa").unwrap();
        let lists = scan(&mut finder);
        // Overlapping run matches at distance 1; lengths are bounded by
        // the remaining suffix, and position 5's suffix is below the
        // minimum.
        assert_eq!(
            lists,
            vec![
                vec![],
                vec![],
                vec![(4, 1)],
                vec![(3, 1)],
                vec![(2, 1)],
                vec![]
            ]
        );
    }

    #[test]
    fn test_alternating_pattern() {
        let mut finder = MatchFinder::new(64, 2, 64).unwrap();
        finder.parse(b"abababab").unwrap();
        let lists = scan(&mut finder);
        assert_eq!(lists[4], vec![(4, 2)]);
        assert_eq!(lists[5], vec![(3, 2)]);
        assert_eq!(lists[6], vec![(2, 2)]);
    }

    #[test]
    fn test_max_length_cap() {
        let block = vec![b'x'; 100];
        let mut finder = MatchFinder::new(128, 2, 8).unwrap();
        finder.parse(&block).unwrap();
        let lists = scan(&mut finder);
        for (p, list) in lists.iter().enumerate() {
            for &(length, offset) in list {
                assert!(length <= 8, "position {} emitted length {}", p, length);
                assert!(offset > 0);
            }
        }
        // Once the run is established, the cap is the best length.
        for p in 8..=91 {
            assert_eq!(lists[p].first(), Some(&(8, 1)), "position {}", p);
        }
    }

    #[test]
    fn test_find_best_match_picks_deepest_stamped() {
        let mut all = MatchFinder::new(64, 2, 64).unwrap();
        let mut best = MatchFinder::new(64, 2, 64).unwrap();
        let block = b"abcabc abcabc aabbcc";
        all.parse(block).unwrap();
        best.parse(block).unwrap();

        let mut buf = [Match::default(); MAX_MATCH_LENGTH as usize];
        for _ in 0..block.len() {
            let count = all.find_all_matches(&mut buf);
            let expected = if count == 0 {
                Match::default()
            } else {
                buf[0]
            };
            assert_eq!(best.find_best_match(), expected);
        }
    }

    #[test]
    fn test_position_zero_emits_nothing() {
        let mut finder = MatchFinder::new(64, 2, 64).unwrap();
        finder.parse(b"aaaa").unwrap();
        assert_eq!(finder.find_best_match(), Match::default());
        finder.rewind(0).unwrap();
        let mut buf = [Match::default(); MAX_MATCH_LENGTH as usize];
        assert_eq!(finder.find_all_matches(&mut buf), 0);
    }

    #[test]
    fn test_advance_equals_discarded_finds() {
        let block = b"the cat sat on the mat, the cat sat on the mat";
        let mut scanned = MatchFinder::new(64, 2, 64).unwrap();
        let mut skipped = MatchFinder::new(64, 2, 64).unwrap();
        scanned.parse(block).unwrap();
        skipped.parse(block).unwrap();

        let mut buf = [Match::default(); MAX_MATCH_LENGTH as usize];
        for _ in 0..20 {
            scanned.find_all_matches(&mut buf);
        }
        skipped.advance(20);

        assert_eq!(scanned.position(), skipped.position());
        assert_eq!(scanned.node_words(), skipped.node_words());

        // Identical state implies identical output from here on.
        for _ in 20..block.len() {
            let a = scanned.find_all_matches(&mut buf);
            let matches_a: Vec<Match> = buf[..a].to_vec();
            let b = skipped.find_all_matches(&mut buf);
            assert_eq!(matches_a, buf[..b].to_vec());
        }
    }

    #[test]
    fn test_rewind_validates_target() {
        let mut finder = MatchFinder::new(64, 2, 64).unwrap();
        finder.parse(b"abcabc").unwrap();
        assert_eq!(finder.rewind(-1), Err(EsaError::BadParameter));
        assert_eq!(finder.rewind(6), Err(EsaError::BadParameter));
        assert!(finder.rewind(5).is_ok());
        assert_eq!(finder.position(), 5);
    }

    #[test]
    fn test_rewind_to_zero_replays_identically() {
        let block = b"aaaaaa";
        let mut finder = MatchFinder::new(64, 2, 64).unwrap();
        finder.parse(block).unwrap();
        let first = scan(&mut finder);
        finder.rewind(0).unwrap();
        let second = scan(&mut finder);
        assert_eq!(first, second);
    }

    #[test]
    fn test_rewind_mid_block_matches_first_pass() {
        let block = b"aaaaaa";
        let mut finder = MatchFinder::new(64, 2, 64).unwrap();
        finder.parse(block).unwrap();
        let first = scan(&mut finder);

        finder.rewind(2).unwrap();
        assert_eq!(finder.position(), 2);
        let mut buf = [Match::default(); MAX_MATCH_LENGTH as usize];
        for p in 2..block.len() {
            let count = finder.find_all_matches(&mut buf);
            let list: Vec<(i32, i32)> =
                buf[..count].iter().map(|m| (m.length, m.offset)).collect();
            assert_eq!(list, first[p], "position {} after rewind", p);
        }
    }

    #[test]
    fn test_rewind_forward_equals_advance() {
        let block = b"abcabcabcabc";
        let mut rewound = MatchFinder::new(64, 2, 64).unwrap();
        let mut advanced = MatchFinder::new(64, 2, 64).unwrap();
        rewound.parse(block).unwrap();
        advanced.parse(block).unwrap();

        rewound.rewind(7).unwrap();
        advanced.advance(7);
        assert_eq!(rewound.node_words(), advanced.node_words());
    }

    #[test]
    fn test_windowed_filter() {
        // "abcde" appears at 1 and 13, "abc" at 8. Position 13 finds the
        // long match far away and the short one nearby; a window of 5
        // keeps only the near one. The windowed walk must always agree
        // with filtering the unwindowed output by distance.
        let block = b"zabcdez_abcf_abcdeq";
        let mut finder = MatchFinder::new(64, 2, 64).unwrap();
        finder.parse(block).unwrap();

        let mut full = MatchFinder::new(64, 2, 64).unwrap();
        full.parse(block).unwrap();

        let mut buf = [Match::default(); MAX_MATCH_LENGTH as usize];
        for p in 0..block.len() {
            let count = finder.find_all_matches_in_window(5, &mut buf);
            let windowed: Vec<Match> = buf[..count].to_vec();
            let full_count = full.find_all_matches(&mut buf);
            let unwindowed: Vec<Match> = buf[..full_count].to_vec();
            if p == 13 {
                assert_eq!(
                    unwindowed,
                    vec![
                        Match { length: 5, offset: 12 },
                        Match { length: 3, offset: 5 }
                    ]
                );
                assert_eq!(windowed, vec![Match { length: 3, offset: 5 }]);
            }
            let expected: Vec<Match> =
                unwindowed.into_iter().filter(|m| m.offset <= 5).collect();
            assert_eq!(windowed, expected, "position {}", p);
        }
    }

    #[test]
    fn test_session_reuse_across_blocks() {
        let mut finder = MatchFinder::new(256, 2, 64).unwrap();

        finder.parse(b"abcabc").unwrap();
        let first = scan(&mut finder);
        assert_eq!(first[4], vec![(2, 3)]);

        // A different block fully replaces the derived state.
        finder.parse(b"xyzxyzxyz").unwrap();
        assert_eq!(finder.position(), 0);
        let second = scan(&mut finder);
        assert_eq!(second[4], vec![(5, 3)]);
        assert_eq!(second[6], vec![(3, 3)]);

        // And the original block parses back to the original answers.
        finder.parse(b"abcabc").unwrap();
        assert_eq!(scan(&mut finder), first);
    }

    #[test]
    fn test_empty_block_parses() {
        let mut finder = MatchFinder::new(64, 2, 64).unwrap();
        finder.parse(&[]).unwrap();
        assert_eq!(finder.position(), 0);
        assert_eq!(finder.block_size(), 0);
        assert_eq!(finder.rewind(0), Err(EsaError::BadParameter));
    }
}
