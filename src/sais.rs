//! Suffix array and PLCP construction.
//!
//! The match finder consumes two arrays derived from the input block:
//! the suffix array (SA) and the permuted longest-common-prefix array
//! (PLCP). Both are built here in linear time and written into buffers
//! owned by the session, so the tree builder can reuse that storage in
//! place.
//!
//! **Suffix array:** SA-IS (induced sorting with recursive substring
//! naming), O(n). The input bytes are mapped to `1..=256` and terminated
//! with a unique sentinel `0` smaller than every character.
//!
//! **PLCP:** the Φ (predecessor) scan. `PLCP[p]` is the length of the
//! common prefix between `p`'s suffix and the suffix preceding it in SA
//! order; successive entries differ by at most one, which bounds the
//! total extension work at O(n). `PLCP[SA[0]] = 0` by convention.

/// Build the suffix array of `block` into `sa[..block.len()]`.
///
/// `sa` must have at least `block.len()` entries; anything past that is
/// left untouched. Block sizes are bounded by
/// [`MAX_BLOCK_SIZE`](crate::interval::MAX_BLOCK_SIZE), so every
/// position fits an `i32`.
pub fn suffix_array(block: &[u8], sa: &mut [i32]) {
    let n = block.len();
    debug_assert!(sa.len() >= n);

    if n == 0 {
        return;
    }
    if n == 1 {
        sa[0] = 0;
        return;
    }

    // Map to 1..=256 and append the sentinel so every suffix comparison
    // terminates at a unique smallest character.
    let mut text: Vec<usize> = Vec::with_capacity(n + 1);
    for &b in block {
        text.push(b as usize + 1);
    }
    text.push(0);

    let full = sais_core(&text, 257);

    // full[0] is the sentinel suffix at position n; the remaining
    // entries are the suffix array of the original block.
    debug_assert_eq!(full[0], n);
    for (dst, &src) in sa[..n].iter_mut().zip(&full[1..]) {
        *dst = src as i32;
    }
}

/// Build the PLCP array of `block` into `out[..block.len()]`, given its
/// suffix array.
///
/// Uses `out` as scratch for the Φ array first, so no extra allocation
/// is needed: `Φ[p]` is consumed at step `p` of the extension scan,
/// exactly when `out[p]` is rewritten with the PLCP value.
pub fn plcp(block: &[u8], sa: &[i32], out: &mut [u32]) {
    let n = block.len();
    debug_assert!(sa.len() >= n && out.len() >= n);

    if n == 0 {
        return;
    }

    // Φ[SA[i]] = SA[i-1]; the first suffix in SA order has no
    // predecessor and gets PLCP 0.
    const NO_PREDECESSOR: u32 = u32::MAX;
    out[sa[0] as usize] = NO_PREDECESSOR;
    for i in 1..n {
        out[sa[i] as usize] = sa[i - 1] as u32;
    }

    let mut l = 0usize;
    for p in 0..n {
        let q = out[p];
        if q == NO_PREDECESSOR {
            out[p] = 0;
            l = 0;
            continue;
        }
        let q = q as usize;
        while p + l < n && q + l < n && block[p + l] == block[q + l] {
            l += 1;
        }
        out[p] = l as u32;
        // PLCP[p+1] >= PLCP[p] - 1, so the next extension resumes here.
        l = l.saturating_sub(1);
    }
}

/// SA-IS core: suffix array of integer text with alphabet `[0, alpha)`.
///
/// `text` must end with a unique sentinel (value 0) that is the smallest
/// character.
fn sais_core(text: &[usize], alpha: usize) -> Vec<usize> {
    let n = text.len();
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![0];
    }
    if n == 2 {
        // Sentinel is at [1], so the order is fixed unless text[0] is
        // somehow smaller (it cannot be, but keep the comparison).
        return if text[0] > text[1] {
            vec![1, 0]
        } else {
            vec![0, 1]
        };
    }

    // Classify suffixes: suffix i is S-type iff text[i..] < text[i+1..].
    // The sentinel suffix is S-type by definition.
    let mut s_type = vec![false; n];
    s_type[n - 1] = true;
    for i in (0..n - 1).rev() {
        s_type[i] = match text[i].cmp(&text[i + 1]) {
            std::cmp::Ordering::Less => true,
            std::cmp::Ordering::Greater => false,
            std::cmp::Ordering::Equal => s_type[i + 1],
        };
    }

    // LMS positions: S-type preceded by L-type.
    let lms_positions: Vec<usize> = (1..n)
        .filter(|&i| s_type[i] && !s_type[i - 1])
        .collect();

    let mut sa = vec![usize::MAX; n];

    // First induction pass: seed with LMS positions in text order.
    place_lms(&mut sa, text, alpha, lms_positions.iter().rev().copied());
    induce(&mut sa, text, alpha, &s_type);

    // Name the now-sorted LMS substrings.
    let mut sorted_lms: Vec<usize> = Vec::with_capacity(lms_positions.len());
    for &s in &sa {
        if s != usize::MAX && s > 0 && s_type[s] && !s_type[s - 1] {
            sorted_lms.push(s);
        }
    }

    let mut names = vec![usize::MAX; n];
    let mut name_count = 0usize;
    let mut prev = usize::MAX;
    for &pos in &sorted_lms {
        if prev == usize::MAX || !lms_equal(text, &s_type, prev, pos) {
            name_count += 1;
        }
        names[pos] = name_count - 1;
        prev = pos;
    }

    sa.fill(usize::MAX);
    if name_count < sorted_lms.len() {
        // Names collide: recurse on the reduced string to rank the LMS
        // suffixes exactly.
        let reduced: Vec<usize> = lms_positions.iter().map(|&p| names[p]).collect();
        let reduced_sa = sais_core(&reduced, name_count);
        place_lms(
            &mut sa,
            text,
            alpha,
            reduced_sa.iter().rev().map(|&r| lms_positions[r]),
        );
    } else {
        place_lms(&mut sa, text, alpha, lms_positions.iter().rev().copied());
    }
    induce(&mut sa, text, alpha, &s_type);

    sa
}

/// Bucket boundaries per character: tails when `end` is true, heads
/// otherwise.
fn bucket_bounds(text: &[usize], alpha: usize, end: bool) -> Vec<usize> {
    let mut buckets = vec![0usize; alpha];
    for &c in text {
        buckets[c] += 1;
    }
    let mut sum = 0;
    for b in buckets.iter_mut() {
        sum += *b;
        *b = if end { sum } else { sum - *b };
    }
    buckets
}

/// Drop LMS suffixes at the tails of their buckets, right to left.
/// `positions` must iterate the LMS positions in reverse rank order.
fn place_lms<I>(sa: &mut [usize], text: &[usize], alpha: usize, positions: I)
where
    I: Iterator<Item = usize>,
{
    let mut tails = bucket_bounds(text, alpha, true);
    for lms in positions {
        let c = text[lms];
        tails[c] -= 1;
        sa[tails[c]] = lms;
    }
}

/// Induced sort: L-type suffixes left to right, then S-type right to
/// left. Overwrites the seeded LMS entries with their final positions.
fn induce(sa: &mut [usize], text: &[usize], alpha: usize, s_type: &[bool]) {
    let n = text.len();

    let mut heads = bucket_bounds(text, alpha, false);
    for i in 0..n {
        if sa[i] == usize::MAX || sa[i] == 0 {
            continue;
        }
        let j = sa[i] - 1;
        if !s_type[j] {
            let c = text[j];
            sa[heads[c]] = j;
            heads[c] += 1;
        }
    }

    let mut tails = bucket_bounds(text, alpha, true);
    for i in (0..n).rev() {
        if sa[i] == usize::MAX || sa[i] == 0 {
            continue;
        }
        let j = sa[i] - 1;
        if s_type[j] {
            let c = text[j];
            tails[c] -= 1;
            sa[tails[c]] = j;
        }
    }
}

/// Compare the LMS substrings starting at `a` and `b` for equality
/// (characters and types, up to and including the next LMS position).
fn lms_equal(text: &[usize], s_type: &[bool], a: usize, b: usize) -> bool {
    let n = text.len();
    let mut i = 0;
    loop {
        let ai = a + i;
        let bi = b + i;
        if ai >= n || bi >= n {
            return ai >= n && bi >= n;
        }
        if text[ai] != text[bi] || s_type[ai] != s_type[bi] {
            return false;
        }
        if i > 0 {
            let a_lms = s_type[ai] && !s_type[ai - 1];
            let b_lms = s_type[bi] && !s_type[bi - 1];
            if a_lms || b_lms {
                return a_lms && b_lms;
            }
        }
        i += 1;
    }
}
