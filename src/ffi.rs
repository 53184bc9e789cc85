//! C-callable FFI layer.
//!
//! Exposes the match finder behind an opaque handle with simple C types:
//! integer status codes, a plain-value match record, and caller-owned
//! output arrays. All Rust internals stay behind the handle.

use std::slice;

use crate::finder::{Match, MatchFinder};
use crate::interval::MAX_MATCH_LENGTH;

/// Operation completed.
pub const ESALZ_NO_ERROR: i32 = 0;
/// A parameter constraint was violated; the operation had no effect.
pub const ESALZ_BAD_PARAMETER: i32 = -1;

/// Create a single-threaded match-finder session.
///
/// Returns an opaque handle, or null if the parameters violate the
/// documented constraints.
#[no_mangle]
pub extern "C" fn esalz_create(
    max_block_size: i32,
    min_match_length: i32,
    max_match_length: i32,
) -> *mut MatchFinder {
    match MatchFinder::new(max_block_size, min_match_length, max_match_length) {
        Ok(finder) => Box::into_raw(Box::new(finder)),
        Err(_) => std::ptr::null_mut(),
    }
}

/// Create a session whose parse phase uses `num_workers` threads.
/// `num_workers == 0` selects an implementation default.
#[no_mangle]
pub extern "C" fn esalz_create_parallel(
    max_block_size: i32,
    min_match_length: i32,
    max_match_length: i32,
    num_workers: i32,
) -> *mut MatchFinder {
    match MatchFinder::with_workers(
        max_block_size,
        min_match_length,
        max_match_length,
        num_workers,
    ) {
        Ok(finder) => Box::into_raw(Box::new(finder)),
        Err(_) => std::ptr::null_mut(),
    }
}

/// Destroy a session and free its storage.
///
/// # Safety
///
/// `mf` must be a pointer returned by [`esalz_create`] /
/// [`esalz_create_parallel`], or null. After this call the pointer is
/// invalid and must not be reused.
#[no_mangle]
pub unsafe extern "C" fn esalz_destroy(mf: *mut MatchFinder) {
    if !mf.is_null() {
        let _ = Box::from_raw(mf);
    }
}

/// Parse an input block. On success the session is positioned at 0.
///
/// # Safety
///
/// - `mf` must be a valid session handle or null.
/// - `block` must point to at least `block_size` readable bytes.
#[no_mangle]
pub unsafe extern "C" fn esalz_parse(
    mf: *mut MatchFinder,
    block: *const u8,
    block_size: i32,
) -> i32 {
    if mf.is_null() || block.is_null() || block_size < 0 {
        return ESALZ_BAD_PARAMETER;
    }

    let finder = &mut *mf;
    let block = slice::from_raw_parts(block, block_size as usize);
    match finder.parse(block) {
        Ok(()) => ESALZ_NO_ERROR,
        Err(_) => ESALZ_BAD_PARAMETER,
    }
}

/// Current position, or -1 on a null handle or before the first parse.
///
/// # Safety
///
/// `mf` must be a valid session handle or null.
#[no_mangle]
pub unsafe extern "C" fn esalz_get_position(mf: *const MatchFinder) -> i32 {
    if mf.is_null() {
        return -1;
    }
    (*mf).position()
}

/// Rewind the session forward or backward to `position`.
///
/// # Safety
///
/// `mf` must be a valid session handle or null.
#[no_mangle]
pub unsafe extern "C" fn esalz_rewind(mf: *mut MatchFinder, position: i32) -> i32 {
    if mf.is_null() {
        return ESALZ_BAD_PARAMETER;
    }
    match (*mf).rewind(position) {
        Ok(()) => ESALZ_NO_ERROR,
        Err(_) => ESALZ_BAD_PARAMETER,
    }
}

/// Report all distance-optimal matches at the current position and
/// advance by one byte. Returns a pointer just past the last recorded
/// match (equal to `matches` when none were found).
///
/// # Safety
///
/// - `mf` must be a valid session handle (non-null, successfully
///   parsed, position within the block).
/// - `matches` must point to an array of at least
///   [`MAX_MATCH_LENGTH`](crate::interval::MAX_MATCH_LENGTH) records.
#[no_mangle]
pub unsafe extern "C" fn esalz_find_all_matches(
    mf: *mut MatchFinder,
    matches: *mut Match,
) -> *mut Match {
    if mf.is_null() || matches.is_null() {
        return matches;
    }
    let out = slice::from_raw_parts_mut(matches, MAX_MATCH_LENGTH as usize);
    let count = (*mf).find_all_matches(out);
    matches.add(count)
}

/// Like [`esalz_find_all_matches`], restricted to matches whose offset
/// is at most `window_size`.
///
/// # Safety
///
/// Same requirements as [`esalz_find_all_matches`].
#[no_mangle]
pub unsafe extern "C" fn esalz_find_all_matches_in_window(
    mf: *mut MatchFinder,
    window_size: i32,
    matches: *mut Match,
) -> *mut Match {
    if mf.is_null() || matches.is_null() {
        return matches;
    }
    let out = slice::from_raw_parts_mut(matches, MAX_MATCH_LENGTH as usize);
    let count = (*mf).find_all_matches_in_window(window_size, out);
    matches.add(count)
}

/// Report the best match at the current position and advance by one
/// byte. Returns a zeroed match if none was found (or on a null handle).
///
/// # Safety
///
/// `mf` must be a valid session handle or null.
#[no_mangle]
pub unsafe extern "C" fn esalz_find_best_match(mf: *mut MatchFinder) -> Match {
    if mf.is_null() {
        return Match::default();
    }
    (*mf).find_best_match()
}

/// Advance the position by `count` bytes without recording matches.
///
/// # Safety
///
/// `mf` must be a valid session handle or null.
#[no_mangle]
pub unsafe extern "C" fn esalz_advance(mf: *mut MatchFinder, count: i32) {
    if !mf.is_null() {
        (*mf).advance(count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_destroy() {
        unsafe {
            let mf = esalz_create(1 << 16, 2, 64);
            assert!(!mf.is_null());
            esalz_destroy(mf);
            esalz_destroy(std::ptr::null_mut());
        }
    }

    #[test]
    fn test_create_rejects_bad_parameters() {
        assert!(esalz_create(-1, 2, 64).is_null());
        assert!(esalz_create(1024, 1, 64).is_null());
        assert!(esalz_create(1024, 4, 2).is_null());
        assert!(esalz_create(1024, 2, 65).is_null());
        assert!(esalz_create_parallel(1024, 2, 64, -1).is_null());
    }

    #[test]
    fn test_parse_and_find_round_trip() {
        unsafe {
            let mf = esalz_create(1024, 2, 64);
            assert!(!mf.is_null());
            assert_eq!(esalz_get_position(mf), -1);

            let block = b"abcabc";
            assert_eq!(
                esalz_parse(mf, block.as_ptr(), block.len() as i32),
                ESALZ_NO_ERROR
            );
            assert_eq!(esalz_get_position(mf), 0);

            let mut matches = [Match::default(); MAX_MATCH_LENGTH as usize];
            let mut counts = Vec::new();
            for _ in 0..block.len() {
                let end = esalz_find_all_matches(mf, matches.as_mut_ptr());
                counts.push(end.offset_from(matches.as_ptr()));
            }
            assert_eq!(counts, vec![0, 0, 0, 0, 1, 0]);
            assert_eq!(matches[0], Match { length: 2, offset: 3 });
            assert_eq!(esalz_get_position(mf), 6);

            assert_eq!(esalz_rewind(mf, 0), ESALZ_NO_ERROR);
            assert_eq!(esalz_get_position(mf), 0);
            assert_eq!(esalz_rewind(mf, 6), ESALZ_BAD_PARAMETER);

            esalz_destroy(mf);
        }
    }

    #[test]
    fn test_best_match_and_advance() {
        unsafe {
            let mf = esalz_create(1024, 2, 64);
            let block = b"aaaaaa";
            assert_eq!(
                esalz_parse(mf, block.as_ptr(), block.len() as i32),
                ESALZ_NO_ERROR
            );

            esalz_advance(mf, 2);
            let m = esalz_find_best_match(mf);
            assert_eq!(m, Match { length: 4, offset: 1 });

            esalz_destroy(mf);
        }
    }

    #[test]
    fn test_null_safety() {
        unsafe {
            let block = b"x";
            assert_eq!(
                esalz_parse(std::ptr::null_mut(), block.as_ptr(), 1),
                ESALZ_BAD_PARAMETER
            );
            let mf = esalz_create(64, 2, 64);
            assert_eq!(esalz_parse(mf, std::ptr::null(), 1), ESALZ_BAD_PARAMETER);
            assert_eq!(esalz_parse(mf, block.as_ptr(), -1), ESALZ_BAD_PARAMETER);
            assert_eq!(esalz_rewind(std::ptr::null_mut(), 0), ESALZ_BAD_PARAMETER);
            assert_eq!(esalz_get_position(std::ptr::null()), -1);
            assert_eq!(
                esalz_find_best_match(std::ptr::null_mut()),
                Match::default()
            );
            esalz_advance(std::ptr::null_mut(), 3);
            esalz_destroy(mf);
        }
    }
}
