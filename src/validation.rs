//! Validation tests for the match-finding engine.
//!
//! These tests verify:
//! 1. **Optimality** — every per-position match list agrees with a
//!    brute-force reference search
//! 2. **Tree invariants** — well-formedness and leaf-link soundness
//!    after parsing arbitrary inputs
//! 3. **State discipline** — offset stamps never disturb the tree
//!    structure; rewind restores bit-identical state
//! 4. **Pass repeatability** — rescanning a block reproduces the same
//!    output
//! 5. **Parallel equivalence** — multi-worker builds answer exactly like
//!    single-worker builds
