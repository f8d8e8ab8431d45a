//! Inverted repeats: a block of at least three bases, a gap of up to ten
//! arbitrary characters, and a second block that reads as the first one
//! backwards (`ACG..GCA`). Bases are not complemented.
//!
//! At every scan position the accepted candidate is the one a backtracking
//! search for `([ACGT]{3,}).{0,10}([ACGT]{3,})` would reach first among those
//! passing the reversal test: the longest first block, then the longest gap.
//! Rather than enumerating candidates per position, the mirrored arm length is
//! computed once for every (inner end, gap) pair, by binary search over
//! substring hashes of the sequence and its reversal, and the scan keeps the
//! candidates covering the current position in a max-heap.

use crate::motif_catalog::INVERTED_REPEAT;
use motifscan_protocol::MotifMatch;
use std::collections::BinaryHeap;

pub const MIN_ARM: usize = 3;
pub const MAX_GAP: usize = 10;

#[inline(always)]
fn is_base(b: u8) -> bool {
    matches!(b, b'A' | b'C' | b'G' | b'T')
}

/// Every start position in `left..=inner_end - 2` can open an inverted repeat
/// whose first block ends at `inner_end`, followed by `gap` characters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Candidate {
    left: usize,
    inner_end: usize,
    gap: usize,
}

const HASH_MOD: u64 = (1 << 61) - 1;
const HASH_BASE: u64 = 1_000_000_007;

#[inline(always)]
fn mul_mod(a: u64, b: u64) -> u64 {
    let p = a as u128 * b as u128;
    let r = ((p & HASH_MOD as u128) + (p >> 61)) as u64;
    if r >= HASH_MOD { r - HASH_MOD } else { r }
}

/// Polynomial prefix hashes modulo 2^61 - 1, for constant-time substring
/// comparison.
struct PrefixHash {
    prefix: Vec<u64>,
    powers: Vec<u64>,
}

impl PrefixHash {
    fn new(bytes: impl Iterator<Item = u8>) -> Self {
        let mut prefix = vec![0];
        let mut powers = vec![1];
        for b in bytes {
            let h = mul_mod(*prefix.last().unwrap_or(&0), HASH_BASE) + b as u64 + 1;
            prefix.push(if h >= HASH_MOD { h - HASH_MOD } else { h });
            powers.push(mul_mod(*powers.last().unwrap_or(&1), HASH_BASE));
        }
        Self { prefix, powers }
    }

    fn get(&self, from: usize, len: usize) -> u64 {
        let shifted = mul_mod(self.prefix[from], self.powers[len]);
        let h = self.prefix[from + len] + HASH_MOD - shifted;
        if h >= HASH_MOD { h - HASH_MOD } else { h }
    }
}

/// Answers "how far do the bases left of `inner_end` mirror the bases from
/// `right` on" by comparing the reversed sequence against the sequence.
struct ArmIndex {
    forward: PrefixHash,
    reversed: PrefixHash,
    /// Bases ending at each position, inclusive.
    run_left: Vec<usize>,
    /// Bases starting at each position.
    run_right: Vec<usize>,
}

impl ArmIndex {
    fn new(sequence: &[u8]) -> Self {
        let n = sequence.len();
        let mut run_left = vec![0; n];
        let mut run_right = vec![0; n + 1];
        for i in 0..n {
            if is_base(sequence[i]) {
                run_left[i] = if i == 0 { 1 } else { run_left[i - 1] + 1 };
            }
        }
        for i in (0..n).rev() {
            if is_base(sequence[i]) {
                run_right[i] = run_right[i + 1] + 1;
            }
        }
        Self {
            forward: PrefixHash::new(sequence.iter().copied()),
            reversed: PrefixHash::new(sequence.iter().rev().copied()),
            run_left,
            run_right,
        }
    }

    fn mirrors(&self, inner_end: usize, right: usize, len: usize) -> bool {
        let n = self.run_left.len();
        self.reversed.get(n - 1 - inner_end, len) == self.forward.get(right, len)
    }

    /// Longest `arm` with `sequence[inner_end - j] == sequence[right + j]`
    /// for all `j < arm`, counting bases only.
    fn arm(&self, inner_end: usize, right: usize) -> usize {
        let bound = self.run_left[inner_end].min(self.run_right[right]);
        let (mut lo, mut hi) = (0, bound);
        while lo < hi {
            let mid = lo + (hi - lo).div_ceil(2);
            if self.mirrors(inner_end, right, mid) {
                lo = mid;
            } else {
                hi = mid - 1;
            }
        }
        lo
    }
}

fn candidates(sequence: &[u8]) -> Vec<Candidate> {
    let n = sequence.len();
    let index = ArmIndex::new(sequence);
    let mut ret = vec![];
    for inner_end in (MIN_ARM - 1)..n {
        if !is_base(sequence[inner_end]) {
            continue;
        }
        for gap in 0..=MAX_GAP {
            // `.` never matches a newline
            if gap > 0 && sequence.get(inner_end + gap).is_none_or(|b| *b == b'\n') {
                break;
            }
            let right = inner_end + 1 + gap;
            if right >= n {
                break;
            }
            if sequence[right] != sequence[inner_end] {
                continue;
            }
            let arm = index.arm(inner_end, right);
            if arm >= MIN_ARM {
                ret.push(Candidate {
                    left: inner_end + 1 - arm,
                    inner_end,
                    gap,
                });
            }
        }
    }
    ret.sort_by_key(|c| c.left);
    ret
}

/// Non-overlapping inverted repeats, left to right.
pub fn find_inverted_repeats(sequence: &[u8]) -> Vec<MotifMatch> {
    let candidates = candidates(sequence);
    let mut heap: BinaryHeap<(usize, usize)> = BinaryHeap::new();
    let mut next = 0;
    let mut ret = vec![];
    let mut pos = 0;
    while pos < sequence.len() {
        while let Some(c) = candidates.get(next).filter(|c| c.left <= pos) {
            heap.push((c.inner_end, c.gap));
            next += 1;
        }
        while heap
            .peek()
            .is_some_and(|(inner_end, _)| *inner_end + 1 < pos + MIN_ARM)
        {
            heap.pop();
        }
        match heap.peek() {
            Some(&(inner_end, gap)) => {
                let arm = inner_end + 1 - pos;
                let end = inner_end + 1 + gap + arm;
                ret.push(MotifMatch::from_span(INVERTED_REPEAT, sequence, pos, end));
                pos = end;
            }
            None => pos += 1,
        }
    }
    ret
}
