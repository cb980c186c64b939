//! Adjacent-swap enumeration for the `~` operator.
//!
//! A transposed sequence of `n` parts may realize any of the `n!` orderings.
//! Rather than rebuilding the part list for every permutation, the builder
//! walks a precomputed *swap list*: an ordering of all permutations in which
//! each step exchanges exactly two positions. Applying the swaps one by one
//! visits every ordering exactly once, and the Cartesian product can be
//! re-emitted after each step.
//!
//! Swap lists are cached per sequence length and filled lazily on first use.
//! The cache is owned by the pattern build context — compilation state, not
//! a process-wide singleton.

use std::rc::Rc;

use rustc_hash::FxHashMap;

/// Longest sequence the `~` operator accepts.
pub const MAX_TRANSPOSITION_SIZE: usize = 9;

/// One exchange of two positions, `first < second`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Swap {
    first: usize,
    second: usize,
}

impl Swap {
    /// Exchanges the two positions in `items`.
    pub fn apply<T>(&self, items: &mut [T]) {
        items.swap(self.first, self.second);
    }
}

/// Lazily-filled swap-list cache keyed by sequence length.
#[derive(Debug, Default)]
pub struct TranspositionSupport {
    swaps: FxHashMap<usize, Rc<Vec<Swap>>>,
}

impl TranspositionSupport {
    pub fn new() -> Self {
        Self::default()
    }

    /// The swap list for sequences of `size` parts.
    ///
    /// # Panics
    ///
    /// Panics if `size` exceeds [`MAX_TRANSPOSITION_SIZE`]; the semantic
    /// checker rejects longer transpositions before expansion.
    pub fn swaps(&mut self, size: usize) -> Rc<Vec<Swap>> {
        assert!(size <= MAX_TRANSPOSITION_SIZE);
        self.swaps
            .entry(size)
            .or_insert_with(|| Rc::new(fill_swaps(size)))
            .clone()
    }
}

fn fill_swaps(size: usize) -> Vec<Swap> {
    let first: Vec<u8> = (0..size as u8).collect();
    let mut permutations = generate(&first);
    if permutations.is_empty() {
        return Vec::new();
    }

    let mut swaps = Vec::with_capacity(permutations.len().saturating_sub(1));
    let mut current = permutations.remove(0);
    while !permutations.is_empty() {
        let position = permutations
            .iter()
            .position(|candidate| connect(candidate, &current).is_some());
        let position = position.expect("permutation chain always continues");
        let next = permutations.remove(position);
        let swap = connect(&next, &current).expect("position was connectable");
        swaps.push(swap);
        current = next;
    }
    swaps
}

/// All permutations of `seq`, built by inserting the head at the front of
/// every tail permutation, then at the back.
fn generate(seq: &[u8]) -> Vec<Vec<u8>> {
    match seq.len() {
        0 => Vec::new(),
        1 => vec![seq.to_vec()],
        _ => {
            let rest = generate(&seq[1..]);
            let mut permutations = Vec::with_capacity(rest.len() * 2);
            for sub in &rest {
                let mut p = Vec::with_capacity(seq.len());
                p.push(seq[0]);
                p.extend_from_slice(sub);
                permutations.push(p);
            }
            for sub in &rest {
                let mut p = sub.clone();
                p.push(seq[0]);
                permutations.push(p);
            }
            permutations
        }
    }
}

/// The swap turning `second` into `first`, if they differ in exactly two
/// positions holding each other's values.
fn connect(first: &[u8], second: &[u8]) -> Option<Swap> {
    debug_assert_eq!(first.len(), second.len());

    let mut difference = 0;
    let mut swap = Swap { first: 0, second: 0 };
    for i in 0..first.len() {
        if first[i] != second[i] {
            difference += 1;
            match difference {
                1 => swap.first = i,
                2 => swap.second = i,
                _ => return None,
            }
        }
    }
    if difference != 2 {
        return None;
    }
    debug_assert_eq!(first[swap.first], second[swap.second]);
    debug_assert_eq!(first[swap.second], second[swap.first]);
    Some(swap)
}
