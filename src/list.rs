//! A randomized circular list for pointer chasing.
//!
//! Every node stores the index of its successor. The successor relation always
//! forms a single cycle over all nodes, so walking `len` steps from any node
//! touches every node exactly once. The order is shuffled to defeat hardware
//! prefetching, but with a fixed seed so that runs with the same size are
//! reproducible.

use rand::{Rng, SeedableRng, rngs::StdRng};
use std::{hint, iter, mem};

/// Seed used for every list built by [`CircularList::new`].
pub const LIST_SEED: u64 = 0xB1C5A11D1E;

/// Upper bound (inclusive) of the raw draws the shuffle reduces modulo `i`.
const SHUFFLE_DRAW_MAX: u32 = 1 << 30;

/// A list node. Its only content is the index of the next node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(transparent)]
pub struct ListElem {
    next: usize,
}

impl ListElem {
    pub fn next(&self) -> usize {
        self.next
    }
}

#[derive(Clone, Debug)]
pub struct CircularList {
    elems: Vec<ListElem>,
}

impl CircularList {
    /// Builds a list occupying `kb` kilobytes of node storage.
    pub fn with_footprint_kb(kb: usize) -> Self {
        Self::new(elems_for_kb(kb))
    }

    /// Builds a shuffled list of `len` nodes using [`LIST_SEED`].
    pub fn new(len: usize) -> Self {
        Self::with_seed(len, LIST_SEED)
    }

    /// Builds a shuffled list of `len` nodes.
    ///
    /// Starts from the identity cycle `i -> i + 1` and then, for `i` from
    /// `len - 2` down to `1`, moves a node next to `i` with a partner `j`
    /// drawn from `[0, i)`. Node 0 never takes the `i` role. Lists with fewer
    /// than three nodes are left in identity order.
    pub fn with_seed(len: usize, seed: u64) -> Self {
        let mut list = CircularList {
            elems: (0..len).map(|i| ListElem { next: (i + 1) % len }).collect(),
        };
        let mut rng = StdRng::seed_from_u64(seed);
        for i in (1..len.saturating_sub(1)).rev() {
            let j = rng.random_range(0..=SHUFFLE_DRAW_MAX) as usize % i;
            list.swap(i, j);
        }
        list
    }

    /// Moves the successor of `b` to directly after `a`.
    ///
    /// If the successor of `b` is `a` itself there is nothing to move.
    fn swap(&mut self, a: usize, b: usize) {
        let after_a = self.elems[a].next;
        let moved = self.elems[b].next;
        if moved == a {
            return;
        }
        self.elems[b].next = self.elems[moved].next;
        self.elems[a].next = moved;
        self.elems[moved].next = after_a;
    }

    pub fn len(&self) -> usize {
        self.elems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    pub fn elems(&self) -> &[ListElem] {
        &self.elems
    }

    /// Walks the full cycle `rounds` times, restarting at node 0 for every round.
    ///
    /// Returns the node the walk ended on. The caller should make the result
    /// observable, otherwise the walk may be optimized away.
    pub fn traverse(&self, rounds: usize) -> usize {
        let elems = hint::black_box(&self.elems[..]);
        let mut cur = 0;
        for _ in 0..rounds {
            cur = 0;
            for _ in 0..elems.len() {
                cur = elems[cur].next;
            }
            cur = hint::black_box(cur);
        }
        cur
    }

    /// Iterates over the nodes in cycle order, beginning with `start`.
    ///
    /// The iterator is infinite for non-empty lists.
    pub fn successors(&self, start: usize) -> impl Iterator<Item = usize> + '_ {
        iter::successors((!self.is_empty()).then_some(start), |&i| {
            Some(self.elems[i].next)
        })
    }
}

/// Number of nodes that fit into `kb` kilobytes.
pub fn elems_for_kb(kb: usize) -> usize {
    kb * 1024 / mem::size_of::<ListElem>()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cycle_len(list: &CircularList, start: usize) -> usize {
        list.successors(start)
            .skip(1)
            .take(list.len())
            .position(|i| i == start)
            .map_or(0, |p| p + 1)
    }

    #[test]
    fn single_cycle_for_all_sizes() {
        for len in (2..200).chain([1000, 4096, 10_007]) {
            let list = CircularList::new(len);
            for start in [0, len / 2, len - 1] {
                assert_eq!(cycle_len(&list, start), len, "len={len} start={start}");
            }
        }
    }

    #[test]
    fn single_cycle_for_other_seeds() {
        for seed in 0..50 {
            let list = CircularList::with_seed(257, seed);
            assert_eq!(cycle_len(&list, 0), 257, "seed={seed}");
        }
    }

    #[test]
    fn walk_visits_each_node_once() {
        let list = CircularList::new(5000);
        let mut seen = vec![false; list.len()];
        for i in list.successors(17).take(list.len()) {
            assert!(!seen[i], "node {i} visited twice");
            seen[i] = true;
        }
        assert!(seen.iter().all(|&x| x));
    }

    #[test]
    fn same_seed_same_order() {
        let a = CircularList::new(3000);
        let b = CircularList::new(3000);
        assert_eq!(a.elems(), b.elems());
        let c = CircularList::with_seed(3000, LIST_SEED + 1);
        assert_ne!(a.elems(), c.elems());
    }

    #[test]
    fn order_is_shuffled() {
        let list = CircularList::new(1024);
        let in_order = (0..list.len())
            .filter(|&i| list.elems()[i].next() == (i + 1) % list.len())
            .count();
        assert!(in_order < list.len() / 2, "{in_order} nodes kept identity links");
    }

    #[test]
    fn tiny_lists() {
        assert!(CircularList::new(0).is_empty());
        assert_eq!(CircularList::new(0).successors(0).next(), None);
        assert_eq!(CircularList::new(1).elems(), &[ListElem { next: 0 }]);
        assert_eq!(
            CircularList::new(2).elems(),
            &[ListElem { next: 1 }, ListElem { next: 0 }]
        );
        assert_eq!(cycle_len(&CircularList::new(3), 0), 3);
    }

    #[test]
    fn swap_moves_successor() {
        // 0 -> 1 -> 2 -> 3 -> 4 -> 0
        let mut list = CircularList {
            elems: (0..5).map(|i| ListElem { next: (i + 1) % 5 }).collect(),
        };
        list.swap(3, 0);
        // 1 is moved behind 3: 0 -> 2 -> 3 -> 1 -> 4 -> 0
        let order: Vec<_> = list.successors(0).take(5).collect();
        assert_eq!(order, vec![0, 2, 3, 1, 4]);
        // successor of 2 is 3, nothing to move
        list.swap(3, 2);
        let order: Vec<_> = list.successors(0).take(5).collect();
        assert_eq!(order, vec![0, 2, 3, 1, 4]);
    }

    #[test]
    fn traverse_returns_to_head() {
        let list = CircularList::new(777);
        assert_eq!(list.traverse(3), 0);
        assert_eq!(list.traverse(0), 0);
        assert_eq!(CircularList::new(0).traverse(5), 0);
    }

    #[test]
    fn footprint() {
        assert_eq!(mem::size_of::<ListElem>(), mem::size_of::<usize>());
        assert_eq!(elems_for_kb(4), 4096 / mem::size_of::<usize>());
        assert_eq!(CircularList::with_footprint_kb(1).len(), elems_for_kb(1));
    }
}
