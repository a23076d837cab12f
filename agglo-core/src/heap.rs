//! Binary min-heap addressed by item identity.
//!
//! The heap owns the value buffer so that values can be read and updated by
//! identity while the heap order is maintained over a separate permutation.

/// Min-heap over `f64` values whose entries are addressed by a stable
/// identity rather than by heap position.
///
/// `ids[pos]` gives the identity stored at heap position `pos` and
/// `positions[id]` inverts it for every identity currently in the heap.
///
/// # Examples
/// ```
/// use agglo_core::IndexedMinHeap;
///
/// let mut heap = IndexedMinHeap::new(vec![4.0, 1.0, 3.0]);
/// heap.heapify();
/// assert_eq!(heap.argmin(), 1);
/// heap.update(1, 5.0);
/// assert_eq!(heap.argmin(), 2);
/// heap.heap_pop();
/// assert_eq!(heap.argmin(), 0);
/// assert_eq!(heap.len(), 2);
/// ```
#[derive(Clone, Debug)]
pub struct IndexedMinHeap {
    values: Vec<f64>,
    ids: Vec<usize>,
    positions: Vec<usize>,
    len: usize,
}

impl IndexedMinHeap {
    /// Creates a heap holding identities `0..values.len()`.
    ///
    /// Call [`heapify`](Self::heapify) before querying the minimum.
    #[must_use]
    pub fn new(values: Vec<f64>) -> Self {
        let len = values.len();
        Self::with_offset(values, len, 0)
    }

    /// Creates a heap holding the `len` identities `start..start + len`.
    ///
    /// The value buffer may be larger than `start + len`; identities beyond
    /// that range can later enter the heap through
    /// [`replace`](Self::replace).
    ///
    /// # Panics
    /// Panics when `start + len` exceeds `values.len()`.
    #[must_use]
    pub fn with_offset(values: Vec<f64>, len: usize, start: usize) -> Self {
        assert!(
            start + len <= values.len(),
            "value buffer too small for identities {start}..{}",
            start + len
        );
        let ids: Vec<usize> = (start..start + len).collect();
        let mut positions = vec![0; values.len()];
        for (pos, &id) in ids.iter().enumerate() {
            positions[id] = pos;
        }
        Self {
            values,
            ids,
            positions,
            len,
        }
    }

    /// Restores the heap property over the whole heap in O(len).
    pub fn heapify(&mut self) {
        for pos in (0..self.len / 2).rev() {
            self.sift_down(pos);
        }
    }

    /// Returns the identity with the smallest value.
    #[inline]
    #[must_use]
    pub fn argmin(&self) -> usize {
        debug_assert!(self.len > 0, "argmin of empty heap");
        self.ids[0]
    }

    /// Returns the value currently associated with `id`.
    ///
    /// Values of identities that left the heap remain readable.
    #[inline]
    #[must_use]
    pub fn value(&self, id: usize) -> f64 {
        self.values[id]
    }

    /// Removes the minimum from the heap.
    pub fn heap_pop(&mut self) {
        debug_assert!(self.len > 0, "pop from empty heap");
        self.len -= 1;
        self.ids[0] = self.ids[self.len];
        self.positions[self.ids[0]] = 0;
        self.sift_down(0);
    }

    /// Removes `id` from the heap.
    pub fn remove(&mut self, id: usize) {
        debug_assert!(self.contains(id), "identity {id} is not in the heap");
        self.len -= 1;
        let pos = self.positions[id];
        let last = self.ids[self.len];
        self.positions[last] = pos;
        self.ids[pos] = last;
        if pos == self.len {
            return;
        }
        if self.values[last] <= self.values[id] {
            self.sift_up(pos);
        } else {
            self.sift_down(pos);
        }
    }

    /// Replaces `old` with the new identity `new` carrying `value`.
    pub fn replace(&mut self, old: usize, new: usize, value: f64) {
        debug_assert!(self.contains(old), "identity {old} is not in the heap");
        let pos = self.positions[old];
        self.positions[new] = pos;
        self.ids[pos] = new;
        let previous = self.values[old];
        self.values[new] = value;
        if value <= previous {
            self.sift_up(pos);
        } else {
            self.sift_down(pos);
        }
    }

    /// Sets the value of `id` and restores the heap in either direction.
    pub fn update(&mut self, id: usize, value: f64) {
        let previous = self.values[id];
        self.values[id] = value;
        if value <= previous {
            self.sift_up(self.positions[id]);
        } else {
            self.sift_down(self.positions[id]);
        }
    }

    /// Sets the value of `id`, which must not increase.
    pub fn update_leq(&mut self, id: usize, value: f64) {
        debug_assert!(
            !(value > self.values[id]),
            "update_leq raised the value of {id}"
        );
        self.values[id] = value;
        self.sift_up(self.positions[id]);
    }

    /// Sets the value of `id`, which must not decrease.
    pub fn update_geq(&mut self, id: usize, value: f64) {
        debug_assert!(
            !(value < self.values[id]),
            "update_geq lowered the value of {id}"
        );
        self.values[id] = value;
        self.sift_down(self.positions[id]);
    }

    /// Returns the number of identities in the heap.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` when the heap is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn contains(&self, id: usize) -> bool {
        let pos = self.positions[id];
        pos < self.len && self.ids[pos] == id
    }

    fn key(&self, pos: usize) -> f64 {
        self.values[self.ids[pos]]
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.ids.swap(a, b);
        self.positions[self.ids[a]] = a;
        self.positions[self.ids[b]] = b;
    }

    fn sift_up(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) >> 1;
            if self.key(parent) <= self.key(pos) {
                break;
            }
            self.swap(pos, parent);
            pos = parent;
        }
    }

    fn sift_down(&mut self, mut pos: usize) {
        loop {
            let left = 2 * pos + 1;
            if left >= self.len {
                break;
            }
            let right = left + 1;
            let child = if right < self.len && self.key(right) < self.key(left) {
                right
            } else {
                left
            };
            if self.key(pos) <= self.key(child) {
                break;
            }
            self.swap(pos, child);
            pos = child;
        }
    }

    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        for pos in 1..self.len {
            let parent = (pos - 1) >> 1;
            assert!(
                self.key(parent) <= self.key(pos),
                "heap order violated at position {pos}"
            );
        }
        for pos in 0..self.len {
            assert_eq!(self.positions[self.ids[pos]], pos, "broken position map");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn heap_of(values: &[f64]) -> IndexedMinHeap {
        let mut heap = IndexedMinHeap::new(values.to_vec());
        heap.heapify();
        heap.assert_invariants();
        heap
    }

    fn drain(mut heap: IndexedMinHeap) -> Vec<usize> {
        let mut order = Vec::with_capacity(heap.len());
        while !heap.is_empty() {
            order.push(heap.argmin());
            heap.heap_pop();
            heap.assert_invariants();
        }
        order
    }

    #[test]
    #[should_panic(expected = "value buffer too small")]
    fn offset_range_must_fit_the_buffer() {
        drop(IndexedMinHeap::with_offset(vec![1.0, 2.0], 2, 1));
    }

    #[rstest]
    #[case(&[3.0, 1.0, 2.0], vec![1, 2, 0])]
    #[case(&[5.0, 4.0, 3.0, 2.0, 1.0], vec![4, 3, 2, 1, 0])]
    #[case(&[0.5], vec![0])]
    fn pops_in_value_order(#[case] values: &[f64], #[case] expected: Vec<usize>) {
        assert_eq!(drain(heap_of(values)), expected);
    }

    #[test]
    fn update_moves_both_directions() {
        let mut heap = heap_of(&[1.0, 2.0, 3.0, 4.0]);
        heap.update(0, 10.0);
        heap.assert_invariants();
        assert_eq!(heap.argmin(), 1);
        heap.update(3, 0.0);
        heap.assert_invariants();
        assert_eq!(heap.argmin(), 3);
        assert_eq!(drain(heap), vec![3, 1, 2, 0]);
    }

    #[test]
    fn remove_takes_identity_out() {
        let mut heap = heap_of(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        heap.remove(0);
        heap.assert_invariants();
        heap.remove(4);
        heap.assert_invariants();
        assert_eq!(drain(heap), vec![1, 2, 3]);
    }

    #[test]
    fn replace_introduces_new_identity() {
        let mut heap = IndexedMinHeap::with_offset(vec![0.0, 2.0, 1.0, 0.0, 0.0], 2, 1);
        heap.heapify();
        assert_eq!(heap.argmin(), 2);
        heap.replace(2, 4, 3.0);
        heap.assert_invariants();
        assert_eq!(heap.argmin(), 1);
        assert_eq!(heap.value(4), 3.0);
        assert_eq!(drain(heap), vec![1, 4]);
    }

    #[derive(Clone, Debug)]
    enum Op {
        Pop,
        Update(usize, f64),
        Remove(usize),
    }

    fn op_strategy(size: usize) -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Pop),
            (0..size, -100.0..100.0f64).prop_map(|(id, v)| Op::Update(id, v)),
            (0..size).prop_map(Op::Remove),
        ]
    }

    proptest! {
        #[test]
        fn random_operations_preserve_heap_order(
            values in prop::collection::vec(-100.0..100.0f64, 1..32),
            ops in prop::collection::vec(op_strategy(32), 0..64),
        ) {
            let mut heap = heap_of(&values);
            let mut present: Vec<bool> = vec![true; values.len()];
            for op in ops {
                if heap.is_empty() {
                    break;
                }
                match op {
                    Op::Pop => {
                        let id = heap.argmin();
                        let min = heap.value(id);
                        for (other, _) in present.iter().enumerate().filter(|(_, p)| **p) {
                            prop_assert!(min <= heap.value(other));
                        }
                        heap.heap_pop();
                        present[id] = false;
                    }
                    Op::Update(id, v) if id < values.len() && present[id] => heap.update(id, v),
                    Op::Remove(id) if id < values.len() && present[id] => {
                        heap.remove(id);
                        present[id] = false;
                    }
                    _ => {}
                }
                heap.assert_invariants();
                prop_assert_eq!(heap.len(), present.iter().filter(|p| **p).count());
            }
        }
    }
}
