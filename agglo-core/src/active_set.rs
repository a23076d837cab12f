//! Doubly linked list of the indices that are still active during a run.

/// Ordered set over `[0, size)` supporting constant-time removal and forward
/// traversal of the remaining members.
///
/// `size` acts as the past-the-end sentinel. Indices are never reinserted.
///
/// # Examples
/// ```
/// use agglo_core::ActiveSet;
///
/// let mut active = ActiveSet::new(5);
/// active.remove(0);
/// active.remove(3);
/// assert_eq!(active.start(), 1);
/// assert_eq!(active.iter().collect::<Vec<_>>(), vec![1, 2, 4]);
/// assert!(active.is_inactive(3));
/// ```
#[derive(Clone, Debug)]
pub struct ActiveSet {
    start: usize,
    succ: Vec<usize>,
    pred: Vec<usize>,
}

impl ActiveSet {
    /// Creates a set containing every index in `[0, size)`.
    #[must_use]
    pub fn new(size: usize) -> Self {
        let succ = (1..=size).collect();
        let pred = (0..=size).map(|i| i.saturating_sub(1)).collect();
        Self {
            start: 0,
            succ,
            pred,
        }
    }

    /// Returns the smallest active index, or the sentinel when empty.
    #[inline]
    #[must_use]
    pub fn start(&self) -> usize {
        self.start
    }

    /// Returns the next active index after the active index `idx`.
    #[inline]
    #[must_use]
    pub fn succ(&self, idx: usize) -> usize {
        debug_assert!(!self.is_inactive(idx), "succ of inactive index {idx}");
        self.succ[idx]
    }

    /// Removes the active index `idx`.
    pub fn remove(&mut self, idx: usize) {
        debug_assert!(!self.is_inactive(idx), "index {idx} removed twice");
        let next = self.succ[idx];
        if idx == self.start {
            self.start = next;
        } else {
            let prev = self.pred[idx];
            self.succ[prev] = next;
            self.pred[next] = prev;
        }
        self.succ[idx] = 0;
    }

    /// Returns `true` once `idx` has been removed.
    #[inline]
    #[must_use]
    pub fn is_inactive(&self, idx: usize) -> bool {
        self.succ[idx] == 0
    }

    /// Iterates over the active indices in increasing order.
    #[must_use]
    pub fn iter(&self) -> ActiveIter<'_> {
        self.iter_from(self.start)
    }

    /// Iterates over the active indices starting at the active index `idx`.
    #[must_use]
    pub fn iter_from(&self, idx: usize) -> ActiveIter<'_> {
        ActiveIter {
            set: self,
            next: idx,
        }
    }

    /// Iterates over the active indices strictly after the active index
    /// `idx`.
    #[must_use]
    pub fn iter_after(&self, idx: usize) -> ActiveIter<'_> {
        self.iter_from(self.succ(idx))
    }
}

/// Forward iterator over the members of an [`ActiveSet`].
#[derive(Clone, Debug)]
pub struct ActiveIter<'a> {
    set: &'a ActiveSet,
    next: usize,
}

impl Iterator for ActiveIter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next;
        if current >= self.set.succ.len() {
            return None;
        }
        self.next = self.set.succ[current];
        Some(current)
    }
}
