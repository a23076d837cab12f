//! Lance-Williams dissimilarity update rules.
//!
//! In every rule `absorbed` and `survivor` are the distances from a third
//! cluster to the two clusters being merged, `size1`/`size2` their member
//! counts, `other_size` the third cluster's member count and `merge_dist`
//! the distance between the merged pair.

/// How a rule's updated distances relate to the pair it replaces. The
/// linkage drivers use it to decide which nearest-neighbour caches can be
/// trusted after a merge.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Drift {
    /// Never above either input (single).
    NonIncreasing,
    /// Never below either input (complete).
    NonDecreasing,
    /// Between the two inputs or above both (average, weighted, Ward).
    Bounded,
    /// May fall below both inputs (centroid, median).
    Unbounded,
}

/// Precomputed coefficients for one merge.
pub(crate) trait UpdateRule {
    /// Monotonicity class of the rule.
    const DRIFT: Drift;
    /// Whether the rule reads member counts.
    const TRACKS_SIZES: bool;

    fn prepare(size1: f64, size2: f64, merge_dist: f64) -> Self;

    fn apply(&self, absorbed: f64, survivor: f64, other_size: f64) -> f64;
}

#[inline]
pub(crate) fn single(absorbed: f64, survivor: f64) -> f64 {
    if absorbed < survivor { absorbed } else { survivor }
}

#[inline]
pub(crate) fn complete(absorbed: f64, survivor: f64) -> f64 {
    if absorbed > survivor { absorbed } else { survivor }
}

#[inline]
pub(crate) fn weighted(absorbed: f64, survivor: f64) -> f64 {
    (absorbed + survivor) * 0.5
}

#[inline]
pub(crate) fn ward(
    absorbed: f64,
    survivor: f64,
    merge_dist: f64,
    size1: f64,
    size2: f64,
    other_size: f64,
) -> f64 {
    ((other_size + size1) * absorbed - other_size * merge_dist + (other_size + size2) * survivor)
        / (size1 + size2 + other_size)
}

pub(crate) struct SingleRule;

impl UpdateRule for SingleRule {
    const DRIFT: Drift = Drift::NonIncreasing;
    const TRACKS_SIZES: bool = false;

    fn prepare(_: f64, _: f64, _: f64) -> Self {
        Self
    }

    #[inline]
    fn apply(&self, absorbed: f64, survivor: f64, _: f64) -> f64 {
        single(absorbed, survivor)
    }
}

pub(crate) struct CompleteRule;

impl UpdateRule for CompleteRule {
    const DRIFT: Drift = Drift::NonDecreasing;
    const TRACKS_SIZES: bool = false;

    fn prepare(_: f64, _: f64, _: f64) -> Self {
        Self
    }

    #[inline]
    fn apply(&self, absorbed: f64, survivor: f64, _: f64) -> f64 {
        complete(absorbed, survivor)
    }
}

pub(crate) struct AverageRule {
    s: f64,
    t: f64,
}

impl UpdateRule for AverageRule {
    const DRIFT: Drift = Drift::Bounded;
    const TRACKS_SIZES: bool = true;

    fn prepare(size1: f64, size2: f64, _: f64) -> Self {
        let total = size1 + size2;
        Self {
            s: size1 / total,
            t: size2 / total,
        }
    }

    #[inline]
    fn apply(&self, absorbed: f64, survivor: f64, _: f64) -> f64 {
        self.s * absorbed + self.t * survivor
    }
}

pub(crate) struct WeightedRule;

impl UpdateRule for WeightedRule {
    const DRIFT: Drift = Drift::Bounded;
    const TRACKS_SIZES: bool = false;

    fn prepare(_: f64, _: f64, _: f64) -> Self {
        Self
    }

    #[inline]
    fn apply(&self, absorbed: f64, survivor: f64, _: f64) -> f64 {
        weighted(absorbed, survivor)
    }
}

pub(crate) struct WardRule {
    size1: f64,
    size2: f64,
    merge_dist: f64,
}

impl UpdateRule for WardRule {
    const DRIFT: Drift = Drift::Bounded;
    const TRACKS_SIZES: bool = true;

    fn prepare(size1: f64, size2: f64, merge_dist: f64) -> Self {
        Self {
            size1,
            size2,
            merge_dist,
        }
    }

    #[inline]
    fn apply(&self, absorbed: f64, survivor: f64, other_size: f64) -> f64 {
        ward(
            absorbed,
            survivor,
            self.merge_dist,
            self.size1,
            self.size2,
            other_size,
        )
    }
}

pub(crate) struct CentroidRule {
    s: f64,
    t: f64,
    stc: f64,
}

impl UpdateRule for CentroidRule {
    const DRIFT: Drift = Drift::Unbounded;
    const TRACKS_SIZES: bool = true;

    fn prepare(size1: f64, size2: f64, merge_dist: f64) -> Self {
        let total = size1 + size2;
        let s = size1 / total;
        let t = size2 / total;
        Self {
            s,
            t,
            stc: s * t * merge_dist,
        }
    }

    #[inline]
    fn apply(&self, absorbed: f64, survivor: f64, _: f64) -> f64 {
        self.s * absorbed - self.stc + self.t * survivor
    }
}

pub(crate) struct MedianRule {
    quarter: f64,
}

impl UpdateRule for MedianRule {
    const DRIFT: Drift = Drift::Unbounded;
    const TRACKS_SIZES: bool = false;

    fn prepare(_: f64, _: f64, merge_dist: f64) -> Self {
        Self {
            quarter: merge_dist * 0.25,
        }
    }

    #[inline]
    fn apply(&self, absorbed: f64, survivor: f64, _: f64) -> f64 {
        weighted(absorbed, survivor) - self.quarter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const EPS: f64 = 1e-12;

    #[rstest]
    #[case(1.0, 2.0, 1.0, 2.0)]
    #[case(4.0, 3.0, 3.0, 4.0)]
    #[case(5.0, 5.0, 5.0, 5.0)]
    fn single_and_complete(
        #[case] a: f64,
        #[case] c: f64,
        #[case] min: f64,
        #[case] max: f64,
    ) {
        assert_eq!(single(a, c), min);
        assert_eq!(complete(a, c), max);
    }

    #[test]
    fn nan_propagates_through_single_and_complete() {
        assert!(single(1.0, f64::NAN).is_nan());
        assert!(complete(1.0, f64::NAN).is_nan());
    }

    #[test]
    fn average_weights_by_member_count() {
        let rule = AverageRule::prepare(2.0, 1.0, 0.0);
        assert!((rule.apply(1.0, 4.0, 7.0) - 2.0).abs() < EPS);
    }

    #[test]
    fn weighted_and_median_ignore_sizes() {
        assert!((weighted(2.0, 6.0) - 4.0).abs() < EPS);
        assert!((MedianRule::prepare(9.0, 1.0, 4.0).apply(2.0, 6.0, 3.0) - 3.0).abs() < EPS);
    }

    #[test]
    fn ward_matches_squared_centroid_distance() {
        // Points 0, 2 (merged) and 5 on a line, squared distances.
        let merged = ward(25.0, 9.0, 4.0, 1.0, 1.0, 1.0);
        // Ward distance between {0, 2} and {5}: 2 · (2·1/3) · |1 - 5|² = 64/3.
        assert!((merged - 64.0 / 3.0).abs() < EPS);
        let rule = WardRule::prepare(1.0, 1.0, 4.0);
        assert!((rule.apply(25.0, 9.0, 1.0) - merged).abs() < EPS);
    }

    #[test]
    fn centroid_matches_squared_centroid_distance() {
        // Squared distance from 5 to the centroid of {0, 2} is 16.
        let rule = CentroidRule::prepare(1.0, 1.0, 4.0);
        assert!((rule.apply(25.0, 9.0, 1.0) - 16.0).abs() < EPS);
    }
}
