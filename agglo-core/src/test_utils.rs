//! Shared test utilities for `agglo-core`.

use agglo_test_support::ci::property_test_profile::ProptestRunProfile;
use proptest::{prelude::*, test_runner::Config as ProptestConfig};
use rand::{Rng, SeedableRng, rngs::SmallRng};

use crate::{CondensedMatrix, Dendrogram, LinkageMethod, PointMatrix};

/// Builds a standard proptest configuration from the shared CI profile.
///
/// This keeps property suites aligned on the same `PROGTEST_CASES` and
/// `AGGLO_PBT_FORK` interpretation.
#[must_use]
pub(crate) fn suite_proptest_config(default_cases: u32) -> ProptestConfig {
    let profile = ProptestRunProfile::load(default_cases, false);
    ProptestConfig {
        cases: profile.cases(),
        fork: profile.fork(),
        ..ProptestConfig::default()
    }
}

/// Strategy producing `2..=max_points` points with `1..=max_dimension`
/// coordinates in `[-100, 100)`.
pub(crate) fn points_strategy(
    max_points: usize,
    max_dimension: usize,
) -> impl Strategy<Value = PointMatrix> {
    (2..=max_points, 1..=max_dimension).prop_flat_map(|(rows, dimension)| {
        prop::collection::vec(-100.0..100.0f64, rows * dimension).prop_map(move |values| {
            PointMatrix::new(rows, dimension, values).expect("strategy yields valid points")
        })
    })
}

/// Deterministic pseudo-random points for example-based tests.
pub(crate) fn seeded_points(seed: u64, rows: usize, dimension: usize) -> PointMatrix {
    let mut rng = SmallRng::seed_from_u64(seed);
    let values = (0..rows * dimension)
        .map(|_| rng.gen_range(-10.0..10.0))
        .collect();
    PointMatrix::new(rows, dimension, values).expect("generated points are valid")
}

/// Euclidean distances between `points`.
pub(crate) fn euclidean_matrix(points: &PointMatrix) -> CondensedMatrix {
    CondensedMatrix::from_fn(points.rows(), |i, j| {
        points
            .row(i)
            .iter()
            .zip(points.row(j))
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f64>()
            .sqrt()
    })
    .expect("finite coordinates give finite distances")
}

/// Squared Euclidean distances between `points`.
pub(crate) fn squared_matrix(points: &PointMatrix) -> CondensedMatrix {
    let mut matrix = euclidean_matrix(points);
    matrix.square_in_place();
    matrix
}

/// Checks the structural invariants every dendrogram must satisfy.
pub(crate) fn check_structure(dendrogram: &Dendrogram) -> Result<(), TestCaseError> {
    let n = dendrogram.point_count();
    prop_assert_eq!(dendrogram.len(), n - 1);
    let mut used = vec![false; 2 * n - 1];
    for (i, step) in dendrogram.steps().iter().enumerate() {
        prop_assert!(step.left() < step.right());
        prop_assert!(step.right() < n + i, "step {} references a future node", i);
        for child in [step.left(), step.right()] {
            prop_assert!(!used[child], "node {} merged twice", child);
            used[child] = true;
        }
        prop_assert!(step.size() >= 2);
    }
    prop_assert_eq!(dendrogram.root_size(), Some(n));
    Ok(())
}

/// Merge heights in merge order from a direct O(N³) Lance-Williams run:
/// full symmetric matrix, globally closest pair first, every formula
/// written out independently of the drivers.
///
/// Ward, centroid and median expect squared Euclidean input, like the
/// matrix drivers.
pub(crate) fn reference_heights(matrix: &CondensedMatrix, method: LinkageMethod) -> Vec<f64> {
    let n = matrix.point_count();
    let mut d = vec![vec![0.0_f64; n]; n];
    for i in 0..n {
        for j in i + 1..n {
            d[i][j] = matrix.get(i, j);
            d[j][i] = d[i][j];
        }
    }
    let mut size = vec![1.0_f64; n];
    let mut alive = vec![true; n];
    let mut heights = Vec::with_capacity(n.saturating_sub(1));

    for _ in 1..n {
        let (mut a, mut b, mut h) = (0, 0, f64::INFINITY);
        for i in (0..n).filter(|&i| alive[i]) {
            for j in (i + 1..n).filter(|&j| alive[j]) {
                if d[i][j] < h {
                    (a, b, h) = (i, j, d[i][j]);
                }
            }
        }
        heights.push(h);

        let (sa, sb) = (size[a], size[b]);
        let total = sa + sb;
        for k in (0..n).filter(|&k| alive[k] && k != a && k != b) {
            let (da, db, sk) = (d[a][k], d[b][k], size[k]);
            let updated = match method {
                LinkageMethod::Single => da.min(db),
                LinkageMethod::Complete => da.max(db),
                LinkageMethod::Average => (sa * da + sb * db) / total,
                LinkageMethod::Weighted => 0.5 * (da + db),
                LinkageMethod::Ward | LinkageMethod::WardD => {
                    ((sa + sk) * da + (sb + sk) * db - sk * h) / (total + sk)
                }
                LinkageMethod::Centroid => {
                    (sa * da + sb * db) / total - sa * sb * h / (total * total)
                }
                LinkageMethod::Median => 0.5 * (da + db) - 0.25 * h,
            };
            d[a][k] = updated;
            d[k][a] = updated;
        }
        alive[b] = false;
        size[a] = total;
    }
    heights
}

/// Returns `heights` in ascending order.
pub(crate) fn sorted(mut heights: Vec<f64>) -> Vec<f64> {
    heights.sort_by(f64::total_cmp);
    heights
}

/// Asserts two distance sequences agree within a relative tolerance.
pub(crate) fn assert_close(left: &[f64], right: &[f64]) {
    assert_eq!(left.len(), right.len(), "sequence lengths differ");
    for (i, (a, b)) in left.iter().zip(right).enumerate() {
        let scale = a.abs().max(b.abs()).max(1.0);
        assert!(
            (a - b).abs() <= 1e-9 * scale,
            "distance {i} differs: {a} vs {b}"
        );
    }
}
