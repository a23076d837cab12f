//! Dissimilarities between raw points.
//!
//! [`Dissimilarity`] owns the point set for the duration of a run. The
//! vector-space linkage drivers merge points in place or into a buffer of
//! synthetic points, so the object also carries the member counts and that
//! auxiliary buffer.

mod metric;
mod points;

pub use metric::{Metric, UserMetric};
pub use points::PointMatrix;

use crate::{
    dendrogram::Postprocess,
    error::{LinkageError, Result},
};

use metric::BoolCounts;

type DistanceFn = fn(&Dissimilarity, usize, usize) -> f64;

/// A point set together with the metric used to compare its points.
///
/// # Examples
/// ```
/// use agglo_core::{Dissimilarity, Metric, PointMatrix, Postprocess};
///
/// let points = PointMatrix::new(2, 2, vec![0.0, 0.0, 3.0, 4.0])?;
/// let dissimilarity = Dissimilarity::new(points, Metric::Euclidean)?;
/// // Comparisons run on squared distances and are square-rooted on output.
/// assert_eq!(dissimilarity.distance(0, 1), 25.0);
/// assert_eq!(dissimilarity.postprocess(), Postprocess::Sqrt);
/// # Ok::<(), agglo_core::LinkageError>(())
/// ```
#[derive(Clone, Debug)]
pub struct Dissimilarity {
    points: PointMatrix,
    synthetic: Vec<f64>,
    members: Vec<f64>,
    metric: Metric,
    distance_fn: DistanceFn,
    postprocess: Postprocess,
    precomputed: Vec<f64>,
}

impl Dissimilarity {
    /// Prepares `points` for comparison under `metric`.
    ///
    /// Per-point auxiliary values (inverse norms, boolean weights, coordinate
    /// variances) are computed once here.
    ///
    /// # Errors
    /// Returns [`LinkageError::InvalidMinkowskiExponent`] for a non-positive
    /// exponent, [`LinkageError::ZeroMagnitude`] when cosine distance meets a
    /// zero vector and [`LinkageError::ZeroVariance`] when standardized
    /// Euclidean distance meets a constant coordinate.
    pub fn new(points: PointMatrix, metric: Metric) -> Result<Self> {
        let metric = normalise(metric)?;
        let dimension = points.dimension() as f64;
        let (distance_fn, postprocess): (DistanceFn, Postprocess) = match &metric {
            Metric::Euclidean => (sqeuclidean_distance, Postprocess::Sqrt),
            Metric::SqEuclidean => (sqeuclidean_distance, Postprocess::Identity),
            Metric::Minkowski(p) => (minkowski_distance, Postprocess::Power(*p)),
            Metric::CityBlock => (cityblock_distance, Postprocess::Identity),
            Metric::SEuclidean => (seuclidean_distance, Postprocess::Sqrt),
            Metric::Chebyshev => (chebyshev_distance, Postprocess::Identity),
            Metric::Cosine => (cosine_distance, Postprocess::PlusOne),
            Metric::Hamming => (hamming_distance, Postprocess::Divide(dimension)),
            Metric::Jaccard => (jaccard_distance, Postprocess::Identity),
            Metric::Canberra => (canberra_distance, Postprocess::Identity),
            Metric::BrayCurtis => (braycurtis_distance, Postprocess::Identity),
            Metric::Yule => (yule_distance, Postprocess::Identity),
            Metric::Matching => (matching_distance, Postprocess::Divide(dimension)),
            Metric::Dice => (dice_distance, Postprocess::Identity),
            Metric::RogersTanimoto => (rogers_tanimoto_distance, Postprocess::Identity),
            Metric::RussellRao => (russell_rao_distance, Postprocess::Divide(dimension)),
            Metric::SokalSneath => (sokal_sneath_distance, Postprocess::Identity),
            Metric::Kulsinski => (kulsinski_distance, Postprocess::PlusOne),
            Metric::JaccardBool => (jaccard_bool_distance, Postprocess::Identity),
            Metric::User(_) => (user_distance, Postprocess::Identity),
        };
        let precomputed = precompute(&points, &metric)?;
        let members = vec![1.0; points.rows()];
        Ok(Self {
            points,
            synthetic: Vec::new(),
            members,
            metric,
            distance_fn,
            postprocess,
            precomputed,
        })
    }

    /// Returns the number of original points.
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.points.rows()
    }

    /// Returns the number of coordinates per point.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.points.dimension()
    }

    /// Returns the configured metric.
    ///
    /// Minkowski exponents of 1, 2 and infinity are reported as the
    /// equivalent named metric.
    #[must_use]
    pub fn metric(&self) -> &Metric {
        &self.metric
    }

    /// Returns the transform turning raw kernel values into distances.
    #[must_use]
    pub fn postprocess(&self) -> Postprocess {
        self.postprocess
    }

    /// Returns the point set.
    #[must_use]
    pub fn points(&self) -> &PointMatrix {
        &self.points
    }

    /// Returns the raw metric value between original points `i` and `j`.
    #[inline]
    #[must_use]
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        (self.distance_fn)(self, i, j)
    }

    /// Returns the squared Euclidean distance between original points.
    #[inline]
    #[must_use]
    pub fn sqeuclidean(&self, i: usize, j: usize) -> f64 {
        metric::sqeuclidean(self.points.row(i), self.points.row(j))
    }

    /// Returns the squared Euclidean distance between original or synthetic
    /// points.
    #[inline]
    #[must_use]
    pub fn sqeuclidean_extended(&self, i: usize, j: usize) -> f64 {
        metric::sqeuclidean(self.extended_row(i), self.extended_row(j))
    }

    /// Returns the Ward distance between the clusters represented by
    /// original points `i` and `j`.
    #[inline]
    #[must_use]
    pub fn ward(&self, i: usize, j: usize) -> f64 {
        self.sqeuclidean(i, j) * self.ward_weight(i, j)
    }

    /// Returns the Ward distance between original or synthetic points.
    #[inline]
    #[must_use]
    pub fn ward_extended(&self, i: usize, j: usize) -> f64 {
        self.sqeuclidean_extended(i, j) * self.ward_weight(i, j)
    }

    /// Returns the Ward distance between two singleton points before
    /// [`ward_initial_conversion`](Self::ward_initial_conversion).
    #[inline]
    #[must_use]
    pub fn ward_initial(&self, i: usize, j: usize) -> f64 {
        self.sqeuclidean(i, j)
    }

    /// Converts a minimum of [`ward_initial`](Self::ward_initial) values
    /// into a Ward distance.
    #[inline]
    #[must_use]
    pub fn ward_initial_conversion(min: f64) -> f64 {
        min * 0.5
    }

    /// Writes the member-weighted centroid of `i` and `j` into synthetic
    /// point `new`.
    pub fn merge(&mut self, i: usize, j: usize, new: usize) {
        let (size_i, size_j) = (self.members[i], self.members[j]);
        let total = size_i + size_j;
        self.write_synthetic(i, j, new, |x, y| (x * size_i + y * size_j) / total);
        self.members[new] = total;
    }

    /// Writes the midpoint of `i` and `j` into synthetic point `new`.
    pub fn merge_weighted(&mut self, i: usize, j: usize, new: usize) {
        self.write_synthetic(i, j, new, |x, y| (x + y) * 0.5);
    }

    /// Overwrites original point `j` with the member-weighted centroid of
    /// `i` and `j`, where `i < j`, and moves `i`'s members into `j`.
    pub fn merge_inplace(&mut self, i: usize, j: usize) {
        let (size_i, size_j) = (self.members[i], self.members[j]);
        let total = size_i + size_j;
        let (source, target) = self.points.row_pair_mut(i, j);
        for (y, x) in target.iter_mut().zip(source) {
            *y = (x * size_i + *y * size_j) / total;
        }
        self.members[j] = total;
    }

    /// Overwrites original point `j` with the midpoint of `i` and `j`, where
    /// `i < j`.
    pub fn merge_inplace_weighted(&mut self, i: usize, j: usize) {
        let (source, target) = self.points.row_pair_mut(i, j);
        for (y, x) in target.iter_mut().zip(source) {
            *y = (x + *y) * 0.5;
        }
    }

    /// Allocates room for the `n - 1` synthetic points produced by a run
    /// that appends merged clusters as new nodes.
    pub(crate) fn reserve_synthetic(&mut self) {
        let n = self.point_count();
        let dimension = self.dimension();
        self.synthetic = vec![0.0; n.saturating_sub(1) * dimension];
        self.members.resize((2 * n).saturating_sub(1), 0.0);
    }

    #[inline]
    fn extended_row(&self, index: usize) -> &[f64] {
        let n = self.point_count();
        if index < n {
            self.points.row(index)
        } else {
            let dimension = self.dimension();
            let start = (index - n) * dimension;
            &self.synthetic[start..start + dimension]
        }
    }

    #[inline]
    fn ward_weight(&self, i: usize, j: usize) -> f64 {
        let (size_i, size_j) = (self.members[i], self.members[j]);
        size_i * size_j / (size_i + size_j)
    }

    fn write_synthetic<F>(&mut self, i: usize, j: usize, new: usize, combine: F)
    where
        F: Fn(f64, f64) -> f64,
    {
        let n = self.point_count();
        let dimension = self.dimension();
        debug_assert!(new >= n, "synthetic slot {new} collides with a point");
        let start = (new - n) * dimension;
        for k in 0..dimension {
            let value = combine(self.extended_row(i)[k], self.extended_row(j)[k]);
            self.synthetic[start + k] = value;
        }
    }
}

pub(crate) fn normalise(metric: Metric) -> Result<Metric> {
    match metric {
        Metric::Minkowski(p) if !(p > 0.0) => Err(LinkageError::InvalidMinkowskiExponent { p }),
        Metric::Minkowski(p) if p == 1.0 => Ok(Metric::CityBlock),
        Metric::Minkowski(p) if p == 2.0 => Ok(Metric::Euclidean),
        Metric::Minkowski(p) if p.is_infinite() => Ok(Metric::Chebyshev),
        other => Ok(other),
    }
}

fn precompute(points: &PointMatrix, metric: &Metric) -> Result<Vec<f64>> {
    match metric {
        Metric::Cosine => (0..points.rows())
            .map(|index| {
                let norm = metric::dot(points.row(index), points.row(index)).sqrt();
                if norm == 0.0 {
                    Err(LinkageError::ZeroMagnitude { index })
                } else {
                    Ok(norm.recip())
                }
            })
            .collect(),
        Metric::Kulsinski => Ok((0..points.rows())
            .map(|index| {
                let set = points.row(index).iter().filter(|x| **x != 0.0).count();
                // An all-false row shares no coordinate with any other row.
                if set == 0 { 0.0 } else { -0.5 / set as f64 }
            })
            .collect()),
        Metric::SEuclidean => variances(points),
        _ => Ok(Vec::new()),
    }
}

fn variances(points: &PointMatrix) -> Result<Vec<f64>> {
    let rows = points.rows();
    let dimension = points.dimension();
    if rows < 2 {
        return Ok(vec![1.0; dimension]);
    }
    let mut means = vec![0.0; dimension];
    for index in 0..rows {
        for (mean, x) in means.iter_mut().zip(points.row(index)) {
            *mean += x;
        }
    }
    for mean in &mut means {
        *mean /= rows as f64;
    }
    let mut variances = vec![0.0; dimension];
    for index in 0..rows {
        for ((var, mean), x) in variances.iter_mut().zip(&means).zip(points.row(index)) {
            let diff = x - mean;
            *var += diff * diff;
        }
    }
    for (dimension, var) in variances.iter_mut().enumerate() {
        *var /= (rows - 1) as f64;
        if *var == 0.0 {
            return Err(LinkageError::ZeroVariance { dimension });
        }
    }
    Ok(variances)
}

fn rows(d: &Dissimilarity, i: usize, j: usize) -> (&[f64], &[f64]) {
    (d.points.row(i), d.points.row(j))
}

fn sqeuclidean_distance(d: &Dissimilarity, i: usize, j: usize) -> f64 {
    d.sqeuclidean(i, j)
}

fn minkowski_distance(d: &Dissimilarity, i: usize, j: usize) -> f64 {
    let p = match d.metric {
        Metric::Minkowski(p) => p,
        _ => 2.0,
    };
    let (left, right) = rows(d, i, j);
    metric::minkowski(left, right, p)
}

fn cityblock_distance(d: &Dissimilarity, i: usize, j: usize) -> f64 {
    let (left, right) = rows(d, i, j);
    metric::cityblock(left, right)
}

fn seuclidean_distance(d: &Dissimilarity, i: usize, j: usize) -> f64 {
    let (left, right) = rows(d, i, j);
    metric::seuclidean(left, right, &d.precomputed)
}

fn chebyshev_distance(d: &Dissimilarity, i: usize, j: usize) -> f64 {
    let (left, right) = rows(d, i, j);
    metric::chebyshev(left, right)
}

fn cosine_distance(d: &Dissimilarity, i: usize, j: usize) -> f64 {
    let (left, right) = rows(d, i, j);
    -metric::dot(left, right) * d.precomputed[i] * d.precomputed[j]
}

fn hamming_distance(d: &Dissimilarity, i: usize, j: usize) -> f64 {
    let (left, right) = rows(d, i, j);
    metric::hamming(left, right)
}

fn jaccard_distance(d: &Dissimilarity, i: usize, j: usize) -> f64 {
    let (left, right) = rows(d, i, j);
    metric::jaccard(left, right)
}

fn canberra_distance(d: &Dissimilarity, i: usize, j: usize) -> f64 {
    let (left, right) = rows(d, i, j);
    metric::canberra(left, right)
}

fn braycurtis_distance(d: &Dissimilarity, i: usize, j: usize) -> f64 {
    let (left, right) = rows(d, i, j);
    metric::braycurtis(left, right)
}

fn counts(d: &Dissimilarity, i: usize, j: usize) -> BoolCounts {
    let (left, right) = rows(d, i, j);
    BoolCounts::of(left, right)
}

fn yule_distance(d: &Dissimilarity, i: usize, j: usize) -> f64 {
    metric::yule(counts(d, i, j))
}

fn matching_distance(d: &Dissimilarity, i: usize, j: usize) -> f64 {
    counts(d, i, j).mismatches()
}

fn dice_distance(d: &Dissimilarity, i: usize, j: usize) -> f64 {
    metric::dice(counts(d, i, j))
}

fn rogers_tanimoto_distance(d: &Dissimilarity, i: usize, j: usize) -> f64 {
    metric::rogers_tanimoto(counts(d, i, j))
}

fn russell_rao_distance(d: &Dissimilarity, i: usize, j: usize) -> f64 {
    metric::russell_rao(counts(d, i, j))
}

fn sokal_sneath_distance(d: &Dissimilarity, i: usize, j: usize) -> f64 {
    metric::sokal_sneath(counts(d, i, j))
}

fn kulsinski_distance(d: &Dissimilarity, i: usize, j: usize) -> f64 {
    counts(d, i, j).both * (d.precomputed[i] + d.precomputed[j])
}

fn jaccard_bool_distance(d: &Dissimilarity, i: usize, j: usize) -> f64 {
    metric::jaccard_bool(counts(d, i, j))
}

fn user_distance(d: &Dissimilarity, i: usize, j: usize) -> f64 {
    let (left, right) = rows(d, i, j);
    match &d.metric {
        Metric::User(user) => user.evaluate(left, right),
        _ => f64::NAN,
    }
}
