//! Linkage orchestration.
//!
//! Provides the [`Linkage`] runtime entry point, which resolves the
//! configured algorithm for the supplied input form, prepares the input,
//! runs the driver and applies the distance post-processing.

use std::time::{Duration, Instant};

use tracing::{Span, field, info, instrument};

use crate::{
    Result,
    algorithms::{
        generic_linkage, generic_linkage_vector, generic_linkage_vector_alternative, mst_linkage,
        mst_linkage_vector, nn_chain_linkage,
    },
    builder::LinkageBuilder,
    condensed::CondensedMatrix,
    dendrogram::{ClusterResult, Dendrogram, Postprocess},
    dissimilarity::{Dissimilarity, Metric, PointMatrix},
    error::LinkageError,
    method::{Algorithm, LinkageMethod},
};

type MatrixDriver = fn(&mut CondensedMatrix, LinkageMethod) -> Result<ClusterResult>;

/// Validated linkage configuration able to cluster either form of input.
///
/// # Examples
/// ```
/// use agglo_core::{CondensedMatrix, LinkageBuilder, LinkageMethod};
///
/// let linkage = LinkageBuilder::new()
///     .with_method(LinkageMethod::Complete)
///     .build()?;
/// let mut matrix = CondensedMatrix::new(3, vec![1.0, 4.0, 2.0])?;
/// let dendrogram = linkage.run_matrix(&mut matrix)?;
/// assert_eq!(
///     dendrogram.to_linkage_matrix(),
///     vec![[0.0, 1.0, 1.0, 2.0], [2.0, 3.0, 4.0, 3.0]]
/// );
/// # Ok::<(), agglo_core::LinkageError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Linkage {
    method: LinkageMethod,
    metric: Metric,
    algorithm: Algorithm,
}

impl Linkage {
    pub(crate) fn new(method: LinkageMethod, metric: Metric, algorithm: Algorithm) -> Self {
        Self {
            method,
            metric,
            algorithm,
        }
    }

    /// Returns the configured linkage method.
    #[must_use]
    pub fn method(&self) -> LinkageMethod {
        self.method
    }

    /// Returns the metric applied to raw points.
    #[must_use]
    pub fn metric(&self) -> &Metric {
        &self.metric
    }

    /// Returns the configured algorithm, possibly [`Algorithm::Auto`].
    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Clusters the items described by a condensed dissimilarity matrix.
    ///
    /// The matrix is used as scratch space and holds no meaningful values
    /// afterwards. Ward, centroid and median linkage treat the input as
    /// Euclidean distances: the matrix is squared before the run and the
    /// merge heights are square-rooted afterwards.
    ///
    /// # Errors
    /// Returns [`LinkageError::UnsupportedInput`] when a vector-only
    /// algorithm was configured, [`LinkageError::TooFewPoints`] for fewer
    /// than two items and [`LinkageError::NanDistance`] when a merge height
    /// is NaN.
    #[instrument(
        name = "core.linkage.run_matrix",
        err,
        skip(self, matrix),
        fields(
            points = matrix.point_count(),
            method = %self.method,
            algorithm = field::Empty,
        ),
    )]
    pub fn run_matrix(&self, matrix: &mut CondensedMatrix) -> Result<Dendrogram> {
        let started = Instant::now();
        let algorithm = self.algorithm.resolve_for_matrix(self.method);
        Span::current().record("algorithm", algorithm.as_str());
        let dendrogram = cluster_matrix(matrix, self.method, algorithm)?;
        record_run("matrix", started.elapsed());
        info!(steps = dendrogram.len(), "linkage completed");
        Ok(dendrogram)
    }

    /// Clusters raw points under the configured metric.
    ///
    /// Single linkage runs on the points directly, as do Ward, centroid and
    /// median linkage under the Euclidean metric. Every other combination
    /// computes the condensed matrix of metric distances and clusters it as
    /// [`Linkage::run_matrix`] would.
    ///
    /// # Errors
    /// Returns the metric preparation errors of [`Dissimilarity::new`] and
    /// the run errors of [`Linkage::run_matrix`].
    ///
    /// # Examples
    /// ```
    /// use agglo_core::{LinkageBuilder, LinkageMethod, PointMatrix};
    ///
    /// let points = PointMatrix::new(5, 1, vec![0.0, 1.0, 2.0, 3.0, 10.0])?;
    /// let dendrogram = LinkageBuilder::new()
    ///     .with_method(LinkageMethod::Single)
    ///     .build()?
    ///     .run_points(points)?;
    /// assert_eq!(dendrogram.distances().last(), Some(7.0));
    /// # Ok::<(), agglo_core::LinkageError>(())
    /// ```
    #[instrument(
        name = "core.linkage.run_points",
        err,
        skip(self, points),
        fields(
            points = points.rows(),
            method = %self.method,
            metric = %self.metric,
            algorithm = field::Empty,
        ),
    )]
    pub fn run_points(&self, points: PointMatrix) -> Result<Dendrogram> {
        let started = Instant::now();
        let algorithm = self.points_algorithm();
        Span::current().record("algorithm", algorithm.as_str());
        let mut dissimilarity = Dissimilarity::new(points, self.metric.clone())?;
        let dendrogram = match algorithm {
            Algorithm::Mst => {
                let mut result = mst_linkage_vector(&dissimilarity)?;
                result.postprocess(dissimilarity.postprocess());
                result.into_dendrogram()
            }
            Algorithm::VectorInPlace => {
                let result = generic_linkage_vector(&mut dissimilarity, self.method)?;
                finish_vector(result, self.method)
            }
            Algorithm::VectorAlternative => {
                let result = generic_linkage_vector_alternative(&mut dissimilarity, self.method)?;
                finish_vector(result, self.method)
            }
            Algorithm::Auto | Algorithm::NnChain | Algorithm::Generic => {
                let mut matrix = CondensedMatrix::from_dissimilarity(&dissimilarity)?;
                drop(dissimilarity);
                cluster_matrix(&mut matrix, self.method, algorithm)?
            }
        };
        record_run("points", started.elapsed());
        info!(steps = dendrogram.len(), "linkage completed");
        Ok(dendrogram)
    }

    /// Vector-space Ward, centroid and median linkage need Euclidean
    /// geometry; `Auto` falls back to the matrix path for other metrics.
    fn points_algorithm(&self) -> Algorithm {
        let resolved = self.algorithm.resolve_for_points(self.method);
        if self.algorithm == Algorithm::Auto
            && resolved.is_vector_only()
            && !matches!(self.metric, Metric::Euclidean)
        {
            return Algorithm::Auto.resolve_for_matrix(self.method);
        }
        resolved
    }
}

fn cluster_matrix(
    matrix: &mut CondensedMatrix,
    method: LinkageMethod,
    algorithm: Algorithm,
) -> Result<Dendrogram> {
    let driver: MatrixDriver = match algorithm {
        Algorithm::Mst => |matrix, _| mst_linkage(matrix),
        Algorithm::NnChain => nn_chain_linkage,
        Algorithm::Auto | Algorithm::Generic => generic_linkage,
        Algorithm::VectorInPlace | Algorithm::VectorAlternative => {
            return Err(LinkageError::UnsupportedInput {
                algorithm,
                input: "matrix",
            });
        }
    };
    if method.squares_input() {
        matrix.square_in_place();
    }
    let mut result = driver(matrix, method)?;
    if method.squares_input() {
        result.postprocess(Postprocess::Sqrt);
    }
    Ok(result.into_dendrogram())
}

fn finish_vector(mut result: ClusterResult, method: LinkageMethod) -> Dendrogram {
    result.postprocess(if method == LinkageMethod::Ward {
        Postprocess::SqrtDouble
    } else {
        Postprocess::Sqrt
    });
    result.into_dendrogram()
}

#[cfg(feature = "metrics")]
fn record_run(input: &'static str, elapsed: Duration) {
    metrics::counter!("agglo_linkage_runs_total", "input" => input).increment(1);
    metrics::histogram!("agglo_linkage_run_seconds", "input" => input)
        .record(elapsed.as_secs_f64());
}

#[cfg(not(feature = "metrics"))]
fn record_run(_input: &'static str, _elapsed: Duration) {}

/// Clusters a condensed matrix with `method`, selecting the algorithm
/// automatically.
///
/// # Errors
/// Same as [`Linkage::run_matrix`].
///
/// # Examples
/// ```
/// use agglo_core::{CondensedMatrix, LinkageMethod, linkage};
///
/// let mut matrix = CondensedMatrix::new(3, vec![2.0, 6.0, 4.0])?;
/// let dendrogram = linkage(&mut matrix, LinkageMethod::Average)?;
/// assert_eq!(dendrogram.distances().collect::<Vec<_>>(), vec![2.0, 5.0]);
/// # Ok::<(), agglo_core::LinkageError>(())
/// ```
pub fn linkage(matrix: &mut CondensedMatrix, method: LinkageMethod) -> Result<Dendrogram> {
    LinkageBuilder::new()
        .with_method(method)
        .build()?
        .run_matrix(matrix)
}

/// Clusters Euclidean points with `method`, selecting the algorithm
/// automatically.
///
/// # Errors
/// Same as [`Linkage::run_points`].
///
/// # Examples
/// ```
/// use agglo_core::{LinkageMethod, PointMatrix, linkage_vector};
///
/// let points = PointMatrix::new(4, 1, vec![0.0, 1.0, 5.0, 6.0])?;
/// let dendrogram = linkage_vector(points, LinkageMethod::Centroid)?;
/// assert_eq!(dendrogram.distances().collect::<Vec<_>>(), vec![1.0, 1.0, 5.0]);
/// # Ok::<(), agglo_core::LinkageError>(())
/// ```
pub fn linkage_vector(points: PointMatrix, method: LinkageMethod) -> Result<Dendrogram> {
    LinkageBuilder::new()
        .with_method(method)
        .build()?
        .run_points(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{assert_close, euclidean_matrix, seeded_points};
    use rstest::rstest;

    fn build(method: LinkageMethod, metric: Metric, algorithm: Algorithm) -> Linkage {
        LinkageBuilder::new()
            .with_method(method)
            .with_metric(metric)
            .with_algorithm(algorithm)
            .build()
            .expect("valid configuration")
    }

    #[rstest]
    #[case(LinkageMethod::Single)]
    #[case(LinkageMethod::Complete)]
    #[case(LinkageMethod::Average)]
    #[case(LinkageMethod::Weighted)]
    #[case(LinkageMethod::Ward)]
    #[case(LinkageMethod::WardD)]
    #[case(LinkageMethod::Centroid)]
    #[case(LinkageMethod::Median)]
    fn auto_points_and_matrix_agree(#[case] method: LinkageMethod) {
        let points = seeded_points(3, 18, 3);
        let mut matrix = euclidean_matrix(&points);
        let from_matrix = linkage(&mut matrix, method).expect("matrix run");
        let from_points = linkage_vector(points, method).expect("points run");
        let heights = |d: &Dendrogram| d.distances().collect::<Vec<_>>();
        assert_close(&heights(&from_matrix), &heights(&from_points));
    }

    #[rstest]
    #[case(Algorithm::Auto)]
    #[case(Algorithm::Generic)]
    #[case(Algorithm::NnChain)]
    #[case(Algorithm::VectorInPlace)]
    #[case(Algorithm::VectorAlternative)]
    fn ward_heights_are_euclidean_for_every_algorithm(#[case] algorithm: Algorithm) {
        // Two pairs one unit apart, with centroids ten units apart.
        let points = PointMatrix::new(4, 1, vec![0.0, 1.0, 10.0, 11.0]).expect("valid");
        let dendrogram = build(LinkageMethod::Ward, Metric::Euclidean, algorithm)
            .run_points(points)
            .expect("ward run");
        // Ward height for clusters of sizes a and b: sqrt(2ab/(a+b)) * |ca - cb|.
        assert_close(
            &dendrogram.distances().collect::<Vec<_>>(),
            &[1.0, 1.0, 200.0_f64.sqrt()],
        );
    }

    #[test]
    fn ward_d_uses_distances_as_given() {
        let mut matrix = CondensedMatrix::new(3, vec![2.0, 4.0, 4.0]).expect("valid");
        let dendrogram = linkage(&mut matrix, LinkageMethod::WardD).expect("ward.D run");
        // ((1+1)*4 - 1*2 + (1+1)*4) / 3 = 14/3
        assert_close(
            &dendrogram.distances().collect::<Vec<_>>(),
            &[2.0, 14.0 / 3.0],
        );
    }

    #[test]
    fn matrix_rejects_vector_only_algorithms() {
        let mut matrix = CondensedMatrix::new(3, vec![1.0, 2.0, 3.0]).expect("valid");
        let err = build(
            LinkageMethod::Ward,
            Metric::Euclidean,
            Algorithm::VectorInPlace,
        )
        .run_matrix(&mut matrix)
        .expect_err("matrix input has no coordinates");
        assert_eq!(
            err,
            LinkageError::UnsupportedInput {
                algorithm: Algorithm::VectorInPlace,
                input: "matrix",
            }
        );
        assert_eq!(matrix.as_slice(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn auto_falls_back_to_matrix_for_non_euclidean_centroid() {
        let linkage = build(LinkageMethod::Centroid, Metric::CityBlock, Algorithm::Auto);
        assert_eq!(linkage.points_algorithm(), Algorithm::Generic);
        let points = PointMatrix::new(3, 2, vec![0.0, 0.0, 1.0, 1.0, 5.0, 5.0]).expect("valid");
        let dendrogram = linkage.run_points(points).expect("matrix fallback");
        assert_eq!(dendrogram.len(), 2);
        assert!((dendrogram.steps()[0].distance() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn single_linkage_on_points_honours_the_metric() {
        let points = PointMatrix::new(3, 2, vec![0.0, 0.0, 3.0, 4.0, 10.0, 0.0]).expect("valid");
        let dendrogram = build(LinkageMethod::Single, Metric::CityBlock, Algorithm::Auto)
            .run_points(points)
            .expect("single run");
        assert_eq!(dendrogram.distances().collect::<Vec<_>>(), vec![7.0, 10.0]);
    }

    #[test]
    fn too_few_points_are_rejected() {
        let points = PointMatrix::new(1, 2, vec![0.0, 1.0]).expect("valid");
        assert_eq!(
            linkage_vector(points, LinkageMethod::Ward).map(|d| d.len()),
            Err(LinkageError::TooFewPoints { points: 1 })
        );
    }
}
