//! Seeded synthetic point sets for benchmarking.
//!
//! Points are drawn around uniformly placed centres so every linkage method
//! sees some cluster structure. The same configuration always yields the
//! same points.

use agglo_core::{CondensedMatrix, Dissimilarity, LinkageError, Metric, PointMatrix};
use rand::{Rng, SeedableRng, rngs::SmallRng};

/// Side length of the cube the cluster centres are placed in.
const CENTRE_RANGE: f64 = 10.0;

/// Errors that may occur during synthetic point generation.
#[derive(Clone, Debug, thiserror::Error, PartialEq)]
pub enum SyntheticError {
    /// The requested point count was zero.
    #[error("point count must be greater than zero")]
    ZeroPoints,
    /// The requested dimension count was zero.
    #[error("dimension count must be greater than zero")]
    ZeroDimensions,
    /// The requested cluster count was zero or exceeded the point count.
    #[error("cluster count {clusters} must be between 1 and the point count {points}")]
    InvalidClusterCount {
        /// Requested number of clusters.
        clusters: usize,
        /// Requested number of points.
        points: usize,
    },
    /// The spread around each centre was negative or not finite.
    #[error("spread must be finite and non-negative (got {spread})")]
    InvalidSpread {
        /// Requested spread.
        spread: f64,
    },
    /// The generated coordinates did not form a valid point matrix.
    #[error("invalid point matrix: {0}")]
    Points(#[from] LinkageError),
}

/// Configuration for clustered synthetic points.
#[derive(Clone, Debug)]
pub struct BlobConfig {
    /// Number of points to generate.
    pub point_count: usize,
    /// Dimensionality of each point.
    pub dimensions: usize,
    /// Number of cluster centres.
    pub clusters: usize,
    /// Half-width of the uniform offset around each centre.
    pub spread: f64,
    /// RNG seed for reproducibility.
    pub seed: u64,
}

impl BlobConfig {
    /// Returns a configuration with eight clusters of spread `1.0`.
    #[must_use]
    pub const fn new(point_count: usize, dimensions: usize, seed: u64) -> Self {
        Self {
            point_count,
            dimensions,
            clusters: 8,
            spread: 1.0,
            seed,
        }
    }

    fn validate(&self) -> Result<(), SyntheticError> {
        if self.point_count == 0 {
            return Err(SyntheticError::ZeroPoints);
        }
        if self.dimensions == 0 {
            return Err(SyntheticError::ZeroDimensions);
        }
        if self.clusters == 0 || self.clusters > self.point_count {
            return Err(SyntheticError::InvalidClusterCount {
                clusters: self.clusters,
                points: self.point_count,
            });
        }
        if !self.spread.is_finite() || self.spread < 0.0 {
            return Err(SyntheticError::InvalidSpread {
                spread: self.spread,
            });
        }
        Ok(())
    }
}

/// Generates points round-robin across the configured cluster centres.
///
/// # Errors
/// Returns a [`SyntheticError`] describing the first invalid field of
/// `config`.
///
/// # Examples
/// ```
/// use agglo_benches::source::{BlobConfig, generate_blobs};
///
/// let points = generate_blobs(&BlobConfig::new(32, 3, 7)).expect("valid config");
/// assert_eq!(points.rows(), 32);
/// assert_eq!(points.dimension(), 3);
/// ```
pub fn generate_blobs(config: &BlobConfig) -> Result<PointMatrix, SyntheticError> {
    config.validate()?;
    let mut rng = SmallRng::seed_from_u64(config.seed);
    let centres: Vec<Vec<f64>> = (0..config.clusters)
        .map(|_| {
            (0..config.dimensions)
                .map(|_| rng.gen_range(0.0..CENTRE_RANGE))
                .collect()
        })
        .collect();

    let mut values = Vec::with_capacity(config.point_count.saturating_mul(config.dimensions));
    for centre in centres.iter().cycle().take(config.point_count) {
        values.extend(centre.iter().map(|&coordinate| {
            if config.spread == 0.0 {
                coordinate
            } else {
                coordinate + rng.gen_range(-config.spread..=config.spread)
            }
        }));
    }
    Ok(PointMatrix::new(
        config.point_count,
        config.dimensions,
        values,
    )?)
}

/// Builds the condensed Euclidean matrix of `points`.
///
/// # Errors
/// Propagates [`Dissimilarity::new`] and
/// [`CondensedMatrix::from_dissimilarity`] failures.
pub fn euclidean_matrix(points: &PointMatrix) -> Result<CondensedMatrix, LinkageError> {
    let dissimilarity = Dissimilarity::new(points.clone(), Metric::Euclidean)?;
    CondensedMatrix::from_dissimilarity(&dissimilarity)
}
