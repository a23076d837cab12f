//! Metric selection and the scalar kernels behind each metric.
//!
//! Kernels return the raw value the linkage drivers compare; the metric's
//! [`Postprocess`](crate::Postprocess) turns it into the reported distance
//! afterwards (for example the Euclidean kernel returns the squared
//! distance).

use std::{fmt, str::FromStr, sync::Arc};

use crate::error::LinkageError;

/// Distance function applied to raw points.
///
/// Boolean metrics treat every non-zero coordinate as `true`.
///
/// # Examples
/// ```
/// use agglo_core::{Metric, UserMetric};
///
/// assert_eq!(Metric::Minkowski(3.0).as_str(), "minkowski");
/// let taxicab = Metric::User(UserMetric::new(|a, b| {
///     a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()
/// }));
/// assert_eq!(taxicab.as_str(), "user");
/// ```
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum Metric {
    /// Euclidean (L2) distance.
    Euclidean,
    /// Squared Euclidean distance.
    SqEuclidean,
    /// Minkowski distance with exponent `p > 0`; `p` of 1, 2 and infinity
    /// select the city-block, Euclidean and Chebyshev metrics.
    Minkowski(f64),
    /// Manhattan (L1) distance.
    CityBlock,
    /// Euclidean distance with every coordinate scaled by its sample
    /// variance across the point set.
    SEuclidean,
    /// Maximum coordinate difference.
    Chebyshev,
    /// One minus the cosine of the angle between two points.
    Cosine,
    /// Fraction of differing coordinates.
    Hamming,
    /// Fraction of differing coordinates among those non-zero in either
    /// point.
    Jaccard,
    /// Canberra distance.
    Canberra,
    /// Bray-Curtis dissimilarity.
    BrayCurtis,
    /// Yule dissimilarity on boolean vectors.
    Yule,
    /// Matching (boolean Hamming) dissimilarity.
    Matching,
    /// Dice dissimilarity on boolean vectors.
    Dice,
    /// Rogers-Tanimoto dissimilarity on boolean vectors.
    RogersTanimoto,
    /// Russell-Rao dissimilarity on boolean vectors.
    RussellRao,
    /// Sokal-Sneath dissimilarity on boolean vectors.
    SokalSneath,
    /// Kulsinski dissimilarity on boolean vectors.
    Kulsinski,
    /// Jaccard dissimilarity on boolean vectors.
    JaccardBool,
    /// Caller-supplied function of two coordinate slices.
    User(UserMetric),
}

impl Metric {
    /// Returns the lower-case name of the metric.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Euclidean => "euclidean",
            Self::SqEuclidean => "sqeuclidean",
            Self::Minkowski(_) => "minkowski",
            Self::CityBlock => "cityblock",
            Self::SEuclidean => "seuclidean",
            Self::Chebyshev => "chebyshev",
            Self::Cosine => "cosine",
            Self::Hamming => "hamming",
            Self::Jaccard => "jaccard",
            Self::Canberra => "canberra",
            Self::BrayCurtis => "braycurtis",
            Self::Yule => "yule",
            Self::Matching => "matching",
            Self::Dice => "dice",
            Self::RogersTanimoto => "rogerstanimoto",
            Self::RussellRao => "russellrao",
            Self::SokalSneath => "sokalsneath",
            Self::Kulsinski => "kulsinski",
            Self::JaccardBool => "jaccard_bool",
            Self::User(_) => "user",
        }
    }

    /// Returns `true` for metrics defined on boolean vectors.
    #[must_use]
    pub const fn is_boolean(&self) -> bool {
        matches!(
            self,
            Self::Yule
                | Self::Matching
                | Self::Dice
                | Self::RogersTanimoto
                | Self::RussellRao
                | Self::SokalSneath
                | Self::Kulsinski
                | Self::JaccardBool
        )
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Minkowski(p) => write!(f, "minkowski:{p}"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Parses lower-case metric names; Minkowski takes its exponent as
/// `minkowski:<p>`. User metrics have no textual form.
///
/// # Examples
/// ```
/// use agglo_core::Metric;
///
/// assert!(matches!("cosine".parse::<Metric>(), Ok(Metric::Cosine)));
/// assert!(matches!("minkowski:3".parse::<Metric>(), Ok(Metric::Minkowski(p)) if p == 3.0));
/// assert!("user".parse::<Metric>().is_err());
/// ```
impl FromStr for Metric {
    type Err = LinkageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || LinkageError::UnknownMetric { name: s.to_owned() };
        let lower = s.to_ascii_lowercase();
        if let Some(exponent) = lower.strip_prefix("minkowski:") {
            return exponent.parse().map(Self::Minkowski).map_err(|_| unknown());
        }
        let metric = match lower.as_str() {
            "euclidean" => Self::Euclidean,
            "sqeuclidean" => Self::SqEuclidean,
            "cityblock" => Self::CityBlock,
            "seuclidean" => Self::SEuclidean,
            "chebyshev" => Self::Chebyshev,
            "cosine" => Self::Cosine,
            "hamming" => Self::Hamming,
            "jaccard" => Self::Jaccard,
            "canberra" => Self::Canberra,
            "braycurtis" => Self::BrayCurtis,
            "yule" => Self::Yule,
            "matching" => Self::Matching,
            "dice" => Self::Dice,
            "rogerstanimoto" => Self::RogersTanimoto,
            "russellrao" => Self::RussellRao,
            "sokalsneath" => Self::SokalSneath,
            "kulsinski" => Self::Kulsinski,
            "jaccard_bool" => Self::JaccardBool,
            _ => return Err(unknown()),
        };
        Ok(metric)
    }
}

type UserFn = dyn Fn(&[f64], &[f64]) -> f64 + Send + Sync;

/// Shareable user-defined distance function.
#[derive(Clone)]
pub struct UserMetric(Arc<UserFn>);

impl UserMetric {
    /// Wraps `distance`, which must be symmetric and return non-NaN values.
    pub fn new<F>(distance: F) -> Self
    where
        F: Fn(&[f64], &[f64]) -> f64 + Send + Sync + 'static,
    {
        Self(Arc::new(distance))
    }

    #[inline]
    pub(crate) fn evaluate(&self, left: &[f64], right: &[f64]) -> f64 {
        (self.0)(left, right)
    }
}

impl fmt::Debug for UserMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UserMetric(..)")
    }
}

#[inline]
pub(crate) fn sqeuclidean(left: &[f64], right: &[f64]) -> f64 {
    left.iter()
        .zip(right)
        .map(|(x, y)| {
            let diff = x - y;
            diff * diff
        })
        .sum()
}

#[inline]
pub(crate) fn cityblock(left: &[f64], right: &[f64]) -> f64 {
    left.iter().zip(right).map(|(x, y)| (x - y).abs()).sum()
}

#[inline]
pub(crate) fn chebyshev(left: &[f64], right: &[f64]) -> f64 {
    left.iter()
        .zip(right)
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}

#[inline]
pub(crate) fn minkowski(left: &[f64], right: &[f64], p: f64) -> f64 {
    left.iter()
        .zip(right)
        .map(|(x, y)| (x - y).abs().powf(p))
        .sum()
}

#[inline]
pub(crate) fn seuclidean(left: &[f64], right: &[f64], variances: &[f64]) -> f64 {
    left.iter()
        .zip(right)
        .zip(variances)
        .map(|((x, y), var)| {
            let diff = x - y;
            diff * diff / var
        })
        .sum()
}

#[inline]
pub(crate) fn dot(left: &[f64], right: &[f64]) -> f64 {
    left.iter().zip(right).map(|(x, y)| x * y).sum()
}

#[inline]
pub(crate) fn hamming(left: &[f64], right: &[f64]) -> f64 {
    left.iter().zip(right).filter(|(x, y)| x != y).count() as f64
}

#[inline]
pub(crate) fn jaccard(left: &[f64], right: &[f64]) -> f64 {
    let (differing, nonzero) =
        left.iter()
            .zip(right)
            .fold((0usize, 0usize), |(differing, nonzero), (x, y)| {
                (
                    differing + usize::from(x != y),
                    nonzero + usize::from(*x != 0.0 || *y != 0.0),
                )
            });
    if differing == 0 {
        0.0
    } else {
        differing as f64 / nonzero as f64
    }
}

#[inline]
pub(crate) fn canberra(left: &[f64], right: &[f64]) -> f64 {
    left.iter()
        .zip(right)
        .map(|(x, y)| {
            let numerator = (x - y).abs();
            if numerator > 0.0 {
                numerator / (x.abs() + y.abs())
            } else {
                0.0
            }
        })
        .sum()
}

#[inline]
pub(crate) fn braycurtis(left: &[f64], right: &[f64]) -> f64 {
    let (diff, total) = left
        .iter()
        .zip(right)
        .fold((0.0, 0.0), |(diff, total), (x, y)| {
            (diff + (x - y).abs(), total + (x + y).abs())
        });
    diff / total
}

/// Co-occurrence counts of two boolean vectors.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct BoolCounts {
    pub(crate) both: f64,
    pub(crate) left_only: f64,
    pub(crate) right_only: f64,
    pub(crate) dimension: f64,
}

impl BoolCounts {
    pub(crate) fn of(left: &[f64], right: &[f64]) -> Self {
        let mut counts = Self {
            dimension: left.len() as f64,
            ..Self::default()
        };
        for (x, y) in left.iter().zip(right) {
            match (*x != 0.0, *y != 0.0) {
                (true, true) => counts.both += 1.0,
                (true, false) => counts.left_only += 1.0,
                (false, true) => counts.right_only += 1.0,
                (false, false) => {}
            }
        }
        counts
    }

    #[inline]
    pub(crate) fn mismatches(&self) -> f64 {
        self.left_only + self.right_only
    }

    #[inline]
    fn neither(&self) -> f64 {
        self.dimension - self.both - self.mismatches()
    }
}

pub(crate) fn yule(counts: BoolCounts) -> f64 {
    let discordant = counts.left_only * counts.right_only;
    if discordant == 0.0 {
        return 0.0;
    }
    let concordant = counts.both * counts.neither();
    2.0 * discordant / (discordant + concordant)
}

pub(crate) fn dice(counts: BoolCounts) -> f64 {
    let mismatches = counts.mismatches();
    if mismatches == 0.0 {
        0.0
    } else {
        mismatches / (mismatches + 2.0 * counts.both)
    }
}

pub(crate) fn rogers_tanimoto(counts: BoolCounts) -> f64 {
    let mismatches = counts.mismatches();
    2.0 * mismatches / (mismatches + counts.dimension)
}

pub(crate) fn russell_rao(counts: BoolCounts) -> f64 {
    counts.dimension - counts.both
}

pub(crate) fn sokal_sneath(counts: BoolCounts) -> f64 {
    let mismatches = counts.mismatches();
    if mismatches == 0.0 {
        0.0
    } else {
        2.0 * mismatches / (counts.both + 2.0 * mismatches)
    }
}

pub(crate) fn jaccard_bool(counts: BoolCounts) -> f64 {
    let mismatches = counts.mismatches();
    if mismatches == 0.0 {
        0.0
    } else {
        mismatches / (mismatches + counts.both)
    }
}
