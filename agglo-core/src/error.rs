//! Error types for the agglo core library.
//!
//! Defines the error enum exposed by the public API, its stable
//! machine-readable codes, and a convenient result alias.

use std::fmt;

use thiserror::Error;

use crate::method::{Algorithm, LinkageMethod};

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            #[must_use]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// Error type produced when configuring or running a linkage.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum LinkageError {
    /// Hierarchical clustering needs at least two items.
    #[error("linkage requires at least two points (got {points})")]
    TooFewPoints {
        /// Number of points supplied by the caller.
        points: usize,
    },
    /// A buffer did not have the length implied by its shape.
    #[error("buffer has length {len} but {expected} values were expected")]
    LengthMismatch {
        /// Length of the caller-supplied buffer.
        len: usize,
        /// Length implied by the declared point count and dimension.
        expected: usize,
    },
    /// Point buffers must have at least one coordinate per point.
    #[error("points must have positive dimension")]
    ZeroDimension,
    /// The input contained a NaN value.
    #[error("input contains NaN at flat index {index}")]
    NanInput {
        /// Flat index of the offending value.
        index: usize,
    },
    /// Cosine distance is undefined for a point with zero magnitude.
    #[error("point {index} has zero magnitude")]
    ZeroMagnitude {
        /// The offending point.
        index: usize,
    },
    /// Standardized Euclidean distance is undefined for a constant coordinate.
    #[error("coordinate {dimension} has zero variance")]
    ZeroVariance {
        /// The constant coordinate.
        dimension: usize,
    },
    /// Minkowski exponents must be positive.
    #[error("Minkowski exponent must be positive (got {p})")]
    InvalidMinkowskiExponent {
        /// Exponent supplied by the caller.
        p: f64,
    },
    /// The selected algorithm cannot run the requested method.
    #[error("method `{method}` is not supported by the {algorithm} algorithm")]
    UnsupportedMethod {
        /// Requested linkage method.
        method: LinkageMethod,
        /// Algorithm that rejected it.
        algorithm: Algorithm,
    },
    /// The selected metric cannot be combined with the requested method.
    #[error("metric `{metric}` cannot be combined with method `{method}`")]
    UnsupportedMetric {
        /// Name of the rejected metric.
        metric: &'static str,
        /// Requested linkage method.
        method: LinkageMethod,
    },
    /// The selected algorithm does not accept the supplied input form.
    #[error("the {algorithm} algorithm cannot consume {input} input")]
    UnsupportedInput {
        /// Algorithm that rejected the input.
        algorithm: Algorithm,
        /// Human-readable input form, `matrix` or `points`.
        input: &'static str,
    },
    /// A NaN dissimilarity surfaced while merging clusters.
    #[error("NaN dissimilarity encountered at merge step {step}")]
    NanDistance {
        /// Zero-based merge step in production order.
        step: usize,
    },
    /// A linkage method name did not match any known method.
    #[error("unknown linkage method `{name}`")]
    UnknownMethod {
        /// The unrecognised name.
        name: String,
    },
    /// A metric name did not match any known metric.
    #[error("unknown metric `{name}`")]
    UnknownMetric {
        /// The unrecognised name.
        name: String,
    },
    /// An algorithm name did not match any known algorithm.
    #[error("unknown linkage algorithm `{name}`")]
    UnknownAlgorithm {
        /// The unrecognised name.
        name: String,
    },
    /// A flat cut requested an impossible number of clusters.
    #[error("cannot cut {points} points into {requested} clusters")]
    InvalidClusterCount {
        /// Requested number of clusters.
        requested: usize,
        /// Number of points in the dendrogram.
        points: usize,
    },
}

define_error_codes! {
    /// Stable codes describing [`LinkageError`] variants.
    enum LinkageErrorCode for LinkageError {
        /// Hierarchical clustering needs at least two items.
        TooFewPoints => TooFewPoints { .. } => "LINKAGE_TOO_FEW_POINTS",
        /// A buffer did not have the length implied by its shape.
        LengthMismatch => LengthMismatch { .. } => "LINKAGE_LENGTH_MISMATCH",
        /// Point buffers must have at least one coordinate per point.
        ZeroDimension => ZeroDimension => "LINKAGE_ZERO_DIMENSION",
        /// The input contained a NaN value.
        NanInput => NanInput { .. } => "LINKAGE_NAN_INPUT",
        /// Cosine distance is undefined for a point with zero magnitude.
        ZeroMagnitude => ZeroMagnitude { .. } => "LINKAGE_ZERO_MAGNITUDE",
        /// Standardized Euclidean distance is undefined for a constant coordinate.
        ZeroVariance => ZeroVariance { .. } => "LINKAGE_ZERO_VARIANCE",
        /// Minkowski exponents must be positive.
        InvalidMinkowskiExponent => InvalidMinkowskiExponent { .. } => "LINKAGE_INVALID_MINKOWSKI_EXPONENT",
        /// The selected algorithm cannot run the requested method.
        UnsupportedMethod => UnsupportedMethod { .. } => "LINKAGE_UNSUPPORTED_METHOD",
        /// The selected metric cannot be combined with the requested method.
        UnsupportedMetric => UnsupportedMetric { .. } => "LINKAGE_UNSUPPORTED_METRIC",
        /// The selected algorithm does not accept the supplied input form.
        UnsupportedInput => UnsupportedInput { .. } => "LINKAGE_UNSUPPORTED_INPUT",
        /// A NaN dissimilarity surfaced while merging clusters.
        NanDistance => NanDistance { .. } => "LINKAGE_NAN_DISTANCE",
        /// A linkage method name did not match any known method.
        UnknownMethod => UnknownMethod { .. } => "LINKAGE_UNKNOWN_METHOD",
        /// A metric name did not match any known metric.
        UnknownMetric => UnknownMetric { .. } => "LINKAGE_UNKNOWN_METRIC",
        /// An algorithm name did not match any known algorithm.
        UnknownAlgorithm => UnknownAlgorithm { .. } => "LINKAGE_UNKNOWN_ALGORITHM",
        /// A flat cut requested an impossible number of clusters.
        InvalidClusterCount => InvalidClusterCount { .. } => "LINKAGE_INVALID_CLUSTER_COUNT",
    }
}

impl LinkageError {
    /// Returns `true` for configuration errors reported before any merge.
    ///
    /// # Examples
    /// ```
    /// use agglo_core::{Algorithm, LinkageError, LinkageMethod};
    ///
    /// let err = LinkageError::UnsupportedMethod {
    ///     method: LinkageMethod::Centroid,
    ///     algorithm: Algorithm::NnChain,
    /// };
    /// assert!(err.is_configuration());
    /// assert!(!LinkageError::NanDistance { step: 3 }.is_configuration());
    /// ```
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedMethod { .. }
                | Self::UnsupportedMetric { .. }
                | Self::UnsupportedInput { .. }
                | Self::InvalidMinkowskiExponent { .. }
                | Self::UnknownMethod { .. }
                | Self::UnknownMetric { .. }
                | Self::UnknownAlgorithm { .. }
        )
    }
}

/// Convenient alias for results returned by the core API.
pub type Result<T> = core::result::Result<T, LinkageError>;
