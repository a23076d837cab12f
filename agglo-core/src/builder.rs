//! Builder utilities for configuring linkage runs.
//!
//! Validates the method, metric and algorithm combination before a
//! [`Linkage`] is constructed, so configuration errors surface before any
//! distance is computed.

use crate::{
    Result,
    dissimilarity::{Metric, normalise},
    error::LinkageError,
    linkage::Linkage,
    method::{Algorithm, LinkageMethod},
};

/// Configures and constructs [`Linkage`] instances.
///
/// # Examples
/// ```
/// use agglo_core::{Algorithm, LinkageBuilder, LinkageMethod, Metric};
///
/// let linkage = LinkageBuilder::new()
///     .with_method(LinkageMethod::Average)
///     .with_metric(Metric::CityBlock)
///     .with_algorithm(Algorithm::Generic)
///     .build()
///     .expect("builder configuration is valid");
/// assert_eq!(linkage.method(), LinkageMethod::Average);
/// assert_eq!(linkage.algorithm(), Algorithm::Generic);
/// ```
#[derive(Debug, Clone)]
pub struct LinkageBuilder {
    method: LinkageMethod,
    metric: Metric,
    algorithm: Algorithm,
}

impl Default for LinkageBuilder {
    fn default() -> Self {
        Self {
            method: LinkageMethod::Single,
            metric: Metric::Euclidean,
            algorithm: Algorithm::Auto,
        }
    }
}

impl LinkageBuilder {
    /// Creates a builder for single linkage on Euclidean distances with
    /// automatic algorithm selection.
    ///
    /// # Examples
    /// ```
    /// use agglo_core::{Algorithm, LinkageBuilder, LinkageMethod};
    ///
    /// let builder = LinkageBuilder::new();
    /// assert_eq!(builder.method(), LinkageMethod::Single);
    /// assert_eq!(builder.algorithm(), Algorithm::Auto);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the linkage method.
    #[must_use]
    pub fn with_method(mut self, method: LinkageMethod) -> Self {
        self.method = method;
        self
    }

    /// Returns the configured linkage method.
    #[must_use]
    pub fn method(&self) -> LinkageMethod {
        self.method
    }

    /// Overrides the metric used when clustering raw points.
    ///
    /// Matrix input carries its own dissimilarities and ignores the metric.
    ///
    /// # Examples
    /// ```
    /// use agglo_core::{LinkageBuilder, Metric};
    ///
    /// let builder = LinkageBuilder::new().with_metric(Metric::Cosine);
    /// assert_eq!(builder.metric().as_str(), "cosine");
    /// ```
    #[must_use]
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    /// Returns the configured metric.
    #[must_use]
    pub fn metric(&self) -> &Metric {
        &self.metric
    }

    /// Sets the algorithm; [`Algorithm::Auto`] defers the choice to the run.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Returns the configured algorithm.
    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Validates the configuration and constructs a [`Linkage`] instance.
    ///
    /// # Errors
    /// Returns [`LinkageError::UnsupportedMethod`] when the algorithm cannot
    /// run the method, [`LinkageError::UnsupportedMetric`] when a
    /// vector-only algorithm is paired with a non-Euclidean metric and
    /// [`LinkageError::InvalidMinkowskiExponent`] for a non-positive
    /// Minkowski exponent.
    ///
    /// # Examples
    /// ```
    /// use agglo_core::{Algorithm, LinkageBuilder, LinkageError, LinkageMethod};
    ///
    /// let err = LinkageBuilder::new()
    ///     .with_method(LinkageMethod::Median)
    ///     .with_algorithm(Algorithm::NnChain)
    ///     .build()
    ///     .expect_err("median linkage is not reducible");
    /// assert_eq!(
    ///     err,
    ///     LinkageError::UnsupportedMethod {
    ///         method: LinkageMethod::Median,
    ///         algorithm: Algorithm::NnChain,
    ///     }
    /// );
    /// ```
    pub fn build(self) -> Result<Linkage> {
        let metric = normalise(self.metric)?;
        if !self.algorithm.supports(self.method) {
            return Err(LinkageError::UnsupportedMethod {
                method: self.method,
                algorithm: self.algorithm,
            });
        }
        if self.algorithm.is_vector_only() && !matches!(metric, Metric::Euclidean) {
            return Err(LinkageError::UnsupportedMetric {
                metric: metric.as_str(),
                method: self.method,
            });
        }
        Ok(Linkage::new(self.method, metric, self.algorithm))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn defaults_build() {
        let linkage = LinkageBuilder::new().build().expect("defaults are valid");
        assert_eq!(linkage.method(), LinkageMethod::Single);
        assert_eq!(linkage.algorithm(), Algorithm::Auto);
        assert!(matches!(linkage.metric(), Metric::Euclidean));
    }

    #[rstest]
    #[case(LinkageMethod::Complete, Algorithm::Mst)]
    #[case(LinkageMethod::Centroid, Algorithm::NnChain)]
    #[case(LinkageMethod::Average, Algorithm::VectorInPlace)]
    #[case(LinkageMethod::WardD, Algorithm::VectorAlternative)]
    fn rejects_unsupported_pairs(#[case] method: LinkageMethod, #[case] algorithm: Algorithm) {
        let err = LinkageBuilder::new()
            .with_method(method)
            .with_algorithm(algorithm)
            .build()
            .expect_err("combination is unsupported");
        assert_eq!(err, LinkageError::UnsupportedMethod { method, algorithm });
    }

    #[test]
    fn vector_algorithms_require_euclidean_metric() {
        let err = LinkageBuilder::new()
            .with_method(LinkageMethod::Ward)
            .with_metric(Metric::Chebyshev)
            .with_algorithm(Algorithm::VectorInPlace)
            .build()
            .expect_err("chebyshev has no centroid");
        assert_eq!(
            err,
            LinkageError::UnsupportedMetric {
                metric: "chebyshev",
                method: LinkageMethod::Ward,
            }
        );
    }

    #[test]
    fn minkowski_two_counts_as_euclidean() {
        let linkage = LinkageBuilder::new()
            .with_method(LinkageMethod::Centroid)
            .with_metric(Metric::Minkowski(2.0))
            .with_algorithm(Algorithm::VectorAlternative)
            .build()
            .expect("p = 2 is Euclidean");
        assert!(matches!(linkage.metric(), Metric::Euclidean));
    }

    #[rstest]
    #[case(0.0)]
    #[case(-1.5)]
    fn rejects_non_positive_minkowski_exponent(#[case] p: f64) {
        let err = LinkageBuilder::new()
            .with_metric(Metric::Minkowski(p))
            .build()
            .expect_err("exponent must be positive");
        assert_eq!(err, LinkageError::InvalidMinkowskiExponent { p });
    }
}
