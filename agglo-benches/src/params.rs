//! Benchmark parameter labels.

use std::fmt;

use agglo_core::{Algorithm, LinkageMethod};

/// One linkage benchmark case, rendered as the Criterion parameter id.
#[derive(Clone, Copy, Debug)]
pub struct LinkageBenchParams {
    /// Linkage method under test.
    pub method: LinkageMethod,
    /// Driver under test.
    pub algorithm: Algorithm,
    /// Number of points in the dataset.
    pub point_count: usize,
}

impl fmt::Display for LinkageBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/n={}",
            self.method, self.algorithm, self.point_count
        )
    }
}
