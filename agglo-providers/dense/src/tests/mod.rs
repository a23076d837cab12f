pub(crate) use super::{DenseMatrixProviderError, PointMatrixProvider};

mod errors;
mod provider;
mod support;
